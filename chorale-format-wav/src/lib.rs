// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Chorale crates. Please see the workspace Cargo.toml for
// their justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

//! The WAVE format: the "fmt ", "fact", and "data" chunk types, a fully loaded [`WavFile`], and a
//! streaming [`WavDecoder`].

use std::sync::Once;

use chorale_format_riff::register_chunk_type;

mod chunks;
mod decoder;
mod file;
mod pcm;

pub use chunks::{sub_format_guid, DataChunk, FactChunk, FmtChunk, FmtExtensible, FmtExtension};
pub use decoder::WavDecoder;
pub use file::WavFile;
pub use pcm::decode_pcm;

/// The RIFF form is "WAVE".
pub const WAVE_FORM: [u8; 4] = *b"WAVE";

/// Registers the WAVE chunk types with the process-wide chunk registry. Registration happens once,
/// and later calls do nothing.
pub fn register_chunks() {
    static REGISTER: Once = Once::new();

    REGISTER.call_once(|| {
        register_chunk_type::<FmtChunk>();
        register_chunk_type::<FactChunk>();
        register_chunk_type::<DataChunk>();
    });
}
