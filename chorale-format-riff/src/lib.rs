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

//! An extensible RIFF chunk container reader and writer.
//!
//! Chunk types are registered by tag with a process-wide registry. A RIFF stream can be read
//! eagerly into a [`File`], which parses every registered chunk up-front, or opened as a
//! [`LazyFile`], which parses each chunk on first access.

mod chunks;
mod file;
mod lazy;
mod registry;
mod scanner;

pub use chunks::{
    padded_len, read_payload, tag_to_string, write_chunk, Chunk, ChunkHeader, ChunkType, RawChunk,
    RiffHeader, RIFF_STREAM_MARKER, STREAMING_LEN,
};
pub use file::{read_chunk, File, FileOptions};
pub use lazy::LazyFile;
pub use registry::{
    factory_for, lookup_chunk_factory, register_chunk_type, ChunkFactoryFn, ChunkRegistry,
};
pub use scanner::ChunkScanner;
