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

//! # Project Chorale
//!
//! Chorale is a RIFF container and audio sample decoding library written in pure Rust.
//!
//! This is the core crate. It provides the error type, the byte-level I/O primitives, the sample
//! model and sample format conversions, and the decoder trait and registry shared by all Chorale
//! crates.

pub mod audio;
pub mod codecs;
pub mod conv;
pub mod errors;
pub mod io;
pub mod sample;
