// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Chorale
//!
//! Chorale is a pure Rust RIFF container library and audio sample decoder.
//!
//! # Support
//!
//! Decoders are selected by file extension. The decoders registered in the default registry are
//! selected by feature flag.
//!
//! | Format   | Extensions      | Feature Flag | Default |
//! |----------|-----------------|--------------|---------|
//! | Wave     | `wav`, `wave`   | `wav`        | Yes     |
//!
//! Wave files decode 1 to 8-bit and 16-bit integer PCM, and 32-bit floating point samples.
//!
//! # Usage
//!
//! [`decode_file`] decodes a whole file into an [`AudioBuffer`](core::audio::AudioBuffer) in the
//! sample format native to the file, and preserves the error if the file cannot be decoded.
//! [`read_file`] additionally converts the samples to the requested sample format, and returns
//! `None` on any error.
//!
//! For more control, create an [`AudioDecoder`](core::codecs::AudioDecoder) with
//! [`create_decoder`], or with a [`DecoderRegistry`](core::codecs::DecoderRegistry) populated by
//! [`default::register_enabled_decoders`].

use std::path::Path;

use log::warn;

use chorale_core::audio::{AudioBuffer, AudioData};
use chorale_core::codecs::AudioDecoder;
use chorale_core::errors::{not_found_error, NotFoundKind, Result};
use chorale_core::io::SourceStream;
use chorale_core::sample::Sample;

pub mod default {
    //! The `default` module provides convenience functions and registries to get an implementer
    //! up-and-running as quickly as possible, and to reduce boiler-plate. Using the `default`
    //! module is completely optional and incurs no overhead unless actually used.

    pub mod formats {
        //! The `formats` module re-exports all enabled Chorale formats.

        #[cfg(feature = "wav")]
        pub use chorale_format_wav::{WavDecoder, WavFile};
    }

    use lazy_static::lazy_static;

    use chorale_core::codecs::DecoderRegistry;

    lazy_static! {
        static ref DECODER_REGISTRY: DecoderRegistry = {
            let mut registry = DecoderRegistry::new();
            register_enabled_decoders(&mut registry);
            registry
        };
    }

    /// Gets the default `DecoderRegistry`. This registry pre-registers all the decoders selected by
    /// the `feature` flags in the includer's `Cargo.toml`. If `features` is not set, the default
    /// set of Chorale decoders is registered.
    ///
    /// This function is lazy and does not instantiate the `DecoderRegistry` until the first call to
    /// this function.
    pub fn get_decoders() -> &'static DecoderRegistry {
        &DECODER_REGISTRY
    }

    /// Registers the chunk types of all formats selected by the `feature` flags with the
    /// process-wide chunk registry.
    pub fn register_enabled_chunks() {
        #[cfg(feature = "wav")]
        chorale_format_wav::register_chunks();
    }

    /// Registers all the decoders selected by the `feature` flags in the includer's `Cargo.toml` on
    /// the provided `DecoderRegistry`. If `features` is not set, the default set of Chorale
    /// decoders is registered. The chunk types of the selected formats are registered as well.
    ///
    /// Use this function to easily populate a custom registry with all enabled decoders.
    pub fn register_enabled_decoders(registry: &mut DecoderRegistry) {
        register_enabled_chunks();

        #[cfg(feature = "wav")]
        registry.register_all::<formats::WavDecoder>();
    }
}

pub use chorale_core as core;
pub use chorale_format_riff as riff;

/// Gets the extension of a path.
fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Opens a file and creates a decoder for it with the default decoder registry. The decoder is
/// selected by the file extension.
///
/// Returns a [`NotFound`](core::errors::Error::NotFound) error if no decoder is registered for the
/// extension, or the error that prevented the file from being opened or decoded.
pub fn create_decoder<P: AsRef<Path>>(path: P) -> Result<Box<dyn AudioDecoder>> {
    let path = path.as_ref();
    let registry = default::get_decoders();

    let extension = match extension_of(path) {
        Some(extension) if registry.is_registered(extension) => extension,
        _ => return not_found_error(NotFoundKind::Extension),
    };

    let file = std::fs::File::open(path)?;

    registry.create(extension, SourceStream::new(Box::new(file)))
}

/// Opens a file and creates a decoder for it, or returns `None` on any error.
pub fn try_create_decoder<P: AsRef<Path>>(path: P) -> Option<Box<dyn AudioDecoder>> {
    let path = path.as_ref();

    match create_decoder(path) {
        Ok(decoder) => Some(decoder),
        Err(err) => {
            warn!("could not create a decoder for {}: {}", path.display(), err);
            None
        }
    }
}

/// Decodes a whole file in the sample format native to the file.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    create_decoder(path)?.read_all()
}

/// Decodes a whole file and converts it to the sample format `T`, or returns `None` on any error.
pub fn read_file<T: Sample>(path: impl AsRef<Path>) -> Option<AudioData<T>> {
    let path = path.as_ref();

    match decode_file(path) {
        Ok(buf) => Some(buf.convert::<T>()),
        Err(err) => {
            warn!("could not read {}: {}", path.display(), err);
            None
        }
    }
}
