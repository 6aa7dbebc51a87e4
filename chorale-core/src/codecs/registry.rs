// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry for decoders to support lookup and instantiation of decoders by file extension at
//! runtime.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::{debug, warn};

use crate::codecs::AudioDecoder;
use crate::errors::{not_found_error, NotFoundKind, Result};
use crate::io::SourceStream;

/// `AudioDecoder` factory function. Creates a boxed `AudioDecoder` that takes ownership of the
/// stream.
pub type AudioDecoderFactoryFn = fn(SourceStream) -> Result<Box<dyn AudioDecoder>>;

/// To support registration in a decoder registry, an `AudioDecoder` must implement the
/// `RegisterableAudioDecoder` trait.
pub trait RegisterableAudioDecoder: AudioDecoder {
    fn try_registry_new(source: SourceStream) -> Result<Box<dyn AudioDecoder>>
    where
        Self: Sized;

    /// Get a list of file extensions handled by this decoder.
    fn supported_extensions() -> &'static [&'static str]
    where
        Self: Sized;
}

/// Extensions are matched case-insensitively, with or without a leading period.
fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// A `DecoderRegistry` maps file extensions to decoder factories, and provides a method to
/// instantiate an `AudioDecoder` for a file extension.
///
/// The first registration of an extension wins. Later registrations of the same extension are
/// rejected and leave the original factory in place.
#[derive(Default)]
pub struct DecoderRegistry {
    factories: HashMap<String, AudioDecoderFactoryFn>,
}

impl DecoderRegistry {
    /// Instantiate a new `DecoderRegistry`.
    pub fn new() -> Self {
        DecoderRegistry { factories: Default::default() }
    }

    /// Registers a factory for a file extension. Returns `false` if the extension is already
    /// registered.
    pub fn register(&mut self, extension: &str, factory: AudioDecoderFactoryFn) -> bool {
        match self.factories.entry(normalize_extension(extension)) {
            Entry::Vacant(entry) => {
                debug!("registered decoder for extension '{}'", entry.key());
                entry.insert(factory);
                true
            }
            Entry::Occupied(entry) => {
                warn!("decoder for extension '{}' is already registered", entry.key());
                false
            }
        }
    }

    /// Registers a decoder for all the extensions it supports. Returns `false` if any extension
    /// was already registered.
    pub fn register_all<D: RegisterableAudioDecoder>(&mut self) -> bool {
        let mut all = true;

        for extension in D::supported_extensions() {
            all &= self.register(extension, D::try_registry_new);
        }

        all
    }

    /// Returns `true` if a factory is registered for the extension.
    pub fn is_registered(&self, extension: &str) -> bool {
        self.factories.contains_key(&normalize_extension(extension))
    }

    /// Gets an iterator over all registered extensions.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiates a decoder for the file extension. Returns a
    /// [`NotFound`](crate::errors::Error::NotFound) error if no factory is registered for the
    /// extension, or the factory's error if the stream could not be opened.
    pub fn create(&self, extension: &str, source: SourceStream) -> Result<Box<dyn AudioDecoder>> {
        match self.factories.get(&normalize_extension(extension)) {
            Some(factory) => factory(source),
            None => not_found_error(NotFoundKind::Extension),
        }
    }

    /// Instantiates a decoder for the file extension, or returns `None` on any error.
    pub fn try_create(
        &self,
        extension: &str,
        source: SourceStream,
    ) -> Option<Box<dyn AudioDecoder>> {
        match self.create(extension, source) {
            Ok(decoder) => Some(decoder),
            Err(err) => {
                warn!("could not create decoder for extension '{}': {}", extension, err);
                None
            }
        }
    }
}
