// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of chunk factories keyed by chunk tag.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chorale_core::errors::Result;
use chorale_core::io::SourceStream;

use lazy_static::lazy_static;
use log::debug;

use crate::chunks::{tag_to_string, Chunk, ChunkHeader, ChunkType};

/// Chunk factory function. Reads the payload described by the header from the stream positioned at
/// the first payload byte.
pub type ChunkFactoryFn = fn(&mut SourceStream, ChunkHeader) -> Result<Box<dyn Chunk>>;

fn read_boxed<T: ChunkType>(
    reader: &mut SourceStream,
    header: ChunkHeader,
) -> Result<Box<dyn Chunk>> {
    Ok(Box::new(T::read(reader, header)?))
}

/// Gets the factory function for a chunk type.
pub fn factory_for<T: ChunkType>() -> ChunkFactoryFn {
    read_boxed::<T>
}

/// A `ChunkRegistry` maps chunk tags to factories. The first registration of a tag wins.
#[derive(Default)]
pub struct ChunkRegistry {
    factories: HashMap<[u8; 4], ChunkFactoryFn>,
}

impl ChunkRegistry {
    pub fn new() -> Self {
        ChunkRegistry { factories: Default::default() }
    }

    /// Registers a chunk type. Returns `false` if its tag is already registered.
    pub fn register<T: ChunkType>(&mut self) -> bool {
        self.register_factory(T::TAG, factory_for::<T>())
    }

    /// Registers a factory for a tag. Returns `false` if the tag is already registered.
    pub fn register_factory(&mut self, tag: [u8; 4], factory: ChunkFactoryFn) -> bool {
        match self.factories.entry(tag) {
            Entry::Vacant(entry) => {
                debug!("registered chunk factory for '{}'", tag_to_string(&tag));
                entry.insert(factory);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn is_registered(&self, tag: [u8; 4]) -> bool {
        self.factories.contains_key(&tag)
    }

    /// Gets the factory registered for a tag.
    pub fn get(&self, tag: [u8; 4]) -> Option<ChunkFactoryFn> {
        self.factories.get(&tag).copied()
    }
}

lazy_static! {
    static ref CHUNK_REGISTRY: RwLock<ChunkRegistry> = RwLock::new(ChunkRegistry::new());
}

/// Registers a chunk type with the process-wide registry. Returns `false` if its tag is already
/// registered.
pub fn register_chunk_type<T: ChunkType>() -> bool {
    CHUNK_REGISTRY.write().unwrap_or_else(PoisonError::into_inner).register::<T>()
}

/// Gets the factory registered for a tag in the process-wide registry.
pub fn lookup_chunk_factory(tag: [u8; 4]) -> Option<ChunkFactoryFn> {
    CHUNK_REGISTRY.read().unwrap_or_else(PoisonError::into_inner).get(tag)
}
