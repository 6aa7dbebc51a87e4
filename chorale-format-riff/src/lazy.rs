// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::{Seek, SeekFrom};
use std::sync::{Mutex, PoisonError};

use chorale_core::errors::{not_found_error, seek_error, NotFoundKind, Result, SeekErrorKind};
use chorale_core::io::{ReadBytes, SourceStream};

use log::{debug, error};
use once_cell::sync::OnceCell;

use crate::chunks::{tag_to_string, Chunk, ChunkHeader, ChunkType, RiffHeader};
use crate::file::{read_registered, skip_payload};
use crate::registry::{factory_for, lookup_chunk_factory, ChunkFactoryFn};
use crate::scanner::ChunkScanner;

struct LazySlot {
    header: ChunkHeader,
    /// The stream position of the first payload byte.
    offset: u64,
    chunk: OnceCell<Box<dyn Chunk>>,
}

/// A `LazyFile` is a RIFF stream whose chunks are parsed on first access.
///
/// Opening a `LazyFile` only walks the chunk headers and records where each payload starts. A chunk
/// is parsed from the stream the first time it is requested and cached afterwards. The stream is
/// owned by the `LazyFile`, so it must be seekable.
pub struct LazyFile {
    form: [u8; 4],
    slots: Vec<LazySlot>,
    consumed: u64,
    stream: Mutex<SourceStream>,
}

impl LazyFile {
    /// Opens a RIFF stream of the given form type, and indexes its chunks.
    pub fn new(mut stream: SourceStream, form: [u8; 4]) -> Result<Self> {
        if !stream.is_seekable() {
            error!("lazy riff files require a seekable stream");
            return seek_error(SeekErrorKind::Unseekable);
        }

        let riff = RiffHeader::read_expecting(&mut stream, form)?;

        let mut scanner = ChunkScanner::new(&riff);
        let mut slots: Vec<LazySlot> = Vec::new();

        while let Some(header) = scanner.next(&mut stream)? {
            let slot = LazySlot { header, offset: stream.pos(), chunk: OnceCell::new() };

            skip_payload(&mut stream, header, u64::from(header.size))?;

            // A duplicate chunk replaces the earlier chunk in place.
            match slots.iter_mut().find(|s| s.header.tag == header.tag) {
                Some(existing) => *existing = slot,
                None => slots.push(slot),
            }
        }

        debug!("indexed {} chunks", slots.len());

        Ok(LazyFile { form, slots, consumed: scanner.consumed(), stream: Mutex::new(stream) })
    }

    /// Gets the form type.
    pub fn form(&self) -> [u8; 4] {
        self.form
    }

    /// Gets the number of bytes of the RIFF payload consumed while indexing, including the form
    /// type.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Gets the headers of all indexed chunks in order.
    pub fn headers(&self) -> impl Iterator<Item = &ChunkHeader> {
        self.slots.iter().map(|slot| &slot.header)
    }

    pub fn contains(&self, tag: [u8; 4]) -> bool {
        self.slot(tag).is_some()
    }

    /// Returns `true` if the chunk with a tag has been parsed.
    pub fn is_loaded(&self, tag: [u8; 4]) -> bool {
        self.slot(tag).map_or(false, |slot| slot.chunk.get().is_some())
    }

    fn slot(&self, tag: [u8; 4]) -> Option<&LazySlot> {
        self.slots.iter().find(|slot| slot.header.tag == tag)
    }

    /// Gets the chunk with a tag, parsing it with the factory in the process-wide registry on first
    /// access. Returns `None` if the stream has no such chunk, and a
    /// [`NotFound`](chorale_core::errors::Error::NotFound) error if no factory is registered for
    /// the tag.
    pub fn get(&self, tag: [u8; 4]) -> Result<Option<&dyn Chunk>> {
        let slot = match self.slot(tag) {
            Some(slot) => slot,
            None => return Ok(None),
        };

        let chunk = slot.chunk.get_or_try_init(|| match lookup_chunk_factory(tag) {
            Some(factory) => self.load(slot, factory),
            None => not_found_error(NotFoundKind::ChunkType),
        })?;

        Ok(Some(chunk.as_ref()))
    }

    /// Gets the chunk of type `T`, parsing it on first access. The registered factory for the tag
    /// of `T` is preferred, and `T` itself is used if none is registered.
    pub fn get_chunk<T: ChunkType>(&self) -> Result<Option<&T>> {
        let slot = match self.slot(T::TAG) {
            Some(slot) => slot,
            None => return Ok(None),
        };

        let chunk = slot.chunk.get_or_try_init(|| {
            let factory = lookup_chunk_factory(T::TAG).unwrap_or_else(factory_for::<T>);
            self.load(slot, factory)
        })?;

        Ok(chunk.as_ref().downcast_ref::<T>())
    }

    fn load(&self, slot: &LazySlot, factory: ChunkFactoryFn) -> Result<Box<dyn Chunk>> {
        debug!("loading chunk {}", tag_to_string(&slot.header.tag));

        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);

        stream.seek(SeekFrom::Start(slot.offset))?;

        read_registered(&mut stream, slot.header, factory)
    }

    /// Consumes the `LazyFile` and returns the stream.
    pub fn into_inner(self) -> SourceStream {
        self.stream.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chorale_core::errors::{Error, NotFoundKind, SeekErrorKind};
    use chorale_core::io::{ReadOnlySource, SourceStream};

    use super::LazyFile;
    use crate::chunks::Chunk;
    use crate::file::File;
    use crate::tests::{register_test_chunks, Counter, TestChunk};

    const CHUNKS: &[u8] = b"RIFF\x26\x00\x00\x00TEST\
        test\x02\x00\x00\x00\x34\x12\
        junk\x03\x00\x00\x00xyz\x00\
        cntr\x04\x00\x00\x00\x05\x00\x00\x00";

    fn stream(bytes: &[u8]) -> SourceStream {
        SourceStream::new(Box::new(Cursor::new(bytes.to_vec())))
    }

    #[test]
    fn verify_lazy_matches_eager() {
        register_test_chunks();

        let eager = File::read(&mut stream(CHUNKS), *b"TEST").unwrap();
        let lazy = LazyFile::new(stream(CHUNKS), *b"TEST").unwrap();

        assert_eq!(lazy.consumed(), eager.consumed());
        assert_eq!(lazy.headers().count(), 3);

        // Access out of stream order.
        assert!(!lazy.is_loaded(*b"cntr"));
        assert_eq!(lazy.get_chunk::<Counter>().unwrap(), eager.get_chunk::<Counter>());
        assert!(lazy.is_loaded(*b"cntr"));
        assert!(!lazy.is_loaded(*b"test"));

        assert_eq!(lazy.get_chunk::<TestChunk>().unwrap(), eager.get_chunk::<TestChunk>());

        // Cached on subsequent accesses.
        let first = lazy.get(*b"test").unwrap().unwrap() as *const dyn Chunk as *const u8;
        let second = lazy.get(*b"test").unwrap().unwrap() as *const dyn Chunk as *const u8;
        assert_eq!(first, second);
    }

    #[test]
    fn verify_streaming_lengths_are_indexed() {
        register_test_chunks();

        // The last chunk has the streaming length and ends with the stream.
        let bytes = b"RIFF\xff\xff\xff\xffTEST\
            cntr\x04\x00\x00\x00\x05\x00\x00\x00\
            test\xff\xff\xff\xff\x34\x12";

        let lazy = LazyFile::new(stream(bytes), *b"TEST").unwrap();

        assert_eq!(lazy.headers().count(), 2);
        assert_eq!(lazy.get_chunk::<TestChunk>().unwrap(), Some(&TestChunk { value: 0x1234 }));
        assert_eq!(lazy.get_chunk::<Counter>().unwrap(), Some(&Counter { count: 5 }));
    }

    #[test]
    fn verify_unregistered_chunk_is_not_found() {
        let lazy = LazyFile::new(stream(CHUNKS), *b"TEST").unwrap();

        assert!(lazy.contains(*b"junk"));
        assert!(matches!(lazy.get(*b"junk"), Err(Error::NotFound(NotFoundKind::ChunkType))));
        assert!(!lazy.is_loaded(*b"junk"));

        assert!(lazy.get(*b"none").unwrap().is_none());
    }

    #[test]
    fn verify_unseekable_stream_is_rejected() {
        let source = SourceStream::new(Box::new(ReadOnlySource::new(Cursor::new(CHUNKS.to_vec()))));

        assert!(matches!(
            LazyFile::new(source, *b"TEST"),
            Err(Error::SeekError(SeekErrorKind::Unseekable))
        ));
    }
}
