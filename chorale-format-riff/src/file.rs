// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::{self, Read};

use chorale_core::errors::{validation_error, Result};
use chorale_core::io::{ReadBytes, Serialize, SourceStream};

use log::{debug, info};

use crate::chunks::{
    tag_to_string, write_chunk, Chunk, ChunkHeader, ChunkType, RawChunk, RiffHeader,
};
use crate::registry::{lookup_chunk_factory, ChunkFactoryFn};
use crate::scanner::ChunkScanner;

/// Options controlling how a RIFF stream is read.
#[derive(Copy, Clone, Debug, Default)]
pub struct FileOptions {
    /// Keep chunks without a registered factory as [`RawChunk`]s instead of skipping them.
    pub retain_unknown_chunks: bool,
}

/// Skips `count` bytes of the payload of a chunk. The payload of a chunk with the streaming length
/// may end with the stream before `count` bytes are skipped.
pub(crate) fn skip_payload(
    stream: &mut SourceStream,
    header: ChunkHeader,
    count: u64,
) -> Result<()> {
    if header.is_streaming() {
        let skipped = io::copy(&mut (&mut *stream).take(count), &mut io::sink())?;
        debug!("skipped {} bytes of streaming chunk {}", skipped, tag_to_string(&header.tag));
    }
    else {
        stream.ignore_bytes(count)?;
    }

    Ok(())
}

/// Skips any payload of the chunk left unread since `start`, or fails if the chunk was read past
/// its declared length.
fn finish_payload(stream: &mut SourceStream, header: ChunkHeader, start: u64) -> Result<()> {
    let read = stream.pos() - start;
    let size = u64::from(header.size);

    if read > size {
        return validation_error("riff: chunk read past its declared length");
    }
    else if read < size {
        debug!("skipping {} unread bytes of chunk {}", size - read, tag_to_string(&header.tag));
        skip_payload(stream, header, size - read)?;
    }

    Ok(())
}

/// Reads the payload of a chunk with a factory. The stream is left positioned at the end of the
/// payload.
pub(crate) fn read_registered(
    stream: &mut SourceStream,
    header: ChunkHeader,
    factory: ChunkFactoryFn,
) -> Result<Box<dyn Chunk>> {
    let start = stream.pos();
    let chunk = factory(stream, header)?;
    finish_payload(stream, header, start)?;
    Ok(chunk)
}

/// Reads the payload of a chunk of type `T` whose header was just read. The stream is left
/// positioned at the end of the payload.
pub fn read_chunk<T: ChunkType>(stream: &mut SourceStream, header: ChunkHeader) -> Result<T> {
    let start = stream.pos();
    let chunk = T::read(stream, header)?;
    finish_payload(stream, header, start)?;
    Ok(chunk)
}

/// A `File` is an eagerly parsed RIFF stream: an ordered collection of chunks, at most one per tag.
///
/// Chunks keep the order they were read or inserted in, and are written back in that order.
pub struct File {
    form: [u8; 4],
    chunks: Vec<Box<dyn Chunk>>,
    consumed: u64,
}

impl File {
    /// Instantiate an empty `File` of the given form type.
    pub fn new(form: [u8; 4]) -> Self {
        File { form, chunks: Vec::new(), consumed: 0 }
    }

    /// Reads a RIFF stream of the given form type.
    pub fn read(stream: &mut SourceStream, form: [u8; 4]) -> Result<Self> {
        File::read_with_options(stream, form, &FileOptions::default())
    }

    /// Reads a RIFF stream of the given form type with options.
    ///
    /// Chunks with a factory in the process-wide registry are parsed. Other chunks are skipped, or
    /// retained as [`RawChunk`]s if requested by the options.
    pub fn read_with_options(
        stream: &mut SourceStream,
        form: [u8; 4],
        options: &FileOptions,
    ) -> Result<Self> {
        let riff = RiffHeader::read_expecting(stream, form)?;

        let mut scanner = ChunkScanner::new(&riff);
        let mut file = File::new(form);

        while let Some(header) = scanner.next(stream)? {
            let chunk: Box<dyn Chunk> = match lookup_chunk_factory(header.tag) {
                Some(factory) => read_registered(stream, header, factory)?,
                None if options.retain_unknown_chunks => Box::new(RawChunk::read(stream, header)?),
                None => {
                    // Unknown chunks are to be ignored.
                    info!(
                        "ignoring unknown chunk: tag={}, len={}.",
                        tag_to_string(&header.tag),
                        header.size
                    );
                    skip_payload(stream, header, u64::from(header.size))?;
                    continue;
                }
            };

            if file.insert_chunk(chunk).is_some() {
                debug!("replaced duplicate chunk {}", tag_to_string(&header.tag));
            }
        }

        file.consumed = scanner.consumed();

        Ok(file)
    }

    /// Gets the form type.
    pub fn form(&self) -> [u8; 4] {
        self.form
    }

    /// Gets the number of bytes of the RIFF payload that were consumed when the file was read,
    /// including the form type. Zero if the file was not read from a stream.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, tag: [u8; 4]) -> bool {
        self.position(tag).is_some()
    }

    fn position(&self, tag: [u8; 4]) -> Option<usize> {
        self.chunks.iter().position(|chunk| chunk.tag() == tag)
    }

    /// Gets the chunk with a tag.
    pub fn get(&self, tag: [u8; 4]) -> Option<&dyn Chunk> {
        self.position(tag).map(|i| self.chunks[i].as_ref())
    }

    /// Gets the chunk of type `T`. Returns `None` if the chunk is missing, or if the chunk with the
    /// tag of `T` is of another type.
    pub fn get_chunk<T: ChunkType>(&self) -> Option<&T> {
        self.get(T::TAG).and_then(|chunk| chunk.downcast_ref::<T>())
    }

    /// Gets the chunk of type `T` mutably.
    pub fn get_chunk_mut<T: ChunkType>(&mut self) -> Option<&mut T> {
        let i = self.position(T::TAG)?;
        self.chunks[i].as_mut().downcast_mut::<T>()
    }

    /// Inserts a chunk. A chunk with the same tag is replaced in place and returned, otherwise the
    /// chunk is appended.
    pub fn insert_chunk(&mut self, chunk: Box<dyn Chunk>) -> Option<Box<dyn Chunk>> {
        match self.position(chunk.tag()) {
            Some(i) => Some(std::mem::replace(&mut self.chunks[i], chunk)),
            None => {
                self.chunks.push(chunk);
                None
            }
        }
    }

    /// Removes and returns the chunk with a tag.
    pub fn remove_chunk(&mut self, tag: [u8; 4]) -> Option<Box<dyn Chunk>> {
        self.position(tag).map(|i| self.chunks.remove(i))
    }

    /// Removes and returns the chunk of type `T`. A chunk with the tag of `T` but of another type
    /// is left in place.
    pub fn take_chunk<T: ChunkType>(&mut self) -> Option<T> {
        let i = self.position(T::TAG)?;

        if !self.chunks[i].is::<T>() {
            return None;
        }

        self.chunks.remove(i).downcast::<T>().map(|chunk| *chunk)
    }

    /// Gets an iterator over all chunks in order.
    pub fn chunks(&self) -> impl Iterator<Item = &dyn Chunk> {
        self.chunks.iter().map(|chunk| chunk.as_ref())
    }

    /// Computes the RIFF payload length of the file as it would be written.
    pub fn riff_size(&self) -> Result<u32> {
        let size = self.chunks.iter().fold(4, |acc, chunk| acc + chunk.serialized_len());

        match u32::try_from(size) {
            Ok(size) => Ok(size),
            Err(_) => validation_error("riff: file exceeds the maximum riff length"),
        }
    }

    /// Writes the file as a RIFF stream.
    pub fn write<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        RiffHeader { size: self.riff_size()?, form: self.form }.serialize(writer)?;

        for chunk in self.chunks.iter() {
            write_chunk(writer, chunk.as_ref())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chorale_core::errors::Error;
    use chorale_core::io::{ReadBytes, ReadOnlySource, SourceStream};

    use super::{File, FileOptions};
    use crate::chunks::RawChunk;
    use crate::tests::{register_test_chunks, Counter, TestChunk};

    fn stream(bytes: &[u8]) -> SourceStream {
        SourceStream::new(Box::new(Cursor::new(bytes.to_vec())))
    }

    fn unseekable(bytes: &[u8]) -> SourceStream {
        SourceStream::new(Box::new(ReadOnlySource::new(Cursor::new(bytes.to_vec()))))
    }

    const UNKNOWN_CHUNKS: &[u8] = b"RIFF\x22\x00\x00\x00TEST\
        junk\x03\x00\x00\x00xyz\x00\
        test\x02\x00\x00\x00\x34\x12\
        zero\x00\x00\x00\x00";

    #[test]
    fn verify_unknown_chunks_are_skipped() {
        register_test_chunks();

        let file = File::read(&mut stream(UNKNOWN_CHUNKS), *b"TEST").unwrap();

        assert_eq!(file.len(), 1);
        assert_eq!(file.get_chunk::<TestChunk>(), Some(&TestChunk { value: 0x1234 }));
        assert!(!file.contains(*b"junk"));
        assert_eq!(file.consumed(), 0x22);

        // Without seeking, unknown chunks are skipped by reading.
        let mut source = unseekable(UNKNOWN_CHUNKS);
        let file = File::read(&mut source, *b"TEST").unwrap();

        assert_eq!(file.len(), 1);
        assert_eq!(file.get_chunk::<TestChunk>(), Some(&TestChunk { value: 0x1234 }));
        assert_eq!(file.consumed(), 0x22);
        assert_eq!(source.pos(), UNKNOWN_CHUNKS.len() as u64);
    }

    #[test]
    fn verify_streaming_lengths_read_to_end() {
        register_test_chunks();

        // A stream written without patching lengths. The last chunk ends with the stream.
        let bytes = b"RIFF\xff\xff\xff\xffTEST\
            test\x02\x00\x00\x00\x34\x12\
            junk\xff\xff\xff\xffxyz";

        let options = FileOptions { retain_unknown_chunks: true };

        for mut source in [stream(bytes), unseekable(bytes)] {
            let file = File::read_with_options(&mut source, *b"TEST", &options).unwrap();

            assert_eq!(file.get_chunk::<TestChunk>(), Some(&TestChunk { value: 0x1234 }));

            let junk = file.get(*b"junk").and_then(|chunk| chunk.downcast_ref::<RawChunk>());
            assert_eq!(junk.map(|chunk| chunk.data.as_slice()), Some(&b"xyz"[..]));
        }

        // Skipped rather than retained.
        let file = File::read(&mut unseekable(bytes), *b"TEST").unwrap();
        assert_eq!(file.len(), 1);
    }

    #[test]
    fn verify_truncated_chunk_is_rejected() {
        // The "junk" chunk declares 6 bytes, but the stream ends after 3.
        let bytes = b"RIFF\x12\x00\x00\x00TESTjunk\x06\x00\x00\x00xyz";
        let options = FileOptions { retain_unknown_chunks: true };

        assert!(matches!(
            File::read_with_options(&mut stream(bytes), *b"TEST", &options),
            Err(Error::IoError(_))
        ));
    }

    #[test]
    fn verify_unknown_chunks_are_retained() {
        register_test_chunks();

        let options = FileOptions { retain_unknown_chunks: true };
        let file =
            File::read_with_options(&mut stream(UNKNOWN_CHUNKS), *b"TEST", &options).unwrap();

        let tags = file.chunks().map(|chunk| chunk.tag()).collect::<Vec<_>>();
        assert_eq!(tags, vec![*b"junk", *b"test", *b"zero"]);

        let junk = file.get(*b"junk").and_then(|chunk| chunk.downcast_ref::<RawChunk>());
        assert_eq!(junk.map(|chunk| chunk.data.as_slice()), Some(&b"xyz"[..]));

        // Retaining every chunk reproduces the stream exactly.
        let mut buf = Vec::new();
        file.write(&mut buf).unwrap();
        assert_eq!(buf, UNKNOWN_CHUNKS);
    }

    #[test]
    fn verify_wrong_form_is_rejected() {
        assert!(matches!(
            File::read(&mut stream(UNKNOWN_CHUNKS), *b"WAVE"),
            Err(Error::IdentifierError(_))
        ));
    }

    #[test]
    fn verify_overlong_chunk_read_is_rejected() {
        register_test_chunks();

        // The "test" chunk declares 1 byte, but its reader always reads 2.
        let bytes = b"RIFF\x0e\x00\x00\x00TESTtest\x01\x00\x00\x00\x34\x12";

        assert!(matches!(
            File::read(&mut stream(bytes), *b"TEST"),
            Err(Error::ValidationError(_))
        ));
    }

    #[test]
    fn verify_insert_remove_write() {
        let mut file = File::new(*b"TEST");

        assert!(file.insert_chunk(Box::new(TestChunk { value: 1 })).is_none());
        assert!(file.insert_chunk(Box::new(Counter { count: 7 })).is_none());

        // Replacing keeps the position of the chunk.
        let old = file.insert_chunk(Box::new(TestChunk { value: 2 }));
        assert_eq!(old.and_then(|chunk| chunk.downcast::<TestChunk>()).map(|c| c.value), Some(1));

        let tags = file.chunks().map(|chunk| chunk.tag()).collect::<Vec<_>>();
        assert_eq!(tags, vec![*b"test", *b"cntr"]);

        if let Some(counter) = file.get_chunk_mut::<Counter>() {
            counter.count += 1;
        }

        assert_eq!(file.riff_size().unwrap(), 4 + 10 + 12);

        let mut buf = Vec::new();
        file.write(&mut buf).unwrap();
        assert_eq!(
            buf,
            b"RIFF\x1a\x00\x00\x00TEST\
              test\x02\x00\x00\x00\x02\x00\
              cntr\x04\x00\x00\x00\x08\x00\x00\x00"
        );

        assert_eq!(file.take_chunk::<Counter>(), Some(Counter { count: 8 }));
        assert!(file.remove_chunk(*b"cntr").is_none());
        assert!(file.remove_chunk(*b"test").is_some());
        assert!(file.is_empty());
    }

    #[test]
    fn verify_take_chunk_of_other_type_is_kept() {
        let mut file = File::new(*b"TEST");
        file.insert_chunk(Box::new(RawChunk::new(*b"test", vec![0, 0])));

        assert!(file.take_chunk::<TestChunk>().is_none());
        assert!(file.get_chunk::<TestChunk>().is_none());
        assert!(file.contains(*b"test"));
    }
}
