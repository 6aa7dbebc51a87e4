// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;

use chorale_core::audio::AudioBuffer;
use chorale_core::errors::{validation_error, Result};
use chorale_core::io::{Serialize, SourceStream};
use chorale_format_riff::{write_chunk, Chunk, ChunkType, File, FileOptions, RiffHeader};

use crate::chunks::{DataChunk, FmtChunk};
use crate::pcm::decode_pcm;
use crate::{register_chunks, WAVE_FORM};

/// A `WavFile` is a fully loaded WAVE stream.
///
/// The format and data chunks are held in dedicated fields. All other chunks are held in the order
/// they were read or inserted. When written, the format chunk is always first and the data chunk is
/// always last.
pub struct WavFile {
    pub fmt: FmtChunk,
    pub data: DataChunk,
    others: File,
}

impl WavFile {
    pub fn new(fmt: FmtChunk, data: DataChunk) -> Self {
        WavFile { fmt, data, others: File::new(WAVE_FORM) }
    }

    /// Reads a WAVE stream. Chunks other than the format and data chunks are kept only if their
    /// type is registered.
    pub fn read(stream: &mut SourceStream) -> Result<Self> {
        WavFile::read_with_options(stream, &FileOptions::default())
    }

    /// Reads a WAVE stream with options.
    pub fn read_with_options(stream: &mut SourceStream, options: &FileOptions) -> Result<Self> {
        register_chunks();

        let mut others = File::read_with_options(stream, WAVE_FORM, options)?;

        let fmt = match others.take_chunk::<FmtChunk>() {
            Some(fmt) => fmt,
            None => return validation_error("wav: missing fmt chunk"),
        };

        let data = match others.take_chunk::<DataChunk>() {
            Some(data) => data,
            None => return validation_error("wav: missing data chunk"),
        };

        Ok(WavFile { fmt, data, others })
    }

    /// Gets the chunks other than the format and data chunks, in order.
    pub fn chunks(&self) -> impl Iterator<Item = &dyn Chunk> {
        self.others.chunks()
    }

    /// Gets a chunk other than the format and data chunks.
    pub fn get_chunk<T: ChunkType>(&self) -> Option<&T> {
        self.others.get_chunk::<T>()
    }

    /// Inserts a chunk other than the format and data chunks. A chunk with the same tag is replaced
    /// and returned.
    pub fn insert_chunk(&mut self, chunk: Box<dyn Chunk>) -> Result<Option<Box<dyn Chunk>>> {
        let tag = chunk.tag();

        if tag == FmtChunk::TAG || tag == DataChunk::TAG {
            return validation_error("wav: fmt and data chunks are held by dedicated fields");
        }

        Ok(self.others.insert_chunk(chunk))
    }

    /// Removes and returns a chunk other than the format and data chunks.
    pub fn remove_chunk(&mut self, tag: [u8; 4]) -> Option<Box<dyn Chunk>> {
        self.others.remove_chunk(tag)
    }

    /// Computes the RIFF payload length of the file as it would be written.
    pub fn riff_size(&self) -> Result<u32> {
        let size = self.chunks().fold(4, |acc, chunk| acc + chunk.serialized_len())
            + self.fmt.serialized_len()
            + self.data.serialized_len();

        match u32::try_from(size) {
            Ok(size) => Ok(size),
            Err(_) => validation_error("wav: file exceeds the maximum riff length"),
        }
    }

    /// Writes the file as a WAVE stream.
    pub fn write<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        RiffHeader { size: self.riff_size()?, form: WAVE_FORM }.serialize(writer)?;

        write_chunk(writer, &self.fmt)?;

        for chunk in self.chunks() {
            write_chunk(writer, chunk)?;
        }

        write_chunk(writer, &self.data)
    }

    /// Decodes the data chunk.
    pub fn decode(&self) -> Result<AudioBuffer> {
        decode_pcm(&self.fmt, &self.data.data)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chorale_core::audio::AudioBuffer;
    use chorale_core::errors::Error;
    use chorale_core::io::SourceStream;
    use chorale_format_riff::{FileOptions, LazyFile, RawChunk};

    use super::WavFile;
    use crate::chunks::{DataChunk, FactChunk, FmtChunk};
    use crate::register_chunks;

    fn stream(bytes: Vec<u8>) -> SourceStream {
        SourceStream::new(Box::new(Cursor::new(bytes)))
    }

    fn sample_file() -> WavFile {
        let data = DataChunk { data: vec![0x00, 0x80, 0xff, 0x7f, 0x01, 0x00] };
        WavFile::new(FmtChunk::new_pcm(1, 22050, 16), data)
    }

    #[test]
    fn verify_round_trip() {
        let mut file = sample_file();
        file.insert_chunk(Box::new(FactChunk { n_frames: 3 })).unwrap();

        let mut buf = Vec::new();
        file.write(&mut buf).unwrap();

        assert_eq!(buf.len() as u64, 8 + u64::from(file.riff_size().unwrap()));

        let read = WavFile::read(&mut stream(buf)).unwrap();

        assert_eq!(read.fmt.n_channels, 1);
        assert_eq!(read.fmt.bits_per_sample, 16);
        assert_eq!(read.fmt.sample_rate, 22050);
        assert_eq!(read.data.data, file.data.data);
        assert_eq!(read.get_chunk::<FactChunk>(), Some(&FactChunk { n_frames: 3 }));
    }

    #[test]
    fn verify_fmt_first_data_last() {
        // A stream with the data chunk before an unknown chunk, and the format chunk last.
        let bytes = b"RIFF\x2e\x00\x00\x00WAVE\
            data\x01\x00\x00\x00\x07\x00\
            LIST\x00\x00\x00\x00\
            fmt \x10\x00\x00\x00\x01\x00\x01\x00\x40\x1f\x00\x00\x40\x1f\x00\x00\x01\x00\x08\x00"
            .to_vec();

        let options = FileOptions { retain_unknown_chunks: true };
        let file = WavFile::read_with_options(&mut stream(bytes), &options).unwrap();

        assert!(file.chunks().next().map(|c| c.is::<RawChunk>()).unwrap_or(false));

        let mut buf = Vec::new();
        file.write(&mut buf).unwrap();

        assert_eq!(&buf[12..16], b"fmt ");
        assert_eq!(&buf[36..40], b"LIST");
        assert_eq!(&buf[44..48], b"data");
        assert_eq!(&buf[52..], &[0x07, 0x00]);
    }

    #[test]
    fn verify_missing_chunks_are_rejected() {
        let no_data = b"RIFF\x1c\x00\x00\x00WAVE\
            fmt \x10\x00\x00\x00\x01\x00\x01\x00\x40\x1f\x00\x00\x40\x1f\x00\x00\x01\x00\x08\x00"
            .to_vec();

        assert!(matches!(WavFile::read(&mut stream(no_data)), Err(Error::ValidationError(_))));

        let no_fmt = b"RIFF\x0e\x00\x00\x00WAVEdata\x02\x00\x00\x00\x01\x02".to_vec();

        assert!(matches!(WavFile::read(&mut stream(no_fmt)), Err(Error::ValidationError(_))));
    }

    #[test]
    fn verify_pinned_tags_cannot_be_inserted() {
        let mut file = sample_file();

        assert!(file.insert_chunk(Box::new(DataChunk::default())).is_err());
        assert!(file.insert_chunk(Box::new(RawChunk::new(*b"fmt ", vec![]))).is_err());
        assert!(file.insert_chunk(Box::new(RawChunk::new(*b"LIST", vec![]))).unwrap().is_none());
        assert!(file.remove_chunk(*b"LIST").is_some());
    }

    #[test]
    fn verify_decode() {
        match sample_file().decode().unwrap() {
            AudioBuffer::S16(buf) => assert_eq!(buf.samples(), &[i16::MIN, i16::MAX, 1]),
            other => panic!("unexpected buffer {:?}", other),
        }
    }

    #[test]
    fn verify_lazy_matches_eager() {
        register_chunks();

        let mut buf = Vec::new();
        sample_file().write(&mut buf).unwrap();

        let eager = WavFile::read(&mut stream(buf.clone())).unwrap();
        let lazy = LazyFile::new(stream(buf), *b"WAVE").unwrap();

        assert_eq!(lazy.get_chunk::<FmtChunk>().unwrap(), Some(&eager.fmt));
        assert_eq!(lazy.get_chunk::<DataChunk>().unwrap(), Some(&eager.data));
        assert_eq!(lazy.get(*b"data").unwrap().map(|c| c.payload_len()), Some(6));
    }

    #[test]
    fn verify_streaming_lengths() {
        register_chunks();

        // Neither the RIFF nor the data chunk length was patched after recording.
        let bytes = b"RIFF\xff\xff\xff\xffWAVE\
            fmt \x10\x00\x00\x00\x01\x00\x01\x00\x40\x1f\x00\x00\x40\x1f\x00\x00\x01\x00\x08\x00\
            data\xff\xff\xff\xff\x10\x20\x30\x40"
            .to_vec();

        let file = WavFile::read(&mut stream(bytes.clone())).unwrap();
        assert_eq!(file.data.data, vec![0x10, 0x20, 0x30, 0x40]);

        let lazy = LazyFile::new(stream(bytes), *b"WAVE").unwrap();
        assert_eq!(lazy.get_chunk::<DataChunk>().unwrap(), Some(&file.data));
    }
}
