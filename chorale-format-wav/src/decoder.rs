// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::{Read, Seek, SeekFrom};

use chorale_core::audio::AudioBuffer;
use chorale_core::codecs::{AudioDecoder, AudioFormat, RegisterableAudioDecoder};
use chorale_core::errors::{seek_error, validation_error, Result, SeekErrorKind};
use chorale_core::io::{ReadBytes, SourceStream};
use chorale_format_riff::{read_chunk, tag_to_string, ChunkScanner, ChunkType, RiffHeader};

use log::{debug, info};

use crate::chunks::{DataChunk, FmtChunk};
use crate::pcm::PcmCodec;
use crate::WAVE_FORM;

/// The largest buffer allocated up-front for a read. Larger reads grow the buffer as data arrives.
const MAX_INITIAL_READ_LEN: usize = 64 * 1024;

/// `WavDecoder` reads and decodes the data chunk of a WAVE stream directly from the stream, without
/// loading the whole file.
///
/// Seeking is deferred: [`AudioDecoder::seek`] only updates the logical position, and the stream
/// is repositioned right before the next read. Non-seekable streams support forward seeks only.
pub struct WavDecoder {
    stream: SourceStream,
    fmt: FmtChunk,
    /// The position within the data chunk payload.
    pos: u64,
    /// The length of the data chunk payload.
    size: u64,
    /// The stream position of the first byte of the data chunk payload.
    data_offset: u64,
    /// Set if the stream is not positioned at `data_offset + pos`.
    dirty: bool,
}

impl WavDecoder {
    /// Instantiate a decoder by scanning a WAVE stream from its start up-to the data chunk.
    pub fn try_new(mut stream: SourceStream) -> Result<Self> {
        let riff = RiffHeader::read_expecting(&mut stream, WAVE_FORM)?;

        let mut scanner = ChunkScanner::new(&riff);
        let mut fmt = None;

        while let Some(header) = scanner.next(&mut stream)? {
            match header.tag {
                FmtChunk::TAG => {
                    let chunk = read_chunk::<FmtChunk>(&mut stream, header)?;
                    debug!("{}", chunk);
                    fmt = Some(chunk);
                }
                DataChunk::TAG => {
                    // The format chunk must precede the data chunk.
                    let fmt = match fmt {
                        Some(fmt) => fmt,
                        None => return validation_error("wav: data chunk precedes fmt chunk"),
                    };

                    return Ok(WavDecoder::from_parts(stream, fmt, header.size));
                }
                _ => {
                    info!(
                        "ignoring chunk before data: tag={}, len={}.",
                        tag_to_string(&header.tag),
                        header.size
                    );
                    stream.ignore_bytes(u64::from(header.size))?;
                }
            }
        }

        validation_error("wav: missing data chunk")
    }

    /// Instantiate a decoder from a format chunk and the length of the data chunk payload. The
    /// stream must be positioned at the first byte of the payload.
    pub fn from_parts(stream: SourceStream, fmt: FmtChunk, size: u32) -> Self {
        let data_offset = stream.pos();

        WavDecoder { stream, fmt, pos: 0, size: u64::from(size), data_offset, dirty: false }
    }

    /// Gets the format chunk.
    pub fn fmt(&self) -> &FmtChunk {
        &self.fmt
    }

    /// Gets the length of the data chunk payload in bytes.
    pub fn data_len(&self) -> u64 {
        self.size
    }

    /// Consumes the decoder and returns the stream.
    pub fn into_inner(self) -> SourceStream {
        self.stream
    }

    /// Repositions the stream if a seek is pending.
    fn apply_seek(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let target = self.data_offset + self.pos;

        debug!("applying deferred seek to {}", target);

        if self.stream.is_seekable() {
            self.stream.seek(SeekFrom::Start(target))?;
        }
        else {
            let current = self.stream.pos();

            if target < current {
                // Restore the logical position to where the stream actually is.
                self.pos = current - self.data_offset;
                self.dirty = false;
                return seek_error(SeekErrorKind::ForwardOnly);
            }

            self.stream.discard(target - current)?;
        }

        self.dirty = false;
        Ok(())
    }
}

impl AudioDecoder for WavDecoder {
    fn bit_depth(&self) -> u16 {
        self.fmt.bits_per_sample
    }

    fn sample_alignment(&self) -> u16 {
        self.fmt.block_align
    }

    fn channels(&self) -> u16 {
        self.fmt.n_channels
    }

    fn sample_rate(&self) -> u32 {
        self.fmt.sample_rate
    }

    fn format_kind(&self) -> AudioFormat {
        self.fmt.audio_format()
    }

    fn done(&self) -> bool {
        self.pos >= self.size
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, pos: u64) -> u64 {
        let prev = self.pos;

        self.pos = pos.min(self.size);
        self.dirty |= self.pos != prev;

        prev
    }

    fn read_raw_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let remaining = self.size - self.pos;
        let len = u64::try_from(count).unwrap_or(u64::MAX).min(remaining);

        if len == 0 {
            return Ok(Vec::new());
        }

        self.apply_seek()?;

        let mut buf = Vec::with_capacity((len as usize).min(MAX_INITIAL_READ_LEN));
        let read = (&mut self.stream).take(len).read_to_end(&mut buf)?;

        self.pos += read as u64;

        Ok(buf)
    }

    fn read_samples(&mut self, count: usize) -> Result<AudioBuffer> {
        // Fail before consuming any data if the encoding cannot be decoded.
        let codec = PcmCodec::for_format(&self.fmt)?;

        // The frame length follows from the codec, not the declared block alignment.
        let frame_len = codec.sample_len() * usize::from(self.fmt.n_channels.max(1));
        let bytes = self.read_raw_bytes(count.saturating_mul(frame_len))?;

        Ok(codec.decode(&bytes, self.fmt.n_channels, self.fmt.sample_rate))
    }
}

impl RegisterableAudioDecoder for WavDecoder {
    fn try_registry_new(source: SourceStream) -> Result<Box<dyn AudioDecoder>> {
        Ok(Box::new(WavDecoder::try_new(source)?))
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["wav", "wave"]
    }
}
