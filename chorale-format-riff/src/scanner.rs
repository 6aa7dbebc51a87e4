// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;

use chorale_core::errors::{validation_error, Result};
use chorale_core::io::ReadBytes;

use log::debug;

use crate::chunks::{tag_to_string, ChunkHeader, RiffHeader, STREAMING_LEN};

/// Returns `None` instead of an error if the stream ended.
fn eof_to_none<T>(result: io::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// `ChunkScanner` walks the chunk headers of a parent chunk.
///
/// Each call to [`ChunkScanner::next`] returns the header of the next sub-chunk. The caller must
/// then consume exactly `header.size` bytes of payload before calling `next` again. The scanner
/// takes care of the pad byte that follows odd-length payloads.
///
/// Scanning stops when the parent's declared length is consumed, or when the stream ends at a chunk
/// boundary.
pub struct ChunkScanner {
    len: u64,
    consumed: u64,
}

impl ChunkScanner {
    /// Instantiate a scanner for the sub-chunks of a RIFF stream whose header, including the form
    /// type, was just read.
    pub fn new(riff: &RiffHeader) -> Self {
        // The form type is part of the RIFF payload.
        ChunkScanner { len: u64::from(riff.size), consumed: 4 }
    }

    /// Gets the number of bytes of the parent payload consumed so far, including the headers,
    /// payloads, and pad bytes of all returned chunks.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Reads the next chunk header.
    pub fn next<B: ReadBytes>(&mut self, reader: &mut B) -> Result<Option<ChunkHeader>> {
        // Check if at the end of the parent chunk.
        if self.consumed >= self.len {
            return Ok(None);
        }

        // Align to the next 2-byte boundary if not currently aligned.
        if self.consumed & 0x1 == 1 {
            if eof_to_none(reader.read_u8())?.is_none() {
                return Ok(None);
            }
            self.consumed += 1;
        }

        // Check if there are enough bytes (8) to read a chunk header. If not, there are no more
        // chunks to be read.
        if self.consumed + ChunkHeader::LEN > self.len {
            return Ok(None);
        }

        let tag = match eof_to_none(reader.read_quad_bytes())? {
            Some(tag) => tag,
            None => return Ok(None),
        };

        let size = reader.read_u32()?;

        self.consumed += ChunkHeader::LEN;

        // Streaming encoders that cannot seek back to patch lengths write the streaming length for
        // both the RIFF and the chunk lengths.
        let is_streaming = self.len == u64::from(STREAMING_LEN) && size == STREAMING_LEN;

        // The chunk length is untrusted and may overflow if added to anything.
        if !is_streaming && self.len - self.consumed < u64::from(size) {
            debug!("chunk length of {} exceeds parent chunk length", tag_to_string(&tag));
            return validation_error("riff: chunk length exceeds parent chunk length");
        }

        self.consumed = self.consumed.saturating_add(u64::from(size));

        Ok(Some(ChunkHeader { tag, size }))
    }
}
