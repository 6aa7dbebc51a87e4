// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;
use std::io::{Read, Seek, SeekFrom};

use super::{MediaSource, ReadBytes};

#[inline(always)]
fn end_of_stream_error<T>() -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of stream"))
}

/// `SourceStream` is the common reader type for Chorale.
///
/// A `SourceStream` takes exclusive ownership of a [`MediaSource`] and tracks the absolute
/// position of the stream so that chunk offsets can be recorded while reading. Seeking is only
/// possible if the underlying source reports itself as seekable. Skipping bytes is always
/// possible: on an unseekable source the bytes are read and discarded instead.
pub struct SourceStream {
    /// The source reader.
    inner: Box<dyn MediaSource>,
    /// Cached result of `MediaSource::is_seekable`.
    seekable: bool,
    /// Cached result of `MediaSource::byte_len`.
    byte_len: Option<u64>,
    /// The absolute position of the stream.
    pos: u64,
}

impl SourceStream {
    pub fn new(mut source: Box<dyn MediaSource>) -> Self {
        let seekable = source.is_seekable();
        let byte_len = source.byte_len();

        // A seekable source may already be positioned somewhere other than the start.
        let pos = if seekable { source.stream_position().unwrap_or(0) } else { 0 };

        SourceStream { inner: source, seekable, byte_len, pos }
    }

    /// Returns if the underlying source is seekable.
    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    /// Returns the length in bytes of the underlying source, if known.
    pub fn byte_len(&self) -> Option<u64> {
        self.byte_len
    }

    /// Advances the stream by `count` bytes.
    ///
    /// If the source is seekable the skip is performed with a seek, otherwise the bytes are read
    /// and thrown away. Returns `true` if the seek path was taken. Callers may use this to decide
    /// if stream offsets recorded afterwards can be seeked back to.
    pub fn discard(&mut self, count: u64) -> io::Result<bool> {
        if self.seekable {
            let target = match self.pos.checked_add(count) {
                Some(target) => target,
                None => return end_of_stream_error(),
            };

            // Seeking past the end is permitted by most sources, but the skipped bytes would not
            // exist, so treat it as a short read.
            if let Some(len) = self.byte_len {
                if target > len {
                    return end_of_stream_error();
                }
            }

            self.seek(SeekFrom::Start(target))?;
            Ok(true)
        }
        else {
            let mut skip = Read::by_ref(&mut self.inner).take(count);
            let skipped = io::copy(&mut skip, &mut io::sink())?;

            self.pos += skipped;

            if skipped < count {
                return end_of_stream_error();
            }

            Ok(false)
        }
    }

    /// Unwraps this `SourceStream`, returning the underlying source.
    pub fn into_inner(self) -> Box<dyn MediaSource> {
        self.inner
    }
}

impl io::Read for SourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.inner.read(buf)?;
        self.pos += len as u64;
        Ok(len)
    }
}

impl io::Seek for SourceStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if !self.seekable {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "source is not seekable"));
        }

        self.pos = self.inner.seek(pos)?;
        Ok(self.pos)
    }
}

impl ReadBytes for SourceStream {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        let mut bytes = [0u8; 2];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        let mut bytes = [0u8; 4];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(len) => filled += len,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        Ok(filled)
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.read_exact(buf)
    }

    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        self.discard(count).map(|_| ())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.pos
    }
}
