// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::any::Any;
use std::fmt;
use std::io;

use chorale_core::errors::{identifier_error, Result};
use chorale_core::io::{Deserialize, ReadBytes, Serialize, WriteBytes};

/// The RIFF stream marker.
pub const RIFF_STREAM_MARKER: [u8; 4] = *b"RIFF";

/// The length written for the RIFF chunk and the last chunk by streaming encoders that cannot seek
/// back to patch lengths. The payload of such a chunk extends to the end of the stream.
pub const STREAMING_LEN: u32 = u32::MAX;

/// The largest payload buffer allocated up-front. Longer payloads grow the buffer as data arrives.
const MAX_INITIAL_PAYLOAD_LEN: usize = 64 * 1024;

/// Gets the number of bytes a chunk payload of `len` bytes occupies in the stream, including the
/// pad byte that aligns odd-length payloads to a 2-byte boundary.
#[inline]
pub fn padded_len(len: u32) -> u64 {
    u64::from(len) + u64::from(len & 0x1)
}

/// Formats a chunk tag for display. Tags are not required to be valid ASCII.
pub fn tag_to_string(tag: &[u8; 4]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

/// `ChunkHeader` precedes every chunk in a RIFF stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    /// The 4-byte chunk tag. Compared by identity, not as a string.
    pub tag: [u8; 4],
    /// The length of the chunk payload in bytes, excluding this header and any pad byte.
    pub size: u32,
}

impl ChunkHeader {
    /// The serialized length of a chunk header.
    pub const LEN: u64 = 8;

    /// Returns `true` if the chunk has the streaming length.
    pub fn is_streaming(&self) -> bool {
        self.size == STREAMING_LEN
    }
}

impl Serialize for ChunkHeader {
    fn serialize<W: WriteBytes + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_quad_bytes(self.tag)?;
        writer.write_u32(self.size)
    }
}

impl Deserialize for ChunkHeader {
    fn deserialize<B: ReadBytes>(reader: &mut B) -> Result<Self> {
        let tag = reader.read_quad_bytes()?;
        let size = reader.read_u32()?;
        Ok(ChunkHeader { tag, size })
    }
}

/// `RiffHeader` is the header of a RIFF stream. A RIFF stream is one large chunk tagged "RIFF"
/// whose payload is a 4-byte form type followed by sub-chunks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RiffHeader {
    /// The length of the RIFF chunk payload: the form type plus all sub-chunks.
    pub size: u32,
    /// The form type, for example "WAVE".
    pub form: [u8; 4],
}

impl RiffHeader {
    /// The serialized length of a RIFF header.
    pub const LEN: u64 = 12;

    /// Reads a RIFF header and verifies the form type matches `form`.
    pub fn read_expecting<B: ReadBytes>(reader: &mut B, form: [u8; 4]) -> Result<Self> {
        let header = RiffHeader::deserialize(reader)?;

        if header.form != form {
            log::error!(
                "riff form is not {} ({})",
                tag_to_string(&form),
                tag_to_string(&header.form)
            );
            return identifier_error("riff: unexpected riff form");
        }

        Ok(header)
    }
}

impl Serialize for RiffHeader {
    fn serialize<W: WriteBytes + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_quad_bytes(RIFF_STREAM_MARKER)?;
        writer.write_u32(self.size)?;
        writer.write_quad_bytes(self.form)
    }
}

impl Deserialize for RiffHeader {
    fn deserialize<B: ReadBytes>(reader: &mut B) -> Result<Self> {
        // The RIFF marker should be present.
        let marker = reader.read_quad_bytes()?;

        if marker != RIFF_STREAM_MARKER {
            return identifier_error("riff: missing riff stream marker");
        }

        let size = reader.read_u32()?;
        let form = reader.read_quad_bytes()?;

        Ok(RiffHeader { size, form })
    }
}

/// `Chunk` is implemented by every parsed chunk held by a RIFF container.
pub trait Chunk: Any + Send + Sync {
    /// Gets the chunk tag.
    fn tag(&self) -> [u8; 4];

    /// Gets the length of the chunk payload in bytes, excluding the header and any pad byte.
    fn payload_len(&self) -> u32;

    /// Writes exactly `payload_len()` bytes of payload.
    fn write_payload(&self, writer: &mut dyn io::Write) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Gets the chunk header that will be written for this chunk.
    fn header(&self) -> ChunkHeader {
        ChunkHeader { tag: self.tag(), size: self.payload_len() }
    }

    /// Gets the number of bytes the chunk occupies in a stream, including the header and any pad
    /// byte.
    fn serialized_len(&self) -> u64 {
        ChunkHeader::LEN + padded_len(self.payload_len())
    }
}

impl dyn Chunk {
    /// Returns `true` if the chunk is of type `T`.
    pub fn is<T: Chunk>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Gets a reference to the chunk as type `T`.
    pub fn downcast_ref<T: Chunk>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Gets a mutable reference to the chunk as type `T`.
    pub fn downcast_mut<T: Chunk>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Converts the boxed chunk into a boxed `T`.
    pub fn downcast<T: Chunk>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl fmt::Debug for dyn Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("tag", &tag_to_string(&self.tag()))
            .field("len", &self.payload_len())
            .finish()
    }
}

/// `ChunkType` is implemented by chunks with a fixed tag that can be registered with a
/// [`ChunkRegistry`](crate::ChunkRegistry).
pub trait ChunkType: Chunk + Sized {
    /// The tag of the chunk.
    const TAG: [u8; 4];

    /// Reads the chunk payload described by `header`. The reader is positioned at the first byte of
    /// the payload. Implementations must not read more than `header.size` bytes, but may read less.
    fn read<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self>;
}

/// Writes a chunk header, the chunk payload, and the pad byte if the payload length is odd.
pub fn write_chunk(writer: &mut dyn io::Write, chunk: &dyn Chunk) -> Result<()> {
    let header = chunk.header();

    header.serialize(writer)?;
    chunk.write_payload(writer)?;

    if header.size & 0x1 == 1 {
        writer.write_u8(0)?;
    }

    Ok(())
}

/// Reads the whole payload of a chunk.
///
/// The declared length is untrusted, so the buffer grows as data arrives rather than being
/// allocated up-front. The payload of a chunk with the streaming length ends with the stream,
/// otherwise a short payload is an error.
pub fn read_payload<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Vec<u8>> {
    let len = usize::try_from(header.size).unwrap_or(usize::MAX);

    let mut data = Vec::with_capacity(len.min(MAX_INITIAL_PAYLOAD_LEN));
    let mut block = [0u8; 4096];

    while data.len() < len {
        let want = block.len().min(len - data.len());
        let read = reader.read_buf(&mut block[..want])?;

        data.extend_from_slice(&block[..read]);

        // A short read only happens at the end of the stream.
        if read < want {
            if header.is_streaming() {
                break;
            }
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of stream").into());
        }
    }

    Ok(data)
}

/// `RawChunk` holds the unparsed payload of a chunk of any tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawChunk {
    pub tag: [u8; 4],
    pub data: Vec<u8>,
}

impl RawChunk {
    pub fn new(tag: [u8; 4], data: Vec<u8>) -> Self {
        RawChunk { tag, data }
    }

    /// Reads `header.size` bytes of payload, or up-to the end of the stream for a chunk with the
    /// streaming length.
    pub fn read<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        Ok(RawChunk { tag: header.tag, data: read_payload(reader, header)? })
    }
}

impl Chunk for RawChunk {
    fn tag(&self) -> [u8; 4] {
        self.tag
    }

    fn payload_len(&self) -> u32 {
        self.data.len() as u32
    }

    fn write_payload(&self, writer: &mut dyn io::Write) -> Result<()> {
        writer.write_buf(&self.data)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
