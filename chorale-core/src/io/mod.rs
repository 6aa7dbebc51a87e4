// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements composable, endian-aware byte-level I/O.
//!
//! Reading is performed through the [`ReadBytes`] trait, and writing through the [`WriteBytes`]
//! trait. Fixed-width integers may be read and written in an explicit byte order with
//! [`read_value`] and [`write_value`]. Composite types build upon these primitives by implementing
//! [`Serialize`] and [`Deserialize`].
//!
//! All sources are consumed through a [`SourceStream`], which wraps any [`MediaSource`] (aka.
//! [`std::io::Read`] + [`std::io::Seek`]) and tracks the absolute stream position.

use std::io;
use std::mem;

use crate::errors::{Error, Result};

mod source_stream;

pub use source_stream::SourceStream;

/// `MediaSource` is a composite trait of [`std::io::Read`] and [`std::io::Seek`]. A source *must*
/// implement this trait to be used by [`SourceStream`].
///
/// Despite requiring the [`std::io::Seek`] trait, seeking is an optional capability that can be
/// queried at runtime.
pub trait MediaSource: io::Read + io::Seek + Send + Sync {
    /// Returns if the source is seekable. This may be an expensive operation.
    fn is_seekable(&self) -> bool;

    /// Returns the length in bytes, if available. This may be an expensive operation.
    fn byte_len(&self) -> Option<u64>;
}

impl MediaSource for std::fs::File {
    /// Returns if the `std::io::File` backing the `MediaSource` is seekable.
    ///
    /// Note: This operation involves querying the underlying file descriptor for information and
    /// may be moderately expensive. Therefore it is recommended to cache this value if used often.
    fn is_seekable(&self) -> bool {
        // If the file's metadata is available, and the file is a regular file (i.e., not a FIFO,
        // etc.), then the MediaSource will be seekable. Otherwise assume it is not. Note that
        // metadata() follows symlinks.
        match self.metadata() {
            Ok(metadata) => metadata.is_file(),
            _ => false,
        }
    }

    /// Returns the length in bytes of the `std::io::File` backing the `MediaSource`.
    fn byte_len(&self) -> Option<u64> {
        match self.metadata() {
            Ok(metadata) => Some(metadata.len()),
            _ => None,
        }
    }
}

impl<T: std::convert::AsRef<[u8]> + Send + Sync> MediaSource for io::Cursor<T> {
    /// Always returns true since a `io::Cursor<u8>` is always seekable.
    fn is_seekable(&self) -> bool {
        true
    }

    /// Returns the length in bytes of the `io::Cursor<u8>` backing the `MediaSource`.
    fn byte_len(&self) -> Option<u64> {
        Some(self.get_ref().as_ref().len() as u64)
    }
}

/// `ReadOnlySource` wraps any source implementing [`std::io::Read`] in an unseekable
/// [`MediaSource`].
pub struct ReadOnlySource<R: io::Read> {
    inner: R,
}

impl<R: io::Read + Send> ReadOnlySource<R> {
    /// Instantiates a new `ReadOnlySource<R>` by taking ownership and wrapping the provided
    /// `Read`er.
    pub fn new(inner: R) -> Self {
        ReadOnlySource { inner }
    }
}

impl<R: io::Read + Send + Sync> MediaSource for ReadOnlySource<R> {
    fn is_seekable(&self) -> bool {
        false
    }

    fn byte_len(&self) -> Option<u64> {
        None
    }
}

impl<R: io::Read> io::Read for ReadOnlySource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: io::Read> io::Seek for ReadOnlySource<R> {
    fn seek(&mut self, _: io::SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "source does not support seeking"))
    }
}

/// The byte order of a multi-byte value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// The byte order of the host.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Endian = Endian::Little;

    /// The byte order of the host.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Endian = Endian::Big;
}

impl Default for Endian {
    fn default() -> Self {
        Endian::NATIVE
    }
}

/// `Primitive` is implemented by fixed-width integers that may be read or written in an explicit
/// byte order.
pub trait Primitive: Copy + Sized {
    /// Reads the value in the given byte order.
    fn read_endian<B: ReadBytes>(reader: &mut B, endian: Endian) -> io::Result<Self>;

    /// Writes the value in the given byte order.
    fn write_endian<W: WriteBytes + ?Sized>(self, writer: &mut W, endian: Endian) -> Result<()>;
}

macro_rules! primitive_impl {
    ($t:ty) => {
        impl Primitive for $t {
            #[inline]
            fn read_endian<B: ReadBytes>(reader: &mut B, endian: Endian) -> io::Result<Self> {
                let mut buf = [0u8; mem::size_of::<$t>()];
                reader.read_buf_exact(&mut buf)?;

                let value = <$t>::from_ne_bytes(buf);

                Ok(if endian == Endian::NATIVE { value } else { value.swap_bytes() })
            }

            #[inline]
            fn write_endian<W: WriteBytes + ?Sized>(
                self,
                writer: &mut W,
                endian: Endian,
            ) -> Result<()> {
                let value = if endian == Endian::NATIVE { self } else { self.swap_bytes() };
                writer.write_buf(&value.to_ne_bytes())
            }
        }
    };
}

primitive_impl!(u8);
primitive_impl!(i8);
primitive_impl!(u16);
primitive_impl!(i16);
primitive_impl!(u32);
primitive_impl!(i32);
primitive_impl!(u64);
primitive_impl!(i64);

/// Reads a fixed-width integer from the stream in the given byte order.
#[inline]
pub fn read_value<T: Primitive, B: ReadBytes>(reader: &mut B, endian: Endian) -> Result<T> {
    Ok(T::read_endian(reader, endian)?)
}

/// Writes a fixed-width integer to the stream in the given byte order.
#[inline]
pub fn write_value<T: Primitive, W: WriteBytes + ?Sized>(
    writer: &mut W,
    value: T,
    endian: Endian,
) -> Result<()> {
    value.write_endian(writer, endian)
}

/// `Serialize` is implemented by composite types that can write themselves to a stream using the
/// primitive writers.
pub trait Serialize {
    fn serialize<W: WriteBytes + ?Sized>(&self, writer: &mut W) -> Result<()>;
}

/// `Deserialize` is implemented by composite types that can read themselves from a stream using
/// the primitive readers.
pub trait Deserialize: Sized {
    fn deserialize<B: ReadBytes>(reader: &mut B) -> Result<Self>;
}

/// `ReadBytes` provides methods to read bytes and interpret them as little-endian unsigned
/// integers of standard widths. Other byte orders are read with [`read_value`].
pub trait ReadBytes {
    /// Reads a single byte from the stream and returns it or an error.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Reads two bytes from the stream and returns them in read-order or an error.
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]>;

    /// Reads four bytes from the stream and returns them in read-order or an error.
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]>;

    /// Reads up-to the number of bytes required to fill buf or returns an error. Returns the
    /// number of bytes read, which is only less than the length of buf at the end of the stream.
    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Reads exactly the number of bytes required to fill be provided buffer or returns an error.
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Reads a single unsigned byte from the stream and returns it or an error.
    #[inline(always)]
    fn read_u8(&mut self) -> io::Result<u8> {
        self.read_byte()
    }

    /// Reads two bytes from the stream and interprets them as an unsigned 16-bit little-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_u16(&mut self) -> io::Result<u16> {
        Ok(u16::from_le_bytes(self.read_double_bytes()?))
    }

    /// Reads four bytes from the stream and interprets them as an unsigned 32-bit little-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_u32(&mut self) -> io::Result<u32> {
        Ok(u32::from_le_bytes(self.read_quad_bytes()?))
    }

    /// Ignores the specified number of bytes from the stream or returns an error.
    fn ignore_bytes(&mut self, count: u64) -> io::Result<()>;

    /// Gets the position of the stream.
    fn pos(&self) -> u64;
}

impl<R: ReadBytes> ReadBytes for &mut R {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        (*self).read_byte()
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        (*self).read_double_bytes()
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        (*self).read_quad_bytes()
    }

    #[inline(always)]
    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (*self).read_buf(buf)
    }

    #[inline(always)]
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        (*self).read_buf_exact(buf)
    }

    #[inline(always)]
    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        (*self).ignore_bytes(count)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        (**self).pos()
    }
}

/// `WriteBytes` provides methods to write unsigned integers of standard widths as little-endian
/// bytes. Other byte orders are written with [`write_value`]. All write failures are reported as
/// [`Error::SerializeError`].
pub trait WriteBytes {
    /// Writes the entire buffer to the stream or returns an error.
    fn write_buf(&mut self, buf: &[u8]) -> Result<()>;

    /// Writes a single unsigned byte.
    #[inline(always)]
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_buf(&[value])
    }

    /// Writes four bytes as-is, for example a chunk tag.
    #[inline(always)]
    fn write_quad_bytes(&mut self, bytes: [u8; 4]) -> Result<()> {
        self.write_buf(&bytes)
    }

    /// Writes an unsigned 16-bit integer in little-endian byte order.
    #[inline(always)]
    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_buf(&value.to_le_bytes())
    }

    /// Writes an unsigned 32-bit integer in little-endian byte order.
    #[inline(always)]
    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_buf(&value.to_le_bytes())
    }
}

impl<W: io::Write + ?Sized> WriteBytes for W {
    #[inline(always)]
    fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        self.write_all(buf).map_err(Error::SerializeError)
    }
}
