// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::io;
use std::result;

/// `SeekErrorKind` is a list of generic reasons why a seek may fail.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SeekErrorKind {
    /// The stream is not seekable at all.
    Unseekable,
    /// The stream can only be seeked forward.
    ForwardOnly,
}

impl SeekErrorKind {
    fn as_str(&self) -> &'static str {
        match *self {
            SeekErrorKind::Unseekable => "stream is not seekable",
            SeekErrorKind::ForwardOnly => "stream can only be seeked forward",
        }
    }
}

/// `NotFoundKind` identifies which registry failed to provide a handler.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NotFoundKind {
    /// No factory is registered for the requested chunk tag.
    ChunkType,
    /// No decoder factory is registered for the requested file extension.
    Extension,
}

impl NotFoundKind {
    fn as_str(&self) -> &'static str {
        match *self {
            NotFoundKind::ChunkType => "no factory registered for chunk type",
            NotFoundKind::Extension => "no decoder registered for extension",
        }
    }
}

/// `IndexErrorKind` identifies which dimension of an audio buffer was indexed out-of-range.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IndexErrorKind {
    /// The frame index exceeds the number of frames in the buffer.
    Frame,
    /// The channel index exceeds the number of channels in the buffer.
    Channel,
}

impl IndexErrorKind {
    fn as_str(&self) -> &'static str {
        match *self {
            IndexErrorKind::Frame => "frame index out-of-range",
            IndexErrorKind::Channel => "channel index out-of-range",
        }
    }
}

/// `Error` provides an enumeration of all possible errors reported by Chorale.
#[derive(Debug)]
pub enum Error {
    /// An IO error occured while reading or seeking the stream.
    IoError(std::io::Error),
    /// An IO error occured while writing (serializing) to the stream.
    SerializeError(std::io::Error),
    /// The stream does not start with the expected magic or container form.
    IdentifierError(&'static str),
    /// The container is well-formed, but a field holds an invalid value.
    ValidationError(&'static str),
    /// An unsupported container or codec feature was encounted.
    Unsupported(&'static str),
    /// No handler is registered for the requested chunk type or file extension.
    NotFound(NotFoundKind),
    /// An audio buffer was indexed out-of-range.
    IndexError(IndexErrorKind),
    /// The stream could not be seeked.
    SeekError(SeekErrorKind),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => err.fmt(f),
            Error::SerializeError(ref err) => {
                write!(f, "serialize error: {}", err)
            }
            Error::IdentifierError(msg) => {
                write!(f, "unexpected identifier: {}", msg)
            }
            Error::ValidationError(msg) => {
                write!(f, "invalid field: {}", msg)
            }
            Error::Unsupported(feature) => {
                write!(f, "unsupported feature: {}", feature)
            }
            Error::NotFound(ref kind) => {
                write!(f, "not found: {}", kind.as_str())
            }
            Error::IndexError(ref kind) => {
                write!(f, "index error: {}", kind.as_str())
            }
            Error::SeekError(ref kind) => {
                write!(f, "seek error: {}", kind.as_str())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            Error::SerializeError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create an identifier error.
pub fn identifier_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::IdentifierError(desc))
}

/// Convenience function to create a validation error.
pub fn validation_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::ValidationError(desc))
}

/// Convenience function to create an unsupport feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(Error::Unsupported(feature))
}

/// Convenience function to create a not found error.
pub fn not_found_error<T>(kind: NotFoundKind) -> Result<T> {
    Err(Error::NotFound(kind))
}

/// Convenience function to create an index error.
pub fn index_error<T>(kind: IndexErrorKind) -> Result<T> {
    Err(Error::IndexError(kind))
}

/// Convenience function to create a seek error.
pub fn seek_error<T>(kind: SeekErrorKind) -> Result<T> {
    Err(Error::SeekError(kind))
}
