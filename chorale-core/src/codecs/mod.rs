// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `codecs` module provides the traits and support structures necessary to implement audio
//! decoders, and a registry to select a decoder by file extension.

use std::fmt;

use crate::audio::AudioBuffer;
use crate::errors::Result;

mod registry;

pub use registry::{AudioDecoderFactoryFn, DecoderRegistry, RegisterableAudioDecoder};

/// The encoding of the audio data a decoder consumes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AudioFormat {
    /// Linear PCM with integer samples.
    Pcm,
    /// Linear PCM with IEEE floating point samples.
    IeeeFloat,
    /// ITU G.711 A-law.
    ALaw,
    /// ITU G.711 μ-law.
    MuLaw,
    /// A WAVE extensible format whose sub-format is not recognized.
    Extensible,
    /// MPEG audio.
    Mpeg,
    /// Vorbis.
    Vorbis,
    /// An unrecognized WAVE format tag.
    Unknown(u16),
}

impl AudioFormat {
    /// The WAVE format tag for linear PCM with integer samples.
    pub const WAVE_FORMAT_PCM: u16 = 0x0001;
    /// The WAVE format tag for IEEE floating point samples.
    pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
    /// The WAVE format tag for A-law.
    pub const WAVE_FORMAT_ALAW: u16 = 0x0006;
    /// The WAVE format tag for μ-law.
    pub const WAVE_FORMAT_MULAW: u16 = 0x0007;
    /// The WAVE format tag for the extensible format.
    pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xfffe;

    /// Maps a WAVE format tag to an `AudioFormat`. The definition of these format tags can be
    /// found in mmreg.h of the Microsoft Windows Platform SDK.
    pub fn from_wave_format_tag(tag: u16) -> Self {
        match tag {
            AudioFormat::WAVE_FORMAT_PCM => AudioFormat::Pcm,
            AudioFormat::WAVE_FORMAT_IEEE_FLOAT => AudioFormat::IeeeFloat,
            AudioFormat::WAVE_FORMAT_ALAW => AudioFormat::ALaw,
            AudioFormat::WAVE_FORMAT_MULAW => AudioFormat::MuLaw,
            AudioFormat::WAVE_FORMAT_EXTENSIBLE => AudioFormat::Extensible,
            _ => AudioFormat::Unknown(tag),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            AudioFormat::Pcm => write!(f, "pcm"),
            AudioFormat::IeeeFloat => write!(f, "ieee float"),
            AudioFormat::ALaw => write!(f, "a-law"),
            AudioFormat::MuLaw => write!(f, "mu-law"),
            AudioFormat::Extensible => write!(f, "extensible"),
            AudioFormat::Mpeg => write!(f, "mpeg"),
            AudioFormat::Vorbis => write!(f, "vorbis"),
            AudioFormat::Unknown(tag) => write!(f, "unknown ({:#06x})", tag),
        }
    }
}

/// An `AudioDecoder` reads audio from a stream it exclusively owns and decodes it into
/// [`AudioBuffer`]s.
///
/// Positions are byte offsets into the encoded audio payload. A "sample" in the context of
/// seeking and reading is one frame: a sample for every channel.
pub trait AudioDecoder: Send + Sync {
    /// Gets the number of bits per encoded sample.
    fn bit_depth(&self) -> u16;

    /// Gets the number of bytes per encoded frame.
    fn sample_alignment(&self) -> u16;

    /// Gets the number of channels.
    fn channels(&self) -> u16;

    /// Gets the sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Gets the encoding of the audio payload.
    fn format_kind(&self) -> AudioFormat;

    /// Returns `true` if the entire payload has been read.
    fn done(&self) -> bool;

    /// Gets the current byte position within the payload.
    fn tell(&self) -> u64;

    /// Seeks to a byte position within the payload, and returns the previous position. The
    /// position is clamped to the length of the payload.
    fn seek(&mut self, pos: u64) -> u64;

    /// Reads up-to `count` bytes of the encoded payload. Fewer bytes are returned at the end of the
    /// payload or stream.
    fn read_raw_bytes(&mut self, count: usize) -> Result<Vec<u8>>;

    /// Reads and decodes up-to `count` frames. A `count` larger than the remaining number of
    /// frames reads until the end of the payload.
    fn read_samples(&mut self, count: usize) -> Result<AudioBuffer>;

    /// Seeks to a frame, and returns the previous frame position.
    fn seek_by_sample(&mut self, frame: u64) -> u64 {
        let align = u64::from(self.sample_alignment().max(1));
        self.seek(frame.saturating_mul(align)) / align
    }

    /// Seeks to a time in seconds, and returns the previous time in seconds.
    fn seek_by_seconds(&mut self, secs: f64) -> f64 {
        let rate = f64::from(self.sample_rate().max(1));
        let prev = self.seek_by_sample((secs.max(0.0) * rate) as u64);
        prev as f64 / rate
    }

    /// Reads and decodes up-to `secs` seconds of audio.
    fn read_by_seconds(&mut self, secs: f64) -> Result<AudioBuffer> {
        let frames = (secs.max(0.0) * f64::from(self.sample_rate())).round();
        self.read_samples(frames as usize)
    }

    /// Reads and decodes all remaining audio.
    fn read_all(&mut self) -> Result<AudioBuffer> {
        self.read_samples(usize::MAX)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{AudioDecoder, AudioFormat};
    use crate::audio::{AudioBuffer, AudioData};
    use crate::errors::Result;

    /// An 8-bit mono decoder over an in-memory payload.
    pub struct MemoryDecoder {
        pub payload: Vec<u8>,
        pub pos: u64,
    }

    impl AudioDecoder for MemoryDecoder {
        fn bit_depth(&self) -> u16 {
            8
        }

        fn sample_alignment(&self) -> u16 {
            1
        }

        fn channels(&self) -> u16 {
            1
        }

        fn sample_rate(&self) -> u32 {
            10
        }

        fn format_kind(&self) -> AudioFormat {
            AudioFormat::Pcm
        }

        fn done(&self) -> bool {
            self.pos >= self.payload.len() as u64
        }

        fn tell(&self) -> u64 {
            self.pos
        }

        fn seek(&mut self, pos: u64) -> u64 {
            std::mem::replace(&mut self.pos, pos.min(self.payload.len() as u64))
        }

        fn read_raw_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
            let start = self.pos as usize;
            let end = start + count.min(self.payload.len() - start);
            self.pos = end as u64;
            Ok(self.payload[start..end].to_vec())
        }

        fn read_samples(&mut self, count: usize) -> Result<AudioBuffer> {
            let bytes = self.read_raw_bytes(count)?;
            Ok(AudioBuffer::U8(AudioData::new(bytes, 1, 10)))
        }
    }

    fn decoder() -> MemoryDecoder {
        MemoryDecoder { payload: (0..40).collect(), pos: 0 }
    }

    #[test]
    fn verify_read_all_reads_to_end() {
        let mut dec = decoder();
        dec.seek(5);

        let all = dec.read_all().unwrap();
        assert_eq!(all.frames(), 35);
        assert!(dec.done());
    }

    #[test]
    fn verify_seconds_conversions() {
        let mut dec = decoder();

        assert_eq!(dec.seek_by_seconds(1.5), 0.0);
        assert_eq!(dec.tell(), 15);
        assert_eq!(dec.seek_by_seconds(0.0), 1.5);

        let buf = dec.read_by_seconds(2.0).unwrap();
        assert_eq!(buf.frames(), 20);

        // Clamped to the end of the payload.
        assert_eq!(dec.seek_by_sample(1000), 20);
        assert_eq!(dec.tell(), 40);
    }

    #[test]
    fn verify_format_tags() {
        assert_eq!(AudioFormat::from_wave_format_tag(1), AudioFormat::Pcm);
        assert_eq!(AudioFormat::from_wave_format_tag(3), AudioFormat::IeeeFloat);
        assert_eq!(AudioFormat::from_wave_format_tag(6), AudioFormat::ALaw);
        assert_eq!(AudioFormat::from_wave_format_tag(7), AudioFormat::MuLaw);
        assert_eq!(AudioFormat::from_wave_format_tag(0xfffe), AudioFormat::Extensible);
        assert_eq!(AudioFormat::from_wave_format_tag(0x55), AudioFormat::Unknown(0x55));
    }
}
