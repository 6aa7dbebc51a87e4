// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chorale_core::audio::{AudioBuffer, AudioData};
use chorale_core::codecs::AudioFormat;
use chorale_core::conv::remap;
use chorale_core::errors::{unsupported_error, Result};

use crate::chunks::FmtChunk;

/// The sample encodings the WAV decoder can decode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum PcmCodec {
    /// Unsigned integer samples of 1 to 7 bits, stored one per byte.
    SubByte(u8),
    /// Unsigned 8-bit integer samples.
    U8,
    /// Signed 16-bit little-endian integer samples.
    S16Le,
    /// 32-bit little-endian IEEE floating point samples.
    F32Le,
}

impl PcmCodec {
    /// Selects the codec for a format chunk.
    pub(crate) fn for_format(fmt: &FmtChunk) -> Result<PcmCodec> {
        match fmt.audio_format() {
            AudioFormat::Pcm => match fmt.bits_per_sample {
                bits @ 1..=7 => Ok(PcmCodec::SubByte(bits as u8)),
                8 => Ok(PcmCodec::U8),
                16 => Ok(PcmCodec::S16Le),
                _ => unsupported_error("wav: bits per sample for pcm must be 1 to 8, or 16 bits"),
            },
            AudioFormat::IeeeFloat => match fmt.bits_per_sample {
                32 => Ok(PcmCodec::F32Le),
                _ => unsupported_error("wav: bits per sample for ieee float must be 32 bits"),
            },
            _ => unsupported_error("wav: unsupported wave format"),
        }
    }

    /// Gets the number of bytes a sample is stored in.
    pub(crate) fn sample_len(self) -> usize {
        match self {
            PcmCodec::SubByte(_) | PcmCodec::U8 => 1,
            PcmCodec::S16Le => 2,
            PcmCodec::F32Le => 4,
        }
    }

    /// Decodes interleaved samples. A trailing partial sample or frame is dropped.
    pub(crate) fn decode(self, bytes: &[u8], channels: u16, sample_rate: u32) -> AudioBuffer {
        match self {
            PcmCodec::SubByte(bits) => {
                let max = (1u8 << bits) - 1;
                let samples = bytes.iter().map(|&s| remap(s, 0, max, u8::MIN, u8::MAX)).collect();
                AudioBuffer::U8(AudioData::new(samples, channels, sample_rate))
            }
            PcmCodec::U8 => AudioBuffer::U8(AudioData::new(bytes.to_vec(), channels, sample_rate)),
            PcmCodec::S16Le => {
                let samples =
                    bytes.chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]])).collect();
                AudioBuffer::S16(AudioData::new(samples, channels, sample_rate))
            }
            PcmCodec::F32Le => {
                let samples = bytes
                    .chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect();
                AudioBuffer::F32(AudioData::new(samples, channels, sample_rate))
            }
        }
    }
}

/// Decodes the audio data described by a format chunk.
pub fn decode_pcm(fmt: &FmtChunk, bytes: &[u8]) -> Result<AudioBuffer> {
    let codec = PcmCodec::for_format(fmt)?;
    Ok(codec.decode(bytes, fmt.n_channels, fmt.sample_rate))
}
