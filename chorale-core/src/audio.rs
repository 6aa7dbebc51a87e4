// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `audio` module provides primitives for working with multi-channel audio buffers of varying
//! sample formats.

use std::fmt;

use bitflags::bitflags;

use crate::conv::FromSample;
use crate::errors::{index_error, unsupported_error, validation_error, IndexErrorKind, Result};
use crate::sample::{Sample, SampleFormat};

bitflags! {
    /// Channels is a bit mask of all channels contained in a signal.
    ///
    /// The bit positions match the speaker positions of a WAVE extensible channel mask. Bits with
    /// no named position are retained.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Channels: u32 {
        /// Front-left (left) or the Mono channel.
        const FRONT_LEFT         = 0x0000_0001;
        /// Front-right (right) channel.
        const FRONT_RIGHT        = 0x0000_0002;
        /// Front-centre (centre) channel.
        const FRONT_CENTRE       = 0x0000_0004;
        /// Low frequency channel 1.
        const LFE1               = 0x0000_0008;
        /// Rear-left (surround rear left) channel.
        const REAR_LEFT          = 0x0000_0010;
        /// Rear-right (surround rear right) channel.
        const REAR_RIGHT         = 0x0000_0020;
        /// Front left-of-centre (left center) channel.
        const FRONT_LEFT_CENTRE  = 0x0000_0040;
        /// Front right-of-centre (right center) channel.
        const FRONT_RIGHT_CENTRE = 0x0000_0080;
        /// Rear-centre (surround rear centre) channel.
        const REAR_CENTRE        = 0x0000_0100;
        /// Side left (surround left) channel.
        const SIDE_LEFT          = 0x0000_0200;
        /// Side right (surround right) channel.
        const SIDE_RIGHT         = 0x0000_0400;
        /// Top centre channel.
        const TOP_CENTRE         = 0x0000_0800;
        /// Top front-left channel.
        const TOP_FRONT_LEFT     = 0x0000_1000;
        /// Top centre channel.
        const TOP_FRONT_CENTRE   = 0x0000_2000;
        /// Top front-right channel.
        const TOP_FRONT_RIGHT    = 0x0000_4000;
        /// Top rear-left channel.
        const TOP_REAR_LEFT      = 0x0000_8000;
        /// Top rear-centre channel.
        const TOP_REAR_CENTRE    = 0x0001_0000;
        /// Top rear-right channel.
        const TOP_REAR_RIGHT     = 0x0002_0000;
    }
}

impl Channels {
    /// Gets the number of channels.
    pub fn count(self) -> usize {
        self.bits().count_ones() as usize
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#034b}", self.bits())
    }
}

/// `AudioData` is an interleaved buffer of multi-channel audio samples.
///
/// Samples are stored frame-by-frame, and within a frame, channel-by-channel. The buffer always
/// holds a whole number of frames.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioData<S: Sample> {
    samples: Vec<S>,
    channels: u16,
    sample_rate: u32,
}

impl<S: Sample> AudioData<S> {
    /// Instantiate a new `AudioData` from interleaved samples. A trailing partial frame is
    /// dropped.
    pub fn new(mut samples: Vec<S>, channels: u16, sample_rate: u32) -> Self {
        let n_channels = usize::from(channels);
        let frames = if n_channels == 0 { 0 } else { samples.len() / n_channels };

        samples.truncate(frames * n_channels);

        AudioData { samples, channels, sample_rate }
    }

    /// Instantiate an empty `AudioData`.
    pub fn empty(channels: u16, sample_rate: u32) -> Self {
        AudioData { samples: Vec::new(), channels, sample_rate }
    }

    /// Gets the number of channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Gets the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Gets the number of frames.
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            channels => self.samples.len() / usize::from(channels),
        }
    }

    /// Gets the total number of samples across all channels, `channels * frames`.
    pub fn total_samples(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Gets the duration of the buffer in seconds.
    pub fn duration_secs(&self) -> f64 {
        match self.sample_rate {
            0 => 0.0,
            rate => self.frames() as f64 / f64::from(rate),
        }
    }

    /// Gets the interleaved samples.
    pub fn samples(&self) -> &[S] {
        &self.samples
    }

    /// Unwraps the interleaved samples.
    pub fn into_samples(self) -> Vec<S> {
        self.samples
    }

    /// Gets the sample at the given frame and channel.
    pub fn get(&self, frame: usize, channel: usize) -> Result<S> {
        if frame >= self.frames() {
            return index_error(IndexErrorKind::Frame);
        }
        if channel >= usize::from(self.channels) {
            return index_error(IndexErrorKind::Channel);
        }

        Ok(self.samples[frame * usize::from(self.channels) + channel])
    }

    /// Gets all samples of the given frame.
    pub fn frame(&self, frame: usize) -> Result<&[S]> {
        if frame >= self.frames() {
            return index_error(IndexErrorKind::Frame);
        }

        let n_channels = usize::from(self.channels);
        Ok(&self.samples[frame * n_channels..(frame + 1) * n_channels])
    }

    /// Converts every sample to the sample format `T`.
    pub fn convert<T: Sample>(&self) -> AudioData<T> {
        AudioData {
            samples: self.samples.iter().map(|&s| T::from_sample(s)).collect(),
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Down-mixes all channels into a single channel by averaging each frame.
    pub fn to_mono(&self) -> AudioData<S> {
        if self.channels <= 1 {
            return self.clone();
        }

        let samples =
            self.samples.chunks_exact(usize::from(self.channels)).map(S::mean).collect();

        AudioData { samples, channels: 1, sample_rate: self.sample_rate }
    }

    /// Remaps the buffer to the given number of channels.
    ///
    /// Any buffer may be down-mixed to mono, and a mono buffer may be up-mixed to any number of
    /// channels by duplicating the mono channel. Other remappings require a channel layout and are
    /// not supported.
    pub fn to_channels(&self, channels: u16) -> Result<AudioData<S>> {
        if channels == 0 {
            return validation_error("audio: channel count must be non-zero");
        }

        if channels == self.channels {
            Ok(self.clone())
        }
        else if channels == 1 {
            Ok(self.to_mono())
        }
        else if self.channels == 1 {
            let n_channels = usize::from(channels);

            let mut samples = Vec::with_capacity(self.samples.len() * n_channels);

            for &sample in self.samples.iter() {
                samples.extend(std::iter::repeat(sample).take(n_channels));
            }

            Ok(AudioData { samples, channels, sample_rate: self.sample_rate })
        }
        else {
            unsupported_error("audio: only mono down-mixing and up-mixing is supported")
        }
    }
}

/// `AudioBuffer` holds decoded audio in the sample format native to the decoder that produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum AudioBuffer {
    U8(AudioData<u8>),
    S16(AudioData<i16>),
    F32(AudioData<f32>),
}

impl AudioBuffer {
    /// Gets the sample format of the buffer.
    pub fn sample_format(&self) -> SampleFormat {
        match self {
            AudioBuffer::U8(_) => SampleFormat::U8,
            AudioBuffer::S16(_) => SampleFormat::S16,
            AudioBuffer::F32(_) => SampleFormat::F32,
        }
    }

    /// Gets the number of channels.
    pub fn channels(&self) -> u16 {
        match self {
            AudioBuffer::U8(buf) => buf.channels(),
            AudioBuffer::S16(buf) => buf.channels(),
            AudioBuffer::F32(buf) => buf.channels(),
        }
    }

    /// Gets the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        match self {
            AudioBuffer::U8(buf) => buf.sample_rate(),
            AudioBuffer::S16(buf) => buf.sample_rate(),
            AudioBuffer::F32(buf) => buf.sample_rate(),
        }
    }

    /// Gets the number of frames.
    pub fn frames(&self) -> usize {
        match self {
            AudioBuffer::U8(buf) => buf.frames(),
            AudioBuffer::S16(buf) => buf.frames(),
            AudioBuffer::F32(buf) => buf.frames(),
        }
    }

    /// Returns `true` if the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Converts the buffer to the sample format `T`.
    pub fn convert<T: Sample>(&self) -> AudioData<T> {
        match self {
            AudioBuffer::U8(buf) => buf.convert(),
            AudioBuffer::S16(buf) => buf.convert(),
            AudioBuffer::F32(buf) => buf.convert(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AudioBuffer, AudioData, Channels};
    use crate::errors::{Error, IndexErrorKind};

    #[test]
    fn verify_trailing_partial_frame_is_dropped() {
        let buf = AudioData::new(vec![1i16, 2, 3, 4, 5], 2, 8000);

        assert_eq!(buf.frames(), 2);
        assert_eq!(buf.total_samples(), 4);
        assert_eq!(buf.samples(), &[1, 2, 3, 4]);
    }

    #[test]
    fn verify_get_bounds_are_distinct() {
        let buf = AudioData::new(vec![1u8, 2, 3, 4, 5, 6], 3, 8000);

        assert_eq!(buf.get(1, 2).unwrap(), 6);
        assert_eq!(buf.frame(1).unwrap(), &[4, 5, 6]);

        match buf.get(2, 0) {
            Err(Error::IndexError(IndexErrorKind::Frame)) => (),
            other => panic!("unexpected result {:?}", other),
        }
        match buf.get(0, 3) {
            Err(Error::IndexError(IndexErrorKind::Channel)) => (),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn verify_mono_downmix_midpoint() {
        let buf = AudioData::new(vec![0u8, 255, 10, 20], 2, 8000);
        let mono = buf.to_mono();

        assert_eq!(mono.channels(), 1);
        assert_eq!(mono.samples(), &[127, 15]);

        let buf = AudioData::new(vec![i16::MAX, i16::MAX, i16::MIN, i16::MIN], 2, 8000);
        assert_eq!(buf.to_mono().samples(), &[i16::MAX, i16::MIN]);

        let buf = AudioData::new(vec![1.0f32, 0.0, -0.5, -0.5], 2, 8000);
        assert_eq!(buf.to_mono().samples(), &[0.5, -0.5]);
    }

    #[test]
    fn verify_to_channels() {
        let mono = AudioData::new(vec![1i16, 2], 1, 8000);

        let stereo = mono.to_channels(2).unwrap();
        assert_eq!(stereo.samples(), &[1, 1, 2, 2]);
        assert_eq!(stereo.to_channels(1).unwrap(), mono);

        let quad = AudioData::new(vec![0i16; 8], 4, 8000);
        assert!(quad.to_channels(2).is_err());
        assert!(quad.to_channels(0).is_err());
    }

    #[test]
    fn verify_buffer_convert() {
        let buf = AudioBuffer::U8(AudioData::new(vec![0, 128, 255], 1, 22050));

        let converted = buf.convert::<i16>();
        assert_eq!(converted.samples(), &[i16::MIN, 0, i16::MAX]);
        assert_eq!(converted.sample_rate(), 22050);
        assert_eq!(buf.frames(), 3);
    }

    #[test]
    fn verify_float_convert_is_clamped() {
        let buf = AudioBuffer::F32(AudioData::new(vec![2.5, -7.0, 0.5], 1, 8000));

        assert_eq!(buf.convert::<f64>().samples(), &[1.0, -1.0, 0.5]);
    }

    #[test]
    fn verify_channels_count() {
        assert_eq!((Channels::FRONT_LEFT | Channels::FRONT_RIGHT).count(), 2);
        assert_eq!(Channels::from_bits_retain(0x8000_0001).count(), 2);
    }
}
