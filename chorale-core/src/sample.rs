// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `sample` module defines the core audio sample trait.

use std::fmt;

/// SampleFormat describes the data encoding for an audio sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 8-bit integer.
    S8,
    /// Signed 16-bit integer.
    S16,
    /// Signed 32-bit integer.
    S32,
    /// Single precision (32-bit) floating point.
    F32,
    /// Double precision (64-bit) floating point.
    F64,
}

/// `Sample` provides a common interface for manipulating sample's regardless of the
/// underlying data type.
///
/// Every sample format has a valid range, `MIN..=MAX`, and a silent mid-point, `MID`. For integer
/// formats the valid range is the full range of the data type. For floating point formats the
/// valid range is `-1.0..=1.0`.
pub trait Sample:
    Copy + Clone + Default + PartialOrd + PartialEq + Sized + fmt::Debug + Send + Sync + 'static
{
    /// The minimum valid sample value.
    const MIN: Self;

    /// The mid-point value between the maximum and minimum sample value. If a sample is set to this
    /// value it is silent.
    const MID: Self;

    /// The maximum valid sample value.
    const MAX: Self;

    /// If the sample format does not use the full range of the underlying data type, returns the
    /// sample clamped to the valid range. Otherwise, returns the sample unchanged.
    fn clamped(self) -> Self;

    /// Losslessly widens the sample to a 64-bit float without changing its scale.
    fn to_f64(self) -> f64;

    /// Narrows a 64-bit float, in the scale of this sample format, to a sample. Integer formats
    /// round to the nearest value and saturate at the bounds of the data type.
    fn from_f64(value: f64) -> Self;

    /// Averages a frame of samples. Integer formats use a truncating integer mid-point computed in
    /// a wider type, floating point formats use the arithmetic mean. An empty frame is silent.
    fn mean(frame: &[Self]) -> Self;
}

macro_rules! int_sample_impl {
    ($t:ty, $mid:expr) => {
        impl Sample for $t {
            const MIN: $t = <$t>::MIN;
            const MID: $t = $mid;
            const MAX: $t = <$t>::MAX;

            #[inline(always)]
            fn clamped(self) -> Self {
                self
            }

            #[inline(always)]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                // A float to integer cast saturates at the bounds of the integer.
                value.round() as $t
            }

            fn mean(frame: &[Self]) -> Self {
                if frame.is_empty() {
                    return <Self as Sample>::MID;
                }

                let sum: i64 = frame.iter().map(|&s| i64::from(s)).sum();
                (sum / frame.len() as i64) as $t
            }
        }
    };
}

macro_rules! float_sample_impl {
    ($t:ty) => {
        impl Sample for $t {
            const MIN: $t = -1.0;
            const MID: $t = 0.0;
            const MAX: $t = 1.0;

            #[inline(always)]
            fn clamped(self) -> Self {
                // Inherent float constants shadow the trait's, so name the trait.
                self.clamp(<Self as Sample>::MIN, <Self as Sample>::MAX)
            }

            #[inline(always)]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                value as $t
            }

            fn mean(frame: &[Self]) -> Self {
                if frame.is_empty() {
                    return <Self as Sample>::MID;
                }

                let sum: f64 = frame.iter().map(|&s| f64::from(s)).sum();
                (sum / frame.len() as f64) as $t
            }
        }
    };
}

int_sample_impl!(u8, 128);
int_sample_impl!(u16, 32_768);
int_sample_impl!(u32, 2_147_483_648);
int_sample_impl!(i8, 0);
int_sample_impl!(i16, 0);
int_sample_impl!(i32, 0);

float_sample_impl!(f32);
float_sample_impl!(f64);
