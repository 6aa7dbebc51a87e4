// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `conv` module provides methods to convert samples between different sample types (formats).
//!
//! Two range conversions are provided. [`remap`] is a single affine map from one range onto
//! another, and is suitable when the ranges have no meaningful centre, for example when expanding
//! a 4-bit sample to 8 bits. [`remap_balanced`] maps the lower and upper halves of a range
//! independently around a centre point. Audio must use the latter: silence must map to silence
//! exactly, and the integer sample formats are asymmetric (`u8` spans `-128..=127` around its
//! centre of 128), so a single affine map would shift the centre.
//!
//! [`FromSample`] and [`IntoSample`] convert between any two [`Sample`] formats with
//! [`remap_balanced`].

use crate::sample::Sample;

#[inline(always)]
fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if a == b {
        0.0
    }
    else {
        (value - a) / (b - a)
    }
}

#[inline(always)]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Maps `value` from the range `old_min..=old_max` onto the range `new_min..=new_max` with a
/// single affine transformation.
pub fn remap<F: Sample, T: Sample>(value: F, old_min: F, old_max: F, new_min: T, new_max: T) -> T {
    let t = inverse_lerp(old_min.to_f64(), old_max.to_f64(), value.to_f64());
    T::from_f64(lerp(new_min.to_f64(), new_max.to_f64(), t))
}

/// Maps `value` from the range `old_min..=old_max` onto the range `new_min..=new_max` such that
/// `old_center` maps exactly onto `new_center`.
///
/// Values at or above the old centre are mapped onto `new_center..=new_max`, and values below the
/// old centre are mapped onto `new_min..new_center`.
pub fn remap_balanced<F: Sample, T: Sample>(
    value: F,
    old_center: F,
    new_center: T,
    old_min: F,
    old_max: F,
    new_min: T,
    new_max: T,
) -> T {
    let value = value.to_f64();
    let old_center = old_center.to_f64();
    let new_center = new_center.to_f64();

    if value >= old_center {
        let t = inverse_lerp(old_center, old_max.to_f64(), value);
        T::from_f64(lerp(new_center, new_max.to_f64(), t))
    }
    else {
        let t = inverse_lerp(old_center, old_min.to_f64(), value);
        T::from_f64(lerp(new_center, new_min.to_f64(), t))
    }
}

/// `FromSample` implements a conversion from `Sample` type `F` to `Self`.
///
/// This may be a lossy conversion if converting from a sample type of higher precision to one of
/// lower precision. No dithering is applied.
pub trait FromSample<F> {
    fn from_sample(val: F) -> Self;
}

impl<F: Sample, T: Sample> FromSample<F> for T {
    #[inline]
    fn from_sample(val: F) -> Self {
        remap_balanced(val.clamped(), F::MID, T::MID, F::MIN, F::MAX, T::MIN, T::MAX)
    }
}

/// `IntoSample` is the reciprocal of `FromSample`.
pub trait IntoSample<T> {
    fn into_sample(self) -> T;
}

impl<F, T: FromSample<F>> IntoSample<T> for F {
    #[inline]
    fn into_sample(self) -> T {
        T::from_sample(self)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::{remap, remap_balanced, FromSample, IntoSample};
    use crate::sample::Sample;

    #[test]
    fn verify_remap_balanced_u8_to_i16() {
        let conv = |v: u8| remap_balanced(v, 128u8, 0i16, 0u8, 255u8, i16::MIN, i16::MAX);

        assert_eq!(conv(128), 0);
        assert_eq!(conv(0), i16::MIN);
        assert_eq!(conv(255), i16::MAX);
    }

    #[test]
    fn verify_remap_sub_byte() {
        // A 4-bit sample expanded to the full 8-bit range.
        assert_eq!(remap(0u8, 0u8, 15u8, 0u8, 255u8), 0);
        assert_eq!(remap(15u8, 0u8, 15u8, 0u8, 255u8), 255);
        assert_eq!(remap(5u8, 0u8, 15u8, 0u8, 255u8), 85);

        // 1-bit.
        assert_eq!(remap(1u8, 0u8, 1u8, 0u8, 255u8), 255);
    }

    #[test]
    fn verify_remap_degenerate_range() {
        assert_eq!(remap(7u8, 7u8, 7u8, 10u8, 20u8), 10);
    }

    #[test]
    fn verify_from_sample_extremes() {
        assert_eq!(u8::from_sample(i16::MAX), u8::MAX);
        assert_eq!(u8::from_sample(i16::MID), u8::MID);
        assert_eq!(u8::from_sample(i16::MIN), u8::MIN);

        assert_eq!(i16::from_sample(u8::MAX), i16::MAX);
        assert_eq!(i16::from_sample(u8::MID), i16::MID);
        assert_eq!(i16::from_sample(u8::MIN), i16::MIN);

        assert_eq!(u16::from_sample(u8::MAX), u16::MAX);
        assert_eq!(u16::from_sample(u8::MID), u16::MID);
        assert_eq!(i32::from_sample(i16::MIN), i32::MIN);
        assert_eq!(u32::from_sample(i8::MIN), u32::MIN);

        assert_eq!(f32::from_sample(u8::MAX), 1.0);
        assert_eq!(f32::from_sample(u8::MID), 0.0);
        assert_eq!(f32::from_sample(u8::MIN), -1.0);

        assert_eq!(i16::from_sample(1.0f32), i16::MAX);
        assert_eq!(i16::from_sample(-1.0f64), i16::MIN);
        assert_eq!(i16::from_sample(0.0f32), 0);
    }

    #[test]
    fn verify_float_input_is_clamped() {
        assert_eq!(i16::from_sample(4.0f32), i16::MAX);
        assert_eq!(u8::from_sample(-4.0f64), u8::MIN);

        assert_eq!(f32::from_sample(4.0f64), 1.0);
        assert_eq!(f64::from_sample(-2.5f32), -1.0);
        assert_eq!(f64::from_sample(0.25f32), 0.25);
    }

    #[test]
    fn verify_identity_conversions() {
        for v in 0..=255u8 {
            assert_eq!(u8::from_sample(v), v);
        }

        for v in [i16::MIN, -1234, -1, 0, 1, 4321, i16::MAX] {
            let out: i16 = v.into_sample();
            assert_eq!(out, v);
        }
    }

    #[test]
    fn verify_widening_is_monotonic_and_reversible() {
        let mut rng = SmallRng::seed_from_u64(0xc0ff_ee00);

        for _ in 0..1024 {
            let a: u8 = rng.random();
            let b: u8 = rng.random();

            let wa = i16::from_sample(a);
            let wb = i16::from_sample(b);

            // Ordering is preserved.
            assert_eq!(a.cmp(&b), wa.cmp(&wb));

            // Narrowing the widened sample restores the original.
            assert_eq!(u8::from_sample(wa), a);
        }
    }
}
