//! Fixed-length sample storage.

use core::ops::{Deref, DerefMut};

/// A fixed-length run of samples.
///
/// Every output port owns one `Buffer`, allocated when the node is added to a
/// patch and overwritten in place on each tick. Buffers dereference to
/// `[f32]`, so the usual slice methods apply.
#[derive(Clone, Debug, PartialEq)]
pub struct Buffer {
    samples: Box<[f32]>,
}

impl Buffer {
    /// A silent buffer of `len` samples.
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len].into_boxed_slice(),
        }
    }

    /// Zero every sample.
    #[inline]
    pub fn clear(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = 0.0);
    }

    /// Fill every sample with `value`.
    #[inline]
    pub fn fill(&mut self, value: f32) {
        self.samples.iter_mut().for_each(|s| *s = value);
    }

    /// Add `other * weight` onto this buffer, sample by sample.
    #[inline]
    pub fn mix_from(&mut self, other: &Buffer, weight: f32) {
        for (out, &sample) in self.samples.iter_mut().zip(other.samples.iter()) {
            *out += sample * weight;
        }
    }

    /// Copy as many samples from `other` as both buffers hold.
    #[inline]
    pub fn copy_from(&mut self, other: &Buffer) {
        let n = self.samples.len().min(other.samples.len());
        self.samples[..n].copy_from_slice(&other.samples[..n]);
    }

    /// Linearly interpolated sample at a fractional index.
    ///
    /// With `wrap` the second point of the interpolation is taken modulo the
    /// length; without it, it is clamped to the last sample.
    ///
    /// # Panics
    ///
    /// Panics if `position` is not within `[0, len)`.
    pub fn lookup(&self, position: f64, wrap: bool) -> f32 {
        let len = self.samples.len();
        assert!(
            position >= 0.0 && position < len as f64,
            "buffer lookup at {} outside [0, {})",
            position,
            len
        );

        let index = position.floor() as usize;
        let frac = (position - index as f64) as f32;
        let next = if wrap {
            (index + 1) % len
        } else {
            (index + 1).min(len - 1)
        };

        let a = self.samples[index];
        let b = self.samples[next];
        a + frac * (b - a)
    }
}

impl Deref for Buffer {
    type Target = [f32];

    #[inline]
    fn deref(&self) -> &[f32] {
        &self.samples
    }
}

impl DerefMut for Buffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }
}

impl From<Vec<f32>> for Buffer {
    fn from(samples: Vec<f32>) -> Self {
        Self {
            samples: samples.into_boxed_slice(),
        }
    }
}
