//! Fixed-point gain stage for raw microphone samples.
//!
//! The microphone delivers very quiet samples, so every sample is shifted
//! left by the gain exponent. The shift wraps on overflow exactly like a
//! 16-bit register would; loud input distorts rather than saturating.

/// Amplify a single sample by `2^shift`, wrapping on overflow.
pub fn amplify(sample: i16, shift: u32) -> i16 {
    sample.wrapping_shl(shift)
}

/// Amplify every sample in place.
pub fn apply_gain(samples: &mut [i16], shift: u32) {
    if shift == 0 {
        return;
    }
    for sample in samples.iter_mut() {
        *sample = amplify(*sample, shift);
    }
}
