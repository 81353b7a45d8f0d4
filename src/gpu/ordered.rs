//! Order-preserving distance encoding for integer atomics
//!
//! WGSL storage atomics are 32-bit integers, but relaxation needs a
//! race-free minimum over float distances. For non-negative finite `f32`
//! values the IEEE-754 bit pattern is monotone in the value (sign bit clear,
//! exponent in the high bits), so `atomicMin` over the raw bits computes the
//! float minimum directly. Every distance in this crate is non-negative —
//! weights are validated at construction, the source starts at 0, and the
//! sentinel is positive — which is exactly the precondition.
//!
//! The same encoding is applied host-side when seeding and decoding the
//! device distance buffer, so host and device always agree on the bit-level
//! representation.

/// Encode a non-negative finite distance as its monotone `u32` bit pattern.
///
/// Debug-asserts the non-negativity precondition; release builds trust the
/// graph invariants.
#[must_use]
pub fn distance_to_bits(distance: f32) -> u32 {
    debug_assert!(
        distance >= 0.0 && distance.is_finite(),
        "ordered encoding requires non-negative finite distances, got {distance}"
    );
    distance.to_bits()
}

/// Decode a `u32` bit pattern written by [`distance_to_bits`] or by the
/// relax kernel's `atomicMin`.
#[must_use]
pub fn bits_to_distance(bits: u32) -> f32 {
    f32::from_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::INFINITE_DISTANCE;
    use proptest::prelude::*;

    #[test]
    fn test_roundtrip() {
        for value in [0.0_f32, 1.0, 2.5, 999.25, INFINITE_DISTANCE] {
            assert_eq!(bits_to_distance(distance_to_bits(value)), value);
        }
    }

    #[test]
    fn test_zero_is_minimal() {
        assert_eq!(distance_to_bits(0.0), 0);
    }

    #[test]
    fn test_sentinel_beats_any_real_distance() {
        // atomicMin against the sentinel must always let real distances win
        assert!(distance_to_bits(999.9) < distance_to_bits(INFINITE_DISTANCE));
    }

    proptest! {
        #[test]
        fn prop_encoding_is_monotone(a in 0.0f32..1e12, b in 0.0f32..1e12) {
            let (bits_a, bits_b) = (distance_to_bits(a), distance_to_bits(b));
            prop_assert_eq!(a < b, bits_a < bits_b);
            prop_assert_eq!(a == b, bits_a == bits_b);
        }

        #[test]
        fn prop_integer_min_is_float_min(a in 0.0f32..1e12, b in 0.0f32..1e12) {
            let min_bits = distance_to_bits(a).min(distance_to_bits(b));
            prop_assert_eq!(bits_to_distance(min_bits), a.min(b));
        }
    }
}
