//! Timestamp-grid and jitter helpers for synthetic API time series.

/// Fixed step between generated query timestamps: five minutes.
pub const QUERY_STEP_MILLIS: i64 = 5 * 60 * 1000;

/// Deterministic pseudo-jitter for a timestamp, in `(modulus, scale)` form:
/// the mixed timestamp is reduced modulo `modulus`, centered on zero, and
/// scaled. The same timestamp always produces the same offset, so repeated
/// queries over the same range render identically.
///
/// This is cosmetic noise layered over a flat replicated value, not a
/// reconstruction of source history.
pub fn jitter(timestamp_millis: i64, modulus: i64, scale: f64) -> f64 {
    let mixed = mix(timestamp_millis);
    ((mixed.rem_euclid(modulus)) - modulus / 2) as f64 * scale
}

/// SplitMix64 finalizer. Cheap, stateless and stable across runs, which is
/// all the jitter needs from a hash.
fn mix(value: i64) -> i64 {
    let mut z = (value as u64).wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    (z ^ (z >> 31)) as i64
}
