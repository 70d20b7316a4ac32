//! Bounded ledger arithmetic
//!
//! Additions shrink in proportion to how close the value already is to the
//! edge it is moving toward, so repeated nudges in one direction approach the
//! bound without ever passing it.

/// Lower bound of charge and spark.
pub const LEDGER_MIN: f64 = -100.0;

/// Upper bound of charge and spark.
pub const LEDGER_MAX: f64 = 100.0;

/// Adds `delta` to `value`, scaled by the remaining distance to the bound in
/// the direction of travel, and clamps the result to `[min, max]`.
pub fn bounded_add(value: f64, delta: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range <= 0.0 {
        return min;
    }
    let distance_to_edge = if delta >= 0.0 { max - value } else { value - min };
    let applied = delta * distance_to_edge / range;
    (value + applied).clamp(min, max)
}

/// [`bounded_add`] over the charge/spark range.
pub fn ledger_add(value: f64, delta: f64) -> f64 {
    bounded_add(value, delta, LEDGER_MIN, LEDGER_MAX)
}

/// Nudges `value` by `step` toward zero through [`ledger_add`]. Zero stays
/// zero. Values closer to zero than the scaled step land just past it.
pub fn decay_toward_zero(value: f64, step: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    ledger_add(value, -value.signum() * step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_known_value() {
        // 10 + 20 * (90 / 100) = 28 on a 0..100 scale
        assert!((bounded_add(10.0, 20.0, 0.0, 100.0) - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_delta_is_identity() {
        for v in [-100.0, -37.5, 0.0, 12.0, 100.0] {
            assert_eq!(ledger_add(v, 0.0), v);
        }
    }

    #[test]
    fn test_edges_stick() {
        assert_eq!(ledger_add(100.0, 28.0), 100.0);
        assert_eq!(ledger_add(-100.0, -28.0), -100.0);
    }

    #[test]
    fn test_always_in_range() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let v = rng.gen_range(-100.0..=100.0);
            let d = rng.gen_range(-300.0..=300.0);
            let r = ledger_add(v, d);
            assert!((LEDGER_MIN..=LEDGER_MAX).contains(&r), "{} + {} -> {}", v, d, r);
        }
    }

    #[test]
    fn test_positive_delta_converges_from_below() {
        let mut v = -90.0;
        for _ in 0..200 {
            let next = ledger_add(v, 14.0);
            assert!(next <= LEDGER_MAX);
            if v < LEDGER_MAX {
                assert!(next > v || next == LEDGER_MAX);
            }
            v = next;
        }
        assert!(v > 99.0);
    }

    #[test]
    fn test_decay_toward_zero() {
        assert_eq!(decay_toward_zero(0.0, 1.0), 0.0);
        let down = decay_toward_zero(50.0, 1.0);
        assert!(down < 50.0 && down > 0.0);
        let up = decay_toward_zero(-50.0, 1.0);
        assert!(up > -50.0 && up < 0.0);
    }

    #[test]
    fn test_decay_near_zero_steps_past_it() {
        // 0.2 - 1 * (100.2 / 200) = -0.301
        assert!((decay_toward_zero(0.2, 1.0) + 0.301).abs() < 1e-9);
        assert!((decay_toward_zero(-0.2, 1.0) - 0.301).abs() < 1e-9);
        assert_eq!(decay_toward_zero(0.2, 1.0), ledger_add(0.2, -1.0));
    }
}
