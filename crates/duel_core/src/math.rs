//! Rounding helpers shared by the damage pipeline and arena adjustment.

/// Round to the nearest integer, halves toward positive infinity.
///
/// Every stage of the damage pipeline rounds with this rule so results
/// match the balance tables the production values were tuned against.
#[must_use]
pub fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// `round_half_up(value * factor)`.
#[must_use]
pub fn scale(value: f64, factor: f64) -> f64 {
    round_half_up(value * factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halves_round_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(13.5), 14.0);
        assert_eq!(round_half_up(-2.5), -2.0);
    }

    #[test]
    fn test_nearest() {
        assert_eq!(round_half_up(13.8), 14.0);
        assert_eq!(round_half_up(12.04), 12.0);
        assert_eq!(round_half_up(7.0), 7.0);
    }

    #[test]
    fn test_scale() {
        assert_eq!(scale(12.0, 1.08), 13.0);
        assert_eq!(scale(14.0, 0.86), 12.0);
    }
}
