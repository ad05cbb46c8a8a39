//! Period-over-period growth.

use crate::models::{Direction, Growth};

/// Changes within this many percentage points either way read as flat.
pub const FLAT_THRESHOLD: f64 = 5.0;

/// Float noise tolerated at the flat boundary, e.g. `growth(1.05, 1.0)`
/// computes 5.000000000000004.
const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Percentage change from `previous` to `current`.
///
/// A zero baseline reports 100% growth for any positive current value (and
/// -100% for a negative one) instead of an infinite change. Two zeros are 0%.
pub fn growth(current: f64, previous: f64) -> Growth {
    let value = if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else if current < 0.0 {
            -100.0
        } else {
            0.0
        }
    } else {
        ((current - previous) / previous.abs()) * 100.0
    };

    Growth {
        value,
        direction: direction(value),
    }
}

/// Direction of a percentage change. The ±5 boundary itself is flat.
pub fn direction(value: f64) -> Direction {
    if value > FLAT_THRESHOLD + BOUNDARY_TOLERANCE {
        Direction::Up
    } else if value < -(FLAT_THRESHOLD + BOUNDARY_TOLERANCE) {
        Direction::Down
    } else {
        Direction::Flat
    }
}

/// Growth of each value against the one before it.
pub fn growth_series(values: &[f64]) -> Vec<Growth> {
    values
        .windows(2)
        .map(|pair| growth(pair[1], pair[0]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractional_boundary_is_flat() {
        assert_eq!(growth(1.05, 1.0).direction, Direction::Flat);
        assert_eq!(growth(0.95, 1.0).direction, Direction::Flat);
        assert_eq!(growth(10.5, 10.0).direction, Direction::Flat);
        assert_eq!(growth(1.051, 1.0).direction, Direction::Up);
        assert_eq!(growth(0.949, 1.0).direction, Direction::Down);
        assert_eq!(direction(5.0001), Direction::Up);
    }

    #[test]
    fn test_growth_from_zero_is_full_growth() {
        for current in [0.5, 1.0, 3.0, 1_000.0] {
            let g = growth(current, 0.0);
            assert_eq!(g.value, 100.0);
            assert_eq!(g.direction, Direction::Up);
        }
    }

    #[test]
    fn test_growth_both_zero() {
        let g = growth(0.0, 0.0);
        assert_eq!(g.value, 0.0);
        assert_eq!(g.direction, Direction::Flat);
    }

    #[test]
    fn test_growth_unchanged_is_flat() {
        for previous in [1.0, 5.0, 42.0, 1e6] {
            let g = growth(previous, previous);
            assert_eq!(g.value, 0.0);
            assert_eq!(g.direction, Direction::Flat);
        }
    }

    #[test]
    fn test_growth_seven_over_five() {
        let g = growth(7.0, 5.0);
        assert!((g.value - 40.0).abs() < 1e-9);
        assert_eq!(g.direction, Direction::Up);
    }

    #[test]
    fn test_growth_decline() {
        let g = growth(5.0, 10.0);
        assert_eq!(g.value, -50.0);
        assert_eq!(g.direction, Direction::Down);
    }

    #[test]
    fn test_direction_threshold_is_exclusive() {
        assert_eq!(direction(5.0), Direction::Flat);
        assert_eq!(direction(-5.0), Direction::Flat);
        assert_eq!(direction(5.01), Direction::Up);
        assert_eq!(direction(-5.01), Direction::Down);

        // 105 vs 100 lands exactly on the boundary
        assert_eq!(growth(105.0, 100.0).direction, Direction::Flat);
        assert_eq!(growth(106.0, 100.0).direction, Direction::Up);
        assert_eq!(growth(95.0, 100.0).direction, Direction::Flat);
        assert_eq!(growth(94.0, 100.0).direction, Direction::Down);
    }

    #[test]
    fn test_growth_negative_baseline() {
        let g = growth(-5.0, -10.0);
        assert_eq!(g.value, 50.0);
        assert_eq!(growth(-3.0, 0.0).value, -100.0);
    }

    #[test]
    fn test_growth_series() {
        let series = growth_series(&[0.0, 4.0, 4.0, 2.0]);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].value, 100.0);
        assert_eq!(series[1].direction, Direction::Flat);
        assert_eq!(series[2].value, -50.0);

        assert!(growth_series(&[3.0]).is_empty());
        assert!(growth_series(&[]).is_empty());
    }
}
