//! Threshold tables for attribute-to-color bucketing.
//!
//! Each known column maps to an ascending sequence of breakpoints; a
//! value is assigned the bucket equal to the number of breakpoints it
//! satisfies (`value >= breakpoint`), so N breakpoints give N + 1
//! buckets. Unrecognized columns fall back to a generic sequence.

pub const REVENUE_THRESHOLDS: [f64; 4] = [50_000.0, 100_000.0, 250_000.0, 500_000.0];
pub const MEDIAN_INCOME_THRESHOLDS: [f64; 4] = [30_000.0, 50_000.0, 75_000.0, 100_000.0];
pub const POPULATION_THRESHOLDS: [f64; 4] = [1_000.0, 2_500.0, 5_000.0, 10_000.0];
pub const DEFAULT_THRESHOLDS: [f64; 4] = [100.0, 500.0, 1_000.0, 5_000.0];

/// Breakpoints for a column, falling back to the generic sequence for
/// unknown columns. Never fails.
pub fn thresholds_for(column: &str) -> &'static [f64] {
    match column {
        "revenue" => &REVENUE_THRESHOLDS,
        "median_income" => &MEDIAN_INCOME_THRESHOLDS,
        "total_pop" | "population" => &POPULATION_THRESHOLDS,
        _ => &DEFAULT_THRESHOLDS,
    }
}

/// Bucket index for a value: the count of breakpoints the value is
/// greater than or equal to. A full linear scan — equal breakpoints
/// all advance the index, so later duplicates win ties.
pub fn bucket_index(value: f64, thresholds: &[f64]) -> usize {
    let mut idx = 0;
    for (i, t) in thresholds.iter().enumerate() {
        if value >= *t {
            idx = i + 1;
        }
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_between_breakpoints() {
        // Satisfies 1000 and 2500, not 5000.
        assert_eq!(bucket_index(3_000.0, &POPULATION_THRESHOLDS), 2);
    }

    #[test]
    fn value_equal_to_breakpoint_advances() {
        // The >= rule: exactly 2500 counts the 2500 breakpoint.
        assert_eq!(bucket_index(2_500.0, &POPULATION_THRESHOLDS), 2);
    }

    #[test]
    fn below_minimum_is_bucket_zero() {
        assert_eq!(bucket_index(999.0, &POPULATION_THRESHOLDS), 0);
        assert_eq!(bucket_index(-5.0, &POPULATION_THRESHOLDS), 0);
    }

    #[test]
    fn above_maximum_is_last_bucket() {
        assert_eq!(bucket_index(1e12, &POPULATION_THRESHOLDS), 4);
    }

    #[test]
    fn duplicate_breakpoints_all_advance() {
        assert_eq!(bucket_index(10.0, &[10.0, 10.0, 20.0]), 2);
    }

    #[test]
    fn unknown_column_falls_back_to_default() {
        assert_eq!(thresholds_for("nonexistent_column"), &DEFAULT_THRESHOLDS);
        assert_eq!(thresholds_for(""), &DEFAULT_THRESHOLDS);
    }

    #[test]
    fn known_columns_resolve() {
        assert_eq!(thresholds_for("revenue"), &REVENUE_THRESHOLDS);
        assert_eq!(thresholds_for("median_income"), &MEDIAN_INCOME_THRESHOLDS);
        assert_eq!(thresholds_for("total_pop"), &POPULATION_THRESHOLDS);
        assert_eq!(thresholds_for("population"), &POPULATION_THRESHOLDS);
    }

    #[test]
    fn sequences_are_non_decreasing() {
        for seq in [
            &REVENUE_THRESHOLDS,
            &MEDIAN_INCOME_THRESHOLDS,
            &POPULATION_THRESHOLDS,
            &DEFAULT_THRESHOLDS,
        ] {
            for pair in seq.windows(2) {
                assert!(pair[0] <= pair[1]);
            }
        }
    }
}
