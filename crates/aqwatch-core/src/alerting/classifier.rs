//! AQI category classification
//!
//! Pure boundary lookup over the fixed category table. Intervals are
//! closed-open (lower bound inclusive) and contiguous over [0, ∞); a
//! malformed table would silently misclassify, so [`verify_bounds`] runs
//! once at startup and is fatal on failure.

use thiserror::Error;

use crate::error::Error;
use crate::models::Category;

/// Errors for values that cannot be classified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// The value was below zero.
    #[error("AQI value {0} is negative")]
    Negative(f64),

    /// The measurement was unavailable.
    #[error("AQI value is absent")]
    Absent,
}

/// All categories, ascending by severity. Drives classification and the
/// startup table check.
const CATEGORIES: [Category; 6] = [
    Category::Good,
    Category::Moderate,
    Category::UnhealthySensitive,
    Category::Unhealthy,
    Category::VeryUnhealthy,
    Category::Hazardous,
];

/// Inclusive lower and exclusive upper AQI bound for a category.
/// `None` means unbounded above.
pub fn bounds_for(category: Category) -> (f64, Option<f64>) {
    match category {
        Category::Good => (0.0, Some(50.0)),
        Category::Moderate => (50.0, Some(100.0)),
        Category::UnhealthySensitive => (100.0, Some(150.0)),
        Category::Unhealthy => (150.0, Some(200.0)),
        Category::VeryUnhealthy => (200.0, Some(300.0)),
        Category::Hazardous => (300.0, None),
    }
}

/// Map an AQI value to its health category.
///
/// Total over [0, ∞); absent and negative values are the only failures.
/// Pure: no side effects, no I/O.
pub fn classify(value: Option<f64>) -> Result<Category, ValueError> {
    let Some(value) = value else {
        return Err(ValueError::Absent);
    };
    if value.is_nan() {
        // a NaN fits no interval; treat it as unavailable
        return Err(ValueError::Absent);
    }
    if value < 0.0 {
        return Err(ValueError::Negative(value));
    }

    for category in CATEGORIES {
        let (lower, upper) = bounds_for(category);
        if value >= lower && upper.map_or(true, |u| value < u) {
            return Ok(category);
        }
    }

    unreachable!("category table verified contiguous over [0, inf) at startup")
}

/// Verify the category table is contiguous: starts at 0, each upper bound
/// equals the next lower bound, and only the last interval is unbounded.
///
/// Called once at startup; a gap or overlap here is fatal.
pub fn verify_bounds() -> crate::error::Result<()> {
    let mut expected_lower = 0.0;

    for (i, category) in CATEGORIES.iter().enumerate() {
        let (lower, upper) = bounds_for(*category);

        if lower != expected_lower {
            return Err(Error::category_table(format!(
                "{} starts at {lower}, expected {expected_lower}",
                category.label()
            )));
        }

        match upper {
            Some(u) => {
                if u <= lower {
                    return Err(Error::category_table(format!(
                        "{} has an empty interval [{lower}, {u})",
                        category.label()
                    )));
                }
                if i == CATEGORIES.len() - 1 {
                    return Err(Error::category_table(format!(
                        "last category {} must be unbounded above",
                        category.label()
                    )));
                }
                expected_lower = u;
            }
            None => {
                if i != CATEGORIES.len() - 1 {
                    return Err(Error::category_table(format!(
                        "{} is unbounded but not the last category",
                        category.label()
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, Category::Good)]
    #[case(12.5, Category::Good)]
    #[case(49.999, Category::Good)]
    #[case(50.0, Category::Moderate)]
    #[case(99.9, Category::Moderate)]
    #[case(100.0, Category::UnhealthySensitive)]
    #[case(149.0, Category::UnhealthySensitive)]
    #[case(150.0, Category::Unhealthy)]
    #[case(199.999, Category::Unhealthy)]
    #[case(200.0, Category::VeryUnhealthy)]
    #[case(299.0, Category::VeryUnhealthy)]
    #[case(300.0, Category::Hazardous)]
    #[case(875.0, Category::Hazardous)]
    fn boundaries_are_closed_open(#[case] value: f64, #[case] expected: Category) {
        assert_eq!(classify(Some(value)), Ok(expected), "classify({value})");
    }

    #[test]
    fn negative_value_fails() {
        assert_eq!(classify(Some(-1.0)), Err(ValueError::Negative(-1.0)));
    }

    #[test]
    fn absent_value_fails() {
        assert_eq!(classify(None), Err(ValueError::Absent));
    }

    #[test]
    fn nan_is_treated_as_absent() {
        assert_eq!(classify(Some(f64::NAN)), Err(ValueError::Absent));
    }

    #[test]
    fn shipped_table_verifies() {
        verify_bounds().expect("the shipped category table must be contiguous");
    }

    #[test]
    fn table_order_matches_severity_order() {
        for pair in CATEGORIES.windows(2) {
            assert!(
                pair[0] < pair[1],
                "{} should be less severe than {}",
                pair[0].label(),
                pair[1].label()
            );
        }
    }
}
