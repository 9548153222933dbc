use thiserror::Error;

use crate::grading::lookup_points;
use crate::models::{AggregateResult, CourseBreakdown, CourseRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComputeError {
    #[error("add at least one course to calculate SGPA")]
    EmptyLedger,
}

pub fn compute_aggregate(records: &[CourseRecord]) -> Result<AggregateResult, ComputeError> {
    if records.is_empty() {
        return Err(ComputeError::EmptyLedger);
    }

    let mut total_credits = 0u32;
    let mut total_weighted_points = 0.0;

    let breakdown: Vec<CourseBreakdown> = records
        .iter()
        .map(|record| {
            let points = lookup_points(&record.grade);
            let weighted_points = f64::from(record.credits) * points;
            total_credits += record.credits;
            total_weighted_points += weighted_points;

            CourseBreakdown {
                code: record.code.clone(),
                name: record.name.clone(),
                credits: record.credits,
                grade: record.grade.clone(),
                points,
                weighted_points,
            }
        })
        .collect();

    let weighted_average = weighted_average(total_weighted_points, total_credits);

    Ok(AggregateResult {
        total_credits,
        total_weighted_points,
        weighted_average,
        derived_percentage: percentage_from_average(weighted_average),
        breakdown,
    })
}

pub fn weighted_average(total_weighted_points: f64, total_credits: u32) -> f64 {
    if total_credits == 0 {
        0.0
    } else {
        total_weighted_points / f64::from(total_credits)
    }
}

/// Fixed institutional conversion, clamped so low averages never go negative.
pub fn percentage_from_average(weighted_average: f64) -> f64 {
    ((weighted_average - 0.75) * 10.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn course(code: &str, credits: u32, grade: &str) -> CourseRecord {
        CourseRecord::new(code, "Sample Course", credits, grade)
    }

    #[test]
    fn two_course_scenario() {
        let records = vec![course("22CS301", 4, "O"), course("22CS302", 3, "B+")];
        let result = compute_aggregate(&records).unwrap();

        assert_eq!(result.total_credits, 7);
        assert!((result.total_weighted_points - 61.0).abs() < 1e-9);
        assert!((result.weighted_average - 61.0 / 7.0).abs() < 1e-9);
        assert_eq!(format!("{:.2}", result.weighted_average), "8.71");
        assert_eq!(format!("{:.1}", result.derived_percentage), "79.6");
        assert_eq!(result.breakdown[0].weighted_points, 40.0);
        assert_eq!(result.breakdown[1].weighted_points, 21.0);
    }

    #[test]
    fn empty_ledger_is_reported() {
        assert_eq!(compute_aggregate(&[]), Err(ComputeError::EmptyLedger));
    }

    #[test]
    fn reordering_keeps_totals_but_not_breakdown_order() {
        let forward = vec![
            course("22MA301", 3, "A"),
            course("22CS301", 4, "O"),
            course("22CS302", 4, "C"),
            course("22CS305", 2, "F"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = compute_aggregate(&forward).unwrap();
        let b = compute_aggregate(&reversed).unwrap();

        assert_eq!(a.total_credits, b.total_credits);
        assert!((a.total_weighted_points - b.total_weighted_points).abs() < 1e-9);
        assert!((a.weighted_average - b.weighted_average).abs() < 1e-9);
        assert_eq!(a.breakdown[0].code, "22MA301");
        assert_eq!(b.breakdown[0].code, "22CS305");
    }

    #[test]
    fn same_input_gives_identical_output() {
        let records = vec![course("22CS301", 4, "A+"), course("22CS303", 3, "B")];
        assert_eq!(compute_aggregate(&records), compute_aggregate(&records));
    }

    #[test]
    fn average_stays_in_range_and_percentage_clamps() {
        let failing = vec![course("22CS301", 4, "F"), course("22CS302", 3, "AB")];
        let result = compute_aggregate(&failing).unwrap();
        assert_eq!(result.weighted_average, 0.0);
        assert_eq!(result.derived_percentage, 0.0);

        let perfect = vec![course("22CS301", 4, "O"), course("22CS302", 1, "O")];
        let result = compute_aggregate(&perfect).unwrap();
        assert_eq!(result.weighted_average, 10.0);
        assert!((result.derived_percentage - 92.5).abs() < 1e-9);
    }

    #[test]
    fn zero_credit_ledger_averages_to_zero() {
        let records = vec![course("22CS399", 0, "O")];
        let result = compute_aggregate(&records).unwrap();
        assert_eq!(result.total_credits, 0);
        assert_eq!(result.weighted_average, 0.0);
        assert!(result.derived_percentage.is_finite());
    }

    #[test]
    fn percentage_conversion_is_linear_above_threshold() {
        assert_eq!(percentage_from_average(0.5), 0.0);
        assert_eq!(percentage_from_average(0.75), 0.0);
        assert!((percentage_from_average(8.75) - 80.0).abs() < 1e-9);
    }
}
