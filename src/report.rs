use std::fmt::Write;

use chrono::NaiveDate;
use thiserror::Error;

use crate::grading::{performance_label, points_to_descriptive_grade};
use crate::models::{AggregateResult, ExtractionResponse, Semester};
use crate::presets::branch_name;

const TABLE_HEADING: &str = "COURSE DETAILS:";
const CODE_WIDTH: usize = 10;
const NAME_WIDTH: usize = 35;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("report has no course table")]
    MissingTable,
    #[error("malformed course row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

#[derive(Debug, Clone)]
pub struct ReportContext {
    pub generated_on: NaiveDate,
    pub semester: Option<Semester>,
    pub branch: Option<String>,
}

impl ReportContext {
    pub fn semester_label(&self) -> String {
        self.semester
            .map(|semester| semester.label())
            .unwrap_or_else(|| "Not Selected".to_string())
    }

    pub fn branch_label(&self) -> String {
        self.branch
            .as_deref()
            .map(|code| branch_name(code).unwrap_or(code).to_string())
            .unwrap_or_else(|| "Not Selected".to_string())
    }

    pub fn default_file_name(&self) -> String {
        format!("VTU_SGPA_Report_{}.txt", self.generated_on.format("%d-%m-%Y"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub code: String,
    pub name: String,
    pub credits: u32,
    pub grade: String,
    pub weighted_points: f64,
}

pub fn build_report(context: &ReportContext, aggregate: &AggregateResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "VTU SGPA Calculator Report - 2022 Scheme");
    let _ = writeln!(output, "{}", "=".repeat(42));
    let _ = writeln!(output);
    let _ = writeln!(output, "Generated on: {}", context.generated_on.format("%d/%m/%Y"));
    let _ = writeln!(output, "Semester: {}", context.semester_label());
    let _ = writeln!(output, "Branch: {}", context.branch_label());
    let _ = writeln!(output);

    let _ = writeln!(output, "RESULTS:");
    let _ = writeln!(output, "SGPA: {:.2}/10.0", aggregate.weighted_average);
    let _ = writeln!(output, "Equivalent Percentage: {:.1}%", aggregate.derived_percentage);
    let _ = writeln!(output);

    let _ = writeln!(output, "{TABLE_HEADING}");
    let _ = writeln!(
        output,
        "{:<CODE_WIDTH$} {:<NAME_WIDTH$} {:<8} {:<6} {:<8}",
        "Code", "Name", "Credits", "Grade", "Points"
    );
    let _ = writeln!(output, "{}", "-".repeat(75));

    for course in aggregate.breakdown.iter() {
        let name: String = course.name.chars().take(NAME_WIDTH - 1).collect();
        let _ = writeln!(
            output,
            "{:<CODE_WIDTH$} {:<NAME_WIDTH$} {:<8} {:<6} {:<8}",
            course.code,
            name,
            course.credits,
            course.grade,
            format!("{:.1}", course.weighted_points)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "VTU SGPA Formula: SGPA = ∑(Ci × Gi) / ∑Ci");
    let _ = writeln!(output, "Where Ci = Credits, Gi = Grade Points");
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Disclaimer: This is an unofficial calculator. Please verify with official VTU sources."
    );

    output
}

/// Reads the course table back out of a report produced by [`build_report`].
pub fn read_report_table(report: &str) -> Result<Vec<ReportRow>, ReportError> {
    let mut lines = report.lines().enumerate();
    lines
        .by_ref()
        .find(|(_, line)| line.trim() == TABLE_HEADING)
        .ok_or(ReportError::MissingTable)?;

    // Column header and rule.
    lines.by_ref().take(2).for_each(drop);

    let mut rows = Vec::new();
    for (index, line) in lines {
        if line.trim().is_empty() {
            break;
        }
        rows.push(parse_row(index + 1, line)?);
    }
    Ok(rows)
}

/// Splits a row by the columns [`build_report`] pads to. The name column is
/// fixed width, and the grade is whatever sits between credits and points,
/// so names and grades may both contain spaces.
fn parse_row(line: usize, text: &str) -> Result<ReportRow, ReportError> {
    let malformed = |reason: &str| ReportError::MalformedRow {
        line,
        reason: reason.to_string(),
    };

    let code = text
        .split_whitespace()
        .next()
        .ok_or_else(|| malformed("expected code, name, credits, grade and points"))?;
    let name_start = code.chars().count().max(CODE_WIDTH) + 1;
    let name: String = text.chars().skip(name_start).take(NAME_WIDTH).collect();
    let rest: String = text.chars().skip(name_start + NAME_WIDTH).collect();

    let rest = rest.trim();
    let (credits, rest) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| malformed("expected credits, grade and points after the name"))?;
    let (grade, points) = rest
        .trim()
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| malformed("expected grade and points after credits"))?;

    Ok(ReportRow {
        code: code.to_string(),
        name: name.trim().to_string(),
        credits: credits
            .parse()
            .map_err(|_| malformed("credits is not an integer"))?,
        grade: grade.trim().to_string(),
        weighted_points: points
            .parse()
            .map_err(|_| malformed("points is not a number"))?,
    })
}

/// Differences between an exported table and a freshly computed breakdown,
/// compared at the one-decimal precision the report prints.
pub fn compare_report_rows(rows: &[ReportRow], aggregate: &AggregateResult) -> Vec<String> {
    let mut mismatches = Vec::new();
    if rows.len() != aggregate.breakdown.len() {
        mismatches.push(format!(
            "report lists {} courses, ledger has {}",
            rows.len(),
            aggregate.breakdown.len()
        ));
    }

    for (row, course) in rows.iter().zip(aggregate.breakdown.iter()) {
        let expected_points = format!("{:.1}", course.weighted_points);
        if row.code != course.code
            || row.credits != course.credits
            || row.grade != course.grade
            || format!("{:.1}", row.weighted_points) != expected_points
        {
            mismatches.push(format!(
                "{}: report has {} credits, {} grade, {:.1} points; expected {} credits, {} grade, {expected_points} points",
                course.code, row.credits, row.grade, row.weighted_points, course.credits, course.grade
            ));
        }
    }
    mismatches
}

pub fn build_grade_sheet(context: &ReportContext, aggregate: &AggregateResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Grade Sheet ({})", context.generated_on.format("%d %B %Y"));
    let _ = writeln!(output, "Semester: {}", context.semester_label());
    let _ = writeln!(output, "Branch: {}", context.branch_label());
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "SGPA {:.2} ({:.1}%) - {}",
        aggregate.weighted_average,
        aggregate.derived_percentage,
        performance_label(aggregate.weighted_average)
    );
    let _ = writeln!(output, "Total credits: {}", aggregate.total_credits);
    let _ = writeln!(output, "Total credit points: {:.1}", aggregate.total_weighted_points);
    let _ = writeln!(
        output,
        "Average grade: {}",
        points_to_descriptive_grade(aggregate.weighted_average)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Calculation:");

    for course in aggregate.breakdown.iter() {
        let _ = writeln!(
            output,
            "- {}: {} × {} = {:.1} points",
            course.code, course.credits, course.points, course.weighted_points
        );
    }
    let _ = writeln!(
        output,
        "SGPA = {:.1} ÷ {} = {:.2}",
        aggregate.total_weighted_points, aggregate.total_credits, aggregate.weighted_average
    );

    output
}

pub fn share_summary(aggregate: &AggregateResult, link: &str) -> String {
    format!(
        "My VTU SGPA: {:.2}/10.0 ({:.1}%) calculated using VTU 2022 Scheme. Calculate yours at {}",
        aggregate.weighted_average, aggregate.derived_percentage, link
    )
}

/// Marks and pass/fail totals from an extraction response.
pub fn extraction_summary(response: &ExtractionResponse) -> String {
    let subjects: Vec<_> = response.subjects.values().collect();
    let internal: f64 = subjects.iter().map(|s| s.internal).sum();
    let external: f64 = subjects.iter().map(|s| s.external).sum();
    let total: f64 = subjects.iter().map(|s| s.total).sum();
    let passed = subjects.iter().filter(|s| s.passed()).count();
    let failed = subjects.iter().filter(|s| s.failed()).count();

    let mut output = String::new();
    let _ = writeln!(output, "Subject Breakdown");
    if let Some(scheme) = response.scheme.as_deref() {
        let _ = writeln!(output, "Scheme: {scheme}");
    }

    if subjects.is_empty() {
        let _ = writeln!(output, "No subjects returned.");
        return output;
    }

    for subject in subjects.iter() {
        let _ = writeln!(
            output,
            "- {} {}: internal {} external {} total {} [{}]",
            subject.code, subject.name, subject.internal, subject.external, subject.total, subject.result
        );
    }
    let _ = writeln!(output, "Total internal marks: {internal}");
    let _ = writeln!(output, "Total external marks: {external}");
    let _ = writeln!(output, "Total marks: {total}");
    let _ = writeln!(output, "Passed subjects: {}/{}", passed, subjects.len());
    let _ = writeln!(output, "Failed subjects: {failed}");

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::compute_aggregate;
    use crate::models::CourseRecord;
    use pretty_assertions::assert_eq;

    fn context() -> ReportContext {
        ReportContext {
            generated_on: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            semester: Some(Semester::Number(3)),
            branch: Some("CS".to_string()),
        }
    }

    fn ledger() -> Vec<CourseRecord> {
        vec![
            CourseRecord::new("22CS301", "Data Structures", 4, "O"),
            CourseRecord::new("22CS302", "Computer Organization", 3, "B+"),
            CourseRecord::new(
                "22CS303",
                "Object Oriented Programming with Java and Design Patterns",
                4,
                "AB",
            ),
        ]
    }

    #[test]
    fn report_carries_results_and_labels() {
        let records = vec![
            CourseRecord::new("22CS301", "Data Structures", 4, "O"),
            CourseRecord::new("22CS302", "Computer Organization", 3, "B+"),
        ];
        let aggregate = compute_aggregate(&records).unwrap();
        let report = build_report(&context(), &aggregate);

        assert!(report.contains("Generated on: 16/10/2026"));
        assert!(report.contains("Semester: 3rd Semester"));
        assert!(report.contains("Branch: Computer Science & Engineering"));
        assert!(report.contains("SGPA: 8.71/10.0"));
        assert!(report.contains("Equivalent Percentage: 79.6%"));
        assert!(report.contains("Disclaimer:"));
        assert_eq!(context().default_file_name(), "VTU_SGPA_Report_16-10-2026.txt");
    }

    #[test]
    fn exported_table_reads_back() {
        let records = ledger();
        let aggregate = compute_aggregate(&records).unwrap();
        let rows = read_report_table(&build_report(&context(), &aggregate)).unwrap();

        assert_eq!(rows.len(), records.len());
        for (row, course) in rows.iter().zip(aggregate.breakdown.iter()) {
            assert_eq!(row.code, course.code);
            assert_eq!(row.credits, course.credits);
            assert_eq!(row.grade, course.grade);
            assert!((row.weighted_points - course.weighted_points).abs() < 0.05);
        }
        assert_eq!(rows[2].name, "Object Oriented Programming with J");
    }

    #[test]
    fn comparison_flags_changed_rows() {
        let records = ledger();
        let aggregate = compute_aggregate(&records).unwrap();
        let mut rows = read_report_table(&build_report(&context(), &aggregate)).unwrap();
        assert!(compare_report_rows(&rows, &aggregate).is_empty());

        rows[1].grade = "A".to_string();
        rows.pop();
        let mismatches = compare_report_rows(&rows, &aggregate);
        assert_eq!(mismatches.len(), 2);
        assert!(mismatches[1].starts_with("22CS302"));
    }

    #[test]
    fn spaced_grade_and_long_code_read_back() {
        let records = vec![
            CourseRecord::new("22CS301", "Data Structures", 4, "A +"),
            CourseRecord::new("22MATH3011", "Discrete Mathematics and Graph Theory", 3, "B+"),
        ];
        let aggregate = compute_aggregate(&records).unwrap();
        let rows = read_report_table(&build_report(&context(), &aggregate)).unwrap();

        assert_eq!(rows[0].grade, "A +");
        assert_eq!(rows[0].name, "Data Structures");
        assert_eq!(rows[1].code, "22MATH3011");
        assert_eq!(rows[1].name, "Discrete Mathematics and Graph The");
        assert_eq!(rows[1].grade, "B+");
        assert!(compare_report_rows(&rows, &aggregate).is_empty());
    }

    #[test]
    fn missing_table_is_an_error() {
        assert_eq!(read_report_table("SGPA: 8.00/10.0"), Err(ReportError::MissingTable));
    }

    #[test]
    fn grade_sheet_shows_calculation() {
        let records = vec![
            CourseRecord::new("22CS301", "Data Structures", 4, "O"),
            CourseRecord::new("22CS302", "Computer Organization", 3, "B+"),
        ];
        let aggregate = compute_aggregate(&records).unwrap();
        let sheet = build_grade_sheet(&context(), &aggregate);

        assert!(sheet.contains("- 22CS301: 4 × 10 = 40.0 points"));
        assert!(sheet.contains("SGPA = 61.0 ÷ 7 = 8.71"));
        assert!(sheet.contains("Average grade: A+"));
        assert!(sheet.contains("Excellent"));
    }

    #[test]
    fn share_summary_rounds_for_display() {
        let records = vec![
            CourseRecord::new("22CS301", "Data Structures", 4, "O"),
            CourseRecord::new("22CS302", "Computer Organization", 3, "B+"),
        ];
        let aggregate = compute_aggregate(&records).unwrap();
        assert_eq!(
            share_summary(&aggregate, "https://example.com/sgpa"),
            "My VTU SGPA: 8.71/10.0 (79.6%) calculated using VTU 2022 Scheme. \
             Calculate yours at https://example.com/sgpa"
        );
    }

    #[test]
    fn unselected_context_labels() {
        let context = ReportContext {
            generated_on: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            semester: None,
            branch: None,
        };
        assert_eq!(context.semester_label(), "Not Selected");
        assert_eq!(context.branch_label(), "Not Selected");
    }

    #[test]
    fn withheld_subjects_count_as_neither_passed_nor_failed() {
        let response: ExtractionResponse = serde_json::from_str(
            r#"{"subjects": {
                "BCS401": {"code": "BCS401", "internal": 40, "external": 45, "total": 85, "result": "P"},
                "BCS402": {"code": "BCS402", "internal": 20, "external": 10, "total": 30, "result": "F"},
                "BCS403": {"code": "BCS403", "internal": 35, "result": "W"}
            }}"#,
        )
        .unwrap();

        let summary = extraction_summary(&response);
        assert!(summary.contains("Passed subjects: 1/3"));
        assert!(summary.contains("Failed subjects: 1\n"));
        assert!(summary.contains("Total internal marks: 95"));
    }
}
