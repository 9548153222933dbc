use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub code: String,
    pub name: String,
    pub credits: u32,
    pub grade: String,
}

impl CourseRecord {
    pub fn new(code: &str, name: &str, credits: u32, grade: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            credits,
            grade: grade.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeInfo {
    pub letter: &'static str,
    pub points: u8,
    pub level: &'static str,
    pub range: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseBreakdown {
    pub code: String,
    pub name: String,
    pub credits: u32,
    pub grade: String,
    pub points: f64,
    pub weighted_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub total_credits: u32,
    pub total_weighted_points: f64,
    pub weighted_average: f64,
    pub derived_percentage: f64,
    pub breakdown: Vec<CourseBreakdown>,
}

/// Whether a parsed field came from the input line or from a fallback value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Matched,
    Defaulted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCourse {
    pub record: CourseRecord,
    pub grade_source: FieldSource,
    pub credits_source: FieldSource,
}

impl ParsedCourse {
    pub fn is_confident(&self) -> bool {
        self.grade_source == FieldSource::Matched && self.credits_source == FieldSource::Matched
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semester {
    Number(u8),
    Lateral,
}

impl Semester {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("lateral") {
            return Some(Semester::Lateral);
        }
        match value.parse::<u8>() {
            Ok(number @ 1..=8) => Some(Semester::Number(number)),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Semester::Lateral => "Lateral Entry".to_string(),
            Semester::Number(number) => format!("{number}{} Semester", ordinal_suffix(*number)),
        }
    }
}

fn ordinal_suffix(number: u8) -> &'static str {
    let (ones, tens) = (number % 10, number % 100);
    match (ones, tens) {
        (1, t) if t != 11 => "st",
        (2, t) if t != 12 => "nd",
        (3, t) if t != 13 => "rd",
        _ => "th",
    }
}

/// One subject as returned by the transcript extraction service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractedSubject {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub credits: f64,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub grade_point: f64,
    #[serde(default)]
    pub internal: f64,
    #[serde(default)]
    pub external: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default = "default_result")]
    pub result: String,
}

fn default_result() -> String {
    "P".to_string()
}

impl ExtractedSubject {
    pub fn passed(&self) -> bool {
        self.result == "P"
    }

    pub fn failed(&self) -> bool {
        self.result == "F"
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub subjects: BTreeMap<String, ExtractedSubject>,
    pub total_credits: Option<f64>,
    pub total_weighted_points: Option<f64>,
    pub sgpa: Option<f64>,
    pub branch: Option<String>,
    pub scheme: Option<String>,
    pub error: Option<String>,
}
