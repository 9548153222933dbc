//! Best-effort extraction of course records from pasted transcript text.
//!
//! Each line is scanned on its own. A line counts only if it carries a course
//! code; grade and credit tokens are first-match-wins, and missing ones fall
//! back to fixed defaults tagged as [`FieldSource::Defaulted`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::{CourseRecord, FieldSource, ParsedCourse};

pub const FALLBACK_GRADE: &str = "A";
pub const FALLBACK_CREDITS: u32 = 3;
pub const FALLBACK_NAME: &str = "Course Name";

static COURSE_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b\d{2}[A-Z]{2,4}\d{3}\b").ok());

// `+` is part of a grade token, so plain `\b` cannot delimit `A+`/`B+`.
static GRADE_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9+])(O|A\+|A|B\+|B|C|P|F)(?:$|[^A-Za-z0-9+])").ok()
});

static CREDIT_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b[1-4]\b").ok());

static STANDALONE_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b\d+\b").ok());

pub fn parse_transcript_text(raw: &str) -> Vec<ParsedCourse> {
    let parsed: Vec<ParsedCourse> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_line)
        .collect();

    debug!(
        courses = parsed.len(),
        defaulted = parsed.iter().filter(|course| !course.is_confident()).count(),
        "parsed transcript text"
    );
    parsed
}

pub fn parse_line(line: &str) -> Option<ParsedCourse> {
    let code = COURSE_CODE.as_ref()?.find(line)?;

    let grade = first_grade(line);
    let credits = CREDIT_TOKEN
        .as_ref()
        .and_then(|pattern| pattern.find(line))
        .and_then(|found| found.as_str().parse::<u32>().ok());

    let name_end = grade
        .and_then(|grade| last_grade_start(line, grade))
        .filter(|start| *start >= code.end())
        .unwrap_or(line.len());
    let name = clean_name(&line[code.end()..name_end]);

    Some(ParsedCourse {
        record: CourseRecord {
            code: code.as_str().to_string(),
            name: if name.is_empty() { FALLBACK_NAME.to_string() } else { name },
            credits: credits.unwrap_or(FALLBACK_CREDITS),
            grade: grade.unwrap_or(FALLBACK_GRADE).to_string(),
        },
        grade_source: source_of(grade.is_some()),
        credits_source: source_of(credits.is_some()),
    })
}

fn source_of(matched: bool) -> FieldSource {
    if matched {
        FieldSource::Matched
    } else {
        FieldSource::Defaulted
    }
}

fn first_grade(line: &str) -> Option<&str> {
    GRADE_TOKEN
        .as_ref()?
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|found| found.as_str())
}

/// Byte offset of the last standalone occurrence of `grade`.
fn last_grade_start(line: &str, grade: &str) -> Option<usize> {
    let pattern = GRADE_TOKEN.as_ref()?;
    let mut last = None;
    let mut offset = 0;

    // Delimiters are consumed by each match, so step past the token only.
    while let Some(captures) = pattern.captures_at(line, offset) {
        let token = captures.get(1)?;
        if token.as_str() == grade {
            last = Some(token.start());
        }
        offset = token.end();
    }
    last
}

fn clean_name(raw: &str) -> String {
    let without_numbers = match STANDALONE_NUMBER.as_ref() {
        Some(pattern) => pattern.replace_all(raw, "").into_owned(),
        None => raw.to_string(),
    };
    without_numbers
        .replace('|', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
