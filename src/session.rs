use chrono::NaiveDate;
use tracing::{info, warn};

use crate::compute::{compute_aggregate, ComputeError};
use crate::extract::to_records;
use crate::grading::{is_known_grade, marks_to_grade, DEFAULT_GRADE};
use crate::ledger::{CourseLedger, CreditAdvisory, LedgerError};
use crate::models::{AggregateResult, CourseRecord, ExtractionResponse, Semester};
use crate::parser::parse_transcript_text;
use crate::presets::{detect_branch, sample_courses, FALLBACK_SEMESTER};
use crate::report::ReportContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

/// A course as typed by the user. A mark out of 100 overrides the letter grade.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct CourseInput {
    pub code: String,
    pub name: String,
    pub credits: u32,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub marks: Option<u32>,
}

impl CourseInput {
    pub fn into_record(self) -> CourseRecord {
        let grade = match (self.marks, self.grade) {
            (Some(marks), _) if marks <= 100 => marks_to_grade(marks).to_string(),
            (_, Some(grade)) if !grade.trim().is_empty() => grade.trim().to_string(),
            _ => DEFAULT_GRADE.to_string(),
        };
        CourseRecord {
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            credits: self.credits,
            grade,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed { courses: usize, defaulted: usize },
    FellBackToPreset { courses: usize },
}

/// One calculation session: the ledger plus the selections that label its report.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub ledger: CourseLedger,
    pub semester: Option<Semester>,
    pub branch: Option<String>,
    messages: Vec<StatusMessage>,
}

impl Session {
    pub fn new(semester: Option<Semester>, branch: Option<String>) -> Self {
        Self {
            semester,
            branch,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[StatusMessage] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<StatusMessage> {
        std::mem::take(&mut self.messages)
    }

    fn notify(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.messages.push(StatusMessage {
            level,
            text: text.into(),
        });
    }

    pub fn add_course(&mut self, input: CourseInput) -> Result<CreditAdvisory, LedgerError> {
        let record = input.into_record();
        let code = record.code.clone();
        let grade = record.grade.clone();

        match self.ledger.add_record(record) {
            Ok(advisory) => {
                if let Some(message) = advisory.message() {
                    self.notify(StatusLevel::Warning, message);
                }
                if !is_known_grade(&grade) {
                    self.notify(
                        StatusLevel::Warning,
                        format!("Grade {grade:?} for {code} is not on the scale and counts as 0 points."),
                    );
                }
                self.notify(StatusLevel::Success, format!("Course {code} added successfully."));
                Ok(advisory)
            }
            Err(error) => {
                self.notify(StatusLevel::Error, error.to_string());
                Err(error)
            }
        }
    }

    pub fn load_preset(&mut self, semester: Semester) -> bool {
        match sample_courses(semester) {
            Some(courses) => {
                let count = self.ledger.replace_with(courses);
                self.semester = Some(semester);
                info!(semester = %semester.label(), count, "preset courses loaded");
                true
            }
            None => {
                self.notify(
                    StatusLevel::Warning,
                    format!("No sample courses for {}.", semester.label()),
                );
                false
            }
        }
    }

    /// Replaces the ledger with courses parsed from `text`, or with the
    /// session's preset when nothing in the text looks like a course.
    pub fn load_parsed_text(&mut self, text: &str) -> ParseOutcome {
        let parsed = parse_transcript_text(text);

        if parsed.is_empty() {
            let semester = self
                .semester
                .filter(|semester| sample_courses(*semester).is_some())
                .unwrap_or(FALLBACK_SEMESTER);
            warn!(semester = %semester.label(), "no courses parsed, loading preset");
            self.load_preset(semester);
            self.notify(
                StatusLevel::Warning,
                "Auto-parsing found limited data. Sample courses loaded. Please review and edit.",
            );
            return ParseOutcome::FellBackToPreset {
                courses: self.ledger.len(),
            };
        }

        let defaulted = parsed.iter().filter(|course| !course.is_confident()).count();
        let courses = self
            .ledger
            .replace_with(parsed.into_iter().map(|course| course.record).collect());
        self.notify(
            StatusLevel::Success,
            format!("Successfully parsed {courses} courses from VTU transcript."),
        );
        if defaulted > 0 {
            self.notify(
                StatusLevel::Warning,
                format!("{defaulted} courses used a default grade or credit value."),
            );
        }
        ParseOutcome::Parsed { courses, defaulted }
    }

    pub fn load_extraction(&mut self, response: &ExtractionResponse) -> usize {
        let count = self.ledger.replace_with(to_records(response));
        self.branch = response
            .branch
            .clone()
            .or_else(|| detect_branch(self.ledger.records().iter().map(|r| r.code.as_str())));
        info!(count, branch = ?self.branch, "extracted courses loaded");
        count
    }

    pub fn calculate(&mut self) -> Result<AggregateResult, ComputeError> {
        compute_aggregate(self.ledger.records()).inspect_err(|error| {
            self.notify(StatusLevel::Warning, error.to_string());
        })
    }

    pub fn report_context(&self, generated_on: NaiveDate) -> ReportContext {
        let branch = self
            .branch
            .clone()
            .or_else(|| detect_branch(self.ledger.records().iter().map(|r| r.code.as_str())));
        ReportContext {
            generated_on,
            semester: self.semester,
            branch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(code: &str, credits: u32, grade: &str) -> CourseInput {
        CourseInput {
            code: code.to_string(),
            name: "Data Structures".to_string(),
            credits,
            grade: Some(grade.to_string()),
            marks: None,
        }
    }

    #[test]
    fn marks_override_letter_grade() {
        let record = CourseInput {
            marks: Some(83),
            ..input("22CS301", 4, "C")
        }
        .into_record();
        assert_eq!(record.grade, "A+");

        let record = CourseInput {
            marks: Some(140),
            ..input("22CS301", 4, "C")
        }
        .into_record();
        assert_eq!(record.grade, "C");
    }

    #[test]
    fn failed_add_keeps_ledger_and_reports_error() {
        let mut session = Session::default();
        session.add_course(input("22CS301", 4, "O")).unwrap();
        assert!(session.add_course(input("ABCD123", 3, "A")).is_err());
        assert!(session.add_course(input("22CS301", 3, "A")).is_err());

        assert_eq!(session.ledger.len(), 1);
        let levels: Vec<StatusLevel> = session.messages().iter().map(|m| m.level).collect();
        assert_eq!(
            levels,
            vec![StatusLevel::Success, StatusLevel::Error, StatusLevel::Error]
        );
    }

    #[test]
    fn unparseable_text_falls_back_to_preset() {
        let mut session = Session::new(Some(Semester::Number(1)), None);
        let outcome = session.load_parsed_text("nothing useful here\nstill nothing");

        assert_eq!(outcome, ParseOutcome::FellBackToPreset { courses: 7 });
        assert_eq!(session.ledger.records()[0].code, "22MA101");
        assert!(session
            .messages()
            .iter()
            .any(|m| m.level == StatusLevel::Warning && m.text.contains("Sample courses loaded")));
    }

    #[test]
    fn fallback_uses_default_semester_without_preset() {
        let mut session = Session::new(Some(Semester::Number(6)), None);
        let outcome = session.load_parsed_text("");
        assert_eq!(outcome, ParseOutcome::FellBackToPreset { courses: 6 });
        assert_eq!(session.semester, Some(FALLBACK_SEMESTER));
    }

    #[test]
    fn parsed_text_replaces_ledger() {
        let mut session = Session::default();
        session.add_course(input("22CS399", 2, "O")).unwrap();

        let outcome = session.load_parsed_text("22CS301 Data Structures B+ 4\n22CS302 Computer Organization");
        assert_eq!(outcome, ParseOutcome::Parsed { courses: 2, defaulted: 1 });
        assert!(!session.ledger.contains_code("22CS399"));
    }

    #[test]
    fn empty_session_warns_on_calculate() {
        let mut session = Session::default();
        assert_eq!(session.calculate(), Err(ComputeError::EmptyLedger));
        assert_eq!(session.take_messages()[0].level, StatusLevel::Warning);
        assert!(session.messages().is_empty());
    }

    #[test]
    fn extraction_sets_branch() {
        let response: ExtractionResponse = serde_json::from_str(
            r#"{"subjects": {"22EC301": {"code": "22EC301", "name": "Signals", "credits": 4, "grade": "A"}}}"#,
        )
        .unwrap();
        let mut session = Session::default();
        assert_eq!(session.load_extraction(&response), 1);
        assert_eq!(session.branch.as_deref(), Some("EC"));

        let context = session.report_context(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(context.branch_label(), "Electronics & Communication Engineering");
    }
}
