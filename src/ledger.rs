use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::CourseRecord;

/// Advisory ceiling on credits per semester. Exceeding it only warns.
pub const MAX_CREDITS_PER_SEMESTER: u32 = 28;

static COURSE_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d{2}[A-Z]{2,4}\d{3}$").ok());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid course code {0:?} (format: YYCCNNN, e.g. 22CS101)")]
    InvalidCode(String),
    #[error("course code {0} already exists")]
    DuplicateCode(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("no course at position {index} (ledger holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("invalid credit value {0:?}")]
    InvalidCredits(String),
    #[error("destructive action requires confirmation")]
    Unconfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditAdvisory {
    WithinLimit,
    ApproachingLimit { total: u32 },
    ExceedsLimit { total: u32 },
}

impl CreditAdvisory {
    pub fn for_total(total: u32) -> Self {
        if total > MAX_CREDITS_PER_SEMESTER {
            CreditAdvisory::ExceedsLimit { total }
        } else if f64::from(total) > f64::from(MAX_CREDITS_PER_SEMESTER) * 0.8 {
            CreditAdvisory::ApproachingLimit { total }
        } else {
            CreditAdvisory::WithinLimit
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            CreditAdvisory::WithinLimit => None,
            CreditAdvisory::ApproachingLimit { total } => Some(format!(
                "{total} credits: approaching limit of {MAX_CREDITS_PER_SEMESTER} credits per semester"
            )),
            CreditAdvisory::ExceedsLimit { total } => Some(format!(
                "{total} credits: exceeds maximum of {MAX_CREDITS_PER_SEMESTER} credits per semester"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseField {
    Code,
    Name,
    Credits,
    Grade,
}

pub fn is_valid_course_code(code: &str) -> bool {
    COURSE_CODE
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(code))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseLedger {
    records: Vec<CourseRecord>,
}

impl CourseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps stored rows as they are, duplicates and all. Used when reloading
    /// a ledger whose rows were edited after insertion.
    pub fn from_records(records: Vec<CourseRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_credits(&self) -> u32 {
        self.records.iter().map(|record| record.credits).sum()
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.records.iter().any(|record| record.code == code)
    }

    pub fn add_record(&mut self, record: CourseRecord) -> Result<CreditAdvisory, LedgerError> {
        if record.code.trim().is_empty() {
            return Err(LedgerError::MissingField("code"));
        }
        if record.name.trim().is_empty() {
            return Err(LedgerError::MissingField("name"));
        }
        if !is_valid_course_code(&record.code) {
            return Err(LedgerError::InvalidCode(record.code));
        }
        if self.contains_code(&record.code) {
            return Err(LedgerError::DuplicateCode(record.code));
        }

        info!(code = %record.code, credits = record.credits, grade = %record.grade, "course added");
        self.records.push(record);

        let advisory = CreditAdvisory::for_total(self.total_credits());
        if let Some(message) = advisory.message() {
            warn!("{message}");
        }
        Ok(advisory)
    }

    pub fn remove_record(&mut self, index: usize, confirmed: bool) -> Result<CourseRecord, LedgerError> {
        if index >= self.records.len() {
            return Err(LedgerError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        if !confirmed {
            return Err(LedgerError::Unconfirmed);
        }

        let removed = self.records.remove(index);
        info!(code = %removed.code, "course removed");
        Ok(removed)
    }

    /// Edits one field in place. Code format and uniqueness are checked only
    /// at insertion, so an edited code is taken as given.
    pub fn edit_field(&mut self, index: usize, field: CourseField, value: &str) -> Result<(), LedgerError> {
        let len = self.records.len();
        let record = self
            .records
            .get_mut(index)
            .ok_or(LedgerError::IndexOutOfRange { index, len })?;

        match field {
            CourseField::Code => record.code = value.trim().to_string(),
            CourseField::Name => record.name = value.trim().to_string(),
            CourseField::Grade => record.grade = value.trim().to_string(),
            CourseField::Credits => {
                record.credits = value
                    .trim()
                    .parse()
                    .map_err(|_| LedgerError::InvalidCredits(value.to_string()))?;
            }
        }

        debug!(index, ?field, value, "course field edited");
        Ok(())
    }

    pub fn reset(&mut self, confirmed: bool) -> Result<(), LedgerError> {
        if !confirmed {
            return Err(LedgerError::Unconfirmed);
        }
        self.records.clear();
        info!("ledger reset");
        Ok(())
    }

    /// Replaces the whole ledger. Later duplicates of a code are dropped.
    pub fn replace_with(&mut self, records: Vec<CourseRecord>) -> usize {
        let mut seen = HashSet::new();
        self.records = records
            .into_iter()
            .filter(|record| {
                let fresh = seen.insert(record.code.clone());
                if !fresh {
                    warn!(code = %record.code, "dropping duplicate course code");
                }
                fresh
            })
            .collect();
        self.records.len()
    }
}
