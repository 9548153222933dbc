use std::path::Path;

use anyhow::Context;

use crate::ledger::CourseLedger;
use crate::models::CourseRecord;
use crate::session::CourseInput;

/// Reads `code,name,credits,grade[,marks]` rows.
pub fn read_courses_csv(csv_path: &Path) -> anyhow::Result<Vec<CourseInput>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;

    let mut courses = Vec::new();
    for (index, result) in reader.deserialize::<CourseInput>().enumerate() {
        let row = result.with_context(|| format!("invalid course row {}", index + 2))?;
        courses.push(row);
    }

    Ok(courses)
}

/// Loads a course CSV exactly as stored, without insertion checks, so rows
/// changed by earlier edits survive the next rewrite.
pub fn load_ledger_csv(csv_path: &Path) -> anyhow::Result<CourseLedger> {
    let records = read_courses_csv(csv_path)?
        .into_iter()
        .map(CourseInput::into_record)
        .collect();
    Ok(CourseLedger::from_records(records))
}

pub fn write_courses_csv(csv_path: &Path, records: &[CourseRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
