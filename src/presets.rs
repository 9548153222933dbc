use std::collections::HashMap;

use crate::grading::DEFAULT_GRADE;
use crate::models::{CourseRecord, Semester};

pub const BRANCHES: [(&str, &str); 10] = [
    ("CS", "Computer Science & Engineering"),
    ("EC", "Electronics & Communication Engineering"),
    ("ME", "Mechanical Engineering"),
    ("CE", "Civil Engineering"),
    ("IS", "Information Science & Engineering"),
    ("EE", "Electrical Engineering"),
    ("CH", "Chemical Engineering"),
    ("BT", "Biotechnology"),
    ("AE", "Aerospace Engineering"),
    ("IE", "Industrial Engineering"),
];

/// Semester used when parsed text yields nothing and no semester was chosen.
pub const FALLBACK_SEMESTER: Semester = Semester::Number(3);

pub fn branch_name(code: &str) -> Option<&'static str> {
    BRANCHES
        .iter()
        .find(|(branch, _)| branch.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

pub fn sample_courses(semester: Semester) -> Option<Vec<CourseRecord>> {
    let courses: &[(&str, &str, u32)] = match semester {
        Semester::Number(1) => &[
            ("22MA101", "Calculus and Linear Algebra", 4),
            ("22PH101", "Physics", 3),
            ("22CH101", "Chemistry", 3),
            ("22EE101", "Basic Electrical Engineering", 3),
            ("22ME101", "Elements of Mechanical Engineering", 3),
            ("22CS101", "Programming in C", 3),
            ("22EG101", "Engineering Graphics", 1),
        ],
        Semester::Number(3) => &[
            ("22MA301", "Discrete Mathematics", 3),
            ("22CS301", "Data Structures", 4),
            ("22CS302", "Computer Organization", 4),
            ("22CS303", "Object Oriented Programming with Java", 4),
            ("22CS304", "Database Management Systems", 3),
            ("22CS305", "Data Structures Laboratory", 2),
        ],
        _ => return None,
    };

    Some(
        courses
            .iter()
            .map(|(code, name, credits)| CourseRecord::new(code, name, *credits, DEFAULT_GRADE))
            .collect(),
    )
}

/// Most common branch segment among course codes, e.g. `CS` in `22CS301`.
pub fn detect_branch<'a>(codes: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for code in codes {
        let segment: String = code
            .chars()
            .skip_while(|c| c.is_ascii_digit())
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if branch_name(&segment).is_some() {
            *counts.entry(segment.to_ascii_uppercase()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().next().map(|(branch, _)| branch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_semester_preset_defaults_grade() {
        let courses = sample_courses(Semester::Number(3)).unwrap();
        assert_eq!(courses.len(), 6);
        assert_eq!(courses.iter().map(|c| c.credits).sum::<u32>(), 20);
        assert!(courses.iter().all(|c| c.grade == "A+"));
    }

    #[test]
    fn unknown_semester_has_no_preset() {
        assert!(sample_courses(Semester::Number(5)).is_none());
        assert!(sample_courses(Semester::Lateral).is_none());
    }

    #[test]
    fn preset_codes_are_valid() {
        for semester in [Semester::Number(1), Semester::Number(3)] {
            for course in sample_courses(semester).unwrap() {
                assert!(crate::ledger::is_valid_course_code(&course.code), "{}", course.code);
            }
        }
    }

    #[test]
    fn branch_lookup_and_detection() {
        assert_eq!(branch_name("cs"), Some("Computer Science & Engineering"));
        assert_eq!(branch_name("XX"), None);
        assert_eq!(
            detect_branch(["22MA301", "22CS301", "22CS302", "22EC301"]),
            Some("CS".to_string())
        );
        assert_eq!(detect_branch(["22MA301"]), None);
    }
}
