use crate::models::GradeInfo;

/// VTU 2022 scheme, highest grade first.
pub const GRADE_SCALE: [GradeInfo; 8] = [
    GradeInfo { letter: "O", points: 10, level: "Outstanding", range: "90-100" },
    GradeInfo { letter: "A+", points: 9, level: "Excellent", range: "80-89" },
    GradeInfo { letter: "A", points: 8, level: "Very Good", range: "70-79" },
    GradeInfo { letter: "B+", points: 7, level: "Good", range: "60-69" },
    GradeInfo { letter: "B", points: 6, level: "Above Average", range: "55-59" },
    GradeInfo { letter: "C", points: 5, level: "Average", range: "50-54" },
    GradeInfo { letter: "P", points: 4, level: "Pass", range: "40-49" },
    GradeInfo { letter: "F", points: 0, level: "Fail", range: "0-39" },
];

/// Non-academic markers. All of them carry zero points.
pub const SPECIAL_GRADES: [(&str, &str); 5] = [
    ("DX", "Attendance below 75%"),
    ("AU", "Audit course"),
    ("AB", "Absent"),
    ("IC", "Incomplete"),
    ("W", "Withdrawn"),
];

pub const DEFAULT_GRADE: &str = "A+";

pub fn grade_info(grade: &str) -> Option<&'static GradeInfo> {
    GRADE_SCALE.iter().find(|info| info.letter == grade)
}

pub fn special_grade_description(grade: &str) -> Option<&'static str> {
    SPECIAL_GRADES
        .iter()
        .find(|(letter, _)| *letter == grade)
        .map(|(_, description)| *description)
}

pub fn is_known_grade(grade: &str) -> bool {
    grade_info(grade).is_some() || special_grade_description(grade).is_some()
}

/// Unknown grades and special markers contribute zero.
pub fn lookup_points(grade: &str) -> f64 {
    grade_info(grade).map_or(0.0, |info| f64::from(info.points))
}

pub fn points_to_descriptive_grade(points: f64) -> &'static str {
    match points {
        p if p >= 9.5 => "O",
        p if p >= 8.5 => "A+",
        p if p >= 7.5 => "A",
        p if p >= 6.5 => "B+",
        p if p >= 5.5 => "B",
        p if p >= 4.5 => "C",
        p if p >= 3.5 => "P",
        _ => "F",
    }
}

pub fn marks_to_grade(marks: u32) -> &'static str {
    match marks {
        90.. => "O",
        80..=89 => "A+",
        70..=79 => "A",
        60..=69 => "B+",
        55..=59 => "B",
        50..=54 => "C",
        40..=49 => "P",
        _ => "F",
    }
}

pub fn performance_label(sgpa: f64) -> &'static str {
    match sgpa {
        s if s >= 9.0 => "Outstanding",
        s if s >= 8.0 => "Excellent",
        s if s >= 7.0 => "Good",
        s if s >= 6.0 => "Above Average",
        s if s >= 5.0 => "Average",
        _ => "Needs Improvement",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_matches_scheme_points() {
        let points: Vec<(&str, f64)> = ["O", "A+", "A", "B+", "B", "C", "P", "F"]
            .iter()
            .map(|grade| (*grade, lookup_points(grade)))
            .collect();
        assert_eq!(
            points,
            vec![
                ("O", 10.0),
                ("A+", 9.0),
                ("A", 8.0),
                ("B+", 7.0),
                ("B", 6.0),
                ("C", 5.0),
                ("P", 4.0),
                ("F", 0.0),
            ]
        );
    }

    #[test]
    fn lookup_is_total() {
        for grade in ["AU", "AB", "IC", "W", "DX", "", "Z", "a+", "O "] {
            assert_eq!(lookup_points(grade), 0.0, "grade {grade:?}");
        }
    }

    #[test]
    fn special_markers_are_known_but_worthless() {
        assert!(is_known_grade("DX"));
        assert_eq!(special_grade_description("AB"), Some("Absent"));
        assert!(!is_known_grade("Q"));
    }

    #[test]
    fn descriptive_grade_uses_midpoint_thresholds() {
        assert_eq!(points_to_descriptive_grade(10.0), "O");
        assert_eq!(points_to_descriptive_grade(9.5), "O");
        assert_eq!(points_to_descriptive_grade(9.49), "A+");
        assert_eq!(points_to_descriptive_grade(8.71), "A+");
        assert_eq!(points_to_descriptive_grade(7.5), "A");
        assert_eq!(points_to_descriptive_grade(6.5), "B+");
        assert_eq!(points_to_descriptive_grade(5.5), "B");
        assert_eq!(points_to_descriptive_grade(4.5), "C");
        assert_eq!(points_to_descriptive_grade(3.5), "P");
        assert_eq!(points_to_descriptive_grade(3.49), "F");
    }

    #[test]
    fn marks_map_to_grade_bands() {
        assert_eq!(marks_to_grade(100), "O");
        assert_eq!(marks_to_grade(90), "O");
        assert_eq!(marks_to_grade(89), "A+");
        assert_eq!(marks_to_grade(70), "A");
        assert_eq!(marks_to_grade(60), "B+");
        assert_eq!(marks_to_grade(55), "B");
        assert_eq!(marks_to_grade(54), "C");
        assert_eq!(marks_to_grade(40), "P");
        assert_eq!(marks_to_grade(39), "F");
    }

    #[test]
    fn performance_labels_follow_tiers() {
        assert_eq!(performance_label(9.2), "Outstanding");
        assert_eq!(performance_label(8.71), "Excellent");
        assert_eq!(performance_label(7.0), "Good");
        assert_eq!(performance_label(6.4), "Above Average");
        assert_eq!(performance_label(5.0), "Average");
        assert_eq!(performance_label(2.0), "Needs Improvement");
    }
}
