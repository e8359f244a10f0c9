#[path = "../src/roster.rs"]
#[allow(dead_code)]
mod roster;

use roster::{AttendanceRecord, AttendanceStatus, Student};

fn student(id: &str, name: &str, class_name: &str) -> Student {
    Student {
        id: id.to_string(),
        name: name.to_string(),
        class_name: class_name.to_string(),
        photo_url: String::new(),
    }
}

fn record(ts: &str, name: &str, status: &str) -> AttendanceRecord {
    AttendanceRecord {
        timestamp: ts.to_string(),
        name: name.to_string(),
        status: status.to_string(),
        note: String::new(),
        class_name: String::new(),
    }
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

#[test]
fn student_rows_hide_contact_columns_and_default_the_name() {
    let s = roster::student_from_row(&row(&["7", "김민준", "김부모", "010-1234", "영아부", "url"]));
    assert_eq!(s, Student {
        id: "7".into(),
        name: "김민준".into(),
        class_name: "영아부".into(),
        photo_url: "url".into(),
    });
    let json = serde_json::to_value(&s).expect("serialize");
    assert!(json.get("className").is_some());
    assert!(json.as_object().expect("object").len() == 4);

    let short = roster::student_from_row(&row(&["8"]));
    assert_eq!(short.name, roster::UNNAMED_STUDENT);
    assert_eq!(short.class_name, "");
    assert_eq!(short.photo_url, "");
}

#[test]
fn student_lookup_matches_class_only_when_given() {
    let rows = vec![
        row(&["번호", "이름", "보호자", "연락처", "반", "사진"]),
        row(&["1", "최하은", "", "", "영아부"]),
        row(&["2", "최하은", "", "", "유치부"]),
    ];
    assert_eq!(roster::find_student_row(&rows, "최하은", None), Some(1));
    assert_eq!(roster::find_student_row(&rows, "최하은", Some("")), Some(1));
    assert_eq!(roster::find_student_row(&rows, "최하은", Some("유치부")), Some(2));
    assert_eq!(roster::find_student_row(&rows, "최하은", Some("초등부")), None);
    assert_eq!(roster::find_student_row(&rows, "없는학생", None), None);
}

#[test]
fn attendance_lookup_takes_the_last_row_of_the_day() {
    let rows = vec![
        row(&["시간", "이름", "상태", "비고", "반"]),
        row(&["2024. 12. 23. 오전 9:00:00", "김민준", "출석"]),
        row(&["2024. 12. 24. 오전 9:00:00", "김민준", "출석"]),
        row(&["2024. 12. 24. 오전 9:10:00", "이서연", "출석"]),
        row(&["2024. 12. 24. 오전 9:30:00", "김민준", "취소"]),
    ];
    let today = |ts: &str| ts.starts_with("2024. 12. 24.");
    assert_eq!(roster::find_attendance_row(&rows, "김민준", today), Some(4));
    assert_eq!(roster::find_attendance_row(&rows, "이서연", today), Some(3));
    assert_eq!(roster::find_attendance_row(&rows, "박지호", today), None);
    let other_day = |ts: &str| ts.starts_with("2024. 12. 23.");
    assert_eq!(roster::find_attendance_row(&rows, "김민준", other_day), Some(1));
}

#[test]
fn status_parsing_accepts_korean_and_english_labels() {
    assert_eq!(AttendanceStatus::parse("출석"), Some(AttendanceStatus::Present));
    assert_eq!(AttendanceStatus::parse(" present "), Some(AttendanceStatus::Present));
    assert_eq!(AttendanceStatus::parse("취소"), Some(AttendanceStatus::Cancelled));
    assert_eq!(AttendanceStatus::parse("cancelled"), Some(AttendanceStatus::Cancelled));
    assert_eq!(AttendanceStatus::parse("absent"), None);
    assert_eq!(AttendanceStatus::Cancelled.label(), "취소");
}

#[test]
fn daily_summary_uses_latest_record_per_name() {
    let students = vec![
        student("1", "김민준", "영아부"),
        student("2", "이서연", "유치부"),
        student("3", "박지호", "유치부"),
        student("4", "정우진", ""),
    ];
    let records = vec![
        record("2024. 12. 24. 오전 9:00:00", "김민준", "출석"),
        record("2024. 12. 24. 오전 9:05:00", "이서연", "출석"),
        record("2024. 12. 24. 오전 9:20:00", "김민준", "취소"),
        record("2024. 12. 24. 오전 9:25:00", "정우진", "출석"),
    ];

    let summary = roster::daily_summary("2024. 12. 24.", &students, &records);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.attended_count, 2);

    let names: Vec<&str> = summary.classes.iter().map(|c| c.class_name.as_str()).collect();
    assert_eq!(names, vec!["기타", "영아부", "유치부"]);

    let unassigned = &summary.classes[0];
    assert_eq!(unassigned.attended.len(), 1);
    assert_eq!(unassigned.attended[0].student.name, "정우진");

    let infants = &summary.classes[1];
    assert!(infants.attended.is_empty());
    assert_eq!(infants.not_attended[0].name, "김민준");

    let kinder = &summary.classes[2];
    assert_eq!(kinder.attended.len(), 1);
    assert_eq!(kinder.attended[0].record.timestamp, "2024. 12. 24. 오전 9:05:00");
    assert_eq!(kinder.not_attended.len(), 1);
    assert_eq!(kinder.not_attended[0].name, "박지호");
}

#[test]
fn daily_summary_counts_checked_in_names_missing_from_roster() {
    let students = vec![student("1", "김민준", "영아부")];
    let records = vec![record("2024. 12. 24. 오전 9:00:00", "전학생", "출석")];
    let summary = roster::daily_summary("2024. 12. 24.", &students, &records);
    assert_eq!(summary.total, 1);
    assert_eq!(summary.attended_count, 1);
    assert_eq!(summary.classes.len(), 1);
    assert_eq!(summary.classes[0].not_attended.len(), 1);
}

#[test]
fn empty_day_has_everyone_not_attended() {
    let students = vec![student("1", "김민준", "영아부"), student("2", "이서연", "영아부")];
    let summary = roster::daily_summary("2024. 12. 24.", &students, &[]);
    assert_eq!(summary.attended_count, 0);
    assert_eq!(summary.classes.len(), 1);
    assert_eq!(summary.classes[0].not_attended.len(), 2);

    let json = serde_json::to_value(&summary).expect("serialize");
    assert_eq!(json["attendedCount"], 0);
    assert!(json["classes"][0]["notAttended"].is_array());
}
