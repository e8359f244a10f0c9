//! Row mapping and the derived attendance views.
//!
//! Everything here works on plain rows already read from the sheets, so it has
//! no knowledge of where they came from.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const UNNAMED_STUDENT: &str = "이름 없음";
pub const UNASSIGNED_CLASS: &str = "기타";

pub const STATUS_PRESENT: &str = "출석";
pub const STATUS_CANCELLED: &str = "취소";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub class_name: String,
    pub photo_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub timestamp: String,
    pub name: String,
    pub status: String,
    pub note: String,
    pub class_name: String,
}

impl AttendanceRecord {
    pub fn is_cancelled(&self) -> bool {
        self.status == STATUS_CANCELLED
    }

    /// Cells in sheet column order: timestamp, name, status, note, class.
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.name.clone(),
            self.status.clone(),
            self.note.clone(),
            self.class_name.clone(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Cancelled,
}

impl AttendanceStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            STATUS_PRESENT | "present" => Some(AttendanceStatus::Present),
            STATUS_CANCELLED | "cancelled" | "canceled" => Some(AttendanceStatus::Cancelled),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Present => STATUS_PRESENT,
            AttendanceStatus::Cancelled => STATUS_CANCELLED,
        }
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.as_str()).unwrap_or("")
}

/// Roster columns: A number, B name, C parent, D phone, E class, F photo.
/// Parent and phone are never exposed.
pub fn student_from_row(row: &[String]) -> Student {
    let name = cell(row, 1);
    Student {
        id: cell(row, 0).to_string(),
        name: if name.is_empty() {
            UNNAMED_STUDENT.to_string()
        } else {
            name.to_string()
        },
        class_name: cell(row, 4).to_string(),
        photo_url: cell(row, 5).to_string(),
    }
}

pub fn student_to_cells(student: &Student) -> Vec<String> {
    vec![
        student.id.clone(),
        student.name.clone(),
        String::new(),
        String::new(),
        student.class_name.clone(),
        student.photo_url.clone(),
    ]
}

/// Attendance columns: A timestamp, B name, C status, D note, E class.
pub fn record_from_row(row: &[String]) -> AttendanceRecord {
    AttendanceRecord {
        timestamp: cell(row, 0).to_string(),
        name: cell(row, 1).to_string(),
        status: cell(row, 2).to_string(),
        note: cell(row, 3).to_string(),
        class_name: cell(row, 4).to_string(),
    }
}

/// Index of the first roster row matching `name` and, when given, `class_name`.
/// Rows are searched top to bottom.
pub fn find_student_row(rows: &[Vec<String>], name: &str, class_name: Option<&str>) -> Option<usize> {
    let class_name = class_name.filter(|c| !c.is_empty());
    rows.iter().position(|row| {
        cell(row, 1) == name && class_name.map(|c| cell(row, 4) == c).unwrap_or(true)
    })
}

/// Index of the last attendance row for `name` whose timestamp passes `is_on_day`.
pub fn find_attendance_row(
    rows: &[Vec<String>],
    name: &str,
    is_on_day: impl Fn(&str) -> bool,
) -> Option<usize> {
    rows.iter()
        .rposition(|row| cell(row, 1) == name && is_on_day(cell(row, 0)))
}

/// Latest record per name among `records` (sheet order: later rows win).
pub fn latest_by_name<'a>(
    records: impl IntoIterator<Item = &'a AttendanceRecord>,
) -> HashMap<&'a str, &'a AttendanceRecord> {
    let mut latest = HashMap::new();
    for rec in records {
        latest.insert(rec.name.as_str(), rec);
    }
    latest
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendedEntry {
    pub student: Student,
    pub record: AttendanceRecord,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAttendance {
    pub class_name: String,
    pub attended: Vec<AttendedEntry>,
    pub not_attended: Vec<Student>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: String,
    pub total: usize,
    pub attended_count: usize,
    pub classes: Vec<ClassAttendance>,
}

/// Today's dashboard: who is checked in, grouped by class.
///
/// `records` are in sheet order and already filtered to one day. A student is
/// attended when the latest record for their name is not a cancellation.
pub fn daily_summary(date: &str, students: &[Student], records: &[AttendanceRecord]) -> DailySummary {
    let latest = latest_by_name(records);

    let mut by_class: BTreeMap<String, ClassAttendance> = BTreeMap::new();
    for student in students {
        let class_name = if student.class_name.is_empty() {
            UNASSIGNED_CLASS.to_string()
        } else {
            student.class_name.clone()
        };
        let entry = by_class
            .entry(class_name.clone())
            .or_insert_with(|| ClassAttendance {
                class_name,
                ..ClassAttendance::default()
            });
        match latest.get(student.name.as_str()) {
            Some(rec) if !rec.is_cancelled() => entry.attended.push(AttendedEntry {
                student: student.clone(),
                record: (*rec).clone(),
            }),
            _ => entry.not_attended.push(student.clone()),
        }
    }

    // Counted by name, so a checked-in name missing from the roster still counts.
    let attended_count = latest.values().filter(|r| !r.is_cancelled()).count();

    DailySummary {
        date: date.to_string(),
        total: students.len(),
        attended_count,
        classes: by_class.into_values().collect(),
    }
}
