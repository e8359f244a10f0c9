use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{backend, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::kst;
use crate::roster::{self, AttendanceRecord, AttendanceStatus, Student};
use crate::store::{ATTENDANCE, ROSTER};
use serde_json::json;

fn attendance_record(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = required_str(params, "name")?;
    let class_name = optional_str(params, "className").unwrap_or_default();
    let raw_status = required_str(params, "status")?;
    let status = AttendanceStatus::parse(&raw_status).ok_or_else(|| {
        HandlerErr::bad_params("status must be 출석/present or 취소/cancelled")
            .with_details(json!({ "status": raw_status }))
    })?;
    let note = optional_str(params, "note").unwrap_or_default();
    let backend = backend(state)?;

    let now = kst::now_seoul();
    let today = kst::day_key(&now);
    let record = AttendanceRecord {
        timestamp: kst::format_timestamp(&now),
        name,
        status: status.label().to_string(),
        note,
        class_name,
    };

    let rows = backend
        .sheets
        .read_rows(&ATTENDANCE, 1)
        .map_err(|e| HandlerErr::store("record attendance", e))?;
    let existing = roster::find_attendance_row(&rows, &record.name, |ts| kst::is_on_day(ts, &today));

    // Unguarded read-modify-write: two simultaneous check-ins can both append.
    let action = match existing {
        Some(idx) => {
            backend
                .sheets
                .update_row(&ATTENDANCE, idx + 1, &record.to_cells())
                .map_err(|e| HandlerErr::store("record attendance", e))?;
            "updated"
        }
        None => {
            backend
                .sheets
                .append_row(&ATTENDANCE, &record.to_cells())
                .map_err(|e| HandlerErr::store("record attendance", e))?;
            "appended"
        }
    };

    tracing::info!(
        name = %record.name,
        status = %record.status,
        action,
        "attendance recorded"
    );
    Ok(json!({ "success": true, "action": action, "record": record }))
}

fn read_records(state: &AppState, action: &str) -> Result<Vec<AttendanceRecord>, HandlerErr> {
    let backend = backend(state)?;
    let rows = backend
        .sheets
        .read_rows(&ATTENDANCE, 2)
        .map_err(|e| HandlerErr::store(action, e))?;
    Ok(rows.iter().map(|r| roster::record_from_row(r)).collect())
}

fn attendance_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let mut records = read_records(state, "fetch records")?;
    records.reverse();
    Ok(json!({ "records": records }))
}

fn attendance_today(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let today = kst::day_key(&kst::now_seoul());
    let records: Vec<AttendanceRecord> = read_records(state, "fetch records")?
        .into_iter()
        .filter(|r| kst::is_on_day(&r.timestamp, &today))
        .collect();
    let students: Vec<Student> = backend(state)?
        .sheets
        .read_rows(&ROSTER, 2)
        .map_err(|e| HandlerErr::store("fetch data", e))?
        .iter()
        .map(|r| roster::student_from_row(r))
        .collect();

    let summary = roster::daily_summary(&today, &students, &records);
    serde_json::to_value(summary).map_err(|e| HandlerErr::new("internal", e.to_string()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.record" => attendance_record(state, &req.params),
        "attendance.list" => attendance_list(state),
        "attendance.today" => attendance_today(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
