use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE: &str = "rollcall.sqlite3";
pub const PHOTOS_DIR: &str = "photos";

pub const ROSTER_HEADER: [&str; 6] = ["번호", "이름", "보호자", "연락처", "반", "사진"];
pub const ATTENDANCE_HEADER: [&str; 5] = ["시간", "이름", "상태", "비고", "반"];

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    std::fs::create_dir_all(workspace.join(PHOTOS_DIR))?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sheets(
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    // One row per spreadsheet row. row_idx is 0-based and kept dense per sheet,
    // so deleting a row shifts everything below it up by one.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sheet_rows(
            sheet_id INTEGER NOT NULL,
            row_idx INTEGER NOT NULL,
            cells_json TEXT NOT NULL,
            updated_at TEXT,
            PRIMARY KEY(sheet_id, row_idx),
            FOREIGN KEY(sheet_id) REFERENCES sheets(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS photos(
            id TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            stored_name TEXT NOT NULL,
            created_at TEXT
        )",
        [],
    )?;

    ensure_sheet(&conn, crate::store::ROSTER.title, &ROSTER_HEADER)?;
    ensure_sheet(&conn, crate::store::ATTENDANCE.title, &ATTENDANCE_HEADER)?;

    Ok(conn)
}

/// Creates the tab with its header row if it does not exist yet.
fn ensure_sheet(conn: &Connection, title: &str, header: &[&str]) -> anyhow::Result<()> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO sheets(title) VALUES(?)",
        [title],
    )?;
    if inserted == 0 {
        return Ok(());
    }
    let sheet_id = conn.last_insert_rowid();
    let cells = serde_json::to_string(header)?;
    conn.execute(
        "INSERT INTO sheet_rows(sheet_id, row_idx, cells_json) VALUES(?, 0, ?)",
        (sheet_id, cells),
    )?;
    Ok(())
}

pub fn sheet_id(conn: &Connection, title: &str) -> anyhow::Result<Option<i64>> {
    use rusqlite::OptionalExtension;
    let id = conn
        .query_row("SELECT id FROM sheets WHERE title = ?", [title], |r| r.get(0))
        .optional()?;
    Ok(id)
}
