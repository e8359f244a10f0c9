use super::{Photo, PhotoStore, SheetLayout, SheetStore};
use anyhow::{anyhow, Context};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Spreadsheet tabs emulated on top of the workspace SQLite file.
pub struct LocalSheets {
    conn: Arc<Mutex<Connection>>,
}

impl LocalSheets {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

fn now_text() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn require_sheet(conn: &Connection, sheet: &SheetLayout) -> anyhow::Result<i64> {
    crate::db::sheet_id(conn, sheet.title)?
        .ok_or_else(|| anyhow!("sheet not found: {}", sheet.title))
}

fn clip(sheet: &SheetLayout, cells: &[String]) -> Vec<String> {
    let mut out: Vec<String> = cells.iter().take(sheet.width).cloned().collect();
    // The Sheets API drops trailing empty cells; do the same so reads look alike.
    while out.last().map(|c| c.is_empty()).unwrap_or(false) {
        out.pop();
    }
    out
}

impl SheetStore for LocalSheets {
    fn read_rows(&self, sheet: &SheetLayout, first_row: usize) -> anyhow::Result<Vec<Vec<String>>> {
        let conn = self.conn.lock();
        let sheet_id = require_sheet(&conn, sheet)?;
        let mut stmt = conn.prepare(
            "SELECT cells_json FROM sheet_rows
             WHERE sheet_id = ? AND row_idx >= ?
             ORDER BY row_idx",
        )?;
        let offset = first_row.saturating_sub(1) as i64;
        let raw = stmt
            .query_map((sheet_id, offset), |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        raw.iter()
            .map(|s| {
                let cells: Vec<String> =
                    serde_json::from_str(s).context("corrupt row in sheet_rows")?;
                Ok(clip(sheet, &cells))
            })
            .collect()
    }

    fn update_row(&self, sheet: &SheetLayout, row: usize, cells: &[String]) -> anyhow::Result<()> {
        if row == 0 {
            return Err(anyhow!("row numbers start at 1"));
        }
        let conn = self.conn.lock();
        let sheet_id = require_sheet(&conn, sheet)?;
        let cells_json = serde_json::to_string(&clip(sheet, cells))?;
        let idx = (row - 1) as i64;
        let len: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sheet_rows WHERE sheet_id = ?",
            [sheet_id],
            |r| r.get(0),
        )?;
        let tx = conn.unchecked_transaction()?;
        // Writing past the end behaves like the real sheet: gap rows become empty.
        for gap in len..idx {
            tx.execute(
                "INSERT INTO sheet_rows(sheet_id, row_idx, cells_json, updated_at) VALUES(?, ?, '[]', ?)",
                (sheet_id, gap, now_text()),
            )?;
        }
        tx.execute(
            "INSERT INTO sheet_rows(sheet_id, row_idx, cells_json, updated_at) VALUES(?, ?, ?, ?)
             ON CONFLICT(sheet_id, row_idx) DO UPDATE SET
               cells_json = excluded.cells_json,
               updated_at = excluded.updated_at",
            (sheet_id, idx, &cells_json, now_text()),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn append_row(&self, sheet: &SheetLayout, cells: &[String]) -> anyhow::Result<()> {
        let conn = self.conn.lock();
        let sheet_id = require_sheet(&conn, sheet)?;
        let cells_json = serde_json::to_string(&clip(sheet, cells))?;
        conn.execute(
            "INSERT INTO sheet_rows(sheet_id, row_idx, cells_json, updated_at)
             VALUES(?, (SELECT COALESCE(MAX(row_idx) + 1, 0) FROM sheet_rows WHERE sheet_id = ?), ?, ?)",
            (sheet_id, sheet_id, &cells_json, now_text()),
        )?;
        Ok(())
    }

    fn delete_row(&self, sheet: &SheetLayout, index: usize) -> anyhow::Result<()> {
        let conn = self.conn.lock();
        let sheet_id = require_sheet(&conn, sheet)?;
        let idx = index as i64;
        let tx = conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM sheet_rows WHERE sheet_id = ? AND row_idx = ?",
            (sheet_id, idx),
        )?;
        if removed == 0 {
            let _ = tx.rollback();
            return Err(anyhow!("row {} out of range in {}", index, sheet.title));
        }
        // Shift in ascending order so the primary key never collides.
        let mut stmt = tx.prepare(
            "SELECT row_idx FROM sheet_rows WHERE sheet_id = ? AND row_idx > ? ORDER BY row_idx",
        )?;
        let later = stmt
            .query_map((sheet_id, idx), |r| r.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        for r in later {
            tx.execute(
                "UPDATE sheet_rows SET row_idx = ? WHERE sheet_id = ? AND row_idx = ?",
                (r - 1, sheet_id, r),
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Photo files stored under `<workspace>/photos`, indexed in the workspace database.
pub struct LocalPhotos {
    conn: Arc<Mutex<Connection>>,
    dir: PathBuf,
}

impl LocalPhotos {
    pub fn new(conn: Arc<Mutex<Connection>>, dir: PathBuf) -> Self {
        Self { conn, dir }
    }
}

fn extension_for(mime_type: &str, file_name: &str) -> String {
    match mime_type {
        "image/png" => "png".to_string(),
        "image/gif" => "gif".to_string(),
        "image/webp" => "webp".to_string(),
        "image/jpeg" | "image/jpg" => "jpg".to_string(),
        _ => std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string()),
    }
}

impl PhotoStore for LocalPhotos {
    fn upload(&self, file_name: &str, mime_type: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let stored_name = format!("{}.{}", id, extension_for(mime_type, file_name));
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.to_string_lossy()))?;
        let path = self.dir.join(&stored_name);
        std::fs::write(&path, &bytes)
            .with_context(|| format!("failed to write photo {}", path.to_string_lossy()))?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO photos(id, file_name, mime_type, stored_name, created_at) VALUES(?, ?, ?, ?, ?)",
            (&id, file_name, mime_type, &stored_name, now_text()),
        )?;
        Ok(format!("local:///file/d/{}/view", id))
    }

    fn fetch(&self, file_id: &str) -> anyhow::Result<Photo> {
        let row: Option<(String, String)> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT mime_type, stored_name FROM photos WHERE id = ?",
                [file_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?
        };
        let Some((mime_type, stored_name)) = row else {
            return Err(anyhow!("photo not found: {}", file_id));
        };
        let path = self.dir.join(&stored_name);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("failed to read photo {}", path.to_string_lossy()))?;
        Ok(Photo {
            content_type: Some(mime_type).filter(|m| !m.is_empty()),
            bytes,
        })
    }
}
