mod google;
mod local;

pub use google::{GoogleBackend, GoogleConfig};
pub use local::{LocalPhotos, LocalSheets};

/// A spreadsheet tab and the column span the app reads from it.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    pub title: &'static str,
    pub width: usize,
}

impl SheetLayout {
    /// A1 notation for the whole tab starting at `first_row` (1-based), e.g. `'출석기록'!A2:E`.
    pub fn range_from(&self, first_row: usize) -> String {
        format!(
            "'{}'!A{}:{}",
            self.title,
            first_row,
            self.last_column()
        )
    }

    pub fn row_range(&self, row: usize) -> String {
        format!(
            "'{}'!A{}:{}{}",
            self.title,
            row,
            self.last_column(),
            row
        )
    }

    fn last_column(&self) -> char {
        (b'A' + (self.width.clamp(1, 26) as u8) - 1) as char
    }
}

/// Roster tab: number, name, parent, phone, class, photo URL.
pub const ROSTER: SheetLayout = SheetLayout {
    title: "아이들 정보",
    width: 6,
};

/// Attendance log tab: timestamp, name, status, note, class.
pub const ATTENDANCE: SheetLayout = SheetLayout {
    title: "출석기록",
    width: 5,
};

pub trait SheetStore: Send {
    /// Rows from `first_row` (1-based) to the end of the tab. Trailing empty cells may be missing.
    fn read_rows(&self, sheet: &SheetLayout, first_row: usize) -> anyhow::Result<Vec<Vec<String>>>;
    /// Overwrites the row at `row` (1-based).
    fn update_row(&self, sheet: &SheetLayout, row: usize, cells: &[String]) -> anyhow::Result<()>;
    fn append_row(&self, sheet: &SheetLayout, cells: &[String]) -> anyhow::Result<()>;
    /// Removes the row at `index` (0-based); rows below shift up.
    fn delete_row(&self, sheet: &SheetLayout, index: usize) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct Photo {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub trait PhotoStore: Send {
    /// Stores the file and returns a URL the photo proxy can resolve back to it.
    fn upload(&self, file_name: &str, mime_type: &str, bytes: Vec<u8>) -> anyhow::Result<String>;
    fn fetch(&self, file_id: &str) -> anyhow::Result<Photo>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Google,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Google => "google",
        }
    }
}

pub struct Backend {
    pub kind: BackendKind,
    pub sheets: Box<dyn SheetStore>,
    pub photos: Box<dyn PhotoStore>,
}

impl Backend {
    pub fn local(workspace: &std::path::Path) -> anyhow::Result<Self> {
        let conn = crate::db::open_db(workspace)?;
        let conn = std::sync::Arc::new(parking_lot::Mutex::new(conn));
        Ok(Self {
            kind: BackendKind::Local,
            sheets: Box::new(LocalSheets::new(conn.clone())),
            photos: Box::new(LocalPhotos::new(conn, workspace.join(crate::db::PHOTOS_DIR))),
        })
    }

    pub fn google(cfg: GoogleConfig) -> anyhow::Result<Self> {
        let backend = GoogleBackend::new(cfg)?;
        Ok(Self {
            kind: BackendKind::Google,
            sheets: Box::new(backend.clone()),
            photos: Box::new(backend),
        })
    }
}
