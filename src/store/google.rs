use super::{Photo, PhotoStore, SheetLayout, SheetStore};
use anyhow::{anyhow, Context};
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde_json::json;
use std::time::Duration;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_API: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3/files";
const PHOTO_FOLDER: &str = "학생사진";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub spreadsheet_id: String,
    /// OAuth bearer token with the spreadsheets and drive.file scopes.
    pub access_token: String,
}

/// Google Sheets v4 + Drive v3 over REST.
#[derive(Clone)]
pub struct GoogleBackend {
    client: Client,
    cfg: GoogleConfig,
}

impl GoogleBackend {
    pub fn new(cfg: GoogleConfig) -> anyhow::Result<Self> {
        if cfg.spreadsheet_id.trim().is_empty() {
            return Err(anyhow!("spreadsheet id not configured"));
        }
        if cfg.access_token.trim().is_empty() {
            return Err(anyhow!("access token not configured"));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client, cfg })
    }

    fn values_url(&self, last_segment: &str) -> anyhow::Result<Url> {
        api_url(SHEETS_API, &[&self.cfg.spreadsheet_id, "values", last_segment])
    }

    fn sheet_gid(&self, title: &str) -> anyhow::Result<i64> {
        let resp = self
            .client
            .get(api_url(SHEETS_API, &[&self.cfg.spreadsheet_id])?)
            .bearer_auth(&self.cfg.access_token)
            .query(&[("fields", "sheets.properties")])
            .send()
            .context("spreadsheets.get request failed")?;
        let body: serde_json::Value = check(resp, "spreadsheets.get")?.json()?;
        body.get("sheets")
            .and_then(|v| v.as_array())
            .into_iter()
            .flatten()
            .filter_map(|s| s.get("properties"))
            .find(|p| p.get("title").and_then(|t| t.as_str()) == Some(title))
            .and_then(|p| p.get("sheetId"))
            .and_then(|v| v.as_i64())
            .ok_or_else(|| anyhow!("sheet not found: {}", title))
    }

    fn photo_folder_id(&self) -> anyhow::Result<String> {
        let q = format!(
            "mimeType='{}' and name='{}' and trashed=false",
            FOLDER_MIME, PHOTO_FOLDER
        );
        let resp = self
            .client
            .get(DRIVE_API)
            .bearer_auth(&self.cfg.access_token)
            .query(&[("q", q.as_str()), ("fields", "files(id, name)")])
            .send()
            .context("drive files.list request failed")?;
        let body: serde_json::Value = check(resp, "files.list")?.json()?;
        let existing = body
            .get("files")
            .and_then(|v| v.as_array())
            .and_then(|files| files.first())
            .and_then(|f| f.get("id"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        if let Some(id) = existing {
            return Ok(id);
        }

        tracing::info!(folder = PHOTO_FOLDER, "creating drive photo folder");
        let resp = self
            .client
            .post(DRIVE_API)
            .bearer_auth(&self.cfg.access_token)
            .query(&[("fields", "id")])
            .json(&json!({ "name": PHOTO_FOLDER, "mimeType": FOLDER_MIME }))
            .send()
            .context("drive folder create request failed")?;
        let body: serde_json::Value = check(resp, "files.create(folder)")?.json()?;
        body.get("id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("folder create returned no id"))
    }
}

/// Turns a non-2xx response into an error carrying the API's error body.
fn check(resp: Response, what: &str) -> anyhow::Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    tracing::error!(%status, api = what, body = %body, "google api error");
    Err(anyhow!("{} failed with {}: {}", what, status, body))
}

/// Appends percent-encoded path segments to an API base URL.
fn api_url(base: &str, segments: &[&str]) -> anyhow::Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("invalid api url: {}", base))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("api url cannot take path segments: {}", base))?
        .extend(segments);
    Ok(url)
}

fn cell_text(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetStore for GoogleBackend {
    fn read_rows(&self, sheet: &SheetLayout, first_row: usize) -> anyhow::Result<Vec<Vec<String>>> {
        let range = sheet.range_from(first_row);
        let resp = self
            .client
            .get(self.values_url(&range)?)
            .bearer_auth(&self.cfg.access_token)
            .send()
            .with_context(|| format!("values.get {} request failed", range))?;
        let body: serde_json::Value = check(resp, "values.get")?.json()?;
        let rows = body
            .get("values")
            .and_then(|v| v.as_array())
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| cells.iter().map(cell_text).collect())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    fn update_row(&self, sheet: &SheetLayout, row: usize, cells: &[String]) -> anyhow::Result<()> {
        let range = sheet.row_range(row);
        let resp = self
            .client
            .put(self.values_url(&range)?)
            .bearer_auth(&self.cfg.access_token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": [cells] }))
            .send()
            .with_context(|| format!("values.update {} request failed", range))?;
        check(resp, "values.update")?;
        Ok(())
    }

    fn append_row(&self, sheet: &SheetLayout, cells: &[String]) -> anyhow::Result<()> {
        let range = sheet.range_from(1);
        let resp = self
            .client
            .post(self.values_url(&format!("{}:append", range))?)
            .bearer_auth(&self.cfg.access_token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "majorDimension": "ROWS", "values": [cells] }))
            .send()
            .with_context(|| format!("values.append {} request failed", range))?;
        check(resp, "values.append")?;
        Ok(())
    }

    fn delete_row(&self, sheet: &SheetLayout, index: usize) -> anyhow::Result<()> {
        let gid = self.sheet_gid(sheet.title)?;
        let resp = self
            .client
            .post(api_url(
                SHEETS_API,
                &[&format!("{}:batchUpdate", self.cfg.spreadsheet_id)],
            )?)
            .bearer_auth(&self.cfg.access_token)
            .json(&json!({
                "requests": [{
                    "deleteDimension": {
                        "range": {
                            "sheetId": gid,
                            "dimension": "ROWS",
                            "startIndex": index,
                            "endIndex": index + 1,
                        }
                    }
                }]
            }))
            .send()
            .context("batchUpdate request failed")?;
        check(resp, "batchUpdate")?;
        Ok(())
    }
}

impl PhotoStore for GoogleBackend {
    fn upload(&self, file_name: &str, mime_type: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
        let folder_id = self.photo_folder_id()?;
        let metadata = json!({ "name": file_name, "parents": [folder_id] });

        // Drive's multipart upload wants multipart/related: metadata part, then media part.
        let boundary = format!("rollcall-{}", uuid::Uuid::new_v4().simple());
        let mut body: Vec<u8> = Vec::with_capacity(bytes.len() + 512);
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n--{b}\r\nContent-Type: {mime}\r\n\r\n",
                b = boundary,
                meta = metadata,
                mime = mime_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let resp = self
            .client
            .post(DRIVE_UPLOAD_API)
            .bearer_auth(&self.cfg.access_token)
            .query(&[("uploadType", "multipart"), ("fields", "id, webViewLink")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .context("drive upload request failed")?;
        let created: serde_json::Value = check(resp, "files.create(upload)")?.json()?;
        Ok(created
            .get("webViewLink")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string())
    }

    fn fetch(&self, file_id: &str) -> anyhow::Result<Photo> {
        let resp = self
            .client
            .get(api_url(DRIVE_API, &[file_id])?)
            .bearer_auth(&self.cfg.access_token)
            .query(&[("alt", "media")])
            .send()
            .context("drive files.get request failed")?;
        let resp = check(resp, "files.get")?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = resp.bytes().context("failed to read photo body")?.to_vec();
        Ok(Photo {
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_ranges_are_encoded_as_one_path_segment() {
        let url = api_url(SHEETS_API, &["sheet123", "values", "'아이들 정보'!A2:F"]).expect("url");
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/\
             '%EC%95%84%EC%9D%B4%EB%93%A4%20%EC%A0%95%EB%B3%B4'!A2:F"
        );
    }

    #[test]
    fn file_ids_cannot_escape_the_files_path() {
        let url = api_url(DRIVE_API, &["a/b?c#d"]).expect("url");
        assert_eq!(url.path(), "/drive/v3/files/a%2Fb%3Fc%23d");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }
}
