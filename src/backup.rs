use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_FILE: &str = "rollcall.sqlite3";
const DB_ENTRY: &str = "db/rollcall.sqlite3";
const PHOTOS_DIR: &str = "photos";
const PHOTOS_PREFIX: &str = "photos/";
pub const BUNDLE_FORMAT_V1: &str = "rollcall-workspace-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub photo_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub photo_count: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn photo_files(workspace_path: &Path) -> anyhow::Result<Vec<(String, std::path::PathBuf)>> {
    let dir = workspace_path.join(PHOTOS_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for ent in std::fs::read_dir(&dir)
        .with_context(|| format!("failed to list {}", dir.to_string_lossy()))?
    {
        let p = ent?.path();
        if !p.is_file() {
            continue;
        }
        let Some(name) = p.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        out.push((name.to_string(), p.clone()));
    }
    // Deterministic entry order.
    out.sort();
    Ok(out)
}

/// Zips the workspace database file and photo files as they are on disk.
/// No snapshot is taken, so a write racing the export can leave a torn copy.
pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let db_path = workspace_path.join(DB_FILE);
    if !db_path.is_file() {
        return Err(anyhow!(
            "workspace database not found: {}",
            db_path.to_string_lossy()
        ));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
    let db_bytes = std::fs::read(&db_path)
        .with_context(|| format!("failed to read database {}", db_path.to_string_lossy()))?;
    entries.push((DB_ENTRY.to_string(), db_bytes));
    let photos = photo_files(workspace_path)?;
    for (name, path) in &photos {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read photo {}", path.to_string_lossy()))?;
        entries.push((format!("{}{}", PHOTOS_PREFIX, name), bytes));
    }

    let checksums: BTreeMap<&str, String> = entries
        .iter()
        .map(|(name, bytes)| (name.as_str(), sha256_hex(bytes)))
        .collect();
    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "sha256": checksums,
    });

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (name, bytes) in &entries {
        zip.start_file(name.as_str(), opts)
            .with_context(|| format!("failed to start entry {}", name))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write entry {}", name))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: entries.len() + 1,
        photo_count: photos.len(),
    })
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    archive
        .by_name(name)
        .with_context(|| format!("bundle missing {}", name))?
        .read_to_end(&mut buf)
        .with_context(|| format!("failed to read {}", name))?;
    Ok(buf)
}

/// Restores a bundle into `workspace_path`, replacing its database and
/// overwriting photos with the same name. Nothing is written unless every
/// entry matches its manifest checksum.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let manifest_bytes = read_entry(&mut archive, MANIFEST_ENTRY)?;
    let manifest: serde_json::Value =
        serde_json::from_slice(&manifest_bytes).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let checksums = manifest
        .get("sha256")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    // Read and verify everything before touching the workspace.
    let mut restored: Vec<(String, Vec<u8>)> = Vec::new();
    for (name, expected) in &checksums {
        let is_photo = name
            .strip_prefix(PHOTOS_PREFIX)
            .map(|rest| !rest.is_empty() && !rest.contains('/') && !rest.contains(".."))
            .unwrap_or(false);
        if name != DB_ENTRY && !is_photo {
            return Err(anyhow!("unexpected bundle entry: {}", name));
        }
        let bytes = read_entry(&mut archive, name)?;
        let actual = sha256_hex(&bytes);
        if Some(actual.as_str()) != expected.as_str() {
            return Err(anyhow!("checksum mismatch for {}", name));
        }
        restored.push((name.clone(), bytes));
    }
    if !restored.iter().any(|(name, _)| name == DB_ENTRY) {
        return Err(anyhow!("bundle missing {}", DB_ENTRY));
    }

    let photos_dir = workspace_path.join(PHOTOS_DIR);
    std::fs::create_dir_all(&photos_dir).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;

    let mut photo_count = 0usize;
    for (name, bytes) in &restored {
        if name == DB_ENTRY {
            let dst = workspace_path.join(DB_FILE);
            let tmp_dst = workspace_path.join("rollcall.sqlite3.importing");
            std::fs::write(&tmp_dst, bytes).with_context(|| {
                format!(
                    "failed to write temp database {}",
                    tmp_dst.to_string_lossy()
                )
            })?;
            std::fs::rename(&tmp_dst, &dst).with_context(|| {
                format!(
                    "failed to move extracted database to {}",
                    dst.to_string_lossy()
                )
            })?;
        } else if let Some(file) = name.strip_prefix(PHOTOS_PREFIX) {
            let dst = photos_dir.join(file);
            std::fs::write(&dst, bytes)
                .with_context(|| format!("failed to write photo {}", dst.to_string_lossy()))?;
            photo_count += 1;
        }
    }

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        photo_count,
    })
}
