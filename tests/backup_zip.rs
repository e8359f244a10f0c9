#[path = "../src/backup.rs"]
mod backup;

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

#[test]
fn zip_export_and_import_roundtrip() {
    let workspace = temp_dir("rollcall-backup-src");
    let workspace2 = temp_dir("rollcall-backup-dst");
    let out_dir = temp_dir("rollcall-backup-out");

    let bytes = b"sqlite-test-payload";
    std::fs::write(workspace.join("rollcall.sqlite3"), bytes).expect("write source db");
    std::fs::create_dir_all(workspace.join("photos")).expect("photos dir");
    std::fs::write(workspace.join("photos").join("a1.png"), b"png-bytes").expect("write photo");

    let bundle_path = out_dir.join("workspace.rollcall.zip");
    let export = backup::export_workspace_bundle(&workspace, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 3);
    assert_eq!(export.photo_count, 1);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    assert!(manifest.contains(backup::BUNDLE_FORMAT_V1));
    let manifest: serde_json::Value = serde_json::from_str(&manifest).expect("manifest json");
    assert!(manifest["sha256"]["db/rollcall.sqlite3"].is_string());
    assert_eq!(
        manifest["sha256"]["photos/a1.png"],
        "ea80334363eed145dfeee51ebae7dc3f1cd7d0c7879f8bfd2070c061d3c33f56"
    );
    archive
        .by_name("db/rollcall.sqlite3")
        .expect("database entry in bundle");

    let import = backup::import_workspace_bundle(&bundle_path, &workspace2).expect("import bundle");
    assert_eq!(import.bundle_format_detected, backup::BUNDLE_FORMAT_V1);
    assert_eq!(import.photo_count, 1);

    let restored = std::fs::read(workspace2.join("rollcall.sqlite3")).expect("read restored db");
    assert_eq!(restored, bytes);
    let photo = std::fs::read(workspace2.join("photos").join("a1.png")).expect("read restored photo");
    assert_eq!(photo, b"png-bytes");

    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(workspace2);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn export_requires_a_workspace_database() {
    let workspace = temp_dir("rollcall-backup-empty");
    let out = workspace.join("out.zip");
    let e = backup::export_workspace_bundle(&workspace, &out).expect_err("no database");
    assert!(e.to_string().contains("workspace database not found"));
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn import_rejects_tampered_entries() {
    let dir = temp_dir("rollcall-backup-tampered");
    let bundle_path = dir.join("tampered.zip");
    {
        let f = File::create(&bundle_path).expect("create zip");
        let mut zip = zip::ZipWriter::new(f);
        let opts = zip::write::FileOptions::default();
        let manifest = serde_json::json!({
            "format": backup::BUNDLE_FORMAT_V1,
            "version": 1,
            "sha256": { "db/rollcall.sqlite3": "00" }
        });
        zip.start_file("manifest.json", opts).expect("manifest entry");
        zip.write_all(manifest.to_string().as_bytes()).expect("write manifest");
        zip.start_file("db/rollcall.sqlite3", opts).expect("db entry");
        zip.write_all(b"not what the manifest says").expect("write db");
        zip.finish().expect("finish zip");
    }

    let target = dir.join("restore");
    let e = backup::import_workspace_bundle(&bundle_path, &target).expect_err("checksum mismatch");
    assert!(e.to_string().contains("checksum mismatch"));
    assert!(!target.join("rollcall.sqlite3").exists());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn import_rejects_unknown_formats() {
    let dir = temp_dir("rollcall-backup-format");
    let bundle_path = dir.join("other.zip");
    {
        let f = File::create(&bundle_path).expect("create zip");
        let mut zip = zip::ZipWriter::new(f);
        zip.start_file("manifest.json", zip::write::FileOptions::default())
            .expect("manifest entry");
        zip.write_all(br#"{"format":"attendance-export-v2"}"#).expect("write manifest");
        zip.finish().expect("finish zip");
    }
    let e = backup::import_workspace_bundle(&bundle_path, &dir.join("restore")).expect_err("format");
    assert!(e.to_string().contains("unsupported bundle format"));
    let _ = std::fs::remove_dir_all(dir);
}
