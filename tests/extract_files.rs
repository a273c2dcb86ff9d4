//! End-to-end extraction through the library API, asserting on the
//! serialized JSON report rather than intermediate structs.

use std::io::Write;
use std::sync::atomic::AtomicBool;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};

use file_extractor::config::{load_config, Config};
use file_extractor::extract::extract_batch;
use file_extractor::models::{ExtractionMode, InputFile};

fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        for (name, data) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

fn push_chunk(buf: &mut Vec<u8>, tag: &[u8; 4], data: &[u8]) {
    buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
    buf.extend_from_slice(tag);
    buf.extend_from_slice(data);
    buf.extend_from_slice(&[0, 0, 0, 0]);
}

fn png_with_card(card: &Value) -> Vec<u8> {
    let mut payload = b"chara".to_vec();
    payload.push(0);
    payload.extend_from_slice(STANDARD.encode(card.to_string()).as_bytes());
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    push_chunk(&mut png, b"tEXt", &payload);
    push_chunk(&mut png, b"IEND", b"");
    png
}

fn report(files: Vec<InputFile>, mode: ExtractionMode, config: &Config) -> Value {
    let cancel = AtomicBool::new(false);
    let result = extract_batch(&files, mode, config, &cancel);
    serde_json::to_value(&result).unwrap()
}

#[test]
fn full_report_covers_mixed_inputs() {
    let inner_png = b"\x89PNG\r\n\x1a\nimagebytes";
    let zip = build_zip(&[("inner/data.json", br#"{"x":1}"#), ("inner/pic.png", inner_png)]);
    let files = vec![
        InputFile::new("notes.txt", b"hello world".to_vec()),
        InputFile::new("bundle.zip", zip),
    ];

    let report = report(files, ExtractionMode::Full, &Config::default());
    assert_eq!(report["extractionMode"], "full");
    assert_eq!(report["totalFiles"], 2);

    let notes = &report["files"][0];
    assert_eq!(notes["filename"], "notes.txt");
    assert_eq!(notes["extension"], "txt");
    assert_eq!(notes["content"], "hello world");
    assert_eq!(notes["sizeFormatted"], "11 Bytes");
    assert!(notes.get("isArchive").is_none());

    let bundle = &report["files"][1];
    assert_eq!(bundle["isArchive"], true);
    assert_eq!(bundle["archiveType"], "zip");
    assert_eq!(bundle["totalFiles"], 2);
    assert_eq!(
        bundle["fileList"],
        json!(["inner/data.json", "inner/pic.png"])
    );

    let data = &bundle["contents"]["inner/data.json"];
    assert_eq!(data["type"], "text");
    assert_eq!(data["parsed"], json!({ "x": 1 }));

    let pic = &bundle["contents"]["inner/pic.png"];
    assert_eq!(pic["type"], "image");
    let uri = pic["content"].as_str().unwrap();
    assert!(uri.starts_with("data:image/png;base64,"));
}

#[test]
fn metadata_report_carries_sizes_only() {
    let zip = build_zip(&[("a.txt", b"alpha"), ("b.json", br#"{"b":2}"#)]);
    let files = vec![InputFile::new("bundle.zip", zip)];

    let report = report(files, ExtractionMode::MetadataOnly, &Config::default());
    assert_eq!(report["extractionMode"], "metadata_only");

    let entries = report["files"][0]["contents"].as_object().unwrap();
    assert_eq!(entries.len(), 2);
    let a = &entries["a.txt"];
    assert_eq!(a["size"], 5);
    assert!(a.get("content").is_none());
    assert!(a.get("parsed").is_none());
}

#[test]
fn png_card_round_trips_into_the_report() {
    let card = json!({ "name": "Seraphina", "tags": ["guide"] });
    let files = vec![InputFile::new("hero.png", png_with_card(&card))];

    let report = report(files, ExtractionMode::Full, &Config::default());
    let hero = &report["files"][0];
    assert_eq!(hero["content"], "[PNG Image - Character Card Detected]");
    assert_eq!(hero["contentParsed"], card);
    assert_eq!(hero["isArchive"], true);
    assert_eq!(hero["archiveType"], "character_card");
}

#[test]
fn charx_report_exposes_the_character_summary() {
    let card = json!({ "name": "Mira" });
    let script = json!({ "in": "a", "out": "b" });
    let zip = build_zip(&[
        ("card.json", card.to_string().as_bytes()),
        (
            "extensions/regex_scripts/cleanup.json",
            script.to_string().as_bytes(),
        ),
        ("assets/face.png", b"pngpayload"),
    ]);
    let files = vec![InputFile::new("mira.charx", zip)];

    let report = report(files, ExtractionMode::Full, &Config::default());
    let summary = &report["files"][0]["contentParsed"];
    assert_eq!(summary["characterData"], card);
    assert_eq!(summary["regexScripts"][0]["filename"], "cleanup.json");
    assert_eq!(summary["regexScripts"][0]["data"], script);
    assert_eq!(summary["assets"][0]["filename"], "face.png");
    assert_eq!(summary["assets"][0]["type"], "image");
}

#[test]
fn failed_archive_keeps_the_batch_going() {
    let files = vec![
        InputFile::new("broken.zip", b"garbage".to_vec()),
        InputFile::new("fine.txt", b"still here".to_vec()),
    ];

    let report = report(files, ExtractionMode::Full, &Config::default());
    assert_eq!(report["totalFiles"], 2);
    let broken = &report["files"][0];
    assert!(broken["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to extract: "));
    assert_eq!(broken["isArchive"], false);
    assert_eq!(report["files"][1]["content"], "still here");
}

#[test]
fn loaded_config_changes_classification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fext.toml");
    std::fs::write(
        &path,
        r#"
[categories]
archive = ["zip", "box"]
"#,
    )
    .unwrap();
    let config = load_config(&path).unwrap();

    let zip = build_zip(&[("a.txt", b"alpha")]);
    let files = vec![InputFile::new("crate.box", zip)];
    let report = report(files, ExtractionMode::Full, &config);

    let boxed = &report["files"][0];
    assert_eq!(boxed["isArchive"], true);
    assert_eq!(boxed["archiveType"], "box");
    assert_eq!(boxed["contents"]["a.txt"]["content"], "alpha");
}
