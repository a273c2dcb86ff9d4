//! # File Extractor
//!
//! A structured extraction engine for files and archives.
//!
//! File Extractor turns raw file bytes into a uniform JSON report: inputs
//! are classified by extension, ZIP-family containers are walked entry by
//! entry, PNG images are scanned for embedded character records, and
//! recognized text formats (JSON, CSV, XML) are parsed into structured
//! values. A single envelope covers a whole batch, with failures isolated
//! per file.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌──────────┐   ┌─────────────┐
//! │ Inputs  │──▶│ Classify │──▶│ Extractors  │
//! │ (bytes) │   │  (ext)   │   │ png/zip/txt │
//! └─────────┘   └──────────┘   └──────┬──────┘
//!                                     │
//!                                     ▼
//!                               ┌──────────┐
//!                               │ Envelope │
//!                               │  (JSON)  │
//!                               └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! fext card.png bundle.zip          # full extraction, JSON on stdout
//! fext --metadata-only bundle.zip   # entry listing without payloads
//! fext --output report.json a.charx # write the report to a file
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and limits |
//! | [`classify`] | Extension tables and classification |
//! | [`models`] | Result types and the JSON output contract |
//! | [`content`] | JSON, CSV, and XML parsing |
//! | [`png`] | PNG chunk scanning for embedded records |
//! | [`archive`] | ZIP-family container traversal |
//! | [`extract`] | Batch assembly and per-file isolation |
//! | [`error`] | Container error type |

pub mod archive;
pub mod classify;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod models;
pub mod png;
