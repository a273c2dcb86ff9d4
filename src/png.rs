//! PNG chunk scanning for embedded character data.
//!
//! Character cards ship as PNG images with a `tEXt` or `iTXt` chunk keyed
//! `chara` whose text is base64-encoded JSON. The scanner walks the chunk
//! stream directly; it never decodes image data and never validates CRCs.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::debug;

use crate::content;

/// 8-byte signature opening every PNG file.
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Keyword of the text chunk carrying embedded character data.
const CHARA_KEYWORD: &[u8] = b"chara";

/// Outcome of scanning a PNG buffer.
#[derive(Debug, Clone, Default)]
pub struct PngScan {
    /// Embedded character payload, when a parseable `chara` chunk exists.
    pub embedded: Option<Value>,
    /// The whole input re-encoded as a data URI. Present whenever the
    /// signature matched, independent of the embedded payload.
    pub preview: Option<String>,
}

/// Walks a PNG chunk stream looking for embedded character data.
///
/// A buffer without the PNG signature produces an empty result. A truncated
/// or corrupt chunk stream ends the walk early with whatever was recovered.
/// The first `chara` chunk that parses wins; unparseable candidates do not
/// stop the walk.
pub fn scan_png(bytes: &[u8]) -> PngScan {
    if bytes.len() < PNG_MAGIC.len() || bytes[..PNG_MAGIC.len()] != PNG_MAGIC {
        return PngScan::default();
    }

    let mut offset = PNG_MAGIC.len();
    let mut embedded = None;

    while offset + 8 <= bytes.len() {
        let length = u32::from_be_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]) as usize;
        let tag = &bytes[offset + 4..offset + 8];
        let data_start = offset + 8;
        let data_end = match data_start.checked_add(length) {
            Some(end) if end <= bytes.len() => end,
            _ => {
                debug!("png chunk stream truncated at offset {}", offset);
                break;
            }
        };

        if tag == b"tEXt" || tag == b"iTXt" {
            if let Some(value) = chara_payload(&bytes[data_start..data_end], tag == b"iTXt") {
                embedded = Some(value);
                break;
            }
        }

        if tag == b"IEND" {
            break;
        }

        // Step over the payload and the 4-byte CRC.
        offset = match data_end.checked_add(4) {
            Some(next) => next,
            None => break,
        };
    }

    let preview = format!("data:image/png;base64,{}", STANDARD.encode(bytes));
    PngScan {
        embedded,
        preview: Some(preview),
    }
}

/// Decodes a text-chunk payload when its keyword is exactly `chara`.
///
/// The text is tried as base64-wrapped JSON first, then as raw JSON.
fn chara_payload(payload: &[u8], international: bool) -> Option<Value> {
    let null_pos = payload.iter().position(|&b| b == 0)?;
    if &payload[..null_pos] != CHARA_KEYWORD {
        return None;
    }

    let mut text_start = null_pos + 1;
    if international {
        // iTXt inserts a compression flag byte, a compression method byte,
        // and two NUL-terminated fields (language tag, translated keyword)
        // before the text.
        text_start += 2;
        for _ in 0..2 {
            while text_start < payload.len() && payload[text_start] != 0 {
                text_start += 1;
            }
            text_start += 1;
        }
    }

    let raw = payload.get(text_start..)?;
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();

    match STANDARD.decode(trimmed) {
        Ok(decoded) => {
            serde_json::from_slice(&decoded)
                .ok()
                .or_else(|| content::parse_json(trimmed))
        }
        Err(_) => content::parse_json(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(tag);
        out.extend_from_slice(payload);
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    fn text_payload(keyword: &[u8], text: &[u8]) -> Vec<u8> {
        let mut payload = keyword.to_vec();
        payload.push(0);
        payload.extend_from_slice(text);
        payload
    }

    fn png_from(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = PNG_MAGIC.to_vec();
        for c in chunks {
            out.extend_from_slice(c);
        }
        out.extend_from_slice(&chunk(b"IEND", &[]));
        out
    }

    #[test]
    fn recovers_base64_card_from_text_chunk() {
        let card = json!({ "name": "Seraphina", "tags": ["brave", "kind"] });
        let encoded = STANDARD.encode(card.to_string());
        let png = png_from(&[chunk(
            b"tEXt",
            &text_payload(b"chara", encoded.as_bytes()),
        )]);

        let scan = scan_png(&png);
        assert_eq!(scan.embedded, Some(card));
    }

    #[test]
    fn recovers_card_from_international_text_chunk() {
        let card = json!({ "name": "Mira" });
        let encoded = STANDARD.encode(card.to_string());
        let mut payload = b"chara\0".to_vec();
        payload.extend_from_slice(&[0, 0]);
        payload.extend_from_slice(b"en\0");
        payload.extend_from_slice(b"chara\0");
        payload.extend_from_slice(encoded.as_bytes());
        let png = png_from(&[chunk(b"iTXt", &payload)]);

        let scan = scan_png(&png);
        assert_eq!(scan.embedded, Some(card));
    }

    #[test]
    fn accepts_raw_json_without_base64_wrapping() {
        let card = json!({ "name": "Nyx" });
        let png = png_from(&[chunk(
            b"tEXt",
            &text_payload(b"chara", card.to_string().as_bytes()),
        )]);

        assert_eq!(scan_png(&png).embedded, Some(card));
    }

    #[test]
    fn non_png_buffer_yields_empty_result() {
        let scan = scan_png(b"GIF89a not a png");
        assert_eq!(scan.embedded, None);
        assert_eq!(scan.preview, None);
    }

    #[test]
    fn png_without_chara_keyword_has_preview_only() {
        let png = png_from(&[chunk(b"tEXt", &text_payload(b"comment", b"hello"))]);
        let scan = scan_png(&png);
        assert_eq!(scan.embedded, None);
        let preview = scan.preview.unwrap();
        assert!(preview.starts_with("data:image/png;base64,"));
        assert_eq!(preview[22..], STANDARD.encode(&png));
    }

    #[test]
    fn truncated_chunk_length_stops_the_walk() {
        let mut png = PNG_MAGIC.to_vec();
        // Declares 1000 payload bytes but provides only 3.
        png.extend_from_slice(&1000_u32.to_be_bytes());
        png.extend_from_slice(b"tEXt");
        png.extend_from_slice(&[1, 2, 3]);

        let scan = scan_png(&png);
        assert_eq!(scan.embedded, None);
        assert!(scan.preview.is_some());
    }

    #[test]
    fn unparseable_chara_chunk_does_not_end_the_walk() {
        let card = json!({ "name": "Second" });
        let bad = chunk(b"tEXt", &text_payload(b"chara", b"%%% not json %%%"));
        let good = chunk(
            b"tEXt",
            &text_payload(b"chara", STANDARD.encode(card.to_string()).as_bytes()),
        );
        let png = png_from(&[bad, good]);

        assert_eq!(scan_png(&png).embedded, Some(card));
    }

    #[test]
    fn chunks_after_iend_are_ignored() {
        let card = json!({ "name": "Late" });
        let mut png = PNG_MAGIC.to_vec();
        png.extend_from_slice(&chunk(b"IEND", &[]));
        png.extend_from_slice(&chunk(
            b"tEXt",
            &text_payload(b"chara", STANDARD.encode(card.to_string()).as_bytes()),
        ));

        assert_eq!(scan_png(&png).embedded, None);
    }
}
