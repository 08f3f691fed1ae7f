//! JSON-backed implementation of [`crate::surface::UserDefinedStore`]
//! (spec §6): the concrete persistence layer the CLI wires up, even
//! though the trait itself is an external collaborator spec.md §1 treats
//! as out of scope for the core interpreter.

use std::collections::HashMap;
use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;

use png::{BitDepth, ColorType, Encoder};
use serde::{Deserialize, Serialize};

use crate::surface::{UserDefinedStore, UserGlyphBitmap};

/// One fingerprint/mode entry of the mapping file (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingEntry {
    pub mode: u8,
    pub proportional_spacing: bool,
    pub scripting: Option<String>,
    #[serde(flatten)]
    pub codes: HashMap<String, String>,
}

impl Default for MappingEntry {
    fn default() -> Self {
        MappingEntry {
            mode: 0,
            proportional_spacing: false,
            scripting: None,
            codes: HashMap::new(),
        }
    }
}

/// Keyed `"<fingerprint>_<mode>"` per spec §6.
fn entry_key(fingerprint: &str, mode: u8) -> String {
    format!("{fingerprint}_{mode}")
}

/// A [`UserDefinedStore`] backed by a JSON mapping file plus an optional
/// directory of glyph-bitmap PNGs (spec §4.4: "optionally a PNG of the
/// bitmap is persisted"). Loads eagerly, writes back on every `record`.
pub struct JsonUserDefinedStore {
    path: PathBuf,
    images_path: Option<PathBuf>,
    entries: HashMap<String, MappingEntry>,
    dirty: bool,
}

impl JsonUserDefinedStore {
    pub fn open(path: PathBuf, images_path: Option<PathBuf>) -> std::io::Result<JsonUserDefinedStore> {
        let entries = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text).unwrap_or_default()
        } else {
            HashMap::new()
        };
        Ok(JsonUserDefinedStore { path, images_path, entries, dirty: false })
    }

    /// Flushes pending writes to disk. Call once at end-of-stream; the
    /// interpreter itself never calls this (the persistence layer is an
    /// external collaborator it only `lookup`s/`record`s into).
    pub fn flush(&mut self) -> std::io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, text)?;
        self.dirty = false;
        Ok(())
    }

    fn persist_bitmap_png(&self, fingerprint: &str, code: u8, bitmap: &UserGlyphBitmap) {
        let Some(dir) = &self.images_path else { return };
        if bitmap.width == 0 || bitmap.height == 0 {
            return;
        }
        if fs::create_dir_all(dir).is_err() {
            return;
        }
        let path = dir.join(format!("{fingerprint}_{code:02x}.png"));
        let Ok(file) = fs::File::create(path) else { return };
        let mut encoder = Encoder::new(BufWriter::new(file), bitmap.width as u32, bitmap.height as u32);
        encoder.set_color(ColorType::Grayscale);
        encoder.set_depth(BitDepth::One);
        let Ok(mut writer) = encoder.write_header() else { return };
        let _ = writer.write_image_data(&pack_rows(bitmap));
    }
}

/// Re-packs [`UserGlyphBitmap`]'s column-major dot columns (the bit-image
/// convention `commands::user_defined::define_glyphs` stores them in) into
/// row-major, byte-aligned 1-bit scanlines, the layout `png::Encoder`
/// expects for `BitDepth::One`.
fn pack_rows(bitmap: &UserGlyphBitmap) -> Vec<u8> {
    let width = bitmap.width as usize;
    let height = bitmap.height as usize;
    let bytes_per_column = bitmap.rows.len() / width.max(1);
    let row_stride = (width + 7) / 8;
    let mut out = vec![0u8; row_stride * height];
    for col in 0..width {
        for pin in 0..height {
            let byte = bitmap.rows[col * bytes_per_column + pin / 8];
            if byte & (1 << (7 - (pin % 8))) != 0 {
                out[pin * row_stride + col / 8] |= 1 << (7 - (col % 8));
            }
        }
    }
    out
}

impl UserDefinedStore for JsonUserDefinedStore {
    fn lookup(&self, fingerprint: &str, mode: u8, code: u8) -> Option<char> {
        let entry = self.entries.get(&entry_key(fingerprint, mode))?;
        entry.codes.get(&code.to_string())?.chars().next()
    }

    fn record(&mut self, fingerprint: &str, mode: u8, proportional: bool, code: u8, bitmap: &UserGlyphBitmap) {
        let key = entry_key(fingerprint, mode);
        let entry = self.entries.entry(key).or_default();
        entry.mode = mode;
        entry.proportional_spacing = proportional;
        entry.codes.entry(code.to_string()).or_insert_with(|| "\u{FFFD}".to_string());
        self.dirty = true;
        self.persist_bitmap_png(fingerprint, code, bitmap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn record_then_lookup_round_trips_default_placeholder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("userdef.json");
        let mut store = JsonUserDefinedStore::open(path, None).unwrap();
        store.record("fp1", 0, false, 65, &UserGlyphBitmap { width: 8, height: 24, rows: vec![0xFF; 3] });
        assert_eq!(store.lookup("fp1", 0, 65), Some('\u{FFFD}'));
    }

    #[test]
    fn lookup_unknown_fingerprint_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("userdef.json");
        let store = JsonUserDefinedStore::open(path, None).unwrap();
        assert_eq!(store.lookup("missing", 0, 65), None);
    }

    #[test]
    fn lookup_wrong_mode_misses_even_with_same_fingerprint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("userdef.json");
        let mut store = JsonUserDefinedStore::open(path, None).unwrap();
        store.record("fp1", 1, false, 65, &UserGlyphBitmap { width: 8, height: 24, rows: vec![0xFF; 3] });
        assert_eq!(store.lookup("fp1", 2, 65), None);
    }

    #[test]
    fn record_stores_mode_and_proportional_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("userdef.json");
        let mut store = JsonUserDefinedStore::open(path, None).unwrap();
        store.record("fp3", 7, true, 65, &UserGlyphBitmap { width: 8, height: 24, rows: vec![0x00; 3] });
        let entry = store.entries.get(&entry_key("fp3", 7)).unwrap();
        assert_eq!(entry.mode, 7);
        assert!(entry.proportional_spacing);
    }

    #[test]
    fn flush_then_reopen_preserves_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("userdef.json");
        {
            let mut store = JsonUserDefinedStore::open(path.clone(), None).unwrap();
            store.record("fp2", 0, false, 66, &UserGlyphBitmap { width: 8, height: 24, rows: vec![0x00] });
            store.flush().unwrap();
        }
        let reopened = JsonUserDefinedStore::open(path, None).unwrap();
        assert_eq!(reopened.lookup("fp2", 0, 66), Some('\u{FFFD}'));
    }

    #[test]
    fn persist_bitmap_png_writes_a_valid_png_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("userdef.json");
        let images = dir.path().join("glyphs");
        let mut store = JsonUserDefinedStore::open(path, Some(images.clone())).unwrap();
        store.record("fp4", 0, false, 0x41, &UserGlyphBitmap { width: 8, height: 8, rows: vec![0xFF; 8] });
        let bytes = fs::read(images.join("fp4_41.png")).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
