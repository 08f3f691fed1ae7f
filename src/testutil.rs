//! In-memory test doubles for the three external collaborators
//! ([`DrawingSurface`], [`FontResolver`], [`UserDefinedStore`]), used by
//! this crate's own tests and exposed to downstream crates under the
//! `test-util` feature.

use std::collections::HashMap;

use crate::surface::{
    Cmyk, DrawingSurface, FontHandle, FontResolver, StyleBits, TextStyle, TypefaceId,
    UserDefinedStore, UserGlyphBitmap,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Text { glyph: char, x: f32, y: f32, style: TextStyle },
    Dot { x: f32, y: f32, diameter: f32, color: Cmyk },
    Rect { x: f32, y: f32, w: f32, h: f32, color: Cmyk },
    NewPage,
    Finalized,
}

/// A `DrawingSurface` that records every call it receives, for assertions
/// in unit and end-to-end tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub events: Vec<Recorded>,
    pub new_page_calls: u32,
    pub finalized: bool,
}

impl DrawingSurface for RecordingSurface {
    fn draw_text(&mut self, glyph: char, _font: FontHandle, x: f32, y: f32, style: TextStyle) {
        self.events.push(Recorded::Text { glyph, x, y, style });
    }

    fn draw_dot(&mut self, x: f32, y: f32, diameter: f32, color: Cmyk) {
        self.events.push(Recorded::Dot { x, y, diameter, color });
    }

    fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Cmyk) {
        self.events.push(Recorded::Rect { x, y, w, h, color });
    }

    fn new_page(&mut self) {
        self.new_page_calls += 1;
        self.events.push(Recorded::NewPage);
    }

    fn finalize(&mut self) {
        self.finalized = true;
        self.events.push(Recorded::Finalized);
    }
}

impl RecordingSurface {
    pub fn glyphs(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                Recorded::Text { glyph, .. } => Some(*glyph),
                _ => None,
            })
            .collect()
    }

    pub fn dot_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Recorded::Dot { .. }))
            .count()
    }
}

/// A `FontResolver` that hands out a single stable handle per typeface and
/// reports a fixed advance width, sufficient to exercise the typography
/// resolution and dispatch paths without a real font file.
#[derive(Debug, Default)]
pub struct StubFontResolver;

impl FontResolver for StubFontResolver {
    fn resolve(&self, typeface: TypefaceId, fixed: bool, _point_size: f32, style: StyleBits) -> FontHandle {
        FontHandle(typeface.0 as u32 * 4 + (fixed as u32) * 2 + style.bits() as u32)
    }

    fn advance_width(&self, _glyph: char, _font: FontHandle, point_size: f32) -> f32 {
        point_size * 0.5
    }
}

/// An in-memory `UserDefinedStore`.
#[derive(Debug, Default)]
pub struct MemoryUserDefinedStore {
    map: HashMap<(String, u8), char>,
    pub recorded: Vec<(String, u8, bool, u8, UserGlyphBitmap)>,
}

impl UserDefinedStore for MemoryUserDefinedStore {
    fn lookup(&self, fingerprint: &str, _mode: u8, code: u8) -> Option<char> {
        self.map.get(&(fingerprint.to_string(), code)).copied()
    }

    fn record(&mut self, fingerprint: &str, mode: u8, proportional: bool, code: u8, bitmap: &UserGlyphBitmap) {
        self.recorded
            .push((fingerprint.to_string(), mode, proportional, code, bitmap.clone()));
    }
}

impl MemoryUserDefinedStore {
    pub fn insert(&mut self, fingerprint: &str, code: u8, glyph: char) {
        self.map.insert((fingerprint.to_string(), code), glyph);
    }
}
