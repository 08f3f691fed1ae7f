//! A [`DrawingSurface`] and [`FontResolver`] backed by `printpdf` (spec §1,
//! §6): the concrete PDF writer the `escp2pdf` binary wires the core
//! interpreter to. Neither the core crate nor the `Interpreter` depend on
//! `printpdf` directly — this module is the external collaborator spec.md
//! names, gated behind the `pdf` feature so the library stays usable with
//! any other surface.
//!
//! Grounded in `printpdf` 0.9.1's `Op`-based page model: a page is a flat
//! `Vec<Op>`, text is drawn between `StartTextSection`/`EndTextSection`
//! pairs, and shapes are `DrawPolygon`/`DrawLine` ops. Coordinates here are
//! points with the origin at the top-left, per [`crate::surface::DrawingSurface`];
//! `printpdf::Point` is bottom-left-origin, so every coordinate is flipped
//! against the page height on the way out.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use printpdf::{
    Color, LinePoint, Op, PaintMode, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, Point,
    Polygon, PolygonRing, Pt as PdfPt, TextMatrix, TextRenderingMode, WindingOrder,
};

use crate::config::Config;
use crate::surface::{
    Cmyk, DrawingSurface, FontHandle, FontResolver, StyleBits, TextStyle, TypefaceId,
};

/// Maps a [`TypefaceId`] to the `[section]` name spec §6 uses in the
/// configuration file. `Roman` and `Sans serif` are the two mandatory
/// sections; the rest are standard ESC/P2 typeface names the font resolver
/// may or may not have a file configured for.
fn typeface_section_name(id: TypefaceId) -> &'static str {
    match id {
        TypefaceId::ROMAN => "Roman",
        TypefaceId::SANS_SERIF => "Sans serif",
        TypefaceId::COURIER => "Courier",
        TypefaceId::PRESTIGE => "Prestige",
        TypefaceId::SCRIPT => "Script",
        TypefaceId::OCR_A => "OCR-A",
        TypefaceId::OCR_B => "OCR-B",
        TypefaceId::ORATOR => "Orator",
        _ => "Roman",
    }
}

fn all_typefaces() -> [TypefaceId; 8] {
    [
        TypefaceId::ROMAN,
        TypefaceId::SANS_SERIF,
        TypefaceId::COURIER,
        TypefaceId::PRESTIGE,
        TypefaceId::SCRIPT,
        TypefaceId::OCR_A,
        TypefaceId::OCR_B,
        TypefaceId::ORATOR,
    ]
}

struct FontEntry {
    id: printpdf::FontId,
    parsed: ParsedFont,
}

/// Loads and registers every typeface the configuration file names, once,
/// up front. Shared read-only between the [`PdfFontResolver`] (which needs
/// glyph metrics) and the [`PdfDrawingSurface`] (which needs the
/// registered `FontId` to emit `WriteText` ops).
pub struct PdfFontRegistry {
    /// Keyed by `(typeface, fixed-pitch slot)`; style bits don't change
    /// which font file is loaded (spec.md has no bold/italic file slot),
    /// only how the glyph is transformed at draw time.
    entries: HashMap<(TypefaceId, bool), FontEntry>,
}

impl PdfFontRegistry {
    /// Reads every typeface file named in `config`, parsing and registering
    /// it with `doc`. A typeface with no usable file falls back to whatever
    /// `Roman`/fixed loaded successfully (spec §7: "Missing font:
    /// substitute Courier or Times"); if even that is unavailable this
    /// returns an error rather than inventing font data.
    pub fn load(doc: &mut PdfDocument, config: &Config) -> std::io::Result<PdfFontRegistry> {
        let mut entries = HashMap::new();
        let mut fallback_bytes: Option<Vec<u8>> = None;

        for typeface in all_typefaces() {
            let section = config.typefaces.get(typeface_section_name(typeface));
            for fixed in [true, false] {
                let path = section.and_then(|t| if fixed { t.fixed.as_ref() } else { t.proportional.as_ref() });
                let path = path
                    .map(std::path::PathBuf::from)
                    .or_else(|| section.and_then(|t| t.path.clone()))
                    .or_else(|| config.misc.default_font_path.clone());

                let bytes = match path.as_deref().map(read_font_file) {
                    Some(Ok(bytes)) => {
                        fallback_bytes.get_or_insert_with(|| bytes.clone());
                        bytes
                    }
                    Some(Err(err)) => {
                        log::warn!("could not read font for [{}]: {err}", typeface_section_name(typeface));
                        continue;
                    }
                    None => continue,
                };

                if let Some(entry) = register_font(doc, &bytes) {
                    entries.insert((typeface, fixed), entry);
                }
            }
        }

        if entries.is_empty() {
            let bytes = fallback_bytes.ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no typeface font file configured; set [misc] default_font_path or a typeface's path",
                )
            })?;
            if let Some(entry) = register_font(doc, &bytes) {
                entries.insert((TypefaceId::ROMAN, true), entry);
            }
        }

        Ok(PdfFontRegistry { entries })
    }

    fn lookup(&self, typeface: TypefaceId, fixed: bool) -> &FontEntry {
        self.entries
            .get(&(typeface, fixed))
            .or_else(|| self.entries.get(&(TypefaceId::ROMAN, fixed)))
            .or_else(|| self.entries.values().next())
            .expect("PdfFontRegistry::load guarantees at least one entry")
    }
}

fn read_font_file(path: &Path) -> std::io::Result<Vec<u8>> {
    std::fs::read(path)
}

fn register_font(doc: &mut PdfDocument, bytes: &[u8]) -> Option<FontEntry> {
    let parsed = ParsedFont::from_bytes(bytes, 0, &mut Vec::new())?;
    let id = doc.add_font(&parsed);
    Some(FontEntry { id, parsed })
}

/// Resolves [`TypefaceId`]/style combinations to a [`FontHandle`] backed by
/// a real parsed font, and answers proportional advance-width queries from
/// its glyph metrics (spec §4.5).
pub struct PdfFontResolver {
    registry: Rc<PdfFontRegistry>,
}

impl PdfFontResolver {
    pub fn new(registry: Rc<PdfFontRegistry>) -> PdfFontResolver {
        PdfFontResolver { registry }
    }

    fn handle_for(&self, typeface: TypefaceId, fixed: bool) -> FontHandle {
        FontHandle(typeface.0 as u32 * 2 + fixed as u32)
    }
}

impl FontResolver for PdfFontResolver {
    fn resolve(&self, typeface: TypefaceId, fixed: bool, _point_size: f32, _style: StyleBits) -> FontHandle {
        self.handle_for(typeface, fixed)
    }

    fn advance_width(&self, glyph: char, font: FontHandle, point_size: f32) -> f32 {
        let typeface = TypefaceId((font.0 / 2) as u8);
        let fixed = font.0 % 2 == 1;
        let entry = self.registry.lookup(typeface, fixed);
        let Some(glyph_index) = entry.parsed.lookup_glyph_index(glyph as u32) else {
            return point_size * 0.6;
        };
        let units_per_em = entry.parsed.font_metrics.units_per_em.max(1) as f32;
        entry.parsed.get_horizontal_advance(glyph_index) as f32 / units_per_em * point_size
    }
}

/// A [`DrawingSurface`] that accumulates `printpdf` ops per page and
/// assembles the finished document in [`DrawingSurface::finalize`].
pub struct PdfDrawingSurface {
    doc: Option<PdfDocument>,
    registry: Rc<PdfFontRegistry>,
    page_width_pt: f32,
    page_height_pt: f32,
    finished_pages: Vec<Vec<Op>>,
    current_page: Vec<Op>,
    /// Set by [`DrawingSurface::finalize`]; read by the caller to persist
    /// the document (this surface does not own the output path).
    pub bytes: Option<Vec<u8>>,
}

impl PdfDrawingSurface {
    pub fn new(doc: PdfDocument, registry: Rc<PdfFontRegistry>, page_width_pt: f32, page_height_pt: f32) -> PdfDrawingSurface {
        PdfDrawingSurface {
            doc: Some(doc),
            registry,
            page_width_pt,
            page_height_pt,
            finished_pages: Vec::new(),
            current_page: Vec::new(),
            bytes: None,
        }
    }

    /// Flips our top-left-origin coordinates into `printpdf`'s
    /// bottom-left-origin `Point`.
    fn point(&self, x: f32, y: f32) -> Point {
        Point { x: PdfPt(x), y: PdfPt(self.page_height_pt - y) }
    }

    fn fill_square(&mut self, x: f32, y: f32, side: f32, color: Cmyk) {
        let half = side / 2.0;
        let ring = PolygonRing {
            points: vec![
                LinePoint { p: self.point(x - half, y - half), bezier: false },
                LinePoint { p: self.point(x + half, y - half), bezier: false },
                LinePoint { p: self.point(x + half, y + half), bezier: false },
                LinePoint { p: self.point(x - half, y + half), bezier: false },
            ],
        };
        let polygon = Polygon { rings: vec![ring], mode: PaintMode::Fill, winding_order: WindingOrder::NonZero };
        self.current_page.push(Op::SetFillColor { col: to_pdf_color(color) });
        self.current_page.push(Op::DrawPolygon { polygon });
    }
}

fn to_pdf_color(color: Cmyk) -> Color {
    Color::Cmyk(printpdf::Cmyk::new(color.c, color.m, color.y, color.k, None))
}

impl DrawingSurface for PdfDrawingSurface {
    fn draw_text(&mut self, glyph: char, font: FontHandle, x: f32, y: f32, style: TextStyle) {
        let typeface = TypefaceId((font.0 / 2) as u8);
        let fixed = font.0 % 2 == 1;
        let entry = self.registry.lookup(typeface, fixed);

        let base_pt = PdfPt(style.point_size);
        let shear = style.shear_degrees.to_radians().tan();
        let matrix = [style.horizontal_scale, 0.0, shear, style.vertical_scale, 0.0, 0.0];

        self.current_page.push(Op::StartTextSection);
        self.current_page.push(Op::SetTextCursor { pos: self.point(x, y - style.baseline_shift) });
        self.current_page.push(Op::SetTextMatrix { matrix: TextMatrix::Raw(matrix) });
        self.current_page.push(Op::SetTextRenderingMode {
            mode: if style.double_strike { TextRenderingMode::FillStroke } else { TextRenderingMode::Fill },
        });
        self.current_page.push(Op::WriteText { text: glyph.to_string(), size: base_pt, font: entry.id.clone() });
        self.current_page.push(Op::EndTextSection);
    }

    fn draw_dot(&mut self, x: f32, y: f32, diameter: f32, color: Cmyk) {
        self.fill_square(x, y, diameter, color);
    }

    fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Cmyk) {
        let ring = PolygonRing {
            points: vec![
                LinePoint { p: self.point(x, y), bezier: false },
                LinePoint { p: self.point(x + w, y), bezier: false },
                LinePoint { p: self.point(x + w, y + h), bezier: false },
                LinePoint { p: self.point(x, y + h), bezier: false },
            ],
        };
        let polygon = Polygon { rings: vec![ring], mode: PaintMode::Fill, winding_order: WindingOrder::NonZero };
        self.current_page.push(Op::SetFillColor { col: to_pdf_color(color) });
        self.current_page.push(Op::DrawPolygon { polygon });
    }

    fn new_page(&mut self) {
        let finished = std::mem::take(&mut self.current_page);
        self.finished_pages.push(finished);
    }

    fn finalize(&mut self) {
        self.new_page();
        let Some(doc) = self.doc.take() else { return };
        let pages: Vec<PdfPage> = self
            .finished_pages
            .drain(..)
            .map(|ops| PdfPage::new(mm_from_pt(self.page_width_pt), mm_from_pt(self.page_height_pt), ops))
            .collect();
        let bytes = doc.with_pages(pages).save(&PdfSaveOptions::default(), &mut Vec::new());
        self.bytes = Some(bytes);
    }
}

fn mm_from_pt(pt: f32) -> printpdf::Mm {
    printpdf::Mm(pt * 25.4 / 72.0)
}
