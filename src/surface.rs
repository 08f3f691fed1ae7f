//! The external collaborators spec §1 names: a vector drawing surface, a
//! font resolver, and a user-defined-character persistence layer. The
//! interpreter is generic over all three and never constructs a concrete
//! instance itself.

/// Opaque handle returned by a [`FontResolver`]; meaningless to the
/// interpreter beyond passing it back to the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontHandle(pub u32);

/// Identifies a configured typeface (`[Roman]`, `[Sans serif]`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypefaceId(pub u8);

impl TypefaceId {
    pub const ROMAN: TypefaceId = TypefaceId(0);
    pub const SANS_SERIF: TypefaceId = TypefaceId(1);
    pub const COURIER: TypefaceId = TypefaceId(2);
    pub const PRESTIGE: TypefaceId = TypefaceId(3);
    pub const SCRIPT: TypefaceId = TypefaceId(4);
    pub const OCR_A: TypefaceId = TypefaceId(5);
    pub const OCR_B: TypefaceId = TypefaceId(6);
    pub const ORATOR: TypefaceId = TypefaceId(7);
}

bitflags::bitflags! {
    /// Style bits passed to the font resolver; a subset of
    /// [`crate::typography::TypographyState`] collapsed to what the font
    /// resolver needs to pick a variant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StyleBits: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
    }
}

/// Final per-glyph drawing attributes resolved by
/// [`crate::typography::TypographyState::resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Unscaled point size `TypographyState` resolved (before
    /// `horizontal_scale`/`vertical_scale`, which the surface applies as a
    /// transform on top of this base size).
    pub point_size: f32,
    pub horizontal_scale: f32,
    pub vertical_scale: f32,
    pub baseline_shift: f32,
    /// Shear angle in degrees, applied when italic has no dedicated font
    /// variant (spec §4.5).
    pub shear_degrees: f32,
    pub double_strike: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            point_size: 10.5,
            horizontal_scale: 1.0,
            vertical_scale: 1.0,
            baseline_shift: 0.0,
            shear_degrees: 0.0,
            double_strike: false,
        }
    }
}

/// Ink colour in the CMYK space the drawing surface expects, mapped from
/// the Epson 8-colour palette (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cmyk {
    pub c: f32,
    pub m: f32,
    pub y: f32,
    pub k: f32,
}

impl Cmyk {
    pub const BLACK: Cmyk = Cmyk { c: 0.0, m: 0.0, y: 0.0, k: 1.0 };

    /// Maps the Epson 8-colour palette index (0..=7, as used by `ESC r` and
    /// the compressed-raster `<COLR>` opcode) to CMYK.
    pub fn from_epson_palette(index: u8) -> Cmyk {
        match index & 0x07 {
            0 => Cmyk::BLACK,
            1 => Cmyk { c: 1.0, m: 0.0, y: 0.0, k: 0.0 },
            2 => Cmyk { c: 0.0, m: 1.0, y: 0.0, k: 0.0 },
            3 => Cmyk { c: 1.0, m: 1.0, y: 0.0, k: 0.0 },
            4 => Cmyk { c: 0.0, m: 0.0, y: 1.0, k: 0.0 },
            5 => Cmyk { c: 1.0, m: 0.0, y: 1.0, k: 0.0 },
            6 => Cmyk { c: 0.0, m: 1.0, y: 1.0, k: 0.0 },
            _ => Cmyk { c: 0.25, m: 0.25, y: 0.25, k: 0.25 },
        }
    }
}

/// Chosen shape for a single decoded graphics dot (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Dots,
    Rectangles,
}

/// Vector drawing surface. Points (1/72 inch), origin top-left, per spec §1.
pub trait DrawingSurface {
    fn draw_text(&mut self, glyph: char, font: FontHandle, x: f32, y: f32, style: TextStyle);
    fn draw_dot(&mut self, x: f32, y: f32, diameter: f32, color: Cmyk);
    fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Cmyk);
    fn new_page(&mut self);
    fn finalize(&mut self);
}

/// Given a typeface and style, returns a drawable font handle.
pub trait FontResolver {
    fn resolve(
        &self,
        typeface: TypefaceId,
        fixed: bool,
        point_size: f32,
        style: StyleBits,
    ) -> FontHandle;

    /// Whether this typeface/style combination has a dedicated condensed
    /// variant (spec §4.5: `condensed_fallback`). Default: no.
    fn has_condensed_variant(&self, _typeface: TypefaceId, _style: StyleBits) -> bool {
        false
    }

    /// Whether this typeface/style combination has a dedicated italic
    /// variant, avoiding the synthetic shear fallback.
    fn has_italic_variant(&self, _typeface: TypefaceId) -> bool {
        false
    }

    /// Proportional advance width, in points, for `glyph` at `point_size`.
    /// Only consulted when the active pitch is proportional.
    fn advance_width(&self, glyph: char, font: FontHandle, point_size: f32) -> f32;
}

/// Bitmap of a single user-defined glyph, row-major MSB-first, as produced
/// by `ESC &`.
#[derive(Debug, Clone)]
pub struct UserGlyphBitmap {
    pub width: u16,
    pub height: u16,
    pub rows: Vec<u8>,
}

/// Persistence layer for user-defined characters, keyed by a content
/// fingerprint (spec §1, §4.4, §9). An external collaborator: this crate
/// only calls `lookup`/`record`.
pub trait UserDefinedStore {
    fn lookup(&self, fingerprint: &str, mode: u8, code: u8) -> Option<char>;
    fn record(&mut self, fingerprint: &str, mode: u8, proportional: bool, code: u8, bitmap: &UserGlyphBitmap);
}

impl<T: UserDefinedStore + ?Sized> UserDefinedStore for &mut T {
    fn lookup(&self, fingerprint: &str, mode: u8, code: u8) -> Option<char> {
        (**self).lookup(fingerprint, mode, code)
    }

    fn record(&mut self, fingerprint: &str, mode: u8, proportional: bool, code: u8, bitmap: &UserGlyphBitmap) {
        (**self).record(fingerprint, mode, proportional, code, bitmap)
    }
}
