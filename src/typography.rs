//! `TypographyState` and its resolution into a concrete font and transform
//! (spec §3, §4.5).

use crate::surface::{FontHandle, FontResolver, StyleBits, TextStyle, TypefaceId};

/// The 3-line-score selector for `ESC ( -` (underline/strikeout/overscore,
/// spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreStyle {
    #[default]
    None,
    Single,
    Double,
    Broken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineKind {
    #[default]
    None,
    Underline,
    Strikeout,
    Overscore,
}

/// All style attributes that together determine a glyph's font and
/// transform (spec §3.2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypographyState {
    pub typeface: TypefaceId,
    pub proportional: bool,
    pub pitch_cpi: f32,
    pub point_size: f32,
    pub explicit_point_size: bool,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub overscore: bool,
    pub double_strike: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub condensed: bool,
    /// Persistent double-width (`ESC W`).
    pub double_width: bool,
    /// One-line double-width (`SO`), cleared by CR/LF/DC4.
    pub double_width_line: bool,
    pub double_height: bool,
    pub intercharacter_space: f32,
    pub score_style: ScoreStyle,
}

impl Default for TypographyState {
    fn default() -> Self {
        TypographyState {
            typeface: TypefaceId::ROMAN,
            proportional: false,
            pitch_cpi: 10.0,
            point_size: 10.5,
            explicit_point_size: false,
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            overscore: false,
            double_strike: false,
            superscript: false,
            subscript: false,
            condensed: false,
            double_width: false,
            double_width_line: false,
            double_height: false,
            intercharacter_space: 0.0,
            score_style: ScoreStyle::None,
        }
    }
}

/// Result of resolving `TypographyState` at a single draw call (spec §4.5).
#[derive(Debug, Clone, Copy)]
pub struct ResolvedGlyph {
    pub font: FontHandle,
    pub horizontal_scale: f32,
    pub vertical_scale: f32,
    pub baseline_shift: f32,
    pub style: TextStyle,
}

impl TypographyState {
    /// Sets pitch (characters per inch), implicitly selecting the default
    /// point size unless one was set explicitly afterwards (spec §4.1:
    /// "ESC P/M/g set both pitch and implicitly a default point size").
    pub fn set_pitch(&mut self, cpi: f32) {
        self.pitch_cpi = cpi;
        self.point_size = default_point_size_for_pitch(cpi);
        self.explicit_point_size = false;
    }

    /// `ESC X`: explicit point size overrides the pitch-derived default.
    pub fn set_point_size(&mut self, points: f32) {
        self.point_size = points;
        self.explicit_point_size = true;
    }

    /// `ESC !` master select: a bitmask touching seven flags atomically.
    pub fn master_select(&mut self, mask: u8) {
        self.condensed = mask & (1 << 0) != 0;
        self.proportional = mask & (1 << 1) != 0;
        self.bold = mask & (1 << 2) != 0;
        self.double_strike = mask & (1 << 3) != 0;
        self.double_width = mask & (1 << 4) != 0;
        self.italic = mask & (1 << 5) != 0;
        self.underline = mask & (1 << 6) != 0;
        if mask & (1 << 0) == 0 {
            self.pitch_cpi = 10.0;
        } else {
            self.pitch_cpi = 12.0;
        }
    }

    /// Clears the one-line double-width flag (CR, LF, DC4 per spec §4.5).
    pub fn clear_one_line_double_width(&mut self) {
        self.double_width_line = false;
    }

    fn effective_double_width(&self) -> bool {
        self.double_width || self.double_width_line
    }

    /// Resolves to a concrete font, scale factors, and baseline shift
    /// (spec §4.5).
    pub fn resolve(&self, fonts: &dyn FontResolver) -> ResolvedGlyph {
        let mut style_bits = StyleBits::empty();
        if self.bold {
            style_bits |= StyleBits::BOLD;
        }
        let italic_has_variant = self.italic && fonts.has_italic_variant(self.typeface);
        if italic_has_variant {
            style_bits |= StyleBits::ITALIC;
        }

        let font = fonts.resolve(self.typeface, !self.proportional, self.point_size, style_bits);

        let mut horizontal_scale = 1.0;
        let mut vertical_scale = 1.0;
        let mut baseline_shift = 0.0;

        if self.condensed {
            let condensed_fallback_needed = !fonts.has_condensed_variant(self.typeface, style_bits);
            if condensed_fallback_needed {
                horizontal_scale *= 0.5;
            }
        }

        if self.effective_double_width() {
            horizontal_scale *= 2.0;
        }

        if self.double_height {
            vertical_scale *= 2.0;
        }

        if self.superscript || self.subscript {
            horizontal_scale *= 2.0 / 3.0;
            vertical_scale *= 2.0 / 3.0;
            let shift = self.point_size / 3.0;
            baseline_shift += if self.superscript { shift } else { -shift };
        }

        let shear_degrees = if self.italic && !italic_has_variant { 12.0 } else { 0.0 };

        let style = TextStyle {
            point_size: self.point_size,
            horizontal_scale,
            vertical_scale,
            baseline_shift,
            shear_degrees,
            double_strike: self.bold_needs_double_strike(fonts, style_bits),
        };

        ResolvedGlyph {
            font,
            horizontal_scale,
            vertical_scale,
            baseline_shift,
            style,
        }
    }

    fn bold_needs_double_strike(&self, _fonts: &dyn FontResolver, _style_bits: StyleBits) -> bool {
        // The font resolver always returns *a* handle for StyleBits::BOLD;
        // we only fall back to a simulated double-strike when the caller's
        // own `double_strike` flag (ESC G) is active, since a dedicated
        // bold variant already renders correctly with a single stroke.
        self.double_strike
    }

    /// Per-glyph horizontal advance for fixed pitch, spec §4.5: the
    /// proportional case asks the font resolver instead.
    pub fn fixed_advance_points(&self) -> f32 {
        let base = 72.0 / self.pitch_cpi;
        let width_scale = if self.effective_double_width() { 2.0 } else { 1.0 };
        base * width_scale + self.intercharacter_space
    }
}

/// Pitch-to-point-size defaults (spec §4.5).
pub fn default_point_size_for_pitch(cpi: f32) -> f32 {
    if (cpi - 10.0).abs() < f32::EPSILON {
        10.5
    } else if (cpi - 12.0).abs() < f32::EPSILON {
        10.5
    } else if (cpi - 15.0).abs() < f32::EPSILON {
        8.0
    } else {
        10.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::TypefaceId;

    struct StubFonts;
    impl FontResolver for StubFonts {
        fn resolve(&self, _t: TypefaceId, _fixed: bool, _pt: f32, _s: StyleBits) -> FontHandle {
            FontHandle(0)
        }
        fn advance_width(&self, _glyph: char, _font: FontHandle, _pt: f32) -> f32 {
            6.0
        }
    }

    #[test]
    fn pitch_10_defaults_to_10_5_point() {
        let mut t = TypographyState::default();
        t.set_pitch(10.0);
        assert_eq!(t.point_size, 10.5);
    }

    #[test]
    fn pitch_15_defaults_to_8_point() {
        let mut t = TypographyState::default();
        t.set_pitch(15.0);
        assert_eq!(t.point_size, 8.0);
    }

    #[test]
    fn explicit_point_size_overrides_pitch_default() {
        let mut t = TypographyState::default();
        t.set_pitch(10.0);
        t.set_point_size(12.0);
        assert_eq!(t.point_size, 12.0);
        assert!(t.explicit_point_size);
    }

    #[test]
    fn condensed_halves_horizontal_scale_without_variant() {
        let mut t = TypographyState::default();
        t.condensed = true;
        let resolved = t.resolve(&StubFonts);
        assert_eq!(resolved.horizontal_scale, 0.5);
    }

    #[test]
    fn double_width_doubles_horizontal_scale() {
        let mut t = TypographyState::default();
        t.double_width = true;
        let resolved = t.resolve(&StubFonts);
        assert_eq!(resolved.horizontal_scale, 2.0);
    }

    #[test]
    fn superscript_shifts_baseline_up_by_a_third() {
        let mut t = TypographyState::default();
        t.superscript = true;
        let resolved = t.resolve(&StubFonts);
        assert_eq!(resolved.baseline_shift, t.point_size / 3.0);
        assert!((resolved.horizontal_scale - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn master_select_touches_seven_flags() {
        let mut t = TypographyState::default();
        // bit1 proportional, bit2 bold, bit6 underline
        t.master_select(0b0100_0110);
        assert!(t.proportional);
        assert!(t.bold);
        assert!(t.underline);
        assert!(!t.condensed);
    }
}
