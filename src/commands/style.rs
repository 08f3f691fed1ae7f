//! Typography toggles (spec §4.1, §4.5): the individual `ESC`/control-code
//! commands that mutate one or two fields of [`crate::typography::TypographyState`].
//! `ESC X`, `ESC !`, and `ESC ( -` carry enough internal structure to get
//! their own functions; the rest are one-liners grouped here for the same
//! reason the teacher groups its settings builders together.

use crate::state::PrinterState;
use crate::typography::{LineKind, ScoreStyle};

pub fn bold_on(state: &mut PrinterState) {
    state.typography.bold = true;
}

pub fn bold_off(state: &mut PrinterState) {
    state.typography.bold = false;
}

pub fn italic_on(state: &mut PrinterState) {
    state.typography.italic = true;
}

pub fn italic_off(state: &mut PrinterState) {
    state.typography.italic = false;
}

pub fn double_strike_on(state: &mut PrinterState) {
    state.typography.double_strike = true;
}

pub fn double_strike_off(state: &mut PrinterState) {
    state.typography.double_strike = false;
}

/// `ESC - n`: n=0 off, n!=0 on (the real command also distinguishes a
/// dashed/dotted line style in `n`, folded here into the boolean field).
pub fn underline(state: &mut PrinterState, n: u8) {
    state.typography.underline = n != 0;
}

/// `ESC S n`: n=0 superscript, n=1 subscript; mutually exclusive.
pub fn super_or_subscript(state: &mut PrinterState, n: u8) {
    if n == 0 {
        state.typography.superscript = true;
        state.typography.subscript = false;
    } else {
        state.typography.subscript = true;
        state.typography.superscript = false;
    }
}

/// `ESC T`: cancels both superscript and subscript.
pub fn cancel_super_sub(state: &mut PrinterState) {
    state.typography.superscript = false;
    state.typography.subscript = false;
}

/// `ESC W n`: persistent double-width, n=0 off, n!=0 on.
pub fn double_width(state: &mut PrinterState, n: u8) {
    state.typography.double_width = n != 0;
}

/// `SO` (0x0E): one-line double-width, cleared by the next CR/LF/DC4.
pub fn double_width_one_line(state: &mut PrinterState) {
    state.typography.double_width_line = true;
}

/// `SI` (0x0F): condensed on.
pub fn condensed_on(state: &mut PrinterState) {
    state.typography.condensed = true;
}

/// `DC2` (0x12): condensed off.
pub fn condensed_off(state: &mut PrinterState) {
    state.typography.condensed = false;
}

/// `DC4` (0x14): cancels one-line double-width early.
pub fn cancel_double_width_one_line(state: &mut PrinterState) {
    state.typography.clear_one_line_double_width();
}

/// `ESC w n`: persistent double-height, n=0 off, n!=0 on.
pub fn double_height(state: &mut PrinterState, n: u8) {
    state.typography.double_height = n != 0;
}

/// `ESC p n`: proportional spacing, n=0 off, n!=0 on.
pub fn proportional(state: &mut PrinterState, n: u8) {
    state.typography.proportional = n != 0;
}

pub fn select_pitch_10(state: &mut PrinterState) {
    state.typography.set_pitch(10.0);
}

pub fn select_pitch_12(state: &mut PrinterState) {
    state.typography.set_pitch(12.0);
}

pub fn select_pitch_15(state: &mut PrinterState) {
    state.typography.set_pitch(15.0);
}

/// `ESC X m nL nH`: `m` selects pitch (0 keeps the current one, 5-20 is a
/// cpi value), `nL nH` is point size in half-point units (0 keeps the
/// pitch-derived default).
pub fn set_pitch_and_point(state: &mut PrinterState, pitch_selector: u8, half_points: u16) {
    if pitch_selector != 0 {
        state.typography.set_pitch(pitch_selector as f32);
    }
    if half_points != 0 {
        state.typography.set_point_size(half_points as f32 / 2.0);
    }
}

/// `ESC !`: master select bitmask.
pub fn master_select(state: &mut PrinterState, mask: u8) {
    state.typography.master_select(mask);
}

/// `ESC r n`: selects the active ink colour from the Epson 8-colour
/// palette (0..7); out-of-range values clamp to black (spec §4.3).
pub fn select_color(state: &mut PrinterState, n: u8) {
    state.epson_color = if n <= 7 { n } else { 0 };
}

/// `ESC SP n`: intercharacter space, in 1/120 inch on 9-pin heads or 1/180
/// inch on 24-pin/nozzle heads (spec §4.5 `intercharacter_space`, added on
/// top of every glyph's own advance).
pub fn set_intercharacter_space(state: &mut PrinterState, n: u8) {
    let denominator = match state.pins {
        crate::state::Pins::Nine => 120,
        crate::state::Pins::TwentyFour | crate::state::Pins::FortyEight | crate::state::Pins::Nozzle => 180,
    };
    state.typography.intercharacter_space = n as f32 / denominator as f32 * 72.0;
}

/// `ESC ( - nL nH d1 d2 d3`: three-line score. `d1` is a reserved weight
/// byte (ignored, matching spec.md's silence on it); `d2` selects which
/// line (1 underline, 2 strikeout, 3 overscore); `d3` selects the style.
pub fn three_line_score(state: &mut PrinterState, which: u8, style: u8) {
    let kind = match which {
        1 => LineKind::Underline,
        2 => LineKind::Strikeout,
        3 => LineKind::Overscore,
        _ => LineKind::None,
    };
    let score = match style {
        0 => ScoreStyle::None,
        1 => ScoreStyle::Single,
        2 => ScoreStyle::Double,
        3 => ScoreStyle::Broken,
        _ => ScoreStyle::None,
    };
    let on = score != ScoreStyle::None;
    match kind {
        LineKind::Underline => state.typography.underline = on,
        LineKind::Strikeout => state.typography.strikeout = on,
        LineKind::Overscore => state.typography.overscore = on,
        LineKind::None => {}
    }
    state.typography.score_style = score;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingRegistry;
    use crate::state::Pins;
    use crate::surface::Renderer;

    fn fresh_state() -> PrinterState {
        let registry = EncodingRegistry::with_builtin_tables();
        PrinterState::new(&registry, "PC437", Pins::TwentyFour, Renderer::Dots)
    }

    #[test]
    fn underline_zero_turns_off() {
        let mut state = fresh_state();
        state.typography.underline = true;
        underline(&mut state, 0);
        assert!(!state.typography.underline);
    }

    #[test]
    fn superscript_and_subscript_are_mutually_exclusive() {
        let mut state = fresh_state();
        super_or_subscript(&mut state, 0);
        assert!(state.typography.superscript);
        super_or_subscript(&mut state, 1);
        assert!(state.typography.subscript);
        assert!(!state.typography.superscript);
    }

    #[test]
    fn three_line_score_sets_strikeout() {
        let mut state = fresh_state();
        three_line_score(&mut state, 2, 1);
        assert!(state.typography.strikeout);
        assert_eq!(state.typography.score_style, ScoreStyle::Single);
    }

    #[test]
    fn intercharacter_space_uses_180_denominator_on_24_pin() {
        let mut state = fresh_state();
        set_intercharacter_space(&mut state, 18);
        assert!((state.typography.intercharacter_space - 7.2).abs() < 1e-4);
    }

    #[test]
    fn set_pitch_and_point_keeps_pitch_when_selector_zero() {
        let mut state = fresh_state();
        state.typography.set_pitch(12.0);
        set_pitch_and_point(&mut state, 0, 24);
        assert_eq!(state.typography.pitch_cpi, 12.0);
        assert_eq!(state.typography.point_size, 12.0);
    }
}
