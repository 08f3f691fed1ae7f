//! Page-format commands: page length, page format margins, bottom margin,
//! left/right margin in character columns (spec §4.1).

use crate::state::PrinterState;
use crate::units::Grid;

/// `ESC ( C nL nH mL mH`: page length in `defined_unit` units.
pub fn set_page_length_defined_unit(state: &mut PrinterState, value: u16) {
    state.paper.height = state.defined_unit * value as i64;
    state.page_margins.bottom = state.page_margins.bottom.min(state.paper.height);
    state.clamp_position_to_margins();
}

/// `ESC ( c nL nH tL tH bL bH`: top/bottom margins in fixed 1/360-inch
/// units (the real hardware ignores `defined_unit` here). Rejected (per
/// spec §8 boundary behaviour, mirroring the left/right margin rule) if
/// the declared bottom would not exceed the declared top.
pub fn set_page_format(state: &mut PrinterState, top_360: u16, bottom_360: u16) {
    let top = Grid::from_units(top_360 as i64, 360).clamp(Grid::ZERO, state.paper.height);
    let bottom = Grid::from_units(bottom_360 as i64, 360).clamp(Grid::ZERO, state.paper.height);
    if bottom > top {
        state.page_margins.top = top;
        state.page_margins.bottom = bottom;
        state.clamp_position_to_margins();
    }
}

/// `ESC C 0 n`: page length in lines, using the current line spacing.
pub fn set_page_length_lines(state: &mut PrinterState, lines: u8) {
    state.paper.height = state.line_spacing * lines as i64;
    state.page_margins.bottom = state.page_margins.bottom.min(state.paper.height);
    state.clamp_position_to_margins();
}

/// `ESC C n` (n != 0): page length in whole inches.
pub fn set_page_length_inches(state: &mut PrinterState, inches: u8) {
    state.paper.height = Grid::from_inches(inches as i64);
    state.page_margins.bottom = state.page_margins.bottom.min(state.paper.height);
    state.clamp_position_to_margins();
}

/// `ESC N n`: skip-over-perforation, n lines up from the bottom of the page.
pub fn set_bottom_margin_lines(state: &mut PrinterState, lines: u8) {
    let candidate = state.paper.height - state.line_spacing * lines as i64;
    if candidate > state.page_margins.top {
        state.page_margins.bottom = candidate;
        state.clamp_position_to_margins();
    }
}

/// `ESC O`: cancels skip-over-perforation.
pub fn cancel_bottom_margin(state: &mut PrinterState) {
    state.page_margins.bottom = state.paper.height;
}

/// `ESC l n`: left margin, in 1/10-inch columns from the left physical edge
/// (the real hardware always uses 10 cpi for this regardless of the
/// current pitch).
pub fn set_left_margin_columns(state: &mut PrinterState, columns: u8) {
    crate::layout::set_left_margin(state, Grid::from_units(columns as i64, 10));
}

/// `ESC Q n`: right margin, symmetric with [`set_left_margin_columns`].
pub fn set_right_margin_columns(state: &mut PrinterState, columns: u8) {
    crate::layout::set_right_margin(state, Grid::from_units(columns as i64, 10));
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
    fn page_format_rejects_bottom_not_past_top() {
        let mut state = fresh_state();
        let before = state.page_margins;
        set_page_format(&mut state, 200, 200);
        assert_eq!(state.page_margins, before);
    }

    #[test]
    fn page_format_accepts_valid_margins() {
        let mut state = fresh_state();
        set_page_format(&mut state, 360, 3600);
        assert_eq!(state.page_margins.top, Grid::from_inches(1));
        assert_eq!(state.page_margins.bottom, Grid::from_inches(10));
    }

    #[test]
    fn bottom_margin_lines_moves_up_from_page_bottom() {
        let mut state = fresh_state();
        let paper_height = state.paper.height;
        set_bottom_margin_lines(&mut state, 6);
        assert_eq!(state.page_margins.bottom, paper_height - state.line_spacing * 6);
    }
}
