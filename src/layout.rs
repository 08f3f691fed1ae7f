//! Layout engine: line feed, carriage return, form feed, tabs, and margin
//! commands (spec §4.2), all operating in [`crate::units::Grid`] subunits.

use crate::state::PrinterState;
use crate::surface::DrawingSurface;
use crate::units::Grid;

/// Advances `position.y` by `line_spacing`; if that exceeds the bottom
/// margin, performs an implicit form feed. Does not touch `x` (spec §4.2).
pub fn line_feed(state: &mut PrinterState, surface: &mut dyn DrawingSurface) {
    state.typography.clear_one_line_double_width();
    let next_y = state.position.y + state.line_spacing;
    if next_y > state.page_margins.bottom {
        surface.new_page();
        state.position.y = state.page_margins.top;
    } else {
        state.position.y = next_y;
    }
}

/// Sets `x` to the left margin; additionally performs a line feed if
/// `automatic_linefeed` is configured (spec §4.2).
pub fn carriage_return(state: &mut PrinterState, surface: &mut dyn DrawingSurface) {
    state.position.x = state.page_margins.left;
    state.typography.clear_one_line_double_width();
    if state.automatic_linefeed {
        line_feed(state, surface);
    }
}

/// Implicit CR, new page, reset `y` to the top margin (spec §4.2).
pub fn form_feed(state: &mut PrinterState, surface: &mut dyn DrawingSurface) {
    state.position.x = state.page_margins.left;
    surface.new_page();
    state.position.y = state.page_margins.top;
}

/// Advances to the smallest stop in `h_tabs` strictly greater than the
/// current `x`; a no-op if none exists (spec §4.2).
pub fn horizontal_tab(state: &mut PrinterState) {
    if let Some(&stop) = state.h_tabs.iter().find(|&&s| s > state.position.x) {
        state.position.x = stop;
    }
}

/// Advances to the smallest stop in `v_tabs` strictly greater than the
/// current `y`; acts as LF if none exists (spec §4.2).
pub fn vertical_tab(state: &mut PrinterState, surface: &mut dyn DrawingSurface) {
    if let Some(&stop) = state.v_tabs.iter().find(|&&s| s > state.position.y) {
        state.position.y = stop;
    } else {
        line_feed(state, surface);
    }
}

/// Backspace: moves `x` back by one fixed-pitch advance, never left of the
/// left margin.
pub fn backspace(state: &mut PrinterState) {
    let step = Grid((72.0 / state.typography.pitch_cpi * (3600.0 / 72.0)) as i64);
    state.position.x = (state.position.x - step).max(state.page_margins.left);
}

/// Relative horizontal move (`ESC \`), signed, in `defined_unit` units.
/// Horizontal overflow wraps via an implicit CR+LF (spec §3 invariant);
/// vertical overflow never happens here, only LF/FF cause it.
pub fn relative_horizontal_move(state: &mut PrinterState, surface: &mut dyn DrawingSurface, amount: i32) {
    let delta = state.defined_unit * amount as i64;
    let target = state.position.x + delta;
    if target > state.page_margins.right {
        carriage_return(state, surface);
        line_feed(state, surface);
    } else if target < state.page_margins.left {
        state.position.x = state.page_margins.left;
    } else {
        state.position.x = target;
    }
}

/// Absolute horizontal move (`ESC $`), in `defined_unit` units from the
/// left margin.
pub fn absolute_horizontal_move(state: &mut PrinterState, amount: u32) {
    let target = state.page_margins.left + state.defined_unit * amount as i64;
    state.position.x = target.clamp(state.page_margins.left, state.page_margins.right);
}

/// Sets horizontal tabs from an ascending sequence; stops at the first
/// out-of-order value (spec §4.1).
pub fn set_horizontal_tabs(state: &mut PrinterState, stops_in_chars: &[u8], pitch_cpi: f32) {
    let mut tabs = Vec::new();
    let mut last = 0u8;
    for &stop in stops_in_chars {
        if stop == 0 {
            break;
        }
        if stop <= last && !tabs.is_empty() {
            break;
        }
        last = stop;
        tabs.push(Grid((stop as f32 * 72.0 / pitch_cpi * (3600.0 / 72.0)) as i64));
    }
    state.h_tabs = tabs;
}

/// Sets vertical tabs, symmetric with [`set_horizontal_tabs`] but in lines.
pub fn set_vertical_tabs(state: &mut PrinterState, stops_in_lines: &[u8]) {
    let mut tabs = Vec::new();
    let mut last = 0u8;
    for &stop in stops_in_lines {
        if stop == 0 {
            break;
        }
        if stop <= last && !tabs.is_empty() {
            break;
        }
        last = stop;
        tabs.push(state.page_margins.top + state.line_spacing * (stop as i64));
    }
    state.v_tabs = tabs;
}

/// Sets the left margin; if it now exceeds `x`, moves `position` to the
/// nearest valid coordinate on the same line (spec §4.2).
pub fn set_left_margin(state: &mut PrinterState, margin: Grid) {
    if margin < state.page_margins.right {
        state.page_margins.left = margin;
        state.clamp_position_to_margins();
    }
}

/// Sets the right margin. Rejected (margins unchanged) if it would not
/// exceed the left margin (spec §8 boundary behaviour).
pub fn set_right_margin(state: &mut PrinterState, margin: Grid) {
    if margin > state.page_margins.left {
        state.page_margins.right = margin;
        state.clamp_position_to_margins();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingRegistry;
    use crate::state::{PrinterState, Pins};
    use crate::surface::Renderer;
    use crate::testutil::RecordingSurface;

    fn fresh_state() -> (PrinterState, EncodingRegistry) {
        let registry = EncodingRegistry::with_builtin_tables();
        let state = PrinterState::new(&registry, "PC437", Pins::TwentyFour, Renderer::Dots);
        (state, registry)
    }

    #[test]
    fn line_feed_advances_y_and_keeps_x() {
        let (mut state, _r) = fresh_state();
        let mut surface = RecordingSurface::default();
        state.position.x = Grid::from_inches(2);
        line_feed(&mut state, &mut surface);
        assert_eq!(state.position.x, Grid::from_inches(2));
        assert!(state.position.y > state.page_margins.top);
    }

    #[test]
    fn line_feed_past_bottom_margin_issues_new_page() {
        let (mut state, _r) = fresh_state();
        let mut surface = RecordingSurface::default();
        state.position.y = state.page_margins.bottom;
        line_feed(&mut state, &mut surface);
        assert_eq!(surface.new_page_calls, 1);
        assert_eq!(state.position.y, state.page_margins.top);
    }

    #[test]
    fn carriage_return_resets_x_only() {
        let (mut state, _r) = fresh_state();
        let mut surface = RecordingSurface::default();
        state.position.x = Grid::from_inches(3);
        state.position.y = Grid::from_inches(3);
        carriage_return(&mut state, &mut surface);
        assert_eq!(state.position.x, state.page_margins.left);
        assert_eq!(state.position.y, Grid::from_inches(3));
    }

    #[test]
    fn horizontal_tab_noop_without_further_stops() {
        let (mut state, _r) = fresh_state();
        state.h_tabs = vec![Grid::from_inches(1)];
        state.position.x = Grid::from_inches(2);
        horizontal_tab(&mut state);
        assert_eq!(state.position.x, Grid::from_inches(2));
    }

    #[test]
    fn vertical_tab_without_stops_acts_as_line_feed() {
        let (mut state, _r) = fresh_state();
        let mut surface = RecordingSurface::default();
        let before = state.position.y;
        vertical_tab(&mut state, &mut surface);
        assert!(state.position.y > before);
    }

    #[test]
    fn set_horizontal_tabs_stops_at_out_of_order_value() {
        let (mut state, _r) = fresh_state();
        set_horizontal_tabs(&mut state, &[5, 10, 3, 20], 10.0);
        assert_eq!(state.h_tabs.len(), 2);
    }

    #[test]
    fn set_right_margin_lte_left_is_rejected() {
        let (mut state, _r) = fresh_state();
        let before = state.page_margins.right;
        let left = state.page_margins.left;
        set_right_margin(&mut state, left);
        assert_eq!(state.page_margins.right, before);
    }
}
