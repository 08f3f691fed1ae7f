//! Absolute/relative positioning commands beyond the primitives already in
//! [`crate::layout`]: `ESC $`, `ESC \`, `ESC ( V`, `ESC ( v`, `ESC J`
//! (spec §4.1, §4.2).

use crate::state::PrinterState;
use crate::surface::DrawingSurface;
use crate::units::Grid;

/// `ESC ( V nL nH dL dH`: absolute vertical position, 1/360 inch from the
/// top margin, clamped to the bottom margin (no page break; unlike LF/FF,
/// spec §4.2 reserves page breaks for line feed and form feed alone).
pub fn absolute_vertical(state: &mut PrinterState, units_360: u16) {
    let target = state.page_margins.top + Grid::from_units(units_360 as i64, 360);
    state.position.y = target.clamp(state.page_margins.top, state.page_margins.bottom);
}

/// `ESC ( v nL nH dL dH`: relative vertical position, signed, 1/360 inch.
/// Overflow past the bottom margin triggers an implicit new page, the one
/// case besides LF/FF that does (mirrors `ESC J`, which shares this unit
/// family).
pub fn relative_vertical(state: &mut PrinterState, surface: &mut dyn DrawingSurface, units_360: i16) {
    let delta = Grid::from_units(units_360 as i64, 360);
    let target = state.position.y + delta;
    if target > state.page_margins.bottom {
        surface.new_page();
        state.position.y = state.page_margins.top;
    } else {
        state.position.y = target.max(state.page_margins.top);
    }
}

/// `ESC J n`: advance n/180 inch vertically; same overflow behaviour as
/// [`relative_vertical`].
pub fn advance_vertical_180(state: &mut PrinterState, surface: &mut dyn DrawingSurface, units: u8) {
    let delta = Grid::from_units(units as i64, 180);
    let target = state.position.y + delta;
    if target > state.page_margins.bottom {
        surface.new_page();
        state.position.y = state.page_margins.top;
    } else {
        state.position.y = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingRegistry;
    use crate::state::Pins;
    use crate::surface::Renderer;
    use crate::testutil::RecordingSurface;

    fn fresh_state() -> PrinterState {
        let registry = EncodingRegistry::with_builtin_tables();
        PrinterState::new(&registry, "PC437", Pins::TwentyFour, Renderer::Dots)
    }

    #[test]
    fn absolute_vertical_clamps_to_bottom_margin() {
        let mut state = fresh_state();
        let bottom = state.page_margins.bottom;
        absolute_vertical(&mut state, 65535);
        assert_eq!(state.position.y, bottom);
    }

    #[test]
    fn relative_vertical_past_bottom_issues_new_page() {
        let mut state = fresh_state();
        let mut surface = RecordingSurface::default();
        state.position.y = state.page_margins.bottom;
        relative_vertical(&mut state, &mut surface, 100);
        assert_eq!(surface.new_page_calls, 1);
        assert_eq!(state.position.y, state.page_margins.top);
    }
}
