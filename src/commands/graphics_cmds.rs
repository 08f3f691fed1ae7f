//! Thin entry points from the dispatcher into [`crate::graphics`], plus the
//! bit-image mode-remapping table `ESC ?` rewrites (spec §4.1, §4.3).

use crate::graphics;
use crate::state::PrinterState;
use crate::surface::DrawingSurface;
use crate::units::Grid;

/// `ESC * m nL nH data`.
pub fn bit_image(state: &mut PrinterState, surface: &mut dyn DrawingSurface, mode: u8, data: &[u8]) {
    graphics::decode_bit_image(state, surface, mode, data);
}

/// `ESC K`/`ESC L`/`ESC Y`/`ESC Z`: legacy fixed-mode bit-image aliases.
/// `legend` indexes [`PrinterState::remapped_density`] so a prior `ESC ?`
/// reassignment is honoured.
pub fn legacy_bit_image(state: &mut PrinterState, surface: &mut dyn DrawingSurface, legend: u8, data: &[u8]) {
    let mode = state.remapped_density[legend as usize % 4];
    graphics::decode_bit_image(state, surface, mode, data);
}

/// `ESC ? s n`: reassigns the density mode `ESC K`/`L`/`Y`/`Z` (`s`, as
/// `b'K'`, `b'L'`, `b'Y'`, `b'Z'`) resolve to.
pub fn reassign_density(state: &mut PrinterState, selector: u8, new_mode: u8) {
    let index = match selector {
        b'K' => 0,
        b'L' => 1,
        b'Y' => 2,
        b'Z' => 3,
        _ => {
            log::warn!("ESC ?: unknown legend selector {selector:#x}, ignoring");
            return;
        }
    };
    state.remapped_density[index] = new_mode;
}

/// `ESC ^ m nL nH data`.
pub fn nine_pin(state: &mut PrinterState, surface: &mut dyn DrawingSurface, mode: u8, data: &[u8]) {
    let h_dpi = if mode == 0 { 60 } else { 120 };
    graphics::decode_nine_pin(state, surface, h_dpi, data);
}

/// `ESC . 0|1 v h m nL nH data`: uncompressed raster.
pub fn raster(
    state: &mut PrinterState,
    surface: &mut dyn DrawingSurface,
    v: u8,
    h: u8,
    rows_per_band: u8,
    columns: u16,
    data: &[u8],
) {
    graphics::decode_raster(state, surface, Grid(v as i64), Grid(h as i64), rows_per_band, columns, data);
}

/// `ESC ( G n`: selects the extended nozzle-addressable graphics head
/// (n=1) vs the standard 24-pin head (n=0); affects the density tables
/// bit-image decoding consults via [`PrinterState::pins`].
pub fn select_graphics_mode(state: &mut PrinterState, n: u8) {
    use crate::state::Pins;
    state.pins = if n == 1 { Pins::Nozzle } else { Pins::TwentyFour };
}
