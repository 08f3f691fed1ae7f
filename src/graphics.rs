//! The graphics decoder (spec §4.3): bit-image, 9-pin, raster, and
//! TIFF-compressed raster sub-protocols, all emitting dots through the
//! [`DrawingSurface`].

use std::io::Read;

use crate::state::{GraphicsMode, PrinterState};
use crate::surface::{Cmyk, DrawingSurface, Renderer};
use crate::units::Grid;

/// One bit-image density mode: horizontal/vertical dpi, bytes per column,
/// and whether adjacent dots are drawn touching (affects nothing visually
/// in a vector renderer beyond the dot diameter, spec §4.3).
#[derive(Debug, Clone, Copy)]
pub struct DensityMode {
    pub h_dpi: u32,
    pub v_dpi: u32,
    pub bytes_per_column: u8,
}

/// `ESC *` density table. Spec §4.3: "`m` selects one of ~16 density modes".
/// Grounded in the Epson ESC/P2 reference's bit-image mode table.
pub fn density_for_mode(m: u8) -> DensityMode {
    match m {
        0 => DensityMode { h_dpi: 60, v_dpi: 72, bytes_per_column: 1 },
        1 => DensityMode { h_dpi: 120, v_dpi: 72, bytes_per_column: 1 },
        2 => DensityMode { h_dpi: 120, v_dpi: 72, bytes_per_column: 1 },
        3 => DensityMode { h_dpi: 240, v_dpi: 72, bytes_per_column: 1 },
        4 => DensityMode { h_dpi: 80, v_dpi: 72, bytes_per_column: 1 },
        6 => DensityMode { h_dpi: 90, v_dpi: 72, bytes_per_column: 1 },
        32 => DensityMode { h_dpi: 60, v_dpi: 180, bytes_per_column: 3 },
        33 => DensityMode { h_dpi: 120, v_dpi: 180, bytes_per_column: 3 },
        38 => DensityMode { h_dpi: 90, v_dpi: 180, bytes_per_column: 3 },
        39 => DensityMode { h_dpi: 180, v_dpi: 180, bytes_per_column: 3 },
        40 => DensityMode { h_dpi: 360, v_dpi: 180, bytes_per_column: 3 },
        71 => DensityMode { h_dpi: 60, v_dpi: 360, bytes_per_column: 6 },
        72 => DensityMode { h_dpi: 120, v_dpi: 360, bytes_per_column: 6 },
        73 => DensityMode { h_dpi: 90, v_dpi: 360, bytes_per_column: 6 },
        74 => DensityMode { h_dpi: 180, v_dpi: 360, bytes_per_column: 6 },
        75 => DensityMode { h_dpi: 360, v_dpi: 360, bytes_per_column: 6 },
        _ => DensityMode { h_dpi: 60, v_dpi: 72, bytes_per_column: 1 },
    }
}

fn dot_diameter(dpi: u32) -> f32 {
    1.05 / dpi as f32 * 72.0
}

fn emit_dot(surface: &mut dyn DrawingSurface, renderer: Renderer, x: f32, y: f32, diameter: f32, color: Cmyk) {
    match renderer {
        Renderer::Dots => surface.draw_dot(x, y, diameter, color),
        Renderer::Rectangles => surface.draw_rect(x - diameter / 2.0, y - diameter / 2.0, diameter, diameter, color),
    }
}

/// `ESC * m nL nH data`: bit-image mode. `data` is already the exact
/// declared byte count (spec §4.3; the dispatcher enforces that via its
/// length-prefixed parameter block).
pub fn decode_bit_image(state: &mut PrinterState, surface: &mut dyn DrawingSurface, mode: u8, data: &[u8]) {
    let density = density_for_mode(mode);
    let bpc = density.bytes_per_column.max(1) as usize;
    let columns = data.len() / bpc;
    let diameter = dot_diameter(density.v_dpi);
    let color = Cmyk::from_epson_palette(state.epson_color);
    let col_step = Grid::from_units(1, density.h_dpi as i64) .0 as f32 / (3600.0 / 72.0);

    let start_x = state.position.x.to_points();
    let start_y = state.position.y.to_points();
    let v_step_points = 72.0 / density.v_dpi as f32;

    for col in 0..columns {
        let x = start_x + col as f32 * col_step;
        let bytes = &data[col * bpc..col * bpc + bpc];
        let total_pins = bpc * 8;
        for pin in 0..total_pins {
            let byte = bytes[pin / 8];
            let bit = 7 - (pin % 8);
            if byte & (1 << bit) != 0 {
                let y = start_y + pin as f32 * v_step_points;
                emit_dot(surface, state.renderer, x, y, diameter, color);
            }
        }
    }
    state.position.x += Grid::from_units(1, density.h_dpi as i64) * columns as i64;
}

/// `ESC ^`: 9-pin graphics. Two data bytes per column; the MSB of the
/// second byte is the 9th dot (spec §4.3).
pub fn decode_nine_pin(state: &mut PrinterState, surface: &mut dyn DrawingSurface, h_dpi: u32, data: &[u8]) {
    let columns = data.len() / 2;
    let diameter = dot_diameter(72);
    let color = Cmyk::from_epson_palette(state.epson_color);
    let col_step_points = 72.0 / h_dpi as f32;
    let v_step_points = 72.0 / 72.0;

    let start_x = state.position.x.to_points();
    let start_y = state.position.y.to_points();

    for col in 0..columns {
        let x = start_x + col as f32 * col_step_points;
        let b0 = data[col * 2];
        let b1 = data[col * 2 + 1];
        for pin in 0..8 {
            if b0 & (1 << (7 - pin)) != 0 {
                let y = start_y + pin as f32 * v_step_points;
                emit_dot(surface, state.renderer, x, y, diameter, color);
            }
        }
        if b1 & 0x80 != 0 {
            let y = start_y + 8.0 * v_step_points;
            emit_dot(surface, state.renderer, x, y, diameter, color);
        }
    }
    state.position.x += Grid::from_units(1, h_dpi as i64) * columns as i64;
}

/// `ESC . 0 v h m nL nH data`: uncompressed raster (spec §4.3).
pub fn decode_raster(
    state: &mut PrinterState,
    surface: &mut dyn DrawingSurface,
    v_spacing: Grid,
    h_spacing: Grid,
    rows_per_band: u8,
    columns: u16,
    data: &[u8],
) {
    let bytes_per_row = (columns as usize + 7) / 8;
    let color = Cmyk::from_epson_palette(state.epson_color);
    let diameter = dot_diameter((72.0 / h_spacing.to_points()).round() as u32);
    let start_x = state.position.x.to_points();
    let start_y = state.position.y.to_points();

    for row in 0..rows_per_band as usize {
        let row_start = row * bytes_per_row;
        if row_start + bytes_per_row > data.len() {
            break;
        }
        let row_bytes = &data[row_start..row_start + bytes_per_row];
        for col in 0..columns as usize {
            let byte = row_bytes[col / 8];
            let bit = 7 - (col % 8);
            if byte & (1 << bit) != 0 {
                let x = start_x + col as f32 * h_spacing.to_points();
                let y = start_y + row as f32 * v_spacing.to_points();
                emit_dot(surface, state.renderer, x, y, diameter, color);
            }
        }
    }
}

/// Unit for `<MOVX>` in the compressed-raster stream: 8 dots (`<MOVXBYTE>`)
/// or 1 dot (`<MOVXDOT>`), spec §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MovxUnit {
    Byte,
    Dot,
}

/// Running state of the `ESC . 2` TIFF-compressed raster sub-mode. Owns
/// nothing beyond the current scanline buffer (spec §2: "no buffering
/// beyond ... the graphics sub-decoder's scanline buffer").
pub struct CompressedRasterDecoder {
    h_spacing: Grid,
    v_spacing: Grid,
    movx_unit: MovxUnit,
    /// Bytes needed to complete one scanline (`ceil(columns/8)` from the
    /// `ESC . 2` header); 0 means the column count was not supplied, in
    /// which case each `<XFER>` is drawn as its own row with no implicit
    /// vertical advance.
    bytes_per_row: usize,
    scanline: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressedStep {
    Continue,
    Exit,
    Truncated,
}

impl CompressedRasterDecoder {
    pub fn new(h_spacing: Grid, v_spacing: Grid) -> CompressedRasterDecoder {
        CompressedRasterDecoder::with_row_width(h_spacing, v_spacing, 0)
    }

    /// `columns` is the `ESC . 2` header's column count; `bytes_per_row` is
    /// derived as `ceil(columns/8)` so successive `<XFER>` opcodes that
    /// together complete a row trigger an implicit one-row vertical advance
    /// (spec §4.3 describes `<MOVY>` for explicit jumps only; a real raster
    /// image's rows are otherwise contiguous).
    pub fn with_row_width(h_spacing: Grid, v_spacing: Grid, columns: u16) -> CompressedRasterDecoder {
        CompressedRasterDecoder {
            h_spacing,
            v_spacing,
            movx_unit: MovxUnit::Dot,
            bytes_per_row: (columns as usize + 7) / 8,
            scanline: Vec::new(),
        }
    }

    /// Reads and executes one opcode from `reader`. Unknown opcodes behave
    /// as `<EXIT>` (spec §4.3, §7).
    pub fn step(
        &mut self,
        reader: &mut impl Read,
        state: &mut PrinterState,
        surface: &mut dyn DrawingSurface,
    ) -> CompressedStep {
        let mut op = [0u8; 1];
        if reader.read(&mut op).unwrap_or(0) == 0 {
            return CompressedStep::Truncated;
        }
        let op = op[0];
        match op {
            0x00..=0x7F => {
                let n = op as usize + 1;
                let mut buf = vec![0u8; n];
                if read_exact_best_effort(reader, &mut buf) < n {
                    return CompressedStep::Truncated;
                }
                self.flush_scanline(&buf, state, surface);
                CompressedStep::Continue
            }
            0xE1 => {
                let mut buf = [0u8; 2];
                if read_exact_best_effort(reader, &mut buf) < 2 {
                    return CompressedStep::Truncated;
                }
                let raw = i16::from_le_bytes(buf);
                let unit = match self.movx_unit {
                    MovxUnit::Byte => 8,
                    MovxUnit::Dot => 1,
                };
                let delta = self.h_spacing * (raw as i64 * unit);
                state.position.x = (state.position.x + delta).max(state.page_margins.left);
                CompressedStep::Continue
            }
            0xE2 => {
                let mut buf = [0u8; 2];
                if read_exact_best_effort(reader, &mut buf) < 2 {
                    return CompressedStep::Truncated;
                }
                let raw = u16::from_le_bytes(buf);
                state.position.y += self.v_spacing * raw as i64;
                CompressedStep::Continue
            }
            0xE3 => {
                let mut buf = [0u8; 1];
                if reader.read(&mut buf).unwrap_or(0) == 0 {
                    return CompressedStep::Truncated;
                }
                state.epson_color = buf[0] & 0x07;
                CompressedStep::Continue
            }
            0xE4 => {
                state.position.x = state.page_margins.left;
                CompressedStep::Continue
            }
            0xE5 => CompressedStep::Exit,
            0xE6 => {
                self.movx_unit = MovxUnit::Byte;
                CompressedStep::Continue
            }
            0xE7 => {
                self.movx_unit = MovxUnit::Dot;
                CompressedStep::Continue
            }
            0x81..=0xFF => {
                let mut b = [0u8; 1];
                if reader.read(&mut b).unwrap_or(0) == 0 {
                    return CompressedStep::Truncated;
                }
                let count = 257 - op as u16;
                let buf = vec![b[0]; count as usize];
                self.flush_scanline(&buf, state, surface);
                CompressedStep::Continue
            }
            _ => {
                // Opcode 0x80 is reserved and any other unrecognised value
                // terminates compressed mode, same as <EXIT> (spec §8).
                CompressedStep::Exit
            }
        }
    }

    fn flush_scanline(&mut self, bytes: &[u8], state: &mut PrinterState, surface: &mut dyn DrawingSurface) {
        self.scanline.extend_from_slice(bytes);

        if self.bytes_per_row == 0 {
            self.draw_row(&self.scanline.clone(), state, surface);
            self.scanline.clear();
            return;
        }

        while self.scanline.len() >= self.bytes_per_row {
            let row: Vec<u8> = self.scanline.drain(..self.bytes_per_row).collect();
            self.draw_row(&row, state, surface);
            state.position.y += self.v_spacing;
        }
    }

    fn draw_row(&self, row: &[u8], state: &PrinterState, surface: &mut dyn DrawingSurface) {
        let color = Cmyk::from_epson_palette(state.epson_color);
        let diameter = dot_diameter((72.0 / self.h_spacing.to_points()).round().max(1.0) as u32);
        let y = state.position.y.to_points();
        let start_x = state.position.x.to_points();
        for (byte_idx, byte) in row.iter().enumerate() {
            for bit in 0..8 {
                if byte & (1 << (7 - bit)) != 0 {
                    let col = byte_idx * 8 + bit;
                    let x = start_x + col as f32 * self.h_spacing.to_points();
                    emit_dot(surface, state.renderer, x, y, diameter, color);
                }
            }
        }
    }
}

fn read_exact_best_effort(reader: &mut impl Read, buf: &mut [u8]) -> usize {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(_) => break,
        }
    }
    total
}

/// Ensures `graphics_mode` is cleared once a graphics sub-mode finishes
/// (spec §3 invariant: exactly one mode active at a time).
pub fn exit_graphics_mode(state: &mut PrinterState) {
    state.graphics_mode = GraphicsMode::None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingRegistry;
    use crate::state::Pins;
    use crate::testutil::RecordingSurface;
    use std::io::Cursor;

    fn fresh_state() -> PrinterState {
        let registry = EncodingRegistry::with_builtin_tables();
        PrinterState::new(&registry, "PC437", Pins::TwentyFour, Renderer::Dots)
    }

    #[test]
    fn bit_image_all_bits_set_draws_8_dots_per_column() {
        let mut state = fresh_state();
        let mut surface = RecordingSurface::default();
        decode_bit_image(&mut state, &mut surface, 1, &[0xFF, 0xFF, 0xFF]);
        assert_eq!(surface.dot_count(), 24);
    }

    #[test]
    fn bit_image_zero_columns_is_pure_advance() {
        let mut state = fresh_state();
        let mut surface = RecordingSurface::default();
        let start = state.position.x;
        decode_bit_image(&mut state, &mut surface, 1, &[]);
        assert_eq!(surface.dot_count(), 0);
        assert_eq!(state.position.x, start);
    }

    #[test]
    fn compressed_literal_opcode_draws_dots_from_0xaa() {
        let mut state = fresh_state();
        let mut surface = RecordingSurface::default();
        let mut decoder = CompressedRasterDecoder::new(Grid::from_units(1, 180), Grid::from_units(1, 180));
        let mut reader = Cursor::new(vec![0x01, 0xAA, 0xAA, 0xE5]);
        loop {
            match decoder.step(&mut reader, &mut state, &mut surface) {
                CompressedStep::Continue => continue,
                CompressedStep::Exit | CompressedStep::Truncated => break,
            }
        }
        assert_eq!(surface.dot_count(), 8);
    }

    #[test]
    fn compressed_row_completion_advances_y_by_one_row() {
        let mut state = fresh_state();
        let mut surface = RecordingSurface::default();
        // 8 columns -> 1 byte per row; two literal 1-byte transfers are two
        // complete rows and should land on two different y coordinates.
        let mut decoder = CompressedRasterDecoder::with_row_width(Grid::from_units(1, 180), Grid::from_units(1, 180), 8);
        let start_y = state.position.y;
        let mut reader = Cursor::new(vec![0x00, 0xFF, 0x00, 0xFF, 0xE5]);
        loop {
            match decoder.step(&mut reader, &mut state, &mut surface) {
                CompressedStep::Continue => continue,
                CompressedStep::Exit | CompressedStep::Truncated => break,
            }
        }
        assert_eq!(surface.dot_count(), 16);
        assert_eq!(state.position.y, start_y + Grid::from_units(1, 180) * 2);
    }

    #[test]
    fn compressed_unknown_opcode_behaves_as_exit() {
        let mut state = fresh_state();
        let mut surface = RecordingSurface::default();
        let mut decoder = CompressedRasterDecoder::new(Grid::from_units(1, 180), Grid::from_units(1, 180));
        let mut reader = Cursor::new(vec![0x80]);
        let step = decoder.step(&mut reader, &mut state, &mut surface);
        assert_eq!(step, CompressedStep::Exit);
    }

    #[test]
    fn compressed_run_length_repeats_byte() {
        let mut state = fresh_state();
        let mut surface = RecordingSurface::default();
        let mut decoder = CompressedRasterDecoder::new(Grid::from_units(1, 180), Grid::from_units(1, 180));
        // 0xFE -> 257-254=3 repeats of 0xFF
        let mut reader = Cursor::new(vec![0xFE, 0xFF]);
        let step = decoder.step(&mut reader, &mut state, &mut surface);
        assert_eq!(step, CompressedStep::Continue);
        assert_eq!(surface.dot_count(), 24);
    }
}
