//! The top-level interpreter (spec §2, §4.1): reads an ESC/P byte stream
//! and delegates to the layout, typography, encoding, and graphics
//! subsystems, driving a [`DrawingSurface`]. This module owns the single
//! public entry point, [`Interpreter::run`].

use std::io::Read;

use crate::encoding::{self, EncodingRegistry};
use crate::error::{PrinterError, Result};
use crate::fingerprint;
use crate::graphics::{self, CompressedRasterDecoder, CompressedStep};
use crate::layout;
use crate::state::{GraphicsMode, PrinterState};
use crate::surface::{DrawingSurface, FontResolver, UserDefinedStore};
use crate::units::Grid;

const ESC: u8 = 0x1B;

const LF: u8 = 0x0A;
const CR: u8 = 0x0D;
const FF: u8 = 0x0C;
const HT: u8 = 0x09;
const VT: u8 = 0x0B;
const BS: u8 = 0x08;
const SO: u8 = 0x0E;
const SI: u8 = 0x0F;
const DC2: u8 = 0x12;
const DC4: u8 = 0x14;
const CAN: u8 = 0x18;
const DEL: u8 = 0x7F;

fn is_control_range(byte: u8) -> bool {
    byte <= 0x1F || (0x80..=0x9F).contains(&byte)
}

/// Reads up to `buf.len()` bytes, returning how many were actually read
/// before EOF. A short read (return value < `buf.len()`) is the signal
/// for a truncated stream (spec §7).
fn read_best_effort(reader: &mut impl Read, buf: &mut [u8]) -> usize {
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

fn truncated(declared: usize, consumed: usize) -> PrinterError {
    PrinterError::StreamTruncation { declared, consumed }
}

/// Drives a byte stream against a [`DrawingSurface`], generic over the
/// font resolver and user-defined-character store spec §1 names as
/// external collaborators.
pub struct Interpreter<F, U> {
    registry: EncodingRegistry,
    default_table: String,
    fonts: F,
    user_store: U,
}

impl<F: FontResolver, U: UserDefinedStore> Interpreter<F, U> {
    pub fn new(registry: EncodingRegistry, default_table: impl Into<String>, fonts: F, user_store: U) -> Self {
        Interpreter {
            registry,
            default_table: default_table.into(),
            fonts,
            user_store,
        }
    }

    /// Runs the interpreter to completion: the sole public operation this
    /// crate exposes (spec §4.1). Returns `Ok(())` on a clean end of
    /// stream; the two fatal conditions of spec §7 return `Err`.
    pub fn run(&mut self, mut reader: impl Read, surface: &mut dyn DrawingSurface, state: &mut PrinterState) -> Result<()> {
        let mut compressed: Option<CompressedRasterDecoder> = None;

        loop {
            if state.graphics_mode == GraphicsMode::RasterCompressed {
                let decoder = compressed.as_mut().expect("RasterCompressed set without a decoder");
                match decoder.step(&mut reader, state, surface) {
                    CompressedStep::Continue => continue,
                    CompressedStep::Exit => {
                        graphics::exit_graphics_mode(state);
                        compressed = None;
                        continue;
                    }
                    CompressedStep::Truncated => {
                        surface.finalize();
                        return Err(truncated(1, 0));
                    }
                }
            }

            let mut one = [0u8; 1];
            let n = reader.read(&mut one).map_err(PrinterError::UnreadableInput)?;
            if n == 0 {
                break;
            }
            let byte = one[0];

            if byte == ESC {
                match self.dispatch_esc(&mut reader, surface, state, &mut compressed) {
                    Ok(()) => continue,
                    Err(e) => {
                        surface.finalize();
                        return Err(e);
                    }
                }
            }

            self.handle_data_byte(byte, surface, state);
        }

        surface.finalize();
        Ok(())
    }

    fn handle_data_byte(&mut self, byte: u8, surface: &mut dyn DrawingSurface, state: &mut PrinterState) {
        if state.all_control_printable && is_control_range(byte) && byte != ESC {
            self.print_glyph(byte, surface, state);
            return;
        }

        match byte {
            LF => layout::line_feed(state, surface),
            CR => layout::carriage_return(state, surface),
            FF => layout::form_feed(state, surface),
            HT => layout::horizontal_tab(state),
            VT => layout::vertical_tab(state, surface),
            BS => layout::backspace(state),
            SO => crate::commands::style::double_width_one_line(state),
            SI => crate::commands::style::condensed_on(state),
            DC2 => crate::commands::style::condensed_off(state),
            DC4 => crate::commands::style::cancel_double_width_one_line(state),
            CAN | DEL => {
                // Cancels the most recently buffered, not-yet-printed byte
                // on real hardware. This interpreter never buffers ahead
                // of the current byte, so there is nothing to cancel.
            }
            _ if is_control_range(byte) => {
                if state.upper_control_printable {
                    self.print_glyph(byte, surface, state);
                }
                // else: dropped silently (spec §7).
            }
            _ => self.print_glyph(byte, surface, state),
        }
    }

    /// Resolves `byte` to a glyph, draws it, and advances the cursor,
    /// wrapping via an implicit CR+LF on right-margin overflow (spec §3
    /// invariant, §4.5).
    fn print_glyph(&mut self, byte: u8, surface: &mut dyn DrawingSurface, state: &mut PrinterState) {
        let fp = fingerprint::fingerprint(state.typography.typeface, state.typography.proportional, state.user_defined_mode);
        let user_glyph = if state.user_defined_active {
            self.user_store.lookup(&fp, state.user_defined_mode, byte)
        } else {
            None
        };

        let ch = encoding::resolve_byte(byte, &state.character_tables, &self.registry, state.intl_charset, user_glyph);

        let resolved = state.typography.resolve(&self.fonts);
        let x = state.position.x.to_points();
        let y = state.position.y.to_points();
        surface.draw_text(ch, resolved.font, x, y, resolved.style);

        let advance_pts = if state.typography.proportional {
            self.fonts.advance_width(ch, resolved.font, state.typography.point_size) + state.typography.intercharacter_space
        } else {
            state.typography.fixed_advance_points()
        };

        self.draw_line_decorations(surface, state, x, y, advance_pts);

        let advance = Grid((advance_pts * (crate::units::SUBUNITS_PER_INCH as f32 / crate::units::POINTS_PER_INCH)) as i64);
        let target = state.position.x + advance;

        if target > state.page_margins.right {
            layout::carriage_return(state, surface);
            layout::line_feed(state, surface);
        } else {
            state.position.x = target;
        }
    }

    /// Draws underline/strikeout/overscore as line primitives after the
    /// glyph (spec §4.5). Thickness and vertical offsets are expressed as
    /// fractions of the current point size.
    fn draw_line_decorations(&self, surface: &mut dyn DrawingSurface, state: &PrinterState, x: f32, y: f32, advance_pts: f32) {
        let t = &state.typography;
        if !(t.underline || t.strikeout || t.overscore) {
            return;
        }
        let color = crate::surface::Cmyk::from_epson_palette(state.epson_color);
        let thickness = (t.point_size * 0.05).max(0.4);
        let mut line = |offset: f32| {
            surface.draw_rect(x, y + offset, advance_pts, thickness, color);
        };
        if t.underline {
            line(t.point_size * 0.15);
        }
        if t.strikeout {
            line(-t.point_size * 0.3);
        }
        if t.overscore {
            line(-t.point_size * 0.85);
        }
    }

    fn dispatch_esc(
        &mut self,
        reader: &mut impl Read,
        surface: &mut dyn DrawingSurface,
        state: &mut PrinterState,
        compressed: &mut Option<CompressedRasterDecoder>,
    ) -> Result<()> {
        use crate::commands::{character_tables, graphics_cmds, page_format, position, reset, style, user_defined};

        let mut sel = [0u8; 1];
        if read_best_effort(reader, &mut sel) < 1 {
            return Err(truncated(1, 0));
        }
        let selector = sel[0];

        match selector {
            b'@' => reset::reset(state, &self.registry, &self.default_table),

            b'(' => self.dispatch_paren(reader, surface, state)?,
            b'.' => self.dispatch_raster(reader, surface, state, compressed)?,
            b'*' => self.dispatch_bit_image(reader, surface, state)?,
            b'^' => self.dispatch_nine_pin(reader, surface, state)?,
            b'K' => self.dispatch_legacy_bit_image(reader, surface, state, 0)?,
            b'L' => self.dispatch_legacy_bit_image(reader, surface, state, 1)?,
            b'Y' => self.dispatch_legacy_bit_image(reader, surface, state, 2)?,
            b'Z' => self.dispatch_legacy_bit_image(reader, surface, state, 3)?,
            b'?' => {
                let mut buf = [0u8; 2];
                if read_best_effort(reader, &mut buf) < 2 {
                    return Err(truncated(2, 0));
                }
                graphics_cmds::reassign_density(state, buf[0], buf[1]);
            }
            b'&' => self.dispatch_user_defined(reader, state)?,
            b':' => self.dispatch_copy_rom(reader)?,
            b'%' => {
                let n = self.read_fixed::<1>(reader)?;
                user_defined::select_character_set(state, n[0]);
            }

            b'C' => self.dispatch_page_length_lines(reader, state)?,
            b'N' => {
                let n = self.read_fixed::<1>(reader)?;
                page_format::set_bottom_margin_lines(state, n[0]);
            }
            b'O' => page_format::cancel_bottom_margin(state),
            b'Q' => {
                let n = self.read_fixed::<1>(reader)?;
                page_format::set_right_margin_columns(state, n[0]);
            }
            b'l' => {
                let n = self.read_fixed::<1>(reader)?;
                page_format::set_left_margin_columns(state, n[0]);
            }
            b'$' => {
                let buf = self.read_fixed::<2>(reader)?;
                layout::absolute_horizontal_move(state, u16::from_le_bytes(buf) as u32);
            }
            b'\\' => {
                let buf = self.read_fixed::<2>(reader)?;
                layout::relative_horizontal_move(state, surface, i16::from_le_bytes(buf) as i32);
            }
            b'J' => {
                let n = self.read_fixed::<1>(reader)?;
                position::advance_vertical_180(state, surface, n[0]);
            }

            b'D' => self.dispatch_h_tabs(reader, state)?,
            b'B' => self.dispatch_v_tabs(reader, state)?,

            b'P' => style::select_pitch_10(state),
            b'M' => style::select_pitch_12(state),
            b'g' => style::select_pitch_15(state),
            b'X' => {
                let buf = self.read_fixed::<3>(reader)?;
                let half_points = u16::from_le_bytes([buf[1], buf[2]]);
                style::set_pitch_and_point(state, buf[0], half_points);
            }
            b'!' => {
                let n = self.read_fixed::<1>(reader)?;
                style::master_select(state, n[0]);
            }
            b'E' => style::bold_on(state),
            b'F' => style::bold_off(state),
            b'4' => style::italic_on(state),
            b'5' => style::italic_off(state),
            b'G' => style::double_strike_on(state),
            b'H' => style::double_strike_off(state),
            b'-' => {
                let n = self.read_fixed::<1>(reader)?;
                style::underline(state, n[0]);
            }
            b'S' => {
                let n = self.read_fixed::<1>(reader)?;
                style::super_or_subscript(state, n[0]);
            }
            b'T' => style::cancel_super_sub(state),
            b'W' => {
                let n = self.read_fixed::<1>(reader)?;
                style::double_width(state, n[0]);
            }
            b'w' => {
                let n = self.read_fixed::<1>(reader)?;
                style::double_height(state, n[0]);
            }
            b'p' => {
                let n = self.read_fixed::<1>(reader)?;
                style::proportional(state, n[0]);
            }
            b'r' => {
                let n = self.read_fixed::<1>(reader)?;
                style::select_color(state, n[0]);
            }
            b' ' => {
                let n = self.read_fixed::<1>(reader)?;
                style::set_intercharacter_space(state, n[0]);
            }

            // Documented ESC/P commands whose mechanics spec §1 excludes
            // (paper-out detector, unidirectional mode, cut-sheet feeder
            // control, low-speed mode): parameters are still consumed so
            // the byte stream stays aligned, but nothing in `PrinterState`
            // changes (spec §7 `:no_entry_sign:` treatment, same as the
            // `ESC :` ROM-copy half in `commands::user_defined`).
            b'U' | b'\x19' | b's' => {
                self.read_fixed::<1>(reader)?;
            }
            b'8' | b'9' => {}

            b't' => {
                let n = self.read_fixed::<1>(reader)?;
                character_tables::select_table(state, n[0]);
            }
            b'R' => {
                let n = self.read_fixed::<1>(reader)?;
                character_tables::select_country(state, n[0]);
            }
            b'6' => character_tables::enable_upper_control(state),
            b'7' => character_tables::disable_upper_control(state),
            b'I' => {
                let n = self.read_fixed::<1>(reader)?;
                character_tables::set_all_control_printable(state, n[0]);
            }
            b'm' => {
                let n = self.read_fixed::<1>(reader)?;
                character_tables::legacy_upper_control(state, n[0]);
            }

            _ => {
                log::warn!("unknown ESC selector {selector:#04x}, skipping");
            }
        }

        Ok(())
    }

    fn read_fixed<const N: usize>(&self, reader: &mut impl Read) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        if read_best_effort(reader, &mut buf) < N {
            return Err(truncated(N, 0));
        }
        Ok(buf)
    }

    /// `ESC ( <letter> nL nH data...`: the length-prefixed `ESC (` family
    /// (spec §4.1: page format, units, character tables, vertical
    /// position, graphics mode, three-line score).
    fn dispatch_paren(&mut self, reader: &mut impl Read, surface: &mut dyn DrawingSurface, state: &mut PrinterState) -> Result<()> {
        use crate::commands::{character_tables, graphics_cmds, page_format, style};

        let letter = self.read_fixed::<1>(reader)?[0];
        let len_buf = self.read_fixed::<2>(reader)?;
        let len = u16::from_le_bytes(len_buf) as usize;
        let mut data = vec![0u8; len];
        let got = read_best_effort(reader, &mut data);
        if got < len {
            return Err(truncated(len, got));
        }

        match letter {
            b'C' if data.len() >= 2 => {
                page_format::set_page_length_defined_unit(state, u16::from_le_bytes([data[0], data[1]]));
            }
            b'c' if data.len() >= 4 => {
                let top = u16::from_le_bytes([data[0], data[1]]);
                let bottom = u16::from_le_bytes([data[2], data[3]]);
                page_format::set_page_format(state, top, bottom);
            }
            b'U' if !data.is_empty() => {
                state.defined_unit = Grid(data[0] as i64);
            }
            b't' if data.len() >= 3 => {
                character_tables::assign_table(state, &self.registry, data[1], data[2]);
            }
            b'V' if data.len() >= 2 => {
                crate::commands::position::absolute_vertical(state, u16::from_le_bytes([data[0], data[1]]));
            }
            b'v' if data.len() >= 2 => {
                crate::commands::position::relative_vertical(
                    state,
                    surface,
                    i16::from_le_bytes([data[0], data[1]]),
                );
            }
            b'G' if !data.is_empty() => {
                graphics_cmds::select_graphics_mode(state, data[0]);
            }
            b'-' if data.len() >= 3 => {
                style::three_line_score(state, data[1], data[2]);
            }
            _ => {
                log::warn!("unknown or malformed ESC ( {} (len {}), ignoring", letter as char, len);
            }
        }

        Ok(())
    }

    fn dispatch_bit_image(&mut self, reader: &mut impl Read, surface: &mut dyn DrawingSurface, state: &mut PrinterState) -> Result<()> {
        let mode = self.read_fixed::<1>(reader)?[0];
        let len_buf = self.read_fixed::<2>(reader)?;
        let len = u16::from_le_bytes(len_buf) as usize;
        let mut data = vec![0u8; len];
        let got = read_best_effort(reader, &mut data);
        if got < len {
            return Err(truncated(len, got));
        }
        crate::commands::graphics_cmds::bit_image(state, surface, mode, &data);
        Ok(())
    }

    fn dispatch_legacy_bit_image(
        &mut self,
        reader: &mut impl Read,
        surface: &mut dyn DrawingSurface,
        state: &mut PrinterState,
        legend: u8,
    ) -> Result<()> {
        let len_buf = self.read_fixed::<2>(reader)?;
        let len = u16::from_le_bytes(len_buf) as usize;
        let mut data = vec![0u8; len];
        let got = read_best_effort(reader, &mut data);
        if got < len {
            return Err(truncated(len, got));
        }
        crate::commands::graphics_cmds::legacy_bit_image(state, surface, legend, &data);
        Ok(())
    }

    fn dispatch_nine_pin(&mut self, reader: &mut impl Read, surface: &mut dyn DrawingSurface, state: &mut PrinterState) -> Result<()> {
        let mode = self.read_fixed::<1>(reader)?[0];
        let len_buf = self.read_fixed::<2>(reader)?;
        let len = u16::from_le_bytes(len_buf) as usize;
        let mut data = vec![0u8; len];
        let got = read_best_effort(reader, &mut data);
        if got < len {
            return Err(truncated(len, got));
        }
        crate::commands::graphics_cmds::nine_pin(state, surface, mode, &data);
        Ok(())
    }

    /// `ESC . c v h m nL nH [data]`: `c` selects uncompressed (0/1) vs
    /// TIFF-compressed (2) raster. `nL nH` is the column count for
    /// uncompressed raster; for compressed raster it is read and discarded
    /// (reserved on real hardware) since the TIFF opcode stream is
    /// self-delimiting via `<EXIT>` (spec §4.3; this reading of the header
    /// is this crate's resolution of an ambiguity spec.md leaves to the
    /// original wire format, recorded in DESIGN.md).
    fn dispatch_raster(
        &mut self,
        reader: &mut impl Read,
        surface: &mut dyn DrawingSurface,
        state: &mut PrinterState,
        compressed: &mut Option<CompressedRasterDecoder>,
    ) -> Result<()> {
        let hdr = self.read_fixed::<4>(reader)?;
        let (c, v, h, m) = (hdr[0], hdr[1], hdr[2], hdr[3]);
        let col_buf = self.read_fixed::<2>(reader)?;
        let columns = u16::from_le_bytes(col_buf);

        match c {
            0 | 1 => {
                let bytes_per_row = (columns as usize + 7) / 8;
                let total = bytes_per_row * m as usize;
                let mut data = vec![0u8; total];
                let got = read_best_effort(reader, &mut data);
                if got < total {
                    return Err(truncated(total, got));
                }
                crate::commands::graphics_cmds::raster(state, surface, v, h, m, columns, &data);
            }
            2 => {
                state.graphics_mode = GraphicsMode::RasterCompressed;
                *compressed = Some(CompressedRasterDecoder::with_row_width(Grid(h as i64), Grid(v as i64), columns));
            }
            _ => {
                log::warn!("ESC . unknown raster subtype {c}, ignoring");
            }
        }

        Ok(())
    }

    fn dispatch_user_defined(&mut self, reader: &mut impl Read, state: &mut PrinterState) -> Result<()> {
        let mode = self.read_fixed::<1>(reader)?[0];
        let len_buf = self.read_fixed::<2>(reader)?;
        let len = u16::from_le_bytes(len_buf) as usize;
        let mut data = vec![0u8; len];
        let got = read_best_effort(reader, &mut data);
        if got < len {
            return Err(truncated(len, got));
        }
        state.user_defined_mode = mode;
        let fp = fingerprint::fingerprint(state.typography.typeface, state.typography.proportional, mode);
        crate::commands::user_defined::define_glyphs(state, &mut self.user_store, &fp, mode, &data);
        Ok(())
    }

    fn dispatch_copy_rom(&mut self, reader: &mut impl Read) -> Result<()> {
        let _mode = self.read_fixed::<1>(reader)?;
        let len_buf = self.read_fixed::<2>(reader)?;
        let len = u16::from_le_bytes(len_buf) as usize;
        let mut data = vec![0u8; len];
        let got = read_best_effort(reader, &mut data);
        if got < len {
            return Err(truncated(len, got));
        }
        crate::commands::user_defined::copy_rom_to_user_defined(data.first().copied().unwrap_or(0));
        Ok(())
    }

    fn dispatch_page_length_lines(&mut self, reader: &mut impl Read, state: &mut PrinterState) -> Result<()> {
        let first = self.read_fixed::<1>(reader)?[0];
        if first == 0 {
            let inches = self.read_fixed::<1>(reader)?[0];
            crate::commands::page_format::set_page_length_inches(state, inches.max(1));
        } else {
            crate::commands::page_format::set_page_length_lines(state, first);
        }
        Ok(())
    }

    fn dispatch_h_tabs(&mut self, reader: &mut impl Read, state: &mut PrinterState) -> Result<()> {
        let stops = self.read_nul_terminated(reader)?;
        layout::set_horizontal_tabs(state, &stops, state.typography.pitch_cpi);
        Ok(())
    }

    fn dispatch_v_tabs(&mut self, reader: &mut impl Read, state: &mut PrinterState) -> Result<()> {
        let stops = self.read_nul_terminated(reader)?;
        layout::set_vertical_tabs(state, &stops);
        Ok(())
    }

    /// Reads up to 32 bytes, stopping at (and consuming) a `0x00`
    /// terminator (spec §4.1, `ESC D`/`ESC B`).
    fn read_nul_terminated(&self, reader: &mut impl Read) -> Result<Vec<u8>> {
        let mut stops = Vec::new();
        loop {
            let mut b = [0u8; 1];
            if read_best_effort(reader, &mut b) < 1 {
                return Err(truncated(stops.len() + 1, stops.len()));
            }
            if b[0] == 0 {
                break;
            }
            stops.push(b[0]);
            if stops.len() >= 32 {
                break;
            }
        }
        Ok(stops)
    }
}
