//! User-defined character commands: `ESC %`, `ESC &`, `ESC :` (spec §4.1,
//! §4.4).

use crate::state::{Pins, PrinterState};
use crate::surface::{UserDefinedStore, UserGlyphBitmap};

/// `ESC % n`: n=0 selects the ROM character set, n!=0 the user-defined set.
pub fn select_character_set(state: &mut PrinterState, n: u8) {
    state.user_defined_active = n != 0;
}

/// `ESC : 0 d1 d2`: copies a ROM table into the user-defined area on real
/// hardware. A vector renderer has no ROM glyph bitmaps to copy from, so
/// this is one of the commands spec §4.1 marks as accepted but producing
/// no visible effect; logged at debug so a trace still shows it was seen.
pub fn copy_rom_to_user_defined(codepage_id: u8) {
    log::debug!("ESC : accepted for codepage id {codepage_id}, no visual effect in this renderer");
}

/// `ESC & mode first last data...`: defines glyphs `first..=last` from
/// `data`. Per code: one width byte, then `width * bytes_per_column` rows
/// of column data (`bytes_per_column` follows [`Pins`], matching the
/// bit-image density convention spec §4.3 uses for the same printer head).
/// Truncated/malformed trailing entries are dropped silently (spec §7).
/// `mode` is the ESC & definition-mode byte, carried into the mapping
/// file's `"<fingerprint>_<mode>"` key alongside the active proportional
/// flag (spec §6).
pub fn define_glyphs(
    state: &PrinterState,
    store: &mut dyn UserDefinedStore,
    fingerprint: &str,
    mode: u8,
    data: &[u8],
) {
    if data.len() < 2 {
        return;
    }
    let first = data[0];
    let last = data[1];
    let bytes_per_column: usize = match state.pins {
        Pins::Nine => 1,
        Pins::TwentyFour | Pins::Nozzle => 3,
        Pins::FortyEight => 6,
    };
    let mut offset = 2;
    let mut code = first;
    loop {
        if offset >= data.len() {
            break;
        }
        let width = data[offset] as usize;
        offset += 1;
        let needed = width * bytes_per_column;
        if offset + needed > data.len() {
            break;
        }
        let rows = data[offset..offset + needed].to_vec();
        offset += needed;
        store.record(
            fingerprint,
            mode,
            state.typography.proportional,
            code,
            &UserGlyphBitmap {
                width: width as u16,
                height: (bytes_per_column * 8) as u16,
                rows,
            },
        );
        if code == last {
            break;
        }
        code = code.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingRegistry;
    use crate::surface::Renderer;
    use crate::testutil::MemoryUserDefinedStore;

    #[test]
    fn define_glyphs_records_each_code_in_range() {
        let registry = EncodingRegistry::with_builtin_tables();
        let state = PrinterState::new(&registry, "PC437", Pins::Nine, Renderer::Dots);
        let mut store = MemoryUserDefinedStore::default();
        // codes 65..=66, width 1, 1 byte/column -> 1 data byte each.
        let data = vec![65u8, 66, 1, 0xFF, 1, 0x0F];
        define_glyphs(&state, &mut store, "fp", 0, &data);
        assert_eq!(store.recorded.len(), 2);
        assert_eq!(store.recorded[0].3, 65);
        assert_eq!(store.recorded[1].3, 66);
    }

    #[test]
    fn define_glyphs_drops_truncated_trailing_entry() {
        let registry = EncodingRegistry::with_builtin_tables();
        let state = PrinterState::new(&registry, "PC437", Pins::Nine, Renderer::Dots);
        let mut store = MemoryUserDefinedStore::default();
        let data = vec![65u8, 66, 1, 0xFF, 2]; // second glyph declares width 2 but has 0 bytes
        define_glyphs(&state, &mut store, "fp", 0, &data);
        assert_eq!(store.recorded.len(), 1);
    }
}
