//! Character-table assignment/selection and the handful of control-code
//! commands that affect how control bytes themselves are classified
//! (spec §4.1, §4.4).

use crate::encoding::EncodingRegistry;
use crate::state::PrinterState;

/// Numbering for the `d2` codepage-id byte of `ESC ( t`. spec.md is silent
/// on the exact numeric codes (they are printer-model-specific even on
/// real Epson hardware); this is the implementer's choice this crate
/// documents in DESIGN.md, picked so the spec.md §8 worked example ("assign
/// PC850 to a slot via id 3") holds.
const CODEPAGE_BY_ID: [&str; 6] = ["PC437", "PC865", "PC860", "PC850", "PC863", "ISO-8859-1"];

/// `ESC ( t nL nH d1 d2 d3`: assigns the codepage named by `codepage_id` to
/// table slot `slot`. Unknown slot or id: accepted, logged, no effect
/// (spec §7 recoverable-condition policy).
pub fn assign_table(state: &mut PrinterState, registry: &EncodingRegistry, slot: u8, codepage_id: u8) {
    let Some(&name) = CODEPAGE_BY_ID.get(codepage_id as usize) else {
        log::warn!("ESC ( t: unknown codepage id {codepage_id}, ignoring");
        return;
    };
    let Some(idx) = registry.by_name(name) else {
        log::warn!("ESC ( t: codepage {name} not in registry, ignoring");
        return;
    };
    state.character_tables.assign(slot, idx);
}

/// `ESC t n`: selects the active slot (0..=3).
pub fn select_table(state: &mut PrinterState, slot: u8) {
    state.character_tables.select(slot);
}

/// `ESC R n`: selects the NRC overlay country (0..=13, wrapping per
/// [`crate::encoding::nrc_overlay`]).
pub fn select_country(state: &mut PrinterState, country: u8) {
    state.intl_charset = country;
}

/// `ESC 6`: prints control codes 0x80-0x9F instead of acting on them.
pub fn enable_upper_control(state: &mut PrinterState) {
    state.upper_control_printable = true;
}

/// `ESC 7`: restores default handling of 0x80-0x9F.
pub fn disable_upper_control(state: &mut PrinterState) {
    state.upper_control_printable = false;
}

/// `ESC I n`: n=0 restores default control-code handling entirely, n!=0
/// makes every control code (0x00-0x1F and 0x80-0x9F, `ESC` excepted)
/// print as a glyph instead of acting.
pub fn set_all_control_printable(state: &mut PrinterState, n: u8) {
    state.all_control_printable = n != 0;
}

/// `ESC m n`: legacy alias some firmware routes to the same flag as
/// `ESC 6`/`ESC 7`; kept for the printers that emit it instead.
pub fn legacy_upper_control(state: &mut PrinterState, n: u8) {
    state.upper_control_printable = n != 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Pins;
    use crate::surface::Renderer;

    fn fresh_state() -> (PrinterState, EncodingRegistry) {
        let registry = EncodingRegistry::with_builtin_tables();
        let state = PrinterState::new(&registry, "PC437", Pins::TwentyFour, Renderer::Dots);
        (state, registry)
    }

    #[test]
    fn assign_table_id_3_is_pc850() {
        let (mut state, registry) = fresh_state();
        assign_table(&mut state, &registry, 1, 3);
        select_table(&mut state, 1);
        let idx = state.character_tables.active_index().unwrap();
        assert_eq!(registry.get(idx).unwrap().name, "PC850");
    }

    #[test]
    fn assign_table_unknown_id_is_ignored() {
        let (mut state, registry) = fresh_state();
        let before = state.character_tables.clone();
        assign_table(&mut state, &registry, 1, 99);
        assert_eq!(format!("{:?}", state.character_tables), format!("{:?}", before));
    }
}
