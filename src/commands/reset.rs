//! `ESC @`: reinitialise the printer (spec §3 Lifecycle, §4.1).

use crate::encoding::EncodingRegistry;
use crate::state::PrinterState;

pub fn reset(state: &mut PrinterState, registry: &EncodingRegistry, default_table: &str) {
    state.reset(registry, default_table);
}
