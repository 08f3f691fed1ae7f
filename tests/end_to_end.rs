//! End-to-end byte-stream scenarios (spec.md §8): each test feeds a
//! literal ESC/P byte sequence through [`Interpreter::run`] against a
//! [`RecordingSurface`] and asserts on the recorded draw calls, not on any
//! particular PDF encoding.

use std::io::Cursor;

use escp2pdf::encoding::EncodingRegistry;
use escp2pdf::state::{Pins, PrinterState};
use escp2pdf::surface::Renderer;
use escp2pdf::testutil::{MemoryUserDefinedStore, Recorded, RecordingSurface, StubFontResolver};
use escp2pdf::Interpreter;

fn fresh() -> (EncodingRegistry, PrinterState) {
    let registry = EncodingRegistry::with_builtin_tables();
    let state = PrinterState::new(&registry, "PC437", Pins::TwentyFour, Renderer::Dots);
    (registry, state)
}

fn run(bytes: &[u8]) -> (PrinterState, RecordingSurface) {
    let (registry, mut state) = fresh();
    let mut interpreter = Interpreter::new(registry, "PC437", StubFontResolver, MemoryUserDefinedStore::default());
    let mut surface = RecordingSurface::default();
    interpreter
        .run(Cursor::new(bytes.to_vec()), &mut surface, &mut state)
        .expect("well-formed stream should not error");
    (state, surface)
}

/// Scenario 1: `b"Hello\r\n"` with defaults -> five glyph draws at
/// advancing x, then a line feed (y advances, x resets to left margin).
#[test]
fn hello_crlf_draws_five_glyphs_then_wraps_to_left_margin() {
    let (state, surface) = run(b"Hello\r\n");
    assert_eq!(surface.glyphs(), "Hello");

    let xs: Vec<f32> = surface
        .events
        .iter()
        .filter_map(|e| match e {
            Recorded::Text { x, .. } => Some(*x),
            _ => None,
        })
        .collect();
    assert_eq!(xs.len(), 5);
    for pair in xs.windows(2) {
        assert!(pair[1] > pair[0], "x should strictly advance across glyphs");
    }

    assert_eq!(state.position.x, state.page_margins.left);
    assert!(state.position.y > state.page_margins.top);
}

/// Scenario 2: reset, select France NRC, print `A` (unchanged) and the
/// byte `0x60` (backtick), which the France overlay replaces with `à`.
#[test]
fn reset_then_france_overlay_maps_backtick_to_a_grave() {
    let mut bytes = vec![0x1B, b'@', 0x1B, b'R', 0x01];
    bytes.extend_from_slice(b"A");
    bytes.push(0x60);
    bytes.extend_from_slice(b"\r\n");

    let (_state, surface) = run(&bytes);
    assert_eq!(surface.glyphs(), "Aà");
}

/// Scenario 3: `ESC * 1 3 0 <24 data bytes>` with every bit set draws 24
/// dots in a 3-column strip and advances x by 3 columns at 120 dpi.
#[test]
fn bit_image_mode_1_three_columns_all_dots_set() {
    let mut bytes = vec![0x1B, b'*', 1, 3, 0];
    bytes.extend(std::iter::repeat(0xFFu8).take(3));

    let (_registry, start_state) = fresh();
    let start_x = start_state.position.x;

    let (state, surface) = run(&bytes);
    assert_eq!(surface.dot_count(), 24);

    let expected_advance = escp2pdf::units::Grid::from_units(3, 120);
    assert_eq!(state.position.x, start_x + expected_advance);
}

/// Scenario 4: enter compressed raster, transfer a 2-byte literal
/// (`0xAA 0xAA`), then `<EXIT>` (`0xE5`): verifies the `0x00` opcode path
/// and a clean mode exit back to `GraphicsMode::None`.
#[test]
fn compressed_raster_literal_then_exit() {
    let bytes: Vec<u8> = vec![
        0x1B, b'.', 2, 0x14, 0x14, 1, 2, 0, // ESC . 2 v h m nL nH
        0x01, 0xAA, 0xAA, // <XFER> literal, n=1 -> 2 bytes
        0xE5, // <EXIT>
    ];
    let (state, surface) = run(&bytes);
    assert_eq!(surface.dot_count(), 8);
    assert_eq!(state.graphics_mode, escp2pdf::state::GraphicsMode::None);
}

/// Scenario 5: `ESC E` (bold on) draws "bold", `ESC F` (bold off) draws
/// "plain" right after, with `typography.bold` flipped back off by the
/// time the second run finishes.
#[test]
fn bold_on_then_off_changes_typography_state_mid_stream() {
    let mut bytes = vec![0x1B, b'E'];
    bytes.extend_from_slice(b"bold");
    bytes.push(0x1B);
    bytes.push(b'F');
    bytes.extend_from_slice(b"plain");

    let (state, surface) = run(&bytes);
    assert_eq!(surface.glyphs(), "boldplain");
    assert!(!state.typography.bold);
}

/// Scenario 6: assign PC850 to slot 1, select slot 1, print `0x80`;
/// expected glyph is `Ç` (PC850 codepoint 0x80 -> U+00C7).
#[test]
fn assign_pc850_to_slot_then_select_and_print() {
    let bytes: Vec<u8> = vec![
        0x1B, b'(', b't', 3, 0, 0, 1, 3, // ESC ( t nL nH d1=0 d2=slot(1) d3=codepage_id(3=PC850)
        0x1B, b't', 1, // ESC t 1
        0x80,
    ];
    let (_state, surface) = run(&bytes);
    assert_eq!(surface.glyphs(), "Ç");
}

/// Quantified invariant (spec §8): the number of `new_page` calls to the
/// surface equals the number of form feeds (explicit or implicit). The
/// "+1" the invariant states is the page already open before the first
/// form feed — a property of the real `DrawingSurface`, which opens its
/// first page outside the interpreter's control (spec §1 lifecycle); the
/// recording test double here starts with no page open at all, so it
/// only accumulates the calls the dispatcher itself issues.
#[test]
fn new_page_calls_equal_form_feed_count() {
    // Two explicit form feeds, default state otherwise.
    let bytes = b"a\x0cb\x0cc";
    let (_state, surface) = run(bytes);
    assert_eq!(surface.new_page_calls, 2);
}

/// Boundary behaviour (spec §8): `ESC D` with an empty list (just a `0x00`
/// terminator) clears all horizontal tabs.
#[test]
fn esc_d_empty_list_clears_horizontal_tabs() {
    let bytes = vec![0x1B, b'D', 0x00];
    let (state, _surface) = run(&bytes);
    assert!(state.h_tabs.is_empty());
}

/// Boundary behaviour (spec §8): `ESC Q` with left margin >= right margin
/// is rejected and margins are left unchanged.
#[test]
fn esc_q_left_ge_right_is_rejected() {
    let (registry, mut state) = fresh();
    let before = state.page_margins;
    // Push the right margin in to 1 column, then try to push it further
    // left of where the left margin already sits.
    let bytes = vec![0x1B, b'Q', 0u8];
    let mut interpreter = Interpreter::new(registry, "PC437", StubFontResolver, MemoryUserDefinedStore::default());
    let mut surface = RecordingSurface::default();
    interpreter
        .run(Cursor::new(bytes), &mut surface, &mut state)
        .unwrap();
    assert_eq!(state.page_margins, before);
}

/// Idempotence of ESC @ (spec §8): running a sequence, then ESC @, then
/// the same sequence again yields the same typography/encoding state as
/// running it once from a fresh interpreter (position/page advance is
/// excluded from the comparison, per spec.md's own carve-out).
#[test]
fn esc_at_reset_is_idempotent_for_non_positional_state() {
    let prefix = b"\x1bE\x1b!\x27"; // bold on, then a master-select mix
    let (state_once, _s1) = run(prefix);

    let mut doubled = Vec::new();
    doubled.extend_from_slice(prefix);
    doubled.extend_from_slice(b"\x1b@");
    doubled.extend_from_slice(prefix);
    let (state_twice, _s2) = run(&doubled);

    assert_eq!(state_once.typography.bold, state_twice.typography.bold);
    assert_eq!(state_once.typography.condensed, state_twice.typography.condensed);
    assert_eq!(state_once.typography.proportional, state_twice.typography.proportional);
    assert_eq!(state_once.intl_charset, state_twice.intl_charset);
}

/// Stream truncation (spec §7): a declared parameter block longer than
/// the remaining bytes is a fatal error.
#[test]
fn truncated_parameter_block_is_fatal() {
    let (registry, mut state) = fresh();
    let mut interpreter = Interpreter::new(registry, "PC437", StubFontResolver, MemoryUserDefinedStore::default());
    let mut surface = RecordingSurface::default();
    // ESC * 1 nL=10 nH=0 declares 10 data bytes but supplies none.
    let bytes = vec![0x1B, b'*', 1, 10, 0];
    let result = interpreter.run(Cursor::new(bytes), &mut surface, &mut state);
    assert!(result.is_err());
    assert!(surface.finalized, "a fatal error still finalizes the surface");
}
