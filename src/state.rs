//! `PrinterState`: the single mutable document being produced (spec §3).

use crate::encoding::{CharacterTables, EncodingRegistry};
use crate::typography::TypographyState;
use crate::units::{Grid, Position};

/// Page geometry: size and the boundaries of the printable area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paper {
    pub width: Grid,
    pub height: Grid,
    pub single_sheet: bool,
}

impl Paper {
    pub fn letter() -> Paper {
        Paper {
            width: Grid::from_inches(8) + Grid::from_units(1, 2),
            height: Grid::from_inches(11),
            single_sheet: true,
        }
    }

    /// Builds a `Paper` from an explicitly configured size (spec §6
    /// `page_size`), overriding the `letter()` default.
    pub fn new(width: Grid, height: Grid, single_sheet: bool) -> Paper {
        Paper { width, height, single_sheet }
    }
}

/// Margins of the printable area, in grid subunits from the page edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub top: Grid,
    pub bottom: Grid,
    pub left: Grid,
    pub right: Grid,
}

impl PageMargins {
    pub fn defaults_for(paper: &Paper) -> PageMargins {
        let half_inch = Grid::from_units(1, 2);
        PageMargins {
            top: half_inch,
            bottom: paper.height - half_inch,
            left: half_inch,
            right: paper.width - half_inch,
        }
    }

    /// Builds margins from the configured `[top, bottom, left, right]`
    /// widths (spec §6 `printable_area_margins_mm`), measured inward from
    /// each page edge.
    pub fn from_widths(paper: &Paper, widths: [Grid; 4]) -> PageMargins {
        PageMargins {
            top: widths[0],
            bottom: paper.height - widths[1],
            left: widths[2],
            right: paper.width - widths[3],
        }
    }
}

/// Printer-head density; affects the vertical-density tables graphics
/// decoding uses (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pins {
    Nine,
    TwentyFour,
    FortyEight,
    Nozzle,
}

/// Which graphics sub-protocol currently owns the byte stream (spec §3:
/// "exactly one `graphics_mode` is active at any moment").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicsMode {
    None,
    BitImage,
    NinePin,
    Raster,
    RasterCompressed,
}

/// How a decoded dot is rendered at the drawing-surface boundary.
pub use crate::surface::Renderer;

/// The document-wide mutable state a byte stream drives (spec §3).
pub struct PrinterState {
    pub paper: Paper,
    pub page_margins: PageMargins,
    pub position: Position,
    /// Vertical advance of one LF, 1/3600-inch subunits. Invariant: > 0.
    pub line_spacing: Grid,
    /// Unit used by absolute positioning commands (`ESC ( U`).
    pub defined_unit: Grid,
    pub h_tabs: Vec<Grid>,
    pub v_tabs: Vec<Grid>,
    pub typography: TypographyState,
    pub character_tables: CharacterTables,
    pub intl_charset: u8,
    pub upper_control_printable: bool,
    pub all_control_printable: bool,
    pub user_defined_active: bool,
    /// Definition-mode byte of the last `ESC &`, reused when looking up a
    /// glyph so the fingerprint used to define it matches the one used to
    /// read it back (spec §4.4, §6).
    pub user_defined_mode: u8,
    pub pins: Pins,
    pub graphics_mode: GraphicsMode,
    pub renderer: Renderer,
    pub automatic_linefeed: bool,
    pub epson_color: u8,
    /// Density modes `ESC K`/`ESC L`/`ESC Y`/`ESC Z` resolve to, in that
    /// order; reassignable by `ESC ?` (spec §4.1).
    pub remapped_density: [u8; 4],
}

impl PrinterState {
    pub fn new(registry: &EncodingRegistry, default_table: &str, pins: Pins, renderer: Renderer) -> PrinterState {
        let paper = Paper::letter();
        let page_margins = PageMargins::defaults_for(&paper);
        PrinterState {
            position: Position::new(page_margins.left, page_margins.top),
            paper,
            page_margins,
            line_spacing: Grid::from_units(1, 6),
            defined_unit: Grid::from_units(1, 60),
            h_tabs: default_h_tabs(),
            v_tabs: Vec::new(),
            typography: TypographyState::default(),
            character_tables: CharacterTables::with_default(registry, default_table),
            intl_charset: 0,
            upper_control_printable: false,
            all_control_printable: false,
            user_defined_active: false,
            user_defined_mode: 0,
            pins,
            graphics_mode: GraphicsMode::None,
            renderer,
            automatic_linefeed: false,
            epson_color: 0,
            remapped_density: [0, 1, 2, 3],
        }
    }

    /// Clamps `position` back inside the printable area (spec §3 invariant:
    /// vertical overflow triggers an implicit form feed elsewhere; this
    /// only handles the "margin moved under the cursor" case of §4.2).
    pub fn clamp_position_to_margins(&mut self) {
        self.position.x = self
            .position
            .x
            .clamp(self.page_margins.left, self.page_margins.right);
        self.position.y = self
            .position
            .y
            .clamp(self.page_margins.top, self.page_margins.bottom);
    }

    /// ESC @: reinitialise to configured defaults, but keep the current
    /// page open (spec §3 Lifecycle, §4.1 Reset).
    pub fn reset(&mut self, registry: &EncodingRegistry, default_table: &str) {
        let paper = self.paper;
        let page_margins = PageMargins::defaults_for(&paper);
        self.page_margins = page_margins;
        self.position = Position::new(page_margins.left, page_margins.top);
        self.line_spacing = Grid::from_units(1, 6);
        self.defined_unit = Grid::from_units(1, 60);
        self.h_tabs = default_h_tabs();
        self.v_tabs.clear();
        self.typography = TypographyState::default();
        self.character_tables = CharacterTables::with_default(registry, default_table);
        self.intl_charset = 0;
        self.upper_control_printable = false;
        self.all_control_printable = false;
        self.user_defined_active = false;
        self.user_defined_mode = 0;
        self.graphics_mode = GraphicsMode::None;
        self.automatic_linefeed = false;
        self.epson_color = 0;
        self.remapped_density = [0, 1, 2, 3];
    }

    /// Sets line spacing, rejecting a zero value silently (spec §3
    /// invariant: `line_spacing > 0` at all times).
    pub fn set_line_spacing(&mut self, spacing: Grid) {
        if spacing.0 > 0 {
            self.line_spacing = spacing;
        }
    }
}

fn default_h_tabs() -> Vec<Grid> {
    // Every 8 characters at 10 cpi, a conventional ESC/P default.
    (1..=10).map(|i| Grid::from_units(8 * i, 10)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_starts_at_top_left_margin() {
        let registry = EncodingRegistry::with_builtin_tables();
        let state = PrinterState::new(&registry, "PC437", Pins::TwentyFour, Renderer::Dots);
        assert_eq!(state.position.x, state.page_margins.left);
        assert_eq!(state.position.y, state.page_margins.top);
    }

    #[test]
    fn margins_from_widths_are_measured_inward_from_edges() {
        let paper = Paper::new(Grid::from_inches(8), Grid::from_inches(11), true);
        let margins = PageMargins::from_widths(&paper, [Grid::from_inches(1), Grid::from_inches(1), Grid(0), Grid(0)]);
        assert_eq!(margins.top, Grid::from_inches(1));
        assert_eq!(margins.bottom, Grid::from_inches(10));
        assert_eq!(margins.left, Grid(0));
        assert_eq!(margins.right, Grid::from_inches(8));
    }

    #[test]
    fn set_line_spacing_rejects_zero() {
        let registry = EncodingRegistry::with_builtin_tables();
        let mut state = PrinterState::new(&registry, "PC437", Pins::TwentyFour, Renderer::Dots);
        let before = state.line_spacing;
        state.set_line_spacing(Grid(0));
        assert_eq!(state.line_spacing, before);
    }

    #[test]
    fn reset_restores_defaults_but_keeps_paper() {
        let registry = EncodingRegistry::with_builtin_tables();
        let mut state = PrinterState::new(&registry, "PC437", Pins::TwentyFour, Renderer::Dots);
        state.intl_charset = 5;
        state.position.x = Grid(999_999);
        state.reset(&registry, "PC437");
        assert_eq!(state.intl_charset, 0);
        assert_eq!(state.position.x, state.page_margins.left);
    }
}
