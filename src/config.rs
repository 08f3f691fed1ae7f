//! Configuration-file loading (spec §6): the INI-style file that supplies
//! defaults for page geometry, fonts, and the ambient options the CLI
//! doesn't override. Parsed with the `ini` crate, matching the
//! section/key=value shape the original tool's configuration file uses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ini::Ini;
use serde::{Deserialize, Serialize};

use crate::state::Pins;
use crate::surface::Renderer;
use crate::units::Grid;

/// A named page size, in points (1/72 inch), portrait orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    fn landscape(self) -> PageSize {
        PageSize { width_pt: self.height_pt, height_pt: self.width_pt }
    }
}

/// Resolves a page-size alias (spec §6: "A0-A10, B0-B10, C0-C10, LETTER,
/// LEGAL, TABLOID, LEDGER", each with an `L-` landscape prefix) or a
/// literal `W,H` pair in millimetres.
pub fn resolve_page_size(spec: &str) -> Option<PageSize> {
    let (landscape, name) = match spec.strip_prefix("L-") {
        Some(rest) => (true, rest),
        None => (false, spec),
    };

    let mm = |w: f32, h: f32| PageSize { width_pt: w * 72.0 / 25.4, height_pt: h * 72.0 / 25.4 };

    let base = match name.to_ascii_uppercase().as_str() {
        "A0" => mm(841.0, 1189.0),
        "A1" => mm(594.0, 841.0),
        "A2" => mm(420.0, 594.0),
        "A3" => mm(297.0, 420.0),
        "A4" => mm(210.0, 297.0),
        "A5" => mm(148.0, 210.0),
        "A6" => mm(105.0, 148.0),
        "A7" => mm(74.0, 105.0),
        "A8" => mm(52.0, 74.0),
        "A9" => mm(37.0, 52.0),
        "A10" => mm(26.0, 37.0),
        "B0" => mm(1000.0, 1414.0),
        "B1" => mm(707.0, 1000.0),
        "B2" => mm(500.0, 707.0),
        "B3" => mm(353.0, 500.0),
        "B4" => mm(250.0, 353.0),
        "B5" => mm(176.0, 250.0),
        "B6" => mm(125.0, 176.0),
        "B7" => mm(88.0, 125.0),
        "B8" => mm(62.0, 88.0),
        "B9" => mm(44.0, 62.0),
        "B10" => mm(31.0, 44.0),
        "C0" => mm(917.0, 1297.0),
        "C1" => mm(648.0, 917.0),
        "C2" => mm(458.0, 648.0),
        "C3" => mm(324.0, 458.0),
        "C4" => mm(229.0, 324.0),
        "C5" => mm(162.0, 229.0),
        "C6" => mm(114.0, 162.0),
        "C7" => mm(81.0, 114.0),
        "C8" => mm(57.0, 81.0),
        "C9" => mm(40.0, 57.0),
        "C10" => mm(28.0, 40.0),
        "LETTER" => PageSize { width_pt: 8.5 * 72.0, height_pt: 11.0 * 72.0 },
        "LEGAL" => PageSize { width_pt: 8.5 * 72.0, height_pt: 14.0 * 72.0 },
        "TABLOID" => PageSize { width_pt: 11.0 * 72.0, height_pt: 17.0 * 72.0 },
        "LEDGER" => PageSize { width_pt: 17.0 * 72.0, height_pt: 11.0 * 72.0 },
        _ => {
            let (w, h) = name.split_once(',')?;
            let w: f32 = w.trim().parse().ok()?;
            let h: f32 = h.trim().parse().ok()?;
            mm(w, h)
        }
    };

    Some(if landscape { base.landscape() } else { base })
}

/// `condensed_fallback` (spec §6): whether condensed falls back to a
/// synthetic horizontal squeeze when no condensed font variant exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CondensedFallback {
    #[default]
    Auto,
    Yes,
}

/// `[misc]` (spec §6).
#[derive(Debug, Clone)]
pub struct MiscConfig {
    pub loglevel: String,
    pub default_font_path: Option<PathBuf>,
    pub pins: Pins,
    pub printable_area_margins_mm: [f32; 4],
    pub page_size: String,
    pub single_sheets: bool,
    pub automatic_linefeed: bool,
    pub renderer: Renderer,
    pub condensed_fallback: CondensedFallback,
}

impl Default for MiscConfig {
    fn default() -> Self {
        MiscConfig {
            loglevel: "warning".to_string(),
            default_font_path: None,
            pins: Pins::TwentyFour,
            printable_area_margins_mm: [4.6, 4.6, 3.0, 3.0],
            page_size: "LETTER".to_string(),
            single_sheets: true,
            automatic_linefeed: false,
            renderer: Renderer::Dots,
            condensed_fallback: CondensedFallback::Auto,
        }
    }
}

/// `[UserDefinedCharacters]` (spec §6).
#[derive(Debug, Clone, Default)]
pub struct UserDefinedCharactersConfig {
    pub database_filepath: Option<PathBuf>,
    pub images_path: Option<PathBuf>,
}

/// One `[Roman]`/`[Sans serif]`/... typeface section (spec §6).
#[derive(Debug, Clone, Default)]
pub struct TypefaceConfig {
    pub path: Option<PathBuf>,
    pub fixed: Option<String>,
    pub proportional: Option<String>,
}

/// The fully parsed and validated configuration file (spec §6). `Roman`
/// and `Sans serif` are mandatory per spec.md; [`Config::load`] falls back
/// to embedded Courier/Times identifiers (spec §7: "Missing font:
/// substitute Courier or Times") when either is absent, logging at `info`.
#[derive(Debug, Clone)]
pub struct Config {
    pub misc: MiscConfig,
    pub user_defined_characters: UserDefinedCharactersConfig,
    pub typefaces: HashMap<String, TypefaceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let mut typefaces = HashMap::new();
        typefaces.insert("Roman".to_string(), TypefaceConfig::default());
        typefaces.insert("Sans serif".to_string(), TypefaceConfig::default());
        Config {
            misc: MiscConfig::default(),
            user_defined_characters: UserDefinedCharactersConfig::default(),
            typefaces,
        }
    }
}

impl Config {
    /// Loads and validates a configuration file (spec §6). Missing
    /// mandatory typeface sections are not fatal (spec §7 reserves fatal
    /// errors for unreadable input/output and unknown encodings); they
    /// fall back to the embedded defaults and are logged at `info`.
    pub fn load(path: &Path) -> std::io::Result<Config> {
        let ini = Ini::load_from_file(path).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Config::from_ini(&ini))
    }

    fn from_ini(ini: &Ini) -> Config {
        let mut config = Config::default();

        if let Some(misc) = ini.section(Some("misc")) {
            if let Some(v) = misc.get("loglevel") {
                config.misc.loglevel = v.to_string();
            }
            if let Some(v) = misc.get("default_font_path") {
                config.misc.default_font_path = Some(PathBuf::from(v));
            }
            if let Some(v) = misc.get("pins") {
                config.misc.pins = parse_pins(v).unwrap_or(config.misc.pins);
            }
            if let Some(v) = misc.get("printable_area_margins_mm") {
                if let Some(parsed) = parse_four_floats(v) {
                    config.misc.printable_area_margins_mm = parsed;
                }
            }
            if let Some(v) = misc.get("page_size") {
                config.misc.page_size = v.to_string();
            }
            if let Some(v) = misc.get("single_sheets") {
                config.misc.single_sheets = parse_bool(v).unwrap_or(config.misc.single_sheets);
            }
            if let Some(v) = misc.get("automatic_linefeed") {
                config.misc.automatic_linefeed = parse_bool(v).unwrap_or(config.misc.automatic_linefeed);
            }
            if let Some(v) = misc.get("renderer") {
                config.misc.renderer = match v.to_ascii_lowercase().as_str() {
                    "rectangles" => Renderer::Rectangles,
                    _ => Renderer::Dots,
                };
            }
            if let Some(v) = misc.get("condensed_fallback") {
                config.misc.condensed_fallback = match v.to_ascii_lowercase().as_str() {
                    "yes" => CondensedFallback::Yes,
                    _ => CondensedFallback::Auto,
                };
            }
        }

        if let Some(udc) = ini.section(Some("UserDefinedCharacters")) {
            config.user_defined_characters.database_filepath = udc.get("database_filepath").map(PathBuf::from);
            config.user_defined_characters.images_path = udc.get("images_path").map(PathBuf::from);
        }

        for (name, props) in ini.iter() {
            let Some(name) = name else { continue };
            let name = name.as_str();
            if name == "misc" || name == "UserDefinedCharacters" {
                continue;
            }
            let typeface = TypefaceConfig {
                path: props.get("path").map(PathBuf::from),
                fixed: props.get("fixed").map(str::to_string),
                proportional: props.get("proportional").map(str::to_string),
            };
            config.typefaces.insert(name.to_string(), typeface);
        }

        for mandatory in ["Roman", "Sans serif"] {
            if !config.typefaces.contains_key(mandatory) {
                log::info!("config: [{mandatory}] section missing, falling back to embedded Courier/Times");
                config.typefaces.insert(mandatory.to_string(), TypefaceConfig::default());
            }
        }

        config
    }

    /// The printable-area margins, converted from millimetres to grid
    /// subunits, in `[top, bottom, left, right]` order matching spec §6.
    pub fn margins_grid(&self) -> [Grid; 4] {
        self.misc.printable_area_margins_mm.map(|mm| Grid((mm / 25.4 * crate::units::SUBUNITS_PER_INCH as f32) as i64))
    }
}

fn parse_pins(v: &str) -> Option<Pins> {
    match v.trim() {
        "9" => Some(Pins::Nine),
        "24" => Some(Pins::TwentyFour),
        "48" => Some(Pins::FortyEight),
        "unset" => Some(Pins::Nozzle),
        _ => None,
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_four_floats(v: &str) -> Option<[f32; 4]> {
    let parts: Vec<f32> = v.split(',').map(|p| p.trim().parse().ok()).collect::<Option<_>>()?;
    parts.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_is_8_5_by_11_inches() {
        let size = resolve_page_size("LETTER").unwrap();
        assert!((size.width_pt - 8.5 * 72.0).abs() < 0.01);
        assert!((size.height_pt - 11.0 * 72.0).abs() < 0.01);
    }

    #[test]
    fn landscape_prefix_swaps_dimensions() {
        let portrait = resolve_page_size("A4").unwrap();
        let landscape = resolve_page_size("L-A4").unwrap();
        assert_eq!(portrait.width_pt, landscape.height_pt);
        assert_eq!(portrait.height_pt, landscape.width_pt);
    }

    #[test]
    fn literal_mm_pair_is_accepted() {
        let size = resolve_page_size("100,200").unwrap();
        assert!((size.width_pt - 100.0 / 25.4 * 72.0).abs() < 0.01);
    }

    #[test]
    fn unknown_alias_is_none() {
        assert!(resolve_page_size("NOT_A_SIZE").is_none());
    }

    #[test]
    fn default_config_has_mandatory_typefaces() {
        let config = Config::default();
        assert!(config.typefaces.contains_key("Roman"));
        assert!(config.typefaces.contains_key("Sans serif"));
    }

    #[test]
    fn parses_misc_section_from_ini_text() {
        let ini = Ini::load_from_str(
            "[misc]\npins = 48\nrenderer = rectangles\nsingle_sheets = no\nprintable_area_margins_mm = 1,2,3,4\n",
        )
        .unwrap();
        let config = Config::from_ini(&ini);
        assert_eq!(config.misc.pins, Pins::FortyEight);
        assert_eq!(config.misc.renderer, Renderer::Rectangles);
        assert!(!config.misc.single_sheets);
        assert_eq!(config.misc.printable_area_margins_mm, [1.0, 2.0, 3.0, 4.0]);
    }
}
