//! Thin CLI wiring the library to a real input stream, configuration file,
//! and PDF writer (spec §6). The binary owns no ESC/P semantics itself; it
//! only resolves the external collaborators spec.md names (drawing
//! surface, font resolver, user-defined-character store) and hands them to
//! [`escp2pdf::Interpreter::run`].

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;

use escp2pdf::config::Config;
use escp2pdf::encoding::EncodingRegistry;
use escp2pdf::pdf_surface::{PdfDrawingSurface, PdfFontRegistry, PdfFontResolver};
use escp2pdf::state::{Paper, PageMargins, Pins, PrinterState};
use escp2pdf::user_store::JsonUserDefinedStore;
use escp2pdf::PrinterError;

/// An interpreter for the Epson ESC/P and ESC/P2 printer command
/// languages, rendering a legacy print job to a vector PDF.
#[derive(Parser, Debug)]
#[command(name = "escp2pdf", version, about)]
struct Args {
    /// Input ESC/P byte stream, or `-` for stdin.
    input: String,

    /// Output PDF path, or `-` for stdout.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: String,

    /// Configuration file (spec §6).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Printer head density, overriding the configuration file.
    #[arg(long = "pins", value_parser = ["9", "24", "48", "unset"])]
    pins: Option<String>,

    #[arg(long = "single_sheets", overrides_with = "no_single_sheets")]
    single_sheets: bool,

    #[arg(long = "no_single_sheets")]
    no_single_sheets: bool,

    /// User-defined character mapping file, overriding
    /// `[UserDefinedCharacters] database_filepath`.
    #[arg(short = 'd', long = "db")]
    db: Option<PathBuf>,

    /// Increase log verbosity; repeatable.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_pins(v: &str) -> Pins {
    match v {
        "9" => Pins::Nine,
        "24" => Pins::TwentyFour,
        "48" => Pins::FortyEight,
        _ => Pins::Nozzle,
    }
}

fn open_input(path: &str) -> io::Result<Box<dyn Read>> {
    if path == "-" {
        Ok(Box::new(io::stdin()))
    } else {
        Ok(Box::new(File::open(path)?))
    }
}

fn write_output(path: &str, bytes: &[u8]) -> io::Result<()> {
    if path == "-" {
        io::stdout().write_all(bytes)
    } else {
        std::fs::write(path, bytes)
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = match &args.config {
        Some(path) => Config::load(path).map_err(|e| format!("unreadable config {path:?}: {e}"))?,
        None => Config::default(),
    };

    if let Some(pins) = &args.pins {
        config.misc.pins = match pins.as_str() {
            "9" => Pins::Nine,
            "24" => Pins::TwentyFour,
            "48" => Pins::FortyEight,
            _ => Pins::Nozzle,
        };
    }
    if args.no_single_sheets {
        config.misc.single_sheets = false;
    } else if args.single_sheets {
        config.misc.single_sheets = true;
    }

    let pins = match args.pins.as_deref() {
        Some(v) => parse_pins(v),
        None => config.misc.pins,
    };

    let encoding_registry = EncodingRegistry::with_builtin_tables();
    let default_table = encoding_registry
        .by_name("PC437")
        .map(|_| "PC437")
        .ok_or_else(|| "builtin encoding registry missing PC437".to_string())?;

    let renderer = config.misc.renderer;
    let mut state = PrinterState::new(&encoding_registry, default_table, pins, renderer);

    let page_size = escp2pdf::config::resolve_page_size(&config.misc.page_size)
        .ok_or_else(|| format!("unknown page_size: {}", config.misc.page_size))?;
    let width = escp2pdf::units::Grid((page_size.width_pt / 72.0 * escp2pdf::units::SUBUNITS_PER_INCH as f32) as i64);
    let height = escp2pdf::units::Grid((page_size.height_pt / 72.0 * escp2pdf::units::SUBUNITS_PER_INCH as f32) as i64);
    state.paper = Paper::new(width, height, config.misc.single_sheets);
    state.page_margins = PageMargins::from_widths(&state.paper, config.margins_grid());
    state.position = escp2pdf::units::Position::new(state.page_margins.left, state.page_margins.top);
    state.automatic_linefeed = config.misc.automatic_linefeed;

    let db_path = args
        .db
        .clone()
        .or_else(|| config.user_defined_characters.database_filepath.clone())
        .unwrap_or_else(|| PathBuf::from("userdef.json"));
    let mut user_store = JsonUserDefinedStore::open(db_path, config.user_defined_characters.images_path.clone())
        .map_err(|e| format!("could not open user-defined mapping file: {e}"))?;

    let mut doc = printpdf::PdfDocument::new("escp2pdf output");
    let font_registry = PdfFontRegistry::load(&mut doc, &config).map_err(|e| format!("font loading failed: {e}"))?;
    let font_registry = Rc::new(font_registry);
    let fonts = PdfFontResolver::new(Rc::clone(&font_registry));
    let mut surface = PdfDrawingSurface::new(doc, font_registry, page_size.width_pt, page_size.height_pt);

    let mut input = open_input(&args.input).map_err(|e| format!("unreadable input {}: {e}", args.input))?;
    let mut interpreter = escp2pdf::Interpreter::new(encoding_registry, default_table, fonts, &mut user_store);

    let result = interpreter.run(&mut input, &mut surface, &mut state);

    if let Err(e) = user_store.flush() {
        log::warn!("could not persist user-defined mapping file: {e}");
    }

    match result {
        Ok(()) => {}
        Err(PrinterError::StreamTruncation { declared, consumed }) => {
            return Err(format!("stream truncated after {consumed} of {declared} declared bytes"));
        }
        Err(PrinterError::MissingEncoding(name)) => {
            return Err(format!("unknown character encoding table: {name}"));
        }
        Err(PrinterError::UnreadableInput(e)) => return Err(format!("unreadable input: {e}")),
        Err(PrinterError::UnwritableOutput(e)) => return Err(format!("unwritable output: {e}")),
    }

    let bytes = surface.bytes.take().ok_or_else(|| "surface produced no output".to_string())?;
    write_output(&args.output, &bytes).map_err(|e| format!("unwritable output {}: {e}", args.output))?;

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("escp2pdf: {msg}");
            ExitCode::FAILURE
        }
    }
}
