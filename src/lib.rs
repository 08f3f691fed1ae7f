/*  This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU General Public License as published by
    the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU General Public License for more details.

    You should have received a copy of the GNU General Public License
    along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! An interpreter for the Epson ESC/P and ESC/P2 printer command
//! languages, rendering a legacy dot-matrix/inkjet byte stream to a
//! vector PDF in which text remains selectable.
//!
//! # Usage
//! Build an [`encoding::EncodingRegistry`], a [`state::PrinterState`], and
//! an [`dispatch::Interpreter`] over your own [`surface::DrawingSurface`],
//! [`surface::FontResolver`], and [`surface::UserDefinedStore`]
//! implementations, then call [`dispatch::Interpreter::run`] with a byte
//! source. The `escp2pdf` binary in this crate wires these to a real PDF
//! writer and a configuration file; see [`config`] and [`pdf_surface`]
//! (behind the `pdf` feature).
//!
//! This crate implements the command-stream interpreter only: the
//! dispatcher, the printer state machine, the layout engine, and the two
//! specialised decoders (graphics, encoding). The drawing surface, the
//! font resolver, and the user-defined-character persistence layer are
//! external collaborators the caller supplies.

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod encoding;
pub mod error;
pub mod fingerprint;
pub mod graphics;
pub mod layout;
pub mod state;
pub mod surface;
pub mod typography;
pub mod units;
pub mod user_store;

#[cfg(feature = "pdf")]
pub mod pdf_surface;

#[cfg(any(test, feature = "test-util"))]
pub mod testutil;

pub use dispatch::Interpreter;
pub use error::{PrinterError, Result};
pub use state::PrinterState;
