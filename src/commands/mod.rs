//! Command handlers, grouped the way spec.md §4.1 groups them. Each module
//! is a thin translation from parsed command parameters to mutations of
//! [`crate::state::PrinterState`]; the actual byte-level parsing lives in
//! [`crate::dispatch`].

pub mod character_tables;
pub mod graphics_cmds;
pub mod page_format;
pub mod position;
pub mod reset;
pub mod style;
pub mod user_defined;
