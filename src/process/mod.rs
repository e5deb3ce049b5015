//! CSV → Arrow → bind-ready rows.

pub mod convert;
pub mod date_parser;
pub mod reader;
pub mod transform;
pub mod utils;
