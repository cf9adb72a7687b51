//! A small INI dialect with typed sections and helpful error reports.

pub mod error;
pub mod gen;
pub mod parse;
pub mod scanner;
mod value;

pub(crate) use gen::parsed_config;
