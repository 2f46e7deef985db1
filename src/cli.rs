//! CLI domain: parse, route, and output only.

mod output;
mod parse;
mod route;

pub use output::{format_check_report, map_error};
pub use parse::Cli;
pub use route::{check_catalog, CheckReport, RunContext};
