//! CLI domain: parse, route, output, and presentation only.
//! No merge logic; a single route table dispatches to the cluster and store layers.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_merge_report_json, format_merge_report_text, format_show_text};
pub use route::RunContext;
