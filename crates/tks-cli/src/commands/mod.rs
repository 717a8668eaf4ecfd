//! CLI subcommand implementations.

pub mod add;
pub mod aliases;
pub mod edit_path;
pub mod prefill;
pub mod start;
pub mod status;
pub mod stop;
pub mod util;
