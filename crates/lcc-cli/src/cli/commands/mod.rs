//! CLI command handlers. Each command is in its own file.

mod check;
mod classify;
mod read;

pub use check::run_check;
pub use classify::{run_classify, ClassifyArgs};
pub use read::run_read;
