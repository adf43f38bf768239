//! Output formatting for orchestration results

pub mod console;
pub mod formatter;
