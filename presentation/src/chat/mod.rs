//! Interactive chat module
//!
//! Provides a line-based interactive chat interface over one document
//! session, plus the request helpers shared with single-shot mode.

mod repl;
mod request;

pub use repl::ChatRepl;
pub use request::{cancel_on_ctrl_c, print_stream};
