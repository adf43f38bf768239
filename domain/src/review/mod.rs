//! Review domain
//!
//! Reviews are free-form model critiques. [`parsing`] pulls a score and
//! keyword-gated lists out of them; [`entities`] holds the results.

pub mod entities;
pub mod parsing;
