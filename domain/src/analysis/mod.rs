//! Request analysis: what the user wants and which agents must run.

pub mod intent;
