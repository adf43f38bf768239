//! Activity progress display

pub mod reporter;
