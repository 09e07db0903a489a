//! Services for the import pipeline.

mod import;

pub use import::{ImportEvent, ImportOptions, ImportService};
