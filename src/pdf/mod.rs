//! PDF access and output via lopdf

pub mod source;
pub mod spread;

// Re-export commonly used items
pub use source::SourceDocument;
pub use spread::{crop_spread, plan_spread, SpreadOptions, SpreadReport};
