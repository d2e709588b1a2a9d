//! PDF Spread Crop Library
//!
//! Converts a PDF printed in "printer's spread" layout, where each sheet holds
//! two non-adjacent booklet pages one above the other, into a document with one
//! logical page per PDF page in reading order.
//!
//! The work is split into:
//! - [`layout`]: crop rectangle geometry and the margin offset
//! - [`remap`]: the pure sheet-to-page mapping
//! - [`naming`]: the `name.out.ext` output path
//! - [`pdf`]: reading the source and writing the cropped copy with lopdf
//!
//! # Example
//!
//! ```no_run
//! use pdf_spread_crop::layout::MarginOffset;
//! use pdf_spread_crop::pdf::{crop_spread, SpreadOptions};
//!
//! let options = SpreadOptions {
//!     margin_offset: MarginOffset::new(4.0).expect("valid offset"),
//!     ..SpreadOptions::new("booklet.pdf")
//! };
//!
//! let report = crop_spread(&options).expect("Failed to crop spread");
//! println!("{}", report.output_path.display());
//! ```

pub mod error;
pub mod layout;
pub mod naming;
pub mod pdf;
pub mod remap;

// Re-export commonly used items
pub use error::{Error, Result};
pub use remap::{remap, CropPlan, OutputPage};
