//! Line filling, hanging punctuation and page breaking.
//!
//! The [`PieceBuilder`] turns tokens into paragraphs, the [`Paginator`]
//! measures and emits lines against the page, and the [`Typesetter`] ties the
//! two together into a page loop.

mod builder;
mod config;
mod metrics;
mod paginate;
mod typeset;
pub mod unicode;

pub use builder::{PieceBuilder, StyleMap, TagStyle};
pub use config::{LayoutConfig, HANG_CLEARANCE};
pub use metrics::{FontMetrics, UniformMetrics, VerticalMetrics};
pub use paginate::{FitReport, LineOutcome, Overflow, PageContext, PageSummary, Paginator};
pub use typeset::Typesetter;
