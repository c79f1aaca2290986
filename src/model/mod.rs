//! Layout model: fonts, pieces, lines and paragraphs.
//!
//! A [`Paragraph`] owns its [`Line`]s, a line owns its [`Piece`]s, and a
//! piece owns its text plus any footnote or cross-reference block anchored
//! at it. Faces are shared through a [`FontBook`].

mod crossref;
mod font;
mod line;
mod paragraph;
mod piece;

pub use crossref::{
    CrossReferenceBlock, CrossReferenceQueue, CrossReferenceSource, CrossReferenceTable,
    QueuedCrossReference,
};
pub use font::{Color, FontBook, FontFace, FontRole};
pub use line::{Alignment, Line, VERSE_HANG_CEILING};
pub use paragraph::Paragraph;
pub use piece::{Piece, NBSP};
