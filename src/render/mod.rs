//! Drawing surfaces and output formats for typeset pages.

mod json;
mod recording;
mod renderer;
mod result;
mod text;

pub use json::{to_json, JsonFormat};
pub use recording::{DrawOp, RecordedPage, RecordingRenderer, TextRecord};
pub use renderer::{NullRenderer, Renderer};
pub use result::{TypesetOutput, TypesetStats};
pub use text::to_text;
