/*
[INPUT]:  Lazy StyledText item iterators (one per generation)
[OUTPUT]: Installed styled document + scroll state for the host view
[POS]:    Render layer - background materialization and UI handoff
[UPDATE]: When changing cancellation, coalescing, or scroll fix-up rules
*/

mod calculator;
mod document;
mod pane;

use thiserror::Error;

pub use document::{Document, StyledRun};
pub use pane::{ItemTextPane, TextView};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("invalid insert position {offset} (document length {len})")]
    InvalidPosition { offset: usize, len: usize },
}
