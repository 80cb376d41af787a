//! Terminal user interface: panes, the orchestrating model, and the
//! terminal driver.
//!
//! The [`model::Model`] owns up to two [`pane::Pane`]s, routes key events
//! through a closed set of UI modes, and produces full frames of pre-styled
//! rows that [`terminal`] writes out.

pub mod model;
pub mod pane;
pub mod terminal;

pub use model::{Model, ModelOptions};
pub use pane::Pane;

/// The closed set of UI modes. The modal text input is shared state owned by
/// the model, not by each mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Search,
    Goto,
    GotoTime,
    Filter,
    Slice,
    MarkSet,
    MarkJump,
    Help,
    FileInfo,
    SplitCmd,
    Yank,
    Visual,
}

/// How the screen is divided between panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitDirection {
    #[default]
    None,
    /// Side by side
    Vertical,
    /// Stacked
    Horizontal,
}
