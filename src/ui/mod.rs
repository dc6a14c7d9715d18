//! Terminal UI components.
//!
//! - [`render`]: the three-pane layout (problem list, editor, preview)
//! - [`style`]: Theming and colors
//!
//! Rendering only reads the [`Model`](crate::app::Model), apart from the
//! preview and highlight caches it fills on demand.

pub mod style;

mod overlays;
mod render;
mod status;

pub use overlays::help_lines;
pub use render::{Panes, line_number_width, preview_content_width, render, split_panes};

/// Upper bound on the problem list width.
pub const LIST_MAX_WIDTH: u16 = 36;
/// Horizontal padding inside the preview pane.
pub const PREVIEW_PADDING: u16 = 1;

#[cfg(test)]
mod tests;
