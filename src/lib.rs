// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. store::StoreError)
    clippy::module_name_repetitions
)]

//! # probedit
//!
//! A terminal editor for a directory of coding problems. Each problem
//! folder holds an explanation document (markdown with `$...$` math, or
//! HTML) and a reference solution in Python.
//!
//! probedit offers:
//! - A filterable problem list with difficulty and category tags
//! - Side-by-side editing of explanation and solution buffers
//! - A live terminal preview of the explanation, math typeset to unicode
//! - Validated saves that report half-written problems explicitly
//!
//! ## Architecture
//!
//! probedit uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`store`]: Problem storage (filesystem and in-memory)
//! - [`session`]: The selected problem and its two edit buffers
//! - [`save`]: Save validation and persistence
//! - [`render`]: Explanation rendering to HTML and terminal lines
//! - [`editor`]: Rope-backed text buffer
//! - [`app`]: Main application loop and state
//! - [`ui`]: Terminal UI components
//! - [`highlight`]: Syntax highlighting
//! - [`config`]: Persisted flag defaults
//! - [`watcher`]: Store watching

pub mod app;
pub mod config;
pub mod editor;
pub mod highlight;
pub mod render;
pub mod save;
pub mod session;
pub mod store;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::render::{ExplanationFormat, Preview, render_html, render_lines};
    pub use crate::save::{SaveController, SaveRules};
    pub use crate::session::EditorSession;
    pub use crate::store::{FsStore, MemoryStore, Problem, ProblemId, ProblemStore, StoreError};
}
