//! Text buffers for the explanation and solution files.
//!
//! A rope-backed buffer with cursor management, edited in place by the
//! app's update loop and owned by the editor session.

mod buffer;

pub use buffer::{Cursor, Direction, EditorBuffer, INDENT};
