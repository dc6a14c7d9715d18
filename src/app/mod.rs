//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Everything that touches the problem store runs in the side-effect pass
//! after `update`, so `update` stays testable without a store.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Focus, Model, ProblemFilter, SolutionVariant, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::save::{SaveController, SaveRules};
use crate::store::{ProblemId, ProblemStore};

/// Main application struct that owns the store and runs the event loop.
pub struct App {
    store: Box<dyn ProblemStore>,
    root: PathBuf,
    controller: SaveController,
    watch_enabled: bool,
    preview_visible: bool,
    initial_problem: Option<ProblemId>,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create an application over `store`, whose files live under `root`.
    pub fn new(store: Box<dyn ProblemStore>, root: PathBuf) -> Self {
        Self {
            store,
            root,
            controller: SaveController::default(),
            watch_enabled: false,
            preview_visible: true,
            initial_problem: None,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Watch the store root and re-list on external changes.
    pub fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    pub fn with_preview_visible(mut self, visible: bool) -> Self {
        self.preview_visible = visible;
        self
    }

    pub const fn with_save_rules(mut self, rules: SaveRules) -> Self {
        self.controller = SaveController::new(rules);
        self
    }

    /// Open this problem on startup.
    pub const fn with_initial_problem(mut self, id: Option<ProblemId>) -> Self {
        self.initial_problem = id;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }

    pub fn store(&self) -> &dyn ProblemStore {
        self.store.as_ref()
    }
}
