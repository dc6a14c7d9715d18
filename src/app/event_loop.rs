use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::{DefaultTerminal, Frame};

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::watcher::StoreWatcher;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop
    /// encounters an I/O failure. Store errors are shown as toasts instead.
    pub fn run(&self) -> Result<()> {
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; probedit requires an interactive terminal")?;
        let size = terminal.size()?;

        let mut model = self.init_model((size.width, size.height));
        let result = self.event_loop(&mut terminal, &mut model);

        ratatui::restore();
        result
    }

    /// Build the starting model: list the store and open the initial
    /// problem, if one was requested.
    pub fn init_model(&self, terminal_size: (u16, u16)) -> Model {
        let mut model = Model::new(self.root.clone(), terminal_size);
        model.watch_enabled = self.watch_enabled;
        model.preview_visible = self.preview_visible;
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);

        self.refresh_problems(&mut model);
        if model.problems.is_empty() && model.active_toast().is_none() {
            model.show_toast(
                ToastLevel::Warning,
                format!("No problems found under {}", self.root.display()),
            );
        }
        if let Some(id) = self.initial_problem {
            self.load_problem(&mut model, id);
        }
        tracing::info!(
            root = %self.root.display(),
            problems = model.problems.len(),
            "editor started"
        );
        model
    }

    fn event_loop(&self, terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut store_watcher = if model.watch_enabled {
            match self.make_store_watcher() {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    model.watch_enabled = false;
                    model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                    tracing::warn!(error = %err, "watcher failed");
                    None
                }
            }
        } else {
            None
        };
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                *model = update(std::mem::take(model), Message::Resize(width, height));
                needs_render = true;
            }

            if model.watch_enabled
                && let Some(changes) = store_watcher.as_mut().and_then(StoreWatcher::take_changes)
            {
                let msg = Message::StoreChanged(changes);
                self.dispatch(model, &mut store_watcher, msg);
                needs_render = true;
            }

            let poll_ms = if needs_render {
                0
            } else if resize_debouncer.is_pending() {
                10
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                if let Some(msg) =
                    Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer)
                {
                    self.dispatch(model, &mut store_watcher, msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    if let Some(msg) =
                        Self::handle_event(&event::read()?, model, drain_ms, &mut resize_debouncer)
                    {
                        self.dispatch(model, &mut store_watcher, msg);
                        needs_render = true;
                    }
                }
            }

            if needs_render {
                terminal.draw(|frame| Self::view(model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }

    /// Run one message through `update` and then its side effects.
    pub(super) fn dispatch(
        &self,
        model: &mut Model,
        store_watcher: &mut Option<StoreWatcher>,
        msg: Message,
    ) {
        tracing::trace!(?msg, "message");
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model, store_watcher, &side_msg);
    }

    fn view(model: &mut Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}
