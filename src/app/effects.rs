use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::app::{App, Message, Model, ToastLevel};
use crate::save::SaveError;
use crate::session::SessionError;
use crate::store::{FileKind, ProblemId, StoreError};
use crate::watcher::{StoreChanges, StoreWatcher};

impl App {
    pub(super) fn make_store_watcher(&self) -> notify::Result<StoreWatcher> {
        StoreWatcher::new(&self.root, Duration::from_millis(200))
    }

    pub(super) fn handle_message_side_effects(
        &self,
        model: &mut Model,
        store_watcher: &mut Option<StoreWatcher>,
        msg: &Message,
    ) {
        match msg {
            Message::ToggleWatch => {
                if model.watch_enabled {
                    match self.make_store_watcher() {
                        Ok(watcher) => {
                            *store_watcher = Some(watcher);
                            model.show_toast(ToastLevel::Info, "Watching problem files");
                        }
                        Err(err) => {
                            model.watch_enabled = false;
                            *store_watcher = None;
                            model.show_toast(
                                ToastLevel::Warning,
                                format!("Watch unavailable: {err}"),
                            );
                            tracing::warn!(root = %self.root.display(), error = %err, "watcher failed");
                        }
                    }
                } else {
                    *store_watcher = None;
                    model.show_toast(ToastLevel::Info, "Watch disabled");
                }
            }
            Message::Refresh => {
                if self.refresh_problems(model) {
                    let count = model.problems.len();
                    model.show_toast(ToastLevel::Info, format!("{count} problems"));
                }
            }
            Message::StoreChanged(changes) => {
                self.refresh_problems(model);
                warn_if_open_problem_changed(model, changes);
            }
            Message::Save => self.save_problem(model),
            Message::ExportPreview => export_preview(model),
            Message::OpenVideo => open_video(model),
            _ => {}
        }

        if let Some(id) = model.load_requested.take() {
            self.load_problem(model, id);
        }
        if let Some(file) = model.variant_requested.take() {
            self.load_variant(model, file);
        }
    }

    /// Show alternate solution `file` of the open problem, read-only.
    fn load_variant(&self, model: &mut Model, file: String) {
        let Some(id) = model.session.selected_id() else {
            return;
        };
        match self.store.load_solution_variant(id, &file) {
            Ok(text) => {
                model.show_toast(
                    ToastLevel::Info,
                    format!("Viewing {file} (read-only, Ctrl+N for next)"),
                );
                model.show_variant(file, &text);
            }
            Err(err) => {
                tracing::warn!(%id, file = %file, error = %err, "alternate solution unreadable");
                model.show_toast(ToastLevel::Error, format!("Open failed: {err}"));
            }
        }
    }

    /// Re-read the listing. Returns `false` and shows a toast on failure.
    pub(super) fn refresh_problems(&self, model: &mut Model) -> bool {
        match self.store.list_problems() {
            Ok(problems) => {
                tracing::debug!(count = problems.len(), "problem list refreshed");
                model.set_problems(problems);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "listing problems failed");
                model.show_toast(ToastLevel::Error, format!("Listing failed: {err}"));
                false
            }
        }
    }

    /// Select `id` in the session. Failures leave the session as it was.
    pub(super) fn load_problem(&self, model: &mut Model, id: ProblemId) {
        match model.session.select(self.store.as_ref(), id) {
            Ok(problem) => {
                let title = format!("{} {}", problem.id(), problem.summary.title);
                let alternates = problem.alternate_solutions.len();
                model.problem_loaded();
                let visible = model.visible_problems();
                if let Some(index) = visible.iter().position(|p| p.id == id) {
                    model.list_selected = index;
                }
                let message = if alternates > 0 {
                    format!("Opened {title} ({alternates} alternate solutions, Ctrl+N to view)")
                } else {
                    format!("Opened {title}")
                };
                model.show_toast(ToastLevel::Info, message);
            }
            Err(SessionError::Store(err)) if err.is_not_found() => {
                model.show_toast(ToastLevel::Error, err.to_string());
                // The listing is stale; bring it back in line with the disk.
                self.refresh_problems(model);
            }
            Err(err) => model.show_toast(ToastLevel::Error, format!("Open failed: {err}")),
        }
    }

    fn save_problem(&self, model: &mut Model) {
        match model.session.save(self.store.as_ref(), &self.controller) {
            Ok(report) => model.show_toast(
                ToastLevel::Info,
                format!("Saved problem {} ({} bytes)", report.id, report.total_bytes()),
            ),
            Err(SessionError::NothingSelected) => {
                model.show_toast(ToastLevel::Warning, "No problem selected");
            }
            Err(SessionError::Save(SaveError::Validation(err))) => {
                model.show_toast(ToastLevel::Warning, format!("Not saved: {err}"));
            }
            Err(SessionError::Save(SaveError::Store(err @ StoreError::PartialSave { .. }))) => {
                tracing::error!(error = %err, "partial save");
                model.show_toast(ToastLevel::Error, err.to_string());
            }
            Err(err) => {
                tracing::warn!(error = %err, "save failed");
                model.show_toast(ToastLevel::Error, format!("Save failed: {err}"));
            }
        }
    }
}

fn export_preview(model: &mut Model) {
    let path = match write_preview_page(model) {
        Ok(path) => path,
        Err(err) => {
            model.show_toast(ToastLevel::Error, format!("Export failed: {err:#}"));
            return;
        }
    };
    let target = path.display().to_string();
    match open_external(&target) {
        Ok(()) => model.show_toast(ToastLevel::Info, format!("Opened {target}")),
        Err(err) => model.show_toast(
            ToastLevel::Warning,
            format!("Preview written to {target} (could not open: {err})"),
        ),
    }
}

/// Where the browser preview of `id` is written.
pub(super) fn preview_export_path(id: ProblemId) -> PathBuf {
    std::env::temp_dir().join(format!("probedit-preview-{id}.html"))
}

/// Render the explanation buffer as a standalone page and write it out.
pub(super) fn write_preview_page(model: &Model) -> Result<PathBuf> {
    let problem = model.problem().context("No problem selected")?;
    let text = model
        .session
        .buffer(FileKind::Explanation)
        .map(crate::editor::EditorBuffer::text)
        .unwrap_or_default();
    let page = crate::render::preview_page(&problem.summary.title, &text, problem.explanation_format);
    let path = preview_export_path(problem.id());
    std::fs::write(&path, page)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "preview exported");
    Ok(path)
}

fn warn_if_open_problem_changed(model: &mut Model, changes: &StoreChanges) {
    let Some(id) = model.session.selected_id() else {
        return;
    };
    if changes.touches(id) {
        model.show_toast(
            ToastLevel::Warning,
            format!("Problem {id} changed on disk; saving will overwrite it"),
        );
    }
}

fn open_video(model: &mut Model) {
    let Some(url) = model.problem().and_then(|p| p.video_link.clone()) else {
        model.show_toast(ToastLevel::Info, "No video for this problem");
        return;
    };
    match open_external(&url) {
        Ok(()) => model.show_toast(ToastLevel::Info, format!("Opened {url}")),
        Err(err) => model.show_toast(ToastLevel::Error, format!("Open failed: {err}")),
    }
}

fn open_external(target: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(target)
            .spawn()?
            .wait()?;
        Ok(())
    }
    #[cfg(target_os = "windows")]
    {
        use std::process::Stdio;
        std::process::Command::new("cmd")
            .args(["/C", "start", "", target])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        return Ok(());
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        std::process::Command::new("xdg-open")
            .arg(target)
            .spawn()?
            .wait()?;
        Ok(())
    }
}
