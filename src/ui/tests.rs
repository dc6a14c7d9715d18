use std::path::PathBuf;
use std::rc::Rc;

use ratatui::Terminal;
use ratatui::backend::TestBackend;

use super::*;
use crate::app::{App, Focus, Model};
use crate::store::{MemoryStore, ProblemId};

fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    Terminal::new(TestBackend::new(width, height)).unwrap()
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn loaded_model(width: u16, height: u16) -> Model {
    let store = Rc::new(
        MemoryStore::new()
            .with_problem(
                "1_matrix_times_vector",
                "# Matrix times vector\n\nMultiply **each row** by the vector.\n",
                "def matrix_dot_vector(a, b):\n    return -1\n",
            )
            .with_problem("2_transpose_matrix", "# Transpose\n", "def t(a):\n    pass\n"),
    );
    let app = App::new(Box::new(store), PathBuf::from("Problems"))
        .with_initial_problem(Some(ProblemId(1)));
    app.init_model((width, height))
}

fn draw(model: &mut Model, width: u16, height: u16) -> String {
    let mut terminal = create_test_terminal(width, height);
    terminal.draw(|frame| render(model, frame)).unwrap();
    screen_text(&terminal)
}

#[test]
fn test_welcome_screen_without_selection() {
    let mut model = Model::new(PathBuf::from("Problems"), (100, 20));
    let text = draw(&mut model, 100, 20);
    assert!(text.contains("probedit"));
    assert!(text.contains("Store: Problems"));
    assert!(text.contains("Problems (0)"));
}

#[test]
fn test_list_shows_problems_with_marker() {
    let mut model = loaded_model(120, 20);
    let text = draw(&mut model, 120, 20);
    assert!(text.contains("Problems (2)"));
    assert!(text.contains(">•  1 E matrix times vector"));
    assert!(text.contains("2 E transpose matrix"));
}

#[test]
fn test_editor_shows_line_numbers_and_file_name() {
    let mut model = loaded_model(120, 20);
    let text = draw(&mut model, 120, 20);
    assert!(text.contains("1_matrix_times_vector/learn.md"));
    assert!(text.contains("1 # Matrix times vector"));
    assert!(text.contains("3 Multiply **each row** by the vector."));
}

#[test]
fn test_preview_renders_markdown() {
    let mut model = loaded_model(160, 20);
    let text = draw(&mut model, 160, 20);
    assert!(text.contains("Preview"));
    assert!(
        text.contains("Multiply each row by the vector."),
        "emphasis markers are rendered, not shown"
    );
}

#[test]
fn test_hidden_preview_gives_editor_full_width() {
    let mut model = loaded_model(120, 20);
    model.preview_visible = false;
    let text = draw(&mut model, 120, 20);
    assert!(!text.contains("Preview"));
}

#[test]
fn test_solution_buffer_shows_solution_file() {
    let mut model = loaded_model(120, 20);
    model.active_kind = crate::store::FileKind::Solution;
    let text = draw(&mut model, 120, 20);
    assert!(text.contains("1_matrix_times_vector/solution.py"));
    assert!(text.contains("def matrix_dot_vector(a, b):"));
}

#[test]
fn test_dirty_buffer_is_flagged_in_title() {
    let mut model = loaded_model(120, 20);
    model
        .active_buffer_mut()
        .expect("buffer")
        .insert_str("New intro. ");
    let text = draw(&mut model, 120, 20);
    assert!(text.contains("learn.md [+]"));
}

#[test]
fn test_toast_replaces_status_bar() {
    let mut model = loaded_model(120, 20);
    let text = draw(&mut model, 120, 20);
    let last = text.lines().last().unwrap_or_default();
    assert!(last.starts_with("[info] Opened 1 matrix times vector"));
}

#[test]
fn test_status_bar_without_toast() {
    let mut model = Model::new(PathBuf::from("Problems"), (100, 10));
    model.focus = Focus::List;
    let text = draw(&mut model, 100, 10);
    let last = text.lines().last().unwrap_or_default();
    assert!(last.contains("0 problems"));
    assert!(last.contains("?:help"));
}

#[test]
fn test_help_overlay_lists_keys() {
    let mut model = loaded_model(120, 40);
    model.help_visible = true;
    let text = draw(&mut model, 120, 40);
    assert!(text.contains("Help"));
    assert!(text.contains("Ctrl+S"));
    assert!(text.contains("Save explanation and solution"));
}

#[test]
fn test_help_lines_include_config_paths() {
    let mut model = Model::new(PathBuf::from("Problems"), (80, 24));
    model.config_global_path = Some(PathBuf::from("/tmp/probedit/config"));
    let lines = help_lines(&model);
    let text: Vec<String> = lines.iter().map(ToString::to_string).collect();
    assert!(text.iter().any(|l| l.contains("/tmp/probedit/config")));
    assert!(text.iter().any(|l| l.contains("<none>")));
}

#[test]
fn test_tiny_terminal_does_not_panic() {
    let mut model = loaded_model(10, 3);
    let _ = draw(&mut model, 10, 3);
}

#[test]
fn test_preview_content_width_accounts_for_border_and_padding() {
    let area = ratatui::layout::Rect::new(0, 0, 40, 10);
    assert_eq!(preview_content_width(area), 36);
    assert_eq!(
        preview_content_width(ratatui::layout::Rect::new(0, 0, 2, 2)),
        1
    );
}

#[test]
fn test_alternate_solution_title_is_read_only() {
    let mut model = loaded_model(120, 20);
    model.active_kind = crate::store::FileKind::Solution;
    model.solution_variant = Some(crate::app::SolutionVariant {
        file: "solution_2.py".to_string(),
        buffer: crate::editor::EditorBuffer::from_text("import numpy as np\n"),
    });
    let text = draw(&mut model, 120, 20);
    assert!(text.contains("1_matrix_times_vector/solution_2.py [read-only]"));
    assert!(text.contains("import numpy as np"));
}
