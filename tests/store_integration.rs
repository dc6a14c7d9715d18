use std::fs;
use std::path::Path;

use probedit::save::{SaveController, SaveError, SaveRules};
use probedit::session::{EditorSession, SessionError, SessionPhase};
use probedit::store::{
    ExplanationFormat, FileKind, FsStore, ProblemId, ProblemStore, StoreError,
};

const EXPLANATION: &str = "# Matrix times vector\n\nCompute $y = Ax$ where\n\n$$y_i = \\sum_j a_{ij} x_j$$\n";
const SOLUTION: &str = "def matrix_dot_vector(a, b):\n    if len(a[0]) != len(b):\n        return -1\n    return [sum(x * y for x, y in zip(row, b)) for row in a]\n";

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn problem_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("1_matrix_times_vector/learn.md"), EXPLANATION);
    write(&root.join("1_matrix_times_vector/solution.py"), SOLUTION);
    write(
        &root.join("1_matrix_times_vector/video.txt"),
        "https://youtu.be/DNCn1BpCAUY\n",
    );
    write(
        &root.join("2_transpose_matrix/learn.html"),
        "<h2>Transpose</h2><p>Swap $a_{ij}$ and $a_{ji}$.</p>",
    );
    write(&root.join("2_transpose_matrix/solution_1.py"), "def t(a): ...\n");
    write(&root.join("2_transpose_matrix/solution_2.py"), "def t2(a): ...\n");
    write(&root.join("interactive_learn/problem-1/notebook.py"), "import marimo\n");
    write(&root.join("README.md"), "not a problem\n");
    dir
}

#[test]
fn lists_only_numbered_directories() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());

    let problems = store.list_problems().unwrap();
    let slugs: Vec<_> = problems.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["1_matrix_times_vector", "2_transpose_matrix"]);
}

#[test]
fn listing_a_missing_root_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path().join("nope"));
    assert!(store.list_problems().unwrap().is_empty());
}

#[test]
fn selecting_problem_one_loads_both_files_unmodified() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());
    let mut session = EditorSession::new();

    let problem = session.select(&store, ProblemId(1)).unwrap();
    assert_eq!(problem.explanation_text, EXPLANATION);
    assert_eq!(problem.solution_text, SOLUTION);
    assert_eq!(problem.explanation_format, ExplanationFormat::Markdown);
    assert_eq!(problem.video_link.as_deref(), Some("https://youtu.be/DNCn1BpCAUY"));
    assert!(problem.notebook.is_some());

    assert_eq!(session.phase(), SessionPhase::Loaded);
    assert_eq!(session.buffer(FileKind::Explanation).unwrap().text(), EXPLANATION);
    assert_eq!(session.buffer(FileKind::Solution).unwrap().text(), SOLUTION);
}

#[test]
fn html_explanation_and_solution_variants() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());

    let problem = store.load(ProblemId(2)).unwrap();
    assert_eq!(problem.explanation_format, ExplanationFormat::Html);
    assert_eq!(problem.solution_file, "solution_1.py");
    assert_eq!(problem.alternate_solutions, vec!["solution_2.py".to_string()]);
    assert!(problem.video_link.is_none());
    assert!(problem.notebook.is_none());
}

#[test]
fn missing_problem_is_not_found_and_session_stays_unselected() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());
    let mut session = EditorSession::new();

    let err = session.select(&store, ProblemId(99)).unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::NotFound { .. })));
    assert_eq!(session.phase(), SessionPhase::Unselected);
}

#[test]
fn problem_without_solution_is_not_found() {
    let dir = problem_tree();
    write(&dir.path().join("3_orphan/learn.md"), "# Orphan\n");
    let store = FsStore::new(dir.path());

    let err = store.load(ProblemId(3)).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn unchanged_save_is_byte_identical() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());
    let mut session = EditorSession::new();
    session.select(&store, ProblemId(1)).unwrap();

    session.save(&store, &SaveController::default()).unwrap();

    let problem_dir = dir.path().join("1_matrix_times_vector");
    assert_eq!(fs::read(problem_dir.join("learn.md")).unwrap(), EXPLANATION.as_bytes());
    assert_eq!(fs::read(problem_dir.join("solution.py")).unwrap(), SOLUTION.as_bytes());
}

#[test]
fn crlf_content_survives_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let explanation = "# Title\r\n\r\nBody\r\n";
    write(&dir.path().join("4_crlf/learn.md"), explanation);
    write(&dir.path().join("4_crlf/solution.py"), "pass\r\n");
    let store = FsStore::new(dir.path());
    let mut session = EditorSession::new();
    session.select(&store, ProblemId(4)).unwrap();

    session.save(&store, &SaveController::default()).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("4_crlf/learn.md")).unwrap(),
        explanation
    );
}

#[test]
fn editing_the_solution_changes_only_solution_py() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());
    let mut session = EditorSession::new();
    session.select(&store, ProblemId(1)).unwrap();

    let buffer = session.buffer_mut(FileKind::Solution).unwrap();
    buffer.move_to_end();
    buffer.insert_str("\n# O(n*m)\n");
    assert!(session.is_dirty());

    let report = session.save(&store, &SaveController::default()).unwrap();
    assert_eq!(report.id, ProblemId(1));
    assert!(!session.is_dirty());

    let problem_dir = dir.path().join("1_matrix_times_vector");
    assert_eq!(fs::read_to_string(problem_dir.join("learn.md")).unwrap(), EXPLANATION);
    assert_eq!(
        fs::read_to_string(problem_dir.join("solution.py")).unwrap(),
        format!("{SOLUTION}\n# O(n*m)\n")
    );
}

#[test]
fn save_goes_back_to_the_fallback_solution_file() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());

    store
        .save(ProblemId(2), "<p>updated</p>", "def t(a): return a\n")
        .unwrap();
    let problem_dir = dir.path().join("2_transpose_matrix");
    assert_eq!(
        fs::read_to_string(problem_dir.join("solution_1.py")).unwrap(),
        "def t(a): return a\n"
    );
    assert_eq!(
        fs::read_to_string(problem_dir.join("learn.html")).unwrap(),
        "<p>updated</p>"
    );
    assert!(!problem_dir.join("solution.py").exists());
    assert!(!problem_dir.join("learn.md").exists());
}

#[test]
fn empty_solution_is_rejected_before_writing() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());
    let controller = SaveController::new(SaveRules::default());

    let err = controller
        .save(&store, ProblemId(1), "# changed\n", "   \n")
        .unwrap_err();
    assert!(matches!(err, SaveError::Validation(_)));
    assert_eq!(
        fs::read_to_string(dir.path().join("1_matrix_times_vector/learn.md")).unwrap(),
        EXPLANATION
    );
}

#[test]
fn failed_solution_write_reports_partial_save() {
    let dir = tempfile::tempdir().unwrap();
    let problem_dir = dir.path().join("5_broken");
    write(&problem_dir.join("learn.md"), "# Broken\n");
    // A directory where the solution file should be makes the rename fail.
    fs::create_dir_all(problem_dir.join("solution.py")).unwrap();
    let store = FsStore::new(dir.path());

    let err = store
        .save(ProblemId(5), "# Broken, again\n", "pass\n")
        .unwrap_err();
    match err {
        StoreError::PartialSave { id, written, failed, .. } => {
            assert_eq!(id, ProblemId(5));
            assert_eq!(written, FileKind::Explanation);
            assert_eq!(failed, FileKind::Solution);
        }
        other => panic!("expected PartialSave, got {other:?}"),
    }
    assert_eq!(
        fs::read_to_string(problem_dir.join("learn.md")).unwrap(),
        "# Broken, again\n",
        "explanation write is not rolled back"
    );
}

#[test]
fn saving_unknown_problem_is_not_found() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());
    let err = store.save(ProblemId(42), "x", "y").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn session_save_goes_back_to_the_loaded_files() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());
    let mut session = EditorSession::new();
    session.select(&store, ProblemId(2)).unwrap();

    // Preferred file names appear after the fallbacks were loaded.
    let problem_dir = dir.path().join("2_transpose_matrix");
    write(&problem_dir.join("solution.py"), "# newcomer\n");
    write(&problem_dir.join("learn.md"), "# newcomer\n");

    let buffer = session.buffer_mut(FileKind::Solution).unwrap();
    buffer.move_to_end();
    buffer.insert_str("# edited\n");
    session.save(&store, &SaveController::default()).unwrap();

    assert_eq!(
        fs::read_to_string(problem_dir.join("solution_1.py")).unwrap(),
        "def t(a): ...\n# edited\n"
    );
    assert_eq!(
        fs::read_to_string(problem_dir.join("learn.html")).unwrap(),
        "<h2>Transpose</h2><p>Swap $a_{ij}$ and $a_{ji}$.</p>"
    );
    assert_eq!(fs::read_to_string(problem_dir.join("solution.py")).unwrap(), "# newcomer\n");
    assert_eq!(fs::read_to_string(problem_dir.join("learn.md")).unwrap(), "# newcomer\n");
}

#[cfg(unix)]
#[test]
fn unchanged_save_keeps_file_modes() {
    use std::os::unix::fs::PermissionsExt;

    let dir = problem_tree();
    let problem_dir = dir.path().join("1_matrix_times_vector");
    let mode = |name: &str| {
        fs::metadata(problem_dir.join(name)).unwrap().permissions().mode() & 0o777
    };
    fs::set_permissions(problem_dir.join("learn.md"), fs::Permissions::from_mode(0o644)).unwrap();
    fs::set_permissions(problem_dir.join("solution.py"), fs::Permissions::from_mode(0o755))
        .unwrap();
    let store = FsStore::new(dir.path());
    let mut session = EditorSession::new();
    session.select(&store, ProblemId(1)).unwrap();

    session.save(&store, &SaveController::default()).unwrap();

    assert_eq!(mode("learn.md"), 0o644);
    assert_eq!(mode("solution.py"), 0o755);
}

#[test]
fn alternate_solutions_are_readable_by_name() {
    let dir = problem_tree();
    let store = FsStore::new(dir.path());

    assert_eq!(
        store.load_solution_variant(ProblemId(2), "solution_2.py").unwrap(),
        "def t2(a): ...\n"
    );
    assert!(store
        .load_solution_variant(ProblemId(2), "../1_matrix_times_vector/solution.py")
        .unwrap_err()
        .is_not_found());
}
