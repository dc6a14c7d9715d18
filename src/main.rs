//! probedit - a terminal editor for coding-problem explanations and solutions.
//!
//! # Usage
//!
//! ```bash
//! probedit                       # edit ./Problems
//! probedit path/to/Problems --problem 1
//! probedit --watch --log-file probedit.log
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use probedit::app::App;
use probedit::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use probedit::highlight::{HighlightBackground, set_background_mode};
use probedit::save::SaveRules;
use probedit::store::{FsStore, ProblemId};

const DEFAULT_ROOT: &str = "Problems";

/// Edit problem explanations and reference solutions side by side
#[derive(Parser, Debug)]
#[command(name = "probedit", version, about, long_about = None)]
struct Cli {
    /// Problem store directory (holds `<N>_<slug>` folders)
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,

    /// Open this problem on startup (number or directory name)
    #[arg(short, long, value_name = "ID")]
    problem: Option<String>,

    /// Watch the store and re-list problems on external changes
    #[arg(short, long)]
    watch: bool,

    /// Start with the preview pane hidden
    #[arg(long)]
    no_preview: bool,

    /// Allow saving a problem whose solution is empty
    #[arg(long)]
    allow_empty_solution: bool,

    /// Refuse to save a problem whose explanation is empty
    #[arg(long)]
    require_explanation: bool,

    /// Force highlight theme background (light or dark)
    #[arg(long, value_enum, default_value = "auto")]
    theme: ThemeMode,

    /// Write logs to this file (logging is off without it)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

// Query the terminal background using OSC 11.
// We talk to /dev/tty so the terminal responds even when stdout is piped.
// Non-Unix platforms skip the query: the stdin fallback leaves a reader
// thread blocking console input.
#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::{Read, Write};
    use std::sync::mpsc;

    let (tx, rx) = mpsc::channel();

    let mut io = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let reader = io.try_clone()?;

    // OSC 11 query: ESC ] 11 ; ? BEL
    io.write_all(b"\x1b]11;?\x07")?;
    io.flush()?;

    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; 256];
        let mut collected: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => {
                    collected.extend_from_slice(&buf[..n]);
                    if collected.contains(&b'\x07') || collected.windows(2).any(|w| w == b"\x1b\\")
                    {
                        let _ = tx.send(collected);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let Ok(collected) = rx.recv_timeout(Duration::from_millis(75)) else {
        return Ok(None);
    };
    let text = String::from_utf8_lossy(&collected);
    Ok(parse_osc11_reply(&text))
}

fn theme_from_rgb(r: u8, g: u8, b: u8) -> HighlightBackground {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    if luma >= 140.0 {
        HighlightBackground::Light
    } else {
        HighlightBackground::Dark
    }
}

fn detect_theme() -> Option<HighlightBackground> {
    let _raw = enable_raw_mode();
    let result = query_terminal_background();
    let _ = disable_raw_mode();
    result.ok().flatten().map(|(r, g, b)| theme_from_rgb(r, g, b))
}

fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    // Expect: ESC ] 11 ; rgb:RRRR/GGGG/BBBB BEL or ST
    let start = reply.find("rgb:")?;
    let data = &reply[start + 4..];
    let mut parts = data.split(['/', '\x07', '\x1b']);
    let r = parts.next()?;
    let g = parts.next()?;
    let b = parts.next()?;
    Some((
        parse_osc_component(r)?,
        parse_osc_component(g)?,
        parse_osc_component(b)?,
    ))
}

fn parse_osc_component(s: &str) -> Option<u8> {
    let hex = s.trim();
    if hex.len() >= 4 {
        let v = u16::from_str_radix(hex.get(..4)?, 16).ok()?;
        u8::try_from(v >> 8).ok()
    } else if hex.len() == 2 {
        u8::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}

/// Where log events go. The TUI owns the terminal, so without a log file
/// events are dropped rather than drawn over the screen.
fn log_writer(log_file: Option<&PathBuf>) -> Result<BoxMakeWriter> {
    let Some(path) = log_file else {
        return Ok(BoxMakeWriter::new(std::io::sink));
    };
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_writer(log_file)?)
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let mut cli_flags = parse_flag_tokens(&raw_args);
    cli_flags.root.clone_from(&cli.root);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.log_file.as_ref())?;

    match effective.theme.unwrap_or(ThemeMode::Auto) {
        ThemeMode::Auto => set_background_mode(detect_theme()),
        ThemeMode::Light => set_background_mode(Some(HighlightBackground::Light)),
        ThemeMode::Dark => set_background_mode(Some(HighlightBackground::Dark)),
    }

    let root = effective
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
    if !root.is_dir() {
        anyhow::bail!("Problem store not found: {}", root.display());
    }
    let initial_problem = cli
        .problem
        .as_deref()
        .map(str::parse::<ProblemId>)
        .transpose()
        .context("Invalid --problem value")?;

    tracing::info!(root = %root.display(), "opening problem store");
    let store = FsStore::new(root.clone());
    let app = App::new(Box::new(store), root)
        .with_watch(effective.watch)
        .with_preview_visible(!effective.no_preview)
        .with_save_rules(SaveRules {
            require_solution: !effective.allow_empty_solution,
            require_explanation: effective.require_explanation,
        })
        .with_initial_problem(initial_problem)
        .with_config_paths(
            Some(global_path.clone()),
            local_path.exists().then(|| local_path.clone()),
        );

    app.run().context("Application error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_osc11_reply_reads_16_bit_components() {
        let reply = "\x1b]11;rgb:ffff/8080/0000\x07";
        assert_eq!(parse_osc11_reply(reply), Some((255, 128, 0)));
    }

    #[test]
    fn test_parse_osc11_reply_rejects_garbage() {
        assert_eq!(parse_osc11_reply("nothing here"), None);
    }

    #[test]
    fn test_theme_from_rgb() {
        assert_eq!(theme_from_rgb(255, 255, 255), HighlightBackground::Light);
        assert_eq!(theme_from_rgb(0, 0, 0), HighlightBackground::Dark);
    }

    #[test]
    fn test_log_events_go_to_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probedit.log");
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log_writer(Some(&path)).unwrap())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(id = 99, "problem selection failed");
        });
        let logged = std::fs::read_to_string(&path).unwrap();
        assert!(logged.contains("problem selection failed"), "got: {logged}");
    }

    #[test]
    fn test_logging_without_file_stays_off_the_terminal() {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log_writer(None).unwrap())
            .finish();
        // events are discarded
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("partial save");
        });
    }

    #[test]
    fn test_cli_parses_root_and_problem() {
        let cli = Cli::try_parse_from(["probedit", "store", "--problem", "3", "--watch"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("store")));
        assert_eq!(cli.problem.as_deref(), Some("3"));
        assert!(cli.watch);
    }
}
