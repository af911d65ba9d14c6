use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use wpdebug_logs::{ErrorKind, LOG_SOURCE_SETTING, LogCombiner, LogError, LogSession, PatternStore};
use wpdebug_tui::{
    Action, AppState, BlockPickerScreen, ConfirmDialog, Event, EventHandler, HelpOverlay,
    InputBar, InputPurpose, KeyBindings, LogViewerScreen, RulesOverlay, TitleFlasher, Tui,
    ViewMode, open_folder,
};
use wpdebug_types::FilterMode;

/// Lines moved by PageUp/PageDown
const PAGE_SIZE: usize = 20;

/// wpdebugger - A terminal viewer that tails WordPress debug.log
#[derive(Parser, Debug)]
#[command(name = "wpdebugger")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// wp-content directory holding debug.log (remembered for next time)
    #[arg(value_name = "WP_CONTENT")]
    wp_content: Option<PathBuf>,

    /// Configuration file [default: <config dir>/wpdebugger/config.json]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How matching entries are hidden: collapse or redact
    #[arg(long, default_value = "collapse")]
    filter_mode: FilterMode,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// UI tick rate in milliseconds
    #[arg(long, default_value = "250")]
    tick_rate_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Diagnostics go to stderr unless redirected, away from the TUI
    let writer = match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(writer)
        .with_ansi(args.log_file.is_none())
        .init();

    // Run the application
    let result = run_app(args).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Everything the action handler needs besides UI state
struct Engine {
    store: Arc<RwLock<PatternStore>>,
    session: LogSession,
}

async fn run_app(args: Args) -> Result<()> {
    let config_path = match args.config.clone() {
        Some(path) => path,
        None => PatternStore::default_path()
            .context("no configuration directory available, pass --config")?,
    };
    let store = Arc::new(RwLock::new(PatternStore::load(&config_path)));
    info!("Using configuration {}", config_path.display());

    // Initialize TUI; engine updates share the terminal event stream
    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(args.tick_rate_ms));
    let keybindings = KeyBindings::new();
    let mut flasher = TitleFlasher::new();

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let sink = Arc::new(events.display_sink());
    let mut ctx = Engine {
        store: Arc::clone(&store),
        session: LogSession::new(Arc::clone(&store), sink).with_filter_mode(args.filter_mode),
    };

    // Initialize state
    let mut state = AppState::new();
    state.filter_mode = args.filter_mode;
    state.sync_config(&store.read());

    // Command line directory wins over the saved one
    let source = args
        .wp_content
        .clone()
        .or_else(|| store.read().log_source_path().map(Path::to_path_buf));
    match source {
        Some(dir) => {
            if let Err(e) = start_monitoring(&mut ctx, &mut state, &dir) {
                state.show_error(e.to_string());
                state.open_input(InputPurpose::LogSource);
                state.reject_input(e.to_string());
            }
        }
        None => state.open_input(InputPurpose::LogSource),
    }

    // Initial render
    render(&mut tui, &mut state)?;

    // Main event loop
    loop {
        tokio::select! {
            // Terminal input and log engine updates
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        if let Some(action) = keybindings.get_action(state.key_context(), &key) {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Display(update) => {
                        if state.apply_display_event(update) {
                            flasher.trigger(action_tx.clone());
                        }
                    }
                    Event::Tick => {
                        state.expire_message(Instant::now());
                    }
                    Event::Resize(_, _) => {
                        state.render_dirty = true;
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                        state.render_dirty = true;
                    }
                }
            }

            // Handle user actions
            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &mut ctx, action);
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state)?;
    }

    // Cleanup
    flasher.shutdown();
    ctx.session.stop();
    events.shutdown();
    tui.restore()?;

    Ok(())
}

/// Monitor `dir` and remember it as the log source
fn start_monitoring(ctx: &mut Engine, state: &mut AppState, dir: &Path) -> Result<(), LogError> {
    ctx.session.start(dir)?;
    ctx.session.set_block_view(state.view == ViewMode::Blocks);

    let mut store = ctx.store.write();
    if store.log_source_path() != Some(dir) {
        store.set_log_source_path(dir);
    }
    state.sync_config(&store);
    Ok(())
}

fn handle_action(state: &mut AppState, ctx: &mut Engine, action: Action) {
    state.render_dirty = true;

    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::GoBack => {
            let was_blocks = state.view == ViewMode::Blocks;
            state.go_back();
            if was_blocks && state.view == ViewMode::Log {
                ctx.session.set_block_view(false);
            }
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }
        Action::ToggleRules => {
            state.ui_state.rules_visible = !state.ui_state.rules_visible;
        }
        Action::ToggleBlockView => {
            let view = state.toggle_block_view();
            ctx.session.set_block_view(view == ViewMode::Blocks);
        }

        // Log view scrolling
        Action::ScrollUp(n) => state.scroll_up(n),
        Action::ScrollDown(n) => state.scroll_down(n),
        Action::PageUp => state.scroll_up(PAGE_SIZE),
        Action::PageDown => state.scroll_down(PAGE_SIZE),
        Action::ScrollToTop => state.scroll_to_top(),
        Action::ScrollToBottom => state.scroll_to_bottom(),
        Action::ToggleAutoScroll => {
            state.ui_state.auto_scroll = !state.ui_state.auto_scroll;
        }

        // Monitoring
        Action::TogglePause => {
            if state.toggle_pause() {
                state.show_info("Updates paused");
            } else {
                state.dismiss_message();
                reload_if_monitoring(state, ctx);
            }
        }
        Action::Reload => reload(state, ctx),
        Action::CycleFilterMode => {
            let mode = state.filter_mode.next();
            state.filter_mode = mode;
            ctx.session.set_filter_mode(mode);
            state.show_info(format!("Filter mode: {}", mode));
            reload_if_monitoring(state, ctx);
        }
        Action::RequestClear => {
            if ctx.session.is_monitoring() {
                state.ui_state.confirm_clear = true;
            } else {
                report_error(state, &LogError::NotConfigured(LOG_SOURCE_SETTING));
            }
        }
        Action::ConfirmYes => {
            state.ui_state.confirm_clear = false;
            match ctx.session.clear_content() {
                Ok(()) => {
                    state.content_cleared();
                    state.show_info("debug.log cleared");
                }
                Err(e) => report_error(state, &e),
            }
        }
        Action::ConfirmNo => {
            state.ui_state.confirm_clear = false;
        }

        // Output
        Action::ExportContent => {
            let text = state.visible_content().to_string();
            export(state, "debug", &text);
        }
        Action::CombineLogs => combine(state, ctx),
        Action::OpenFolder => match state.source_dir.clone() {
            Some(dir) => match open_folder(&dir) {
                Ok(()) => state.show_info(format!("Opened {}", dir.display())),
                Err(e) => {
                    warn!("Failed to open {}: {}", dir.display(), e);
                    state.show_error(format!("Cannot open folder: {}", e));
                }
            },
            None => report_error(state, &LogError::NotConfigured(LOG_SOURCE_SETTING)),
        },

        // Block view
        Action::BlockUp => state.block_up(),
        Action::BlockDown => state.block_down(),
        Action::BlockToggle => state.toggle_block(),
        Action::BlockSelectAll => state.select_all_blocks(),
        Action::BlockDeselectAll => state.deselect_all_blocks(),
        Action::ExportSelected => match state.selected_text() {
            Some(text) => export(state, "blocks", &text),
            None => state.show_info("No blocks checked"),
        },

        // Rules overlay
        Action::RuleUp => state.rule_up(),
        Action::RuleDown => state.rule_down(),
        Action::RemoveRule => {
            let Some(rule) = state.selected_rule().map(str::to_string) else {
                return;
            };
            if ctx.store.write().remove_rule(&rule) {
                state.sync_config(&ctx.store.read());
                state.show_info(format!("Removed pattern '{}'", rule));
                reload_if_monitoring(state, ctx);
            }
        }
        Action::ClearRules => {
            if state.rules.is_empty() {
                return;
            }
            ctx.store.write().clear_rules();
            state.sync_config(&ctx.store.read());
            state.show_info("All patterns removed");
            reload_if_monitoring(state, ctx);
        }

        // Text prompt
        Action::OpenInput(purpose) => state.open_input(purpose),
        Action::InputChar(c) => state.input_push(c),
        Action::InputBackspace => state.input_backspace(),
        Action::InputClear => state.input_clear(),
        Action::InputCancel => {
            state.ui_state.input = None;
        }
        Action::InputSubmit => submit_input(state, ctx),

        Action::Flash(on) => {
            state.ui_state.flash_on = on;
        }
    }
}

fn submit_input(state: &mut AppState, ctx: &mut Engine) {
    let Some(input) = state.ui_state.input.as_ref() else {
        return;
    };
    let purpose = input.purpose;
    let text = input.text.trim().to_string();

    if text.is_empty() {
        state.reject_input("Nothing entered");
        return;
    }

    match purpose {
        InputPurpose::AddRule => {
            if let Err(e) = PatternStore::validate(&text) {
                state.reject_input(e.to_string());
                return;
            }
            if !ctx.store.write().add_rule(&text) {
                state.reject_input("Pattern already exists");
                return;
            }
            state.ui_state.input = None;
            state.sync_config(&ctx.store.read());
            state.show_info(format!("Added pattern '{}'", text));
            reload_if_monitoring(state, ctx);
        }
        InputPurpose::LogSource => {
            let dir = PathBuf::from(&text);
            match start_monitoring(ctx, state, &dir) {
                Ok(()) => {
                    state.ui_state.input = None;
                    state.show_info(format!("Monitoring {}", dir.display()));
                }
                Err(e) => state.reject_input(e.to_string()),
            }
        }
        InputPurpose::ConsoleDirectory => {
            let dir = PathBuf::from(&text);
            if !dir.is_dir() {
                state.reject_input(LogError::MissingDirectory(dir).to_string());
                return;
            }
            ctx.store.write().set_console_log_directory(&dir);
            state.ui_state.input = None;
            state.sync_config(&ctx.store.read());
            state.show_info(format!("Console logs from {}", dir.display()));
        }
    }
}

fn reload(state: &mut AppState, ctx: &Engine) {
    if let Err(e) = ctx.session.reload() {
        report_error(state, &e);
    }
}

/// Re-filter after a rule change, silently when nothing is monitored
fn reload_if_monitoring(state: &mut AppState, ctx: &Engine) {
    if ctx.session.is_monitoring() {
        reload(state, ctx);
    }
}

fn combine(state: &mut AppState, ctx: &Engine) {
    let result = LogCombiner::new(&ctx.store.read()).combine(state.visible_content());
    match result {
        Ok(combined) => {
            let console = combined
                .console_log
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let console_len = combined.console_len;
            match write_export("combined", &combined.text) {
                Ok(filename) => state.show_info(format!(
                    "Combined with {} ({} bytes) into {}",
                    console, console_len, filename
                )),
                Err(e) => state.show_error(format!("Export failed: {}", e)),
            }
        }
        Err(e) => report_error(state, &e),
    }
}

/// Show an engine error, opening the matching prompt for missing configuration
fn report_error(state: &mut AppState, err: &LogError) {
    match err.kind() {
        ErrorKind::Configuration => {
            warn!("{}", err);
            state.show_error(err.to_string());
            let purpose = match err {
                LogError::NotConfigured(LOG_SOURCE_SETTING) => InputPurpose::LogSource,
                _ => InputPurpose::ConsoleDirectory,
            };
            state.open_input(purpose);
        }
        ErrorKind::EmptySource => state.show_info(err.to_string()),
        ErrorKind::InvalidPattern | ErrorKind::Io => {
            error!("{}", err);
            state.show_error(err.to_string());
        }
    }
}

fn export(state: &mut AppState, prefix: &str, text: &str) {
    match write_export(prefix, text) {
        Ok(filename) => state.show_info(format!("Exported to {}", filename)),
        Err(e) => state.show_error(format!("Export failed: {}", e)),
    }
}

/// Write `text` to `<prefix>_<timestamp>.log` in the working directory
fn write_export(prefix: &str, text: &str) -> Result<String> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("{}_{}.log", prefix, timestamp);
    fs::write(&filename, text).with_context(|| format!("failed to write {}", filename))?;
    info!("Exported {} bytes to {}", text.len(), filename);
    Ok(filename)
}

fn render(tui: &mut Tui, state: &mut AppState) -> Result<()> {
    if !state.render_dirty {
        return Ok(());
    }

    tui.set_title(&state.window_title())?;
    tui.terminal().draw(|frame| {
        match state.view {
            ViewMode::Log => LogViewerScreen::render(frame, state),
            ViewMode::Blocks => BlockPickerScreen::render(frame, state),
        }

        if state.ui_state.rules_visible {
            RulesOverlay::render(frame, state);
        }

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }

        if state.ui_state.confirm_clear {
            ConfirmDialog::render(frame, "Truncate debug.log? This cannot be undone.");
        }

        if let Some(input) = &state.ui_state.input {
            InputBar::render(frame, input);
        }
    })?;
    state.render_dirty = false;

    Ok(())
}
