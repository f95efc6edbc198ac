use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use editsel::{EditableSelect, RawConfig, SelectSource, SourceOption};
use toml::Value;
use tracing_subscriber::EnvFilter;

mod app;
mod ui;
mod widgets;

use app::App;

/// How long the event loop waits for input before running deferred work.
const FRAME: Duration = Duration::from_millis(33);

/// Pick a value from a list of options, or type a new one
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Options file: TOML with [[option]] tables, or one option per line
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Extra option, appended after the source's options (repeatable)
    #[arg(short = 'o', long = "option")]
    options: Vec<String>,

    /// TOML file with widget configuration, layered over the source's [config]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Filter the list as you type (true/false)
    #[arg(long)]
    filter: Option<String>,

    /// Panel transition: default, fade or slide
    #[arg(long)]
    effects: Option<String>,

    /// Transition length: fast, slow or milliseconds
    #[arg(long)]
    duration: Option<String>,

    /// When the list opens: focus or manual
    #[arg(long)]
    trigger: Option<String>,

    /// Offer typed text as a new option (true/false)
    #[arg(long)]
    create: Option<String>,

    /// Text shown while the input is empty
    #[arg(long)]
    placeholder: Option<String>,

    /// Label for the typed-text entry; must contain %%%
    #[arg(long)]
    add_text: Option<String>,

    /// Where the list panel sits: input or footer
    #[arg(long)]
    append_to: Option<String>,

    /// Rows shown in the list before it scrolls
    #[arg(long)]
    max_rows: Option<String>,

    /// Print the accepted option as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Write logs to this file (filter with EDITSEL_LOG)
    #[arg(long, env = "EDITSEL_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Configuration given on the command line, the topmost layer.
    fn raw_config(&self) -> RawConfig {
        let value = |arg: &Option<String>| arg.clone().map(Value::String);
        RawConfig {
            filter: value(&self.filter),
            effects: value(&self.effects),
            duration: value(&self.duration),
            trigger: value(&self.trigger),
            create: value(&self.create),
            placeholder: value(&self.placeholder),
            add_text: value(&self.add_text),
            append_to: value(&self.append_to),
            max_rows: value(&self.max_rows),
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let mut source = match &args.source {
        Some(path) => SelectSource::from_path(path)?,
        None => SelectSource::default(),
    };
    source
        .options
        .extend(args.options.iter().map(SourceOption::new));

    if source.options.is_empty() {
        return Err(eyre!(
            "No options to choose from. Pass --source or --option. Use --help for usage information."
        ));
    }

    let mut config = match &args.config {
        Some(path) => RawConfig::from_path(path)?,
        None => RawConfig::default(),
    };
    config = config.merge(args.raw_config());

    let widget = EditableSelect::create(source, config);

    // Enable mouse capture before initializing the terminal
    crossterm::execute!(std::io::stderr(), crossterm::event::EnableMouseCapture)?;

    let mut terminal = ratatui::init();
    let mut app = App::new(widget);
    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal and disable mouse capture
    ratatui::restore();
    crossterm::execute!(std::io::stderr(), crossterm::event::DisableMouseCapture)?;

    let accepted = result?;
    let output = app.output(args.json);
    let source = app.finish();
    tracing::info!(options = source.options.len(), accepted, "session finished");

    if accepted {
        println!("{output}");
    }
    Ok(())
}

/// Route tracing output to `path`; without a log file nothing is recorded,
/// since the terminal belongs to the UI.
fn init_logging(path: Option<&PathBuf>) -> color_eyre::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .wrap_err_with(|| format!("Failed to create log file '{}'", path.display()))?;
    let filter = EnvFilter::try_from_env("EDITSEL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Returns `true` when the user accepted the input.
fn run_event_loop(terminal: &mut ratatui::DefaultTerminal, app: &mut App) -> color_eyre::Result<bool> {
    use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

    loop {
        app.tick();
        terminal.draw(|frame| {
            app.sync_layout(frame.area());
            ui::render(frame, app);
        })?;

        if !event::poll(FRAME)? {
            continue;
        }

        let action = match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Global quit shortcut
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    return Ok(false);
                }

                app.handle_key(key)
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            // Terminal will be redrawn on next loop iteration
            _ => app::Action::None,
        };

        match action {
            app::Action::None => {}
            app::Action::Quit => return Ok(false),
            app::Action::Accept => return Ok(true),
        }
    }
}
