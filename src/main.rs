mod admin;
mod app;
mod backend;
mod config;
mod constants;
mod display;
mod form;
mod gallery;
mod graphics;
mod input;
mod model;
mod resolver;
mod rest;
mod session;
mod theme;
mod ui;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand};
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
  },
};
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use constants::constants;
use display::{CliDisplayMode, resolve_display_mode};
use rest::RestBackend;
use session::Session;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Thumbnail rendering: 'auto', 'direct' (half-block true color) or 'ascii'
  #[arg(short, long, value_enum, default_value = "auto")]
  display_mode: CliDisplayMode,

  /// Hosted backend base URL (overrides REEL_BACKEND_URL and prefs.toml)
  #[arg(long, value_name = "URL")]
  backend_url: Option<String>,

  /// Public API key sent with every request (overrides REEL_API_KEY and prefs.toml)
  #[arg(long, value_name = "KEY")]
  api_key: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Resolve a YouTube or Google Drive link to its reference id, thumbnail and embed URL
  Resolve {
    /// The pasted link
    url: String,
  },
  /// Print shell completions
  Completions {
    #[arg(value_enum)]
    shell: clap_complete::Shell,
  },
}

// --- Subcommands ---

fn print_resolution(url: &str) -> Result<()> {
  let id = resolver::extract_reference_id(url)
    .ok_or_else(|| anyhow!("invalid URL: no YouTube or Google Drive video id in '{}'", url.trim()))?;
  let thumbnail = resolver::resolve_thumbnail(&id).unwrap_or_else(|| "none (live preview only)".to_string());
  let embed = resolver::embed_for(&id);
  println!("id:        {}", id);
  println!("kind:      {}", id.kind().label());
  println!("thumbnail: {}", thumbnail);
  println!("embed:     {}", embed.url());
  println!("open:      {}", resolver::watch_url(&id));
  Ok(())
}

fn print_completions(shell: clap_complete::Shell) {
  let mut cmd = Args::command();
  let name = cmd.get_name().to_string();
  clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

// --- Logging ---

/// Log to a file in the data dir; the terminal belongs to the UI.
fn init_logging() -> Option<WorkerGuard> {
  let dir = ProjectDirs::from("", "", &constants().app_name)?.data_dir().to_path_buf();
  std::fs::create_dir_all(&dir).ok()?;
  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, &constants().log_file));
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reel=info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).try_init().ok()?;
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  match args.command {
    Some(Command::Resolve { ref url }) => return print_resolution(url),
    Some(Command::Completions { shell }) => {
      print_completions(shell);
      return Ok(());
    }
    None => {}
  }

  let _log_guard = init_logging();
  let prefs = Config::load();
  let settings = prefs.backend_settings(args.backend_url.clone(), args.api_key.clone())?;
  let backend = RestBackend::new(&settings)?;
  let display_mode = resolve_display_mode(args.display_mode);
  info!(backend = %settings.url, mode = display_mode.label(), "starting");
  let app = App::new(backend, Session::load(), prefs, display_mode);

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  if let Err(e) = execute!(std::io::stdout(), EnableMouseCapture) {
    warn!(err = %e, "mouse capture unavailable, overlay closes by key only");
  }
  let result = run(&mut terminal, app).await;
  let _ = execute!(std::io::stdout(), DisableMouseCapture);
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
  app.trigger_site_load();

  loop {
    app.check_pending();
    app.expire_messages();

    terminal.draw(|frame| ui::ui(frame, &mut app)).context("Failed to draw frame")?;

    if event::poll(Duration::from_millis(100)).context("Failed to poll terminal events")? {
      match event::read().context("Failed to read terminal event")? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key).await;
        }
        Event::Mouse(mouse) => input::handle_mouse_event(&mut app, mouse),
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  info!("exiting");
  Ok(())
}
