//! `reel` — terminal stories viewer.
//!
//! # Usage
//!
//! ```
//! reel
//! reel --ephemeral --story-seconds 2
//! reel --config ~/.config/reel/config.toml
//! ```
//!
//! Set `REEL_LOG=/path/to/file` to write logs; the terminal itself is never
//! logged to.

mod app;
mod fetch;
mod ui;

use std::{
  io,
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use crossterm::{
  event::{self, DisableMouseCapture, EnableMouseCapture, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use fetch::HttpFetcher;
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use reel_core::{
  feed::{Feed, FeedConfig, WrapPolicy},
  memory::MemoryStore,
  mock::{DEFAULT_IMAGE_BASE, MockContentSource},
  store::EngagementStore,
  viewer::ViewerConfig,
};
use reel_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for terminal input before the next frame.
const FRAME: Duration = Duration::from_millis(16);

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "reel", about = "Terminal stories viewer")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// SQLite file holding viewed/liked state (default: ~/.local/share/reel/reel.db).
  #[arg(long, env = "REEL_STORE")]
  store: Option<PathBuf>,

  /// Keep viewed/liked state in memory only.
  #[arg(long)]
  ephemeral: bool,

  /// Users fetched per page.
  #[arg(long, env = "REEL_PAGE_SIZE")]
  page_size: Option<usize>,

  /// Simulated latency of one page fetch, in milliseconds.
  #[arg(long, env = "REEL_LATENCY_MS")]
  latency_ms: Option<u64>,

  /// Seconds each story stays on screen.
  #[arg(long, env = "REEL_STORY_SECONDS")]
  story_seconds: Option<f64>,

  /// Generate exactly this many stories per user (1-4) instead of a random count.
  #[arg(long)]
  stories_per_user: Option<u32>,

  /// What to do when the roster wraps around.
  #[arg(long, value_enum)]
  wrap_policy: Option<WrapArg>,

  /// Base URL of the image service.
  #[arg(long, env = "REEL_IMAGE_BASE")]
  image_base_url: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum WrapArg {
  Deduplicate,
  Append,
}

impl From<WrapArg> for WrapPolicy {
  fn from(arg: WrapArg) -> Self {
    match arg {
      WrapArg::Deduplicate => WrapPolicy::Deduplicate,
      WrapArg::Append => WrapPolicy::Append,
    }
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  store_path:       Option<PathBuf>,
  #[serde(default)]
  ephemeral:        bool,
  stories_per_user: Option<u32>,
  image_base_url:   Option<String>,
  #[serde(default)]
  feed:             FeedConfig,
  #[serde(default)]
  viewer:           ViewerConfig,
}

/// Everything `run` needs, after merging flags, file and defaults.
struct Settings {
  store_path:       PathBuf,
  ephemeral:        bool,
  stories_per_user: Option<u32>,
  image_base_url:   String,
  feed:             FeedConfig,
  viewer:           ViewerConfig,
}

impl Settings {
  /// CLI flags override the config file, which overrides defaults.
  fn merge(args: Args, file: ConfigFile) -> Self {
    let mut feed = file.feed;
    if let Some(n) = args.page_size {
      feed.page_size = n;
    }
    if let Some(ms) = args.latency_ms {
      feed.latency_ms = ms;
    }
    if let Some(policy) = args.wrap_policy {
      feed.wrap_policy = policy.into();
    }

    let mut viewer = file.viewer;
    if let Some(secs) = args.story_seconds {
      viewer.story_seconds = secs;
    }

    Self {
      store_path: args
        .store
        .or(file.store_path)
        .unwrap_or_else(|| PathBuf::from("~/.local/share/reel/reel.db")),
      ephemeral: args.ephemeral || file.ephemeral,
      stories_per_user: args.stories_per_user.or(file.stories_per_user),
      image_base_url: args
        .image_base_url
        .or(file.image_base_url)
        .unwrap_or_else(|| DEFAULT_IMAGE_BASE.to_string()),
      feed,
      viewer,
    }
  }

  fn content_source(&self) -> MockContentSource {
    let source = MockContentSource::with_image_base(self.image_base_url.clone());
    match self.stories_per_user {
      Some(n) => source.with_story_count(n),
      None => source,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  init_tracing();
  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };
  let settings = Settings::merge(args, file_cfg);

  if settings.ephemeral {
    info!("using in-memory engagement store");
    return run(MemoryStore::new(), settings).await;
  }

  let store_path = expand_tilde(&settings.store_path);
  if let Some(parent) = store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("creating {}", parent.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  info!(path = %store_path.display(), "opened engagement store");
  run(store, settings).await
}

async fn run<S: EngagementStore + 'static>(store: S, settings: Settings) -> Result<()> {
  let feed = Feed::new(store, settings.content_source(), settings.feed.clone());
  let fetcher = Arc::new(HttpFetcher::new()?);
  let mut app = App::new(feed, settings.viewer.clone(), fetcher);
  app.start_loading();

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
    .context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app).await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop<S: EngagementStore + 'static>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<S, HttpFetcher>,
) -> Result<()> {
  loop {
    app.sync_feed();
    app.pump_viewer().await;
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(FRAME)? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) => {
        if !app.handle_key(key).await? {
          break;
        }
      }
      Some(Event::Mouse(mouse)) => {
        let size = terminal.size().context("reading terminal size")?;
        app.handle_mouse(mouse, Rect::new(0, 0, size.width, size.height)).await;
      }
      // Resizes and everything else redraw on the next iteration.
      _ => {}
    }
  }

  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Write logs to the file named by `REEL_LOG`; stay silent otherwise so the
/// TUI is not corrupted.
fn init_tracing() {
  let Ok(log_path) = std::env::var("REEL_LOG") else {
    return;
  };
  let Ok(file) = std::fs::File::create(&log_path) else {
    eprintln!("warning: cannot create log file {log_path}");
    return;
  };

  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new("reel_core=debug,reel_store_sqlite=debug,reel=info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
    .init();
}

/// Expand a leading `~/` to `$HOME/`.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
