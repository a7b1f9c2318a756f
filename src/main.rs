mod app;
mod config;
mod constants;
mod display;
mod favorites;
mod graphics;
mod history;
mod input;
mod logging;
mod movie;
mod omdb;
mod search;
mod storage;
mod theme;
mod trailer;
mod ui;
mod youtube;

use anyhow::{Result, bail};
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::Duration;
use tracing::{info, warn};

use app::App;
use config::{ApiKeys, Config};
use display::CliDisplayMode;
use favorites::FavoritesStore;
use history::HistoryStore;
use movie::MovieRecord;
use omdb::OmdbClient;
use search::SearchController;
use storage::{FileStore, KeyValueStore, MemoryStore};
use trailer::TrailerPanel;
use youtube::{YoutubeClient, watch_url};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Poster display mode: 'auto', 'direct', 'ascii', or 'off' (default: auto-detect)
  #[arg(short, long, default_value = "auto")]
  display_mode: CliDisplayMode,

  /// Movie title to look up on startup
  title: Option<String>,

  /// Release year to narrow the lookup
  #[arg(short, long)]
  year: Option<String>,

  /// Print the movie details (and trailer link, if a YouTube key is set) instead of opening the UI
  #[arg(short, long, requires = "title")]
  print: bool,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let _log_guard = match logging::init_logging() {
    Ok(guard) => Some(guard),
    Err(e) => {
      eprintln!("warning: logging disabled: {:#}", e);
      None
    }
  };
  info!(version = env!("CARGO_PKG_VERSION"), "starting");

  let config = Config::load();
  let keys = config.api_keys()?;
  let http = omdb::http_client()?;
  let (history, favorites) = open_stores();

  if args.print {
    return print_lookup(&args, keys, http, history).await;
  }

  let display_mode = display::resolve_display_mode(args.display_mode);
  info!(display_mode = display_mode.label(), "ui: starting");
  let mut app = App::new(config, keys, http, display_mode, history, favorites);
  if let Some(title) = &args.title {
    app.title_input.set(title);
    app.year_input.set(args.year.as_deref().unwrap_or_default());
    app.trigger_search();
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app);
  ratatui::restore();
  result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key)?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  info!("ui: exiting");
  Ok(())
}

/// History and favorites stores. Without a data dir nothing survives the
/// session, but the app still works.
fn open_stores() -> (HistoryStore, FavoritesStore) {
  let (history, favorites): (Box<dyn KeyValueStore>, Box<dyn KeyValueStore>) = match FileStore::in_data_dir() {
    Ok(store) => (Box::new(store.clone()), Box::new(store)),
    Err(e) => {
      warn!(err = %format!("{:#}", e), "storage: falling back to memory");
      let store = MemoryStore::default();
      (Box::new(store.clone()), Box::new(store))
    }
  };
  (HistoryStore::load(history), FavoritesStore::load(favorites))
}

// --- Print mode ---

async fn print_lookup(args: &Args, keys: ApiKeys, http: reqwest::Client, mut history: HistoryStore) -> Result<()> {
  let title = args.title.as_deref().unwrap_or_default();
  let omdb = OmdbClient::new(http.clone(), keys.omdb);
  let mut controller = SearchController::new();

  let movie = match controller.search(&omdb, &mut history, title, args.year.as_deref()).await {
    Ok(movie) => movie,
    Err(e) => bail!("{}", e),
  };
  print_movie(&movie);

  if let Some(key) = keys.youtube {
    let youtube = YoutubeClient::new(http, key);
    let mut panel = TrailerPanel::default();
    match panel.resolve(&youtube, &movie).await {
      Ok(video_id) => println!("{:<11}{}", "Trailer", watch_url(&video_id)),
      Err(e) => println!("{:<11}{}", "Trailer", e),
    }
  }
  Ok(())
}

fn print_movie(movie: &MovieRecord) {
  println!("{} ({})", movie.title, movie.year);
  let rows = [
    ("Rating", movie.imdb_rating.as_deref()),
    ("Rated", movie.rated.as_deref()),
    ("Runtime", movie.runtime.as_deref()),
    ("Genre", movie.genre.as_deref()),
    ("Director", movie.director.as_deref()),
    ("Actors", movie.actors.as_deref()),
    ("Box office", movie.box_office.as_deref()),
  ];
  for (label, value) in rows {
    println!("{:<11}{}", label, MovieRecord::display_field(value));
  }
  for rating in &movie.ratings_by_source {
    println!("  {}: {}", rating.source, rating.value);
  }
  println!();
  println!("{}", MovieRecord::display_field(movie.plot.as_deref()));
  println!();
  println!("{}", movie.imdb_url());
}
