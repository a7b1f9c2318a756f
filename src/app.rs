use anyhow::Result;
use image::DynamicImage;
use ratatui::widgets::ListState;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::{ApiKeys, Config};
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::favorites::{FavoritesStore, SortKey};
use crate::history::HistoryStore;
use crate::input::{TextField, clamp_selection};
use crate::movie::MovieRecord;
use crate::omdb::{OmdbClient, fetch_poster};
use crate::search::{Completion, MovieSource, SearchController, SearchError, SearchTicket};
use crate::theme::{THEMES, Theme, theme_index};
use crate::trailer::{TrailerError, TrailerPanel, TrailerState, TrailerTicket, VideoSource};
use crate::youtube::{YoutubeClient, watch_url};

// --- Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Title,
  Year,
  History,
  Favorites,
  /// Editing the genre filter over the favorites list.
  Filter,
}

impl AppMode {
  /// Tab order: title, year, history, favorites.
  pub fn next(self) -> Self {
    match self {
      AppMode::Title => AppMode::Year,
      AppMode::Year => AppMode::History,
      AppMode::History => AppMode::Favorites,
      AppMode::Favorites | AppMode::Filter => AppMode::Title,
    }
  }

  pub fn previous(self) -> Self {
    match self {
      AppMode::Title => AppMode::Favorites,
      AppMode::Year => AppMode::Title,
      AppMode::History => AppMode::Year,
      AppMode::Favorites => AppMode::History,
      AppMode::Filter => AppMode::Favorites,
    }
  }
}

/// A search whose response has not arrived yet. Superseded searches stay
/// here until they finish; the controller drops their outcome as stale.
pub(crate) struct PendingSearch {
  ticket: SearchTicket,
  rx: oneshot::Receiver<Result<MovieRecord, SearchError>>,
}

/// In-flight async task receivers.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) searches: Vec<PendingSearch>,
  pub(crate) trailer: Option<(TrailerTicket, oneshot::Receiver<Result<String, TrailerError>>)>,
  pub(crate) poster: Option<(String, oneshot::Receiver<Result<DynamicImage>>)>,
}

/// Downloaded poster plus the last fitted copy, keyed by movie id and area size.
#[derive(Default)]
pub struct PosterCache {
  pub image: Option<(String, DynamicImage)>,
  pub fitted: Option<(String, u16, u16, DynamicImage)>,
}

pub struct App {
  pub mode: AppMode,
  pub title_input: TextField,
  pub year_input: TextField,
  /// Genre substring applied to the favorites list.
  pub filter_input: TextField,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  pub search: SearchController,
  pub history: HistoryStore,
  pub favorites: FavoritesStore,
  pub favorites_sort: SortKey,
  pub trailer: TrailerPanel,
  pub history_state: ListState,
  pub favorites_state: ListState,
  pub poster: PosterCache,
  pub last_error: Option<String>,
  /// Informational message, lower priority than loading status and errors.
  pub info_message: Option<String>,
  pub should_quit: bool,
  pub(crate) tasks: AsyncTasks,
  config: Config,
  http: Client,
  omdb: OmdbClient,
  youtube: Option<YoutubeClient>,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(
    config: Config,
    keys: ApiKeys,
    http: Client,
    display_mode: DisplayMode,
    history: HistoryStore,
    favorites: FavoritesStore,
  ) -> Self {
    let theme_index = theme_index(config.theme_name.as_deref());
    let favorites_sort = config.favorites_sort.as_deref().map(SortKey::from_config).unwrap_or_default();
    let omdb = OmdbClient::new(http.clone(), keys.omdb);
    let youtube = keys.youtube.map(|key| YoutubeClient::new(http.clone(), key));

    let mut history_state = ListState::default();
    clamp_selection(&mut history_state, history.len());
    let mut favorites_state = ListState::default();
    clamp_selection(&mut favorites_state, favorites.len());

    Self {
      mode: AppMode::Title,
      title_input: TextField::default(),
      year_input: TextField::default(),
      filter_input: TextField::default(),
      theme_index,
      display_mode,
      search: SearchController::new(),
      history,
      favorites,
      favorites_sort,
      trailer: TrailerPanel::default(),
      history_state,
      favorites_state,
      poster: PosterCache::default(),
      last_error: None,
      info_message: None,
      should_quit: false,
      tasks: AsyncTasks::default(),
      config,
      http,
      omdb,
      youtube,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  /// The text field that receives typed characters in the current mode.
  pub fn focused_field(&mut self) -> &mut TextField {
    match self.mode {
      AppMode::Year => &mut self.year_input,
      AppMode::Filter => &mut self.filter_input,
      AppMode::Title | AppMode::History | AppMode::Favorites => &mut self.title_input,
    }
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after `error_dismiss_secs`.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.clear_error();
    }
  }

  /// Short status text while something is loading.
  pub fn status_message(&self) -> Option<String> {
    if self.search.is_loading() {
      let state = self.search.state();
      return Some(if state.year.is_empty() {
        format!("Searching '{}'…", state.query)
      } else {
        format!("Searching '{}' ({})…", state.query, state.year)
      });
    }
    if matches!(self.trailer.state(), TrailerState::Loading { .. }) {
      return Some("Looking up trailer…".to_string());
    }
    None
  }

  // --- Search ---

  /// Search for whatever is in the title and year boxes.
  pub fn trigger_search(&mut self) {
    let title = self.title_input.text.clone();
    let year = self.year_input.text.clone();
    self.start_search(&title, Some(&year));
  }

  fn start_search(&mut self, title: &str, year: Option<&str>) {
    self.info_message = None;
    let ticket = match self.search.begin(title, year) {
      Ok(ticket) => ticket,
      Err(e) => {
        debug!(err = %e, "search: rejected");
        return;
      }
    };
    self.close_trailer();
    self.tasks.poster = None;
    self.poster = PosterCache::default();

    let source = self.omdb.clone();
    let query = ticket.query.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(source.fetch(&query).await);
    });
    self.tasks.searches.push(PendingSearch { ticket, rx });
  }

  pub fn search_selected_history(&mut self) {
    let Some(term) = self.history_state.selected().and_then(|i| self.history.entries().get(i)).cloned() else {
      return;
    };
    self.title_input.set(&term);
    self.year_input.clear();
    self.mode = AppMode::Title;
    self.start_search(&term, None);
  }

  pub fn remove_selected_history(&mut self) {
    let Some(term) = self.history_state.selected().and_then(|i| self.history.entries().get(i)).cloned() else {
      return;
    };
    self.history.remove(&term);
    clamp_selection(&mut self.history_state, self.history.len());
  }

  pub fn clear_history(&mut self) {
    self.history.clear();
    clamp_selection(&mut self.history_state, 0);
    self.info_message = Some("History cleared.".to_string());
  }

  // --- Favorites ---

  /// Favorites as currently presented: filtered by genre, then sorted.
  pub fn favorites_view(&self) -> Vec<MovieRecord> {
    self.favorites.view(self.favorites_sort, &self.filter_input.text)
  }

  pub fn selected_favorite(&self) -> Option<MovieRecord> {
    let idx = self.favorites_state.selected()?;
    self.favorites_view().into_iter().nth(idx)
  }

  pub fn refresh_favorites_selection(&mut self) {
    let count = self.favorites_view().len();
    clamp_selection(&mut self.favorites_state, count);
  }

  pub fn is_current_favorite(&self) -> bool {
    self.search.current().is_some_and(|m| self.favorites.contains(&m.external_id))
  }

  /// Save or unsave the movie on screen.
  pub fn toggle_favorite(&mut self) {
    let Some(movie) = self.search.current().cloned() else {
      self.set_error("Search for a movie first.".to_string());
      return;
    };
    let toggled = self.favorites.toggle(&movie);
    info!(id = %movie.external_id, added = toggled.added, "favorites: toggled");
    if toggled.added {
      self.info_message = Some(format!("Saved '{}' to favorites.", movie.title));
    } else {
      self.on_favorite_removed(&movie.external_id);
      self.info_message = Some(format!("Removed '{}' from favorites.", movie.title));
    }
    self.refresh_favorites_selection();
  }

  pub fn remove_selected_favorite(&mut self) {
    let Some(movie) = self.selected_favorite() else { return };
    self.favorites.remove(&movie.external_id);
    self.on_favorite_removed(&movie.external_id);
    self.refresh_favorites_selection();
  }

  /// Un-favoriting the movie whose trailer is open closes the trailer.
  fn on_favorite_removed(&mut self, external_id: &str) {
    if self.trailer.is_open_for(external_id) {
      self.close_trailer();
    }
  }

  pub fn search_selected_favorite(&mut self) {
    let Some(movie) = self.selected_favorite() else { return };
    let year = movie.query_year().unwrap_or_default();
    self.title_input.set(&movie.title);
    self.year_input.set(&year);
    self.start_search(&movie.title, Some(&year));
  }

  pub fn next_sort(&mut self) {
    self.favorites_sort = self.favorites_sort.next();
    self.config.favorites_sort = Some(self.favorites_sort.label().to_string());
    self.config.save();
  }

  // --- Trailer ---

  /// Close the panel and drop any lookup still in flight.
  pub fn close_trailer(&mut self) {
    self.trailer.close();
    self.tasks.trailer = None;
  }

  /// Open the trailer for the movie on screen, or close it if open.
  pub fn toggle_trailer(&mut self) {
    if self.trailer.is_open() {
      self.close_trailer();
      return;
    }
    let Some(movie) = self.search.current().cloned() else {
      self.set_error("Search for a movie first.".to_string());
      return;
    };
    let Some(youtube) = self.youtube.clone() else {
      self.trailer.fail(&movie, TrailerError::Unconfigured);
      return;
    };

    let ticket = self.trailer.open(&movie);
    let query = ticket.query.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(youtube.find_video(&query).await);
    });
    self.tasks.trailer = Some((ticket, rx));
  }

  /// Open the resolved trailer, or the IMDb page when no trailer is playing.
  pub fn open_in_browser(&mut self) {
    let url = match self.trailer.state() {
      TrailerState::Playing { video_id, .. } => watch_url(video_id),
      _ => match self.search.current() {
        Some(movie) => movie.imdb_url(),
        None => return,
      },
    };
    if let Err(e) = open_url(&url) {
      self.set_error(format!("Failed to open browser: {}", e));
    }
  }

  // --- Background results ---

  pub fn check_pending(&mut self) {
    let mut still_pending = Vec::new();
    for mut pending in std::mem::take(&mut self.tasks.searches) {
      let outcome = match pending.rx.try_recv() {
        Ok(outcome) => outcome,
        Err(oneshot::error::TryRecvError::Empty) => {
          still_pending.push(pending);
          continue;
        }
        Err(oneshot::error::TryRecvError::Closed) => Err(SearchError::Network("Search task failed.".to_string())),
      };
      if self.search.complete(&pending.ticket, outcome, &mut self.history) == Completion::Applied {
        self.on_search_applied();
      }
    }
    self.tasks.searches = still_pending;

    if let Some((ticket, mut rx)) = self.tasks.trailer.take() {
      match rx.try_recv() {
        Ok(outcome) => {
          self.trailer.complete(&ticket, outcome);
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.trailer = Some((ticket, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.trailer.complete(&ticket, Err(TrailerError::Fetch("Trailer task failed.".to_string())));
        }
      }
    }

    if let Some((movie_id, mut rx)) = self.tasks.poster.take() {
      match rx.try_recv() {
        Ok(Ok(image)) => {
          if self.search.current().is_some_and(|m| m.external_id == movie_id) {
            self.poster.image = Some((movie_id, image));
            self.poster.fitted = None;
          }
        }
        Ok(Err(e)) => {
          // No poster is not an error worth surfacing; the text view still works.
          warn!(id = %movie_id, err = %format!("{:#}", e), "poster: fetch failed");
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.poster = Some((movie_id, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }
  }

  fn on_search_applied(&mut self) {
    clamp_selection(&mut self.history_state, self.history.len());
    if self.search.current().is_some() {
      self.history_state.select(Some(0));
      self.trigger_poster();
    }
  }

  fn trigger_poster(&mut self) {
    if !self.display_mode.shows_posters() {
      return;
    }
    let Some(movie) = self.search.current() else { return };
    let Some(url) = movie.poster().map(str::to_string) else { return };
    let movie_id = movie.external_id.clone();
    let client = self.http.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(fetch_poster(&client, &url).await);
    });
    self.tasks.poster = Some((movie_id, rx));
  }
}

/// Hand a URL to the platform's default browser.
fn open_url(url: &str) -> std::io::Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()?;
  // Reap in the background so the child doesn't linger as a zombie.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}
