use std::future::Future;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::history::HistoryStore;
use crate::movie::MovieRecord;

/// Why a lookup produced no movie. The `Display` text is what the status line shows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
  #[error("Enter a movie title.")]
  EmptyQuery,

  #[error("{0}")]
  NotFound(String),

  #[error("Error fetching movie data: {0}")]
  Network(String),
}

/// What gets sent to the metadata API: a trimmed title and an optional year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieQuery {
  pub title: String,
  pub year: Option<String>,
}

/// A backend that resolves a query to a single movie.
pub trait MovieSource {
  fn fetch(&self, query: &MovieQuery) -> impl Future<Output = Result<MovieRecord, SearchError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
  #[default]
  Idle,
  Loading,
  Succeeded,
  Failed,
}

/// Transient lookup state for the current session.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
  pub query: String,
  pub year: String,
  pub current: Option<MovieRecord>,
  pub error: Option<String>,
  pub phase: SearchPhase,
}

impl SearchState {
  pub fn is_loading(&self) -> bool {
    self.phase == SearchPhase::Loading
  }
}

/// Handed out by [`SearchController::begin`]; identifies one request cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
  pub generation: u64,
  pub query: MovieQuery,
}

/// What [`SearchController::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
  Applied,
  /// A newer search was started after this one; the outcome was dropped.
  Stale,
}

/// Owns the single "current movie" lookup.
///
/// A cycle is `begin` (validate, flip to loading, clear the previous result)
/// followed by `complete` with whatever the backend returned. Each `begin`
/// bumps a generation counter, so a slow response from a superseded search
/// cannot overwrite a newer one.
#[derive(Debug, Default)]
pub struct SearchController {
  state: SearchState,
  generation: u64,
}

impl SearchController {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> &SearchState {
    &self.state
  }

  pub fn current(&self) -> Option<&MovieRecord> {
    self.state.current.as_ref()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Start a cycle. An empty title fails immediately and nothing is requested;
  /// the previous result stays on screen in that case.
  pub fn begin(&mut self, title: &str, year: Option<&str>) -> Result<SearchTicket, SearchError> {
    let title = title.trim();
    let year = year.map(str::trim).filter(|y| !y.is_empty());
    if title.is_empty() {
      let err = SearchError::EmptyQuery;
      self.state.error = Some(err.to_string());
      return Err(err);
    }

    self.generation += 1;
    self.state.query = title.to_string();
    self.state.year = year.unwrap_or_default().to_string();
    self.state.current = None;
    self.state.error = None;
    self.state.phase = SearchPhase::Loading;
    info!(query = %title, year = ?year, generation = self.generation, "search: started");

    Ok(SearchTicket {
      generation: self.generation,
      query: MovieQuery { title: title.to_string(), year: year.map(str::to_string) },
    })
  }

  /// Finish a cycle. Successful lookups record the submitted title (not the
  /// canonical one) in `history`; failures leave history alone.
  pub fn complete(
    &mut self,
    ticket: &SearchTicket,
    outcome: Result<MovieRecord, SearchError>,
    history: &mut HistoryStore,
  ) -> Completion {
    if ticket.generation != self.generation {
      debug!(stale = ticket.generation, latest = self.generation, "search: dropping stale response");
      return Completion::Stale;
    }

    match outcome {
      Ok(movie) => {
        info!(query = %ticket.query.title, id = %movie.external_id, "search: found");
        history.record(&ticket.query.title);
        self.state.current = Some(movie);
        self.state.error = None;
        self.state.phase = SearchPhase::Succeeded;
      }
      Err(e) => {
        warn!(query = %ticket.query.title, err = %e, "search: failed");
        self.state.current = None;
        self.state.error = Some(e.to_string());
        self.state.phase = SearchPhase::Failed;
      }
    }
    Completion::Applied
  }

  /// Run a whole cycle against `source`.
  pub async fn search<S: MovieSource>(
    &mut self,
    source: &S,
    history: &mut HistoryStore,
    title: &str,
    year: Option<&str>,
  ) -> Result<MovieRecord, SearchError> {
    let ticket = self.begin(title, year)?;
    let outcome = source.fetch(&ticket.query).await;
    self.complete(&ticket, outcome.clone(), history);
    outcome
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::movie::sample_movie;
  use crate::storage::MemoryStore;
  use std::sync::Mutex;

  /// Replays canned outcomes and records every query it sees.
  struct FakeSource {
    outcome: Result<MovieRecord, SearchError>,
    calls: Mutex<Vec<MovieQuery>>,
  }

  impl FakeSource {
    fn returning(outcome: Result<MovieRecord, SearchError>) -> Self {
      Self { outcome, calls: Mutex::new(Vec::new()) }
    }

    fn calls(&self) -> Vec<MovieQuery> {
      self.calls.lock().unwrap().clone()
    }
  }

  impl MovieSource for FakeSource {
    fn fetch(&self, query: &MovieQuery) -> impl Future<Output = Result<MovieRecord, SearchError>> + Send {
      self.calls.lock().unwrap().push(query.clone());
      let outcome = self.outcome.clone();
      async move { outcome }
    }
  }

  fn history() -> HistoryStore {
    HistoryStore::load(Box::new(MemoryStore::default()))
  }

  // --- validation ---

  #[tokio::test]
  async fn empty_query_never_hits_the_source() {
    let source = FakeSource::returning(Ok(sample_movie("tt1", "x")));
    let mut history = history();
    let mut controller = SearchController::new();

    let result = controller.search(&source, &mut history, "   ", None).await;
    assert_eq!(result, Err(SearchError::EmptyQuery));
    assert!(source.calls().is_empty());
    assert_eq!(controller.state().error.as_deref(), Some("Enter a movie title."));
    assert!(!controller.is_loading());
    assert!(history.is_empty());
  }

  #[test]
  fn begin_flips_loading_and_clears_previous_result() {
    let mut history = history();
    let mut controller = SearchController::new();
    let ticket = controller.begin("Heat", None).unwrap();
    controller.complete(&ticket, Ok(sample_movie("tt0113277", "Heat")), &mut history);
    assert!(controller.current().is_some());

    controller.begin("Alien", Some("1979")).unwrap();
    assert!(controller.is_loading());
    assert!(controller.current().is_none());
    assert!(controller.state().error.is_none());
  }

  #[test]
  fn begin_trims_title_and_drops_blank_year() {
    let mut controller = SearchController::new();
    let ticket = controller.begin("  Heat ", Some("  ")).unwrap();
    assert_eq!(ticket.query, MovieQuery { title: "Heat".to_string(), year: None });
    let ticket = controller.begin("Heat", Some(" 1995")).unwrap();
    assert_eq!(ticket.query.year.as_deref(), Some("1995"));
  }

  // --- outcomes ---

  #[tokio::test]
  async fn success_records_submitted_title_in_history() {
    let source = FakeSource::returning(Ok(sample_movie("tt0133093", "The Matrix")));
    let mut history = history();
    let mut controller = SearchController::new();

    let movie = controller.search(&source, &mut history, "matrix", Some("1999")).await.unwrap();
    assert_eq!(movie.external_id, "tt0133093");
    assert_eq!(history.entries(), ["matrix"]);
    assert_eq!(controller.state().phase, SearchPhase::Succeeded);
    assert_eq!(source.calls(), vec![MovieQuery { title: "matrix".to_string(), year: Some("1999".to_string()) }]);
  }

  #[tokio::test]
  async fn repeated_searches_resolve_same_id() {
    let source = FakeSource::returning(Ok(sample_movie("tt0133093", "The Matrix")));
    let mut history = history();
    let mut controller = SearchController::new();
    let first = controller.search(&source, &mut history, "Matrix", None).await.unwrap();
    let second = controller.search(&source, &mut history, "Matrix", None).await.unwrap();
    assert_eq!(first.external_id, second.external_id);
    assert_eq!(history.len(), 1);
  }

  #[tokio::test]
  async fn not_found_sets_error_and_leaves_history_alone() {
    let source = FakeSource::returning(Err(SearchError::NotFound("Movie not found!".to_string())));
    let mut history = history();
    let mut controller = SearchController::new();

    let result = controller.search(&source, &mut history, "zzzzzz", None).await;
    assert!(matches!(result, Err(SearchError::NotFound(_))));
    assert!(history.is_empty());
    assert!(controller.current().is_none());
    assert_eq!(controller.state().error.as_deref(), Some("Movie not found!"));
    assert!(!controller.is_loading());
  }

  #[tokio::test]
  async fn failure_blanks_previous_result() {
    let mut history = history();
    let mut controller = SearchController::new();
    let ok = FakeSource::returning(Ok(sample_movie("tt1", "Heat")));
    controller.search(&ok, &mut history, "Heat", None).await.unwrap();

    let down = FakeSource::returning(Err(SearchError::Network("connection refused".to_string())));
    let _ = controller.search(&down, &mut history, "Alien", None).await;
    assert!(controller.current().is_none());
    assert_eq!(controller.state().phase, SearchPhase::Failed);
    assert_eq!(history.entries(), ["Heat"]);
  }

  // --- races ---

  #[test]
  fn stale_response_is_discarded() {
    let mut history = history();
    let mut controller = SearchController::new();
    let slow = controller.begin("Heat", None).unwrap();
    let fast = controller.begin("Alien", None).unwrap();

    assert_eq!(controller.complete(&fast, Ok(sample_movie("tt0078748", "Alien")), &mut history), Completion::Applied);
    assert_eq!(controller.complete(&slow, Ok(sample_movie("tt0113277", "Heat")), &mut history), Completion::Stale);

    assert_eq!(controller.current().map(|m| m.title.as_str()), Some("Alien"));
    assert_eq!(history.entries(), ["Alien"]);
  }

  #[test]
  fn stale_failure_does_not_clear_newer_loading_state() {
    let mut history = history();
    let mut controller = SearchController::new();
    let old = controller.begin("Heat", None).unwrap();
    controller.begin("Alien", None).unwrap();
    controller.complete(&old, Err(SearchError::Network("timeout".to_string())), &mut history);
    assert!(controller.is_loading());
    assert!(controller.state().error.is_none());
  }
}
