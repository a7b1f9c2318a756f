use std::future::Future;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::movie::{MovieRecord, present};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrailerError {
  #[error("No trailer found.")]
  NotFound,

  #[error("Failed to fetch trailer: {0}")]
  Fetch(String),

  #[error("Trailer lookup needs a YouTube API key (set YOUTUBE_API_KEY).")]
  Unconfigured,
}

/// A backend that maps a free-text query to one embeddable video id.
pub trait VideoSource {
  fn find_video(&self, query: &str) -> impl Future<Output = Result<String, TrailerError>> + Send;
}

/// Search text for a movie's trailer: title, year, genre and the two lead actors.
pub fn trailer_query(movie: &MovieRecord) -> String {
  let mut parts: Vec<&str> = vec![movie.title.trim()];
  parts.extend(present(Some(movie.year.as_str())));
  parts.extend(present(movie.genre.as_deref()));
  parts.extend(movie.lead_actors(2));
  parts.push("trailer");
  parts.retain(|p| !p.is_empty());
  parts.join(" ")
}

/// Per-movie trailer panel.
///
/// `Closed -> Loading -> Playing | Failed -> Closed`. Closing from any state
/// forgets the resolved id, so reopening always looks the trailer up again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrailerState {
  #[default]
  Closed,
  Loading { movie_id: String },
  Playing { movie_id: String, video_id: String },
  Failed { movie_id: String, message: String },
}

impl TrailerState {
  /// The movie the panel is currently open for.
  pub fn movie_id(&self) -> Option<&str> {
    match self {
      TrailerState::Closed => None,
      TrailerState::Loading { movie_id }
      | TrailerState::Playing { movie_id, .. }
      | TrailerState::Failed { movie_id, .. } => Some(movie_id.as_str()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailerTicket {
  pub generation: u64,
  pub movie_id: String,
  pub query: String,
}

#[derive(Debug, Default)]
pub struct TrailerPanel {
  state: TrailerState,
  generation: u64,
}

impl TrailerPanel {
  pub fn state(&self) -> &TrailerState {
    &self.state
  }

  pub fn is_open(&self) -> bool {
    self.state != TrailerState::Closed
  }

  /// Whether the panel is showing (or fetching) the trailer for `movie_id`.
  pub fn is_open_for(&self, movie_id: &str) -> bool {
    self.state.movie_id() == Some(movie_id)
  }

  /// Enter `Loading` for `movie` and hand back what to look up.
  pub fn open(&mut self, movie: &MovieRecord) -> TrailerTicket {
    self.generation += 1;
    self.state = TrailerState::Loading { movie_id: movie.external_id.clone() };
    let query = trailer_query(movie);
    info!(id = %movie.external_id, query = %query, "trailer: resolving");
    TrailerTicket { generation: self.generation, movie_id: movie.external_id.clone(), query }
  }

  /// Apply a lookup result. Results for a closed or superseded lookup are ignored.
  pub fn complete(&mut self, ticket: &TrailerTicket, outcome: Result<String, TrailerError>) -> bool {
    let current = matches!(&self.state, TrailerState::Loading { movie_id } if *movie_id == ticket.movie_id);
    if ticket.generation != self.generation || !current {
      debug!(id = %ticket.movie_id, "trailer: dropping result for closed lookup");
      return false;
    }
    let movie_id = ticket.movie_id.clone();
    self.state = match outcome {
      Ok(video_id) => {
        info!(id = %movie_id, video = %video_id, "trailer: resolved");
        TrailerState::Playing { movie_id, video_id }
      }
      Err(e) => {
        warn!(id = %movie_id, err = %e, "trailer: lookup failed");
        TrailerState::Failed { movie_id, message: e.to_string() }
      }
    };
    true
  }

  /// Fail the panel without a lookup (e.g. no API key configured).
  pub fn fail(&mut self, movie: &MovieRecord, error: TrailerError) {
    let ticket = self.open(movie);
    self.complete(&ticket, Err(error));
  }

  pub fn close(&mut self) {
    if self.is_open() {
      debug!("trailer: closed");
    }
    self.generation += 1;
    self.state = TrailerState::Closed;
  }

  /// Run a whole lookup against `source`.
  pub async fn resolve<S: VideoSource>(&mut self, source: &S, movie: &MovieRecord) -> Result<String, TrailerError> {
    let ticket = self.open(movie);
    let outcome = source.find_video(&ticket.query).await;
    self.complete(&ticket, outcome.clone());
    outcome
  }
}
