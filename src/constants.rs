//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, so there is no runtime file I/O.
//! Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Remote APIs
  pub omdb_base_url: String,
  pub youtube_search_url: String,
  pub youtube_embed_url: String,
  pub youtube_watch_url: String,
  pub imdb_title_url: String,
  pub request_timeout_secs: u64,

  // History
  pub history_limit: usize,

  // UI
  pub error_dismiss_secs: u64,
  pub poster_panel_width: u16,
  pub side_panel_width: u16,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed the first test run catches it.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
