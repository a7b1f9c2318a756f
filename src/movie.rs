use serde::{Deserialize, Serialize};

use crate::constants::constants;

/// Sentinel OMDb uses for "no value".
pub const NOT_AVAILABLE: &str = "N/A";

/// One `{source, value}` pair from the metadata API, e.g. `Rotten Tomatoes` / `94%`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
  pub source: String,
  pub value: String,
}

/// The unit of display and storage.
///
/// Equality for favorites purposes is `external_id` only (see [`MovieRecord::same_movie`]);
/// every other field is display data and may differ between fetches of the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
  pub title: String,
  pub year: String,
  pub poster_url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub plot: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub box_office: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub imdb_rating: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub genre: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub director: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub writer: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub actors: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub awards: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub runtime: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rated: Option<String>,
  pub external_id: String,
  #[serde(default)]
  pub ratings_by_source: Vec<Rating>,
}

/// Returns `Some` only for values that carry information (not empty, not `N/A`).
pub fn present(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|v| !v.is_empty() && *v != NOT_AVAILABLE)
}

impl MovieRecord {
  pub fn same_movie(&self, other: &MovieRecord) -> bool {
    self.external_id == other.external_id
  }

  /// Poster URL, or `None` when the API reported no poster.
  pub fn poster(&self) -> Option<&str> {
    present(Some(self.poster_url.as_str()))
  }

  /// Value for a labelled row in the detail view; missing values render as `N/A`.
  pub fn display_field(value: Option<&str>) -> &str {
    present(value).unwrap_or(NOT_AVAILABLE)
  }

  /// First `n` comma-separated cast names, trimmed.
  pub fn lead_actors(&self, n: usize) -> Vec<&str> {
    present(self.actors.as_deref())
      .map(|actors| actors.split(',').map(str::trim).filter(|a| !a.is_empty()).take(n).collect())
      .unwrap_or_default()
  }

  /// Year as an integer for sorting. Ranges like `2008–2013` use the leading digits;
  /// anything non-numeric sorts as 0.
  pub fn numeric_year(&self) -> i32 {
    let digits: String = self.year.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
  }

  /// Year usable as a lookup filter: four leading digits, so a series range
  /// like `2008–2013` narrows to its first year. Anything else is `None`.
  pub fn query_year(&self) -> Option<String> {
    let digits: String = self.year.trim().chars().take_while(char::is_ascii_digit).collect();
    (digits.len() == 4).then_some(digits)
  }

  /// IMDb rating as a float for sorting; missing or `N/A` is 0.
  pub fn numeric_rating(&self) -> f64 {
    present(self.imdb_rating.as_deref()).and_then(|r| r.parse::<f64>().ok()).filter(|r| r.is_finite()).unwrap_or(0.0)
  }

  pub fn imdb_url(&self) -> String {
    format!("{}{}/", constants().imdb_title_url, self.external_id)
  }
}

#[cfg(test)]
pub(crate) fn sample_movie(external_id: &str, title: &str) -> MovieRecord {
  MovieRecord {
    title: title.to_string(),
    year: "1999".to_string(),
    poster_url: NOT_AVAILABLE.to_string(),
    plot: None,
    box_office: None,
    imdb_rating: None,
    genre: None,
    director: None,
    writer: None,
    actors: None,
    awards: None,
    runtime: None,
    rated: None,
    external_id: external_id.to_string(),
    ratings_by_source: Vec::new(),
  }
}
