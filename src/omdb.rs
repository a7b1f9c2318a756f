//! OMDb metadata client.
//!
//! OMDb answers HTTP 200 for misses too; the outcome lives in the body's
//! `Response` field (`"True"` / `"False"`), so that is what we branch on.

use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::{Client, Request};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::constants::constants;
use crate::movie::{MovieRecord, Rating, present};
use crate::search::{MovieQuery, MovieSource, SearchError};

const DEFAULT_NOT_FOUND: &str = "Movie not found!";

#[derive(Debug, Deserialize)]
struct OmdbRating {
  #[serde(rename = "Source")]
  source: String,
  #[serde(rename = "Value")]
  value: String,
}

/// Raw response body. Every field is optional here; [`into_record`] decides
/// what is actually required.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct OmdbResponse {
  response: Option<String>,
  error: Option<String>,
  title: Option<String>,
  year: Option<String>,
  poster: Option<String>,
  plot: Option<String>,
  box_office: Option<String>,
  #[serde(rename = "imdbRating")]
  imdb_rating: Option<String>,
  genre: Option<String>,
  director: Option<String>,
  writer: Option<String>,
  actors: Option<String>,
  awards: Option<String>,
  runtime: Option<String>,
  rated: Option<String>,
  #[serde(rename = "imdbID")]
  imdb_id: Option<String>,
  ratings: Vec<OmdbRating>,
}

fn required(value: Option<String>, field: &str) -> Result<String, SearchError> {
  value
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
    .ok_or_else(|| SearchError::Network(format!("malformed response (missing {})", field)))
}

fn into_record(raw: OmdbResponse) -> Result<MovieRecord, SearchError> {
  Ok(MovieRecord {
    title: required(raw.title, "Title")?,
    year: required(raw.year, "Year")?,
    external_id: required(raw.imdb_id, "imdbID")?,
    poster_url: raw.poster.unwrap_or_else(|| crate::movie::NOT_AVAILABLE.to_string()),
    plot: raw.plot,
    box_office: raw.box_office,
    imdb_rating: raw.imdb_rating,
    genre: raw.genre,
    director: raw.director,
    writer: raw.writer,
    actors: raw.actors,
    awards: raw.awards,
    runtime: raw.runtime,
    rated: raw.rated,
    ratings_by_source: raw.ratings.into_iter().map(|r| Rating { source: r.source, value: r.value }).collect(),
  })
}

/// Interpret an OMDb response body.
pub fn parse_response(body: &str) -> Result<MovieRecord, SearchError> {
  let raw: OmdbResponse =
    serde_json::from_str(body).map_err(|e| SearchError::Network(format!("malformed response ({})", e)))?;

  match raw.response.as_deref().map(str::trim) {
    Some(r) if r.eq_ignore_ascii_case("true") => into_record(raw),
    Some(r) if r.eq_ignore_ascii_case("false") => {
      let message = present(raw.error.as_deref()).unwrap_or(DEFAULT_NOT_FOUND).to_string();
      Err(SearchError::NotFound(message))
    }
    _ => Err(SearchError::Network("malformed response (missing Response field)".to_string())),
  }
}

#[derive(Clone)]
pub struct OmdbClient {
  http: Client,
  api_key: String,
  base_url: String,
}

impl OmdbClient {
  pub fn new(http: Client, api_key: impl Into<String>) -> Self {
    Self { http, api_key: api_key.into(), base_url: constants().omdb_base_url.clone() }
  }

  fn request(&self, query: &MovieQuery) -> reqwest::Result<Request> {
    let mut params = vec![("t", query.title.as_str()), ("plot", "full"), ("apikey", self.api_key.as_str())];
    if let Some(year) = query.year.as_deref() {
      params.push(("y", year));
    }
    self.http.get(&self.base_url).query(&params).build()
  }

  async fn fetch_body(&self, query: &MovieQuery) -> Result<String> {
    let request = self.request(query).context("Failed to build OMDb request")?;
    debug!(title = %query.title, year = ?query.year, "omdb: request");
    let response = self.http.execute(request).await.context("OMDb request failed")?;
    let status = response.status();
    let body = response.text().await.context("Failed to read OMDb response body")?;
    // A JSON body with an error message is more useful than the status code.
    if !status.is_success() && !body.trim_start().starts_with('{') {
      return Err(anyhow!("OMDb returned HTTP {}", status));
    }
    Ok(body)
  }
}

impl MovieSource for OmdbClient {
  fn fetch(&self, query: &MovieQuery) -> impl Future<Output = Result<MovieRecord, SearchError>> + Send {
    let client = self.clone();
    let query = query.clone();
    async move {
      let body = client.fetch_body(&query).await.map_err(|e| SearchError::Network(format!("{:#}", e)))?;
      parse_response(&body)
    }
  }
}

/// Build the shared HTTP client with the configured timeout.
pub fn http_client() -> Result<Client> {
  Client::builder()
    .timeout(Duration::from_secs(constants().request_timeout_secs))
    .user_agent(concat!("flick/", env!("CARGO_PKG_VERSION")))
    .build()
    .context("Failed to build HTTP client")
}

/// Download and decode a poster for the detail view.
pub async fn fetch_poster(client: &Client, url: &str) -> Result<DynamicImage> {
  let response = client.get(url).send().await.with_context(|| format!("Failed to fetch poster {}", url))?;
  if !response.status().is_success() {
    return Err(anyhow!("Poster request returned HTTP {}", response.status()));
  }
  let bytes = response.bytes().await.with_context(|| format!("Failed to read poster bytes from {}", url))?;
  image::load_from_memory(&bytes).with_context(|| format!("Failed to decode poster (URL: {})", url))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn query_pairs(request: &Request) -> HashMap<String, String> {
    request.url().query_pairs().into_owned().collect()
  }

  // --- request ---

  #[test]
  fn request_carries_title_plot_and_key() {
    let client = OmdbClient::new(Client::new(), "secret");
    let query = MovieQuery { title: "The Matrix".to_string(), year: None };
    let pairs = query_pairs(&client.request(&query).unwrap());
    assert_eq!(pairs.get("t").map(String::as_str), Some("The Matrix"));
    assert_eq!(pairs.get("plot").map(String::as_str), Some("full"));
    assert_eq!(pairs.get("apikey").map(String::as_str), Some("secret"));
    assert!(!pairs.contains_key("y"));
  }

  #[test]
  fn request_adds_year_when_given() {
    let client = OmdbClient::new(Client::new(), "secret");
    let query = MovieQuery { title: "Heat".to_string(), year: Some("1995".to_string()) };
    let request = client.request(&query).unwrap();
    assert!(request.url().as_str().starts_with(&constants().omdb_base_url));
    assert_eq!(query_pairs(&request).get("y").map(String::as_str), Some("1995"));
  }

  const MATRIX: &str = r#"{
    "Title": "The Matrix", "Year": "1999", "Rated": "R", "Runtime": "136 min",
    "Genre": "Action, Sci-Fi", "Director": "Lana Wachowski, Lilly Wachowski",
    "Writer": "Lilly Wachowski, Lana Wachowski",
    "Actors": "Keanu Reeves, Laurence Fishburne, Carrie-Anne Moss",
    "Plot": "When a beautiful stranger leads computer hacker Neo to a forbidding underworld...",
    "Awards": "Won 4 Oscars. 42 wins & 51 nominations total",
    "Poster": "https://m.media-amazon.com/images/M/matrix.jpg",
    "Ratings": [
      {"Source": "Internet Movie Database", "Value": "8.7/10"},
      {"Source": "Rotten Tomatoes", "Value": "83%"}
    ],
    "imdbRating": "8.7", "imdbID": "tt0133093", "Type": "movie",
    "BoxOffice": "$172,076,928", "Response": "True"
  }"#;

  #[test]
  fn parses_full_record() {
    let movie = parse_response(MATRIX).unwrap();
    assert_eq!(movie.title, "The Matrix");
    assert_eq!(movie.year, "1999");
    assert_eq!(movie.external_id, "tt0133093");
    assert_eq!(movie.imdb_rating.as_deref(), Some("8.7"));
    assert_eq!(movie.box_office.as_deref(), Some("$172,076,928"));
    assert_eq!(movie.genre.as_deref(), Some("Action, Sci-Fi"));
    assert_eq!(movie.ratings_by_source.len(), 2);
    assert_eq!(movie.ratings_by_source[1], Rating { source: "Rotten Tomatoes".to_string(), value: "83%".to_string() });
  }

  #[test]
  fn response_false_is_not_found_with_remote_message() {
    let err = parse_response(r#"{"Response":"False","Error":"Movie not found!"}"#).unwrap_err();
    assert_eq!(err, SearchError::NotFound("Movie not found!".to_string()));

    let err = parse_response(r#"{"Response":"False","Error":"Incorrect IMDb ID."}"#).unwrap_err();
    assert_eq!(err, SearchError::NotFound("Incorrect IMDb ID.".to_string()));
  }

  #[test]
  fn response_false_without_message_uses_generic_text() {
    let err = parse_response(r#"{"Response":"False"}"#).unwrap_err();
    assert_eq!(err, SearchError::NotFound(DEFAULT_NOT_FOUND.to_string()));
  }

  #[test]
  fn non_json_body_is_network_error() {
    assert!(matches!(parse_response("<html>502</html>"), Err(SearchError::Network(_))));
  }

  #[test]
  fn success_missing_id_is_network_error() {
    let err = parse_response(r#"{"Response":"True","Title":"X","Year":"2000"}"#).unwrap_err();
    assert!(matches!(err, SearchError::Network(ref m) if m.contains("imdbID")));
  }

  #[test]
  fn missing_response_field_is_network_error() {
    assert!(matches!(parse_response(r#"{"Title":"X"}"#), Err(SearchError::Network(_))));
  }

  #[test]
  fn missing_poster_becomes_sentinel() {
    let movie = parse_response(r#"{"Response":"True","Title":"X","Year":"2000","imdbID":"tt9"}"#).unwrap();
    assert_eq!(movie.poster_url, "N/A");
    assert!(movie.poster().is_none());
    assert!(movie.ratings_by_source.is_empty());
  }
}
