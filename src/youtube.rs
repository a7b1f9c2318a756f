use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Request};
use serde::Deserialize;
use std::future::Future;
use tracing::debug;

use crate::constants::constants;
use crate::trailer::{TrailerError, VideoSource};

#[derive(Debug, Deserialize)]
struct VideoId {
  #[serde(rename = "videoId")]
  video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
  id: VideoId,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  items: Vec<SearchItem>,
}

/// Pull the first video id out of a YouTube Data API `search.list` body.
pub fn parse_search_response(body: &str) -> Result<String, TrailerError> {
  let parsed: SearchResponse =
    serde_json::from_str(body).map_err(|e| TrailerError::Fetch(format!("malformed response ({})", e)))?;
  parsed
    .items
    .into_iter()
    .find_map(|item| item.id.video_id.filter(|id| !id.trim().is_empty()))
    .ok_or(TrailerError::NotFound)
}

/// Watch URL for a resolved trailer, for handing to the system browser.
pub fn watch_url(video_id: &str) -> String {
  format!("{}{}", constants().youtube_watch_url, video_id)
}

/// Embeddable player URL for a resolved trailer.
pub fn embed_url(video_id: &str) -> String {
  format!("{}{}", constants().youtube_embed_url, video_id)
}

#[derive(Clone)]
pub struct YoutubeClient {
  http: Client,
  api_key: String,
}

impl YoutubeClient {
  pub fn new(http: Client, api_key: impl Into<String>) -> Self {
    Self { http, api_key: api_key.into() }
  }

  fn request(&self, query: &str) -> reqwest::Result<Request> {
    let params = [
      ("part", "snippet"),
      ("maxResults", "1"),
      ("type", "video"),
      ("videoEmbeddable", "true"),
      ("q", query),
      ("key", self.api_key.as_str()),
    ];
    self.http.get(&constants().youtube_search_url).query(&params).build()
  }

  async fn search_body(&self, query: &str) -> Result<String> {
    let request = self.request(query).context("Failed to build YouTube search request")?;
    debug!(query = %query, "youtube: search request");
    let response = self.http.execute(request).await.context("YouTube search request failed")?;
    let status = response.status();
    if !status.is_success() {
      return Err(anyhow!("YouTube search returned HTTP {}", status));
    }
    response.text().await.context("Failed to read YouTube response body")
  }
}

impl VideoSource for YoutubeClient {
  fn find_video(&self, query: &str) -> impl Future<Output = Result<String, TrailerError>> + Send {
    let client = self.clone();
    let query = query.to_string();
    async move {
      let body = client.search_body(&query).await.map_err(|e| TrailerError::Fetch(format!("{:#}", e)))?;
      parse_search_response(&body)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  #[test]
  fn request_asks_for_one_embeddable_video() {
    let client = YoutubeClient::new(Client::new(), "yt-key");
    let request = client.request("The Matrix 1999 trailer").unwrap();
    assert!(request.url().as_str().starts_with(&constants().youtube_search_url));
    let pairs: HashMap<String, String> = request.url().query_pairs().into_owned().collect();
    assert_eq!(pairs.get("part").map(String::as_str), Some("snippet"));
    assert_eq!(pairs.get("maxResults").map(String::as_str), Some("1"));
    assert_eq!(pairs.get("type").map(String::as_str), Some("video"));
    assert_eq!(pairs.get("videoEmbeddable").map(String::as_str), Some("true"));
    assert_eq!(pairs.get("q").map(String::as_str), Some("The Matrix 1999 trailer"));
    assert_eq!(pairs.get("key").map(String::as_str), Some("yt-key"));
  }

  #[test]
  fn picks_first_video_id() {
    let body = r#"{
      "kind": "youtube#searchListResponse",
      "items": [
        {"kind": "youtube#searchResult", "id": {"kind": "youtube#video", "videoId": "vKQi3bBA1y8"},
         "snippet": {"title": "The Matrix (1999) Official Trailer"}}
      ]
    }"#;
    assert_eq!(parse_search_response(body), Ok("vKQi3bBA1y8".to_string()));
  }

  #[test]
  fn empty_items_is_not_found() {
    assert_eq!(parse_search_response(r#"{"items": []}"#), Err(TrailerError::NotFound));
    assert_eq!(parse_search_response(r#"{"kind": "youtube#searchListResponse"}"#), Err(TrailerError::NotFound));
  }

  #[test]
  fn item_without_video_id_is_not_found() {
    let body = r#"{"items": [{"id": {"kind": "youtube#channel", "channelId": "UC123"}}]}"#;
    assert_eq!(parse_search_response(body), Err(TrailerError::NotFound));
  }

  #[test]
  fn garbage_body_is_fetch_error() {
    assert!(matches!(parse_search_response("not json"), Err(TrailerError::Fetch(_))));
  }

  #[test]
  fn urls_embed_the_id() {
    assert_eq!(embed_url("abc"), "https://www.youtube.com/embed/abc");
    assert_eq!(watch_url("abc"), "https://www.youtube.com/watch?v=abc");
  }
}
