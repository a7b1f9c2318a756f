use std::collections::HashSet;
use tracing::warn;

use crate::constants::constants;
use crate::storage::KeyValueStore;

const HISTORY_KEY: &str = "history";

/// Past successful search terms, newest first, deduplicated ignoring case and
/// capped at `history_limit`. Every mutation is written through to the store.
pub struct HistoryStore {
  entries: Vec<String>,
  store: Box<dyn KeyValueStore>,
}

impl HistoryStore {
  /// Seed from the store. A missing or malformed value starts an empty history.
  /// Stored entries are deduplicated ignoring case (first one wins) and capped.
  pub fn load(store: Box<dyn KeyValueStore>) -> Self {
    let mut entries = match store.load(HISTORY_KEY) {
      Some(raw) => serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|e| {
        warn!(err = %e, "history: stored value is malformed, starting empty");
        Vec::new()
      }),
      None => Vec::new(),
    };
    let mut seen = HashSet::new();
    entries.retain(|e| seen.insert(e.to_lowercase()));
    entries.truncate(constants().history_limit);
    Self { entries, store }
  }

  pub fn entries(&self) -> &[String] {
    &self.entries
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Move `term` to the front, dropping any entry equal to it ignoring case.
  /// The casing of the latest submission wins.
  pub fn record(&mut self, term: &str) -> &[String] {
    let lowered = term.to_lowercase();
    self.entries.retain(|e| e.to_lowercase() != lowered);
    self.entries.insert(0, term.to_string());
    self.entries.truncate(constants().history_limit);
    self.persist();
    &self.entries
  }

  /// Delete entries exactly equal to `term` (case-sensitive).
  pub fn remove(&mut self, term: &str) -> &[String] {
    self.entries.retain(|e| e != term);
    self.persist();
    &self.entries
  }

  pub fn clear(&mut self) {
    self.entries.clear();
    self.persist();
  }

  fn persist(&mut self) {
    let result = serde_json::to_string(&self.entries)
      .map_err(anyhow::Error::from)
      .and_then(|json| self.store.save(HISTORY_KEY, &json));
    if let Err(e) = result {
      warn!(err = %format!("{:#}", e), "history: failed to persist");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::MemoryStore;

  fn empty() -> (HistoryStore, MemoryStore) {
    let backend = MemoryStore::default();
    (HistoryStore::load(Box::new(backend.clone())), backend)
  }

  // --- record ---

  #[test]
  fn record_prepends_newest() {
    let (mut history, _) = empty();
    history.record("Heat");
    history.record("Alien");
    assert_eq!(history.entries(), ["Alien", "Heat"]);
  }

  #[test]
  fn record_dedupes_ignoring_case_and_keeps_latest_casing() {
    let (mut history, _) = empty();
    history.record("Matrix");
    history.record("Heat");
    history.record("matrix");
    assert_eq!(history.entries(), ["matrix", "Heat"]);
  }

  #[test]
  fn record_caps_at_ten_and_drops_oldest() {
    let (mut history, _) = empty();
    for i in 1..=11 {
      history.record(&format!("movie {}", i));
    }
    assert_eq!(history.len(), 10);
    assert_eq!(history.entries()[0], "movie 11");
    assert_eq!(history.entries()[9], "movie 2");
    assert!(!history.entries().iter().any(|e| e == "movie 1"));
  }

  #[test]
  fn re_recording_existing_term_does_not_evict() {
    let (mut history, _) = empty();
    for i in 1..=10 {
      history.record(&format!("movie {}", i));
    }
    history.record("MOVIE 1");
    assert_eq!(history.len(), 10);
    assert_eq!(history.entries()[0], "MOVIE 1");
    assert_eq!(history.entries()[9], "movie 2");
  }

  // --- remove ---

  #[test]
  fn remove_is_case_sensitive() {
    let (mut history, _) = empty();
    history.record("Heat");
    history.remove("heat");
    assert_eq!(history.entries(), ["Heat"]);
    history.remove("Heat");
    assert!(history.is_empty());
  }

  // --- persistence ---

  #[test]
  fn mutations_write_through() {
    let (mut history, backend) = empty();
    history.record("Heat");
    history.record("Alien");
    assert_eq!(backend.load(HISTORY_KEY).as_deref(), Some(r#"["Alien","Heat"]"#));

    history.remove("Heat");
    assert_eq!(backend.load(HISTORY_KEY).as_deref(), Some(r#"["Alien"]"#));

    history.clear();
    assert_eq!(backend.load(HISTORY_KEY).as_deref(), Some("[]"));
  }

  #[test]
  fn load_seeds_from_store() {
    let backend = MemoryStore::with_entry(HISTORY_KEY, r#"["Alien","Heat"]"#);
    let history = HistoryStore::load(Box::new(backend));
    assert_eq!(history.entries(), ["Alien", "Heat"]);
  }

  #[test]
  fn load_dedupes_and_caps_stored_entries() {
    let mut stored: Vec<String> = vec!["Heat".to_string(), "heat".to_string()];
    stored.extend((1..=15).map(|i| format!("movie {}", i)));
    let backend = MemoryStore::with_entry(HISTORY_KEY, &serde_json::to_string(&stored).unwrap());
    let history = HistoryStore::load(Box::new(backend));
    assert_eq!(history.len(), 10);
    assert_eq!(history.entries()[0], "Heat");
    assert_eq!(history.entries()[1], "movie 1");
    assert_eq!(history.entries().iter().filter(|e| e.eq_ignore_ascii_case("heat")).count(), 1);
  }

  #[test]
  fn malformed_store_value_degrades_to_empty() {
    let backend = MemoryStore::with_entry(HISTORY_KEY, "{not json");
    let history = HistoryStore::load(Box::new(backend));
    assert!(history.is_empty());
  }
}
