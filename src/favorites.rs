use std::cmp::Ordering;
use tracing::warn;

use crate::movie::MovieRecord;
use crate::storage::KeyValueStore;

const FAVORITES_KEY: &str = "favorites";

/// Presentation order for the favorites list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
  #[default]
  TitleAsc,
  TitleDesc,
  YearDesc,
  YearAsc,
  RatingDesc,
}

impl SortKey {
  pub const ALL: [SortKey; 5] =
    [SortKey::TitleAsc, SortKey::TitleDesc, SortKey::YearDesc, SortKey::YearAsc, SortKey::RatingDesc];

  pub fn label(self) -> &'static str {
    match self {
      SortKey::TitleAsc => "title-asc",
      SortKey::TitleDesc => "title-desc",
      SortKey::YearDesc => "year-desc",
      SortKey::YearAsc => "year-asc",
      SortKey::RatingDesc => "rating-desc",
    }
  }

  pub fn from_config(s: &str) -> Self {
    SortKey::ALL.into_iter().find(|k| k.label().eq_ignore_ascii_case(s.trim())).unwrap_or_default()
  }

  pub fn next(self) -> Self {
    let idx = SortKey::ALL.iter().position(|k| *k == self).unwrap_or(0);
    SortKey::ALL[(idx + 1) % SortKey::ALL.len()]
  }

  fn compare(self, a: &MovieRecord, b: &MovieRecord) -> Ordering {
    match self {
      SortKey::TitleAsc => a.title.cmp(&b.title),
      SortKey::TitleDesc => b.title.cmp(&a.title),
      SortKey::YearDesc => b.numeric_year().cmp(&a.numeric_year()),
      SortKey::YearAsc => a.numeric_year().cmp(&b.numeric_year()),
      SortKey::RatingDesc => b.numeric_rating().total_cmp(&a.numeric_rating()),
    }
  }
}

/// Result of [`FavoritesStore::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggled {
  pub added: bool,
}

/// Saved movies keyed by `external_id`. Stored order carries no meaning;
/// callers read through [`FavoritesStore::view`].
pub struct FavoritesStore {
  movies: Vec<MovieRecord>,
  store: Box<dyn KeyValueStore>,
}

/// Case-insensitive genre substring match. An empty needle matches everything,
/// including movies without a genre.
pub fn matches_genre(movie: &MovieRecord, needle: &str) -> bool {
  if needle.is_empty() {
    return true;
  }
  let needle = needle.to_lowercase();
  movie.genre.as_deref().is_some_and(|g| g.to_lowercase().contains(&needle))
}

impl FavoritesStore {
  /// Seed from the store. A missing or malformed value starts empty.
  pub fn load(store: Box<dyn KeyValueStore>) -> Self {
    let mut movies = match store.load(FAVORITES_KEY) {
      Some(raw) => serde_json::from_str::<Vec<MovieRecord>>(&raw).unwrap_or_else(|e| {
        warn!(err = %e, "favorites: stored value is malformed, starting empty");
        Vec::new()
      }),
      None => Vec::new(),
    };
    // Hand-edited files may repeat an id; keep the first occurrence.
    let mut seen = std::collections::HashSet::new();
    movies.retain(|m| seen.insert(m.external_id.clone()));
    Self { movies, store }
  }

  pub fn len(&self) -> usize {
    self.movies.len()
  }

  pub fn is_empty(&self) -> bool {
    self.movies.is_empty()
  }

  pub fn contains(&self, external_id: &str) -> bool {
    self.movies.iter().any(|m| m.external_id == external_id)
  }

  /// Remove the movie if it is saved, otherwise save it at the front.
  pub fn toggle(&mut self, movie: &MovieRecord) -> Toggled {
    let added = if let Some(pos) = self.movies.iter().position(|m| m.same_movie(movie)) {
      self.movies.remove(pos);
      false
    } else {
      self.movies.insert(0, movie.clone());
      true
    };
    self.persist();
    Toggled { added }
  }

  pub fn remove(&mut self, external_id: &str) {
    self.movies.retain(|m| m.external_id != external_id);
    self.persist();
  }

  /// Filter by genre substring, then stable-sort by `sort`.
  pub fn view(&self, sort: SortKey, genre: &str) -> Vec<MovieRecord> {
    let mut out: Vec<MovieRecord> = self.movies.iter().filter(|m| matches_genre(m, genre)).cloned().collect();
    out.sort_by(|a, b| sort.compare(a, b));
    out
  }

  fn persist(&mut self) {
    let result = serde_json::to_string(&self.movies)
      .map_err(anyhow::Error::from)
      .and_then(|json| self.store.save(FAVORITES_KEY, &json));
    if let Err(e) = result {
      warn!(err = %format!("{:#}", e), "favorites: failed to persist");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::movie::sample_movie;
  use crate::storage::MemoryStore;

  fn empty() -> (FavoritesStore, MemoryStore) {
    let backend = MemoryStore::default();
    (FavoritesStore::load(Box::new(backend.clone())), backend)
  }

  fn movie(id: &str, title: &str, year: &str, genre: Option<&str>, rating: Option<&str>) -> MovieRecord {
    let mut m = sample_movie(id, title);
    m.year = year.to_string();
    m.genre = genre.map(str::to_string);
    m.imdb_rating = rating.map(str::to_string);
    m
  }

  fn titles(movies: &[MovieRecord]) -> Vec<&str> {
    movies.iter().map(|m| m.title.as_str()).collect()
  }

  // --- toggle ---

  #[test]
  fn toggle_adds_then_removes() {
    let (mut favs, _) = empty();
    let heat = movie("tt0113277", "Heat", "1995", Some("Crime"), None);
    assert_eq!(favs.toggle(&heat), Toggled { added: true });
    assert!(favs.contains("tt0113277"));
    assert_eq!(favs.toggle(&heat), Toggled { added: false });
    assert!(favs.is_empty());
  }

  #[test]
  fn toggle_twice_restores_membership() {
    let (mut favs, _) = empty();
    let a = movie("tt1", "A", "2001", None, None);
    let b = movie("tt2", "B", "2002", None, None);
    favs.toggle(&a);
    favs.toggle(&b);
    let before: Vec<String> = favs.view(SortKey::TitleAsc, "").into_iter().map(|m| m.external_id).collect();

    let c = movie("tt3", "C", "2003", None, None);
    favs.toggle(&c);
    favs.toggle(&c);
    let after: Vec<String> = favs.view(SortKey::TitleAsc, "").into_iter().map(|m| m.external_id).collect();
    assert_eq!(before, after);
  }

  #[test]
  fn toggle_matches_on_external_id_not_fields() {
    let (mut favs, _) = empty();
    let short = movie("tt0133093", "The Matrix", "1999", None, None);
    let mut full = short.clone();
    full.plot = Some("Full plot".to_string());
    favs.toggle(&short);
    assert_eq!(favs.toggle(&full), Toggled { added: false });
    assert_eq!(favs.len(), 0);
  }

  #[test]
  fn remove_by_external_id() {
    let (mut favs, _) = empty();
    favs.toggle(&movie("tt1", "A", "2001", None, None));
    favs.toggle(&movie("tt2", "B", "2002", None, None));
    favs.remove("tt1");
    assert!(!favs.contains("tt1"));
    assert!(favs.contains("tt2"));
  }

  // --- view: filter ---

  #[test]
  fn genre_filter_is_case_insensitive_substring() {
    let (mut favs, _) = empty();
    favs.toggle(&movie("tt1", "Die Hard", "1988", Some("Action"), None));
    favs.toggle(&movie("tt2", "Heat", "1995", Some("Action, Drama"), None));
    favs.toggle(&movie("tt3", "Airplane!", "1980", Some("Comedy"), None));
    let view = favs.view(SortKey::TitleAsc, "act");
    assert_eq!(titles(&view), vec!["Die Hard", "Heat"]);
  }

  #[test]
  fn empty_filter_includes_movies_without_genre() {
    let (mut favs, _) = empty();
    favs.toggle(&movie("tt1", "A", "2001", None, None));
    favs.toggle(&movie("tt2", "B", "2002", Some("Drama"), None));
    assert_eq!(favs.view(SortKey::TitleAsc, "").len(), 2);
    assert_eq!(favs.view(SortKey::TitleAsc, "drama").len(), 1);
  }

  // --- view: sort ---

  #[test]
  fn rating_desc_treats_na_as_zero() {
    let (mut favs, _) = empty();
    favs.toggle(&movie("tt1", "Seven Two", "2001", None, Some("7.2")));
    favs.toggle(&movie("tt2", "Unrated", "2002", None, Some("N/A")));
    favs.toggle(&movie("tt3", "Nine", "2003", None, Some("9.0")));
    let view = favs.view(SortKey::RatingDesc, "");
    assert_eq!(titles(&view), vec!["Nine", "Seven Two", "Unrated"]);
  }

  #[test]
  fn title_sorts_are_lexicographic() {
    let (mut favs, _) = empty();
    favs.toggle(&movie("tt1", "alien", "1979", None, None));
    favs.toggle(&movie("tt2", "Heat", "1995", None, None));
    favs.toggle(&movie("tt3", "Brazil", "1985", None, None));
    assert_eq!(titles(&favs.view(SortKey::TitleAsc, "")), vec!["Brazil", "Heat", "alien"]);
    assert_eq!(titles(&favs.view(SortKey::TitleDesc, "")), vec!["alien", "Heat", "Brazil"]);
  }

  #[test]
  fn year_sorts_are_numeric_with_garbage_as_zero() {
    let (mut favs, _) = empty();
    favs.toggle(&movie("tt1", "Old", "980", None, None));
    favs.toggle(&movie("tt2", "New", "2020", None, None));
    favs.toggle(&movie("tt3", "Unknown", "????", None, None));
    assert_eq!(titles(&favs.view(SortKey::YearDesc, "")), vec!["New", "Old", "Unknown"]);
    assert_eq!(titles(&favs.view(SortKey::YearAsc, "")), vec!["Unknown", "Old", "New"]);
  }

  #[test]
  fn ties_keep_stored_order() {
    let (mut favs, _) = empty();
    favs.toggle(&movie("tt1", "First", "2000", None, Some("8.0")));
    favs.toggle(&movie("tt2", "Second", "2000", None, Some("8.0")));
    // Stored order is newest-first: Second, First.
    assert_eq!(titles(&favs.view(SortKey::YearAsc, "")), vec!["Second", "First"]);
    assert_eq!(titles(&favs.view(SortKey::RatingDesc, "")), vec!["Second", "First"]);
  }

  // --- SortKey ---

  #[test]
  fn sort_key_cycles_through_all() {
    let mut key = SortKey::TitleAsc;
    for _ in 0..SortKey::ALL.len() {
      key = key.next();
    }
    assert_eq!(key, SortKey::TitleAsc);
    assert_eq!(SortKey::TitleAsc.next(), SortKey::TitleDesc);
  }

  #[test]
  fn sort_key_from_config() {
    assert_eq!(SortKey::from_config("rating-desc"), SortKey::RatingDesc);
    assert_eq!(SortKey::from_config("YEAR-ASC"), SortKey::YearAsc);
    assert_eq!(SortKey::from_config("bogus"), SortKey::TitleAsc);
  }

  // --- persistence ---

  #[test]
  fn mutations_write_through_and_reload() {
    let (mut favs, backend) = empty();
    favs.toggle(&movie("tt1", "A", "2001", Some("Drama"), Some("7.5")));
    let reloaded = FavoritesStore::load(Box::new(backend.clone()));
    assert!(reloaded.contains("tt1"));
    assert_eq!(reloaded.view(SortKey::TitleAsc, "")[0].imdb_rating.as_deref(), Some("7.5"));

    favs.remove("tt1");
    assert!(FavoritesStore::load(Box::new(backend)).is_empty());
  }

  #[test]
  fn malformed_store_value_degrades_to_empty() {
    let favs = FavoritesStore::load(Box::new(MemoryStore::with_entry(FAVORITES_KEY, "[{\"title\": 3}]")));
    assert!(favs.is_empty());
  }

  #[test]
  fn duplicate_ids_in_store_collapse() {
    let raw = serde_json::to_string(&vec![
      movie("tt1", "A", "2001", None, None),
      movie("tt1", "A again", "2001", None, None),
    ])
    .unwrap();
    let favs = FavoritesStore::load(Box::new(MemoryStore::with_entry(FAVORITES_KEY, &raw)));
    assert_eq!(favs.len(), 1);
  }
}
