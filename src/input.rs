use anyhow::Result;
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use ratatui::widgets::ListState;

use crate::app::{App, AppMode};

// --- Text fields ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// A single-line editable field. `cursor` is a char index; `scroll` is the
/// display column the visible window starts at (maintained by the renderer).
#[derive(Debug, Clone, Default)]
pub struct TextField {
  pub text: String,
  pub cursor: usize,
  pub scroll: usize,
}

impl TextField {
  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  pub fn set(&mut self, text: &str) {
    self.text = text.to_string();
    self.cursor = text.chars().count();
    self.scroll = 0;
  }

  pub fn clear(&mut self) {
    self.set("");
  }

  /// Apply an editing key. Returns `true` if the text changed.
  pub fn handle_key(&mut self, code: KeyCode) -> bool {
    let len = self.text.chars().count();
    match code {
      KeyCode::Char(c) => {
        let byte_idx = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_idx, c);
        self.cursor += 1;
        true
      }
      KeyCode::Backspace if self.cursor > 0 => {
        self.cursor -= 1;
        let byte_idx = char_to_byte_index(&self.text, self.cursor);
        self.text.remove(byte_idx);
        true
      }
      KeyCode::Delete if self.cursor < len => {
        let byte_idx = char_to_byte_index(&self.text, self.cursor);
        self.text.remove(byte_idx);
        true
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        false
      }
      KeyCode::Right => {
        self.cursor = (self.cursor + 1).min(len);
        false
      }
      KeyCode::Home => {
        self.cursor = 0;
        false
      }
      KeyCode::End => {
        self.cursor = len;
        false
      }
      _ => false,
    }
  }
}

// --- List navigation ---

/// Move the selection one step, wrapping at both ends.
pub fn step_selection(state: &mut ListState, count: usize, forward: bool) {
  if count == 0 {
    state.select(None);
    return;
  }
  let next = match state.selected() {
    None => 0,
    Some(i) if forward => (i + 1) % count,
    Some(0) => count - 1,
    Some(i) => (i - 1).min(count - 1),
  };
  state.select(Some(next));
}

/// Keep the selection inside `0..count`.
pub fn clamp_selection(state: &mut ListState, count: usize) {
  match state.selected() {
    _ if count == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(i) if i >= count => state.select(Some(count - 1)),
    Some(_) => {}
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => {
        app.should_quit = true;
        return Ok(());
      }
      KeyCode::Char('t') => {
        app.next_theme();
        return Ok(());
      }
      KeyCode::Char('f') => {
        app.toggle_favorite();
        return Ok(());
      }
      KeyCode::Char('p') => {
        app.toggle_trailer();
        return Ok(());
      }
      KeyCode::Char('o') => {
        app.open_in_browser();
        return Ok(());
      }
      _ => return Ok(()),
    }
  }

  match key.code {
    KeyCode::Tab => {
      app.mode = app.mode.next();
      return Ok(());
    }
    KeyCode::BackTab => {
      app.mode = app.mode.previous();
      return Ok(());
    }
    _ => {}
  }

  match app.mode {
    AppMode::Title | AppMode::Year => handle_search_key(app, key),
    AppMode::History => handle_history_key(app, key),
    AppMode::Favorites => handle_favorites_key(app, key),
    AppMode::Filter => handle_filter_key(app, key),
  }
  Ok(())
}

fn handle_search_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => app.trigger_search(),
    KeyCode::Esc => {
      let field = app.focused_field();
      if !field.is_empty() {
        field.clear();
      } else if app.trailer.is_open() {
        app.close_trailer();
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down if app.mode == AppMode::Title && !app.history.is_empty() => {
      app.mode = AppMode::History;
    }
    // Years are digits only; anything else is dropped rather than sent.
    KeyCode::Char(c) if app.mode == AppMode::Year && !c.is_ascii_digit() => {}
    code => {
      app.focused_field().handle_key(code);
    }
  }
}

fn handle_history_key(app: &mut App, key: event::KeyEvent) {
  let count = app.history.len();
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => step_selection(&mut app.history_state, count, true),
    KeyCode::Up | KeyCode::Char('k') => step_selection(&mut app.history_state, count, false),
    KeyCode::Enter => app.search_selected_history(),
    KeyCode::Char('d') | KeyCode::Delete => app.remove_selected_history(),
    KeyCode::Char('C') => app.clear_history(),
    KeyCode::Esc => app.mode = AppMode::Title,
    _ => {}
  }
}

fn handle_favorites_key(app: &mut App, key: event::KeyEvent) {
  let count = app.favorites_view().len();
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => step_selection(&mut app.favorites_state, count, true),
    KeyCode::Up | KeyCode::Char('k') => step_selection(&mut app.favorites_state, count, false),
    KeyCode::Enter => app.search_selected_favorite(),
    KeyCode::Char('d') | KeyCode::Delete => app.remove_selected_favorite(),
    KeyCode::Char('s') => app.next_sort(),
    KeyCode::Char('/') => app.mode = AppMode::Filter,
    KeyCode::Esc => app.mode = AppMode::Title,
    _ => {}
  }
}

fn handle_filter_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.mode = AppMode::Favorites,
    KeyCode::Esc => {
      app.filter_input.clear();
      app.refresh_favorites_selection();
      app.mode = AppMode::Favorites;
    }
    KeyCode::Down | KeyCode::Up => {
      let count = app.favorites_view().len();
      step_selection(&mut app.favorites_state, count, key.code == KeyCode::Down);
    }
    code => {
      if app.filter_input.handle_key(code) {
        app.refresh_favorites_selection();
      }
    }
  }
}
