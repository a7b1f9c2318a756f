use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode};
use crate::constants::constants;
use crate::graphics::{PosterWidget, fit_poster};
use crate::input::TextField;
use crate::movie::MovieRecord;
use crate::theme::Theme;
use crate::trailer::TrailerState;
use crate::youtube::embed_url;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn rounded_block(theme: &Theme, focused: bool) -> Block<'static> {
  let color = if focused { theme.accent } else { theme.border };
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(color))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_inputs(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" 🎬 flick ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  let side_w = constants().side_panel_width.min(area.width / 2);
  let [detail_area, side_area] = Layout::horizontal([Constraint::Min(20), Constraint::Length(side_w)]).areas(area);

  if app.search.is_loading() {
    render_message(frame, app.theme(), detail_area, "Loading…", app.theme().status);
  } else if app.search.current().is_some() {
    render_detail(frame, app, detail_area);
  } else if let Some(err) = app.search.state().error.clone() {
    render_message(frame, app.theme(), detail_area, &err, app.theme().error);
  } else {
    render_welcome(frame, app.theme(), detail_area);
  }

  let [history_area, favorites_area] =
    Layout::vertical([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(side_area);
  render_history(frame, app, history_area);
  render_favorites(frame, app, favorites_area);
}

fn render_welcome(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("🎬  Welcome to flick", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Look up movies. Keep favorites. Find trailers.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Type a title below and press Enter.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(rounded_block(theme, false));
  frame.render_widget(paragraph, area);
}

fn render_message(frame: &mut Frame, theme: &Theme, area: Rect, message: &str, color: ratatui::style::Color) {
  let text = vec![Line::from(""), Line::from(Span::styled(message.to_string(), Style::default().fg(color)))];
  let paragraph =
    Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true }).block(rounded_block(theme, false));
  frame.render_widget(paragraph, area);
}

fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let Some(movie) = app.search.current().cloned() else { return };
  let is_favorite = app.is_current_favorite();

  let info_area = if app.display_mode.shows_posters() && area.width > constants().poster_panel_width * 2 {
    let [poster_area, info_area] =
      Layout::horizontal([Constraint::Length(constants().poster_panel_width), Constraint::Min(10)]).areas(area);
    render_poster(frame, app, &movie, poster_area);
    info_area
  } else {
    area
  };

  let (info_area, trailer_area) = if app.trailer.is_open() {
    let [info, trailer] = Layout::vertical([Constraint::Min(5), Constraint::Length(5)]).areas(info_area);
    (info, Some(trailer))
  } else {
    (info_area, None)
  };

  let star = if is_favorite { " ★" } else { "" };
  let title = Line::from(vec![
    Span::styled(format!(" {} ({}){} ", movie.title, movie.year, star), Style::default().fg(theme.accent).bold()),
    Span::styled(format!("[{}] ", app.display_mode.label()), Style::default().fg(theme.muted)),
  ]);
  let block = rounded_block(theme, false).title(title).padding(Padding::horizontal(1));
  let paragraph = Paragraph::new(detail_lines(theme, &movie)).wrap(Wrap { trim: true }).block(block);
  frame.render_widget(paragraph, info_area);

  if let Some(trailer_area) = trailer_area {
    render_trailer(frame, app, trailer_area);
  }
}

fn detail_lines<'a>(theme: &Theme, movie: &'a MovieRecord) -> Vec<Line<'a>> {
  let label = |name: &'static str| Span::styled(format!("{:<11}", name), Style::default().fg(theme.muted));
  let value = |v: Option<&'a str>| Span::styled(MovieRecord::display_field(v), Style::default().fg(theme.fg));

  let mut lines = vec![
    Line::from(vec![
      label("Rating"),
      Span::styled(
        format!("★ {}", MovieRecord::display_field(movie.imdb_rating.as_deref())),
        Style::default().fg(theme.rating).bold(),
      ),
    ]),
    Line::from(vec![label("Rated"), value(movie.rated.as_deref())]),
    Line::from(vec![label("Runtime"), value(movie.runtime.as_deref())]),
    Line::from(vec![label("Genre"), value(movie.genre.as_deref())]),
    Line::from(vec![label("Director"), value(movie.director.as_deref())]),
    Line::from(vec![label("Writer"), value(movie.writer.as_deref())]),
    Line::from(vec![label("Actors"), value(movie.actors.as_deref())]),
    Line::from(vec![label("Awards"), value(movie.awards.as_deref())]),
    Line::from(vec![label("Box office"), value(movie.box_office.as_deref())]),
  ];
  for rating in &movie.ratings_by_source {
    lines.push(Line::from(vec![
      Span::styled(format!("  {}: ", rating.source), Style::default().fg(theme.muted)),
      Span::styled(rating.value.as_str(), Style::default().fg(theme.fg)),
    ]));
  }
  lines.push(Line::from(""));
  let plot = MovieRecord::display_field(movie.plot.as_deref());
  lines.push(Line::from(Span::styled(plot, Style::default().fg(theme.fg))));
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(movie.imdb_url(), Style::default().fg(theme.accent).underlined())));
  lines
}

fn render_poster(frame: &mut Frame, app: &mut App, movie: &MovieRecord, area: Rect) {
  let theme = app.theme();
  let block = rounded_block(theme, false);
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let Some((ref id, ref image)) = app.poster.image else {
    let text = if movie.poster().is_some() { "Loading poster…" } else { "No poster" };
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).style(Style::default().fg(theme.muted));
    frame.render_widget(paragraph, inner);
    return;
  };
  if *id != movie.external_id {
    return;
  }

  let needs_fit = match &app.poster.fitted {
    Some((fid, w, h, _)) => fid != id || *w != inner.width || *h != inner.height,
    None => true,
  };
  if needs_fit {
    let fitted = fit_poster(image, inner.width, inner.height, app.display_mode);
    app.poster.fitted = Some((id.clone(), inner.width, inner.height, fitted));
  }
  if let Some((_, _, _, ref fitted)) = app.poster.fitted {
    frame.render_widget(PosterWidget { image: fitted, display_mode: app.display_mode }, inner);
  }
}

fn render_trailer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = rounded_block(theme, true)
    .title(" Trailer ")
    .title_style(Style::default().fg(theme.accent).bold())
    .padding(Padding::horizontal(1));

  let lines = match app.trailer.state() {
    TrailerState::Closed => return,
    TrailerState::Loading { .. } => {
      vec![Line::from(Span::styled("Looking up trailer…", Style::default().fg(theme.status)))]
    }
    TrailerState::Playing { video_id, .. } => vec![
      Line::from(Span::styled(embed_url(video_id), Style::default().fg(theme.accent).underlined())),
      Line::from(vec![
        Span::styled(" ^o ", Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(" open in browser", Style::default().fg(theme.muted)),
      ]),
    ],
    TrailerState::Failed { message, .. } => {
      vec![Line::from(Span::styled(message.as_str(), Style::default().fg(theme.error)))]
    }
  };
  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}

fn striped_item<'a>(theme: &Theme, i: usize, line: Line<'a>) -> ListItem<'a> {
  let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
  ListItem::new(line).bg(bg)
}

fn render_history(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::History;
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = app
    .history
    .entries()
    .iter()
    .enumerate()
    .map(|(i, term)| striped_item(theme, i, Line::from(Span::styled(truncate_str(term, inner_w), Style::default().fg(theme.fg)))))
    .collect();

  let list = if items.is_empty() {
    List::new(vec![ListItem::new(Span::styled("No searches yet", Style::default().fg(theme.muted)))])
  } else {
    List::new(items)
  };
  let list = list
    .block(rounded_block(theme, focused).title(" History ").title_style(Style::default().fg(theme.accent).bold()))
    .highlight_symbol(if focused { "▶ " } else { "  " })
    .highlight_style(highlight(theme, focused));

  frame.render_stateful_widget(list, area, &mut app.history_state);
}

fn render_favorites(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = matches!(app.mode, AppMode::Favorites | AppMode::Filter);
  let view = app.favorites_view();
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = view
    .iter()
    .enumerate()
    .map(|(i, movie)| {
      let year = format!(" {}", movie.year);
      let title = truncate_str(&movie.title, inner_w.saturating_sub(year.chars().count()));
      let gap = inner_w.saturating_sub(title.chars().count() + year.chars().count());
      let line = Line::from(vec![
        Span::styled(title, Style::default().fg(theme.fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(year, Style::default().fg(theme.muted)),
      ]);
      striped_item(theme, i, line)
    })
    .collect();

  let mut title = vec![
    Span::styled(format!(" Favorites ({}) ", view.len()), Style::default().fg(theme.accent).bold()),
    Span::styled(format!("{} ", app.favorites_sort.label()), Style::default().fg(theme.muted)),
  ];
  if app.mode == AppMode::Filter || !app.filter_input.is_empty() {
    let cursor = if app.mode == AppMode::Filter { "▏" } else { "" };
    title.push(Span::styled(format!("/{}{} ", app.filter_input.text, cursor), Style::default().fg(theme.status)));
  }

  let list = if items.is_empty() {
    let hint = if app.favorites.is_empty() { "^f saves the movie on screen" } else { "No favorites match" };
    List::new(vec![ListItem::new(Span::styled(hint, Style::default().fg(theme.muted)))])
  } else {
    List::new(items)
  };
  let list = list
    .block(rounded_block(theme, focused).title(Line::from(title)))
    .highlight_symbol(if focused { "▶ " } else { "  " })
    .highlight_style(highlight(theme, focused));

  frame.render_stateful_widget(list, area, &mut app.favorites_state);
}

fn highlight(theme: &Theme, focused: bool) -> Style {
  if focused {
    Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(theme.accent)
  }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = app.status_message() {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = app.last_error.as_ref().or(app.search.state().error.as_ref()) {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ✓ {}", info), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_inputs(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [title_area, year_area] = Layout::horizontal([Constraint::Min(10), Constraint::Length(12)]).areas(area);
  let mode = app.mode;
  render_field(frame, theme, &mut app.title_input, " Movie title ", mode == AppMode::Title, title_area);
  render_field(frame, theme, &mut app.year_input, " Year ", mode == AppMode::Year, year_area);
}

fn render_field(frame: &mut Frame, theme: &Theme, field: &mut TextField, title: &str, focused: bool, area: Rect) {
  let border_color = if focused { theme.accent } else { theme.border };
  let block = rounded_block(theme, focused)
    .title(title.to_string())
    .title_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let Some((visible, cursor_offset)) = visible_window(field, inner_w) else {
    frame.render_widget(block, area);
    return;
  };

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(block);
  frame.render_widget(paragraph, area);

  if focused {
    let cursor_x = area.x + 2 + cursor_offset as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

/// Scroll `field` so the cursor stays inside `inner_w` columns. Returns the
/// visible text and the cursor's column within it, or `None` with no room to draw.
fn visible_window(field: &mut TextField, inner_w: usize) -> Option<(String, usize)> {
  if inner_w == 0 {
    return None;
  }
  let cursor_col = display_width(&field.text, field.cursor);

  if cursor_col < field.scroll {
    field.scroll = cursor_col;
  } else if cursor_col >= field.scroll + inner_w {
    field.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let scroll = field.scroll;
  let visible: String = field
    .text
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= scroll)
    .take_while(|(start, _, _)| *start < scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  Some((visible, cursor_col - scroll))
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_movie = app.search.current().is_some();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Title | AppMode::Year => {
      let mut k = vec![("Enter", "Search"), ("Tab", "Next")];
      if has_movie {
        k.push(("^f", if app.is_current_favorite() { "Unsave" } else { "Save" }));
        k.push(("^p", if app.trailer.is_open() { "Hide trailer" } else { "Trailer" }));
        k.push(("^o", "Open"));
      }
      k.push(("^t", "Theme"));
      k.push(("Esc", if app.trailer.is_open() { "Close" } else { "Clear/Quit" }));
      k
    }
    AppMode::History => {
      vec![("Enter", "Search"), ("j/k", "Navigate"), ("d", "Remove"), ("C", "Clear all"), ("Esc", "Back")]
    }
    AppMode::Favorites => vec![
      ("Enter", "Search"),
      ("j/k", "Navigate"),
      ("d", "Remove"),
      ("s", "Sort"),
      ("/", "Filter genre"),
      ("Esc", "Back"),
    ],
    AppMode::Filter => vec![("Enter", "Apply"), ("Esc", "Clear filter")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
