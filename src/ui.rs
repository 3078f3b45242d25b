//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::App;
use crate::config::UiSettings;
use crate::library::Track;
use crate::playback::PlaybackSelection;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("g/G", "top/bottom");
    map.insert("enter", "play selected song");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "previous/next song");
    map.insert("r", "rescan");
    map.insert("esc", "close message");
    map.insert("q", "quit");
    map
});

/// Render the controls help text.
fn controls_text() -> String {
    // Keep the rendered order stable and human-friendly.
    let order = ["j/k", "h/l", "enter", "space/p", "g/G", "r", "esc", "q"];
    order
        .iter()
        .filter_map(|k| CONTROLS_MAP.get(k).map(|v| format!("[{}] {}", k, v)))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Describe a `data:` cover reference without printing its payload.
fn cover_label(cover: Option<&str>) -> String {
    match cover
        .and_then(|c| c.strip_prefix("data:"))
        .and_then(|rest| rest.split(';').next())
    {
        Some(mime) if !mime.is_empty() => format!("Cover: {mime}"),
        _ => "No cover".to_string(),
    }
}

/// Elapsed time, plus the total when the track length is known.
fn time_text(elapsed: Duration, total: Option<Duration>) -> String {
    match total {
        Some(t) => format!("{} / {}", format_mmss(elapsed), format_mmss(t)),
        None => format_mmss(elapsed),
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Which slice of `total` rows to show so `selected` stays roughly centered.
fn visible_window(total: usize, rows: usize, selected: usize) -> (usize, usize) {
    if total <= rows || rows == 0 {
        return (0, total);
    }
    let half = rows / 2;
    let mut start = selected.saturating_sub(half);
    if start + rows > total {
        start = total - rows;
    }
    (start, start + rows)
}

fn left_padded() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    selection: PlaybackSelection,
    now_playing: Option<&Track>,
    elapsed: Duration,
    ui_settings: &UiSettings,
) {
    let player_height = if now_playing.is_some() { 6 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(player_height),
            Constraint::Length(3),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" pochette ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status = {
        let mut parts: Vec<String> = Vec::new();
        if app.loading {
            parts.push("Loading files...".to_string());
        } else if !app.has_tracks() {
            parts.push("No MP3 file found".to_string());
        } else {
            parts.push(format!("{} tracks", app.catalog.len()));
        }
        if let Some(dir) = &app.current_dir {
            parts.push(format!("Dir: {}", dir));
        }
        parts.join(" • ")
    };
    let status_par = Paragraph::new(status)
        .block(Block::bordered().padding(left_padded()).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Track list: title on the first line, artist and album below it.
    {
        let tracks = app.catalog.tracks();
        let rows = (chunks[2].height.saturating_sub(2) / 2).max(1) as usize;
        let (start, end) = visible_window(tracks.len(), rows, app.selected);

        let visible_items: Vec<ListItem> = tracks[start..end]
            .iter()
            .enumerate()
            .map(|(offset, track)| {
                let playing = selection.current_index == Some(start + offset);
                let marker = if playing { "♪ " } else { "" };
                ListItem::new(vec![
                    Line::from(format!("{}{}", marker, track.title)),
                    Line::from(track.subtitle(&ui_settings.subtitle_separator)).dim(),
                ])
            })
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if !tracks.is_empty() {
            state.select(Some(app.selected - start));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Player controls, only once something has been selected.
    if let Some(track) = now_playing {
        let state = if selection.is_playing {
            "▶ Playing"
        } else {
            "⏸ Paused"
        };
        let button = if selection.is_playing { "Pause" } else { "Play" };
        let lines = vec![
            Line::from(track.title.clone()).bold(),
            Line::from(track.subtitle(&ui_settings.subtitle_separator)),
            Line::from(format!(
                "{} [{}] • {}",
                state,
                time_text(elapsed, track.duration),
                cover_label(track.cover.as_deref())
            )),
            Line::from(format!("[h] Previous   [space] {}   [l] Next", button)),
        ];
        let player = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" now playing ")
                .padding(left_padded()),
        );
        frame.render_widget(player, chunks[3]);
    }

    let footer = Paragraph::new(controls_text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_padded()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);

    // Notice popup over the list.
    if let Some(notice) = &app.notice {
        let popup_area = centered_rect_sized(60, 7, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let popup = Paragraph::new(notice.message.as_str())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} (esc closes) ", notice.title))
                    .padding(left_padded()),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(popup, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_helpers() {
        assert_eq!(format_mmss(Duration::from_secs(125)), "02:05");
        assert_eq!(
            time_text(Duration::from_secs(5), Some(Duration::from_secs(60))),
            "00:05 / 01:00"
        );
        assert_eq!(time_text(Duration::ZERO, None), "00:00");
    }

    #[test]
    fn cover_label_shows_mime_only() {
        assert_eq!(
            cover_label(Some("data:image/jpeg;base64,AAAA")),
            "Cover: image/jpeg"
        );
        assert_eq!(cover_label(None), "No cover");
        assert_eq!(cover_label(Some("garbage")), "No cover");
    }

    #[test]
    fn visible_window_keeps_selection_in_view() {
        assert_eq!(visible_window(5, 10, 3), (0, 5));
        assert_eq!(visible_window(100, 10, 0), (0, 10));
        assert_eq!(visible_window(100, 10, 50), (45, 55));
        assert_eq!(visible_window(100, 10, 99), (90, 100));
    }

    #[test]
    fn controls_text_lists_every_binding() {
        let text = controls_text();
        assert!(text.starts_with("[j/k] up/down"));
        assert!(text.contains("[r] rescan"));
        assert!(text.ends_with("[q] quit"));
    }
}
