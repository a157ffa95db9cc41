/// Ratatui draw entry-point for Jobot.
/// Thin dispatcher — transcript rendering lives in chat.rs.
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use super::{AppState, FilePickerState, Focus};
use super::chat::{spinner_frame, truncate_str};

// ── Main draw entry point ─────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, state: &AppState) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // transcript
            Constraint::Length(1), // status bar
            Constraint::Length(3), // input box
        ])
        .split(area);

    super::chat::draw_history(f, state, chunks[0]);
    draw_status_bar(f, state, chunks[1]);
    draw_input(f, state, chunks[2]);

    if state.focus == Focus::FilePicker {
        if let Some(fp) = &state.file_picker {
            draw_file_picker(f, fp, area);
        }
    }
}

// ── Status bar ────────────────────────────────────────────────────────────────

fn draw_status_bar(f: &mut Frame, state: &AppState, area: Rect) {
    let waiting = state.controller.session().is_waiting();
    let (status_glyph, status_color) = if waiting {
        let (g, _) = spinner_frame(state.spinner_tick);
        (g, Color::Cyan)
    } else {
        ("●", Color::White)
    };

    let mode_label = state.controller.session().mode().label();
    let staged = state
        .controller
        .staged_filename()
        .map(|name| format!("  📎 {name}"))
        .unwrap_or_default();
    let notice = state
        .notice
        .as_deref()
        .map(|n| format!("  {n}"))
        .unwrap_or_default();

    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            status_glyph,
            Style::default().fg(status_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " jobot",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            state.profile.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ·  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            mode_label,
            Style::default().fg(Color::Rgb(200, 160, 50)).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ", Style::default()),
        Span::styled(
            truncate_str(&state.endpoint, 28),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(staged, Style::default().fg(Color::Rgb(140, 200, 255))),
        Span::styled(notice, Style::default().fg(Color::Yellow)),
        Span::styled(
            "  Tab choices  Ctrl+T mode  @ resume  Ctrl+Q quit",
            Style::default().fg(Color::Rgb(55, 50, 90)),
        ),
    ]);

    let bar_style = if waiting {
        Style::default().bg(Color::Rgb(15, 15, 25))
    } else {
        Style::default().bg(Color::Rgb(10, 10, 18))
    };

    f.render_widget(Paragraph::new(line).style(bar_style), area);
}

// ── Input box ─────────────────────────────────────────────────────────────────

fn draw_input(f: &mut Frame, state: &AppState, area: Rect) {
    let focused = state.focus == Focus::Input;
    let border_color = if focused { Color::Cyan } else { Color::Rgb(60, 55, 90) };

    let display: Line = if state.input.is_empty() && focused {
        Line::from(Span::styled(
            "Ask about careers or skills — or @ to attach a resume",
            Style::default().fg(Color::Rgb(70, 70, 95)),
        ))
    } else {
        // Cursor shown as a reversed cell at the insertion point
        let (before, after) = state.input.split_at(state.cursor.min(state.input.len()));
        let mut chars = after.chars();
        let at_cursor = chars.next().map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
        let rest: String = chars.collect();
        Line::from(vec![
            Span::styled(before.to_string(), Style::default().fg(Color::White)),
            Span::styled(
                at_cursor,
                if focused {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default().fg(Color::White)
                },
            ),
            Span::styled(rest, Style::default().fg(Color::White)),
        ])
    };

    f.render_widget(
        Paragraph::new(display).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color)),
        ),
        area,
    );
}

// ── File picker overlay ───────────────────────────────────────────────────────

fn draw_file_picker(f: &mut Frame, fp: &FilePickerState, area: Rect) {
    let width = (area.width * 3 / 4).clamp(30, 70);
    let height = 12.min(area.height.saturating_sub(4)).max(5);
    let overlay = Rect {
        x: (area.width.saturating_sub(width)) / 2,
        y: (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    f.render_widget(Clear, overlay);

    let filtered = fp.filtered();
    let items: Vec<ListItem> = if filtered.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "  no PDF files found",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        filtered
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let style = if i == fp.selected {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(Line::from(Span::styled(format!("  {path}"), style)))
            })
            .collect()
    };

    let title = if fp.query.is_empty() {
        " attach resume (PDF) ".to_string()
    } else {
        format!(" attach resume — {} ", fp.query)
    };
    f.render_widget(
        List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        ),
        overlay,
    );
}
