/// Transcript pane rendering — build_items, draw_history, spinner, wrapping.
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem},
};
use unicode_width::UnicodeWidthStr;

use super::{AppState, ChoiceKind, Focus};
use crate::richtext::{FormattedText, Segment};
use crate::transcript::{Attachment, Author};

// ── Spinner ────────────────────────────────────────────────────────────────────

pub const SPINNER_GLYPHS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_MSGS: &[&str] = &[
    "thinking…",
    "looking things up…",
    "checking listings…",
    "almost there…",
];

pub fn spinner_frame(tick: u32) -> (&'static str, &'static str) {
    let glyph = SPINNER_GLYPHS[(tick as usize) % SPINNER_GLYPHS.len()];
    // Message cycles more slowly — changes every ~2 seconds (120ms × 16 ticks)
    let msg = SPINNER_MSGS[(tick as usize / 16) % SPINNER_MSGS.len()];
    (glyph, msg)
}

// ── Transcript items builder ───────────────────────────────────────────────────

pub fn build_items(state: &AppState, term_width: u16) -> Vec<ListItem<'static>> {
    let mut items: Vec<ListItem<'static>> = Vec::new();
    let entries = state.controller.transcript().snapshot();

    // Only the most recent attachment is live for selection
    let live_attachment = entries
        .iter()
        .rposition(|e| e.attachment.is_some());
    let choice_set = state.choice_set();

    for (idx, entry) in entries.iter().enumerate() {
        let stamp = if state.show_timestamps {
            Some(entry.timestamp.format("%H:%M").to_string())
        } else {
            None
        };

        match entry.author {
            Author::User => push_user_bubble(&mut items, &entry.body, stamp, term_width),
            Author::Assistant => push_assistant(&mut items, &entry.body, stamp, term_width),
        }

        if let Some(attachment) = &entry.attachment {
            let live = live_attachment == Some(idx)
                && choice_set.as_ref().map(|c| c.kind)
                    == Some(match attachment {
                        Attachment::Recommendations(_) => ChoiceKind::Recommendations,
                        Attachment::Options(_) => ChoiceKind::Fields,
                    });
            push_attachment(&mut items, attachment, live, state);
        }
    }

    // Typing indicator while any call is in flight
    if state.controller.session().is_waiting() {
        let (glyph, msg) = spinner_frame(state.spinner_tick);
        items.push(ListItem::new(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                format!("{glyph} {msg}"),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])));
    }

    items
}

fn push_user_bubble(
    items: &mut Vec<ListItem<'static>>,
    body: &FormattedText,
    stamp: Option<String>,
    term_width: u16,
) {
    let bg = Color::Rgb(28, 26, 52);
    let border = Color::Rgb(110, 90, 200);
    let label_fg = Color::Rgb(160, 140, 255);
    let text_fg = Color::Rgb(235, 232, 255);
    let body_style = Style::default().fg(text_fg).bg(bg);
    let edge_style = Style::default().fg(border).bg(bg);

    // Dynamic widths — 2 chars left margin, 1 right margin
    let inner_w = (term_width as usize).saturating_sub(3).max(10);
    let label = match &stamp {
        Some(s) => format!("you {s}"),
        None => "you".to_string(),
    };
    // Top: "╭─ you ──...──╮"
    let dash_total = inner_w.saturating_sub(5 + label.width());
    let top_dashes = "─".repeat(dash_total);
    items.push(ListItem::new(Line::from(vec![
        Span::raw("  "),
        Span::styled("╭─ ".to_string(), edge_style),
        Span::styled(
            label,
            Style::default().fg(label_fg).bg(bg).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {top_dashes}╮"), edge_style),
    ])));

    // Body — word-wrap inside the box ("│ " = 2 cols)
    let wrap_width = inner_w.saturating_sub(2).max(10);
    for line in wrap_formatted(body, wrap_width) {
        let mut spans = vec![Span::raw("  "), Span::styled("│ ".to_string(), edge_style)];
        for (text, _bold) in line {
            spans.push(Span::styled(text, body_style));
        }
        items.push(ListItem::new(Line::from(spans)));
    }

    let bot_dashes = "─".repeat(inner_w.saturating_sub(2));
    items.push(ListItem::new(Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("╰{bot_dashes}╯"), edge_style),
    ])));
    items.push(ListItem::new(Line::raw("")));
}

fn push_assistant(
    items: &mut Vec<ListItem<'static>>,
    body: &FormattedText,
    stamp: Option<String>,
    term_width: u16,
) {
    // "        " indent = 8 cols
    let wrap_width = (term_width as usize).saturating_sub(8).max(20);
    let label_fg = Color::Rgb(0, 210, 210);
    let text_fg = Color::Rgb(210, 230, 255);

    let mut first = true;
    for line in wrap_formatted(body, wrap_width) {
        let mut spans: Vec<Span<'static>> = Vec::new();
        if first {
            first = false;
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                "jobot",
                Style::default().fg(label_fg).add_modifier(Modifier::BOLD),
            ));
            if let Some(s) = &stamp {
                spans.push(Span::styled(
                    format!(" {s}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans.push(Span::raw("  "));
        } else {
            spans.push(Span::raw("        "));
        }
        for (text, bold) in line {
            let style = if bold {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(text_fg)
            };
            spans.push(Span::styled(text, style));
        }
        items.push(ListItem::new(Line::from(spans)));
    }
    items.push(ListItem::new(Line::raw("")));
}

fn push_attachment(
    items: &mut Vec<ListItem<'static>>,
    attachment: &Attachment,
    live: bool,
    state: &AppState,
) {
    let labels: Vec<String> = match attachment {
        Attachment::Recommendations(recs) => recs.iter().map(|r| r.title.clone()).collect(),
        Attachment::Options(opts) => opts.iter().map(|s| s.to_string()).collect(),
    };
    let choosing = live && state.focus == Focus::Choices;

    for (i, label) in labels.iter().enumerate() {
        let selected = choosing && state.choice_selected == i;
        let (marker, style) = if selected {
            (
                "› ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else if live {
            ("▸ ", Style::default().fg(Color::Rgb(140, 200, 255)))
        } else {
            ("· ", Style::default().fg(Color::Rgb(70, 70, 95)))
        };
        items.push(ListItem::new(Line::from(vec![
            Span::raw("        "),
            Span::styled(marker, style),
            Span::styled(label.clone(), style),
        ])));
    }
    if live && !choosing {
        items.push(ListItem::new(Line::from(vec![
            Span::raw("        "),
            Span::styled(
                "Tab to choose",
                Style::default().fg(Color::Rgb(55, 50, 90)),
            ),
        ])));
    }
    items.push(ListItem::new(Line::raw("")));
}

// ── Drawing ────────────────────────────────────────────────────────────────────

pub fn draw_history(f: &mut Frame, state: &AppState, area: Rect) {
    let all_items = build_items(state, area.width);
    let total = all_items.len();
    let visible = area.height as usize;

    let skip = if total > visible {
        (total - visible).saturating_sub(state.scroll)
    } else {
        0
    };

    let sliced: Vec<ListItem<'static>> = all_items.into_iter().skip(skip).collect();
    let list = List::new(sliced)
        .block(Block::default().style(Style::default().bg(Color::Rgb(8, 8, 14))));
    f.render_widget(list, area);
}

// ── Wrapping ───────────────────────────────────────────────────────────────────

/// Word-wrap formatted text to `max_width` columns, preserving bold runs.
/// Each output line is a sequence of (text, bold) runs; blank logical lines
/// come through as empty vecs.
pub fn wrap_formatted(body: &FormattedText, max_width: usize) -> Vec<Vec<(String, bool)>> {
    // Explode segments into logical lines of (word, bold)
    let mut logical: Vec<Vec<(String, bool)>> = vec![Vec::new()];
    for seg in &body.segments {
        match seg {
            Segment::Break => logical.push(Vec::new()),
            Segment::Text(s) => {
                if let Some(line) = logical.last_mut() {
                    push_words(line, s, false);
                }
            }
            Segment::Bold(s) => {
                if let Some(line) = logical.last_mut() {
                    push_words(line, s, true);
                }
            }
        }
    }

    let mut out = Vec::new();
    for words in logical {
        if words.is_empty() {
            out.push(Vec::new());
            continue;
        }
        let mut current: Vec<(String, bool)> = Vec::new();
        let mut width = 0usize;
        for (word, bold) in words {
            let word_width = word.width();
            if word_width > max_width {
                // Tokens wider than the pane (long URLs) get hard-split
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                    width = 0;
                }
                let mut chunks = split_oversized(&word, max_width.max(1));
                let last = chunks.pop();
                for chunk in chunks {
                    out.push(vec![(chunk, bold)]);
                }
                if let Some(last) = last {
                    width = last.width();
                    current.push((last, bold));
                }
                continue;
            }
            if width == 0 {
                current.push((word, bold));
                width = word_width;
            } else if width + 1 + word_width <= max_width {
                append_word(&mut current, &word, bold);
                width += 1 + word_width;
            } else {
                out.push(std::mem::take(&mut current));
                current.push((word, bold));
                width = word_width;
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

/// Break a single over-wide word into chunks of at most `max_width` columns.
fn split_oversized(word: &str, max_width: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut w = 0usize;
    for c in word.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if w + cw > max_width && !chunk.is_empty() {
            chunks.push(std::mem::take(&mut chunk));
            w = 0;
        }
        chunk.push(c);
        w += cw;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

fn push_words(line: &mut Vec<(String, bool)>, text: &str, bold: bool) {
    for word in text.split_whitespace() {
        line.push((word.to_string(), bold));
    }
}

/// Append a word to the current line, merging into the previous run when the
/// style matches (the joining space inherits the previous run's style).
fn append_word(current: &mut Vec<(String, bool)>, word: &str, bold: bool) {
    match current.last_mut() {
        Some((run, run_bold)) if *run_bold == bold => {
            run.push(' ');
            run.push_str(word);
        }
        Some((run, _)) => {
            run.push(' ');
            current.push((word.to_string(), bold));
        }
        None => current.push((word.to_string(), bold)),
    }
}

// ── Utilities ──────────────────────────────────────────────────────────────────

pub fn truncate_str(s: &str, max: usize) -> String {
    if s.width() <= max {
        s.to_string()
    } else {
        let mut out = String::new();
        let mut w = 0;
        for c in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if w + cw + 1 > max {
                break;
            }
            out.push(c);
            w += cw;
        }
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_preserves_bold_runs() {
        let ft = FormattedText::parse("see **Engineer A** today");
        let lines = wrap_formatted(&ft, 80);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            vec![
                ("see ".to_string(), false),
                ("Engineer A ".to_string(), true),
                ("today".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_wrap_splits_long_lines() {
        let ft = FormattedText::parse("one two three four");
        let lines = wrap_formatted(&ft, 10);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec![("one two".to_string(), false)]);
        assert_eq!(lines[1], vec![("three four".to_string(), false)]);
    }

    #[test]
    fn test_wrap_hard_splits_oversized_words() {
        let ft = FormattedText::parse("see http://example.com/very/long/listing/path now");
        let lines = wrap_formatted(&ft, 10);
        for line in &lines {
            let w: usize = line.iter().map(|(s, _)| s.width()).sum();
            assert!(w <= 10, "line exceeds width: {line:?}");
        }
        // Nothing is dropped: the flattened text still contains the whole URL
        let joined: String = lines
            .iter()
            .flat_map(|l| l.iter().map(|(s, _)| s.as_str()))
            .collect();
        assert_eq!(
            joined.replace(' ', ""),
            "seehttp://example.com/very/long/listing/pathnow"
        );
    }

    #[test]
    fn test_wrap_keeps_blank_lines() {
        let ft = FormattedText::parse("a\n\nb");
        let lines = wrap_formatted(&ft, 40);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].is_empty());
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a long endpoint url", 8), "a long …");
    }
}
