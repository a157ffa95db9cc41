/// Ratatui-based TUI for Jobot.
///
/// Architecture:
///   main thread:   event loop — crossterm keyboard events + mpsc UiEvent drain
///   gateway tasks: tokio::spawn per backend call — each sends one UiEvent back
///
/// Layout:
///   ┌────────────────────────────────────────────────┐
///   │  conversation transcript (scrollable, Min(0))  │
///   ├────────────────────────────────────────────────┤
///   │  status bar (1 line)                           │
///   ├────────────────────────────────────────────────┤
///   │  input box (3 lines, fixed)                    │
///   └────────────────────────────────────────────────┘
pub mod chat;
pub mod render;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use crate::config::ResolvedConfig;
use crate::controller::{Controller, FieldAction, SendAction};
use crate::gateway::{DetailReply, HttpGateway, ParaphraseReply, TurnReply, TurnRequest};
use crate::gateway::{DetailRequest, ParaphraseRequest};
use crate::session::CallToken;

// ── UiEvent — typed completions from gateway tasks → TUI ──────────────────────

#[derive(Debug)]
pub enum UiEvent {
    /// A chat turn resolved (transport errors flattened to a display string)
    TurnDone { token: CallToken, outcome: Result<TurnReply, String> },
    /// A detail fetch resolved
    DetailDone { token: CallToken, title: String, outcome: Result<DetailReply, String> },
    /// A field paraphrase resolved
    SummaryDone { token: CallToken, outcome: Result<ParaphraseReply, String> },
}

// ── Focus — which pane keystrokes go to ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Choices,
    FilePicker,
}

// ── ChoiceSet — the selectable list derived from session state ────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKind {
    Recommendations,
    Fields,
}

#[derive(Debug, Clone)]
pub struct ChoiceSet {
    pub kind: ChoiceKind,
    pub labels: Vec<String>,
}

// ── FilePicker state ──────────────────────────────────────────────────────────

pub struct FilePickerState {
    /// All candidate PDF paths (relative to cwd), gathered once on open
    pub all_pdfs: Vec<String>,
    /// Current filter query (text after the `@`)
    pub query: String,
    /// Index of highlighted item in filtered list
    pub selected: usize,
    /// Byte offset of the `@` character in `AppState::input`
    pub at_offset: usize,
}

impl FilePickerState {
    pub fn filtered(&self) -> Vec<&String> {
        if self.query.is_empty() {
            self.all_pdfs.iter().collect()
        } else {
            let q = self.query.to_lowercase();
            self.all_pdfs
                .iter()
                .filter(|p| p.to_lowercase().contains(&q))
                .collect()
        }
    }
}

/// Collect PDF files under cwd up to depth 4, skipping hidden dirs and common noise.
pub fn gather_pdfs() -> Vec<String> {
    let mut out = Vec::new();
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    walk_dir(&cwd, &cwd, 0, 4, &mut out);
    out.sort();
    out
}

fn walk_dir(
    base: &std::path::Path,
    dir: &std::path::Path,
    depth: usize,
    max_depth: usize,
    out: &mut Vec<String>,
) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name_str = name.to_string_lossy();

        if name_str.starts_with('.') || name_str == "target" || name_str == "node_modules" {
            continue;
        }

        if path.is_dir() {
            walk_dir(base, &path, depth + 1, max_depth, out);
        } else if path.is_file()
            && name_str.to_ascii_lowercase().ends_with(".pdf")
        {
            if let Ok(rel) = path.strip_prefix(base) {
                out.push(rel.display().to_string());
            }
        }
    }
}

// ── AppState ──────────────────────────────────────────────────────────────────

pub struct AppState {
    pub controller: Controller,
    pub input: String,
    pub cursor: usize, // byte offset in input
    pub focus: Focus,
    /// Highlighted index within the current choice set
    pub choice_selected: usize,
    pub scroll: usize, // lines scrolled up in the transcript
    pub profile: String,
    pub endpoint: String,
    pub show_timestamps: bool,
    /// Incremented every 120ms while a call is in flight, for the spinner
    pub spinner_tick: u32,
    pub file_picker: Option<FilePickerState>,
    /// One-line ephemeral message shown in the status bar (cleared on next key)
    pub notice: Option<String>,
}

impl AppState {
    pub fn new(resolved: &ResolvedConfig, show_timestamps: bool) -> Self {
        Self {
            controller: Controller::new(resolved.mode),
            input: String::new(),
            cursor: 0,
            focus: Focus::Input,
            choice_selected: 0,
            scroll: 0,
            profile: resolved.profile_name.clone(),
            endpoint: resolved.endpoint.clone(),
            show_timestamps,
            spinner_tick: 0,
            file_picker: None,
            notice: None,
        }
    }

    /// The selectable list currently on offer, derived purely from session
    /// state: an unexpired recommendation list wins, otherwise the field
    /// options of the active detail record.
    pub fn choice_set(&self) -> Option<ChoiceSet> {
        let session = self.controller.session();
        let recs = session.recommendations();
        if !recs.is_empty() {
            return Some(ChoiceSet {
                kind: ChoiceKind::Recommendations,
                labels: recs.iter().map(|r| r.title.clone()).collect(),
            });
        }
        if session.active_detail().is_some() {
            let labels = session.mode().field_options();
            return Some(ChoiceSet {
                kind: ChoiceKind::Fields,
                labels: labels.iter().map(|s| s.to_string()).collect(),
            });
        }
        None
    }

    fn apply_event(&mut self, ev: UiEvent) {
        match ev {
            UiEvent::TurnDone { token, outcome } => {
                self.controller.apply_turn(token, outcome);
            }
            UiEvent::DetailDone { token, title, outcome } => {
                self.controller.apply_detail(token, &title, outcome);
            }
            UiEvent::SummaryDone { token, outcome } => {
                self.controller.apply_summary(token, outcome);
            }
        }
        // New content: snap to bottom and re-clamp the choice cursor
        self.scroll = 0;
        let count = self.choice_set().map(|c| c.labels.len()).unwrap_or(0);
        if count == 0 {
            if self.focus == Focus::Choices {
                self.focus = Focus::Input;
            }
            self.choice_selected = 0;
        } else if self.choice_selected >= count {
            self.choice_selected = count - 1;
        }
    }
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

// ── Main TUI run loop ─────────────────────────────────────────────────────────

pub async fn run(resolved: ResolvedConfig, show_timestamps: bool) -> Result<()> {
    let mut terminal = setup_terminal()?;

    // Panic hook — restore terminal before printing panic
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        orig_hook(info);
    }));

    let result = event_loop(&mut terminal, resolved, show_timestamps).await;

    restore_terminal(&mut terminal);
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    resolved: ResolvedConfig,
    show_timestamps: bool,
) -> Result<()> {
    let gateway = Arc::new(HttpGateway::new(
        resolved.endpoint.clone(),
        resolved.timeout_secs,
    )?);
    let mut state = AppState::new(&resolved, show_timestamps);

    // Channel: gateway tasks → TUI
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<UiEvent>();

    let mut crossterm_events = EventStream::new();
    let mut ticker = tokio::time::interval(tokio::time::Duration::from_millis(120));

    terminal.draw(|f| render::draw(f, &state))?;

    loop {
        tokio::select! {
            // ── Spinner tick ──────────────────────────────────────────────────
            _ = ticker.tick() => {
                if state.controller.session().is_waiting() {
                    state.spinner_tick = state.spinner_tick.wrapping_add(1);
                    terminal.draw(|f| render::draw(f, &state))?;
                }
            }

            // ── Drain completions from gateway tasks ──────────────────────────
            Some(ev) = ui_rx.recv() => {
                state.apply_event(ev);
                terminal.draw(|f| render::draw(f, &state))?;
            }

            // ── Keyboard/resize events ────────────────────────────────────────
            Some(Ok(ev)) = crossterm_events.next() => {
                match ev {
                    Event::Key(key) => {
                        let keep = handle_key(key, &mut state, &gateway, ui_tx.clone());
                        if !keep { break; }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
                terminal.draw(|f| render::draw(f, &state))?;
            }
        }
    }

    Ok(())
}

// ── Key handler ───────────────────────────────────────────────────────────────

fn handle_key(
    key: KeyEvent,
    state: &mut AppState,
    gateway: &Arc<HttpGateway>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
) -> bool {
    state.notice = None;

    // Quit works from any focus
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return false;
    }

    // ── FilePicker focus ──────────────────────────────────────────────────────
    if state.focus == Focus::FilePicker {
        if let Some(fp) = &mut state.file_picker {
            match key.code {
                KeyCode::Esc => {
                    // Cancel: strip the `@` and query, keep text after them
                    let at = fp.at_offset;
                    let end = at + 1 + fp.query.len();
                    state.input.replace_range(at..end, "");
                    state.cursor = at;
                    state.focus = Focus::Input;
                    state.file_picker = None;
                }
                KeyCode::Up => {
                    if fp.selected > 0 {
                        fp.selected -= 1;
                    }
                }
                KeyCode::Down => {
                    let count = fp.filtered().len();
                    if fp.selected + 1 < count {
                        fp.selected += 1;
                    }
                }
                KeyCode::Enter | KeyCode::Tab => {
                    let filtered = fp.filtered();
                    let chosen = filtered.get(fp.selected).map(|s| s.to_string());
                    let at = fp.at_offset;
                    let end = at + 1 + fp.query.len();
                    state.input.replace_range(at..end, "");
                    state.cursor = at;
                    state.focus = Focus::Input;
                    state.file_picker = None;
                    if let Some(chosen) = chosen {
                        state.controller.stage_file(std::path::Path::new(&chosen));
                    }
                }
                KeyCode::Backspace => {
                    if let Some(c) = fp.query.pop() {
                        let prev = state.cursor - c.len_utf8();
                        state.input.remove(prev);
                        state.cursor = prev;
                        fp.selected = 0;
                    } else {
                        // Backspaced past `@` — cancel picker
                        let at = fp.at_offset;
                        state.input.remove(at);
                        state.cursor = at;
                        state.focus = Focus::Input;
                        state.file_picker = None;
                    }
                }
                KeyCode::Char(c) => {
                    fp.query.push(c);
                    fp.selected = 0;
                    // Mirror into input so the user sees what they're typing
                    state.input.insert(state.cursor, c);
                    state.cursor += c.len_utf8();
                }
                _ => {}
            }
        }
        return true;
    }

    // ── Choices focus ─────────────────────────────────────────────────────────
    if state.focus == Focus::Choices {
        let Some(set) = state.choice_set() else {
            state.focus = Focus::Input;
            return true;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Tab => {
                state.focus = Focus::Input;
            }
            KeyCode::Up => {
                if state.choice_selected > 0 {
                    state.choice_selected -= 1;
                }
            }
            KeyCode::Down => {
                if state.choice_selected + 1 < set.labels.len() {
                    state.choice_selected += 1;
                }
            }
            KeyCode::Enter => {
                let Some(label) = set.labels.get(state.choice_selected).cloned() else {
                    return true;
                };
                state.focus = Focus::Input;
                match set.kind {
                    ChoiceKind::Recommendations => {
                        let (req, token) = state.controller.prepare_detail(&label);
                        spawn_detail(gateway.clone(), req, label, token, ui_tx);
                    }
                    ChoiceKind::Fields => match state.controller.prepare_field(&label) {
                        FieldAction::Navigate(url) => {
                            if let Err(e) = open_external(&url) {
                                state.notice = Some(format!("couldn't open listing: {e}"));
                            }
                        }
                        FieldAction::Handled => {}
                        FieldAction::Dispatch(req, token) => {
                            spawn_summary(gateway.clone(), req, token, ui_tx);
                        }
                    },
                }
                state.scroll = 0;
            }
            _ => {}
        }
        return true;
    }

    // ── Input focus ───────────────────────────────────────────────────────────
    match (key.code, key.modifiers) {
        (KeyCode::Char('t'), KeyModifiers::CONTROL) => {
            let mode = state.controller.toggle_mode();
            state.notice = Some(format!("mode: {}", mode.label()));
            state.choice_selected = 0;
        }
        (KeyCode::Char('x'), KeyModifiers::CONTROL) => {
            state.controller.clear_staged();
            state.notice = Some("attachment cleared".to_string());
        }
        (KeyCode::Tab, _) => {
            if state.choice_set().is_some() {
                state.focus = Focus::Choices;
            }
        }
        (KeyCode::Enter, _) => {
            let text = std::mem::take(&mut state.input);
            state.cursor = 0;
            match state.controller.prepare_send(&text) {
                SendAction::Rejected => {}
                SendAction::Dispatch(req, token) => {
                    spawn_turn(gateway.clone(), req, token, ui_tx);
                }
            }
            state.scroll = 0;
        }
        (KeyCode::Char('@'), _) => {
            let at = state.cursor;
            state.input.insert(at, '@');
            state.cursor = at + 1;
            state.file_picker = Some(FilePickerState {
                all_pdfs: gather_pdfs(),
                query: String::new(),
                selected: 0,
                at_offset: at,
            });
            state.focus = Focus::FilePicker;
        }
        (KeyCode::Char(c), mods) if !mods.contains(KeyModifiers::CONTROL) => {
            state.input.insert(state.cursor, c);
            state.cursor += c.len_utf8();
        }
        (KeyCode::Backspace, _) => {
            if state.cursor > 0 {
                let prev = floor_char_boundary(&state.input, state.cursor - 1);
                state.input.remove(prev);
                state.cursor = prev;
            }
        }
        (KeyCode::Left, _) => {
            if state.cursor > 0 {
                state.cursor = floor_char_boundary(&state.input, state.cursor - 1);
            }
        }
        (KeyCode::Right, _) => {
            if state.cursor < state.input.len() {
                let mut next = state.cursor + 1;
                while next < state.input.len() && !state.input.is_char_boundary(next) {
                    next += 1;
                }
                state.cursor = next;
            }
        }
        (KeyCode::PageUp, _) => {
            state.scroll = state.scroll.saturating_add(10);
        }
        (KeyCode::PageDown, _) => {
            state.scroll = state.scroll.saturating_sub(10);
        }
        _ => {}
    }
    true
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

// ── Gateway task spawners ─────────────────────────────────────────────────────

fn spawn_turn(
    gateway: Arc<HttpGateway>,
    req: TurnRequest,
    token: CallToken,
    tx: mpsc::UnboundedSender<UiEvent>,
) {
    tokio::spawn(async move {
        let outcome = gateway.submit_turn(req).await.map_err(|e| e.to_string());
        let _ = tx.send(UiEvent::TurnDone { token, outcome });
    });
}

fn spawn_detail(
    gateway: Arc<HttpGateway>,
    req: DetailRequest,
    title: String,
    token: CallToken,
    tx: mpsc::UnboundedSender<UiEvent>,
) {
    tokio::spawn(async move {
        let outcome = gateway.fetch_detail(&req).await.map_err(|e| e.to_string());
        let _ = tx.send(UiEvent::DetailDone { token, title, outcome });
    });
}

fn spawn_summary(
    gateway: Arc<HttpGateway>,
    req: ParaphraseRequest,
    token: CallToken,
    tx: mpsc::UnboundedSender<UiEvent>,
) {
    tokio::spawn(async move {
        let outcome = gateway.paraphrase(&req).await.map_err(|e| e.to_string());
        let _ = tx.send(UiEvent::SummaryDone { token, outcome });
    });
}

// ── External navigation ───────────────────────────────────────────────────────

/// Hand a listing URL to the platform opener. The transcript is untouched.
fn open_external(url: &str) -> Result<()> {
    let mut cmd = match std::env::consts::OS {
        "macos" => {
            let mut c = std::process::Command::new("open");
            c.arg(url);
            c
        }
        "windows" => {
            let mut c = std::process::Command::new("cmd");
            c.args(["/C", "start", "", url]);
            c
        }
        _ => {
            let mut c = std::process::Command::new("xdg-open");
            c.arg(url);
            c
        }
    };
    cmd.stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolvedConfig;
    use crate::controller::SendAction;
    use crate::detail::{Mode, Recommendation};
    use crate::gateway::TurnReply;

    fn test_state(mode: Mode) -> AppState {
        let resolved = ResolvedConfig {
            endpoint: "http://127.0.0.1:5000".into(),
            timeout_secs: 5,
            mode,
            profile_name: "test".into(),
        };
        AppState::new(&resolved, false)
    }

    fn apply_recs(state: &mut AppState, titles: &[&str]) {
        let SendAction::Dispatch(_, token) = state.controller.prepare_send("hi") else {
            panic!("expected dispatch");
        };
        state.apply_event(UiEvent::TurnDone {
            token,
            outcome: Ok(TurnReply {
                status: "success".into(),
                response: "matches".into(),
                recommendations: titles
                    .iter()
                    .map(|t| Recommendation { title: (*t).to_string() })
                    .collect(),
            }),
        });
    }

    #[test]
    fn test_choice_set_prefers_recommendations() {
        let mut state = test_state(Mode::Career);
        assert!(state.choice_set().is_none());

        apply_recs(&mut state, &["Engineer A", "Engineer B"]);
        let set = state.choice_set().unwrap();
        assert_eq!(set.kind, ChoiceKind::Recommendations);
        assert_eq!(set.labels, vec!["Engineer A", "Engineer B"]);
    }

    #[test]
    fn test_choice_cursor_clamped_after_event() {
        let mut state = test_state(Mode::Career);
        apply_recs(&mut state, &["A", "B", "C"]);
        state.focus = Focus::Choices;
        state.choice_selected = 2;

        apply_recs(&mut state, &["only one"]);
        assert_eq!(state.choice_selected, 0);
        assert_eq!(state.focus, Focus::Choices);
    }

    #[test]
    fn test_focus_drops_to_input_when_choices_vanish() {
        let mut state = test_state(Mode::Career);
        apply_recs(&mut state, &["A"]);
        state.focus = Focus::Choices;

        // A mode toggle clears recommendations; the next event re-clamps
        state.controller.toggle_mode();
        apply_recs(&mut state, &[]);
        assert!(state.choice_set().is_none());
        assert_eq!(state.focus, Focus::Input);
    }

    #[test]
    fn test_picker_mid_line_keeps_trailing_text_and_cursor() {
        let mut state = test_state(Mode::Career);
        let gateway = Arc::new(
            HttpGateway::new("http://127.0.0.1:5000".into(), 5).unwrap(),
        );
        let (tx, _rx) = mpsc::unbounded_channel();
        let press = |code, state: &mut AppState, tx: &mpsc::UnboundedSender<UiEvent>| {
            handle_key(
                KeyEvent::new(code, KeyModifiers::NONE),
                state,
                &gateway,
                tx.clone(),
            )
        };

        state.input = "hello world".to_string();
        state.cursor = 5; // between "hello" and " world"

        press(KeyCode::Char('@'), &mut state, &tx);
        assert_eq!(state.focus, Focus::FilePicker);
        assert_eq!(state.input, "hello@ world");
        assert_eq!(state.cursor, 6);

        press(KeyCode::Char('c'), &mut state, &tx);
        press(KeyCode::Char('v'), &mut state, &tx);
        assert_eq!(state.input, "hello@cv world");

        // Cancelling removes only the `@` and the query
        press(KeyCode::Esc, &mut state, &tx);
        assert_eq!(state.focus, Focus::Input);
        assert_eq!(state.input, "hello world");
        assert_eq!(state.cursor, 5);
        assert!(state.file_picker.is_none());
    }

    #[test]
    fn test_picker_backspace_past_marker_restores_input() {
        let mut state = test_state(Mode::Skill);
        let gateway = Arc::new(
            HttpGateway::new("http://127.0.0.1:5000".into(), 5).unwrap(),
        );
        let (tx, _rx) = mpsc::unbounded_channel();

        state.input = "ab".to_string();
        state.cursor = 1;
        handle_key(
            KeyEvent::new(KeyCode::Char('@'), KeyModifiers::NONE),
            &mut state,
            &gateway,
            tx.clone(),
        );
        assert_eq!(state.input, "a@b");

        handle_key(
            KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE),
            &mut state,
            &gateway,
            tx,
        );
        assert_eq!(state.focus, Focus::Input);
        assert_eq!(state.input, "ab");
        assert_eq!(state.cursor, 1);
    }

    #[test]
    fn test_picker_filter_is_case_insensitive() {
        let fp = FilePickerState {
            all_pdfs: vec!["docs/Resume.pdf".into(), "old/cv.pdf".into()],
            query: "resume".into(),
            selected: 0,
            at_offset: 0,
        };
        let filtered = fp.filtered();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0], "docs/Resume.pdf");
    }
}
