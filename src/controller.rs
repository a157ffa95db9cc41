/// Interaction controller — the conversation state machine.
///
/// Sans-IO core: every user action maps to a `prepare_*` method that
/// validates against current session/staging state, performs the local
/// transcript mutations, and either short-circuits or hands back a gateway
/// request plus a `CallToken`. The async shell (TUI task or one-shot runner)
/// performs the network call and feeds the outcome to the matching `apply_*`
/// method with the token. Stale tokens — outlived by a mode toggle — are
/// dropped whole: no transcript entry, no session change.
///
/// Transcript ordering rule: the user's entry is appended before the turn
/// request is even built, so the user sees their message ahead of the round
/// trip resolving.
use std::path::Path;

use crate::detail::{self, Mode};
use crate::gateway::{
    DetailReply, DetailRequest, HistoryEntry, ParaphraseReply, ParaphraseRequest, TurnReply,
    TurnRequest,
};
use crate::richtext::FormattedText;
use crate::session::{CallToken, InteractionSession};
use crate::transcript::{Attachment, Author, Transcript, TranscriptEntry};
use crate::upload::{Rejection, UploadStaging};

// ── Fixed transcript strings ──────────────────────────────────────────────────

pub const EMPTY_INPUT_MSG: &str = "Please type a message or attach a resume first.";
pub const UPLOAD_PLACEHOLDER: &str = "Uploaded resume.";
pub const CONNECT_FAILED_MSG: &str = "Unable to connect to the server.";
pub const TURN_FAILED_MSG: &str = "Something went wrong on the server. Please try again.";
pub const RECOMMENDATION_PROMPT: &str = "Click a recommendation to learn more.";
pub const DETAIL_FAILED_MSG: &str = "Unable to fetch details right now. Please try again.";
pub const SUMMARY_FAILED_MSG: &str = "Sorry, I couldn't summarize that right now.";
pub const PDF_ONLY_MSG: &str = "Only PDF documents can be uploaded. Please choose a PDF file.";

fn unavailable_msg(label: &str) -> String {
    format!("No information available for {label}.")
}

fn detail_prompt(title: &str) -> FormattedText {
    FormattedText::parse(&format!(
        "Here's what I found about **{title}**. Pick an option below to learn more."
    ))
}

// ── Action results ────────────────────────────────────────────────────────────

/// What a send action resolved to. `Rejected` means the empty-input guard
/// fired and a local entry was already appended — nothing to dispatch.
#[derive(Debug)]
pub enum SendAction {
    Rejected,
    Dispatch(TurnRequest, CallToken),
}

/// What a field-option selection resolved to.
#[derive(Debug)]
pub enum FieldAction {
    /// "Go to Listing": open this URL externally. No entry, no gateway call.
    Navigate(String),
    /// Short-circuited locally (blank field, or no active detail); any
    /// transcript entry has already been appended.
    Handled,
    Dispatch(ParaphraseRequest, CallToken),
}

// ── Controller ────────────────────────────────────────────────────────────────

pub struct Controller {
    transcript: Transcript,
    session: InteractionSession,
    staging: UploadStaging,
}

impl Controller {
    pub fn new(mode: Mode) -> Self {
        Self {
            transcript: Transcript::default(),
            session: InteractionSession::new(mode),
            staging: UploadStaging::default(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn session(&self) -> &InteractionSession {
        &self.session
    }

    pub fn staged_filename(&self) -> Option<&str> {
        self.staging.peek().map(|f| f.filename.as_str())
    }

    // ── Upload staging ────────────────────────────────────────────────────────

    /// Stage a candidate resume. Rejections surface as an Assistant entry and
    /// leave staging empty; a successful stage appends nothing.
    pub fn stage_file(&mut self, path: &Path) {
        if let Err(rejection) = self.staging.stage(path) {
            let text = match rejection {
                Rejection::NotPdf => PDF_ONLY_MSG.to_string(),
                Rejection::Unreadable(e) => format!("Couldn't read that file: {e}"),
            };
            self.transcript
                .append(TranscriptEntry::assistant(FormattedText::literal(&text)));
        }
    }

    pub fn clear_staged(&mut self) {
        self.staging.clear();
    }

    // ── Mode ──────────────────────────────────────────────────────────────────

    /// Flip the advice mode. No network effect, transcript untouched; active
    /// detail and recommendations are cleared and in-flight results orphaned.
    pub fn toggle_mode(&mut self) -> Mode {
        self.session.toggle_mode()
    }

    // ── Send ──────────────────────────────────────────────────────────────────

    pub fn prepare_send(&mut self, input: &str) -> SendAction {
        let message = input.trim();
        if message.is_empty() && self.staging.peek().is_none() {
            self.transcript
                .append(TranscriptEntry::assistant(FormattedText::literal(EMPTY_INPUT_MSG)));
            return SendAction::Rejected;
        }

        // History is the transcript *before* this turn's user entry — the
        // backend receives the new message separately.
        let history = self.history_entries();
        let shown = if message.is_empty() { UPLOAD_PLACEHOLDER } else { message };
        self.transcript.append(TranscriptEntry::user(shown));

        let attachment = self.staging.take();
        let token = self.session.begin_call();
        SendAction::Dispatch(
            TurnRequest {
                message: message.to_string(),
                mode: self.session.mode(),
                history,
                attachment,
            },
            token,
        )
    }

    pub fn apply_turn(&mut self, token: CallToken, outcome: Result<TurnReply, String>) {
        if !self.session.settle_call(token) {
            return;
        }
        match outcome {
            Err(_) => {
                self.transcript
                    .append(TranscriptEntry::assistant(FormattedText::literal(CONNECT_FAILED_MSG)));
            }
            Ok(reply) if reply.is_success() => {
                self.transcript
                    .append(TranscriptEntry::assistant(FormattedText::parse(&reply.response)));
                self.session.set_recommendations(reply.recommendations.clone());
                if !reply.recommendations.is_empty() {
                    self.transcript.append(TranscriptEntry::assistant_with(
                        FormattedText::literal(RECOMMENDATION_PROMPT),
                        Attachment::Recommendations(reply.recommendations),
                    ));
                }
            }
            Ok(reply) => {
                // Backend-declared failure: show its explanation when it sent
                // one, otherwise the fixed message. Recommendations are never
                // applied from a failed reply.
                let text = if reply.response.trim().is_empty() {
                    TURN_FAILED_MSG.to_string()
                } else {
                    reply.response
                };
                self.transcript
                    .append(TranscriptEntry::assistant(FormattedText::parse(&text)));
            }
        }
    }

    fn history_entries(&self) -> Vec<HistoryEntry> {
        self.transcript
            .snapshot()
            .iter()
            .map(|e| HistoryEntry {
                sender: match e.author {
                    Author::User => "You",
                    Author::Assistant => "Bot",
                }
                .to_string(),
                text: e.body.as_plain(),
            })
            .collect()
    }

    // ── Detail drill-down ─────────────────────────────────────────────────────

    pub fn prepare_detail(&mut self, title: &str) -> (DetailRequest, CallToken) {
        let token = self.session.begin_call();
        (
            DetailRequest { title: title.to_string(), mode: self.session.mode() },
            token,
        )
    }

    pub fn apply_detail(
        &mut self,
        token: CallToken,
        title: &str,
        outcome: Result<DetailReply, String>,
    ) {
        if !self.session.settle_call(token) {
            return;
        }
        match outcome {
            Ok(reply) => {
                let options = reply.record.mode().field_options();
                self.session.set_active_detail(title.to_string(), reply.record);
                self.session.clear_recommendations();
                self.transcript.append(TranscriptEntry::assistant_with(
                    detail_prompt(title),
                    Attachment::Options(options),
                ));
            }
            Err(_) => {
                // Session detail/recommendation state stays put so the user
                // can retry the same selection.
                self.transcript
                    .append(TranscriptEntry::assistant(FormattedText::literal(DETAIL_FAILED_MSG)));
            }
        }
    }

    // ── Field options ─────────────────────────────────────────────────────────

    pub fn prepare_field(&mut self, label: &str) -> FieldAction {
        let Some(active) = self.session.active_detail() else {
            self.transcript.append(TranscriptEntry::assistant(FormattedText::literal(
                &unavailable_msg(label),
            )));
            return FieldAction::Handled;
        };

        if label == detail::GO_TO_LISTING {
            return FieldAction::Navigate(active.record.link().to_string());
        }

        match active.record.field_value(label) {
            Some(value) if !detail::is_blank(value) => {
                let request = ParaphraseRequest { text: format!("{label}: {value}") };
                let token = self.session.begin_call();
                FieldAction::Dispatch(request, token)
            }
            _ => {
                self.transcript.append(TranscriptEntry::assistant(FormattedText::literal(
                    &unavailable_msg(label),
                )));
                FieldAction::Handled
            }
        }
    }

    pub fn apply_summary(&mut self, token: CallToken, outcome: Result<ParaphraseReply, String>) {
        if !self.session.settle_call(token) {
            return;
        }
        match outcome {
            Ok(reply) if reply.is_success() && !reply.text.trim().is_empty() => {
                self.transcript
                    .append(TranscriptEntry::assistant(FormattedText::parse(&reply.text)));
            }
            _ => {
                self.transcript
                    .append(TranscriptEntry::assistant(FormattedText::literal(SUMMARY_FAILED_MSG)));
            }
        }
    }
}
