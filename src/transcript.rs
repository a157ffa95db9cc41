/// Append-only conversation transcript — the single source of truth for what
/// is rendered. Entries are never mutated, reordered, or removed; clearing
/// only ever happens by starting a new session.
use chrono::{DateTime, Utc};

use crate::detail::Recommendation;
use crate::richtext::FormattedText;

// ── Entry types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

/// Interactive payload carried by an Assistant entry: either the
/// recommendation list offered by a turn, or the field options offered after
/// a detail fetch. User entries never carry attachments — the constructors
/// below are the only way to build entries, and only the assistant ones
/// accept an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Recommendations(Vec<Recommendation>),
    Options(&'static [&'static str]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub author: Author,
    pub body: FormattedText,
    pub attachment: Option<Attachment>,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn user(text: &str) -> Self {
        Self {
            author: Author::User,
            body: FormattedText::literal(text),
            attachment: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(body: FormattedText) -> Self {
        Self {
            author: Author::Assistant,
            body,
            attachment: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant_with(body: FormattedText, attachment: Attachment) -> Self {
        Self {
            author: Author::Assistant,
            body,
            attachment: Some(attachment),
            timestamp: Utc::now(),
        }
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Full ordered sequence for rendering. Insertion order is display order.
    pub fn snapshot(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut t = Transcript::default();
        t.append(TranscriptEntry::user("first"));
        t.append(TranscriptEntry::assistant(FormattedText::literal("second")));
        let snap = t.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].author, Author::User);
        assert_eq!(snap[0].body.as_plain(), "first");
        assert_eq!(snap[1].author, Author::Assistant);
    }

    #[test]
    fn test_attachment_only_on_assistant() {
        let entry = TranscriptEntry::assistant_with(
            FormattedText::literal("offer"),
            Attachment::Recommendations(vec![Recommendation { title: "Engineer A".into() }]),
        );
        assert_eq!(entry.author, Author::Assistant);
        assert!(entry.attachment.is_some());
        assert!(TranscriptEntry::user("hi").attachment.is_none());
    }
}
