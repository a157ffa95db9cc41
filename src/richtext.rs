/// Safe structured representation of backend-authored text.
///
/// The backend's response strings are untrusted. Rather than handing raw
/// markup to the renderer, we parse it once into a small segment AST and the
/// renderer draws segments literally — nothing downstream interprets markup.
/// Recognized: `**bold**` spans and line breaks. Everything else is literal,
/// including unterminated `**` markers.

// ── Segment AST ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Bold(String),
    Break,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedText {
    pub segments: Vec<Segment>,
}

impl FormattedText {
    /// Parse backend text: `**…**` becomes Bold, newlines become Break.
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        for (i, line) in raw.split('\n').enumerate() {
            if i > 0 {
                segments.push(Segment::Break);
            }
            parse_line(line.trim_end_matches('\r'), &mut segments);
        }
        Self { segments }
    }

    /// Wrap text verbatim — no markup recognition, only line breaks.
    /// Used for user-typed messages and our own fixed strings.
    pub fn literal(raw: &str) -> Self {
        let mut segments = Vec::new();
        for (i, line) in raw.split('\n').enumerate() {
            if i > 0 {
                segments.push(Segment::Break);
            }
            if !line.is_empty() {
                segments.push(Segment::Text(line.trim_end_matches('\r').to_string()));
            }
        }
        Self { segments }
    }

    /// Flatten to plain text (bold markers dropped, breaks become '\n').
    /// This is what goes over the wire as conversation history.
    pub fn as_plain(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Text(s) | Segment::Bold(s) => out.push_str(s),
                Segment::Break => out.push('\n'),
            }
        }
        out
    }

    pub fn is_blank(&self) -> bool {
        self.segments.iter().all(|seg| match seg {
            Segment::Text(s) | Segment::Bold(s) => s.trim().is_empty(),
            Segment::Break => true,
        })
    }
}

/// Scan a single line for `**` pairs. A marker without a closing partner is
/// kept as literal text rather than swallowing the rest of the line.
fn parse_line(line: &str, out: &mut Vec<Segment>) {
    let mut rest = line;
    loop {
        let Some(start) = rest.find("**") else {
            if !rest.is_empty() {
                out.push(Segment::Text(rest.to_string()));
            }
            return;
        };
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            // Unterminated marker — the whole remainder is literal
            if !rest.is_empty() {
                out.push(Segment::Text(rest.to_string()));
            }
            return;
        };
        if start > 0 {
            out.push(Segment::Text(rest[..start].to_string()));
        }
        let inner = &after[..end];
        if !inner.is_empty() {
            out.push(Segment::Bold(inner.to_string()));
        }
        rest = &after[end + 2..];
    }
}
