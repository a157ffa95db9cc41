/// Ephemeral cross-turn context: active mode, the most recently fetched
/// detail record, the currently offered recommendation set, and the in-flight
/// call bookkeeping that backs the busy indicator.
///
/// Every dispatched gateway call carries a `CallToken`; the epoch half is
/// bumped whenever mode context is invalidated (mode toggle), so completion
/// handlers can discard results that arrive for a world that no longer
/// exists. The pending counter — not a bool — keeps the busy flag honest
/// when calls overlap.
use crate::detail::{DetailRecord, Mode, Recommendation};

// ── Call token ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallToken {
    pub epoch: u64,
    pub seq: u64,
}

// ── Active detail ─────────────────────────────────────────────────────────────

/// The most recently fetched detail record plus the title it was fetched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDetail {
    pub title: String,
    pub record: DetailRecord,
}

// ── Session ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct InteractionSession {
    mode: Mode,
    active_detail: Option<ActiveDetail>,
    recommendations: Vec<Recommendation>,
    pending_calls: u32,
    epoch: u64,
    next_seq: u64,
}

impl InteractionSession {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            active_detail: None,
            recommendations: Vec::new(),
            pending_calls: 0,
            epoch: 0,
            next_seq: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True while any gateway call is outstanding — drives the typing
    /// indicator. Cleared by every completion path, including staleness.
    pub fn is_waiting(&self) -> bool {
        self.pending_calls > 0
    }

    /// Register a dispatched gateway call and hand back its token.
    pub fn begin_call(&mut self) -> CallToken {
        self.pending_calls += 1;
        self.next_seq += 1;
        CallToken { epoch: self.epoch, seq: self.next_seq }
    }

    /// Settle a completed call. Returns false for stale tokens (their epoch
    /// was invalidated while they were in flight); the caller must then drop
    /// the result without touching transcript or session.
    pub fn settle_call(&mut self, token: CallToken) -> bool {
        if token.epoch != self.epoch {
            return false;
        }
        self.pending_calls = self.pending_calls.saturating_sub(1);
        true
    }

    /// Flip the mode. Pure session mutation: the transcript is untouched, but
    /// cross-mode recommendation/detail context is never valid so both are
    /// cleared, and outstanding calls are orphaned via the epoch bump.
    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        self.active_detail = None;
        self.recommendations.clear();
        self.epoch += 1;
        self.pending_calls = 0;
        self.mode
    }

    pub fn set_active_detail(&mut self, title: String, record: DetailRecord) {
        self.active_detail = Some(ActiveDetail { title, record });
    }

    pub fn active_detail(&self) -> Option<&ActiveDetail> {
        self.active_detail.as_ref()
    }

    /// Replace the offered set. An empty list is a valid state meaning "no
    /// further drill-down offered".
    pub fn set_recommendations(&mut self, list: Vec<Recommendation>) {
        self.recommendations = list;
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn clear_recommendations(&mut self) {
        self.recommendations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::CareerDetail;

    fn some_record() -> DetailRecord {
        DetailRecord::Career(serde_json::from_value::<CareerDetail>(serde_json::json!({})).unwrap())
    }

    #[test]
    fn test_toggle_twice_restores_mode_and_clears_context() {
        let mut s = InteractionSession::new(Mode::Career);
        s.set_active_detail("Engineer A".into(), some_record());
        s.set_recommendations(vec![Recommendation { title: "Engineer A".into() }]);

        assert_eq!(s.toggle_mode(), Mode::Skill);
        assert!(s.active_detail().is_none());
        assert!(s.recommendations().is_empty());

        s.set_recommendations(vec![Recommendation { title: "Course B".into() }]);
        assert_eq!(s.toggle_mode(), Mode::Career);
        assert!(s.recommendations().is_empty());
    }

    #[test]
    fn test_pending_counter_balances() {
        let mut s = InteractionSession::new(Mode::Career);
        let a = s.begin_call();
        let b = s.begin_call();
        assert!(s.is_waiting());
        assert!(s.settle_call(a));
        assert!(s.is_waiting());
        assert!(s.settle_call(b));
        assert!(!s.is_waiting());
    }

    #[test]
    fn test_stale_token_discarded_after_toggle() {
        let mut s = InteractionSession::new(Mode::Career);
        let token = s.begin_call();
        s.toggle_mode();
        assert!(!s.is_waiting());
        assert!(!s.settle_call(token));
        // A fresh call after the toggle settles normally
        let fresh = s.begin_call();
        assert!(s.settle_call(fresh));
    }
}
