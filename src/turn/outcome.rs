//! Result enums returned by the turn controllers.
//!
//! Controllers never panic and rarely return `Err`; instead every entry
//! point reports which path the turn took, so both the shell and the tests
//! can branch on it without inspecting the store.

// ---------------------------------------------------------------------------
// TurnOutcome
// ---------------------------------------------------------------------------

/// How one learner turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Nothing happened: blank input, no active session, another turn in
    /// flight, or the response arrived for a session that has since been
    /// replaced.  No network call is made for pre-send refusals.
    Ignored,
    /// The turn reconciled into the transcript; the session continues.
    Settled,
    /// The turn reconciled and completed the session — summary recorded,
    /// results handoff scheduled.
    Completed,
    /// The backend failed; an apology entry keeps the transcript coherent.
    Failed,
    /// Quota or entitlement rejection; the learner was routed to the
    /// subscribe surface.
    Upsell,
}

// ---------------------------------------------------------------------------
// StartOutcome
// ---------------------------------------------------------------------------

/// How a session-creation attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The store now holds the fresh session.
    Started,
    /// Refused locally (a turn was in flight); no request was sent.
    Ignored,
    /// The backend refused with a quota or entitlement error; the learner
    /// was routed to the subscribe surface and no session exists.
    Upsell,
    /// Any other backend failure; the store is untouched.
    Failed,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_are_comparable() {
        assert_eq!(TurnOutcome::Settled, TurnOutcome::Settled);
        assert_ne!(TurnOutcome::Settled, TurnOutcome::Completed);
        assert_ne!(StartOutcome::Started, StartOutcome::Failed);
    }
}
