//! Acknowledgment tracking for inbound webhook calls.
//!
//! Every inbound request gets exactly one terminal response. The pipeline
//! never talks to the responder directly; it goes through [`AckTracker`],
//! which owns the "channel acknowledged" flag and makes a second attempt a
//! logged no-op.

use {serde::Serialize, tracing::warn};

/// The pipeline path that produced the acknowledgment.
///
/// The payload returned to the channel is the same fixed empty success
/// response on every path; the outcome only feeds logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckOutcome {
    /// Embedding produced no representation.
    NoEmbedding,
    /// Generation returned a blank or sentinel answer.
    EmptyAnswer,
    /// Answer persisted and delivered synchronously.
    Delivered,
    /// Answer handed to background regeneration.
    Deferred,
    /// A stage failed; the failure handler answered.
    Failed,
    /// The inbound call was malformed and never reached the pipeline.
    Rejected,
}

impl std::fmt::Display for AckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoEmbedding => "no_embedding",
            Self::EmptyAnswer => "empty_answer",
            Self::Delivered => "delivered",
            Self::Deferred => "deferred",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// The channel-side primitive that emits the terminal response.
pub trait AckResponder: Send {
    fn respond(&mut self, outcome: AckOutcome);
}

/// Per-request acknowledgment state with a single false→true transition.
pub struct AckTracker<R> {
    responder: R,
    acknowledged: Option<AckOutcome>,
}

impl<R: AckResponder> AckTracker<R> {
    pub fn new(responder: R) -> Self {
        Self {
            responder,
            acknowledged: None,
        }
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged.is_some()
    }

    /// Outcome of the acknowledgment already sent, if any.
    pub fn outcome(&self) -> Option<AckOutcome> {
        self.acknowledged
    }

    /// Send the acknowledgment unless one was already sent.
    ///
    /// Returns `true` when this call emitted the response.
    pub fn acknowledge(&mut self, outcome: AckOutcome) -> bool {
        if let Some(previous) = self.acknowledged {
            warn!(%previous, attempted = %outcome, "channel already acknowledged, ignoring");
            return false;
        }
        self.responder.respond(outcome);
        self.acknowledged = Some(outcome);
        true
    }

    pub fn into_inner(self) -> R {
        self.responder
    }
}

/// Responder that records the outcome so an HTTP handler can build its
/// response once the pipeline returns.
#[derive(Debug, Default)]
pub struct PendingAck {
    outcome: Option<AckOutcome>,
}

impl PendingAck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcome(&self) -> Option<AckOutcome> {
        self.outcome
    }
}

impl AckResponder for PendingAck {
    fn respond(&mut self, outcome: AckOutcome) {
        self.outcome = Some(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingResponder {
        sent: Vec<AckOutcome>,
    }

    impl AckResponder for CountingResponder {
        fn respond(&mut self, outcome: AckOutcome) {
            self.sent.push(outcome);
        }
    }

    #[test]
    fn first_acknowledgment_is_sent() {
        let mut tracker = AckTracker::new(CountingResponder::default());
        assert!(!tracker.is_acknowledged());
        assert!(tracker.acknowledge(AckOutcome::Delivered));
        assert!(tracker.is_acknowledged());
        assert_eq!(tracker.outcome(), Some(AckOutcome::Delivered));
        assert_eq!(tracker.into_inner().sent, vec![AckOutcome::Delivered]);
    }

    #[test]
    fn forced_double_acknowledgment_is_a_noop() {
        let mut tracker = AckTracker::new(CountingResponder::default());
        assert!(tracker.acknowledge(AckOutcome::Deferred));
        assert!(!tracker.acknowledge(AckOutcome::Failed));
        assert!(!tracker.acknowledge(AckOutcome::Deferred));
        assert_eq!(tracker.outcome(), Some(AckOutcome::Deferred));
        assert_eq!(tracker.into_inner().sent, vec![AckOutcome::Deferred]);
    }

    #[test]
    fn pending_ack_records_outcome() {
        let mut tracker = AckTracker::new(PendingAck::new());
        tracker.acknowledge(AckOutcome::NoEmbedding);
        assert_eq!(tracker.into_inner().outcome(), Some(AckOutcome::NoEmbedding));
    }

    #[test]
    fn outcome_display_is_snake_case() {
        assert_eq!(AckOutcome::EmptyAnswer.to_string(), "empty_answer");
        assert_eq!(AckOutcome::NoEmbedding.to_string(), "no_embedding");
    }
}
