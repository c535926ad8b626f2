/// Default threshold above which an answer is regenerated in the background.
pub const DEFAULT_MAX_ANSWER_CHARS: usize = 1000;

/// How a filtered answer reaches the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// Persist, send, then acknowledge.
    Immediate,
    /// Notify, acknowledge, regenerate a shorter answer in the background.
    Deferred,
}

impl DeliveryDecision {
    /// Length is counted in characters, not bytes.
    pub fn for_answer(filtered_answer: &str, max_chars: usize) -> Self {
        if filtered_answer.chars().count() > max_chars {
            Self::Deferred
        } else {
            Self::Immediate
        }
    }
}

/// Whether a generated answer should be treated as no answer at all.
///
/// The sentinel is compared exactly; blank means whitespace only.
pub fn is_empty_answer(answer: &str, sentinel: &str) -> bool {
    answer.trim().is_empty() || answer == sentinel
}
