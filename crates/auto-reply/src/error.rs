use std::{error::Error as StdError, fmt};

/// Pipeline step that a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Persist,
    Embed,
    Retrieve,
    History,
    Generate,
    Deliver,
    StoreAnswer,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Persist => "persist",
            Self::Embed => "embed",
            Self::Retrieve => "retrieve",
            Self::History => "history",
            Self::Generate => "generate",
            Self::Deliver => "deliver",
            Self::StoreAnswer => "store-answer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("regenerated answer is empty after filtering")]
    EmptyRegeneratedAnswer,

    #[error("invalid guardrail pattern: {0}")]
    Guardrail(#[from] regex::Error),
}

impl Error {
    pub fn stage(stage: Stage, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Stage {
            stage,
            source: source.into(),
        }
    }

    /// The stage that failed, when the error came from a collaborator.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach the failing [`Stage`] to a collaborator result.
pub(crate) trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T, E> StageExt<T> for std::result::Result<T, E>
where
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| Error::stage(stage, e))
    }
}
