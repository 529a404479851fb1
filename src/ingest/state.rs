/// Run state definitions for the pipeline driver
use std::fmt;

/// Where a pipeline run currently is
///
/// `Init -> FetchingBatch -> WritingBatch -> Pacing -> (FetchingBatch | Done | Aborted)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    // ===== Active States =====
    /// Resolving the checkpoint
    Init,

    /// Fetching the entities of the current batch
    FetchingBatch,

    /// Committing the current batch
    WritingBatch,

    /// Waiting out the inter-batch delay
    Pacing,

    // ===== Terminal States =====
    /// Every pending entity was committed
    Done,

    /// The run stopped on an error or cancellation
    Aborted,
}

impl RunState {
    /// Returns true if the run cannot leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::FetchingBatch => "fetching_batch",
            Self::WritingBatch => "writing_batch",
            Self::Pacing => "pacing",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
