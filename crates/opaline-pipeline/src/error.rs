use opaline_engine::EngineError;
use thiserror::Error;

/// Errors surfaced by the anonymization pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An engine pass failed inside a named stage.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: EngineError,
    },

    /// The pre-generalization pass suppressed rows, which its configuration
    /// rules out. Indicates corrupted input or an internal defect.
    #[error("pre-generalization suppressed {removed} records; expected none")]
    GeneralizeSuppressed { removed: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
