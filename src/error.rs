use thiserror::Error;

/// Errors raised while building, scheduling or streaming a conversion.
///
/// Everything up to and including scheduling fails before the first chunk is
/// produced. [`ConvertError::RowFormat`] and [`ConvertError::Read`] surface
/// from the middle of the stream, after which the [`Script`](crate::Script)
/// yields nothing more.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid/unsupported file: {0}")]
    UnsupportedInput(String),

    #[error("{task} depends on {dependency}")]
    MissingDependency { task: String, dependency: String },

    #[error("task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("cycle detected in task graph at '{0}'")]
    CycleDetected(String),

    #[error("{task}, row {row}:\n{source}")]
    RowFormat {
        task: String,
        row: u64,
        source: anyhow::Error,
    },

    #[error("Couldn't read rows of {task}.\n{source}")]
    Read {
        task: String,
        #[source]
        source: ReadError,
    },

    #[error("invalid schema name: {0:?}")]
    InvalidSchema(String),
}

impl ConvertError {
    /// The task or input the error is about, if any.
    pub fn task(&self) -> Option<&str> {
        match self {
            ConvertError::UnsupportedInput(name) | ConvertError::CycleDetected(name) => Some(name),
            ConvertError::MissingDependency { task, .. }
            | ConvertError::UnknownDependency { task, .. }
            | ConvertError::RowFormat { task, .. }
            | ConvertError::Read { task, .. } => Some(task),
            ConvertError::InvalidSchema(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Couldn't load data from file.\n{0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't parse CSV.\n{0}")]
    Csv(#[from] csv::Error),
}
