use crate::diagnostics::Diagnostic;

/// Errors that can occur while interpreting a program.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// A loop-exit arrived with no loop-enter left open.
    #[error("{0}")]
    UnbalancedLoop(Diagnostic),

    /// A loop whose body holds no op-codes. Reported by pre-flight validation only.
    #[error("{0}")]
    EmptyLoopBody(Diagnostic),

    /// The program ended with a loop-enter still open.
    #[error("{0}")]
    UnclosedLoop(Diagnostic),

    /// Reading the program or the `,` input failed for a reason other than exhaustion.
    #[error("I/O error at instruction {position}: {source}")]
    InputReadFailure {
        position: usize,
        #[source]
        source: std::io::Error,
    },

    /// The output sink rejected a record.
    #[error("failed to write output at instruction {position}: {source}")]
    OutputWriteFailure {
        position: usize,
        #[source]
        source: std::io::Error,
    },
}

impl InterpreterError {
    /// Positional context, for the variants that carry one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            InterpreterError::UnbalancedLoop(d)
            | InterpreterError::EmptyLoopBody(d)
            | InterpreterError::UnclosedLoop(d) => Some(d),
            InterpreterError::InputReadFailure { .. }
            | InterpreterError::OutputWriteFailure { .. } => None,
        }
    }

    /// Program cursor at the point of failure.
    pub fn position(&self) -> usize {
        match self {
            InterpreterError::UnbalancedLoop(d)
            | InterpreterError::EmptyLoopBody(d)
            | InterpreterError::UnclosedLoop(d) => d.position,
            InterpreterError::InputReadFailure { position, .. }
            | InterpreterError::OutputWriteFailure { position, .. } => *position,
        }
    }
}
