use serde::Serialize;
use std::fmt;

/// Classification of a failed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    /// Empty or whitespace-only query
    InvalidInput,

    /// The scheme store could not be read
    RetrievalUnavailable,

    /// The generator failed or returned an error
    GenerationFailed,

    /// Anything else, including panics and an elapsed deadline
    UnexpectedFailure,
}

impl FailureKind {
    /// Message safe to show an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Query is required.",
            Self::RetrievalUnavailable => "A database error occurred. Please try again later.",
            Self::GenerationFailed => {
                "The answer service is unavailable right now. Please try again later."
            }
            Self::UnexpectedFailure => "An unexpected internal error occurred.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "InvalidInput",
            Self::RetrievalUnavailable => "RetrievalUnavailable",
            Self::GenerationFailed => "GenerationFailed",
            Self::UnexpectedFailure => "UnexpectedFailure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one call to the answer pipeline.
///
/// `message` on a failure is always [`FailureKind::user_message`].
/// Collaborator error text goes to `detail`, which is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum AnswerOutcome {
    Success {
        text: String,
    },
    Failure {
        kind: FailureKind,
        message: String,
        #[serde(skip_serializing)]
        detail: Option<String>,
    },
}

impl AnswerOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success { text: text.into() }
    }

    /// A failure carrying the user-facing message for `kind`.
    pub fn failure(kind: FailureKind, detail: Option<String>) -> Self {
        Self::Failure {
            kind,
            message: kind.user_message().to_string(),
            detail,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Answer text on success.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success { text } => Some(text),
            Self::Failure { .. } => None,
        }
    }

    /// Failure kind, if any.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Text to show the end user: the answer or the failure message.
    pub fn user_text(&self) -> &str {
        match self {
            Self::Success { text } => text,
            Self::Failure { message, .. } => message,
        }
    }

    /// Operator-facing diagnostic detail of a failure.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { detail, .. } => detail.as_deref(),
        }
    }
}
