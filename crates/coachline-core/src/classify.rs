//! Maps raw backend error details to actionable, user-facing messages.
//!
//! Rules are evaluated top to bottom and the first rule with a matching
//! trigger wins, so a detail mentioning both `quota` and `429` is reported as
//! quota exhaustion. Matching is case-sensitive.

use crate::error::{ClientError, ErrorKind};

pub const QUOTA_MESSAGE: &str = "OpenAI API quota exceeded. Please check your OpenAI account billing and usage limits. You may need to add payment information or upgrade your plan.";

pub const MISSING_KEY_MESSAGE: &str = "The backend is missing its OpenAI API key. Set OPENAI_API_KEY in the backend environment and restart the server.";

pub const INVALID_KEY_MESSAGE: &str =
    "Invalid OpenAI API key. Please check the API key configured on the backend.";

pub const RATE_LIMIT_MESSAGE: &str =
    "OpenAI API rate limit exceeded. Please wait a moment and try again.";

struct Rule {
    kind: ErrorKind,
    triggers: &'static [&'static str],
    message: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        kind: ErrorKind::QuotaExceeded,
        triggers: &["insufficient_quota", "quota"],
        message: QUOTA_MESSAGE,
    },
    Rule {
        kind: ErrorKind::Configuration,
        triggers: &["OPENAI_API_KEY", "api key"],
        message: MISSING_KEY_MESSAGE,
    },
    Rule {
        kind: ErrorKind::Authentication,
        triggers: &["401", "unauthorized", "Invalid API key"],
        message: INVALID_KEY_MESSAGE,
    },
    Rule {
        kind: ErrorKind::RateLimited,
        triggers: &["429", "rate limit"],
        message: RATE_LIMIT_MESSAGE,
    },
];

/// Result of running a detail string through the rule table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<Classification> for ClientError {
    fn from(c: Classification) -> Self {
        ClientError::new(c.kind, c.message)
    }
}

/// Classify `detail`, keeping the matched kind alongside the message.
/// Unmatched details come back verbatim as [`ErrorKind::Backend`].
pub fn classify_detail(detail: &str) -> Classification {
    RULES
        .iter()
        .find(|rule| rule.triggers.iter().any(|t| detail.contains(*t)))
        .map(|rule| Classification {
            kind: rule.kind,
            message: rule.message.to_string(),
        })
        .unwrap_or_else(|| Classification {
            kind: ErrorKind::Backend,
            message: detail.to_string(),
        })
}

pub fn classify(detail: &str) -> String {
    classify_detail(detail).message
}
