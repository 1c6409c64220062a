use std::error::Error;
use std::fmt;

const QUOTA_CODE: &str = "insufficient_quota";
const INVALID_CREDENTIAL_CODE: &str = "invalid_api_key";
const INVALID_CREDENTIAL_MARKERS: [&str; 2] = ["invalid_api_key", "Incorrect API key"];

/// Failure of a single completion request, tagged by how the loop should
/// report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The service refused the request because of usage or billing limits.
    QuotaExceeded { message: String },
    /// Any other structured error returned by the service.
    RemoteService {
        status: Option<u16>,
        message: String,
        invalid_credential: bool,
    },
    /// Transport failures and responses without the service's error shape.
    Unclassified { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    QuotaExceeded,
    RemoteService { invalid_credential: bool },
    Unclassified,
}

impl ChatErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuotaExceeded => "quota_exceeded",
            Self::RemoteService {
                invalid_credential: true,
            } => "invalid_credential",
            Self::RemoteService { .. } => "remote_service",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Structured error body fields reported by the service, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteErrorDetails {
    pub message: String,
    pub error_type: Option<String>,
    pub code: Option<String>,
}

impl ChatError {
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ChatErrorKind {
        match self {
            Self::QuotaExceeded { .. } => ChatErrorKind::QuotaExceeded,
            Self::RemoteService {
                invalid_credential, ..
            } => ChatErrorKind::RemoteService {
                invalid_credential: *invalid_credential,
            },
            Self::Unclassified { .. } => ChatErrorKind::Unclassified,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteService { status, .. } => *status,
            Self::QuotaExceeded { .. } | Self::Unclassified { .. } => None,
        }
    }

    /// Classifies an error reported by the service. Checks run in order:
    /// quota first, then everything else is a remote-service error.
    pub fn from_remote(status: Option<u16>, details: RemoteErrorDetails) -> Self {
        let message = render_remote_message(status, &details);

        if status == Some(429) || is_quota_code(&details) {
            return Self::QuotaExceeded { message };
        }

        let invalid_credential = details.code.as_deref() == Some(INVALID_CREDENTIAL_CODE)
            || INVALID_CREDENTIAL_MARKERS
                .iter()
                .any(|marker| message.contains(marker));

        Self::RemoteService {
            status,
            message,
            invalid_credential,
        }
    }
}

fn is_quota_code(details: &RemoteErrorDetails) -> bool {
    details.code.as_deref() == Some(QUOTA_CODE) || details.error_type.as_deref() == Some(QUOTA_CODE)
}

fn render_remote_message(status: Option<u16>, details: &RemoteErrorDetails) -> String {
    let mut message = match status {
        Some(status) => format!("Error code: {status} - {}", details.message),
        None => details.message.clone(),
    };
    if let Some(code) = &details.code {
        message.push_str(&format!(" (code: {code})"));
    }
    message
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotaExceeded { message }
            | Self::RemoteService { message, .. }
            | Self::Unclassified { message } => f.write_str(message),
        }
    }
}

impl Error for ChatError {}
