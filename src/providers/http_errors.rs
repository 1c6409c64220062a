use std::error::Error as StdError;
use std::io::ErrorKind;

use crate::error::ChatError;

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == ErrorKind::ConnectionRefused
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("connection refused")
        {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == ErrorKind::TimedOut
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("timed out")
        {
            return true;
        }

        current = source.source();
    }

    false
}

/// Transport-level failures never carry the service's error body, so they
/// always land in the unclassified bucket.
pub(crate) fn completion_request_error(err: reqwest::Error, api_url: &str) -> ChatError {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return ChatError::unclassified(format!(
            "Request timed out while calling '{}'. Check network connectivity and retry.",
            api_url
        ));
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return ChatError::unclassified(format!(
                "Connection refused by completion API at '{}'. \
                 Check OPENAI_BASE_URL and that the endpoint is reachable.",
                api_url
            ));
        }

        return ChatError::unclassified(format!(
            "Failed to connect to completion API at '{}'. \
             Check OPENAI_BASE_URL and network connectivity.",
            api_url
        ));
    }

    ChatError::unclassified(format!(
        "Failed to call completion API at '{}': {}",
        api_url, err
    ))
}
