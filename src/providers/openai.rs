use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::credential::Credential;
use crate::error::{ChatError, RemoteErrorDetails};
use crate::model::Message;
use crate::providers::http_errors::completion_request_error;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    // Usually the object form; some compatible servers send a bare string.
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    // Usually a string like "invalid_api_key"; some compatible servers send numbers.
    #[serde(default)]
    code: Option<Value>,
}

impl ApiErrorBody {
    fn into_details(self) -> RemoteErrorDetails {
        let code = match self.code {
            Some(Value::String(code)) => Some(code),
            Some(Value::Number(code)) => Some(code.to_string()),
            _ => None,
        };
        RemoteErrorDetails {
            message: self.message.unwrap_or_default(),
            error_type: self.error_type,
            code,
        }
    }
}

fn details_from_error_value(error: Value) -> RemoteErrorDetails {
    match error {
        Value::String(message) => RemoteErrorDetails {
            message,
            ..RemoteErrorDetails::default()
        },
        Value::Object(_) => match serde_json::from_value::<ApiErrorBody>(error.clone()) {
            Ok(body) => body.into_details(),
            Err(_) => RemoteErrorDetails {
                message: error.to_string(),
                ..RemoteErrorDetails::default()
            },
        },
        other => RemoteErrorDetails {
            message: other.to_string(),
            ..RemoteErrorDetails::default()
        },
    }
}

fn chat_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn to_openai_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
    messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        })
        .collect()
}

fn bearer_header(credential: &Credential) -> Result<HeaderValue, ChatError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
        .map_err(|_| ChatError::unclassified("API key contains characters not allowed in a header"))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Classifies a non-success response. Bodies without the service's error
/// envelope still count as remote errors since the service answered.
fn error_from_status(status: u16, body: &str) -> ChatError {
    let details = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.into_details(),
        Err(_) => RemoteErrorDetails {
            message: body.trim().to_string(),
            ..RemoteErrorDetails::default()
        },
    };
    ChatError::from_remote(Some(status), details)
}

fn reply_from_body(body: &[u8]) -> Result<Message, ChatError> {
    let parsed: ChatCompletionResponse = serde_json::from_slice(body).map_err(|err| {
        ChatError::unclassified(format!("Failed to parse chat completion response: {err}"))
    })?;

    if let Some(error) = parsed.error {
        return Err(ChatError::from_remote(None, details_from_error_value(error)));
    }

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::unclassified("Chat completion response contained no choices"))?;
    Ok(Message::assistant(choice.message.content.unwrap_or_default()))
}

pub async fn chat(
    client: &Client,
    cfg: &Config,
    credential: &Credential,
    messages: &[Message],
) -> Result<Message, ChatError> {
    let api_url = chat_url(&cfg.api_base_url);
    let body = ChatCompletionRequest {
        model: &cfg.model,
        messages: to_openai_messages(messages),
    };
    debug!(
        api_url = %api_url,
        model = %cfg.model,
        message_count = messages.len(),
        "sending chat completion request"
    );

    let response = client
        .post(&api_url)
        .header(AUTHORIZATION, bearer_header(credential)?)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %cfg.model,
                error = %err,
                "chat completion request failed"
            );
            completion_request_error(err, &api_url)
        })?;

    let status = response.status();
    let response_body = response.bytes().await.map_err(|err| {
        ChatError::unclassified(format!("Failed to read chat completion response: {err}"))
    })?;

    if !status.is_success() {
        warn!(
            api_url = %api_url,
            model = %cfg.model,
            status = %status,
            response_body_len = response_body.len(),
            "completion API returned non-success status"
        );
        return Err(error_from_status(
            status.as_u16(),
            &String::from_utf8_lossy(&response_body),
        ));
    }

    let reply = reply_from_body(&response_body)?;
    debug!(
        model = %cfg.model,
        response_len = reply.content.len(),
        "received chat completion response"
    );
    Ok(reply)
}
