use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::credential::Credential;
use crate::error::ChatError;
use crate::model::Message;
use crate::providers;

pub struct ModelGatewayRequest {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelGatewayResponse {
    pub reply: Message,
}

pub type ModelGatewayFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ModelGatewayResponse, ChatError>> + 'a>>;

pub trait ModelGateway {
    fn chat<'a>(&'a self, request: ModelGatewayRequest) -> ModelGatewayFuture<'a>;
}

type ModelChatFuture<'a> = Pin<Box<dyn Future<Output = Result<Message, ChatError>> + 'a>>;

trait ChatBackend {
    fn chat<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        credential: &'a Credential,
        messages: &'a [Message],
    ) -> ModelChatFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderChatBackend;

impl ChatBackend for ProviderChatBackend {
    fn chat<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        credential: &'a Credential,
        messages: &'a [Message],
    ) -> ModelChatFuture<'a> {
        Box::pin(providers::openai::chat(client, cfg, credential, messages))
    }
}

/// Gateway over the real completion API. Holds the credential for the
/// lifetime of the session.
pub struct HostModelGateway<'a, B = ProviderChatBackend> {
    client: &'a Client,
    cfg: &'a Config,
    credential: Credential,
    backend: B,
}

impl<'a> HostModelGateway<'a, ProviderChatBackend> {
    pub fn new(client: &'a Client, cfg: &'a Config, credential: Credential) -> Self {
        Self {
            client,
            cfg,
            credential,
            backend: ProviderChatBackend,
        }
    }
}

impl<'a, B> HostModelGateway<'a, B> {
    #[cfg(test)]
    fn with_backend(client: &'a Client, cfg: &'a Config, credential: Credential, backend: B) -> Self {
        Self {
            client,
            cfg,
            credential,
            backend,
        }
    }
}

impl<'a, B> ModelGateway for HostModelGateway<'a, B>
where
    B: ChatBackend,
{
    fn chat<'b>(&'b self, request: ModelGatewayRequest) -> ModelGatewayFuture<'b> {
        Box::pin(async move {
            let reply = self
                .backend
                .chat(self.client, self.cfg, &self.credential, &request.messages)
                .await?;
            Ok(ModelGatewayResponse { reply })
        })
    }
}
