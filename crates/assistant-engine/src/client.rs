//! API client for the conversation and task endpoints.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{Conversation, TaskOutput, WireModel};
use crate::options::{ConversationOption, ConversationUpdateOption, MessageOption, TaskRunOption};
use crate::polling::PollPolicy;
use crate::transport::{
    HttpRequest, HttpResponse, LLM_KEY_HEADER, ReqwestTransport, Transport, TransportConfig,
};

/// Client for one Assistant Engine deployment.
///
/// Owns a configured [`Transport`]. Changing credentials rebuilds the
/// transport for all later calls.
pub struct AssistantEngine<T = ReqwestTransport> {
    config: TransportConfig,
    llm_key: String,
    poll_policy: PollPolicy,
    transport: T,
}

impl AssistantEngine<ReqwestTransport> {
    pub fn new(
        api_url: &str,
        api_token: impl Into<String>,
        llm_key: impl Into<String>,
        basic_auth: Option<String>,
    ) -> Result<Self> {
        let config = TransportConfig::new(api_url, api_token).with_basic_auth(basic_auth);
        Self::with_transport(config, llm_key, ReqwestTransport::default())
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_transport(
            config.transport_config(),
            config.llm_key.clone(),
            ReqwestTransport::default(),
        )?
        .with_poll_policy(config.poll.policy()))
    }
}

impl<T: Transport> AssistantEngine<T> {
    /// Build a client around a custom transport, configuring it for `config`.
    pub fn with_transport(
        config: TransportConfig,
        llm_key: impl Into<String>,
        mut transport: T,
    ) -> Result<Self> {
        transport.configure(&config)?;
        Ok(Self {
            config,
            llm_key: llm_key.into(),
            poll_policy: PollPolicy::default(),
            transport,
        })
    }

    /// Policy used by [`AssistantEngine::initiate_task_run_and_poll`].
    #[must_use]
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn set_api_token(&mut self, api_token: impl Into<String>) -> Result<()> {
        self.config.set_api_token(api_token);
        self.transport.configure(&self.config)
    }

    pub fn set_basic_auth(&mut self, basic_auth: Option<String>) -> Result<()> {
        self.config.set_basic_auth(basic_auth);
        self.transport.configure(&self.config)
    }

    /// Replace the inference credential sent as `x-llm-key`.
    pub fn set_llm_key(&mut self, llm_key: impl Into<String>) {
        self.llm_key = llm_key.into();
    }

    /// List the conversations of a user.
    pub async fn get_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let request = HttpRequest::new(Method::GET, "conversations").with_query("user_id", user_id);
        let data = take_data(self.call(request).await?)?;
        serde_json::from_value(data).map_err(Error::structural(Conversation::ENTITY))
    }

    pub async fn find_or_create_conversation(
        &self,
        option: &ConversationOption,
    ) -> Result<Conversation> {
        let request = HttpRequest::new(Method::POST, "conversations").with_json(to_body(option)?);
        let body = self.call(self.inference(request)).await?;
        Conversation::from_value(take_data(body)?)
    }

    pub async fn get_conversation(&self, conversation_id: i64) -> Result<Conversation> {
        let request = HttpRequest::new(Method::GET, format!("conversations/{conversation_id}"));
        let body = self.call(self.inference(request)).await?;
        Conversation::from_value(take_data(body)?)
    }

    /// Cancel the active run of a conversation.
    ///
    /// Never fails: any error is logged and reported as `false`.
    pub async fn cancel_run(&self, conversation_id: i64) -> bool {
        let request = HttpRequest::new(
            Method::POST,
            format!("conversations/{conversation_id}/cancel-run"),
        );
        match self.execute(request).await {
            Ok(_) => true,
            Err(e) => {
                warn!(conversation_id, error = %e, "Failed to cancel run");
                false
            }
        }
    }

    pub async fn update_conversation(
        &self,
        conversation_id: i64,
        option: &ConversationUpdateOption,
    ) -> Result<Conversation> {
        let request = HttpRequest::new(Method::PATCH, format!("conversations/{conversation_id}"))
            .with_json(to_body(option)?);
        let body = self.call(request).await?;
        Conversation::from_value(take_data(body)?)
    }

    /// Deactivate a conversation, returning the decoded response body.
    pub async fn deactivate_conversation(&self, conversation_id: i64) -> Result<Value> {
        let request = HttpRequest::new(Method::DELETE, format!("conversations/{conversation_id}"));
        self.call(request).await
    }

    /// Post a user message, returning the decoded response body.
    pub async fn create_message(
        &self,
        conversation_id: i64,
        option: &MessageOption,
    ) -> Result<Value> {
        let request = HttpRequest::new(
            Method::POST,
            format!("conversations/{conversation_id}/messages"),
        )
        .with_json(to_body(option)?);
        self.call(self.inference(request)).await
    }

    /// Start a task run. The decoded body carries the new `run_id`.
    pub async fn initiate_task_run(&self, task_key: &str, option: &TaskRunOption) -> Result<Value> {
        let request = HttpRequest::new(Method::POST, format!("tasks/{task_key}/runs"))
            .with_json(to_body(option)?);
        self.call(self.inference(request)).await
    }

    pub async fn get_task_run(&self, task_key: &str, run_id: i64) -> Result<TaskOutput> {
        let request = HttpRequest::new(Method::GET, format!("tasks/{task_key}/runs/{run_id}"));
        let body = self.call(request).await?;
        TaskOutput::from_value(take_data(body)?)
    }

    fn inference(&self, request: HttpRequest) -> HttpRequest {
        request.with_header(LLM_KEY_HEADER, self.llm_key.clone())
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(
            method = %request.method,
            path = %request.path,
            llm_key = request.header(LLM_KEY_HEADER).is_some(),
            "Sending request"
        );
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(Error::Http {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response)
    }

    async fn call(&self, request: HttpRequest) -> Result<Value> {
        let response = self.execute(request).await?;
        serde_json::from_str(&response.body).map_err(Error::Decode)
    }
}

fn to_body<S: Serialize>(option: &S) -> Result<Value> {
    serde_json::to_value(option).map_err(|e| Error::Config(format!("Invalid request body: {e}")))
}

/// Unwrap the `{"data": ...}` envelope used by every entity endpoint.
fn take_data(body: Value) -> Result<Value> {
    let missing = || Error::MissingField {
        entity: "response",
        field: "data",
    };
    match body {
        Value::Object(mut map) => map.remove("data").ok_or_else(missing),
        _ => Err(missing()),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
