//! Scripted transport shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use crate::client::AssistantEngine;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportConfig};

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<HttpResponse>>,
    requests: Vec<HttpRequest>,
    configs: Vec<TransportConfig>,
}

/// Replays queued responses in order and records every request.
///
/// Clones share the same script, so a test can keep a handle after moving
/// the transport into a client.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: &Value) -> &Self {
        self.push(Ok(HttpResponse::new(status, body.to_string())))
    }

    pub fn push_raw(&self, status: u16, body: &str) -> &Self {
        self.push(Ok(HttpResponse::new(status, body)))
    }

    pub fn push_error(&self, message: &str) -> &Self {
        self.push(Err(Error::Transport(message.to_string())))
    }

    fn push(&self, response: Result<HttpResponse>) -> &Self {
        self.script
            .lock()
            .expect("script lock")
            .responses
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.lock().expect("script lock").requests.clone()
    }

    pub fn configs(&self) -> Vec<TransportConfig> {
        self.script.lock().expect("script lock").configs.clone()
    }
}

impl Transport for ScriptedTransport {
    fn configure(&mut self, config: &TransportConfig) -> Result<()> {
        self.script
            .lock()
            .expect("script lock")
            .configs
            .push(config.clone());
        Ok(())
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut script = self.script.lock().expect("script lock");
        script.requests.push(request);
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport("script exhausted".to_string())))
    }
}

pub fn engine(transport: &ScriptedTransport) -> AssistantEngine<ScriptedTransport> {
    AssistantEngine::with_transport(
        TransportConfig::new("https://assistant.example.com/api", "api-token"),
        "llm-key",
        transport.clone(),
    )
    .expect("engine")
}

pub fn conversation_json(id: i64) -> Value {
    json!({
        "id": id,
        "is_active": true,
        "user_id": "user-1",
        "assistant_key": "support-bot",
        "last_run": {"status": "complete", "in_finite_state": true},
        "history": [
            {"role": "user", "messages": [{"id": "m1", "content": "Hi"}]},
            {"role": "assistant", "messages": [{"id": "m2", "content": "Hello!"}]},
        ],
    })
}

pub fn task_run_json(is_running: bool, output: &str) -> Value {
    json!({
        "data": {
            "id": 31,
            "task_id": 4,
            "is_running": is_running,
            "output": output,
        }
    })
}
