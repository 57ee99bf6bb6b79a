//! Request bodies accepted by the conversation and task endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters for finding or creating a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationOption {
    pub assistant_key: String,
    pub user_id: Option<String>,
    pub subject_id: Option<String>,
    pub title: Option<String>,
    pub context: Map<String, Value>,
    pub additional_data: Map<String, Value>,
    /// Forces a fresh conversation instead of reusing a matching one.
    pub recreate: Option<bool>,
}

impl ConversationOption {
    pub fn new(assistant_key: impl Into<String>) -> Self {
        Self {
            assistant_key: assistant_key.into(),
            user_id: None,
            subject_id: None,
            title: None,
            context: Map::new(),
            additional_data: Map::new(),
            recreate: None,
        }
    }

    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn additional_data(mut self, additional_data: Map<String, Value>) -> Self {
        self.additional_data = additional_data;
        self
    }

    #[must_use]
    pub fn recreate(mut self, recreate: bool) -> Self {
        self.recreate = Some(recreate);
        self
    }
}

/// Fields that can be changed on an existing conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationUpdateOption {
    pub title: Option<String>,
    pub context: Map<String, Value>,
    pub additional_data: Map<String, Value>,
}

impl ConversationUpdateOption {
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn additional_data(mut self, additional_data: Map<String, Value>) -> Self {
        self.additional_data = additional_data;
        self
    }
}

/// A user message posted to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageOption {
    pub message: String,
}

impl MessageOption {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Input context for a task run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRunOption {
    pub context: Map<String, Value>,
}

impl TaskRunOption {
    pub fn new(context: Map<String, Value>) -> Self {
        Self { context }
    }
}
