//! Domain models for conversations, turns and task runs.
//!
//! Every model hydrates from the JSON maps the service returns and exports
//! back to the same shape. Required fields fail hydration with a structural
//! error; optional fields fall back to empty defaults so that new server-side
//! fields never break older clients.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Hydrate/export boundary shared by all models.
pub trait WireModel: Serialize + DeserializeOwned {
    /// Entity name used in structural error messages.
    const ENTITY: &'static str;

    /// Build the model from a decoded JSON map.
    fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(Error::structural(Self::ENTITY))
    }

    /// Export the model to the JSON shape it was hydrated from.
    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Error::structural(Self::ENTITY))
    }
}

/// Status of the most recent run of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Initializing,
    Thinking,
    Typing,
    Executing,
    Error,
    Cancelling,
    Cancelled,
    Complete,
    Other(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Initializing => "initializing",
            RunStatus::Thinking => "thinking",
            RunStatus::Typing => "typing",
            RunStatus::Executing => "executing",
            RunStatus::Error => "error",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Complete => "complete",
            RunStatus::Other(s) => s,
        }
    }

    /// Statuses the service leaves only on new user input.
    pub fn is_finite(&self) -> bool {
        matches!(
            self,
            RunStatus::Complete | RunStatus::Cancelled | RunStatus::Error
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for RunStatus {
    fn from(s: &str) -> Self {
        match s {
            "initializing" => RunStatus::Initializing,
            "thinking" => RunStatus::Thinking,
            "typing" => RunStatus::Typing,
            "executing" => RunStatus::Executing,
            "error" => RunStatus::Error,
            "cancelling" => RunStatus::Cancelling,
            "cancelled" => RunStatus::Cancelled,
            "complete" => RunStatus::Complete,
            other => RunStatus::Other(other.to_string()),
        }
    }
}

/// Status of a tool action within a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionStatus {
    Pending,
    Error,
    Success,
    RequiresConfirmation,
    Other(String),
}

impl ActionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Error => "error",
            ActionStatus::Success => "success",
            ActionStatus::RequiresConfirmation => "requires_confirmation",
            ActionStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ActionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => ActionStatus::Pending,
            "error" => ActionStatus::Error,
            "success" => ActionStatus::Success,
            "requires_confirmation" => ActionStatus::RequiresConfirmation,
            _ => ActionStatus::Other(s),
        }
    }
}

impl From<ActionStatus> for String {
    fn from(status: ActionStatus) -> Self {
        match status {
            ActionStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// A single text message within a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItemMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub content: String,
}

impl WireModel for ConversationItemMessage {
    const ENTITY: &'static str = "conversation message";
}

/// A tool invocation attached to a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationItemAction {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub status: Option<ActionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl ConversationItemAction {
    pub const ROLE_TOOL: &'static str = "tool";

    /// Whether the action is blocked on external approval.
    pub fn requires_confirmation(&self) -> bool {
        self.status == Some(ActionStatus::RequiresConfirmation)
    }
}

impl WireModel for ConversationItemAction {
    const ENTITY: &'static str = "conversation action";
}

/// One role's contribution to a conversation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversationItem {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub run_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<ConversationItemMessage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<ConversationItemAction>,
}

impl ConversationItem {
    pub const ROLE_USER: &'static str = "user";
    pub const ROLE_ASSISTANT: &'static str = "assistant";
    pub const ROLE_ERROR: &'static str = "error";

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    fn required_action_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| action.requires_confirmation())
            .count()
    }
}

impl WireModel for ConversationItem {
    const ENTITY: &'static str = "conversation item";
}

/// Snapshot of a server-side conversation.
///
/// The service nests run state under `last_run` and the failure text under
/// `error`; both are flattened here and re-nested on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConversationWire", into = "ConversationWire")]
pub struct Conversation {
    pub id: i64,
    pub is_active: bool,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub context: Value,
    pub additional_data: Value,
    pub subject_id: Option<String>,
    pub assistant_key: String,
    pub last_run_status: Option<String>,
    pub last_run_in_finite_state: Option<bool>,
    pub error_message: Option<String>,
    pub pending_items: Vec<ConversationItem>,
    pub history: Vec<ConversationItem>,
}

impl Conversation {
    pub fn count_history_messages(&self) -> usize {
        count_messages(&self.history)
    }

    pub fn count_pending_messages(&self) -> usize {
        count_messages(&self.pending_items)
    }

    /// Actions awaiting confirmation across pending turns. History is not
    /// consulted.
    pub fn count_pending_required_actions(&self) -> usize {
        self.pending_items
            .iter()
            .map(ConversationItem::required_action_count)
            .sum()
    }

    /// History and pending messages plus pending required actions.
    ///
    /// Required actions are counted as items needing attention, so this is
    /// not a literal message count.
    pub fn count_total_messages(&self) -> usize {
        self.count_history_messages()
            + self.count_pending_messages()
            + self.count_pending_required_actions()
    }

    /// Most recent pending item with the given role.
    pub fn pending_item_by_role(&self, role: &str) -> Option<&ConversationItem> {
        self.pending_items.iter().rev().find(|item| item.has_role(role))
    }

    /// Most recent history item with the given role.
    pub fn last_conversation_item_by_role(&self, role: &str) -> Option<&ConversationItem> {
        self.history.iter().rev().find(|item| item.has_role(role))
    }

    /// Unknown finite state counts as not finite.
    pub fn is_in_finite_state(&self) -> bool {
        self.last_run_in_finite_state.unwrap_or(false)
    }

    pub fn run_status(&self) -> Option<RunStatus> {
        self.last_run_status.as_deref().map(RunStatus::from)
    }
}

impl WireModel for Conversation {
    const ENTITY: &'static str = "conversation";
}

fn count_messages(items: &[ConversationItem]) -> usize {
    items.iter().map(|item| item.messages.len()).sum()
}

#[derive(Debug, Serialize, Deserialize)]
struct ConversationWire {
    id: i64,
    is_active: bool,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    user_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    context: Option<Value>,
    #[serde(default)]
    additional_data: Option<Value>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    subject_id: Option<String>,
    assistant_key: String,
    #[serde(default)]
    last_run: Option<LastRunWire>,
    #[serde(default)]
    error: Option<ErrorWire>,
    #[serde(default)]
    pending_items: Option<Vec<ConversationItem>>,
    #[serde(default)]
    history: Option<Vec<ConversationItem>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LastRunWire {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    in_finite_state: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorWire {
    #[serde(default)]
    message: Option<String>,
}

impl From<ConversationWire> for Conversation {
    fn from(wire: ConversationWire) -> Self {
        let (last_run_status, last_run_in_finite_state) = wire
            .last_run
            .map_or((None, None), |run| (run.status, run.in_finite_state));

        Self {
            id: wire.id,
            is_active: wire.is_active,
            user_id: wire.user_id,
            title: wire.title,
            context: wire.context.unwrap_or_else(empty_map),
            additional_data: wire.additional_data.unwrap_or_else(empty_map),
            subject_id: wire.subject_id,
            assistant_key: wire.assistant_key,
            last_run_status,
            last_run_in_finite_state,
            error_message: wire.error.and_then(|error| error.message),
            pending_items: wire.pending_items.unwrap_or_default(),
            history: wire.history.unwrap_or_default(),
        }
    }
}

impl From<Conversation> for ConversationWire {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id,
            is_active: conversation.is_active,
            user_id: conversation.user_id,
            title: conversation.title,
            context: Some(conversation.context),
            additional_data: Some(conversation.additional_data),
            subject_id: conversation.subject_id,
            assistant_key: conversation.assistant_key,
            last_run: Some(LastRunWire {
                status: conversation.last_run_status,
                in_finite_state: conversation.last_run_in_finite_state,
            }),
            error: Some(ErrorWire {
                message: conversation.error_message,
            }),
            pending_items: Some(conversation.pending_items),
            history: Some(conversation.history),
        }
    }
}

/// Snapshot of one asynchronous task run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub id: i64,
    pub task_id: i64,
    pub is_running: bool,
    pub output: String,
}

impl WireModel for TaskOutput {
    const ENTITY: &'static str = "task output";
}

fn empty_map() -> Value {
    Value::Object(Map::new())
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Accepts ids sent either as JSON strings or as numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseId {
    Text(String),
    Number(serde_json::Number),
}

impl From<LooseId> for String {
    fn from(id: LooseId) -> Self {
        match id {
            LooseId::Text(text) => text,
            LooseId::Number(number) => number.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    LooseId::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LooseId>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
