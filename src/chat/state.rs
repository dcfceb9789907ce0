//! Chat screen state machine and conversation types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classifier::Label;

/// Which screen the session is showing.
///
/// `Welcome → Chat` on start, `Chat → Welcome` on home.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Welcome,
    Chat,
}

impl Screen {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Screen) -> bool {
        matches!((self, target), (Self::Welcome, Self::Chat) | (Self::Chat, Self::Welcome))
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::Chat => "chat",
        };
        write!(f, "{s}")
    }
}

/// User interaction fed into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// "Get Started" on the welcome screen.
    Start,
    /// Home button on the chat screen; clears history.
    Home,
    /// Send a message from the chat screen.
    Submit(String),
}

impl ChatEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Home => "home",
            Self::Submit(_) => "submit",
        }
    }
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

pub const HAM_RESPONSE: &str = "This message looks safe. ✅";
pub const SPAM_RESPONSE: &str = "Warning! This message might be spam. ⚠️";

/// One message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Secondary line shown under bot replies ("Prediction: SPAM").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.to_string(),
            annotation: None,
            created_at: Utc::now(),
        }
    }

    /// Bot reply for a classification result.
    pub fn verdict(label: Label) -> Self {
        let content = match label {
            Label::Ham => HAM_RESPONSE,
            Label::Spam => SPAM_RESPONSE,
        };
        Self {
            id: Uuid::new_v4(),
            role: Role::Bot,
            content: content.to_string(),
            annotation: Some(format!("Prediction: {}", label.as_str().to_uppercase())),
            created_at: Utc::now(),
        }
    }
}
