//! Generation request type.

use crate::{ChatMessage, ChatTurn, Role};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Everything the dispatcher needs to ask for one completion.
///
/// Carries both upstream shapes: `system` + `prompt` for the single-prompt
/// endpoint and `messages` for the message-array endpoint, so the dispatcher
/// can fall back between them without rebuilding the request.
///
/// # Examples
///
/// ```
/// use yuki_core::{ChatTurn, GenerationRequest};
///
/// let request = GenerationRequest::new(
///     "Be brief.",
///     "User: hi\nAssistant:",
///     vec![ChatTurn::system("Be brief."), ChatTurn::user("hi")],
/// );
/// assert_eq!(request.messages().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GenerationRequest {
    system: String,
    prompt: String,
    messages: Vec<ChatTurn>,
}

impl GenerationRequest {
    /// Create a request from already-rendered parts.
    pub fn new(
        system: impl Into<String>,
        prompt: impl Into<String>,
        messages: Vec<ChatTurn>,
    ) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            messages,
        }
    }

    /// Render a request from stored history and the new user input.
    ///
    /// The message array is the system turn, every history turn in order,
    /// then the user turn. The single prompt is a `User:`/`Assistant:`
    /// transcript of the user and assistant history ending with an open
    /// `Assistant:` line.
    ///
    /// ```
    /// use yuki_core::{ChatMessage, GenerationRequest, Role};
    ///
    /// let history = vec![
    ///     ChatMessage::now(Role::User, "hi"),
    ///     ChatMessage::now(Role::Assistant, "hello!"),
    /// ];
    /// let request = GenerationRequest::from_history("Be kind.", &history, "how are you?");
    /// assert_eq!(request.prompt(), "User: hi\nAssistant: hello!\nUser: how are you?\nAssistant:");
    /// assert_eq!(request.messages().len(), 4);
    /// ```
    pub fn from_history(system: &str, history: &[ChatMessage], user_text: &str) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatTurn::system(system));
        messages.extend(history.iter().map(ChatMessage::to_turn));
        messages.push(ChatTurn::user(user_text));

        let mut lines: Vec<String> = history
            .iter()
            .filter_map(|m| match m.role() {
                Role::User => Some(format!("User: {}", m.content())),
                Role::Assistant => Some(format!("Assistant: {}", m.content())),
                Role::System => None,
            })
            .collect();
        lines.push(format!("User: {}", user_text));
        lines.push("Assistant:".to_string());

        Self::new(system, lines.join("\n"), messages)
    }

    /// Characters sent to the single-prompt endpoint.
    pub fn prompt_chars(&self) -> usize {
        self.system.chars().count() + self.prompt.chars().count()
    }

    /// Characters sent to the message-array endpoint.
    pub fn message_chars(&self) -> usize {
        self.messages
            .iter()
            .map(|m| m.content().chars().count())
            .sum()
    }
}
