//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Author of a conversation message.
///
/// Serialized in lowercase, which is both the upstream wire form and the
/// form persisted by the durable store.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use yuki_core::Role;
///
/// assert_eq!(Role::Assistant.as_ref(), "assistant");
/// assert_eq!(Role::from_str("user").unwrap(), Role::User);
/// assert!(Role::from_str("narrator").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// System messages provide context and instructions
    System,
    /// User messages are from the human
    User,
    /// Assistant messages are from the model
    Assistant,
}
