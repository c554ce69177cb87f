use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// The author of a message. `Tool` marks messages that carry tool results.
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}
