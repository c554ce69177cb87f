//! These models represent the objects passed around by the agent
//!
//! Provider wire formats (OpenAI-style chat messages and function tools) are converted into
//! these internal structs as soon as they arrive, and back out again right before a request
//! is sent. The internal models are therefore not an exact match to any one wire format.
pub mod message;
pub mod role;
pub mod tool;
