//! Career chat: student conversations with the assistant, stored as one
//! row per conversation with the full message history inline.

pub mod handlers;
