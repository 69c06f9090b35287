// Database row types and the embedded JSONB documents they carry.
// Request/response DTOs live next to their handlers.

pub mod application;
pub mod chat;
pub mod interview;
pub mod job;
pub mod resume;
pub mod user;
