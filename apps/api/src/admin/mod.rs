//! Admin surface: platform stats, user moderation (approval, activation,
//! deletion), job moderation, and the placement report.

pub mod handlers;
