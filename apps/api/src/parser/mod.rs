//! Resume parser: accepts an uploaded PDF or plain-text resume, extracts
//! its text, and has the provider produce a structured document plus
//! personalized recommendations. Unlike the interview analyzer, provider
//! failures here fail the request.

pub mod extract;
pub mod handlers;
pub mod prompts;
