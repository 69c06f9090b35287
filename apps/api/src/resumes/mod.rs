//! Resume builder: structured resume documents with version history,
//! weighted completeness scoring, ATS analysis, and local improvement
//! suggestions.

pub mod completeness;
pub mod handlers;
pub mod suggestions;
pub mod versioning;
