//! Job postings: the public catalog, student-facing views, and the
//! recruiter's CRUD surface with its admin re-moderation rules.

pub mod handlers;
