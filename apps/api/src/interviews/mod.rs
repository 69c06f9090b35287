//! Interview sessions: scheduling against an application, the live session
//! lifecycle (start/end/cancel, roster, recording stamps), question and
//! response capture, and the recruiter's decision with its application
//! write-back.

pub mod handlers;
pub mod session;
