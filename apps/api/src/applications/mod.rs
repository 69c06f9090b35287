// Application lifecycle: student applications to jobs, the recruiter
// pipeline over them, and the state machine both sides run on.

pub mod handlers;
pub mod lifecycle;
