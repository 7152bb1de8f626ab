//! Interview Command and Query Handlers
//!
//! CQRS handlers for the report interview lifecycle.
//!
//! ## Commands
//! - `CreateSession` - Start a session and ask the opening question
//! - `SubmitAnswer` - Process one turn: extract, decide, reply, persist
//! - `EndSession` - Force completion with a summary
//!
//! ## Queries
//! - `GetSession` - Retrieve the stored session record

mod create_session;
mod end_session;
mod get_session;
mod submit_answer;

pub use create_session::{
    CreateSessionCommand, CreateSessionError, CreateSessionHandler, CreateSessionResult,
};
pub use end_session::{EndSessionCommand, EndSessionError, EndSessionHandler, EndSessionResult};
pub use get_session::{GetSessionError, GetSessionHandler, GetSessionQuery, GetSessionResult};
pub use submit_answer::{
    SubmitAnswerCommand, SubmitAnswerError, SubmitAnswerHandler, SubmitAnswerResult,
};
