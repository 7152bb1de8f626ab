//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod interview;

pub use interview::{
    // Handlers
    CreateSessionHandler,
    EndSessionHandler,
    GetSessionHandler,
    SubmitAnswerHandler,
    // Commands and Queries
    CreateSessionCommand,
    EndSessionCommand,
    GetSessionQuery,
    SubmitAnswerCommand,
    // Results
    CreateSessionResult,
    EndSessionResult,
    GetSessionResult,
    SubmitAnswerResult,
    // Errors
    CreateSessionError,
    EndSessionError,
    GetSessionError,
    SubmitAnswerError,
};
