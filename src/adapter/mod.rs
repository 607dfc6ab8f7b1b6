//! Two-phase completion adapter
//!
//! Translates one unified chat completion request into the upstream's
//! session-then-message protocol and hands the open response back to the
//! caller.

pub mod client;
pub mod error;
pub mod headers;
pub mod models;
pub mod response;

pub use client::{AdapterConfig, ChatAdapter, TwoPhaseAdapter};
pub use error::{AdapterError, AdapterResult, Phase};
pub use models::{latest_user_content, Role, TalkSession, UnifiedMessage};
pub use response::{ByteStream, ResponseStream};
