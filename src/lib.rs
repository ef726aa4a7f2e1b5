//! Gadget Chat
//!
//! A login-gated chat service that forwards user prompts to a hosted
//! generative-language API and renders the conversation.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server with server-rendered pages
//! - **Auth**: Static allow-list verification with a persisted identity blob
//! - **Chat**: Append-only transcript with a single-outstanding-request guard
//! - **LLM**: Thin client for the Gemini `generateContent` REST endpoint
//!
//! # Modules
//!
//! - [`auth`]: Credential verification, session store, and route guard
//! - [`chat`]: Conversation transcript and submission flow
//! - [`llm`]: Generation client and driver trait

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::unused_async)]

pub mod auth;
pub mod chat;
pub mod config;
pub mod llm;
pub mod server;

use std::sync::Arc;

use crate::config::AppConfig;

use auth::AuthStore;
use chat::ChatSession;

/// Application state shared across all handlers.
///
/// Both the identity store and the chat session are passed explicitly
/// through this handle rather than looked up through ambient globals,
/// so initialization order stays visible in `server::start_server`.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Identity store backing login, logout, and the route guard.
    pub auth: AuthStore,
    /// The chat session (transcript plus generation client).
    pub chat: ChatSession,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
