//! Burst agent: a chat-driven launcher for Apex burst tokens.
//!
//! A conversation fills a per-user draft through an LLM extractor, asks for
//! confirmation once the draft is ready, and submits one factory call.

pub mod config;
pub mod console;
pub mod error;
pub mod launch;
pub mod ledger;
pub mod llm;
pub mod logger;
pub mod nlu;
pub mod pinning;
pub mod store;
