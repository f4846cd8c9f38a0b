//! Chat proxy.
//!
//! Forwards a conversation to an OpenRouter-compatible completions API,
//! trying each configured model in turn until one answers. The catalog
//! submodule backs the `probe` tool.

pub mod catalog;
mod fallback;
mod proxy;
mod types;

pub use catalog::{free_models, models_matching, KeyStatus, ModelCatalog};
pub use fallback::{try_in_order, Attempt, Exhausted};
pub use proxy::{prepare_messages, ChatProxy, ProxyError};
pub use types::ChatMessage;
