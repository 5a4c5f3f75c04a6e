pub mod classify;
pub mod client;
pub mod config;
pub mod conversation;
pub mod endpoint;
pub mod error;
pub mod state;

// Re-export main types for convenience
pub use classify::{classify, classify_detail, Classification};
pub use client::{ChatApi, ChatClient};
pub use config::Config;
pub use conversation::{narrate, Conversation, Phase, DEFAULT_GREETING};
pub use endpoint::{resolve_base_url, BaseUrl, ExecutionContext};
pub use error::{ClientError, ErrorKind, CONNECTIVITY_MESSAGE};
pub use state::{ChatError, ChatRequest, ChatResponse, Message, Role};
