//! Text-generation API integration.
//!
//! Provides the [`LlmProvider`] trait that the pipeline's capability workers
//! invoke, together with [`ChatClient`], a reqwest-based client for
//! OpenAI-compatible chat-completion endpoints.
//!
//! ```ignore
//! use reportforge::llm::{ChatClient, GenerationRequest, LlmProvider, Message};
//!
//! let client = ChatClient::from_env()?;
//! let request = GenerationRequest::new(
//!     "",
//!     vec![
//!         Message::system("You are a research specialist."),
//!         Message::user("Summarize recent grid-storage developments."),
//!     ],
//! );
//! let response = client.generate(request).await?;
//! ```

pub mod chat;

pub use chat::{
    ChatClient, Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage,
};
