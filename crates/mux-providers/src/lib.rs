//! # mux-providers
//!
//! Provider adapters for promptmux.
//!
//! Each adapter wraps one upstream streaming completion API behind the
//! [`mux_core::CompletionProvider`] contract: given a per-user API key and a
//! prompt, produce a lazy stream of text fragments, or fail with a provider
//! error. Adapters never retry; fragments already produced before a
//! mid-stream failure stand as a partial response.
//!
//! [`ProviderRegistry`] is the static name-to-adapter mapping, resolved once
//! at startup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod registry;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use google::{GoogleConfig, GoogleProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use registry::ProviderRegistry;
