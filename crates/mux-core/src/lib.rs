//! # mux-core
//!
//! Core types, traits, and error handling for promptmux.
//!
//! This crate provides the foundational pieces shared by the rest of the
//! workspace:
//! - The fixed provider enumeration and id newtypes
//! - The wire-level stream event union
//! - The [`CompletionProvider`] trait all adapters implement
//! - Provider error taxonomy

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod provider;
pub mod types;

pub use error::ProviderError;
pub use event::StreamEvent;
pub use provider::{CompletionProvider, FragmentStream, ProviderName, UnknownProvider};
pub use types::{PromptId, ResponseId, UserId};
