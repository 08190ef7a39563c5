//! Integration tests for promptmux.
//!
//! Covers the provider adapters against wiremock SSE upstreams, the fan-out
//! orchestrator end to end over those mocks, and the HTTP router surface.

pub mod mock_upstream;

#[cfg(test)]
mod api_tests;
#[cfg(test)]
mod fanout_tests;
#[cfg(test)]
mod provider_tests;
