//! Shared infrastructure for the WooSDK client crates.
//!
//! This crate hosts the pieces of the SDK that have no knowledge of any
//! particular REST API:
//!
//! - [`events`]: a typed publish/subscribe event bus with middleware
//!   interception and scoped namespaces
//! - [`storage`]: the async token-storage abstraction used for session
//!   credentials, plus an in-memory implementation
//! - [`resilience`]: retry building blocks (backoff strategies and retry
//!   policies) consumed by the HTTP pipeline

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod events;
pub mod resilience;
pub mod storage;

// Re-export commonly used types for convenience
pub use events::{EventBus, EventError, SdkEvent, Subscription};
pub use resilience::{BackoffStrategy, RetryDecision, RetryPolicy};
pub use storage::{MemoryStorage, StorageError, TokenStorage};
