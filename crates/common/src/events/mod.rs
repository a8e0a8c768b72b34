//! Typed publish/subscribe event bus
//!
//! The bus is the decoupling point between the SDK core and its session
//! logic, and the extension surface for integrating applications. Events are
//! a closed set of variants ([`SdkEvent`]) addressed by string keys, so a
//! handler registered for a key only ever observes the payload shape that
//! key carries.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   emit()    ┌──────────────────┐
//! │  EventBus  │ ──────────► │ middleware chain │  (onion, registration order)
//! └─────┬──────┘             └────────┬─────────┘
//!       │ scoped("cart:")             │ next()
//!       ▼                             ▼
//! ┌────────────┐             ┌──────────────────┐
//! │  EventBus  │             │ keyed listeners  │  then any-listeners
//! └────────────┘             └──────────────────┘
//! ```
//!
//! Scoped views share one listener registry with their parent; they only
//! translate event keys by prepending their prefix. Dispatch is synchronous:
//! handlers that need async work must spawn it themselves.

mod bus;
mod event;

pub use bus::{EventBus, EventError, Subscription};
pub use event::{keys, SdkEvent};
