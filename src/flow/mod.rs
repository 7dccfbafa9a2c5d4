//! Multi-step conversations over Discord interactions.
//!
//! The primitives ([`respond`], [`defer`], [`await_component`],
//! [`use_modal`]) each perform one protocol step. [`FlowSession`] composes
//! them so a command can be written as straight-line code:
//!
//! ```ignore
//! let mut flow = FlowSession::new(&platform, interaction);
//! flow.respond(ResponsePayload::new().components(rows)).await?;
//! flow.on_input().await?;
//! match flow.current_custom_id() { /* ... */ }
//! ```
//!
//! Waits give up after [`INPUT_TIMEOUT`], clean up the prompt and surface
//! [`FlowError::Abandoned`], which handlers simply propagate.

pub mod defer;
pub mod error;
pub mod modal;
pub mod respond;
pub mod session;
pub mod wait;

pub use defer::defer;
pub use error::{FlowError, FlowResult};
pub use modal::{use_modal, ModalSubmission};
pub use respond::{normalize_payload, respond};
pub use session::{FlowIdentity, FlowSession};
pub use wait::{await_component, WaitOrigin, INPUT_TIMEOUT};
