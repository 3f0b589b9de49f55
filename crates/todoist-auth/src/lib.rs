//! Todoist OAuth credential bridge
//!
//! Mediates the three-party authorization-code flow between an external
//! OAuth client, this gateway and Todoist, and produces the `SessionProps`
//! bundle every tool invocation runs under.
//!
//! Login flow:
//! 1. `CredentialBridge::authorize()` encodes the inbound `AuthRequest` into
//!    `state` and returns the Todoist authorize URL
//! 2. Todoist redirects back to `/callback` with `code` and `state`
//! 3. `CredentialBridge::callback()` decodes `state`, exchanges the code via
//!    `token::exchange_code()`, fetches the identity via
//!    `session::fetch_identity()` and hands `SessionProps` to the
//!    `AuthorizationFinalizer`
//!
//! Nothing is stored between steps 1 and 3: the whole request travels in
//! `state`.

pub mod bridge;
pub mod constants;
pub mod error;
pub mod flow;
pub mod request;
pub mod session;
pub mod state;
pub mod token;

pub use bridge::{
    AuthorizationFinalizer, BridgeConfig, CallbackParams, CompleteAuthorization, CredentialBridge,
    FinalizeFuture,
};
pub use constants::*;
pub use error::{Error, Result};
pub use flow::{FlowAction, FlowEvent, FlowState, FlowStep, advance};
pub use request::{AuthRequest, parse_auth_request};
pub use session::{Identity, SessionProps, fetch_identity};
pub use state::{decode_state, encode_state};
pub use token::{UpstreamToken, exchange_code};
