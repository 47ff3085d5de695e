//! Remote content retrieval for gadget containers.
//!
//! Gadgets fetch cross-origin content through a same-origin proxy that wraps
//! every answer in a script-safe envelope. This crate builds the proxy
//! requests, keeps the OAuth session state and security token in step with
//! the server, satisfies preloaded requests locally and normalizes the
//! results.

pub mod auth;
pub mod config;
pub mod io;
pub mod observability;

pub use config::schema::{GadgetConfig, IoConfig, PageContext};
pub use io::{GadgetIo, NormalizedResponse, RequestParameters};
