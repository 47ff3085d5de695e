//! Trust and OAuth session state shared by every request.
//!
//! # Data Flow
//! ```text
//! signed/OAuth request
//!     → token.rs (current security token attached as `st`)
//!     → oauth.rs (pending callback URL taken, session state attached)
//!
//! proxied response
//!     → oauth.rs (fresh `oauthState` overwrites the session state)
//!     → token.rs (fresh `st` replaces the security token)
//! ```
//!
//! # Design Decisions
//! - State lives for the lifetime of one `GadgetIo` context, never on disk
//! - Last completed response wins; writes are not ordered by call order

pub mod oauth;
pub mod token;

pub use oauth::OAuthSession;
pub use token::{SecurityTokenSource, SharedSecurityToken};
