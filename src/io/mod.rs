//! Remote content retrieval subsystem.
//!
//! # Data Flow
//! ```text
//! caller → client.rs (GadgetIo::make_request)
//!     → builder.rs (RequestParameters → RequestDescriptor)
//!     → preload.rs (answered locally? callback now, done)
//!     → transport.rs (proxied GET with ?refresh=, proxied POST, or direct)
//!     → envelope.rs (status gate, prefix strip, per-URL record, session updates)
//!     → transform.rs (+ xml.rs) (NormalizedResponse)
//!     → caller's callback, at most once
//! ```
//!
//! # Design Decisions
//! - All page-wide state lives in one `GadgetIo` context
//! - The envelope is decoded with a strict schema, never evaluated
//! - Request failures travel in the response; only caller errors are `Err`

pub mod builder;
pub mod client;
pub mod encoding;
pub mod envelope;
pub mod preload;
pub mod proxy_url;
pub mod response;
pub mod transform;
pub mod transport;
pub mod types;
pub mod xml;

pub use builder::{build_request, RequestDescriptor};
pub use client::{DirectHeaders, DroppedEnvelopeHook, GadgetIo, GadgetIoBuilder};
pub use encoding::encode_values;
pub use envelope::{EnvelopeError, UNPARSEABLE_CRUFT};
pub use preload::{PreloadEntry, PreloadStore};
pub use response::{Headers, NormalizedResponse, ResponseData, ResponseRecord};
pub use transport::{
    ReqwestProvider, ReqwestTransport, StaticProvider, Transport, TransportProvider,
    TransportRequest, TransportResponse,
};
pub use types::{AuthorizationType, ContentType, IoError, IoResult, MethodType, RequestParameters};
