//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GadgetConfig (validated, immutable)
//!     → IoConfig registered with GadgetIo, replaceable via `configure`
//!
//! preload file (JSON array)
//!     → loader.rs (load_preloads)
//!     → PreloadStore handed to the GadgetIo builder
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Proxy templates are substituted at call time, not at load time

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_preloads, parse_config, ConfigError};
pub use schema::{GadgetConfig, IoConfig, ObservabilityConfig, PageContext, PreloadConfig};
