//! Tessera host library.
//!
//! Server-side wiring for session resumption:
//!
//! - [`config`]: TOML configuration with environment overrides
//! - [`key_store`]: ticket key file
//! - [`watermark`]: persisted ticket index reservation
//! - [`host`]: [`ResumeHost`], the resumption service
//! - [`logging`]: tracing subscriber setup
//!
//! ```no_run
//! use tessera_host::{config::Config, logging, ResumeHost};
//!
//! let mut config = Config::load_default()?;
//! config.apply_env_overrides();
//! logging::init(&config.host.log_level)?;
//!
//! let host = ResumeHost::open(&config)?;
//! println!("ticket key {}", host.key_fingerprint());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod host;
pub mod key_store;
pub mod logging;
pub mod watermark;

pub use config::{Config, ConfigError};
pub use host::ResumeHost;
