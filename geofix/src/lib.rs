//! geofix - Location provider failover
//!
//! This library keeps a single stream of position fixes flowing while the
//! underlying location providers (GPS, network, passive) come and go.
//!
//! # High-Level API
//!
//! For most use cases, [`location::SessionController`] is the only entry point:
//!
//! ```ignore
//! use geofix::config::ConfigFile;
//! use geofix::location::{SessionCallbacks, SessionController};
//!
//! let config = ConfigFile::load_from(path)?;
//! let controller = SessionController::with_config(services, config.controller_config());
//!
//! controller.start(
//!     config.session.options.clone(),
//!     SessionCallbacks::new(|reading| show(reading), |error| report(error)),
//! )?;
//! ```

pub mod config;
pub mod location;
pub mod logging;

/// Version of the geofix library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
