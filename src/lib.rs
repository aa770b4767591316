//! # azurefleet - the `azurerm_azure_fleet` resource
//!
//! A library implementation of the Azure Fleet resource: the configuration
//! grammar users write, the bidirectional pipeline between that
//! configuration and the `Microsoft.AzureFleet/fleets` API record, and the
//! lifecycle controller that drives create, read, update and delete.
//!
//! ## Architecture Overview
//!
//! ```text
//!            configuration tree (model::FleetConfig)
//!                 │                        ▲
//!   schema ──► crossfield ──► expand    flatten ◄── StateView (prior state)
//!                 │                        │
//!                 ▼                        │
//!            API record tree (api::Fleet)──┘
//!                 │
//!                 ▼
//!   resource::FleetResource ──► api::FleetsClient ──► poller
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use azurefleet::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ProviderConfig::load(None)?;
//!     let client = Arc::new(config.fleets_client()?);
//!     let resource = FleetResource::from_config(client, &config);
//!
//!     let mut data = resource.data(serde_json::from_str(FLEET_JSON)?);
//!     resource.create(&mut data).await?;
//!     resource.read(&mut data).await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::api::{ArmFleetsClient, Fleet, FleetId, FleetsClient};
    pub use crate::config::ProviderConfig;
    pub use crate::error::{Error, ErrorContext, Result};
    pub use crate::expand::expand_fleet;
    pub use crate::flatten::{flatten_fleet, StateView};
    pub use crate::model::FleetConfig;
    pub use crate::resource::{FleetResource, Resource, ResourceData, Timeouts};
    pub use crate::schema::fleet_schema;
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases.
pub mod error;

/// Closed API enumerations and their wire values.
pub mod enums;

/// Configuration-side record tree.
pub mod model;

/// API-side record tree, the fleets client seam and the ARM client.
pub mod api;

// ============================================================================
// Pipeline
// ============================================================================

/// Leaf validators for resource IDs and values.
pub mod validate;

/// Schema declaration and the configuration walker.
pub mod schema;

/// Configuration tree to API tree.
pub mod expand;

/// API tree to configuration tree.
pub mod flatten;

/// Plan-time cross-field rules.
pub mod crossfield;

// ============================================================================
// Lifecycle
// ============================================================================

/// Long-running operation polling.
pub mod poller;

/// Resource trait, state handle and the fleet controller.
pub mod resource;

// ============================================================================
// Ambient
// ============================================================================

/// Provider configuration loading.
pub mod config;

/// Tracing subscriber initialisation.
pub mod logging;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
