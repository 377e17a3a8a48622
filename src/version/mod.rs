//! Version layer: ordering, registry access and registry data
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│    Types    │────▶│   Legacy    │
//! │  (fetch)    │     │ (releases)  │     │ (ordering)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ Registries  │
//! │   (PyPI)    │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`legacy`]: Loose version ordering shared by filtering and sorting
//! - [`registry`]: Registry trait for fetching releases from a package index
//! - [`registries`]: Concrete registry implementations (PyPI)
//! - [`types`]: Release snapshots returned by registries
//! - [`error`]: Error types for registry operations

pub mod error;
pub mod legacy;
pub mod registries;
pub mod registry;
pub mod types;
