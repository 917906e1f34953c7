//! Version resolution layer
//!
//! This module provides the core functionality for parsing Go release versions,
//! evaluating version constraints, and caching the remote release list.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│    Cache    │◀────│  Resolver   │
//! │  (fetch)    │     │  (memory)   │     │  (select)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                                ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │  GoVersion  │◀────│ Constraint  │
//!                     │ (ordering)  │     │  (check)    │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: In-memory version list cache with max-age refresh
//! - [`constraint`]: Constraint expressions (`1.x`, `>=1.14, <1.16`, ...)
//! - [`error`]: Error types for parsing, fetching and resolution
//! - [`goversion`]: Go release version literals and their ordering
//! - [`resolver`]: Request-level resolution with candidate fallback
//! - [`select`]: Greatest-match selection
//! - [`source`]: Remote version list fetching

pub mod cache;
pub mod constraint;
pub mod error;
pub mod goversion;
pub mod resolver;
pub mod select;
pub mod source;
