//! Release resolution: which Liquibase build to fetch and from where.
//!
//! # Sub-modules
//!
//! - [`edition`] - Open-source versus commercial edition (`Edition`).
//! - [`version`] - Version selector parsing and validation.
//! - [`naming`] - Pure archive-name and download-URL derivation.
//! - [`index`] - Upstream release index client.
//! - [`resolver`] - Turns a selector into a concrete version.

pub mod edition;
pub mod index;
pub mod naming;
pub mod resolver;
pub mod version;
