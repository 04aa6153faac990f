//! Core business logic - framework-agnostic catalog, sale, till and identity
//! operations. Nothing in here knows about HTTP; the web layer calls these
//! functions with the acting user passed explicitly.

/// Login, sessions and role guards
pub mod auth;
/// Landing-page counters
pub mod dashboard;
/// Catalog and price history
pub mod product;
/// Sales and their lines
pub mod sale;
/// Startup seeding from settings
pub mod seed;
/// Till sessions and reconciliation
pub mod till;
/// User administration
pub mod user;
