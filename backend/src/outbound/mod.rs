//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern: adapters are thin
//! translators between domain types and infrastructure-specific
//! representations and contain no business logic.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM

pub mod persistence;
