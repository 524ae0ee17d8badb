//! # ldapsync-core
//!
//! Core library for one-way LDAP to PostgreSQL user synchronization.
//!
//! The directory is the source of truth. Each pass resolves every
//! directory-managed user through a layered attribute mapping, compares the
//! result against the stored row and writes all changed users back in a
//! single transaction.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types shared across the library
pub mod error;

/// Attribute mapping table and store projection
pub mod mapping;

/// Resolution of raw directory records into store columns
pub mod resolver;

/// Change detection between stored and resolved users
pub mod comparison;

/// Directory collaborator and its LDAP adapter
pub mod directory;

/// Relational store collaborator and its PostgreSQL adapter
pub mod store;

/// Environment-style configuration discovery, merging and validation
pub mod config;

/// Sync pass orchestration and reporting
pub mod sync;

/// Fixed-interval scheduling and cooperative shutdown
pub mod schedule;
