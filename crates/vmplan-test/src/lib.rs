//! Shared test fixtures for vmplan crates.
//!
//! This crate provides models and instances for testing.
//! It only depends on `vmplan-core` so every crate can use it.
//!
//! - [`datacenter`] - Small datacenter builder
//! - [`instances`] - Ready-made problem instances
//! - [`check`] - Plan checkers
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! vmplan-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use vmplan_test::datacenter::Datacenter;
//! use vmplan_test::instances::overloaded_node;
//! ```

pub mod check;
pub mod datacenter;
pub mod instances;

pub use datacenter::{Datacenter, CPU};
