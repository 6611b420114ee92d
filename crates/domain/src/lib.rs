//! # gasguard-domain
//!
//! Pure domain model for the gasguard remote control core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **device shadow** (reported vs desired state) and partial
//!   desired-state patches
//! - Define **Commands** and their **CommandResults**
//! - Describe caller → device **registrations**
//! - Hold the pure policy functions: the **safety gate** for actuator
//!   commands, **threshold validation** and the **alarm response** table
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod actuator;
pub mod command;
pub mod gas;
pub mod registration;
pub mod safety;
pub mod shadow;
pub mod threshold;
