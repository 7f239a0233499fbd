//! fare-routing core
//!
//! Routing validation and route-map traversal for airline fare pricing:
//! walks a priced itinerary through a fare's routing map, evaluates the
//! numbered routing restrictions attached to it, and runs the MPM/TPM
//! mileage fallback when no map applies.

pub mod types;
pub mod error;
pub mod travel;
pub mod graph;
pub mod fare;
pub mod traits;
pub mod outcome;
pub mod restriction;
pub mod walker;
pub mod mileage;
pub mod cache;
pub mod orchestrator;
