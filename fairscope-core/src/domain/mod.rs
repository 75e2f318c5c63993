//! Core domain types
//!
//! This module contains the structures exchanged with the fairness backend.
//! They are shared between the HTTP client (which fetches them) and the
//! front-ends (which render them).

pub mod catalog;
pub mod dataset;
pub mod result;
pub mod task;
