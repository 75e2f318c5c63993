//! Fairscope Core
//!
//! Core types and abstractions for the fairscope fairness-evaluation client.
//!
//! This crate contains:
//! - Domain types: task states, status snapshots, fairness results, clustering catalog
//! - DTOs: the task submission request and its form encoding
//! - Views: chart and table view models derived from a fairness result
//! - Session: the analysis session a front-end renders from

pub mod domain;
pub mod dto;
pub mod session;
pub mod view;
