//! Data Transfer Objects sent to the fairness backend
//!
//! Requests are built and validated here, then handed to the client which
//! encodes them for the wire.

pub mod task;
