//! Fraud Engine Module
//!
//! - `entry`: purchase records as they arrive on the wire
//! - `matchlogic`: identity normalization and the pairwise matching rule

pub mod entry;
pub mod matchlogic;
