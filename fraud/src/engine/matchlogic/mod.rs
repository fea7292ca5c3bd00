//! Match Logic Module
//!
//! Pairwise matching rule that flags purchases made by the same actor on the
//! same deal with different payment instruments, and the all-pairs scan that
//! applies it to a batch.

pub mod matcher;
pub mod normalize;

pub use matcher::Matcher;
