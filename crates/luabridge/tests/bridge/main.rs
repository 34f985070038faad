//! End-to-end tests driving real Lua scripts through an `Evaluator`.
//!
//! Organized by concern:
//! - `arrays`: element access, length, clone, fallback storage
//! - `construction`: constructor and overload resolution, fields
//! - `contracts`: script-implemented host contracts
//! - `identity`: wrapper equality, hashing and round trips
//! - `sandbox`: cycle limit and library removal

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

pub mod arrays;
pub mod construction;
pub mod sandbox;

// Shared host types and helpers
pub mod util;
