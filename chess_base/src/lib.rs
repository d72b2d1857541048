//! # Base types for rookery
//!
//! This is an auxiliary crate for `rookery`, which contains the plain value types: squares,
//! colors, piece kinds, square sets and game outcomes. It holds no game logic.
//!
//! Normally you don't want to use this crate directly. Use `rookery` instead.

pub mod bitboard;
pub mod geometry;
pub mod types;
