//! # Base types for kestrel
//!
//! This is an auxiliary crate for `kestrel`, which contains the plain value types of the board:
//! coordinates, colors, piece codes, directions and bitboards. It was split from the main crate,
//! so everything declared here can be used in the build script for `kestrel`.
//!
//! Normally you don't want to use this crate directly. Use `kestrel` instead.

pub mod bitboard;
pub mod bitboard_consts;
pub mod dir;
pub mod geometry;
pub mod types;
