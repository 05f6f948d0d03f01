//! (k, n) threshold secret-image sharing over GF(257), with shadows
//! steganographically hidden in carrier BMPs via LSB substitution.
//!
//! The library exposes the component modules directly; `main.rs` is a thin
//! CLI shell composing `orchestrator::distribute`/`orchestrator::recover`.

pub mod bmp;
pub mod carriers;
pub mod cli;
pub mod error;
pub mod gf257;
pub mod orchestrator;
pub mod prng;
pub mod reconstruct;
pub mod sharing;
pub mod stego;
