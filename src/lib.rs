#![forbid(unsafe_code)]
//! kharness: test and benchmark runner for KPHP
//!
//! Finds `*Test.php` / `*Bench.php` files, generates a driver script around the class each one
//! declares, compiles it with `kphp2cpp` (or interprets it with `php`), runs it and reports
//! PHPUnit-style results or `benchstat`-compatible timings.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! PHP source analysis lives in the `kharness_syntax` crate.

pub mod cli;
pub mod harness;
pub mod toolchain;

pub use kharness_syntax as syntax;
