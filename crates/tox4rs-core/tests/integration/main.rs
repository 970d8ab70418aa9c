//! Integration test entry point for tox4rs-core.
//!
//! Drives whole sessions against the in-memory engine.
//! Run with: cargo test --test integration

mod harness;
mod av;
mod concurrency;
mod dispatch;
mod lifecycle;
mod scenarios;
