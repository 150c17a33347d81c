//! apimon - client-side engine for monitoring API health
//!
//! This library fetches the monitor feed of a registry of HTTP endpoints,
//! keeps an authoritative in-memory snapshot of their health, re-tests single
//! endpoints on demand and derives filtered projections for presentation.

pub mod admin;
pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod params;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod view;
