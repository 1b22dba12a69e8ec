//! ParcelDesk Admin library.
//!
//! This crate provides the dashboard functionality as a library, allowing it
//! to be tested and reused by the CLI.
//!
//! The interesting part lives in [`services::allocation`]: FIFO inventory
//! cost allocation with an exact-reversal ledger. Everything else is the
//! routine persistence and HTTP surface around it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
