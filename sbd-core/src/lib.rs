//! Core types and utilities for the Iridium SBD modem protocol
//!
//! This crate provides the error taxonomy and the protocol constants
//! shared by the transport and modem crates.

pub mod constants;
pub mod error;

pub use error::{SbdError, SbdResult};
