//! Wire types for the DevTools cookie schema.
//!
//! This crate contains the serde-serializable types the session cache
//! writes to disk and re-applies to a live browser. These types
//! represent the "protocol layer" - the shapes of cookie data as they
//! appear on the DevTools wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **1:1 with protocol**: Match the `Network.Cookie` /
//!   `Network.setCookies` shapes of the DevTools protocol
//! - **Stable**: Changes only when the wire protocol changes
//!
//! Higher-level behavior (persistence, verification probes) lives in
//! the `dashprobe` crate.

pub mod cookie;

pub use cookie::*;
