//! Integration and property tests for the coldsat wallet engine.
//!
//! The tests drive the public API end to end: derivation, the encrypted
//! wallet file format and the send pipeline against an in-memory gateway.

pub mod helpers;
