//! Ferry - Protocol
//!
//! Core types shared by every layer of the pipeline runtime.
//!
//! # Overview
//!
//! - [`Message`] - the opaque unit of data that flows through a chain
//! - [`ChainId`] / [`SinkId`] - dense indices assigned at topology
//!   compile time, used for O(1) lookups in the dispatch loop
//!
//! This crate is deliberately small: the runtime imposes no schema on
//! payloads, and identifiers are plain `Copy` newtypes so the hot path
//! never touches a string.

mod id;
mod message;

pub use id::{ChainId, SinkId};
pub use message::Message;
