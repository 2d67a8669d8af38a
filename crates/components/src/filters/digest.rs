//! Hashing filter
//!
//! Replaces each payload with its SHA-256 hex digest. Hashing runs on
//! the worker pool rather than the dispatch thread, making this the
//! reference offloading component: the dispatch loop keeps serving
//! other chains while a worker hashes.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use ferry_pipeline::{
    ConstructionError, Filter, FilterError, FilterFactory, OffloadCall, Verdict,
};
use ferry_protocol::Message;
use ferry_topology::ComponentConfig;

pub struct DigestFilter;

/// The blocking part, run on a worker thread.
fn hash(message: Message) -> Result<Message, ferry_pipeline::JobError> {
    let digest = Sha256::digest(message.payload());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        // Writing to a String cannot fail.
        let _ = write!(hex, "{byte:02x}");
    }
    Ok(Message::from_text(hex))
}

impl Filter for DigestFilter {
    fn apply(&mut self, message: Message) -> Result<Verdict, FilterError> {
        Ok(Verdict::Offload(OffloadCall::new(message, hash)))
    }

    fn name(&self) -> &'static str {
        "digest"
    }
}

pub struct DigestFilterFactory;

impl FilterFactory for DigestFilterFactory {
    fn type_name(&self) -> &'static str {
        "digest"
    }

    fn create(&self, _config: &ComponentConfig) -> Result<Box<dyn Filter>, ConstructionError> {
        Ok(Box::new(DigestFilter))
    }
}
