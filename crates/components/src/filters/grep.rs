//! Regex match filter
//!
//! Keeps messages whose text matches a pattern, or drops them when
//! `invert` is set. Binary (non-UTF-8) payloads never match.
//!
//! # Config
//!
//! - `pattern` (string, required): regex applied to the payload text
//! - `invert` (bool, default false): drop matches instead of keeping
//!   them

use regex::Regex;

use ferry_pipeline::{ConfigExt, ConstructionError, Filter, FilterError, FilterFactory, Verdict};
use ferry_protocol::Message;
use ferry_topology::ComponentConfig;

pub struct GrepFilter {
    pattern: Regex,
    invert: bool,
}

impl GrepFilter {
    pub fn new(pattern: Regex, invert: bool) -> Self {
        Self { pattern, invert }
    }
}

impl Filter for GrepFilter {
    fn apply(&mut self, message: Message) -> Result<Verdict, FilterError> {
        let matched = message
            .text()
            .map(|text| self.pattern.is_match(text))
            .unwrap_or(false);

        if matched != self.invert {
            Ok(Verdict::Forward(message))
        } else {
            Ok(Verdict::Drop)
        }
    }

    fn name(&self) -> &'static str {
        "grep"
    }
}

pub struct GrepFilterFactory;

impl FilterFactory for GrepFilterFactory {
    fn type_name(&self) -> &'static str {
        "grep"
    }

    fn create(&self, config: &ComponentConfig) -> Result<Box<dyn Filter>, ConstructionError> {
        let raw = config.require_str("pattern")?;
        let pattern = Regex::new(raw)
            .map_err(|err| ConstructionError::invalid_config("pattern", err.to_string()))?;
        let invert = config.get_bool("invert")?.unwrap_or(false);

        Ok(Box::new(GrepFilter::new(pattern, invert)))
    }
}
