//! Fan-out split filter
//!
//! Splits a text payload on a delimiter and forwards one message per
//! non-empty segment, in payload order. A payload with no delimiter
//! passes through as a single message; a payload of only delimiters
//! fans out into nothing, which terminates it.
//!
//! # Config
//!
//! - `delimiter` (string, default `"\n"`): segment separator
//!
//! Binary payloads pass through untouched.

use ferry_pipeline::{ConfigExt, ConstructionError, Filter, FilterError, FilterFactory, Verdict};
use ferry_protocol::Message;
use ferry_topology::ComponentConfig;

pub struct SplitFilter {
    delimiter: String,
}

impl SplitFilter {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }
}

impl Filter for SplitFilter {
    fn apply(&mut self, message: Message) -> Result<Verdict, FilterError> {
        let Some(text) = message.text() else {
            return Ok(Verdict::Forward(message));
        };

        if !text.contains(&self.delimiter) {
            return Ok(Verdict::Forward(message));
        }

        let parts: Vec<Message> = text
            .split(&self.delimiter)
            .filter(|part| !part.is_empty())
            .map(Message::from_text)
            .collect();
        Ok(Verdict::FanOut(parts))
    }

    fn name(&self) -> &'static str {
        "split"
    }
}

pub struct SplitFilterFactory;

impl FilterFactory for SplitFilterFactory {
    fn type_name(&self) -> &'static str {
        "split"
    }

    fn create(&self, config: &ComponentConfig) -> Result<Box<dyn Filter>, ConstructionError> {
        let delimiter = config.get_str("delimiter")?.unwrap_or("\n");
        if delimiter.is_empty() {
            return Err(ConstructionError::invalid_config(
                "delimiter",
                "must not be empty",
            ));
        }
        Ok(Box::new(SplitFilter::new(delimiter)))
    }
}
