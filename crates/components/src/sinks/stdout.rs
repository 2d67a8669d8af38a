//! Line-printing sink
//!
//! Writes each payload as one line on stdout. Binary payloads are
//! printed lossily.
//!
//! # Config
//!
//! - `prefix` (string, optional): printed before each payload

use std::io::Write;

use ferry_pipeline::{ConfigExt, ConstructionError, FilterError, Sink, SinkAck, SinkFactory};
use ferry_protocol::Message;
use ferry_topology::ComponentConfig;

pub struct StdoutSink {
    prefix: Option<String>,
}

impl StdoutSink {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }
}

impl Sink for StdoutSink {
    fn consume(&mut self, message: Message) -> Result<SinkAck, FilterError> {
        let text = String::from_utf8_lossy(message.payload());
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let result = match &self.prefix {
            Some(prefix) => writeln!(out, "{prefix}{text}"),
            None => writeln!(out, "{text}"),
        };
        result.map_err(|err| FilterError::failed(format!("stdout write failed: {err}")))?;
        Ok(SinkAck::Done)
    }

    fn name(&self) -> &'static str {
        "stdout"
    }

    fn close(&mut self) -> Result<(), FilterError> {
        std::io::stdout()
            .flush()
            .map_err(|err| FilterError::failed(format!("stdout flush failed: {err}")))
    }
}

pub struct StdoutSinkFactory;

impl SinkFactory for StdoutSinkFactory {
    fn type_name(&self) -> &'static str {
        "stdout"
    }

    fn create(&self, config: &ComponentConfig) -> Result<Box<dyn Sink>, ConstructionError> {
        let prefix = config.get_str("prefix")?.map(str::to_string);
        Ok(Box::new(StdoutSink::new(prefix)))
    }
}
