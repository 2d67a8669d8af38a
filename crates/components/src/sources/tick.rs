//! Interval tick source
//!
//! Emits a numbered text message on a fixed interval. Mostly useful for
//! demos and for exercising a pipeline without external input.
//!
//! # Config
//!
//! - `interval_ms` (integer, default 1000): time between emissions
//! - `prefix` (string, default "tick"): payload prefix
//! - `limit` (integer, optional): stop after this many messages

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ferry_pipeline::{ConfigExt, ConstructionError, Emitter, Source, SourceFactory};
use ferry_protocol::Message;
use ferry_topology::ComponentConfig;

pub struct TickSource {
    interval: Duration,
    prefix: String,
    limit: Option<u64>,
}

impl Source for TickSource {
    fn run<'a>(
        &'a mut self,
        emitter: Emitter,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // First tick fires immediately; skip it so the configured
            // interval applies from the start.
            ticker.tick().await;

            let mut seq: u64 = 0;
            loop {
                if self.limit.is_some_and(|limit| seq >= limit) {
                    tracing::debug!(chain = %emitter.chain(), emitted = seq, "tick limit reached");
                    return;
                }

                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => {}
                }

                let message = Message::from_text(format!("{}-{}", self.prefix, seq));
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    result = emitter.emit(message) => {
                        if result.is_err() {
                            return;
                        }
                    }
                }
                seq += 1;
            }
        })
    }

    fn name(&self) -> &'static str {
        "tick"
    }
}

pub struct TickSourceFactory;

impl SourceFactory for TickSourceFactory {
    fn type_name(&self) -> &'static str {
        "tick"
    }

    fn create(&self, config: &ComponentConfig) -> Result<Box<dyn Source>, ConstructionError> {
        let interval = config
            .get_duration_ms("interval_ms")?
            .unwrap_or(Duration::from_millis(1000));
        if interval.is_zero() {
            return Err(ConstructionError::invalid_config(
                "interval_ms",
                "must be greater than zero",
            ));
        }
        let prefix = config.get_str("prefix")?.unwrap_or("tick").to_string();
        let limit = config.get_int("limit")?.map(|n| n.max(0) as u64);

        Ok(Box::new(TickSource {
            interval,
            prefix,
            limit,
        }))
    }
}
