//! Built-in filters

mod digest;
mod grep;
mod noop;
mod split;

pub use digest::{DigestFilter, DigestFilterFactory};
pub use grep::{GrepFilter, GrepFilterFactory};
pub use noop::{NoopFilter, NoopFilterFactory};
pub use split::{SplitFilter, SplitFilterFactory};
