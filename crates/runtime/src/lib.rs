mod extractor;
mod populate;
mod scan;
mod typed;
mod wait;
mod watch;

#[cfg(test)]
pub(crate) mod test_support;

pub use extractor::Extractor;
pub use scan::{Probe, Scan};
pub use watch::FeedWatcher;
