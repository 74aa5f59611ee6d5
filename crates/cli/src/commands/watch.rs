use crate::util::{CliResult, RecordSummary, load_document, map_extract_error, render_records};
use crate::{OutputFormat, Session};
use clap::Args;
use gleaner_runtime::FeedWatcher;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    #[arg(value_name = "TYPE")]
    pub record: String,
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub interval_ms: u64,
    /// Stop after this many polls; runs until interrupted when absent.
    #[arg(long, value_name = "T")]
    pub ticks: Option<usize>,
}

pub fn run<W: Write>(session: &Session, args: &WatchArgs, format: OutputFormat, writer: &mut W) -> CliResult<()> {
    watch_with_sleep(session, args, format, writer, std::thread::sleep)
}

/// Polls the feed once per tick. Every tick after the first reloads the
/// document from disk, which counts as a navigation.
pub(crate) fn watch_with_sleep<W, S>(
    session: &Session,
    args: &WatchArgs,
    format: OutputFormat,
    writer: &mut W,
    mut sleep: S,
) -> CliResult<()>
where
    W: Write,
    S: FnMut(Duration),
{
    let limit = args.ticks.unwrap_or(usize::MAX);
    let interval = Duration::from_millis(args.interval_ms);
    let mut watcher = FeedWatcher::new(args.record.as_str());

    for tick in 0..limit {
        if tick > 0 {
            sleep(interval);
            session.tree.navigate(load_document(&session.document)?);
        }
        let fresh = watcher.poll(&session.extractor).map_err(map_extract_error)?;
        debug!(tick, new = fresh.len(), "watch tick");
        if fresh.is_empty() {
            continue;
        }
        let summaries: Vec<_> = fresh.iter().map(RecordSummary::new).collect();
        let rendered = render_records(&summaries, format)?;
        writeln!(writer, "{rendered}").map_err(|err| format!("failed to write output: {err}"))?;
    }
    Ok(())
}
