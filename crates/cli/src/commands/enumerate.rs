use crate::OutputFormat;
use crate::util::{CliResult, RecordSummary, map_extract_error, render_record, render_records};
use clap::Args;
use gleaner_core::PopulatedRecord;
use gleaner_runtime::{Extractor, Probe};
use tracing::debug;

#[derive(Args, Debug, Clone)]
pub struct EnumerateArgs {
    #[arg(value_name = "TYPE")]
    pub record: String,
    /// Logical index (0-based) among the present records.
    #[arg(long, value_name = "N", default_value_t = 0, conflicts_with = "all")]
    pub index: usize,
    /// Print every record until the lookahead runs out.
    #[arg(long)]
    pub all: bool,
}

pub fn run(extractor: &Extractor, args: &EnumerateArgs, format: OutputFormat) -> CliResult<String> {
    if args.all {
        let records = collect_all(extractor, &args.record)?;
        let summaries: Vec<_> =
            records.iter().enumerate().map(|(index, record)| RecordSummary::at(record, index)).collect();
        return render_records(&summaries, format);
    }
    let record = extractor.enumerate(&args.record, args.index).map_err(map_extract_error)?;
    render_record(&RecordSummary::at(&record, args.index), format)
}

/// Every present record, stopping after `lookahead` consecutive absent positions.
fn collect_all(extractor: &Extractor, record: &str) -> CliResult<Vec<PopulatedRecord>> {
    let lookahead = extractor.settings().lookahead;
    let mut records = Vec::new();
    let mut misses = 0;
    for probe in extractor.scan(record).map_err(map_extract_error)? {
        match probe.map_err(map_extract_error)? {
            Probe::Hit { record, .. } => {
                misses = 0;
                records.push(record);
            }
            Probe::Absent { position } => {
                misses += 1;
                if misses >= lookahead {
                    debug!(record, position, found = records.len(), "enumeration finished");
                    break;
                }
            }
        }
    }
    Ok(records)
}
