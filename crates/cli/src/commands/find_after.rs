use crate::OutputFormat;
use crate::util::{CliResult, RecordSummary, map_extract_error, render_record};
use clap::Args;
use gleaner_runtime::Extractor;

#[derive(Args, Debug, Clone)]
pub struct FindAfterArgs {
    #[arg(value_name = "TYPE")]
    pub record: String,
    /// Logical index of the anchor record.
    #[arg(long, value_name = "N")]
    pub after: usize,
    #[arg(long, value_name = "K", default_value_t = 1)]
    pub steps: usize,
}

pub fn run(extractor: &Extractor, args: &FindAfterArgs, format: OutputFormat) -> CliResult<String> {
    let anchor = extractor.enumerate(&args.record, args.after).map_err(map_extract_error)?;
    let record = extractor.find_after(&args.record, &anchor, args.steps).map_err(map_extract_error)?;
    render_record(&RecordSummary::at(&record, args.after + args.steps), format)
}
