use crate::OutputFormat;
use crate::util::{CliResult, RecordSummary, map_extract_error, render_record};
use clap::Args;
use clap::builder::RangedU64ValueParser;
use gleaner_core::Locator;
use gleaner_runtime::Extractor;

#[derive(Args, Debug, Clone)]
pub struct PopulateArgs {
    #[arg(value_name = "TYPE")]
    pub record: String,
    /// Populate at this locator instead of the type's root.
    #[arg(long, value_name = "LOCATOR", conflicts_with = "position")]
    pub at: Option<String>,
    /// Physical position substituted for {index} in the root locator.
    #[arg(long = "index", value_name = "N", value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub position: Option<usize>,
}

pub fn run(extractor: &Extractor, args: &PopulateArgs, format: OutputFormat) -> CliResult<String> {
    let record = match (&args.at, args.position) {
        (Some(at), _) => extractor.populate_at(&args.record, &Locator::new(at.as_str())),
        (None, Some(position)) => {
            let record_type = extractor.record_type(&args.record).map_err(map_extract_error)?;
            let root = record_type.root_locator().map_err(|err| map_extract_error(err.into()))?;
            extractor.populate_at(&args.record, &root.with_index(position))
        }
        (None, None) => extractor.populate(&args.record),
    }
    .map_err(map_extract_error)?;

    render_record(&RecordSummary::new(&record), format)
}
