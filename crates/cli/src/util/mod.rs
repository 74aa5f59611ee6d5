use crate::OutputFormat;
use anyhow::Context;
use gleaner_core::{ExtractError, FieldValue, PopulatedRecord};
use gleaner_provider_document::Document;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use std::error::Error;
use std::fmt::Write;
use std::path::Path;

pub type CliResult<T> = Result<T, Box<dyn Error>>;

pub fn map_extract_error(err: ExtractError) -> Box<dyn Error> {
    Box::new(err)
}

pub(crate) fn into_anyhow(err: Box<dyn Error>) -> anyhow::Error {
    anyhow::anyhow!("{err}")
}

pub fn load_document(path: &Path) -> anyhow::Result<Document> {
    Document::from_path(path).with_context(|| format!("loading document {}", path.display()))
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecordSummary<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub fields: &'a PopulatedRecord,
}

impl<'a> RecordSummary<'a> {
    pub fn new(record: &'a PopulatedRecord) -> Self {
        Self { record_type: record.record_type(), index: None, fields: record }
    }

    pub fn at(record: &'a PopulatedRecord, index: usize) -> Self {
        Self { index: Some(index), ..Self::new(record) }
    }
}

pub fn render_records(records: &[RecordSummary<'_>], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(render_records_text(records)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
    }
}

pub fn render_record(record: &RecordSummary<'_>, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(render_records_text(std::slice::from_ref(record))),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
    }
}

fn render_records_text(records: &[RecordSummary<'_>]) -> String {
    let mut output = String::new();
    for summary in records {
        let label = match summary.index {
            Some(index) => format!("{} #{index}", summary.record_type),
            None => summary.record_type.to_owned(),
        };
        let _ = writeln!(&mut output, "{}", colorize_record_label(&label));
        write_fields(&mut output, summary.fields, 1);
    }
    output.trim_end().to_owned()
}

fn write_fields(output: &mut String, record: &PopulatedRecord, depth: usize) {
    let indent = "    ".repeat(depth);
    for (name, value) in record.fields() {
        let colored_name = colorize_field_name(name);
        match value {
            FieldValue::Scalar(scalar) => {
                let colored_value = colorize_field_value(&scalar.to_string());
                let _ = writeln!(output, "{indent}{colored_name} = {colored_value}");
            }
            FieldValue::Handle(handle) => {
                let _ = writeln!(output, "{indent}{colored_name} = {}", colorize_handle(&handle.to_string()));
            }
            FieldValue::Nested(nested) => {
                let _ = writeln!(output, "{indent}{colored_name}: {}", colorize_record_label(nested.record_type()));
                write_fields(output, nested, depth + 1);
            }
        }
    }
}

pub(crate) fn colorize_record_label(label: &str) -> String {
    label
        .if_supports_color(Stream::Stdout, |text| text.bold().fg_rgb::<79, 166, 255>().to_string())
        .to_string()
}

pub(crate) fn colorize_field_name(name: &str) -> String {
    name.if_supports_color(Stream::Stdout, |text| text.bold().fg_rgb::<241, 149, 255>().to_string()).to_string()
}

pub(crate) fn colorize_field_value(value: &str) -> String {
    value.if_supports_color(Stream::Stdout, |text| text.fg_rgb::<136, 192, 74>().to_string()).to_string()
}

pub(crate) fn colorize_handle(handle: &str) -> String {
    handle.if_supports_color(Stream::Stdout, |text| text.dimmed().to_string()).to_string()
}

#[cfg(test)]
pub(crate) fn strip_ansi(input: &str) -> std::borrow::Cow<'_, str> {
    use std::borrow::Cow;

    if !input.contains('\u{1b}') {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars();
    loop {
        match chars.next() {
            Some('\u{1b}') => {
                for next in chars.by_ref() {
                    if next == 'm' {
                        break;
                    }
                }
            }
            Some(ch) => result.push(ch),
            None => break,
        }
    }
    Cow::Owned(result)
}
