use crate::OutputFormat;
use crate::util::{CliResult, colorize_field_name, colorize_field_value, colorize_handle, colorize_record_label};
use clap::Args;
use gleaner_core::Locator;
use gleaner_provider_document::{DocumentTree, NodeDescription};
use serde::Serialize;
use std::fmt::Write;

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[arg(value_name = "LOCATOR")]
    pub locator: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct AttributeSummary {
    name: String,
    value: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct NodeSummary {
    handle: String,
    name: String,
    text: String,
    attributes: Vec<AttributeSummary>,
}

pub fn run(tree: &DocumentTree, args: &QueryArgs, format: OutputFormat) -> CliResult<String> {
    let locator = Locator::new(args.locator.as_str());
    let handles = tree.locate_all(&locator)?;
    let summaries = handles
        .iter()
        .map(|handle| tree.describe(handle).map(summarize_node))
        .collect::<Result<Vec<_>, _>>()?;

    let output = match format {
        OutputFormat::Text => render_query_text(&summaries),
        OutputFormat::Json => serde_json::to_string_pretty(&summaries)?,
    };
    Ok(output)
}

fn summarize_node(description: NodeDescription) -> NodeSummary {
    let mut attributes: Vec<AttributeSummary> = description
        .attributes
        .into_iter()
        .map(|(name, value)| AttributeSummary { name, value })
        .collect();
    attributes.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
    NodeSummary {
        handle: description.handle.to_string(),
        name: description.name,
        text: description.text,
        attributes,
    }
}

fn render_query_text(nodes: &[NodeSummary]) -> String {
    let mut output = String::new();
    for node in nodes {
        let label = if node.text.is_empty() {
            node.name.clone()
        } else {
            format!("{} {:?}", node.name, node.text)
        };
        let _ = writeln!(&mut output, "{} {}", colorize_record_label(&label), colorize_handle(&node.handle));
        for attribute in &node.attributes {
            let name = colorize_field_name(&format!("@{}", attribute.name));
            let value = colorize_field_value(&format!("{:?}", attribute.value));
            let _ = writeln!(&mut output, "    {name} = {value}");
        }
    }
    output.trim_end().to_owned()
}
