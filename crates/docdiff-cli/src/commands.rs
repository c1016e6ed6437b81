use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use docdiff_engine::{DiffConfig, VisualDiff};
use docdiff_model::{Document, NodeId};
use tracing::{debug, info};

use crate::cli::{CheckArgs, Cli, Command, ConfigArgs, DiffArgs, OutputFormat};
use crate::render;

pub fn run_command(cli: Cli) -> Result<()> {
    let output = match cli.command {
        Command::Diff(args) => cmd_diff(&args, cli.format)?,
        Command::Check(args) => cmd_check(&args, cli.format)?,
        Command::Config(args) => cmd_config(&args)?,
    };
    print!("{output}");
    Ok(())
}

fn load_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Document::from_json(&text).with_context(|| format!("failed to parse document {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<DiffConfig> {
    let Some(path) = path else {
        return Ok(DiffConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid diff config {}", path.display()))
}

/// Resolve a `--*-child` index to the node id of that top-level child.
fn body_child(doc: &Document, index: Option<usize>, flag: &str) -> Result<Option<NodeId>> {
    let Some(index) = index else {
        return Ok(None);
    };
    let children = doc.body_children();
    match children.get(index) {
        Some(id) => Ok(Some(*id)),
        None => bail!("{flag} {index} out of range: document has {} top-level children", children.len()),
    }
}

fn cmd_diff(args: &DiffArgs, format: OutputFormat) -> Result<String> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(ms) = args.timeout_ms {
        config.timeout = Duration::from_millis(ms);
    }
    debug!(?config, "diff configuration");

    let old = load_document(&args.old)?;
    let new = load_document(&args.new)?;
    let old_node = body_child(&old, args.old_child, "--old-child")?;
    let new_node = body_child(&new, args.new_child, "--new-child")?;

    let result = VisualDiff::between_subtrees(&old, old_node, &new, new_node, &config)?;
    info!(timed_out = result.timed_out(), "diff finished");

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result.diff())? + "\n"),
        OutputFormat::Text => Ok(render::render_text(&result)?),
    }
}

fn cmd_check(args: &CheckArgs, format: OutputFormat) -> Result<String> {
    let doc = load_document(&args.path)?;
    let groups: BTreeMap<String, usize> = doc
        .internal_list()
        .groups()
        .iter()
        .map(|(name, group)| (name.clone(), group.keys.len()))
        .collect();

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "nodes": doc.node_count(),
                "topLevel": doc.body_children().len(),
                "length": doc.node(doc.root()).length,
                "internalGroups": groups,
            });
            Ok(serde_json::to_string_pretty(&report)? + "\n")
        }
        OutputFormat::Text => {
            let mut out = format!("{} {}\n", "✓".green().bold(), args.path.display());
            out += &format!("  nodes:      {}\n", doc.node_count());
            out += &format!("  top-level:  {}\n", doc.body_children().len());
            out += &format!("  length:     {}\n", doc.node(doc.root()).length);
            for (name, count) in &groups {
                let label = if name.is_empty() { "(default)" } else { name.as_str() };
                out += &format!("  {} {} item(s)\n", format!("{label}:").cyan(), count);
            }
            Ok(out)
        }
    }
}

fn cmd_config(args: &ConfigArgs) -> Result<String> {
    let config = load_config(args.config.as_deref())?;
    toml::to_string_pretty(&config).context("failed to serialize config")
}
