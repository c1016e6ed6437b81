//! Human-readable rendering of a finished diff.

use std::fmt::{self, Write as _};

use colored::Colorize;
use docdiff_engine::{
    CorrespondenceMap, DocumentDiff, ItemDiff, LinearDiff, LinearTag, ListDiffInfo, Move, NodeDiff, VisualDiff,
};
use docdiff_model::{DiffCapabilities, Document, NodeId};

const PREVIEW_WIDTH: usize = 60;

pub fn render_text(result: &VisualDiff) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let old = result.old_document();
    let new = result.new_document();
    let diff = result.diff();

    render_sequence(&mut out, old, new, &diff.doc_diff, &old.body_children(), &new.body_children())?;

    for (group, info) in &diff.internal_list_diff {
        writeln!(out, "\n{} {}", "internal list".bold(), group.cyan())?;
        render_internal_group(&mut out, old, new, group, info)?;
    }

    writeln!(out)?;
    write_summary(&mut out, diff)?;
    writeln!(out)?;
    Ok(out)
}

fn write_summary(out: &mut String, diff: &DocumentDiff) -> fmt::Result {
    let summary = diff.summary();
    if summary.is_unchanged() {
        return write!(out, "{} documents are identical", "✓".green().bold());
    }
    write!(
        out,
        "{} changed, {} inserted, {} removed, {} moved",
        summary.changed.to_string().yellow(),
        summary.inserted.to_string().green(),
        summary.removed.to_string().red(),
        summary.moved,
    )?;
    if summary.internal_groups_changed > 0 {
        write!(out, ", {} internal list group(s) changed", summary.internal_groups_changed)?;
    }
    if diff.timed_out {
        write!(out, " {}", "(timed out, coarse result)".yellow())?;
    }
    Ok(())
}

/// Top-level sequence in new order, each removal placed before the first
/// surviving entry that followed it in the old document.
fn render_sequence(
    out: &mut String,
    old: &Document,
    new: &Document,
    map: &CorrespondenceMap,
    old_nodes: &[NodeId],
    new_nodes: &[NodeId],
) -> fmt::Result {
    let mut removed = map.remove.iter().copied().peekable();

    for (position, link) in map.new_to_old.iter().enumerate() {
        let new_node = new_nodes[position];
        let marker = move_marker(map.moves.get(position).copied().unwrap_or_default());

        let Some(source) = link.target() else {
            writeln!(out, "{}{} {}", "+".green().bold(), marker, preview(new, new_node).green())?;
            continue;
        };
        while let Some(old_index) = removed.next_if(|index| *index < source) {
            writeln!(out, "{}  {}", "-".red().bold(), preview(old, old_nodes[old_index]).red())?;
        }

        match map.old_to_new[source].diff() {
            None => {
                writeln!(out, " {} {}", marker, preview(new, new_node).dimmed())?;
            }
            Some(diff) => {
                write!(out, "{}{} ", "~".yellow().bold(), marker)?;
                render_node_diff(out, old, new, old_nodes[source], new_node, diff, 1)?;
            }
        }
    }

    for old_index in removed {
        writeln!(out, "{}  {}", "-".red().bold(), preview(old, old_nodes[old_index]).red())?;
    }
    Ok(())
}

fn render_node_diff(
    out: &mut String,
    old: &Document,
    new: &Document,
    old_node: NodeId,
    new_node: NodeId,
    diff: &NodeDiff,
    depth: usize,
) -> fmt::Result {
    match diff {
        NodeDiff::Leaf(leaf) => {
            match &leaf.linear_diff {
                Some(linear) => write_inline_diff(out, &old.text(old_node), &new.text(new_node), linear)?,
                None => out.push_str(&preview(new, new_node)),
            }
            if let Some(change) = &leaf.attribute_change {
                let keys: Vec<_> = change.key_changes().iter().map(|c| c.key().to_string()).collect();
                write!(out, " {}", format!("[attributes: {}]", keys.join(", ")).dimmed())?;
            }
            out.push('\n');
        }
        NodeDiff::Tree(tree) => {
            writeln!(
                out,
                "{} {}",
                new.node(new_node).type_name,
                format!("({} edit(s))", tree.script.len()).dimmed()
            )?;
        }
        NodeDiff::List(list) => {
            writeln!(out, "{}", new.node(new_node).type_name)?;
            for item in &list.info.items {
                let indent = "  ".repeat(depth);
                match &item.diff {
                    ItemDiff::Removed => {
                        let node = list.old_list.items[item.index.index_order].node;
                        writeln!(out, "{indent}{} {}", "-".red(), preview(old, node).red())?;
                    }
                    ItemDiff::Inserted => {
                        let node = list.new_list.items[item.index.index_order].node;
                        writeln!(out, "{indent}{} {}", "+".green(), preview(new, node).green())?;
                    }
                    ItemDiff::Unchanged => {
                        let node = list.new_list.items[item.index.index_order].node;
                        writeln!(out, "{indent}  {}", preview(new, node).dimmed())?;
                    }
                    ItemDiff::Changed(inner) => {
                        let node = list.new_list.items[item.index.index_order].node;
                        write!(out, "{indent}{} ", "~".yellow())?;
                        match item.source.and_then(|source| list.old_list.items.get(source)) {
                            Some(old_item) => render_node_diff(out, old, new, old_item.node, node, inner, depth + 1)?,
                            None => {
                                writeln!(out, "{}", preview(new, node))?;
                            }
                        }
                    }
                }
            }
        }
        NodeDiff::ListItem { attribute_change, inner } => {
            match inner {
                Some(inner) => {
                    render_node_diff(out, old, new, old_node, new_node, inner, depth)?;
                    // The inner render ends with a newline; drop it to append the tag.
                    out.pop();
                }
                None => out.push_str(&preview(new, new_node)),
            }
            let mut tags = Vec::new();
            if attribute_change.list_node.is_some() {
                tags.push("list style");
            }
            if attribute_change.list_item.is_some() {
                tags.push("item");
            }
            if attribute_change.depth.is_some() {
                tags.push("depth");
            }
            writeln!(out, " {}", format!("[{}]", tags.join(", ")).dimmed())?;
        }
    }
    Ok(())
}

fn render_internal_group(
    out: &mut String,
    old: &Document,
    new: &Document,
    group: &str,
    info: &ListDiffInfo,
) -> fmt::Result {
    for item in &info.items {
        let Some(node_index) = item.index.node_index else {
            continue;
        };
        let (doc, sign) = match &item.diff {
            ItemDiff::Removed => (old, "-".red()),
            ItemDiff::Inserted => (new, "+".green()),
            ItemDiff::Changed(_) => (new, "~".yellow()),
            ItemDiff::Unchanged => (new, " ".normal()),
        };
        let key = doc
            .internal_list()
            .group(group)
            .and_then(|g| g.key_for(node_index))
            .unwrap_or("?");
        let text = doc
            .internal_items()
            .get(node_index)
            .map(|node| preview(doc, *node))
            .unwrap_or_default();
        writeln!(out, "{sign} [{}] {}", key.cyan(), text)?;
    }
    Ok(())
}

fn move_marker(movement: Move) -> &'static str {
    match movement {
        Move::Unmoved => " ",
        Move::Up => "↑",
        Move::Down => "↓",
    }
}

/// Old and new text merged, deletions struck through in red and insertions
/// in green.
fn write_inline_diff(out: &mut String, old_text: &str, new_text: &str, diff: &LinearDiff) -> fmt::Result {
    let old_chars: Vec<char> = old_text.chars().collect();
    let new_chars: Vec<char> = new_text.chars().collect();
    for op in &diff.ops {
        match op.tag {
            LinearTag::Equal => out.extend(&new_chars[op.new_range.clone()]),
            LinearTag::Delete => {
                let run: String = old_chars[op.old_range.clone()].iter().collect();
                write!(out, "{}", run.red().strikethrough())?;
            }
            LinearTag::Insert => {
                let run: String = new_chars[op.new_range.clone()].iter().collect();
                write!(out, "{}", run.green())?;
            }
        }
    }
    Ok(())
}

/// Short one-line rendering of a node: its text, or the texts of its
/// content-bearing descendants.
fn preview(doc: &Document, node: NodeId) -> String {
    let mut texts = Vec::new();
    collect_text(doc, node, &mut texts);
    let label = &doc.node(node).type_name;
    let body = if texts.is_empty() {
        format!("<{label}>")
    } else {
        texts.join(" / ")
    };
    truncate(&body, PREVIEW_WIDTH)
}

fn collect_text(doc: &Document, node: NodeId, texts: &mut Vec<String>) {
    if doc.node(node).can_contain_content() {
        texts.push(doc.text(node));
        return;
    }
    for child in doc.children(node) {
        collect_text(doc, *child, texts);
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
