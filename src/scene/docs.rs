//! Documentation of the fused scene types.
//!
//! Visual descriptions are numpy-style text: a summary, then a `Parameters`
//! heading (optionally underlined with dashes) followed by `name : type`
//! entries whose descriptions are indented one level deeper. The fused type
//! documents two more parameters, `parent` and `name`, and one sentence
//! saying which visual it wraps.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;
use thiserror::Error;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w").expect("valid regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Parameters\s*").expect("valid regex"));
static ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[a-zA-Z0-9_]+\s*:\s*\S+").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocError {
    /// Indentation cannot be compared once tabs are involved.
    #[error("line {line}: tab in leading whitespace")]
    TabIndentation { line: usize },
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_underline(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c == '-')
}

/// Indentation for a synthesized parameter block: the body indentation of
/// the description, ignoring its first line.
fn body_indent(lines: &[String]) -> usize {
    lines
        .iter()
        .skip(1)
        .filter(|l| !is_blank(l))
        .map(|l| indent_of(l))
        .min()
        .or_else(|| lines.first().map(|l| indent_of(l)))
        .unwrap_or(0)
}

/// Inserts the fusion sentence after the summary and the `parent` and `name`
/// entries after the last parameter entry of `description`.
///
/// The new entries take the indentation of the existing entries, or of the
/// heading when the list is empty.
///
/// Missing `Parameters` headings are synthesized at the end. Every other line
/// keeps its position and indentation.
pub fn merge_description(description: &str, visual_name: &str) -> Result<String, DocError> {
    let skipped = description
        .lines()
        .take_while(|l| is_blank(l))
        .count();
    let mut lines: Vec<String> = description
        .lines()
        .skip(skipped)
        .map(str::to_owned)
        .collect();

    if let Some(i) = lines
        .iter()
        .position(|l| l[..indent_of(l)].contains('\t'))
    {
        return Err(DocError::TabIndentation {
            line: skipped + i + 1,
        });
    }

    let mut first_blank = None;
    let mut heading: Option<(usize, usize)> = None;
    let mut entry_indent = None;
    let mut param_end = None;
    for (i, line) in lines.iter().enumerate() {
        if WORD.is_match(line) {
            let indent = indent_of(line);
            match heading {
                Some((_, heading_indent)) => {
                    match entry_indent {
                        // the first entry fixes the indentation of the list
                        None if indent >= heading_indent && ENTRY.is_match(line) => {
                            entry_indent = Some(indent);
                        }
                        None => break,
                        Some(list) if indent < list || (indent == list && !ENTRY.is_match(line)) => {
                            break;
                        }
                        Some(_) => {}
                    }
                    param_end = Some(i + 1);
                }
                None if HEADING.is_match(line) => {
                    heading = Some((i, indent));
                    first_blank.get_or_insert(i);
                }
                None => {}
            }
        } else if first_blank.is_none() && is_blank(line) {
            first_blank = Some(i);
        }
    }

    let summary_end = first_blank.unwrap_or(lines.len());
    let (indent, param_end) = match heading {
        Some((at, indent)) => {
            let end = param_end.unwrap_or_else(|| {
                if lines.get(at + 1).is_some_and(|l| is_underline(l)) {
                    at + 2
                } else {
                    at + 1
                }
            });
            (indent, end)
        }
        None => {
            let indent = body_indent(&lines);
            let pad = " ".repeat(indent);
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("{}Parameters", pad));
            lines.push(format!("{}----------", pad));
            (indent, lines.len())
        }
    };

    let pad = " ".repeat(entry_indent.unwrap_or(indent));
    let entries = [
        format!("{pad}parent : Node"),
        format!("{pad}    The parent node to assign to this node (optional)."),
        format!("{pad}name : string"),
        format!("{pad}    A name for this node, used primarily for debugging"),
        format!("{pad}    (optional)."),
    ];
    lines.splice(param_end..param_end, entries);

    if summary_end > 0 {
        let pad = " ".repeat(indent);
        let mut sentence = vec![
            String::new(),
            format!(
                "{pad}This type fuses visuals::{visual_name} with scene::Node, allowing the \
                 visual to be placed inside a scenegraph."
            ),
        ];
        if lines.get(summary_end).is_some_and(|l| !is_blank(l)) {
            sentence.push(String::new());
        }
        lines.splice(summary_end..summary_end, sentence);
    }

    Ok(lines.join("\n"))
}

/// [`merge_description`], falling back to the unmodified description.
pub fn fused_description(description: &str, visual_name: &str) -> String {
    match merge_description(description, visual_name) {
        Ok(merged) => merged,
        Err(err) => {
            warn!("keeping the description of {} as is: {}", visual_name, err);
            description.to_owned()
        }
    }
}
