use crate::Result;
use crate::graph::{AttributeValue, DependencyGraph};
use core::fmt::Write;
use std::borrow::Cow;

const KEYWORDS: [&str; 6] = ["node", "edge", "graph", "digraph", "subgraph", "strict"];

pub fn generate<W: Write>(graph: &DependencyGraph, name: &str, writer: &mut W) -> Result<()> {
    writeln!(writer, "digraph {} {{", quote(name))?;

    for node in graph.nodes() {
        write!(writer, "  {}", quote(&node.name))?;
        if !node.attributes.is_empty() {
            write!(writer, " [")?;
            for (i, (key, value)) in node.attributes.iter().enumerate() {
                if i > 0 {
                    write!(writer, ", ")?;
                }
                write!(writer, "{}={}", id(key), format_value(value))?;
            }
            write!(writer, "]")?;
        }
        writeln!(writer, ";")?;
    }

    for edge in graph.edges() {
        let (Some(source), Some(target)) = (graph.node(edge.source), graph.node(edge.target)) else {
            continue;
        };

        writeln!(
            writer,
            "  {} -> {} [dep_type={}];",
            quote(&source.name),
            quote(&target.name),
            quote(&edge.kind.to_string())
        )?;
    }

    writeln!(writer, "}}")?;
    Ok(())
}

/// Escape text for use inside a double-quoted DOT string.
fn escape(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn quote(input: &str) -> String {
    format!("\"{}\"", escape(input))
}

/// An identifier is written bare when DOT accepts it as one, and quoted otherwise.
fn id(input: &str) -> Cow<'_, str> {
    let mut chars = input.chars();
    let is_identifier = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(input));

    if is_identifier {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(quote(input))
    }
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Integer(i) => i.to_string(),
        AttributeValue::Float(x) if x.is_finite() => x.to_string(),
        AttributeValue::Float(x) => quote(&x.to_string()),
        AttributeValue::Text(s) => quote(s),
        AttributeValue::Boolean(b) => quote(&b.to_string()),
    }
}
