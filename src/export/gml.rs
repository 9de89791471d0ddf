use crate::Result;
use crate::graph::{AttributeValue, DependencyGraph};
use core::fmt::Write;
use std::collections::HashSet;

const LOG_TARGET: &str = "    export";

/// Keys the writer emits itself for every node.
const NODE_KEYS: [&str; 2] = ["id", "label"];

pub fn generate<W: Write>(graph: &DependencyGraph, name: &str, writer: &mut W) -> Result<()> {
    writeln!(writer, "graph [")?;
    writeln!(writer, "  directed 1")?;
    if graph.has_parallel_edges() {
        writeln!(writer, "  multigraph 1")?;
    }
    writeln!(writer, "  name {}", string(name))?;

    for (index, node) in graph.nodes().enumerate() {
        writeln!(writer, "  node [")?;
        writeln!(writer, "    id {index}")?;
        writeln!(writer, "    label {}", string(&node.name))?;

        let mut used: HashSet<String> = NODE_KEYS.iter().map(ToString::to_string).collect();
        for (key, value) in &node.attributes {
            let key = sanitize_key(key);
            if !used.insert(key.clone()) {
                log::debug!(target: LOG_TARGET, "Dropping attribute '{key}' of '{}', its GML key is already taken", node.name);
                continue;
            }
            writeln!(writer, "    {key} {}", format_value(value))?;
        }

        writeln!(writer, "  ]")?;
    }

    for edge in graph.edges() {
        writeln!(writer, "  edge [")?;
        writeln!(writer, "    source {}", edge.source)?;
        writeln!(writer, "    target {}", edge.target)?;
        writeln!(writer, "    dep_type {}", string(&edge.kind.to_string()))?;
        writeln!(writer, "  ]")?;
    }

    writeln!(writer, "]")?;
    Ok(())
}

/// Turn an attribute name into a valid GML key that does not clash with the structural keys.
fn sanitize_key(key: &str) -> String {
    let mut result: String = key.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect();

    if !result.starts_with(|c: char| c.is_ascii_alphabetic()) || NODE_KEYS.contains(&result.as_str()) {
        result.insert_str(0, "attr_");
    }

    result
}

/// Quote a string, encoding quotes, ampersands, and anything outside printable ASCII as character references.
fn string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        if c == '"' || c == '&' || !(' '..='~').contains(&c) {
            let _ = write!(result, "&#{};", u32::from(c));
        } else {
            result.push(c);
        }
    }
    result.push('"');
    result
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Text(s) => string(s),
        AttributeValue::Integer(i) if i32::try_from(*i).is_ok() => i.to_string(),
        AttributeValue::Integer(i) => string(&i.to_string()),
        AttributeValue::Float(x) => float(*x),
        AttributeValue::Boolean(b) => u8::from(*b).to_string(),
    }
}

/// GML reals always carry a decimal point, and the infinities need an explicit sign.
fn float(x: f64) -> String {
    if x.is_nan() {
        return "NAN".to_string();
    }
    if x.is_infinite() {
        return (if x > 0.0 { "+INF" } else { "-INF" }).to_string();
    }

    let text = format!("{x:?}").to_uppercase();
    match text.find('E') {
        Some(pos) if !text[..pos].contains('.') => format!("{}.{}", &text[..pos], &text[pos..]),
        _ => text,
    }
}
