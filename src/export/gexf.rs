use crate::Result;
use crate::graph::{AttributeValue, DependencyGraph};
use chrono::NaiveDate;
use core::fmt::Write;
use std::collections::HashMap;
use strum::Display;

const NAMESPACE: &str = "http://www.gexf.net/1.2draft";
const SCHEMA_LOCATION: &str = "http://www.gexf.net/1.2draft http://www.gexf.net/1.2draft/gexf.xsd";
const EDGE_KIND_TITLE: &str = "dep_type";

/// Attribute titles holding comma-joined lists that Gephi can split.
const LIST_TITLES: [&str; 1] = ["maintainers"];

/// Declared value type of a GEXF attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AttributeType {
    String,
    Long,
    Double,
    Boolean,
    ListString,
}

impl AttributeType {
    const fn of(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Text(_) => Self::String,
            AttributeValue::Integer(_) => Self::Long,
            AttributeValue::Float(_) => Self::Double,
            AttributeValue::Boolean(_) => Self::Boolean,
        }
    }
}

/// One entry of an `<attributes>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecl {
    pub id: usize,
    pub title: String,
    pub kind: AttributeType,
}

/// The attribute declarations of a GEXF document, per element class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    pub node: Vec<AttributeDecl>,
    pub edge: Vec<AttributeDecl>,
}

impl Declarations {
    /// Declare every attribute that appears in the graph.
    ///
    /// Titles are declared in order of first appearance. A title whose values
    /// have different types across nodes is declared as a string.
    #[must_use]
    pub fn for_graph(graph: &DependencyGraph) -> Self {
        let mut node: Vec<AttributeDecl> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for package in graph.nodes() {
            for (title, value) in &package.attributes {
                let kind = AttributeType::of(value);
                if let Some(&pos) = positions.get(title.as_str()) {
                    if node[pos].kind != kind {
                        node[pos].kind = AttributeType::String;
                    }
                } else {
                    let _ = positions.insert(title.as_str(), node.len());
                    node.push(AttributeDecl {
                        id: node.len(),
                        title: title.clone(),
                        kind,
                    });
                }
            }
        }

        let edge = vec![AttributeDecl {
            id: 0,
            title: EDGE_KIND_TITLE.to_string(),
            kind: AttributeType::String,
        }];

        Self { node, edge }
    }

    fn node_id(&self, title: &str) -> Option<usize> {
        self.node.iter().find(|decl| decl.title == title).map(|decl| decl.id)
    }
}

/// Redeclare list-valued string attributes as `liststring`.
///
/// Only the declarations change; node values are already comma-joined.
pub fn promote_list_attributes(declarations: &mut Declarations) {
    for decl in declarations.node.iter_mut().chain(declarations.edge.iter_mut()) {
        if LIST_TITLES.contains(&decl.title.as_str()) && decl.kind == AttributeType::String {
            decl.kind = AttributeType::ListString;
        }
    }
}

pub fn generate<W: Write>(graph: &DependencyGraph, name: &str, modified: NaiveDate, writer: &mut W) -> Result<()> {
    let mut declarations = Declarations::for_graph(graph);
    promote_list_attributes(&mut declarations);
    write_document(graph, &declarations, name, modified, writer)
}

fn write_document<W: Write>(
    graph: &DependencyGraph,
    declarations: &Declarations,
    name: &str,
    modified: NaiveDate,
    writer: &mut W,
) -> Result<()> {
    writeln!(writer, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
    writeln!(
        writer,
        "<gexf xmlns=\"{NAMESPACE}\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:schemaLocation=\"{SCHEMA_LOCATION}\" version=\"1.2\">"
    )?;
    writeln!(writer, "  <meta lastmodifieddate=\"{}\">", modified.format("%Y-%m-%d"))?;
    writeln!(writer, "    <creator>{} {}</creator>", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    writeln!(writer, "  </meta>")?;
    writeln!(writer, "  <graph defaultedgetype=\"directed\" mode=\"static\" name=\"{}\">", xml_escape(name))?;

    write_declarations(writer, "edge", &declarations.edge)?;
    write_declarations(writer, "node", &declarations.node)?;

    writeln!(writer, "    <nodes>")?;
    for node in graph.nodes() {
        let name = xml_escape(&node.name);
        if node.attributes.is_empty() {
            writeln!(writer, "      <node id=\"{name}\" label=\"{name}\" />")?;
            continue;
        }

        writeln!(writer, "      <node id=\"{name}\" label=\"{name}\">")?;
        writeln!(writer, "        <attvalues>")?;
        for (title, value) in &node.attributes {
            if let Some(id) = declarations.node_id(title) {
                writeln!(writer, "          <attvalue for=\"{id}\" value=\"{}\" />", xml_escape(&format_value(value)))?;
            }
        }
        writeln!(writer, "        </attvalues>")?;
        writeln!(writer, "      </node>")?;
    }
    writeln!(writer, "    </nodes>")?;

    writeln!(writer, "    <edges>")?;
    for (index, edge) in graph.edges().enumerate() {
        let (Some(source), Some(target)) = (graph.node(edge.source), graph.node(edge.target)) else {
            continue;
        };

        writeln!(
            writer,
            "      <edge source=\"{}\" target=\"{}\" id=\"{index}\">",
            xml_escape(&source.name),
            xml_escape(&target.name)
        )?;
        writeln!(writer, "        <attvalues>")?;
        writeln!(writer, "          <attvalue for=\"0\" value=\"{}\" />", edge.kind)?;
        writeln!(writer, "        </attvalues>")?;
        writeln!(writer, "      </edge>")?;
    }
    writeln!(writer, "    </edges>")?;

    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</gexf>")?;
    Ok(())
}

fn write_declarations<W: Write>(writer: &mut W, class: &str, declarations: &[AttributeDecl]) -> Result<()> {
    if declarations.is_empty() {
        return Ok(());
    }

    writeln!(writer, "    <attributes mode=\"static\" class=\"{class}\">")?;
    for decl in declarations {
        writeln!(
            writer,
            "      <attribute id=\"{}\" title=\"{}\" type=\"{}\" />",
            decl.id,
            xml_escape(&decl.title),
            decl.kind
        )?;
    }
    writeln!(writer, "    </attributes>")?;
    Ok(())
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Float(x) if x.is_nan() => "NaN".to_string(),
        AttributeValue::Float(x) if x.is_infinite() => (if *x > 0.0 { "INF" } else { "-INF" }).to_string(),
        other => other.to_string(),
    }
}

fn xml_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            '\n' => result.push_str("&#10;"),
            '\t' => result.push_str("&#9;"),
            '\r' => result.push_str("&#13;"),
            c if !is_xml_char(c) => result.push(char::REPLACEMENT_CHARACTER),
            _ => result.push(c),
        }
    }
    result
}

/// Characters allowed in an XML 1.0 document. `char` already excludes surrogates.
const fn is_xml_char(c: char) -> bool {
    !matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}
