//! Markup serialization and the complete HTML document.
//!
//! Header and main are serialized then passed through an allow-list
//! sanitizer. The head is built from trusted data only and is emitted as is,
//! since the sanitizer would drop the `<style>` element.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::errors::ResumeError;
use crate::render::node::{DocumentNode, Node};
use crate::render::renderer::{render, render_header};
use crate::render::style::ResumeStyle;
use crate::resume::models::Resume;
use crate::resume::validation::ensure_valid;
use crate::schema::SchemaRegistry;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text content is emitted unescaped.
const RAW_TEXT_ELEMENTS: &[&str] = &["style"];

/// Serializes a node tree depth-first. Void elements get no closing tag;
/// text and attribute values are escaped.
pub fn to_markup(node: &DocumentNode) -> String {
    let mut out = String::new();
    write_element(node, &mut out);
    out
}

fn write_element(node: &DocumentNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&node.tag.as_str()) {
        return;
    }

    let raw = RAW_TEXT_ELEMENTS.contains(&node.tag.as_str());
    for child in &node.children {
        match child {
            Node::Element(element) => write_element(element, out),
            Node::Text(text) if raw => out.push_str(text),
            Node::Text(text) => out.push_str(&encode_text(text)),
        }
    }

    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

/// Allow-list sanitization of rendered body markup.
pub fn sanitize(markup: &str) -> String {
    let mut builder = ammonia::Builder::default();
    builder
        .add_tags(&["header", "main", "section"])
        .add_generic_attributes(&["class"])
        .add_tag_attributes("a", &["target"]);
    builder.clean(markup).to_string()
}

pub fn render_head(title: &str, style: &ResumeStyle) -> DocumentNode {
    DocumentNode::new("head")
        .child(DocumentNode::new("meta").attr("charset", "UTF-8"))
        .child(
            DocumentNode::new("meta")
                .attr("name", "viewport")
                .attr("content", "width=device-width, initial-scale=1.0"),
        )
        .child(DocumentNode::new("title").text(title))
        .child(DocumentNode::new("style").text(style.to_css()))
}

/// Produces the self-contained HTML document for a resume. The resume must
/// pass validation first; a rejected resume yields `ValidationFailed`.
pub fn render_html(
    resume: &Resume,
    registry: &SchemaRegistry,
    style: &ResumeStyle,
) -> Result<String, ResumeError> {
    ensure_valid(resume, registry)?;

    let head = to_markup(&render_head(&resume.title, style));
    let header = sanitize(&to_markup(&render_header(&resume.personal)));
    let main = sanitize(&to_markup(&render(resume, registry)?));

    Ok(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">{head}<body>{header}{main}</body></html>"
    ))
}
