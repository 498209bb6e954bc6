//! XML element tree and serialization
//!
//! Writers build an [`Element`] tree and hand it to [`to_document_string`]. The serializer
//! indents nested elements two spaces per level and keeps text-only elements on one line, so
//! text content (tokens, raw text) is emitted byte for byte without added whitespace.
//!
//! Reading goes through roxmltree; the helpers at the bottom of this module wrap the attribute
//! lookups both readers share.

use crate::error::{ModelError, Result};

pub const NS_XML: &str = "http://www.w3.org/XML/1998/namespace";
pub const NS_XLINK: &str = "http://www.w3.org/1999/xlink";

/// An owned XML element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builder-style attribute
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_attr(key, value);
        self
    }

    /// Builder-style attribute, skipped when the value is `None`
    pub fn attr_opt<S: AsRef<str>>(mut self, key: impl Into<String>, value: Option<S>) -> Self {
        if let Some(value) = value {
            self.push_attr(key, value.as_ref());
        }
        self
    }

    pub fn push_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((key.into(), value.into()));
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(mut self, element: Element) -> Self {
        self.push(element);
        self
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child elements in order (text nodes skipped)
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }
}

/// Serializes an element tree with indentation
struct XmlSerializer {
    output: String,
    indent_level: usize,
}

impl XmlSerializer {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
        }
    }

    fn indent(&self) -> String {
        "  ".repeat(self.indent_level)
    }

    fn open_tag(&mut self, element: &Element) {
        self.output.push('<');
        self.output.push_str(&element.name);
        for (key, value) in &element.attributes {
            self.output.push(' ');
            self.output.push_str(key);
            self.output.push_str("=\"");
            self.output.push_str(&escape_attribute(value));
            self.output.push('"');
        }
    }

    fn serialize_element(&mut self, element: &Element) {
        self.output.push_str(&self.indent());
        self.open_tag(element);

        if element.children.is_empty() {
            self.output.push_str("/>\n");
            return;
        }

        let text_only = element
            .children
            .iter()
            .all(|child| matches!(child, Node::Text(_)));
        if text_only {
            self.output.push('>');
            for child in &element.children {
                if let Node::Text(text) = child {
                    self.output.push_str(&escape_xml(text));
                }
            }
            self.output.push_str(&format!("</{}>\n", element.name));
            return;
        }

        self.output.push_str(">\n");
        self.indent_level += 1;
        for child in &element.children {
            match child {
                Node::Element(child) => self.serialize_element(child),
                Node::Text(text) => {
                    self.output.push_str(&self.indent());
                    self.output.push_str(&escape_xml(text));
                    self.output.push('\n');
                }
            }
        }
        self.indent_level -= 1;
        self.output.push_str(&self.indent());
        self.output.push_str(&format!("</{}>\n", element.name));
    }
}

/// Serialize an element tree as a standalone XML document
pub fn to_document_string(root: &Element) -> String {
    let mut serializer = XmlSerializer::new();
    serializer
        .output
        .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    serializer.serialize_element(root);
    serializer.output
}

/// Escape XML special characters in text content
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value; newlines and tabs are kept as character references so they
/// survive attribute-value normalization on the way back in
pub fn escape_attribute(text: &str) -> String {
    escape_xml(text)
        .replace('"', "&quot;")
        .replace('\n', "&#10;")
        .replace('\t', "&#9;")
}

pub(crate) fn parse_document(source: &str) -> Result<roxmltree::Document<'_>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    Ok(roxmltree::Document::parse_with_options(source, options)?)
}

pub(crate) fn local_name<'a>(node: roxmltree::Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

pub(crate) fn child_elements<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

pub(crate) fn first_child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    child_elements(node).find(|child| local_name(*child) == name)
}

pub(crate) fn attr(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

pub(crate) fn required_attr(node: roxmltree::Node<'_, '_>, name: &str) -> Result<String> {
    node.attribute(name)
        .map(str::to_string)
        .ok_or_else(|| ModelError::missing_attribute(local_name(node), name))
}

pub(crate) fn xml_id(node: roxmltree::Node<'_, '_>) -> Option<String> {
    node.attribute((NS_XML, "id")).map(str::to_string)
}

pub(crate) fn usize_attr(node: roxmltree::Node<'_, '_>, name: &str) -> Result<Option<usize>> {
    match node.attribute(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ModelError::invalid_attribute(local_name(node), name, value)),
    }
}

/// Concatenated text of all descendant text nodes
pub(crate) fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_empty_element() {
        let root = Element::new("wf").attr("id", "w1");
        let result = to_document_string(&root);
        assert!(result.ends_with("<wf id=\"w1\"/>\n"));
    }

    #[test]
    fn test_text_only_elements_stay_inline() {
        let root = Element::new("text").child(Element::new("wf").attr("id", "w1").text("Boeing"));
        let result = to_document_string(&root);
        let line = result.lines().nth(2).unwrap_or_default().trim();
        insta::assert_snapshot!(line, @r#"<wf id="w1">Boeing</wf>"#);
    }

    #[test]
    fn test_nested_elements_are_indented() {
        let root = Element::new("a").child(Element::new("b").child(Element::new("c")));
        let result = to_document_string(&root);
        assert!(result.contains("<a>\n  <b>\n    <c/>\n  </b>\n</a>\n"));
    }

    #[test]
    fn test_xml_escaping() {
        let root = Element::new("raw").text("AT&T <rocks>");
        let result = to_document_string(&root);
        assert!(result.contains("<raw>AT&amp;T &lt;rocks&gt;</raw>"));
    }

    #[rstest::rstest]
    #[case("plain", "plain")]
    #[case("a & b", "a &amp; b")]
    #[case("<w>", "&lt;w&gt;")]
    #[case("\"q\"", "\"q\"")]
    fn test_escape_xml_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_xml(input), expected);
    }

    #[test]
    fn test_attribute_escaping() {
        let root = Element::new("meta").attr("value", "say \"hi\"\nnow");
        let result = to_document_string(&root);
        assert!(result.contains("value=\"say &quot;hi&quot;&#10;now\""));
    }

    #[test]
    fn test_attr_opt_skips_none() {
        let root = Element::new("term")
            .attr_opt("lemma", Some("lose"))
            .attr_opt::<&str>("pos", None);
        assert_eq!(root.attribute("lemma"), Some("lose"));
        assert_eq!(root.attribute("pos"), None);
    }

    #[test]
    fn test_written_text_parses_back() {
        let root = Element::new("raw").text("  spaced\n\ntext ");
        let written = to_document_string(&root);
        let doc = parse_document(&written).expect("valid xml");
        assert_eq!(text_content(doc.root_element()), "  spaced\n\ntext ");
    }
}
