//! Intermediate document tree produced by the renderer and consumed by the
//! serializer. Tests assert on this shape rather than on markup strings.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(DocumentNode),
    Text(String),
}

impl From<DocumentNode> for Node {
    fn from(node: DocumentNode) -> Self {
        Node::Element(node)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    pub tag: String,
    /// Attributes in emission order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl DocumentNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.push((name.to_string(), value.into()));
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &DocumentNode> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(node) => Some(node),
            Node::Text(_) => None,
        })
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(self, &mut text);
        text
    }

    /// All descendants (depth-first, pre-order) matching `predicate`.
    pub fn find_all<'a, P>(&'a self, predicate: P) -> Vec<&'a DocumentNode>
    where
        P: Fn(&DocumentNode) -> bool,
    {
        let mut found = Vec::new();
        collect_matching(self, &predicate, &mut found);
        found
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<&DocumentNode> {
        self.find_all(|node| node.tag == tag)
    }

    pub fn find_by_class(&self, class: &str) -> Vec<&DocumentNode> {
        self.find_all(|node| node.has_class(class))
    }
}

fn collect_text(node: &DocumentNode, out: &mut String) {
    for child in &node.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(element, out),
        }
    }
}

fn collect_matching<'a, P>(node: &'a DocumentNode, predicate: &P, out: &mut Vec<&'a DocumentNode>)
where
    P: Fn(&DocumentNode) -> bool,
{
    for child in node.elements() {
        if predicate(child) {
            out.push(child);
        }
        collect_matching(child, predicate, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_queries() {
        let node = DocumentNode::new("div")
            .class("section-item")
            .child(DocumentNode::new("p").class("title").text("Acme"))
            .child(
                DocumentNode::new("div")
                    .class("project-links")
                    .child(DocumentNode::new("a").attr("href", "https://x.dev").text("Link")),
            );

        assert!(node.has_class("section-item"));
        assert_eq!(node.text_content(), "AcmeLink");
        assert_eq!(node.find_by_tag("a")[0].attribute("href"), Some("https://x.dev"));
        assert_eq!(node.find_by_class("title").len(), 1);
        assert_eq!(node.elements().count(), 2);
    }
}
