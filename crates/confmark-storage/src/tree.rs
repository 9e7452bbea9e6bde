//! Arena-backed mutable tree for storage-format markup.
//!
//! Text follows the ElementTree model: [`Element::text`] holds the text before
//! the first child and [`Element::tail`] holds the text that follows the
//! element inside its parent. Nodes are addressed by [`NodeId`] handles that are
//! only meaningful for the [`Document`] that created them.

use crate::error::TreeError;

/// Handle to an element inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Element attributes in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Create an empty attribute list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an attribute value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Iterate over `(name, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that every `(name, value)` pair in `expected` is present.
    fn matches(&self, expected: &[(&str, &str)]) -> bool {
        expected
            .iter()
            .all(|(name, value)| self.get(name) == Some(*value))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (name, value) in iter {
            attrs.set(name, value);
        }
        attrs
    }
}

/// Element stored in a [`Document`].
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Tag name, including its namespace prefix (`ac:link`).
    pub tag: String,
    /// Attributes in document order.
    pub attrs: Attributes,
    /// Text before the first child.
    pub text: String,
    /// Text after the element, inside its parent.
    pub tail: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Element {
    fn new(tag: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            tag: tag.into(),
            attrs,
            ..Default::default()
        }
    }

    /// Child elements in document order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent element, `None` for the root and for detached nodes.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Mutable markup tree.
///
/// Replacing a node detaches it (and its subtree) from the root. Detached
/// nodes stay in the arena, so handles collected before a mutation remain
/// valid and can be checked with [`Document::is_attached`].
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
}

impl Document {
    /// Create a document with an empty root element.
    #[must_use]
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Element::new(root_tag, Attributes::new())],
            root: NodeId(0),
        }
    }

    /// Root element handle.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get an element by handle.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    /// Get an element by handle, failing for handles this document never issued.
    pub fn element(&self, id: NodeId) -> Result<&Element, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, TreeError> {
        self.nodes.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    /// Attribute value of an element.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(|el| el.attrs.get(name))
    }

    /// Child handles of an element (empty for unknown handles).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], Element::children)
    }

    /// Create a detached element.
    pub fn new_node(&mut self, tag: &str, attrs: Attributes) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element::new(tag, attrs));
        id
    }

    /// Set the leading text of an element.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        self.element_mut(id)?.text = text.into();
        Ok(())
    }

    /// Append a detached element as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.element(parent)?;
        if self.element(child)?.parent.is_some() || child == self.root {
            return Err(TreeError::AlreadyAttached(child));
        }
        self.element_mut(child)?.parent = Some(parent);
        self.element_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Append text at the end of `parent`'s content.
    ///
    /// The text lands in the last child's tail, or in `parent.text` when the
    /// element has no children yet.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<(), TreeError> {
        match self.element(parent)?.children.last().copied() {
            Some(last) => self.element_mut(last)?.tail.push_str(text),
            None => self.element_mut(parent)?.text.push_str(text),
        }
        Ok(())
    }

    /// Descendants of `scope` in document order, excluding `scope` itself.
    #[must_use]
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// All attached elements with `tag` and the given attributes, in document order.
    #[must_use]
    pub fn find_all(&self, tag: &str, attrs: &[(&str, &str)]) -> Vec<NodeId> {
        self.find_all_in(self.root, tag, attrs)
    }

    /// Elements under `scope` with `tag` and the given attributes, in document order.
    #[must_use]
    pub fn find_all_in(&self, scope: NodeId, tag: &str, attrs: &[(&str, &str)]) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.is_match(id, tag, attrs))
            .collect()
    }

    /// First element under `scope` with `tag` and the given attributes.
    #[must_use]
    pub fn find_first_in(&self, scope: NodeId, tag: &str, attrs: &[(&str, &str)]) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&id| self.is_match(id, tag, attrs))
    }

    /// Nearest ancestor of `id` with `tag`.
    #[must_use]
    pub fn find_parent(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = self.get(id)?.parent;
        while let Some(ancestor) = current {
            let el = self.get(ancestor)?;
            if el.tag == tag {
                return Some(ancestor);
            }
            current = el.parent;
        }
        None
    }

    /// Whether `id` is still reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.get(node).and_then(|el| el.parent);
        }
        false
    }

    /// Visible text of an element.
    ///
    /// Every text fragment under the element (excluding its own tail) is
    /// trimmed and the pieces are joined without a separator.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(el) = self.get(id) else {
            return;
        };
        out.push_str(el.text.trim());
        for &child in &el.children {
            self.collect_text(child, out);
            if let Some(child_el) = self.get(child) {
                out.push_str(child_el.tail.trim());
            }
        }
    }

    /// Replace an attached element with plain text.
    ///
    /// The element's tail is kept after the inserted text.
    pub fn replace_with_text(&mut self, id: NodeId, text: &str) -> Result<(), TreeError> {
        let (parent, position) = self.position(id)?;
        let tail = std::mem::take(&mut self.element_mut(id)?.tail);
        let merged = format!("{text}{tail}");

        self.element_mut(parent)?.children.remove(position);
        self.element_mut(id)?.parent = None;

        if position == 0 {
            self.element_mut(parent)?.text.push_str(&merged);
        } else {
            let previous = self.element(parent)?.children[position - 1];
            self.element_mut(previous)?.tail.push_str(&merged);
        }
        Ok(())
    }

    /// Replace an attached element with a detached one, keeping the tail.
    pub fn replace_with_node(&mut self, id: NodeId, replacement: NodeId) -> Result<(), TreeError> {
        if self.element(replacement)?.parent.is_some() || replacement == self.root {
            return Err(TreeError::AlreadyAttached(replacement));
        }
        let (parent, position) = self.position(id)?;
        let tail = std::mem::take(&mut self.element_mut(id)?.tail);

        self.element_mut(parent)?.children[position] = replacement;
        self.element_mut(id)?.parent = None;

        let new_el = self.element_mut(replacement)?;
        new_el.parent = Some(parent);
        new_el.tail.push_str(&tail);
        Ok(())
    }

    fn position(&self, id: NodeId) -> Result<(NodeId, usize), TreeError> {
        if id == self.root {
            return Err(TreeError::Root);
        }
        let parent = self.element(id)?.parent.ok_or(TreeError::Detached(id))?;
        let position = self
            .element(parent)?
            .children
            .iter()
            .position(|&child| child == id)
            .ok_or(TreeError::Detached(id))?;
        Ok((parent, position))
    }

    fn is_match(&self, id: NodeId, tag: &str, attrs: &[(&str, &str)]) -> bool {
        self.get(id)
            .is_some_and(|el| el.tag == tag && el.attrs.matches(attrs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `<root>a<p>one</p>b<q /></root>`
    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new("root");
        let root = doc.root();
        doc.set_text(root, "a").unwrap();
        let p = doc.new_node("p", Attributes::new());
        doc.set_text(p, "one").unwrap();
        doc.append_child(root, p).unwrap();
        doc.append_text(root, "b").unwrap();
        let q = doc.new_node("q", [("x", "1")].into_iter().collect());
        doc.append_child(root, q).unwrap();
        (doc, p, q)
    }

    #[test]
    fn test_attributes_keep_order_and_overwrite() {
        let mut attrs = Attributes::new();
        attrs.set("src", "a");
        attrs.set("alt", "b");
        attrs.set("src", "c");
        let pairs: Vec<_> = attrs.iter().collect();
        assert_eq!(pairs, vec![("src", "c"), ("alt", "b")]);
    }

    #[test]
    fn test_append_text_goes_to_tail_of_last_child() {
        let (doc, p, _) = sample();
        assert_eq!(doc.get(doc.root()).unwrap().text, "a");
        assert_eq!(doc.get(p).unwrap().tail, "b");
    }

    #[test]
    fn test_find_all_with_attrs() {
        let (doc, _, q) = sample();
        assert_eq!(doc.find_all("q", &[("x", "1")]), vec![q]);
        assert!(doc.find_all("q", &[("x", "2")]).is_empty());
    }

    #[test]
    fn test_find_parent() {
        let mut doc = Document::new("root");
        let outer = doc.new_node("ac:image", Attributes::new());
        let inner = doc.new_node("ri:attachment", Attributes::new());
        doc.append_child(doc.root(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        assert_eq!(doc.find_parent(inner, "ac:image"), Some(outer));
        assert_eq!(doc.find_parent(inner, "ac:link"), None);
    }

    #[test]
    fn test_replace_first_child_with_text_merges_into_parent_text() {
        let (mut doc, p, q) = sample();
        doc.replace_with_text(p, "X").unwrap();

        let root = doc.get(doc.root()).unwrap();
        assert_eq!(root.text, "aXb");
        assert_eq!(root.children(), &[q]);
        assert!(!doc.is_attached(p));
    }

    #[test]
    fn test_replace_later_child_with_text_merges_into_previous_tail() {
        let (mut doc, p, q) = sample();
        doc.replace_with_text(q, "Y").unwrap();
        assert_eq!(doc.get(p).unwrap().tail, "bY");
    }

    #[test]
    fn test_replace_with_node_keeps_tail() {
        let (mut doc, p, _) = sample();
        let a = doc.new_node("a", Attributes::new());
        doc.replace_with_node(p, a).unwrap();

        assert_eq!(doc.children(doc.root())[0], a);
        assert_eq!(doc.get(a).unwrap().tail, "b");
        assert!(doc.is_attached(a));
        assert!(!doc.is_attached(p));
    }

    #[test]
    fn test_replace_root_fails() {
        let (mut doc, _, _) = sample();
        let root = doc.root();
        assert!(matches!(doc.replace_with_text(root, "x"), Err(TreeError::Root)));
    }

    #[test]
    fn test_replace_detached_fails() {
        let (mut doc, p, _) = sample();
        doc.replace_with_text(p, "x").unwrap();
        assert!(matches!(
            doc.replace_with_text(p, "y"),
            Err(TreeError::Detached(_))
        ));
    }

    #[test]
    fn test_text_content_trims_fragments() {
        let mut doc = Document::new("root");
        let body = doc.new_node("ac:link-body", Attributes::new());
        doc.set_text(body, "  see ").unwrap();
        doc.append_child(doc.root(), body).unwrap();
        let b = doc.new_node("b", Attributes::new());
        doc.set_text(b, " this ").unwrap();
        doc.append_child(body, b).unwrap();
        doc.append_text(body, " doc ").unwrap();

        assert_eq!(doc.text_content(body), "seethisdoc");
    }

    #[test]
    fn test_unknown_node() {
        let small = Document::new("root");
        let mut big = Document::new("root");
        let foreign = big.new_node("p", Attributes::new());
        assert!(matches!(
            small.element(foreign),
            Err(TreeError::UnknownNode(_))
        ));
    }
}
