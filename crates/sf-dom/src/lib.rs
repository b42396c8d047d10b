//! DOM tree data structures.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by [`NodeId`].
//! Detached nodes keep their slot, so ids stay valid after a node is removed
//! from the tree and can be re-inserted later.

mod events;
mod style;

pub use events::DomEvent;
pub use events::EventKind;
pub use events::Listeners;

use core::cmp::Ordering;
use core::fmt;
use sf_core::FixError;
use sf_core::FixResult;

/// ID used to address nodes in the DOM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Payload of a single arena slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    Doctype(String),
}

/// Element name, attributes, and form-control state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Checkedness of checkbox/radio inputs, seeded from the `checked` attribute.
    pub checked: bool,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            checked: false,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Arena-backed document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|node| &node.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> FixResult<&mut ElementData> {
        match self.nodes.get_mut(id.0).map(|node| &mut node.kind) {
            Some(NodeKind::Element(element)) => Ok(element),
            Some(_) => Err(FixError::new(
                "dom.not_an_element",
                format!("{id} is not an element"),
            )),
            None => Err(missing(id)),
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData::new(tag)))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_owned()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_owned()))
    }

    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Doctype(name.to_owned()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    // ---- attributes -------------------------------------------------------

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        self.element(id)
            .map(|element| element.attrs.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> FixResult<()> {
        let name = name.to_ascii_lowercase();
        let element = self.element_mut(id)?;
        if let Some(slot) = element.attrs.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value.to_owned();
        } else {
            element.attrs.push((name, value.to_owned()));
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> FixResult<()> {
        let element = self.element_mut(id)?;
        element.attrs.retain(|(key, _)| key != name);
        Ok(())
    }

    // ---- classes ----------------------------------------------------------

    pub fn class_list(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|value| value.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class_name))
    }

    pub fn add_class(&mut self, id: NodeId, class_name: &str) -> FixResult<()> {
        self.toggle_class(id, class_name, true)
    }

    pub fn remove_class(&mut self, id: NodeId, class_name: &str) -> FixResult<()> {
        self.toggle_class(id, class_name, false)
    }

    /// Forces `class_name` on or off, like `classList.toggle(name, force)`.
    pub fn toggle_class(&mut self, id: NodeId, class_name: &str, on: bool) -> FixResult<()> {
        let mut classes: Vec<String> = self
            .class_list(id)
            .into_iter()
            .filter(|candidate| *candidate != class_name)
            .map(ToOwned::to_owned)
            .collect();
        if on {
            classes.push(class_name.to_owned());
        }

        if classes.is_empty() {
            if self.has_attr(id, "class") {
                return self.set_attr(id, "class", "");
            }
            return self.element_mut(id).map(|_| ());
        }
        self.set_attr(id, "class", &classes.join(" "))
    }

    // ---- inline style -----------------------------------------------------

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        let declarations = style::parse_inline_style(self.attr(id, "style")?);
        declarations
            .into_iter()
            .rev()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    /// Sets an inline style property; an empty value removes it, like
    /// assigning `""` to `element.style.<prop>`.
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) -> FixResult<()> {
        let property = property.trim().to_ascii_lowercase();
        let mut declarations = self
            .attr(id, "style")
            .map(style::parse_inline_style)
            .unwrap_or_default();
        declarations.retain(|(name, _)| *name != property);

        let value = value.trim();
        if !value.is_empty() {
            declarations.push((property, value.to_owned()));
        }

        if declarations.is_empty() {
            if self.has_attr(id, "style") {
                return self.remove_attr(id, "style");
            }
            return self.element_mut(id).map(|_| ());
        }
        self.set_attr(id, "style", &style::serialize_inline_style(&declarations))
    }

    /// False only when the element carries an inline `display: none`.
    pub fn is_displayed(&self, id: NodeId) -> bool {
        self.style_property(id, "display")
            .is_none_or(|display| !display.eq_ignore_ascii_case("none"))
    }

    // ---- form controls ----------------------------------------------------

    pub fn is_checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|element| element.checked)
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> FixResult<()> {
        self.element_mut(id)?.checked = checked;
        Ok(())
    }

    /// The `value` of a form control; checkboxes and radios default to `"on"`.
    pub fn value(&self, id: NodeId) -> Option<&str> {
        let element = self.element(id)?;
        if let Some(value) = element.attr("value") {
            return Some(value);
        }
        if element.tag == "input" && self.is_checkable(id) {
            return Some("on");
        }
        None
    }

    pub fn is_checkable(&self, id: NodeId) -> bool {
        self.tag_name(id) == Some("input")
            && self
                .attr(id, "type")
                .is_some_and(|kind| kind.eq_ignore_ascii_case("checkbox") || kind.eq_ignore_ascii_case("radio"))
    }

    // ---- tree navigation --------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|sibling| *sibling == id)?;
        siblings.get(index.saturating_add(1)).copied()
    }

    /// Ancestors from the parent up to the root, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            document: self,
            cursor: self.parent(id),
        }
    }

    /// Descendants of `id` in document (pre-)order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Inclusive containment check.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|candidate| candidate == ancestor)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Dispatch path of an event: the target followed by its ancestors.
    pub fn event_path(&self, target: NodeId) -> Vec<NodeId> {
        let mut path = vec![target];
        path.extend(self.ancestors(target));
        path
    }

    /// Relative document order of two nodes in the same tree; `None` when they
    /// share no common root.
    pub fn document_order(&self, left: NodeId, right: NodeId) -> Option<Ordering> {
        if left == right {
            return Some(Ordering::Equal);
        }

        let left_path = self.path_from_top(left);
        let right_path = self.path_from_top(right);
        if left_path.first() != right_path.first() {
            return None;
        }

        for depth in 1..left_path.len().max(right_path.len()) {
            match (left_path.get(depth), right_path.get(depth)) {
                (Some(a), Some(b)) if a == b => continue,
                (Some(a), Some(b)) => {
                    let parent = left_path[depth - 1];
                    let siblings = self.children(parent);
                    let a_index = siblings.iter().position(|child| child == a)?;
                    let b_index = siblings.iter().position(|child| child == b)?;
                    return Some(a_index.cmp(&b_index));
                }
                // The shorter path is an ancestor, which precedes its descendants.
                (None, Some(_)) => return Some(Ordering::Less),
                (Some(_), None) => return Some(Ordering::Greater),
                (None, None) => break,
            }
        }

        Some(Ordering::Equal)
    }

    fn path_from_top(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = self.event_path(id);
        path.reverse();
        path
    }

    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(NodeKind::Comment(_)) | Some(NodeKind::Doctype(_)) | None => String::new(),
            Some(NodeKind::Document) | Some(NodeKind::Element(_)) => {
                let mut out = String::new();
                for child in self.children(id) {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
        }
    }

    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> FixResult<()> {
        self.element_mut(id)?;
        for child in self.children(id).to_vec() {
            self.detach(child)?;
        }
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(id, text_node)?;
        }
        Ok(())
    }

    /// Number of elements currently connected to the document.
    pub fn element_count(&self) -> usize {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.is_element(*id))
            .count()
    }

    // ---- tree mutation ----------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> FixResult<()> {
        self.insert_before(parent, child, None)
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> FixResult<()> {
        let reference = self.first_child(parent);
        self.insert_before(parent, child, reference)
    }

    /// Inserts `child` under `parent` before `reference`, or at the end when
    /// `reference` is `None`. The child is moved if it is already attached.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> FixResult<()> {
        self.check_insertion(parent, child)?;
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(FixError::new(
                    "dom.reference_not_child",
                    format!("{reference} is not a child of {parent}"),
                ));
            }
        }

        self.unlink(child);

        let index = match reference {
            Some(reference) => self.children(parent)
                .iter()
                .position(|id| *id == reference)
                .ok_or_else(|| {
                    FixError::new(
                        "dom.reference_not_child",
                        format!("{reference} is not a child of {parent}"),
                    )
                })?,
            None => self.children(parent).len(),
        };

        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Inserts `node` as the next sibling of `existing`.
    pub fn insert_after(&mut self, existing: NodeId, node: NodeId) -> FixResult<()> {
        let parent = self.parent(existing).ok_or_else(|| {
            FixError::new("dom.detached", format!("{existing} has no parent"))
        })?;
        let reference = self.next_sibling(existing);
        self.insert_before(parent, node, reference)
    }

    /// Puts `replacement` where `old` was and detaches `old`.
    pub fn replace_child(&mut self, parent: NodeId, replacement: NodeId, old: NodeId) -> FixResult<()> {
        if self.parent(old) != Some(parent) {
            return Err(FixError::new(
                "dom.reference_not_child",
                format!("{old} is not a child of {parent}"),
            ));
        }
        if replacement == old {
            return Ok(());
        }
        self.insert_before(parent, replacement, Some(old))?;
        self.detach(old)
    }

    /// Removes `id` from its parent; the subtree stays addressable.
    pub fn detach(&mut self, id: NodeId) -> FixResult<()> {
        if id.0 >= self.nodes.len() {
            return Err(missing(id));
        }
        if id == self.root {
            return Err(FixError::new("dom.root_immutable", "the document root cannot be detached"));
        }
        self.unlink(id);
        Ok(())
    }

    /// Inserts `wrapper` in place of `target` and moves `target` inside it.
    pub fn wrap(&mut self, target: NodeId, wrapper: NodeId) -> FixResult<()> {
        let parent = self.parent(target).ok_or_else(|| {
            FixError::new("dom.detached", format!("{target} has no parent to wrap within"))
        })?;
        self.insert_before(parent, wrapper, Some(target))?;
        self.append_child(wrapper, target)
    }

    fn unlink(&mut self, id: NodeId) {
        if let Some(old_parent) = self.nodes[id.0].parent.take() {
            self.nodes[old_parent.0].children.retain(|child| *child != id);
        }
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> FixResult<()> {
        if parent.0 >= self.nodes.len() {
            return Err(missing(parent));
        }
        if child.0 >= self.nodes.len() {
            return Err(missing(child));
        }
        if !matches!(
            self.nodes[parent.0].kind,
            NodeKind::Document | NodeKind::Element(_)
        ) {
            return Err(FixError::new(
                "dom.cannot_have_children",
                format!("{parent} cannot have children"),
            ));
        }
        if child == self.root {
            return Err(FixError::new("dom.root_immutable", "the document root cannot be inserted"));
        }
        if self.contains(child, parent) {
            return Err(FixError::new(
                "dom.cycle",
                format!("inserting {child} under {parent} would create a cycle"),
            ));
        }
        Ok(())
    }
}

fn missing(id: NodeId) -> FixError {
    FixError::new("dom.node_missing", format!("{id} is not part of the document"))
}

/// Iterator over the ancestors of a node.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    document: &'a Document,
    cursor: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        self.cursor = self.document.parent(current);
        Some(current)
    }
}
