//! Hierarchical element model.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::element::{Element, ElementId, ElementPatch};

/// Errors from structural tree edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("element not found: {0}")]
    NotFound(ElementId),
    #[error("element already exists: {0}")]
    DuplicateId(ElementId),
    #[error("moving {id} under {target} would create a cycle")]
    Cycle { id: ElementId, target: ElementId },
    #[error("element {0} has a negative or non-finite size")]
    InvalidSize(ElementId),
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    element: Element,
    /// Insertion sequence, used to break sibling index ties.
    seq: u64,
}

/// Flat store of elements linked by parent ids.
///
/// Multiple roots are allowed. Parent links are kept acyclic by
/// [`add`](Self::add), [`reparent`](Self::reparent) and
/// [`reorder`](Self::reorder).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementTree {
    entries: HashMap<ElementId, Entry>,
    next_seq: u64,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a list of elements, in insertion order.
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut tree = Self::new();
        for error in tree.add(elements) {
            log::warn!("Skipping element while building tree: {error}");
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.entries.get(id).map(|entry| &entry.element)
    }

    /// All elements in insertion order.
    pub fn elements(&self) -> Vec<&Element> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| &entry.element).collect()
    }

    /// Elements in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.entries.values().map(|entry| &entry.element)
    }

    pub fn parent_of(&self, id: &ElementId) -> Option<&ElementId> {
        self.get(id).and_then(|element| element.parent_id.as_ref())
    }

    /// Children of `parent` (roots when `None`), sorted by index then insertion order.
    pub fn children(&self, parent: Option<&ElementId>) -> Vec<&Element> {
        let mut children: Vec<&Entry> = self
            .entries
            .values()
            .filter(|entry| entry.element.parent_id.as_ref() == parent)
            .collect();
        children.sort_by(|a, b| a.element.index.cmp(&b.element.index).then(a.seq.cmp(&b.seq)));
        children.into_iter().map(|entry| &entry.element).collect()
    }

    pub fn roots(&self) -> Vec<&Element> {
        self.children(None)
    }

    /// Depth-first pre-order descendants of `id`, excluding `id` itself.
    ///
    /// Siblings are visited by index, then by id.
    pub fn descendants(&self, id: &ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(id.clone());
        self.collect_descendants(id, &mut result, &mut visited);
        result
    }

    fn collect_descendants(
        &self,
        id: &ElementId,
        result: &mut Vec<ElementId>,
        visited: &mut HashSet<ElementId>,
    ) {
        let mut children: Vec<&Element> = self
            .entries
            .values()
            .map(|entry| &entry.element)
            .filter(|element| element.parent_id.as_ref() == Some(id))
            .collect();
        children.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.id.cmp(&b.id)));
        for child in children {
            if visited.insert(child.id.clone()) {
                result.push(child.id.clone());
                self.collect_descendants(&child.id, result, visited);
            }
        }
    }

    /// The element and all of its descendants.
    pub fn subtree(&self, id: &ElementId) -> HashSet<ElementId> {
        let mut ids: HashSet<ElementId> = self.descendants(id).into_iter().collect();
        ids.insert(id.clone());
        ids
    }

    /// Parent chain from the nearest parent up to the root.
    ///
    /// Stops at a dangling parent id or a cycle in corrupt input.
    pub fn ancestors(&self, id: &ElementId) -> Vec<&Element> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(id.clone());
        let mut current = self.parent_of(id);
        while let Some(parent_id) = current {
            if !seen.insert(parent_id.clone()) {
                break;
            }
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            chain.push(parent);
            current = parent.parent_id.as_ref();
        }
        chain
    }

    /// Whether `id` lies strictly below `ancestor`.
    pub fn is_descendant(&self, id: &ElementId, ancestor: &ElementId) -> bool {
        self.ancestors(id).iter().any(|element| &element.id == ancestor)
    }

    /// Every element reachable from the roots in paint order.
    ///
    /// Later entries paint over earlier ones.
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut order = Vec::with_capacity(self.len());
        for root in self.roots() {
            order.push(root);
            for id in self.descendants(&root.id) {
                if let Some(element) = self.get(&id) {
                    order.push(element);
                }
            }
        }
        order
    }

    /// Insert new elements.
    ///
    /// Rejected: ids that already exist, invalid sizes, and parent links
    /// that would close a cycle. The rest of the batch is kept.
    pub fn add(&mut self, elements: impl IntoIterator<Item = Element>) -> Vec<TreeError> {
        let mut errors = Vec::new();
        let mut added = Vec::new();
        for element in elements {
            if self.entries.contains_key(&element.id) {
                errors.push(TreeError::DuplicateId(element.id.clone()));
                continue;
            }
            if !element.has_valid_size() {
                errors.push(TreeError::InvalidSize(element.id.clone()));
                continue;
            }
            let seq = self.next_seq;
            self.next_seq += 1;
            added.push(element.id.clone());
            self.entries.insert(element.id.clone(), Entry { element, seq });
        }

        // Dropping one member of a loop frees the others.
        for id in added {
            if !self.closes_cycle(&id) {
                continue;
            }
            if let Some(entry) = self.entries.remove(&id) {
                let target = entry.element.parent_id.unwrap_or_else(|| id.clone());
                errors.push(TreeError::Cycle { id, target });
            }
        }
        errors
    }

    /// Whether following parent links from `id` leads back to `id`.
    fn closes_cycle(&self, id: &ElementId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if parent == id {
                return true;
            }
            if !seen.insert(parent) {
                return false;
            }
            current = self.parent_of(parent);
        }
        false
    }

    /// Apply a partial update. Returns false if the element does not exist.
    pub fn update(&mut self, id: &ElementId, patch: &ElementPatch) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.element.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Apply several updates as one batch. Unknown ids are skipped.
    pub fn update_many(&mut self, updates: &[(ElementId, ElementPatch)]) -> usize {
        let mut applied = 0;
        for (id, patch) in updates {
            if self.update(id, patch) {
                applied += 1;
            }
        }
        applied
    }

    /// Remove an element and its whole subtree. Returns every removed id.
    pub fn remove(&mut self, id: &ElementId) -> Vec<ElementId> {
        if !self.entries.contains_key(id) {
            return Vec::new();
        }
        let mut removed = vec![id.clone()];
        removed.extend(self.descendants(id));
        for removed_id in &removed {
            self.entries.remove(removed_id);
        }
        removed
    }

    /// Check that moving `id` under `new_parent` is allowed, without moving it.
    pub fn validate_move(&self, id: &ElementId, new_parent: Option<&ElementId>) -> Result<(), TreeError> {
        if !self.contains(id) {
            return Err(TreeError::NotFound(id.clone()));
        }
        if let Some(target) = new_parent {
            if !self.contains(target) {
                return Err(TreeError::NotFound(target.clone()));
            }
            if target == id || self.is_descendant(target, id) {
                return Err(TreeError::Cycle {
                    id: id.clone(),
                    target: target.clone(),
                });
            }
        }
        Ok(())
    }

    /// Move an element to the end of `new_parent`'s children.
    ///
    /// Reparenting to the current parent keeps the element's position
    /// among its siblings.
    pub fn reparent(&mut self, id: &ElementId, new_parent: Option<&ElementId>) -> Result<(), TreeError> {
        self.validate_move(id, new_parent)?;
        if self.parent_of(id) == new_parent {
            return Ok(());
        }
        let next_index = self
            .children(new_parent)
            .iter()
            .filter(|sibling| &sibling.id != id)
            .map(|sibling| sibling.index + 1)
            .max()
            .unwrap_or(0);
        if let Some(entry) = self.entries.get_mut(id) {
            entry.element.parent_id = new_parent.cloned();
            entry.element.index = next_index;
        }
        Ok(())
    }

    /// Move an element under `new_parent` at sibling position `index`.
    ///
    /// The target sibling list is renumbered densely from zero.
    pub fn reorder(
        &mut self,
        id: &ElementId,
        new_parent: Option<&ElementId>,
        index: usize,
    ) -> Result<(), TreeError> {
        self.validate_move(id, new_parent)?;
        let mut siblings: Vec<ElementId> = self
            .children(new_parent)
            .into_iter()
            .filter(|sibling| &sibling.id != id)
            .map(|sibling| sibling.id.clone())
            .collect();
        siblings.insert(index.min(siblings.len()), id.clone());

        if let Some(entry) = self.entries.get_mut(id) {
            entry.element.parent_id = new_parent.cloned();
        }
        for (position, sibling_id) in siblings.iter().enumerate() {
            if let Some(entry) = self.entries.get_mut(sibling_id) {
                entry.element.index = position as i64;
            }
        }
        Ok(())
    }

    /// Place `id` directly after `after` among `after`'s siblings.
    pub fn insert_after(&mut self, id: &ElementId, after: &ElementId) -> Result<(), TreeError> {
        let parent = self
            .get(after)
            .ok_or_else(|| TreeError::NotFound(after.clone()))?
            .parent_id
            .clone();
        let position = self
            .children(parent.as_ref())
            .iter()
            .filter(|sibling| &sibling.id != id)
            .position(|sibling| &sibling.id == after)
            .map_or(0, |position| position + 1);
        self.reorder(id, parent.as_ref(), position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    fn id(value: &str) -> ElementId {
        ElementId::from(value)
    }

    fn sample_tree() -> ElementTree {
        // root
        // ├── a
        // │   └── a1
        // └── b
        ElementTree::from_elements([
            Element::with_id("root", ElementKind::Container).sized(500.0, 500.0),
            Element::with_id("b", ElementKind::Container).with_parent("root").with_index(1),
            Element::with_id("a", ElementKind::Container).with_parent("root").with_index(0),
            Element::with_id("a1", ElementKind::Text).with_parent("a"),
        ])
    }

    fn child_ids(tree: &ElementTree, parent: Option<&str>) -> Vec<String> {
        let parent = parent.map(id);
        tree.children(parent.as_ref())
            .iter()
            .map(|element| element.id.to_string())
            .collect()
    }

    #[test]
    fn test_children_sorted_by_index() {
        let tree = sample_tree();
        assert_eq!(child_ids(&tree, Some("root")), vec!["a", "b"]);
        assert_eq!(child_ids(&tree, None), vec!["root"]);
    }

    #[test]
    fn test_children_index_ties_use_insertion_order() {
        let tree = ElementTree::from_elements([
            Element::with_id("z", ElementKind::Text),
            Element::with_id("m", ElementKind::Text),
            Element::with_id("a", ElementKind::Text),
        ]);
        assert_eq!(child_ids(&tree, None), vec!["z", "m", "a"]);
    }

    #[test]
    fn test_descendants_pre_order() {
        let tree = sample_tree();
        assert_eq!(tree.descendants(&id("root")), vec![id("a"), id("a1"), id("b")]);
        assert!(tree.descendants(&id("a1")).is_empty());
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut tree = sample_tree();
        let errors = tree.add([Element::with_id("a", ElementKind::Image)]);
        assert_eq!(errors, vec![TreeError::DuplicateId(id("a"))]);
        assert_eq!(tree.get(&id("a")).map(|e| e.kind), Some(ElementKind::Container));
    }

    #[test]
    fn test_add_rejects_parent_cycle() {
        let mut tree = ElementTree::new();
        let errors = tree.add([
            Element::with_id("x", ElementKind::Container).with_parent("y"),
            Element::with_id("y", ElementKind::Container).with_parent("x"),
            Element::with_id("self", ElementKind::Container).with_parent("self"),
            Element::with_id("ok", ElementKind::Text).with_parent("y"),
        ]);

        assert_eq!(
            errors,
            vec![
                TreeError::Cycle { id: id("x"), target: id("y") },
                TreeError::Cycle { id: id("self"), target: id("self") },
            ]
        );
        assert!(!tree.contains(&id("x")));
        assert_eq!(child_ids(&tree, Some("y")), vec!["ok"]);
        assert_eq!(tree.ancestors(&id("ok")).len(), 1);
    }

    #[test]
    fn test_add_rejects_invalid_size() {
        let mut tree = ElementTree::new();
        let errors = tree.add([
            Element::with_id("neg", ElementKind::Button).sized(-5.0, 10.0),
            Element::with_id("fine", ElementKind::Button).sized(5.0, 10.0),
        ]);
        assert_eq!(errors, vec![TreeError::InvalidSize(id("neg"))]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_update_many_skips_unknown() {
        let mut tree = sample_tree();
        let applied = tree.update_many(&[
            (id("a"), ElementPatch::position(5.0, 6.0)),
            (id("missing"), ElementPatch::position(1.0, 1.0)),
        ]);
        assert_eq!(applied, 1);
        let a = tree.get(&id("a")).unwrap();
        assert!((a.props.x - 5.0).abs() < f64::EPSILON);
        assert!((a.props.y - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_cascades() {
        let mut tree = sample_tree();
        let removed = tree.remove(&id("a"));
        assert_eq!(removed, vec![id("a"), id("a1")]);
        assert!(!tree.contains(&id("a1")));
        assert_eq!(tree.len(), 2);
        assert!(tree.remove(&id("a")).is_empty());
    }

    #[test]
    fn test_reparent_into_descendant_is_rejected() {
        let mut tree = sample_tree();
        let before = tree.clone();

        let result = tree.reparent(&id("root"), Some(&id("a1")));
        assert!(matches!(result, Err(TreeError::Cycle { .. })));
        assert_eq!(tree, before);

        let result = tree.reorder(&id("a"), Some(&id("a")), 0);
        assert!(matches!(result, Err(TreeError::Cycle { .. })));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_reparent_appends_at_end() {
        let mut tree = sample_tree();
        tree.reparent(&id("a1"), Some(&id("root"))).unwrap();
        assert_eq!(child_ids(&tree, Some("root")), vec!["a", "b", "a1"]);
        assert!(tree.children(Some(&id("a"))).is_empty());

        tree.reparent(&id("b"), None).unwrap();
        assert_eq!(child_ids(&tree, None), vec!["root", "b"]);

        // Same parent: order is kept.
        tree.reparent(&id("a"), Some(&id("root"))).unwrap();
        assert_eq!(child_ids(&tree, Some("root")), vec!["a", "a1"]);
    }

    #[test]
    fn test_reorder_moves_to_front() {
        let mut tree = ElementTree::from_elements([
            Element::with_id("row", ElementKind::Container),
            Element::with_id("A", ElementKind::Text).with_parent("row").with_index(0),
            Element::with_id("B", ElementKind::Text).with_parent("row").with_index(1),
            Element::with_id("C", ElementKind::Text).with_parent("row").with_index(2),
        ]);
        tree.reorder(&id("C"), Some(&id("row")), 0).unwrap();
        assert_eq!(child_ids(&tree, Some("row")), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_reorder_clamps_index() {
        let mut tree = sample_tree();
        tree.reorder(&id("a1"), Some(&id("root")), 99).unwrap();
        assert_eq!(child_ids(&tree, Some("root")), vec!["a", "b", "a1"]);
    }

    #[test]
    fn test_insert_after() {
        let mut tree = sample_tree();
        tree.add([Element::with_id("copy", ElementKind::Container)]);
        tree.insert_after(&id("copy"), &id("a")).unwrap();
        assert_eq!(child_ids(&tree, Some("root")), vec!["a", "copy", "b"]);
    }

    #[test]
    fn test_dangling_parent_is_tolerated() {
        let tree = ElementTree::from_elements([
            Element::with_id("orphan", ElementKind::Text).with_parent("ghost"),
        ]);
        assert!(tree.roots().is_empty());
        assert!(tree.ancestors(&id("orphan")).is_empty());
        assert!(tree.paint_order().is_empty());
    }

    #[test]
    fn test_paint_order() {
        let tree = sample_tree();
        let order: Vec<&str> = tree.paint_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["root", "a", "a1", "b"]);
    }
}
