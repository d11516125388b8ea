// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field tree — groups flat, dot-qualified field names into nested branches.
//
// Children keep insertion order, which is the order the document collaborator
// reported the fields in (page order, then per-page order). Extraction and
// filling both walk the tree in that order.

use std::fmt;

use indexmap::IndexMap;
use tracing::warn;

use formburner_core::types::{Field, FieldPath, FieldVariant};

/// A terminal field: the collaborator's handle plus a snapshot of its state.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLeaf<H> {
    handle: H,
    field: Field,
    modified: bool,
}

impl<H> FieldLeaf<H> {
    pub fn new(handle: H, field: Field) -> Self {
        Self {
            handle,
            field,
            modified: false,
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Whether a fill pass committed a new value that still has to be
    /// written back to the document.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Replace the field state and mark the leaf for write-back.
    pub fn set_variant(&mut self, variant: FieldVariant) {
        self.field.variant = variant;
        self.modified = true;
    }
}

/// Interior node holding named children.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch<H> {
    children: IndexMap<String, FieldNode<H>>,
}

impl<H> Default for Branch<H> {
    fn default() -> Self {
        Self {
            children: IndexMap::new(),
        }
    }
}

impl<H> Branch<H> {
    pub fn children(&self) -> impl Iterator<Item = (&str, &FieldNode<H>)> {
        self.children.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn children_mut(&mut self) -> impl Iterator<Item = (&str, &mut FieldNode<H>)> {
        self.children.iter_mut().map(|(key, node)| (key.as_str(), node))
    }

    pub fn get(&self, key: &str) -> Option<&FieldNode<H>> {
        self.children.get(key)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldNode<H> {
    Leaf(FieldLeaf<H>),
    Branch(Branch<H>),
}

impl<H> FieldNode<H> {
    pub fn as_leaf(&self) -> Option<&FieldLeaf<H>> {
        match self {
            FieldNode::Leaf(leaf) => Some(leaf),
            FieldNode::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&Branch<H>> {
        match self {
            FieldNode::Branch(branch) => Some(branch),
            FieldNode::Leaf(_) => None,
        }
    }

    /// Turn this node into a branch (dropping a leaf if there was one).
    fn make_branch(&mut self) -> &mut Branch<H> {
        if let FieldNode::Leaf(_) = self {
            *self = FieldNode::Branch(Branch::default());
        }
        match self {
            FieldNode::Branch(branch) => branch,
            FieldNode::Leaf(_) => unreachable!("leaf was replaced by a branch above"),
        }
    }
}

/// A fully qualified name that was defined twice; the later definition won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCollision {
    pub path: FieldPath,
}

impl fmt::Display for FieldCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' defined more than once", self.path)
    }
}

/// Ownership tree of a document's fields keyed by dotted name segments.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTree<H> {
    root: Branch<H>,
    collisions: Vec<FieldCollision>,
}

impl<H> Default for FieldTree<H> {
    fn default() -> Self {
        Self {
            root: Branch::default(),
            collisions: Vec::new(),
        }
    }
}

impl<H> FieldTree<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(fully qualified name, leaf)` pairs, in order.
    pub fn build(entries: impl IntoIterator<Item = (String, FieldLeaf<H>)>) -> Self {
        let mut tree = Self::new();
        for (name, leaf) in entries {
            tree.insert(&name, leaf);
        }
        tree
    }

    /// Insert a leaf at its dotted name, creating branches on the way.
    ///
    /// Returns the collision when the name (or one of its prefixes) was
    /// already taken by an incompatible node.
    pub fn insert(&mut self, dotted: &str, leaf: FieldLeaf<H>) -> Option<FieldCollision> {
        let path = FieldPath::parse(dotted);
        let (last, parents) = path.segments().split_last()?;

        let mut collision = None;
        let mut branch = &mut self.root;
        let mut walked = FieldPath::root();
        for segment in parents {
            walked = walked.child(segment);
            let node = branch
                .children
                .entry(segment.clone())
                .or_insert_with(|| FieldNode::Branch(Branch::default()));
            if matches!(node, FieldNode::Leaf(_)) {
                collision = Some(FieldCollision {
                    path: walked.clone(),
                });
            }
            branch = node.make_branch();
        }

        if branch
            .children
            .insert(last.clone(), FieldNode::Leaf(leaf))
            .is_some()
        {
            collision = Some(FieldCollision { path: path.clone() });
        }

        if let Some(collision) = &collision {
            warn!(field = %collision.path, "field name collision, keeping the last definition");
            self.collisions.push(collision.clone());
        }
        collision
    }

    pub fn root(&self) -> &Branch<H> {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Branch<H> {
        &mut self.root
    }

    /// Collisions recorded while the tree was built.
    pub fn collisions(&self) -> &[FieldCollision] {
        &self.collisions
    }

    pub fn get(&self, dotted: &str) -> Option<&FieldNode<H>> {
        let path = FieldPath::parse(dotted);
        let (first, rest) = path.segments().split_first()?;
        let mut node = self.root.get(first)?;
        for segment in rest {
            node = node.as_branch()?.get(segment)?;
        }
        Some(node)
    }

    pub fn get_mut(&mut self, dotted: &str) -> Option<&mut FieldNode<H>> {
        let path = FieldPath::parse(dotted);
        let (first, rest) = path.segments().split_first()?;
        let mut node = self.root.children.get_mut(first.as_str())?;
        for segment in rest {
            node = match node {
                FieldNode::Branch(branch) => branch.children.get_mut(segment.as_str())?,
                FieldNode::Leaf(_) => return None,
            };
        }
        Some(node)
    }

    pub fn leaf(&self, dotted: &str) -> Option<&FieldLeaf<H>> {
        self.get(dotted)?.as_leaf()
    }

    /// All leaves with their paths, in traversal order.
    pub fn leaves(&self) -> Vec<(FieldPath, &FieldLeaf<H>)> {
        let mut out = Vec::new();
        collect_leaves(&self.root, &FieldPath::root(), &mut out);
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }
}

fn collect_leaves<'a, H>(
    branch: &'a Branch<H>,
    path: &FieldPath,
    out: &mut Vec<(FieldPath, &'a FieldLeaf<H>)>,
) {
    for (key, node) in branch.children() {
        let child = path.child(key);
        match node {
            FieldNode::Leaf(leaf) => out.push((child, leaf)),
            FieldNode::Branch(inner) => collect_leaves(inner, &child, out),
        }
    }
}
