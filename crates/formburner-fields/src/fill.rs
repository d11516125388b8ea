// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filling — writes a `Value` back into a field tree of matching shape.
//
// Each leaf is an independent validate-then-commit step: the new state is
// computed in full first and only then stored, so a rejected value never
// leaves a half-applied field behind. Failures are collected, not raised,
// and sibling fields are still processed.

use std::collections::BTreeSet;

use tracing::{debug, error, warn};

use formburner_core::error::{FieldError, Shape};
use formburner_core::types::{ButtonKind, ChoiceField, Field, FieldPath, FieldVariant};
use formburner_core::TextCodec;

use crate::tree::{Branch, FieldLeaf, FieldNode, FieldTree};
use crate::value::{Scalar, Value};

/// Validates incoming values and commits them to the tree's leaves.
#[derive(Debug, Clone, Default)]
pub struct Filler {
    codec: TextCodec,
}

impl Filler {
    pub fn new(codec: TextCodec) -> Self {
        Self { codec }
    }

    /// Fill the whole tree from `value`, returning one error per failing field.
    pub fn run<H>(&self, tree: &mut FieldTree<H>, value: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();
        self.fill_branch(tree.root_mut(), &FieldPath::root(), value, &mut errors);
        errors
    }

    /// Fill a single node, appending failures to `errors`.
    pub fn fill_node<H>(
        &self,
        node: &mut FieldNode<H>,
        path: &FieldPath,
        value: &Value,
        errors: &mut Vec<FieldError>,
    ) {
        match node {
            FieldNode::Branch(branch) => self.fill_branch(branch, path, value, errors),
            FieldNode::Leaf(leaf) => {
                if let Err(err) = self.fill_leaf(leaf, path, value) {
                    error!(field = %path, "{err}");
                    errors.push(err);
                }
            }
        }
    }

    fn fill_branch<H>(
        &self,
        branch: &mut Branch<H>,
        path: &FieldPath,
        value: &Value,
        errors: &mut Vec<FieldError>,
    ) {
        let Some(map) = value.as_mapping() else {
            let err = FieldError::ShapeMismatch {
                path: path.clone(),
                expected: Shape::Mapping,
            };
            error!(field = %path, "{err}");
            errors.push(err);
            return;
        };

        for (key, child) in branch.children_mut() {
            let child_path = path.child(key);
            match map.get(key) {
                Some(child_value) => self.fill_node(child, &child_path, child_value, errors),
                None => {
                    let err = FieldError::MissingField(child_path);
                    error!("{err}");
                    errors.push(err);
                }
            }
        }

        for key in map.keys() {
            if branch.get(key).is_none() {
                warn!(field = %path.child(key), "no such field in the document, value ignored");
            }
        }
    }

    fn fill_leaf<H>(
        &self,
        leaf: &mut FieldLeaf<H>,
        path: &FieldPath,
        value: &Value,
    ) -> Result<(), FieldError> {
        let field = leaf.field();
        let updated = self.resolve(path, field, value)?;
        if updated == field.variant {
            return Ok(());
        }
        if field.read_only {
            return Err(FieldError::UnsupportedOperation {
                path: path.clone(),
                reason: "read-only",
            });
        }
        debug!(field = %path, "field updated");
        leaf.set_variant(updated);
        Ok(())
    }

    /// Compute the field state `value` asks for, without touching the field.
    fn resolve(
        &self,
        path: &FieldPath,
        field: &Field,
        value: &Value,
    ) -> Result<FieldVariant, FieldError> {
        let shape_error = |expected| FieldError::ShapeMismatch {
            path: path.clone(),
            expected,
        };

        match &field.variant {
            FieldVariant::Text { kind, content } => {
                let incoming = match value {
                    Value::Scalar(Scalar::String(text)) => text.as_str(),
                    Value::Scalar(Scalar::Null) => "",
                    _ => return Err(shape_error(Shape::String)),
                };
                if self.codec.decode_text(content) == incoming {
                    return Ok(field.variant.clone());
                }
                Ok(FieldVariant::Text {
                    kind: *kind,
                    content: self.codec.encode(incoming),
                })
            }

            FieldVariant::Button {
                kind: ButtonKind::Push,
                ..
            } => Err(FieldError::UnsupportedOperation {
                path: path.clone(),
                reason: "push buttons carry no state",
            }),

            FieldVariant::Button { kind, .. } => match value.as_bool() {
                Some(state) => Ok(FieldVariant::Button { kind: *kind, state }),
                None => Err(shape_error(Shape::Bool)),
            },

            FieldVariant::Choice(choice) if choice.multi_select => {
                let items: &[Value] = match value {
                    Value::Sequence(items) => items,
                    Value::Scalar(Scalar::Null) => &[],
                    _ => return Err(shape_error(Shape::Sequence)),
                };
                let mut selected = BTreeSet::new();
                for item in items {
                    let text = item.as_str().ok_or_else(|| shape_error(Shape::Sequence))?;
                    let index = self.option_index(choice, text).ok_or_else(|| {
                        FieldError::InvalidChoice {
                            path: path.clone(),
                            value: text.to_owned(),
                        }
                    })?;
                    selected.insert(index);
                }
                Ok(FieldVariant::Choice(ChoiceField {
                    selected,
                    ..choice.clone()
                }))
            }

            FieldVariant::Choice(choice) => {
                let text = value.as_str().ok_or_else(|| shape_error(Shape::String))?;
                self.resolve_single_choice(path, choice, text)
                    .map(FieldVariant::Choice)
            }

            FieldVariant::Signature(_) => Err(FieldError::UnsupportedOperation {
                path: path.clone(),
                reason: "signatures are read-only",
            }),
        }
    }

    fn resolve_single_choice(
        &self,
        path: &FieldPath,
        choice: &ChoiceField,
        text: &str,
    ) -> Result<ChoiceField, FieldError> {
        if let Some(index) = self.option_index(choice, text) {
            return Ok(ChoiceField {
                selected: BTreeSet::from([index]),
                edit_value: None,
                ..choice.clone()
            });
        }

        if choice.editable {
            let unchanged = choice
                .edit_value
                .as_ref()
                .is_some_and(|edit| self.codec.decode_text(edit) == text);
            if unchanged {
                return Ok(choice.clone());
            }
            return Ok(ChoiceField {
                selected: BTreeSet::new(),
                edit_value: Some(self.codec.encode(text)),
                ..choice.clone()
            });
        }

        // An empty string is what extraction produces for "nothing selected".
        if text.is_empty() {
            return Ok(ChoiceField {
                selected: BTreeSet::new(),
                ..choice.clone()
            });
        }

        Err(FieldError::InvalidChoice {
            path: path.clone(),
            value: text.to_owned(),
        })
    }

    fn option_index(&self, choice: &ChoiceField, text: &str) -> Option<usize> {
        choice
            .options
            .iter()
            .position(|option| self.codec.decode_text(option) == text)
    }
}
