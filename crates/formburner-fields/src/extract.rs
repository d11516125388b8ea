// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction — projects a field tree into a `Value` of the same shape.
//
// Everything that is documentation for the person editing the data (choice
// lists, display names, read-only markers, rendering hints) goes into the
// side table of `Annotations`, never into the value itself.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::warn;

use formburner_core::config::BurnerConfig;
use formburner_core::types::{
    ButtonKind, ChoiceField, Field, FieldPath, FieldVariant, SignatureInfo, TextKind,
};
use formburner_core::TextCodec;

use crate::tree::{Branch, FieldNode, FieldTree};
use crate::value::Value;

/// How the serializer should render a string scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScalarStyle {
    #[default]
    Plain,
    /// Literal block, used for multiline text.
    Literal,
}

/// Out-of-band notes attached to one extracted node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub comment: Option<String>,
    pub style: ScalarStyle,
}

pub type Annotations = HashMap<FieldPath, Annotation>;

/// Conditions worth telling the user about that do not stop extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractWarning {
    /// Push buttons have no persistent state; extracted as null.
    PushButton(FieldPath),
    /// File-select fields are handled as plain text.
    FileSelect(FieldPath),
}

/// Result of an extraction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub value: Value,
    pub annotations: Annotations,
    pub warnings: Vec<ExtractWarning>,
}

/// Walks a [`FieldTree`] and produces its [`Value`] projection.
#[derive(Debug, Clone)]
pub struct Extractor {
    codec: TextCodec,
    annotate: bool,
    show_types: bool,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(TextCodec::new())
    }
}

impl Extractor {
    pub fn new(codec: TextCodec) -> Self {
        Self {
            codec,
            annotate: true,
            show_types: false,
        }
    }

    pub fn from_config(codec: TextCodec, config: &BurnerConfig) -> Self {
        Self {
            codec,
            annotate: config.annotate,
            show_types: config.show_types,
        }
    }

    pub fn with_annotations(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    pub fn with_types(mut self, show_types: bool) -> Self {
        self.show_types = show_types;
        self
    }

    /// Extract the whole tree. The result is always a mapping.
    pub fn run<H>(&self, tree: &FieldTree<H>) -> Extraction {
        let mut annotations = Annotations::new();
        let mut warnings = Vec::new();
        let value = self.extract_branch(
            tree.root(),
            &FieldPath::root(),
            &mut annotations,
            &mut warnings,
        );
        Extraction {
            value,
            annotations,
            warnings,
        }
    }

    /// Extract a single node. Returns `None` for a branch without children,
    /// which its parent omits.
    pub fn extract_node<H>(
        &self,
        node: &FieldNode<H>,
        path: &FieldPath,
        annotations: &mut Annotations,
        warnings: &mut Vec<ExtractWarning>,
    ) -> Option<Value> {
        match node {
            FieldNode::Branch(branch) if branch.is_empty() => None,
            FieldNode::Branch(branch) => {
                Some(self.extract_branch(branch, path, annotations, warnings))
            }
            FieldNode::Leaf(leaf) => {
                let field = leaf.field();
                let (value, style) = self.extract_field(path, field, warnings);
                let comment = self.comment_for(path, field);
                if comment.is_some() || style != ScalarStyle::Plain {
                    annotations.insert(path.clone(), Annotation { comment, style });
                }
                Some(value)
            }
        }
    }

    fn extract_branch<H>(
        &self,
        branch: &Branch<H>,
        path: &FieldPath,
        annotations: &mut Annotations,
        warnings: &mut Vec<ExtractWarning>,
    ) -> Value {
        let mut map = IndexMap::with_capacity(branch.len());
        for (key, child) in branch.children() {
            let child_path = path.child(key);
            if let Some(value) = self.extract_node(child, &child_path, annotations, warnings) {
                map.insert(key.to_owned(), value);
            }
        }
        Value::Mapping(map)
    }

    fn extract_field(
        &self,
        path: &FieldPath,
        field: &Field,
        warnings: &mut Vec<ExtractWarning>,
    ) -> (Value, ScalarStyle) {
        match &field.variant {
            FieldVariant::Text { kind, content } => {
                let text = self.codec.decode_text(content);
                let style = match kind {
                    TextKind::Multiline => ScalarStyle::Literal,
                    TextKind::FileSelect => {
                        warn!(field = %path, "file select field managed as simple text");
                        warnings.push(ExtractWarning::FileSelect(path.clone()));
                        ScalarStyle::Plain
                    }
                    TextKind::Normal => ScalarStyle::Plain,
                };
                (Value::string(text), style)
            }
            FieldVariant::Button {
                kind: ButtonKind::Push,
                ..
            } => {
                warn!(field = %path, "push button ignored");
                warnings.push(ExtractWarning::PushButton(path.clone()));
                (Value::null(), ScalarStyle::Plain)
            }
            FieldVariant::Button { state, .. } => (Value::bool(*state), ScalarStyle::Plain),
            FieldVariant::Choice(choice) => (self.extract_choice(choice), ScalarStyle::Plain),
            FieldVariant::Signature(info) => (self.extract_signature(info), ScalarStyle::Plain),
        }
    }

    fn extract_choice(&self, choice: &ChoiceField) -> Value {
        let option_text = |index: &usize| {
            choice
                .options
                .get(*index)
                .map(|option| self.codec.decode_text(option))
        };

        if choice.multi_select {
            let selected = choice
                .selected
                .iter()
                .filter_map(option_text)
                .map(Value::string)
                .collect();
            return Value::Sequence(selected);
        }

        if choice.editable {
            if let Some(edit) = choice.edit_value.as_ref().filter(|edit| !edit.is_empty()) {
                let text = self.codec.decode_text(edit);
                if !text.is_empty() {
                    return Value::string(text);
                }
            }
        }

        let current = choice.selected.first().and_then(option_text).unwrap_or_default();
        Value::string(current)
    }

    fn extract_signature(&self, info: &SignatureInfo) -> Value {
        let mut map = IndexMap::with_capacity(6);
        map.insert("status".to_owned(), Value::string(info.status.as_str()));
        map.insert(
            "signer".to_owned(),
            Value::string(self.codec.decode_text(&info.signer)),
        );
        map.insert(
            "time".to_owned(),
            Value::string(info.time.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        );
        map.insert(
            "location".to_owned(),
            Value::string(self.codec.decode_text(&info.location)),
        );
        map.insert(
            "reason".to_owned(),
            Value::string(self.codec.decode_text(&info.reason)),
        );
        let scope = if info.signs_total_document {
            "Total"
        } else {
            "Partial"
        };
        map.insert("scope".to_owned(), Value::string(scope));
        Value::Mapping(map)
    }

    fn comment_for(&self, path: &FieldPath, field: &Field) -> Option<String> {
        let mut fragments = Vec::new();

        if self.show_types {
            fragments.push(field.variant.type_label().to_owned());
        }

        if self.annotate {
            if let FieldVariant::Choice(choice) = &field.variant {
                let options: Vec<String> = choice
                    .options
                    .iter()
                    .map(|option| self.codec.decode_text(option))
                    .collect();
                let label = if choice.editable { "Suggested" } else { "Allowed" };
                fragments.push(format!("{label} values: {}", options.join(", ")));
            }

            let mut names: Vec<String> = Vec::new();
            for name in [&field.mapping_name, &field.display_name].into_iter().flatten() {
                let name = self.codec.decode_text(name);
                if !name.is_empty()
                    && Some(name.as_str()) != path.leaf_name()
                    && !names.contains(&name)
                {
                    names.push(name);
                }
            }
            fragments.extend(names);

            if field.read_only {
                fragments.push("[Read Only]".to_owned());
            }
        }

        if fragments.is_empty() {
            None
        } else {
            Some(fragments.join(" | "))
        }
    }
}
