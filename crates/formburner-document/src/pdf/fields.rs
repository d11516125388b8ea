// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AcroForm field dictionaries — names, inheritable attributes, flags, and
// conversion into the document-independent `Field` model.

use std::collections::BTreeSet;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::warn;

use formburner_core::types::{
    ButtonKind, ChoiceField, Field, FieldVariant, TextKind, TextString,
};
use formburner_core::TextCodec;

use super::signature;

/// Bits of the `/Ff` field-flags entry.
pub mod flags {
    pub const READ_ONLY: u32 = 1;
    pub const MULTILINE: u32 = 1 << 12;
    pub const RADIO: u32 = 1 << 15;
    pub const PUSH: u32 = 1 << 16;
    pub const COMBO: u32 = 1 << 17;
    pub const EDIT: u32 = 1 << 18;
    pub const FILE_SELECT: u32 = 1 << 20;
    pub const MULTI_SELECT: u32 = 1 << 21;
}

/// Upper bound on `/Parent` and `/Kids` chains; deeper means a cycle.
pub(crate) const MAX_DEPTH: usize = 32;

/// Handle of one form field inside a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// The terminal field dictionary.
    pub field: ObjectId,
    /// The widget annotation this entry was found through, if any.
    pub widget: Option<ObjectId>,
}

/// One `/Opt` entry: the value written to `/V` and the text shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChoiceOption {
    pub export: Vec<u8>,
    pub display: Vec<u8>,
}

// -- Object helpers -----------------------------------------------------------

/// Follow indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    let mut current = object;
    for _ in 0..MAX_DEPTH {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => current = target,
                Err(_) => break,
            },
            _ => break,
        }
    }
    current
}

pub(crate) fn dictionary(doc: &Document, id: ObjectId) -> Option<&Dictionary> {
    doc.get_object(id).ok()?.as_dict().ok()
}

pub(crate) fn entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|object| resolve(doc, object))
}

pub(crate) fn name_of(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Name(name) => Some(name),
        _ => None,
    }
}

pub(crate) fn string_of(object: &Object) -> Option<&[u8]> {
    match object {
        Object::String(bytes, _) => Some(bytes),
        _ => None,
    }
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"Parent").ok()?.as_reference().ok()
}

pub(crate) fn is_widget(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .ok()
        .and_then(name_of)
        .is_some_and(|subtype| subtype == b"Widget")
}

/// Field dictionaries carry a partial name; widget-only kids do not.
pub(crate) fn is_field(dict: &Dictionary) -> bool {
    dict.has(b"T")
}

// -- Field attributes ---------------------------------------------------------

/// Look `key` up on the field, then on its ancestors.
pub(crate) fn inherited<'a>(doc: &'a Document, id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = Some(id);
    for _ in 0..MAX_DEPTH {
        let dict = dictionary(doc, current?)?;
        if let Some(value) = entry(doc, dict, key) {
            return Some(value);
        }
        current = parent_of(dict);
    }
    None
}

pub(crate) fn field_flags(doc: &Document, id: ObjectId) -> u32 {
    inherited(doc, id, b"Ff")
        .and_then(|object| object.as_i64().ok())
        .and_then(|bits| u32::try_from(bits).ok())
        .unwrap_or(0)
}

pub(crate) fn field_type(doc: &Document, id: ObjectId) -> Option<&[u8]> {
    inherited(doc, id, b"FT").and_then(name_of)
}

pub(crate) fn is_radio(doc: &Document, id: ObjectId) -> bool {
    field_type(doc, id) == Some(b"Btn".as_slice()) && field_flags(doc, id) & flags::RADIO != 0
}

/// Fully qualified name: the partial names of the `/Parent` chain, outermost
/// first, joined with dots.
pub fn qualified_name(doc: &Document, codec: &TextCodec, id: ObjectId) -> Option<String> {
    let mut segments = Vec::new();
    let mut current = Some(id);
    for _ in 0..MAX_DEPTH {
        let Some(node) = current else { break };
        let dict = dictionary(doc, node)?;
        if let Some(partial) = entry(doc, dict, b"T").and_then(string_of) {
            segments.push(codec.decode(partial));
        }
        current = parent_of(dict);
    }
    if current.is_some() {
        warn!(?id, "field ancestry too deep, name truncated");
    }
    if segments.is_empty() {
        return None;
    }
    segments.reverse();
    Some(segments.join("."))
}

/// Field-dictionary kids of a field.
pub(crate) fn field_kids(doc: &Document, id: ObjectId) -> Vec<ObjectId> {
    kid_ids(doc, id)
        .into_iter()
        .filter(|kid| dictionary(doc, *kid).is_some_and(is_field))
        .collect()
}

/// Widget annotations of a terminal field (itself, when merged, and its
/// widget-only kids).
pub(crate) fn widgets(doc: &Document, id: ObjectId) -> Vec<ObjectId> {
    let mut found = Vec::new();
    if dictionary(doc, id).is_some_and(is_widget) {
        found.push(id);
    }
    found.extend(
        kid_ids(doc, id)
            .into_iter()
            .filter(|kid| dictionary(doc, *kid).is_some_and(|dict| !is_field(dict))),
    );
    found
}

fn kid_ids(doc: &Document, id: ObjectId) -> Vec<ObjectId> {
    let Some(Object::Array(kids)) = dictionary(doc, id).and_then(|dict| entry(doc, dict, b"Kids"))
    else {
        return Vec::new();
    };
    kids.iter()
        .filter_map(|kid| kid.as_reference().ok())
        .collect()
}

/// Name of the widget's "on" appearance state: the first `/AP /N` key
/// other than `Off`.
pub(crate) fn on_state(doc: &Document, widget: ObjectId) -> Option<Vec<u8>> {
    let appearance = dictionary(doc, widget).and_then(|dict| entry(doc, dict, b"AP"))?;
    let normal = appearance
        .as_dict()
        .ok()
        .and_then(|ap| entry(doc, ap, b"N"))?
        .as_dict()
        .ok()?;
    normal
        .iter()
        .map(|(key, _)| key)
        .find(|key| key.as_slice() != b"Off")
        .cloned()
}

pub(crate) fn choice_options(doc: &Document, id: ObjectId) -> Vec<ChoiceOption> {
    let Some(Object::Array(entries)) = inherited(doc, id, b"Opt") else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|item| match resolve(doc, item) {
            Object::String(bytes, _) => Some(ChoiceOption {
                export: bytes.clone(),
                display: bytes.clone(),
            }),
            Object::Array(pair) => {
                let export = pair.first().map(|o| resolve(doc, o)).and_then(string_of)?;
                let display = pair
                    .get(1)
                    .map(|o| resolve(doc, o))
                    .and_then(string_of)
                    .unwrap_or(export);
                Some(ChoiceOption {
                    export: export.to_vec(),
                    display: display.to_vec(),
                })
            }
            _ => None,
        })
        .collect()
}

// -- Conversion into the field model -----------------------------------------

/// Snapshot the state of one field. Unknown field types yield `None`.
pub fn read_field(doc: &Document, handle: FieldRef, source_len: usize) -> Option<Field> {
    let dict = dictionary(doc, handle.field)?;
    let bits = field_flags(doc, handle.field);

    let variant = match field_type(doc, handle.field) {
        Some(b"Btn") => read_button(doc, handle, bits),
        Some(b"Tx") => read_text(doc, handle.field, bits),
        Some(b"Ch") => read_choice(doc, handle.field, bits),
        Some(b"Sig") => FieldVariant::Signature(signature::read(doc, handle.field, source_len)),
        other => {
            warn!(
                field = ?handle.field,
                field_type = %other.map(String::from_utf8_lossy).unwrap_or_default(),
                "unsupported field type, skipped"
            );
            return None;
        }
    };

    let mut field = Field::new(variant).read_only(bits & flags::READ_ONLY != 0);
    if let Some(display_name) = entry(doc, dict, b"TU").and_then(string_of) {
        field = field.with_display_name(TextString::from_bytes(display_name));
    }
    if let Some(mapping_name) = entry(doc, dict, b"TM").and_then(string_of) {
        field = field.with_mapping_name(TextString::from_bytes(mapping_name));
    }
    Some(field)
}

fn read_button(doc: &Document, handle: FieldRef, bits: u32) -> FieldVariant {
    let kind = if bits & flags::PUSH != 0 {
        ButtonKind::Push
    } else if bits & flags::RADIO != 0 {
        ButtonKind::Radio
    } else {
        ButtonKind::Check
    };
    let state = kind != ButtonKind::Push && button_is_on(doc, handle, kind);
    FieldVariant::Button { kind, state }
}

fn button_is_on(doc: &Document, handle: FieldRef, kind: ButtonKind) -> bool {
    let widget_state = handle
        .widget
        .and_then(|widget| dictionary(doc, widget))
        .and_then(|dict| entry(doc, dict, b"AS"))
        .and_then(name_of);
    if let Some(state) = widget_state {
        return state != b"Off";
    }

    let Some(value) = inherited(doc, handle.field, b"V").and_then(name_of) else {
        return false;
    };
    match (kind, handle.widget) {
        (ButtonKind::Radio, Some(widget)) => on_state(doc, widget).is_some_and(|on| on == value),
        _ => value != b"Off",
    }
}

fn read_text(doc: &Document, id: ObjectId, bits: u32) -> FieldVariant {
    let kind = if bits & flags::FILE_SELECT != 0 {
        TextKind::FileSelect
    } else if bits & flags::MULTILINE != 0 {
        TextKind::Multiline
    } else {
        TextKind::Normal
    };
    let content = inherited(doc, id, b"V")
        .and_then(string_of)
        .map(TextString::from_bytes)
        .unwrap_or_default();
    FieldVariant::Text { kind, content }
}

fn read_choice(doc: &Document, id: ObjectId, bits: u32) -> FieldVariant {
    let options = choice_options(doc, id);
    let multi_select = bits & flags::MULTI_SELECT != 0;
    let editable = bits & flags::COMBO != 0 && bits & flags::EDIT != 0;

    let values: Vec<&[u8]> = match inherited(doc, id, b"V") {
        Some(Object::String(bytes, _)) => vec![bytes.as_slice()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| string_of(resolve(doc, item)))
            .collect(),
        _ => Vec::new(),
    };

    // `/I` disambiguates options sharing an export value, so it wins when usable.
    let indices: Option<BTreeSet<usize>> = match inherited(doc, id, b"I") {
        Some(Object::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .ok()
                    .and_then(|index| usize::try_from(index).ok())
                    .filter(|index| *index < options.len())
            })
            .collect(),
        _ => None,
    };
    let selected = indices.unwrap_or_else(|| {
        values
            .iter()
            .filter_map(|value| options.iter().position(|o| o.export.as_slice() == *value))
            .collect()
    });

    let edit_value = if editable && selected.is_empty() {
        values
            .first()
            .filter(|value| !value.is_empty())
            .map(|value| TextString::from_bytes(*value))
    } else {
        None
    };

    FieldVariant::Choice(ChoiceField {
        options: options
            .into_iter()
            .map(|option| TextString::from_bytes(option.display))
            .collect(),
        selected,
        multi_select,
        editable,
        edit_value,
    })
}

#[cfg(test)]
mod tests {
    use lopdf::dictionary;

    use super::*;

    fn codec() -> TextCodec {
        TextCodec::new()
    }

    #[test]
    fn names_and_flags_are_inherited() {
        let mut doc = Document::with_version("1.7");
        let parent = doc.add_object(dictionary! {
            "T" => Object::string_literal("address"),
            "FT" => "Tx",
            "Ff" => i64::from(flags::READ_ONLY | flags::MULTILINE),
        });
        let child = doc.add_object(dictionary! {
            "T" => Object::string_literal("street"),
            "Parent" => parent,
            "V" => Object::string_literal("Main"),
        });

        assert_eq!(qualified_name(&doc, &codec(), child).as_deref(), Some("address.street"));
        assert_eq!(field_type(&doc, child), Some(b"Tx".as_slice()));

        let field = read_field(&doc, FieldRef { field: child, widget: None }, 0).unwrap();
        assert!(field.read_only);
        match field.variant {
            FieldVariant::Text { kind, content } => {
                assert_eq!(kind, TextKind::Multiline);
                assert_eq!(codec().decode_text(&content), "Main");
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn choice_reads_export_pairs_and_selection() {
        let mut doc = Document::with_version("1.7");
        let id = doc.add_object(dictionary! {
            "T" => Object::string_literal("color"),
            "FT" => "Ch",
            "Ff" => i64::from(flags::COMBO),
            "Opt" => vec![
                Object::Array(vec![Object::string_literal("r"), Object::string_literal("Red")]),
                Object::string_literal("Green"),
            ],
            "V" => Object::string_literal("r"),
            "TU" => Object::string_literal("Favourite colour"),
        });

        let field = read_field(&doc, FieldRef { field: id, widget: None }, 0).unwrap();
        assert_eq!(
            field.display_name.as_ref().map(|name| codec().decode_text(name)).as_deref(),
            Some("Favourite colour")
        );
        assert!(field.mapping_name.is_none());
        let FieldVariant::Choice(choice) = field.variant else {
            panic!("expected a choice");
        };
        let options: Vec<String> = choice.options.iter().map(|o| codec().decode_text(o)).collect();
        assert_eq!(options, vec!["Red", "Green"]);
        assert_eq!(choice.selected, BTreeSet::from([0]));
        assert!(!choice.editable);
        assert!(!choice.multi_select);
    }

    #[test]
    fn editable_combo_keeps_free_text() {
        let mut doc = Document::with_version("1.7");
        let id = doc.add_object(dictionary! {
            "T" => Object::string_literal("city"),
            "FT" => "Ch",
            "Ff" => i64::from(flags::COMBO | flags::EDIT),
            "Opt" => vec![Object::string_literal("Paris")],
            "V" => Object::string_literal("Lisbon"),
        });

        let field = read_field(&doc, FieldRef { field: id, widget: None }, 0).unwrap();
        let FieldVariant::Choice(choice) = field.variant else {
            panic!("expected a choice");
        };
        assert!(choice.editable);
        assert!(choice.selected.is_empty());
        assert_eq!(
            choice.edit_value.map(|edit| codec().decode_text(&edit)).as_deref(),
            Some("Lisbon")
        );
    }

    #[test]
    fn check_box_state_follows_appearance() {
        let mut doc = Document::with_version("1.7");
        let id = doc.add_object(dictionary! {
            "Subtype" => "Widget",
            "T" => Object::string_literal("agree"),
            "FT" => "Btn",
            "V" => "Off",
            "AS" => "On",
            "AP" => dictionary! { "N" => dictionary! { "On" => Object::Null, "Off" => Object::Null } },
        });

        assert_eq!(on_state(&doc, id), Some(b"On".to_vec()));
        assert_eq!(widgets(&doc, id), vec![id]);
        let field = read_field(&doc, FieldRef { field: id, widget: Some(id) }, 0).unwrap();
        assert_eq!(
            field.variant,
            FieldVariant::Button {
                kind: ButtonKind::Check,
                state: true
            }
        );
    }

    #[test]
    fn unknown_types_are_skipped() {
        let mut doc = Document::with_version("1.7");
        let id = doc.add_object(dictionary! {
            "T" => Object::string_literal("mystery"),
            "FT" => "Zz",
        });
        assert!(read_field(&doc, FieldRef { field: id, widget: None }, 0).is_none());
    }

    #[test]
    fn mapping_name_is_read() {
        let mut doc = Document::with_version("1.7");
        let id = doc.add_object(dictionary! {
            "T" => Object::string_literal("zip"),
            "FT" => "Tx",
            "TM" => Object::string_literal("postal_code"),
        });

        let field = read_field(&doc, FieldRef { field: id, widget: None }, 0).unwrap();
        assert_eq!(
            field.mapping_name.as_ref().map(|name| codec().decode_text(name)).as_deref(),
            Some("postal_code")
        );
    }

    #[test]
    fn out_of_range_flags_count_as_none() {
        let mut doc = Document::with_version("1.7");
        let negative = doc.add_object(dictionary! {
            "T" => Object::string_literal("a"),
            "FT" => "Btn",
            "Ff" => -1_i64,
        });
        let oversized = doc.add_object(dictionary! {
            "T" => Object::string_literal("b"),
            "FT" => "Btn",
            "Ff" => i64::from(u32::MAX) + i64::from(flags::RADIO) + 1,
        });

        assert_eq!(field_flags(&doc, negative), 0);
        assert_eq!(field_flags(&doc, oversized), 0);
        assert!(!is_radio(&doc, negative));
        let field = read_field(&doc, FieldRef { field: negative, widget: None }, 0).unwrap();
        assert_eq!(
            field.variant,
            FieldVariant::Button {
                kind: ButtonKind::Check,
                state: false
            }
        );
        assert!(!field.read_only);
    }
}
