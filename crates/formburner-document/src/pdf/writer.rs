// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF form writer — stores the modified leaves of a field tree back into
// their field dictionaries.

use lopdf::{Object, ObjectId, StringFormat};
use tracing::{debug, info, instrument};

use formburner_core::error::{BurnerError, Result};
use formburner_core::types::{ButtonKind, ChoiceField, FieldVariant, TextString};
use formburner_fields::FieldTree;

use super::fields::{self, FieldRef, dictionary, entry, name_of};
use super::reader::PdfForm;

/// Appearance state of an unselected button.
const OFF: &[u8] = b"Off";
/// On-state used when a widget has no appearance dictionary.
const DEFAULT_ON: &[u8] = b"Yes";

impl PdfForm {
    /// Write every modified leaf of `tree` into the document.
    ///
    /// Returns the number of fields written. Nothing reaches disk until
    /// [`PdfForm::commit`].
    #[instrument(skip_all)]
    pub fn apply(&mut self, tree: &FieldTree<FieldRef>) -> Result<usize> {
        let mut written = 0;
        for (path, leaf) in tree.leaves() {
            if !leaf.is_modified() {
                continue;
            }
            self.write_field(*leaf.handle(), &leaf.field().variant)
                .map_err(|err| BurnerError::Save(format!("field '{path}': {err}")))?;
            debug!(field = %path, "field written");
            written += 1;
        }

        if written > 0 && self.need_appearances {
            self.set_need_appearances()
                .map_err(|err| BurnerError::Save(format!("AcroForm: {err}")))?;
        }
        info!(written, "form fields applied");
        Ok(written)
    }

    fn write_field(&mut self, handle: FieldRef, variant: &FieldVariant) -> lopdf::Result<()> {
        match variant {
            FieldVariant::Text { content, .. } => {
                self.set(handle.field, "V", text_object(content))
            }
            FieldVariant::Button {
                kind: ButtonKind::Check,
                state,
            } => self.write_check_box(handle.field, *state),
            FieldVariant::Button {
                kind: ButtonKind::Radio,
                state,
            } => self.write_radio(handle, *state),
            FieldVariant::Choice(choice) => self.write_choice(handle.field, choice),
            // Stateless or never filled.
            FieldVariant::Button {
                kind: ButtonKind::Push,
                ..
            }
            | FieldVariant::Signature(_) => Ok(()),
        }
    }

    fn write_check_box(&mut self, field: ObjectId, state: bool) -> lopdf::Result<()> {
        let widgets = fields::widgets(&self.document, field);
        let value = if state {
            widgets
                .iter()
                .find_map(|widget| fields::on_state(&self.document, *widget))
                .unwrap_or_else(|| DEFAULT_ON.to_vec())
        } else {
            OFF.to_vec()
        };
        self.set(field, "V", Object::Name(value))?;

        for widget in widgets {
            let appearance = if state {
                self.on_state_or_default(widget)
            } else {
                OFF.to_vec()
            };
            self.set(widget, "AS", Object::Name(appearance))?;
        }
        Ok(())
    }

    /// A radio leaf is one widget of the group: selecting it turns its
    /// siblings off, clearing it only touches this widget.
    fn write_radio(&mut self, handle: FieldRef, state: bool) -> lopdf::Result<()> {
        let target = handle.widget.unwrap_or(handle.field);
        let on = self.on_state_or_default(target);

        if state {
            self.set(handle.field, "V", Object::Name(on.clone()))?;
            for widget in fields::widgets(&self.document, handle.field) {
                let appearance = if widget == target { on.clone() } else { OFF.to_vec() };
                self.set(widget, "AS", Object::Name(appearance))?;
            }
            return Ok(());
        }

        let current = dictionary(&self.document, handle.field)
            .and_then(|dict| entry(&self.document, dict, b"V"))
            .and_then(name_of)
            .map(<[u8]>::to_vec);
        if current.as_deref() == Some(on.as_slice()) {
            self.set(handle.field, "V", Object::Name(OFF.to_vec()))?;
        }
        self.set(target, "AS", Object::Name(OFF.to_vec()))
    }

    fn write_choice(&mut self, field: ObjectId, choice: &ChoiceField) -> lopdf::Result<()> {
        if let Some(edit) = choice.edit_value.as_ref().filter(|_| choice.selected.is_empty()) {
            self.set(field, "V", text_object(edit))?;
            self.remove(field, b"I")?;
            return Ok(());
        }

        let options = fields::choice_options(&self.document, field);
        let exports: Vec<Object> = choice
            .selected
            .iter()
            .filter_map(|index| options.get(*index))
            .map(|option| Object::String(option.export.clone(), StringFormat::Literal))
            .collect();
        let indices: Vec<Object> = choice
            .selected
            .iter()
            .filter(|index| **index < options.len())
            .map(|index| Object::Integer(*index as i64))
            .collect();

        match (choice.multi_select, exports.len()) {
            (_, 0) => self.remove(field, b"V")?,
            (true, _) => self.set(field, "V", Object::Array(exports))?,
            (false, _) => {
                if let Some(export) = exports.into_iter().next() {
                    self.set(field, "V", export)?;
                }
            }
        }
        if indices.is_empty() {
            self.remove(field, b"I")
        } else {
            self.set(field, "I", Object::Array(indices))
        }
    }

    fn set_need_appearances(&mut self) -> lopdf::Result<()> {
        let root = self.document.trailer.get(b"Root")?.as_reference()?;
        let indirect = self
            .document
            .get_dictionary(root)?
            .get(b"AcroForm")?
            .as_reference()
            .ok();
        match indirect {
            Some(id) => self.set(id, "NeedAppearances", Object::Boolean(true)),
            None => {
                self.document
                    .get_dictionary_mut(root)?
                    .get_mut(b"AcroForm")?
                    .as_dict_mut()?
                    .set("NeedAppearances", true);
                Ok(())
            }
        }
    }

    // -- Helpers --------------------------------------------------------------

    fn on_state_or_default(&self, widget: ObjectId) -> Vec<u8> {
        fields::on_state(&self.document, widget).unwrap_or_else(|| DEFAULT_ON.to_vec())
    }

    fn set(&mut self, id: ObjectId, key: &str, value: Object) -> lopdf::Result<()> {
        self.document.get_dictionary_mut(id)?.set(key, value);
        Ok(())
    }

    fn remove(&mut self, id: ObjectId, key: &[u8]) -> lopdf::Result<()> {
        self.document.get_dictionary_mut(id)?.remove(key);
        Ok(())
    }
}

fn text_object(text: &TextString) -> Object {
    Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
}

#[cfg(test)]
mod tests {
    use formburner_core::error::FieldError;
    use formburner_fields::{Extractor, Filler, Value};

    use super::*;
    use crate::pdf::fixtures;

    fn fill(form: &PdfForm, changes: &[(&str, Value)]) -> (FieldTree<FieldRef>, Vec<FieldError>) {
        let mut tree = form.field_tree();
        let mut value = Extractor::default().run(&tree).value;
        for (dotted, replacement) in changes {
            set_pointer(&mut value, dotted, replacement.clone());
        }
        let mut errors = Filler::default().run(&mut tree, &value);
        // Signature fields refuse every value, including their own.
        errors.retain(|err| err.path().to_string() != "sig");
        (tree, errors)
    }

    fn set_pointer(value: &mut Value, dotted: &str, replacement: Value) {
        let (parents, last) = match dotted.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, dotted),
        };
        let mut target = value;
        for key in parents.into_iter().flat_map(|p| p.split('.')) {
            let Value::Mapping(map) = target else {
                panic!("not a mapping at {key}");
            };
            target = map.get_mut(key).unwrap();
        }
        let Value::Mapping(map) = target else {
            panic!("not a mapping at {last}");
        };
        map.insert(last.to_owned(), replacement);
    }

    fn reload(form: &mut PdfForm) -> (PdfForm, Value) {
        let bytes = form.save_to_bytes().unwrap();
        let reopened = PdfForm::from_bytes(&bytes).unwrap();
        let value = Extractor::default().run(&reopened.field_tree()).value;
        (reopened, value)
    }

    fn is_name(object: &Object, expected: &[u8]) -> bool {
        name_of(object) == Some(expected)
    }

    fn raw_value(form: &PdfForm, tree: &FieldTree<FieldRef>, dotted: &str) -> Object {
        let field = tree.leaf(dotted).unwrap().handle().field;
        form.document.get_dictionary(field).unwrap().get(b"V").unwrap().clone()
    }

    #[test]
    fn unchanged_data_writes_nothing() {
        let mut form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let (tree, errors) = fill(&form, &[]);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(form.apply(&tree).unwrap(), 0);
    }

    #[test]
    fn filled_values_survive_a_save() {
        let mut form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let (tree, errors) = fill(
            &form,
            &[
                ("person.name", "Grace Hopper".into()),
                ("person.agree", false.into()),
                ("color", "Red".into()),
                ("toppings", Value::Sequence(vec!["Cheese".into()])),
                ("notes", "first\nsecond\n".into()),
            ],
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(form.apply(&tree).unwrap(), 5);

        let (reopened, value) = reload(&mut form);
        assert_eq!(value.pointer("person.name"), Some(&Value::string("Grace Hopper")));
        assert_eq!(value.pointer("person.agree"), Some(&Value::bool(false)));
        assert_eq!(value.pointer("color"), Some(&Value::string("Red")));
        assert_eq!(
            value.pointer("toppings"),
            Some(&Value::Sequence(vec!["Cheese".into()]))
        );
        assert_eq!(value.pointer("notes"), Some(&Value::string("first\nsecond\n")));

        // Choices store the export value, not the display text.
        let tree = reopened.field_tree();
        assert!(matches!(
            raw_value(&reopened, &tree, "color"),
            Object::String(export, _) if export == b"r"
        ));
    }

    #[test]
    fn check_box_toggles_value_and_appearance() {
        let mut form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let (tree, _) = fill(&form, &[("person.agree", false.into())]);
        form.apply(&tree).unwrap();

        let field = tree.leaf("person.agree").unwrap().handle().field;
        let dict = form.document.get_dictionary(field).unwrap();
        assert!(is_name(dict.get(b"V").unwrap(), b"Off"));
        assert!(is_name(dict.get(b"AS").unwrap(), b"Off"));

        let (tree, _) = fill(&form, &[("person.agree", true.into())]);
        form.apply(&tree).unwrap();
        let dict = form.document.get_dictionary(field).unwrap();
        assert!(is_name(dict.get(b"V").unwrap(), b"Yes"));
        assert!(is_name(dict.get(b"AS").unwrap(), b"Yes"));
    }

    #[test]
    fn clearing_the_selected_radio_turns_the_group_off() {
        let mut form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let (tree, errors) = fill(&form, &[("size", false.into())]);
        assert!(errors.is_empty());
        form.apply(&tree).unwrap();

        assert!(is_name(&raw_value(&form, &tree, "size"), b"Off"));
        let (_, value) = reload(&mut form);
        assert_eq!(value.pointer("size"), Some(&Value::bool(false)));
    }

    #[test]
    fn need_appearances_is_set_when_something_changed() {
        let mut form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let (tree, _) = fill(&form, &[("person.name", "Grace".into())]);
        form.apply(&tree).unwrap();

        let root = form.document.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let acroform = form
            .document
            .get_dictionary(root)
            .unwrap()
            .get(b"AcroForm")
            .unwrap()
            .as_dict()
            .unwrap();
        assert!(matches!(acroform.get(b"NeedAppearances"), Ok(Object::Boolean(true))));
    }

    #[test]
    fn appearance_flag_can_be_disabled() {
        let mut form = PdfForm::from_bytes(&fixtures::sample_form())
            .unwrap()
            .with_need_appearances(false);
        let (tree, _) = fill(&form, &[("person.name", "Grace".into())]);
        form.apply(&tree).unwrap();

        let root = form.document.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let catalog = form.document.get_dictionary(root).unwrap();
        let acroform = catalog.get(b"AcroForm").unwrap().as_dict().unwrap();
        assert!(acroform.get(b"NeedAppearances").is_err());
    }

    #[test]
    fn read_only_field_rejects_a_new_value() {
        let form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let (tree, errors) = fill(&form, &[("id", "43".into())]);
        assert_eq!(errors.len(), 1);
        assert!(!tree.leaf("id").unwrap().is_modified());
    }

    #[test]
    fn unknown_choice_leaves_document_untouched() {
        let mut form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let mut tree = form.field_tree();
        let data = std::iter::once(("color".to_owned(), Value::string("Purple"))).collect();
        let errors = Filler::default().run(&mut tree, &Value::Mapping(data));

        assert!(errors.contains(&FieldError::InvalidChoice {
            path: formburner_core::types::FieldPath::parse("color"),
            value: "Purple".into(),
        }));
        assert_eq!(form.apply(&tree).unwrap(), 0);
        let (_, value) = reload(&mut form);
        assert_eq!(value.pointer("color"), Some(&Value::string("Green")));
    }
}
