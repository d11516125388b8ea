// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF form reader — open a document, enumerate its AcroForm fields, and
// save it back, using the `lopdf` crate.

use std::collections::HashSet;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

use formburner_core::error::{BurnerError, Result};
use formburner_core::TextCodec;
use formburner_fields::{FieldLeaf, FieldTree};

use super::fields::{
    self, FieldRef, MAX_DEPTH, dictionary, entry, field_kids, is_radio, is_widget,
};
use crate::integrity::hash_bytes;

/// An opened AcroForm document.
///
/// Wraps `lopdf::Document`; fields are handed out as `FieldRef` handles
/// inside a [`FieldTree`] and written back with [`PdfForm::apply`].
pub struct PdfForm {
    /// The underlying lopdf document.
    pub(crate) document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
    /// Size of the loaded file, needed to judge signature coverage.
    source_len: usize,
    pub(crate) codec: TextCodec,
    pub(crate) need_appearances: bool,
}

impl PdfForm {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let label = path_ref.display().to_string();
        info!("Opening PDF: {label}");

        let data = std::fs::read(path_ref).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => BurnerError::NotFound(label.clone()),
            _ => BurnerError::Io(err),
        })?;
        debug!(sha256 = %hash_bytes(&data), "source fingerprint");

        let mut form = Self::load(&data, &label)?;
        form.source_path = Some(label);
        Ok(form)
    }

    /// Create a form from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::load(data, "<memory>")
    }

    fn load(data: &[u8], label: &str) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            let detail = err.to_string();
            if mentions_encryption(&detail) {
                BurnerError::Locked(label.to_owned())
            } else {
                BurnerError::Parse {
                    path: label.to_owned(),
                    detail,
                }
            }
        })?;

        if document.is_encrypted() {
            return Err(BurnerError::Locked(label.to_owned()));
        }

        match form_kind(&document) {
            FormKind::None => return Err(BurnerError::NoForm(label.to_owned())),
            FormKind::XfaOnly => return Err(BurnerError::UnsupportedForm(label.to_owned())),
            FormKind::Hybrid => warn!("document also carries XFA data, only AcroForm fields are used"),
            FormKind::AcroForm => {}
        }

        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self {
            document,
            source_path: None,
            source_len: data.len(),
            codec: TextCodec::new(),
            need_appearances: true,
        })
    }

    /// Whether [`PdfForm::apply`] asks viewers to regenerate appearances.
    pub fn with_need_appearances(mut self, need_appearances: bool) -> Self {
        self.need_appearances = need_appearances;
        self
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the form was created via [`PdfForm::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Every supported field with its fully qualified name.
    ///
    /// Widgets are visited page by page in annotation order; fields whose
    /// widgets sit on no page follow in `/AcroForm /Fields` order. A field
    /// with several widgets is reported once, except radio buttons, which
    /// are reported once per widget.
    #[instrument(skip(self))]
    pub fn fields(&self) -> Vec<(String, FieldLeaf<FieldRef>)> {
        let doc = &self.document;
        let mut seen = HashSet::new();
        let mut handles = Vec::new();

        for page_id in doc.get_pages().into_values() {
            for widget in page_widgets(doc, page_id) {
                let Some(field) = owning_field(doc, widget) else {
                    debug!(?widget, "widget without a field, skipped");
                    continue;
                };
                let first_visit = seen.insert(field);
                if first_visit || is_radio(doc, field) {
                    handles.push(FieldRef {
                        field,
                        widget: Some(widget),
                    });
                }
            }
        }

        for root in self.acroform_roots() {
            self.collect_unplaced(root, 0, &mut seen, &mut handles);
        }

        let leaves: Vec<_> = handles
            .into_iter()
            .filter_map(|handle| self.leaf(handle))
            .collect();
        info!(count = leaves.len(), "form fields enumerated");
        leaves
    }

    /// Build the field tree of this document.
    pub fn field_tree(&self) -> FieldTree<FieldRef> {
        FieldTree::build(self.fields())
    }

    /// Field dictionaries directly below `handle` (widget-only kids excluded).
    pub fn children(&self, handle: &FieldRef) -> Vec<FieldRef> {
        field_kids(&self.document, handle.field)
            .into_iter()
            .map(|field| FieldRef {
                field,
                widget: None,
            })
            .collect()
    }

    fn leaf(&self, handle: FieldRef) -> Option<(String, FieldLeaf<FieldRef>)> {
        let Some(name) = fields::qualified_name(&self.document, &self.codec, handle.field) else {
            warn!(field = ?handle.field, "field without a name, skipped");
            return None;
        };
        let field = fields::read_field(&self.document, handle, self.source_len)?;
        Some((name, FieldLeaf::new(handle, field)))
    }

    fn acroform_roots(&self) -> Vec<ObjectId> {
        let doc = &self.document;
        let Some(catalog) = catalog_id(doc).and_then(|id| dictionary(doc, id)) else {
            return Vec::new();
        };
        let Some(Object::Array(roots)) = entry(doc, catalog, b"AcroForm")
            .and_then(|form| form.as_dict().ok())
            .and_then(|form| entry(doc, form, b"Fields"))
        else {
            return Vec::new();
        };
        roots
            .iter()
            .filter_map(|root| root.as_reference().ok())
            .collect()
    }

    fn collect_unplaced(
        &self,
        id: ObjectId,
        depth: usize,
        seen: &mut HashSet<ObjectId>,
        handles: &mut Vec<FieldRef>,
    ) {
        if depth > MAX_DEPTH {
            warn!(field = ?id, "field hierarchy too deep, stopped descending");
            return;
        }
        let kids = self.children(&FieldRef {
            field: id,
            widget: None,
        });
        if kids.is_empty() {
            if seen.insert(id) {
                handles.push(FieldRef {
                    field: id,
                    widget: fields::widgets(&self.document, id).first().copied(),
                });
            }
            return;
        }
        for kid in kids {
            self.collect_unplaced(kid.field, depth + 1, seen, handles);
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document as it currently stands.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| BurnerError::Save(format!("failed to serialise PDF: {err}")))?;
        Ok(output)
    }

    /// Write the document to `path`, returning the SHA-256 of what was written.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn commit(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path_ref = path.as_ref();
        let output = self.save_to_bytes()?;
        std::fs::write(path_ref, &output).map_err(|err| {
            BurnerError::Save(format!("failed to write {}: {}", path_ref.display(), err))
        })?;

        let fingerprint = hash_bytes(&output);
        info!(bytes = output.len(), sha256 = %fingerprint, "PDF saved");
        Ok(fingerprint)
    }
}

fn mentions_encryption(detail: &str) -> bool {
    let detail = detail.to_ascii_lowercase();
    ["encrypt", "decrypt", "password"]
        .iter()
        .any(|word| detail.contains(word))
}

/// Which interactive form technology a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    None,
    AcroForm,
    /// XFA plus AcroForm fields standing in for it.
    Hybrid,
    /// XFA with no AcroForm fields to fall back on.
    XfaOnly,
}

fn form_kind(doc: &Document) -> FormKind {
    let Some(form) = catalog_id(doc)
        .and_then(|id| dictionary(doc, id))
        .and_then(|catalog| entry(doc, catalog, b"AcroForm"))
        .and_then(|form| form.as_dict().ok())
    else {
        return FormKind::None;
    };

    let has_xfa = entry(doc, form, b"XFA").is_some_and(|xfa| !matches!(xfa, Object::Null));
    let has_fields =
        matches!(entry(doc, form, b"Fields"), Some(Object::Array(fields)) if !fields.is_empty());
    match (has_xfa, has_fields) {
        (false, _) => FormKind::AcroForm,
        (true, true) => FormKind::Hybrid,
        (true, false) => FormKind::XfaOnly,
    }
}

fn catalog_id(doc: &Document) -> Option<ObjectId> {
    doc.trailer.get(b"Root").ok()?.as_reference().ok()
}

/// Widget annotations of a page, in `/Annots` order.
fn page_widgets(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let Some(Object::Array(annots)) =
        dictionary(doc, page_id).and_then(|page| entry(doc, page, b"Annots"))
    else {
        return Vec::new();
    };
    annots
        .iter()
        .filter_map(|annot| annot.as_reference().ok())
        .filter(|id| dictionary(doc, *id).is_some_and(is_widget))
        .collect()
}

/// The terminal field a widget belongs to: itself when merged, else its parent.
fn owning_field(doc: &Document, widget: ObjectId) -> Option<ObjectId> {
    let dict = dictionary(doc, widget)?;
    if fields::is_field(dict) {
        return Some(widget);
    }
    dict.get(b"Parent").ok()?.as_reference().ok()
}

#[cfg(test)]
mod tests {
    use formburner_core::types::SignatureStatus;
    use formburner_fields::{Extractor, FieldNode, Value};
    use lopdf::dictionary;

    use super::*;
    use crate::pdf::fixtures;

    fn names(form: &PdfForm) -> Vec<String> {
        form.fields().into_iter().map(|(name, _)| name).collect()
    }

    #[test]
    fn fields_follow_page_order_then_unplaced() {
        let form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        assert_eq!(form.page_count(), 1);
        assert_eq!(
            names(&form),
            vec![
                "person.name",
                "person.agree",
                "color",
                "toppings",
                "notes",
                "id",
                "size",
                "size",
                "sig",
                "hidden",
            ]
        );
    }

    #[test]
    fn tree_groups_fields_and_records_radio_collision() {
        let form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let tree = form.field_tree();

        let person = tree.get("person").and_then(FieldNode::as_branch).unwrap();
        assert_eq!(person.len(), 2);
        assert_eq!(tree.collisions().len(), 1);
        assert_eq!(tree.collisions()[0].path.to_string(), "size");
        assert_eq!(tree.leaf_count(), 9);
    }

    #[test]
    fn extraction_reads_document_state() {
        let form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let extraction = Extractor::default().run(&form.field_tree());
        let value = &extraction.value;

        assert_eq!(value.pointer("person.name"), Some(&Value::string("Ada")));
        assert_eq!(value.pointer("person.agree"), Some(&Value::bool(true)));
        assert_eq!(value.pointer("color"), Some(&Value::string("Green")));
        assert_eq!(
            value.pointer("toppings"),
            Some(&Value::Sequence(vec!["Ham".into(), "Olives".into()]))
        );
        assert_eq!(
            value.pointer("notes"),
            Some(&Value::string("line one\nline two"))
        );
        assert_eq!(value.pointer("size"), Some(&Value::bool(true)));
        assert_eq!(
            value.pointer("sig.status"),
            Some(&Value::string(SignatureStatus::SignatureNotFound.as_str()))
        );
        assert_eq!(value.pointer("hidden"), Some(&Value::string("secret")));
    }

    #[test]
    fn children_lists_field_kids_only() {
        let form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let tree = form.field_tree();
        let name = tree.leaf("person.name").unwrap().handle();
        let person = dictionary(&form.document, name.field)
            .and_then(|dict| dict.get(b"Parent").ok())
            .and_then(|parent| parent.as_reference().ok())
            .unwrap();

        let kids = form.children(&FieldRef {
            field: person,
            widget: None,
        });
        assert_eq!(kids.len(), 2);

        let size = tree.leaf("size").unwrap().handle();
        assert!(form.children(size).is_empty());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfForm::open(dir.path().join("absent.pdf")).err().unwrap();
        assert!(matches!(err, BurnerError::NotFound(_)));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = PdfForm::from_bytes(b"this is not a pdf").err().unwrap();
        assert!(matches!(err, BurnerError::Parse { .. }));
    }

    #[test]
    fn document_without_acroform_has_no_form() {
        let err = PdfForm::from_bytes(&fixtures::catalog_with_form(None)).err().unwrap();
        assert!(matches!(err, BurnerError::NoForm(_)));
    }

    #[test]
    fn xfa_only_form_is_unsupported() {
        let acroform = dictionary! {
            "Fields" => Vec::<Object>::new(),
            "XFA" => Object::string_literal("<xdp:xdp/>"),
        };
        let err = PdfForm::from_bytes(&fixtures::catalog_with_form(Some(acroform)))
            .err()
            .unwrap();
        assert!(matches!(err, BurnerError::UnsupportedForm(_)));
    }

    #[test]
    fn empty_acroform_opens_with_no_fields() {
        let acroform = dictionary! { "Fields" => Vec::<Object>::new() };
        let form = PdfForm::from_bytes(&fixtures::catalog_with_form(Some(acroform))).unwrap();
        assert!(form.fields().is_empty());
    }

    #[test]
    fn hybrid_xfa_form_uses_acroform_fields() {
        let bytes = fixtures::sample_form();
        let mut document = Document::load_mem(&bytes).unwrap();
        let catalog = catalog_id(&document).unwrap();
        let form = document
            .get_dictionary_mut(catalog)
            .unwrap()
            .get_mut(b"AcroForm")
            .unwrap()
            .as_dict_mut()
            .unwrap();
        form.set("XFA", Object::string_literal("<xdp:xdp/>"));
        let mut hybrid = Vec::new();
        document.save_to(&mut hybrid).unwrap();

        let form = PdfForm::from_bytes(&hybrid).unwrap();
        assert_eq!(names(&form).len(), 10);
    }

    #[test]
    fn commit_writes_a_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");

        let mut form = PdfForm::from_bytes(&fixtures::sample_form()).unwrap();
        let fingerprint = form.commit(&path).unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(fingerprint, hash_bytes(&written));
        let reopened = PdfForm::open(&path).unwrap();
        assert_eq!(reopened.source_path(), path.to_str());
        assert_eq!(names(&reopened).len(), 10);
    }
}
