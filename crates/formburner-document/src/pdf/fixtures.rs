// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test documents built in memory.

use lopdf::{Document, Object, ObjectId, dictionary};

use super::fields::flags;

fn rect() -> Object {
    Object::Array(vec![0.into(), 0.into(), 100.into(), 20.into()])
}

fn appearance(on: &str) -> Object {
    Object::Dictionary(dictionary! {
        "N" => dictionary! { on => Object::Null, "Off" => Object::Null },
    })
}

fn widget(doc: &mut Document, page: ObjectId, mut extra: lopdf::Dictionary) -> ObjectId {
    extra.set("Type", "Annot");
    extra.set("Subtype", "Widget");
    extra.set("Rect", rect());
    extra.set("P", page);
    doc.add_object(extra)
}

/// One page holding one field of each kind, plus a radio group, a field of
/// unknown type and a field without a widget on any page.
///
/// Annotation order: person.name, person.agree, color, toppings, notes, id,
/// size (S), size (M), sig, weird. `hidden` is only listed in `/Fields`.
pub(crate) fn sample_form() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();
    let person_id = doc.new_object_id();
    let size_id = doc.new_object_id();

    let name_id = widget(&mut doc, page_id, dictionary! {
        "FT" => "Tx",
        "T" => Object::string_literal("name"),
        "TU" => Object::string_literal("Full name"),
        "V" => Object::string_literal("Ada"),
        "Parent" => person_id,
    });
    let agree_id = widget(&mut doc, page_id, dictionary! {
        "FT" => "Btn",
        "T" => Object::string_literal("agree"),
        "V" => "Yes",
        "AS" => "Yes",
        "AP" => appearance("Yes"),
        "Parent" => person_id,
    });
    doc.objects.insert(
        person_id,
        Object::Dictionary(dictionary! {
            "T" => Object::string_literal("person"),
            "Kids" => vec![Object::from(name_id), Object::from(agree_id)],
        }),
    );

    let color_id = widget(&mut doc, page_id, dictionary! {
        "FT" => "Ch",
        "T" => Object::string_literal("color"),
        "Ff" => i64::from(flags::COMBO),
        "Opt" => vec![
            Object::Array(vec![Object::string_literal("r"), Object::string_literal("Red")]),
            Object::Array(vec![Object::string_literal("g"), Object::string_literal("Green")]),
            Object::string_literal("Blue"),
        ],
        "V" => Object::string_literal("g"),
    });
    let toppings_id = widget(&mut doc, page_id, dictionary! {
        "FT" => "Ch",
        "T" => Object::string_literal("toppings"),
        "Ff" => i64::from(flags::MULTI_SELECT),
        "Opt" => vec![
            Object::string_literal("Cheese"),
            Object::string_literal("Ham"),
            Object::string_literal("Olives"),
        ],
        "V" => vec![Object::string_literal("Ham"), Object::string_literal("Olives")],
    });
    let notes_id = widget(&mut doc, page_id, dictionary! {
        "FT" => "Tx",
        "T" => Object::string_literal("notes"),
        "Ff" => i64::from(flags::MULTILINE),
        "V" => Object::string_literal("line one\nline two"),
    });
    let id_id = widget(&mut doc, page_id, dictionary! {
        "FT" => "Tx",
        "T" => Object::string_literal("id"),
        "Ff" => i64::from(flags::READ_ONLY),
        "V" => Object::string_literal("42"),
    });

    let small_id = widget(&mut doc, page_id, dictionary! {
        "Parent" => size_id,
        "AS" => "Off",
        "AP" => appearance("S"),
    });
    let medium_id = widget(&mut doc, page_id, dictionary! {
        "Parent" => size_id,
        "AS" => "M",
        "AP" => appearance("M"),
    });
    doc.objects.insert(
        size_id,
        Object::Dictionary(dictionary! {
            "FT" => "Btn",
            "T" => Object::string_literal("size"),
            "Ff" => i64::from(flags::RADIO),
            "V" => "M",
            "Kids" => vec![Object::from(small_id), Object::from(medium_id)],
        }),
    );

    let sig_id = widget(&mut doc, page_id, dictionary! {
        "FT" => "Sig",
        "T" => Object::string_literal("sig"),
    });
    let weird_id = widget(&mut doc, page_id, dictionary! {
        "FT" => "Zz",
        "T" => Object::string_literal("weird"),
    });
    let hidden_id = doc.add_object(dictionary! {
        "FT" => "Tx",
        "T" => Object::string_literal("hidden"),
        "V" => Object::string_literal("secret"),
    });

    let annots: Vec<Object> = [
        name_id, agree_id, color_id, toppings_id, notes_id, id_id, small_id, medium_id, sig_id,
        weird_id,
    ]
    .into_iter()
    .map(Object::from)
    .collect();
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Annots" => annots,
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1_i64,
        }),
    );

    let fields: Vec<Object> = [
        person_id, color_id, toppings_id, notes_id, id_id, size_id, sig_id, weird_id, hidden_id,
    ]
    .into_iter()
    .map(Object::from)
    .collect();
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => dictionary! { "Fields" => fields },
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// One empty page under a catalog carrying `acroform`, if any.
pub(crate) fn catalog_with_form(acroform: Option<lopdf::Dictionary>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1_i64,
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if let Some(acroform) = acroform {
        catalog.set("AcroForm", acroform);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}
