// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// YAML serialization of extracted form data.
//
// Scalars are rendered and documents are loaded by serde-saphyr. The block
// structure is laid out here because annotations belong next to sequence and
// mapping values as well, which `serde_saphyr::Commented` cannot carry.

use std::fmt::{self, Write as _};
use std::io::{Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_saphyr::{Location, SerializerOptions, Spanned};
use tracing::{debug, info};

use formburner_core::error::{BurnerError, Result};
use formburner_core::types::FieldPath;
use formburner_core::BurnerConfig;

use crate::extract::{Annotation, Annotations, Extraction, ScalarStyle};
use crate::value::{Scalar, Value};

const INDENT: usize = 2;

// -- Emitting -------------------------------------------------------------------

/// Render an extraction as an annotated YAML document.
pub fn to_string(extraction: &Extraction, header: &str) -> Result<String> {
    let mut emitter = Emitter {
        out: String::new(),
        annotations: &extraction.annotations,
    };
    for line in header.lines() {
        emitter.out.push_str("# ");
        emitter.out.push_str(line);
        emitter.out.push('\n');
    }

    match &extraction.value {
        Value::Mapping(map) if !map.is_empty() => emitter.mapping(map, &FieldPath::root(), 0)?,
        Value::Mapping(_) => emitter.out.push_str("{}\n"),
        Value::Sequence(items) if !items.is_empty() => {
            emitter.sequence(items, &FieldPath::root(), 0)?
        }
        Value::Sequence(_) => emitter.out.push_str("[]\n"),
        Value::Scalar(scalar) => {
            emitter.out.push_str(&render_scalar(scalar)?);
            emitter.out.push('\n');
        }
    }
    Ok(emitter.out)
}

/// Write a rendered document to a file, or to stdout for the placeholder.
pub fn write_path(path: &str, config: &BurnerConfig, text: &str) -> Result<()> {
    if config.is_std_stream(path) {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        debug!(bytes = text.len(), "form data written to stdout");
    } else {
        std::fs::write(path, text)?;
        info!(path, bytes = text.len(), "form data written");
    }
    Ok(())
}

struct Emitter<'a> {
    out: String,
    annotations: &'a Annotations,
}

impl Emitter<'_> {
    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat_n(' ', indent));
    }

    fn mapping(
        &mut self,
        map: &IndexMap<String, Value>,
        path: &FieldPath,
        indent: usize,
    ) -> Result<()> {
        for (key, value) in map {
            let child = path.child(key);
            self.pad(indent);
            self.out.push_str(&render_string(key)?);
            self.out.push(':');
            let annotation = self.annotations.get(&child);
            self.node(value, &child, annotation, indent)?;
        }
        Ok(())
    }

    fn sequence(&mut self, items: &[Value], path: &FieldPath, indent: usize) -> Result<()> {
        for item in items {
            self.pad(indent);
            self.out.push('-');
            self.node(item, path, None, indent)?;
        }
        Ok(())
    }

    /// Emit the remainder of a line that already holds `key:` or `-`,
    /// plus any nested lines.
    fn node(
        &mut self,
        value: &Value,
        path: &FieldPath,
        annotation: Option<&Annotation>,
        indent: usize,
    ) -> Result<()> {
        let comment = annotation.and_then(|a| a.comment.as_deref());
        match value {
            Value::Mapping(map) if map.is_empty() => {
                self.out.push_str(" {}");
                self.end_line(comment);
            }
            Value::Mapping(map) => {
                self.end_line(comment);
                self.mapping(map, path, indent + INDENT)?;
            }
            Value::Sequence(items) if items.is_empty() => {
                self.out.push_str(" []");
                self.end_line(comment);
            }
            Value::Sequence(items) => {
                self.end_line(comment);
                self.sequence(items, path, indent + INDENT)?;
            }
            Value::Scalar(Scalar::String(text))
                if annotation.is_some_and(|a| a.style == ScalarStyle::Literal)
                    && literal_eligible(text) =>
            {
                self.literal(text, comment, indent);
            }
            Value::Scalar(scalar) => {
                self.out.push(' ');
                self.out.push_str(&render_scalar(scalar)?);
                self.end_line(comment);
            }
        }
        Ok(())
    }

    fn literal(&mut self, text: &str, comment: Option<&str>, indent: usize) {
        let (chomp, body) = match text.strip_suffix('\n') {
            None => ("-", text),
            Some(rest) if rest.ends_with('\n') => ("+", rest),
            Some(rest) => ("", rest),
        };
        self.out.push_str(" |");
        if body.lines().any(|line| line.starts_with(' ')) {
            let _ = write!(self.out, "{INDENT}");
        }
        self.out.push_str(chomp);
        self.end_line(comment);

        for line in body.split('\n') {
            if !line.is_empty() {
                self.pad(indent + INDENT);
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
    }

    fn end_line(&mut self, comment: Option<&str>) {
        if let Some(comment) = comment {
            self.out.push_str("  # ");
            self.out.push_str(&comment.replace(['\n', '\r'], " "));
        }
        self.out.push('\n');
    }
}

/// Literal blocks only carry printable text with at least one visible line.
fn literal_eligible(text: &str) -> bool {
    text.contains('\n')
        && !text.trim().is_empty()
        && !text.chars().any(|c| c != '\n' && c != '\t' && is_special(c))
}

/// Characters that cannot appear verbatim in a block scalar.
fn is_special(c: char) -> bool {
    c.is_control() || matches!(c, '\u{feff}' | '\u{2028}' | '\u{2029}')
}

fn render_scalar(scalar: &Scalar) -> Result<String> {
    match scalar {
        Scalar::Null => Ok("null".to_owned()),
        Scalar::Bool(true) => Ok("true".to_owned()),
        Scalar::Bool(false) => Ok("false".to_owned()),
        Scalar::String(text) => render_string(text),
    }
}

/// A key or string value as a single-line scalar, quoted when a plain
/// scalar would read back as something else.
fn render_string(text: &str) -> Result<String> {
    let options = SerializerOptions {
        prefer_block_scalars: false,
        ..SerializerOptions::default()
    };
    let rendered = serde_saphyr::to_string_with_options(&text, options)
        .map_err(|err| BurnerError::Emit(err.to_string()))?;
    let rendered = rendered.trim_end_matches('\n');

    // Plain scalars lose trailing spaces on load.
    let plain = !rendered.starts_with(['"', '\'']);
    if plain && text.ends_with(' ') {
        return Ok(format!("'{}'", text.replace('\'', "''")));
    }
    Ok(rendered.to_owned())
}

// -- Loading --------------------------------------------------------------------

/// Parse a YAML document into a [`Value`].
///
/// Plain scalars the YAML resolver reads as numbers keep the text they were
/// written with, so `01234` stays `"01234"`.
pub fn from_str(text: &str) -> Result<Value> {
    let node: Spanned<Node> =
        serde_saphyr::from_str(text).map_err(|err| BurnerError::Data(err.to_string()))?;
    Source::new(text).value(node)
}

/// Read and parse a data file, or stdin for the placeholder.
pub fn load_path(path: &str, config: &BurnerConfig) -> Result<Value> {
    let text = if config.is_std_stream(path) {
        let mut text = String::new();
        std::io::stdin().lock().read_to_string(&mut text)?;
        text
    } else {
        std::fs::read_to_string(Path::new(path))
            .map_err(|err| BurnerError::Data(format!("cannot read {path}: {err}")))?
    };
    from_str(&text)
}

/// A parsed YAML node whose children still carry their source locations.
enum Node {
    Null,
    Bool(bool),
    Text(String),
    /// Resolved as a number; holds the canonical rendering of that number.
    Number(String),
    Sequence(Vec<Spanned<Node>>),
    Mapping(Vec<(Spanned<Node>, Spanned<Node>)>),
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, sequence or mapping")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<Node, E> {
        Ok(Node::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Node, E> {
        Ok(Node::Number(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Node, E> {
        Ok(Node::Number(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Node, E> {
        Ok(Node::Number(value.to_string()))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Node, E> {
        Ok(Node::Text(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<Node, E> {
        Ok(Node::Text(value))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Node, D::Error>
    where
        D: Deserializer<'de>,
    {
        Node::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Node, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Node::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Node, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(Node::Mapping(entries))
    }
}

/// The document text, indexed for the character offsets serde-saphyr reports.
struct Source<'a> {
    text: &'a str,
    char_starts: Vec<usize>,
}

impl<'a> Source<'a> {
    fn new(text: &'a str) -> Self {
        let char_starts = text
            .char_indices()
            .map(|(index, _)| index)
            .chain(std::iter::once(text.len()))
            .collect();
        Self { text, char_starts }
    }

    /// The token a plain scalar was written as, past any anchor or tag.
    fn token(&self, location: &Location) -> Option<&'a str> {
        let span = location.span();
        if span.is_empty() {
            return None;
        }
        let start = *self.char_starts.get(span.offset())?;
        let end = *self.char_starts.get(span.offset() + span.len())?;
        let token = self.text.get(start..end)?.split_whitespace().last()?;
        token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.' | '_' | '~'))
            .then_some(token)
    }

    fn value(&self, node: Spanned<Node>) -> Result<Value> {
        let location = node.defined;
        Ok(match node.value {
            Node::Null => Value::null(),
            Node::Bool(value) => Value::bool(value),
            Node::Text(text) => Value::string(text),
            Node::Number(canonical) => Value::string(self.scalar_text(&location, canonical)),
            Node::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(|item| self.value(item))
                    .collect::<Result<_>>()?,
            ),
            Node::Mapping(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(self.key(key)?, self.value(value)?);
                }
                Value::Mapping(map)
            }
        })
    }

    /// Mapping keys are names: whatever the resolver made of them, the
    /// written text is the key.
    fn key(&self, node: Spanned<Node>) -> Result<String> {
        let location = node.defined;
        match node.value {
            Node::Text(text) => Ok(text),
            Node::Number(canonical) => Ok(self.scalar_text(&location, canonical)),
            Node::Bool(value) => Ok(self.scalar_text(&location, value.to_string())),
            Node::Null => Ok(self.scalar_text(&location, String::new())),
            Node::Sequence(_) | Node::Mapping(_) => Err(BurnerError::Data(format!(
                "mapping keys must be scalars (line {})",
                location.line()
            ))),
        }
    }

    fn scalar_text(&self, location: &Location, fallback: String) -> String {
        match self.token(location) {
            Some(token) => token.to_owned(),
            None => {
                debug!(line = location.line(), "scalar source text unavailable");
                fallback
            }
        }
    }
}
