//! Content units and the per-document annotation store.
//!
//! Annotations (bold, links, ...) are interned in a [`ContentStore`] under a
//! hash of their full stored form and referenced from content units by
//! [`AnnotationRef`]. Equal refs therefore always mean equal annotations,
//! but the converse does not hold: two annotations that differ only in
//! their `origin` markup get different refs while comparing equal.
//! [`ResolvedUnit`] is the store-independent form used whenever content from
//! two documents is compared.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::internal_list::ReferenceKey;
use crate::node::Attributes;

/// Reference to an interned [`Annotation`]: the BLAKE3 hash of its stored
/// form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationRef([u8; 32]);

impl AnnotationRef {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for AnnotationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationRef({})", self.short_hex())
    }
}

/// A text annotation such as emphasis or a link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Markup the annotation was parsed from. Stored, never compared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Annotation {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: Attributes::new(),
            origin: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Canonical comparison form. Annotations that differ only in `origin`
    /// produce equal strings.
    pub fn canonical(&self) -> String {
        json!({ "type": self.type_name, "attributes": self.attributes }).to_string()
    }

    /// Hash of the canonical form followed by a tagged origin, so "no
    /// origin" and an empty origin differ.
    fn storage_ref(&self) -> AnnotationRef {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.canonical().as_bytes());
        match &self.origin {
            None => {
                hasher.update(&[0]);
            }
            Some(origin) => {
                hasher.update(&[1]);
                hasher.update(origin.as_bytes());
            }
        }
        AnnotationRef(*hasher.finalize().as_bytes())
    }
}

/// Interning table for annotations.
#[derive(Clone, Debug, Default)]
pub struct ContentStore {
    annotations: HashMap<AnnotationRef, Annotation>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an annotation. Interning an identical value twice yields the
    /// same ref.
    pub fn intern(&mut self, annotation: Annotation) -> AnnotationRef {
        let reference = annotation.storage_ref();
        let stored = self.annotations.entry(reference).or_insert(annotation);
        debug_assert!(
            stored.storage_ref() == reference,
            "annotation store entry {reference:?} does not hash to its key"
        );
        reference
    }

    pub fn get(&self, reference: AnnotationRef) -> Option<&Annotation> {
        self.annotations.get(&reference)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    fn resolve_refs(&self, refs: &[AnnotationRef]) -> Vec<String> {
        refs.iter()
            .map(|r| match self.get(*r) {
                Some(annotation) => annotation.canonical(),
                None => {
                    debug_assert!(false, "annotation ref {r:?} not in store");
                    format!("<missing:{r:?}>")
                }
            })
            .collect()
    }

    /// Convert a content unit into its store-independent form.
    pub fn resolve(&self, unit: &ContentUnit) -> ResolvedUnit {
        match unit {
            ContentUnit::Text { ch, annotations } => ResolvedUnit::Text {
                ch: *ch,
                annotations: self.resolve_refs(annotations),
            },
            ContentUnit::Inline(inline) => ResolvedUnit::Inline {
                type_name: inline.type_name.clone(),
                attributes: json!(inline.attributes).to_string(),
                annotations: self.resolve_refs(&inline.annotations),
                reference: inline.reference.clone(),
                override_index: inline.override_index,
            },
        }
    }
}

/// A node embedded in a content run, e.g. an image or a footnote marker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InlineNode {
    pub type_name: String,
    pub attributes: Attributes,
    pub annotations: Vec<AnnotationRef>,
    /// Internal list item this node refers to, if any.
    pub reference: Option<ReferenceKey>,
    /// Display number frozen for the duration of a diff run.
    pub override_index: Option<usize>,
}

/// One unit of leaf content.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ContentUnit {
    Text {
        ch: char,
        annotations: Vec<AnnotationRef>,
    },
    Inline(InlineNode),
}

impl ContentUnit {
    pub fn text(ch: char) -> Self {
        ContentUnit::Text {
            ch,
            annotations: Vec::new(),
        }
    }

    pub fn annotations(&self) -> &[AnnotationRef] {
        match self {
            ContentUnit::Text { annotations, .. } => annotations,
            ContentUnit::Inline(inline) => &inline.annotations,
        }
    }
}

/// Store-independent content unit. Hashable and totally ordered so it can be
/// fed directly to a sequence differ.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ResolvedUnit {
    Text {
        ch: char,
        annotations: Vec<String>,
    },
    Inline {
        type_name: String,
        attributes: String,
        annotations: Vec<String>,
        reference: Option<ReferenceKey>,
        override_index: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates_equal_annotations() {
        let mut store = ContentStore::new();
        let a = store.intern(Annotation::new("bold"));
        let b = store.intern(Annotation::new("bold"));
        let c = store.intern(Annotation::new("italic"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn canonical_ignores_attribute_insertion_order() {
        let a = Annotation::new("link")
            .with_attribute("href", json!("x"))
            .with_attribute("title", json!("t"));
        let b = Annotation::new("link")
            .with_attribute("title", json!("t"))
            .with_attribute("href", json!("x"));
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn origin_changes_ref_but_not_resolution() {
        let mut old_store = ContentStore::new();
        let old_bold = old_store.intern(Annotation::new("bold").with_origin("<b>"));

        let mut new_store = ContentStore::new();
        let new_bold = new_store.intern(Annotation::new("bold").with_origin("<strong>"));

        assert_ne!(old_bold, new_bold);

        let old_unit = ContentUnit::Text { ch: 'a', annotations: vec![old_bold] };
        let new_unit = ContentUnit::Text { ch: 'a', annotations: vec![new_bold] };
        assert_ne!(old_unit, new_unit);
        assert_eq!(old_store.resolve(&old_unit), new_store.resolve(&new_unit));
    }

    #[test]
    fn equal_annotations_share_refs_across_stores() {
        let mut first = ContentStore::new();
        let mut second = ContentStore::new();
        second.intern(Annotation::new("italic"));
        assert_eq!(first.intern(Annotation::new("bold")), second.intern(Annotation::new("bold")));
    }

    #[test]
    fn distinct_annotations_resolve_to_their_own_form() {
        let mut store = ContentStore::new();
        let link_a = store.intern(Annotation::new("link").with_attribute("href", json!("a")));
        let link_b = store.intern(Annotation::new("link").with_attribute("href", json!("b")));
        assert_ne!(link_a, link_b);
        assert_eq!(store.len(), 2);

        let resolved = |r| store.resolve(&ContentUnit::Text { ch: 'x', annotations: vec![r] });
        assert_ne!(resolved(link_a), resolved(link_b));
        assert_eq!(store.get(link_b).unwrap().attributes["href"], json!("b"));
    }

    #[test]
    fn empty_origin_differs_from_no_origin() {
        let mut store = ContentStore::new();
        let bare = store.intern(Annotation::new("bold"));
        let empty = store.intern(Annotation::new("bold").with_origin(""));
        assert_ne!(bare, empty);
    }

    #[test]
    fn refs_are_blake3_of_stored_form() {
        let mut store = ContentStore::new();
        let reference = store.intern(Annotation::new("bold"));
        let mut hasher = blake3::Hasher::new();
        hasher.update(Annotation::new("bold").canonical().as_bytes());
        hasher.update(&[0]);
        assert_eq!(reference.as_bytes(), hasher.finalize().as_bytes());
        assert_eq!(format!("{reference:?}").len(), "AnnotationRef()".len() + 8);
    }

    #[test]
    fn resolved_inline_includes_override_index() {
        let store = ContentStore::new();
        let mut inline = InlineNode {
            type_name: "reference".into(),
            attributes: Attributes::new(),
            annotations: Vec::new(),
            reference: None,
            override_index: Some(1),
        };
        let first = store.resolve(&ContentUnit::Inline(inline.clone()));
        inline.override_index = Some(2);
        let second = store.resolve(&ContentUnit::Inline(inline));
        assert_ne!(first, second);
    }
}
