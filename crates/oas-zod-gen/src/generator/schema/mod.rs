//! The closed set of schema shapes the compiler understands.
//!
//! A [`SchemaNode`] is an immutable value tree. Cycles only exist through
//! [`SchemaKind::Reference`], which names an entry of the component table.

pub(crate) mod emit;
pub mod hashing;
pub mod parse;

use indexmap::{IndexMap, IndexSet};
use serde_json::Number;
use strum::Display;

pub use hashing::CanonicalSchema;
pub use parse::parse_schema;

pub const COMPONENT_REF_PREFIX: &str = "#/components/schemas/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
  pub kind: SchemaKind,
  pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
  String(StringSchema),
  Number(NumberSchema),
  Boolean,
  Null,
  Any,
  Array(ArraySchema),
  Object(ObjectSchema),
  Union(UnionSchema),
  Intersection(IntersectionSchema),
  Reference(String),
}

/// `enum_values` dominates every other string keyword. The others are still
/// kept so the schema can be written back out as it was read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringSchema {
  pub format: Option<String>,
  pub min_length: Option<u64>,
  pub max_length: Option<u64>,
  pub pattern: Option<String>,
  pub enum_values: Option<Vec<String>>,
  /// The enum listed `null`. Only legal on nullable schemas.
  pub enum_lists_null: bool,
}

/// Bounds are kept as the exact JSON numbers from the document so `1` and `1.0` survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberSchema {
  pub integer: bool,
  pub format: Option<String>,
  pub minimum: Option<Number>,
  pub maximum: Option<Number>,
  pub exclusive_minimum: bool,
  pub exclusive_maximum: bool,
  pub multiple_of: Option<Number>,
  pub enum_values: Option<Vec<Number>>,
  pub enum_lists_null: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArraySchema {
  pub items: Box<SchemaNode>,
  pub min_items: Option<u64>,
  pub max_items: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSchema {
  pub properties: IndexMap<String, SchemaNode>,
  pub required: IndexSet<String>,
  pub additional_properties: AdditionalProperties,
}

/// `Unspecified` and `Allow` accept the same values; they are kept apart so the
/// decompiled schema matches what the document wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AdditionalProperties {
  #[default]
  Unspecified,
  Allow,
  Forbid,
  Schema(Box<SchemaNode>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnionKeyword {
  #[strum(to_string = "oneOf")]
  OneOf,
  #[strum(to_string = "anyOf")]
  AnyOf,
}

/// A single member is kept as written; the generators degenerate it to the member itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionSchema {
  pub keyword: UnionKeyword,
  pub members: Vec<SchemaNode>,
  pub discriminator: Option<Discriminator>,
  /// `type: object` was written beside the keyword.
  pub object_typed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntersectionSchema {
  pub members: Vec<SchemaNode>,
  /// Object keywords written beside `allOf`. They validate as one more member.
  pub inline: Option<ObjectSchema>,
  pub object_typed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
  pub property_name: String,
  pub mapping: IndexMap<String, String>,
}

impl SchemaNode {
  #[must_use]
  pub const fn new(kind: SchemaKind) -> Self {
    Self { kind, nullable: false }
  }

  #[must_use]
  pub fn reference(name: impl Into<String>) -> Self {
    Self::new(SchemaKind::Reference(name.into()))
  }

  #[must_use]
  pub const fn with_nullable(mut self, nullable: bool) -> Self {
    self.nullable = nullable;
    self
  }

  #[must_use]
  pub fn as_reference(&self) -> Option<&str> {
    match &self.kind {
      SchemaKind::Reference(name) => Some(name),
      _ => None,
    }
  }

  #[must_use]
  pub fn as_object(&self) -> Option<&ObjectSchema> {
    match &self.kind {
      SchemaKind::Object(object) => Some(object),
      _ => None,
    }
  }

  fn children(&self) -> Vec<&SchemaNode> {
    match &self.kind {
      SchemaKind::Array(array) => vec![array.items.as_ref()],
      SchemaKind::Object(object) => object.children(),
      SchemaKind::Union(union) => union.members.iter().collect(),
      SchemaKind::Intersection(intersection) => {
        let mut children: Vec<&SchemaNode> = intersection.members.iter().collect();
        if let Some(inline) = &intersection.inline {
          children.extend(inline.children());
        }
        children
      }
      _ => vec![],
    }
  }

  fn children_mut(&mut self) -> Vec<&mut SchemaNode> {
    match &mut self.kind {
      SchemaKind::Array(array) => vec![array.items.as_mut()],
      SchemaKind::Object(object) => object.children_mut(),
      SchemaKind::Union(union) => union.members.iter_mut().collect(),
      SchemaKind::Intersection(intersection) => {
        let mut children: Vec<&mut SchemaNode> = intersection.members.iter_mut().collect();
        if let Some(inline) = &mut intersection.inline {
          children.extend(inline.children_mut());
        }
        children
      }
      _ => vec![],
    }
  }

  /// Names of every component this node references, in first-seen order.
  #[must_use]
  pub fn references(&self) -> IndexSet<String> {
    let mut names = IndexSet::new();
    self.collect_references(&mut names);
    names
  }

  fn collect_references(&self, names: &mut IndexSet<String>) {
    if let SchemaKind::Reference(name) = &self.kind {
      names.insert(name.clone());
    }
    for child in self.children() {
      child.collect_references(names);
    }
  }

  /// Replaces every reference for which `rename` returns a new name.
  ///
  /// Discriminator mappings that point at a renamed component follow the rename.
  pub fn rewrite_references(&mut self, rename: &impl Fn(&str) -> Option<String>) {
    match &mut self.kind {
      SchemaKind::Reference(name) => {
        if let Some(renamed) = rename(name) {
          *name = renamed;
        }
      }
      SchemaKind::Union(UnionSchema {
        discriminator: Some(discriminator),
        ..
      }) => {
        for target in discriminator.mapping.values_mut() {
          if let Some(name) = target.strip_prefix(COMPONENT_REF_PREFIX)
            && let Some(renamed) = rename(name)
          {
            *target = format!("{COMPONENT_REF_PREFIX}{renamed}");
          }
        }
      }
      _ => {}
    }

    for child in self.children_mut() {
      child.rewrite_references(rename);
    }
  }
}

impl ObjectSchema {
  fn children(&self) -> Vec<&SchemaNode> {
    let mut children: Vec<&SchemaNode> = self.properties.values().collect();
    if let AdditionalProperties::Schema(extra) = &self.additional_properties {
      children.push(extra);
    }
    children
  }

  fn children_mut(&mut self) -> Vec<&mut SchemaNode> {
    let mut children: Vec<&mut SchemaNode> = self.properties.values_mut().collect();
    if let AdditionalProperties::Schema(extra) = &mut self.additional_properties {
      children.push(extra);
    }
    children
  }
}

impl IntersectionSchema {
  #[must_use]
  pub fn new(members: Vec<SchemaNode>) -> Self {
    Self {
      members,
      ..Self::default()
    }
  }
}

impl From<SchemaKind> for SchemaNode {
  fn from(kind: SchemaKind) -> Self {
    Self::new(kind)
  }
}
