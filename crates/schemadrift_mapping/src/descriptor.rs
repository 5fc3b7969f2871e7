//! Language-neutral description of declared types, as produced by the
//! front-ends.

use std::collections::BTreeMap;

/// What sort of type a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

/// Declaration modifiers relevant to mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub is_static: bool,
    pub is_final: bool,
    pub is_transient: bool,
    pub is_abstract: bool,
    pub is_synthetic: bool,
}

/// Reference to another type by name.
///
/// `written` is the name as it appeared at the reference site. `candidates`
/// are the qualified names it may denote, most likely first; the type graph
/// picks the first candidate it actually knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub written: String,
    pub candidates: Vec<String>,
}

impl TypeRef {
    /// A reference whose only candidate is the written name itself.
    pub fn new(written: impl Into<String>) -> Self {
        let written = written.into();
        Self {
            candidates: vec![written.clone()],
            written,
        }
    }

    pub fn with_candidates(written: impl Into<String>, candidates: Vec<String>) -> Self {
        Self {
            written: written.into(),
            candidates,
        }
    }

    /// Last dotted segment of the written name.
    pub fn simple_name(&self) -> &str {
        simple_name_of(&self.written)
    }
}

/// A single annotation attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    Str(String),
    /// An enum constant, e.g. `InheritanceType.SINGLE_TABLE`.
    Enum {
        type_name: Option<String>,
        constant: String,
    },
    /// A class literal, e.g. `Foo.class`.
    Class(String),
    Annotation(Annotation),
    Array(Vec<AnnotationValue>),
    /// Any other literal (numbers, booleans, characters, expressions).
    Other(String),
}

impl AnnotationValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_annotation(&self) -> Option<&Annotation> {
        match self {
            Self::Annotation(a) => Some(a),
            _ => None,
        }
    }

    pub fn enum_constant(&self) -> Option<&str> {
        match self {
            Self::Enum { constant, .. } => Some(constant),
            _ => None,
        }
    }

    /// Elements of an array value. A single non-array value counts as a
    /// one-element array, matching how annotation arrays may be written.
    pub fn elements(&self) -> &[AnnotationValue] {
        match self {
            Self::Array(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

/// An annotation attached to a type or field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Annotation {
    /// Name as written or as recorded in compiled form; may be qualified.
    pub name: String,
    pub attributes: BTreeMap<String, AnnotationValue>,
}

impl Annotation {
    /// An annotation with no attributes.
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder: add an attribute.
    pub fn with(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Builder: add a string attribute.
    pub fn with_str(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(key, AnnotationValue::Str(value.into()))
    }

    pub fn simple_name(&self) -> &str {
        simple_name_of(&self.name)
    }

    /// Match by simple name. Directive recognition is by simple name so the
    /// same rules apply to `javax.persistence` and `jakarta.persistence`.
    pub fn is(&self, simple: &str) -> bool {
        self.simple_name() == simple
    }

    pub fn attribute(&self, key: &str) -> Option<&AnnotationValue> {
        self.attributes.get(key)
    }

    /// A string attribute, treating blank strings as absent.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.attribute(key)
            .and_then(AnnotationValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Anything that carries annotations.
pub trait Annotated {
    fn annotations(&self) -> &[Annotation];

    fn annotation(&self, simple: &str) -> Option<&Annotation> {
        self.annotations().iter().find(|a| a.is(simple))
    }

    fn has_annotation(&self, simple: &str) -> bool {
        self.annotation(simple).is_some()
    }
}

/// A field declared directly on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: TypeRef,
    pub annotations: Vec<Annotation>,
    pub modifiers: Modifiers,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            declared_type,
            annotations: Vec::new(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

impl Annotated for FieldDescriptor {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// A declared type: its identity, ancestry, annotations and own fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTypeDescriptor {
    pub qualified_name: String,
    pub simple_name: String,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    pub superclass: Option<TypeRef>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<FieldDescriptor>,
    /// Where the declaration came from (file path or `archive!entry`).
    pub origin: String,
}

impl EntityTypeDescriptor {
    /// A plain class declaration with no ancestry, annotations or fields.
    pub fn class(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        Self {
            simple_name: simple_name_of(&qualified_name).to_string(),
            qualified_name,
            kind: TypeKind::Class,
            modifiers: Modifiers::default(),
            superclass: None,
            annotations: Vec::new(),
            fields: Vec::new(),
            origin: String::new(),
        }
    }

    pub fn extends(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self
    }

    pub fn from_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Concrete classes are the ones a mapping layer would instantiate.
    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Class && !self.modifiers.is_abstract
    }

    /// Namespace part of the qualified name (empty for the default package).
    pub fn namespace(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map(|(ns, _)| ns)
            .unwrap_or("")
    }
}

impl Annotated for EntityTypeDescriptor {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

fn simple_name_of(name: &str) -> &str {
    name.rsplit(|c| c == '.' || c == '$')
        .next()
        .unwrap_or(name)
}
