//! Entity-mapping inference for schemadrift
//!
//! Reconstructs the table/column structure an object-relational mapping layer
//! would produce from a set of declared entity types. The crate is pure: it
//! performs no I/O and knows nothing about source files, class files or
//! databases. Front-ends turn their inputs into [`EntityTypeDescriptor`]s and
//! hand them over through [`DeclarationSource`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use schemadrift_mapping::{InferenceContext, SchemaInferenceDriver};
//!
//! let ctx = InferenceContext::default().with_root_namespace("com.acme");
//! let outcome = SchemaInferenceDriver::new(&ctx).run(&[&source_tree])?;
//!
//! for (table, columns) in outcome.schema.tables() {
//!     println!("{table}: {} columns", columns.len());
//! }
//! ```

mod context;
mod descriptor;
mod diagnostics;
pub mod directives;
mod driver;
mod error;
mod graph;
pub mod naming;
mod resolver;
mod schema;
pub mod workers;

pub use context::{DuplicatePolicy, InferenceContext, DEFAULT_DISCRIMINATOR_COLUMN};
pub use descriptor::{
    Annotated, Annotation, AnnotationValue, EntityTypeDescriptor, FieldDescriptor, Modifiers,
    TypeKind, TypeRef,
};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use directives::{FieldDirectives, OverrideMap, RelationshipKind, TypeDirectives};
pub use driver::{DeclarationSource, InferenceOutcome, SchemaInferenceDriver};
pub use error::{MappingError, Result};
pub use graph::{Ancestor, Lineage, TypeGraph};
pub use resolver::{EntityResolver, ResolvedEntity};
pub use schema::{CanonicalSchema, Identifier};
