//! Java front-ends for schema inference.
//!
//! Two [`DeclarationSource`](schemadrift_mapping::DeclarationSource)
//! implementations turn Java artifacts into language-neutral type
//! descriptors:
//!
//! - [`SourceTree`]: a directory of `.java` compilation units, tokenized and
//!   parsed for declarations only (method bodies and initializers are
//!   skipped).
//! - [`Classpath`]: a directory of `.class` files or a `.jar`/`.zip`
//!   archive, decoded from the class-file format.
//!
//! Both decode units in parallel; the first unit that fails aborts the load
//! with an error naming it.

mod classfile;
mod classpath;
mod error;
mod lexer;
mod parser;
mod resolve;
mod source_tree;
mod workers;

pub use classfile::ClassFile;
pub use classpath::Classpath;
pub use error::{FrontEndError, Result};
pub use source_tree::{parse_source, parse_unit, SourceTree};
