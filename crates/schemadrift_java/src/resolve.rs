//! Turns parsed compilation units into type descriptors, resolving written
//! type names into ordered candidate qualified names.
//!
//! Candidates are produced without knowing which types exist; the type graph
//! later picks the first candidate that was actually declared. Order follows
//! Java's scoping: member types of enclosing declarations, single-type
//! imports, the unit's own package, on-demand imports, then the name as
//! written.

use crate::parser::{CompilationUnit, FieldDecl, TypeDecl};
use schemadrift_mapping::{EntityTypeDescriptor, FieldDescriptor, TypeRef};

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

struct Scope<'u> {
    package: Option<&'u str>,
    unit: &'u CompilationUnit,
}

/// Flatten every declaration in `unit` (member types included) into
/// descriptors tagged with `origin`.
pub fn describe_unit(unit: &CompilationUnit, origin: &str) -> Vec<EntityTypeDescriptor> {
    let scope = Scope {
        package: unit.package.as_deref(),
        unit,
    };
    let mut out = Vec::new();
    for decl in &unit.types {
        let qualified = match scope.package {
            Some(pkg) => format!("{pkg}.{}", decl.name),
            None => decl.name.clone(),
        };
        scope.describe(decl, qualified, &mut Vec::new(), origin, &mut out);
    }
    out
}

impl<'u> Scope<'u> {
    fn describe(
        &self,
        decl: &TypeDecl,
        qualified: String,
        enclosing: &mut Vec<String>,
        origin: &str,
        out: &mut Vec<EntityTypeDescriptor>,
    ) {
        let superclass = decl
            .superclass
            .as_deref()
            .map(|written| self.type_ref(written, enclosing));

        enclosing.push(qualified.clone());
        let scopes: &[String] = enclosing;
        let fields = decl.fields.iter().map(|f| self.field(f, scopes)).collect();

        let mut descriptor = EntityTypeDescriptor::class(qualified.clone()).from_origin(origin);
        descriptor.kind = decl.kind;
        descriptor.modifiers = decl.modifiers;
        descriptor.annotations = decl.annotations.clone();
        descriptor.superclass = superclass.filter(|s| !is_object(s));
        descriptor.fields = fields;
        out.push(descriptor);

        for member in &decl.members {
            let member_qualified = format!("{qualified}.{}", member.name);
            self.describe(member, member_qualified, enclosing, origin, out);
        }
        enclosing.pop();
    }

    fn field(&self, field: &FieldDecl, enclosing: &[String]) -> FieldDescriptor {
        FieldDescriptor {
            name: field.name.clone(),
            declared_type: self.type_ref(&field.type_name, enclosing),
            annotations: field.annotations.clone(),
            modifiers: field.modifiers,
        }
    }

    /// Candidate qualified names for `written`, seen from inside the
    /// innermost of `enclosing` (outermost first).
    fn type_ref(&self, written: &str, enclosing: &[String]) -> TypeRef {
        if written.ends_with("[]") || PRIMITIVES.contains(&written) {
            return TypeRef::with_candidates(written, Vec::new());
        }

        let (first, rest) = match written.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (written, None),
        };
        let with_rest = |base: &str| match rest {
            Some(rest) => format!("{base}.{rest}"),
            None => base.to_string(),
        };

        let mut candidates: Vec<String> = Vec::new();
        let mut push = |c: String| {
            if !candidates.contains(&c) {
                candidates.push(c);
            }
        };

        for outer in enclosing.iter().rev() {
            push(format!("{outer}.{written}"));
            if outer.rsplit('.').next() == Some(first) {
                push(with_rest(outer));
            }
        }

        for import in self.unit.imports.iter().filter(|i| !i.on_demand) {
            if import.path.rsplit('.').next() == Some(first) {
                push(with_rest(&import.path));
            }
        }

        match self.package {
            Some(pkg) => push(format!("{pkg}.{written}")),
            None => push(written.to_string()),
        }

        for import in self.unit.imports.iter().filter(|i| i.on_demand) {
            push(format!("{}.{written}", import.path));
        }

        push(written.to_string());
        TypeRef::with_candidates(written, candidates)
    }
}

fn is_object(type_ref: &TypeRef) -> bool {
    type_ref.written == "Object" || type_ref.written == "java.lang.Object"
}
