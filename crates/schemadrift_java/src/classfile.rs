//! Compiled class-file reader.
//!
//! Decodes the parts of the class-file format that carry mapping
//! information: the constant pool, access flags, this/super class, fields
//! with their descriptors, runtime annotations on the class and its fields,
//! and the `InnerClasses` entry describing the class itself. Methods and all
//! other attributes are skipped by length.

use crate::error::{FrontEndError, Result};
use byteorder::{BigEndian, ReadBytesExt};
use schemadrift_mapping::{
    Annotation, AnnotationValue, EntityTypeDescriptor, FieldDescriptor, Modifiers, TypeKind,
    TypeRef,
};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

pub const MAGIC: u32 = 0xCAFE_BABE;

pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_TRANSIENT: u16 = 0x0080;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;

/// Constant pool entry. Only the variants whose payload is needed keep it.
#[derive(Debug, Clone, PartialEq)]
enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    /// Second slot of a long or double, and index 0.
    Unusable,
    /// Any other entry (member refs, method handles, dynamic, module...).
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub annotations: Vec<Annotation>,
}

/// The decoded subset of a class file.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub access_flags: u16,
    /// Internal binary name, e.g. `com/acme/Order$Line`.
    pub this_class: String,
    pub super_class: Option<String>,
    pub fields: Vec<FieldInfo>,
    pub annotations: Vec<Annotation>,
    /// This class's own `InnerClasses` entry, present for nested classes.
    pub inner: Option<InnerClass>,
}

/// How a nested class is declared inside its outer class.
#[derive(Debug, Clone, PartialEq)]
pub struct InnerClass {
    /// `None` for local and anonymous classes.
    pub outer_class: Option<String>,
    /// `None` for anonymous classes.
    pub simple_name: Option<String>,
    /// Source-level flags; `static` only shows up here.
    pub access_flags: u16,
}

/// Class-level attributes the reader keeps.
#[derive(Default)]
struct Attributes {
    annotations: Vec<Annotation>,
    inner: Option<InnerClass>,
}

impl ClassFile {
    /// Decode a class file. `origin` names it in errors.
    pub fn parse(bytes: &[u8], origin: &str) -> Result<Self> {
        Reader {
            cursor: Cursor::new(bytes),
            pool: Vec::new(),
            origin,
        }
        .class_file()
    }

    /// Dotted qualified name; nested-class `$` separators become `.`.
    pub fn qualified_name(&self) -> String {
        binary_to_qualified(&self.this_class)
    }

    /// Anonymous and local classes (`Outer$1`, `Outer$1Local`) can never be
    /// mapped and are not worth describing.
    pub fn is_anonymous_or_local(&self) -> bool {
        if let Some(inner) = &self.inner {
            return inner.outer_class.is_none() || inner.simple_name.is_none();
        }
        self.this_class
            .rsplit_once('$')
            .is_some_and(|(_, last)| last.starts_with(|c: char| c.is_ascii_digit()))
    }

    pub fn into_descriptor(self, origin: &str) -> EntityTypeDescriptor {
        let kind = if self.access_flags & ACC_ANNOTATION != 0 {
            TypeKind::Annotation
        } else if self.access_flags & ACC_INTERFACE != 0 {
            TypeKind::Interface
        } else if self.access_flags & ACC_ENUM != 0 {
            TypeKind::Enum
        } else if self.super_class.as_deref() == Some("java/lang/Record") {
            TypeKind::Record
        } else {
            TypeKind::Class
        };

        let flags = self
            .inner
            .as_ref()
            .map_or(self.access_flags, |inner| inner.access_flags);
        let mut descriptor = EntityTypeDescriptor::class(self.qualified_name()).from_origin(origin);
        descriptor.kind = kind;
        descriptor.modifiers = modifiers(flags);
        descriptor.superclass = self
            .super_class
            .filter(|s| s != "java/lang/Object")
            .map(|s| TypeRef::new(binary_to_qualified(&s)));
        descriptor.annotations = self.annotations;
        descriptor.fields = self
            .fields
            .into_iter()
            .map(|f| FieldDescriptor {
                declared_type: descriptor_type(&f.descriptor),
                modifiers: modifiers(f.access_flags),
                name: f.name,
                annotations: f.annotations,
            })
            .collect();
        descriptor
    }
}

fn modifiers(flags: u16) -> Modifiers {
    Modifiers {
        is_static: flags & ACC_STATIC != 0,
        is_final: flags & ACC_FINAL != 0,
        is_transient: flags & ACC_TRANSIENT != 0,
        is_abstract: flags & ACC_ABSTRACT != 0,
        is_synthetic: flags & ACC_SYNTHETIC != 0,
    }
}

fn binary_to_qualified(binary: &str) -> String {
    binary
        .chars()
        .map(|c| if c == '/' || c == '$' { '.' } else { c })
        .collect()
}

/// Type reference for a field descriptor (`I`, `Ljava/lang/String;`,
/// `[Lcom/acme/Tag;`). Primitive and array types get no candidates.
fn descriptor_type(descriptor: &str) -> TypeRef {
    let name = descriptor_name(descriptor);
    if descriptor.starts_with('L') {
        TypeRef::new(name)
    } else {
        TypeRef::with_candidates(name, Vec::new())
    }
}

/// Source-style name for a field descriptor.
fn descriptor_name(descriptor: &str) -> String {
    let dims = descriptor.chars().take_while(|c| *c == '[').count();
    let element = &descriptor[dims..];
    let base = match element {
        "Z" => "boolean".to_string(),
        "B" => "byte".to_string(),
        "C" => "char".to_string(),
        "S" => "short".to_string(),
        "I" => "int".to_string(),
        "J" => "long".to_string(),
        "F" => "float".to_string(),
        "D" => "double".to_string(),
        "V" => "void".to_string(),
        other => other
            .strip_prefix('L')
            .and_then(|s| s.strip_suffix(';'))
            .map(binary_to_qualified)
            .unwrap_or_else(|| other.to_string()),
    };
    format!("{base}{}", "[]".repeat(dims))
}

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
    pool: Vec<Constant>,
    origin: &'a str,
}

impl<'a> Reader<'a> {
    fn malformed(&self, message: impl Into<String>) -> FrontEndError {
        FrontEndError::class_format(
            self.origin,
            format!("{} (at byte {})", message.into(), self.cursor.position()),
        )
    }

    fn u8(&mut self) -> Result<u8> {
        self.cursor
            .read_u8()
            .map_err(|_| self.malformed("unexpected end of class file"))
    }

    fn u16(&mut self) -> Result<u16> {
        self.cursor
            .read_u16::<BigEndian>()
            .map_err(|_| self.malformed("unexpected end of class file"))
    }

    fn u32(&mut self) -> Result<u32> {
        self.cursor
            .read_u32::<BigEndian>()
            .map_err(|_| self.malformed("unexpected end of class file"))
    }

    fn bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let total = self.cursor.get_ref().len() as u64;
        if self.cursor.position() + len as u64 > total {
            return Err(self.malformed(format!("length {len} exceeds remaining data")));
        }
        let mut buf = vec![0u8; len];
        self.cursor
            .read_exact(&mut buf)
            .map_err(|_| self.malformed("unexpected end of class file"))?;
        Ok(buf)
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        let end = self.cursor.position() + len;
        if end > self.cursor.get_ref().len() as u64 {
            return Err(self.malformed(format!("length {len} exceeds remaining data")));
        }
        self.cursor.set_position(end);
        Ok(())
    }

    fn class_file(mut self) -> Result<ClassFile> {
        if self.u32()? != MAGIC {
            return Err(self.malformed("bad magic number"));
        }
        let _minor = self.u16()?;
        let _major = self.u16()?;
        self.constant_pool()?;

        let access_flags = self.u16()?;
        let this_index = self.u16()?;
        let this_class = self.class_name(this_index)?;
        let super_index = self.u16()?;
        let super_class = if super_index == 0 {
            None
        } else {
            Some(self.class_name(super_index)?)
        };

        let interfaces = self.u16()?;
        self.skip(u64::from(interfaces) * 2)?;

        let field_count = self.u16()?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            fields.push(self.field()?);
        }

        let method_count = self.u16()?;
        for _ in 0..method_count {
            self.skip(6)?;
            self.skip_attributes()?;
        }

        let attributes = self.attributes(Some(this_index))?;

        Ok(ClassFile {
            access_flags,
            this_class,
            super_class,
            fields,
            annotations: attributes.annotations,
            inner: attributes.inner,
        })
    }

    fn constant_pool(&mut self) -> Result<()> {
        let count = self.u16()?;
        self.pool = Vec::with_capacity(count as usize);
        self.pool.push(Constant::Unusable);

        while self.pool.len() < count as usize {
            let tag = self.u8()?;
            let entry = match tag {
                1 => {
                    let len = self.u16()? as usize;
                    let raw = self.bytes(len)?;
                    Constant::Utf8(decode_modified_utf8(&raw).ok_or_else(|| {
                        self.malformed(format!("invalid modified UTF-8 in constant {}", self.pool.len()))
                    })?)
                }
                3 => Constant::Integer(self.u32()? as i32),
                4 => Constant::Float(f32::from_bits(self.u32()?)),
                5 | 6 => {
                    let high = u64::from(self.u32()?);
                    let low = u64::from(self.u32()?);
                    let bits = (high << 32) | low;
                    let entry = if tag == 5 {
                        Constant::Long(bits as i64)
                    } else {
                        Constant::Double(f64::from_bits(bits))
                    };
                    self.pool.push(entry);
                    Constant::Unusable
                }
                7 => Constant::Class(self.u16()?),
                8 => Constant::String(self.u16()?),
                16 | 19 | 20 => {
                    self.skip(2)?;
                    Constant::Other
                }
                15 => {
                    self.skip(3)?;
                    Constant::Other
                }
                9 | 10 | 11 | 12 | 17 | 18 => {
                    self.skip(4)?;
                    Constant::Other
                }
                other => {
                    return Err(self.malformed(format!(
                        "unknown constant pool tag {other} at index {}",
                        self.pool.len()
                    )))
                }
            };
            self.pool.push(entry);
        }
        Ok(())
    }

    fn constant(&self, index: u16) -> Result<&Constant> {
        self.pool
            .get(index as usize)
            .ok_or_else(|| self.malformed(format!("constant pool index {index} out of range")))
    }

    fn utf8(&self, index: u16) -> Result<String> {
        match self.constant(index)? {
            Constant::Utf8(s) => Ok(s.clone()),
            other => Err(self.malformed(format!(
                "constant {index} should be UTF-8 but is {other:?}"
            ))),
        }
    }

    fn class_name(&self, index: u16) -> Result<String> {
        match self.constant(index)? {
            Constant::Class(name) => self.utf8(*name),
            other => Err(self.malformed(format!(
                "constant {index} should be a class but is {other:?}"
            ))),
        }
    }

    fn field(&mut self) -> Result<FieldInfo> {
        let access_flags = self.u16()?;
        let name_index = self.u16()?;
        let name = self.utf8(name_index)?;
        let descriptor_index = self.u16()?;
        let descriptor = self.utf8(descriptor_index)?;
        let annotations = self.attributes(None)?.annotations;
        Ok(FieldInfo {
            access_flags,
            name,
            descriptor,
            annotations,
        })
    }

    fn skip_attributes(&mut self) -> Result<()> {
        let count = self.u16()?;
        for _ in 0..count {
            self.skip(2)?;
            let len = self.u32()?;
            self.skip(u64::from(len))?;
        }
        Ok(())
    }

    /// Read an attribute table, keeping runtime annotations and skipping the
    /// rest.
    /// Read an attribute table. `this_index` is set for the class-level table,
    /// where `InnerClasses` is decoded.
    fn attributes(&mut self, this_index: Option<u16>) -> Result<Attributes> {
        let count = self.u16()?;
        let mut attributes = Attributes::default();
        for _ in 0..count {
            let name_index = self.u16()?;
            let name = self.utf8(name_index)?;
            let len = u64::from(self.u32()?);
            match name.as_str() {
                "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                    let end = self.cursor.position() + len;
                    let n = self.u16()?;
                    for _ in 0..n {
                        attributes.annotations.push(self.annotation()?);
                    }
                    if self.cursor.position() != end {
                        return Err(self.malformed(format!("attribute {name} length mismatch")));
                    }
                }
                "InnerClasses" if this_index.is_some() => {
                    let end = self.cursor.position() + len;
                    let n = self.u16()?;
                    for _ in 0..n {
                        let inner_index = self.u16()?;
                        let outer_index = self.u16()?;
                        let name_index = self.u16()?;
                        let access_flags = self.u16()?;
                        if Some(inner_index) != this_index {
                            continue;
                        }
                        attributes.inner = Some(InnerClass {
                            outer_class: match outer_index {
                                0 => None,
                                i => Some(self.class_name(i)?),
                            },
                            simple_name: match name_index {
                                0 => None,
                                i => Some(self.utf8(i)?),
                            },
                            access_flags,
                        });
                    }
                    if self.cursor.position() != end {
                        return Err(self.malformed("attribute InnerClasses length mismatch"));
                    }
                }
                _ => self.skip(len)?,
            }
        }
        Ok(attributes)
    }

    fn annotation(&mut self) -> Result<Annotation> {
        let type_index = self.u16()?;
        let type_descriptor = self.utf8(type_index)?;
        let mut annotation = Annotation {
            name: descriptor_name(&type_descriptor),
            attributes: BTreeMap::new(),
        };
        let pairs = self.u16()?;
        for _ in 0..pairs {
            let key_index = self.u16()?;
            let key = self.utf8(key_index)?;
            let value = self.element_value()?;
            annotation.attributes.insert(key, value);
        }
        Ok(annotation)
    }

    fn element_value(&mut self) -> Result<AnnotationValue> {
        let tag = self.u8()?;
        Ok(match tag {
            b's' => {
                let index = self.u16()?;
                AnnotationValue::Str(self.utf8(index)?)
            }
            b'B' | b'C' | b'I' | b'S' | b'Z' | b'J' | b'F' | b'D' => {
                let index = self.u16()?;
                AnnotationValue::Other(self.constant_text(tag, index)?)
            }
            b'e' => {
                let type_index = self.u16()?;
                let type_name = descriptor_name(&self.utf8(type_index)?);
                let const_index = self.u16()?;
                AnnotationValue::Enum {
                    type_name: Some(type_name),
                    constant: self.utf8(const_index)?,
                }
            }
            b'c' => {
                let index = self.u16()?;
                AnnotationValue::Class(descriptor_name(&self.utf8(index)?))
            }
            b'@' => AnnotationValue::Annotation(self.annotation()?),
            b'[' => {
                let n = self.u16()?;
                let mut items = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    items.push(self.element_value()?);
                }
                AnnotationValue::Array(items)
            }
            other => {
                return Err(self.malformed(format!(
                    "unknown element value tag '{}'",
                    char::from(other)
                )))
            }
        })
    }

    fn constant_text(&self, tag: u8, index: u16) -> Result<String> {
        Ok(match (tag, self.constant(index)?) {
            (b'Z', Constant::Integer(v)) => (*v != 0).to_string(),
            (b'C', Constant::Integer(v)) => char::from_u32(*v as u32)
                .map(String::from)
                .unwrap_or_default(),
            (_, Constant::Integer(v)) => v.to_string(),
            (_, Constant::Long(v)) => v.to_string(),
            (_, Constant::Float(v)) => v.to_string(),
            (_, Constant::Double(v)) => v.to_string(),
            (_, Constant::Utf8(s)) => s.clone(),
            (_, Constant::String(i)) => self.utf8(*i)?,
            (_, other) => {
                return Err(self.malformed(format!(
                    "constant {index} cannot be an element value: {other:?}"
                )))
            }
        })
    }
}

/// Decode the class-file flavour of UTF-8: NUL as two bytes, supplementary
/// characters as surrogate pairs of three bytes each.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(u16::from(b));
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = *bytes.get(i + 1)?;
            units.push((u16::from(b & 0x1F) << 6) | u16::from(b2 & 0x3F));
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = *bytes.get(i + 1)?;
            let b3 = *bytes.get(i + 2)?;
            units.push(
                (u16::from(b & 0x0F) << 12) | (u16::from(b2 & 0x3F) << 6) | u16::from(b3 & 0x3F),
            );
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}
