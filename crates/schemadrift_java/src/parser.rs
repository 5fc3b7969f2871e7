//! Declaration parser for Java compilation units.
//!
//! Only the declaration skeleton is parsed: package, imports, type
//! declarations with their annotations, modifiers, `extends` clause, fields
//! and member types. Method, constructor and initializer bodies are skipped
//! by balanced-delimiter scanning and never interpreted.

use crate::lexer::{Token, TokenKind};
use schemadrift_mapping::{Annotation, AnnotationValue, Modifiers, TypeKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationUnit {
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,
}

/// A non-static import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub path: String,
    /// `import a.b.*;`
    pub on_demand: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    /// Superclass name as written, type arguments removed.
    pub superclass: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub members: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    /// Type as written, type arguments removed, `[]` per array dimension.
    pub type_name: String,
    pub annotations: Vec<Annotation>,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

type ParseResult<T> = Result<T, ParseError>;

/// Parse a tokenized compilation unit.
pub fn parse(tokens: &[Token]) -> ParseResult<CompilationUnit> {
    Parser { tokens, pos: 0 }.unit()
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    fn peek(&self, ahead: usize) -> Option<&'t TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn punct_at(&self, ahead: usize, c: char) -> bool {
        matches!(self.peek(ahead), Some(TokenKind::Punct(p)) if *p == c)
    }

    fn is_punct(&self, c: char) -> bool {
        self.punct_at(0, c)
    }

    fn ident_at(&self, ahead: usize) -> Option<&'t str> {
        match self.peek(ahead) {
            Some(TokenKind::Ident(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    fn is_ident(&self, word: &str) -> bool {
        self.ident_at(0) == Some(word)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let at = self
            .tokens
            .get(self.pos)
            .or_else(|| self.tokens.last());
        ParseError {
            line: at.map(|t| t.line).unwrap_or(1),
            column: at.map(|t| t.column).unwrap_or(1),
            message: message.into(),
        }
    }

    fn describe_current(&self) -> String {
        match self.peek(0) {
            Some(kind) => format!("'{kind}'"),
            None => "end of input".to_string(),
        }
    }

    fn expect_punct(&mut self, c: char) -> ParseResult<()> {
        if self.is_punct(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}', found {}", self.describe_current())))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.ident_at(0) {
            Some(s) => {
                self.advance();
                Ok(s.to_string())
            }
            None => Err(self.error(format!(
                "expected identifier, found {}",
                self.describe_current()
            ))),
        }
    }

    /// `a.b.c`, stopping before `.*` and `.class`.
    fn qualified_name(&mut self) -> ParseResult<String> {
        let mut name = self.expect_ident()?;
        while self.is_punct('.') {
            match self.ident_at(1) {
                Some("class") | None => break,
                Some(part) => {
                    name.push('.');
                    name.push_str(part);
                    self.pos += 2;
                }
            }
        }
        Ok(name)
    }

    // ------------------------------------------------------------------
    // Skipping
    // ------------------------------------------------------------------

    /// Skip from an opening delimiter to just past its matching close.
    fn skip_balanced(&mut self, open: char, close: char) -> ParseResult<()> {
        let start = self.error(format!("unbalanced '{open}'"));
        let mut depth = 0usize;
        loop {
            match self.peek(0) {
                None => return Err(start),
                Some(TokenKind::Punct(c)) if *c == open => depth += 1,
                Some(TokenKind::Punct(c)) if *c == close => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_type_params(&mut self) -> ParseResult<()> {
        self.skip_balanced('<', '>')
    }

    /// Skip a field initializer, stopping before the `,` or `;` that ends it.
    ///
    /// `<` only opens type arguments right after `new` or before a generic
    /// method name (`.<T>call()`); anywhere else it is a comparison.
    fn skip_initializer(&mut self) -> ParseResult<()> {
        let mut depth = 0usize;
        loop {
            match self.peek(0) {
                None => return Err(self.error("unterminated field initializer")),
                Some(TokenKind::Ident(word)) if word == "new" => {
                    self.advance();
                    self.skip_created_type()?;
                    continue;
                }
                Some(TokenKind::Punct('.')) if self.punct_at(1, '<') => {
                    self.advance();
                    self.skip_type_params()?;
                    continue;
                }
                Some(TokenKind::Punct(c)) => match *c {
                    '(' | '[' | '{' => depth += 1,
                    ')' | ']' | '}' => {
                        if depth == 0 {
                            return Err(self.error(format!("unexpected '{c}' in initializer")));
                        }
                        depth -= 1;
                    }
                    ';' | ',' if depth == 0 => return Ok(()),
                    _ => {}
                },
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip the type named by `new`, type arguments included, stopping at
    /// its arguments, dimensions or body.
    fn skip_created_type(&mut self) -> ParseResult<()> {
        loop {
            match self.peek(0) {
                Some(TokenKind::Punct('<')) => self.skip_type_params()?,
                Some(TokenKind::Punct('@')) => {
                    self.annotation()?;
                }
                Some(TokenKind::Ident(_)) | Some(TokenKind::Punct('.')) => self.advance(),
                _ => return Ok(()),
            }
        }
    }

    /// Skip the rest of a method or constructor starting at its parameter
    /// list: parameters, throws clause, default value, then body or `;`.
    fn skip_member_rest(&mut self) -> ParseResult<()> {
        self.skip_balanced('(', ')')?;
        loop {
            match self.peek(0) {
                None => return Err(self.error("unterminated method declaration")),
                Some(TokenKind::Punct('{')) => return self.skip_balanced('{', '}'),
                Some(TokenKind::Punct(';')) => {
                    self.advance();
                    return Ok(());
                }
                _ => self.advance(),
            }
        }
    }

    // ------------------------------------------------------------------
    // Compilation unit
    // ------------------------------------------------------------------

    fn unit(mut self) -> ParseResult<CompilationUnit> {
        let mut unit = CompilationUnit::default();

        while self.peek(0).is_some() {
            if self.is_punct(';') {
                self.advance();
                continue;
            }

            let (modifiers, annotations) = self.modifiers()?;

            if self.is_ident("package") {
                self.advance();
                unit.package = Some(self.qualified_name()?);
                self.expect_punct(';')?;
            } else if self.is_ident("import") {
                self.advance();
                let is_static = self.is_ident("static");
                if is_static {
                    self.advance();
                }
                let path = self.qualified_name()?;
                let on_demand = self.is_punct('.') && self.punct_at(1, '*');
                if on_demand {
                    self.pos += 2;
                }
                self.expect_punct(';')?;
                if !is_static {
                    unit.imports.push(Import { path, on_demand });
                }
            } else if self.is_ident("module") || self.is_ident("open") {
                // module declarations carry no types
                break;
            } else if self.starts_type_decl() {
                unit.types.push(self.type_decl(modifiers, annotations)?);
            } else {
                return Err(self.error(format!(
                    "expected a type declaration, found {}",
                    self.describe_current()
                )));
            }
        }

        Ok(unit)
    }

    fn modifiers(&mut self) -> ParseResult<(Modifiers, Vec<Annotation>)> {
        let mut modifiers = Modifiers::default();
        let mut annotations = Vec::new();

        loop {
            if self.is_punct('@') && self.ident_at(1) != Some("interface") {
                annotations.push(self.annotation()?);
                continue;
            }
            match self.ident_at(0) {
                Some("static") => modifiers.is_static = true,
                Some("final") => modifiers.is_final = true,
                Some("transient") => modifiers.is_transient = true,
                Some("abstract") => modifiers.is_abstract = true,
                Some("public" | "protected" | "private" | "volatile" | "synchronized"
                    | "native" | "strictfp" | "default" | "sealed") => {}
                Some("non") if self.punct_at(1, '-') && self.ident_at(2) == Some("sealed") => {
                    self.pos += 2;
                }
                _ => break,
            }
            self.advance();
        }

        Ok((modifiers, annotations))
    }

    // ------------------------------------------------------------------
    // Annotations
    // ------------------------------------------------------------------

    fn annotation(&mut self) -> ParseResult<Annotation> {
        self.expect_punct('@')?;
        let mut annotation = Annotation::marker(self.qualified_name()?);

        if !self.is_punct('(') {
            return Ok(annotation);
        }
        self.advance();

        if self.is_punct(')') {
            self.advance();
            return Ok(annotation);
        }

        if self.ident_at(0).is_some() && self.punct_at(1, '=') {
            loop {
                let key = self.expect_ident()?;
                self.expect_punct('=')?;
                let value = self.element_value()?;
                annotation.attributes.insert(key, value);
                if self.is_punct(',') {
                    self.advance();
                    continue;
                }
                break;
            }
        } else {
            let value = self.element_value()?;
            annotation.attributes.insert("value".to_string(), value);
        }

        self.expect_punct(')')?;
        Ok(annotation)
    }

    fn element_value(&mut self) -> ParseResult<AnnotationValue> {
        if self.is_punct('@') {
            return Ok(AnnotationValue::Annotation(self.annotation()?));
        }

        if self.is_punct('{') {
            self.advance();
            let mut items = Vec::new();
            loop {
                if self.is_punct('}') {
                    self.advance();
                    break;
                }
                items.push(self.element_value()?);
                if self.is_punct(',') {
                    self.advance();
                } else if !self.is_punct('}') {
                    return Err(self.error(format!(
                        "expected ',' or '}}' in array value, found {}",
                        self.describe_current()
                    )));
                }
            }
            return Ok(AnnotationValue::Array(items));
        }

        let start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.peek(0) {
                None => return Err(self.error("unterminated annotation value")),
                Some(TokenKind::Punct('(' | '[')) => depth += 1,
                Some(TokenKind::Punct(')' | ']')) if depth > 0 => depth -= 1,
                Some(TokenKind::Punct(',' | ')' | '}')) if depth == 0 => break,
                _ => {}
            }
            self.advance();
        }

        if start == self.pos {
            return Err(self.error(format!(
                "expected annotation value, found {}",
                self.describe_current()
            )));
        }
        Ok(classify_expression(&self.tokens[start..self.pos]))
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn starts_type_decl(&self) -> bool {
        match self.ident_at(0) {
            Some("class" | "interface" | "enum") => true,
            Some("record") => {
                self.ident_at(1).is_some() && (self.punct_at(2, '(') || self.punct_at(2, '<'))
            }
            _ => self.is_punct('@') && self.ident_at(1) == Some("interface"),
        }
    }

    /// A type reference as written, without type arguments.
    fn type_ref(&mut self) -> ParseResult<String> {
        while self.is_punct('@') && self.ident_at(1) != Some("interface") {
            self.annotation()?;
        }

        let mut name = self.expect_ident()?;
        loop {
            if self.is_punct('<') {
                self.skip_type_params()?;
            } else if self.is_punct('.') && self.ident_at(1).is_some() {
                name.push('.');
                name.push_str(self.ident_at(1).unwrap_or_default());
                self.pos += 2;
            } else {
                break;
            }
        }
        name.push_str(&self.array_dims());
        Ok(name)
    }

    fn array_dims(&mut self) -> String {
        let mut dims = String::new();
        while self.is_punct('[') && self.punct_at(1, ']') {
            dims.push_str("[]");
            self.pos += 2;
        }
        dims
    }

    fn type_decl(
        &mut self,
        modifiers: Modifiers,
        annotations: Vec<Annotation>,
    ) -> ParseResult<TypeDecl> {
        let kind = if self.is_punct('@') {
            self.pos += 2;
            TypeKind::Annotation
        } else {
            let kind = match self.ident_at(0) {
                Some("class") => TypeKind::Class,
                Some("interface") => TypeKind::Interface,
                Some("enum") => TypeKind::Enum,
                Some("record") => TypeKind::Record,
                _ => return Err(self.error("expected a type declaration")),
            };
            self.advance();
            kind
        };

        let mut decl = TypeDecl {
            name: self.expect_ident()?,
            kind,
            modifiers,
            annotations,
            superclass: None,
            fields: Vec::new(),
            members: Vec::new(),
        };

        if self.is_punct('<') {
            self.skip_type_params()?;
        }
        if kind == TypeKind::Record && self.is_punct('(') {
            decl.fields = self.record_components()?;
        }

        loop {
            match self.peek(0) {
                None => {
                    return Err(self.error(format!("unterminated declaration of {}", decl.name)))
                }
                Some(TokenKind::Punct('{')) => break,
                Some(TokenKind::Ident(word)) if word == "extends" && kind == TypeKind::Class => {
                    self.advance();
                    decl.superclass = Some(self.type_ref()?);
                }
                Some(TokenKind::Punct('<')) => self.skip_type_params()?,
                Some(TokenKind::Punct('@')) => {
                    self.annotation()?;
                }
                _ => self.advance(),
            }
        }

        self.body(&mut decl)?;
        Ok(decl)
    }

    fn record_components(&mut self) -> ParseResult<Vec<FieldDecl>> {
        self.expect_punct('(')?;
        let mut fields = Vec::new();
        while !self.is_punct(')') {
            let (mut modifiers, annotations) = self.modifiers()?;
            modifiers.is_final = true;
            let mut type_name = self.type_ref()?;
            if self.is_punct('.') && self.punct_at(1, '.') && self.punct_at(2, '.') {
                self.pos += 3;
                type_name.push_str("[]");
            }
            let name = self.expect_ident()?;
            fields.push(FieldDecl {
                name,
                type_name,
                annotations,
                modifiers,
            });
            if self.is_punct(',') {
                self.advance();
            } else if !self.is_punct(')') {
                return Err(self.error(format!(
                    "expected ',' or ')' in record header, found {}",
                    self.describe_current()
                )));
            }
        }
        self.advance();
        Ok(fields)
    }

    fn body(&mut self, decl: &mut TypeDecl) -> ParseResult<()> {
        self.expect_punct('{')?;
        if decl.kind == TypeKind::Enum {
            self.skip_enum_constants()?;
        }
        let implicit_static = matches!(decl.kind, TypeKind::Interface | TypeKind::Annotation);

        loop {
            match self.peek(0) {
                None => return Err(self.error(format!("unterminated body of {}", decl.name))),
                Some(TokenKind::Punct('}')) => {
                    self.advance();
                    return Ok(());
                }
                Some(TokenKind::Punct(';')) => {
                    self.advance();
                    continue;
                }
                _ => {}
            }

            let (mut modifiers, annotations) = self.modifiers()?;

            if self.is_punct('{') {
                self.skip_balanced('{', '}')?;
                continue;
            }
            if self.starts_type_decl() {
                decl.members.push(self.type_decl(modifiers, annotations)?);
                continue;
            }
            if self.is_punct('<') {
                self.skip_type_params()?;
            }

            let type_name = self.type_ref()?;
            if self.is_punct('(') {
                // constructor
                self.skip_member_rest()?;
                continue;
            }
            if self.is_punct('{') && type_name == decl.name {
                // compact canonical constructor of a record
                self.skip_balanced('{', '}')?;
                continue;
            }
            let mut name = self.expect_ident()?;
            if self.is_punct('(') {
                self.skip_member_rest()?;
                continue;
            }

            if implicit_static {
                modifiers.is_static = true;
                modifiers.is_final = true;
            }
            loop {
                let type_name = format!("{type_name}{}", self.array_dims());
                decl.fields.push(FieldDecl {
                    name,
                    type_name,
                    annotations: annotations.clone(),
                    modifiers,
                });
                if self.is_punct('=') {
                    self.advance();
                    self.skip_initializer()?;
                }
                if self.is_punct(',') {
                    self.advance();
                    name = self.expect_ident()?;
                    continue;
                }
                self.expect_punct(';')?;
                break;
            }
        }
    }

    fn skip_enum_constants(&mut self) -> ParseResult<()> {
        loop {
            match self.peek(0) {
                None => return Err(self.error("unterminated enum body")),
                Some(TokenKind::Punct(';')) => {
                    self.advance();
                    return Ok(());
                }
                Some(TokenKind::Punct('}')) => return Ok(()),
                Some(TokenKind::Punct('(')) => self.skip_balanced('(', ')')?,
                Some(TokenKind::Punct('{')) => self.skip_balanced('{', '}')?,
                Some(TokenKind::Punct('@')) => {
                    self.annotation()?;
                }
                _ => self.advance(),
            }
        }
    }
}

/// Interpret the tokens of a non-array, non-annotation element value.
fn classify_expression(tokens: &[Token]) -> AnnotationValue {
    let kinds: Vec<&TokenKind> = tokens.iter().map(|t| &t.kind).collect();

    // "a" + "b" + ...
    let is_concat = kinds.iter().enumerate().all(|(i, k)| {
        if i % 2 == 0 {
            matches!(k, TokenKind::Str(_))
        } else {
            matches!(k, TokenKind::Punct('+'))
        }
    }) && kinds.len() % 2 == 1;
    if is_concat {
        let joined = kinds
            .iter()
            .filter_map(|k| match k {
                TokenKind::Str(s) => Some(s.as_str()),
                _ => None,
            })
            .collect::<String>();
        return AnnotationValue::Str(joined);
    }

    // a.b.C or a.b.C.class
    let dotted = kinds.iter().enumerate().all(|(i, k)| {
        if i % 2 == 0 {
            matches!(k, TokenKind::Ident(_))
        } else {
            matches!(k, TokenKind::Punct('.'))
        }
    }) && kinds.len() % 2 == 1;
    if dotted {
        let parts: Vec<&str> = kinds
            .iter()
            .filter_map(|k| match k {
                TokenKind::Ident(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        if let Some((last, init)) = parts.split_last() {
            if *last == "class" && !init.is_empty() {
                return AnnotationValue::Class(init.join("."));
            }
            if matches!(*last, "true" | "false" | "null") && init.is_empty() {
                return AnnotationValue::Other(last.to_string());
            }
            return AnnotationValue::Enum {
                type_name: (!init.is_empty()).then(|| init.join(".")),
                constant: last.to_string(),
            };
        }
    }

    AnnotationValue::Other(kinds.iter().map(|k| k.to_string()).collect())
}
