//! Recursive-descent parser turning a token stream into a `syntax::Schema`.
//!
//! Scoped the same way as the lexer: the distilled spec treats the
//! concrete grammar as an external collaborator, so this is deliberately
//! straightforward rather than a generated parser, grounded on the
//! teacher's own hand-rolled `TypeParser` (peek/advance over a cursor,
//! building up a typed result field by field).

use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::span::{Position, Span};
use crate::syntax::ast::*;
use std::path::Path;

pub fn parse_schema(source: &str, file: &Path) -> Result<Schema, ParseError> {
    let tokens = Lexer::new(source, file).tokenize()?;
    Parser::new(tokens, file).parse_schema()
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    file: &'a Path,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, file: &'a Path) -> Self {
        Self {
            tokens,
            pos: 0,
            file,
        }
    }

    fn err(&self, at: Position, message: impl Into<String>) -> ParseError {
        ParseError {
            file: self.file.to_path_buf(),
            location: at,
            message: message.into(),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn span_here(&self) -> Span {
        self.peek().span
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            let at = self.peek().span.start;
            Err(self.err(
                at,
                format!("expected {:?}, found {:?}", kind, self.peek_kind()),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let at = self.peek().span.start;
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.err(at, format!("expected identifier, found {other:?}"))),
        }
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Ident(s) if s == word)
    }

    fn parse_schema(&mut self) -> Result<Schema, ParseError> {
        let mut declarations = Vec::new();
        while *self.peek_kind() != TokenKind::Eof {
            declarations.push(self.parse_declaration()?);
        }
        Ok(Schema::new(declarations))
    }

    fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        if self.is_keyword("namespace") {
            self.advance();
            let ns = self.parse_dotted_path()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Declaration::Namespace(Namespace::from_dotted(&ns)));
        }
        if self.is_keyword("include") {
            self.advance();
            let path = self.parse_string_literal()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Declaration::Include(path));
        }
        if self.is_keyword("root_type") {
            self.advance();
            let name = self.parse_dotted_path()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Declaration::RootType(name));
        }
        if self.is_keyword("file_identifier") {
            self.advance();
            let id = self.parse_string_literal()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Declaration::FileIdentifier(id));
        }
        if self.is_keyword("file_extension") {
            self.advance();
            let ext = self.parse_string_literal()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Declaration::FileExtension(ext));
        }
        if self.is_keyword("attribute") {
            self.advance();
            let name = self.parse_string_literal()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Declaration::Attribute(name));
        }
        if self.is_keyword("enum") {
            return self.parse_enum().map(Declaration::Enum);
        }
        if self.is_keyword("struct") {
            return self
                .parse_struct_or_table()
                .map(|s| Declaration::Struct(s.into()));
        }
        if self.is_keyword("table") {
            return self
                .parse_struct_or_table()
                .map(|s| Declaration::Table(s.into()));
        }
        if self.is_keyword("union") {
            return self.parse_union().map(Declaration::Union);
        }

        let at = self.peek().span.start;
        Err(self.err(
            at,
            format!("expected a top-level declaration, found {:?}", self.peek_kind()),
        ))
    }

    fn parse_dotted_path(&mut self) -> Result<String, ParseError> {
        let mut segments = vec![self.expect_ident()?];
        while *self.peek_kind() == TokenKind::Dot {
            self.advance();
            segments.push(self.expect_ident()?);
        }
        Ok(segments.join("."))
    }

    fn parse_string_literal(&mut self) -> Result<String, ParseError> {
        let at = self.peek().span.start;
        match self.peek_kind().clone() {
            TokenKind::Str(s) => {
                self.advance();
                Ok(s)
            }
            other => Err(self.err(at, format!("expected string literal, found {other:?}"))),
        }
    }

    fn parse_metadata(&mut self) -> Result<Metadata, ParseError> {
        let mut map = std::collections::BTreeMap::new();
        if *self.peek_kind() != TokenKind::LParen {
            return Ok(Metadata(map));
        }
        self.advance();
        loop {
            if *self.peek_kind() == TokenKind::RParen {
                break;
            }
            let key = self.expect_ident()?;
            let value = if *self.peek_kind() == TokenKind::Colon {
                self.advance();
                Some(self.parse_literal()?)
            } else {
                None
            };
            map.insert(key, value);
            if *self.peek_kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Metadata(map))
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let at = self.peek().span.start;
        match self.peek_kind().clone() {
            TokenKind::Int(v) => {
                self.advance();
                Ok(Literal::Int(v))
            }
            TokenKind::Float(v) => {
                self.advance();
                Ok(Literal::Float(v))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Literal::Str(s))
            }
            TokenKind::Ident(name) => {
                self.advance();
                match name.as_str() {
                    "true" => Ok(Literal::Bool(true)),
                    "false" => Ok(Literal::Bool(false)),
                    _ => Ok(Literal::Ident(name)),
                }
            }
            other => Err(self.err(at, format!("expected a literal, found {other:?}"))),
        }
    }

    fn parse_type(&mut self) -> Result<RawType, ParseError> {
        if *self.peek_kind() == TokenKind::LBracket {
            self.advance();
            let inner = self.parse_type()?;
            self.expect(&TokenKind::RBracket)?;
            return Ok(RawType::Vector(Box::new(inner)));
        }
        let name = self.parse_dotted_path()?;
        Ok(RawType::from_keyword(&name).unwrap_or(RawType::Named(name)))
    }

    fn parse_enum(&mut self) -> Result<EnumDecl, ParseError> {
        let start = self.span_here().start;
        self.advance(); // 'enum'
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Colon)?;
        let underlying = self.parse_type()?;
        let metadata = self.parse_metadata()?;
        self.expect(&TokenKind::LBrace)?;

        let mut variants = Vec::new();
        while *self.peek_kind() != TokenKind::RBrace {
            let vspan_start = self.span_here().start;
            let vname = self.expect_ident()?;
            let value = if *self.peek_kind() == TokenKind::Equals {
                self.advance();
                Some(self.parse_int_literal()?)
            } else {
                None
            };
            variants.push(EnumVariantDecl {
                name: vname,
                value,
                span: Span::new(vspan_start, self.span_here().start),
            });
            if *self.peek_kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(EnumDecl {
            name,
            underlying,
            variants,
            metadata,
            span: Span::new(start, self.span_here().start),
        })
    }

    fn parse_int_literal(&mut self) -> Result<i64, ParseError> {
        let at = self.peek().span.start;
        match self.peek_kind().clone() {
            TokenKind::Int(v) => {
                self.advance();
                Ok(v)
            }
            other => Err(self.err(at, format!("expected integer literal, found {other:?}"))),
        }
    }

    fn parse_struct_or_table(&mut self) -> Result<StructOrTable, ParseError> {
        let start = self.span_here().start;
        self.advance(); // 'struct' or 'table'
        let name = self.expect_ident()?;
        let metadata = self.parse_metadata()?;
        self.expect(&TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while *self.peek_kind() != TokenKind::RBrace {
            fields.push(self.parse_field()?);
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(StructOrTable {
            name,
            fields,
            metadata,
            span: Span::new(start, self.span_here().start),
        })
    }

    fn parse_field(&mut self) -> Result<FieldDecl, ParseError> {
        let start = self.span_here().start;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Colon)?;
        let ty = self.parse_type()?;

        let default = if *self.peek_kind() == TokenKind::Equals {
            self.advance();
            Some(self.parse_literal()?)
        } else {
            None
        };

        let metadata = self.parse_metadata()?;
        self.expect(&TokenKind::Semicolon)?;

        Ok(FieldDecl {
            name,
            ty,
            default,
            metadata,
            span: Span::new(start, self.span_here().start),
        })
    }

    fn parse_union(&mut self) -> Result<UnionDecl, ParseError> {
        let start = self.span_here().start;
        self.advance(); // 'union'
        let name = self.expect_ident()?;
        let metadata = self.parse_metadata()?;
        self.expect(&TokenKind::LBrace)?;

        let mut variants = Vec::new();
        while *self.peek_kind() != TokenKind::RBrace {
            let vspan_start = self.span_here().start;
            let first = self.parse_dotted_path()?;
            let (alias, type_ref) = if *self.peek_kind() == TokenKind::Colon {
                self.advance();
                let target = self.parse_dotted_path()?;
                (Some(first), target)
            } else {
                (None, first)
            };
            variants.push(UnionVariantDecl {
                alias,
                type_ref,
                span: Span::new(vspan_start, self.span_here().start),
            });
            if *self.peek_kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(UnionDecl {
            name,
            variants,
            metadata,
            span: Span::new(start, self.span_here().start),
        })
    }
}

/// `struct` and `table` share an identical grammar production; this is
/// split into the two AST node types only after parsing.
struct StructOrTable {
    name: String,
    fields: Vec<FieldDecl>,
    metadata: Metadata,
    span: Span,
}

impl From<StructOrTable> for StructDecl {
    fn from(v: StructOrTable) -> Self {
        StructDecl {
            name: v.name,
            fields: v.fields,
            metadata: v.metadata,
            span: v.span,
        }
    }
}

impl From<StructOrTable> for TableDecl {
    fn from(v: StructOrTable) -> Self {
        TableDecl {
            name: v.name,
            fields: v.fields,
            metadata: v.metadata,
            span: v.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Schema {
        parse_schema(source, Path::new("test.fbs")).unwrap()
    }

    #[test]
    fn parses_every_top_level_declaration_kind() {
        let schema = parse(
            r#"
            namespace Game.Sample;
            include "other.fbs";
            attribute "custom_attr";

            enum Color : uint8 { Red = 0, Green, Blue = 5 }

            struct Vec3 { x: float; y: float; z: float; }

            table Monster {
                pos: Vec3;
                color: Color = Blue (custom_attr);
                name: string (required);
                inventory: [uint8];
            }

            union Equipment { Monster, Weapon: Game.Sample.Monster }

            root_type Monster;
            file_identifier "MONS";
            file_extension "mon";
            "#,
        );

        assert_eq!(schema.declarations.len(), 10);
        assert_eq!(schema.root_type(), Some("Monster"));
        assert_eq!(schema.file_identifier(), Some("MONS"));
        assert_eq!(schema.includes().collect::<Vec<_>>(), vec!["other.fbs"]);
    }

    #[test]
    fn field_default_and_attributes_are_captured() {
        let schema = parse("table T { x: int32 = -7 (deprecated); }");
        let Declaration::Table(t) = &schema.declarations[0] else {
            panic!("expected a table declaration");
        };
        assert_eq!(t.fields[0].default, Some(Literal::Int(-7)));
        assert!(t.fields[0].metadata.has("deprecated"));
    }

    #[test]
    fn vector_of_named_type_parses_as_nested_vector_type() {
        let schema = parse("table T { xs: [Other.Thing]; }");
        let Declaration::Table(t) = &schema.declarations[0] else {
            panic!("expected a table declaration");
        };
        assert_eq!(t.fields[0].ty, RawType::Vector(Box::new(RawType::Named("Other.Thing".to_string()))));
    }

    #[test]
    fn union_variant_without_explicit_alias_keeps_type_ref_as_alias_source() {
        let schema = parse("union U { Monster }");
        let Declaration::Union(u) = &schema.declarations[0] else {
            panic!("expected a union declaration");
        };
        assert_eq!(u.variants[0].alias, None);
        assert_eq!(u.variants[0].type_ref, "Monster");
    }

    #[test]
    fn unterminated_brace_is_a_parse_error() {
        let err = parse_schema("table T { x: int32; ", Path::new("bad.fbs")).unwrap_err();
        assert!(err.message.contains("found Eof") || err.message.to_lowercase().contains("eof"));
    }
}
