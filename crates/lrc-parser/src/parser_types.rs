//! Syntax tree of an LR file.
//!
//! The parser produces these types and [`desugar`](crate::desugar) rewrites
//! them in place. Every name keeps the span it was parsed from so later
//! phases can point diagnostics at it.

use std::fmt;

use indexmap::IndexMap;

use crate::span::{Span, Spanned};

/// A parsed LR file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unit {
    /// Imported file paths, relative to the importing file.
    pub imports: Vec<Spanned<String>>,
    /// `option key = "value"` declarations. A repeated key keeps the last value.
    pub options: IndexMap<String, Spanned<String>>,
    pub aliases: Vec<Alias>,
    pub resources: Vec<Resource>,
}

impl Unit {
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|value| value.inner().as_str())
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|resource| resource.id.inner() == id)
    }
}

/// `alias name = pkg.resource`
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub name: Spanned<String>,
    pub target: Spanned<String>,
}

/// Title and description split out of a declaration's leading comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Docs {
    pub title: String,
    pub description: String,
}

impl Docs {
    /// The first comment line becomes the title and the remaining lines,
    /// joined with spaces, the description.
    pub fn from_comments(comments: &[String]) -> Self {
        let mut lines = comments.iter().map(|line| line.trim());
        let title = lines.next().unwrap_or_default().to_string();
        let description = lines.collect::<Vec<_>>().join(" ");
        Self { title, description }
    }
}

/// A resource declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Raw leading comment lines without the `//` marker.
    pub comments: Vec<String>,
    /// Filled in by desugaring from `comments`.
    pub docs: Docs,
    pub is_private: bool,
    pub id: Spanned<String>,
    /// Argument of `@defaults("...")`.
    pub defaults: Option<Spanned<String>>,
    pub list_type: Option<ListType>,
    pub fields: Vec<Field>,
    pub span: Span,
}

impl Resource {
    pub fn init(&self) -> Option<&Init> {
        self.fields.iter().find_map(|field| match &field.kind {
            FieldKind::Init(init) => Some(init),
            _ => None,
        })
    }

    /// Basic fields in declaration order, including rewritten embeds.
    pub fn basic_fields(&self) -> impl Iterator<Item = &BasicField> {
        self.fields.iter().filter_map(|field| match &field.kind {
            FieldKind::Basic(basic) => Some(basic),
            _ => None,
        })
    }

    pub fn basic_field(&self, name: &str) -> Option<&BasicField> {
        self.basic_fields().find(|field| field.name.inner() == name)
    }
}

/// `[]element(args)` at the top of a resource body.
#[derive(Debug, Clone, PartialEq)]
pub struct ListType {
    pub element: Spanned<String>,
    pub args: Option<Vec<Spanned<String>>>,
}

/// A member of a resource body.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub comments: Vec<String>,
    pub docs: Docs,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Init(Init),
    Embed(Embed),
    Basic(BasicField),
}

/// `init(arg type, other? type)`
#[derive(Debug, Clone, PartialEq)]
pub struct Init {
    pub args: Vec<TypedArg>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedArg {
    pub name: Spanned<String>,
    pub optional: bool,
    /// Absent when the argument takes its type from the same-named field.
    pub ty: Option<TypeExpr>,
}

/// `embed pkg.resource [as name]`
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub ty: Spanned<String>,
    pub alias: Option<Spanned<String>>,
}

/// `name(deps) type` or `name type`.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicField {
    pub name: Spanned<String>,
    /// `None` marks a static field. `Some` marks a computed field, possibly
    /// with no dependencies.
    pub args: Option<Vec<Spanned<String>>>,
    pub ty: TypeExpr,
    /// Set on fields that desugaring produced from an `embed`.
    pub is_embedded: bool,
}

impl BasicField {
    pub fn is_static(&self) -> bool {
        self.args.is_none()
    }

    pub fn dependencies(&self) -> &[Spanned<String>] {
        self.args.as_deref().unwrap_or_default()
    }
}

/// A type as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Primitive, resource, alias or package-qualified name.
    Simple(Spanned<String>),
    /// `[]T`
    List(Box<TypeExpr>, Span),
    /// `map[K]V`
    Map {
        key: Spanned<String>,
        value: Box<TypeExpr>,
        span: Span,
    },
}

impl TypeExpr {
    pub fn simple(name: impl Into<String>, span: Span) -> Self {
        Self::Simple(Spanned::new(name.into(), span))
    }

    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Simple(name) => name.span(),
            TypeExpr::List(_, span) | TypeExpr::Map { span, .. } => *span,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Simple(name) => write!(f, "{name}"),
            TypeExpr::List(element, _) => write!(f, "[]{element}"),
            TypeExpr::Map { key, value, .. } => write!(f, "map[{key}]{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docs_from_comments() {
        let docs = Docs::from_comments(&[
            " A file on disk".to_string(),
            " Tracks metadata".to_string(),
            "and permissions ".to_string(),
        ]);
        assert_eq!(docs.title, "A file on disk");
        assert_eq!(docs.description, "Tracks metadata and permissions");
    }

    #[test]
    fn test_docs_from_no_comments() {
        assert_eq!(Docs::from_comments(&[]), Docs::default());
    }

    #[test]
    fn test_type_expr_display() {
        let span = Span::default();
        let ty = TypeExpr::Map {
            key: Spanned::new("string".to_string(), span),
            value: Box::new(TypeExpr::List(
                Box::new(TypeExpr::simple("os.file", span)),
                span,
            )),
            span,
        };
        assert_eq!(ty.to_string(), "map[string][]os.file");
    }
}
