//! Cleanup pass for the LR syntax tree
//!
//! This module implements a fold-based rewriting system for AST transformations.
//! It sits between the parser and import resolution, turning shorthand into
//! the plain form every later phase expects:
//!
//! - leading comments are split into a title and a description;
//! - a collection marker `[]elem(deps)` gains an explicit `list` field;
//! - `embed pkg.type [as name]` becomes a basic field flagged as embedded.
//!
//! After this pass a resource body holds only initializers and basic fields.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    parser_types::{
        BasicField, Docs, Embed, Field, FieldKind, ListType, Resource, TypeExpr, Unit,
    },
    span::Spanned,
};

/// Name of the field synthesized for collection resources.
pub const LIST_FIELD: &str = "list";

/// The main trait for folding/rewriting AST nodes.
///
/// Each method takes ownership of its input and returns a transformed version.
/// The default implementations preserve the structure unchanged (identity transformation).
trait Folder {
    fn fold_unit(&mut self, unit: Unit) -> Unit {
        Unit {
            imports: unit.imports,
            options: unit.options,
            aliases: unit.aliases,
            resources: self.fold_resources(unit.resources),
        }
    }

    fn fold_resources(&mut self, resources: Vec<Resource>) -> Vec<Resource> {
        resources
            .into_iter()
            .map(|resource| self.fold_resource(resource))
            .collect()
    }

    fn fold_resource(&mut self, resource: Resource) -> Resource {
        Resource {
            docs: self.fold_docs(&resource.comments, resource.docs),
            fields: self.fold_fields(resource.fields),
            ..resource
        }
    }

    fn fold_docs(&mut self, _comments: &[String], docs: Docs) -> Docs {
        docs
    }

    fn fold_fields(&mut self, fields: Vec<Field>) -> Vec<Field> {
        fields
            .into_iter()
            .map(|field| self.fold_field(field))
            .collect()
    }

    fn fold_field(&mut self, field: Field) -> Field {
        Field {
            docs: self.fold_docs(&field.comments, field.docs),
            kind: self.fold_field_kind(field.kind),
            comments: field.comments,
        }
    }

    fn fold_field_kind(&mut self, kind: FieldKind) -> FieldKind {
        kind
    }
}

/// Rewrites shorthand into plain initializers and basic fields.
pub struct Cleanup;

impl Cleanup {
    /// The `list` field of a collection resource.
    fn list_field(list_type: &ListType) -> Field {
        let element = &list_type.element;
        Field {
            comments: Vec::new(),
            docs: Docs::default(),
            kind: FieldKind::Basic(BasicField {
                name: Spanned::new(LIST_FIELD.to_string(), element.span()),
                args: Some(list_type.args.clone().unwrap_or_default()),
                ty: TypeExpr::List(Box::new(TypeExpr::Simple(element.clone())), element.span()),
                is_embedded: false,
            }),
        }
    }

    /// Name of the field an embed turns into: its alias, or the first
    /// segment of the embedded type.
    fn embed_name(embed: &Embed) -> Spanned<String> {
        match &embed.alias {
            Some(alias) => alias.clone(),
            None => embed.ty.map(|ty| {
                ty.split('.')
                    .next()
                    .unwrap_or(ty.as_str())
                    .to_string()
            }),
        }
    }

    /// Unaliased embeds of the same package produce the same field name.
    /// Both fields are kept; the collision is only reported.
    fn report_embed_collisions(resource: &Resource) {
        let mut seen: HashMap<&str, String> = HashMap::new();
        for field in resource.basic_fields().filter(|field| field.is_embedded) {
            let ty = field.ty.to_string();
            if let Some(previous) = seen.insert(field.name.inner(), ty.clone()) {
                warn!(
                    resource = resource.id.inner().as_str(),
                    field = field.name.inner().as_str(),
                    first:% = previous,
                    second:% = ty;
                    "Embedded fields share a name, add `as <name>` to tell them apart"
                );
            }
        }
    }
}

impl Folder for Cleanup {
    fn fold_resource(&mut self, resource: Resource) -> Resource {
        let mut fields = self.fold_fields(resource.fields);

        if let Some(list_type) = &resource.list_type {
            if fields.iter().any(|field| {
                matches!(&field.kind, FieldKind::Basic(basic) if basic.name.inner() == LIST_FIELD)
            }) {
                warn!(
                    resource = resource.id.inner().as_str();
                    "Collection resource declares its own `list` field, keeping it"
                );
            } else {
                debug!(
                    resource = resource.id.inner().as_str(),
                    element = list_type.element.inner().as_str();
                    "Adding list field"
                );
                fields.push(Self::list_field(list_type));
            }
        }

        let resource = Resource {
            docs: self.fold_docs(&resource.comments, resource.docs),
            fields,
            ..resource
        };
        Self::report_embed_collisions(&resource);
        resource
    }

    fn fold_docs(&mut self, comments: &[String], _docs: Docs) -> Docs {
        Docs::from_comments(comments)
    }

    fn fold_field_kind(&mut self, kind: FieldKind) -> FieldKind {
        match kind {
            FieldKind::Embed(embed) => FieldKind::Basic(BasicField {
                name: Self::embed_name(&embed),
                args: Some(Vec::new()),
                ty: TypeExpr::Simple(embed.ty),
                is_embedded: true,
            }),
            other => other,
        }
    }
}

/// Main entry point for the cleanup pass.
pub fn desugar(unit: Unit) -> Unit {
    Cleanup.fold_unit(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser_types::Init, span::Span};

    // Test-only IdentityFolder for verifying identity transformations
    struct IdentityFolder;

    impl Folder for IdentityFolder {}

    fn spanned(value: &str) -> Spanned<String> {
        Spanned::new(value.to_string(), Span::new(0..1))
    }

    fn field(kind: FieldKind) -> Field {
        Field {
            comments: Vec::new(),
            docs: Docs::default(),
            kind,
        }
    }

    fn embed(ty: &str, alias: Option<&str>) -> Field {
        field(FieldKind::Embed(Embed {
            ty: spanned(ty),
            alias: alias.map(spanned),
        }))
    }

    fn resource(id: &str, fields: Vec<Field>) -> Resource {
        Resource {
            comments: vec![" Title".to_string(), " more".to_string(), " text".to_string()],
            docs: Docs::default(),
            is_private: false,
            id: spanned(id),
            defaults: None,
            list_type: None,
            fields,
            span: Span::new(0..1),
        }
    }

    fn unit(resources: Vec<Resource>) -> Unit {
        Unit {
            resources,
            ..Unit::default()
        }
    }

    #[test]
    fn test_identity_folder_preserves_unit() {
        let original = unit(vec![resource("os.file", vec![embed("os.user", None)])]);
        let folded = IdentityFolder.fold_unit(original.clone());
        assert_eq!(folded, original);
    }

    #[test]
    fn test_docs_are_split() {
        let unit = desugar(unit(vec![resource("os.file", Vec::new())]));
        let docs = &unit.resources[0].docs;
        assert_eq!(docs.title, "Title");
        assert_eq!(docs.description, "more text");
    }

    #[test]
    fn test_list_field_is_appended() {
        let mut files = resource("os.files", vec![field(FieldKind::Init(Init {
            args: Vec::new(),
            span: Span::new(0..1),
        }))]);
        files.list_type = Some(ListType {
            element: spanned("os.file"),
            args: None,
        });

        let unit = desugar(unit(vec![files]));
        let files = &unit.resources[0];
        let list = files.fields.last().unwrap();
        let FieldKind::Basic(list) = &list.kind else {
            panic!("expected the list field last");
        };
        assert_eq!(list.name.inner(), LIST_FIELD);
        assert_eq!(list.ty.to_string(), "[]os.file");
        assert_eq!(list.args, Some(Vec::new()));
        assert!(!list.is_embedded);
    }

    #[test]
    fn test_list_field_keeps_dependencies() {
        let mut files = resource("os.files", Vec::new());
        files.list_type = Some(ListType {
            element: spanned("os.file"),
            args: Some(vec![spanned("path"), spanned("recursive")]),
        });

        let unit = desugar(unit(vec![files]));
        let list = unit.resources[0].basic_field(LIST_FIELD).unwrap();
        let deps: Vec<&str> = list.dependencies().iter().map(|d| d.inner().as_str()).collect();
        assert_eq!(deps, ["path", "recursive"]);
    }

    #[test]
    fn test_embed_becomes_basic_field() {
        let unit = desugar(unit(vec![resource(
            "demo",
            vec![embed("pkg.thing", None), embed("os.user", Some("owner"))],
        )]));
        let demo = &unit.resources[0];

        assert!(demo.fields.iter().all(|f| !matches!(f.kind, FieldKind::Embed(_))));

        let pkg = demo.basic_field("pkg").unwrap();
        assert!(pkg.is_embedded);
        assert_eq!(pkg.args, Some(Vec::new()));
        assert_eq!(pkg.ty.to_string(), "pkg.thing");

        let owner = demo.basic_field("owner").unwrap();
        assert!(owner.is_embedded);
        assert_eq!(owner.ty.to_string(), "os.user");
    }

    #[test]
    fn test_colliding_embeds_are_both_kept() {
        let unit = desugar(unit(vec![resource(
            "demo",
            vec![embed("os.user", None), embed("os.group", None)],
        )]));
        let names: Vec<&str> = unit.resources[0]
            .basic_fields()
            .map(|f| f.name.inner().as_str())
            .collect();
        assert_eq!(names, ["os", "os"]);
    }
}
