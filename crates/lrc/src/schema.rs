//! Portable schema of an LR unit.
//!
//! The schema lists every resource with its docs, initializer signature and
//! fields, using canonical type labels. It is what query tooling loads to
//! know which fields exist without linking the generated code.
//!
//! Extraction also validates initializers:
//!
//! - an argument that shares a field's name must match the field's type,
//!   or omit the type to inherit it (`E300`);
//! - required arguments cannot follow optional ones (`E301`);
//! - an argument without a matching field must be typed (`E302`);
//! - a resource has at most one initializer (`E303`);
//! - a resource id is declared at most once (`E304`).
//!
//! A failing resource is left out and extraction moves on, so every
//! problem in the unit is reported together.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use lrc_core::Type;
use lrc_parser::{
    ResolvedUnit, Span,
    ast::{Docs, FieldKind, Init, Resource, TypeExpr},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
};

/// Schema of one unit, keyed and sorted by resource id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub resources: BTreeMap<String, ResourceInfo>,
}

impl Schema {
    pub fn resource(&self, id: &str) -> Option<&ResourceInfo> {
        self.resources.get(id)
    }

    /// Serialize to JSON, indented when `pretty` is set.
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(default)]
    pub private: bool,
    /// Element type of a collection resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_type: Option<Type>,
    /// Space separated fields shown by default, from `@defaults("...")`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<InitInfo>,
    #[serde(default)]
    pub fields: IndexMap<String, FieldInfo>,
    /// Set on parents synthesized for dotted ids that were never declared.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_implicit: bool,
}

impl ResourceInfo {
    fn implicit(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            title: String::new(),
            desc: String::new(),
            private: false,
            list_type: None,
            defaults: None,
            init: None,
            fields: IndexMap::new(),
            is_implicit: true,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitInfo {
    pub args: Vec<ArgInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    /// Static fields must be supplied at construction.
    #[serde(default)]
    pub is_mandatory: bool,
    /// Fields this one is computed from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refs: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_embedded: bool,
    /// Link from a parent resource to a dotted child resource.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_implicit_resource: bool,
}

impl FieldInfo {
    fn implicit_resource(name: &str, child: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: Type::resource(child),
            is_mandatory: false,
            refs: Vec::new(),
            title: String::new(),
            desc: String::new(),
            is_embedded: false,
            is_implicit_resource: true,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !value
}

/// Extract the schema of a resolved unit.
///
/// # Errors
///
/// Returns every schema diagnostic of the unit if any resource is invalid.
pub fn extract(resolved: &ResolvedUnit) -> Result<Schema, ParseError> {
    let (schema, diagnostics) = extract_partial(resolved);
    if diagnostics.is_empty() {
        Ok(schema)
    } else {
        Err(ParseError::new(diagnostics))
    }
}

/// Extract the schema of a resolved unit, skipping invalid resources.
///
/// Returns the schema of every valid resource together with the
/// diagnostics of the invalid ones.
pub fn extract_partial(resolved: &ResolvedUnit) -> (Schema, Vec<Diagnostic>) {
    let mut extractor = Extractor::new(resolved);
    for resource in &resolved.unit().resources {
        extractor.resource(resource);
    }
    extractor.finish()
}

struct Extractor<'a> {
    resolved: &'a ResolvedUnit,
    diagnostics: DiagnosticCollector,
    declared: IndexMap<String, Span>,
    resources: BTreeMap<String, ResourceInfo>,
}

impl<'a> Extractor<'a> {
    fn new(resolved: &'a ResolvedUnit) -> Self {
        Self {
            resolved,
            diagnostics: DiagnosticCollector::new(),
            declared: IndexMap::new(),
            resources: BTreeMap::new(),
        }
    }

    fn resource(&mut self, resource: &Resource) {
        let id = resource.id.inner();
        if let Some(first) = self.declared.get(id) {
            self.diagnostics.emit(
                Diagnostic::error(format!("resource `{id}` is declared more than once"))
                    .with_code(ErrorCode::E304)
                    .with_label(resource.id.span(), "declared again here")
                    .with_secondary_label(*first, "first declared here"),
            );
            return;
        }
        self.declared.insert(id.clone(), resource.id.span());

        let mut failed = false;

        let inits: Vec<&Init> = resource
            .fields
            .iter()
            .filter_map(|field| match &field.kind {
                FieldKind::Init(init) => Some(init),
                _ => None,
            })
            .collect();
        if let [first, second, ..] = inits.as_slice() {
            self.diagnostics.emit(
                Diagnostic::error(format!("resource `{id}` has more than one initializer"))
                    .with_code(ErrorCode::E303)
                    .with_label(second.span, "second initializer")
                    .with_secondary_label(first.span, "first initializer")
                    .with_help("merge the arguments into a single `init`"),
            );
            failed = true;
        }

        let init = match inits.first() {
            Some(init) => match self.init(resource, init) {
                Some(info) => Some(info),
                None => {
                    failed = true;
                    None
                }
            },
            None => None,
        };

        if failed {
            debug!(resource = id.as_str(); "Skipping invalid resource");
            return;
        }

        let mut fields = IndexMap::new();
        for field in &resource.fields {
            let FieldKind::Basic(basic) = &field.kind else {
                continue;
            };
            let name = basic.name.inner();
            fields.entry(name.clone()).or_insert_with(|| FieldInfo {
                name: name.clone(),
                ty: self.resolved.lower(&basic.ty),
                is_mandatory: basic.is_static(),
                refs: basic
                    .dependencies()
                    .iter()
                    .map(|dep| dep.inner().clone())
                    .collect(),
                title: field.docs.title.clone(),
                desc: field.docs.description.clone(),
                is_embedded: basic.is_embedded,
                is_implicit_resource: false,
            });
        }

        let Docs { title, description } = resource.docs.clone();
        let info = ResourceInfo {
            id: id.clone(),
            name: id.clone(),
            title,
            desc: description,
            private: resource.is_private,
            list_type: resource
                .list_type
                .as_ref()
                .map(|list| self.resolved.lower(&TypeExpr::Simple(list.element.clone()))),
            defaults: resource
                .defaults
                .as_ref()
                .map(|defaults| defaults.inner().clone()),
            init,
            fields,
            is_implicit: false,
        };
        debug!(resource = id.as_str(), fields = info.fields.len(); "Extracted resource");
        self.resources.insert(id.clone(), info);
    }

    /// Check an initializer against the resource's fields.
    ///
    /// Returns `None` after emitting diagnostics if any argument is invalid.
    fn init(&mut self, resource: &Resource, init: &Init) -> Option<InitInfo> {
        let id = resource.id.inner();
        let mut args = Vec::with_capacity(init.args.len());
        let mut valid = true;
        let mut optional_seen = None;

        for arg in &init.args {
            let name = arg.name.inner();
            let field = resource.basic_field(name);

            let ty = match (&arg.ty, field) {
                (Some(ty), Some(field)) => {
                    let declared = self.resolved.lower(ty);
                    let expected = self.resolved.lower(&field.ty);
                    if declared != expected {
                        self.diagnostics.emit(
                            Diagnostic::error(format!(
                                "init argument `{name}` of `{id}` does not match its field type"
                            ))
                            .with_code(ErrorCode::E300)
                            .with_label(ty.span(), format!("declared as {declared}"))
                            .with_secondary_label(
                                field.ty.span(),
                                format!("field `{name}` is {expected}"),
                            )
                            .with_help("drop the type from the init argument to reuse the field type"),
                        );
                        valid = false;
                    }
                    declared
                }
                (None, Some(field)) => self.resolved.lower(&field.ty),
                (Some(ty), None) => self.resolved.lower(ty),
                (None, None) => {
                    self.diagnostics.emit(
                        Diagnostic::error(format!(
                            "init argument `{name}` of `{id}` has no type and no matching field"
                        ))
                        .with_code(ErrorCode::E302)
                        .with_label(arg.name.span(), "untyped argument")
                        .with_help(format!("declare a field `{name}` or give the argument a type")),
                    );
                    valid = false;
                    continue;
                }
            };

            if arg.optional {
                optional_seen.get_or_insert(arg.name.span());
            } else if let Some(optional) = optional_seen {
                self.diagnostics.emit(
                    Diagnostic::error("required argument cannot follow an optional argument")
                        .with_code(ErrorCode::E301)
                        .with_label(arg.name.span(), format!("`{name}` is required"))
                        .with_secondary_label(optional, "first optional argument"),
                );
                valid = false;
            }

            args.push(ArgInfo {
                name: name.clone(),
                ty,
                optional: arg.optional,
            });
        }

        valid.then_some(InitInfo { args })
    }

    fn finish(mut self) -> (Schema, Vec<Diagnostic>) {
        add_implicit_parents(&mut self.resources);
        info!(
            resources = self.resources.len(),
            errors = self.diagnostics.has_errors();
            "Schema extracted"
        );
        let schema = Schema {
            resources: self.resources,
        };
        (schema, self.diagnostics.into_diagnostics())
    }
}

/// Give every dotted id a parent entry that links to it.
///
/// `a.b.c` adds a field `c` to `a.b` and a field `b` to `a`, creating
/// implicit entries for the parents that were never declared. Existing
/// fields of the same name are kept.
fn add_implicit_parents(resources: &mut BTreeMap<String, ResourceInfo>) {
    let ids: Vec<String> = resources.keys().cloned().collect();
    for id in ids {
        let mut child = id;
        while let Some((parent, segment)) = child
            .rsplit_once('.')
            .map(|(parent, segment)| (parent.to_string(), segment.to_string()))
        {
            let entry = resources
                .entry(parent.clone())
                .or_insert_with(|| ResourceInfo::implicit(&parent));
            entry
                .fields
                .entry(segment.clone())
                .or_insert_with(|| FieldInfo::implicit_resource(&segment, &child));
            child = parent;
        }
    }
}
