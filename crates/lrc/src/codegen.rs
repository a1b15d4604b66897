//! Rust code generation for resolved LR units.
//!
//! Every resource becomes a trait with one typed accessor per field, a
//! backing struct holding an [`lrc_core::Resource`], a validating factory
//! and the [`lrc_core::LrResource`] dispatchers. Computed fields call a
//! hand-written `get_<field>` method on the backing struct, and every
//! resource needs a hand-written `id()` unless it is constructed with an
//! explicit `__id` argument.
//!
//! Generation first checks every type name of the unit and fails with all
//! problems at once:
//!
//! - `E400`: a package-qualified name the package does not declare;
//! - `E401`: a name that is no primitive, alias, local or imported resource;
//! - `E402`: a dependency that is not a field of the resource;
//! - `E403`: a used package whose module path is blank.
//!
//! ```
//! # use lrc::{codegen, overrides::OverrideSet};
//! # use lrc_parser::ResolvedUnit;
//! let unit = lrc_parser::parse("os.file {\n  path string\n  size() int\n}\n").unwrap();
//! let code = codegen::generate(&ResolvedUnit::standalone(unit), &OverrideSet::new()).unwrap();
//! assert!(code.contains("pub trait OsFile: LrResource {"));
//! assert!(code.contains("pub fn compute_size(&self) -> Result<(), FieldError> {"));
//! ```

mod names;
mod resource;
mod writer;

use indexmap::IndexSet;
use log::{debug, info, warn};

use lrc_core::Type;
use lrc_parser::{
    ResolvedUnit, Span, Spanned,
    ast::{Docs, FieldKind, Resource, TypeExpr},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    resolve::{MODULE_OPTION, TypeRef},
};

use crate::overrides::OverrideSet;

pub use names::{factory_name, field_ident, struct_name, trait_name};

use writer::CodeWriter;

/// First line of every generated file.
pub const HEADER: &str = "// Code generated by lrc. DO NOT EDIT.";

/// Generate the Rust module of `resolved`.
///
/// Resources marked in `overrides` get factories that run their
/// [`InitHook`](lrc_core::InitHook) first.
///
/// # Errors
///
/// Returns every `E4xx` diagnostic of the unit.
pub fn generate(resolved: &ResolvedUnit, overrides: &OverrideSet) -> Result<String, ParseError> {
    let mut planner = Planner::new(resolved, overrides);
    let mut plans = Vec::new();
    let mut seen = IndexSet::new();
    for resource in &resolved.unit().resources {
        if seen.insert(resource.id.inner().as_str()) {
            plans.push(planner.resource(resource));
        }
    }

    let Planner {
        diagnostics,
        packages_in_use,
        ..
    } = planner;
    diagnostics.finish()?;

    let mut writer = CodeWriter::new();
    write_header(&mut writer, resolved, &packages_in_use);
    write_init(&mut writer, &plans);
    for plan in &plans {
        writer.blank();
        resource::write(&mut writer, plan);
    }

    info!(resources = plans.len(), packages = packages_in_use.len(); "Generated code");
    Ok(writer.finish())
}

/// A resource ready for emission.
struct ResourcePlan {
    id: String,
    trait_name: String,
    struct_name: String,
    factory: String,
    docs: Docs,
    has_init_hook: bool,
    fields: Vec<FieldPlan>,
}

impl ResourcePlan {
    fn field(&self, name: &str) -> Option<&FieldPlan> {
        self.fields.iter().find(|field| field.name == name)
    }

    fn static_fields(&self) -> impl Iterator<Item = &FieldPlan> {
        self.fields.iter().filter(|field| field.is_static)
    }

    fn computed_fields(&self) -> impl Iterator<Item = &FieldPlan> {
        self.fields.iter().filter(|field| !field.is_static)
    }
}

struct FieldPlan {
    /// Name as written in LR, used for cache keys and dispatch.
    name: String,
    /// Accessor identifier.
    ident: String,
    /// Suffix of `compute_` and `get_`.
    snake: String,
    docs: Docs,
    ty: Type,
    rust_type: RustType,
    deps: Vec<String>,
    is_static: bool,
}

impl FieldPlan {
    fn compute_fn(&self) -> String {
        format!("compute_{}", self.snake)
    }

    fn getter(&self) -> String {
        format!("get_{}", self.snake)
    }
}

/// Rust type an accessor returns.
enum RustType {
    /// A type with `From<T> for Value` and `FromValue`.
    Value(&'static str),
    /// A generated struct, local or behind a package alias.
    Resource(String),
    /// An embedded resource handle.
    Embedded,
}

impl RustType {
    fn signature(&self) -> String {
        match self {
            RustType::Value(ty) => ty.to_string(),
            RustType::Resource(path) => format!("Arc<{path}>"),
            RustType::Embedded => "ResourceRef".to_string(),
        }
    }

    /// Expression converting the accessor type into a [`lrc_core::Value`].
    fn to_value(&self) -> &'static str {
        match self {
            RustType::Value(_) => "Value::from",
            RustType::Resource(_) => "|res| Value::Resource(res)",
            RustType::Embedded => "Value::Resource",
        }
    }
}

/// Rust type of a primitive.
fn primitive_rust_type(ty: &Type) -> &'static str {
    match ty {
        Type::Bool => "bool",
        Type::Int => "i64",
        Type::Float => "f64",
        Type::String | Type::Regex => "String",
        Type::Time => "SystemTime",
        Type::Array(_) => "Vec<Value>",
        Type::Map(..) => "BTreeMap<String, Value>",
        Type::Dict | Type::Any | Type::Resource(_) => "Value",
    }
}

/// Expression building `ty` at runtime.
fn type_expr(ty: &Type) -> String {
    match ty {
        Type::Bool => "Type::Bool".to_string(),
        Type::Int => "Type::Int".to_string(),
        Type::Float => "Type::Float".to_string(),
        Type::String => "Type::String".to_string(),
        Type::Regex => "Type::Regex".to_string(),
        Type::Time => "Type::Time".to_string(),
        Type::Dict => "Type::Dict".to_string(),
        Type::Any => "Type::Any".to_string(),
        Type::Array(element) => format!("Type::array({})", type_expr(element)),
        Type::Map(key, value) => format!("Type::map({}, {})", type_expr(key), type_expr(value)),
        Type::Resource(name) => format!("Type::resource({name:?})"),
    }
}

struct Planner<'a> {
    resolved: &'a ResolvedUnit,
    overrides: &'a OverrideSet,
    diagnostics: DiagnosticCollector,
    packages_in_use: IndexSet<String>,
}

impl<'a> Planner<'a> {
    fn new(resolved: &'a ResolvedUnit, overrides: &'a OverrideSet) -> Self {
        Self {
            resolved,
            overrides,
            diagnostics: DiagnosticCollector::new(),
            packages_in_use: IndexSet::new(),
        }
    }

    fn resource(&mut self, resource: &Resource) -> ResourcePlan {
        let id = resource.id.inner().clone();
        let mut fields = Vec::new();
        for field in &resource.fields {
            let FieldKind::Basic(basic) = &field.kind else {
                continue;
            };
            let name = basic.name.inner();
            self.check_type(&basic.ty);
            let rust_type = if basic.is_embedded {
                RustType::Embedded
            } else {
                self.rust_type(&basic.ty)
            };

            for dep in basic.dependencies() {
                if resource.basic_field(dep.inner()).is_none() {
                    self.diagnostics.emit(
                        Diagnostic::error(format!(
                            "field `{name}` of `{id}` depends on `{dep}`, which is not a field of `{id}`"
                        ))
                        .with_code(ErrorCode::E402)
                        .with_label(dep.span(), "unknown field")
                        .with_secondary_label(basic.name.span(), "declared here"),
                    );
                }
            }

            fields.push(FieldPlan {
                name: name.clone(),
                ident: field_ident(name),
                snake: names::snake_case(name),
                docs: field.docs.clone(),
                ty: self.resolved.lower(&basic.ty),
                rust_type,
                deps: basic
                    .dependencies()
                    .iter()
                    .map(|dep| dep.inner().clone())
                    .collect(),
                is_static: basic.is_static(),
            });
        }

        let has_init_hook = self.overrides.has_init(&id);
        if !has_init_hook {
            if let Some(init) = resource.init() {
                for arg in &init.args {
                    if resource.basic_field(arg.name.inner()).is_none() {
                        warn!(
                            resource = id.as_str(),
                            argument = arg.name.inner().as_str();
                            "Init argument without a field is only accepted through an init hook"
                        );
                    }
                }
            }
        }

        debug!(resource = id.as_str(), fields = fields.len(), init_hook = has_init_hook; "Planned resource");
        ResourcePlan {
            trait_name: trait_name(&id),
            struct_name: struct_name(&id),
            factory: factory_name(&id),
            docs: resource.docs.clone(),
            has_init_hook,
            fields,
            id,
        }
    }

    /// Report every name in `ty` that does not resolve.
    fn check_type(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Simple(name) => self.check_name(name),
            TypeExpr::List(element, _) => self.check_type(element),
            TypeExpr::Map { key, value, .. } => {
                if Type::primitive(key.inner()).is_none() {
                    self.diagnostics.emit(
                        Diagnostic::error(format!("map key type `{key}` is not a primitive"))
                            .with_code(ErrorCode::E401)
                            .with_label(key.span(), "expected a primitive type"),
                    );
                }
                self.check_type(value);
            }
        }
    }

    fn check_name(&mut self, name: &Spanned<String>) {
        match self.resolved.lookup(name.inner()) {
            TypeRef::Primitive(_) | TypeRef::Local(_) | TypeRef::Imported { .. } => {}
            TypeRef::NotInPackage { package, resource } => {
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "cannot find resource `{resource}` in imported package `{package}`"
                    ))
                    .with_code(ErrorCode::E400)
                    .with_label(name.span(), format!("not declared in `{package}`")),
                );
            }
            TypeRef::Unknown => {
                self.diagnostics.emit(
                    Diagnostic::error(format!("unknown type `{name}`"))
                        .with_code(ErrorCode::E401)
                        .with_label(name.span(), "not a primitive, alias or resource")
                        .with_help("declare the resource here or import the package that does"),
                );
            }
        }
    }

    fn rust_type(&mut self, ty: &TypeExpr) -> RustType {
        let TypeExpr::Simple(name) = ty else {
            return RustType::Value(primitive_rust_type(&self.resolved.lower(ty)));
        };
        match self.resolved.lookup(name.inner()) {
            TypeRef::Primitive(primitive) => RustType::Value(primitive_rust_type(&primitive)),
            TypeRef::Local(id) => RustType::Resource(struct_name(&id)),
            TypeRef::Imported { package, resource } => {
                self.use_package(&package, name.span());
                RustType::Resource(format!(
                    "{}::{}",
                    names::module_ident(&package),
                    struct_name(&resource)
                ))
            }
            TypeRef::NotInPackage { .. } | TypeRef::Unknown => RustType::Value("Value"),
        }
    }

    fn use_package(&mut self, package: &str, span: Span) {
        if self.packages_in_use.contains(package) {
            return;
        }
        let has_path = self
            .resolved
            .package(package)
            .is_some_and(|found| !found.module_path().trim().is_empty());
        if !has_path {
            self.diagnostics.emit(
                Diagnostic::error(format!("package `{package}` has no generated module path"))
                    .with_code(ErrorCode::E403)
                    .with_label(span, "used here")
                    .with_help(format!(
                        "set `option {MODULE_OPTION}` in the file that declares `{package}`"
                    )),
            );
            return;
        }
        self.packages_in_use.insert(package.to_string());
    }
}

fn write_header(writer: &mut CodeWriter, resolved: &ResolvedUnit, packages: &IndexSet<String>) {
    writer.line(HEADER);
    writer.blank();
    writer.line("#[allow(unused_imports)]");
    writer.line("use std::{any::Any, collections::BTreeMap, sync::Arc, time::SystemTime};");
    writer.blank();
    writer.line("#[allow(unused_imports)]");
    writer.line("use log::trace;");
    writer.blank();
    writer.line("#[allow(unused_imports)]");
    writer.open("use lrc_core::{");
    writer.line("Args, CacheEntry, Claim, FieldError, FromValue, ID_ARG, InitHook, LrResource, Registry,");
    writer.line("Resource, ResourceKey, ResourceRef, Runtime, Type, Value,");
    writer.close("};");

    let used: Vec<_> = resolved
        .packages()
        .filter(|package| packages.contains(package.name()))
        .collect();
    if !used.is_empty() {
        writer.blank();
        for package in used {
            writer.line(format!(
                "use {} as {};",
                package.module_path(),
                names::module_ident(package.name())
            ));
        }
    }
}

fn write_init(writer: &mut CodeWriter, plans: &[ResourcePlan]) {
    writer.blank();
    writer.line("/// Register the factories of every resource in this module.");
    writer.open("pub fn init(registry: &mut Registry) {");
    for plan in plans {
        writer.line(format!(
            "registry.add_factory({:?}, {});",
            plan.id, plan.factory
        ));
    }
    writer.close("}");
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn generate_source(source: &str) -> Result<String, ParseError> {
        let unit = lrc_parser::parse(source).expect("Failed to parse");
        generate(&ResolvedUnit::standalone(unit), &OverrideSet::new())
    }

    fn core_loader(path: &str) -> io::Result<String> {
        assert_eq!(path, "core.lr");
        Ok("option rust_module = \"crate::core\"\nuser { name string }\ngroup\n".to_string())
    }

    fn codes(err: &ParseError) -> Vec<ErrorCode> {
        err.diagnostics().iter().filter_map(Diagnostic::code).collect()
    }

    #[test]
    fn test_header_and_init() {
        let code = generate_source("os.file { path string }\nos.dir\n").unwrap();
        assert!(code.starts_with(HEADER));
        assert!(code.contains("registry.add_factory(\"os.file\", new_os_file);"));
        assert!(code.contains("registry.add_factory(\"os.dir\", new_os_dir);"));
        assert!(!code.contains("use crate::"));
    }

    #[test]
    fn test_rust_types() {
        let code = generate_source(
            "os.file {\n  a bool\n  b int\n  c float\n  d regex\n  e time\n  f dict\n  g []string\n  h map[string]int\n  i os.dir\n}\nos.dir\n",
        )
        .unwrap();
        for signature in [
            "fn a(&self) -> Result<bool, FieldError>;",
            "fn b(&self) -> Result<i64, FieldError>;",
            "fn c(&self) -> Result<f64, FieldError>;",
            "fn d(&self) -> Result<String, FieldError>;",
            "fn e(&self) -> Result<SystemTime, FieldError>;",
            "fn f(&self) -> Result<Value, FieldError>;",
            "fn g(&self) -> Result<Vec<Value>, FieldError>;",
            "fn h(&self) -> Result<BTreeMap<String, Value>, FieldError>;",
            "fn i(&self) -> Result<Arc<MqlOsDir>, FieldError>;",
        ] {
            assert!(code.contains(signature), "missing `{signature}`");
        }
        assert!(code.contains("value.conforms_to(&Type::map(Type::String, Type::Int))"));
        assert!(code.contains("value.conforms_to(&Type::resource(\"os.dir\"))"));
    }

    #[test]
    fn test_imported_types_use_package_module() {
        let source = "import \"core.lr\"\nalias owner = core.user\nos.file {\n  owner() owner\n  embed core.group\n}\n";
        let resolved = lrc_parser::parse_and_resolve(source, &core_loader).unwrap();
        let code = generate(&resolved, &OverrideSet::new()).unwrap();
        assert!(code.contains("use crate::core as core;"));
        assert!(code.contains("fn owner(&self) -> Result<Arc<core::MqlUser>, FieldError>;"));
        assert!(code.contains("fn core(&self) -> Result<ResourceRef, FieldError>;"));
        assert!(code.contains("Type::resource(\"group\")"));
    }

    #[test]
    fn test_embedded_package_alone_is_not_imported() {
        let source = "import \"core.lr\"\nos.file {\n  embed core.group as group\n}\n";
        let resolved = lrc_parser::parse_and_resolve(source, &core_loader).unwrap();
        let code = generate(&resolved, &OverrideSet::new()).unwrap();
        assert!(!code.contains("use crate::core"));
    }

    #[test]
    fn test_init_hook() {
        let unit = lrc_parser::parse("os.user { name string }\nos.group { gid int }\n").unwrap();
        let mut overrides = OverrideSet::new();
        overrides.register("os.user");
        let code = generate(&ResolvedUnit::standalone(unit), &overrides).unwrap();
        assert_eq!(code.matches("InitHook::init(&res, args)?;").count(), 1);
    }

    #[test]
    fn test_unresolved_types_are_aggregated() {
        let source = "import \"core.lr\"\nos.file {\n  owner() core.admin\n  kind() nope\n  perms(mode) string\n  tags map[os.file]int\n}\n";
        let resolved = lrc_parser::parse_and_resolve(source, &core_loader).unwrap();
        let err = generate(&resolved, &OverrideSet::new()).unwrap_err();
        assert_eq!(
            codes(&err),
            [ErrorCode::E400, ErrorCode::E401, ErrorCode::E402, ErrorCode::E401]
        );
    }

    #[test]
    fn test_package_without_module_path() {
        let loader = |_: &str| -> io::Result<String> {
            Ok("option rust_module = \"  \"\nuser { name string }\n".to_string())
        };
        let source = "import \"core.lr\"\nos.file {\n  owner() core.user\n}\n";
        let resolved = lrc_parser::parse_and_resolve(source, &loader).unwrap();
        let err = generate(&resolved, &OverrideSet::new()).unwrap_err();
        assert_eq!(codes(&err), [ErrorCode::E403]);
    }

    #[test]
    fn test_resource_names_do_not_shadow_imports() {
        let code = generate_source("type { name string }
runtime { kind() type }
").unwrap();
        assert!(code.contains("pub trait TypeResource: LrResource {"));
        assert!(code.contains("pub trait RuntimeResource: LrResource {"));
        assert!(code.contains("fn kind(&self) -> Result<Arc<MqlType>, FieldError>;"));
        assert!(code.contains("impl TypeResource for MqlType {"));

        let imports = code
            .split("use lrc_core::{")
            .nth(1)
            .and_then(|rest| rest.split("};").next())
            .unwrap();
        for name in imports.split([',', ' ', '\n']).filter(|name| !name.is_empty()) {
            assert!(
                name == "ID_ARG" || names::SCOPED_TYPES.contains(&name),
                "`{name}` may be shadowed by a resource trait"
            );
        }
    }

    #[test]
    fn test_type_expressions() {
        assert_eq!(type_expr(&Type::array(Type::Regex)), "Type::array(Type::Regex)");
        assert_eq!(primitive_rust_type(&Type::Any), "Value");
    }
}
