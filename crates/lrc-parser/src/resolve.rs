//! Import and alias resolution.
//!
//! Every `import "<path>"` of a unit is loaded through a [`SourceLoader`],
//! parsed and turned into a [`Package`] named after the file stem. Imports
//! are followed one level deep: the imported file's own imports are never
//! read. Each `alias` must then name a resource of an imported package.
//!
//! Resolution is all-or-nothing: every problem is reported, and any error
//! rejects the whole unit.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use indexmap::{IndexMap, IndexSet};
use log::{debug, info};

use lrc_core::Type;

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser_types::{Alias, TypeExpr, Unit},
    span::{Span, Spanned},
};

/// Option every imported file must set to the Rust module path of its
/// generated code.
pub const MODULE_OPTION: &str = "rust_module";

/// Reads imported LR files.
pub trait SourceLoader {
    /// Read the source at `path`, as written in the `import` statement.
    fn load(&self, path: &str) -> io::Result<String>;
}

/// Loads imports from disk, relative to the importing file's directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    base: PathBuf,
}

impl FsLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Loader for the imports of the file at `path`.
    pub fn for_file(path: &Path) -> Self {
        Self::new(path.parent().unwrap_or_else(|| Path::new(".")))
    }
}

impl SourceLoader for FsLoader {
    fn load(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(self.base.join(path))
    }
}

impl<F> SourceLoader for F
where
    F: Fn(&str) -> io::Result<String>,
{
    fn load(&self, path: &str) -> io::Result<String> {
        self(path)
    }
}

/// Package name of an import path: its file stem.
///
/// `../core/core.lr` is the package `core`.
pub fn package_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// An imported LR file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    module_path: String,
    resources: IndexSet<String>,
}

impl Package {
    pub fn new(
        name: impl Into<String>,
        module_path: impl Into<String>,
        resources: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            name: name.into(),
            module_path: module_path.into(),
            resources: resources.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust module of the package's generated code.
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    pub fn resources(&self) -> &IndexSet<String> {
        &self.resources
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.resources.contains(resource)
    }
}

/// Where an alias points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    pub package: String,
    pub resource: String,
}

impl fmt::Display for AliasTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.resource)
    }
}

/// What a type name in a field or argument refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Primitive(Type),
    /// A resource declared in the unit itself.
    Local(String),
    /// A resource of an imported package, directly or through an alias.
    Imported { package: String, resource: String },
    /// The name starts with an imported package that lacks the resource.
    NotInPackage { package: String, resource: String },
    Unknown,
}

/// A unit together with its imported packages and resolved aliases.
#[derive(Debug, Clone)]
pub struct ResolvedUnit {
    unit: Unit,
    packages: IndexMap<String, Package>,
    aliases: IndexMap<String, AliasTarget>,
}

impl ResolvedUnit {
    /// A unit without imports or aliases.
    pub fn standalone(unit: Unit) -> Self {
        Self {
            unit,
            packages: IndexMap::new(),
            aliases: IndexMap::new(),
        }
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn into_unit(self) -> Unit {
        self.unit
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    pub fn alias(&self, name: &str) -> Option<&AliasTarget> {
        self.aliases.get(name)
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &AliasTarget)> {
        self.aliases
            .iter()
            .map(|(name, target)| (name.as_str(), target))
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.unit.resource(name).is_some()
    }

    /// Look up a type name.
    ///
    /// Primitives win, then aliases, then `<package>.<resource>` names, then
    /// resources of the unit itself.
    pub fn lookup(&self, name: &str) -> TypeRef {
        if let Some(primitive) = Type::primitive(name) {
            return TypeRef::Primitive(primitive);
        }
        if let Some(target) = self.aliases.get(name) {
            return TypeRef::Imported {
                package: target.package.clone(),
                resource: target.resource.clone(),
            };
        }
        let qualified = name
            .split_once('.')
            .and_then(|(package, resource)| Some((self.packages.get(package)?, resource)));
        if let Some((found, resource)) = qualified {
            let package = found.name.clone();
            let resource = resource.to_string();
            return if found.contains(&resource) {
                TypeRef::Imported { package, resource }
            } else {
                TypeRef::NotInPackage { package, resource }
            };
        }
        if self.is_local(name) {
            return TypeRef::Local(name.to_string());
        }
        TypeRef::Unknown
    }

    /// Lower a written type to its canonical form.
    ///
    /// References through aliases and packages become the target resource's
    /// own name. Unknown names are kept as written.
    pub fn lower(&self, ty: &TypeExpr) -> Type {
        match ty {
            TypeExpr::Simple(name) => self.lower_name(name.inner()),
            TypeExpr::List(element, _) => Type::array(self.lower(element)),
            TypeExpr::Map { key, value, .. } => {
                Type::map(self.lower_name(key.inner()), self.lower(value))
            }
        }
    }

    fn lower_name(&self, name: &str) -> Type {
        match self.lookup(name) {
            TypeRef::Primitive(primitive) => primitive,
            TypeRef::Imported { resource, .. } | TypeRef::NotInPackage { resource, .. } => {
                Type::resource(resource)
            }
            TypeRef::Local(_) | TypeRef::Unknown => Type::resource(name),
        }
    }
}

struct Resolver<'a> {
    loader: &'a dyn SourceLoader,
    diagnostics: DiagnosticCollector,
    packages: IndexMap<String, Package>,
}

impl<'a> Resolver<'a> {
    fn new(loader: &'a dyn SourceLoader) -> Self {
        Self {
            loader,
            diagnostics: DiagnosticCollector::new(),
            packages: IndexMap::new(),
        }
    }

    fn import(&mut self, path: &Spanned<String>) {
        let name = package_name(path.inner());
        if self.packages.contains_key(&name) {
            self.diagnostics.emit(
                Diagnostic::warning(format!("package `{name}` is imported more than once"))
                    .with_label(path.span(), "ignored"),
            );
            return;
        }

        let source = match self.loader.load(path.inner()) {
            Ok(source) => source,
            Err(err) => {
                self.diagnostics.emit(
                    Diagnostic::error(format!("cannot read import `{path}`: {err}"))
                        .with_code(ErrorCode::E200)
                        .with_label(path.span(), "imported here"),
                );
                return;
            }
        };

        let imported = match crate::parse(&source) {
            Ok(unit) => unit,
            Err(err) => {
                let mut diag = Diagnostic::error(format!("import `{path}` does not parse"))
                    .with_code(ErrorCode::E201)
                    .with_label(path.span(), "imported here");
                if let Some(first) = err.diagnostics().first() {
                    diag = diag.with_help(format!("in `{path}`: {first}"));
                }
                self.diagnostics.emit(diag);
                return;
            }
        };

        let Some(module_path) = imported.option(MODULE_OPTION) else {
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "import `{path}` does not declare `option {MODULE_OPTION}`"
                ))
                .with_code(ErrorCode::E202)
                .with_label(path.span(), "imported here")
                .with_help(format!(
                    "add `option {MODULE_OPTION} = \"<module path>\"` to `{path}`"
                )),
            );
            return;
        };

        let package = Package::new(
            name.clone(),
            module_path,
            imported.resources.iter().map(|r| r.id.inner().clone()),
        );
        debug!(
            package = name.as_str(),
            module = package.module_path(),
            resources = package.resources().len();
            "Imported package"
        );
        self.packages.insert(name, package);
    }

    fn alias(&mut self, alias: &Alias) -> Option<AliasTarget> {
        let target = alias.target.inner();
        let Some((package, resource)) = target.split_once('.') else {
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "alias `{}` must name a resource of an imported package",
                    alias.name
                ))
                .with_code(ErrorCode::E205)
                .with_label(alias.target.span(), "expected `<package>.<resource>`"),
            );
            return None;
        };

        let Some(found) = self.packages.get(package) else {
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "alias `{}` refers to package `{package}`, which is not imported",
                    alias.name
                ))
                .with_code(ErrorCode::E203)
                .with_label(alias_package_span(&alias.target, package), "unknown package")
                .with_help(format!("add `import \"{package}.lr\"`")),
            );
            return None;
        };

        if !found.contains(resource) {
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "alias `{}` refers to `{target}`, which package `{package}` does not declare",
                    alias.name
                ))
                .with_code(ErrorCode::E204)
                .with_label(alias.target.span(), format!("not found in package `{package}`")),
            );
            return None;
        }

        Some(AliasTarget {
            package: package.to_string(),
            resource: resource.to_string(),
        })
    }
}

/// Span of the package segment of an alias target.
fn alias_package_span(target: &Spanned<String>, package: &str) -> Span {
    let start = target.span().start();
    Span::new(start..start + package.len())
}

/// Resolve the imports and aliases of `unit`.
pub fn resolve(unit: Unit, loader: &dyn SourceLoader) -> Result<ResolvedUnit, ParseError> {
    info!(imports = unit.imports.len(), aliases = unit.aliases.len(); "Resolving imports");
    let mut resolver = Resolver::new(loader);

    for path in &unit.imports {
        resolver.import(path);
    }

    let mut aliases = IndexMap::new();
    for alias in &unit.aliases {
        if let Some(target) = resolver.alias(alias) {
            debug!(alias = alias.name.inner().as_str(), target:% = target; "Resolved alias");
            aliases.insert(alias.name.inner().clone(), target);
        }
    }

    let Resolver {
        diagnostics,
        packages,
        ..
    } = resolver;
    diagnostics.finish()?;

    Ok(ResolvedUnit {
        unit,
        packages,
        aliases,
    })
}
