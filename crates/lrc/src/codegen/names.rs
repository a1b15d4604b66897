//! Rust names for LR resources and fields.

/// Words that cannot be used as plain identifiers.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that are not allowed as raw identifiers either.
const RESERVED: &[&str] = &["crate", "self", "Self", "super"];

/// Type names in scope of every generated module, through the header
/// imports or the prelude.
pub(super) const SCOPED_TYPES: &[&str] = &[
    "Any", "Arc", "Args", "BTreeMap", "Box", "CacheEntry", "Claim", "Err", "FieldError",
    "FromValue", "InitHook", "LrResource", "None", "Ok", "Option", "Registry", "Resource",
    "ResourceKey", "ResourceRef", "Result", "Runtime", "Send", "Some", "String", "Sync",
    "SystemTime", "Type", "Value", "Vec",
];

/// Appended to trait names that would shadow a type in scope.
const TRAIT_SUFFIX: &str = "Resource";

/// Trait name of a resource: `os.file` is `OsFile`, `type` is `TypeResource`.
pub fn trait_name(id: &str) -> String {
    let name = pascal_case(id);
    if SCOPED_TYPES.contains(&name.as_str()) {
        format!("{name}{TRAIT_SUFFIX}")
    } else {
        name
    }
}

/// Backing struct of a resource: `os.file` is `MqlOsFile`.
pub fn struct_name(id: &str) -> String {
    format!("Mql{}", pascal_case(id))
}

/// Factory function of a resource: `os.file` is `new_os_file`.
pub fn factory_name(id: &str) -> String {
    format!("new_{}", snake_case(id))
}

/// Accessor of a field, escaped when it collides with a keyword.
pub fn field_ident(name: &str) -> String {
    ident(&snake_case(name))
}

/// Identifier for a package module alias.
pub fn module_ident(package: &str) -> String {
    ident(package)
}

/// `securityGroup.rules` becomes `security_group_rules`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for ch in name.chars() {
        if ch == '.' || ch == '-' {
            out.push('_');
            previous_lower = false;
        } else if ch.is_uppercase() {
            if previous_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            previous_lower = false;
        } else {
            out.push(ch);
            previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

fn ident(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}_")
    } else if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

fn pascal_case(id: &str) -> String {
    id.split(['.', '_'])
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect()
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
