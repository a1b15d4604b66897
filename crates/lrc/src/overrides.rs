//! Resources whose factories defer to a hand-written init hook.
//!
//! A provider that needs to rewrite arguments or reuse an existing
//! instance before validation implements [`InitHook`](lrc_core::InitHook)
//! for the generated struct and lists the resource here, either in the
//! `[codegen] init_hooks` configuration or through [`OverrideSet::register`].
//! The generated factory then calls the hook first, so a missing
//! implementation fails to compile in the provider crate.

use indexmap::IndexSet;
use log::{debug, warn};

use lrc_parser::ast::Unit;

use crate::config::CodegenConfig;

/// Resource ids marked for init hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    init_hooks: IndexSet<String>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CodegenConfig) -> Self {
        let mut overrides = Self::new();
        for id in config.init_hooks() {
            overrides.register(id);
        }
        overrides
    }

    /// Mark `id` as having a hand-written init hook.
    pub fn register(&mut self, id: impl Into<String>) {
        let id = id.into();
        debug!(resource = id.as_str(); "Registered init hook");
        self.init_hooks.insert(id);
    }

    pub fn has_init(&self, id: &str) -> bool {
        self.init_hooks.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.init_hooks.is_empty()
    }

    /// Drop marks that name no resource of `unit`.
    ///
    /// Each dropped id is logged as a warning and returned.
    pub fn check(&mut self, unit: &Unit) -> Vec<String> {
        let mut unknown = Vec::new();
        self.init_hooks.retain(|id| {
            if unit.resource(id).is_some() {
                return true;
            }
            warn!(resource = id.as_str(); "Init hook registered for unknown resource, ignoring");
            unknown.push(id.clone());
            false
        });
        unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut overrides = OverrideSet::new();
        assert!(overrides.is_empty());
        overrides.register("os.file");
        assert!(overrides.has_init("os.file"));
        assert!(!overrides.has_init("os.dir"));
    }

    #[test]
    fn test_from_config() {
        let config = CodegenConfig::new(vec!["os.user".to_string(), "os.group".to_string()]);
        let overrides = OverrideSet::from_config(&config);
        assert!(overrides.has_init("os.user"));
        assert!(overrides.has_init("os.group"));
    }

    #[test]
    fn test_check_drops_unknown_resources() {
        let unit = lrc_parser::parse("os.user { name string }\n").unwrap();
        let mut overrides = OverrideSet::new();
        overrides.register("os.user");
        overrides.register("os.nope");

        assert_eq!(overrides.check(&unit), ["os.nope"]);
        assert!(overrides.has_init("os.user"));
        assert!(!overrides.has_init("os.nope"));
    }
}
