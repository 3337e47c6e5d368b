use std::collections::HashMap;

use crate::container::ids;

/// Maps short service names to canonical identifiers.
///
/// Several aliases may point at one id; an alias points at exactly one id.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The framework's stable short names.
    pub fn defaults() -> Self {
        let mut table = Self::new();
        let groups: &[(&str, &[&str])] = &[
            (ids::APPLICATION, &["app", "container"]),
            (ids::ASSET_MANAGER, &["asset"]),
            (ids::CONFIGURATOR, &["config"]),
            (ids::CONSOLE, &["console"]),
            (ids::COOKIE_JAR, &["cookie"]),
            (ids::DATABASE_MANAGER, &["database", "db"]),
            (ids::DEBUG_MANAGER, &["debug"]),
            (ids::ENCRYPTER, &["crypt"]),
            (ids::EVENT_DISPATCHER, &["event"]),
            (ids::FAKER, &["faker"]),
            (ids::FIELD_MANAGER, &["field"]),
            (ids::FORM_MANAGER, &["form"]),
            (ids::HTTP_KERNEL, &["http_kernel"]),
            (ids::KERNEL, &["kernel"]),
            (ids::LOG_MANAGER, &["log"]),
            (ids::MAIL_MANAGER, &["mail"]),
            (ids::METABOX_MANAGER, &["metabox"]),
            (ids::PARTIAL_MANAGER, &["partial"]),
            (ids::REQUEST, &["request"]),
            (ids::ROUTER, &["router"]),
            (ids::SESSION_MANAGER, &["session"]),
            (ids::STORAGE_MANAGER, &["storage"]),
            (ids::VALIDATOR, &["validator"]),
            (ids::VIEW_MANAGER, &["view"]),
        ];
        for (id, aliases) in groups {
            for alias in *aliases {
                table.alias(*alias, *id);
            }
        }
        table
    }

    /// Point `alias` at `id`, replacing any previous target.
    pub fn alias(&mut self, alias: impl Into<String>, id: impl Into<String>) {
        self.aliases.insert(alias.into(), id.into());
    }

    /// Canonical id for `name`; names that are not aliases are returned unchanged.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// All aliases pointing at `id`, sorted.
    pub fn aliases_of(&self, id: &str) -> Vec<String> {
        let mut found: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == id)
            .map(|(alias, _)| alias.clone())
            .collect();
        found.sort();
        found
    }

    /// Merge `other` into this table; `other` wins on conflicts.
    pub fn extend(&mut self, other: AliasTable) {
        self.aliases.extend(other.aliases);
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
