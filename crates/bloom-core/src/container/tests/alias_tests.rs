use crate::container::{AliasTable, ids};

#[test]
fn test_defaults_cover_short_names() {
    let table = AliasTable::defaults();

    assert_eq!(table.resolve("app"), ids::APPLICATION);
    assert_eq!(table.resolve("container"), ids::APPLICATION);
    assert_eq!(table.resolve("config"), ids::CONFIGURATOR);
    assert_eq!(table.resolve("event"), ids::EVENT_DISPATCHER);
    assert_eq!(table.resolve("db"), ids::DATABASE_MANAGER);
    assert_eq!(table.resolve("database"), ids::DATABASE_MANAGER);
    assert_eq!(table.resolve("router"), ids::ROUTER);
    assert_eq!(table.resolve("session"), ids::SESSION_MANAGER);
}

#[test]
fn test_non_alias_resolves_to_itself() {
    let table = AliasTable::defaults();
    assert_eq!(table.resolve("Whatever"), "Whatever");
    assert!(!table.is_alias("Whatever"));
    assert!(table.is_alias("app"));
}

#[test]
fn test_aliases_of_is_sorted() {
    let table = AliasTable::defaults();
    assert_eq!(table.aliases_of(ids::APPLICATION), vec!["app".to_string(), "container".to_string()]);
    assert!(table.aliases_of("Unknown").is_empty());
}

#[test]
fn test_realias_replaces_target() {
    let mut table = AliasTable::new();
    assert!(table.is_empty());
    table.alias("cache", "FileCache");
    table.alias("cache", "RedisCache");
    assert_eq!(table.resolve("cache"), "RedisCache");
    assert_eq!(table.len(), 1);
}

#[test]
fn test_extend_overrides_existing() {
    let mut table = AliasTable::defaults();
    let mut extra = AliasTable::new();
    extra.alias("view", "TwigViewManager");
    extra.alias("cache", "Cache");
    table.extend(extra);

    assert_eq!(table.resolve("view"), "TwigViewManager");
    assert_eq!(table.resolve("cache"), "Cache");
}
