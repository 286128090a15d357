use std::sync::Arc;

use crate::kernel::error::Error;
use crate::module_system::{LoaderMap, ModuleLookup, ModuleRegistry, ModuleSystemError};
use crate::utils::testing::bare_definition;

fn registry() -> ModuleRegistry {
    ModuleRegistry::new(Arc::new(LoaderMap::new()))
}

#[test]
fn test_register_and_resolve() {
    let registry = registry();
    registry.register(bare_definition("B")).unwrap();
    registry.register(bare_definition("A")).unwrap();

    assert!(matches!(registry.resolve("A"), ModuleLookup::Found(m) if m.name() == "A"));
    assert!(matches!(registry.resolve("C"), ModuleLookup::NotFound(name) if name == "C"));

    let names: Vec<String> = registry.modules().iter().map(|m| m.name().to_string()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_duplicate_registration_is_error() {
    let registry = registry();
    registry.register(bare_definition("A")).unwrap();
    let err = registry.register(bare_definition("A")).unwrap_err();
    assert!(matches!(
        err,
        Error::ModuleSystem(ModuleSystemError::AlreadyRegistered { .. })
    ));
}

#[test]
fn test_require_unknown_is_error() {
    let err = registry().require("Missing").unwrap_err();
    assert!(matches!(
        err,
        Error::ModuleSystem(ModuleSystemError::NotRegistered { .. })
    ));
}

#[test]
fn test_placeholder_is_cached_per_name() {
    let registry = registry();
    let a = registry.placeholder_for("Gone");
    let b = registry.placeholder_for("Gone");
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.is_placeholder());
    assert!(registry.get("Gone").is_none(), "placeholders are not registered");
}

#[test]
fn test_registries_are_independent() {
    let first = registry();
    let second = registry();
    first.register(bare_definition("A")).unwrap();
    assert!(second.is_empty());
}
