//! Registry of generated types for one run.
//!
//! Names are unique within a run. When a base name is taken the registry
//! appends the smallest integer ≥ 2 that yields a free name (`User`, `User2`,
//! `User3`, ...). The registry is append-only; [`TypeRegistry::freeze`] ends
//! the mutable phase before emission ordering.

use crate::error::GenerateError;
use crate::generate::GeneratedType;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Upper bound on suffix attempts for a single base name.
const MAX_SUFFIX: u64 = u32::MAX as u64;

#[derive(Debug, Default)]
pub struct TypeRegistry {
    /// Slots in insertion order; `None` while a reserved type is in progress.
    slots: IndexMap<String, Option<GeneratedType>>,
    /// Every name in use, including companion exports.
    taken: HashSet<String>,
    suffix_cap: Option<u64>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that gives up after `cap` suffix attempts.
    pub fn with_suffix_cap(cap: u64) -> Self {
        Self {
            suffix_cap: Some(cap),
            ..Self::default()
        }
    }

    /// Compute a free name for `base` without claiming it.
    pub fn unique_name(&self, base: &str) -> Result<String, GenerateError> {
        if !self.taken.contains(base) {
            return Ok(base.to_string());
        }
        let cap = self.suffix_cap.unwrap_or(MAX_SUFFIX);
        let mut attempts = 0;
        for n in 2..=cap.saturating_add(1) {
            attempts += 1;
            let candidate = format!("{}{}", base, n);
            if !self.taken.contains(&candidate) {
                return Ok(candidate);
            }
        }
        Err(GenerateError::NameCollisionExhaustion {
            base: base.to_string(),
            attempts,
        })
    }

    /// Claim a final name for a type whose body is not generated yet.
    ///
    /// The slot keeps its insertion position; fill it with [`fulfill`](Self::fulfill).
    pub fn reserve(&mut self, base: &str) -> Result<String, GenerateError> {
        let name = self.unique_name(base)?;
        tracing::debug!(base, name = %name, "reserved type name");
        self.taken.insert(name.clone());
        self.slots.insert(name.clone(), None);
        Ok(name)
    }

    /// Claim an extra exported name (an enum's companion alias) so no other
    /// type can take it.
    pub fn claim_export(&mut self, base: &str) -> Result<String, GenerateError> {
        let name = self.unique_name(base)?;
        self.taken.insert(name.clone());
        Ok(name)
    }

    /// Register a finished type under `base` (suffixed on collision) and
    /// return its final name. The type's `name` is overwritten with it.
    pub fn register(&mut self, base: &str, mut ty: GeneratedType) -> Result<String, GenerateError> {
        let name = self.unique_name(base)?;
        tracing::debug!(base, name = %name, "registered type");
        ty.set_name(&name);
        self.taken.insert(name.clone());
        self.slots.insert(name.clone(), Some(ty));
        Ok(name)
    }

    /// Fill a slot created by [`reserve`](Self::reserve).
    pub fn fulfill(&mut self, name: &str, mut ty: GeneratedType) {
        ty.set_name(name);
        match self.slots.get_mut(name) {
            Some(slot) => *slot = Some(ty),
            None => {
                self.taken.insert(name.to_string());
                self.slots.insert(name.to_string(), Some(ty));
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&GeneratedType> {
        self.slots.get(name).and_then(Option::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Completed types in insertion order.
    pub fn all_types(&self) -> impl Iterator<Item = &GeneratedType> {
        self.slots.values().filter_map(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.all_types().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End the mutable phase. Reserved slots that were never filled are
    /// dropped.
    pub fn freeze(self) -> FrozenRegistry {
        let mut types = Vec::with_capacity(self.slots.len());
        for (name, slot) in self.slots {
            match slot {
                Some(ty) => types.push(ty),
                None => tracing::warn!(name = %name, "reserved type was never generated"),
            }
        }
        FrozenRegistry { types }
    }
}

/// Read-only view of a finished registry.
#[derive(Debug, Clone, Default)]
pub struct FrozenRegistry {
    types: Vec<GeneratedType>,
}

impl FrozenRegistry {
    pub fn all_types(&self) -> &[GeneratedType] {
        &self.types
    }

    pub fn lookup(&self, name: &str) -> Option<&GeneratedType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn into_types(self) -> Vec<GeneratedType> {
        self.types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::DeclarationKind;

    fn ty(content: &str) -> GeneratedType {
        GeneratedType::new(DeclarationKind::Interface, content.to_string(), "#/test")
    }

    #[test]
    fn unused_name_is_kept() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.register("User", ty("a")).unwrap(), "User");
        assert_eq!(registry.lookup("User").unwrap().content, "a");
    }

    #[test]
    fn collisions_get_smallest_free_suffix() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.register("User", ty("a")).unwrap(), "User");
        assert_eq!(registry.register("User", ty("b")).unwrap(), "User2");
        assert_eq!(registry.register("User", ty("c")).unwrap(), "User3");
        assert_eq!(registry.lookup("User2").unwrap().name, "User2");
    }

    #[test]
    fn suffix_skips_names_taken_directly() {
        let mut registry = TypeRegistry::new();
        registry.register("Item", ty("a")).unwrap();
        registry.register("Item2", ty("b")).unwrap();
        assert_eq!(registry.register("Item", ty("c")).unwrap(), "Item3");
    }

    #[test]
    fn reserved_slots_keep_insertion_order() {
        let mut registry = TypeRegistry::new();
        let first = registry.reserve("Node").unwrap();
        registry.register("Leaf", ty("leaf")).unwrap();
        registry.fulfill(&first, ty("node"));

        let names: Vec<&str> = registry.all_types().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Node", "Leaf"]);
    }

    #[test]
    fn pending_reservation_is_not_listed() {
        let mut registry = TypeRegistry::new();
        registry.reserve("Pending").unwrap();
        assert!(registry.contains("Pending"));
        assert!(registry.lookup("Pending").is_none());
        assert_eq!(registry.len(), 0);
        assert!(registry.freeze().is_empty());
    }

    #[test]
    fn claimed_exports_block_names() {
        let mut registry = TypeRegistry::new();
        registry.claim_export("StatusValues").unwrap();
        assert_eq!(
            registry.register("StatusValues", ty("x")).unwrap(),
            "StatusValues2"
        );
    }

    #[test]
    fn exhaustion_under_a_cap() {
        let mut registry = TypeRegistry::with_suffix_cap(2);
        registry.register("T", ty("a")).unwrap();
        registry.register("T", ty("b")).unwrap();
        registry.register("T", ty("c")).unwrap();
        let err = registry.register("T", ty("d")).unwrap_err();
        assert_eq!(
            err,
            GenerateError::NameCollisionExhaustion {
                base: "T".into(),
                attempts: 2
            }
        );
    }

    #[test]
    fn names_are_unique() {
        let mut registry = TypeRegistry::new();
        for base in ["A", "A", "B", "A2", "A", "B"] {
            registry.register(base, ty(base)).unwrap();
        }
        let frozen = registry.freeze();
        let names: HashSet<&str> = frozen.all_types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), frozen.len());
    }
}
