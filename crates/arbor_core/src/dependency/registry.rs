//! Registry storage. Evaluation against the tree lives on `World`.

use std::collections::{BTreeSet, HashMap};

use crate::entity::{EntityId, TypeKey};

#[derive(Debug)]
struct Dependent {
    requires: Vec<TypeKey>,
    satisfied: bool,
}

/// Index of dependent components and the types they require.
///
/// Satisfaction starts `false` and only changes through
/// [`DependencyRegistry::record`], which reports transitions.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    /// Required type -> components requiring it.
    by_required: HashMap<TypeKey, BTreeSet<EntityId>>,
    dependents: HashMap<EntityId, Dependent>,
}

impl DependencyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `component` requires every type in `requires`.
    ///
    /// Replaces any previous registration of the same component.
    pub fn register(&mut self, component: EntityId, mut requires: Vec<TypeKey>) {
        self.unregister(component);
        requires.sort_unstable();
        requires.dedup();
        for key in &requires {
            self.by_required.entry(*key).or_default().insert(component);
        }
        self.dependents.insert(
            component,
            Dependent {
                requires,
                satisfied: false,
            },
        );
    }

    /// Removes every index entry for `component`.
    ///
    /// Returns `true` if it was registered.
    pub fn unregister(&mut self, component: EntityId) -> bool {
        let Some(dependent) = self.dependents.remove(&component) else {
            return false;
        };
        for key in &dependent.requires {
            if let Some(set) = self.by_required.get_mut(key) {
                set.remove(&component);
                if set.is_empty() {
                    self.by_required.remove(key);
                }
            }
        }
        true
    }

    /// Components requiring `key`, in ascending handle order.
    pub fn dependents_of(&self, key: TypeKey) -> impl Iterator<Item = EntityId> + '_ {
        self.by_required
            .get(&key)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Types required by `component`.
    #[must_use]
    pub fn requirements(&self, component: EntityId) -> Option<&[TypeKey]> {
        self.dependents
            .get(&component)
            .map(|dependent| dependent.requires.as_slice())
    }

    /// Returns `true` if `component` is registered as a dependent.
    #[must_use]
    pub fn is_dependent(&self, component: EntityId) -> bool {
        self.dependents.contains_key(&component)
    }

    /// Last recorded satisfaction; `true` for components that are not dependents.
    #[must_use]
    pub fn is_satisfied(&self, component: EntityId) -> bool {
        self.dependents
            .get(&component)
            .map_or(true, |dependent| dependent.satisfied)
    }

    /// Stores a freshly evaluated satisfaction.
    ///
    /// Returns the new value only if it differs from the stored one.
    pub fn record(&mut self, component: EntityId, satisfied: bool) -> Option<bool> {
        let dependent = self.dependents.get_mut(&component)?;
        if dependent.satisfied == satisfied {
            return None;
        }
        dependent.satisfied = satisfied;
        Some(satisfied)
    }

    /// Number of registered dependents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    /// Returns `true` if no dependent is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.by_required.clear();
        self.dependents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    fn e(index: u32) -> EntityId {
        EntityId::new(index, 0)
    }

    #[test]
    fn test_register_indexes_required_types() {
        let mut registry = DependencyRegistry::new();
        registry.register(
            e(1),
            vec![TypeKey::of::<A>(), TypeKey::of::<B>(), TypeKey::of::<A>()],
        );
        registry.register(e(2), vec![TypeKey::of::<A>()]);

        let a: Vec<_> = registry.dependents_of(TypeKey::of::<A>()).collect();
        assert_eq!(a, vec![e(1), e(2)]);
        assert_eq!(registry.requirements(e(1)).map(<[TypeKey]>::len), Some(2));
        assert!(!registry.is_satisfied(e(1)));
        assert!(registry.is_satisfied(e(9)));
    }

    #[test]
    fn test_unregister_clears_index() {
        let mut registry = DependencyRegistry::new();
        registry.register(e(1), vec![TypeKey::of::<A>()]);
        assert!(registry.unregister(e(1)));
        assert!(!registry.unregister(e(1)));
        assert_eq!(registry.dependents_of(TypeKey::of::<A>()).count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_record_reports_transitions_only() {
        let mut registry = DependencyRegistry::new();
        registry.register(e(1), vec![TypeKey::of::<A>()]);
        assert_eq!(registry.record(e(1), false), None);
        assert_eq!(registry.record(e(1), true), Some(true));
        assert_eq!(registry.record(e(1), true), None);
        assert_eq!(registry.record(e(1), false), Some(false));
        assert_eq!(registry.record(e(7), true), None);
    }
}
