//! Name-ordered, reference-counted element collection.

use super::{DbElement, ElementId};
use crate::error::IntegrityError;
use std::collections::HashMap;

/// An ordered, name-unique collection of elements.
///
/// Elements live in a slot map keyed by their integer identity; a
/// separate order vector keeps the identities sorted by name, so
/// renames re-sort without moving element storage.
///
/// Two insertion paths exist:
///
/// - [`Registry::create`] for interactive edits: assigns a fresh
///   identity and rejects duplicate names.
/// - [`Registry::restore`] for bulk load: keeps the persisted identity
///   and resolves name collisions by appending a numeric suffix.
#[derive(Debug, Clone)]
pub struct Registry<T: DbElement> {
    slots: HashMap<u32, T>,
    /// Element IDs in name order.
    order: Vec<u32>,
    next_id: u32,
}

impl<T: DbElement> Registry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            order: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Inserts a new element, assigning a fresh identity.
    ///
    /// # Errors
    ///
    /// [`IntegrityError::DuplicateName`] if the name is already taken;
    /// the registry is unchanged.
    pub fn create(&mut self, mut entity: T) -> Result<T::Id, IntegrityError> {
        if self.by_name(entity.core().name()).is_some() {
            return Err(IntegrityError::DuplicateName {
                kind: T::KIND,
                name: entity.core().name().to_string(),
            });
        }
        let raw = self.next_id;
        self.next_id += 1;
        entity.core_mut().id = raw;
        let at = self.order_index_for(entity.core().name());
        self.order.insert(at, raw);
        self.slots.insert(raw, entity);
        Ok(T::Id::from_raw(raw))
    }

    /// Inserts an element decoded from storage, keeping its persisted
    /// identity.
    ///
    /// A name collision is resolved by appending " (2)", " (3)", … and
    /// retrying until the name is unique. The caller must ensure the
    /// identity itself is not already present.
    pub fn restore(&mut self, id: T::Id, mut entity: T) -> T::Id {
        let raw = id.as_raw();
        debug_assert!(
            !self.slots.contains_key(&raw),
            "restore of duplicate {} id {raw}",
            T::KIND
        );
        let base = entity.core().name().to_string();
        let mut suffix = 2;
        while self.by_name(entity.core().name()).is_some() {
            entity.core_mut().name = format!("{base} ({suffix})");
            suffix += 1;
        }
        entity.core_mut().id = raw;
        let at = self.order_index_for(entity.core().name());
        self.order.insert(at, raw);
        self.slots.insert(raw, entity);
        self.next_id = self.next_id.max(raw + 1);
        T::Id::from_raw(raw)
    }

    /// Removes an element.
    ///
    /// # Errors
    ///
    /// [`IntegrityError::UnknownElement`] if the ID is not live;
    /// [`IntegrityError::StillReferenced`] if the reference count is
    /// nonzero. Either way the registry is unchanged.
    pub fn remove(&mut self, id: T::Id) -> Result<T, IntegrityError> {
        let raw = id.as_raw();
        let entity = self
            .slots
            .get(&raw)
            .ok_or_else(|| IntegrityError::unknown(T::KIND, raw))?;
        if entity.core().is_referenced() {
            return Err(IntegrityError::StillReferenced {
                kind: T::KIND,
                name: entity.core().name().to_string(),
                refs: entity.core().ref_count(),
            });
        }
        let at = self.order_position(raw);
        self.order.remove(at);
        Ok(self.slots.remove(&raw).expect("slot present for ordered id"))
    }

    /// Looks up an element by ID.
    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.slots.get(&id.as_raw())
    }

    /// Looks up an element by ID, mutable.
    ///
    /// Names must not be changed through this handle; use
    /// [`Registry::rename`] so the order stays sorted.
    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.slots.get_mut(&id.as_raw())
    }

    /// Whether the ID names a live element.
    pub fn contains(&self, id: T::Id) -> bool {
        self.slots.contains_key(&id.as_raw())
    }

    /// Looks up an element by exact name.
    pub fn by_name(&self, name: &str) -> Option<&T> {
        let at = self.order_index_for(name);
        let raw = *self.order.get(at)?;
        let entity = &self.slots[&raw];
        (entity.core().name() == name).then_some(entity)
    }

    /// Renames an element and re-sorts the collection.
    ///
    /// # Errors
    ///
    /// [`IntegrityError::UnknownElement`] or
    /// [`IntegrityError::DuplicateName`]; the registry is unchanged.
    pub fn rename(&mut self, id: T::Id, new_name: impl Into<String>) -> Result<(), IntegrityError> {
        let raw = id.as_raw();
        let new_name = new_name.into();
        if !self.slots.contains_key(&raw) {
            return Err(IntegrityError::unknown(T::KIND, raw));
        }
        if let Some(other) = self.by_name(&new_name) {
            if other.core().id != raw {
                return Err(IntegrityError::DuplicateName {
                    kind: T::KIND,
                    name: new_name,
                });
            }
        }
        let at = self.order_position(raw);
        self.order.remove(at);
        let entity = self.slots.get_mut(&raw).expect("checked above");
        entity.core_mut().name = new_name;
        let at = self.order_index_for(self.slots[&raw].core().name());
        self.order.insert(at, raw);
        Ok(())
    }

    /// Iterates elements in name order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().map(move |raw| &self.slots[raw])
    }

    /// Iterates element IDs in name order.
    pub fn ids(&self) -> impl Iterator<Item = T::Id> + '_ {
        self.order.iter().map(|&raw| T::Id::from_raw(raw))
    }

    /// Acquires one reference on an element.
    pub fn add_ref(&mut self, id: T::Id) {
        match self.slots.get_mut(&id.as_raw()) {
            Some(entity) => entity.core_mut().acquire(),
            None => debug_assert!(false, "add_ref on unknown {} id {}", T::KIND, id.as_raw()),
        }
    }

    /// Releases one reference on an element.
    pub fn release_ref(&mut self, id: T::Id) {
        match self.slots.get_mut(&id.as_raw()) {
            Some(entity) => entity.core_mut().release(),
            None => debug_assert!(
                false,
                "release_ref on unknown {} id {}",
                T::KIND,
                id.as_raw()
            ),
        }
    }

    /// Whether the element has outstanding references.
    pub fn is_referenced(&self, id: T::Id) -> bool {
        self.get(id).is_some_and(|e| e.core().is_referenced())
    }

    /// The element's reference count, or zero if the ID is not live.
    pub fn ref_count(&self, id: T::Id) -> u32 {
        self.get(id).map_or(0, |e| e.core().ref_count())
    }

    /// Index in name order at which `name` belongs.
    fn order_index_for(&self, name: &str) -> usize {
        self.order
            .partition_point(|raw| self.slots[raw].core().name() < name)
    }

    /// Current index in name order of the element with ID `raw`.
    fn order_position(&self, raw: u32) -> usize {
        let name = self.slots[&raw].core().name();
        let at = self.order_index_for(name);
        debug_assert_eq!(self.order.get(at).copied(), Some(raw));
        at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Category, CategoryKind};
    use crate::types::CategoryId;

    fn registry_with(names: &[&str]) -> Registry<Category> {
        let mut registry = Registry::new();
        for name in names {
            registry
                .create(Category::new(*name, CategoryKind::Expense))
                .unwrap();
        }
        registry
    }

    fn names(registry: &Registry<Category>) -> Vec<&str> {
        registry.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn create_keeps_name_order() {
        let registry = registry_with(&["Rent", "Auto", "Groceries"]);
        assert_eq!(names(&registry), vec!["Auto", "Groceries", "Rent"]);
    }

    #[test]
    fn create_rejects_duplicate_name() {
        let mut registry = registry_with(&["Rent"]);
        let err = registry
            .create(Category::new("Rent", CategoryKind::Expense))
            .unwrap_err();
        assert!(matches!(err, IntegrityError::DuplicateName { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn restore_suffixes_collisions() {
        let mut registry = registry_with(&["Rent"]);
        registry.restore(
            CategoryId::new(40),
            Category::new("Rent", CategoryKind::Expense),
        );
        registry.restore(
            CategoryId::new(41),
            Category::new("Rent", CategoryKind::Expense),
        );
        assert_eq!(names(&registry), vec!["Rent", "Rent (2)", "Rent (3)"]);
    }

    #[test]
    fn restore_preserves_id_and_bumps_next() {
        let mut registry: Registry<Category> = Registry::new();
        let id = registry.restore(
            CategoryId::new(17),
            Category::new("Dining", CategoryKind::Expense),
        );
        assert_eq!(id, CategoryId::new(17));
        // A subsequent create must not collide with the restored ID.
        let fresh = registry
            .create(Category::new("Travel", CategoryKind::Expense))
            .unwrap();
        assert_eq!(fresh, CategoryId::new(18));
    }

    #[test]
    fn remove_referenced_fails_and_preserves_state() {
        let mut registry = registry_with(&["Rent", "Auto"]);
        let id = registry.by_name("Rent").unwrap().id();
        registry.add_ref(id);

        let err = registry.remove(id).unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::StillReferenced { refs: 1, .. }
        ));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ref_count(id), 1);

        registry.release_ref(id);
        let removed = registry.remove(id).unwrap();
        assert_eq!(removed.name(), "Rent");
        assert_eq!(names(&registry), vec!["Auto"]);
    }

    #[test]
    fn remove_unknown_id() {
        let mut registry = registry_with(&[]);
        let err = registry.remove(CategoryId::new(99)).unwrap_err();
        assert!(matches!(err, IntegrityError::UnknownElement { .. }));
    }

    #[test]
    fn rename_resorts() {
        let mut registry = registry_with(&["Auto", "Rent"]);
        let id = registry.by_name("Auto").unwrap().id();
        registry.rename(id, "Utilities").unwrap();
        assert_eq!(names(&registry), vec!["Rent", "Utilities"]);
        assert!(registry.by_name("Auto").is_none());
    }

    #[test]
    fn rename_to_own_name_is_allowed() {
        let mut registry = registry_with(&["Auto"]);
        let id = registry.by_name("Auto").unwrap().id();
        registry.rename(id, "Auto").unwrap();
        assert_eq!(names(&registry), vec!["Auto"]);
    }

    #[test]
    fn rename_duplicate_rejected() {
        let mut registry = registry_with(&["Auto", "Rent"]);
        let id = registry.by_name("Auto").unwrap().id();
        let err = registry.rename(id, "Rent").unwrap_err();
        assert!(matches!(err, IntegrityError::DuplicateName { .. }));
        assert_eq!(names(&registry), vec!["Auto", "Rent"]);
    }

    #[test]
    fn by_name_exact_match_only() {
        let registry = registry_with(&["Groceries"]);
        assert!(registry.by_name("Groceries").is_some());
        assert!(registry.by_name("Grocerie").is_none());
        assert!(registry.by_name("Groceriesx").is_none());
    }
}
