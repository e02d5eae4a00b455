//! Linker groups (comdats) owned by a module.
//!
//! A comdat is a named keep-or-discard unit: the linker keeps all sections
//! in the group or none of them. The module owns the table; functions and
//! globals refer to entries by [`ComdatId`].

use std::fmt;

use rustc_hash::FxHashMap;

use crate::module::raw_index;

/// Index of a comdat in its module's [`ComdatTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ComdatId(u32);

impl ComdatId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What the linker does when several objects define the same comdat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ComdatSelection {
    /// Keep any one definition.
    #[default]
    Any,
    /// Keep one; all definitions must be byte-identical.
    ExactMatch,
    /// Keep the largest definition.
    Largest,
    /// Duplicate definitions are an error.
    NoDeduplicate,
    /// Keep one; all definitions must have the same size.
    SameSize,
}

impl ComdatSelection {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::ExactMatch => "exactmatch",
            Self::Largest => "largest",
            Self::NoDeduplicate => "nodeduplicate",
            Self::SameSize => "samesize",
        }
    }
}

impl fmt::Display for ComdatSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A named linker group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comdat {
    name: String,
    pub selection: ComdatSelection,
}

impl Comdat {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The comdat namespace of a module.
///
/// Names are unique: [`get_or_insert`](Self::get_or_insert) returns the
/// existing entry when one with the same name is already present.
#[derive(Clone, Debug, Default)]
pub struct ComdatTable {
    comdats: Vec<Comdat>,
    by_name: FxHashMap<String, ComdatId>,
}

impl ComdatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `name`, creating a comdat with the default selection if absent.
    pub fn get_or_insert(&mut self, name: &str) -> ComdatId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = ComdatId::new(raw_index(self.comdats.len(), "comdat"));
        self.comdats.push(Comdat {
            name: name.to_owned(),
            selection: ComdatSelection::default(),
        });
        self.by_name.insert(name.to_owned(), id);
        id
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ComdatId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn get(&self, id: ComdatId) -> &Comdat {
        &self.comdats[id.index()]
    }

    pub fn get_mut(&mut self, id: ComdatId) -> &mut Comdat {
        &mut self.comdats[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.comdats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comdats.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComdatId, &Comdat)> {
        self.comdats
            .iter()
            .enumerate()
            .map(|(i, c)| (ComdatId::new(raw_index(i, "comdat")), c))
    }
}

#[cfg(test)]
mod tests {
    use super::{ComdatSelection, ComdatTable};

    #[test]
    fn get_or_insert_is_keyed_by_name() {
        let mut table = ComdatTable::new();
        let a = table.get_or_insert("foo");
        let b = table.get_or_insert("bar");
        let again = table.get_or_insert("foo");

        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("bar"), Some(b));
        assert_eq!(table.lookup("baz"), None);
    }

    #[test]
    fn new_comdat_defaults_to_any() {
        let mut table = ComdatTable::new();
        let id = table.get_or_insert("foo");
        assert_eq!(table.get(id).selection, ComdatSelection::Any);
        assert_eq!(table.get(id).name(), "foo");
    }

    #[test]
    fn iter_yields_ids_in_creation_order() {
        let mut table = ComdatTable::new();
        table.get_or_insert("a");
        table.get_or_insert("b");
        let names: Vec<_> = table.iter().map(|(id, c)| (id.raw(), c.name())).collect();
        assert_eq!(names, vec![(0, "a"), (1, "b")]);
    }
}
