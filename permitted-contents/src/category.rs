//! Content-category unfolding.
//!
//! A category table maps `#category` names to members, which are tag names,
//! `#text`, or further `#category` references. Resolution flattens a category
//! into the set of concrete token names it denotes.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::ContentModelError;
use crate::model::is_category_name;

/// Memoizing category resolver.
///
/// Holds a mutable cache, so it is confined to the thread that loads the
/// configuration; the finished result is the immutable [`ResolvedCategories`].
#[derive(Debug)]
pub struct CategoryResolver<'t> {
    table: &'t BTreeMap<String, Vec<String>>,
    memo: HashMap<String, BTreeSet<String>>,
}

impl<'t> CategoryResolver<'t> {
    #[must_use]
    pub fn new(table: &'t BTreeMap<String, Vec<String>>) -> Self {
        Self {
            table,
            memo: HashMap::new(),
        }
    }

    /// Resolve `name` to the flat set of token names it denotes.
    ///
    /// # Errors
    ///
    /// Returns `ContentModelError::UnknownCategory` if `name`, or any category
    /// reachable from it, is missing from the table.
    pub fn resolve(&mut self, name: &str) -> Result<&BTreeSet<String>, ContentModelError> {
        let table = self.table;
        match self.memo.entry(name.to_owned()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let members = expand(table, name)?;
                Ok(entry.insert(members))
            }
        }
    }

    /// Resolve every category in the table.
    ///
    /// # Errors
    ///
    /// Returns `ContentModelError::UnknownCategory` for the first dangling reference.
    pub fn resolve_all(mut self) -> Result<ResolvedCategories, ContentModelError> {
        let table = self.table;
        for name in table.keys() {
            self.resolve(name)?;
        }
        Ok(ResolvedCategories {
            sets: self.memo.into_iter().collect(),
        })
    }
}

/// Depth-first expansion over an explicit stack. A category already expanded
/// during this resolution contributes nothing further, which bounds cycles.
fn expand(
    table: &BTreeMap<String, Vec<String>>,
    root: &str,
) -> Result<BTreeSet<String>, ContentModelError> {
    let mut out = BTreeSet::new();
    let mut expanded: HashSet<&str> = HashSet::new();
    let mut pending: Vec<&str> = vec![root];

    while let Some(category) = pending.pop() {
        if !expanded.insert(category) {
            continue;
        }
        let members = table
            .get(category)
            .ok_or_else(|| ContentModelError::UnknownCategory {
                name: category.to_owned(),
            })?;
        for member in members.iter().rev() {
            if is_category_name(member) {
                pending.push(member);
            } else {
                out.insert(member.to_ascii_lowercase());
            }
        }
    }
    Ok(out)
}

/// Immutable, fully resolved category table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCategories {
    sets: BTreeMap<String, BTreeSet<String>>,
}

impl ResolvedCategories {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.sets.get(name)
    }

    /// Like [`ResolvedCategories::get`], failing on unknown names.
    ///
    /// # Errors
    ///
    /// Returns `ContentModelError::UnknownCategory` if `name` is not in the table.
    pub fn members(&self, name: &str) -> Result<&BTreeSet<String>, ContentModelError> {
        self.get(name)
            .ok_or_else(|| ContentModelError::UnknownCategory {
                name: name.to_owned(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }
}
