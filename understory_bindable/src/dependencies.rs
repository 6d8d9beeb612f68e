// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declared property dependencies.
//!
//! This module provides [`DependencyMap`], a per-type table from a property
//! name to the names that must be notified alongside it, and
//! [`DependencyMapBuilder`] for declaring the edges.

use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

/// Inline capacity for a property's fan-out list.
const INLINE_CAPACITY: usize = 4;

type FanoutList = SmallVec<[Arc<str>; INLINE_CAPACITY]>;

/// Immutable fan-out table: changing a source property also notifies its
/// dependents.
///
/// The table is flattened when built: each source maps to the full transitive
/// closure of its dependents, so the bag expands exactly one level at set
/// time. Build it once per view-model type and share it:
///
/// ```rust
/// use std::sync::{Arc, LazyLock};
/// use understory_bindable::{DependencyMap, DependencyMapBuilder};
///
/// static PERSON: LazyLock<Arc<DependencyMap>> = LazyLock::new(|| {
///     Arc::new(
///         DependencyMapBuilder::new()
///             .depends_on("FullName", ["FirstName", "LastName"])
///             .depends_on("Greeting", ["FullName"])
///             .build(),
///     )
/// });
///
/// let fanout: Vec<&str> = PERSON.affected_by("FirstName").iter().map(|n| &**n).collect();
/// assert_eq!(fanout, ["FullName", "Greeting"]);
/// assert!(PERSON.affected_by("Greeting").is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct DependencyMap {
    fanout: HashMap<Arc<str>, FanoutList>,
}

impl DependencyMap {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a builder for declaring edges.
    #[must_use]
    pub fn builder() -> DependencyMapBuilder {
        DependencyMapBuilder::new()
    }

    /// Returns every property that must be notified when `name` changes,
    /// excluding `name` itself.
    #[must_use]
    pub fn affected_by(&self, name: &str) -> &[Arc<str>] {
        self.fanout.get(name).map(SmallVec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if changing `name` notifies any other property.
    #[must_use]
    pub fn has_dependents(&self, name: &str) -> bool {
        !self.affected_by(name).is_empty()
    }

    /// Returns the number of source properties with dependents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fanout.len()
    }

    /// Returns `true` if no dependency was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fanout.is_empty()
    }

    /// Returns the source properties that have dependents.
    pub fn sources(&self) -> impl Iterator<Item = &str> + '_ {
        self.fanout.keys().map(|name| &**name)
    }
}

/// Builder for [`DependencyMap`].
///
/// Edges are declared as "changing `source` affects `dependent`". Either
/// direction of declaration may be used; both produce the same edges.
/// Self edges are ignored and cycles are tolerated.
#[derive(Clone, Debug, Default)]
pub struct DependencyMapBuilder {
    /// `(source, dependent)` pairs in declaration order.
    edges: Vec<(Arc<str>, Arc<str>)>,
}

impl DependencyMapBuilder {
    /// Creates a builder with no edges.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that changing `source` also changes each of `dependents`.
    ///
    /// # Panics
    ///
    /// Panics if any name is empty.
    #[must_use]
    pub fn affects<I, S>(mut self, source: &str, dependents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let source = interned(source);
        for dependent in dependents {
            self.edges
                .push((Arc::clone(&source), interned(dependent.as_ref())));
        }
        self
    }

    /// Declares that `dependent` is computed from each of `sources`.
    ///
    /// # Panics
    ///
    /// Panics if any name is empty.
    #[must_use]
    pub fn depends_on<I, S>(mut self, dependent: &str, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let dependent = interned(dependent);
        for source in sources {
            self.edges
                .push((interned(source.as_ref()), Arc::clone(&dependent)));
        }
        self
    }

    /// Flattens the declared edges into a [`DependencyMap`].
    ///
    /// Each source's fan-out lists its dependents breadth-first, in
    /// declaration order, without duplicates.
    #[must_use]
    pub fn build(self) -> DependencyMap {
        let mut direct: HashMap<Arc<str>, FanoutList> = HashMap::new();
        let mut source_order: Vec<Arc<str>> = Vec::new();
        for (source, dependent) in self.edges {
            if source == dependent {
                continue;
            }
            let list = direct.entry(Arc::clone(&source)).or_insert_with(|| {
                source_order.push(Arc::clone(&source));
                FanoutList::new()
            });
            if !list.contains(&dependent) {
                list.push(dependent);
            }
        }

        let mut fanout = HashMap::with_capacity(direct.len());
        let mut visited: HashSet<Arc<str>> = HashSet::new();
        let mut queue: VecDeque<Arc<str>> = VecDeque::new();
        for source in source_order {
            visited.clear();
            queue.clear();
            visited.insert(Arc::clone(&source));
            queue.push_back(Arc::clone(&source));

            let mut closure = FanoutList::new();
            while let Some(current) = queue.pop_front() {
                let Some(next) = direct.get(&current) else {
                    continue;
                };
                for dependent in next {
                    if visited.insert(Arc::clone(dependent)) {
                        closure.push(Arc::clone(dependent));
                        queue.push_back(Arc::clone(dependent));
                    }
                }
            }
            fanout.insert(source, closure);
        }

        DependencyMap { fanout }
    }
}

fn interned(name: &str) -> Arc<str> {
    assert!(!name.is_empty(), "property name must not be empty");
    Arc::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(map: &DependencyMap, source: &str) -> Vec<String> {
        map.affected_by(source)
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    #[test]
    fn empty_map() {
        let map = DependencyMap::new();
        assert!(map.is_empty());
        assert!(map.affected_by("Anything").is_empty());
        assert!(!map.has_dependents("Anything"));
    }

    #[test]
    fn affects_and_depends_on_agree() {
        let a = DependencyMapBuilder::new()
            .affects("FirstName", ["FullName"])
            .build();
        let b = DependencyMapBuilder::new()
            .depends_on("FullName", ["FirstName"])
            .build();
        assert_eq!(names(&a, "FirstName"), names(&b, "FirstName"));
    }

    #[test]
    fn fanout_is_transitive_and_ordered() {
        let map = DependencyMap::builder()
            .affects("FirstName", ["FullName", "Initials"])
            .affects("FullName", ["Greeting", "Initials"])
            .affects("Greeting", ["Banner"])
            .build();

        assert_eq!(
            names(&map, "FirstName"),
            ["FullName", "Initials", "Greeting", "Banner"]
        );
        assert_eq!(names(&map, "FullName"), ["Greeting", "Initials", "Banner"]);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let map = DependencyMap::builder()
            .affects("A", ["B", "B"])
            .depends_on("B", ["A"])
            .build();
        assert_eq!(names(&map, "A"), ["B"]);
    }

    #[test]
    fn self_edges_are_ignored() {
        let map = DependencyMap::builder().affects("A", ["A"]).build();
        assert!(map.is_empty());
    }

    #[test]
    fn cycles_terminate_and_exclude_source() {
        let map = DependencyMap::builder()
            .affects("A", ["B"])
            .affects("B", ["C"])
            .affects("C", ["A"])
            .build();
        assert_eq!(names(&map, "A"), ["B", "C"]);
        assert_eq!(names(&map, "C"), ["A", "B"]);
    }

    #[test]
    fn sources_lists_declared_sources() {
        let map = DependencyMap::builder()
            .depends_on("FullName", ["FirstName", "LastName"])
            .build();
        let mut sources: Vec<&str> = map.sources().collect();
        sources.sort_unstable();
        assert_eq!(sources, ["FirstName", "LastName"]);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_names_panic() {
        let _ = DependencyMapBuilder::new().affects("A", [""]);
    }
}
