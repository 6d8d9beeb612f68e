// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-view-model property storage with change notification.
//!
//! # Locking
//!
//! Every [`PropertyBag`] owns one mutex covering its values, its batch depth
//! and its pending change set. Compare-and-store, reads and batch bookkeeping
//! each take it once. Listeners are always invoked after it is released, so a
//! listener may read or write the bag that notified it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;
use smallvec::SmallVec;
use understory_notify::{Listeners, Subscription};

use crate::changes::ChangeSet;
use crate::dependencies::DependencyMap;
use crate::error::{PropertyError, check_name};
use crate::id::Property;
use crate::value::{ErasedValue, PropertyValue};

/// Inline capacity for the names notified by a single set.
const INLINE_CAPACITY: usize = 4;

type Names = SmallVec<[Arc<str>; INLINE_CAPACITY]>;

/// Which names a committed change notifies.
#[derive(Clone, Copy, Debug)]
enum Fanout<'a> {
    /// Store only.
    Silent,
    /// The primary name plus the bag's declared dependents.
    Declared,
    /// The primary name plus an explicit list, one level deep.
    Explicit(&'a [&'a str]),
}

#[derive(Debug, Default)]
struct BagState {
    values: HashMap<Arc<str>, ErasedValue>,
    batch_depth: usize,
    pending: ChangeSet,
}

/// Thread-safe keyed property storage for one view-model.
///
/// Values are stored type-erased and keyed by name; [`Property<T>`] keys
/// recover the type at the call site. A set compares the new value with the
/// stored one and notifies subscribers only when it changed, either at once or,
/// inside a batch scope, once per name when the outermost scope ends.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use understory_bindable::{Property, PropertyBag};
///
/// const COUNT: Property<u32> = Property::new("Count");
///
/// let bag = PropertyBag::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let log = Arc::clone(&seen);
/// let _subscription = bag.subscribe(move |name| log.lock().unwrap().push(name.to_owned()));
///
/// assert_eq!(bag.get(COUNT), 0);
/// assert!(bag.set(COUNT, 1));
/// assert!(!bag.set(COUNT, 1));
///
/// {
///     let _batch = bag.batch();
///     bag.set(COUNT, 2);
///     bag.set(COUNT, 3);
/// }
///
/// assert_eq!(bag.get(COUNT), 3);
/// assert_eq!(*seen.lock().unwrap(), ["Count", "Count"]);
/// ```
pub struct PropertyBag {
    state: Mutex<BagState>,
    listeners: Listeners<str>,
    dependencies: Option<Arc<DependencyMap>>,
}

impl PropertyBag {
    /// Creates an empty bag with no declared dependencies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BagState::default()),
            listeners: Listeners::new(),
            dependencies: None,
        }
    }

    /// Creates an empty bag whose [`set`](Self::set) also notifies the
    /// dependents declared in `dependencies`.
    #[must_use]
    pub fn with_dependencies(dependencies: Arc<DependencyMap>) -> Self {
        Self {
            dependencies: Some(dependencies),
            ..Self::new()
        }
    }

    /// Returns the declared dependency table, if any.
    #[must_use]
    pub fn dependencies(&self) -> Option<&DependencyMap> {
        self.dependencies.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, BagState> {
        // Listeners never run under this lock, so a poisoned guard still
        // protects a fully committed state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the stored value, or `T::default()` if the property was never
    /// set.
    ///
    /// A value stored under a different type also reads as the default.
    /// Use [`try_get`](Self::try_get) to observe that case.
    #[must_use]
    pub fn get<T: PropertyValue + Default>(&self, property: Property<T>) -> T {
        match self.read::<T>(property.name()) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                tracing::debug!(%err, "typed read fell back to the default value");
                T::default()
            }
        }
    }

    /// Returns the stored value, `Ok(None)` if the property was never set, or
    /// [`PropertyError::TypeMismatch`] if it holds another type.
    pub fn try_get<T: PropertyValue>(
        &self,
        property: Property<T>,
    ) -> Result<Option<T>, PropertyError> {
        self.read(property.name())
    }

    /// Name-based form of [`get`](Self::get) for dynamic callers.
    ///
    /// Fails with [`PropertyError::EmptyName`] for an empty name and with
    /// [`PropertyError::TypeMismatch`] if the slot holds another type.
    pub fn get_by_name<T: PropertyValue + Default>(&self, name: &str) -> Result<T, PropertyError> {
        check_name(name)?;
        Ok(self.read::<T>(name)?.unwrap_or_default())
    }

    fn read<T: PropertyValue>(&self, name: &str) -> Result<Option<T>, PropertyError> {
        let state = self.lock();
        let Some(slot) = state.values.get(name) else {
            return Ok(None);
        };
        match slot.downcast_ref::<T>() {
            Some(value) => Ok(Some(value.clone())),
            None => Err(PropertyError::TypeMismatch {
                name: name.to_owned(),
                stored: slot.type_name(),
                requested: core::any::type_name::<T>(),
            }),
        }
    }

    /// Returns `true` if a value is stored under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lock().values.contains_key(name)
    }

    /// Returns the number of stored properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    /// Returns `true` if no property has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().values.is_empty()
    }

    /// Returns the names of all stored properties, in no particular order.
    #[must_use]
    pub fn names(&self) -> Vec<Arc<str>> {
        self.lock().values.keys().cloned().collect()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stores `value` and notifies if it differs from the stored value.
    ///
    /// When changed, the property itself is notified first, then every
    /// dependent declared in the bag's [`DependencyMap`]. A property that was
    /// never set compares as `T::default()`, so writing the default to it
    /// stores nothing.
    ///
    /// Returns `true` if the value changed.
    pub fn set<T: PropertyValue + Default>(&self, property: Property<T>, value: T) -> bool {
        self.commit(property.name(), value, Fanout::Declared)
    }

    /// Stores `value` without notifying anyone.
    ///
    /// Returns `true` if the value changed.
    pub fn set_silently<T: PropertyValue + Default>(
        &self,
        property: Property<T>,
        value: T,
    ) -> bool {
        self.commit(property.name(), value, Fanout::Silent)
    }

    /// Stores `value` and, when changed, notifies the property and then each
    /// name in `also_notify`, in order.
    ///
    /// Each name is notified at most once, so listing the property itself is
    /// harmless. The list is not expanded further: dependents of dependents
    /// must be listed explicitly. Declared dependencies are not consulted.
    ///
    /// Returns `true` if the value changed.
    pub fn set_and_notify<T: PropertyValue + Default>(
        &self,
        property: Property<T>,
        value: T,
        also_notify: &[&str],
    ) -> bool {
        self.commit(property.name(), value, Fanout::Explicit(also_notify))
    }

    /// Name-based form of [`set`](Self::set) / [`set_silently`](Self::set_silently)
    /// for dynamic callers.
    ///
    /// Fails with [`PropertyError::EmptyName`] for an empty name, in which
    /// case the bag is not touched.
    pub fn set_by_name<T: PropertyValue + Default>(
        &self,
        name: &str,
        value: T,
        notify: bool,
    ) -> Result<bool, PropertyError> {
        check_name(name)?;
        let fanout = if notify {
            Fanout::Declared
        } else {
            Fanout::Silent
        };
        Ok(self.commit(name, value, fanout))
    }

    fn commit<T: PropertyValue + Default>(
        &self,
        name: &str,
        value: T,
        fanout: Fanout<'_>,
    ) -> bool {
        let names = {
            let mut state = self.lock();
            let key = match state.values.get_key_value(name) {
                Some((_, stored)) if stored.downcast_ref::<T>() == Some(&value) => return false,
                Some((key, _)) => Arc::clone(key),
                None if value == T::default() => return false,
                None => Arc::from(name),
            };
            state.values.insert(Arc::clone(&key), ErasedValue::new(value));
            tracing::trace!(property = name, "property changed");

            let names = self.fanout_names(key, fanout);
            if state.batch_depth > 0 {
                for name in &names {
                    state.pending.mark(name);
                }
                return true;
            }
            names
        };

        self.emit(&names);
        true
    }

    fn fanout_names(&self, key: Arc<str>, fanout: Fanout<'_>) -> Names {
        let mut names = Names::new();
        match fanout {
            Fanout::Silent => {}
            Fanout::Declared => {
                if let Some(dependencies) = &self.dependencies {
                    let dependents = dependencies.affected_by(&key);
                    names.reserve(dependents.len() + 1);
                    names.push(key);
                    names.extend(dependents.iter().cloned());
                } else {
                    names.push(key);
                }
            }
            Fanout::Explicit(also_notify) => {
                names.push(key);
                for &name in also_notify {
                    if name.is_empty() {
                        tracing::debug!("skipping empty name in notification list");
                        continue;
                    }
                    if !names.iter().any(|known| &**known == name) {
                        names.push(Arc::from(name));
                    }
                }
            }
        }
        names
    }

    fn emit(&self, names: &[Arc<str>]) {
        for name in names {
            tracing::trace!(property = &**name, "notifying");
            self.listeners.emit(name);
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Signals a change of `name` without touching its value.
    ///
    /// Inside a batch scope the name is deferred like any other change.
    pub fn notify(&self, name: &str) -> Result<(), PropertyError> {
        check_name(name)?;
        let name: Arc<str> = Arc::from(name);
        {
            let mut state = self.lock();
            if state.batch_depth > 0 {
                state.pending.mark(&name);
                return Ok(());
            }
        }
        self.emit(core::slice::from_ref(&name));
        Ok(())
    }

    /// Signals a change of every stored property.
    ///
    /// The set of names is captured under the lock; notifications are sent
    /// after it is released. Inside a batch scope every name is deferred.
    pub fn notify_all(&self) {
        let names: Vec<Arc<str>> = {
            let mut state = self.lock();
            let names: Vec<Arc<str>> = state.values.keys().cloned().collect();
            if state.batch_depth > 0 {
                for name in &names {
                    state.pending.mark(name);
                }
                return;
            }
            names
        };
        self.emit(&names);
    }

    /// Registers a listener for change notifications.
    ///
    /// The listener receives the name of each changed property. It may run on
    /// whichever thread committed the change, possibly concurrently with
    /// further mutation of the bag.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    // =========================================================================
    // Batching
    // =========================================================================

    /// Opens a (nestable) batch scope.
    ///
    /// Until the matching outermost [`end_batch`](Self::end_batch), changes are
    /// recorded instead of notified.
    pub fn begin_batch(&self) {
        let mut state = self.lock();
        state.batch_depth += 1;
    }

    /// Closes a batch scope.
    ///
    /// When the outermost scope closes, every recorded name is notified exactly
    /// once if `flush` is `true`, or dropped if it is `false`. Inner scopes
    /// only decrement the depth; their `flush` argument is ignored.
    /// Calling this without an open scope is ignored.
    pub fn end_batch(&self, flush: bool) {
        let pending = {
            let mut state = self.lock();
            if state.batch_depth == 0 {
                tracing::warn!("end_batch called without a matching begin_batch");
                return;
            }
            state.batch_depth -= 1;
            if state.batch_depth > 0 {
                return;
            }
            let pending = state.pending.take();
            if !flush {
                tracing::debug!(discarded = pending.len(), "batch discarded");
                return;
            }
            pending
        };

        tracing::debug!(count = pending.len(), "batch flushed");
        self.emit(&pending);
    }

    /// Opens a batch scope that ends, with flush, when the guard drops.
    pub fn batch(&self) -> BatchScope<'_> {
        self.begin_batch();
        BatchScope {
            bag: self,
            open: true,
        }
    }

    /// Returns `true` while at least one batch scope is open.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.lock().batch_depth > 0
    }

    /// Returns the current batch nesting depth.
    #[must_use]
    pub fn batch_depth(&self) -> usize {
        self.lock().batch_depth
    }

    /// Returns the number of distinct names waiting for the outermost batch
    /// scope to end.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }
}

impl Default for PropertyBag {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PropertyBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("PropertyBag")
            .field("len", &state.values.len())
            .field("batch_depth", &state.batch_depth)
            .field("pending", &state.pending.len())
            .field("listeners", &self.listeners.len())
            .field("dependencies", &self.dependencies.as_ref().map(|d| d.len()))
            .finish()
    }
}

/// RAII batch scope returned by [`PropertyBag::batch`].
///
/// Dropping the scope ends the batch and flushes; [`discard`](Self::discard)
/// ends it without notifying. A scope dropped while the thread is panicking
/// discards.
#[must_use = "dropping a BatchScope immediately ends the batch"]
pub struct BatchScope<'a> {
    bag: &'a PropertyBag,
    open: bool,
}

impl BatchScope<'_> {
    /// Ends the scope, flushing deferred notifications if it is the outermost.
    pub fn end(mut self) {
        self.close(true);
    }

    /// Ends the scope, dropping deferred notifications if it is the outermost.
    pub fn discard(mut self) {
        self.close(false);
    }

    fn close(&mut self, flush: bool) {
        if self.open {
            self.open = false;
            self.bag.end_batch(flush);
        }
    }
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        self.close(!std::thread::panicking());
    }
}

impl fmt::Debug for BatchScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchScope")
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE: Property<String> = Property::new("Title");
    const COUNT: Property<u32> = Property::new("Count");

    fn recorder(bag: &PropertyBag) -> (Arc<Mutex<Vec<String>>>, Subscription) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let sub = bag.subscribe(move |name| sink.lock().unwrap().push(name.to_owned()));
        (log, sub)
    }

    #[test]
    fn get_absent_is_default() {
        let bag = PropertyBag::new();
        assert_eq!(bag.get(COUNT), 0);
        assert_eq!(bag.get(TITLE), "");
        assert_eq!(bag.try_get(COUNT), Ok(None));
        assert!(bag.is_empty());
    }

    #[test]
    fn default_on_absent_key_is_unchanged() {
        let bag = PropertyBag::new();
        let (log, _sub) = recorder(&bag);
        assert!(!bag.set(COUNT, 0));
        assert!(!bag.set_silently(TITLE, String::new()));
        assert!(!bag.set_and_notify(COUNT, 0, &["Header"]));
        assert!(bag.is_empty());
        assert!(log.lock().unwrap().is_empty());

        assert!(bag.set(COUNT, 2));
        assert_eq!(*log.lock().unwrap(), ["Count"]);
    }

    #[test]
    fn set_silently_stores_without_notifying() {
        let bag = PropertyBag::new();
        let (log, _sub) = recorder(&bag);
        assert!(bag.set_silently(TITLE, "Hello".to_owned()));
        assert!(!bag.set_silently(TITLE, "Hello".to_owned()));
        assert_eq!(bag.get(TITLE), "Hello");
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn type_mismatch_is_reported_by_try_get() {
        let bag = PropertyBag::new();
        bag.set(COUNT, 7);
        let as_string: Property<String> = Property::new("Count");
        let err = bag.try_get(as_string).unwrap_err();
        assert!(matches!(err, PropertyError::TypeMismatch { ref name, .. } if name == "Count"));
        // The lenient read falls back to the default.
        assert_eq!(bag.get(as_string), "");
    }

    #[test]
    fn write_with_new_type_replaces_value() {
        let bag = PropertyBag::new();
        bag.set(COUNT, 7);
        let as_string: Property<String> = Property::new("Count");
        assert!(bag.set(as_string, "seven".to_owned()));
        assert_eq!(bag.get(as_string), "seven");
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn name_based_access_validates_name() {
        let bag = PropertyBag::new();
        assert_eq!(bag.set_by_name("", 1_u8, true), Err(PropertyError::EmptyName));
        assert_eq!(bag.get_by_name::<u8>(""), Err(PropertyError::EmptyName));
        assert!(bag.is_empty());

        assert_eq!(bag.set_by_name("Level", 3_u8, false), Ok(true));
        assert_eq!(bag.get_by_name::<u8>("Level"), Ok(3));
        assert!(matches!(
            bag.get_by_name::<String>("Level"),
            Err(PropertyError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn explicit_fanout_skips_duplicates_and_empty_names() {
        let bag = PropertyBag::new();
        let (log, _sub) = recorder(&bag);
        bag.set_and_notify(TITLE, "A".to_owned(), &["Title", "", "Header", "Header"]);
        assert_eq!(*log.lock().unwrap(), ["Title", "Header"]);
    }

    #[test]
    fn unchanged_explicit_fanout_is_silent() {
        let bag = PropertyBag::new();
        bag.set_silently(TITLE, "A".to_owned());
        let (log, _sub) = recorder(&bag);
        assert!(!bag.set_and_notify(TITLE, "A".to_owned(), &["Header"]));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn notify_and_notify_all() {
        let bag = PropertyBag::new();
        bag.set_silently(TITLE, "A".to_owned());
        bag.set_silently(COUNT, 1);
        let (log, _sub) = recorder(&bag);

        bag.notify("Title").unwrap();
        assert_eq!(bag.notify(""), Err(PropertyError::EmptyName));
        bag.notify_all();

        let mut log = log.lock().unwrap().clone();
        assert_eq!(log.remove(0), "Title");
        log.sort();
        assert_eq!(log, ["Count", "Title"]);
    }

    #[test]
    fn notify_all_inside_batch_is_deferred() {
        let bag = PropertyBag::new();
        bag.set_silently(TITLE, "A".to_owned());
        let (log, _sub) = recorder(&bag);

        bag.begin_batch();
        bag.notify_all();
        bag.notify("Title").unwrap();
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(bag.pending_len(), 1);
        bag.end_batch(true);
        assert_eq!(*log.lock().unwrap(), ["Title"]);
    }

    #[test]
    fn unbalanced_end_batch_is_ignored() {
        let bag = PropertyBag::new();
        bag.end_batch(true);
        assert_eq!(bag.batch_depth(), 0);
        assert!(!bag.is_batching());
    }

    #[test]
    fn batch_scope_end_and_discard() {
        let bag = PropertyBag::new();
        let (log, _sub) = recorder(&bag);

        let scope = bag.batch();
        bag.set(COUNT, 1);
        scope.discard();
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(bag.get(COUNT), 1);

        let scope = bag.batch();
        bag.set(COUNT, 2);
        scope.end();
        assert_eq!(*log.lock().unwrap(), ["Count"]);
        assert!(!bag.is_batching());
    }

    #[test]
    fn batch_scope_discards_when_unwinding() {
        let bag = PropertyBag::new();
        let (log, _sub) = recorder(&bag);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _batch = bag.batch();
            bag.set(COUNT, 1);
            panic!("edit failed");
        }));

        assert!(outcome.is_err());
        assert!(log.lock().unwrap().is_empty());
        assert!(!bag.is_batching());
        assert_eq!(bag.pending_len(), 0);
        assert_eq!(bag.get(COUNT), 1);
    }

    #[test]
    fn listener_may_reenter_bag() {
        let bag = Arc::new(PropertyBag::new());
        let inner = Arc::clone(&bag);
        let _sub = bag.subscribe(move |name| {
            if name == "Count" {
                let count = inner.get(COUNT);
                inner.set(TITLE, format!("count is {count}"));
            }
        });

        bag.set(COUNT, 5);
        assert_eq!(bag.get(TITLE), "count is 5");
    }

    #[test]
    fn declared_dependencies_drive_set() {
        let deps = DependencyMap::builder()
            .depends_on("Summary", ["Title", "Count"])
            .build();
        let bag = PropertyBag::with_dependencies(Arc::new(deps));
        let (log, _sub) = recorder(&bag);

        bag.set(COUNT, 1);
        bag.set_silently(TITLE, "quiet".to_owned());
        assert_eq!(*log.lock().unwrap(), ["Count", "Summary"]);
        assert_eq!(bag.dependencies().map(DependencyMap::len), Some(2));
    }

    #[test]
    fn bag_debug() {
        let bag = PropertyBag::new();
        bag.set(COUNT, 1);
        let debug = format!("{bag:?}");
        assert!(debug.contains("PropertyBag"));
        assert!(debug.contains("len: 1"));
    }

    const _: () = {
        #[allow(dead_code, reason = "compile-time check only")]
        fn assert_send_sync<T: Send + Sync>() {}

        #[allow(dead_code, reason = "compile-time check only")]
        fn check() {
            assert_send_sync::<PropertyBag>();
        }
    };
}
