use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::identity::Identity;
use crate::record::{Capability, Record};

/// Records indexed under both identity kinds, with set algebra across
/// record sources.
///
/// The element type fixes what a set may hold: `IdentitySet<T>` only accepts
/// `T`, so mixing record sources is a compile error rather than a runtime
/// check. `IdentitySet<dyn Record>` is the heterogeneous form.
///
/// A record reachable through both maps is still one element; elements are
/// told apart by allocation (`Arc` pointer), never by value.
pub struct IdentitySet<R: ?Sized> {
    by_issuer_serial: IndexMap<Identity, Arc<R>>,
    by_subject_key_hash: IndexMap<Identity, Arc<R>>,
}

impl<R: ?Sized> Default for IdentitySet<R> {
    fn default() -> Self {
        Self {
            by_issuer_serial: IndexMap::new(),
            by_subject_key_hash: IndexMap::new(),
        }
    }
}

impl<R: ?Sized> Clone for IdentitySet<R> {
    fn clone(&self) -> Self {
        Self {
            by_issuer_serial: self.by_issuer_serial.clone(),
            by_subject_key_hash: self.by_subject_key_hash.clone(),
        }
    }
}

impl<R: ?Sized> fmt::Debug for IdentitySet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentitySet")
            .field("issuer_serial", &self.by_issuer_serial.keys().collect::<Vec<_>>())
            .field(
                "subject_key_hash",
                &self.by_subject_key_hash.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn address<R: ?Sized>(record: &Arc<R>) -> *const () {
    Arc::as_ptr(record) as *const ()
}

impl<R: Record + ?Sized> IdentitySet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = Arc<R>>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.add(record);
        }
        set
    }

    /// Index `record` under every identity its capability calls for.
    ///
    /// Identities that cannot be derived are skipped; a record that yields
    /// none at all is dropped. Neither case is an error. A later record with
    /// the same identity replaces the earlier one.
    pub fn add(&mut self, record: Arc<R>) {
        let capability = record.capability();
        let issuer_serial = match capability {
            Capability::IssuerSerial | Capability::Either => record.issuer_serial(),
            Capability::SubjectKeyHash => None,
        };
        let subject_key_hash = match capability {
            Capability::SubjectKeyHash | Capability::Either => record.subject_key_hash(),
            Capability::IssuerSerial => None,
        };

        if issuer_serial.is_none() && subject_key_hash.is_none() {
            warn!(%capability, "dropping record that produced no identity");
            return;
        }
        match issuer_serial {
            Some(id) => {
                self.by_issuer_serial.insert(id, Arc::clone(&record));
            }
            None if capability == Capability::Either => {
                debug!("record has no issuer/serial identity; indexing by subject/key hash only");
            }
            None => {}
        }
        match subject_key_hash {
            Some(id) => {
                self.by_subject_key_hash.insert(id, record);
            }
            None if capability == Capability::Either => {
                debug!("record has no subject/key hash identity; indexing by issuer/serial only");
            }
            None => {}
        }
    }

    /// Find the stored record matching `query`.
    ///
    /// Single-capability queries consult only their own map. `Either` queries
    /// try issuer/serial first, then subject/key hash, using whichever of
    /// their identities can be derived.
    pub fn get<P: Record + ?Sized>(&self, query: &P) -> Option<&Arc<R>> {
        let by_issuer_serial = || {
            query
                .issuer_serial()
                .and_then(|id| self.by_issuer_serial.get(&id))
        };
        let by_subject_key_hash = || {
            query
                .subject_key_hash()
                .and_then(|id| self.by_subject_key_hash.get(&id))
        };
        match query.capability() {
            Capability::IssuerSerial => by_issuer_serial(),
            Capability::SubjectKeyHash => by_subject_key_hash(),
            Capability::Either => by_issuer_serial().or_else(by_subject_key_hash),
        }
    }

    pub fn contains<P: Record + ?Sized>(&self, query: &P) -> bool {
        self.get(query).is_some()
    }

    /// Every distinct record exactly once. Each call starts a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<R>> + '_ {
        let mut seen = HashSet::new();
        self.by_issuer_serial
            .values()
            .chain(self.by_subject_key_hash.values())
            .filter(move |record| seen.insert(address(record)))
    }

    /// Number of distinct records.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.by_issuer_serial.is_empty() && self.by_subject_key_hash.is_empty()
    }

    pub fn issuer_serial_len(&self) -> usize {
        self.by_issuer_serial.len()
    }

    pub fn subject_key_hash_len(&self) -> usize {
        self.by_subject_key_hash.len()
    }

    pub fn union(&self, other: &IdentitySet<R>) -> IdentitySet<R> {
        let mut union = Self::new();
        for record in self.iter().chain(other.iter()) {
            union.add(Arc::clone(record));
        }
        union
    }

    /// Records of `self` that `other` does not contain.
    pub fn difference<O: Record + ?Sized>(&self, other: &IdentitySet<O>) -> IdentitySet<R> {
        let mut difference = Self::new();
        for record in self.iter() {
            if !other.contains(&**record) {
                difference.add(Arc::clone(record));
            }
        }
        difference
    }

    /// Records of `self` that `other` also contains.
    pub fn intersection<O: Record + ?Sized>(&self, other: &IdentitySet<O>) -> IdentitySet<R> {
        let mut intersection = Self::new();
        for record in self.iter() {
            if other.contains(&**record) {
                intersection.add(Arc::clone(record));
            }
        }
        intersection
    }
}

impl<R: Record + 'static> IdentitySet<R> {
    /// Widen into a heterogeneous set. Elements keep their allocations, so
    /// iteration uniqueness carries over.
    pub fn erase(&self) -> IdentitySet<dyn Record> {
        let widen = |(id, record): (&Identity, &Arc<R>)| {
            let record: Arc<dyn Record> = Arc::clone(record) as Arc<dyn Record>;
            (id.clone(), record)
        };
        IdentitySet {
            by_issuer_serial: self.by_issuer_serial.iter().map(widen).collect(),
            by_subject_key_hash: self.by_subject_key_hash.iter().map(widen).collect(),
        }
    }
}

impl<R: Record + ?Sized> FromIterator<Arc<R>> for IdentitySet<R> {
    fn from_iter<I: IntoIterator<Item = Arc<R>>>(iter: I) -> Self {
        Self::from_records(iter)
    }
}
