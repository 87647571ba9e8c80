use std::sync::Arc;

use revsync_identity::{Capability, Identity, IdentityKind, IdentitySet, Record};

#[derive(Debug)]
struct Entry {
    capability: Capability,
    issuer_serial: Option<(&'static str, &'static str)>,
    subject_key_hash: Option<(&'static str, &'static str)>,
}

impl Entry {
    fn issuer_serial(name: &'static str, serial: &'static str) -> Arc<Self> {
        Arc::new(Self {
            capability: Capability::IssuerSerial,
            issuer_serial: Some((name, serial)),
            subject_key_hash: None,
        })
    }

    fn subject_key_hash(name: &'static str, hash: &'static str) -> Arc<Self> {
        Arc::new(Self {
            capability: Capability::SubjectKeyHash,
            issuer_serial: None,
            subject_key_hash: Some((name, hash)),
        })
    }

    fn either(
        issuer_serial: Option<(&'static str, &'static str)>,
        subject_key_hash: Option<(&'static str, &'static str)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            capability: Capability::Either,
            issuer_serial,
            subject_key_hash,
        })
    }
}

impl Record for Entry {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn issuer_serial(&self) -> Option<Identity> {
        self.issuer_serial
            .map(|(name, serial)| Identity::new(IdentityKind::IssuerSerial, name, serial.as_bytes()))
    }

    fn subject_key_hash(&self) -> Option<Identity> {
        self.subject_key_hash
            .map(|(name, hash)| Identity::new(IdentityKind::SubjectKeyHash, name, hash.as_bytes()))
    }
}

/// A record from a different source, used to query sets across types.
struct Foreign(Identity);

impl Record for Foreign {
    fn capability(&self) -> Capability {
        match self.0.kind() {
            IdentityKind::IssuerSerial => Capability::IssuerSerial,
            IdentityKind::SubjectKeyHash => Capability::SubjectKeyHash,
        }
    }

    fn issuer_serial(&self) -> Option<Identity> {
        (self.0.kind() == IdentityKind::IssuerSerial).then(|| self.0.clone())
    }

    fn subject_key_hash(&self) -> Option<Identity> {
        (self.0.kind() == IdentityKind::SubjectKeyHash).then(|| self.0.clone())
    }
}

#[test]
fn intersection_keeps_only_shared_issuer_serials() {
    let a = IdentitySet::from_records([Entry::issuer_serial("hi", ""), Entry::issuer_serial("", "hi")]);
    let b = IdentitySet::from_records([
        Entry::issuer_serial("hi", ""),
        Entry::issuer_serial("hello", ""),
    ]);

    let both = a.intersection(&b);
    assert_eq!(both.issuer_serial_len(), 1);
    assert_eq!(both.subject_key_hash_len(), 0);
    let only = both.iter().next().unwrap();
    assert_eq!(only.issuer_serial.unwrap().0, "hi");
}

#[test]
fn union_difference_and_intersection_follow_membership() {
    let a = IdentitySet::from_records([
        Entry::issuer_serial("a", "1"),
        Entry::issuer_serial("shared", "1"),
        Entry::subject_key_hash("a", "k"),
    ]);
    let b = IdentitySet::from_records([
        Entry::issuer_serial("shared", "1"),
        Entry::issuer_serial("b", "1"),
    ]);

    let union = a.union(&b);
    let difference = a.difference(&b);
    let intersection = a.intersection(&b);

    let universe = [
        Entry::issuer_serial("a", "1"),
        Entry::issuer_serial("b", "1"),
        Entry::issuer_serial("shared", "1"),
        Entry::subject_key_hash("a", "k"),
        Entry::subject_key_hash("missing", "k"),
    ];
    for x in &universe {
        let (in_a, in_b) = (a.contains(&**x), b.contains(&**x));
        assert_eq!(union.contains(&**x), in_a || in_b, "union {x:?}");
        assert_eq!(difference.contains(&**x), in_a && !in_b, "difference {x:?}");
        assert_eq!(intersection.contains(&**x), in_a && in_b, "intersection {x:?}");
    }
    assert_eq!(union.len(), 4);
    assert_eq!(difference.len(), 2);
    assert_eq!(intersection.len(), 1);
}

#[test]
fn iteration_reports_each_record_once() {
    let set = IdentitySet::from_records([
        Entry::issuer_serial("issuer", "1"),
        Entry::subject_key_hash("subject", "k"),
        Entry::either(Some(("issuer", "2")), Some(("subject", "j"))),
    ]);
    assert_eq!(set.issuer_serial_len(), 2);
    assert_eq!(set.subject_key_hash_len(), 2);
    assert_eq!(set.iter().count(), 3);
    // Passes are independent.
    assert_eq!(set.iter().count(), 3);
    assert_eq!(set.len(), 3);
}

#[test]
fn structurally_equal_records_are_distinct_elements() {
    let set = IdentitySet::from_records([
        Entry::issuer_serial("issuer", "1"),
        Entry::subject_key_hash("issuer", "1"),
    ]);
    assert_eq!(set.len(), 2);
}

#[test]
fn either_records_degrade_to_the_derivable_identity() {
    let set = IdentitySet::from_records([
        Entry::either(Some(("issuer", "1")), None),
        Entry::either(None, Some(("subject", "k"))),
        Entry::either(None, None),
    ]);
    assert_eq!(set.issuer_serial_len(), 1);
    assert_eq!(set.subject_key_hash_len(), 1);
    assert_eq!(set.len(), 2);

    // An Either query with only a key hash still finds its match.
    let query = Entry::either(None, Some(("subject", "k")));
    assert!(set.contains(&*query));
    let query = Entry::either(Some(("nobody", "0")), Some(("subject", "k")));
    assert!(set.contains(&*query));
}

#[test]
fn single_capability_queries_consult_only_their_map() {
    let set = IdentitySet::from_records([Entry::either(Some(("n", "1")), Some(("n", "1")))]);
    let by_serial = Foreign(Identity::new(IdentityKind::IssuerSerial, "n", b"1"));
    let by_hash = Foreign(Identity::new(IdentityKind::SubjectKeyHash, "n", b"1"));
    assert!(set.contains(&by_serial));
    assert!(set.contains(&by_hash));

    let serial_only = IdentitySet::from_records([Entry::issuer_serial("n", "1")]);
    assert!(serial_only.contains(&by_serial));
    assert!(!serial_only.contains(&by_hash));
}

#[test]
fn last_write_wins_for_a_key() {
    let first = Entry::issuer_serial("n", "1");
    let second = Entry::issuer_serial("n", "1");
    let set = IdentitySet::from_records([Arc::clone(&first), Arc::clone(&second)]);
    assert_eq!(set.len(), 1);
    assert!(Arc::ptr_eq(set.iter().next().unwrap(), &second));
}

#[test]
fn erased_sets_mix_record_sources() {
    let entries = IdentitySet::from_records([Entry::issuer_serial("n", "1")]);
    let mut mixed = entries.erase();
    mixed.add(Arc::new(Foreign(Identity::new(IdentityKind::SubjectKeyHash, "s", b"k"))));
    assert_eq!(mixed.len(), 2);
    assert!(mixed.contains(&*Entry::issuer_serial("n", "1")));
    assert_eq!(entries.difference(&mixed).len(), 0);
}

#[test]
fn empty_operands_give_empty_results() {
    let empty: IdentitySet<Entry> = IdentitySet::new();
    let other: IdentitySet<Entry> = IdentitySet::new();
    assert!(empty.is_empty());
    assert!(empty.union(&other).is_empty());
    assert!(empty.difference(&other).is_empty());
    assert!(empty.intersection(&other).is_empty());

    let c = IdentitySet::from_records([Entry::issuer_serial("c", "1")]);
    assert_eq!(c.union(&empty).len(), 1);
    assert_eq!(empty.union(&c).len(), 1);
    assert_eq!(c.difference(&empty).len(), 1);
    assert_eq!(empty.difference(&c).len(), 0);
    assert_eq!(c.intersection(&empty).len(), 0);
    assert_eq!(empty.intersection(&c).len(), 0);
}
