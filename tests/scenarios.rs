//! The concrete boundary scenarios from the specification's testable
//! properties section, each against the public `OrderedIntSet` facade
//! with `w = 8` (universe `[0, 255]`, `min_bucket = 4`, `max_bucket = 16`).

use fast_trie_set::OrderedIntSet;

fn set8() -> OrderedIntSet {
    OrderedIntSet::new(8).unwrap()
}

#[test]
fn scenario_1_duplicate_insert() {
    let mut s = set8();
    s.insert(5u64).unwrap();
    s.insert(5u64).unwrap();
    s.insert(10u64).unwrap();
    assert_eq!(s.len(), 2);
    assert_eq!(s.min(), Some(5));
    assert_eq!(s.max(), Some(10));
    assert!(s.contains(5u64).unwrap());
    assert!(!s.contains(6u64).unwrap());
}

#[test]
fn scenario_2_chain_neighbors() {
    let mut s = set8();
    for k in 1u64..=5 {
        s.insert(k).unwrap();
    }
    assert_eq!(s.successor(2u64).unwrap(), Some(3));
    assert_eq!(s.predecessor(2u64).unwrap(), Some(1));
    assert_eq!(s.predecessor(1u64).unwrap(), None);
    assert_eq!(s.successor(5u64).unwrap(), None);
}

#[test]
fn scenario_3_universe_extremes() {
    let mut s = set8();
    s.insert(0u64).unwrap();
    s.insert(255u64).unwrap();
    assert_eq!(s.predecessor(255u64).unwrap(), Some(0));
    assert_eq!(s.successor(0u64).unwrap(), Some(255));
}

#[test]
fn scenario_4_seventeen_inserts_force_a_split() {
    let mut s = set8();
    for k in 0u64..=16 {
        s.insert(k).unwrap();
    }
    assert_eq!(s.len(), 17);
    for k in 0u64..=16 {
        assert!(s.contains(k).unwrap());
    }
    assert_eq!(s.min(), Some(0));
    assert_eq!(s.max(), Some(16));
}

#[test]
fn scenario_5_removal_forces_a_merge() {
    let mut s = set8();
    for k in 0u64..=16 {
        s.insert(k).unwrap();
    }
    for k in [16u64, 15, 14, 13, 12, 11, 10] {
        s.remove(k).unwrap();
    }
    assert_eq!(s.len(), 10);
    for k in 0u64..10 {
        assert!(s.contains(k).unwrap());
    }
    for k in 10u64..=16 {
        assert!(!s.contains(k).unwrap());
    }
    assert_eq!(s.min(), Some(0));
    assert_eq!(s.max(), Some(9));
}

#[test]
fn scenario_6_empty_trie_state_errors() {
    let s = set8();
    assert!(s.predecessor(0u64).is_err());
    assert!(s.successor(0u64).is_err());
}

#[test]
fn empty_set_remove_fails_with_state_error() {
    let mut s = set8();
    assert!(s.remove(0u64).is_err());
}

#[test]
fn out_of_range_insert_fails_with_argument_error_and_does_not_mutate() {
    let mut s = set8();
    s.insert(10u64).unwrap();
    assert!(s.insert(256u64).is_err());
    assert_eq!(s.len(), 1);
}

#[test]
fn remove_then_reinsert_same_key() {
    let mut s = set8();
    s.insert(5u64).unwrap();
    s.remove(5u64).unwrap();
    assert!(s.is_empty());
    s.insert(5u64).unwrap();
    assert!(s.contains(5u64).unwrap());
    assert_eq!(s.len(), 1);
}

#[test]
fn round_trip_insert_then_remove_everything_leaves_set_empty() {
    let mut s = set8();
    let values: Vec<u64> = (0u64..=255).collect();
    for &v in &values {
        s.insert(v).unwrap();
    }
    assert_eq!(s.len(), values.len());
    for &v in &values {
        s.remove(v).unwrap();
    }
    assert!(s.is_empty());
    assert_eq!(s.min(), None);
    assert_eq!(s.max(), None);
}

#[test]
fn split_at_exactly_max_bucket_plus_one() {
    // w = 8 -> max_bucket = 16; inserting 17 distinct keys into one
    // block forces exactly one split (scenario 4 restated at the
    // precise boundary named in the spec's boundary-behavior list).
    let mut s = set8();
    for k in 0u64..17 {
        s.insert(k).unwrap();
    }
    assert_eq!(s.len(), 17);
}

#[test]
fn merge_at_exactly_min_bucket_minus_one() {
    // w = 8 -> min_bucket = 4; shrink a bucket down to 3 elements and
    // confirm membership and ordering both survive the merge.
    let mut s = set8();
    for k in 0u64..8 {
        s.insert(k).unwrap();
    }
    for k in [7u64, 6, 5, 4] {
        s.remove(k).unwrap();
    }
    assert_eq!(s.len(), 4);
    for k in 0u64..4 {
        assert!(s.contains(k).unwrap());
    }
    assert_eq!(s.min(), Some(0));
    assert_eq!(s.max(), Some(3));
}

#[test]
fn byte_string_canonicalization_round_trips_through_public_api() {
    let mut s = OrderedIntSet::new(16).unwrap();
    s.insert([0x01u8, 0x02]).unwrap();
    assert!(s.contains(0x0102u64).unwrap());
    assert_eq!(s.predecessor(0x0200u64).unwrap(), Some(0x0102));
    assert!(s.insert([0x01u8, 0x02, 0x03]).is_err());
}

#[test]
fn default_set_uses_width_64() {
    let mut s = OrderedIntSet::default();
    assert_eq!(s.width(), 64);
    s.insert(u64::MAX).unwrap();
    assert!(s.contains(u64::MAX).unwrap());
}
