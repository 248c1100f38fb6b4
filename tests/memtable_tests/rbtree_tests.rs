//! Red-black tree Tests
//!
//! Tests verify:
//! - Red-black properties hold after every insert
//! - Overwrites keep size and shape
//! - In-order traversal is strictly increasing
//! - Custom comparators

use std::cmp::Ordering;
use std::collections::BTreeMap;

use keydb::memtable::{Color, RbTree};

// =============================================================================
// Helper Functions
// =============================================================================

/// Deterministic pseudo-random keys (64-bit LCG)
fn pseudo_random_keys(count: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            // Small key space so duplicates occur
            format!("key{}", (state >> 33) % 500).into_bytes()
        })
        .collect()
}

fn assert_strictly_increasing(tree: &RbTree) {
    let keys: Vec<&[u8]> = tree.iter().map(|(k, _)| k).collect();
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1], "{:?} !< {:?}", pair[0], pair[1]);
    }
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_tree_is_empty() {
    let tree = RbTree::new();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.root_color(), None);
    assert_eq!(tree.get(b"missing"), None);
    assert_eq!(tree.validate(), Ok(0));
}

#[test]
fn test_insert_and_get() {
    let mut tree = RbTree::new();

    assert_eq!(tree.insert(b"apple".to_vec(), b"sauce".to_vec()), None);

    assert_eq!(tree.get(b"apple"), Some(&b"sauce"[..]));
    assert!(tree.contains_key(b"apple"));
    assert_eq!(tree.get(b"apples"), None);
    assert_eq!(tree.root_color(), Some(Color::Black));
}

#[test]
fn test_overwrite_keeps_size() {
    let mut tree = RbTree::new();
    for key in [b"a", b"b", b"c", b"d"] {
        tree.insert(key.to_vec(), b"first".to_vec());
    }
    let height = tree.height();

    let previous = tree.insert(b"c".to_vec(), b"second".to_vec());

    assert_eq!(previous, Some(b"first".to_vec()));
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.height(), height);
    assert_eq!(tree.get(b"c"), Some(&b"second"[..]));
    tree.validate().unwrap();
}

// =============================================================================
// Invariant Tests
// =============================================================================

#[test]
fn test_invariants_after_every_ascending_insert() {
    let mut tree = RbTree::new();
    for i in 0..2000u32 {
        tree.insert(format!("{:08}", i).into_bytes(), i.to_le_bytes().to_vec());
        tree.validate()
            .unwrap_or_else(|e| panic!("after inserting {}: {}", i, e));
    }
    assert_eq!(tree.len(), 2000);
}

#[test]
fn test_invariants_after_every_descending_insert() {
    let mut tree = RbTree::new();
    for i in (0..2000u32).rev() {
        tree.insert(format!("{:08}", i).into_bytes(), Vec::new());
        tree.validate()
            .unwrap_or_else(|e| panic!("after inserting {}: {}", i, e));
    }
    assert_eq!(tree.len(), 2000);
}

#[test]
fn test_invariants_after_every_random_insert() {
    for seed in [1, 42, 0xDEADBEEF] {
        let mut tree = RbTree::new();
        let mut model = BTreeMap::new();

        for (i, key) in pseudo_random_keys(3000, seed).into_iter().enumerate() {
            let value = i.to_string().into_bytes();
            tree.insert(key.clone(), value.clone());
            model.insert(key, value);

            tree.validate()
                .unwrap_or_else(|e| panic!("seed {} step {}: {}", seed, i, e));
            assert_eq!(tree.len(), model.len());
        }

        for (key, value) in &model {
            assert_eq!(tree.get(key), Some(value.as_slice()));
        }
    }
}

#[test]
fn test_height_is_logarithmic() {
    let mut tree = RbTree::new();
    for i in 0..4095u32 {
        tree.insert(i.to_be_bytes().to_vec(), Vec::new());
    }
    // 2 * log2(n + 1) = 24
    assert!(tree.height() <= 24, "height {}", tree.height());
}

#[test]
fn test_black_height_is_reported() {
    let mut tree = RbTree::new();
    tree.insert(b"only".to_vec(), Vec::new());
    assert_eq!(tree.validate(), Ok(1));
}

// =============================================================================
// Traversal Tests
// =============================================================================

#[test]
fn test_iteration_is_sorted_without_duplicates() {
    let mut tree = RbTree::new();
    for key in pseudo_random_keys(1000, 7) {
        tree.insert(key, Vec::new());
    }

    assert_strictly_increasing(&tree);
    assert_eq!(tree.iter().count(), tree.len());
}

#[test]
fn test_to_entries_returns_every_pair() {
    let mut tree = RbTree::new();
    tree.insert(b"b".to_vec(), b"2".to_vec());
    tree.insert(b"a".to_vec(), b"1".to_vec());
    tree.insert(b"c".to_vec(), b"3".to_vec());
    tree.insert(b"a".to_vec(), b"4".to_vec());

    let entries: Vec<(Vec<u8>, Vec<u8>)> = tree
        .to_entries()
        .into_iter()
        .map(|e| (e.key, e.value))
        .collect();

    assert_eq!(
        entries,
        vec![
            (b"a".to_vec(), b"4".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
            (b"c".to_vec(), b"3".to_vec()),
        ]
    );
}

#[test]
fn test_binary_keys_order_bytewise() {
    let mut tree = RbTree::new();
    for key in [&b"\xff"[..], b"\x00", b"\x00\x00", b"\x7f", b""] {
        tree.insert(key.to_vec(), Vec::new());
    }

    let keys: Vec<&[u8]> = tree.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![&b""[..], b"\x00", b"\x00\x00", b"\x7f", b"\xff"]);
}

// =============================================================================
// Comparator Tests
// =============================================================================

fn reverse(a: &[u8], b: &[u8]) -> Ordering {
    b.cmp(a)
}

#[test]
fn test_custom_comparator_orders_traversal() {
    let mut tree = RbTree::with_comparator(reverse);
    for key in [b"a", b"c", b"b", b"d"] {
        tree.insert(key.to_vec(), Vec::new());
        tree.validate().unwrap();
    }

    let keys: Vec<&[u8]> = tree.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![&b"d"[..], b"c", b"b", b"a"]);
    assert!(tree.contains_key(b"c"));
}
