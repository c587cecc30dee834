use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

/// Structural validation used after every operation.
fn validate_tree<V>(t: &Tree<i16, V>) {
    let issues = t.verify_integrity();
    assert!(issues.is_empty(), "invalid tree: {issues:?}");

    // Height never exceeds the bound the traversal stacks are sized from.
    assert!(
        t.height() <= height_bound(t.len()),
        "height {} over bound {} for {} nodes",
        t.height(),
        height_bound(t.len()),
        t.len()
    );
}

fn entries<V: Copy>(t: &Tree<i16, V>, order: Order) -> Vec<(i16, V)> {
    let mut out = Vec::with_capacity(t.len());
    t.enumerate(order, |k, v| {
        out.push((*k, *v));
        true
    });
    out
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Insert(#[proptest(strategy = "-300i16..300")] i16, u32),
    #[proptest(weight = 3)]
    Erase(#[proptest(strategy = "-300i16..300")] i16),
    #[proptest(weight = 1)]
    Contains(#[proptest(strategy = "-300i16..300")] i16),
    #[proptest(weight = 1)]
    Range(#[proptest(strategy = "-300i16..300")] i16, bool),
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_with_btreemap(ops in prop::collection::vec(any::<Op>(), 0..=600)) {
        let mut t: AvlMap<i16, u32> = AvlMap::new();
        let mut m: BTreeMap<i16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let added = t.insert(key, value);
                    prop_assert_eq!(added, !m.contains_key(&key));
                    m.entry(key).or_insert(value);
                }
                Op::Erase(key) => {
                    let expected = usize::from(m.remove(&key).is_some());
                    prop_assert_eq!(t.erase(&key), expected);
                }
                Op::Contains(key) => {
                    prop_assert_eq!(t.contains(&key), m.contains_key(&key));
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
                Op::Range(key, ascending) => {
                    let (order, expected): (Order, Vec<(i16, u32)>) = if ascending {
                        (Order::Ascending, m.range(key..).take(8).map(|(k, v)| (*k, *v)).collect())
                    } else {
                        (Order::Descending, m.range(..=key).rev().take(8).map(|(k, v)| (*k, *v)).collect())
                    };
                    let mut got = Vec::new();
                    t.enumerate_from(&key, order, |k, v| {
                        got.push((*k, *v));
                        got.len() < 8
                    });
                    prop_assert_eq!(got, expected);
                }
            }

            prop_assert_eq!(t.len(), m.len());
            validate_tree(&t);
        }

        let asc: Vec<(i16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        let desc: Vec<(i16, u32)> = asc.iter().rev().copied().collect();
        prop_assert_eq!(entries(&t, Order::Ascending), asc);
        prop_assert_eq!(entries(&t, Order::Descending), desc);
    }

    #[test]
    fn prop_insert_then_erase_all(keys in prop::collection::hash_set(any::<i16>(), 0..400)) {
        let mut t: AvlSet<i16> = AvlSet::new();
        for &k in &keys {
            prop_assert!(t.insert(k, ()));
            prop_assert!(!t.insert(k, ()));
        }
        prop_assert_eq!(t.len(), keys.len());
        validate_tree(&t);

        let mut sorted: Vec<i16> = keys.iter().copied().collect();
        sorted.sort_unstable();
        prop_assert_eq!(entries(&t, Order::Ascending).into_iter().map(|(k, _)| k).collect::<Vec<_>>(), sorted);

        for &k in &keys {
            prop_assert_eq!(t.erase(&k), 1);
            prop_assert_eq!(t.erase(&k), 0);
            validate_tree(&t);
        }
        prop_assert!(t.is_empty());
        prop_assert!(t.raw.root().is_none());
        prop_assert!(entries(&t, Order::Ascending).is_empty());
    }

    #[test]
    fn prop_clear_then_reuse(keys in prop::collection::vec(any::<i16>(), 0..300)) {
        let mut t: AvlSet<i16> = AvlSet::new();
        for &k in &keys {
            t.insert(k, ());
        }
        t.clear();
        prop_assert_eq!(t.len(), 0);
        prop_assert!(t.raw.root().is_none());
        for &k in keys.iter().rev() {
            t.insert(k, ());
        }
        validate_tree(&t);
    }
}

/// Calls `f` with every ordering of `items` (Heap's algorithm, iterative).
pub(crate) fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(&[T])) {
    let mut perm = items.to_vec();
    let mut counters = vec![0usize; perm.len()];
    f(&perm);
    let mut i = 0;
    while i < perm.len() {
        if counters[i] < i {
            let j = if i % 2 == 0 { 0 } else { counters[i] };
            perm.swap(j, i);
            f(&perm);
            counters[i] += 1;
            i = 0;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<i16> = vec![10, 20, 30, 40, 50, 60, 70];

    for_each_permutation(&keys, |perm| {
        let mut t: AvlMap<i16, u32> = AvlMap::new();
        for (i, &k) in perm.iter().enumerate() {
            assert!(t.insert(k, i as u32));
            validate_tree(&t);
        }
        let got: Vec<i16> = entries(&t, Order::Ascending).into_iter().map(|(k, _)| k).collect();
        assert_eq!(got, keys);
    });
}

#[test]
fn exhaustive_erase_order_small_set() {
    let keys: Vec<i16> = vec![1, 2, 3, 4, 5, 6, 7];

    // Build from a few fixed shapes, then erase in every order.
    for build in [keys.clone(), keys.iter().rev().copied().collect(), vec![4, 2, 6, 1, 3, 5, 7]] {
        let mut base: AvlSet<i16> = AvlSet::new();
        for &k in &build {
            base.insert(k, ());
        }

        for_each_permutation(&keys, |perm| {
            let mut t = base.clone();
            let mut remaining = keys.len();
            for k in perm {
                assert_eq!(t.erase(k), 1);
                remaining -= 1;
                assert_eq!(t.len(), remaining);
                validate_tree(&t);
            }
            assert!(t.raw.root().is_none());
        });
    }
}
