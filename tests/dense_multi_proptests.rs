// State-machine equivalence for DenseMultiMap against a
// HashMap<String, Vec<i32>> model. Invariants exercised:
// - Insertion always appends; per-key value order is insertion order.
// - `count`/`values` parity with the model list.
// - `erase_all` removes the whole list and reports its length; erasing
//   the first occurrence through a `find` cursor matches removing the
//   model list's head.
// - Flattened iteration yields exactly the model's (key, value) pairs.
// - Rebalances never lose, duplicate, or reorder entries.
// - `len` counts duplicates individually, `key_count` does not.

use dense_hashmap::DenseMultiMap;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    EraseAll(usize),
    EraseFirst(usize),
    Count(usize),
    Values(usize),
    Iterate,
    ForceRehash,
    ShrinkToFit,
    FastClear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            idx.clone().prop_map(OpI::EraseAll),
            idx.clone().prop_map(OpI::EraseFirst),
            idx.clone().prop_map(OpI::Count),
            idx.clone().prop_map(OpI::Values),
            Just(OpI::Iterate),
            Just(OpI::ForceRehash),
            Just(OpI::ShrinkToFit),
            Just(OpI::FastClear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_multimap_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: DenseMultiMap<String, i32> = DenseMultiMap::new();
        let mut model: HashMap<String, Vec<i32>> = HashMap::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = pool[i].clone();
                    sut.insert(k.clone(), v).expect("narrow width not exhausted");
                    model.entry(k).or_default().push(v);
                }
                OpI::EraseAll(i) => {
                    let k = &pool[i];
                    let removed = sut.erase_all(k.as_str());
                    let expected = model.remove(k).map_or(0, |vs| vs.len());
                    prop_assert_eq!(removed, expected);
                }
                OpI::EraseFirst(i) => {
                    let k = &pool[i];
                    let c = sut.find(k.as_str());
                    match model.get_mut(k) {
                        Some(vs) => {
                            let head = vs.remove(0);
                            if vs.is_empty() {
                                model.remove(k);
                            }
                            let got = sut.erase_at(&c).expect("find cursor valid");
                            prop_assert_eq!(got, head, "cursor from find denotes the first occurrence");
                        }
                        None => prop_assert!(c.is_end()),
                    }
                }
                OpI::Count(i) => {
                    let k = &pool[i];
                    let expected = model.get(k).map_or(0, Vec::len);
                    prop_assert_eq!(sut.count(k.as_str()), expected);
                }
                OpI::Values(i) => {
                    let k = &pool[i];
                    match model.get(k) {
                        Some(vs) => prop_assert_eq!(sut.values(k.as_str()), Some(&vs[..])),
                        None => prop_assert_eq!(sut.values(k.as_str()), None),
                    }
                }
                OpI::Iterate => {
                    let mut s_pairs: BTreeMap<String, Vec<i32>> = BTreeMap::new();
                    for (k, v) in sut.iter() {
                        s_pairs.entry(k.clone()).or_default().push(*v);
                    }
                    let m_pairs: BTreeMap<String, Vec<i32>> =
                        model.iter().map(|(k, vs)| (k.clone(), vs.clone())).collect();
                    prop_assert_eq!(s_pairs, m_pairs);
                }
                OpI::ForceRehash => sut.force_rehash(),
                OpI::ShrinkToFit => sut.shrink_to_fit(),
                OpI::FastClear => {
                    sut.fast_clear();
                    model.clear();
                }
            }

            // Post-conditions after each op
            prop_assert_eq!(sut.len(), model.values().map(Vec::len).sum::<usize>());
            prop_assert_eq!(sut.key_count(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
        }
    }
}
