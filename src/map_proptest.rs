#![cfg(test)]

// Property tests for DenseMap kept inside the crate so they do not require
// feature gates to access internal modules.

use crate::bucket::MAX_LOAD;
use crate::digest::DigestState;
use crate::map::DenseMap;
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::rc::Rc;

// Key newtype with Borrow<str> to exercise borrowed lookup through the
// Equivalent blanket impl.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    GetOrInsert(usize, i32),
    Erase(usize),
    EraseAt(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    ForceRehash,
    ShrinkToFit,
    FastClear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::GetOrInsert(i, v)),
            idx.clone().prop_map(OpI::Erase),
            idx.clone().prop_map(OpI::EraseAt),
            idx.clone().prop_map(OpI::Find),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            Just(OpI::Iterate),
            Just(OpI::ForceRehash),
            Just(OpI::ShrinkToFit),
            Just(OpI::FastClear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap. Invariants
// exercised across random operation sequences:
// - Try-emplace semantics: inserting a present key keeps the stored value
//   and reports not-fresh; get_or_insert_with runs its closure exactly once
//   and only on a miss.
// - `find`/`contains_key` parity, including borrowed `&str` lookup; a hit
//   cursor dereferences to the model's value.
// - `erase` returns the removed count; cursor-based erase returns the owned
//   pair matching the model.
// - `iter` yields each live entry exactly once with the model's pairs.
// - Rebalances (forced, shrink, clear) never lose or duplicate entries.
// - `len`/`is_empty` parity and the load bound after every op.
fn run_ops<S: BuildHasher>(
    mut sut: DenseMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();

    let closure_calls = Rc::new(Cell::new(0));
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let (c, fresh) = sut.insert(k.clone(), v).expect("narrow width not exhausted");
                prop_assert_eq!(fresh, !already, "fresh exactly when key was absent");
                if fresh {
                    model.insert(k, v);
                } else {
                    // Try-emplace: the stored value is untouched.
                    let (_, stored) = sut.get_at(&c).expect("hit cursor must dereference");
                    prop_assert_eq!(stored, &model[&k]);
                }
            }
            OpI::GetOrInsert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let counter = closure_calls.clone();
                let before = counter.get();
                let stored = *sut
                    .get_or_insert_with(k.clone(), || {
                        counter.set(counter.get() + 1);
                        v
                    })
                    .expect("narrow width not exhausted");
                let expected = before + usize::from(!already);
                prop_assert_eq!(closure_calls.get(), expected, "closure runs only on a miss");
                if !already {
                    model.insert(k.clone(), v);
                }
                prop_assert_eq!(stored, model[&k]);
            }
            OpI::Erase(i) => {
                let k = key_from(&pool, i);
                let removed = sut.erase(&k);
                let model_removed = model.remove(&k).is_some();
                prop_assert_eq!(removed, usize::from(model_removed));
            }
            OpI::EraseAt(i) => {
                let k = key_from(&pool, i);
                let c = sut.find(&k);
                if c.is_end() {
                    prop_assert!(!model.contains_key(&k));
                } else {
                    let (kk, vv) = sut.erase_at(&c).expect("fresh cursor valid for erase");
                    prop_assert!(kk == k);
                    let mv = model.remove(&kk).expect("present in model");
                    prop_assert_eq!(vv, mv);
                }
            }
            OpI::Find(i) => {
                let k = key_from(&pool, i);
                let c = sut.find(&k);
                let present = model.contains_key(&k);
                prop_assert_eq!(!c.is_end(), present);
                if !c.is_end() {
                    let (kk, vv) = sut.get_at(&c).expect("hit cursor must dereference");
                    prop_assert!(kk == &k);
                    prop_assert_eq!(vv, &model[&k]);
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(vr), Some(mv)) => {
                        *vr = vr.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "get_mut parity with the model"),
                }
            }
            OpI::Iterate => {
                let s_pairs: BTreeMap<Key, i32> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m_pairs: BTreeMap<Key, i32> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s_pairs, m_pairs);
            }
            OpI::ForceRehash => {
                sut.force_rehash();
            }
            OpI::ShrinkToFit => {
                sut.shrink_to_fit();
            }
            OpI::FastClear => {
                sut.fast_clear();
                model.clear();
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        if sut.bucket_count() > 0 {
            prop_assert!(
                (sut.len() as f64) <= MAX_LOAD * sut.bucket_count() as f64,
                "load bound violated: {} entries in {} buckets",
                sut.len(),
                sut.bucket_count()
            );
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: DenseMap<Key, i32, DigestState> = DenseMap::new();
        run_ops(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key lands in the same
// home bucket with the same fingerprint and fragment, so hits and misses
// are decided purely by key equality at the end of the filter chain, and
// deletion exercises maximal backward-shift runs.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: DenseMap<Key, i32, ConstBuildHasher> = DenseMap::with_hasher(ConstBuildHasher);
        run_ops(sut, &pool, ops)?;
    }
}
