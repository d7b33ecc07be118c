//! Property tests for container change streams.
//!
//! For any sequence of operations:
//!
//! 1. The container matches a plain model driven by the same operations.
//! 2. Replaying the after-changes onto a mirror rebuilds the container.
//! 3. Before- and after-observers see the same changes in the same order.
//! 4. Each operation fires exactly one change, or none when it is a no-op
//!    write or a failed lookup.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use observables_collections::{DictChange, DictOperation, ListChange, ObservableDict, ObservableList};
use observables_core::Observed;
use proptest::prelude::*;

// ── List ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum ListOp {
    Append(i32),
    Insert(usize, i32),
    Set(usize, i32),
    Pop,
    PopAt(usize),
    Remove(i32),
    Extend(Vec<i32>),
    Clear,
    Reverse,
    Sort(bool),
}

fn list_op_strategy() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        4 => (-5i32..5).prop_map(ListOp::Append),
        2 => (0usize..12, -5i32..5).prop_map(|(i, v)| ListOp::Insert(i, v)),
        2 => (0usize..12, -5i32..5).prop_map(|(i, v)| ListOp::Set(i, v)),
        1 => Just(ListOp::Pop),
        1 => (0usize..12).prop_map(ListOp::PopAt),
        1 => (-5i32..5).prop_map(ListOp::Remove),
        1 => proptest::collection::vec(-5i32..5, 0..4).prop_map(ListOp::Extend),
        1 => Just(ListOp::Clear),
        1 => Just(ListOp::Reverse),
        1 => any::<bool>().prop_map(ListOp::Sort),
    ]
}

/// Apply `op` to both the list and the model. Returns the number of changes
/// the list should have fired.
fn apply_list_op(list: &ObservableList<i32>, model: &mut Vec<i32>, op: &ListOp) -> usize {
    match op {
        ListOp::Append(v) => {
            list.append(*v).unwrap();
            model.push(*v);
        }
        ListOp::Insert(i, v) => {
            list.insert(*i, *v).unwrap();
            let at = (*i).min(model.len());
            model.insert(at, *v);
        }
        ListOp::Set(i, v) => {
            let result = list.set(*i, *v);
            assert_eq!(result.is_ok(), *i < model.len());
            if *i >= model.len() || model[*i] == *v {
                return 0;
            }
            model[*i] = *v;
        }
        ListOp::Pop => {
            let result = list.pop().ok();
            let expected = model.pop();
            assert_eq!(result, expected);
            return usize::from(expected.is_some());
        }
        ListOp::PopAt(i) => {
            let result = list.pop_at(*i).ok();
            let expected = (*i < model.len()).then(|| model.remove(*i));
            assert_eq!(result, expected);
            return usize::from(expected.is_some());
        }
        ListOp::Remove(v) => {
            let result = list.remove(v);
            match model.iter().position(|item| item == v) {
                Some(position) => {
                    assert!(result.is_ok());
                    model.remove(position);
                }
                None => {
                    assert!(result.is_err());
                    return 0;
                }
            }
        }
        ListOp::Extend(values) => {
            list.extend(values.clone()).unwrap();
            model.extend(values.iter().copied());
        }
        ListOp::Clear => {
            list.clear().unwrap();
            model.clear();
        }
        ListOp::Reverse => {
            list.reverse().unwrap();
            model.reverse();
        }
        ListOp::Sort(reverse) => {
            list.sort(*reverse).unwrap();
            model.sort();
            if *reverse {
                model.reverse();
            }
        }
    }
    1
}

fn replay_list_change(mirror: &mut Vec<i32>, change: &ListChange<i32>) {
    match change {
        ListChange::Append { value, .. } => mirror.push(*value),
        ListChange::Insert { index, value, .. } => {
            let at = (*index).min(mirror.len());
            mirror.insert(at, *value);
        }
        ListChange::Modify {
            index, new_value, ..
        } => mirror[*index] = *new_value,
        ListChange::Delete { index, .. } => {
            mirror.remove(*index);
        }
        ListChange::Clear => mirror.clear(),
        ListChange::Extend { values, .. } => mirror.extend(values.iter().copied()),
        ListChange::Reverse => mirror.reverse(),
        ListChange::Sort { key, reverse } => {
            assert!(key.is_none());
            if *reverse {
                mirror.sort_by(|a, b| b.cmp(a));
            } else {
                mirror.sort();
            }
        }
    }
}

proptest! {
    #[test]
    fn list_matches_model(ops in proptest::collection::vec(list_op_strategy(), 0..40)) {
        let list = ObservableList::new();
        let mut model = Vec::new();
        for op in &ops {
            apply_list_op(&list, &mut model, op);
        }
        prop_assert_eq!(list.to_vec(), model);
    }

    #[test]
    fn list_changes_replay(ops in proptest::collection::vec(list_op_strategy(), 0..40)) {
        let list = ObservableList::new();
        let mirror = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&mirror);
        list.observe_after(move |_, change| {
            replay_list_change(&mut sink.borrow_mut(), change);
            Ok(())
        });

        let mut model = Vec::new();
        for op in &ops {
            apply_list_op(&list, &mut model, op);
        }
        prop_assert_eq!(list.to_vec(), mirror.borrow().clone());
    }

    #[test]
    fn list_phases_agree(ops in proptest::collection::vec(list_op_strategy(), 0..40)) {
        let list = ObservableList::new();
        let before = Rc::new(RefCell::new(Vec::new()));
        let after = Rc::new(RefCell::new(Vec::new()));
        let before_sink = Rc::clone(&before);
        list.observe_before(move |_, change: &ListChange<i32>| {
            before_sink.borrow_mut().push(change.clone());
            Ok(())
        });
        let after_sink = Rc::clone(&after);
        list.observe_after(move |_, change: &ListChange<i32>| {
            after_sink.borrow_mut().push(change.clone());
            Ok(())
        });

        let mut model = Vec::new();
        for op in &ops {
            apply_list_op(&list, &mut model, op);
        }
        prop_assert_eq!(before.borrow().clone(), after.borrow().clone());
    }

    #[test]
    fn list_fires_expected_events(ops in proptest::collection::vec(list_op_strategy(), 0..40)) {
        let list = ObservableList::new();
        let fired = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&fired);
        list.observe_after(move |_, _: &ListChange<i32>| {
            *sink.borrow_mut() += 1;
            Ok(())
        });

        let mut model = Vec::new();
        for op in &ops {
            let before = *fired.borrow();
            let expected = apply_list_op(&list, &mut model, op);
            prop_assert_eq!(*fired.borrow() - before, expected, "op {:?}", op);
        }
    }
}

// ── Dict ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum DictOp {
    Insert(u8, i32),
    Remove(u8),
    PopItem,
    Clear,
}

fn dict_op_strategy() -> impl Strategy<Value = DictOp> {
    prop_oneof![
        5 => (0u8..6, -3i32..3).prop_map(|(k, v)| DictOp::Insert(k, v)),
        2 => (0u8..6).prop_map(DictOp::Remove),
        1 => Just(DictOp::PopItem),
        1 => Just(DictOp::Clear),
    ]
}

fn replay_dict_change(mirror: &mut IndexMap<u8, i32>, change: &DictChange<u8, i32>) {
    match change.operation {
        DictOperation::Create | DictOperation::Modify => {
            let key = change.key.unwrap();
            mirror.insert(key, change.new_value.unwrap());
        }
        DictOperation::Delete => {
            mirror.shift_remove(&change.key.unwrap());
        }
        DictOperation::Clear => mirror.clear(),
    }
}

proptest! {
    #[test]
    fn dict_matches_model_and_replays(ops in proptest::collection::vec(dict_op_strategy(), 0..40)) {
        let dict = ObservableDict::new();
        let mirror = Rc::new(RefCell::new(IndexMap::new()));
        let fired = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&mirror);
        let counter = Rc::clone(&fired);
        dict.observe_after(move |_, change| {
            replay_dict_change(&mut sink.borrow_mut(), change);
            *counter.borrow_mut() += 1;
            Ok(())
        });

        let mut model: IndexMap<u8, i32> = IndexMap::new();
        for op in &ops {
            let before = *fired.borrow();
            let expected = match op {
                DictOp::Insert(k, v) => {
                    let unchanged = model.get(k) == Some(v);
                    let previous = dict.insert(*k, *v).unwrap();
                    prop_assert_eq!(previous, model.insert(*k, *v));
                    usize::from(!unchanged)
                }
                DictOp::Remove(k) => {
                    let removed = dict.remove(k).ok();
                    let expected = model.shift_remove(k);
                    prop_assert_eq!(removed, expected);
                    usize::from(expected.is_some())
                }
                DictOp::PopItem => {
                    let popped = dict.popitem().ok();
                    let expected = model.pop();
                    prop_assert_eq!(popped, expected);
                    usize::from(expected.is_some())
                }
                DictOp::Clear => {
                    dict.clear().unwrap();
                    model.clear();
                    1
                }
            };
            prop_assert_eq!(*fired.borrow() - before, expected, "op {:?}", op);
        }

        prop_assert_eq!(dict.items(), model.clone().into_iter().collect::<Vec<_>>());
        prop_assert_eq!(&*mirror.borrow(), &model);
    }
}
