//! Evaluation tests on long lists.
//!
//! A list match is unrolled one element per case application, so these
//! exercise evaluation depth far beyond what the call stack could hold.

use test_log::test;

use zen_rs::error::Result;
use zen_rs::eval::Assignment;
use zen_rs::reference::ExprRef;
use zen_rs::types::{IntType, Type};
use zen_rs::value::{IntValue, Value};
use zen_rs::zen::Zen;

const LEN: u64 = 100_000;

fn length(zen: &Zen, list: ExprRef) -> Result<ExprRef> {
    zen.list_match(list, zen.int(0u64), |z, _, tail| z.sum(z.int(1u64), length(z, tail)?))
}

fn total(zen: &Zen, list: ExprRef) -> Result<ExprRef> {
    zen.list_match(list, zen.int(0u64), |z, head, tail| z.sum(head, total(z, tail)?))
}

// ─── Cons lists ────────────────────────────────────────────────────────────────

#[test]
fn length_of_deep_cons_list() {
    let zen = Zen::default();
    let x = zen.arbitrary("x", Type::Bool);
    let items = vec![x; LEN as usize];
    let list = zen.list(Type::Bool, &items).unwrap();
    let e = length(&zen, list).unwrap();

    let mut assignment = Assignment::new();
    assignment.set(x, true);
    assert_eq!(zen.evaluate(e, &assignment).unwrap(), Value::Int(IntValue::U64(LEN)));
}

#[test]
fn total_of_deep_cons_list() {
    let zen = Zen::default();
    let items: Vec<ExprRef> = (0..LEN).map(|i| zen.int(i)).collect();
    let list = zen.list(Type::Int(IntType::U64), &items).unwrap();
    let e = total(&zen, list).unwrap();
    let expected = LEN * (LEN - 1) / 2;
    assert_eq!(zen.evaluate(e, &Assignment::new()).unwrap(), Value::Int(IntValue::U64(expected)));
}

#[test]
fn deep_cons_list_value() {
    let zen = Zen::default();
    let items: Vec<ExprRef> = (0..LEN).map(|i| zen.int(i)).collect();
    let list = zen.list(Type::Int(IntType::U64), &items).unwrap();
    match zen.evaluate(list, &Assignment::new()).unwrap() {
        Value::List(elem, values) => {
            assert_eq!(elem, Type::Int(IntType::U64));
            assert_eq!(values.len(), LEN as usize);
            assert_eq!(values[0], Value::Int(IntValue::U64(0)));
            assert_eq!(values[LEN as usize - 1], Value::Int(IntValue::U64(LEN - 1)));
        }
        other => panic!("expected a list, got {:?}", other),
    }
}

// ─── Concrete lists ────────────────────────────────────────────────────────────

#[test]
fn length_of_deep_assigned_list() {
    let zen = Zen::default();
    let elem = Type::Int(IntType::U64);
    let l = zen.arbitrary("l", Type::list(elem.clone()));
    let e = length(&zen, l).unwrap();

    let mut assignment = Assignment::new();
    let values: Vec<Value> = (0..LEN).map(|i| Value::Int(IntValue::U64(i % 7))).collect();
    assignment.set(l, Value::List(elem, values));
    assert_eq!(zen.evaluate(e, &assignment).unwrap(), Value::Int(IntValue::U64(LEN)));
}

#[test]
fn assigned_list_is_lifted_once() {
    let zen = Zen::default();
    let elem = Type::Int(IntType::U64);
    let l = zen.arbitrary("l", Type::list(elem.clone()));
    let e = total(&zen, l).unwrap();

    let mut assignment = Assignment::new();
    let n = 1_000u64;
    assignment.set(l, Value::List(elem, (0..n).map(|i| Value::Int(IntValue::U64(i))).collect()));

    let before = zen.num_nodes();
    assert_eq!(zen.evaluate(e, &assignment).unwrap(), Value::Int(IntValue::U64(n * (n - 1) / 2)));
    // Each element adds a cons cell and a constant, plus a match and a sum.
    assert!(zen.num_nodes() - before < 6 * n as usize, "{} new nodes", zen.num_nodes() - before);
}

#[test]
fn simplified_and_evaluated_totals_agree() {
    let zen = Zen::default();
    let items: Vec<ExprRef> = (0..10_000u64).map(|i| zen.int(i)).collect();
    let list = zen.list(Type::Int(IntType::U64), &items).unwrap();
    let e = total(&zen, list).unwrap();
    let simplified = zen.simplify(e).unwrap();
    let assignment = Assignment::new();
    assert_eq!(zen.evaluate(e, &assignment).unwrap(), zen.evaluate(simplified, &assignment).unwrap());
}
