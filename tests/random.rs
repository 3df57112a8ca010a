//! Randomized tests for the simplifier.
//!
//! Random expressions over booleans, bytes and a small record type are
//! simplified and checked for idempotence and for agreement with the
//! evaluator under random assignments.

use std::rc::Rc;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use test_log::test;

use zen_rs::eval::Assignment;
use zen_rs::node::{ArithOp, BitOp, CmpOp};
use zen_rs::reference::ExprRef;
use zen_rs::types::{IntType, ObjectType, Type};
use zen_rs::value::{IntValue, Value};
use zen_rs::zen::Zen;

const BYTE: Type = Type::Int(IntType::U8);

struct Generator<'a> {
    zen: &'a Zen,
    rng: ChaCha8Rng,
    bools: Vec<ExprRef>,
    bytes: Vec<ExprRef>,
    pair: Rc<ObjectType>,
    pairs: Vec<ExprRef>,
}

impl<'a> Generator<'a> {
    fn new(zen: &'a Zen, seed: u64) -> Self {
        let pair = ObjectType::new("Pair", [("Fst", BYTE), ("Snd", Type::Bool)]);
        Self {
            zen,
            rng: ChaCha8Rng::seed_from_u64(seed),
            bools: (0..3).map(|i| zen.arbitrary(&format!("b{}", i), Type::Bool)).collect(),
            bytes: (0..3).map(|i| zen.arbitrary(&format!("n{}", i), BYTE)).collect(),
            pairs: vec![zen.arbitrary("p", Type::Object(pair.clone()))],
            pair,
        }
    }

    fn pick(&mut self, items: &[ExprRef]) -> ExprRef {
        items[self.rng.random_range(0..items.len())]
    }

    fn boolean(&mut self, depth: usize) -> ExprRef {
        let zen = self.zen;
        if depth == 0 || self.rng.random_bool(0.2) {
            return match self.rng.random_range(0..3) {
                0 => zen.bool(self.rng.random_bool(0.5)),
                _ => {
                    let bools = self.bools.clone();
                    self.pick(&bools)
                }
            };
        }
        let d = depth - 1;
        match self.rng.random_range(0..7) {
            0 => {
                let x = self.boolean(d);
                zen.not(x).unwrap()
            }
            1 => {
                let (a, b) = (self.boolean(d), self.boolean(d));
                zen.and(a, b).unwrap()
            }
            2 => {
                let (a, b) = (self.boolean(d), self.boolean(d));
                zen.or(a, b).unwrap()
            }
            3 => {
                let (g, a, b) = (self.boolean(d), self.boolean(d), self.boolean(d));
                zen.ite(g, a, b).unwrap()
            }
            4 => {
                let op = [CmpOp::Eq, CmpOp::Leq, CmpOp::Geq][self.rng.random_range(0..3)];
                let (a, b) = (self.byte(d), self.byte(d));
                zen.compare(op, a, b).unwrap()
            }
            5 => {
                let o = self.pair(d);
                zen.get_field(o, "Snd").unwrap()
            }
            _ => {
                let (a, b) = (self.boolean(d), self.boolean(d));
                zen.eq(a, b).unwrap()
            }
        }
    }

    fn byte(&mut self, depth: usize) -> ExprRef {
        let zen = self.zen;
        if depth == 0 || self.rng.random_bool(0.2) {
            return match self.rng.random_range(0..3) {
                0 => zen.int(self.rng.random_range(0..=3u8) * 85),
                _ => {
                    let bytes = self.bytes.clone();
                    self.pick(&bytes)
                }
            };
        }
        let d = depth - 1;
        match self.rng.random_range(0..6) {
            0 => {
                let x = self.byte(d);
                zen.bit_not(x).unwrap()
            }
            1 => {
                let op = [BitOp::And, BitOp::Or, BitOp::Xor][self.rng.random_range(0..3)];
                let (a, b) = (self.byte(d), self.byte(d));
                zen.bitwise(op, a, b).unwrap()
            }
            2 | 3 => {
                let op = [ArithOp::Sum, ArithOp::Minus, ArithOp::Multiply, ArithOp::Min, ArithOp::Max]
                    [self.rng.random_range(0..5)];
                let (a, b) = (self.byte(d), self.byte(d));
                zen.arith(op, a, b).unwrap()
            }
            4 => {
                let (g, a, b) = (self.boolean(d), self.byte(d), self.byte(d));
                zen.ite(g, a, b).unwrap()
            }
            _ => {
                let o = self.pair(d);
                zen.get_field(o, "Fst").unwrap()
            }
        }
    }

    fn pair(&mut self, depth: usize) -> ExprRef {
        let zen = self.zen;
        if depth == 0 {
            let pairs = self.pairs.clone();
            return self.pick(&pairs);
        }
        let d = depth - 1;
        match self.rng.random_range(0..4) {
            0 => {
                let pairs = self.pairs.clone();
                self.pick(&pairs)
            }
            1 => {
                let (a, b) = (self.byte(d), self.boolean(d));
                let ty = self.pair.clone();
                zen.create_object(&ty, [("Fst", a), ("Snd", b)]).unwrap()
            }
            2 => {
                let (o, v) = (self.pair(d), self.byte(d));
                zen.with_field(o, "Fst", v).unwrap()
            }
            _ => {
                let (g, a, b) = (self.boolean(d), self.pair(d), self.pair(d));
                zen.ite(g, a, b).unwrap()
            }
        }
    }

    fn assignment(&mut self) -> Assignment {
        let mut assignment = Assignment::new();
        for &b in self.bools.iter() {
            assignment.set(b, self.rng.random_bool(0.5));
        }
        for &n in self.bytes.iter() {
            assignment.set(n, Value::Int(IntValue::U8(self.rng.random())));
        }
        for &p in self.pairs.iter() {
            let value = Value::Object(
                self.pair.clone(),
                vec![Value::Int(IntValue::U8(self.rng.random())), Value::Bool(self.rng.random_bool(0.5))],
            );
            assignment.set(p, value);
        }
        assignment
    }
}

#[test]
fn random_simplification_is_idempotent() {
    let zen = Zen::default();
    let mut generator = Generator::new(&zen, 42);
    for _ in 0..300 {
        let e = generator.boolean(6);
        let once = zen.simplify(e).unwrap();
        let twice = zen.simplify(once).unwrap();
        assert_eq!(once, twice, "{} is not a fixed point", zen.to_bracket_string(once));
    }
}

#[test]
fn random_simplification_preserves_semantics() {
    let zen = Zen::default();
    let mut generator = Generator::new(&zen, 7);
    for _ in 0..300 {
        let e = if generator.rng.random_bool(0.5) {
            generator.boolean(5)
        } else {
            generator.byte(5)
        };
        let r = zen.simplify(e).unwrap();
        for _ in 0..4 {
            let assignment = generator.assignment();
            assert_eq!(
                zen.evaluate(e, &assignment).unwrap(),
                zen.evaluate(r, &assignment).unwrap(),
                "{} vs {}",
                zen.to_bracket_string(e),
                zen.to_bracket_string(r)
            );
        }
    }
}

#[test]
fn random_shared_roots() {
    let zen = Zen::default();
    let mut generator = Generator::new(&zen, 2024);
    let roots: Vec<ExprRef> = (0..50).map(|_| generator.boolean(4)).collect();
    let mut simplifier = zen_rs::simplify::Simplifier::new(&zen);
    let results: Vec<ExprRef> = roots.iter().map(|&e| simplifier.simplify(e).unwrap()).collect();
    for (&e, &r) in roots.iter().zip(results.iter()) {
        assert_eq!(zen.simplify(e).unwrap(), r);
    }
}
