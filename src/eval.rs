//! Concrete evaluation of expressions.
//!
//! [`Zen::evaluate`] computes the [`Value`] of an expression under an
//! [`Assignment`] of its arbitraries. Like the simplifier, the evaluator walks
//! the DAG post-order on an explicit stack of frames, and the body produced by
//! a list-match case is evaluated on that same stack. Neither deep
//! expressions nor long list matches recurse on the call stack. Each node is
//! evaluated once per [`Evaluator`].
//!
//! Lists built from cons nodes are kept as `(head, tail)` node pairs and only
//! turned into a [`Value::List`] when a value is requested, so a list of `n`
//! cons cells costs `O(n)` to evaluate.
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, trace};

use crate::adapter::ConverterId;
use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::node::{ArithOp, BitOp, CmpOp, MatchFn, Node};
use crate::reference::ExprRef;
use crate::types::{ObjectType, Type};
use crate::value::{Literal, Value};
use crate::visitor::Visitor;
use crate::zen::Zen;

/// Values of arbitraries.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    values: HashMap<ExprRef, Value>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, arbitrary: ExprRef, value: impl Into<Value>) -> &mut Self {
        self.values.insert(arbitrary, value.into());
        self
    }

    pub fn get(&self, arbitrary: ExprRef) -> Option<&Value> {
        self.values.get(&arbitrary)
    }
}

/// Evaluated form of a node.
#[derive(Debug, Clone)]
pub enum Slot {
    Value(Value),
    /// Non-empty list whose head and tail nodes are already evaluated.
    Cons(ExprRef, ExprRef),
}

/// Outcome of visiting a node.
#[derive(Debug, Clone)]
pub enum Step {
    Done(Slot),
    /// The node has the value of this expression.
    Forward(ExprRef),
}

#[derive(Debug, Copy, Clone)]
enum Frame {
    Enter(ExprRef),
    Exit(ExprRef),
    Forward { from: ExprRef, to: ExprRef },
}

pub struct Evaluator<'a> {
    assignment: &'a Assignment,
    cache: Cache<ExprRef, Slot>,
    /// Concrete lists lifted to cons chains, keyed by the node they came from.
    lifted: Cache<ExprRef, ExprRef>,
    in_progress: HashSet<ExprRef>,
    stack: Vec<Frame>,
}

impl<'a> Evaluator<'a> {
    pub fn new(assignment: &'a Assignment) -> Self {
        Self {
            assignment,
            cache: Cache::default(),
            lifted: Cache::new(4),
            in_progress: HashSet::new(),
            stack: Vec::new(),
        }
    }

    pub fn evaluate(&mut self, zen: &Zen, e: ExprRef) -> Result<Value> {
        self.stack.clear();
        self.in_progress.clear();

        self.stack.push(Frame::Enter(e));
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Enter(e) => self.enter(zen, e)?,
                Frame::Exit(e) => match zen.accept(e, self, ())? {
                    Step::Done(slot) => self.finish(e, slot),
                    Step::Forward(body) => match self.cache.peek(&body) {
                        Some(slot) => self.finish(e, slot),
                        None => {
                            trace!("evaluate: {} continues as {}", e, body);
                            self.stack.push(Frame::Forward { from: e, to: body });
                            self.stack.push(Frame::Enter(body));
                        }
                    },
                },
                Frame::Forward { from, to } => {
                    let slot = self.slot(to)?;
                    self.finish(from, slot);
                }
            }
        }
        self.value(e)
    }

    fn enter(&mut self, zen: &Zen, e: ExprRef) -> Result<()> {
        if self.cache.contains(&e) {
            return Ok(());
        }
        if !self.in_progress.insert(e) {
            return Err(Error::InternalInvariant(format!("evaluation cycle through {}", e)));
        }
        self.stack.push(Frame::Exit(e));
        for c in zen.node(e).children().into_iter().rev() {
            if !self.cache.contains(&c) {
                self.stack.push(Frame::Enter(c));
            }
        }
        Ok(())
    }

    fn finish(&mut self, e: ExprRef, slot: Slot) {
        self.in_progress.remove(&e);
        self.cache.insert(e, slot);
    }

    fn slot(&self, e: ExprRef) -> Result<Slot> {
        self.cache
            .peek(&e)
            .ok_or_else(|| Error::InternalInvariant(format!("{} evaluated before its children", e)))
    }

    /// The value of an evaluated node, with cons cells collected into a list.
    fn value(&self, e: ExprRef) -> Result<Value> {
        let mut items = Vec::new();
        let mut slot = self.slot(e)?;
        loop {
            match slot {
                Slot::Value(value) if items.is_empty() => return Ok(value),
                Slot::Value(Value::List(elem, rest)) => {
                    items.extend(rest);
                    return Ok(Value::List(elem, items));
                }
                Slot::Value(other) => {
                    return Err(Error::InternalInvariant(format!("{} ends in a non-list: {:?}", e, other)));
                }
                Slot::Cons(head, tail) => {
                    items.push(self.value(head)?);
                    slot = self.slot(tail)?;
                }
            }
        }
    }

    fn literal(&self, e: ExprRef) -> Result<Literal> {
        match self.slot(e)? {
            Slot::Value(value) => value
                .as_literal()
                .ok_or_else(|| Error::InternalInvariant(format!("{} is not a primitive value: {:?}", e, value))),
            Slot::Cons(..) => Err(Error::InternalInvariant(format!("{} is a list, not a primitive value", e))),
        }
    }

    fn bool(&self, e: ExprRef) -> Result<bool> {
        self.literal(e)?
            .as_bool()
            .ok_or_else(|| Error::InternalInvariant(format!("{} is not a boolean", e)))
    }

    fn object(&self, e: ExprRef) -> Result<(Rc<ObjectType>, Vec<Value>)> {
        match self.slot(e)? {
            Slot::Value(Value::Object(ty, fields)) => Ok((ty, fields)),
            other => Err(Error::InternalInvariant(format!("{} is not an object: {:?}", e, other))),
        }
    }

    /// Head and tail expressions of the non-empty list `list`.
    fn uncons(&mut self, zen: &Zen, list: ExprRef, value: Value) -> Result<(ExprRef, ExprRef)> {
        let lifted = self.lifted.lookup_or_compute(list, || zen.lift(&value))?;
        match zen.node(lifted) {
            Node::ListCons(head, tail) => Ok((head, tail)),
            other => Err(Error::InternalInvariant(format!(
                "{} lifted to {} instead of a cons",
                list,
                other.kind()
            ))),
        }
    }

    fn position(ty: &ObjectType, field: &str) -> Result<usize> {
        ty.position(field).ok_or_else(|| Error::InvalidField {
            object: ty.name().to_string(),
            field: field.to_string(),
        })
    }

    fn unfolded(e: ExprRef) -> Error {
        Error::InternalInvariant(format!("operands of {} have no common representation", e))
    }
}

fn done(value: Value) -> Result<Step> {
    Ok(Step::Done(Slot::Value(value)))
}

impl Visitor for Evaluator<'_> {
    type Param = ();
    type Output = Result<Step>;

    fn visit_constant(&mut self, _: &Zen, _: ExprRef, literal: &Literal, _: ()) -> Result<Step> {
        done(literal.clone().into())
    }

    fn visit_arbitrary(&mut self, _: &Zen, e: ExprRef, name: &str, ty: &Type, _: ()) -> Result<Step> {
        let value = self
            .assignment
            .get(e)
            .ok_or_else(|| Error::UnassignedArbitrary(name.to_string()))?;
        // Opaque types have no values of their own.
        if !matches!(ty, Type::Opaque(_)) && &value.ty() != ty {
            return Err(Error::mismatch("assignment", ty, &value.ty()));
        }
        done(value.clone())
    }

    fn visit_not(&mut self, _: &Zen, _: ExprRef, inner: ExprRef, _: ()) -> Result<Step> {
        done(Value::Bool(!self.bool(inner)?))
    }

    fn visit_and(&mut self, _: &Zen, _: ExprRef, a: ExprRef, b: ExprRef, _: ()) -> Result<Step> {
        done(Value::Bool(self.bool(a)? && self.bool(b)?))
    }

    fn visit_or(&mut self, _: &Zen, _: ExprRef, a: ExprRef, b: ExprRef, _: ()) -> Result<Step> {
        done(Value::Bool(self.bool(a)? || self.bool(b)?))
    }

    fn visit_bit_not(&mut self, _: &Zen, e: ExprRef, inner: ExprRef, _: ()) -> Result<Step> {
        match self.literal(inner)? {
            Literal::Int(x) => done(Value::Int(x.bit_not())),
            _ => Err(Self::unfolded(e)),
        }
    }

    fn visit_bitwise(&mut self, _: &Zen, e: ExprRef, op: BitOp, a: ExprRef, b: ExprRef, _: ()) -> Result<Step> {
        let x = self.literal(a)?;
        let y = self.literal(b)?;
        done(x.bitwise(op, &y).map(Value::from).ok_or_else(|| Self::unfolded(e))?)
    }

    fn visit_arith(&mut self, _: &Zen, e: ExprRef, op: ArithOp, a: ExprRef, b: ExprRef, _: ()) -> Result<Step> {
        let x = self.literal(a)?;
        let y = self.literal(b)?;
        done(x.arith(op, &y).map(Value::from).ok_or_else(|| Self::unfolded(e))?)
    }

    fn visit_compare(&mut self, _: &Zen, e: ExprRef, op: CmpOp, a: ExprRef, b: ExprRef, _: ()) -> Result<Step> {
        let x = self.literal(a)?;
        let y = self.literal(b)?;
        done(x.compare(op, &y).map(Value::Bool).ok_or_else(|| Self::unfolded(e))?)
    }

    fn visit_if(&mut self, _: &Zen, _: ExprRef, guard: ExprRef, then: ExprRef, else_: ExprRef, _: ()) -> Result<Step> {
        let branch = if self.bool(guard)? { then } else { else_ };
        Ok(Step::Done(self.slot(branch)?))
    }

    fn visit_create_object(
        &mut self,
        _: &Zen,
        _: ExprRef,
        ty: &Rc<ObjectType>,
        fields: &[ExprRef],
        _: (),
    ) -> Result<Step> {
        let values = fields.iter().map(|&f| self.value(f)).collect::<Result<Vec<_>>>()?;
        done(Value::Object(ty.clone(), values))
    }

    fn visit_get_field(&mut self, _: &Zen, _: ExprRef, object: ExprRef, field: &str, _: ()) -> Result<Step> {
        let (ty, mut fields) = self.object(object)?;
        let position = Self::position(&ty, field)?;
        done(fields.swap_remove(position))
    }

    fn visit_with_field(
        &mut self,
        _: &Zen,
        _: ExprRef,
        object: ExprRef,
        field: &str,
        value: ExprRef,
        _: (),
    ) -> Result<Step> {
        let (ty, mut fields) = self.object(object)?;
        let position = Self::position(&ty, field)?;
        fields[position] = self.value(value)?;
        done(Value::Object(ty, fields))
    }

    fn visit_list_empty(&mut self, _: &Zen, _: ExprRef, elem: &Type, _: ()) -> Result<Step> {
        done(Value::List(elem.clone(), Vec::new()))
    }

    fn visit_list_cons(&mut self, _: &Zen, _: ExprRef, head: ExprRef, tail: ExprRef, _: ()) -> Result<Step> {
        Ok(Step::Done(Slot::Cons(head, tail)))
    }

    fn visit_list_match(
        &mut self,
        zen: &Zen,
        e: ExprRef,
        list: ExprRef,
        empty: ExprRef,
        cons: &MatchFn,
        _: (),
    ) -> Result<Step> {
        let (head, tail) = match self.slot(list)? {
            Slot::Cons(head, tail) => (head, tail),
            Slot::Value(Value::List(_, items)) if items.is_empty() => return Ok(Step::Done(self.slot(empty)?)),
            Slot::Value(value @ Value::List(..)) => self.uncons(zen, list, value)?,
            Slot::Value(other) => {
                return Err(Error::InternalInvariant(format!("{} is not a list: {:?}", list, other)));
            }
        };
        let body = zen.apply_case(cons, head, tail, &zen.ty(e))?;
        Ok(Step::Forward(body))
    }

    fn visit_adapter(
        &mut self,
        zen: &Zen,
        _: ExprRef,
        inner: ExprRef,
        _: &Type,
        converters: &[ConverterId],
        _: (),
    ) -> Result<Step> {
        done(zen.run_converters(converters, self.value(inner)?))
    }
}

impl Zen {
    /// Evaluate `e` with the arbitraries bound by `assignment`.
    pub fn evaluate(&self, e: ExprRef, assignment: &Assignment) -> Result<Value> {
        let mut evaluator = Evaluator::new(assignment);
        let value = evaluator.evaluate(self, e)?;
        debug!("evaluate: {} => {:?}", e, value);
        Ok(value)
    }
}
