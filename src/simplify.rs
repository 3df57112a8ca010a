//! Expression simplification.
//!
//! The [`Simplifier`] rewrites an expression DAG into an equivalent normal
//! form: constants are folded, dead branches removed, field and adapter
//! operations fused, and commutative operands put in ascending id order.
//!
//! # Traversal
//!
//! The walk is post-order and memoized on the identity of the *input* node:
//! every node is rewritten at most once per pass, and a node shared by several
//! parents yields one shared result. It runs on an explicit stack of frames,
//! so the depth of the input (long cons lists, long field-update chains) never
//! turns into call-stack depth.
//!
//! - `Enter(e)`: schedule `e` after its not-yet-simplified children.
//! - `Exit(e)`: all children are simplified; fire the rule set of `e`'s kind.
//! - `Forward(e, m)`: the rule for `e` said "the result is whatever `m`
//!   simplifies to"; `m` is done now, copy its result to `e`.
//!
//! A rule either returns a finished node ([`Rewrite::Done`]) or a new node to
//! simplify in its place ([`Rewrite::Redo`]). The latter is how distribution
//! over conditionals and list-match unrolling re-simplify what they build.
//!
//! # Rules
//!
//! ```text
//! not(c)                    => !c
//! not(not(x))               => x
//! and/or                    => flattened, true/false absorbed, deduplicated,
//!                              sorted by id, right-associated
//! if(true, a, b)            => a
//! if(false, a, b)           => b
//! if(g, a, a)               => a            (same instance only)
//! if(g, true, false)        => g
//! if(g, false, true)        => not(g)
//! op(c1, c2)                => c            (bitwise, arithmetic, comparison)
//! get(with(o, f, v), f)     => v
//! get(with(o, f', v), f)    => get(o, f)
//! get(if(g, t, e), f)       => if(g, get(t, f), get(e, f))
//! get(create(.., f=v, ..), f) => v
//! with(with(o, f, v1), f, v2)  => with(o, f, v2)
//! with(create(.., f=v1, ..), f, v2) => create(.., f=v2, ..)
//! match(empty, e, c)        => e
//! match(cons(h, t), e, c)   => c(h, t)
//! match(if(g, a, b), e, c)  => if(g, match(a, e, c), match(b, e, c))
//! adapt(A, adapt(B, x: A))  => x
//! adapt(A, if(g, t, e))     => if(g, adapt(A, t), adapt(A, e))
//! ```
//!
//! Simplified results are fixed points: simplifying them again returns the
//! same node.
use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, trace};

use crate::adapter::ConverterId;
use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::node::{ArithOp, BitOp, CmpOp, MatchFn, Node};
use crate::reference::ExprRef;
use crate::types::{ObjectType, Type};
use crate::value::{IntValue, Literal};
use crate::visitor::Visitor;
use crate::zen::Zen;

/// Outcome of a single rule application.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Rewrite {
    /// The node is in normal form.
    Done(ExprRef),
    /// The result is the simplification of this node.
    Redo(ExprRef),
}

#[derive(Debug, Copy, Clone)]
enum Frame {
    Enter(ExprRef),
    Exit(ExprRef),
    Forward { from: ExprRef, to: ExprRef },
}

/// One simplification pass.
///
/// Results are memoized for the lifetime of the simplifier, so simplifying
/// several roots with one instance preserves the sharing between them.
pub struct Simplifier<'a> {
    zen: &'a Zen,
    cache: Cache<ExprRef, ExprRef>,
    in_progress: HashSet<ExprRef>,
    stack: Vec<Frame>,
    rewrites: usize,
}

impl<'a> Simplifier<'a> {
    pub fn new(zen: &'a Zen) -> Self {
        Self {
            zen,
            cache: Cache::new(zen.config().cache_bits),
            in_progress: HashSet::new(),
            stack: Vec::new(),
            rewrites: 0,
        }
    }

    pub fn cache(&self) -> &Cache<ExprRef, ExprRef> {
        &self.cache
    }

    /// Number of rule applications so far.
    pub fn num_rewrites(&self) -> usize {
        self.rewrites
    }

    /// Simplify `root`.
    pub fn simplify(&mut self, root: ExprRef) -> Result<ExprRef> {
        // A previous call may have failed half-way.
        self.stack.clear();
        self.in_progress.clear();

        self.stack.push(Frame::Enter(root));
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Enter(e) => self.enter(e)?,
                Frame::Exit(e) => {
                    self.rewrites += 1;
                    match self.zen.accept(e, self, ())? {
                        Rewrite::Done(r) => self.finish(e, r),
                        Rewrite::Redo(m) => match self.cache.peek(&m) {
                            Some(r) => self.finish(e, r),
                            None => {
                                trace!("simplify: {} continues as {}", e, m);
                                self.stack.push(Frame::Forward { from: e, to: m });
                                self.stack.push(Frame::Enter(m));
                            }
                        },
                    }
                }
                Frame::Forward { from, to } => {
                    let r = self.result(to)?;
                    self.finish(from, r);
                }
            }
        }

        let result = self.result(root)?;
        debug!(
            "simplify: {} => {} (rewrites = {}, hits = {}, misses = {})",
            root,
            result,
            self.rewrites,
            self.cache.hits(),
            self.cache.misses()
        );
        Ok(result)
    }

    fn enter(&mut self, e: ExprRef) -> Result<()> {
        if self.cache.get(&e).is_some() {
            return Ok(());
        }
        if !self.in_progress.insert(e) {
            return Err(Error::InternalInvariant(format!("rewrite cycle through {}", e)));
        }
        self.stack.push(Frame::Exit(e));
        for c in self.zen.node(e).children().into_iter().rev() {
            if !self.cache.contains(&c) {
                self.stack.push(Frame::Enter(c));
            }
        }
        Ok(())
    }

    fn finish(&mut self, e: ExprRef, r: ExprRef) {
        trace!("simplify: {} => {}", e, r);
        self.in_progress.remove(&e);
        self.cache.insert(e, r);
        // Results are fixed points.
        if !self.in_progress.contains(&r) {
            self.cache.insert_if_absent(r, r);
        }
    }

    /// The simplified form of an already visited node.
    fn result(&self, e: ExprRef) -> Result<ExprRef> {
        self.cache
            .peek(&e)
            .ok_or_else(|| Error::InternalInvariant(format!("{} was not simplified before its parent", e)))
    }

    fn simplify_junction(&mut self, is_and: bool, a: ExprRef, b: ExprRef) -> Result<Rewrite> {
        let zen = self.zen;
        let name = if is_and { "and" } else { "or" };
        // `absorbing` decides the whole junction, `!absorbing` is neutral.
        let absorbing = !is_and;

        let mut operands: Vec<ExprRef> = Vec::new();
        let mut pending = vec![self.result(b)?, self.result(a)?];
        while let Some(x) = pending.pop() {
            match zen.node(x) {
                Node::And(p, q) if is_and => pending.extend([q, p]),
                Node::Or(p, q) if !is_and => pending.extend([q, p]),
                Node::Constant(Literal::Bool(v)) => {
                    if v == absorbing {
                        debug!("{}(.., {}, ..) => {}", name, v, v);
                        return Ok(Rewrite::Done(zen.bool(absorbing)));
                    }
                }
                _ => operands.push(x),
            }
        }
        operands.sort();
        operands.dedup();

        let Some(mut acc) = operands.pop() else {
            debug!("{}() => {}", name, !absorbing);
            return Ok(Rewrite::Done(zen.bool(!absorbing)));
        };
        while let Some(x) = operands.pop() {
            acc = if is_and { zen.and(x, acc)? } else { zen.or(x, acc)? };
        }
        Ok(Rewrite::Done(acc))
    }

    fn fold_error(&self, e: ExprRef) -> Error {
        Error::InternalInvariant(format!("constant operands of {} do not fold", e))
    }
}

fn ordered(a: ExprRef, b: ExprRef) -> (ExprRef, ExprRef) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Visitor for Simplifier<'_> {
    type Param = ();
    type Output = Result<Rewrite>;

    fn visit_constant(&mut self, _: &Zen, e: ExprRef, _: &Literal, _: ()) -> Result<Rewrite> {
        Ok(Rewrite::Done(e))
    }

    fn visit_arbitrary(&mut self, _: &Zen, e: ExprRef, _: &str, _: &Type, _: ()) -> Result<Rewrite> {
        Ok(Rewrite::Done(e))
    }

    fn visit_not(&mut self, zen: &Zen, _: ExprRef, inner: ExprRef, _: ()) -> Result<Rewrite> {
        let x = self.result(inner)?;
        if let Some(b) = zen.as_bool(x) {
            debug!("not({}) => {}", b, !b);
            return Ok(Rewrite::Done(zen.bool(!b)));
        }
        if let Node::Not(y) = zen.node(x) {
            debug!("not(not(x)) => x");
            return Ok(Rewrite::Done(y));
        }
        Ok(Rewrite::Done(zen.not(x)?))
    }

    fn visit_and(&mut self, _: &Zen, _: ExprRef, a: ExprRef, b: ExprRef, _: ()) -> Result<Rewrite> {
        self.simplify_junction(true, a, b)
    }

    fn visit_or(&mut self, _: &Zen, _: ExprRef, a: ExprRef, b: ExprRef, _: ()) -> Result<Rewrite> {
        self.simplify_junction(false, a, b)
    }

    fn visit_bit_not(&mut self, zen: &Zen, _: ExprRef, inner: ExprRef, _: ()) -> Result<Rewrite> {
        let x = self.result(inner)?;
        if let Some(Literal::Int(v)) = zen.as_literal(x) {
            debug!("bitnot({}) => {}", v, v.bit_not());
            return Ok(Rewrite::Done(zen.int(v.bit_not())));
        }
        if let Node::BitNot(y) = zen.node(x) {
            debug!("bitnot(bitnot(x)) => x");
            return Ok(Rewrite::Done(y));
        }
        Ok(Rewrite::Done(zen.bit_not(x)?))
    }

    fn visit_bitwise(&mut self, zen: &Zen, e: ExprRef, op: BitOp, a: ExprRef, b: ExprRef, _: ()) -> Result<Rewrite> {
        let (a, b) = ordered(self.result(a)?, self.result(b)?);
        if let (Some(x), Some(y)) = (zen.as_literal(a), zen.as_literal(b)) {
            let folded = x.bitwise(op, &y).ok_or_else(|| self.fold_error(e))?;
            debug!("{:?}({}, {}) => {}", op, x, y, folded);
            return Ok(Rewrite::Done(zen.literal(folded)));
        }
        if a == b {
            return Ok(Rewrite::Done(match (op, zen.ty(a)) {
                (BitOp::Xor, Type::Int(ty)) => {
                    debug!("bitxor(x, x) => 0");
                    zen.int(IntValue::new(ty, 0))
                }
                _ => {
                    debug!("{:?}(x, x) => x", op);
                    a
                }
            }));
        }
        Ok(Rewrite::Done(zen.bitwise(op, a, b)?))
    }

    fn visit_arith(&mut self, zen: &Zen, e: ExprRef, op: ArithOp, a: ExprRef, b: ExprRef, _: ()) -> Result<Rewrite> {
        let (mut a, mut b) = (self.result(a)?, self.result(b)?);
        let (la, lb) = (zen.as_literal(a), zen.as_literal(b));
        if let (Some(x), Some(y)) = (&la, &lb) {
            let folded = x.arith(op, y).ok_or_else(|| self.fold_error(e))?;
            debug!("{:?}({}, {}) => {}", op, x, y, folded);
            return Ok(Rewrite::Done(zen.literal(folded)));
        }

        let is_zero = |l: &Option<Literal>| l.as_ref().is_some_and(|l| l.is_zero());
        let is_one = |l: &Option<Literal>| l.as_ref().is_some_and(|l| l.is_one());
        match op {
            ArithOp::Sum if is_zero(&la) => return Ok(Rewrite::Done(b)),
            ArithOp::Sum | ArithOp::Minus if is_zero(&lb) => return Ok(Rewrite::Done(a)),
            ArithOp::Multiply if is_one(&la) => return Ok(Rewrite::Done(b)),
            ArithOp::Multiply if is_one(&lb) => return Ok(Rewrite::Done(a)),
            ArithOp::Multiply if is_zero(&la) => return Ok(Rewrite::Done(a)),
            ArithOp::Multiply if is_zero(&lb) => return Ok(Rewrite::Done(b)),
            ArithOp::Min | ArithOp::Max if a == b => return Ok(Rewrite::Done(a)),
            _ => {}
        }

        if op.is_commutative() {
            (a, b) = ordered(a, b);
        }
        Ok(Rewrite::Done(zen.arith(op, a, b)?))
    }

    fn visit_compare(&mut self, zen: &Zen, e: ExprRef, op: CmpOp, a: ExprRef, b: ExprRef, _: ()) -> Result<Rewrite> {
        let (mut a, mut b) = (self.result(a)?, self.result(b)?);
        if let (Some(x), Some(y)) = (zen.as_literal(a), zen.as_literal(b)) {
            let folded = x.compare(op, &y).ok_or_else(|| self.fold_error(e))?;
            debug!("{:?}({}, {}) => {}", op, x, y, folded);
            return Ok(Rewrite::Done(zen.bool(folded)));
        }
        if a == b {
            debug!("{:?}(x, x) => true", op);
            return Ok(Rewrite::Done(zen.bool(true)));
        }
        if op == CmpOp::Eq {
            (a, b) = ordered(a, b);
        }
        Ok(Rewrite::Done(zen.compare(op, a, b)?))
    }

    fn visit_if(&mut self, zen: &Zen, _: ExprRef, guard: ExprRef, then: ExprRef, else_: ExprRef, _: ()) -> Result<Rewrite> {
        let g = self.result(guard)?;
        let t = self.result(then)?;
        let f = self.result(else_)?;

        match zen.as_bool(g) {
            Some(true) => {
                debug!("if(true, a, b) => a");
                return Ok(Rewrite::Done(t));
            }
            Some(false) => {
                debug!("if(false, a, b) => b");
                return Ok(Rewrite::Done(f));
            }
            None => {}
        }
        if t == f {
            debug!("if(g, a, a) => a");
            return Ok(Rewrite::Done(t));
        }
        if zen.is_true(t) && zen.is_false(f) {
            debug!("if(g, true, false) => g");
            return Ok(Rewrite::Done(g));
        }
        if zen.is_false(t) && zen.is_true(f) {
            debug!("if(g, false, true) => not(g)");
            return Ok(Rewrite::Redo(zen.not(g)?));
        }
        Ok(Rewrite::Done(zen.ite(g, t, f)?))
    }

    fn visit_create_object(
        &mut self,
        zen: &Zen,
        _: ExprRef,
        ty: &Rc<ObjectType>,
        fields: &[ExprRef],
        _: (),
    ) -> Result<Rewrite> {
        let fields = fields.iter().map(|&f| self.result(f)).collect::<Result<Vec<_>>>()?;
        Ok(Rewrite::Done(zen.mk_object(ty, fields)?))
    }

    fn visit_get_field(&mut self, zen: &Zen, _: ExprRef, object: ExprRef, field: &str, _: ()) -> Result<Rewrite> {
        let o = self.result(object)?;
        match zen.node(o) {
            Node::WithField {
                field: updated, value, ..
            } if updated.as_ref() == field => {
                debug!("get(with(o, {}, v), {}) => v", field, field);
                Ok(Rewrite::Done(value))
            }
            Node::WithField {
                object: inner,
                field: updated,
                ..
            } => {
                debug!("get(with(o, {}, v), {}) => get(o, {})", updated, field, field);
                Ok(Rewrite::Redo(zen.get_field(inner, field)?))
            }
            Node::If(g, t, f) => {
                debug!("get(if(g, t, f), {}) => if(g, get(t), get(f))", field);
                let t = zen.get_field(t, field)?;
                let f = zen.get_field(f, field)?;
                Ok(Rewrite::Redo(zen.ite(g, t, f)?))
            }
            Node::CreateObject { ty, fields } => {
                let position = ty.position(field).ok_or_else(|| Error::InvalidField {
                    object: ty.name().to_string(),
                    field: field.to_string(),
                })?;
                debug!("get(create(.., {}=v, ..), {}) => v", field, field);
                Ok(Rewrite::Done(fields[position]))
            }
            _ => Ok(Rewrite::Done(zen.get_field(o, field)?)),
        }
    }

    fn visit_with_field(
        &mut self,
        zen: &Zen,
        _: ExprRef,
        object: ExprRef,
        field: &str,
        value: ExprRef,
        _: (),
    ) -> Result<Rewrite> {
        let o = self.result(object)?;
        let v = self.result(value)?;
        match zen.node(o) {
            Node::WithField {
                object: inner,
                field: updated,
                ..
            } if updated.as_ref() == field => {
                debug!("with(with(o, {}, v1), {}, v2) => with(o, {}, v2)", field, field, field);
                Ok(Rewrite::Redo(zen.with_field(inner, field, v)?))
            }
            Node::CreateObject { ty, fields } => {
                let position = ty.position(field).ok_or_else(|| Error::InvalidField {
                    object: ty.name().to_string(),
                    field: field.to_string(),
                })?;
                debug!("with(create(.., {}=v1, ..), {}, v2) => create(.., {}=v2, ..)", field, field, field);
                let mut fields = fields.to_vec();
                fields[position] = v;
                Ok(Rewrite::Done(zen.mk_object(&ty, fields)?))
            }
            _ => Ok(Rewrite::Done(zen.with_field(o, field, v)?)),
        }
    }

    fn visit_list_empty(&mut self, _: &Zen, e: ExprRef, _: &Type, _: ()) -> Result<Rewrite> {
        Ok(Rewrite::Done(e))
    }

    fn visit_list_cons(&mut self, zen: &Zen, _: ExprRef, head: ExprRef, tail: ExprRef, _: ()) -> Result<Rewrite> {
        let h = self.result(head)?;
        let t = self.result(tail)?;
        Ok(Rewrite::Done(zen.list_cons(h, t)?))
    }

    fn visit_list_match(
        &mut self,
        zen: &Zen,
        e: ExprRef,
        list: ExprRef,
        empty: ExprRef,
        cons: &MatchFn,
        _: (),
    ) -> Result<Rewrite> {
        let l = self.result(list)?;
        let empty = self.result(empty)?;
        match zen.node(l) {
            Node::ListEmpty(_) => {
                debug!("match(empty, e, c) => e");
                Ok(Rewrite::Done(empty))
            }
            Node::ListCons(head, tail) => {
                debug!("match(cons(h, t), e, c) => c(h, t)");
                let body = zen.apply_case(cons, head, tail, &zen.ty(e))?;
                Ok(Rewrite::Redo(body))
            }
            Node::If(g, a, b) => {
                debug!("match(if(g, a, b), e, c) => if(g, match(a), match(b))");
                let a = zen.list_match_with(a, empty, cons.clone())?;
                let b = zen.list_match_with(b, empty, cons.clone())?;
                Ok(Rewrite::Redo(zen.ite(g, a, b)?))
            }
            _ => Ok(Rewrite::Done(zen.list_match_with(l, empty, cons.clone())?)),
        }
    }

    fn visit_adapter(
        &mut self,
        zen: &Zen,
        _: ExprRef,
        inner: ExprRef,
        to: &Type,
        converters: &[ConverterId],
        _: (),
    ) -> Result<Rewrite> {
        let x = self.result(inner)?;
        match zen.node(x) {
            // Only the round trip is fused; adapt(A, adapt(B, x: C)) is kept.
            Node::Adapter { expr, .. } if &zen.ty(expr) == to => {
                debug!("adapt({}, adapt(_, x: {})) => x", to, to);
                Ok(Rewrite::Done(expr))
            }
            Node::If(g, t, f) => {
                debug!("adapt({}, if(g, t, f)) => if(g, adapt(t), adapt(f))", to);
                let t = zen.adapt(t, to.clone(), converters)?;
                let f = zen.adapt(f, to.clone(), converters)?;
                Ok(Rewrite::Redo(zen.ite(g, t, f)?))
            }
            _ => Ok(Rewrite::Done(zen.adapt(x, to.clone(), converters)?)),
        }
    }
}

impl Zen {
    /// Simplify `e` in a fresh pass.
    pub fn simplify(&self, e: ExprRef) -> Result<ExprRef> {
        Simplifier::new(self).simplify(e)
    }
}
