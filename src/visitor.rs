//! Double dispatch over the closed set of node kinds.
//!
//! A [`Visitor`] has one handler per node kind. [`Zen::accept`] looks up the
//! node behind a handle and calls the matching handler, so an algorithm over
//! expressions is written once per kind without touching [`Node`]. Adding a
//! node kind is a compile error in every visitor until it is handled.
use std::rc::Rc;

use crate::adapter::ConverterId;
use crate::node::{ArithOp, BitOp, CmpOp, MatchFn, Node};
use crate::reference::ExprRef;
use crate::types::{ObjectType, Type};
use crate::value::Literal;
use crate::zen::Zen;

pub trait Visitor {
    type Param;
    type Output;

    fn visit_constant(&mut self, zen: &Zen, e: ExprRef, literal: &Literal, param: Self::Param) -> Self::Output;

    fn visit_arbitrary(&mut self, zen: &Zen, e: ExprRef, name: &str, ty: &Type, param: Self::Param) -> Self::Output;

    fn visit_not(&mut self, zen: &Zen, e: ExprRef, inner: ExprRef, param: Self::Param) -> Self::Output;

    fn visit_and(&mut self, zen: &Zen, e: ExprRef, a: ExprRef, b: ExprRef, param: Self::Param) -> Self::Output;

    fn visit_or(&mut self, zen: &Zen, e: ExprRef, a: ExprRef, b: ExprRef, param: Self::Param) -> Self::Output;

    fn visit_bit_not(&mut self, zen: &Zen, e: ExprRef, inner: ExprRef, param: Self::Param) -> Self::Output;

    fn visit_bitwise(
        &mut self,
        zen: &Zen,
        e: ExprRef,
        op: BitOp,
        a: ExprRef,
        b: ExprRef,
        param: Self::Param,
    ) -> Self::Output;

    fn visit_arith(
        &mut self,
        zen: &Zen,
        e: ExprRef,
        op: ArithOp,
        a: ExprRef,
        b: ExprRef,
        param: Self::Param,
    ) -> Self::Output;

    fn visit_compare(
        &mut self,
        zen: &Zen,
        e: ExprRef,
        op: CmpOp,
        a: ExprRef,
        b: ExprRef,
        param: Self::Param,
    ) -> Self::Output;

    fn visit_if(
        &mut self,
        zen: &Zen,
        e: ExprRef,
        guard: ExprRef,
        then: ExprRef,
        else_: ExprRef,
        param: Self::Param,
    ) -> Self::Output;

    fn visit_create_object(
        &mut self,
        zen: &Zen,
        e: ExprRef,
        ty: &Rc<ObjectType>,
        fields: &[ExprRef],
        param: Self::Param,
    ) -> Self::Output;

    fn visit_get_field(&mut self, zen: &Zen, e: ExprRef, object: ExprRef, field: &str, param: Self::Param)
        -> Self::Output;

    fn visit_with_field(
        &mut self,
        zen: &Zen,
        e: ExprRef,
        object: ExprRef,
        field: &str,
        value: ExprRef,
        param: Self::Param,
    ) -> Self::Output;

    fn visit_list_empty(&mut self, zen: &Zen, e: ExprRef, elem: &Type, param: Self::Param) -> Self::Output;

    fn visit_list_cons(&mut self, zen: &Zen, e: ExprRef, head: ExprRef, tail: ExprRef, param: Self::Param)
        -> Self::Output;

    fn visit_list_match(
        &mut self,
        zen: &Zen,
        e: ExprRef,
        list: ExprRef,
        empty: ExprRef,
        cons: &MatchFn,
        param: Self::Param,
    ) -> Self::Output;

    fn visit_adapter(
        &mut self,
        zen: &Zen,
        e: ExprRef,
        inner: ExprRef,
        to: &Type,
        converters: &[ConverterId],
        param: Self::Param,
    ) -> Self::Output;
}

impl Zen {
    /// Dispatch `e` to the handler of its node kind.
    pub fn accept<V: Visitor>(&self, e: ExprRef, visitor: &mut V, param: V::Param) -> V::Output {
        match self.node(e) {
            Node::Constant(literal) => visitor.visit_constant(self, e, &literal, param),
            Node::Arbitrary { name, ty } => visitor.visit_arbitrary(self, e, &name, &ty, param),
            Node::Not(x) => visitor.visit_not(self, e, x, param),
            Node::And(a, b) => visitor.visit_and(self, e, a, b, param),
            Node::Or(a, b) => visitor.visit_or(self, e, a, b, param),
            Node::BitNot(x) => visitor.visit_bit_not(self, e, x, param),
            Node::Bitwise(op, a, b) => visitor.visit_bitwise(self, e, op, a, b, param),
            Node::Arith(op, a, b) => visitor.visit_arith(self, e, op, a, b, param),
            Node::Compare(op, a, b) => visitor.visit_compare(self, e, op, a, b, param),
            Node::If(g, t, f) => visitor.visit_if(self, e, g, t, f, param),
            Node::CreateObject { ty, fields } => visitor.visit_create_object(self, e, &ty, &fields, param),
            Node::GetField { object, field } => visitor.visit_get_field(self, e, object, &field, param),
            Node::WithField { object, field, value } => visitor.visit_with_field(self, e, object, &field, value, param),
            Node::ListEmpty(elem) => visitor.visit_list_empty(self, e, &elem, param),
            Node::ListCons(head, tail) => visitor.visit_list_cons(self, e, head, tail, param),
            Node::ListMatch { list, empty, cons } => visitor.visit_list_match(self, e, list, empty, &cons, param),
            Node::Adapter { expr, to, converters } => visitor.visit_adapter(self, e, expr, &to, &converters, param),
        }
    }
}
