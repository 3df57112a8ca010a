//! The closed grammar of the expression language.
//!
//! A [`Node`] is immutable once it is stored in the manager's table. Children
//! are [`ExprRef`] handles to nodes that were created *before* the parent, so
//! the arena is topologically sorted by construction and the graph is acyclic.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::adapter::ConverterId;
use crate::error::Result;
use crate::reference::ExprRef;
use crate::types::{ObjectType, Type};
use crate::utils::{fingerprint, pairing2, pairing3, pairing4, MyHash};
use crate::value::Literal;
use crate::zen::Zen;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BitOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ArithOp {
    Sum,
    Minus,
    Multiply,
    Min,
    Max,
}

impl ArithOp {
    pub fn is_commutative(self) -> bool {
        !matches!(self, ArithOp::Minus)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CmpOp {
    Eq,
    Leq,
    Geq,
}

/// The non-empty case of a list match: builds the result from the head and
/// the tail of the list.
pub type MatchCase = dyn Fn(&Zen, ExprRef, ExprRef) -> Result<ExprRef>;

/// Shared handle to a [`MatchCase`].
///
/// Equality and hashing use the identity of the closure, so two list-match
/// nodes are merged only when they share the very same case function.
#[derive(Clone)]
pub struct MatchFn(Rc<MatchCase>);

impl MatchFn {
    pub fn new(f: impl Fn(&Zen, ExprRef, ExprRef) -> Result<ExprRef> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn apply(&self, zen: &Zen, head: ExprRef, tail: ExprRef) -> Result<ExprRef> {
        (self.0)(zen, head, tail)
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for MatchFn {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for MatchFn {}

impl Hash for MatchFn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for MatchFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchFn({:#x})", self.addr())
    }
}

/// One syntactic construct.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Node {
    Constant(Literal),
    /// A free variable. Never interned: every arbitrary is a distinct variable.
    Arbitrary {
        name: Rc<str>,
        ty: Type,
    },
    Not(ExprRef),
    And(ExprRef, ExprRef),
    Or(ExprRef, ExprRef),
    BitNot(ExprRef),
    Bitwise(BitOp, ExprRef, ExprRef),
    Arith(ArithOp, ExprRef, ExprRef),
    Compare(CmpOp, ExprRef, ExprRef),
    /// `If(guard, then, else)`.
    If(ExprRef, ExprRef, ExprRef),
    /// Field values in the declaration order of `ty`.
    CreateObject {
        ty: Rc<ObjectType>,
        fields: Rc<[ExprRef]>,
    },
    GetField {
        object: ExprRef,
        field: Rc<str>,
    },
    WithField {
        object: ExprRef,
        field: Rc<str>,
        value: ExprRef,
    },
    /// The empty list of the given element type.
    ListEmpty(Type),
    ListCons(ExprRef, ExprRef),
    ListMatch {
        list: ExprRef,
        empty: ExprRef,
        cons: MatchFn,
    },
    /// Re-exposes `expr` as type `to`, running `converters` in order.
    Adapter {
        expr: ExprRef,
        to: Type,
        converters: Rc<[ConverterId]>,
    },
}

impl Node {
    /// Short name of the node kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Constant(_) => "const",
            Node::Arbitrary { .. } => "arbitrary",
            Node::Not(_) => "not",
            Node::And(..) => "and",
            Node::Or(..) => "or",
            Node::BitNot(_) => "bitnot",
            Node::Bitwise(BitOp::And, ..) => "bitand",
            Node::Bitwise(BitOp::Or, ..) => "bitor",
            Node::Bitwise(BitOp::Xor, ..) => "bitxor",
            Node::Arith(ArithOp::Sum, ..) => "sum",
            Node::Arith(ArithOp::Minus, ..) => "minus",
            Node::Arith(ArithOp::Multiply, ..) => "mul",
            Node::Arith(ArithOp::Min, ..) => "min",
            Node::Arith(ArithOp::Max, ..) => "max",
            Node::Compare(CmpOp::Eq, ..) => "eq",
            Node::Compare(CmpOp::Leq, ..) => "leq",
            Node::Compare(CmpOp::Geq, ..) => "geq",
            Node::If(..) => "if",
            Node::CreateObject { .. } => "create",
            Node::GetField { .. } => "get",
            Node::WithField { .. } => "with",
            Node::ListEmpty(_) => "empty",
            Node::ListCons(..) => "cons",
            Node::ListMatch { .. } => "match",
            Node::Adapter { .. } => "adapt",
        }
    }

    /// Direct children, in a fixed left-to-right order.
    pub fn children(&self) -> Vec<ExprRef> {
        match self {
            Node::Constant(_) | Node::Arbitrary { .. } | Node::ListEmpty(_) => vec![],
            Node::Not(e) | Node::BitNot(e) => vec![*e],
            Node::And(a, b)
            | Node::Or(a, b)
            | Node::Bitwise(_, a, b)
            | Node::Arith(_, a, b)
            | Node::Compare(_, a, b)
            | Node::ListCons(a, b) => vec![*a, *b],
            Node::If(g, t, f) => vec![*g, *t, *f],
            Node::CreateObject { fields, .. } => fields.to_vec(),
            Node::GetField { object, .. } => vec![*object],
            Node::WithField { object, value, .. } => vec![*object, *value],
            Node::ListMatch { list, empty, .. } => vec![*list, *empty],
            Node::Adapter { expr, .. } => vec![*expr],
        }
    }

    /// Whether construction goes through the hash-consing table.
    pub fn is_interned(&self) -> bool {
        !matches!(self, Node::Arbitrary { .. })
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        let id = |e: &ExprRef| e.id() as u64;
        match self {
            Node::Not(a) => pairing2(1, id(a)),
            Node::And(a, b) => pairing3(2, id(a), id(b)),
            Node::Or(a, b) => pairing3(3, id(a), id(b)),
            Node::BitNot(a) => pairing2(4, id(a)),
            Node::Bitwise(op, a, b) => pairing4(5, *op as u64, id(a), id(b)),
            Node::Arith(op, a, b) => pairing4(6, *op as u64, id(a), id(b)),
            Node::Compare(op, a, b) => pairing4(7, *op as u64, id(a), id(b)),
            Node::If(g, t, f) => pairing4(8, id(g), id(t), id(f)),
            Node::ListCons(h, t) => pairing3(9, id(h), id(t)),
            _ => fingerprint(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_order() {
        let g = ExprRef::new(1);
        let t = ExprRef::new(2);
        let f = ExprRef::new(3);
        assert_eq!(Node::If(g, t, f).children(), vec![g, t, f]);
        assert!(Node::Constant(Literal::Bool(true)).children().is_empty());
    }

    #[test]
    fn test_structural_hash_is_stable() {
        let a = ExprRef::new(5);
        let b = ExprRef::new(6);
        assert_eq!(MyHash::hash(&Node::And(a, b)), MyHash::hash(&Node::And(a, b)));
        assert_ne!(MyHash::hash(&Node::And(a, b)), MyHash::hash(&Node::Or(a, b)));
    }

    #[test]
    fn test_match_fn_identity() {
        let f = MatchFn::new(|_, head, _| Ok(head));
        let g = MatchFn::new(|_, head, _| Ok(head));
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
    }

    #[test]
    fn test_arbitrary_is_not_interned() {
        let node = Node::Arbitrary {
            name: Rc::from("x"),
            ty: Type::Bool,
        };
        assert!(!node.is_interned());
        assert!(Node::Not(ExprRef::new(1)).is_interned());
    }
}
