//! The expression manager.
//!
//! All expressions are created through a [`Zen`] manager, which owns the node
//! table and hands out [`ExprRef`] handles. Construction type-checks the
//! arguments and interns the node: building the same node twice from the same
//! children returns the same handle, so handle equality implies structural
//! equality for every interned kind.
//!
//! ```
//! use zen_rs::types::Type;
//! use zen_rs::zen::Zen;
//!
//! let zen = Zen::default();
//! let x = zen.arbitrary("x", Type::Bool);
//! let t = zen.bool(true);
//! let f = zen.and(t, x).unwrap();
//! assert_eq!(zen.and(t, x).unwrap(), f);
//! assert_eq!(zen.simplify(f).unwrap(), x);
//! ```
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use log::trace;
use num_bigint::BigInt;

use crate::adapter::{ConverterId, ConverterRegistry};
use crate::error::{Error, Result};
use crate::node::{ArithOp, BitOp, CmpOp, MatchFn, Node};
use crate::reference::ExprRef;
use crate::table::Table;
use crate::types::{ObjectType, Type};
use crate::value::{IntValue, Literal, Value};

/// Configuration for a [`Zen`] manager.
#[derive(Debug, Clone)]
pub struct ZenConfig {
    /// Initial number of buckets of the node table, as `2^bits`.
    pub table_bits: usize,
    /// Initial capacity of each simplification cache, as `2^bits`.
    pub cache_bits: usize,
}

impl Default for ZenConfig {
    fn default() -> Self {
        Self {
            table_bits: 16,
            cache_bits: 12,
        }
    }
}

impl ZenConfig {
    pub fn with_table_bits(mut self, bits: usize) -> Self {
        self.table_bits = bits;
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }
}

pub struct Zen {
    table: RefCell<Table<Node>>,
    /// Type of each slot, indexed like the table (slot 0 unused).
    types: RefCell<Vec<Type>>,
    converters: RefCell<ConverterRegistry>,
    config: ZenConfig,
}

impl Zen {
    pub fn new() -> Self {
        Self::with_config(ZenConfig::default())
    }

    pub fn with_config(config: ZenConfig) -> Self {
        assert!(config.cache_bits <= 31, "Cache bits should be in the range 0..=31");
        Self {
            table: RefCell::new(Table::new(config.table_bits)),
            types: RefCell::new(vec![Type::Bool]),
            converters: RefCell::new(ConverterRegistry::new()),
            config,
        }
    }

    pub fn config(&self) -> &ZenConfig {
        &self.config
    }
}

impl Default for Zen {
    fn default() -> Self {
        Zen::new()
    }
}

impl Debug for Zen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.borrow();
        f.debug_struct("Zen")
            .field("nodes", &table.size())
            .field("interned", &table.num_interned())
            .field("buckets", &table.num_buckets())
            .field("converters", &self.converters.borrow().len())
            .finish()
    }
}

// Accessors
impl Zen {
    /// The node behind a handle.
    pub fn node(&self, e: ExprRef) -> Node {
        self.table.borrow()[e.index()].clone()
    }

    /// The static type of an expression.
    pub fn ty(&self, e: ExprRef) -> Type {
        self.types.borrow()[e.index()].clone()
    }

    /// Total number of allocated nodes.
    pub fn num_nodes(&self) -> usize {
        self.table.borrow().size()
    }

    pub fn as_literal(&self, e: ExprRef) -> Option<Literal> {
        match &self.table.borrow()[e.index()] {
            Node::Constant(literal) => Some(literal.clone()),
            _ => None,
        }
    }

    pub fn as_bool(&self, e: ExprRef) -> Option<bool> {
        match &self.table.borrow()[e.index()] {
            Node::Constant(Literal::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn is_true(&self, e: ExprRef) -> bool {
        self.as_bool(e) == Some(true)
    }

    pub fn is_false(&self, e: ExprRef) -> bool {
        self.as_bool(e) == Some(false)
    }

    /// All nodes reachable from `roots`, in ascending id order.
    ///
    /// Children always have smaller ids than their parents, so the result is a
    /// topological order: every node comes after all of its children.
    pub fn reachable(&self, roots: &[ExprRef]) -> Vec<ExprRef> {
        let mut seen = std::collections::HashSet::new();
        let mut stack: Vec<ExprRef> = roots.to_vec();
        while let Some(e) = stack.pop() {
            if seen.insert(e) {
                stack.extend(self.node(e).children());
            }
        }
        let mut result: Vec<ExprRef> = seen.into_iter().collect();
        result.sort();
        result
    }

    /// Number of distinct nodes reachable from `e`.
    pub fn size(&self, e: ExprRef) -> usize {
        self.reachable(&[e]).len()
    }
}

// Node creation
impl Zen {
    fn mk_node(&self, node: Node, ty: Type) -> ExprRef {
        let (is_new, index) = if node.is_interned() {
            self.table.borrow_mut().put(node)
        } else {
            (true, self.table.borrow_mut().add(node))
        };
        if is_new {
            let mut types = self.types.borrow_mut();
            assert_eq!(types.len(), index, "Type table out of sync");
            types.push(ty);
            trace!("mk: new node @{}", index);
        }
        ExprRef::new(index as u32)
    }

    fn expect_type(&self, context: &'static str, e: ExprRef, expected: &Type) -> Result<()> {
        let found = self.ty(e);
        if &found == expected {
            Ok(())
        } else {
            Err(Error::mismatch(context, expected, &found))
        }
    }

    fn expect_bool(&self, context: &'static str, e: ExprRef) -> Result<()> {
        self.expect_type(context, e, &Type::Bool)
    }

    /// Both operands must have the same type; returns it.
    fn expect_same(&self, context: &'static str, a: ExprRef, b: ExprRef) -> Result<Type> {
        let ty = self.ty(a);
        self.expect_type(context, b, &ty)?;
        Ok(ty)
    }

    fn expect_object(&self, context: &'static str, e: ExprRef) -> Result<Rc<ObjectType>> {
        match self.ty(e) {
            Type::Object(ty) => Ok(ty),
            other => Err(Error::mismatch(context, "object", &other)),
        }
    }

    fn field_position(&self, object: &ObjectType, field: &str) -> Result<usize> {
        object.position(field).ok_or_else(|| Error::InvalidField {
            object: object.name().to_string(),
            field: field.to_string(),
        })
    }
}

// Leaves
impl Zen {
    pub fn literal(&self, literal: Literal) -> ExprRef {
        let ty = literal.ty();
        self.mk_node(Node::Constant(literal), ty)
    }

    pub fn bool(&self, b: bool) -> ExprRef {
        self.literal(Literal::Bool(b))
    }

    pub fn int(&self, value: impl Into<IntValue>) -> ExprRef {
        self.literal(Literal::Int(value.into()))
    }

    pub fn big_int(&self, value: impl Into<BigInt>) -> ExprRef {
        self.literal(Literal::BigInt(value.into()))
    }

    /// A fresh free variable. Each call creates a distinct node, even for the
    /// same name and type.
    pub fn arbitrary(&self, name: &str, ty: Type) -> ExprRef {
        let node = Node::Arbitrary {
            name: Rc::from(name),
            ty: ty.clone(),
        };
        self.mk_node(node, ty)
    }

    /// Build an expression denoting a concrete value.
    pub fn lift(&self, value: &Value) -> Result<ExprRef> {
        match value {
            Value::Object(ty, fields) => {
                let fields = fields.iter().map(|v| self.lift(v)).collect::<Result<Vec<_>>>()?;
                self.mk_object(ty, fields)
            }
            Value::List(elem, items) => {
                let items = items.iter().map(|v| self.lift(v)).collect::<Result<Vec<_>>>()?;
                self.list(elem.clone(), &items)
            }
            _ => match value.as_literal() {
                Some(literal) => Ok(self.literal(literal)),
                None => Err(Error::InternalInvariant(format!("cannot lift {:?}", value))),
            },
        }
    }
}

// Boolean operators
impl Zen {
    pub fn not(&self, e: ExprRef) -> Result<ExprRef> {
        self.expect_bool("not", e)?;
        Ok(self.mk_node(Node::Not(e), Type::Bool))
    }

    pub fn and(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.expect_bool("and", a)?;
        self.expect_bool("and", b)?;
        Ok(self.mk_node(Node::And(a, b), Type::Bool))
    }

    pub fn or(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.expect_bool("or", a)?;
        self.expect_bool("or", b)?;
        Ok(self.mk_node(Node::Or(a, b), Type::Bool))
    }

    /// Conjunction of many operands, `true` if there are none.
    pub fn and_many(&self, items: impl IntoIterator<Item = ExprRef>) -> Result<ExprRef> {
        let mut items: Vec<ExprRef> = items.into_iter().collect();
        let Some(mut acc) = items.pop() else {
            return Ok(self.bool(true));
        };
        while let Some(e) = items.pop() {
            acc = self.and(e, acc)?;
        }
        Ok(acc)
    }

    /// Disjunction of many operands, `false` if there are none.
    pub fn or_many(&self, items: impl IntoIterator<Item = ExprRef>) -> Result<ExprRef> {
        let mut items: Vec<ExprRef> = items.into_iter().collect();
        let Some(mut acc) = items.pop() else {
            return Ok(self.bool(false));
        };
        while let Some(e) = items.pop() {
            acc = self.or(e, acc)?;
        }
        Ok(acc)
    }

    pub fn ite(&self, guard: ExprRef, then: ExprRef, else_: ExprRef) -> Result<ExprRef> {
        self.expect_bool("if", guard)?;
        let ty = self.expect_same("if", then, else_)?;
        Ok(self.mk_node(Node::If(guard, then, else_), ty))
    }
}

// Integer operators
impl Zen {
    pub fn bit_not(&self, e: ExprRef) -> Result<ExprRef> {
        let ty = self.ty(e);
        if !matches!(ty, Type::Int(_)) {
            return Err(Error::mismatch("bitnot", "fixed-width integer", &ty));
        }
        Ok(self.mk_node(Node::BitNot(e), ty))
    }

    pub fn bitwise(&self, op: BitOp, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        let ty = self.expect_same("bitwise", a, b)?;
        if !matches!(ty, Type::Int(_)) {
            return Err(Error::mismatch("bitwise", "fixed-width integer", &ty));
        }
        Ok(self.mk_node(Node::Bitwise(op, a, b), ty))
    }

    pub fn bit_and(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.bitwise(BitOp::And, a, b)
    }

    pub fn bit_or(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.bitwise(BitOp::Or, a, b)
    }

    pub fn bit_xor(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.bitwise(BitOp::Xor, a, b)
    }

    pub fn arith(&self, op: ArithOp, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        let ty = self.expect_same("arith", a, b)?;
        if !ty.is_numeric() {
            return Err(Error::mismatch("arith", "integer", &ty));
        }
        Ok(self.mk_node(Node::Arith(op, a, b), ty))
    }

    pub fn sum(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.arith(ArithOp::Sum, a, b)
    }

    pub fn minus(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.arith(ArithOp::Minus, a, b)
    }

    pub fn multiply(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.arith(ArithOp::Multiply, a, b)
    }

    pub fn min(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.arith(ArithOp::Min, a, b)
    }

    pub fn max(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.arith(ArithOp::Max, a, b)
    }

    pub fn compare(&self, op: CmpOp, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        let ty = self.expect_same("compare", a, b)?;
        let ok = match op {
            CmpOp::Eq => ty.is_primitive(),
            CmpOp::Leq | CmpOp::Geq => ty.is_numeric(),
        };
        if !ok {
            return Err(Error::mismatch("compare", "primitive type", &ty));
        }
        Ok(self.mk_node(Node::Compare(op, a, b), Type::Bool))
    }

    pub fn eq(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.compare(CmpOp::Eq, a, b)
    }

    pub fn leq(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.compare(CmpOp::Leq, a, b)
    }

    pub fn geq(&self, a: ExprRef, b: ExprRef) -> Result<ExprRef> {
        self.compare(CmpOp::Geq, a, b)
    }
}

// Objects
impl Zen {
    /// Create an object from `(field name, value)` pairs.
    ///
    /// Every declared field must be given exactly once; the pairs may come in
    /// any order and are stored in declaration order.
    pub fn create_object<'a>(
        &self,
        ty: &Rc<ObjectType>,
        fields: impl IntoIterator<Item = (&'a str, ExprRef)>,
    ) -> Result<ExprRef> {
        let mut slots: Vec<Option<ExprRef>> = vec![None; ty.num_fields()];
        for (name, value) in fields {
            let position = self.field_position(ty, name)?;
            if slots[position].replace(value).is_some() {
                return Err(Error::InvalidField {
                    object: ty.name().to_string(),
                    field: name.to_string(),
                });
            }
        }
        let values = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| Error::InvalidField {
                    object: ty.name().to_string(),
                    field: ty.field_name(i).to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.mk_object(ty, values)
    }

    /// Create an object from field values given in declaration order.
    pub fn mk_object(&self, ty: &Rc<ObjectType>, fields: Vec<ExprRef>) -> Result<ExprRef> {
        if fields.len() != ty.num_fields() {
            return Err(Error::InternalInvariant(format!(
                "object '{}' expects {} fields, got {}",
                ty.name(),
                ty.num_fields(),
                fields.len()
            )));
        }
        for (i, &value) in fields.iter().enumerate() {
            self.expect_type("create", value, ty.field_type(i))?;
        }
        let node = Node::CreateObject {
            ty: ty.clone(),
            fields: fields.into(),
        };
        Ok(self.mk_node(node, Type::Object(ty.clone())))
    }

    pub fn get_field(&self, object: ExprRef, field: &str) -> Result<ExprRef> {
        let object_ty = self.expect_object("get", object)?;
        let position = self.field_position(&object_ty, field)?;
        let ty = object_ty.field_type(position).clone();
        let node = Node::GetField {
            object,
            field: Rc::from(field),
        };
        Ok(self.mk_node(node, ty))
    }

    pub fn with_field(&self, object: ExprRef, field: &str, value: ExprRef) -> Result<ExprRef> {
        let object_ty = self.expect_object("with", object)?;
        let position = self.field_position(&object_ty, field)?;
        self.expect_type("with", value, object_ty.field_type(position))?;
        let node = Node::WithField {
            object,
            field: Rc::from(field),
            value,
        };
        Ok(self.mk_node(node, Type::Object(object_ty)))
    }
}

// Lists
impl Zen {
    pub fn list_empty(&self, elem: Type) -> ExprRef {
        let ty = Type::list(elem.clone());
        self.mk_node(Node::ListEmpty(elem), ty)
    }

    pub fn list_cons(&self, head: ExprRef, tail: ExprRef) -> Result<ExprRef> {
        let ty = self.ty(tail);
        match ty.list_elem() {
            Some(elem) => self.expect_type("cons", head, elem)?,
            None => return Err(Error::mismatch("cons", "list", &ty)),
        }
        Ok(self.mk_node(Node::ListCons(head, tail), ty))
    }

    /// Build the list `[items...]` as a chain of cons nodes.
    pub fn list(&self, elem: Type, items: &[ExprRef]) -> Result<ExprRef> {
        let mut acc = self.list_empty(elem);
        for &item in items.iter().rev() {
            acc = self.list_cons(item, acc)?;
        }
        Ok(acc)
    }

    /// Case analysis on a list: `empty` if the list is empty, otherwise the
    /// result of `cons(head, tail)`.
    pub fn list_match(
        &self,
        list: ExprRef,
        empty: ExprRef,
        cons: impl Fn(&Zen, ExprRef, ExprRef) -> Result<ExprRef> + 'static,
    ) -> Result<ExprRef> {
        self.list_match_with(list, empty, MatchFn::new(cons))
    }

    /// Like [`Zen::list_match`], reusing an existing case function. Matches that
    /// share the case function and the operands are the same node.
    pub fn list_match_with(&self, list: ExprRef, empty: ExprRef, cons: MatchFn) -> Result<ExprRef> {
        let list_ty = self.ty(list);
        if list_ty.list_elem().is_none() {
            return Err(Error::mismatch("match", "list", &list_ty));
        }
        let ty = self.ty(empty);
        Ok(self.mk_node(Node::ListMatch { list, empty, cons }, ty))
    }

    /// Apply the case function of a list match and check the result type.
    pub(crate) fn apply_case(&self, cons: &MatchFn, head: ExprRef, tail: ExprRef, ty: &Type) -> Result<ExprRef> {
        let result = cons.apply(self, head, tail)?;
        self.expect_type("match case", result, ty)?;
        Ok(result)
    }
}

// Adapters
impl Zen {
    pub fn register_converter(&self, name: &str, convert: impl Fn(&Value) -> Value + 'static) -> ConverterId {
        self.converters.borrow_mut().register(name, convert)
    }

    pub fn converter_name(&self, id: ConverterId) -> String {
        self.converters.borrow().name(id).to_string()
    }

    pub(crate) fn run_converters(&self, ids: &[ConverterId], value: Value) -> Value {
        self.converters.borrow().apply(ids, value)
    }

    /// Expose `expr` as type `to`, converting values with `converters` in order.
    pub fn adapt(&self, expr: ExprRef, to: Type, converters: &[ConverterId]) -> Result<ExprRef> {
        let registered = self.converters.borrow().len();
        if let Some(id) = converters.iter().find(|id| id.index() >= registered) {
            return Err(Error::InternalInvariant(format!("unknown converter {}", id)));
        }
        let node = Node::Adapter {
            expr,
            to: to.clone(),
            converters: converters.into(),
        };
        Ok(self.mk_node(node, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::types::IntType;

    fn point() -> Rc<ObjectType> {
        ObjectType::new("Point", [("X", Type::Int(IntType::I32)), ("Y", Type::Int(IntType::I32))])
    }

    #[test]
    fn test_interning() {
        let zen = Zen::default();
        let x = zen.arbitrary("x", Type::Bool);
        let y = zen.arbitrary("y", Type::Bool);
        assert_eq!(zen.and(x, y).unwrap(), zen.and(x, y).unwrap());
        assert_ne!(zen.and(x, y).unwrap(), zen.and(y, x).unwrap());
        assert_eq!(zen.int(5u8), zen.int(5u8));
        assert_ne!(zen.int(5u8), zen.int(5i8));
    }

    #[test]
    fn test_arbitraries_are_distinct() {
        let zen = Zen::default();
        let a = zen.arbitrary("x", Type::Bool);
        let b = zen.arbitrary("x", Type::Bool);
        assert_ne!(a, b);
        assert_ne!(zen.not(a).unwrap(), zen.not(b).unwrap());
    }

    #[test]
    fn test_ids_increase() {
        let zen = Zen::default();
        let x = zen.arbitrary("x", Type::Bool);
        let nx = zen.not(x).unwrap();
        let nnx = zen.not(nx).unwrap();
        assert!(x < nx && nx < nnx);
        assert_eq!(zen.num_nodes(), 3);
    }

    #[test]
    fn test_type_mismatch() {
        let zen = Zen::default();
        let x = zen.arbitrary("x", Type::Bool);
        let n = zen.int(1u8);
        let err = zen.and(x, n).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { context: "and", .. }));
        assert!(err.is_usage_error());
        assert!(zen.sum(n, zen.int(1u16)).is_err());
        assert!(zen.bit_not(zen.big_int(3)).is_err());
        assert!(zen.ite(x, n, x).is_err());
    }

    #[test]
    fn test_invalid_field() {
        let zen = Zen::default();
        let p = zen.arbitrary("p", Type::Object(point()));
        let err = zen.get_field(p, "Z").unwrap_err();
        assert_eq!(
            err,
            Error::InvalidField {
                object: "Point".to_string(),
                field: "Z".to_string()
            }
        );
        assert!(zen.with_field(p, "W", zen.int(1i32)).is_err());
        assert!(zen.with_field(p, "X", zen.int(1u8)).is_err());
    }

    #[test]
    fn test_create_object_orders_fields() {
        let zen = Zen::default();
        let ty = point();
        let one = zen.int(1i32);
        let two = zen.int(2i32);
        let a = zen.create_object(&ty, [("Y", two), ("X", one)]).unwrap();
        let b = zen.create_object(&ty, [("X", one), ("Y", two)]).unwrap();
        assert_eq!(a, b);
        match zen.node(a) {
            Node::CreateObject { fields, .. } => assert_eq!(&fields[..], &[one, two]),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_create_object_missing_or_duplicate_field() {
        let zen = Zen::default();
        let ty = point();
        let one = zen.int(1i32);
        assert!(zen.create_object(&ty, [("X", one)]).is_err());
        assert!(zen.create_object(&ty, [("X", one), ("X", one), ("Y", one)]).is_err());
    }

    #[test]
    fn test_list_types() {
        let zen = Zen::default();
        let elem = Type::Int(IntType::U8);
        let l = zen.list(elem.clone(), &[zen.int(1u8), zen.int(2u8)]).unwrap();
        assert_eq!(zen.ty(l), Type::list(elem.clone()));
        assert!(zen.list_cons(zen.bool(true), l).is_err());
        assert!(zen.list_match(zen.int(1u8), zen.bool(true), |z, _, _| Ok(z.bool(false))).is_err());
    }

    #[test]
    fn test_reachable_is_topological() {
        let zen = Zen::default();
        let x = zen.arbitrary("x", Type::Bool);
        let y = zen.arbitrary("y", Type::Bool);
        let f = zen.and(x, y).unwrap();
        let g = zen.or(f, x).unwrap();
        assert_eq!(zen.reachable(&[g]), vec![x, y, f, g]);
        assert_eq!(zen.size(g), 4);
    }

    #[test]
    fn test_lift() {
        let zen = Zen::default();
        let ty = point();
        let value = Value::Object(ty.clone(), vec![Value::Int(IntValue::I32(3)), Value::Int(IntValue::I32(4))]);
        let e = zen.lift(&value).unwrap();
        assert_eq!(zen.ty(e), Type::Object(ty));
        let list = Value::List(Type::Bool, vec![Value::Bool(true)]);
        let l = zen.lift(&list).unwrap();
        assert!(matches!(zen.node(l), Node::ListCons(..)));
    }
}
