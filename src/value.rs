//! Literal payloads and concrete values.
//!
//! [`Literal`] is what a constant node holds. [`Value`] is what the evaluator
//! produces; it extends literals with objects and lists.
//!
//! Native operations on fixed-width integers are only defined for two
//! operands of the *same* [`IntType`]: the result always has exactly the
//! width and signedness of the inputs. Arithmetic wraps on overflow.
use std::cmp::{max, min};
use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::node::{ArithOp, BitOp, CmpOp};
use crate::types::{IntType, ObjectType, Type};

/// A fixed-width integer constant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum IntValue {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
}

macro_rules! int_zip {
    ($a:expr, $b:expr, |$x:ident, $y:ident| $body:expr) => {
        match ($a, $b) {
            (IntValue::I8($x), IntValue::I8($y)) => Some(IntValue::I8($body)),
            (IntValue::U8($x), IntValue::U8($y)) => Some(IntValue::U8($body)),
            (IntValue::I16($x), IntValue::I16($y)) => Some(IntValue::I16($body)),
            (IntValue::U16($x), IntValue::U16($y)) => Some(IntValue::U16($body)),
            (IntValue::I32($x), IntValue::I32($y)) => Some(IntValue::I32($body)),
            (IntValue::U32($x), IntValue::U32($y)) => Some(IntValue::U32($body)),
            (IntValue::I64($x), IntValue::I64($y)) => Some(IntValue::I64($body)),
            (IntValue::U64($x), IntValue::U64($y)) => Some(IntValue::U64($body)),
            _ => None,
        }
    };
}

macro_rules! int_test {
    ($a:expr, $b:expr, |$x:ident, $y:ident| $body:expr) => {
        match ($a, $b) {
            (IntValue::I8($x), IntValue::I8($y)) => Some($body),
            (IntValue::U8($x), IntValue::U8($y)) => Some($body),
            (IntValue::I16($x), IntValue::I16($y)) => Some($body),
            (IntValue::U16($x), IntValue::U16($y)) => Some($body),
            (IntValue::I32($x), IntValue::I32($y)) => Some($body),
            (IntValue::U32($x), IntValue::U32($y)) => Some($body),
            (IntValue::I64($x), IntValue::I64($y)) => Some($body),
            (IntValue::U64($x), IntValue::U64($y)) => Some($body),
            _ => None,
        }
    };
}

macro_rules! int_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for IntValue {
                fn from(value: $t) -> Self {
                    IntValue::$variant(value)
                }
            }

            impl From<$t> for Literal {
                fn from(value: $t) -> Self {
                    Literal::Int(IntValue::$variant(value))
                }
            }
        )*
    };
}

int_from! {
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
}

impl IntValue {
    /// Truncate `value` to the given type (two's complement).
    pub fn new(ty: IntType, value: i128) -> Self {
        match ty {
            IntType::I8 => IntValue::I8(value as i8),
            IntType::U8 => IntValue::U8(value as u8),
            IntType::I16 => IntValue::I16(value as i16),
            IntType::U16 => IntValue::U16(value as u16),
            IntType::I32 => IntValue::I32(value as i32),
            IntType::U32 => IntValue::U32(value as u32),
            IntType::I64 => IntValue::I64(value as i64),
            IntType::U64 => IntValue::U64(value as u64),
        }
    }

    pub fn ty(self) -> IntType {
        match self {
            IntValue::I8(_) => IntType::I8,
            IntValue::U8(_) => IntType::U8,
            IntValue::I16(_) => IntType::I16,
            IntValue::U16(_) => IntType::U16,
            IntValue::I32(_) => IntType::I32,
            IntValue::U32(_) => IntType::U32,
            IntValue::I64(_) => IntType::I64,
            IntValue::U64(_) => IntType::U64,
        }
    }

    /// Widen to `i128` (lossless for every supported width).
    pub fn to_i128(self) -> i128 {
        match self {
            IntValue::I8(x) => x as i128,
            IntValue::U8(x) => x as i128,
            IntValue::I16(x) => x as i128,
            IntValue::U16(x) => x as i128,
            IntValue::I32(x) => x as i128,
            IntValue::U32(x) => x as i128,
            IntValue::I64(x) => x as i128,
            IntValue::U64(x) => x as i128,
        }
    }

    pub fn is_zero(self) -> bool {
        self.to_i128() == 0
    }

    pub fn is_one(self) -> bool {
        self.to_i128() == 1
    }

    pub fn bit_not(self) -> Self {
        match self {
            IntValue::I8(x) => IntValue::I8(!x),
            IntValue::U8(x) => IntValue::U8(!x),
            IntValue::I16(x) => IntValue::I16(!x),
            IntValue::U16(x) => IntValue::U16(!x),
            IntValue::I32(x) => IntValue::I32(!x),
            IntValue::U32(x) => IntValue::U32(!x),
            IntValue::I64(x) => IntValue::I64(!x),
            IntValue::U64(x) => IntValue::U64(!x),
        }
    }

    /// Apply a bitwise operator. Returns `None` if the widths differ.
    pub fn bitwise(self, op: BitOp, other: Self) -> Option<Self> {
        match op {
            BitOp::And => int_zip!(self, other, |x, y| x & y),
            BitOp::Or => int_zip!(self, other, |x, y| x | y),
            BitOp::Xor => int_zip!(self, other, |x, y| x ^ y),
        }
    }

    /// Apply an arithmetic operator with wrapping semantics.
    pub fn arith(self, op: ArithOp, other: Self) -> Option<Self> {
        match op {
            ArithOp::Sum => int_zip!(self, other, |x, y| x.wrapping_add(y)),
            ArithOp::Minus => int_zip!(self, other, |x, y| x.wrapping_sub(y)),
            ArithOp::Multiply => int_zip!(self, other, |x, y| x.wrapping_mul(y)),
            ArithOp::Min => int_zip!(self, other, |x, y| min(x, y)),
            ArithOp::Max => int_zip!(self, other, |x, y| max(x, y)),
        }
    }

    pub fn compare(self, op: CmpOp, other: Self) -> Option<bool> {
        match op {
            CmpOp::Eq => int_test!(self, other, |x, y| x == y),
            CmpOp::Leq => int_test!(self, other, |x, y| x <= y),
            CmpOp::Geq => int_test!(self, other, |x, y| x >= y),
        }
    }
}

impl fmt::Display for IntValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.to_i128(), self.ty())
    }
}

/// Payload of a constant node.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Literal {
    Bool(bool),
    Int(IntValue),
    BigInt(BigInt),
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Bool(_) => Type::Bool,
            Literal::Int(x) => Type::Int(x.ty()),
            Literal::BigInt(_) => Type::BigInt,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Literal::Int(x) => x.is_zero(),
            Literal::BigInt(x) => x.is_zero(),
            Literal::Bool(_) => false,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Literal::Int(x) => x.is_one(),
            Literal::BigInt(x) => x.is_one(),
            Literal::Bool(_) => false,
        }
    }

    pub fn bitwise(&self, op: BitOp, other: &Literal) -> Option<Literal> {
        match (self, other) {
            (Literal::Int(x), Literal::Int(y)) => x.bitwise(op, *y).map(Literal::Int),
            _ => None,
        }
    }

    pub fn arith(&self, op: ArithOp, other: &Literal) -> Option<Literal> {
        match (self, other) {
            (Literal::Int(x), Literal::Int(y)) => x.arith(op, *y).map(Literal::Int),
            (Literal::BigInt(x), Literal::BigInt(y)) => {
                let result = match op {
                    ArithOp::Sum => x + y,
                    ArithOp::Minus => x - y,
                    ArithOp::Multiply => x * y,
                    ArithOp::Min => min(x, y).clone(),
                    ArithOp::Max => max(x, y).clone(),
                };
                Some(Literal::BigInt(result))
            }
            _ => None,
        }
    }

    pub fn compare(&self, op: CmpOp, other: &Literal) -> Option<bool> {
        match (self, other) {
            (Literal::Int(x), Literal::Int(y)) => x.compare(op, *y),
            (Literal::BigInt(x), Literal::BigInt(y)) => Some(match op {
                CmpOp::Eq => x == y,
                CmpOp::Leq => x <= y,
                CmpOp::Geq => x >= y,
            }),
            (Literal::Bool(x), Literal::Bool(y)) if op == CmpOp::Eq => Some(x == y),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(x) => write!(f, "{}", x),
            Literal::BigInt(x) => write!(f, "{}n", x),
        }
    }
}

/// A concrete value produced by evaluation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(IntValue),
    BigInt(BigInt),
    /// Field values in declaration order.
    Object(Rc<ObjectType>, Vec<Value>),
    /// Element type and elements.
    List(Type, Vec<Value>),
}

impl Value {
    /// Type of the value's representation.
    pub fn ty(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::Int(x) => Type::Int(x.ty()),
            Value::BigInt(_) => Type::BigInt,
            Value::Object(ty, _) => Type::Object(ty.clone()),
            Value::List(elem, _) => Type::list(elem.clone()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<Literal> {
        match self {
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Int(x) => Some(Literal::Int(*x)),
            Value::BigInt(x) => Some(Literal::BigInt(x.clone())),
            _ => None,
        }
    }

    /// Value of the named field, if this is an object that has it.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(ty, fields) => ty.position(name).map(|i| &fields[i]),
            _ => None,
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Bool(b) => Value::Bool(b),
            Literal::Int(x) => Value::Int(x),
            Literal::BigInt(x) => Value::BigInt(x),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<BigInt> for Literal {
    fn from(x: BigInt) -> Self {
        Literal::BigInt(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitwise_keeps_width() {
        let a = IntValue::from(0b1100u8);
        let b = IntValue::from(0b1010u8);
        assert_eq!(a.bitwise(BitOp::And, b), Some(IntValue::U8(0b1000)));
        assert_eq!(a.bitwise(BitOp::Or, b), Some(IntValue::U8(0b1110)));
        assert_eq!(a.bitwise(BitOp::Xor, b), Some(IntValue::U8(0b0110)));
        assert_eq!(a.bit_not(), IntValue::U8(0b1111_0011));
    }

    #[test]
    fn test_mixed_widths_do_not_fold() {
        let a = IntValue::from(1u8);
        let b = IntValue::from(1i8);
        assert_eq!(a.bitwise(BitOp::And, b), None);
        assert_eq!(a.arith(ArithOp::Sum, b), None);
        assert_eq!(a.compare(CmpOp::Eq, b), None);
    }

    #[test]
    fn test_arith_wraps() {
        let max = IntValue::from(i16::MAX);
        let one = IntValue::from(1i16);
        assert_eq!(max.arith(ArithOp::Sum, one), Some(IntValue::I16(i16::MIN)));
        let zero = IntValue::from(0u32);
        assert_eq!(
            zero.arith(ArithOp::Minus, IntValue::from(1u32)),
            Some(IntValue::U32(u32::MAX))
        );
    }

    #[test]
    fn test_new_truncates() {
        assert_eq!(IntValue::new(IntType::U8, 257), IntValue::U8(1));
        assert_eq!(IntValue::new(IntType::I8, -1), IntValue::I8(-1));
        assert_eq!(IntValue::new(IntType::U16, -1), IntValue::U16(u16::MAX));
    }

    #[test]
    fn test_big_int_arith() {
        let a = Literal::BigInt(BigInt::from(10));
        let b = Literal::BigInt(BigInt::from(-3));
        assert_eq!(a.arith(ArithOp::Multiply, &b), Some(Literal::BigInt(BigInt::from(-30))));
        assert_eq!(a.arith(ArithOp::Min, &b), Some(Literal::BigInt(BigInt::from(-3))));
        assert_eq!(a.compare(CmpOp::Geq, &b), Some(true));
    }

    #[test]
    fn test_bool_compare() {
        let t = Literal::Bool(true);
        let f = Literal::Bool(false);
        assert_eq!(t.compare(CmpOp::Eq, &f), Some(false));
        assert_eq!(t.compare(CmpOp::Leq, &f), None);
    }
}
