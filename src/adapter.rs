//! Converter registry for adapter nodes.
//!
//! An adapter node exposes an expression of one representation type as
//! another. Its concrete meaning is a chain of converter functions, applied in
//! order by the evaluator. Converters are registered once with the manager and
//! referred to by [`ConverterId`], so adapter nodes stay plain data that can be
//! hashed and interned.
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ConverterId(u32);

impl ConverterId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ConverterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conv{}", self.0)
    }
}

pub type Converter = dyn Fn(&Value) -> Value;

struct Registered {
    name: Rc<str>,
    convert: Rc<Converter>,
}

#[derive(Default)]
pub struct ConverterRegistry {
    converters: Vec<Registered>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, convert: impl Fn(&Value) -> Value + 'static) -> ConverterId {
        let id = ConverterId(self.converters.len() as u32);
        self.converters.push(Registered {
            name: Rc::from(name),
            convert: Rc::new(convert),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn name(&self, id: ConverterId) -> &str {
        &self.converters[id.index()].name
    }

    /// Run the converters in order.
    pub fn apply(&self, ids: &[ConverterId], value: Value) -> Value {
        ids.iter().fold(value, |acc, &id| (self.converters[id.index()].convert)(&acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::value::IntValue;

    #[test]
    fn test_apply_in_order() {
        let mut registry = ConverterRegistry::new();
        let inc = registry.register("inc", |v| match v {
            Value::Int(IntValue::U8(x)) => Value::Int(IntValue::U8(x.wrapping_add(1))),
            other => other.clone(),
        });
        let dbl = registry.register("dbl", |v| match v {
            Value::Int(IntValue::U8(x)) => Value::Int(IntValue::U8(x.wrapping_mul(2))),
            other => other.clone(),
        });
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name(dbl), "dbl");

        let start = Value::Int(IntValue::U8(3));
        assert_eq!(registry.apply(&[inc, dbl], start.clone()), Value::Int(IntValue::U8(8)));
        assert_eq!(registry.apply(&[dbl, inc], start.clone()), Value::Int(IntValue::U8(7)));
        assert_eq!(registry.apply(&[], start.clone()), start);
    }
}
