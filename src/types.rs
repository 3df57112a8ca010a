//! Static type tags of the expression language.
//!
//! Every node carries the [`Type`] of the value it denotes. Constructors on the
//! [`Zen`][crate::zen::Zen] manager use these tags to reject ill-typed
//! expressions up front, and the simplifier relies on them never to fold
//! across different representations.
use std::fmt;
use std::rc::Rc;

/// A fixed-width machine integer type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum IntType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl IntType {
    pub const ALL: [IntType; 8] = [
        IntType::I8,
        IntType::U8,
        IntType::I16,
        IntType::U16,
        IntType::I32,
        IntType::U32,
        IntType::I64,
        IntType::U64,
    ];

    /// Width of the type in bits.
    pub fn bits(self) -> u32 {
        match self {
            IntType::I8 | IntType::U8 => 8,
            IntType::I16 | IntType::U16 => 16,
            IntType::I32 | IntType::U32 => 32,
            IntType::I64 | IntType::U64 => 64,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, IntType::I8 | IntType::I16 | IntType::I32 | IntType::I64)
    }
}

impl fmt::Display for IntType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_signed() { 'i' } else { 'u' };
        write!(f, "{}{}", sign, self.bits())
    }
}

/// A named record type with an ordered set of fields.
///
/// # Invariants
///
/// - Field names are unique within the type.
/// - The declaration order is the canonical order of object-construct nodes.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ObjectType {
    name: Rc<str>,
    fields: Vec<(Rc<str>, Type)>,
}

impl ObjectType {
    /// Creates a new object type.
    ///
    /// # Panics
    ///
    /// Panics if a field name is declared twice.
    pub fn new<S: AsRef<str>>(name: &str, fields: impl IntoIterator<Item = (S, Type)>) -> Rc<Self> {
        let mut declared: Vec<(Rc<str>, Type)> = Vec::new();
        for (field, ty) in fields {
            let field = field.as_ref();
            assert!(
                declared.iter().all(|(f, _)| f.as_ref() != field),
                "Field '{}' declared twice in '{}'",
                field,
                name
            );
            declared.push((Rc::from(field), ty));
        }
        Rc::new(Self {
            name: Rc::from(name),
            fields: declared,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over `(name, type)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Type)> + '_ {
        self.fields.iter().map(|(name, ty)| (name.as_ref(), ty))
    }

    /// Position of the field in declaration order.
    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|(name, _)| name.as_ref() == field)
    }

    pub fn field_name(&self, position: usize) -> &str {
        &self.fields[position].0
    }

    pub fn field_type(&self, position: usize) -> &Type {
        &self.fields[position].1
    }
}

/// The type of an expression.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Type {
    Bool,
    Int(IntType),
    BigInt,
    Object(Rc<ObjectType>),
    List(Rc<Type>),
    /// A user-level type whose representation is reached through adapters.
    Opaque(Rc<str>),
}

impl Type {
    pub fn list(elem: Type) -> Self {
        Type::List(Rc::new(elem))
    }

    pub fn opaque(name: &str) -> Self {
        Type::Opaque(Rc::from(name))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int(_) | Type::BigInt)
    }

    /// Types with a literal representation.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Bool | Type::Int(_) | Type::BigInt)
    }

    pub fn as_object(&self) -> Option<&Rc<ObjectType>> {
        match self {
            Type::Object(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn list_elem(&self) -> Option<&Type> {
        match self {
            Type::List(elem) => Some(elem),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int(ty) => write!(f, "{}", ty),
            Type::BigInt => write!(f, "bigint"),
            Type::Object(ty) => write!(f, "{}", ty.name()),
            Type::List(elem) => write!(f, "list<{}>", elem),
            Type::Opaque(name) => write!(f, "{}", name),
        }
    }
}
