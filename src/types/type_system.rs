//! Type System for Wax
//!
//! Types are a closed recursive enum. List types carry their element
//! type; a list whose elements are not known yet is `EmptyList` until an
//! append or assignment fixes it.

use std::fmt;

/// Primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int,
    Double,
    String,
    Bool,
    Void,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Double => "double",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Void => "void",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "double" => Some(Self::Double),
            "string" => Some(Self::String),
            "bool" => Some(Self::Bool),
            "void" => Some(Self::Void),
            _ => None,
        }
    }

    /// Check if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Double)
    }
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub ret: Type,
    pub params: Vec<Type>,
}

impl Signature {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self { ret, params }
    }

    /// A parameter typed `any` lifts the arity check
    pub fn is_variadic(&self) -> bool {
        self.params.iter().any(|p| *p == Type::Any)
    }
}

/// Resolved type (after type checking)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(PrimitiveType),
    /// List with a known element type. `List(Any)` is the bare `list`
    /// annotation, which places no constraint on its elements.
    List(Box<Type>),
    /// List whose element type is still pending inference
    EmptyList,
    /// A function identifier used as a value
    Function(Box<Signature>),
    /// Accepts anything (builtin parameters, elements of an unconstrained list)
    Any,
}

impl Type {
    pub const INT: Self = Self::Primitive(PrimitiveType::Int);
    pub const DOUBLE: Self = Self::Primitive(PrimitiveType::Double);
    pub const STRING: Self = Self::Primitive(PrimitiveType::String);
    pub const BOOL: Self = Self::Primitive(PrimitiveType::Bool);
    pub const VOID: Self = Self::Primitive(PrimitiveType::Void);

    /// Create a list type
    pub fn list(elem: Type) -> Self {
        Self::List(Box::new(elem))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Primitive(p) if p.is_numeric())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_) | Self::EmptyList)
    }

    pub fn is_string(&self) -> bool {
        *self == Self::STRING
    }

    /// `compatible(expected, actual)`: may a value of type `actual` be stored
    /// where `expected` is required?
    ///
    /// Numeric promotion is one-directional: an `int` fits a `double` slot,
    /// never the reverse.
    pub fn accepts(&self, actual: &Type) -> bool {
        if self == actual {
            return true;
        }
        match (self, actual) {
            (Type::Primitive(PrimitiveType::Double), Type::Primitive(PrimitiveType::Int)) => true,
            (Type::Any, _) | (_, Type::Any) => true,
            // Pending list accepts any list, and an empty list fits any list slot
            (Type::EmptyList, a) if a.is_list() => true,
            (Type::List(_), Type::EmptyList) => true,
            (Type::List(expected), Type::List(actual)) => expected.accepts(actual),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => f.write_str(p.name()),
            Type::List(elem) if **elem == Type::Any => f.write_str("list"),
            Type::List(elem) => write!(f, "list[{}]", elem),
            Type::EmptyList => f.write_str("list[empty]"),
            Type::Function(_) => f.write_str("function"),
            Type::Any => f.write_str("any"),
        }
    }
}
