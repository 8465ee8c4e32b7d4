//! Builtin primitive type descriptors.
//!
//! Primitives are immutable and equatable leaves: every algorithm compares and
//! copies them by value and never recurses into them.

use std::sync::OnceLock;

use super::{Primitive, TypeInfo};

/// `bool`.
pub fn bool_type() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| TypeInfo::primitive("bool", Primitive::Bool))
}

/// 64-bit signed integer.
pub fn int() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| TypeInfo::primitive("int", Primitive::Int))
}

/// 64-bit float.
pub fn float() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| TypeInfo::primitive("float", Primitive::Float))
}

/// Nullable immutable string.
pub fn string() -> &'static TypeInfo {
    static TYPE: OnceLock<TypeInfo> = OnceLock::new();
    TYPE.get_or_init(|| TypeInfo::primitive("string", Primitive::String))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_singletons() {
        assert!(int().ptr_eq(int()));
        assert!(!int().ptr_eq(float()));
        assert_eq!(string().as_primitive(), Some(Primitive::String));
        assert_eq!(bool_type().name(), "bool");
    }
}
