//! Vertex kinds.
//!
//! The closed set of vertex kinds is written down once, in
//! `vertex_type_table!`, and every per-kind item (the [`VertexType`] enum, its
//! arity and operand names, the [`Visitor`](super::Visitor) handlers) is
//! generated from it.

/// The table of vertex kinds.
///
/// Each row is `Variant => visit_method, class_method, arity, [operand
/// names], "doc";` and is handed to `$callback`.
macro_rules! vertex_type_table {
    ($callback:ident) => {
        $callback! {
            Const => visit_const, visit, Arity::Fixed(0), [], "A constant bit vector.";

            VarPacked => visit_var_packed, visit_var, Arity::Variadic, [],
                "A packed variable, driven by slices at bit offsets.";
            VarArray => visit_var_array, visit_var, Arity::Variadic, [],
                "An unpacked array variable, driven by elements at indices.";

            Not => visit_not, visit_unary, Arity::Fixed(1), ["src"], "Bitwise negation.";
            Negate => visit_negate, visit_unary, Arity::Fixed(1), ["src"],
                "Two's complement negation.";
            RedAnd => visit_red_and, visit_unary, Arity::Fixed(1), ["src"], "AND reduction.";
            RedOr => visit_red_or, visit_unary, Arity::Fixed(1), ["src"], "OR reduction.";
            RedXor => visit_red_xor, visit_unary, Arity::Fixed(1), ["src"], "XOR reduction.";
            LogNot => visit_log_not, visit_unary, Arity::Fixed(1), ["src"], "Logical negation.";
            Extend => visit_extend, visit_unary, Arity::Fixed(1), ["src"], "Zero extension.";
            ExtendS => visit_extend_s, visit_unary, Arity::Fixed(1), ["src"], "Sign extension.";

            And => visit_and, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Bitwise AND.";
            Or => visit_or, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Bitwise OR.";
            Xor => visit_xor, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Bitwise XOR.";
            Add => visit_add, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Addition.";
            Sub => visit_sub, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Subtraction.";
            Mul => visit_mul, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Multiplication.";
            Div => visit_div, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Unsigned division.";
            ShiftL => visit_shift_l, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Left shift.";
            ShiftR => visit_shift_r, visit_binary, Arity::Fixed(2), ["lhs", "rhs"],
                "Logical right shift.";
            ShiftRS => visit_shift_rs, visit_binary, Arity::Fixed(2), ["lhs", "rhs"],
                "Arithmetic right shift.";
            Eq => visit_eq, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Equality.";
            Neq => visit_neq, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Inequality.";
            Lt => visit_lt, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Unsigned less than.";
            Lte => visit_lte, visit_binary, Arity::Fixed(2), ["lhs", "rhs"],
                "Unsigned less than or equal.";
            Gt => visit_gt, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Unsigned greater than.";
            Gte => visit_gte, visit_binary, Arity::Fixed(2), ["lhs", "rhs"],
                "Unsigned greater than or equal.";
            LogAnd => visit_log_and, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Logical AND.";
            LogOr => visit_log_or, visit_binary, Arity::Fixed(2), ["lhs", "rhs"], "Logical OR.";
            Concat => visit_concat, visit_binary, Arity::Fixed(2), ["lhs", "rhs"],
                "Concatenation, `lhs` in the upper bits.";
            Replicate => visit_replicate, visit_binary, Arity::Fixed(2), ["src", "count"],
                "Replication of `src` by a constant `count`.";
            ArraySel => visit_array_sel, visit_binary, Arity::Fixed(2), ["from", "bit"],
                "Element select from an unpacked array.";

            Cond => visit_cond, visit_ternary, Arity::Fixed(3), ["cond", "then", "else"],
                "Conditional (ternary) operator.";
            Sel => visit_sel, visit_ternary, Arity::Fixed(3), ["from", "lsb", "width"],
                "Bit range select.";

            CountBits => visit_count_bits, visit_quaternary, Arity::Fixed(4),
                ["src", "ctrl0", "ctrl1", "ctrl2"],
                "Number of bits of `src` equal to any of the control bits.";
        }
    };
}

/// The number of operands a vertex kind takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// A fixed number of operands, stored inline.
    Fixed(usize),
    /// Any number of operands, appended one by one.
    Variadic,
}

/// Maximum number of operands of a fixed-arity kind.
pub const MAX_FIXED_ARITY: usize = 4;

macro_rules! define_vertex_types {
    ($(
        $variant:ident => $visit:ident, $class:ident, $arity:expr,
            [$($operand:literal),*], $doc:literal;
    )*) => {
        /// The kind of a vertex.
        ///
        /// The kind of a vertex never changes after construction.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            strum::EnumIter, strum::EnumCount, strum::IntoStaticStr,
        )]
        pub enum VertexType {
            $(
                #[doc = $doc]
                $variant,
            )*
        }

        impl VertexType {
            /// The arity of the kind.
            pub fn arity(self) -> Arity {
                match self {
                    $(VertexType::$variant => $arity,)*
                }
            }

            /// The names of the operands of a fixed-arity kind, empty for
            /// constants and variables.
            pub fn operand_names(self) -> &'static [&'static str] {
                match self {
                    $(VertexType::$variant => &[$($operand),*],)*
                }
            }
        }
    };
}

vertex_type_table!(define_vertex_types);

impl VertexType {
    /// The name of the kind, as used in dumps.
    pub fn name(self) -> &'static str { self.into() }

    /// Check if the kind is [`VertexType::Const`].
    pub fn is_const(self) -> bool { self == VertexType::Const }

    /// Check if the kind is a variable reference.
    pub fn is_var(self) -> bool { matches!(self, VertexType::VarPacked | VertexType::VarArray) }

    /// Check if the kind is an operator, i.e. neither a constant nor a
    /// variable.
    pub fn is_operator(self) -> bool { !self.is_const() && !self.is_var() }
}

/// A closed class of vertex kinds, used by
/// [`Vertex::is`](super::Vertex::is).
pub trait VertexClass {
    /// Check if the kind belongs to the class.
    fn test(ty: VertexType) -> bool;
}

macro_rules! arity_class {
    ($name:ident, $arity:literal, $doc:literal) => {
        #[doc = $doc]
        pub struct $name;

        impl VertexClass for $name {
            fn test(ty: VertexType) -> bool {
                ty.is_operator() && ty.arity() == Arity::Fixed($arity)
            }
        }
    };
}

arity_class!(Unary, 1, "Operators with one operand.");
arity_class!(Binary, 2, "Operators with two operands.");
arity_class!(Ternary, 3, "Operators with three operands.");
arity_class!(Quaternary, 4, "Operators with four operands.");

/// All operators.
pub struct Operator;

impl VertexClass for Operator {
    fn test(ty: VertexType) -> bool { ty.is_operator() }
}

#[cfg(test)]
mod tests {
    use strum::{EnumCount, IntoEnumIterator};

    use super::*;

    #[test]
    fn test_operand_names_match_arity() {
        for ty in VertexType::iter() {
            match ty.arity() {
                Arity::Fixed(n) => {
                    assert!(n <= MAX_FIXED_ARITY);
                    assert_eq!(ty.operand_names().len(), n, "{}", ty.name());
                }
                Arity::Variadic => assert!(ty.is_var()),
            }
        }
    }

    #[test]
    fn test_classes() {
        assert_eq!(VertexType::iter().count(), VertexType::COUNT);
        assert_eq!(VertexType::iter().filter(|ty| Unary::test(*ty)).count(), 8);
        assert_eq!(VertexType::iter().filter(|ty| Binary::test(*ty)).count(), 21);
        assert_eq!(VertexType::iter().filter(|ty| Ternary::test(*ty)).count(), 2);
        assert_eq!(VertexType::iter().filter(|ty| Quaternary::test(*ty)).count(), 1);
        assert_eq!(
            VertexType::iter().filter(|ty| Operator::test(*ty)).count(),
            VertexType::COUNT - 3
        );
        assert!(!Unary::test(VertexType::Const));
        assert!(VertexType::VarArray.is_var());
        assert_eq!(VertexType::ShiftRS.name(), "ShiftRS");
        assert_eq!(VertexType::Sel.operand_names(), &["from", "lsb", "width"]);
    }
}
