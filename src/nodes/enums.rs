// Copyright 2024 Ryan McKenzie
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scalar attribute enumerations carried by AST nodes.
//!
//! Every enum maps to and from a stable lowercase spelling used by both
//! serializers; [`from_name`](Operator::from_name)-style constructors are the
//! strict inverses the XML parser relies on.

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $spelling:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $spelling,)+
                }
            }

            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($spelling => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

named_enum! {
    /// The operator of an [`Expression`](crate::nodes::Payload::Expression).
    Operator {
        None => "none",
        Plus => "plus",
        Minus => "minus",
        Mult => "mult",
        Div => "div",
        Mod => "mod",
        Rem => "rem",
        Pow => "pow",
        Abs => "abs",
        And => "and",
        Or => "or",
        Not => "not",
        Xor => "xor",
        BitAnd => "band",
        BitOr => "bor",
        BitNot => "bnot",
        BitXor => "bxor",
        Eq => "eq",
        Neq => "neq",
        CaseEq => "case_eq",
        CaseNeq => "case_neq",
        Lt => "lt",
        Gt => "gt",
        Le => "le",
        Ge => "ge",
        Sll => "sll",
        Srl => "srl",
        Sla => "sla",
        Sra => "sra",
        Rol => "rol",
        Ror => "ror",
        Concat => "concat",
        Assign => "assign",
        Ref => "ref",
        Deref => "deref",
        AndReduce => "andrd",
        OrReduce => "orrd",
        XorReduce => "xorrd",
    }
}

impl Operator {
    #[must_use]
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Plus
                | Self::Minus
                | Self::Mult
                | Self::Div
                | Self::Mod
                | Self::Rem
                | Self::Pow
                | Self::Abs
        )
    }

    #[must_use]
    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Not | Self::Xor)
    }

    #[must_use]
    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            Self::BitAnd | Self::BitOr | Self::BitNot | Self::BitXor
        )
    }

    #[must_use]
    pub fn is_equality(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Neq | Self::CaseEq | Self::CaseNeq
        )
    }

    #[must_use]
    pub fn is_relational(self) -> bool {
        self.is_equality() || matches!(self, Self::Lt | Self::Gt | Self::Le | Self::Ge)
    }

    #[must_use]
    pub fn is_shift(self) -> bool {
        matches!(self, Self::Sll | Self::Srl | Self::Sla | Self::Sra)
    }

    #[must_use]
    pub fn is_rotate(self) -> bool {
        matches!(self, Self::Rol | Self::Ror)
    }

    #[must_use]
    pub fn is_reduce(self) -> bool {
        matches!(self, Self::AndReduce | Self::OrReduce | Self::XorReduce)
    }

    #[must_use]
    pub fn is_assignment(self) -> bool {
        matches!(self, Self::Assign)
    }

    /// Operators taking a single operand.
    #[must_use]
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            Self::Not | Self::BitNot | Self::Abs | Self::Ref | Self::Deref
        ) || self.is_reduce()
            || matches!(self, Self::Plus | Self::Minus)
    }
}

named_enum! {
    /// Direction of a [`Port`](crate::nodes::Payload::Port) or of a
    /// port/parameter binding.
    PortDirection {
        None => "none",
        In => "in",
        Out => "out",
        Inout => "inout",
    }
}

named_enum! {
    /// Direction of a [`Range`](crate::nodes::Payload::Range).
    RangeDirection {
        Upto => "upto",
        Downto => "downto",
    }
}

named_enum! {
    /// The nine logic constants of a [`BitValue`](crate::nodes::Payload::BitValue).
    BitConstant {
        U => "u",
        X => "x",
        Zero => "0",
        One => "1",
        Z => "z",
        W => "w",
        L => "l",
        H => "h",
        DontCare => "-",
    }
}

impl BitConstant {
    /// The single-character spelling used inside bitvector literals.
    #[must_use]
    pub fn to_char(self) -> char {
        match self {
            Self::U => 'U',
            Self::X => 'X',
            Self::Zero => '0',
            Self::One => '1',
            Self::Z => 'Z',
            Self::W => 'W',
            Self::L => 'L',
            Self::H => 'H',
            Self::DontCare => '-',
        }
    }

    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'U' => Some(Self::U),
            'X' => Some(Self::X),
            '0' => Some(Self::Zero),
            '1' => Some(Self::One),
            'Z' => Some(Self::Z),
            'W' => Some(Self::W),
            'L' => Some(Self::L),
            'H' => Some(Self::H),
            '-' => Some(Self::DontCare),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_01(self) -> bool {
        matches!(self, Self::Zero | Self::One)
    }
}

named_enum! {
    /// Unit of a [`TimeValue`](crate::nodes::Payload::TimeValue).
    TimeUnit {
        Fs => "fs",
        Ps => "ps",
        Ns => "ns",
        Us => "us",
        Ms => "ms",
        Second => "s",
        Minute => "min",
        Hour => "hr",
    }
}

named_enum! {
    /// Matching semantics of a `Switch` or `With`.
    CaseSemantics {
        Literal => "case_literal",
        X => "case_x",
        Z => "case_z",
    }
}

named_enum! {
    /// The source or target language a subtree belongs to.
    LanguageId {
        Rtl => "rtl",
        Tlm => "tlm",
        Cpp => "cpp",
        C => "c",
        Psl => "psl",
        Ams => "ams",
    }
}

named_enum! {
    /// Distinguishes native types from language-specific renditions.
    TypeVariant {
        Native => "native_type",
        VhdlBitfield => "vhdl_bitfield",
        SystemcInt => "systemc_int",
        SystemcBitvector => "systemc_bv",
    }
}

named_enum! {
    /// Flavor of a subprogram declaration.
    SubProgramKind {
        Instance => "instance",
        ImplicitInstance => "implicit_instance",
        Macro => "macro",
        Subroutine => "subroutine",
    }
}

macro_rules! impl_enum_default {
    ($($t:ident => $variant:ident),+ $(,)?) => {
        $(
            impl Default for $t {
                fn default() -> Self {
                    Self::$variant
                }
            }
        )+
    };
}

impl_enum_default! {
    Operator => None,
    PortDirection => None,
    RangeDirection => Downto,
    BitConstant => Zero,
    TimeUnit => Ns,
    CaseSemantics => Literal,
    LanguageId => Rtl,
    TypeVariant => Native,
    SubProgramKind => Subroutine,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_names_round_trip() {
        for op in [
            Operator::Plus,
            Operator::CaseEq,
            Operator::Concat,
            Operator::OrReduce,
            Operator::Sra,
        ] {
            assert_eq!(Operator::from_name(op.name()), Some(op));
        }
        assert_eq!(Operator::from_name("no_such_op"), None);
    }

    #[test]
    fn operator_classes_are_disjoint_where_expected() {
        assert!(Operator::CaseEq.is_equality());
        assert!(Operator::CaseEq.is_relational());
        assert!(!Operator::CaseEq.is_arithmetic());
        assert!(Operator::Sll.is_shift());
        assert!(!Operator::Sll.is_rotate());
        assert!(Operator::OrReduce.is_unary());
        assert!(!Operator::Concat.is_unary());
    }

    #[test]
    fn bit_constants_parse_both_cases() {
        assert_eq!(BitConstant::from_char('x'), Some(BitConstant::X));
        assert_eq!(BitConstant::from_char('X'), Some(BitConstant::X));
        assert_eq!(BitConstant::from_char('-'), Some(BitConstant::DontCare));
        assert_eq!(BitConstant::from_char('q'), None);
    }
}
