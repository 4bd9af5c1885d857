pub mod cpu;
pub mod gte;

/// Declares a fieldless enum usable as a const generic argument. Handlers
/// take the discriminant (`{ ShiftType::Logical as u8 }`) and turn it back
/// into the enum with `from_raw` inside a `const` block.
macro_rules! const_param {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const fn from_raw(raw: u8) -> Self {
                $(
                    if raw == Self::$variant as u8 {
                        return Self::$variant;
                    }
                )+
                panic!(concat!("invalid ", stringify!($name)))
            }
        }
    };
}

const_param!(ShiftType { Logical, Arithmetic });

const_param!(ShiftDirection { Left, Right });

const_param!(BranchType {
    Unconditional,
    Equal,
    NotEqual,
    LessEqualZero,
    LessThanZero,
    GreaterEqualZero,
    GreaterThanZero,
});

const_param!(BranchAddressing {
    AbsoluteImmediate,
    RelativeOffset,
    AbsoluteRegister,
});

const_param!(AluOperation {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Nor,
    Multiply,
    Divide,
    SetLessThan,
});

const_param!(MemoryAccessType { Load, Store });

const_param!(MemoryTransferSize { Byte, HalfWord, Word });

const_param!(MemoryAccessPortion { Full, Left, Right });

const_param!(MultiplyMoveDirection { ToRegister, FromRegister });

const_param!(MultiplyMoveRegister { Hi, Lo });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_param_round_trip() {
        assert_eq!(BranchType::from_raw(BranchType::GreaterThanZero as u8), BranchType::GreaterThanZero);
        assert_eq!(AluOperation::from_raw(AluOperation::SetLessThan as u8), AluOperation::SetLessThan);
        assert_eq!(MemoryAccessPortion::from_raw(2), MemoryAccessPortion::Right);
    }

    #[test]
    #[should_panic(expected = "invalid ShiftType")]
    fn test_const_param_rejects_unknown() {
        ShiftType::from_raw(7);
    }
}
