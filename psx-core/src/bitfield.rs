//! Compile-time positioned bit-fields over a 32-bit word.
//!
//! Instruction words, GTE command words and a few device registers are
//! decoded through these instead of open-coded shift/mask pairs. Fields
//! that are a whole named register layout (COP0 SR/Cause, IRQ registers)
//! use `proc_bitfield::bitfield!` instead.

/// A `WIDTH`-bit field starting at bit `START` of a `u32`.
///
/// Invalid parameter pairs (zero width, or a field reaching past bit 31)
/// fail to compile as soon as the field is used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitField<const START: u32, const WIDTH: u32>;

impl<const START: u32, const WIDTH: u32> BitField<START, WIDTH> {
    pub const MASK: u32 = {
        assert!(WIDTH > 0 && START + WIDTH <= 32, "bit-field does not fit in a 32-bit word");
        (u32::MAX >> (32 - WIDTH)) << START
    };

    /// Zero-extended value of the field.
    #[inline(always)]
    pub const fn get(word: u32) -> u32 {
        (word & Self::MASK) >> START
    }

    /// Sign-extended value of the field.
    #[inline(always)]
    pub const fn get_signed(word: u32) -> i32 {
        let _ = Self::MASK;
        ((word << (32 - START - WIDTH)) as i32) >> (32 - WIDTH)
    }

    /// Returns `word` with the field replaced by the low bits of `value`.
    #[inline(always)]
    pub const fn set(word: u32, value: u32) -> u32 {
        (word & !Self::MASK) | ((value << START) & Self::MASK)
    }

    #[inline(always)]
    pub const fn is_set(word: u32) -> bool {
        const { assert!(WIDTH == 1, "boolean access needs a 1-bit field") };
        word & Self::MASK != 0
    }

    #[inline(always)]
    pub const fn set_flag(word: u32, value: bool) -> u32 {
        const { assert!(WIDTH == 1, "boolean access needs a 1-bit field") };
        if value { word | Self::MASK } else { word & !Self::MASK }
    }
}
