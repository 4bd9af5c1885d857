use crate::cpu::cop::cop2::{Cop2, GteCommand};
use crate::cpu::decoder::{Instruction, Opcode};
use crate::cpu::interpreter::cpu::{
    alu, branch, coprocessor, coprocessor_transfer, debug_break, load_store, move_multiply, shift, system_call,
};
use crate::cpu::interpreter::{
    AluOperation, BranchAddressing, BranchType, MemoryAccessPortion, MemoryAccessType, MemoryTransferSize,
    MultiplyMoveDirection, MultiplyMoveRegister, ShiftDirection, ShiftType, gte,
};

macro_rules! instruction {
    ($name:ident, $handler:expr) => {
        Instruction {
            opcode: crate::cpu::decoder::Opcode::$name,
            raw: 0,
            handler: $handler,
        }
    };
    ($name:ident($param:expr), $handler:expr) => {
        Instruction {
            opcode: crate::cpu::decoder::Opcode::$name($param),
            raw: 0,
            handler: $handler,
        }
    };
}

// opcode = 0x00
pub static MIPS_RTYPE_LUT: [Instruction; 64] = [
    /* 0x00 */
    instruction!(
        ShiftLeftLogical,
        shift::<{ ShiftDirection::Left as u8 }, { ShiftType::Logical as u8 }, false>
    ),
    /* 0x01 */ Instruction::invalid(),
    /* 0x02 */
    instruction!(
        ShiftRightLogical,
        shift::<{ ShiftDirection::Right as u8 }, { ShiftType::Logical as u8 }, false>
    ),
    /* 0x03 */
    instruction!(
        ShiftRightArithmetic,
        shift::<{ ShiftDirection::Right as u8 }, { ShiftType::Arithmetic as u8 }, false>
    ),
    /* 0x04 */
    instruction!(
        ShiftLeftLogicalVariable,
        shift::<{ ShiftDirection::Left as u8 }, { ShiftType::Logical as u8 }, true>
    ),
    /* 0x05 */ Instruction::invalid(),
    /* 0x06 */
    instruction!(
        ShiftRightLogicalVariable,
        shift::<{ ShiftDirection::Right as u8 }, { ShiftType::Logical as u8 }, true>
    ),
    /* 0x07 */
    instruction!(
        ShiftRightArithmeticVariable,
        shift::<{ ShiftDirection::Right as u8 }, { ShiftType::Arithmetic as u8 }, true>
    ),
    /* 0x08 */
    instruction!(
        JumpRegister,
        branch::<false, { BranchType::Unconditional as u8 }, { BranchAddressing::AbsoluteRegister as u8 }>
    ),
    /* 0x09 */
    instruction!(
        JumpAndLinkRegister,
        branch::<true, { BranchType::Unconditional as u8 }, { BranchAddressing::AbsoluteRegister as u8 }>
    ),
    /* 0x0A */ Instruction::invalid(),
    /* 0x0B */ Instruction::invalid(),
    /* 0x0C */ instruction!(SystemCall, system_call),
    /* 0x0D */ instruction!(Break, debug_break),
    /* 0x0E */ Instruction::invalid(),
    /* 0x0F */ Instruction::invalid(),
    /* 0x10 */
    instruction!(
        MoveFromHi,
        move_multiply::<{ MultiplyMoveDirection::FromRegister as u8 }, { MultiplyMoveRegister::Hi as u8 }>
    ),
    /* 0x11 */
    instruction!(
        MoveToHi,
        move_multiply::<{ MultiplyMoveDirection::ToRegister as u8 }, { MultiplyMoveRegister::Hi as u8 }>
    ),
    /* 0x12 */
    instruction!(
        MoveFromLo,
        move_multiply::<{ MultiplyMoveDirection::FromRegister as u8 }, { MultiplyMoveRegister::Lo as u8 }>
    ),
    /* 0x13 */
    instruction!(
        MoveToLo,
        move_multiply::<{ MultiplyMoveDirection::ToRegister as u8 }, { MultiplyMoveRegister::Lo as u8 }>
    ),
    /* 0x14 */ Instruction::invalid(),
    /* 0x15 */ Instruction::invalid(),
    /* 0x16 */ Instruction::invalid(),
    /* 0x17 */ Instruction::invalid(),
    /* 0x18 */ instruction!(Multiply, alu::<{ AluOperation::Multiply as u8 }, false, false>),
    /* 0x19 */ instruction!(MultiplyUnsigned, alu::<{ AluOperation::Multiply as u8 }, true, false>),
    /* 0x1A */ instruction!(Divide, alu::<{ AluOperation::Divide as u8 }, false, false>),
    /* 0x1B */ instruction!(DivideUnsigned, alu::<{ AluOperation::Divide as u8 }, true, false>),
    /* 0x1C */ Instruction::invalid(),
    /* 0x1D */ Instruction::invalid(),
    /* 0x1E */ Instruction::invalid(),
    /* 0x1F */ Instruction::invalid(),
    /* 0x20 */ instruction!(Add, alu::<{ AluOperation::Add as u8 }, false, false>),
    /* 0x21 */ instruction!(AddUnsigned, alu::<{ AluOperation::Add as u8 }, true, false>),
    /* 0x22 */ instruction!(Sub, alu::<{ AluOperation::Sub as u8 }, false, false>),
    /* 0x23 */ instruction!(SubUnsigned, alu::<{ AluOperation::Sub as u8 }, true, false>),
    /* 0x24 */ instruction!(And, alu::<{ AluOperation::And as u8 }, false, false>),
    /* 0x25 */ instruction!(Or, alu::<{ AluOperation::Or as u8 }, false, false>),
    /* 0x26 */ instruction!(Xor, alu::<{ AluOperation::Xor as u8 }, false, false>),
    /* 0x27 */ instruction!(Nor, alu::<{ AluOperation::Nor as u8 }, false, false>),
    /* 0x28 */ Instruction::invalid(),
    /* 0x29 */ Instruction::invalid(),
    /* 0x2A */ instruction!(SetLessThan, alu::<{ AluOperation::SetLessThan as u8 }, false, false>),
    /* 0x2B */ instruction!(SetLessThanUnsigned, alu::<{ AluOperation::SetLessThan as u8 }, true, false>),
    /* 0x2C */ Instruction::invalid(),
    /* 0x2D */ Instruction::invalid(),
    /* 0x2E */ Instruction::invalid(),
    /* 0x2F */ Instruction::invalid(),
    /* 0x30 */ Instruction::invalid(),
    /* 0x31 */ Instruction::invalid(),
    /* 0x32 */ Instruction::invalid(),
    /* 0x33 */ Instruction::invalid(),
    /* 0x34 */ Instruction::invalid(),
    /* 0x35 */ Instruction::invalid(),
    /* 0x36 */ Instruction::invalid(),
    /* 0x37 */ Instruction::invalid(),
    /* 0x38 */ Instruction::invalid(),
    /* 0x39 */ Instruction::invalid(),
    /* 0x3A */ Instruction::invalid(),
    /* 0x3B */ Instruction::invalid(),
    /* 0x3C */ Instruction::invalid(),
    /* 0x3D */ Instruction::invalid(),
    /* 0x3E */ Instruction::invalid(),
    /* 0x3F */ Instruction::invalid(),
];

// opcode = 0x01, indexed by rt
pub static MIPS_REGIMM_LUT: [Instruction; 32] = [
    /* 0x00 */
    instruction!(
        BranchLessThanZero,
        branch::<false, { BranchType::LessThanZero as u8 }, { BranchAddressing::RelativeOffset as u8 }>
    ),
    /* 0x01 */
    instruction!(
        BranchGreaterEqualZero,
        branch::<false, { BranchType::GreaterEqualZero as u8 }, { BranchAddressing::RelativeOffset as u8 }>
    ),
    /* 0x02 */ Instruction::invalid(),
    /* 0x03 */ Instruction::invalid(),
    /* 0x04 */ Instruction::invalid(),
    /* 0x05 */ Instruction::invalid(),
    /* 0x06 */ Instruction::invalid(),
    /* 0x07 */ Instruction::invalid(),
    /* 0x08 */ Instruction::invalid(),
    /* 0x09 */ Instruction::invalid(),
    /* 0x0A */ Instruction::invalid(),
    /* 0x0B */ Instruction::invalid(),
    /* 0x0C */ Instruction::invalid(),
    /* 0x0D */ Instruction::invalid(),
    /* 0x0E */ Instruction::invalid(),
    /* 0x0F */ Instruction::invalid(),
    /* 0x10 */
    instruction!(
        BranchLessThanZeroAndLink,
        branch::<true, { BranchType::LessThanZero as u8 }, { BranchAddressing::RelativeOffset as u8 }>
    ),
    /* 0x11 */
    instruction!(
        BranchGreaterEqualZeroAndLink,
        branch::<true, { BranchType::GreaterEqualZero as u8 }, { BranchAddressing::RelativeOffset as u8 }>
    ),
    /* 0x12 */ Instruction::invalid(),
    /* 0x13 */ Instruction::invalid(),
    /* 0x14 */ Instruction::invalid(),
    /* 0x15 */ Instruction::invalid(),
    /* 0x16 */ Instruction::invalid(),
    /* 0x17 */ Instruction::invalid(),
    /* 0x18 */ Instruction::invalid(),
    /* 0x19 */ Instruction::invalid(),
    /* 0x1A */ Instruction::invalid(),
    /* 0x1B */ Instruction::invalid(),
    /* 0x1C */ Instruction::invalid(),
    /* 0x1D */ Instruction::invalid(),
    /* 0x1E */ Instruction::invalid(),
    /* 0x1F */ Instruction::invalid(),
];

// Every other primary opcode. 0x00 and 0x01 are routed to the tables above.
pub static MIPS_OTHER_LUT: [Instruction; 64] = [
    /* 0x00 */ Instruction::invalid(),
    /* 0x01 */ Instruction::invalid(),
    /* 0x02 */
    instruction!(
        Jump,
        branch::<false, { BranchType::Unconditional as u8 }, { BranchAddressing::AbsoluteImmediate as u8 }>
    ),
    /* 0x03 */
    instruction!(
        JumpAndLink,
        branch::<true, { BranchType::Unconditional as u8 }, { BranchAddressing::AbsoluteImmediate as u8 }>
    ),
    /* 0x04 */
    instruction!(
        BranchEqual,
        branch::<false, { BranchType::Equal as u8 }, { BranchAddressing::RelativeOffset as u8 }>
    ),
    /* 0x05 */
    instruction!(
        BranchNotEqual,
        branch::<false, { BranchType::NotEqual as u8 }, { BranchAddressing::RelativeOffset as u8 }>
    ),
    /* 0x06 */
    instruction!(
        BranchLessEqualZero,
        branch::<false, { BranchType::LessEqualZero as u8 }, { BranchAddressing::RelativeOffset as u8 }>
    ),
    /* 0x07 */
    instruction!(
        BranchGreaterThanZero,
        branch::<false, { BranchType::GreaterThanZero as u8 }, { BranchAddressing::RelativeOffset as u8 }>
    ),
    /* 0x08 */ instruction!(AddImmediate, alu::<{ AluOperation::Add as u8 }, false, true>),
    /* 0x09 */ instruction!(AddImmediateUnsigned, alu::<{ AluOperation::Add as u8 }, true, true>),
    /* 0x0A */ instruction!(SetLessThanImmediate, alu::<{ AluOperation::SetLessThan as u8 }, false, true>),
    /* 0x0B */
    instruction!(
        SetLessThanImmediateUnsigned,
        alu::<{ AluOperation::SetLessThan as u8 }, true, true>
    ),
    /* 0x0C */ instruction!(AndImmediate, alu::<{ AluOperation::And as u8 }, false, true>),
    /* 0x0D */ instruction!(OrImmediate, alu::<{ AluOperation::Or as u8 }, false, true>),
    /* 0x0E */ instruction!(XorImmediate, alu::<{ AluOperation::Xor as u8 }, false, true>),
    /* 0x0F */
    instruction!(
        LoadUpperImmediate,
        load_store::<
            true,
            { MemoryAccessType::Load as u8 },
            { MemoryTransferSize::Word as u8 },
            { MemoryAccessPortion::Full as u8 },
            false,
        >
    ),
    /* 0x10 */ instruction!(Coprocessor(0), coprocessor::<0>),
    /* 0x11 */ instruction!(Coprocessor(1), coprocessor::<1>),
    /* 0x12 */ instruction!(Coprocessor(2), coprocessor::<2>),
    /* 0x13 */ instruction!(Coprocessor(3), coprocessor::<3>),
    /* 0x14 */ Instruction::invalid(),
    /* 0x15 */ Instruction::invalid(),
    /* 0x16 */ Instruction::invalid(),
    /* 0x17 */ Instruction::invalid(),
    /* 0x18 */ Instruction::invalid(),
    /* 0x19 */ Instruction::invalid(),
    /* 0x1A */ Instruction::invalid(),
    /* 0x1B */ Instruction::invalid(),
    /* 0x1C */ Instruction::invalid(),
    /* 0x1D */ Instruction::invalid(),
    /* 0x1E */ Instruction::invalid(),
    /* 0x1F */ Instruction::invalid(),
    /* 0x20 */
    instruction!(
        LoadByte,
        load_store::<
            false,
            { MemoryAccessType::Load as u8 },
            { MemoryTransferSize::Byte as u8 },
            { MemoryAccessPortion::Full as u8 },
            true,
        >
    ),
    /* 0x21 */
    instruction!(
        LoadHalfword,
        load_store::<
            false,
            { MemoryAccessType::Load as u8 },
            { MemoryTransferSize::HalfWord as u8 },
            { MemoryAccessPortion::Full as u8 },
            true,
        >
    ),
    /* 0x22 */
    instruction!(
        LoadWordLeft,
        load_store::<
            false,
            { MemoryAccessType::Load as u8 },
            { MemoryTransferSize::Word as u8 },
            { MemoryAccessPortion::Left as u8 },
            false,
        >
    ),
    /* 0x23 */
    instruction!(
        LoadWord,
        load_store::<
            false,
            { MemoryAccessType::Load as u8 },
            { MemoryTransferSize::Word as u8 },
            { MemoryAccessPortion::Full as u8 },
            false,
        >
    ),
    /* 0x24 */
    instruction!(
        LoadByteUnsigned,
        load_store::<
            false,
            { MemoryAccessType::Load as u8 },
            { MemoryTransferSize::Byte as u8 },
            { MemoryAccessPortion::Full as u8 },
            false,
        >
    ),
    /* 0x25 */
    instruction!(
        LoadHalfwordUnsigned,
        load_store::<
            false,
            { MemoryAccessType::Load as u8 },
            { MemoryTransferSize::HalfWord as u8 },
            { MemoryAccessPortion::Full as u8 },
            false,
        >
    ),
    /* 0x26 */
    instruction!(
        LoadWordRight,
        load_store::<
            false,
            { MemoryAccessType::Load as u8 },
            { MemoryTransferSize::Word as u8 },
            { MemoryAccessPortion::Right as u8 },
            false,
        >
    ),
    /* 0x27 */ Instruction::invalid(),
    /* 0x28 */
    instruction!(
        StoreByte,
        load_store::<
            false,
            { MemoryAccessType::Store as u8 },
            { MemoryTransferSize::Byte as u8 },
            { MemoryAccessPortion::Full as u8 },
            false,
        >
    ),
    /* 0x29 */
    instruction!(
        StoreHalfword,
        load_store::<
            false,
            { MemoryAccessType::Store as u8 },
            { MemoryTransferSize::HalfWord as u8 },
            { MemoryAccessPortion::Full as u8 },
            false,
        >
    ),
    /* 0x2A */
    instruction!(
        StoreWordLeft,
        load_store::<
            false,
            { MemoryAccessType::Store as u8 },
            { MemoryTransferSize::Word as u8 },
            { MemoryAccessPortion::Left as u8 },
            false,
        >
    ),
    /* 0x2B */
    instruction!(
        StoreWord,
        load_store::<
            false,
            { MemoryAccessType::Store as u8 },
            { MemoryTransferSize::Word as u8 },
            { MemoryAccessPortion::Full as u8 },
            false,
        >
    ),
    /* 0x2C */ Instruction::invalid(),
    /* 0x2D */ Instruction::invalid(),
    /* 0x2E */
    instruction!(
        StoreWordRight,
        load_store::<
            false,
            { MemoryAccessType::Store as u8 },
            { MemoryTransferSize::Word as u8 },
            { MemoryAccessPortion::Right as u8 },
            false,
        >
    ),
    /* 0x2F */ Instruction::invalid(),
    /* 0x30 */ instruction!(LoadWordToCoprocessor(0), coprocessor_transfer::<0, { MemoryAccessType::Load as u8 }>),
    /* 0x31 */ instruction!(LoadWordToCoprocessor(1), coprocessor_transfer::<1, { MemoryAccessType::Load as u8 }>),
    /* 0x32 */ instruction!(LoadWordToCoprocessor(2), coprocessor_transfer::<2, { MemoryAccessType::Load as u8 }>),
    /* 0x33 */ instruction!(LoadWordToCoprocessor(3), coprocessor_transfer::<3, { MemoryAccessType::Load as u8 }>),
    /* 0x34 */ Instruction::invalid(),
    /* 0x35 */ Instruction::invalid(),
    /* 0x36 */ Instruction::invalid(),
    /* 0x37 */ Instruction::invalid(),
    /* 0x38 */
    instruction!(StoreWordFromCoprocessor(0), coprocessor_transfer::<0, { MemoryAccessType::Store as u8 }>),
    /* 0x39 */
    instruction!(StoreWordFromCoprocessor(1), coprocessor_transfer::<1, { MemoryAccessType::Store as u8 }>),
    /* 0x3A */
    instruction!(StoreWordFromCoprocessor(2), coprocessor_transfer::<2, { MemoryAccessType::Store as u8 }>),
    /* 0x3B */
    instruction!(StoreWordFromCoprocessor(3), coprocessor_transfer::<3, { MemoryAccessType::Store as u8 }>),
    /* 0x3C */ Instruction::invalid(),
    /* 0x3D */ Instruction::invalid(),
    /* 0x3E */ Instruction::invalid(),
    /* 0x3F */ Instruction::invalid(),
];

pub type GteHandler = fn(&mut Cop2, GteCommand);

/// A GTE command table entry. `cost` is the command's cycle weight.
#[derive(Clone, Copy)]
pub struct GteOperation {
    pub opcode: Opcode,
    pub cost: u32,
    pub handler: GteHandler,
}

impl GteOperation {
    pub const fn unknown() -> Self {
        Self {
            opcode: Opcode::Invalid,
            cost: 0,
            handler: |_, _| {},
        }
    }
}

macro_rules! command {
    ($name:ident, $cost:expr, $handler:expr) => {
        GteOperation {
            opcode: Opcode::$name,
            cost: $cost,
            handler: $handler,
        }
    };
}

// Indexed by the low six bits of the command word
pub static GTE_LUT: [GteOperation; 0x40] = [
    /* 0x00 */ GteOperation::unknown(),
    /* 0x01 */ command!(GteRtps, 15, gte::rtps),
    /* 0x02 */ GteOperation::unknown(),
    /* 0x03 */ GteOperation::unknown(),
    /* 0x04 */ GteOperation::unknown(),
    /* 0x05 */ GteOperation::unknown(),
    /* 0x06 */ command!(GteNclip, 8, gte::nclip),
    /* 0x07 */ GteOperation::unknown(),
    /* 0x08 */ GteOperation::unknown(),
    /* 0x09 */ GteOperation::unknown(),
    /* 0x0A */ GteOperation::unknown(),
    /* 0x0B */ GteOperation::unknown(),
    /* 0x0C */ command!(GteOp, 6, gte::op),
    /* 0x0D */ GteOperation::unknown(),
    /* 0x0E */ GteOperation::unknown(),
    /* 0x0F */ GteOperation::unknown(),
    /* 0x10 */ command!(GteDpcs, 8, gte::dpcs),
    /* 0x11 */ command!(GteIntpl, 8, gte::intpl),
    /* 0x12 */ command!(GteMvmva, 8, gte::mvmva),
    /* 0x13 */ command!(GteNcds, 19, gte::ncds),
    /* 0x14 */ command!(GteCdp, 13, gte::cdp),
    /* 0x15 */ GteOperation::unknown(),
    /* 0x16 */ command!(GteNcdt, 44, gte::ncdt),
    /* 0x17 */ GteOperation::unknown(),
    /* 0x18 */ GteOperation::unknown(),
    /* 0x19 */ GteOperation::unknown(),
    /* 0x1A */ GteOperation::unknown(),
    /* 0x1B */ command!(GteNccs, 17, gte::nccs),
    /* 0x1C */ command!(GteCc, 11, gte::cc),
    /* 0x1D */ GteOperation::unknown(),
    /* 0x1E */ command!(GteNcs, 14, gte::ncs),
    /* 0x1F */ GteOperation::unknown(),
    /* 0x20 */ command!(GteNct, 30, gte::nct),
    /* 0x21 */ GteOperation::unknown(),
    /* 0x22 */ GteOperation::unknown(),
    /* 0x23 */ GteOperation::unknown(),
    /* 0x24 */ GteOperation::unknown(),
    /* 0x25 */ GteOperation::unknown(),
    /* 0x26 */ GteOperation::unknown(),
    /* 0x27 */ GteOperation::unknown(),
    /* 0x28 */ command!(GteSqr, 5, gte::sqr),
    /* 0x29 */ command!(GteDcpl, 8, gte::dcpl),
    /* 0x2A */ command!(GteDpct, 17, gte::dpct),
    /* 0x2B */ GteOperation::unknown(),
    /* 0x2C */ GteOperation::unknown(),
    /* 0x2D */ command!(GteAvsz3, 5, gte::avsz3),
    /* 0x2E */ command!(GteAvsz4, 6, gte::avsz4),
    /* 0x2F */ GteOperation::unknown(),
    /* 0x30 */ command!(GteRtpt, 23, gte::rtpt),
    /* 0x31 */ GteOperation::unknown(),
    /* 0x32 */ GteOperation::unknown(),
    /* 0x33 */ GteOperation::unknown(),
    /* 0x34 */ GteOperation::unknown(),
    /* 0x35 */ GteOperation::unknown(),
    /* 0x36 */ GteOperation::unknown(),
    /* 0x37 */ GteOperation::unknown(),
    /* 0x38 */ GteOperation::unknown(),
    /* 0x39 */ GteOperation::unknown(),
    /* 0x3A */ GteOperation::unknown(),
    /* 0x3B */ GteOperation::unknown(),
    /* 0x3C */ GteOperation::unknown(),
    /* 0x3D */ command!(GteGpf, 5, gte::gpf),
    /* 0x3E */ command!(GteGpl, 5, gte::gpl),
    /* 0x3F */ command!(GteNcct, 39, gte::ncct),
];

pub static REGISTER_NAME_LUT: [&str; 32] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4", "$t5", "$t6", "$t7",
    "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9", "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
];

pub static COP_REGISTER_NAME_LUT: [&str; 16] = [
    "???", "???", "???", "BPC", "???", "BDA", "TAR", "DCIC", "BadA", "BDAM", "???", "BPCM", "SR", "CAUSE", "EPC",
    "PRID",
];

// GTE Data Registers (cop2r0-31)
pub static GTE_DATA_REGISTER_NAME_LUT: [&str; 32] = [
    "vxy0", "vz0", "vxy1", "vz1", "vxy2", "vz2", "rgbc", "otz", "ir0", "ir1", "ir2", "ir3", "sxy0", "sxy1", "sxy2",
    "sxyp", "sz0", "sz1", "sz2", "sz3", "rgb0", "rgb1", "rgb2", "res1", "mac0", "mac1", "mac2", "mac3", "irgb", "orgb",
    "lzcs", "lzcr",
];

// GTE Control Registers (cop2r32-63)
pub static GTE_CONTROL_REGISTER_NAME_LUT: [&str; 32] = [
    "r11r12", "r13r21", "r22r23", "r31r32", "r33", "trx", "try", "trz", "l11l12", "l13l21", "l22l23", "l31l32", "l33",
    "rbk", "gbk", "bbk", "lr1lr2", "lr3lg1", "lg2lg3", "lb1lb2", "lb3", "rfc", "gfc", "bfc", "ofx", "ofy", "h", "dqa",
    "dqb", "zsf3", "zsf4", "flag",
];
