use crate::bitfield::BitField;
use crate::cpu::Cpu;
use crate::cpu::lut::{self, GTE_LUT, MIPS_OTHER_LUT, MIPS_REGIMM_LUT, MIPS_RTYPE_LUT};
use crate::error::ExecError;

pub type InstructionHandler = fn(&Instruction, &mut Cpu) -> Result<(), ExecError>;

type OpField = BitField<26, 6>;
type RsField = BitField<21, 5>;
type RtField = BitField<16, 5>;
type RdField = BitField<11, 5>;
type ShamtField = BitField<6, 5>;
type FunctField = BitField<0, 6>;
type ImmediateField = BitField<0, 16>;
type TargetField = BitField<0, 26>;
type CopFunctionField = BitField<0, 25>;
type CopCommandFlag = BitField<25, 1>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    // ALU
    Add,
    AddUnsigned,
    AddImmediate,
    AddImmediateUnsigned,
    Sub,
    SubUnsigned,
    Multiply,
    MultiplyUnsigned,
    Divide,
    DivideUnsigned,
    And,
    AndImmediate,
    Or,
    OrImmediate,
    Xor,
    XorImmediate,
    Nor,
    SetLessThan,
    SetLessThanImmediate,
    SetLessThanUnsigned,
    SetLessThanImmediateUnsigned,

    // Shifter
    ShiftLeftLogical,
    ShiftRightLogical,
    ShiftRightArithmetic,
    ShiftLeftLogicalVariable,
    ShiftRightLogicalVariable,
    ShiftRightArithmeticVariable,

    // Memory Access
    LoadByte,
    LoadByteUnsigned,
    LoadHalfword,
    LoadHalfwordUnsigned,
    LoadWord,
    LoadWordLeft,
    LoadWordRight,
    LoadUpperImmediate,
    StoreByte,
    StoreHalfword,
    StoreWord,
    StoreWordLeft,
    StoreWordRight,

    // Branch
    BranchEqual,
    BranchNotEqual,
    BranchGreaterThanZero,
    BranchLessEqualZero,
    BranchGreaterEqualZero,
    BranchLessThanZero,
    BranchLessThanZeroAndLink,
    BranchGreaterEqualZeroAndLink,
    Jump,
    JumpAndLink,
    JumpRegister,
    JumpAndLinkRegister,
    SystemCall,
    Break,
    MoveFromHi,
    MoveToHi,
    MoveFromLo,
    MoveToLo,

    // Coprocessor
    Coprocessor(u8),
    MoveControlFromCoprocessor(u8),
    MoveControlToCoprocessor(u8),
    MoveFromCoprocessor(u8),
    MoveToCoprocessor(u8),
    LoadWordToCoprocessor(u8),
    StoreWordFromCoprocessor(u8),
    ReturnFromException,

    // GTE
    GteRtps,
    GteNclip,
    GteOp,
    GteDpcs,
    GteIntpl,
    GteMvmva,
    GteNcds,
    GteCdp,
    GteNcdt,
    GteNccs,
    GteCc,
    GteNcs,
    GteNct,
    GteSqr,
    GteDcpl,
    GteDpct,
    GteAvsz3,
    GteAvsz4,
    GteRtpt,
    GteGpf,
    GteGpl,
    GteNcct,

    // Other
    Invalid,
}

#[derive(Clone, Copy)]
pub struct Instruction {
    pub opcode: Opcode,
    pub raw: u32,
    pub handler: InstructionHandler,
}

impl Instruction {
    /// Table entry for an unassigned opcode or function. Executing it only
    /// reports the numeric value.
    pub const fn invalid() -> Self {
        const INVALID: InstructionHandler = |instr: &Instruction, _: &mut Cpu| {
            if instr.op() == 0x00 {
                Err(ExecError::UnimplementedFunction {
                    mnemonic: "invalid",
                    funct: instr.funct(),
                })
            } else {
                Err(ExecError::UnimplementedInstruction {
                    mnemonic: "invalid",
                    opcode: instr.op(),
                })
            }
        };

        Instruction {
            opcode: Opcode::Invalid,
            raw: 0,
            handler: INVALID,
        }
    }
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        self.opcode == other.opcode && self.raw == other.raw
    }
}

impl Instruction {
    #[inline(always)]
    pub fn decode(opcode: u32) -> Self {
        let op = OpField::get(opcode);

        let instruction = match op {
            0x00 => MIPS_RTYPE_LUT[FunctField::get(opcode) as usize],
            0x01 => MIPS_REGIMM_LUT[RtField::get(opcode) as usize],
            0x10..=0x13 => {
                // The handler forwards the whole function field, the refined
                // opcode only names the operation for disassembly
                let entry = MIPS_OTHER_LUT[op as usize];
                Instruction {
                    opcode: Self::decode_cop(opcode, (op & 0x3) as u8),
                    ..entry
                }
            }
            _ => MIPS_OTHER_LUT[op as usize],
        };

        Instruction {
            raw: opcode,
            ..instruction
        }
    }

    #[inline(always)]
    pub fn op(&self) -> u8 {
        OpField::get(self.raw) as u8
    }

    #[inline(always)]
    pub fn rs(&self) -> u8 {
        RsField::get(self.raw) as u8
    }

    #[inline(always)]
    pub fn base(&self) -> u8 {
        self.rs()
    }

    #[inline(always)]
    pub fn rt(&self) -> u8 {
        RtField::get(self.raw) as u8
    }

    #[inline(always)]
    pub fn rd(&self) -> u8 {
        RdField::get(self.raw) as u8
    }

    #[inline(always)]
    pub fn shamt(&self) -> u8 {
        ShamtField::get(self.raw) as u8
    }

    #[inline(always)]
    pub fn funct(&self) -> u8 {
        FunctField::get(self.raw) as u8
    }

    #[inline(always)]
    pub fn immediate(&self) -> u16 {
        ImmediateField::get(self.raw) as u16
    }

    #[inline(always)]
    pub fn offset(&self) -> i16 {
        ImmediateField::get_signed(self.raw) as i16
    }

    /// Sign-extended immediate.
    #[inline(always)]
    pub fn simm(&self) -> u32 {
        ImmediateField::get_signed(self.raw) as u32
    }

    #[inline(always)]
    pub fn address(&self) -> u32 {
        TargetField::get(self.raw)
    }

    /// The 26-bit coprocessor function field (bit 25 included).
    #[inline(always)]
    pub fn cop_function(&self) -> u32 {
        self.raw & (CopFunctionField::MASK | CopCommandFlag::MASK)
    }

    /// `pc` is the address of the delay slot.
    #[inline(always)]
    pub fn jump_target(&self, pc: u32) -> u32 {
        (pc & 0xF000_0000) | (self.address() << 2)
    }

    /// `pc` is the address of the delay slot.
    #[inline(always)]
    pub fn branch_target(&self, pc: u32) -> u32 {
        pc.wrapping_add(self.simm() << 2)
    }

    fn decode_cop(opcode: u32, cop_num: u8) -> Opcode {
        if CopCommandFlag::is_set(opcode) {
            return match cop_num {
                0 if FunctField::get(opcode) == 0x10 => Opcode::ReturnFromException,
                2 => Self::decode_gte(opcode),
                _ => Opcode::Coprocessor(cop_num),
            };
        }

        match RsField::get(opcode) {
            0b00000 => Opcode::MoveFromCoprocessor(cop_num),
            0b00010 => Opcode::MoveControlFromCoprocessor(cop_num),
            0b00100 => Opcode::MoveToCoprocessor(cop_num),
            0b00110 => Opcode::MoveControlToCoprocessor(cop_num),
            _ => Opcode::Coprocessor(cop_num),
        }
    }

    fn decode_gte(opcode: u32) -> Opcode {
        match GTE_LUT[FunctField::get(opcode) as usize].opcode {
            Opcode::Invalid => Opcode::Coprocessor(2),
            gte_opcode => gte_opcode,
        }
    }

    // Helper methods to format instruction fields for display
    fn register_name(index: u8) -> &'static str {
        lut::REGISTER_NAME_LUT.get(index as usize).unwrap_or(&"???")
    }

    fn fmt_rd(&self) -> &'static str {
        Self::register_name(self.rd())
    }

    fn fmt_rs(&self) -> &'static str {
        Self::register_name(self.rs())
    }

    fn fmt_rt(&self) -> &'static str {
        Self::register_name(self.rt())
    }

    fn fmt_base(&self) -> &'static str {
        Self::register_name(self.base())
    }

    // Name of the coprocessor register in rd
    fn fmt_cop_rd(&self) -> String {
        let name = match self.opcode {
            Opcode::MoveFromCoprocessor(0) | Opcode::MoveToCoprocessor(0) => {
                lut::COP_REGISTER_NAME_LUT.get(self.rd() as usize).copied()
            }
            Opcode::MoveFromCoprocessor(2) | Opcode::MoveToCoprocessor(2) => {
                lut::GTE_DATA_REGISTER_NAME_LUT.get(self.rd() as usize).copied()
            }
            Opcode::MoveControlFromCoprocessor(2) | Opcode::MoveControlToCoprocessor(2) => {
                lut::GTE_CONTROL_REGISTER_NAME_LUT.get(self.rd() as usize).copied()
            }
            _ => None,
        };

        match name {
            Some(name) if name != "???" => name.to_string(),
            _ => format!("${}", self.rd()),
        }
    }

    // Name of the GTE data register in rt, for lwc2/swc2
    fn fmt_cop_rt(&self) -> String {
        match self.opcode {
            Opcode::LoadWordToCoprocessor(2) | Opcode::StoreWordFromCoprocessor(2) => {
                lut::GTE_DATA_REGISTER_NAME_LUT[self.rt() as usize].to_string()
            }
            _ => format!("${}", self.rt()),
        }
    }

    fn fmt_shamt(&self) -> String {
        format!("0x{:X}", self.shamt())
    }

    fn fmt_offset(&self) -> String {
        format!("{}", self.offset())
    }

    fn fmt_imm(&self) -> String {
        format!("0x{:X}", self.immediate())
    }

    fn fmt_simm(&self) -> String {
        format!("{}", self.offset())
    }

    fn fmt_target(&self) -> String {
        format!("0x{:08X}", self.address() << 2)
    }

    fn fmt_branch_offset(&self) -> String {
        let offset = ((self.offset() as i32) << 2) + 4;
        if offset >= 0 {
            format!("+{}", offset)
        } else {
            format!("{}", offset)
        }
    }

    fn fmt_cofun(&self) -> String {
        format!("0x{:07X}", self.cop_function() & CopFunctionField::MASK)
    }

    // Returns the format string for the instruction
    fn format_string(&self) -> &'static str {
        match self.opcode {
            // ALU - R-type
            Opcode::Add
            | Opcode::AddUnsigned
            | Opcode::Sub
            | Opcode::SubUnsigned
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Nor
            | Opcode::SetLessThan
            | Opcode::SetLessThanUnsigned => "@rd, @rs, @rt",

            // ALU - I-type
            Opcode::AddImmediate
            | Opcode::AddImmediateUnsigned
            | Opcode::SetLessThanImmediate
            | Opcode::SetLessThanImmediateUnsigned => "@rt, @rs, @simm",
            Opcode::AndImmediate | Opcode::OrImmediate | Opcode::XorImmediate => "@rt, @rs, @imm",
            Opcode::LoadUpperImmediate => "@rt, @imm",

            // Multiply/Divide
            Opcode::Multiply | Opcode::MultiplyUnsigned | Opcode::Divide | Opcode::DivideUnsigned => "@rs, @rt",

            // Shifter
            Opcode::ShiftLeftLogical | Opcode::ShiftRightLogical | Opcode::ShiftRightArithmetic => {
                "@rd, @rt, @shamt"
            }
            Opcode::ShiftLeftLogicalVariable
            | Opcode::ShiftRightLogicalVariable
            | Opcode::ShiftRightArithmeticVariable => "@rd, @rt, @rs",

            // Memory Access
            Opcode::LoadByte
            | Opcode::LoadByteUnsigned
            | Opcode::LoadHalfword
            | Opcode::LoadHalfwordUnsigned
            | Opcode::LoadWord
            | Opcode::LoadWordLeft
            | Opcode::LoadWordRight
            | Opcode::StoreByte
            | Opcode::StoreHalfword
            | Opcode::StoreWord
            | Opcode::StoreWordLeft
            | Opcode::StoreWordRight => "@rt, @offset(@base)",

            // Branches
            Opcode::BranchEqual | Opcode::BranchNotEqual => "@rs, @rt, @branch_offset",
            Opcode::BranchGreaterThanZero
            | Opcode::BranchLessEqualZero
            | Opcode::BranchGreaterEqualZero
            | Opcode::BranchLessThanZero
            | Opcode::BranchLessThanZeroAndLink
            | Opcode::BranchGreaterEqualZeroAndLink => "@rs, @branch_offset",

            // Jumps
            Opcode::Jump | Opcode::JumpAndLink => "@target",
            Opcode::JumpRegister => "@rs",
            Opcode::JumpAndLinkRegister => "@rd, @rs",

            // HI/LO
            Opcode::MoveFromHi | Opcode::MoveFromLo => "@rd",
            Opcode::MoveToHi | Opcode::MoveToLo => "@rs",

            // Coprocessor
            Opcode::MoveFromCoprocessor(_)
            | Opcode::MoveToCoprocessor(_)
            | Opcode::MoveControlFromCoprocessor(_)
            | Opcode::MoveControlToCoprocessor(_) => "@rt, @cop_rd",
            Opcode::LoadWordToCoprocessor(_) | Opcode::StoreWordFromCoprocessor(_) => "@cop_rt, @offset(@base)",
            Opcode::Coprocessor(_) => "@cofun",

            // System, rfe and GTE commands take no operands
            _ => "",
        }
    }
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "opcode: {}, op: {}, rs: {}, rt: {}, rd: {}, shamt: {}, funct: {}, immediate: {:04X}, address: {:08X}",
            self.opcode,
            self.op(),
            self.rs(),
            self.rt(),
            self.rd(),
            self.shamt(),
            self.funct(),
            self.immediate(),
            self.address()
        )
    }
}

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        const fn by_cop(names: [&'static str; 4], cop: u8) -> &'static str {
            names[(cop & 0x3) as usize]
        }

        match *self {
            // ALU
            Opcode::Add => "add",
            Opcode::AddUnsigned => "addu",
            Opcode::AddImmediate => "addi",
            Opcode::AddImmediateUnsigned => "addiu",
            Opcode::Sub => "sub",
            Opcode::SubUnsigned => "subu",
            Opcode::Multiply => "mult",
            Opcode::MultiplyUnsigned => "multu",
            Opcode::Divide => "div",
            Opcode::DivideUnsigned => "divu",
            Opcode::And => "and",
            Opcode::AndImmediate => "andi",
            Opcode::Or => "or",
            Opcode::OrImmediate => "ori",
            Opcode::Xor => "xor",
            Opcode::XorImmediate => "xori",
            Opcode::Nor => "nor",
            Opcode::SetLessThan => "slt",
            Opcode::SetLessThanImmediate => "slti",
            Opcode::SetLessThanUnsigned => "sltu",
            Opcode::SetLessThanImmediateUnsigned => "sltiu",

            // Shifter
            Opcode::ShiftLeftLogical => "sll",
            Opcode::ShiftRightLogical => "srl",
            Opcode::ShiftRightArithmetic => "sra",
            Opcode::ShiftLeftLogicalVariable => "sllv",
            Opcode::ShiftRightLogicalVariable => "srlv",
            Opcode::ShiftRightArithmeticVariable => "srav",

            // Memory Access
            Opcode::LoadByte => "lb",
            Opcode::LoadByteUnsigned => "lbu",
            Opcode::LoadHalfword => "lh",
            Opcode::LoadHalfwordUnsigned => "lhu",
            Opcode::LoadWord => "lw",
            Opcode::LoadWordLeft => "lwl",
            Opcode::LoadWordRight => "lwr",
            Opcode::LoadUpperImmediate => "lui",
            Opcode::StoreByte => "sb",
            Opcode::StoreHalfword => "sh",
            Opcode::StoreWord => "sw",
            Opcode::StoreWordLeft => "swl",
            Opcode::StoreWordRight => "swr",

            // Branch
            Opcode::BranchEqual => "beq",
            Opcode::BranchNotEqual => "bne",
            Opcode::BranchGreaterThanZero => "bgtz",
            Opcode::BranchLessEqualZero => "blez",
            Opcode::BranchGreaterEqualZero => "bgez",
            Opcode::BranchLessThanZero => "bltz",
            Opcode::BranchLessThanZeroAndLink => "bltzal",
            Opcode::BranchGreaterEqualZeroAndLink => "bgezal",
            Opcode::Jump => "j",
            Opcode::JumpAndLink => "jal",
            Opcode::JumpRegister => "jr",
            Opcode::JumpAndLinkRegister => "jalr",
            Opcode::SystemCall => "syscall",
            Opcode::Break => "break",
            Opcode::MoveFromHi => "mfhi",
            Opcode::MoveToHi => "mthi",
            Opcode::MoveFromLo => "mflo",
            Opcode::MoveToLo => "mtlo",

            // Coprocessor
            Opcode::Coprocessor(cop) => by_cop(["cop0", "cop1", "cop2", "cop3"], cop),
            Opcode::MoveFromCoprocessor(cop) => by_cop(["mfc0", "mfc1", "mfc2", "mfc3"], cop),
            Opcode::MoveToCoprocessor(cop) => by_cop(["mtc0", "mtc1", "mtc2", "mtc3"], cop),
            Opcode::MoveControlFromCoprocessor(cop) => by_cop(["cfc0", "cfc1", "cfc2", "cfc3"], cop),
            Opcode::MoveControlToCoprocessor(cop) => by_cop(["ctc0", "ctc1", "ctc2", "ctc3"], cop),
            Opcode::LoadWordToCoprocessor(cop) => by_cop(["lwc0", "lwc1", "lwc2", "lwc3"], cop),
            Opcode::StoreWordFromCoprocessor(cop) => by_cop(["swc0", "swc1", "swc2", "swc3"], cop),
            Opcode::ReturnFromException => "rfe",

            // GTE
            Opcode::GteRtps => "rtps",
            Opcode::GteNclip => "nclip",
            Opcode::GteOp => "op",
            Opcode::GteDpcs => "dpcs",
            Opcode::GteIntpl => "intpl",
            Opcode::GteMvmva => "mvmva",
            Opcode::GteNcds => "ncds",
            Opcode::GteCdp => "cdp",
            Opcode::GteNcdt => "ncdt",
            Opcode::GteNccs => "nccs",
            Opcode::GteCc => "cc",
            Opcode::GteNcs => "ncs",
            Opcode::GteNct => "nct",
            Opcode::GteSqr => "sqr",
            Opcode::GteDcpl => "dcpl",
            Opcode::GteDpct => "dpct",
            Opcode::GteAvsz3 => "avsz3",
            Opcode::GteAvsz4 => "avsz4",
            Opcode::GteRtpt => "rtpt",
            Opcode::GteGpf => "gpf",
            Opcode::GteGpl => "gpl",
            Opcode::GteNcct => "ncct",

            // Other
            Opcode::Invalid => "???",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_str = self.format_string();

        if fmt_str.is_empty() {
            // Instructions with no operands
            return write!(f, "{}", self.opcode);
        }

        // Longer tags first, so `@imm` never eats the tail of `@simm`
        let formatted = fmt_str
            .replace("@branch_offset", &self.fmt_branch_offset())
            .replace("@cop_rd", &self.fmt_cop_rd())
            .replace("@cop_rt", &self.fmt_cop_rt())
            .replace("@cofun", &self.fmt_cofun())
            .replace("@offset", &self.fmt_offset())
            .replace("@target", &self.fmt_target())
            .replace("@shamt", &self.fmt_shamt())
            .replace("@simm", &self.fmt_simm())
            .replace("@imm", &self.fmt_imm())
            .replace("@base", self.fmt_base())
            .replace("@rd", self.fmt_rd())
            .replace("@rs", self.fmt_rs())
            .replace("@rt", self.fmt_rt());

        write!(f, "{} {}", self.opcode, formatted)
    }
}
