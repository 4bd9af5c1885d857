//! Instruction encoders for building test programs.

const fn r_type(rs: u8, rt: u8, rd: u8, shamt: u8, funct: u32) -> u32 {
    ((rs as u32) << 21) | ((rt as u32) << 16) | ((rd as u32) << 11) | ((shamt as u32) << 6) | funct
}

const fn i_type(op: u32, rs: u8, rt: u8, immediate: u16) -> u32 {
    (op << 26) | ((rs as u32) << 21) | ((rt as u32) << 16) | immediate as u32
}

pub const fn nop() -> u32 {
    0
}

pub const fn sll(rd: u8, rt: u8, shamt: u8) -> u32 {
    r_type(0, rt, rd, shamt, 0x00)
}

pub const fn srl(rd: u8, rt: u8, shamt: u8) -> u32 {
    r_type(0, rt, rd, shamt, 0x02)
}

pub const fn sra(rd: u8, rt: u8, shamt: u8) -> u32 {
    r_type(0, rt, rd, shamt, 0x03)
}

pub const fn srlv(rd: u8, rt: u8, rs: u8) -> u32 {
    r_type(rs, rt, rd, 0, 0x06)
}

pub const fn jr(rs: u8) -> u32 {
    r_type(rs, 0, 0, 0, 0x08)
}

pub const fn jalr(rd: u8, rs: u8) -> u32 {
    r_type(rs, 0, rd, 0, 0x09)
}

pub const fn syscall() -> u32 {
    0x0000_000C
}

pub const fn brk() -> u32 {
    0x0000_000D
}

pub const fn mfhi(rd: u8) -> u32 {
    r_type(0, 0, rd, 0, 0x10)
}

pub const fn mthi(rs: u8) -> u32 {
    r_type(rs, 0, 0, 0, 0x11)
}

pub const fn mflo(rd: u8) -> u32 {
    r_type(0, 0, rd, 0, 0x12)
}

pub const fn mtlo(rs: u8) -> u32 {
    r_type(rs, 0, 0, 0, 0x13)
}

pub const fn mult(rs: u8, rt: u8) -> u32 {
    r_type(rs, rt, 0, 0, 0x18)
}

pub const fn multu(rs: u8, rt: u8) -> u32 {
    r_type(rs, rt, 0, 0, 0x19)
}

pub const fn div(rs: u8, rt: u8) -> u32 {
    r_type(rs, rt, 0, 0, 0x1A)
}

pub const fn divu(rs: u8, rt: u8) -> u32 {
    r_type(rs, rt, 0, 0, 0x1B)
}

pub const fn add(rd: u8, rs: u8, rt: u8) -> u32 {
    r_type(rs, rt, rd, 0, 0x20)
}

pub const fn addu(rd: u8, rs: u8, rt: u8) -> u32 {
    r_type(rs, rt, rd, 0, 0x21)
}

pub const fn sub(rd: u8, rs: u8, rt: u8) -> u32 {
    r_type(rs, rt, rd, 0, 0x22)
}

pub const fn or(rd: u8, rs: u8, rt: u8) -> u32 {
    r_type(rs, rt, rd, 0, 0x25)
}

pub const fn j(target: u32) -> u32 {
    (0x02 << 26) | ((target >> 2) & 0x03FF_FFFF)
}

pub const fn jal(target: u32) -> u32 {
    (0x03 << 26) | ((target >> 2) & 0x03FF_FFFF)
}

pub const fn beq(rs: u8, rt: u8, offset: i16) -> u32 {
    i_type(0x04, rs, rt, offset as u16)
}

pub const fn bne(rs: u8, rt: u8, offset: i16) -> u32 {
    i_type(0x05, rs, rt, offset as u16)
}

pub const fn bltzal(rs: u8, offset: i16) -> u32 {
    i_type(0x01, rs, 0x10, offset as u16)
}

pub const fn bgez(rs: u8, offset: i16) -> u32 {
    i_type(0x01, rs, 0x01, offset as u16)
}

pub const fn addi(rt: u8, rs: u8, immediate: u16) -> u32 {
    i_type(0x08, rs, rt, immediate)
}

pub const fn addiu(rt: u8, rs: u8, immediate: u16) -> u32 {
    i_type(0x09, rs, rt, immediate)
}

pub const fn slti(rt: u8, rs: u8, immediate: u16) -> u32 {
    i_type(0x0A, rs, rt, immediate)
}

pub const fn sltiu(rt: u8, rs: u8, immediate: u16) -> u32 {
    i_type(0x0B, rs, rt, immediate)
}

pub const fn ori(rt: u8, rs: u8, immediate: u16) -> u32 {
    i_type(0x0D, rs, rt, immediate)
}

pub const fn lui(rt: u8, immediate: u16) -> u32 {
    i_type(0x0F, 0, rt, immediate)
}

pub const fn lb(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x20, base, rt, offset as u16)
}

pub const fn lh(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x21, base, rt, offset as u16)
}

pub const fn lwl(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x22, base, rt, offset as u16)
}

pub const fn lw(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x23, base, rt, offset as u16)
}

pub const fn lbu(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x24, base, rt, offset as u16)
}

pub const fn lhu(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x25, base, rt, offset as u16)
}

pub const fn lwr(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x26, base, rt, offset as u16)
}

pub const fn sb(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x28, base, rt, offset as u16)
}

pub const fn sh(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x29, base, rt, offset as u16)
}

pub const fn swl(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x2A, base, rt, offset as u16)
}

pub const fn sw(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x2B, base, rt, offset as u16)
}

pub const fn lwc(cop: u8, rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x30 | cop as u32, base, rt, offset as u16)
}

pub const fn lwc2(rt: u8, base: u8, offset: i16) -> u32 {
    lwc(2, rt, base, offset)
}

pub const fn swc2(rt: u8, base: u8, offset: i16) -> u32 {
    i_type(0x3A, base, rt, offset as u16)
}

/// `copN` with bit 25 set, so the low 25 bits are a command.
pub const fn cop(cop: u8, command: u32) -> u32 {
    ((0x10 | cop as u32) << 26) | (1 << 25) | (command & 0x01FF_FFFF)
}

const fn cop_move(cop: u8, operation: u32, rt: u8, rd: u8) -> u32 {
    ((0x10 | cop as u32) << 26) | (operation << 21) | ((rt as u32) << 16) | ((rd as u32) << 11)
}

pub const fn mfc0(rt: u8, rd: u8) -> u32 {
    cop_move(0, 0x00, rt, rd)
}

pub const fn mtc0(rt: u8, rd: u8) -> u32 {
    cop_move(0, 0x04, rt, rd)
}

pub const fn mfc2(rt: u8, rd: u8) -> u32 {
    cop_move(2, 0x00, rt, rd)
}

pub const fn mtc2(rt: u8, rd: u8) -> u32 {
    cop_move(2, 0x04, rt, rd)
}

pub const fn ctc2(rt: u8, rd: u8) -> u32 {
    cop_move(2, 0x06, rt, rd)
}

pub const fn rfe() -> u32 {
    cop(0, 0x10)
}
