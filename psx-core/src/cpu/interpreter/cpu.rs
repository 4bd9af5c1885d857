use crate::cpu::Cpu;
use crate::cpu::cop::Cop;
use crate::cpu::cop::cop0::Exception;
use crate::cpu::decoder::Instruction;
use crate::cpu::interpreter::{
    AluOperation, BranchAddressing, BranchType, MemoryAccessPortion, MemoryAccessType, MemoryTransferSize,
    MultiplyMoveDirection, MultiplyMoveRegister, ShiftDirection, ShiftType,
};
use crate::error::ExecError;
use crate::mmu::bus::Width;

pub fn shift<const DIRECTION: u8, const TYPE: u8, const VARIABLE: bool>(
    instr: &Instruction, cpu: &mut Cpu,
) -> Result<(), ExecError> {
    let direction = const { ShiftDirection::from_raw(DIRECTION) };
    let shift_type = const { ShiftType::from_raw(TYPE) };

    let amount = if VARIABLE {
        cpu.read_register(instr.rs()) & 0x1F
    } else {
        instr.shamt() as u32
    };
    let value = cpu.read_register(instr.rt());

    let result = match (direction, shift_type) {
        (ShiftDirection::Left, _) => value << amount,
        (ShiftDirection::Right, ShiftType::Logical) => value >> amount,
        (ShiftDirection::Right, ShiftType::Arithmetic) => ((value as i32) >> amount) as u32,
    };

    cpu.write_register(instr.rd(), result);
    Ok(())
}

/// Branches and jumps. The target is latched now and taken after the delay
/// slot; `cpu.pc` already points at the delay slot.
pub fn branch<const LINK: bool, const TYPE: u8, const ADDRESSING: u8>(
    instr: &Instruction, cpu: &mut Cpu,
) -> Result<(), ExecError> {
    let branch_type = const { BranchType::from_raw(TYPE) };
    let addressing = const { BranchAddressing::from_raw(ADDRESSING) };

    let rs = cpu.read_register(instr.rs());
    let rt = cpu.read_register(instr.rt());

    let taken = match branch_type {
        BranchType::Unconditional => true,
        BranchType::Equal => rs == rt,
        BranchType::NotEqual => rs != rt,
        BranchType::LessEqualZero => (rs as i32) <= 0,
        BranchType::LessThanZero => (rs as i32) < 0,
        BranchType::GreaterEqualZero => (rs as i32) >= 0,
        BranchType::GreaterThanZero => (rs as i32) > 0,
    };

    // The link is written whether or not the branch is taken
    if LINK {
        let link_register = match addressing {
            BranchAddressing::AbsoluteRegister => instr.rd(),
            _ => 31,
        };
        cpu.write_register(link_register, cpu.pc.wrapping_add(4));
    }

    if taken {
        let target = match addressing {
            BranchAddressing::AbsoluteImmediate => instr.jump_target(cpu.pc),
            BranchAddressing::RelativeOffset => instr.branch_target(cpu.pc),
            BranchAddressing::AbsoluteRegister => rs,
        };
        cpu.set_branch(target);
    }

    Ok(())
}

pub fn alu<const OPERATION: u8, const UNSIGNED: bool, const IMMEDIATE: bool>(
    instr: &Instruction, cpu: &mut Cpu,
) -> Result<(), ExecError> {
    let operation = const { AluOperation::from_raw(OPERATION) };

    let x = cpu.read_register(instr.rs());
    let y = if IMMEDIATE {
        match operation {
            AluOperation::And | AluOperation::Or | AluOperation::Xor => instr.immediate() as u32,
            _ => instr.simm(),
        }
    } else {
        cpu.read_register(instr.rt())
    };
    let dst = if IMMEDIATE { instr.rt() } else { instr.rd() };

    match operation {
        AluOperation::Add if UNSIGNED => cpu.write_register(dst, x.wrapping_add(y)),
        AluOperation::Add => match (x as i32).checked_add(y as i32) {
            Some(result) => cpu.write_register(dst, result as u32),
            None => cpu.raise_exception(Exception::ArithmeticOverflow),
        },
        AluOperation::Sub if UNSIGNED => cpu.write_register(dst, x.wrapping_sub(y)),
        AluOperation::Sub => match (x as i32).checked_sub(y as i32) {
            Some(result) => cpu.write_register(dst, result as u32),
            None => cpu.raise_exception(Exception::ArithmeticOverflow),
        },
        AluOperation::And => cpu.write_register(dst, x & y),
        AluOperation::Or => cpu.write_register(dst, x | y),
        AluOperation::Xor => cpu.write_register(dst, x ^ y),
        AluOperation::Nor => cpu.write_register(dst, !(x | y)),
        AluOperation::SetLessThan => {
            let less = if UNSIGNED { x < y } else { (x as i32) < (y as i32) };
            cpu.write_register(dst, less as u32);
        }
        AluOperation::Multiply => {
            let product = if UNSIGNED {
                x as u64 * y as u64
            } else {
                (x as i32 as i64 * y as i32 as i64) as u64
            };
            cpu.hi = (product >> 32) as u32;
            cpu.lo = product as u32;
        }
        AluOperation::Divide => (cpu.hi, cpu.lo) = divide::<UNSIGNED>(x, y),
    }

    Ok(())
}

/// Returns `(remainder, quotient)`, including the results the hardware
/// produces for a zero divisor and for `i32::MIN / -1`.
#[inline(always)]
fn divide<const UNSIGNED: bool>(n: u32, d: u32) -> (u32, u32) {
    if UNSIGNED {
        return match d {
            0 => (n, 0xFFFF_FFFF),
            _ => (n % d, n / d),
        };
    }

    match (n as i32, d as i32) {
        (n, 0) => (n as u32, if n >= 0 { 0xFFFF_FFFF } else { 1 }),
        (i32::MIN, -1) => (0, 0x8000_0000),
        (n, d) => ((n % d) as u32, (n / d) as u32),
    }
}

pub fn move_multiply<const DIRECTION: u8, const REGISTER: u8>(
    instr: &Instruction, cpu: &mut Cpu,
) -> Result<(), ExecError> {
    let direction = const { MultiplyMoveDirection::from_raw(DIRECTION) };
    let register = const { MultiplyMoveRegister::from_raw(REGISTER) };

    match (direction, register) {
        (MultiplyMoveDirection::FromRegister, MultiplyMoveRegister::Hi) => cpu.write_register(instr.rd(), cpu.hi),
        (MultiplyMoveDirection::FromRegister, MultiplyMoveRegister::Lo) => cpu.write_register(instr.rd(), cpu.lo),
        (MultiplyMoveDirection::ToRegister, MultiplyMoveRegister::Hi) => cpu.hi = cpu.read_register(instr.rs()),
        (MultiplyMoveDirection::ToRegister, MultiplyMoveRegister::Lo) => cpu.lo = cpu.read_register(instr.rs()),
    }

    Ok(())
}

/// Loads, stores and `lui`.
///
/// `lwl`/`swl` access the aligned word at `address - 3` and `lwr`/`swr` the
/// word at `address`, as whole words. There is no partial register merge.
pub fn load_store<const IS_LUI: bool, const TYPE: u8, const TRANSFER_SIZE: u8, const PORTION: u8, const SIGNED: bool>(
    instr: &Instruction, cpu: &mut Cpu,
) -> Result<(), ExecError> {
    if IS_LUI {
        cpu.write_register(instr.rt(), (instr.immediate() as u32) << 16);
        return Ok(());
    }

    let access = const { MemoryAccessType::from_raw(TYPE) };
    let portion = const { MemoryAccessPortion::from_raw(PORTION) };
    let width = match const { MemoryTransferSize::from_raw(TRANSFER_SIZE) } {
        MemoryTransferSize::Byte => Width::Byte,
        MemoryTransferSize::HalfWord => Width::Half,
        MemoryTransferSize::Word => Width::Word,
    };

    let address = cpu.read_register(instr.base()).wrapping_add(instr.simm());
    let address = match portion {
        MemoryAccessPortion::Left => address.wrapping_sub(3),
        _ => address,
    };

    if portion == MemoryAccessPortion::Full && !width.is_aligned(address) {
        let exception = match access {
            MemoryAccessType::Load => Exception::AddressErrorLoad,
            MemoryAccessType::Store => Exception::AddressErrorStore,
        };
        cpu.address_error(exception, address);
        return Ok(());
    }

    match access {
        MemoryAccessType::Load => {
            let value = cpu.read_data(address, width);
            let value = match width {
                Width::Byte if SIGNED => value as u8 as i8 as u32,
                Width::Half if SIGNED => value as u16 as i16 as u32,
                _ => value,
            };
            cpu.write_register(instr.rt(), value);
        }
        MemoryAccessType::Store => {
            cpu.write_data(address, width, cpu.read_register(instr.rt()));
        }
    }

    Ok(())
}

/// `cop0`..`cop3`. The 26-bit function field goes to the coprocessor as is.
pub fn coprocessor<const COP: u8>(instr: &Instruction, cpu: &mut Cpu) -> Result<(), ExecError> {
    match COP {
        0 => cpu.cop0.execute(instr.cop_function(), &mut cpu.registers),
        2 => {
            let cost = cpu.cop2.execute(instr.cop_function(), &mut cpu.registers)?;
            if cpu.config.gte_cycle_accounting {
                cpu.cycles += cost as u64;
            }
            Ok(())
        }
        _ => {
            cpu.coprocessor_unusable(COP);
            Ok(())
        }
    }
}

/// `lwcN`/`swcN`. Only the GTE has data registers reachable this way.
pub fn coprocessor_transfer<const COP: u8, const TYPE: u8>(
    instr: &Instruction, cpu: &mut Cpu,
) -> Result<(), ExecError> {
    if COP != 2 {
        cpu.coprocessor_unusable(COP);
        return Ok(());
    }

    let access = const { MemoryAccessType::from_raw(TYPE) };
    let address = cpu.read_register(instr.base()).wrapping_add(instr.simm());

    match access {
        MemoryAccessType::Load if !Width::Word.is_aligned(address) => {
            cpu.address_error(Exception::AddressErrorLoad, address);
        }
        MemoryAccessType::Store if !Width::Word.is_aligned(address) => {
            cpu.address_error(Exception::AddressErrorStore, address);
        }
        MemoryAccessType::Load => {
            let value = cpu.read_data(address, Width::Word);
            cpu.cop2.write_register(instr.rt(), value);
        }
        MemoryAccessType::Store => {
            let value = cpu.cop2.read_register(instr.rt());
            cpu.write_data(address, Width::Word, value);
        }
    }

    Ok(())
}

pub fn system_call(_instr: &Instruction, cpu: &mut Cpu) -> Result<(), ExecError> {
    cpu.raise_exception(Exception::Syscall);
    Ok(())
}

pub fn debug_break(_instr: &Instruction, cpu: &mut Cpu) -> Result<(), ExecError> {
    cpu.raise_exception(Exception::Breakpoint);
    Ok(())
}
