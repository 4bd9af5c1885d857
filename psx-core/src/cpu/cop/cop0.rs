use crate::bitfield::BitField;
use crate::cpu::cop::Cop;
use crate::cpu::cop::registers::{CauseRegister, StatusRegister};
use crate::error::ExecError;

pub const COP0_BPC: u8 = 3; // Breakpoint Program Counter
pub const COP0_BDA: u8 = 5; // Breakpoint Data Address
pub const COP0_TAR: u8 = 6; // Target Address
pub const COP0_DCIC: u8 = 7; // Debug and Cache Invalidate Control
pub const COP0_BAD_A: u8 = 8; // Bad Address
pub const COP0_BDAM: u8 = 9; // Breakpoint Data Address Mask
pub const COP0_BPCM: u8 = 11; // Breakpoint Program Counter Mask
pub const COP0_SR: u8 = 12; // Status Register
pub const COP0_CAUSE: u8 = 13; // Cause Register
pub const COP0_EPC: u8 = 14; // Exception Program Counter
pub const COP0_PRID: u8 = 15; // Processor Revision ID

pub const COP0_EXCEPTION_CODE_INT: u32 = 0; // External Interrupt
pub const COP0_EXCEPTION_CODE_AD_EL: u32 = 4; // Address Error (Load)
pub const COP0_EXCEPTION_CODE_AD_ES: u32 = 5; // Address Error (Store)
pub const COP0_EXCEPTION_CODE_IBE: u32 = 6; // Instruction Bus Error
pub const COP0_EXCEPTION_CODE_DBE: u32 = 7; // Data Bus Error
pub const COP0_EXCEPTION_CODE_SYSCALL: u32 = 8; // Syscall
pub const COP0_EXCEPTION_CODE_BREAK: u32 = 9; // Breakpoint
pub const COP0_EXCEPTION_CODE_RI: u32 = 10; // Reserved Instruction
pub const COP0_EXCEPTION_CODE_CPU: u32 = 11; // Coprocessor Unusable
pub const COP0_EXCEPTION_CODE_OV: u32 = 12; // Arithmetic Overflow

const RESET_SR: u32 = 0x0060_0000; // BEV and TS set
const RESET_PRID: u32 = 0x0000_0002;

const VECTOR_RAM: u32 = 0x8000_0080;
const VECTOR_ROM: u32 = 0xBFC0_0180;

type OperationField = BitField<21, 5>;
type RdField = BitField<11, 5>;
type RtField = BitField<16, 5>;
type FunctField = BitField<0, 6>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Exception {
    External = COP0_EXCEPTION_CODE_INT,
    AddressErrorLoad = COP0_EXCEPTION_CODE_AD_EL,
    AddressErrorStore = COP0_EXCEPTION_CODE_AD_ES,
    InstructionBusError = COP0_EXCEPTION_CODE_IBE,
    DataBusError = COP0_EXCEPTION_CODE_DBE,
    Syscall = COP0_EXCEPTION_CODE_SYSCALL,
    Breakpoint = COP0_EXCEPTION_CODE_BREAK,
    ReservedInstruction = COP0_EXCEPTION_CODE_RI,
    CoprocessorUnusable = COP0_EXCEPTION_CODE_CPU,
    ArithmeticOverflow = COP0_EXCEPTION_CODE_OV,
}

impl std::fmt::Display for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            Exception::External => "External Interrupt",
            Exception::AddressErrorLoad => "Address Error (Load)",
            Exception::AddressErrorStore => "Address Error (Store)",
            Exception::InstructionBusError => "Instruction Bus Error",
            Exception::DataBusError => "Data Bus Error",
            Exception::Syscall => "Syscall",
            Exception::Breakpoint => "Breakpoint",
            Exception::ReservedInstruction => "Reserved Instruction",
            Exception::CoprocessorUnusable => "Coprocessor Unusable",
            Exception::ArithmeticOverflow => "Arithmetic Overflow",
        };
        write!(f, "{}", description)
    }
}

/// System control coprocessor. No TLB, so only the exception and debug
/// registers exist.
#[derive(Clone, Copy, Debug)]
pub struct Cop0 {
    pub bpc: u32,             // Breakpoint Program Counter
    pub bda: u32,             // Breakpoint Data Address
    pub tar: u32,             // Target Address
    pub dcic: u32,            // Debug and Cache Invalidate Control
    pub bad_a: u32,           // Bad Address
    pub bdam: u32,            // Breakpoint Data Address Mask
    pub bpcm: u32,            // Breakpoint Program Counter Mask
    pub sr: StatusRegister,   // Status Register
    pub cause: CauseRegister, // Cause Register
    pub epc: u32,             // Exception Program Counter
    pub prid: u32,            // Processor Revision ID
}

impl Cop0 {
    pub fn new() -> Self {
        Self {
            bpc: 0,
            bda: 0,
            tar: 0,
            dcic: 0,
            bad_a: 0,
            bdam: 0,
            bpcm: 0,
            sr: StatusRegister(RESET_SR),
            cause: CauseRegister(0),
            epc: 0,
            prid: RESET_PRID,
        }
    }

    /// Runs the coprocessor function of a `cop0` instruction. `registers`
    /// is the CPU's general purpose register file.
    pub fn execute(&mut self, function: u32, registers: &mut [u32; 32]) -> Result<(), ExecError> {
        let rt = RtField::get(function) as usize;
        let rd = RdField::get(function) as u8;

        match OperationField::get(function) {
            0x00 => {
                if rt != 0 {
                    registers[rt] = self.read_register(rd);
                }
                Ok(())
            }
            0x04 => {
                self.write_register(rd, registers[rt]);
                Ok(())
            }
            0x02 => Err(ExecError::UnsupportedCop0 { mnemonic: "cfc0" }),
            0x06 => Err(ExecError::UnsupportedCop0 { mnemonic: "ctc0" }),
            0x10 => match FunctField::get(function) {
                0x01 => Err(ExecError::UnsupportedCop0 { mnemonic: "tlbr" }),
                0x02 => Err(ExecError::UnsupportedCop0 { mnemonic: "tlbwi" }),
                0x06 => Err(ExecError::UnsupportedCop0 { mnemonic: "tlbwr" }),
                0x08 => Err(ExecError::UnsupportedCop0 { mnemonic: "tlbp" }),
                0x10 => {
                    self.return_from_exception();
                    Ok(())
                }
                _ => Err(ExecError::UnsupportedCop0 { mnemonic: "unknown" }),
            },
            _ => Err(ExecError::UnsupportedCop0 { mnemonic: "unknown" }),
        }
    }

    /// Records the exception and returns the handler address.
    ///
    /// `pc` is the address of the faulting instruction. In a delay slot EPC
    /// points at the branch instead and Cause.BD is set.
    pub fn enter_exception(&mut self, exception: Exception, pc: u32, in_delay_slot: bool) -> u32 {
        tracing::debug!(
            target: "psx_core::cop0",
            %exception,
            pc = %format!("{:08X}", pc),
            delay_slot = in_delay_slot,
            "Exception occurred"
        );

        // Push the interrupt-enable/kernel-mode stack, which disables interrupts
        let stack = self.sr.mode_stack();
        self.sr.set_mode_stack((stack << 2) & 0x3F);

        self.epc = if in_delay_slot { pc.wrapping_sub(4) } else { pc };
        self.cause.set_branch_delay(in_delay_slot);
        self.cause.set_exception_code(exception as u32);

        //   Exception     BEV=0         BEV=1
        //   General       80000080h     BFC00180h
        if self.sr.boot_exception_vector_location() { VECTOR_ROM } else { VECTOR_RAM }
    }

    /// Pops the mode stack. The old pair (bits 4-5) is left as is.
    pub fn return_from_exception(&mut self) {
        let stack = self.sr.mode_stack();
        self.sr.set_mode_stack(((stack >> 2) & 0x0F) | (stack & 0x30));
        tracing::debug!(target: "psx_core::cop0", sr = %format!("{:08X}", self.sr.0), "Returning from exception");
    }

    /// Latches the hardware interrupt lines into Cause.IP and reports
    /// whether an interrupt should be taken.
    #[inline(always)]
    pub fn update_interrupt_lines(&mut self, status: u8) -> bool {
        self.cause.set_interrupt_pending(status as u32 & 0x3F);
        let hardware_mask = self.sr.interrupt_mask() >> 2;
        hardware_mask & self.cause.interrupt_pending() != 0 && self.sr.current_interrupt_enable()
    }
}

impl Default for Cop0 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cop for Cop0 {
    #[inline(always)]
    fn read_register(&self, register: u8) -> u32 {
        match register {
            COP0_BPC => self.bpc,
            COP0_BDA => self.bda,
            COP0_TAR => self.tar,
            COP0_DCIC => self.dcic,
            COP0_BAD_A => self.bad_a,
            COP0_BDAM => self.bdam,
            COP0_BPCM => self.bpcm,
            COP0_SR => self.sr.0,
            COP0_CAUSE => self.cause.0,
            COP0_EPC => self.epc,
            COP0_PRID => self.prid,
            _ => {
                tracing::warn!(target: "psx_core::cop0", register, "Read from unknown COP0 register");
                0
            }
        }
    }

    #[inline(always)]
    fn write_register(&mut self, register: u8, value: u32) {
        match register {
            COP0_BPC => self.bpc = value,
            COP0_BDA => self.bda = value,
            COP0_TAR => self.tar = value,
            COP0_DCIC => self.dcic = value,
            COP0_BAD_A => self.bad_a = value,
            COP0_BDAM => self.bdam = value,
            COP0_BPCM => self.bpcm = value,
            COP0_SR => self.sr.0 = value,
            COP0_CAUSE => self.cause.0 = value,
            COP0_EPC => self.epc = value,
            COP0_PRID => self.prid = value,
            _ => {
                tracing::warn!(
                    target: "psx_core::cop0",
                    register,
                    value = %format!("{:08X}", value),
                    "Write to unknown COP0 register"
                );
            }
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}
