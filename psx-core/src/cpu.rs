pub mod cop;
pub mod decoder;
pub mod hooks;
pub mod interpreter;
pub mod lut;

#[cfg(test)]
pub(crate) mod asm;

use crate::config::CpuConfig;
use crate::cpu::cop::Cop as _;
use crate::cpu::cop::cop0::{Cop0, Exception};
use crate::cpu::cop::cop2::Cop2;
use crate::cpu::cop::registers::CacheControl;
use crate::cpu::decoder::Instruction;
use crate::cpu::hooks::Tty;
use crate::mmu::Mmu;
use crate::mmu::bus::{self, AddressRange, Device as _, Width};
use crate::mmu::memory::Memory;

pub const RESET_VECTOR: u32 = 0xBFC0_0000;
pub const CACHE_CONTROL_ADDR: u32 = 0xFFFE_0130;
pub const SCRATCHPAD_ADDR: u32 = 0x1F80_0000;
pub const SCRATCHPAD_SIZE: u32 = 0x400;

pub struct Cpu {
    pub pc: u32,
    pub current_pc: u32, // Address of the instruction being executed
    pub registers: [u32; 32],
    pub hi: u32,
    pub lo: u32,
    pub branch_pending: bool,
    pub branch_target: u32,
    pub in_delay_slot: bool,
    pub cop0: Cop0,
    pub cop2: Cop2,
    pub cache_control: CacheControl,
    pub scratchpad: Memory,
    pub bus_hold: bool, // Set while DMA owns the bus
    pub mmu: Mmu,
    pub cycles: u64,
    pub config: CpuConfig,
    pub tty: Tty,
}

impl Cpu {
    pub fn new(mmu: Mmu, config: CpuConfig) -> Self {
        Self {
            pc: RESET_VECTOR,
            current_pc: RESET_VECTOR,
            registers: [0; 32],
            hi: 0,
            lo: 0,
            branch_pending: false,
            branch_target: 0,
            in_delay_slot: false,
            cop0: Cop0::new(),
            cop2: Cop2::new(),
            cache_control: CacheControl(0),
            scratchpad: Memory::scratchpad(AddressRange::new(SCRATCHPAD_ADDR, SCRATCHPAD_SIZE)),
            bus_hold: false,
            mmu,
            cycles: 0,
            config,
            tty: Tty::default(),
        }
    }

    /// Back to the reset vector with a clean register file. The bus is left
    /// alone; the orchestrator resets it.
    pub fn reset(&mut self) {
        self.pc = RESET_VECTOR;
        self.current_pc = RESET_VECTOR;
        self.registers = [0; 32];
        self.hi = 0;
        self.lo = 0;
        self.branch_pending = false;
        self.branch_target = 0;
        self.in_delay_slot = false;
        self.cop0.reset();
        self.cop2.reset();
        self.cache_control = CacheControl(0);
        self.scratchpad.clear();
        self.bus_hold = false;
        self.cycles = 0;
        self.tty.clear();
    }

    /// Executes one instruction.
    ///
    /// Does nothing while the bus is held. A pending interrupt is taken
    /// before fetch, in which case no instruction runs this step.
    pub fn step(&mut self) {
        if self.bus_hold {
            return;
        }

        if self.signal_interrupt(self.mmu.irq_line()) {
            return;
        }

        hooks::on_fetch(self);

        self.current_pc = self.pc;
        self.in_delay_slot = self.branch_pending;

        if !Width::Word.is_aligned(self.pc) {
            self.address_error(Exception::AddressErrorLoad, self.pc);
            return;
        }

        let word = self.mmu.read(self.pc, Width::Word);

        if self.branch_pending {
            self.branch_pending = false;
            self.pc = self.branch_target;
        } else {
            self.pc = self.pc.wrapping_add(4);
        }

        self.cycles += 1;

        // nop
        if word == 0 {
            return;
        }

        let instr = Instruction::decode(word);
        tracing::trace!(
            target: "psx_core::cpu",
            "{:08X}: [{:08X}] {: <30}",
            self.current_pc,
            instr.raw,
            format!("{}", instr)
        );

        if let Err(error) = (instr.handler)(&instr, self) {
            if self.config.strict_instructions {
                panic!("{} at {:08X}", error, self.current_pc);
            }

            tracing::error!(
                target: "psx_core::cpu",
                pc = %format!("{:08X}", self.current_pc),
                instruction = %format!("{:08X}", instr.raw),
                %error,
                "Instruction failed"
            );
        }
    }

    /// Latches the interrupt line into COP0 and enters the handler if the
    /// interrupt is enabled and unmasked. Returns whether it was taken.
    ///
    /// Runs between instructions, so EPC is the next instruction to execute
    /// (or its branch, when that instruction sits in a delay slot).
    pub fn signal_interrupt(&mut self, status: u8) -> bool {
        if !self.cop0.update_interrupt_lines(status) {
            return false;
        }

        tracing::trace!(target: "psx_core::cpu", pc = %format!("{:08X}", self.pc), "Taking interrupt");

        self.pc = self.cop0.enter_exception(Exception::External, self.pc, self.branch_pending);
        self.branch_pending = false;
        true
    }

    /// Enters the exception handler for the instruction at `current_pc`.
    /// Exceptions have no delay slot, so a pending branch is dropped.
    pub fn raise_exception(&mut self, exception: Exception) {
        self.pc = self.cop0.enter_exception(exception, self.current_pc, self.in_delay_slot);
        self.branch_pending = false;
    }

    pub fn address_error(&mut self, exception: Exception, address: u32) {
        self.cop0.bad_a = address;
        self.raise_exception(exception);
    }

    pub fn coprocessor_unusable(&mut self, cop: u8) {
        self.cop0.cause.set_coprocessor_exception(cop as u32);
        self.raise_exception(Exception::CoprocessorUnusable);
    }

    /// Latches a branch target, taken after the delay slot executes.
    #[inline(always)]
    pub fn set_branch(&mut self, target: u32) {
        self.branch_pending = true;
        self.branch_target = target;
    }

    #[inline(always)]
    pub fn read_register(&self, index: u8) -> u32 {
        self.registers[index as usize]
    }

    #[inline(always)]
    pub fn write_register(&mut self, index: u8, value: u32) {
        if index != 0 {
            self.registers[index as usize] = value;
        }
    }

    /// Data load. The cache-control register and the scratchpad window are
    /// served here and never reach the bus. A disabled scratchpad reads 0.
    pub fn read_data(&mut self, address: u32, width: Width) -> u32 {
        let (physical, _) = Mmu::translate(address);

        if physical & !0b11 == CACHE_CONTROL_ADDR {
            return bus::extract(self.cache_control.0, physical, width);
        }

        if self.scratchpad.range().contains(physical) {
            if !self.cache_control.scratchpad_enabled() {
                return 0;
            }
            return self.scratchpad.read(physical, width);
        }

        self.mmu.read(address, width)
    }

    /// Data store. With the cache isolated, stores to cached segments are
    /// dropped; uncached (KSEG1) stores still reach the bus.
    pub fn write_data(&mut self, address: u32, width: Width, value: u32) -> bool {
        let (physical, cacheable) = Mmu::translate(address);

        if physical & !0b11 == CACHE_CONTROL_ADDR {
            self.cache_control = CacheControl(bus::merge(self.cache_control.0, physical, width, value));
            tracing::trace!(
                target: "psx_core::cpu",
                value = %format!("{:08X}", self.cache_control.0),
                "Cache control updated"
            );
            return true;
        }

        if cacheable && self.cop0.sr.isolate_cache() {
            tracing::warn!(
                target: "psx_core::cpu",
                address = %format!("{:08X}", address),
                value = %format!("{:08X}", value),
                %width,
                "Write with isolated cache ignored"
            );
            return false;
        }

        if self.scratchpad.range().contains(physical) {
            if !self.cache_control.scratchpad_enabled() {
                return false;
            }
            return self.scratchpad.write(physical, width, value & width.mask());
        }

        self.mmu.write(address, width, value)
    }
}

impl std::fmt::Display for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PC:{:08X} HI:{:08X} LO:{:08X}", self.pc, self.hi, self.lo)?;
        for (index, value) in self.registers.iter().enumerate() {
            write!(f, " R{}:{:08X}", index, value)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::cop::Cop as _;
    use crate::cpu::cop::cop0::COP0_SR;
    use crate::irq::IrqSource;
    use crate::mmu::bus::Bus32 as _;

    fn cpu() -> Cpu {
        Cpu::new(Mmu::bare(false), CpuConfig::default())
    }

    // Writes `program` to RAM at 0x8000_1000 and points the CPU at it
    fn load(cpu: &mut Cpu, program: &[u32]) {
        for (i, word) in program.iter().enumerate() {
            cpu.mmu.write_u32(0x8000_1000 + i as u32 * 4, *word);
        }
        cpu.pc = 0x8000_1000;
    }

    #[test]
    fn test_reset_state() {
        let mut cpu = cpu();
        cpu.registers[5] = 1;
        cpu.hi = 2;
        cpu.lo = 3;
        cpu.set_branch(0x8000_0000);
        cpu.reset();

        assert_eq!(cpu.pc, 0xBFC0_0000);
        assert!(cpu.registers.iter().all(|r| *r == 0));
        assert_eq!((cpu.hi, cpu.lo), (0, 0));
        assert!(!cpu.branch_pending);
        assert_eq!(cpu.cop0.read_register(COP0_SR), 0x0060_0000);
    }

    #[test]
    fn test_branch_delay_slot_executes_once() {
        let mut cpu = cpu();
        load(
            &mut cpu,
            &[
                asm::beq(0, 0, 2),      // 1000: -> 100C
                asm::addiu(8, 8, 1),    // 1004: delay slot
                asm::addiu(8, 8, 0x10), // 1008: skipped
                asm::addiu(9, 0, 7),    // 100C
            ],
        );

        cpu.step();
        assert_eq!(cpu.pc, 0x8000_1004);
        assert!(cpu.branch_pending);

        cpu.step();
        assert_eq!(cpu.registers[8], 1);
        assert_eq!(cpu.pc, 0x8000_100C);

        cpu.step();
        assert_eq!(cpu.registers[9], 7);
        assert_eq!(cpu.registers[8], 1);
    }

    #[test]
    fn test_untaken_branch_falls_through() {
        let mut cpu = cpu();
        cpu.registers[8] = 1;
        load(&mut cpu, &[asm::beq(8, 0, 8), asm::nop(), asm::addiu(9, 0, 3)]);

        cpu.step();
        assert!(!cpu.branch_pending);
        cpu.step();
        cpu.step();
        assert_eq!(cpu.registers[9], 3);
    }

    #[test]
    fn test_jump_and_link() {
        let mut cpu = cpu();
        load(&mut cpu, &[asm::jal(0x8000_2000), asm::nop()]);

        cpu.step();
        assert_eq!(cpu.registers[31], 0x8000_1008);
        cpu.step();
        assert_eq!(cpu.pc, 0x8000_2000);

        // jalr links to rd and jumps to rs
        cpu.registers[4] = 0x8000_1000;
        cpu.mmu.write_u32(0x8000_2000, asm::jalr(5, 4));
        cpu.step();
        assert_eq!(cpu.registers[5], 0x8000_2008);
        assert_eq!(cpu.branch_target, 0x8000_1000);
    }

    #[test]
    fn test_link_written_when_not_taken() {
        let mut cpu = cpu();
        cpu.registers[4] = 5;
        load(&mut cpu, &[asm::bltzal(4, 4)]);

        cpu.step();
        assert_eq!(cpu.registers[31], 0x8000_1008);
        assert!(!cpu.branch_pending);
    }

    #[test]
    fn test_exception_in_delay_slot_points_at_branch() {
        let mut cpu = cpu();
        cpu.registers[8] = 0x7FFF_FFFF;
        load(&mut cpu, &[asm::j(0x8000_1100), asm::addi(9, 8, 1)]);

        cpu.step();
        cpu.step();
        assert_eq!(cpu.cop0.epc, 0x8000_1000);
        assert!(cpu.cop0.cause.branch_delay());
        assert_eq!(cpu.cop0.cause.exception_code(), Exception::ArithmeticOverflow as u32);
        assert_eq!(cpu.pc, 0xBFC0_0180);
        assert!(!cpu.branch_pending);
    }

    #[test]
    fn test_syscall_and_rfe_restore_mode_stack() {
        let mut cpu = cpu();
        cpu.cop0.sr.set_boot_exception_vector_location(false);
        cpu.cop0.sr.set_mode_stack(0b00_0001);
        load(&mut cpu, &[asm::syscall()]);

        cpu.step();
        assert_eq!(cpu.pc, 0x8000_0080);
        assert_eq!(cpu.cop0.cause.exception_code(), 8);
        assert!(!cpu.cop0.cause.branch_delay());
        assert_eq!(cpu.cop0.sr.mode_stack(), 0b00_0100);

        cpu.mmu.write_u32(0x8000_0080, asm::rfe());
        cpu.step();
        assert_eq!(cpu.cop0.sr.mode_stack(), 0b00_0001);
    }

    #[test]
    fn test_interrupt_taken_before_fetch() {
        let mut cpu = cpu();
        load(&mut cpu, &[asm::addiu(8, 0, 1)]);
        cpu.cop0.sr.set_current_interrupt_enable(true);
        cpu.cop0.sr.set_interrupt_mask(0b0000_0100);
        cpu.mmu.irq.mask.set_vblank(true);
        cpu.mmu.request_interrupt(IrqSource::VBlank);

        cpu.step();
        assert_eq!(cpu.registers[8], 0);
        assert_eq!(cpu.cop0.epc, 0x8000_1000);
        assert_eq!(cpu.cop0.cause.exception_code(), Exception::External as u32);
        assert_eq!(cpu.cop0.cause.interrupt_pending(), 1);
        assert_eq!(cpu.pc, 0xBFC0_0180);
        assert!(!cpu.cop0.sr.current_interrupt_enable());
    }

    #[test]
    fn test_masked_interrupt_only_latches() {
        let mut cpu = cpu();
        load(&mut cpu, &[asm::addiu(8, 0, 1)]);
        assert!(!cpu.signal_interrupt(1));
        assert_eq!(cpu.cop0.cause.interrupt_pending(), 1);

        cpu.step();
        assert_eq!(cpu.registers[8], 1);
    }

    #[test]
    fn test_bus_hold_stalls() {
        let mut cpu = cpu();
        load(&mut cpu, &[asm::addiu(8, 0, 1)]);
        cpu.bus_hold = true;
        cpu.step();
        assert_eq!(cpu.pc, 0x8000_1000);
        assert_eq!(cpu.cycles, 0);

        cpu.bus_hold = false;
        cpu.step();
        assert_eq!(cpu.registers[8], 1);
    }

    #[test]
    fn test_misaligned_fetch() {
        let mut cpu = cpu();
        cpu.pc = 0x8000_1002;
        cpu.step();
        assert_eq!(cpu.cop0.cause.exception_code(), Exception::AddressErrorLoad as u32);
        assert_eq!(cpu.cop0.bad_a, 0x8000_1002);
        assert_eq!(cpu.cop0.epc, 0x8000_1002);
    }

    #[test]
    fn test_scratchpad_needs_cache_control() {
        let mut cpu = cpu();
        assert!(cpu.write_data(CACHE_CONTROL_ADDR, Width::Word, 0x0001_E988));
        assert_eq!(cpu.read_data(CACHE_CONTROL_ADDR, Width::Word), 0x0001_E988);
        assert_eq!(cpu.read_data(CACHE_CONTROL_ADDR + 1, Width::Byte), 0xE9);

        assert!(cpu.write_data(0x1F80_0010, Width::Word, 0x1234_5678));
        assert_eq!(cpu.read_data(0x9F80_0012, Width::Half), 0x1234);
        assert_eq!(cpu.scratchpad.as_slice()[0x10], 0x78);

        // Disabled: reads are 0 and writes are dropped
        cpu.write_data(CACHE_CONTROL_ADDR, Width::Word, 0);
        assert_eq!(cpu.read_data(0x1F80_0010, Width::Word), 0);
        assert!(!cpu.write_data(0x1F80_0010, Width::Word, 0xFFFF_FFFF));
        assert_eq!(cpu.scratchpad.as_slice()[0x10], 0x78);
    }

    #[test]
    fn test_disabled_scratchpad_stays_off_the_bus() {
        // A strict bus panics on any access nothing claims
        let mut cpu = Cpu::new(Mmu::bare(true), CpuConfig::default());
        assert!(!cpu.cache_control.scratchpad_enabled());

        assert_eq!(cpu.read_data(0x1F80_0010, Width::Word), 0);
        assert_eq!(cpu.read_data(0x9F80_03FF, Width::Byte), 0);
        assert!(!cpu.write_data(0x1F80_0010, Width::Word, 0x1234_5678));
        assert!(!cpu.write_data(0x1F80_0000, Width::Half, 0xBEEF));
        assert!(cpu.scratchpad.as_slice().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn test_isolated_cache_drops_writes() {
        let mut cpu = cpu();
        cpu.cop0.sr.set_isolate_cache(true);
        assert!(!cpu.write_data(0x8000_2000, Width::Word, 0xFFFF_FFFF));
        assert_eq!(cpu.mmu.read_u32(0x0000_2000), 0);

        // KSEG1 bypasses the cache
        assert!(cpu.write_data(0xA000_2004, Width::Word, 0x1234_5678));
        assert_eq!(cpu.mmu.read_u32(0x0000_2004), 0x1234_5678);

        cpu.cop0.sr.set_isolate_cache(false);
        assert!(cpu.write_data(0x8000_2000, Width::Word, 0xFFFF_FFFF));
        assert_eq!(cpu.mmu.read_u32(0x0000_2000), 0xFFFF_FFFF);
    }

    #[test]
    fn test_gpr_zero_is_hardwired() {
        let mut cpu = cpu();
        load(&mut cpu, &[asm::addiu(0, 0, 0x1234), asm::lui(0, 0xFFFF)]);
        cpu.step();
        cpu.step();
        assert_eq!(cpu.registers[0], 0);
    }

    #[test]
    fn test_invalid_instruction_is_logged_and_skipped() {
        let mut cpu = cpu();
        load(&mut cpu, &[0xFC00_0000, asm::addiu(8, 0, 1)]);
        cpu.step();
        assert_eq!(cpu.pc, 0x8000_1004);
        assert_eq!(cpu.cop0.cause.exception_code(), 0);
        cpu.step();
        assert_eq!(cpu.registers[8], 1);
    }

    #[test]
    #[should_panic(expected = "unimplemented instruction")]
    fn test_strict_instructions_panic() {
        let mut cpu = Cpu::new(
            Mmu::bare(false),
            CpuConfig {
                strict_instructions: true,
                ..Default::default()
            },
        );
        load(&mut cpu, &[0xFC00_0000]);
        cpu.step();
    }

    #[test]
    fn test_display_dumps_registers() {
        let mut cpu = cpu();
        cpu.registers[31] = 0xDEAD_BEEF;
        let dump = cpu.to_string();
        assert!(dump.starts_with("PC:BFC00000 HI:00000000 LO:00000000 R0:00000000"));
        assert!(dump.ends_with("R31:DEADBEEF"));
    }
}
