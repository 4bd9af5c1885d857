use crate::config::{CpuConfig, PsxConfig};
use crate::cpu::Cpu;
use crate::error::PsxError;
use crate::exe::Exe;
use crate::mmu::Mmu;
use crate::mmu::bus::{ClockSource, DeviceEvent};

/// Where the BIOS hands over to the shell once the kernel is up.
pub const SHELL_ENTRY: u32 = 0x8003_0000;

/// Owns the CPU (which owns the bus and every device) and drives them from
/// a single master clock running at twice the CPU rate.
pub struct Psx {
    pub cpu: Cpu,
    pub config: PsxConfig,
    pub ticks: u64,
    pub steps: u64,
    events: Vec<DeviceEvent>,
    exe: Option<Exe>,
    exe_loaded: bool,
}

impl Psx {
    pub fn new(bios: &[u8], config: PsxConfig) -> Result<Self, PsxError> {
        let mut mmu = Mmu::new(config.strict_memory);
        mmu.load_bios(bios)?;

        Ok(Self {
            cpu: Cpu::new(mmu, CpuConfig::from(&config)),
            config,
            ticks: 0,
            steps: 0,
            events: Vec::new(),
            exe: None,
            exe_loaded: false,
        })
    }

    /// Queues an EXE to be loaded when the BIOS reaches the shell.
    pub fn sideload_exe(&mut self, exe: Exe) -> Result<(), PsxError> {
        let (physical, _) = Mmu::translate(exe.destination);
        let ram = self.cpu.mmu.ram.range();
        let fits = ram.contains(physical) && (ram.offset(physical) as usize + exe.payload.len()) <= ram.len as usize;
        if !fits {
            return Err(PsxError::ExeOutOfRange {
                address: exe.destination,
                len: exe.payload.len(),
            });
        }

        tracing::debug!(
            target: "psx_core::psx",
            pc = %format!("{:08X}", exe.pc),
            destination = %format!("{:08X}", exe.destination),
            size = exe.payload.len(),
            region = %exe.region,
            "EXE queued for sideload"
        );

        self.exe = Some(exe);
        self.exe_loaded = false;
        Ok(())
    }

    /// Advances the master clock by one tick. Returns whether the CPU ran an
    /// instruction slot this tick.
    pub fn clock(&mut self) -> bool {
        let mut stepped = false;

        if self.ticks % 2 == 0 {
            if !self.cpu.bus_hold {
                self.enter_exe();
                self.cpu.step();
                self.steps += 1;
                stepped = true;
            }

            self.cpu.mmu.clock_devices(ClockSource::System, &mut self.events);
        }

        self.cpu.mmu.clock_devices(ClockSource::Video, &mut self.events);

        if self.ticks % 16 == 0 {
            self.cpu.mmu.clock_devices(ClockSource::System8, &mut self.events);
        }

        self.ticks += 1;
        self.route_events();

        stepped
    }

    /// Clocks through the next CPU slot. Returns whether an instruction ran;
    /// `false` means the slot stalled on a held bus.
    pub fn step(&mut self) -> bool {
        loop {
            let cpu_slot = self.ticks % 2 == 0;
            let stepped = self.clock();
            if cpu_slot {
                return stepped;
            }
        }
    }

    /// Back to the reset vector with RAM and every register cleared. The
    /// BIOS and a queued EXE survive.
    pub fn reset(&mut self) {
        tracing::debug!(target: "psx_core::psx", "Reset");

        self.cpu.reset();
        self.cpu.mmu.reset();
        self.ticks = 0;
        self.steps = 0;
        self.events.clear();
        self.exe_loaded = false;
    }

    fn route_events(&mut self) {
        for event in self.events.drain(..) {
            match event {
                DeviceEvent::Interrupt(source) => self.cpu.mmu.request_interrupt(source),
                DeviceEvent::BusHold(held) => self.cpu.bus_hold = held,
            }
        }
    }

    fn enter_exe(&mut self) {
        if self.exe_loaded || self.cpu.pc != SHELL_ENTRY {
            return;
        }

        let Some(exe) = &self.exe else {
            return;
        };

        if let Err(error) = self.cpu.mmu.load(exe.destination, &exe.payload) {
            tracing::error!(target: "psx_core::psx", %error, "EXE sideload failed");
            self.exe_loaded = true;
            return;
        }

        self.cpu.write_register(28, exe.gp);
        if let Some(stack) = exe.stack() {
            self.cpu.write_register(29, stack);
            self.cpu.write_register(30, stack);
        }
        self.cpu.pc = exe.pc;
        self.cpu.branch_pending = false;
        self.exe_loaded = true;

        tracing::info!(
            target: "psx_core::psx",
            "Sideloaded EXE at {:08X} with entry point {:08X}",
            exe.destination,
            exe.pc
        );
    }
}
