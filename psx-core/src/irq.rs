use crate::define_addr;
use crate::mmu::bus::{AddressRange, Device, Width, extract};
use proc_bitfield::bitfield;

define_addr!(IRQ_ADDR, 0x1F80_1070, 0x08);
define_addr!(I_STAT_ADDR, IRQ_ADDR_START, 0, 0x04, 0x04);
define_addr!(I_MASK_ADDR, IRQ_ADDR_START, 1, 0x04, 0x04);

const IRQ_MASK: u32 = 0x7FF;

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct IrqRegister(pub u32): Debug, FromStorage, IntoStorage, DerefStorage {
        pub vblank: bool @ 0,
        pub gpu: bool @ 1,
        pub cdrom: bool @ 2,
        pub dma: bool @ 3,
        pub tmr0: bool @ 4,
        pub tmr1: bool @ 5,
        pub tmr2: bool @ 6,
        pub controller_and_memory_card: bool @ 7,
        pub sio: bool @ 8,
        pub spu: bool @ 9,
        pub lightpen: bool @ 10,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum IrqSource {
    VBlank = 0,
    Gpu = 1,
    Cdrom = 2,
    Dma = 3,
    Timer0 = 4,
    Timer1 = 5,
    Timer2 = 6,
    Controller = 7,
    Sio = 8,
    Spu = 9,
    Lightpen = 10,
}

impl std::fmt::Display for IrqSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IrqSource::VBlank => "vblank",
            IrqSource::Gpu => "gpu",
            IrqSource::Cdrom => "cdrom",
            IrqSource::Dma => "dma",
            IrqSource::Timer0 => "tmr0",
            IrqSource::Timer1 => "tmr1",
            IrqSource::Timer2 => "tmr2",
            IrqSource::Controller => "controller",
            IrqSource::Sio => "sio",
            IrqSource::Spu => "spu",
            IrqSource::Lightpen => "lightpen",
        };
        write!(f, "{}", name)
    }
}

/// Interrupt controller: I_STAT latches requests, I_MASK selects which of
/// them drive the CPU's hardware interrupt line.
pub struct Irq {
    pub status: IrqRegister,
    pub mask: IrqRegister,
}

impl Irq {
    pub fn new() -> Self {
        Irq {
            status: IrqRegister(0),
            mask: IrqRegister(0),
        }
    }

    pub fn range() -> AddressRange {
        AddressRange::from_bounds(IRQ_ADDR)
    }

    pub fn request(&mut self, source: IrqSource) {
        tracing::trace!(target: "psx_core::irq", %source, "Interrupt requested");
        self.status.0 |= 1 << source as u32;
    }

    /// Level of the line wired into the CPU's Cause.IP2 bit.
    #[inline(always)]
    pub fn line(&self) -> u8 {
        (self.status.0 & self.mask.0 != 0) as u8
    }
}

impl Default for Irq {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for Irq {
    fn name(&self) -> &'static str {
        "irq"
    }

    fn read(&mut self, address: u32, width: Width) -> u32 {
        match address {
            I_STAT_ADDR_START..=I_STAT_ADDR_END => extract(self.status.0, address, width),
            I_MASK_ADDR_START..=I_MASK_ADDR_END => extract(self.mask.0, address, width),
            _ => 0,
        }
    }

    // Narrow writes behave like full-word writes of the zero-extended value.
    // https://psx-spx.consoledev.net/unpredictablethings/
    fn write(&mut self, address: u32, _width: Width, value: u32) -> bool {
        match address & !0b11 {
            I_STAT_ADDR_START => {
                // Writing 0 to a bit acknowledges it
                self.status.0 &= value;
                tracing::trace!(target: "psx_core::irq", status = %format!("{:04X}", self.status.0), "I_STAT acknowledge");
                true
            }
            I_MASK_ADDR_START => {
                self.mask.0 = value & IRQ_MASK;
                tracing::debug!(target: "psx_core::irq", mask = %format!("{:04X}", self.mask.0), "I_MASK written");
                true
            }
            _ => false,
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}
