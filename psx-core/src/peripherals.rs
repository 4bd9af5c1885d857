//! Register windows for the peripherals this core does not emulate.
//!
//! Each one latches what is written and reads it back, so BIOS polling loops
//! that only check their own writes make progress. A few registers answer a
//! fixed value instead, and the GPU window raises a periodic VBlank.

use crate::define_addr;
use crate::irq::IrqSource;
use crate::mmu::bus::{AddressRange, ClockSource, Device, DeviceEvent, Width, extract, merge};

define_addr!(EXPANSION1_ADDR, 0x1F00_0000, 0x8_0000);
define_addr!(SIO_ADDR, 0x1F80_1040, 0x20);
define_addr!(DMA_ADDR, 0x1F80_1080, 0x80);
define_addr!(TIMER_ADDR, 0x1F80_1100, 0x30);
define_addr!(CDROM_ADDR, 0x1F80_1800, 0x04);
define_addr!(GPU_ADDR, 0x1F80_1810, 0x08);
define_addr!(GP1_ADDR, GPU_ADDR_START, 1, 0x04, 0x04);
define_addr!(MDEC_ADDR, 0x1F80_1820, 0x08);
define_addr!(SPU_ADDR, 0x1F80_1C00, 0x400);

/// GPUSTAT with "ready to receive command/DMA block" set, so the BIOS never
/// waits on the GPU.
pub const GPUSTAT_IDLE: u32 = 0x1C00_0000;

/// Master-clock ticks between two VBlanks (NTSC, master clock = 2x CPU).
pub const VBLANK_PERIOD: u32 = 1_128_960;

#[derive(Clone, Copy, Debug)]
pub struct PeriodicInterrupt {
    pub source: IrqSource,
    pub clock: ClockSource,
    pub period: u32,
}

pub struct Placeholder {
    name: &'static str,
    range: AddressRange,
    registers: Vec<u32>,
    fixed_reads: &'static [(u32, u32)],
    interrupt: Option<PeriodicInterrupt>,
    counter: u32,
}

impl Placeholder {
    pub fn new(name: &'static str, range: AddressRange) -> Self {
        Self {
            name,
            range,
            registers: vec![0; range.len.div_ceil(4) as usize],
            fixed_reads: &[],
            interrupt: None,
            counter: 0,
        }
    }

    /// Word-aligned registers that always read as the given value.
    pub fn with_fixed_reads(mut self, fixed_reads: &'static [(u32, u32)]) -> Self {
        self.fixed_reads = fixed_reads;
        self
    }

    pub fn with_interrupt(mut self, interrupt: PeriodicInterrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    #[inline(always)]
    fn slot(&self, address: u32) -> usize {
        (self.range.offset(address) >> 2) as usize
    }
}

impl Device for Placeholder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn read(&mut self, address: u32, width: Width) -> u32 {
        let aligned = address & !0b11;
        if let Some(&(_, value)) = self.fixed_reads.iter().find(|(register, _)| *register == aligned) {
            return extract(value, address, width);
        }

        // A word read near the end of an odd-sized window can straddle it
        match self.registers.get(self.slot(address)) {
            Some(&register) => extract(register, address, width),
            None => 0,
        }
    }

    fn write(&mut self, address: u32, width: Width, value: u32) -> bool {
        let slot = self.slot(address);
        let Some(register) = self.registers.get_mut(slot) else {
            return false;
        };

        *register = merge(*register, address, width, value);
        tracing::trace!(
            target: "psx_core::mmu",
            device = self.name,
            address = %format!("{:08X}", address),
            value = %format!("{:08X}", value),
            "Placeholder register write"
        );
        true
    }

    fn clock(&mut self, source: ClockSource, events: &mut Vec<DeviceEvent>) {
        let Some(interrupt) = self.interrupt else {
            return;
        };

        if interrupt.clock != source {
            return;
        }

        self.counter += 1;
        if self.counter >= interrupt.period {
            self.counter = 0;
            events.push(DeviceEvent::Interrupt(interrupt.source));
        }
    }

    fn reset(&mut self) {
        self.registers.fill(0);
        self.counter = 0;
    }
}

static GPU_FIXED_READS: [(u32, u32); 1] = [(GP1_ADDR_START, GPUSTAT_IDLE)];

/// The standard peripheral windows in bus priority order.
pub fn standard_devices() -> Vec<(AddressRange, Box<dyn Device>)> {
    let window = |name, bounds| {
        let range = AddressRange::from_bounds(bounds);
        (range, Placeholder::new(name, range))
    };

    let (gpu_range, gpu) = window("gpu", GPU_ADDR);
    let gpu = gpu.with_fixed_reads(&GPU_FIXED_READS).with_interrupt(PeriodicInterrupt {
        source: IrqSource::VBlank,
        clock: ClockSource::Video,
        period: VBLANK_PERIOD,
    });

    let mut devices: Vec<(AddressRange, Box<dyn Device>)> = Vec::with_capacity(8);
    for (name, bounds) in [
        ("expansion1", EXPANSION1_ADDR),
        ("sio", SIO_ADDR),
        ("dma", DMA_ADDR),
        ("timers", TIMER_ADDR),
        ("cdrom", CDROM_ADDR),
    ] {
        let (range, device) = window(name, bounds);
        devices.push((range, Box::new(device)));
    }

    devices.push((gpu_range, Box::new(gpu)));

    for (name, bounds) in [("mdec", MDEC_ADDR), ("spu", SPU_ADDR)] {
        let (range, device) = window(name, bounds);
        devices.push((range, Box::new(device)));
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latches_and_reads_back() {
        let mut dma = Placeholder::new("dma", AddressRange::from_bounds(DMA_ADDR));
        assert!(dma.write(0x1F80_10F0, Width::Word, 0x0765_4321));
        assert_eq!(dma.read(0x1F80_10F0, Width::Word), 0x0765_4321);
        assert!(dma.write(0x1F80_10F2, Width::Byte, 0xAA));
        assert_eq!(dma.read(0x1F80_10F0, Width::Word), 0x07AA_4321);
    }

    #[test]
    fn test_gpustat_is_constant() {
        let mut devices = standard_devices();
        let (range, gpu) = &mut devices[5];
        assert_eq!(gpu.name(), "gpu");
        assert!(range.contains(GP1_ADDR_START));
        gpu.write(GP1_ADDR_START, Width::Word, 0x0300_0000);
        assert_eq!(gpu.read(GP1_ADDR_START, Width::Word), GPUSTAT_IDLE);
        assert_eq!(gpu.read(GP1_ADDR_START + 2, Width::Half), GPUSTAT_IDLE >> 16);
    }

    #[test]
    fn test_periodic_interrupt() {
        let mut gpu = Placeholder::new("gpu", AddressRange::from_bounds(GPU_ADDR)).with_interrupt(PeriodicInterrupt {
            source: IrqSource::VBlank,
            clock: ClockSource::Video,
            period: 3,
        });

        let mut events = Vec::new();
        for _ in 0..7 {
            gpu.clock(ClockSource::Video, &mut events);
            gpu.clock(ClockSource::System, &mut events);
        }

        assert_eq!(events, vec![DeviceEvent::Interrupt(IrqSource::VBlank); 2]);
    }

    #[test]
    fn test_standard_windows_are_disjoint() {
        let ranges: Vec<AddressRange> = standard_devices().into_iter().map(|(range, _)| range).collect();
        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                assert!(!a.overlaps(b), "{} overlaps {}", a, b);
            }
        }
    }
}
