pub mod bus;
pub mod memctrl;
pub mod memory;

use crate::define_addr;
use crate::error::PsxError;
use crate::irq::{Irq, IrqSource};
use crate::mmu::bus::{AddressRange, Bus8, Bus16, Bus32, ClockSource, Device, DeviceEvent, Width};
use crate::mmu::memctrl::MemoryControl;
use crate::mmu::memory::Memory;
use crate::peripherals;

define_addr!(RAM_ADDR, 0x0000_0000, 0x20_0000);
define_addr!(BIOS_ADDR, 0x1FC0_0000, 0x8_0000);

// Indexed by the top three address bits: KUSEG (4 regions), KSEG0, KSEG1, KSEG2 (2 regions)
const REGION_MASK: [u32; 8] = [
    0xFFFF_FFFF, 0xFFFF_FFFF, 0xFFFF_FFFF, 0xFFFF_FFFF,
    0x7FFF_FFFF,
    0x1FFF_FFFF,
    0xFFFF_FFFF, 0xFFFF_FFFF,
];

const REGION_CACHEABLE: [bool; 8] = [true, true, true, true, true, false, true, true];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Ram,
    Bios,
    MemoryControl,
    Irq,
    Device(usize),
}

/// Bus dispatcher. Owns RAM, the BIOS ROM, the memory-control and interrupt
/// registers, and every other memory-mapped device.
///
/// Windows are matched in registration order: RAM, BIOS, then peripherals.
/// They never overlap, so the order only matters for lookup cost.
pub struct Mmu {
    pub ram: Memory,
    pub bios: Memory,
    pub memctrl: MemoryControl,
    pub irq: Irq,
    devices: Vec<Box<dyn Device>>,
    ranges: Vec<(AddressRange, Target)>,
    strict: bool,
}

impl Mmu {
    /// A bus with RAM, BIOS and the standard peripheral windows attached.
    pub fn new(strict: bool) -> Self {
        let mut mmu = Self::bare(strict);
        for (range, device) in peripherals::standard_devices() {
            mmu.push_device(range, device);
        }

        mmu
    }

    /// A bus with only RAM, BIOS, memory control and the interrupt
    /// controller. Everything else must be attached.
    pub fn bare(strict: bool) -> Self {
        let ram = Memory::ram(AddressRange::from_bounds(RAM_ADDR));
        let bios = Memory::rom(AddressRange::from_bounds(BIOS_ADDR));

        let mut ranges = vec![(ram.range(), Target::Ram), (bios.range(), Target::Bios)];
        ranges.extend(MemoryControl::ranges().map(|range| (range, Target::MemoryControl)));
        ranges.push((Irq::range(), Target::Irq));

        Self {
            ram,
            bios,
            memctrl: MemoryControl::new(),
            irq: Irq::new(),
            devices: Vec::new(),
            ranges,
            strict,
        }
    }

    /// Attaches a device after checking its window against every existing one.
    pub fn attach(&mut self, range: AddressRange, device: Box<dyn Device>) -> Result<(), PsxError> {
        if let Some((_, owner)) = self.ranges.iter().find(|(existing, _)| existing.overlaps(&range)) {
            let existing = self.target_name(*owner);
            return Err(PsxError::OverlappingRanges {
                name: device.name(),
                range,
                existing,
            });
        }

        self.push_device(range, device);
        Ok(())
    }

    fn push_device(&mut self, range: AddressRange, device: Box<dyn Device>) {
        debug_assert!(self.ranges.iter().all(|(existing, _)| !existing.overlaps(&range)));

        tracing::trace!(target: "psx_core::mmu", device = device.name(), %range, "Attached device");
        self.ranges.push((range, Target::Device(self.devices.len())));
        self.devices.push(device);
    }

    fn target_name(&self, target: Target) -> &'static str {
        match target {
            Target::Ram => self.ram.name(),
            Target::Bios => self.bios.name(),
            Target::MemoryControl => self.memctrl.name(),
            Target::Irq => self.irq.name(),
            Target::Device(index) => self.devices[index].name(),
        }
    }

    /// Every registered window with the name of its owner.
    pub fn ranges(&self) -> impl Iterator<Item = (AddressRange, &'static str)> + '_ {
        self.ranges
            .iter()
            .map(|(range, target)| (*range, self.target_name(*target)))
    }

    /// Virtual to physical, plus whether the region goes through the cache.
    #[inline(always)]
    pub fn translate(address: u32) -> (u32, bool) {
        let region = (address >> 29) as usize;
        (address & REGION_MASK[region], REGION_CACHEABLE[region])
    }

    #[inline(always)]
    fn lookup(&self, physical: u32) -> Option<Target> {
        self.ranges
            .iter()
            .find(|(range, _)| range.contains(physical))
            .map(|(_, target)| *target)
    }

    #[inline(always)]
    fn device_mut(&mut self, target: Target) -> &mut dyn Device {
        match target {
            Target::Ram => &mut self.ram,
            Target::Bios => &mut self.bios,
            Target::MemoryControl => &mut self.memctrl,
            Target::Irq => &mut self.irq,
            Target::Device(index) => self.devices[index].as_mut(),
        }
    }

    pub fn read(&mut self, address: u32, width: Width) -> u32 {
        let (physical, _) = Self::translate(address);
        match self.lookup(physical) {
            Some(target) => self.device_mut(target).read(physical, width),
            None => {
                tracing::error!(
                    target: "psx_core::mmu",
                    address = %format!("{:08X}", address),
                    physical = %format!("{:08X}", physical),
                    %width,
                    "Unhandled memory read"
                );

                if self.strict {
                    panic!("unhandled {} read at {:08X}", width, address);
                }

                0
            }
        }
    }

    pub fn write(&mut self, address: u32, width: Width, value: u32) -> bool {
        let (physical, _) = Self::translate(address);
        match self.lookup(physical) {
            Some(target) => self.device_mut(target).write(physical, width, value & width.mask()),
            None => {
                tracing::error!(
                    target: "psx_core::mmu",
                    address = %format!("{:08X}", address),
                    physical = %format!("{:08X}", physical),
                    value = %format!("{:08X}", value),
                    %width,
                    "Unhandled memory write"
                );

                if self.strict {
                    panic!("unhandled {} write at {:08X}", width, address);
                }

                false
            }
        }
    }

    /// Copies `data` into RAM at a physical address.
    pub fn load(&mut self, address: u32, data: &[u8]) -> Result<(), PsxError> {
        let out_of_range = PsxError::ExeOutOfRange {
            address,
            len: data.len(),
        };

        let (physical, _) = Self::translate(address);
        if !self.ram.range().contains(physical) {
            return Err(out_of_range);
        }

        match self.ram.load(self.ram.range().offset(physical) as usize, data) {
            0 => Ok(()),
            _ => Err(out_of_range),
        }
    }

    pub fn load_bios(&mut self, image: &[u8]) -> Result<(), PsxError> {
        if image.len() > self.bios.len() {
            return Err(PsxError::BiosSize {
                expected: self.bios.len(),
                actual: image.len(),
            });
        }

        self.bios.load(0, image);
        tracing::debug!(target: "psx_core::mmu", size = image.len(), "BIOS loaded");
        Ok(())
    }

    pub fn clock_devices(&mut self, source: ClockSource, events: &mut Vec<DeviceEvent>) {
        for device in self.devices.iter_mut() {
            device.clock(source, events);
        }
    }

    #[inline(always)]
    pub fn request_interrupt(&mut self, source: IrqSource) {
        self.irq.request(source);
    }

    /// Interrupt line level for the CPU's Cause.IP2.
    #[inline(always)]
    pub fn irq_line(&self) -> u8 {
        self.irq.line()
    }

    /// Clears RAM and every register window. The BIOS image is kept.
    pub fn reset(&mut self) {
        self.ram.clear();
        self.memctrl.reset();
        self.irq.reset();
        for device in self.devices.iter_mut() {
            device.reset();
        }
    }
}

impl Bus8 for Mmu {
    #[inline(always)]
    fn read_u8(&mut self, address: u32) -> u8 {
        self.read(address, Width::Byte) as u8
    }

    #[inline(always)]
    fn write_u8(&mut self, address: u32, value: u8) {
        self.write(address, Width::Byte, value as u32);
    }
}

impl Bus16 for Mmu {
    #[inline(always)]
    fn read_u16(&mut self, address: u32) -> u16 {
        self.read(address, Width::Half) as u16
    }

    #[inline(always)]
    fn write_u16(&mut self, address: u32, value: u16) {
        self.write(address, Width::Half, value as u32);
    }
}

impl Bus32 for Mmu {
    #[inline(always)]
    fn read_u32(&mut self, address: u32) -> u32 {
        self.read(address, Width::Word)
    }

    #[inline(always)]
    fn write_u32(&mut self, address: u32, value: u32) {
        self.write(address, Width::Word, value);
    }
}
