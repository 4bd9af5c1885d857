use crate::irq::IrqSource;

/// Access width of a bus transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Width {
    Byte = 1,
    Half = 2,
    Word = 4,
}

impl Width {
    #[inline(always)]
    pub const fn bytes(self) -> u32 {
        self as u32
    }

    #[inline(always)]
    pub const fn mask(self) -> u32 {
        match self {
            Width::Byte => 0xFF,
            Width::Half => 0xFFFF,
            Width::Word => 0xFFFF_FFFF,
        }
    }

    #[inline(always)]
    pub const fn is_aligned(self, address: u32) -> bool {
        address & (self.bytes() - 1) == 0
    }

    pub const fn from_bytes(bytes: u8) -> Option<Self> {
        match bytes {
            1 => Some(Width::Byte),
            2 => Some(Width::Half),
            4 => Some(Width::Word),
            _ => None,
        }
    }
}

impl std::fmt::Display for Width {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Width::Byte => write!(f, "u8"),
            Width::Half => write!(f, "u16"),
            Width::Word => write!(f, "u32"),
        }
    }
}

/// Half-open physical window `[start, start + len)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressRange {
    pub start: u32,
    pub len: u32,
}

impl AddressRange {
    pub const fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// From the inclusive `(start, end)` pairs produced by `define_addr!`.
    pub const fn from_bounds(bounds: (u32, u32)) -> Self {
        Self::new(bounds.0, bounds.1 - bounds.0 + 1)
    }

    #[inline(always)]
    pub const fn contains(&self, address: u32) -> bool {
        address.wrapping_sub(self.start) < self.len
    }

    #[inline(always)]
    pub const fn offset(&self, address: u32) -> u32 {
        address.wrapping_sub(self.start)
    }

    /// Last address inside the window.
    pub const fn end(&self) -> u32 {
        self.start + (self.len - 1)
    }

    pub const fn overlaps(&self, other: &AddressRange) -> bool {
        self.start <= other.end() && other.start <= self.end()
    }
}

impl std::fmt::Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08X}..={:08X}", self.start, self.end())
    }
}

/// Which divided clock is being delivered to a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockSource {
    /// CPU clock.
    System,
    /// CPU clock / 8.
    System8,
    /// Dot clock driving the GPU.
    Video,
}

/// Requests a device raises while being clocked. The orchestrator drains
/// and routes them once the clock pass is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    Interrupt(IrqSource),
    /// `true` while the device owns the bus and the CPU must stall.
    BusHold(bool),
}

/// A memory-mapped peripheral as seen by the bus.
///
/// Addresses passed in are physical and absolute, not window offsets.
pub trait Device {
    fn name(&self) -> &'static str;

    /// Assembles `width` bytes little-endian starting at `address`.
    fn read(&mut self, address: u32, width: Width) -> u32;

    /// Returns `false` when the device rejected the write.
    fn write(&mut self, address: u32, width: Width, value: u32) -> bool;

    fn clock(&mut self, _source: ClockSource, _events: &mut Vec<DeviceEvent>) {}

    fn reset(&mut self) {}
}

/// Reads the `width`-sized slice of a 32-bit register addressed by the low
/// two bits of `address`.
#[inline(always)]
pub fn extract(register: u32, address: u32, width: Width) -> u32 {
    (register >> ((address & 0b11) * 8)) & width.mask()
}

/// Merges a `width`-sized write into a 32-bit register at the byte lane
/// addressed by the low two bits of `address`.
#[inline(always)]
pub fn merge(register: u32, address: u32, width: Width, value: u32) -> u32 {
    let shift = (address & 0b11) * 8;
    let mask = width.mask().wrapping_shl(shift);
    (register & !mask) | (value.wrapping_shl(shift) & mask)
}

pub trait Bus8 {
    fn read_u8(&mut self, address: u32) -> u8;
    fn write_u8(&mut self, address: u32, value: u8);
}

pub trait Bus16 {
    fn read_u16(&mut self, address: u32) -> u16;
    fn write_u16(&mut self, address: u32, value: u16);
}

pub trait Bus32 {
    fn read_u32(&mut self, address: u32) -> u32;
    fn write_u32(&mut self, address: u32, value: u32);
}
