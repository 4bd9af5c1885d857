use crate::mmu::bus::{AddressRange, Device, Width};

/// Byte-addressed backing store for RAM and the BIOS ROM.
///
/// Sizes are powers of two, so out-of-window offsets wrap the way the
/// hardware mirrors them.
pub struct Memory {
    name: &'static str,
    range: AddressRange,
    data: Box<[u8]>,
    writable: bool,
}

impl Memory {
    pub fn ram(range: AddressRange) -> Self {
        Self::new("ram", range, true)
    }

    pub fn rom(range: AddressRange) -> Self {
        Self::new("bios", range, false)
    }

    /// The data cache used as fast RAM. Owned by the CPU, not the bus.
    pub fn scratchpad(range: AddressRange) -> Self {
        Self::new("scratchpad", range, true)
    }

    fn new(name: &'static str, range: AddressRange, writable: bool) -> Self {
        debug_assert!(range.len.is_power_of_two());

        Self {
            name,
            range,
            data: vec![0; range.len as usize].into_boxed_slice(),
            writable,
        }
    }

    pub fn range(&self) -> AddressRange {
        self.range
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline(always)]
    fn index(&self, address: u32) -> usize {
        (self.range.offset(address) & (self.range.len - 1)) as usize
    }

    /// Copies `bytes` in starting at `offset`, ignoring write protection.
    /// Returns how many bytes did not fit.
    pub fn load(&mut self, offset: usize, bytes: &[u8]) -> usize {
        let Some(window) = self.data.get_mut(offset..) else {
            return bytes.len();
        };

        let count = window.len().min(bytes.len());
        window[..count].copy_from_slice(&bytes[..count]);
        bytes.len() - count
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

impl Device for Memory {
    fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    fn read(&mut self, address: u32, width: Width) -> u32 {
        (0..width.bytes()).fold(0, |acc, i| {
            let byte = self.data[self.index(address.wrapping_add(i))];
            acc | ((byte as u32) << (i * 8))
        })
    }

    #[inline(always)]
    fn write(&mut self, address: u32, width: Width, value: u32) -> bool {
        if !self.writable {
            tracing::warn!(
                target: "psx_core::mmu",
                region = self.name,
                address = %format!("{:08X}", address),
                value = %format!("{:08X}", value),
                "Write to read-only memory"
            );
            return false;
        }

        for i in 0..width.bytes() {
            let index = self.index(address.wrapping_add(i));
            self.data[index] = (value >> (i * 8)) as u8;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_assembly() {
        let mut ram = Memory::ram(AddressRange::new(0, 0x100));
        assert!(ram.write(0x10, Width::Word, 0x1122_3344));
        assert_eq!(ram.read(0x10, Width::Byte), 0x44);
        assert_eq!(ram.read(0x12, Width::Half), 0x1122);
        assert_eq!(ram.read(0x10, Width::Word), 0x1122_3344);
        assert_eq!(ram.as_slice()[0x13], 0x11);
    }

    #[test]
    fn test_rom_rejects_writes_but_loads() {
        let mut rom = Memory::rom(AddressRange::new(0x1FC0_0000, 0x10));
        assert_eq!(rom.load(0, &[0xDE, 0xAD, 0xBE, 0xEF]), 0);
        assert!(!rom.write(0x1FC0_0000, Width::Byte, 0));
        assert_eq!(rom.read(0x1FC0_0000, Width::Word), 0xEFBE_ADDE);
    }

    #[test]
    fn test_load_reports_overflow() {
        let mut ram = Memory::ram(AddressRange::new(0, 8));
        assert_eq!(ram.load(6, &[1, 2, 3, 4]), 2);
        assert_eq!(ram.load(9, &[1]), 1);
        assert_eq!(&ram.as_slice()[6..], &[1, 2]);
    }
}
