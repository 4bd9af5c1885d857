use crate::define_addr;
use crate::mmu::bus::{AddressRange, Device, Width, extract, merge};

define_addr!(MEMCTRL1_ADDR, 0x1F80_1000, 0x24);
define_addr!(MEMCTRL2_ADDR, 0x1F80_1060, 0x04);
define_addr!(EXPANSION2_ADDR, 0x1F80_2000, 0x80);
define_addr!(POST_ADDR, 0x1F80_2041, 0x01);

define_addr!(EXP1_BASE_ADDR, MEMCTRL1_ADDR_START, 0, 4, 4);
define_addr!(EXP2_BASE_ADDR, MEMCTRL1_ADDR_START, 1, 4, 4);
define_addr!(EXP1_DELAY_ADDR, MEMCTRL1_ADDR_START, 2, 4, 4);
define_addr!(EXP3_DELAY_ADDR, MEMCTRL1_ADDR_START, 3, 4, 4);
define_addr!(BIOS_DELAY_ADDR, MEMCTRL1_ADDR_START, 4, 4, 4);
define_addr!(SPU_DELAY_ADDR, MEMCTRL1_ADDR_START, 5, 4, 4);
define_addr!(CDROM_DELAY_ADDR, MEMCTRL1_ADDR_START, 6, 4, 4);
define_addr!(EXP2_DELAY_ADDR, MEMCTRL1_ADDR_START, 7, 4, 4);
define_addr!(COM_DELAY_ADDR, MEMCTRL1_ADDR_START, 8, 4, 4);

const REGISTER_NAMES: [&str; 9] = [
    "exp1 base",
    "exp2 base",
    "exp1 delay/size",
    "exp3 delay/size",
    "bios delay/size",
    "spu delay/size",
    "cdrom delay/size",
    "exp2 delay/size",
    "common delay",
];

/// Memory-control registers (delay/size and expansion base addresses), the
/// RAM_SIZE register and the expansion-2 window with the POST display.
///
/// These only latch what the BIOS writes; no timing is derived from them.
pub struct MemoryControl {
    pub registers: [u32; 9],
    pub ram_size: u32,
    pub post: u8,
    expansion2: [u8; 0x80],
}

impl MemoryControl {
    pub fn new() -> Self {
        Self {
            registers: [0; 9],
            ram_size: 0,
            post: 0,
            expansion2: [0; 0x80],
        }
    }

    /// Physical windows this device answers to.
    pub fn ranges() -> [AddressRange; 3] {
        [
            AddressRange::from_bounds(MEMCTRL1_ADDR),
            AddressRange::from_bounds(MEMCTRL2_ADDR),
            AddressRange::from_bounds(EXPANSION2_ADDR),
        ]
    }

    #[inline(always)]
    fn register_index(address: u32) -> usize {
        ((address - MEMCTRL1_ADDR_START) >> 2) as usize
    }

    fn read_expansion2(&self, address: u32, width: Width) -> u32 {
        let offset = (address - EXPANSION2_ADDR_START) as usize;
        (0..width.bytes() as usize).fold(0, |acc, i| {
            let byte = self.expansion2.get(offset + i).copied().unwrap_or(0xFF);
            acc | ((byte as u32) << (i * 8))
        })
    }

    fn write_expansion2(&mut self, address: u32, width: Width, value: u32) {
        let offset = (address - EXPANSION2_ADDR_START) as usize;
        for i in 0..width.bytes() as usize {
            let byte = (value >> (i * 8)) as u8;
            if let Some(slot) = self.expansion2.get_mut(offset + i) {
                *slot = byte;
            }

            if address + i as u32 == POST_ADDR_START {
                self.post = byte;
                tracing::debug!(target: "psx_core::mmu", post = %format!("{:02X}", byte), "BIOS POST");
            }
        }
    }
}

impl Default for MemoryControl {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for MemoryControl {
    fn name(&self) -> &'static str {
        "memctrl"
    }

    fn read(&mut self, address: u32, width: Width) -> u32 {
        match address {
            MEMCTRL1_ADDR_START..=MEMCTRL1_ADDR_END => {
                extract(self.registers[Self::register_index(address)], address, width)
            }
            MEMCTRL2_ADDR_START..=MEMCTRL2_ADDR_END => extract(self.ram_size, address, width),
            EXPANSION2_ADDR_START..=EXPANSION2_ADDR_END => self.read_expansion2(address, width),
            _ => {
                tracing::error!(target: "psx_core::mmu", address = %format!("{:08X}", address), "Memory control read outside its windows");
                0
            }
        }
    }

    fn write(&mut self, address: u32, width: Width, value: u32) -> bool {
        match address {
            MEMCTRL1_ADDR_START..=MEMCTRL1_ADDR_END => {
                let index = Self::register_index(address);
                self.registers[index] = merge(self.registers[index], address, width, value);

                tracing::trace!(
                    target: "psx_core::mmu",
                    register = REGISTER_NAMES[index],
                    value = %format!("{:08X}", self.registers[index]),
                    "Memory control write"
                );
                true
            }
            MEMCTRL2_ADDR_START..=MEMCTRL2_ADDR_END => {
                self.ram_size = merge(self.ram_size, address, width, value);
                true
            }
            EXPANSION2_ADDR_START..=EXPANSION2_ADDR_END => {
                self.write_expansion2(address, width, value);
                true
            }
            _ => {
                tracing::error!(
                    target: "psx_core::mmu",
                    address = %format!("{:08X}", address),
                    value = %format!("{:08X}", value),
                    "Memory control write outside its windows"
                );
                false
            }
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}
