use proc_bitfield::bitfield;

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct StatusRegister(pub u32): Debug, FromStorage, IntoStorage, DerefStorage {
        /// IEc/KUc, IEp/KUp, IEo/KUo as one 6-bit stack
        pub mode_stack: u32 @ 0..=5,
        pub current_interrupt_enable: bool @ 0,
        pub current_mode: bool @ 1,
        pub previous_interrupt_enable: bool @ 2,
        pub previous_mode: bool @ 3,
        pub old_interrupt_enable: bool @ 4,
        pub old_mode: bool @ 5,
        pub interrupt_mask: u32 @ 8..=15,
        pub isolate_cache: bool @ 16,
        pub swapped_cache: bool @ 17,
        pub boot_exception_vector_location: bool @ 22, // 0 = RAM, 1 = ROM
        pub cop0_enable: bool @ 28,
        pub cop1_enable: bool @ 29,
        pub cop2_enable: bool @ 30,
        pub cop3_enable: bool @ 31,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct CauseRegister(pub u32): Debug, FromStorage, IntoStorage, DerefStorage {
        pub exception_code: u32 @ 2..=6,
        pub software_interrupts: u32 @ 8..=9,
        pub interrupt_pending: u32 @ 10..=15,
        pub coprocessor_exception: u32 @ 28..=29,
        pub branch_taken: bool @ 30,
        pub branch_delay: bool @ 31,
    }
}

bitfield! {
    /// BIU/cache configuration at FFFE0130h.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct CacheControl(pub u32): Debug, FromStorage, IntoStorage, DerefStorage {
        pub scratchpad_enable_1: bool @ 3,
        pub scratchpad_enable_2: bool @ 7,
        pub icache_enable: bool @ 11,
    }
}

impl CacheControl {
    /// The data cache serves as scratchpad only with both enable bits set.
    #[inline(always)]
    pub fn scratchpad_enabled(&self) -> bool {
        self.scratchpad_enable_1() && self.scratchpad_enable_2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_fields() {
        let mut sr = StatusRegister(0x0060_0000);
        assert!(sr.boot_exception_vector_location());
        assert_eq!(sr.mode_stack(), 0);

        sr.set_mode_stack(0b10_0101);
        assert!(sr.current_interrupt_enable());
        assert!(sr.previous_interrupt_enable());
        assert!(sr.old_mode());
        assert_eq!(sr.0, 0x0060_0025);
    }

    #[test]
    fn test_cache_control() {
        assert!(!CacheControl(0x08).scratchpad_enabled());
        assert!(!CacheControl(0x80).scratchpad_enabled());
        assert!(CacheControl(0x0001_E988).scratchpad_enabled());
        assert!(CacheControl(0x800).icache_enable());
    }
}
