pub mod bitfield;
pub mod config;
pub mod cpu;
pub mod error;
pub mod exe;
pub mod fixed;
pub mod irq;
pub mod mmu;
pub mod peripherals;
pub mod psx;

/// GTE register index as used by mfc2/mtc2 (0-31) and cfc2/ctc2 (32-63).
pub fn gteidx(register: &str) -> u8 {
    match register {
        // Data registers (r0-r31)
        "vxy0" => 0,
        "vz0" => 1,
        "vxy1" => 2,
        "vz1" => 3,
        "vxy2" => 4,
        "vz2" => 5,
        "rgbc" => 6,
        "otz" => 7,
        "ir0" => 8,
        "ir1" => 9,
        "ir2" => 10,
        "ir3" => 11,
        "sxy0" => 12,
        "sxy1" => 13,
        "sxy2" => 14,
        "sxyp" => 15,
        "sz0" => 16,
        "sz1" => 17,
        "sz2" => 18,
        "sz3" => 19,
        "rgb0" => 20,
        "rgb1" => 21,
        "rgb2" => 22,
        "res1" => 23,
        "mac0" => 24,
        "mac1" => 25,
        "mac2" => 26,
        "mac3" => 27,
        "irgb" => 28,
        "orgb" => 29,
        "lzcs" => 30,
        "lzcr" => 31,
        // Control registers (r32-r63)
        "r11r12" => 32,
        "r13r21" => 33,
        "r22r23" => 34,
        "r31r32" => 35,
        "r33" => 36,
        "trx" => 37,
        "try" => 38,
        "trz" => 39,
        "l11l12" => 40,
        "l13l21" => 41,
        "l22l23" => 42,
        "l31l32" => 43,
        "l33" => 44,
        "rbk" => 45,
        "gbk" => 46,
        "bbk" => 47,
        "lr1lr2" => 48,
        "lr3lg1" => 49,
        "lg2lg3" => 50,
        "lb1lb2" => 51,
        "lb3" => 52,
        "rfc" => 53,
        "gfc" => 54,
        "bfc" => 55,
        "ofx" => 56,
        "ofy" => 57,
        "h" => 58,
        "dqa" => 59,
        "dqb" => 60,
        "zsf3" => 61,
        "zsf4" => 62,
        "flag" => 63,
        _ => panic!("unknown GTE register name"),
    }
}

pub(crate) const fn calc_addr(base: u32, n: u32, size: u32, boundary: u32) -> (u32, u32) {
    let start = base + (n * boundary);
    let end = start + size - 1;
    (start, end)
}

/// Defines `NAME: (start, end)` plus `NAME_START`/`NAME_END` for a register
/// window. The five-argument form places the `n`th of a run of windows
/// spaced `boundary` bytes apart.
#[macro_export]
macro_rules! define_addr {
    ($name:ident, $base:expr, $size:expr) => {
        $crate::define_addr!($name, $base, 0, $size, 0);
    };
    ($name:ident, $base:expr, $n:expr, $size:expr, $boundary:expr) => {
        pub const $name: (u32, u32) = $crate::calc_addr($base, $n, $size, $boundary);
        paste::paste! {
            pub const [<$name _START>]: u32 = $name.0;
            pub const [<$name _END>]: u32 = $name.1;
        }
    };
}
