use crate::bitfield::BitField;
use crate::cpu::cop::Cop;
use crate::cpu::decoder::Opcode;
use crate::cpu::lut::GTE_LUT;
use crate::error::ExecError;
use crate::fixed::{Coeff, DepthCoeff, DepthOffset};
use proc_bitfield::bitfield;

// Data registers (mfc2/mtc2)
pub const GTE_VXY0: u8 = 0;
pub const GTE_VZ0: u8 = 1;
pub const GTE_VXY1: u8 = 2;
pub const GTE_VZ1: u8 = 3;
pub const GTE_VXY2: u8 = 4;
pub const GTE_VZ2: u8 = 5;
pub const GTE_RGBC: u8 = 6;
pub const GTE_OTZ: u8 = 7;
pub const GTE_IR0: u8 = 8;
pub const GTE_IR3: u8 = 11;
pub const GTE_SXY0: u8 = 12;
pub const GTE_SXY2: u8 = 14;
pub const GTE_SXYP: u8 = 15;
pub const GTE_SZ0: u8 = 16;
pub const GTE_SZ3: u8 = 19;
pub const GTE_RGB0: u8 = 20;
pub const GTE_RGB2: u8 = 22;
pub const GTE_RES1: u8 = 23;
pub const GTE_MAC0: u8 = 24;
pub const GTE_MAC3: u8 = 27;
pub const GTE_IRGB: u8 = 28;
pub const GTE_ORGB: u8 = 29;
pub const GTE_LZCS: u8 = 30;
pub const GTE_LZCR: u8 = 31;

// Control registers (cfc2/ctc2), numbered after the data registers
pub const GTE_RT: u8 = 32;
pub const GTE_TR: u8 = 37;
pub const GTE_LLM: u8 = 40;
pub const GTE_BK: u8 = 45;
pub const GTE_LCM: u8 = 48;
pub const GTE_FC: u8 = 53;
pub const GTE_OFX: u8 = 56;
pub const GTE_OFY: u8 = 57;
pub const GTE_H: u8 = 58;
pub const GTE_DQA: u8 = 59;
pub const GTE_DQB: u8 = 60;
pub const GTE_ZSF3: u8 = 61;
pub const GTE_ZSF4: u8 = 62;
pub const GTE_FLAG: u8 = 63;

/// FLAG bits 30-23 and 18-13; any of them sets the error summary bit 31.
pub const FLAG_ERROR_MASK: u32 = 0x7F87_E000;
const FLAG_WRITE_MASK: u32 = 0x7FFF_F000;

type CommandBit = BitField<25, 1>;
type OperationField = BitField<21, 5>;
type RtField = BitField<16, 5>;
type RdField = BitField<11, 5>;

bitfield! {
    /// The 25-bit immediate of a GTE command.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct GteCommand(pub u32): Debug, FromStorage, IntoStorage, DerefStorage {
        pub opcode: u8 @ 0..=5,
        pub lm: bool @ 10,
        pub cv: u8 @ 13..=14,
        pub sv: u8 @ 15..=16,
        pub mx: u8 @ 17..=18,
        pub sf: bool @ 19,
        pub fake_opcode: u8 @ 20..=24,
    }
}

impl GteCommand {
    /// Fraction bits dropped from MAC results.
    #[inline(always)]
    pub fn shift(&self) -> u32 {
        if self.sf() { 12 } else { 0 }
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct GteFlag(pub u32): Debug, FromStorage, IntoStorage, DerefStorage {
        pub ir0_saturated: bool @ 12,
        pub sy2_saturated: bool @ 13,
        pub sx2_saturated: bool @ 14,
        pub mac0_negative: bool @ 15,
        pub mac0_positive: bool @ 16,
        pub divide_overflow: bool @ 17,
        pub sz3_otz_saturated: bool @ 18,
        pub color_b_saturated: bool @ 19,
        pub color_g_saturated: bool @ 20,
        pub color_r_saturated: bool @ 21,
        pub ir3_saturated: bool @ 22,
        pub ir2_saturated: bool @ 23,
        pub ir1_saturated: bool @ 24,
        pub mac3_negative: bool @ 25,
        pub mac2_negative: bool @ 26,
        pub mac1_negative: bool @ 27,
        pub mac3_positive: bool @ 28,
        pub mac2_positive: bool @ 29,
        pub mac1_positive: bool @ 30,
        pub error: bool @ 31,
    }
}

impl GteFlag {
    #[inline(always)]
    pub fn update_error(&mut self) {
        if self.0 & FLAG_ERROR_MASK != 0 {
            self.0 |= 0x8000_0000;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Vec3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Copy + Into<i64>> Vec3<T> {
    #[inline(always)]
    pub fn widen(&self) -> [i64; 3] {
        [self.x.into(), self.y.into(), self.z.into()]
    }
}

/// 3x3 matrix of 1.3.12 coefficients, row major.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Matrix(pub [[Coeff; 3]; 3]);

impl Matrix {
    pub fn from_raw(raw: [[i16; 3]; 3]) -> Self {
        Matrix(raw.map(|row| row.map(Coeff::from_raw)))
    }

    #[inline(always)]
    pub fn widen(&self) -> [[i64; 3]; 3] {
        self.0.map(|row| row.map(|coeff| coeff.raw() as i64))
    }

    #[inline(always)]
    fn element(&self, index: usize) -> i16 {
        self.0[index / 3][index % 3].raw()
    }

    #[inline(always)]
    fn set_element(&mut self, index: usize, value: i16) {
        self.0[index / 3][index % 3].set_raw(value);
    }

    // Five words: (11,12) (13,21) (22,23) (31,32) (33,-)
    fn read_word(&self, word: usize) -> u32 {
        let low = self.element(word * 2) as u16 as u32;
        if word == 4 {
            return self.element(8) as i32 as u32;
        }

        low | ((self.element(word * 2 + 1) as u16 as u32) << 16)
    }

    fn write_word(&mut self, word: usize, value: u32) {
        self.set_element(word * 2, value as i16);
        if word < 4 {
            self.set_element(word * 2 + 1, (value >> 16) as i16);
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgbc {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub code: u8,
}

impl Rgbc {
    #[inline(always)]
    pub fn from_word(value: u32) -> Self {
        let [r, g, b, code] = value.to_le_bytes();
        Self { r, g, b, code }
    }

    #[inline(always)]
    pub fn to_word(self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.code])
    }

    #[inline(always)]
    pub fn widen(&self) -> [i64; 3] {
        [self.r as i64, self.g as i64, self.b as i64]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenXy {
    pub x: i16,
    pub y: i16,
}

impl ScreenXy {
    #[inline(always)]
    pub fn from_word(value: u32) -> Self {
        Self {
            x: value as i16,
            y: (value >> 16) as i16,
        }
    }

    #[inline(always)]
    pub fn to_word(self) -> u32 {
        (self.x as u16 as u32) | ((self.y as u16 as u32) << 16)
    }
}

/// Geometry transformation engine register bank.
///
/// Commands live in `interpreter::gte` and work on the typed fields; the
/// CPU only ever sees the 64 raw words through [`Cop`].
#[derive(Clone, Debug, Default)]
pub struct Cop2 {
    // Data registers
    pub v: [Vec3<i16>; 3],
    pub rgbc: Rgbc,
    pub otz: u16,
    pub ir: [i16; 4],
    pub sxy: [ScreenXy; 3],
    pub sz: [u16; 4],
    pub rgb_fifo: [Rgbc; 3],
    pub res1: u32,
    pub mac: [i32; 4],
    pub lzcs: u32,
    pub lzcr: u32,

    // Control registers
    pub rotation: Matrix,
    pub translation: Vec3<i32>,
    pub light: Matrix,
    pub background: Vec3<i32>,
    pub color: Matrix,
    pub far_color: Vec3<i32>,
    pub ofx: i32,
    pub ofy: i32,
    pub h: u16,
    pub dqa: DepthCoeff,
    pub dqb: DepthOffset,
    pub zsf3: i16,
    pub zsf4: i16,
    pub flag: GteFlag,
}

impl Cop2 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the coprocessor function of a `cop2` instruction and returns the
    /// command's cycle cost (register moves cost nothing).
    pub fn execute(&mut self, function: u32, registers: &mut [u32; 32]) -> Result<u32, ExecError> {
        if CommandBit::is_set(function) {
            return self.execute_command(GteCommand(function & 0x01FF_FFFF));
        }

        let rt = RtField::get(function) as usize;
        let rd = RdField::get(function) as u8;

        match OperationField::get(function) {
            0x00 => {
                if rt != 0 {
                    registers[rt] = self.read_register(rd);
                }
            }
            0x02 => {
                if rt != 0 {
                    registers[rt] = self.read_register(rd + 32);
                }
            }
            0x04 => self.write_register(rd, registers[rt]),
            0x06 => self.write_register(rd + 32, registers[rt]),
            operation => {
                return Err(ExecError::UnimplementedCommand {
                    mnemonic: "unknown",
                    index: operation as u8,
                });
            }
        }

        Ok(0)
    }

    pub fn execute_command(&mut self, command: GteCommand) -> Result<u32, ExecError> {
        let index = command.opcode();
        let operation = &GTE_LUT[index as usize];
        if operation.opcode == Opcode::Invalid {
            return Err(ExecError::UnimplementedCommand {
                mnemonic: "unknown",
                index,
            });
        }

        tracing::trace!(
            target: "psx_core::gte",
            command = %operation.opcode,
            sf = command.sf(),
            lm = command.lm(),
            mx = command.mx(),
            sv = command.sv(),
            cv = command.cv(),
            "Executing GTE command"
        );

        self.flag = GteFlag(0);
        (operation.handler)(self, command);
        self.flag.update_error();

        Ok(operation.cost)
    }

    #[inline(always)]
    pub fn push_sxy(&mut self, value: ScreenXy) {
        self.sxy = [self.sxy[1], self.sxy[2], value];
    }

    #[inline(always)]
    pub fn push_sz(&mut self, value: u16) {
        self.sz = [self.sz[1], self.sz[2], self.sz[3], value];
    }

    #[inline(always)]
    pub fn push_rgb(&mut self, value: Rgbc) {
        self.rgb_fifo = [self.rgb_fifo[1], self.rgb_fifo[2], value];
    }

    fn read_data(&self, register: u8) -> u32 {
        let index = register as usize;
        match register {
            GTE_VXY0 | GTE_VXY1 | GTE_VXY2 => {
                let v = self.v[index / 2];
                ScreenXy { x: v.x, y: v.y }.to_word()
            }
            GTE_VZ0 | GTE_VZ1 | GTE_VZ2 => self.v[index / 2].z as i32 as u32,
            GTE_RGBC => self.rgbc.to_word(),
            GTE_OTZ => self.otz as u32,
            GTE_IR0..=GTE_IR3 => self.ir[index - GTE_IR0 as usize] as i32 as u32,
            GTE_SXY0..=GTE_SXY2 => self.sxy[index - GTE_SXY0 as usize].to_word(),
            GTE_SXYP => self.sxy[2].to_word(),
            GTE_SZ0..=GTE_SZ3 => self.sz[index - GTE_SZ0 as usize] as u32,
            GTE_RGB0..=GTE_RGB2 => self.rgb_fifo[index - GTE_RGB0 as usize].to_word(),
            GTE_RES1 => self.res1,
            GTE_MAC0..=GTE_MAC3 => self.mac[index - GTE_MAC0 as usize] as u32,
            GTE_IRGB | GTE_ORGB => {
                let [_, r, g, b] = self.ir.map(|ir| (ir >> 7).clamp(0, 0x1F) as u32);
                r | (g << 5) | (b << 10)
            }
            GTE_LZCS => self.lzcs,
            GTE_LZCR => self.lzcr,
            _ => unreachable!(),
        }
    }

    fn write_data(&mut self, register: u8, value: u32) {
        let index = register as usize;
        match register {
            GTE_VXY0 | GTE_VXY1 | GTE_VXY2 => {
                let xy = ScreenXy::from_word(value);
                self.v[index / 2].x = xy.x;
                self.v[index / 2].y = xy.y;
            }
            GTE_VZ0 | GTE_VZ1 | GTE_VZ2 => self.v[index / 2].z = value as i16,
            GTE_RGBC => self.rgbc = Rgbc::from_word(value),
            GTE_OTZ => self.otz = value as u16,
            GTE_IR0..=GTE_IR3 => self.ir[index - GTE_IR0 as usize] = value as i16,
            GTE_SXY0..=GTE_SXY2 => self.sxy[index - GTE_SXY0 as usize] = ScreenXy::from_word(value),
            GTE_SXYP => self.push_sxy(ScreenXy::from_word(value)),
            GTE_SZ0..=GTE_SZ3 => self.sz[index - GTE_SZ0 as usize] = value as u16,
            GTE_RGB0..=GTE_RGB2 => self.rgb_fifo[index - GTE_RGB0 as usize] = Rgbc::from_word(value),
            GTE_RES1 => self.res1 = value,
            GTE_MAC0..=GTE_MAC3 => self.mac[index - GTE_MAC0 as usize] = value as i32,
            GTE_IRGB => {
                for k in 0..3 {
                    self.ir[k + 1] = (((value >> (5 * k)) & 0x1F) << 7) as i16;
                }
            }
            GTE_ORGB | GTE_LZCR => {}
            GTE_LZCS => {
                self.lzcs = value;
                self.lzcr = leading_count(value);
            }
            _ => unreachable!(),
        }
    }

    fn read_control(&self, register: u8) -> u32 {
        match register {
            GTE_RT..=36 => self.rotation.read_word((register - GTE_RT) as usize),
            GTE_TR..=39 => self.translation.widen()[(register - GTE_TR) as usize] as u32,
            GTE_LLM..=44 => self.light.read_word((register - GTE_LLM) as usize),
            GTE_BK..=47 => self.background.widen()[(register - GTE_BK) as usize] as u32,
            GTE_LCM..=52 => self.color.read_word((register - GTE_LCM) as usize),
            GTE_FC..=55 => self.far_color.widen()[(register - GTE_FC) as usize] as u32,
            GTE_OFX => self.ofx as u32,
            GTE_OFY => self.ofy as u32,
            // H is unsigned but reads back sign-extended
            GTE_H => self.h as i16 as i32 as u32,
            GTE_DQA => self.dqa.raw() as i32 as u32,
            GTE_DQB => self.dqb.raw() as u32,
            GTE_ZSF3 => self.zsf3 as i32 as u32,
            GTE_ZSF4 => self.zsf4 as i32 as u32,
            GTE_FLAG => self.flag.0,
            _ => unreachable!(),
        }
    }

    fn write_control(&mut self, register: u8, value: u32) {
        fn set_component(vector: &mut Vec3<i32>, component: u8, value: u32) {
            match component {
                0 => vector.x = value as i32,
                1 => vector.y = value as i32,
                _ => vector.z = value as i32,
            }
        }

        match register {
            GTE_RT..=36 => self.rotation.write_word((register - GTE_RT) as usize, value),
            GTE_TR..=39 => set_component(&mut self.translation, register - GTE_TR, value),
            GTE_LLM..=44 => self.light.write_word((register - GTE_LLM) as usize, value),
            GTE_BK..=47 => set_component(&mut self.background, register - GTE_BK, value),
            GTE_LCM..=52 => self.color.write_word((register - GTE_LCM) as usize, value),
            GTE_FC..=55 => set_component(&mut self.far_color, register - GTE_FC, value),
            GTE_OFX => self.ofx = value as i32,
            GTE_OFY => self.ofy = value as i32,
            GTE_H => self.h = value as u16,
            GTE_DQA => self.dqa.set_raw(value as i16),
            GTE_DQB => self.dqb.set_raw(value as i32),
            GTE_ZSF3 => self.zsf3 = value as i16,
            GTE_ZSF4 => self.zsf4 = value as i16,
            GTE_FLAG => {
                self.flag = GteFlag(value & FLAG_WRITE_MASK);
                self.flag.update_error();
            }
            _ => unreachable!(),
        }
    }
}

/// Number of leading bits equal to the sign bit.
#[inline(always)]
fn leading_count(value: u32) -> u32 {
    if value as i32 >= 0 { value.leading_zeros() } else { value.leading_ones() }
}

impl Cop for Cop2 {
    /// `register` 0-31 selects a data register, 32-63 a control register.
    #[inline(always)]
    fn read_register(&self, register: u8) -> u32 {
        match register {
            0..=31 => self.read_data(register),
            32..=63 => self.read_control(register),
            _ => {
                tracing::warn!(target: "psx_core::gte", register, "Read from unknown GTE register");
                0
            }
        }
    }

    #[inline(always)]
    fn write_register(&mut self, register: u8, value: u32) {
        match register {
            0..=31 => self.write_data(register, value),
            32..=63 => self.write_control(register, value),
            _ => {
                tracing::warn!(
                    target: "psx_core::gte",
                    register,
                    value = %format!("{:08X}", value),
                    "Write to unknown GTE register"
                );
            }
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gteidx;

    #[test]
    fn test_vector_registers() {
        let mut gte = Cop2::new();
        gte.write_register(gteidx("vxy1"), 0xFFFE_0003);
        gte.write_register(gteidx("vz1"), 0x0000_8000);
        assert_eq!(gte.v[1], Vec3 { x: 3, y: -2, z: -0x8000 });
        assert_eq!(gte.read_register(gteidx("vxy1")), 0xFFFE_0003);
        assert_eq!(gte.read_register(gteidx("vz1")), 0xFFFF_8000);
    }

    #[test]
    fn test_sxyp_pushes_fifo() {
        let mut gte = Cop2::new();
        gte.write_register(gteidx("sxy0"), 0x0001_0001);
        gte.write_register(gteidx("sxy1"), 0x0002_0002);
        gte.write_register(gteidx("sxy2"), 0x0003_0003);
        gte.write_register(gteidx("sxyp"), 0x0004_0004);

        assert_eq!(gte.read_register(gteidx("sxy0")), 0x0002_0002);
        assert_eq!(gte.read_register(gteidx("sxy1")), 0x0003_0003);
        assert_eq!(gte.read_register(gteidx("sxy2")), 0x0004_0004);
        assert_eq!(gte.read_register(gteidx("sxyp")), 0x0004_0004);
    }

    #[test]
    fn test_irgb_and_orgb() {
        let mut gte = Cop2::new();
        gte.write_register(gteidx("irgb"), 0x7FFF);
        assert_eq!(gte.ir[1..], [0xF80, 0xF80, 0xF80]);

        gte.ir[1] = -5;
        gte.ir[2] = 0x7FFF;
        gte.ir[3] = 0x0100;
        assert_eq!(gte.read_register(gteidx("orgb")), (0x02 << 10) | (0x1F << 5));

        // ORGB is read-only
        gte.write_register(gteidx("orgb"), 0);
        assert_eq!(gte.ir[2], 0x7FFF);
    }

    #[test]
    fn test_leading_count() {
        let mut gte = Cop2::new();
        gte.write_register(gteidx("lzcs"), 0x0000_FFFF);
        assert_eq!(gte.read_register(gteidx("lzcr")), 16);
        gte.write_register(gteidx("lzcs"), 0xFF00_0000);
        assert_eq!(gte.read_register(gteidx("lzcr")), 8);
        gte.write_register(gteidx("lzcs"), 0);
        assert_eq!(gte.read_register(gteidx("lzcr")), 32);

        gte.write_register(gteidx("lzcr"), 3);
        assert_eq!(gte.read_register(gteidx("lzcr")), 32);
    }

    #[test]
    fn test_matrix_packing() {
        let mut gte = Cop2::new();
        gte.write_register(gteidx("r11r12"), 0x2000_1000);
        gte.write_register(gteidx("r13r21"), 0xF000_0800);
        gte.write_register(gteidx("r33"), 0x1234_8001);

        assert_eq!(gte.rotation.0[0][0], Coeff::from_raw(0x1000));
        assert_eq!(gte.rotation.0[0][1], Coeff::from_raw(0x2000));
        assert_eq!(gte.rotation.0[0][2], Coeff::from_raw(0x0800));
        assert_eq!(gte.rotation.0[1][0].raw(), -0x1000);
        assert_eq!(gte.rotation.0[2][2].raw(), -0x7FFF);
        assert_eq!(gte.read_register(gteidx("r13r21")), 0xF000_0800);
        assert_eq!(gte.read_register(gteidx("r33")), 0xFFFF_8001);
    }

    #[test]
    fn test_control_sign_extension() {
        let mut gte = Cop2::new();
        gte.write_register(gteidx("h"), 0x0000_F000);
        assert_eq!(gte.h, 0xF000);
        assert_eq!(gte.read_register(gteidx("h")), 0xFFFF_F000);

        gte.write_register(gteidx("dqa"), 0x0000_FF80);
        assert_eq!(gte.dqa.raw(), -0x80);
        assert_eq!(gte.read_register(gteidx("dqa")), 0xFFFF_FF80);

        gte.write_register(gteidx("trz"), 0x8000_0000);
        assert_eq!(gte.translation.z, i32::MIN);
        assert_eq!(gte.read_register(gteidx("trz")), 0x8000_0000);
    }

    #[test]
    fn test_flag_write() {
        let mut gte = Cop2::new();
        gte.write_register(gteidx("flag"), 0x0000_1FFF);
        assert_eq!(gte.read_register(gteidx("flag")), 0x0000_1000);
        assert!(!gte.flag.error());

        gte.write_register(gteidx("flag"), 0x0000_2000);
        assert_eq!(gte.read_register(gteidx("flag")), 0x8000_2000);

        // Color saturation bits are not part of the summary
        gte.write_register(gteidx("flag"), 0x0078_0000);
        assert!(gte.flag.color_r_saturated());
        assert!(!gte.flag.error());
    }

    #[test]
    fn test_register_moves() {
        let mut gte = Cop2::new();
        let mut registers = [0u32; 32];
        registers[8] = 0x0000_1234;

        // mtc2 $t0, ir1 ; mfc2 $t1, ir1
        assert_eq!(gte.execute((0x04 << 21) | (8 << 16) | (9 << 11), &mut registers), Ok(0));
        assert_eq!(gte.execute((9 << 16) | (9 << 11), &mut registers), Ok(0));
        assert_eq!(registers[9], 0x1234);

        // ctc2 $t0, ofx ; cfc2 $t2, ofx
        gte.execute((0x06 << 21) | (8 << 16) | (24 << 11), &mut registers).unwrap();
        gte.execute((0x02 << 21) | (10 << 16) | (24 << 11), &mut registers).unwrap();
        assert_eq!(gte.ofx, 0x1234);
        assert_eq!(registers[10], 0x1234);

        // Moves into $zero are dropped
        gte.execute((0x02 << 21) | (24 << 11), &mut registers).unwrap();
        assert_eq!(registers[0], 0);
    }

    #[test]
    fn test_unknown_command() {
        let mut gte = Cop2::new();
        let mut registers = [0u32; 32];
        assert_eq!(
            gte.execute((1 << 25) | 0x02, &mut registers),
            Err(ExecError::UnimplementedCommand {
                mnemonic: "unknown",
                index: 0x02
            })
        );
    }
}
