use crate::cpu::cop::cop2::{Cop2, GteCommand, Matrix, Rgbc, ScreenXy};

// Reciprocal seed table for the perspective divide
static UNR_TABLE: [u8; 0x101] = [
    0xFF, 0xFD, 0xFB, 0xF9, 0xF7, 0xF5, 0xF3, 0xF1, 0xEF, 0xEE, 0xEC, 0xEA, 0xE8, 0xE6, 0xE4, 0xE3, 0xE1, 0xDF, 0xDD,
    0xDC, 0xDA, 0xD8, 0xD6, 0xD5, 0xD3, 0xD1, 0xD0, 0xCE, 0xCD, 0xCB, 0xC9, 0xC8, 0xC6, 0xC5, 0xC3, 0xC1, 0xC0, 0xBE,
    0xBD, 0xBB, 0xBA, 0xB8, 0xB7, 0xB5, 0xB4, 0xB2, 0xB1, 0xB0, 0xAE, 0xAD, 0xAB, 0xAA, 0xA9, 0xA7, 0xA6, 0xA4, 0xA3,
    0xA2, 0xA0, 0x9F, 0x9E, 0x9C, 0x9B, 0x9A, 0x99, 0x97, 0x96, 0x95, 0x94, 0x92, 0x91, 0x90, 0x8F, 0x8D, 0x8C, 0x8B,
    0x8A, 0x89, 0x87, 0x86, 0x85, 0x84, 0x83, 0x82, 0x81, 0x7F, 0x7E, 0x7D, 0x7C, 0x7B, 0x7A, 0x79, 0x78, 0x77, 0x75,
    0x74, 0x73, 0x72, 0x71, 0x70, 0x6F, 0x6E, 0x6D, 0x6C, 0x6B, 0x6A, 0x69, 0x68, 0x67, 0x66, 0x65, 0x64, 0x63, 0x62,
    0x61, 0x60, 0x5F, 0x5E, 0x5D, 0x5D, 0x5C, 0x5B, 0x5A, 0x59, 0x58, 0x57, 0x56, 0x55, 0x54, 0x53, 0x53, 0x52, 0x51,
    0x50, 0x4F, 0x4E, 0x4D, 0x4D, 0x4C, 0x4B, 0x4A, 0x49, 0x48, 0x48, 0x47, 0x46, 0x45, 0x44, 0x43, 0x43, 0x42, 0x41,
    0x40, 0x3F, 0x3F, 0x3E, 0x3D, 0x3C, 0x3C, 0x3B, 0x3A, 0x39, 0x39, 0x38, 0x37, 0x36, 0x36, 0x35, 0x34, 0x33, 0x33,
    0x32, 0x31, 0x31, 0x30, 0x2F, 0x2E, 0x2E, 0x2D, 0x2C, 0x2C, 0x2B, 0x2A, 0x2A, 0x29, 0x28, 0x28, 0x27, 0x26, 0x26,
    0x25, 0x24, 0x24, 0x23, 0x22, 0x22, 0x21, 0x20, 0x20, 0x1F, 0x1E, 0x1E, 0x1D, 0x1D, 0x1C, 0x1B, 0x1B, 0x1A, 0x19,
    0x19, 0x18, 0x18, 0x17, 0x16, 0x16, 0x15, 0x15, 0x14, 0x14, 0x13, 0x12, 0x12, 0x11, 0x11, 0x10, 0x0F, 0x0F, 0x0E,
    0x0E, 0x0D, 0x0D, 0x0C, 0x0C, 0x0B, 0x0A, 0x0A, 0x09, 0x09, 0x08, 0x08, 0x07, 0x07, 0x06, 0x06, 0x05, 0x05, 0x04,
    0x04, 0x03, 0x03, 0x02, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00,
];

const DIVIDE_OVERFLOW: u32 = 0x1_FFFF;

/// Unsigned Newton-Raphson division `(h << 16) / sz3`, as done by the
/// hardware. Only valid when `sz3 * 2 > h`.
pub fn divide(h: u16, sz3: u16) -> u32 {
    let shift = sz3.leading_zeros();
    let n = (h as u64) << shift;
    let d = (sz3 as u64) << shift;
    let u = UNR_TABLE[((d - 0x7FC0) >> 7) as usize] as u64 + 0x101;
    let d = (0x200_0080 - d * u) >> 8;
    let d = (0x80 + d * u) >> 8;
    (((n * d) + 0x8000) >> 16).min(DIVIDE_OVERFLOW as u64) as u32
}

// Saturation stages. Each one clamps to the width of its destination and
// records the clamp in FLAG; `i` is the 1-based component.
impl Cop2 {
    /// MAC1-3 44-bit overflow check. The result wraps to 44 bits.
    #[inline(always)]
    fn a(&mut self, i: usize, value: i64) -> i64 {
        if value < -0x800_0000_0000 {
            self.flag.0 |= 0x800_0000 >> (i - 1);
        }

        if value > 0x7FF_FFFF_FFFF {
            self.flag.0 |= 0x4000_0000 >> (i - 1);
        }

        (value << 20) >> 20
    }

    /// MAC1-3 to IR1-3.
    #[inline(always)]
    fn lm_b(&mut self, i: usize, value: i32, lm: bool) -> i16 {
        let min = if lm { 0 } else { -0x8000 };
        if value < min || value > 0x7FFF {
            self.flag.0 |= 0x100_0000 >> (i - 1);
        }

        value.clamp(min, 0x7FFF) as i16
    }

    /// MAC3 to IR3 during RTPS/RTPT. The flag tests the unshifted depth.
    #[inline(always)]
    fn lm_b_z(&mut self, value: i32, depth: i64, lm: bool) -> i16 {
        if !(-0x8000..=0x7FFF).contains(&depth) {
            self.flag.set_ir3_saturated(true);
        }

        value.clamp(if lm { 0 } else { -0x8000 }, 0x7FFF) as i16
    }

    /// MAC1-3 to an 8-bit color component.
    #[inline(always)]
    fn lm_c(&mut self, i: usize, value: i32) -> u8 {
        if !(0..=0xFF).contains(&value) {
            self.flag.0 |= 0x20_0000 >> (i - 1);
        }

        value.clamp(0, 0xFF) as u8
    }

    /// SZ3 and OTZ.
    #[inline(always)]
    fn lm_d(&mut self, value: i64) -> u16 {
        if !(0..=0xFFFF).contains(&value) {
            self.flag.set_sz3_otz_saturated(true);
        }

        value.clamp(0, 0xFFFF) as u16
    }

    /// MAC0 32-bit overflow check. The value passes through unchanged.
    #[inline(always)]
    fn f(&mut self, value: i64) -> i64 {
        if value < -0x8000_0000 {
            self.flag.set_mac0_negative(true);
        } else if value > 0x7FFF_FFFF {
            self.flag.set_mac0_positive(true);
        }

        value
    }

    /// Screen coordinates.
    #[inline(always)]
    fn lm_g(&mut self, i: usize, value: i64) -> i16 {
        if !(-0x400..=0x3FF).contains(&value) {
            self.flag.0 |= 0x4000 >> (i - 1);
        }

        value.clamp(-0x400, 0x3FF) as i16
    }

    /// IR0.
    #[inline(always)]
    fn lm_h(&mut self, value: i64) -> i16 {
        if !(0..=0x1000).contains(&value) {
            self.flag.set_ir0_saturated(true);
        }

        value.clamp(0, 0x1000) as i16
    }

    /// `translation + matrix * vector`, accumulated one column at a time
    /// with the 44-bit check after every step.
    fn multiply_add(&mut self, matrix: &[[i64; 3]; 3], vector: [i64; 3], translation: [i64; 3]) -> [i64; 3] {
        let mut sum = translation;
        for column in 0..3 {
            for row in 0..3 {
                sum[row] = self.a(row + 1, sum[row] + matrix[row][column] * vector[column]);
            }
        }

        sum
    }

    /// Stores shifted sums into MAC1-3 and their saturated copies into IR1-3.
    fn set_mac_ir(&mut self, sums: [i64; 3], command: GteCommand) {
        let shift = command.shift();
        for i in 1..=3 {
            self.mac[i] = (sums[i - 1] >> shift) as i32;
            self.ir[i] = self.lm_b(i, self.mac[i], command.lm());
        }
    }

    fn ir_vector(&self) -> [i64; 3] {
        [self.ir[1] as i64, self.ir[2] as i64, self.ir[3] as i64]
    }

    /// Pushes MAC1-3 / 16 to the color FIFO, keeping the code byte of RGBC.
    fn push_color(&mut self) {
        let color = Rgbc {
            r: self.lm_c(1, self.mac[1] >> 4),
            g: self.lm_c(2, self.mac[2] >> 4),
            b: self.lm_c(3, self.mac[3] >> 4),
            code: self.rgbc.code,
        };

        self.push_rgb(color);
    }

    /// Interpolates `base` toward the far color by IR0, then pushes the
    /// result as a color.
    fn depth_cue(&mut self, base: [i64; 3], command: GteCommand) {
        let shift = command.shift();
        let far_color = self.far_color.widen();
        let ir0 = self.ir[0] as i64;

        let mut sums = [0; 3];
        for i in 1..=3 {
            let distance = (self.a(i, (far_color[i - 1] << 12) - base[i - 1]) >> shift) as i32;
            let distance = self.lm_b(i, distance, false) as i64;
            sums[i - 1] = self.a(i, base[i - 1] + ir0 * distance);
        }

        self.set_mac_ir(sums, command);
        self.push_color();
    }

    /// `(RGB << 4) * IR`, the light color modulated by the vertex color.
    fn color_times_ir(&self) -> [i64; 3] {
        let ir = self.ir_vector();
        let rgb = self.rgbc.widen();
        [(rgb[0] << 4) * ir[0], (rgb[1] << 4) * ir[1], (rgb[2] << 4) * ir[2]]
    }

    fn perspective_transform(&mut self, index: usize, depth_cue: bool, command: GteCommand) {
        let lm = command.lm();
        let translation = self.translation.widen().map(|t| t << 12);
        let sums = self.multiply_add(&self.rotation.widen(), self.v[index].widen(), translation);

        let shift = command.shift();
        for i in 1..=3 {
            self.mac[i] = (sums[i - 1] >> shift) as i32;
        }

        let depth = sums[2] >> 12;
        self.ir[1] = self.lm_b(1, self.mac[1], lm);
        self.ir[2] = self.lm_b(2, self.mac[2], lm);
        self.ir[3] = self.lm_b_z(self.mac[3], depth, lm);

        let sz3 = self.lm_d(depth);
        self.push_sz(sz3);

        let quotient = if sz3 as u32 * 2 > self.h as u32 {
            divide(self.h, sz3) as i64
        } else {
            self.flag.set_divide_overflow(true);
            DIVIDE_OVERFLOW as i64
        };

        let x = self.f(self.ofx as i64 + self.ir[1] as i64 * quotient) >> 16;
        let y = self.f(self.ofy as i64 + self.ir[2] as i64 * quotient) >> 16;
        let xy = ScreenXy {
            x: self.lm_g(1, x),
            y: self.lm_g(2, y),
        };
        self.push_sxy(xy);

        if depth_cue {
            let depth = self.dqb.raw() as i64 + self.dqa.raw() as i64 * quotient;
            self.mac[0] = self.f(depth) as i32;
            self.ir[0] = self.lm_h(depth >> 12);
        }
    }

    /// Light matrix times a normal, then the color matrix on top of the
    /// background color. Leaves the light intensity in IR1-3.
    fn normal_color(&mut self, index: usize, command: GteCommand) {
        let sums = self.multiply_add(&self.light.widen(), self.v[index].widen(), [0; 3]);
        self.set_mac_ir(sums, command);
        self.color_matrix(command);
    }

    fn color_matrix(&mut self, command: GteCommand) {
        let background = self.background.widen().map(|b| b << 12);
        let sums = self.multiply_add(&self.color.widen(), self.ir_vector(), background);
        self.set_mac_ir(sums, command);
    }

    fn nc(&mut self, index: usize, command: GteCommand) {
        self.normal_color(index, command);
        self.push_color();
    }

    fn ncc(&mut self, index: usize, command: GteCommand) {
        self.normal_color(index, command);
        let products = self.color_times_ir();
        let sums = [self.a(1, products[0]), self.a(2, products[1]), self.a(3, products[2])];
        self.set_mac_ir(sums, command);
        self.push_color();
    }

    fn ncd(&mut self, index: usize, command: GteCommand) {
        self.normal_color(index, command);
        let base = self.color_times_ir();
        self.depth_cue(base, command);
    }

    // MVMVA's fourth matrix selector reads a mix of registers
    fn garbage_matrix(&self) -> Matrix {
        let r = (self.rgbc.r as i16) << 4;
        let r13 = self.rotation.0[0][2].raw();
        let r22 = self.rotation.0[1][1].raw();
        Matrix::from_raw([[-r, r, self.ir[0]], [r13; 3], [r22; 3]])
    }
}

pub fn rtps(gte: &mut Cop2, command: GteCommand) {
    gte.perspective_transform(0, true, command);
}

pub fn rtpt(gte: &mut Cop2, command: GteCommand) {
    gte.perspective_transform(0, false, command);
    gte.perspective_transform(1, false, command);
    gte.perspective_transform(2, true, command);
}

pub fn nclip(gte: &mut Cop2, _command: GteCommand) {
    let [s0, s1, s2] = gte.sxy.map(|xy| (xy.x as i64, xy.y as i64));
    let product = s0.0 * s1.1 + s1.0 * s2.1 + s2.0 * s0.1 - s0.0 * s2.1 - s1.0 * s0.1 - s2.0 * s1.1;
    gte.mac[0] = gte.f(product) as i32;
}

pub fn op(gte: &mut Cop2, command: GteCommand) {
    let [ir1, ir2, ir3] = gte.ir_vector();
    let d1 = gte.rotation.0[0][0].raw() as i64;
    let d2 = gte.rotation.0[1][1].raw() as i64;
    let d3 = gte.rotation.0[2][2].raw() as i64;

    let sums = [
        gte.a(1, ir3 * d2 - ir2 * d3),
        gte.a(2, ir1 * d3 - ir3 * d1),
        gte.a(3, ir2 * d1 - ir1 * d2),
    ];
    gte.set_mac_ir(sums, command);
}

pub fn dpcs(gte: &mut Cop2, command: GteCommand) {
    let base = gte.rgbc.widen().map(|c| c << 16);
    gte.depth_cue(base, command);
}

pub fn dpct(gte: &mut Cop2, command: GteCommand) {
    for _ in 0..3 {
        let base = gte.rgb_fifo[0].widen().map(|c| c << 16);
        gte.depth_cue(base, command);
    }
}

pub fn intpl(gte: &mut Cop2, command: GteCommand) {
    let base = gte.ir_vector().map(|ir| ir << 12);
    gte.depth_cue(base, command);
}

pub fn mvmva(gte: &mut Cop2, command: GteCommand) {
    let matrix = match command.mx() {
        0 => gte.rotation,
        1 => gte.light,
        2 => gte.color,
        _ => gte.garbage_matrix(),
    }
    .widen();

    let vector = match command.sv() {
        sv @ 0..=2 => gte.v[sv as usize].widen(),
        _ => gte.ir_vector(),
    };

    let translation = match command.cv() {
        0 => gte.translation.widen(),
        1 => gte.background.widen(),
        2 => gte.far_color.widen(),
        _ => [0; 3],
    }
    .map(|t| t << 12);

    if command.cv() != 2 {
        let sums = gte.multiply_add(&matrix, vector, translation);
        gte.set_mac_ir(sums, command);
        return;
    }

    // The far color path only flags the first column and then drops it
    let shift = command.shift();
    for row in 0..3 {
        let first = gte.a(row + 1, translation[row] + matrix[row][0] * vector[0]);
        gte.lm_b(row + 1, (first >> shift) as i32, false);
    }

    let columns = [[0, matrix[0][1], matrix[0][2]], [0, matrix[1][1], matrix[1][2]], [0, matrix[2][1], matrix[2][2]]];
    let sums = gte.multiply_add(&columns, vector, [0; 3]);
    gte.set_mac_ir(sums, command);
}

pub fn ncds(gte: &mut Cop2, command: GteCommand) {
    gte.ncd(0, command);
}

pub fn ncdt(gte: &mut Cop2, command: GteCommand) {
    for index in 0..3 {
        gte.ncd(index, command);
    }
}

pub fn cdp(gte: &mut Cop2, command: GteCommand) {
    gte.color_matrix(command);
    let base = gte.color_times_ir();
    gte.depth_cue(base, command);
}

pub fn nccs(gte: &mut Cop2, command: GteCommand) {
    gte.ncc(0, command);
}

pub fn ncct(gte: &mut Cop2, command: GteCommand) {
    for index in 0..3 {
        gte.ncc(index, command);
    }
}

pub fn cc(gte: &mut Cop2, command: GteCommand) {
    gte.color_matrix(command);
    let products = gte.color_times_ir();
    let sums = [gte.a(1, products[0]), gte.a(2, products[1]), gte.a(3, products[2])];
    gte.set_mac_ir(sums, command);
    gte.push_color();
}

pub fn ncs(gte: &mut Cop2, command: GteCommand) {
    gte.nc(0, command);
}

pub fn nct(gte: &mut Cop2, command: GteCommand) {
    for index in 0..3 {
        gte.nc(index, command);
    }
}

pub fn sqr(gte: &mut Cop2, command: GteCommand) {
    let ir = gte.ir_vector();
    let sums = [gte.a(1, ir[0] * ir[0]), gte.a(2, ir[1] * ir[1]), gte.a(3, ir[2] * ir[2])];
    gte.set_mac_ir(sums, command);
}

pub fn dcpl(gte: &mut Cop2, command: GteCommand) {
    let base = gte.color_times_ir();
    gte.depth_cue(base, command);
}

pub fn avsz3(gte: &mut Cop2, _command: GteCommand) {
    let sum: i64 = gte.sz[1..].iter().map(|&z| z as i64).sum();
    let average = gte.zsf3 as i64 * sum;
    gte.mac[0] = gte.f(average) as i32;
    gte.otz = gte.lm_d(average >> 12);
}

pub fn avsz4(gte: &mut Cop2, _command: GteCommand) {
    let sum: i64 = gte.sz.iter().map(|&z| z as i64).sum();
    let average = gte.zsf4 as i64 * sum;
    gte.mac[0] = gte.f(average) as i32;
    gte.otz = gte.lm_d(average >> 12);
}

pub fn gpf(gte: &mut Cop2, command: GteCommand) {
    let ir0 = gte.ir[0] as i64;
    let ir = gte.ir_vector();
    let sums = [gte.a(1, ir0 * ir[0]), gte.a(2, ir0 * ir[1]), gte.a(3, ir0 * ir[2])];
    gte.set_mac_ir(sums, command);
    gte.push_color();
}

pub fn gpl(gte: &mut Cop2, command: GteCommand) {
    let shift = command.shift();
    let ir0 = gte.ir[0] as i64;
    let ir = gte.ir_vector();
    let mac = [gte.mac[1], gte.mac[2], gte.mac[3]].map(|m| (m as i64) << shift);
    let sums = [
        gte.a(1, ir0 * ir[0] + mac[0]),
        gte.a(2, ir0 * ir[1] + mac[1]),
        gte.a(3, ir0 * ir[2] + mac[2]),
    ];
    gte.set_mac_ir(sums, command);
    gte.push_color();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::cop::Cop;
    use crate::cpu::cop::cop2::Vec3;
    use crate::gteidx;

    const SF: u32 = 1 << 19;
    const LM: u32 = 1 << 10;

    fn run(gte: &mut Cop2, command: u32) -> u32 {
        gte.execute_command(GteCommand(command)).unwrap()
    }

    fn identity() -> Matrix {
        Matrix::from_raw([[0x1000, 0, 0], [0, 0x1000, 0], [0, 0, 0x1000]])
    }

    #[test]
    fn test_nclip() {
        let mut gte = Cop2::new();
        gte.write_register(gteidx("sxy0"), 0x0000_0000);
        gte.write_register(gteidx("sxy1"), 0x0000_000A);
        gte.write_register(gteidx("sxy2"), 0x000A_0000);
        gte.write_register(gteidx("flag"), 0x0001_8000);

        assert_eq!(run(&mut gte, 0x06), 8);
        assert_eq!(gte.mac[0], 100);
        assert!(!gte.flag.mac0_positive());
        assert!(!gte.flag.mac0_negative());
        assert_eq!(gte.flag.0, 0);
    }

    #[test]
    fn test_nclip_overflow() {
        let mut gte = Cop2::new();
        gte.sxy = [
            ScreenXy { x: -0x8000, y: 0 },
            ScreenXy { x: 0, y: -0x8000 },
            ScreenXy { x: 0x7FFF, y: 0x7FFF },
        ];

        run(&mut gte, 0x06);
        assert!(gte.flag.mac0_positive());
        assert!(gte.flag.error());
    }

    #[test]
    fn test_divide() {
        assert_eq!(divide(0x1000, 0x1000), 0x1_0000);
        assert_eq!(divide(0x100, 0x200), 0x8000);
        assert_eq!(divide(0xFFFF, 0x8000), 0x1_FFFE);
        assert_eq!(divide(1000, 3000), 0x5555);
    }

    #[test]
    fn test_rtps_identity() {
        let mut gte = Cop2::new();
        gte.rotation = identity();
        gte.v[0] = Vec3 { x: 100, y: -50, z: 0x400 };
        gte.h = 0x200;
        gte.dqa = crate::fixed::DepthCoeff::from_raw(0);
        gte.dqb = crate::fixed::DepthOffset::from_raw(0x0100_0000);

        assert_eq!(run(&mut gte, SF | 0x01), 15);

        assert_eq!(gte.mac[1..], [100, -50, 0x400]);
        assert_eq!(gte.ir[1..], [100, -50, 0x400]);
        assert_eq!(gte.sz[3], 0x400);
        // h / sz = 0.5, so the screen point is half the view-space point
        assert_eq!(gte.sxy[2], ScreenXy { x: 50, y: -25 });
        assert_eq!(gte.mac[0], 0x0100_0000);
        assert_eq!(gte.ir[0], 0x1000);
        assert_eq!(gte.flag.0, 0);
    }

    #[test]
    fn test_rtps_divide_overflow() {
        let mut gte = Cop2::new();
        gte.rotation = identity();
        gte.v[0] = Vec3 { x: 1, y: 1, z: 0x10 };
        gte.h = 0x1000;

        run(&mut gte, SF | 0x01);
        assert!(gte.flag.divide_overflow());
        assert!(gte.flag.error());
        // ofx + 1 * 0x1FFFF, shifted down by 16
        assert_eq!(gte.sxy[2], ScreenXy { x: 1, y: 1 });
    }

    #[test]
    fn test_rtpt_fills_fifos() {
        let mut gte = Cop2::new();
        gte.rotation = identity();
        gte.h = 0x100;
        for (i, z) in [0x200, 0x400, 0x800].into_iter().enumerate() {
            gte.v[i] = Vec3 { x: 0x40, y: 0x40, z };
        }

        assert_eq!(run(&mut gte, SF | 0x30), 23);
        assert_eq!(gte.sz[1..], [0x200, 0x400, 0x800]);
        assert_eq!(gte.sxy.map(|xy| xy.x), [0x20, 0x10, 0x08]);
    }

    #[test]
    fn test_sqr_and_lm() {
        let mut gte = Cop2::new();
        gte.ir = [0, 0x1000, -0x2000, 0x4000];

        run(&mut gte, SF | 0x28);
        assert_eq!(gte.mac[1..], [0x1000, 0x4000, 0x1_0000]);
        assert_eq!(gte.ir[1..], [0x1000, 0x4000, 0x7FFF]);
        assert!(gte.flag.ir3_saturated());
        assert!(!gte.flag.ir1_saturated());
    }

    #[test]
    fn test_op_cross_product() {
        let mut gte = Cop2::new();
        gte.rotation = identity();
        gte.ir = [0, 0x1000, 0, 0];

        run(&mut gte, SF | LM | 0x0C);
        // (1,0,0) x diag(1,1,1) = (0, 1, -1); lm clamps the negative part
        assert_eq!(gte.mac[1..], [0, 0x1000, -0x1000]);
        assert_eq!(gte.ir[1..], [0, 0x1000, 0]);
        assert!(gte.flag.ir3_saturated());
    }

    #[test]
    fn test_mvmva_light_times_ir() {
        let mut gte = Cop2::new();
        gte.light = identity();
        gte.background = Vec3 { x: 0x10, y: 0x20, z: 0x30 };
        gte.ir = [0, 0x100, 0x200, 0x300];

        // mx=1 (light), sv=3 (IR), cv=1 (background)
        assert_eq!(run(&mut gte, SF | (1 << 17) | (3 << 15) | (1 << 13) | 0x12), 8);
        assert_eq!(gte.mac[1..], [0x110, 0x220, 0x330]);
        assert_eq!(gte.ir[1..], [0x110, 0x220, 0x330]);
    }

    #[test]
    fn test_mvmva_far_color_drops_translation() {
        let mut gte = Cop2::new();
        gte.rotation = identity();
        gte.far_color = Vec3 { x: 0x1000, y: 0x1000, z: 0x1000 };
        gte.v[0] = Vec3 { x: 0x100, y: 0x200, z: 0x300 };

        // cv=2 loses the translation and the first column
        run(&mut gte, SF | (2 << 13) | 0x12);
        assert_eq!(gte.mac[1..], [0, 0x200, 0x300]);
    }

    #[test]
    fn test_avsz3() {
        let mut gte = Cop2::new();
        gte.sz = [0xFFFF, 0x100, 0x200, 0x300];
        gte.zsf3 = 0x555;

        assert_eq!(run(&mut gte, 0x2D), 5);
        assert_eq!(gte.mac[0], 0x555 * 0x600);
        assert_eq!(gte.otz, ((0x555 * 0x600) >> 12) as u16);
        assert_eq!(gte.flag.0, 0);
    }

    #[test]
    fn test_avsz4_saturates_otz() {
        let mut gte = Cop2::new();
        gte.sz = [0xFFFF; 4];
        gte.zsf4 = 0x7FFF;

        run(&mut gte, 0x2E);
        assert_eq!(gte.otz, 0xFFFF);
        assert!(gte.flag.sz3_otz_saturated());
        assert!(gte.flag.error());
    }

    #[test]
    fn test_gpf_pushes_color() {
        let mut gte = Cop2::new();
        gte.ir = [0x800, 0x1000, 0x2000, 0x0];
        gte.rgbc = Rgbc { r: 0, g: 0, b: 0, code: 0x2C };

        run(&mut gte, SF | 0x3D);
        assert_eq!(gte.mac[1..], [0x800, 0x1000, 0]);
        assert_eq!(gte.rgb_fifo[2], Rgbc { r: 0x80, g: 0xFF, b: 0, code: 0x2C });
        assert!(gte.flag.color_g_saturated());
        assert!(!gte.flag.error());
    }

    #[test]
    fn test_gpl_accumulates() {
        let mut gte = Cop2::new();
        gte.ir = [0x1000, 0x10, 0x20, 0x30];
        gte.mac = [0, 1, 2, 3];

        run(&mut gte, SF | 0x3E);
        assert_eq!(gte.mac[1..], [0x11, 0x22, 0x33]);
    }

    #[test]
    fn test_intpl_full_far_color() {
        let mut gte = Cop2::new();
        gte.ir = [0x1000, 0x100, 0x200, 0x300];
        gte.far_color = Vec3 { x: 0x800, y: 0x800, z: 0x800 };
        gte.rgbc.code = 0x30;

        assert_eq!(run(&mut gte, SF | 0x11), 8);
        // IR0 = 1.0 lands exactly on the far color
        assert_eq!(gte.mac[1..], [0x800, 0x800, 0x800]);
        assert_eq!(gte.rgb_fifo[2], Rgbc { r: 0x80, g: 0x80, b: 0x80, code: 0x30 });
    }

    #[test]
    fn test_dpcs_zero_ir0_keeps_color() {
        let mut gte = Cop2::new();
        gte.rgbc = Rgbc { r: 0x10, g: 0x20, b: 0x30, code: 0x40 };
        gte.far_color = Vec3 { x: 0xFF0, y: 0xFF0, z: 0xFF0 };

        run(&mut gte, SF | 0x10);
        assert_eq!(gte.rgb_fifo[2], gte.rgbc);
    }

    #[test]
    fn test_ncs_background_only() {
        let mut gte = Cop2::new();
        gte.background = Vec3 { x: 0x400, y: 0x800, z: 0xC00 };
        gte.rgbc.code = 0x20;

        assert_eq!(run(&mut gte, SF | LM | 0x1E), 14);
        assert_eq!(gte.mac[1..], [0x400, 0x800, 0xC00]);
        assert_eq!(gte.rgb_fifo[2], Rgbc { r: 0x40, g: 0x80, b: 0xC0, code: 0x20 });
    }

    #[test]
    fn test_nct_pushes_three_colors() {
        let mut gte = Cop2::new();
        gte.background = Vec3 { x: 0x100, y: 0x100, z: 0x100 };

        assert_eq!(run(&mut gte, SF | LM | 0x20), 30);
        assert!(gte.rgb_fifo.iter().all(|c| c.r == 0x10 && c.g == 0x10 && c.b == 0x10));
    }

    #[test]
    fn test_cc_modulates_vertex_color() {
        let mut gte = Cop2::new();
        gte.color = identity();
        gte.ir = [0, 0x1000, 0x800, 0];
        gte.rgbc = Rgbc { r: 0x80, g: 0x80, b: 0x80, code: 0 };

        assert_eq!(run(&mut gte, SF | LM | 0x1C), 11);
        // (rgb << 4) * light
        assert_eq!(gte.mac[1..], [0x800, 0x400, 0]);
        assert_eq!(gte.rgb_fifo[2], Rgbc { r: 0x80, g: 0x40, b: 0, code: 0 });
    }

    #[test]
    fn test_flag_cleared_per_command() {
        let mut gte = Cop2::new();
        gte.write_register(gteidx("flag"), 0xFFFF_FFFF);
        run(&mut gte, 0x06);
        assert_eq!(gte.read_register(gteidx("flag")), 0);
    }
}
