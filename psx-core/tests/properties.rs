use proptest::prelude::*;
use psx_core::config::CpuConfig;
use psx_core::cpu::Cpu;
use psx_core::cpu::cop::cop0::Exception;
use psx_core::fixed::{Coeff, DepthOffset};
use psx_core::mmu::Mmu;
use psx_core::mmu::bus::{Bus32 as _, Width};

const BASE: u32 = 0x8000_1000;

fn r_type(rs: u8, rt: u8, rd: u8, funct: u32) -> u32 {
    ((rs as u32) << 21) | ((rt as u32) << 16) | ((rd as u32) << 11) | funct
}

fn i_type(op: u32, rs: u8, rt: u8, immediate: u16) -> u32 {
    (op << 26) | ((rs as u32) << 21) | ((rt as u32) << 16) | immediate as u32
}

fn cpu(program: &[u32]) -> Cpu {
    let mut cpu = Cpu::new(Mmu::bare(false), CpuConfig::default());
    for (i, word) in program.iter().enumerate() {
        cpu.mmu.write_u32(BASE + i as u32 * 4, *word);
    }
    cpu.pc = BASE;
    cpu
}

// beq, bne, blez, bgtz
fn branch_op() -> impl Strategy<Value = u32> {
    prop::sample::select(vec![0x04u32, 0x05, 0x06, 0x07])
}

proptest! {
    #[test]
    fn delay_slot_runs_once(
        op in branch_op(),
        rs in 1u8..4,
        rt in 1u8..4,
        values in prop::array::uniform3(any::<u32>()),
    ) {
        // 1000 branch -> 1014, 1004 delay slot, 1008 fall-through
        let program = [
            i_type(op, rs, rt, 4),
            i_type(0x09, 10, 10, 1),
            i_type(0x09, 11, 11, 1),
        ];
        let mut cpu = cpu(&program);
        cpu.registers[1..4].copy_from_slice(&values);

        let a = cpu.registers[rs as usize];
        let b = cpu.registers[rt as usize];
        let taken = match op {
            0x04 => a == b,
            0x05 => a != b,
            0x06 => (a as i32) <= 0,
            _ => (a as i32) > 0,
        };

        for _ in 0..3 {
            cpu.step();
        }

        prop_assert_eq!(cpu.registers[10], 1);
        if taken {
            prop_assert_eq!(cpu.registers[11], 0);
            prop_assert_eq!(cpu.pc, BASE + 0x18);
        } else {
            prop_assert_eq!(cpu.registers[11], 1);
            prop_assert_eq!(cpu.pc, BASE + 0x0C);
        }
    }

    #[test]
    fn register_zero_stays_zero(
        rs in 0u8..32,
        rt in 0u8..32,
        funct in prop::sample::select(vec![0x20u32, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x2A, 0x2B]),
        values in prop::array::uniform32(any::<u32>()),
    ) {
        let mut cpu = cpu(&[r_type(rs, rt, 0, funct), i_type(0x0F, 0, 0, 0xFFFF)]);
        cpu.registers = values;
        cpu.registers[0] = 0;

        cpu.step();
        cpu.step();
        prop_assert_eq!(cpu.registers[0], 0);
    }

    #[test]
    fn overflow_leaves_destination(x in any::<i32>(), y in any::<i32>(), subtract in any::<bool>()) {
        let funct = if subtract { 0x22 } else { 0x20 };
        let mut cpu = cpu(&[r_type(1, 2, 3, funct)]);
        cpu.registers[1] = x as u32;
        cpu.registers[2] = y as u32;
        cpu.registers[3] = 0x5A5A_5A5A;

        cpu.step();

        let result = if subtract { x.checked_sub(y) } else { x.checked_add(y) };
        match result {
            Some(value) => prop_assert_eq!(cpu.registers[3], value as u32),
            None => {
                prop_assert_eq!(cpu.registers[3], 0x5A5A_5A5A);
                prop_assert_eq!(cpu.cop0.cause.exception_code(), Exception::ArithmeticOverflow as u32);
                prop_assert_eq!(cpu.cop0.epc, BASE);
            }
        }
    }

    #[test]
    fn divide_by_zero(n in any::<u32>()) {
        let mut cpu = cpu(&[r_type(1, 0, 0, 0x1A), r_type(1, 0, 0, 0x1B)]);
        cpu.registers[1] = n;

        cpu.step();
        prop_assert_eq!(cpu.hi, n);
        prop_assert_eq!(cpu.lo, if (n as i32) >= 0 { 0xFFFF_FFFF } else { 1 });

        cpu.step();
        prop_assert_eq!(cpu.hi, n);
        prop_assert_eq!(cpu.lo, 0xFFFF_FFFF);
    }

    #[test]
    fn fixed_float_round_trip(raw in any::<i16>(), wide in any::<i32>()) {
        let coeff = Coeff::from_raw(raw);
        let back = Coeff::from_f64(coeff.to_f64());
        prop_assert!((back.raw() as i32 - raw as i32).abs() <= 1);

        let offset = DepthOffset::from_raw(wide);
        let back = DepthOffset::from_f64(offset.to_f64());
        prop_assert!((back.raw() as i64 - wide as i64).abs() <= 1);
    }

    #[test]
    fn fixed_integral_is_exact(x in -8i64..8) {
        prop_assert_eq!(Coeff::from_int(x).to_i64(), x);
        prop_assert_eq!(Coeff::from_int(x).raw() as i64, x << 12);
    }

    #[test]
    fn ram_round_trip(offset in 0u32..0x1F_FFFC, value in any::<u32>(), segment in prop::sample::select(vec![0u32, 0x8000_0000, 0xA000_0000])) {
        let mut mmu = Mmu::new(false);
        let address = segment | (offset & !0b11);

        mmu.write(address, Width::Word, value);
        prop_assert_eq!(mmu.read(address, Width::Word), value);
        prop_assert_eq!(mmu.read(offset & !0b11, Width::Word), value);
    }
}

#[test]
fn bus_ranges_are_disjoint() {
    let mmu = Mmu::new(false);
    let ranges: Vec<_> = mmu.ranges().collect();
    for (i, (a, _)) in ranges.iter().enumerate() {
        for (b, _) in &ranges[i + 1..] {
            assert!(!a.overlaps(b));
        }
    }
}
