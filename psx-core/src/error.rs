use crate::mmu::bus::AddressRange;
use thiserror::Error;

/// Errors surfaced while building or loading a machine.
#[derive(Debug, Error)]
pub enum PsxError {
    #[error("BIOS image is {actual} bytes, expected at most {expected}")]
    BiosSize { expected: usize, actual: usize },

    #[error("invalid PS-X EXE: {0}")]
    InvalidExe(String),

    #[error("EXE payload of {len} bytes at {address:08X} does not fit in RAM")]
    ExeOutOfRange { address: u32, len: usize },

    #[error("{name} window {range} overlaps the {existing} window")]
    OverlappingRanges {
        name: &'static str,
        range: AddressRange,
        existing: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Diagnostics raised while executing guest code.
///
/// None of these stop the machine: the CPU logs them and carries on, unless
/// strict instruction checking is enabled in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("unimplemented instruction {mnemonic} (opcode {opcode:02X}h)")]
    UnimplementedInstruction { mnemonic: &'static str, opcode: u8 },

    #[error("unimplemented function {mnemonic} (funct {funct:02X}h)")]
    UnimplementedFunction { mnemonic: &'static str, funct: u8 },

    #[error("unimplemented GTE command {mnemonic} (index {index:02X}h)")]
    UnimplementedCommand { mnemonic: &'static str, index: u8 },

    #[error("unsupported COP0 operation {mnemonic}")]
    UnsupportedCop0 { mnemonic: &'static str },
}
