use crate::error::PsxError;

pub const EXE_MAGIC: &[u8; 8] = b"PS-X EXE";
pub const EXE_HEADER_SIZE: usize = 0x800;

/// A PS-X EXE image: a 2 KiB header followed by the payload that is copied
/// to `destination`.
#[derive(Clone, Debug)]
pub struct Exe {
    pub pc: u32,
    pub gp: u32,
    pub destination: u32,
    pub sp_base: u32,
    pub sp_offset: u32,
    pub region: String,
    pub payload: Vec<u8>,
}

fn read_u32(buffer: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buffer[offset], buffer[offset + 1], buffer[offset + 2], buffer[offset + 3]])
}

impl Exe {
    pub fn parse(buffer: &[u8]) -> Result<Self, PsxError> {
        if buffer.len() < EXE_HEADER_SIZE {
            return Err(PsxError::InvalidExe(format!(
                "{} bytes is shorter than the header",
                buffer.len()
            )));
        }

        if &buffer[..EXE_MAGIC.len()] != EXE_MAGIC {
            return Err(PsxError::InvalidExe("bad magic".to_string()));
        }

        let size = read_u32(buffer, 0x1C) as usize;
        let payload = &buffer[EXE_HEADER_SIZE..];
        if payload.len() < size {
            return Err(PsxError::InvalidExe(format!(
                "header declares {} payload bytes, file has {}",
                size,
                payload.len()
            )));
        }

        // The region marker is a NUL-terminated ASCII string
        let region = buffer[0x4C..EXE_HEADER_SIZE]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect::<String>();

        Ok(Self {
            pc: read_u32(buffer, 0x10),
            gp: read_u32(buffer, 0x14),
            destination: read_u32(buffer, 0x18),
            sp_base: read_u32(buffer, 0x30),
            sp_offset: read_u32(buffer, 0x34),
            region,
            payload: payload[..size].to_vec(),
        })
    }

    pub fn read(path: impl AsRef<std::path::Path>) -> Result<Self, PsxError> {
        Self::parse(&std::fs::read(path)?)
    }

    /// Initial sp and fp, or `None` when the header leaves them to the BIOS.
    pub fn stack(&self) -> Option<u32> {
        match self.sp_base {
            0 => None,
            base => Some(base.wrapping_add(self.sp_offset)),
        }
    }
}

#[cfg(test)]
pub(crate) fn build(pc: u32, destination: u32, payload: &[u8]) -> Vec<u8> {
    let mut buffer = vec![0u8; EXE_HEADER_SIZE];
    buffer[..8].copy_from_slice(EXE_MAGIC);
    buffer[0x10..0x14].copy_from_slice(&pc.to_le_bytes());
    buffer[0x14..0x18].copy_from_slice(&0x8001_0000u32.to_le_bytes());
    buffer[0x18..0x1C].copy_from_slice(&destination.to_le_bytes());
    buffer[0x1C..0x20].copy_from_slice(&(payload.len() as u32).to_le_bytes());
    buffer[0x30..0x34].copy_from_slice(&0x801F_FF00u32.to_le_bytes());
    buffer[0x34..0x38].copy_from_slice(&0xF0u32.to_le_bytes());
    buffer[0x4C..0x4C + 13].copy_from_slice(b"Sony Computer");
    buffer.extend_from_slice(payload);
    buffer
}
