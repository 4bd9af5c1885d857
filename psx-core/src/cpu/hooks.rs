use crate::cpu::Cpu;

/// Bytes of printed output kept before the oldest are discarded.
pub const TTY_CAPACITY: usize = 0x1_0000;

/// Line buffer for characters the BIOS prints through putchar.
#[derive(Debug, Default)]
pub struct Tty {
    line: String,
    output: String,
}

impl Tty {
    pub fn putchar(&mut self, byte: u8) {
        match byte {
            b'\r' => return,
            b'\n' => {
                tracing::info!(target: "psx_core::tty", "{}", self.line);
                self.output.push('\n');
                self.line.clear();
            }
            _ => {
                self.line.push(byte as char);
                self.output.push(byte as char);
            }
        }

        if self.output.len() > TTY_CAPACITY {
            let mut cut = self.output.len() - TTY_CAPACITY;
            while !self.output.is_char_boundary(cut) {
                cut += 1;
            }
            self.output.drain(..cut);
        }
    }

    /// Recent printed output, at most [`TTY_CAPACITY`] bytes, including an
    /// unfinished line.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn clear(&mut self) {
        self.line.clear();
        self.output.clear();
    }
}

/// Runs before every fetch. BIOS functions are reached by jumping to one of
/// three table entry points with the function number in r9.
#[inline(always)]
pub fn on_fetch(cpu: &mut Cpu) {
    if !cpu.config.trace_bios_calls && !cpu.config.tty_output {
        return;
    }

    let table = match cpu.pc & 0x1FFF_FFFF {
        0xA0 => 'A',
        0xB0 => 'B',
        0xC0 => 'C',
        _ => return,
    };
    let function = cpu.registers[9] & 0xFF;

    if cpu.config.trace_bios_calls {
        tracing::debug!(
            target: "psx_core::bios",
            call = %format!("{}({:02X}h)", table, function),
            name = function_name(table, function),
            a0 = %format!("{:08X}", cpu.registers[4]),
            a1 = %format!("{:08X}", cpu.registers[5]),
            a2 = %format!("{:08X}", cpu.registers[6]),
            a3 = %format!("{:08X}", cpu.registers[7]),
            ra = %format!("{:08X}", cpu.registers[31]),
            "BIOS call"
        );
    }

    if cpu.config.tty_output && matches!((table, function), ('A', 0x3C) | ('B', 0x3D)) {
        cpu.tty.putchar(cpu.registers[4] as u8);
    }
}

fn function_name(table: char, function: u32) -> &'static str {
    match (table, function) {
        ('A', 0x00) => "FileOpen",
        ('A', 0x13) => "SaveState",
        ('A', 0x17) => "strcmp",
        ('A', 0x25) => "toupper",
        ('A', 0x2A) => "memcpy",
        ('A', 0x33) => "malloc",
        ('A', 0x3C) => "std_out_putchar",
        ('A', 0x3E) => "std_out_puts",
        ('A', 0x3F) => "printf",
        ('A', 0x44) => "FlushCache",
        ('A', 0x49) => "GPU_cw",
        ('A', 0x72) => "CdRemove",
        ('A', 0xA0) => "_boot",
        ('B', 0x00) => "alloc_kernel_memory",
        ('B', 0x07) => "DeliverEvent",
        ('B', 0x08) => "OpenEvent",
        ('B', 0x0B) => "TestEvent",
        ('B', 0x0C) => "EnableEvent",
        ('B', 0x18) => "SetDefaultExitFromException",
        ('B', 0x19) => "SetCustomExitFromException",
        ('B', 0x3D) => "std_out_putchar",
        ('B', 0x47) => "AddDevice",
        ('B', 0x5B) => "ChangeClearPad",
        ('C', 0x00) => "EnqueueTimerAndVblankIrqs",
        ('C', 0x01) => "EnqueueSyscallHandler",
        ('C', 0x02) => "SysEnqIntRP",
        ('C', 0x03) => "SysDeqIntRP",
        ('C', 0x07) => "InstallExceptionHandlers",
        ('C', 0x08) => "SysInitMemory",
        ('C', 0x0A) => "ChangeClearRCnt",
        ('C', 0x0C) => "InitDefInt",
        ('C', 0x12) => "InstallDevices",
        ('C', 0x1C) => "AdjustA0Table",
        _ => "unknown",
    }
}
