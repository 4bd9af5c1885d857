/// Machine-wide switches, built once by the embedder and handed to
/// [`Psx::new`](crate::psx::Psx::new).
#[derive(Clone, Debug)]
pub struct PsxConfig {
    /// Panic on a bus access no device claims, instead of logging it.
    pub strict_memory: bool,
    /// Panic on an unimplemented instruction, function or GTE command.
    pub strict_instructions: bool,
    /// Log BIOS A/B/C table calls at debug level.
    pub trace_bios_calls: bool,
    /// Collect BIOS putchar output and log it line by line.
    pub tty_output: bool,
    /// Charge GTE command costs to the CPU cycle counter.
    pub gte_cycle_accounting: bool,
}

impl Default for PsxConfig {
    fn default() -> Self {
        Self {
            strict_memory: false,
            strict_instructions: false,
            trace_bios_calls: false,
            tty_output: true,
            gte_cycle_accounting: false,
        }
    }
}

/// The part of [`PsxConfig`] the CPU consults on its hot path.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuConfig {
    pub strict_instructions: bool,
    pub trace_bios_calls: bool,
    pub tty_output: bool,
    pub gte_cycle_accounting: bool,
}

impl From<&PsxConfig> for CpuConfig {
    fn from(config: &PsxConfig) -> Self {
        Self {
            strict_instructions: config.strict_instructions,
            trace_bios_calls: config.trace_bios_calls,
            tty_output: config.tty_output,
            gte_cycle_accounting: config.gte_cycle_accounting,
        }
    }
}
