pub mod cop0;
pub mod cop2;
pub mod registers;

/// Register-file view of a coprocessor, as reached by the `mfcN`/`mtcN`
/// family and by the CPU on reset.
pub trait Cop {
    fn read_register(&self, register: u8) -> u32;
    fn write_register(&mut self, register: u8, value: u32);

    /// Returns every register to its power-on value.
    fn reset(&mut self);
}
