/// Memory bus seen by the CPU.
///
/// The Lynx has a single bus master (the 65C02); sprite-engine contention is
/// charged as a batched stall instead of cycle-level arbitration, so there is
/// no master identifier and no halt line on this trait.
///
/// `read`/`write` are the live emulation path and may have side effects
/// (cartridge auto-increment, UART flag clears, math triggers). `peek` must
/// decode identically but leave all state untouched; debugger features
/// consume only the peek path.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Side-effect-free read with the same address decoding as `read`.
    fn peek(&self, addr: u16) -> u8;

    /// Level of the CPU /IRQ line (logical OR of all pending sources).
    fn irq_pending(&self) -> bool;

    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn peek_word(&self, addr: u16) -> u16 {
        let lo = self.peek(addr);
        let hi = self.peek(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }
}
