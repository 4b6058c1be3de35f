use crate::core::savestate::{StateError, StateReader, StateWriter};

/// Lynx game cartridge.
///
/// The cart has no address bus of its own: software loads an address counter
/// through Suzy's RCART window and then streams bytes out sequentially, the
/// counter post-incrementing on every data read. Two banks share the ROM
/// image; page-select strobes pick the active bank and position the counter
/// at the start of a page (256 bytes per page).
///
/// Reads wrap within the active bank's size; reads that land past the end of
/// the ROM image float to open bus (`0xFF`).
pub struct Cartridge {
    rom: Vec<u8>,

    // Bank geometry within `rom`: bank 0 at offset 0, bank 1 right after.
    bank0_size: u32,
    bank1_size: u32,

    current_bank: u8,
    address_counter: u32,
    shift_register: u8,
}

impl Cartridge {
    /// Build a cartridge from a ROM image and the two bank sizes (already
    /// clamped by the loader so that `bank0 + bank1 <= rom.len()`).
    pub fn new(rom: Vec<u8>, bank0_size: u32, bank1_size: u32) -> Self {
        Self {
            rom,
            bank0_size,
            bank1_size,
            current_bank: 0,
            address_counter: 0,
            shift_register: 0,
        }
    }

    /// An empty slot: every read floats to open bus.
    pub fn none() -> Self {
        Self::new(Vec::new(), 0, 0)
    }

    /// Power-cycle state: counters cleared, bank 0 selected, ROM untouched.
    pub fn reset(&mut self) {
        self.current_bank = 0;
        self.address_counter = 0;
        self.shift_register = 0;
    }

    pub fn bank0_size(&self) -> u32 {
        self.bank0_size
    }

    pub fn bank1_size(&self) -> u32 {
        self.bank1_size
    }

    pub fn address_counter(&self) -> u32 {
        self.address_counter
    }

    pub fn set_address_low(&mut self, value: u8) {
        self.address_counter = (self.address_counter & !0xFF) | value as u32;
    }

    pub fn set_address_high(&mut self, value: u8) {
        self.address_counter = (self.address_counter & !0xFF00) | ((value as u32) << 8);
    }

    /// Latch a page number into the shift register.
    pub fn write_shift_register(&mut self, value: u8) {
        self.shift_register = value;
    }

    pub fn select_bank(&mut self, bank: u8) {
        self.current_bank = bank & 1;
    }

    /// Page strobe for bank 0: latches the page and makes bank 0 current,
    /// with the counter at the start of that page.
    pub fn set_bank0_page(&mut self, page: u8) {
        self.write_shift_register(page);
        self.select_bank(0);
        self.address_counter = (page as u32) << 8;
    }

    /// Page strobe for bank 1.
    pub fn set_bank1_page(&mut self, page: u8) {
        self.write_shift_register(page);
        self.select_bank(1);
        self.address_counter = (page as u32) << 8;
    }

    /// Current data byte without advancing the counter (debugger path).
    pub fn peek_data(&self) -> u8 {
        let (base, size) = if self.current_bank == 0 {
            (0u32, self.bank0_size)
        } else {
            (self.bank0_size, self.bank1_size)
        };
        if size == 0 {
            return 0xFF;
        }
        let offset = (base + self.address_counter % size) as usize;
        if offset < self.rom.len() {
            self.rom[offset]
        } else {
            0xFF
        }
    }

    /// Sequential read: returns the current byte and post-increments the
    /// address counter.
    pub fn read_data(&mut self) -> u8 {
        let data = self.peek_data();
        self.address_counter = self.address_counter.wrapping_add(1);
        data
    }

    pub fn save_state(&self, w: &mut StateWriter) {
        w.u8(self.current_bank);
        w.u32(self.address_counter);
        w.u8(self.shift_register);
    }

    pub fn load_state(&mut self, r: &mut StateReader) -> Result<(), StateError> {
        self.current_bank = r.u8()? & 1;
        self.address_counter = r.u32()?;
        self.shift_register = r.u8()?;
        Ok(())
    }
}
