//! Microwire serial EEPROM (93C46/56/66/76/86) in 16-bit organization.
//!
//! The chip hangs off three Mikey I/O pins: chip select, serial clock, and a
//! shared data line (DI written by the CPU, DO read back). Every command is
//! a frame clocked in MSB-first after CS rises: a `1` start bit, a 2-bit
//! opcode, then `addr_bits` address bits. WRITE/WRAL append 16 data bits;
//! READ shifts 16 data bits out behind a leading `0` dummy bit.
//!
//! Writes and erases only commit while the write-enable latch is set (EWEN);
//! an erased word reads `0xFFFF`. DO idles high. Protocol violations (a `0`
//! before the start bit) are ignored until a valid start bit arrives, and a
//! CS drop aborts whatever was in flight.

use log::warn;

use crate::core::savestate::{StateError, StateReader, StateWriter};

/// Chip variant; selects the address width and therefore the array size.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EepromKind {
    C46, // 64 words  (6 address bits)
    C56, // 128 words (7 address bits)
    C66, // 256 words (8 address bits)
    C76, // 512 words (9 address bits)
    C86, // 1024 words (10 address bits)
}

impl EepromKind {
    pub fn address_bits(self) -> u8 {
        match self {
            Self::C46 => 6,
            Self::C56 => 7,
            Self::C66 => 8,
            Self::C76 => 9,
            Self::C86 => 10,
        }
    }

    pub fn words(self) -> usize {
        1 << self.address_bits()
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum State {
    Idle,
    ReceivingOpcode,
    ReceivingAddress,
    ReceivingData,
    SendingData,
}

// Opcode field values (bits 1:0 of the frame after the start bit)
const OP_EXTENDED: u8 = 0b00; // EWDS / WRAL / ERAL / EWEN, by top address bits
const OP_WRITE: u8 = 0b01;
const OP_READ: u8 = 0b10;
const OP_ERASE: u8 = 0b11;

pub struct Eeprom93cxx {
    kind: EepromKind,
    mem: Vec<u16>,

    state: State,
    shift: u32, // input accumulator, MSB-first
    bits: u8,   // bits collected into `shift`
    opcode: u8,
    address: u16,
    write_all: bool,

    out_shift: u32, // output register, bit (out_bits-1) drives DO
    out_bits: u8,

    write_enabled: bool,
    cs: bool,
    last_clk: bool,

    dirty: bool,
}

impl Eeprom93cxx {
    pub fn new(kind: EepromKind) -> Self {
        Self {
            kind,
            mem: vec![0xFFFF; kind.words()],
            state: State::Idle,
            shift: 0,
            bits: 0,
            opcode: 0,
            address: 0,
            write_all: false,
            out_shift: 0,
            out_bits: 0,
            write_enabled: false,
            cs: false,
            last_clk: false,
            dirty: false,
        }
    }

    pub fn kind(&self) -> EepromKind {
        self.kind
    }

    /// Drive the three pins. A CLK rising edge while selected clocks one bit.
    pub fn write_pins(&mut self, cs: bool, clk: bool, di: bool) {
        if cs != self.cs {
            self.cs = cs;
            self.state = if cs { State::ReceivingOpcode } else { State::Idle };
            self.shift = 0;
            self.bits = 0;
            self.out_bits = 0;
        }
        if self.cs && clk && !self.last_clk {
            self.clock_bit(di);
        }
        self.last_clk = clk;
    }

    /// Current DO level. High while idle/ready; during a READ it presents
    /// the dummy bit and then the word, MSB first.
    pub fn data_out(&self) -> bool {
        if self.state == State::SendingData && self.out_bits > 0 {
            (self.out_shift >> (self.out_bits - 1)) & 1 != 0
        } else {
            true
        }
    }

    fn clock_bit(&mut self, di: bool) {
        match self.state {
            State::Idle => {}
            State::ReceivingOpcode => {
                if self.bits == 0 && !di {
                    // still waiting for the start bit
                    return;
                }
                self.shift = (self.shift << 1) | di as u32;
                self.bits += 1;
                if self.bits == 3 {
                    self.opcode = (self.shift & 0b11) as u8;
                    self.shift = 0;
                    self.bits = 0;
                    self.state = State::ReceivingAddress;
                }
            }
            State::ReceivingAddress => {
                self.shift = (self.shift << 1) | di as u32;
                self.bits += 1;
                if self.bits == self.kind.address_bits() {
                    self.address = self.shift as u16;
                    self.shift = 0;
                    self.bits = 0;
                    self.dispatch_command();
                }
            }
            State::ReceivingData => {
                self.shift = (self.shift << 1) | di as u32;
                self.bits += 1;
                if self.bits == 16 {
                    let data = self.shift as u16;
                    if self.write_enabled {
                        if self.write_all {
                            self.mem.fill(data);
                        } else {
                            self.mem[self.address as usize] = data;
                        }
                        self.dirty = true;
                    }
                    self.shift = 0;
                    self.bits = 0;
                    self.state = State::Idle;
                }
            }
            State::SendingData => {
                self.out_bits -= 1;
                if self.out_bits == 0 {
                    // Extended read: keep streaming consecutive words for as
                    // long as the host keeps clocking (no dummy bit between).
                    self.address = (self.address + 1) % self.kind.words() as u16;
                    self.out_shift = self.mem[self.address as usize] as u32;
                    self.out_bits = 16;
                }
            }
        }
    }

    fn dispatch_command(&mut self) {
        self.write_all = false;
        match self.opcode {
            OP_READ => {
                // 17 output bits: a leading 0 dummy, then the word MSB-first
                self.out_shift = self.mem[self.address as usize] as u32;
                self.out_bits = 17;
                self.state = State::SendingData;
            }
            OP_WRITE => {
                self.state = State::ReceivingData;
            }
            OP_ERASE => {
                if self.write_enabled {
                    self.mem[self.address as usize] = 0xFFFF;
                    self.dirty = true;
                }
                self.state = State::Idle;
            }
            _ => {
                // OP_EXTENDED: sub-command in the top two address bits
                let sub = (self.address >> (self.kind.address_bits() - 2)) & 0b11;
                match sub {
                    0b00 => {
                        self.write_enabled = false; // EWDS
                        self.state = State::Idle;
                    }
                    0b01 => {
                        self.write_all = true; // WRAL
                        self.state = State::ReceivingData;
                    }
                    0b10 => {
                        if self.write_enabled {
                            self.mem.fill(0xFFFF); // ERAL
                            self.dirty = true;
                        }
                        self.state = State::Idle;
                    }
                    _ => {
                        self.write_enabled = true; // EWEN
                        self.state = State::Idle;
                    }
                }
            }
        }
    }

    // ---- Battery interface ----

    /// Raw byte image, one little-endian 16-bit word per entry.
    pub fn image(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.mem.len() * 2);
        for word in &self.mem {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Restore a battery image saved by `image()`. Short or oversized blobs
    /// fill what fits.
    pub fn load_image(&mut self, data: &[u8]) {
        if data.len() != self.mem.len() * 2 {
            warn!(
                "battery image is {} bytes, chip holds {}",
                data.len(),
                self.mem.len() * 2
            );
        }
        for (i, chunk) in data.chunks_exact(2).enumerate() {
            if i >= self.mem.len() {
                break;
            }
            self.mem[i] = u16::from_le_bytes([chunk[0], chunk[1]]);
        }
        self.dirty = false;
    }

    /// True once any write or erase has committed since the last
    /// `load_image`.
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    // ---- Save state ----

    pub fn save_state(&self, w: &mut StateWriter) {
        for word in &self.mem {
            w.u16(*word);
        }
        w.u8(match self.state {
            State::Idle => 0,
            State::ReceivingOpcode => 1,
            State::ReceivingAddress => 2,
            State::ReceivingData => 3,
            State::SendingData => 4,
        });
        w.u32(self.shift);
        w.u8(self.bits);
        w.u8(self.opcode);
        w.u16(self.address);
        w.bool(self.write_all);
        w.u32(self.out_shift);
        w.u8(self.out_bits);
        w.bool(self.write_enabled);
        w.bool(self.cs);
        w.bool(self.last_clk);
        w.bool(self.dirty);
    }

    pub fn load_state(&mut self, r: &mut StateReader) -> Result<(), StateError> {
        for i in 0..self.mem.len() {
            self.mem[i] = r.u16()?;
        }
        self.state = match r.u8()? {
            1 => State::ReceivingOpcode,
            2 => State::ReceivingAddress,
            3 => State::ReceivingData,
            4 => State::SendingData,
            _ => State::Idle,
        };
        self.shift = r.u32()?;
        self.bits = r.u8()?;
        self.opcode = r.u8()?;
        self.address = r.u16()?;
        self.write_all = r.bool()?;
        self.out_shift = r.u32()?;
        self.out_bits = r.u8()?;
        self.write_enabled = r.bool()?;
        self.cs = r.bool()?;
        self.last_clk = r.bool()?;
        self.dirty = r.bool()?;
        Ok(())
    }
}
