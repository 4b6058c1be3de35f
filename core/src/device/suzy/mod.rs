//! Suzy — sprite engine, hardware math, controller latches, and the
//! cartridge access window.
//!
//! # Register map (offsets within `$FC00`-`$FCFF`)
//!
//! | Offset    | Name      | Description                                      |
//! |-----------|-----------|--------------------------------------------------|
//! | 0x08-0x0F | COLL0-7   | Collision depository entries 0-7 (read/write)    |
//! | 0x10/0x11 | SCBADR    | Sprite chain start, low/high                     |
//! | 0x60-0x6B | MATHC..H  | 16-bit math registers, little-endian pairs       |
//! | 0x66/0x67 | MATHF     | Writing the high byte starts a multiply          |
//! | 0x6C-0x6F | JKLM      | Scratch word                                     |
//! | 0x70/0x71 | NP        | Divisor latch (storage)                          |
//! | 0x72/0x73 | MATHK     | Writing the high byte starts a divide            |
//! | 0x80-0x87 | —         | Write: SPRCTL0/1, SPRINIT. Read: COLL8-15        |
//! | 0x90      | SUZYBUSEN | Write: bus grant enable. Read: 1 while busy      |
//! | 0x91      | SPRGO     | Bit 0 starts sprite processing                   |
//! | 0x92      | SPRSYS    | Read: busy/overflow/in-progress. Write: sign (7), accumulate (6) |
//! | 0xA0/0xA2 | RCART0/1  | Read: sequential cart data. Write: address low/high |
//! | 0xB0      | JOYSTICK  | Controller latch (read-only)                     |
//! | 0xB1      | SWITCHES  | Switch latch (read-only)                         |
//! | 0xB2/0xB3 | —         | Bank 0/1 page strobes                            |
//!
//! Unmapped offsets read open bus (`0xFF`).
//!
//! Reading the cart window advances the cartridge address counter, so the
//! live `read` path is `&mut self`; `peek` decodes identically without the
//! side effect.

pub mod math;
pub mod sprites;

use crate::core::savestate::{StateError, StateReader, StateWriter};
use crate::device::cartridge::Cartridge;
use math::SuzyMath;

// SPRSYS read bits
const SPRSYS_SPRITE_BUSY: u8 = 0x01;
const SPRSYS_MATH_OVERFLOW: u8 = 0x04;
const SPRSYS_MATH_IN_PROGRESS: u8 = 0x80;

// SPRSYS write bits
const SPRSYS_MATH_SIGN: u8 = 0x80;
const SPRSYS_MATH_ACCUMULATE: u8 = 0x40;

pub struct Suzy {
    pub cart: Cartridge,
    pub math: SuzyMath,

    pub(crate) scb_address: u16,
    pub(crate) sprctl0: u8,
    pub(crate) sprctl1: u8,
    sprinit: u8,
    sprite_enabled: bool,
    sprite_go: bool,

    pub(crate) collision: [u8; 16],

    joystick: u8,
    switches: u8,
}

impl Suzy {
    pub fn new(cart: Cartridge) -> Self {
        Self {
            cart,
            math: SuzyMath::new(),
            scb_address: 0,
            sprctl0: 0,
            sprctl1: 0,
            sprinit: 0,
            sprite_enabled: false,
            sprite_go: false,
            // Controller latches are active-low: all released at power-on
            collision: [0; 16],
            joystick: 0xFF,
            switches: 0xFF,
        }
    }

    pub fn scb_address(&self) -> u16 {
        self.scb_address
    }

    /// Latch controller state (active-low).
    pub fn set_joystick(&mut self, value: u8) {
        self.joystick = value;
    }

    pub fn set_switches(&mut self, value: u8) {
        self.switches = value;
    }

    /// True when a SPRGO write has requested sprite processing; clears the
    /// request. The console runs the engine because it holds RAM.
    pub fn take_sprite_go(&mut self) -> bool {
        std::mem::take(&mut self.sprite_go)
    }

    // ---- Register access ----

    pub fn read(&mut self, offset: u8) -> u8 {
        match offset {
            // The cart window is the one stateful read: it post-increments
            0xA0 | 0xA2 => self.cart.read_data(),
            _ => self.peek(offset),
        }
    }

    pub fn peek(&self, offset: u8) -> u8 {
        match offset {
            0x08..=0x0F => self.collision[(offset - 0x08) as usize],
            0x10 => self.scb_address as u8,
            0x11 => (self.scb_address >> 8) as u8,
            0x60 => self.math.mathc as u8,
            0x61 => (self.math.mathc >> 8) as u8,
            0x62 => self.math.mathd as u8,
            0x63 => (self.math.mathd >> 8) as u8,
            0x64 => self.math.mathe as u8,
            0x65 => (self.math.mathe >> 8) as u8,
            0x66 => self.math.mathf as u8,
            0x67 => (self.math.mathf >> 8) as u8,
            0x68 => self.math.mathg as u8,
            0x69 => (self.math.mathg >> 8) as u8,
            0x6A => self.math.mathh as u8,
            0x6B => (self.math.mathh >> 8) as u8,
            0x6C..=0x6F => (self.math.jklm >> ((offset - 0x6C) * 8)) as u8,
            0x70 => self.math.np as u8,
            0x71 => (self.math.np >> 8) as u8,
            0x72 => self.math.mathk as u8,
            0x73 => (self.math.mathk >> 8) as u8,
            // Collision depository entries 8-15 shadow the control registers
            0x80..=0x87 => self.collision[(offset - 0x80 + 8) as usize],
            0x90 => 0, // SUZYBUSEN reads 1 only while sprites are walking
            0x92 => {
                let mut v = 0;
                if self.math.overflow {
                    v |= SPRSYS_MATH_OVERFLOW;
                }
                // Sprite batches and math both complete within the
                // triggering write, so busy (bit 0) and in-progress (bit 7)
                // always read clear
                debug_assert_eq!(v & (SPRSYS_SPRITE_BUSY | SPRSYS_MATH_IN_PROGRESS), 0);
                v
            }
            0xA0 | 0xA2 => self.cart.peek_data(),
            0xB0 => self.joystick,
            0xB1 => self.switches,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, offset: u8, data: u8) {
        match offset {
            0x08..=0x0F => self.collision[(offset - 0x08) as usize] = data,
            0x10 => self.scb_address = (self.scb_address & 0xFF00) | data as u16,
            0x11 => self.scb_address = (self.scb_address & 0x00FF) | ((data as u16) << 8),
            0x60 => self.math.mathc = (self.math.mathc & 0xFF00) | data as u16,
            0x61 => self.math.mathc = (self.math.mathc & 0x00FF) | ((data as u16) << 8),
            0x62 => self.math.mathd = (self.math.mathd & 0xFF00) | data as u16,
            0x63 => self.math.mathd = (self.math.mathd & 0x00FF) | ((data as u16) << 8),
            0x64 => self.math.mathe = (self.math.mathe & 0xFF00) | data as u16,
            0x65 => self.math.mathe = (self.math.mathe & 0x00FF) | ((data as u16) << 8),
            0x66 => self.math.mathf = (self.math.mathf & 0xFF00) | data as u16,
            0x67 => {
                // High byte of MATHF is the multiply trigger
                self.math.mathf = (self.math.mathf & 0x00FF) | ((data as u16) << 8);
                self.math.multiply();
            }
            0x68 => self.math.mathg = (self.math.mathg & 0xFF00) | data as u16,
            0x69 => self.math.mathg = (self.math.mathg & 0x00FF) | ((data as u16) << 8),
            0x6A => self.math.mathh = (self.math.mathh & 0xFF00) | data as u16,
            0x6B => self.math.mathh = (self.math.mathh & 0x00FF) | ((data as u16) << 8),
            0x6C..=0x6F => {
                let shift = (offset - 0x6C) * 8;
                self.math.jklm =
                    (self.math.jklm & !(0xFFu32 << shift)) | ((data as u32) << shift);
            }
            0x70 => self.math.np = (self.math.np & 0xFF00) | data as u16,
            0x71 => self.math.np = (self.math.np & 0x00FF) | ((data as u16) << 8),
            0x72 => self.math.mathk = (self.math.mathk & 0xFF00) | data as u16,
            0x73 => {
                // High byte of MATHK is the divide trigger
                self.math.mathk = (self.math.mathk & 0x00FF) | ((data as u16) << 8);
                self.math.divide();
            }
            0x80 => self.sprctl0 = data,
            0x81 => self.sprctl1 = data,
            0x83 => self.sprinit = data,
            0x90 => self.sprite_enabled = data & 1 != 0,
            0x91 => {
                if data & 1 != 0 {
                    self.sprite_go = true;
                }
            }
            0x92 => {
                self.math.sign_mode = data & SPRSYS_MATH_SIGN != 0;
                self.math.accumulate = data & SPRSYS_MATH_ACCUMULATE != 0;
            }
            0xA0 => self.cart.set_address_low(data),
            0xA2 => self.cart.set_address_high(data),
            0xB2 => self.cart.set_bank0_page(data),
            0xB3 => self.cart.set_bank1_page(data),
            _ => {}
        }
    }

    // ---- Save state ----

    pub fn save_state(&self, w: &mut StateWriter) {
        w.u16(self.scb_address);
        w.u8(self.sprctl0);
        w.u8(self.sprctl1);
        w.u8(self.sprinit);
        w.bool(self.sprite_enabled);
        w.bytes(&self.collision);
        self.math.save_state(w);
        w.u8(self.joystick);
        w.u8(self.switches);
    }

    pub fn load_state(&mut self, r: &mut StateReader) -> Result<(), StateError> {
        self.scb_address = r.u16()?;
        self.sprctl0 = r.u8()?;
        self.sprctl1 = r.u8()?;
        self.sprinit = r.u8()?;
        self.sprite_enabled = r.bool()?;
        r.bytes(&mut self.collision)?;
        self.math.load_state(r)?;
        self.joystick = r.u8()?;
        self.switches = r.u8()?;
        self.sprite_go = false;
        Ok(())
    }
}
