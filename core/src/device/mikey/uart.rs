//! ComLynx UART, clocked by Timer 4 underflows.
//!
//! A frame on the wire is 11 bit-times: 1 start + 8 data + 1 parity/mark +
//! 1 stop. The link is a shared open-collector bus, so every transmitted
//! byte is also received locally: SERDAT writes front-insert the byte into
//! the receive queue (games depend on this for collision detection).
//! External units inject through `back_insert`.

use crate::core::savestate::{StateError, StateReader, StateWriter};

/// Bit 31 of a countdown marks the line idle.
const COUNTDOWN_IDLE: u32 = 0x8000_0000;

/// Bit-times per frame.
const FRAME_TIME: u32 = 11;

/// Extra bit-times of inter-byte gap when more queued bytes follow.
const INTER_BYTE_GAP: u32 = 44;

/// Receive-word flag bits: bit 15 marks a BREAK, bit 8 carries the
/// parity/mark bit; 7:0 are the data.
pub const RX_BREAK: u16 = 0x8000;

// SERCTL write bits
const SERCTL_TX_IRQ_EN: u8 = 0x80;
const SERCTL_RX_IRQ_EN: u8 = 0x40;
const SERCTL_PARITY_EN: u8 = 0x10;
const SERCTL_RESET_ERR: u8 = 0x08;
const SERCTL_TX_BREAK: u8 = 0x02;
const SERCTL_PARITY_EVEN: u8 = 0x01;

// SERCTL read bits
const SERCTL_TXRDY: u8 = 0x80;
const SERCTL_RXRDY: u8 = 0x40;
const SERCTL_TXEMPTY: u8 = 0x20;
const SERCTL_OVERRUN: u8 = 0x08;
const SERCTL_FRAMERR: u8 = 0x04;
const SERCTL_RXBRK: u8 = 0x02;
const SERCTL_PARBIT: u8 = 0x01;

const QUEUE_LEN: usize = 32; // power of two

pub struct Uart {
    tx_countdown: u32,
    rx_countdown: u32,
    tx_data: u16,
    rx_data: u16,
    rx_ready: bool,

    tx_irq_en: bool,
    rx_irq_en: bool,
    parity_en: bool,
    parity_even: bool,
    tx_break: bool,

    overrun: bool,
    frame_err: bool,

    queue: [u16; QUEUE_LEN],
    head: u8,
    tail: u8,
    waiting: u8,
}

impl Uart {
    pub fn new() -> Self {
        Self {
            tx_countdown: COUNTDOWN_IDLE,
            rx_countdown: COUNTDOWN_IDLE,
            tx_data: 0,
            rx_data: 0,
            rx_ready: false,
            tx_irq_en: false,
            rx_irq_en: false,
            parity_en: false,
            parity_even: false,
            tx_break: false,
            overrun: false,
            frame_err: false,
            queue: [0; QUEUE_LEN],
            head: 0,
            tail: 0,
            waiting: 0,
        }
    }

    fn tx_idle(&self) -> bool {
        self.tx_countdown & COUNTDOWN_IDLE != 0
    }

    fn rx_idle(&self) -> bool {
        self.rx_countdown & COUNTDOWN_IDLE != 0
    }

    /// The parity/mark bit for a byte about to go on the wire. With parity
    /// disabled the 9th bit is just the PAREVEN level.
    fn ninth_bit(&self, data: u8) -> u16 {
        if self.parity_en {
            let ones = data.count_ones() as u16 & 1;
            if self.parity_even { ones } else { ones ^ 1 }
        } else {
            self.parity_even as u16
        }
    }

    fn front_insert(&mut self, word: u16) {
        if self.waiting as usize >= QUEUE_LEN {
            return;
        }
        self.head = (self.head.wrapping_sub(1)) & (QUEUE_LEN as u8 - 1);
        self.queue[self.head as usize] = word;
        self.waiting += 1;
    }

    /// External ComLynx data arriving from another unit.
    pub fn back_insert(&mut self, word: u16) {
        if self.waiting as usize >= QUEUE_LEN {
            return;
        }
        self.queue[self.tail as usize] = word;
        self.tail = (self.tail + 1) & (QUEUE_LEN as u8 - 1);
        self.waiting += 1;
        if self.rx_idle() {
            self.rx_countdown = FRAME_TIME;
        }
    }

    fn pop(&mut self) -> u16 {
        let word = self.queue[self.head as usize];
        self.head = (self.head + 1) & (QUEUE_LEN as u8 - 1);
        self.waiting -= 1;
        word
    }

    /// SERDAT write: starts the transmit frame and self-loopbacks the byte
    /// onto the local receive queue.
    pub fn write_data(&mut self, data: u8) {
        let word = data as u16 | (self.ninth_bit(data) << 8);
        self.tx_data = word;
        self.tx_countdown = FRAME_TIME;
        self.front_insert(word);
        if self.rx_idle() {
            self.rx_countdown = FRAME_TIME;
        }
    }

    /// SERDAT read: returns the received byte and clears RXRDY.
    pub fn read_data(&mut self) -> u8 {
        self.rx_ready = false;
        self.rx_data as u8
    }

    /// Side-effect-free SERDAT read for the debugger path.
    pub fn peek_data(&self) -> u8 {
        self.rx_data as u8
    }

    pub fn write_control(&mut self, data: u8) {
        self.tx_irq_en = data & SERCTL_TX_IRQ_EN != 0;
        self.rx_irq_en = data & SERCTL_RX_IRQ_EN != 0;
        self.parity_en = data & SERCTL_PARITY_EN != 0;
        self.tx_break = data & SERCTL_TX_BREAK != 0;
        self.parity_even = data & SERCTL_PARITY_EVEN != 0;
        if data & SERCTL_RESET_ERR != 0 {
            self.overrun = false;
            self.frame_err = false;
        }
    }

    pub fn read_control(&self) -> u8 {
        let mut v = 0;
        if self.tx_idle() {
            v |= SERCTL_TXRDY | SERCTL_TXEMPTY;
        }
        if self.rx_ready {
            v |= SERCTL_RXRDY;
        }
        if self.overrun {
            v |= SERCTL_OVERRUN;
        }
        if self.frame_err {
            v |= SERCTL_FRAMERR;
        }
        if self.rx_data & RX_BREAK != 0 {
            v |= SERCTL_RXBRK;
        }
        if self.rx_data & 0x0100 != 0 {
            v |= SERCTL_PARBIT;
        }
        v
    }

    /// One Timer-4 underflow (one bit-time). Returns true when the serial
    /// interrupt condition holds: the IRQ is level-sensitive, so the caller
    /// re-asserts the pending bit on every tick for which this is true, even
    /// if software just cleared it.
    pub fn tick(&mut self) -> bool {
        // RX: count the frame down, then deliver the next queued word
        if !self.rx_idle() {
            if self.rx_countdown > 0 {
                self.rx_countdown -= 1;
            }
            if self.rx_countdown == 0 {
                if self.waiting > 0 {
                    if self.rx_ready {
                        self.overrun = true;
                    }
                    self.rx_data = self.pop();
                    self.rx_ready = true;
                    self.rx_countdown = if self.waiting == 0 {
                        FRAME_TIME
                    } else {
                        FRAME_TIME + INTER_BYTE_GAP
                    };
                } else {
                    self.rx_countdown = COUNTDOWN_IDLE;
                }
            }
        }

        // TX: a finished frame either goes idle or, while TXBRK is held,
        // keeps looping BREAK frames back to the local receiver
        if !self.tx_idle() {
            if self.tx_countdown > 0 {
                self.tx_countdown -= 1;
            }
            if self.tx_countdown == 0 {
                if self.tx_break {
                    self.tx_countdown = FRAME_TIME;
                    self.front_insert(RX_BREAK);
                    if self.rx_idle() {
                        self.rx_countdown = FRAME_TIME;
                    }
                } else {
                    self.tx_countdown = COUNTDOWN_IDLE;
                }
            }
        }

        (self.tx_idle() && self.tx_irq_en) || (self.rx_ready && self.rx_irq_en)
    }

    pub fn save_state(&self, w: &mut StateWriter) {
        w.u32(self.tx_countdown);
        w.u32(self.rx_countdown);
        w.u16(self.tx_data);
        w.u16(self.rx_data);
        w.bool(self.rx_ready);
        w.bool(self.tx_irq_en);
        w.bool(self.rx_irq_en);
        w.bool(self.parity_en);
        w.bool(self.parity_even);
        w.bool(self.tx_break);
        w.bool(self.overrun);
        w.bool(self.frame_err);
        for word in &self.queue {
            w.u16(*word);
        }
        w.u8(self.head);
        w.u8(self.tail);
        w.u8(self.waiting);
    }

    pub fn load_state(&mut self, r: &mut StateReader) -> Result<(), StateError> {
        self.tx_countdown = r.u32()?;
        self.rx_countdown = r.u32()?;
        self.tx_data = r.u16()?;
        self.rx_data = r.u16()?;
        self.rx_ready = r.bool()?;
        self.tx_irq_en = r.bool()?;
        self.rx_irq_en = r.bool()?;
        self.parity_en = r.bool()?;
        self.parity_even = r.bool()?;
        self.tx_break = r.bool()?;
        self.overrun = r.bool()?;
        self.frame_err = r.bool()?;
        for word in self.queue.iter_mut() {
            *word = r.u16()?;
        }
        self.head = r.u8()? & (QUEUE_LEN as u8 - 1);
        self.tail = r.u8()? & (QUEUE_LEN as u8 - 1);
        self.waiting = r.u8()?;
        Ok(())
    }
}

impl Default for Uart {
    fn default() -> Self {
        Self::new()
    }
}
