//! Mikey — timing, video DMA, interrupt, serial, and I/O chip.
//!
//! # Register map (offsets within `$FD00`-`$FDFF`)
//!
//! | Offset      | Name      | Description                                   |
//! |-------------|-----------|-----------------------------------------------|
//! | 0x00-0x1F   | TIMn      | 8 timers, 4 registers each: BACKUP, CTLA, COUNT, CTLB |
//! | 0x20-0x3F   | AUDn      | 4 audio channels, 8 registers each            |
//! | 0x40-0x44   | ATTEN/MPAN| Stereo attenuation                            |
//! | 0x50        | MSTEREO   | Stereo channel disables                       |
//! | 0x80        | INTSET    | Read: pending IRQ mask. Write: OR into pending|
//! | 0x81        | INTRST    | Write: clear pending bits. Read: open bus     |
//! | 0x8A        | IODIR     | I/O pin direction (1 = output)                |
//! | 0x8B        | IODAT     | I/O pins: EEPROM CS/data/clock, AUDIN         |
//! | 0x8C        | SERCTL    | UART control/status                           |
//! | 0x8D        | SERDAT    | UART data                                     |
//! | 0x91        | CPUSLEEP  | Bus handoff strobe (sprites already run at SPRGO) |
//! | 0x92        | DISPCTL   | Bit 0 enables display DMA                     |
//! | 0x94/0x95   | DISPADR   | Framebuffer base address, low/high            |
//! | 0xA0-0xAF   | GREEN     | Palette green nibbles                         |
//! | 0xB0-0xBF   | BLUERED   | Palette blue (7:4) / red (3:0) nibbles        |
//!
//! Everything else in the page reads open bus (`0xFF`) and ignores writes.
//!
//! Timer 0 paces scanlines: each underflow renders the current line (when
//! DMA is enabled and the line is visible) and advances the scanline
//! counter, which wraps at 105. Timer 4 paces the UART. The IRQ line to the
//! CPU is the OR of the pending mask.

pub mod timers;
pub mod uart;

use crate::core::savestate::{StateError, StateReader, StateWriter};
use crate::device::audio::Audio;
use crate::device::eeprom::{Eeprom93cxx, EepromKind};
use timers::{Timer, LINK_TARGET, TIMER_COUNT};
use uart::Uart;

/// CPU clock in Hz: one CPU cycle is four ticks of the 16 MHz master clock.
pub const CPU_CLOCK_HZ: u32 = 4_000_000;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 102;

/// Total scanline slots per field; the scanline counter wraps here.
pub const SCANLINE_COUNT: u16 = 105;

/// Framebuffer bytes per line (two 4-bit pixels per byte).
pub const BYTES_PER_LINE: usize = 80;

const DISPCTL_DMA_ENABLE: u8 = 0x01;

/// UART interrupt arrives through Timer 4's pending bit.
const IRQ_UART: u8 = 0x10;

pub struct Mikey {
    pub timers: [Timer; TIMER_COUNT],
    pub uart: Uart,
    pub audio: Audio,
    pub eeprom: Eeprom93cxx,

    irq_pending: u8,
    iodir: u8,
    iodat: u8,

    green: [u8; 16],
    bluered: [u8; 16],
    argb: [u32; 16],

    disp_ctl: u8,
    disp_addr: u16,
    current_scanline: u16,

    framebuffer: Vec<u32>, // SCREEN_WIDTH * SCREEN_HEIGHT ARGB8888
}

impl Mikey {
    pub fn new(eeprom_kind: EepromKind) -> Self {
        Self {
            timers: Default::default(),
            uart: Uart::new(),
            audio: Audio::new(),
            eeprom: Eeprom93cxx::new(eeprom_kind),
            irq_pending: 0,
            iodir: 0,
            iodat: 0,
            green: [0; 16],
            bluered: [0; 16],
            argb: [0xFF00_0000; 16],
            disp_ctl: 0,
            disp_addr: 0,
            current_scanline: 0,
            framebuffer: vec![0xFF00_0000; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    pub fn irq_asserted(&self) -> bool {
        self.irq_pending != 0
    }

    pub fn irq_pending(&self) -> u8 {
        self.irq_pending
    }

    pub fn display_address(&self) -> u16 {
        self.disp_addr
    }

    pub fn current_scanline(&self) -> u16 {
        self.current_scanline
    }

    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    // ---- Register access ----

    pub fn read(&mut self, offset: u8) -> u8 {
        match offset {
            // SERDAT read clears RXRDY; everything else decodes like peek
            0x8D => self.uart.read_data(),
            _ => self.peek(offset),
        }
    }

    pub fn peek(&self, offset: u8) -> u8 {
        match offset {
            0x00..=0x1F => {
                let t = &self.timers[(offset / 4) as usize];
                match offset % 4 {
                    0 => t.backup,
                    1 => t.ctl_a,
                    2 => t.count,
                    _ => t.read_ctl_b(),
                }
            }
            0x20..=0x44 | 0x50 => self.audio.read(offset),
            0x80 => self.irq_pending,
            0x8A => self.iodir,
            0x8B => self.read_iodat(),
            0x8C => self.uart.read_control(),
            0x8D => self.uart.peek_data(),
            0x92 => self.disp_ctl,
            0x94 => self.disp_addr as u8,
            0x95 => (self.disp_addr >> 8) as u8,
            0xA0..=0xAF => self.green[(offset & 0x0F) as usize],
            0xB0..=0xBF => self.bluered[(offset & 0x0F) as usize],
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, offset: u8, data: u8) {
        match offset {
            0x00..=0x1F => {
                let t = &mut self.timers[(offset / 4) as usize];
                match offset % 4 {
                    0 => t.backup = data,
                    1 => t.write_ctl_a(data),
                    2 => t.count = data,
                    _ => t.write_ctl_b(data),
                }
            }
            0x20..=0x44 | 0x50 => self.audio.write(offset, data),
            0x80 => self.irq_pending |= data,
            0x81 => self.irq_pending &= !data,
            0x8A => self.iodir = data,
            0x8B => self.write_iodat(data),
            0x8C => self.uart.write_control(data),
            0x8D => self.uart.write_data(data),
            0x91 => {
                // CPUSLEEP hands the bus to Suzy on hardware; sprite batches
                // already ran to completion at SPRGO here.
            }
            0x92 => self.disp_ctl = data,
            0x94 => self.disp_addr = (self.disp_addr & 0xFF00) | data as u16,
            0x95 => self.disp_addr = (self.disp_addr & 0x00FF) | ((data as u16) << 8),
            0xA0..=0xAF => {
                self.green[(offset & 0x0F) as usize] = data;
                self.update_palette((offset & 0x0F) as usize);
            }
            0xB0..=0xBF => {
                self.bluered[(offset & 0x0F) as usize] = data;
                self.update_palette((offset & 0x0F) as usize);
            }
            _ => {}
        }
    }

    // ---- I/O pins (EEPROM on bits 0-2, AUDIN on bit 3) ----

    fn write_iodat(&mut self, data: u8) {
        self.iodat = data;
        let cs = data & 0x01 != 0;
        let di = data & 0x02 != 0;
        let clk = data & 0x04 != 0;
        // write_pins detects the CLK rising edge and shifts in the bit-1 level
        self.eeprom.write_pins(cs, clk, di);
    }

    fn read_iodat(&self) -> u8 {
        let mut v = self.iodat;
        if self.iodir & 0x02 == 0 {
            // Pin 1 as input reads the EEPROM's DO line
            if self.eeprom.data_out() {
                v |= 0x02;
            } else {
                v &= !0x02;
            }
        }
        if self.iodir & 0x08 == 0 {
            v &= !0x08; // AUDIN reads low when configured as input
        }
        v
    }

    // ---- Palette ----

    /// Each 4-bit channel expands to 8 bits by nibble replication;
    /// alpha is always opaque.
    fn update_palette(&mut self, index: usize) {
        let g = (self.green[index] & 0x0F) as u32;
        let b = (self.bluered[index] >> 4) as u32;
        let r = (self.bluered[index] & 0x0F) as u32;
        self.argb[index] =
            0xFF00_0000 | (r << 20 | r << 16) | (g << 12 | g << 8) | (b << 4 | b);
    }

    pub fn palette_argb(&self) -> &[u32; 16] {
        &self.argb
    }

    // ---- Timers ----

    /// Advance all timers to `current_cycle`, firing scanline DMA, UART
    /// bit-times, IRQs, and cascade links from the underflows.
    pub fn tick(&mut self, current_cycle: u64, ram: &[u8; 0x10000]) {
        for i in 0..TIMER_COUNT {
            {
                let t = &mut self.timers[i];
                if !t.enabled() || (t.timer_done && i != 4) {
                    t.last_tick = current_cycle;
                    continue;
                }
                // Linked timers advance only through the cascade
                if t.linked() {
                    continue;
                }
            }
            let period = self.timers[i].period();
            while current_cycle - self.timers[i].last_tick >= period {
                self.timers[i].last_tick += period;
                let underflow = self.timers[i].count == 0;
                self.timers[i].count = self.timers[i].count.wrapping_sub(1);
                if underflow && self.timer_underflow(i, ram) {
                    break;
                }
            }
        }
    }

    /// Handle one underflow of timer `i`. Returns true when the timer
    /// latched Done and must stop counting.
    fn timer_underflow(&mut self, i: usize, ram: &[u8; 0x10000]) -> bool {
        self.timers[i].count = self.timers[i].backup;

        if i == 4 {
            // UART exception: timer 4 reloads and keeps running, and its
            // pending bit follows the level-sensitive serial condition.
            if self.uart.tick() {
                self.irq_pending |= IRQ_UART;
            }
            return false;
        }

        if self.timers[i].irq_enabled() {
            self.irq_pending |= 1 << i;
        }

        if i == 0 {
            self.scanline_underflow(ram);
        }

        let stopped = if self.timers[i].reload_enabled() {
            false
        } else {
            // Done latches and the timer stops counting until the latch is
            // cleared (CTLB write or CTLA reset strobe)
            self.timers[i].timer_done = true;
            true
        };

        self.cascade(i, ram);
        stopped
    }

    /// Propagate an underflow to the linked downstream timer.
    fn cascade(&mut self, i: usize, ram: &[u8; 0x10000]) {
        let Some(target) = LINK_TARGET[i] else {
            return;
        };
        {
            let t = &self.timers[target];
            if !t.enabled() || !t.linked() || t.timer_done {
                return;
            }
        }
        let underflow = self.timers[target].count == 0;
        self.timers[target].count = self.timers[target].count.wrapping_sub(1);
        if underflow {
            self.timer_underflow(target, ram);
        }
    }

    // ---- Display DMA ----

    fn scanline_underflow(&mut self, ram: &[u8; 0x10000]) {
        if self.disp_ctl & DISPCTL_DMA_ENABLE != 0
            && (self.current_scanline as usize) < SCREEN_HEIGHT
        {
            self.render_scanline(ram);
        }
        self.current_scanline += 1;
        if self.current_scanline >= SCANLINE_COUNT {
            self.current_scanline = 0;
        }
    }

    /// Blit one scanline: 80 bytes from RAM, high nibble first, each nibble
    /// indexing the derived ARGB palette.
    fn render_scanline(&mut self, ram: &[u8; 0x10000]) {
        let line = self.current_scanline as usize;
        let base = self
            .disp_addr
            .wrapping_add((line * BYTES_PER_LINE) as u16);
        let out = &mut self.framebuffer[line * SCREEN_WIDTH..(line + 1) * SCREEN_WIDTH];
        for (i, px) in out.chunks_exact_mut(2).enumerate() {
            let byte = ram[base.wrapping_add(i as u16) as usize];
            px[0] = self.argb[(byte >> 4) as usize];
            px[1] = self.argb[(byte & 0x0F) as usize];
        }
    }

    // ---- Save state ----

    pub fn save_state(&self, w: &mut StateWriter) {
        for t in &self.timers {
            t.save_state(w);
        }
        w.u8(self.irq_pending);
        w.u8(self.iodir);
        w.u8(self.iodat);
        w.bytes(&self.green);
        w.bytes(&self.bluered);
        w.u8(self.disp_ctl);
        w.u16(self.disp_addr);
        w.u16(self.current_scanline);
        for px in &self.framebuffer {
            w.u32(*px);
        }
        self.uart.save_state(w);
    }

    pub fn load_state(&mut self, r: &mut StateReader) -> Result<(), StateError> {
        for t in self.timers.iter_mut() {
            t.load_state(r)?;
        }
        self.irq_pending = r.u8()?;
        self.iodir = r.u8()?;
        self.iodat = r.u8()?;
        r.bytes(&mut self.green)?;
        r.bytes(&mut self.bluered)?;
        self.disp_ctl = r.u8()?;
        self.disp_addr = r.u16()?;
        self.current_scanline = r.u16()?;
        for px in self.framebuffer.iter_mut() {
            *px = r.u32()?;
        }
        self.uart.load_state(r)?;
        for i in 0..16 {
            self.update_palette(i);
        }
        Ok(())
    }
}
