//! The Lynx console: every chip wired to the 64 KiB bus, plus the frame
//! driver that advances the whole machine one video frame at a time.
//!
//! # Memory map
//!
//! The address space is flat RAM with overlays over the top 1 KiB, each
//! individually disabled by a MAPCTL bit (1 = hidden, exposing RAM):
//!
//! | Range           | Overlay          | MAPCTL bit |
//! |-----------------|------------------|------------|
//! | `$FC00`-`$FCFF` | Suzy registers   | 0          |
//! | `$FD00`-`$FDFF` | Mikey registers  | 1          |
//! | `$FE00`-`$FFF7` | Boot ROM         | 2          |
//! | `$FFF8`         | reserved (RAM)   | —          |
//! | `$FFF9`         | MAPCTL itself    | always     |
//! | `$FFFA`-`$FFFF` | Boot ROM vectors | 3          |
//!
//! MAPCTL is a hardware register: writing it never touches the RAM byte
//! underneath, and reading it back returns the written value.
//!
//! Sprite processing runs to completion inside the SPRGO write; the bus
//! cycles Suzy spent are charged to the CPU as a batched stall before the
//! next Mikey tick, which is the bus-contention model the hardware's
//! cycle-stealing reduces to at instruction granularity.

use log::info;

use lynx_core::core::machine::{AudioSink, InputButton, Machine};
use lynx_core::core::savestate::{StateError, StateReader, StateWriter};
use lynx_core::core::Bus;
use lynx_core::cpu::Wdc65c02;
use lynx_core::device::audio::SAMPLE_RATE;
use lynx_core::device::cartridge::Cartridge;
use lynx_core::device::eeprom::EepromKind;
use lynx_core::device::mikey::{Mikey, CPU_CLOCK_HZ, SCANLINE_COUNT};
use lynx_core::device::suzy::Suzy;

use crate::rom::{RomError, RomImage};
use crate::video::{self, Rotation};

pub const FPS: u32 = 60;

/// CPU cycles per frame, quantized to whole scanlines.
pub const CYCLES_PER_FRAME: u64 =
    (CPU_CLOCK_HZ / (FPS * SCANLINE_COUNT as u32)) as u64 * SCANLINE_COUNT as u64;

const BOOT_ROM_LEN: usize = 512;

/// Fallback entry point when no boot ROM supplies a reset vector.
const HLE_BOOT_PC: u16 = 0x0200;

const STATE_MAGIC: &[u8; 4] = b"LXST";
const STATE_VERSION: u8 = 1;

// MAPCTL bits (1 = overlay hidden)
const MAPCTL_SUZY_DISABLED: u8 = 0x01;
const MAPCTL_MIKEY_DISABLED: u8 = 0x02;
const MAPCTL_ROM_DISABLED: u8 = 0x04;
const MAPCTL_VECTORS_DISABLED: u8 = 0x08;

// ---------------------------------------------------------------------------
// Input buttons
// ---------------------------------------------------------------------------

pub const INPUT_UP: u8 = 0;
pub const INPUT_DOWN: u8 = 1;
pub const INPUT_LEFT: u8 = 2;
pub const INPUT_RIGHT: u8 = 3;
pub const INPUT_OPTION1: u8 = 4;
pub const INPUT_OPTION2: u8 = 5;
pub const INPUT_B: u8 = 6; // inner fire button
pub const INPUT_A: u8 = 7; // outer fire button
pub const INPUT_PAUSE: u8 = 8;

/// JOYSTICK latch bits (active-low: clear = pressed).
const JOY_UP: u8 = 0x80;
const JOY_DOWN: u8 = 0x40;
const JOY_LEFT: u8 = 0x20;
const JOY_RIGHT: u8 = 0x10;
const JOY_OPTION1: u8 = 0x08;
const JOY_OPTION2: u8 = 0x04;
const JOY_B: u8 = 0x02;
const JOY_A: u8 = 0x01;

/// SWITCHES latch bits (active-low).
const SWITCH_PAUSE: u8 = 0x01;

const LYNX_INPUT_MAP: &[InputButton] = &[
    InputButton { id: INPUT_UP, name: "Up" },
    InputButton { id: INPUT_DOWN, name: "Down" },
    InputButton { id: INPUT_LEFT, name: "Left" },
    InputButton { id: INPUT_RIGHT, name: "Right" },
    InputButton { id: INPUT_OPTION1, name: "Option 1" },
    InputButton { id: INPUT_OPTION2, name: "Option 2" },
    InputButton { id: INPUT_B, name: "B" },
    InputButton { id: INPUT_A, name: "A" },
    InputButton { id: INPUT_PAUSE, name: "Pause" },
];

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

/// Everything the CPU can see: RAM, boot ROM, MAPCTL, and both chips.
/// Split out from [`Lynx`] so the CPU can borrow it as a [`Bus`] while
/// living beside it.
pub struct LynxBus {
    pub ram: Box<[u8; 0x10000]>,
    pub boot_rom: Vec<u8>,
    pub mapctl: u8,
    pub mikey: Mikey,
    pub suzy: Suzy,

    /// Bus cycles Suzy consumed since the CPU last ran; drained by the
    /// frame driver into the CPU cycle counter.
    stall: u64,
}

impl LynxBus {
    fn boot_rom_byte(&self, addr: u16) -> u8 {
        let index = (addr - 0xFE00) as usize;
        if index < self.boot_rom.len() {
            self.boot_rom[index]
        } else {
            0xFF
        }
    }

    fn take_stall(&mut self) -> u64 {
        std::mem::take(&mut self.stall)
    }
}

impl Bus for LynxBus {
    fn read(&mut self, addr: u16) -> u8 {
        if addr < 0xFC00 {
            return self.ram[addr as usize];
        }
        match addr {
            0xFC00..=0xFCFF if self.mapctl & MAPCTL_SUZY_DISABLED == 0 => {
                self.suzy.read(addr as u8)
            }
            0xFD00..=0xFDFF if self.mapctl & MAPCTL_MIKEY_DISABLED == 0 => {
                self.mikey.read(addr as u8)
            }
            0xFE00..=0xFFF7
                if self.mapctl & MAPCTL_ROM_DISABLED == 0 && !self.boot_rom.is_empty() =>
            {
                self.boot_rom_byte(addr)
            }
            0xFFF9 => self.mapctl,
            0xFFFA..=0xFFFF
                if self.mapctl & MAPCTL_VECTORS_DISABLED == 0 && !self.boot_rom.is_empty() =>
            {
                self.boot_rom_byte(addr)
            }
            _ => self.ram[addr as usize],
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        if addr < 0xFC00 {
            self.ram[addr as usize] = data;
            return;
        }
        match addr {
            0xFC00..=0xFCFF if self.mapctl & MAPCTL_SUZY_DISABLED == 0 => {
                self.suzy.write(addr as u8, data);
                if self.suzy.take_sprite_go() {
                    // Walk the whole sprite list now; the accumulated bus
                    // cycles stall the CPU before the next timer tick.
                    let video_base = self.mikey.display_address();
                    let Self { suzy, ram, stall, .. } = self;
                    *stall += suzy.run_sprites(ram, video_base);
                }
            }
            0xFD00..=0xFDFF if self.mapctl & MAPCTL_MIKEY_DISABLED == 0 => {
                self.mikey.write(addr as u8, data);
            }
            0xFE00..=0xFFF7
                if self.mapctl & MAPCTL_ROM_DISABLED == 0 && !self.boot_rom.is_empty() =>
            {
                // ROM overlay swallows the write
            }
            0xFFF9 => self.mapctl = data,
            0xFFFA..=0xFFFF
                if self.mapctl & MAPCTL_VECTORS_DISABLED == 0 && !self.boot_rom.is_empty() => {}
            _ => self.ram[addr as usize] = data,
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        if addr < 0xFC00 {
            return self.ram[addr as usize];
        }
        match addr {
            0xFC00..=0xFCFF if self.mapctl & MAPCTL_SUZY_DISABLED == 0 => {
                self.suzy.peek(addr as u8)
            }
            0xFD00..=0xFDFF if self.mapctl & MAPCTL_MIKEY_DISABLED == 0 => {
                self.mikey.peek(addr as u8)
            }
            0xFE00..=0xFFF7
                if self.mapctl & MAPCTL_ROM_DISABLED == 0 && !self.boot_rom.is_empty() =>
            {
                self.boot_rom_byte(addr)
            }
            0xFFF9 => self.mapctl,
            0xFFFA..=0xFFFF
                if self.mapctl & MAPCTL_VECTORS_DISABLED == 0 && !self.boot_rom.is_empty() =>
            {
                self.boot_rom_byte(addr)
            }
            _ => self.ram[addr as usize],
        }
    }

    fn irq_pending(&self) -> bool {
        self.mikey.irq_asserted()
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

pub struct Lynx {
    pub cpu: Wdc65c02,
    pub bus: LynxBus,

    rotation: Rotation,
    eeprom_kind: EepromKind,
    audio_sink: Option<Box<dyn AudioSink>>,

    joystick: u8,
    switches: u8,
}

impl Lynx {
    /// Build a console around a cartridge image. `boot_rom` is the 512-byte
    /// system ROM; without it the post-boot state is synthesized.
    pub fn new(rom_bytes: &[u8], boot_rom: Option<&[u8]>) -> Result<Self, RomError> {
        Self::with_eeprom(rom_bytes, boot_rom, EepromKind::C46)
    }

    pub fn with_eeprom(
        rom_bytes: &[u8],
        boot_rom: Option<&[u8]>,
        eeprom_kind: EepromKind,
    ) -> Result<Self, RomError> {
        let image = RomImage::parse(rom_bytes)?;
        let cart = Cartridge::new(image.data, image.bank0_size, image.bank1_size);

        let mut boot = boot_rom.map(|b| b.to_vec()).unwrap_or_default();
        boot.truncate(BOOT_ROM_LEN);

        let mut lynx = Self {
            cpu: Wdc65c02::new(),
            bus: LynxBus {
                ram: Box::new([0; 0x10000]),
                boot_rom: boot,
                mapctl: 0,
                mikey: Mikey::new(eeprom_kind),
                suzy: Suzy::new(cart),
                stall: 0,
            },
            rotation: image.rotation,
            eeprom_kind,
            audio_sink: None,
            joystick: 0xFF,
            switches: 0xFF,
        };
        lynx.boot();
        Ok(lynx)
    }

    /// Host audio output; samples are pushed as the buffer fills.
    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.audio_sink = Some(sink);
    }

    /// Inject a ComLynx word from another unit.
    pub fn comlynx_rx(&mut self, word: u16) {
        self.bus.mikey.uart.back_insert(word);
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Raw 160×102 ARGB frame, before rotation.
    pub fn framebuffer(&self) -> &[u32] {
        self.bus.mikey.framebuffer()
    }

    /// Side-effect-free bus read for debuggers.
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Power-on sequence: either the boot ROM's reset vector, or the
    /// high-level-emulated post-boot register state.
    fn boot(&mut self) {
        if self.bus.boot_rom.is_empty() {
            info!("boot ROM missing, synthesizing post-boot state");
            // Timer 0: scanline pacing; Timer 2: frame pacing (linked)
            self.bus.mikey.write(0x00, 158);
            self.bus.mikey.write(0x01, 0x18);
            self.bus.mikey.write(0x08, 104);
            self.bus.mikey.write(0x09, 0x1F);
            self.bus.mikey.write(0x92, 0x09);
            self.bus.mikey.write(0x94, 0x00);
            self.bus.mikey.write(0x95, 0xC0);

            let vector = self.bus.peek_word(0xFFFC);
            self.cpu.pc = if vector == 0x0000 || vector == 0xFFFF {
                HLE_BOOT_PC
            } else {
                vector
            };
        } else {
            self.cpu.pc = self.bus.peek_word(0xFFFC);
        }
    }

    fn flush_audio(&mut self) {
        if let Some(sink) = self.audio_sink.as_mut() {
            let samples = self.bus.mikey.audio.drain_samples();
            if !samples.is_empty() {
                sink.play(&samples, SAMPLE_RATE);
            }
        }
    }
}

impl Machine for Lynx {
    fn display_size(&self) -> (u32, u32) {
        self.rotation.dimensions()
    }

    fn run_frame(&mut self) {
        let start = self.cpu.cycles;
        while self.cpu.cycles - start < CYCLES_PER_FRAME {
            self.cpu.step(&mut self.bus);
            // Charge any sprite-engine bus time before timers observe it
            self.cpu.cycles += self.bus.take_stall();
            self.bus.mikey.tick(self.cpu.cycles, &self.bus.ram);
            self.bus.mikey.audio.tick(self.cpu.cycles, CPU_CLOCK_HZ);
            if self.bus.mikey.audio.buffer_full() {
                self.flush_audio();
            }
        }
        self.flush_audio();

        // Controller latches refresh at frame boundaries
        self.bus.suzy.set_joystick(self.joystick);
        self.bus.suzy.set_switches(self.switches);
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        video::render_rgb24(self.bus.mikey.framebuffer(), self.rotation, buffer);
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        let (latch, bit) = match button {
            INPUT_UP => (&mut self.joystick, JOY_UP),
            INPUT_DOWN => (&mut self.joystick, JOY_DOWN),
            INPUT_LEFT => (&mut self.joystick, JOY_LEFT),
            INPUT_RIGHT => (&mut self.joystick, JOY_RIGHT),
            INPUT_OPTION1 => (&mut self.joystick, JOY_OPTION1),
            INPUT_OPTION2 => (&mut self.joystick, JOY_OPTION2),
            INPUT_B => (&mut self.joystick, JOY_B),
            INPUT_A => (&mut self.joystick, JOY_A),
            INPUT_PAUSE => (&mut self.switches, SWITCH_PAUSE),
            _ => return,
        };
        // Active-low: clear on press, set on release
        if pressed {
            *latch &= !bit;
        } else {
            *latch |= bit;
        }
    }

    fn input_map(&self) -> &[InputButton] {
        LYNX_INPUT_MAP
    }

    fn reset(&mut self) {
        // The hardware has no warm reset; this is a full power cycle.
        // Battery-backed EEPROM contents survive, everything else clears.
        self.bus.ram.fill(0);
        self.bus.mapctl = 0;
        self.bus.stall = 0;

        let old_mikey = std::mem::replace(&mut self.bus.mikey, Mikey::new(self.eeprom_kind));
        self.bus.mikey.eeprom = old_mikey.eeprom;

        let cart = std::mem::replace(&mut self.bus.suzy.cart, Cartridge::none());
        self.bus.suzy = Suzy::new(cart);
        self.bus.suzy.cart.reset();

        self.cpu.reset();
        self.cpu.cycles = 0;
        self.boot();
    }

    fn save_nvram(&self) -> Option<Vec<u8>> {
        if self.bus.mikey.eeprom.dirty() {
            Some(self.bus.mikey.eeprom.image())
        } else {
            None
        }
    }

    fn load_nvram(&mut self, data: &[u8]) {
        self.bus.mikey.eeprom.load_image(data);
    }

    fn save_state(&self) -> Vec<u8> {
        let mut w = StateWriter::new();
        w.bytes(STATE_MAGIC);
        w.u8(STATE_VERSION);
        w.bytes(&self.bus.ram[..]);
        w.u8(self.bus.mapctl);
        self.cpu.save_state(&mut w);
        self.bus.suzy.cart.save_state(&mut w);
        self.bus.mikey.eeprom.save_state(&mut w);
        self.bus.mikey.save_state(&mut w);
        self.bus.suzy.save_state(&mut w);
        self.bus.mikey.audio.save_state(&mut w);
        w.finish()
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), StateError> {
        // A valid state for this console is exactly as long as one it
        // saves, so a full length check up front means no partial restore.
        if data.len() != self.save_state().len() {
            let mut probe = StateReader::new(data);
            let mut magic = [0u8; 4];
            probe.bytes(&mut magic)?;
            if &magic != STATE_MAGIC {
                return Err(StateError::BadMagic);
            }
            let version = probe.u8()?;
            if version != STATE_VERSION {
                return Err(StateError::BadVersion {
                    expected: STATE_VERSION,
                    actual: version,
                });
            }
            return Err(StateError::UnexpectedEof);
        }

        let mut r = StateReader::new(data);
        let mut magic = [0u8; 4];
        r.bytes(&mut magic)?;
        if &magic != STATE_MAGIC {
            return Err(StateError::BadMagic);
        }
        let version = r.u8()?;
        if version != STATE_VERSION {
            return Err(StateError::BadVersion {
                expected: STATE_VERSION,
                actual: version,
            });
        }

        r.bytes(&mut self.bus.ram[..])?;
        self.bus.mapctl = r.u8()?;
        self.cpu.load_state(&mut r)?;
        self.bus.suzy.cart.load_state(&mut r)?;
        self.bus.mikey.eeprom.load_state(&mut r)?;
        self.bus.mikey.load_state(&mut r)?;
        self.bus.suzy.load_state(&mut r)?;
        self.bus.mikey.audio.load_state(&mut r)?;
        self.bus.stall = 0;
        r.finish()
    }

    fn audio_sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn drain_audio(&mut self) -> Vec<i16> {
        self.bus.mikey.audio.drain_samples()
    }
}
