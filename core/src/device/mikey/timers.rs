use crate::core::savestate::{StateError, StateReader, StateWriter};

pub const TIMER_COUNT: usize = 8;

/// Cascade targets: 0→2→4 and 1→3→5→7. Timers 4 and 6 are sinks; timer 4
/// clocks the UART, timer 6 is free-standing.
pub const LINK_TARGET: [Option<usize>; 8] = [
    Some(2),
    Some(3),
    Some(4),
    Some(5),
    None,
    Some(7),
    None,
    None,
];

// CTLA bits
pub const CTLA_CLOCK_MASK: u8 = 0x07;
pub const CTLA_ENABLE: u8 = 0x08;
pub const CTLA_RELOAD: u8 = 0x10;
pub const CTLA_RESET_DONE: u8 = 0x40; // self-clearing strobe, never stored
pub const CTLA_IRQ_ENABLE: u8 = 0x80;

/// Clock source value meaning "count upstream underflows".
pub const CLOCK_LINKED: u8 = 0x07;

// CTLB bits
pub const CTLB_TIMER_DONE: u8 = 0x08;

/// One of Mikey's eight interval timers.
///
/// Clock sources 0-6 select prescaler periods of 4..256 CPU cycles; source 7
/// means the timer advances only when its upstream timer underflows. A timer
/// that underflows with reload disabled latches TimerDone and stops counting
/// until the latch is cleared (CTLB write or the CTLA reset strobe) — that
/// stall is real hardware behavior, not an emulation shortcut. Timer 4 is
/// the UART baud clock and never latches Done.
pub struct Timer {
    pub backup: u8,
    pub ctl_a: u8,
    pub count: u8,
    pub ctl_b: u8,
    pub last_tick: u64,
    pub timer_done: bool,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            backup: 0,
            ctl_a: 0,
            count: 0,
            ctl_b: 0,
            last_tick: 0,
            timer_done: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.ctl_a & CTLA_ENABLE != 0
    }

    pub fn linked(&self) -> bool {
        self.ctl_a & CTLA_CLOCK_MASK == CLOCK_LINKED
    }

    pub fn reload_enabled(&self) -> bool {
        self.ctl_a & CTLA_RELOAD != 0
    }

    pub fn irq_enabled(&self) -> bool {
        self.ctl_a & CTLA_IRQ_ENABLE != 0
    }

    /// Prescaler period in CPU cycles (sources 0-6: 4, 8, 16, ... 256).
    pub fn period(&self) -> u64 {
        4u64 << (self.ctl_a & CTLA_CLOCK_MASK)
    }

    pub fn write_ctl_a(&mut self, data: u8) {
        if data & CTLA_RESET_DONE != 0 {
            self.timer_done = false;
        }
        self.ctl_a = data & !CTLA_RESET_DONE;
    }

    /// Any CTLB write clears the Done latch; the remaining bits are plain
    /// storage.
    pub fn write_ctl_b(&mut self, data: u8) {
        self.ctl_b = data & !CTLB_TIMER_DONE;
        self.timer_done = false;
    }

    pub fn read_ctl_b(&self) -> u8 {
        self.ctl_b | if self.timer_done { CTLB_TIMER_DONE } else { 0 }
    }

    pub fn save_state(&self, w: &mut StateWriter) {
        w.u8(self.backup);
        w.u8(self.ctl_a);
        w.u8(self.count);
        w.u8(self.ctl_b);
        w.u64(self.last_tick);
        w.bool(self.timer_done);
    }

    pub fn load_state(&mut self, r: &mut StateReader) -> Result<(), StateError> {
        self.backup = r.u8()?;
        self.ctl_a = r.u8()?;
        self.count = r.u8()?;
        self.ctl_b = r.u8()?;
        self.last_tick = r.u64()?;
        self.timer_done = r.bool()?;
        Ok(())
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
