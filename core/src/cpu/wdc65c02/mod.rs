mod addr;
mod alu;
mod branch;
mod shift;
mod stack;

use crate::core::savestate::{StateError, StateReader, StateWriter};
use crate::core::Bus;
use crate::cpu::state::Wdc65c02State;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StatusFlag {
    C = 0x01, // Carry
    Z = 0x02, // Zero
    I = 0x04, // Interrupt Disable
    D = 0x08, // Decimal
    B = 0x10, // Break
    U = 0x20, // Unused (always 1)
    V = 0x40, // Overflow
    N = 0x80, // Negative
}

/// Execution state outside normal instruction flow.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StopState {
    Running,
    /// STP executed; only a full reset recovers.
    Stopped,
    /// WAI executed; wakes when the IRQ line asserts.
    WaitingForIrq,
}

/// WDC 65C02 interpreter.
///
/// Instruction-stepped, cycle-accurate at instruction boundaries: every bus
/// access (including dummy and page-cross penalty reads) bumps `cycles` by
/// exactly one, and internal cycles are modeled as dummy reads, so the
/// per-instruction totals match the documented 65C02 cycle counts.
///
/// CMOS differences from the NMOS 6502 that are reproduced here:
/// BRA, PHX/PHY/PLX/PLY, STZ, TRB/TSB, WAI, STP, INC A/DEC A, BIT #imm
/// (Z only), the (zp) addressing mode, JMP (abs,X), JMP ($xxFF) reading
/// across the page boundary, RMW dummy *reads* (not write-backs), decimal
/// ADC/SBC with valid Z/N and one extra cycle, and D cleared on BRK/IRQ.
pub struct Wdc65c02 {
    // Registers
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub p: u8,

    /// CPU cycles since power-on; the single source of time for the rest of
    /// the machine.
    pub cycles: u64,

    pub stop: StopState,
}

impl Default for Wdc65c02 {
    fn default() -> Self {
        Self::new()
    }
}

impl Wdc65c02 {
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFF,
            p: StatusFlag::I as u8 | StatusFlag::U as u8,
            cycles: 0,
            stop: StopState::Running,
        }
    }

    /// Power-on/reset register state. The caller loads PC from the $FFFC
    /// vector through the bus (the Lynx has no separate warm reset).
    pub fn reset(&mut self) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.pc = 0;
        self.sp = 0xFF;
        self.p = StatusFlag::I as u8 | StatusFlag::U as u8;
        self.stop = StopState::Running;
    }

    #[inline]
    pub(crate) fn flag(&self, flag: StatusFlag) -> bool {
        self.p & flag as u8 != 0
    }

    #[inline]
    pub(crate) fn set_flag(&mut self, flag: StatusFlag, set: bool) {
        if set {
            self.p |= flag as u8;
        } else {
            self.p &= !(flag as u8);
        }
    }

    pub fn snapshot(&self) -> Wdc65c02State {
        Wdc65c02State {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            p: self.p,
            cycles: self.cycles,
        }
    }

    // ---- Bus access (each access is one CPU cycle) ----

    #[inline]
    pub(crate) fn read<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> u8 {
        self.cycles += 1;
        bus.read(addr)
    }

    #[inline]
    pub(crate) fn write<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16, data: u8) {
        self.cycles += 1;
        bus.write(addr, data);
    }

    /// Dummy read: a bus cycle whose data is discarded.
    #[inline]
    pub(crate) fn phantom<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) {
        let _ = self.read(bus, addr);
    }

    #[inline]
    pub(crate) fn fetch<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let v = self.read(bus, self.pc);
        self.pc = self.pc.wrapping_add(1);
        v
    }

    #[inline]
    pub(crate) fn fetch_word<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Execute one instruction (or one wait cycle while stopped/waiting).
    pub fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        match self.stop {
            StopState::Stopped => {
                // STP: dead until reset; still consume time so frames finish.
                self.cycles += 1;
                return;
            }
            StopState::WaitingForIrq => {
                self.cycles += 1;
                if !bus.irq_pending() {
                    return;
                }
                // Wake up. If I is set, execution simply continues with the
                // next instruction; otherwise the IRQ is serviced below.
                self.stop = StopState::Running;
            }
            StopState::Running => {}
        }

        if bus.irq_pending() && !self.flag(StatusFlag::I) {
            self.service_irq(bus);
            return;
        }

        let opcode = self.fetch(bus);
        self.execute(opcode, bus);
    }

    fn execute<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        match opcode {
            // --- LDA ---
            0xA9 => {
                let v = self.fetch(bus);
                self.lda(v);
            }
            0xA5 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.lda(v);
            }
            0xB5 => {
                let addr = self.zp_x(bus);
                let v = self.read(bus, addr);
                self.lda(v);
            }
            0xAD => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.lda(v);
            }
            0xBD => {
                let addr = self.abs_x(bus);
                let v = self.read(bus, addr);
                self.lda(v);
            }
            0xB9 => {
                let addr = self.abs_y(bus);
                let v = self.read(bus, addr);
                self.lda(v);
            }
            0xA1 => {
                let addr = self.ind_x(bus);
                let v = self.read(bus, addr);
                self.lda(v);
            }
            0xB1 => {
                let addr = self.ind_y(bus);
                let v = self.read(bus, addr);
                self.lda(v);
            }
            0xB2 => {
                let addr = self.zp_ind(bus);
                let v = self.read(bus, addr);
                self.lda(v);
            }

            // --- LDX ---
            0xA2 => {
                let v = self.fetch(bus);
                self.ldx(v);
            }
            0xA6 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.ldx(v);
            }
            0xB6 => {
                let addr = self.zp_y(bus);
                let v = self.read(bus, addr);
                self.ldx(v);
            }
            0xAE => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.ldx(v);
            }
            0xBE => {
                let addr = self.abs_y(bus);
                let v = self.read(bus, addr);
                self.ldx(v);
            }

            // --- LDY ---
            0xA0 => {
                let v = self.fetch(bus);
                self.ldy(v);
            }
            0xA4 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.ldy(v);
            }
            0xB4 => {
                let addr = self.zp_x(bus);
                let v = self.read(bus, addr);
                self.ldy(v);
            }
            0xAC => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.ldy(v);
            }
            0xBC => {
                let addr = self.abs_x(bus);
                let v = self.read(bus, addr);
                self.ldy(v);
            }

            // --- STA ---
            0x85 => {
                let addr = self.zp(bus);
                self.write(bus, addr, self.a);
            }
            0x95 => {
                let addr = self.zp_x(bus);
                self.write(bus, addr, self.a);
            }
            0x8D => {
                let addr = self.abs(bus);
                self.write(bus, addr, self.a);
            }
            0x9D => {
                let addr = self.abs_x_w(bus);
                self.write(bus, addr, self.a);
            }
            0x99 => {
                let addr = self.abs_y_w(bus);
                self.write(bus, addr, self.a);
            }
            0x81 => {
                let addr = self.ind_x(bus);
                self.write(bus, addr, self.a);
            }
            0x91 => {
                let addr = self.ind_y_w(bus);
                self.write(bus, addr, self.a);
            }
            0x92 => {
                let addr = self.zp_ind(bus);
                self.write(bus, addr, self.a);
            }

            // --- STX / STY / STZ ---
            0x86 => {
                let addr = self.zp(bus);
                self.write(bus, addr, self.x);
            }
            0x96 => {
                let addr = self.zp_y(bus);
                self.write(bus, addr, self.x);
            }
            0x8E => {
                let addr = self.abs(bus);
                self.write(bus, addr, self.x);
            }
            0x84 => {
                let addr = self.zp(bus);
                self.write(bus, addr, self.y);
            }
            0x94 => {
                let addr = self.zp_x(bus);
                self.write(bus, addr, self.y);
            }
            0x8C => {
                let addr = self.abs(bus);
                self.write(bus, addr, self.y);
            }
            0x64 => {
                let addr = self.zp(bus);
                self.write(bus, addr, 0);
            }
            0x74 => {
                let addr = self.zp_x(bus);
                self.write(bus, addr, 0);
            }
            0x9C => {
                let addr = self.abs(bus);
                self.write(bus, addr, 0);
            }
            0x9E => {
                let addr = self.abs_x_w(bus);
                self.write(bus, addr, 0);
            }

            // --- ADC ---
            0x69 => {
                let v = self.fetch(bus);
                self.adc(bus, v);
            }
            0x65 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.adc(bus, v);
            }
            0x75 => {
                let addr = self.zp_x(bus);
                let v = self.read(bus, addr);
                self.adc(bus, v);
            }
            0x6D => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.adc(bus, v);
            }
            0x7D => {
                let addr = self.abs_x(bus);
                let v = self.read(bus, addr);
                self.adc(bus, v);
            }
            0x79 => {
                let addr = self.abs_y(bus);
                let v = self.read(bus, addr);
                self.adc(bus, v);
            }
            0x61 => {
                let addr = self.ind_x(bus);
                let v = self.read(bus, addr);
                self.adc(bus, v);
            }
            0x71 => {
                let addr = self.ind_y(bus);
                let v = self.read(bus, addr);
                self.adc(bus, v);
            }
            0x72 => {
                let addr = self.zp_ind(bus);
                let v = self.read(bus, addr);
                self.adc(bus, v);
            }

            // --- SBC ---
            0xE9 => {
                let v = self.fetch(bus);
                self.sbc(bus, v);
            }
            0xE5 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.sbc(bus, v);
            }
            0xF5 => {
                let addr = self.zp_x(bus);
                let v = self.read(bus, addr);
                self.sbc(bus, v);
            }
            0xED => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.sbc(bus, v);
            }
            0xFD => {
                let addr = self.abs_x(bus);
                let v = self.read(bus, addr);
                self.sbc(bus, v);
            }
            0xF9 => {
                let addr = self.abs_y(bus);
                let v = self.read(bus, addr);
                self.sbc(bus, v);
            }
            0xE1 => {
                let addr = self.ind_x(bus);
                let v = self.read(bus, addr);
                self.sbc(bus, v);
            }
            0xF1 => {
                let addr = self.ind_y(bus);
                let v = self.read(bus, addr);
                self.sbc(bus, v);
            }
            0xF2 => {
                let addr = self.zp_ind(bus);
                let v = self.read(bus, addr);
                self.sbc(bus, v);
            }

            // --- CMP / CPX / CPY ---
            0xC9 => {
                let v = self.fetch(bus);
                self.compare(self.a, v);
            }
            0xC5 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.compare(self.a, v);
            }
            0xD5 => {
                let addr = self.zp_x(bus);
                let v = self.read(bus, addr);
                self.compare(self.a, v);
            }
            0xCD => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.compare(self.a, v);
            }
            0xDD => {
                let addr = self.abs_x(bus);
                let v = self.read(bus, addr);
                self.compare(self.a, v);
            }
            0xD9 => {
                let addr = self.abs_y(bus);
                let v = self.read(bus, addr);
                self.compare(self.a, v);
            }
            0xC1 => {
                let addr = self.ind_x(bus);
                let v = self.read(bus, addr);
                self.compare(self.a, v);
            }
            0xD1 => {
                let addr = self.ind_y(bus);
                let v = self.read(bus, addr);
                self.compare(self.a, v);
            }
            0xD2 => {
                let addr = self.zp_ind(bus);
                let v = self.read(bus, addr);
                self.compare(self.a, v);
            }
            0xE0 => {
                let v = self.fetch(bus);
                self.compare(self.x, v);
            }
            0xE4 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.compare(self.x, v);
            }
            0xEC => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.compare(self.x, v);
            }
            0xC0 => {
                let v = self.fetch(bus);
                self.compare(self.y, v);
            }
            0xC4 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.compare(self.y, v);
            }
            0xCC => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.compare(self.y, v);
            }

            // --- AND ---
            0x29 => {
                let v = self.fetch(bus);
                self.and(v);
            }
            0x25 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.and(v);
            }
            0x35 => {
                let addr = self.zp_x(bus);
                let v = self.read(bus, addr);
                self.and(v);
            }
            0x2D => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.and(v);
            }
            0x3D => {
                let addr = self.abs_x(bus);
                let v = self.read(bus, addr);
                self.and(v);
            }
            0x39 => {
                let addr = self.abs_y(bus);
                let v = self.read(bus, addr);
                self.and(v);
            }
            0x21 => {
                let addr = self.ind_x(bus);
                let v = self.read(bus, addr);
                self.and(v);
            }
            0x31 => {
                let addr = self.ind_y(bus);
                let v = self.read(bus, addr);
                self.and(v);
            }
            0x32 => {
                let addr = self.zp_ind(bus);
                let v = self.read(bus, addr);
                self.and(v);
            }

            // --- ORA ---
            0x09 => {
                let v = self.fetch(bus);
                self.ora(v);
            }
            0x05 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.ora(v);
            }
            0x15 => {
                let addr = self.zp_x(bus);
                let v = self.read(bus, addr);
                self.ora(v);
            }
            0x0D => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.ora(v);
            }
            0x1D => {
                let addr = self.abs_x(bus);
                let v = self.read(bus, addr);
                self.ora(v);
            }
            0x19 => {
                let addr = self.abs_y(bus);
                let v = self.read(bus, addr);
                self.ora(v);
            }
            0x01 => {
                let addr = self.ind_x(bus);
                let v = self.read(bus, addr);
                self.ora(v);
            }
            0x11 => {
                let addr = self.ind_y(bus);
                let v = self.read(bus, addr);
                self.ora(v);
            }
            0x12 => {
                let addr = self.zp_ind(bus);
                let v = self.read(bus, addr);
                self.ora(v);
            }

            // --- EOR ---
            0x49 => {
                let v = self.fetch(bus);
                self.eor(v);
            }
            0x45 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.eor(v);
            }
            0x55 => {
                let addr = self.zp_x(bus);
                let v = self.read(bus, addr);
                self.eor(v);
            }
            0x4D => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.eor(v);
            }
            0x5D => {
                let addr = self.abs_x(bus);
                let v = self.read(bus, addr);
                self.eor(v);
            }
            0x59 => {
                let addr = self.abs_y(bus);
                let v = self.read(bus, addr);
                self.eor(v);
            }
            0x41 => {
                let addr = self.ind_x(bus);
                let v = self.read(bus, addr);
                self.eor(v);
            }
            0x51 => {
                let addr = self.ind_y(bus);
                let v = self.read(bus, addr);
                self.eor(v);
            }
            0x52 => {
                let addr = self.zp_ind(bus);
                let v = self.read(bus, addr);
                self.eor(v);
            }

            // --- BIT ---
            0x89 => {
                // BIT #imm affects Z only (no N/V), unlike the other modes.
                let v = self.fetch(bus);
                self.set_flag(StatusFlag::Z, self.a & v == 0);
            }
            0x24 => {
                let addr = self.zp(bus);
                let v = self.read(bus, addr);
                self.bit(v);
            }
            0x34 => {
                let addr = self.zp_x(bus);
                let v = self.read(bus, addr);
                self.bit(v);
            }
            0x2C => {
                let addr = self.abs(bus);
                let v = self.read(bus, addr);
                self.bit(v);
            }
            0x3C => {
                let addr = self.abs_x(bus);
                let v = self.read(bus, addr);
                self.bit(v);
            }

            // --- Shifts / rotates ---
            0x0A => {
                self.phantom(bus, self.pc);
                self.a = self.asl(self.a);
            }
            0x06 => {
                let addr = self.zp(bus);
                self.rmw(bus, addr, Self::asl);
            }
            0x16 => {
                let addr = self.zp_x(bus);
                self.rmw(bus, addr, Self::asl);
            }
            0x0E => {
                let addr = self.abs(bus);
                self.rmw(bus, addr, Self::asl);
            }
            0x1E => {
                let addr = self.abs_x_w(bus);
                self.rmw(bus, addr, Self::asl);
            }
            0x4A => {
                self.phantom(bus, self.pc);
                self.a = self.lsr(self.a);
            }
            0x46 => {
                let addr = self.zp(bus);
                self.rmw(bus, addr, Self::lsr);
            }
            0x56 => {
                let addr = self.zp_x(bus);
                self.rmw(bus, addr, Self::lsr);
            }
            0x4E => {
                let addr = self.abs(bus);
                self.rmw(bus, addr, Self::lsr);
            }
            0x5E => {
                let addr = self.abs_x_w(bus);
                self.rmw(bus, addr, Self::lsr);
            }
            0x2A => {
                self.phantom(bus, self.pc);
                self.a = self.rol(self.a);
            }
            0x26 => {
                let addr = self.zp(bus);
                self.rmw(bus, addr, Self::rol);
            }
            0x36 => {
                let addr = self.zp_x(bus);
                self.rmw(bus, addr, Self::rol);
            }
            0x2E => {
                let addr = self.abs(bus);
                self.rmw(bus, addr, Self::rol);
            }
            0x3E => {
                let addr = self.abs_x_w(bus);
                self.rmw(bus, addr, Self::rol);
            }
            0x6A => {
                self.phantom(bus, self.pc);
                self.a = self.ror(self.a);
            }
            0x66 => {
                let addr = self.zp(bus);
                self.rmw(bus, addr, Self::ror);
            }
            0x76 => {
                let addr = self.zp_x(bus);
                self.rmw(bus, addr, Self::ror);
            }
            0x6E => {
                let addr = self.abs(bus);
                self.rmw(bus, addr, Self::ror);
            }
            0x7E => {
                let addr = self.abs_x_w(bus);
                self.rmw(bus, addr, Self::ror);
            }

            // --- INC / DEC ---
            0x1A => {
                // INC A (CMOS)
                self.phantom(bus, self.pc);
                self.a = self.a.wrapping_add(1);
                self.set_nz(self.a);
            }
            0x3A => {
                // DEC A (CMOS)
                self.phantom(bus, self.pc);
                self.a = self.a.wrapping_sub(1);
                self.set_nz(self.a);
            }
            0xE6 => {
                let addr = self.zp(bus);
                self.rmw(bus, addr, Self::inc);
            }
            0xF6 => {
                let addr = self.zp_x(bus);
                self.rmw(bus, addr, Self::inc);
            }
            0xEE => {
                let addr = self.abs(bus);
                self.rmw(bus, addr, Self::inc);
            }
            0xFE => {
                let addr = self.abs_x_w(bus);
                self.rmw(bus, addr, Self::inc);
            }
            0xC6 => {
                let addr = self.zp(bus);
                self.rmw(bus, addr, Self::dec);
            }
            0xD6 => {
                let addr = self.zp_x(bus);
                self.rmw(bus, addr, Self::dec);
            }
            0xCE => {
                let addr = self.abs(bus);
                self.rmw(bus, addr, Self::dec);
            }
            0xDE => {
                let addr = self.abs_x_w(bus);
                self.rmw(bus, addr, Self::dec);
            }

            // --- TRB / TSB (CMOS) ---
            0x14 => {
                let addr = self.zp(bus);
                self.rmw(bus, addr, Self::trb);
            }
            0x1C => {
                let addr = self.abs(bus);
                self.rmw(bus, addr, Self::trb);
            }
            0x04 => {
                let addr = self.zp(bus);
                self.rmw(bus, addr, Self::tsb);
            }
            0x0C => {
                let addr = self.abs(bus);
                self.rmw(bus, addr, Self::tsb);
            }

            // --- Flag instructions (2-cycle implied) ---
            0x18 => {
                self.phantom(bus, self.pc);
                self.set_flag(StatusFlag::C, false);
            }
            0x38 => {
                self.phantom(bus, self.pc);
                self.set_flag(StatusFlag::C, true);
            }
            0x58 => {
                self.phantom(bus, self.pc);
                self.set_flag(StatusFlag::I, false);
            }
            0x78 => {
                self.phantom(bus, self.pc);
                self.set_flag(StatusFlag::I, true);
            }
            0xB8 => {
                self.phantom(bus, self.pc);
                self.set_flag(StatusFlag::V, false);
            }
            0xD8 => {
                self.phantom(bus, self.pc);
                self.set_flag(StatusFlag::D, false);
            }
            0xF8 => {
                self.phantom(bus, self.pc);
                self.set_flag(StatusFlag::D, true);
            }

            // --- Transfers (2-cycle implied) ---
            0xAA => {
                self.phantom(bus, self.pc);
                self.x = self.a;
                self.set_nz(self.x);
            }
            0xA8 => {
                self.phantom(bus, self.pc);
                self.y = self.a;
                self.set_nz(self.y);
            }
            0x8A => {
                self.phantom(bus, self.pc);
                self.a = self.x;
                self.set_nz(self.a);
            }
            0x98 => {
                self.phantom(bus, self.pc);
                self.a = self.y;
                self.set_nz(self.a);
            }
            0xBA => {
                self.phantom(bus, self.pc);
                self.x = self.sp;
                self.set_nz(self.x);
            }
            0x9A => {
                // TXS does not set flags
                self.phantom(bus, self.pc);
                self.sp = self.x;
            }

            // --- Register increment/decrement (2-cycle implied) ---
            0xE8 => {
                self.phantom(bus, self.pc);
                self.x = self.x.wrapping_add(1);
                self.set_nz(self.x);
            }
            0xC8 => {
                self.phantom(bus, self.pc);
                self.y = self.y.wrapping_add(1);
                self.set_nz(self.y);
            }
            0xCA => {
                self.phantom(bus, self.pc);
                self.x = self.x.wrapping_sub(1);
                self.set_nz(self.x);
            }
            0x88 => {
                self.phantom(bus, self.pc);
                self.y = self.y.wrapping_sub(1);
                self.set_nz(self.y);
            }

            // --- NOP ---
            0xEA => {
                self.phantom(bus, self.pc);
            }

            // --- Branches ---
            0x10 => {
                let c = !self.flag(StatusFlag::N);
                self.branch(bus, c);
            }
            0x30 => {
                let c = self.flag(StatusFlag::N);
                self.branch(bus, c);
            }
            0x50 => {
                let c = !self.flag(StatusFlag::V);
                self.branch(bus, c);
            }
            0x70 => {
                let c = self.flag(StatusFlag::V);
                self.branch(bus, c);
            }
            0x90 => {
                let c = !self.flag(StatusFlag::C);
                self.branch(bus, c);
            }
            0xB0 => {
                let c = self.flag(StatusFlag::C);
                self.branch(bus, c);
            }
            0xD0 => {
                let c = !self.flag(StatusFlag::Z);
                self.branch(bus, c);
            }
            0xF0 => {
                let c = self.flag(StatusFlag::Z);
                self.branch(bus, c);
            }
            0x80 => {
                // BRA (CMOS): always taken
                self.branch(bus, true);
            }

            // --- Jumps / subroutines ---
            0x4C => {
                self.pc = self.fetch_word(bus);
            }
            0x6C => self.op_jmp_ind(bus),
            0x7C => self.op_jmp_abs_x_ind(bus),
            0x20 => self.op_jsr(bus),
            0x60 => self.op_rts(bus),
            0x40 => self.op_rti(bus),
            0x00 => self.op_brk(bus),

            // --- Stack ---
            0x48 => {
                self.phantom(bus, self.pc);
                self.push(bus, self.a);
            }
            0x68 => {
                self.phantom(bus, self.pc);
                self.phantom(bus, self.pc);
                self.a = self.pop(bus);
                self.set_nz(self.a);
            }
            0xDA => {
                // PHX (CMOS)
                self.phantom(bus, self.pc);
                self.push(bus, self.x);
            }
            0xFA => {
                // PLX (CMOS)
                self.phantom(bus, self.pc);
                self.phantom(bus, self.pc);
                self.x = self.pop(bus);
                self.set_nz(self.x);
            }
            0x5A => {
                // PHY (CMOS)
                self.phantom(bus, self.pc);
                self.push(bus, self.y);
            }
            0x7A => {
                // PLY (CMOS)
                self.phantom(bus, self.pc);
                self.phantom(bus, self.pc);
                self.y = self.pop(bus);
                self.set_nz(self.y);
            }
            0x08 => {
                // PHP pushes with B and U set
                self.phantom(bus, self.pc);
                let v = self.p | StatusFlag::B as u8 | StatusFlag::U as u8;
                self.push(bus, v);
            }
            0x28 => {
                // PLP ignores B; U reads back set
                self.phantom(bus, self.pc);
                self.phantom(bus, self.pc);
                let v = self.pop(bus);
                self.p = (v | StatusFlag::U as u8) & !(StatusFlag::B as u8);
            }

            // --- WAI / STP (CMOS) ---
            0xCB => {
                self.phantom(bus, self.pc);
                self.phantom(bus, self.pc);
                self.stop = StopState::WaitingForIrq;
            }
            0xDB => {
                self.phantom(bus, self.pc);
                self.phantom(bus, self.pc);
                self.stop = StopState::Stopped;
            }

            // --- Multi-byte NOP holes ---
            // Two-byte NOPs consume their operand byte; three-byte NOPs
            // consume two.
            0x02 | 0x22 | 0x42 | 0x62 | 0x82 | 0xC2 | 0xE2 | 0x44 => {
                let _ = self.fetch(bus);
            }
            0x5C | 0xDC | 0xFC => {
                let _ = self.fetch(bus);
                let _ = self.fetch(bus);
            }

            // Every remaining hole is a single-byte, single-cycle NOP on the
            // 65C02.
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Save state
// ---------------------------------------------------------------------------

impl Wdc65c02 {
    pub fn save_state(&self, w: &mut StateWriter) {
        w.u16(self.pc);
        w.u8(self.sp);
        w.u8(self.a);
        w.u8(self.x);
        w.u8(self.y);
        w.u8(self.p);
        w.u64(self.cycles);
        w.u8(match self.stop {
            StopState::Running => 0,
            StopState::Stopped => 1,
            StopState::WaitingForIrq => 2,
        });
    }

    pub fn load_state(&mut self, r: &mut StateReader) -> Result<(), StateError> {
        self.pc = r.u16()?;
        self.sp = r.u8()?;
        self.a = r.u8()?;
        self.x = r.u8()?;
        self.y = r.u8()?;
        self.p = r.u8()?;
        self.cycles = r.u64()?;
        self.stop = match r.u8()? {
            1 => StopState::Stopped,
            2 => StopState::WaitingForIrq,
            _ => StopState::Running,
        };
        Ok(())
    }
}
