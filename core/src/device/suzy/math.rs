//! Suzy's 16×16 hardware math unit.
//!
//! Multiply runs `MATHC × MATHE` into the 32-bit `MATHG:MATHH` pair, with
//! optional sign-magnitude handling and an accumulate mode. Divide runs
//! `MATHG:MATHH ÷ MATHE` with the quotient landing in `MATHC:MATHD` and the
//! remainder replacing the dividend in `MATHG:MATHH`.
//!
//! Faithful hardware quirks:
//! - the overflow flag is *overwritten* on every operation, never OR-ed;
//! - sign conversion negates first and then inspects the sign, so `0x8000`
//!   (whose negation is itself) counts as a positive magnitude;
//! - negating a zero result leaves `0x0000` even though the internal sign
//!   says negative;
//! - a signed divide never negates the remainder.

use crate::core::savestate::{StateError, StateReader, StateWriter};

pub struct SuzyMath {
    pub mathc: u16,
    pub mathd: u16,
    pub mathe: u16,
    pub mathf: u16,
    pub mathg: u16,
    pub mathh: u16,

    /// Scratch register word, byte-addressable beside the working set.
    pub jklm: u32,
    /// Divisor latch carried over from the quotient-chain era; plain storage.
    pub np: u16,
    /// Divide trigger register; writing its high byte starts the divide.
    pub mathk: u16,

    pub sign_mode: bool,
    pub accumulate: bool,
    pub overflow: bool,
}

/// 16-bit sign-magnitude conversion as the hardware does it: negate, then
/// treat the result's sign bit as the sign. `0x8000` survives negation with
/// its top bit set and is therefore handled as a positive magnitude.
fn to_magnitude16(v: u16) -> (u16, bool) {
    if v & 0x8000 == 0 {
        return (v, false);
    }
    let mag = (!v).wrapping_add(1);
    if mag & 0x8000 != 0 {
        (mag, false)
    } else {
        (mag, true)
    }
}

/// 32-bit variant for the divide path, same edge behavior at `0x8000_0000`.
fn to_magnitude32(v: u32) -> (u32, bool) {
    if v & 0x8000_0000 == 0 {
        return (v, false);
    }
    let mag = (!v).wrapping_add(1);
    if mag & 0x8000_0000 != 0 {
        (mag, false)
    } else {
        (mag, true)
    }
}

impl SuzyMath {
    pub fn new() -> Self {
        Self {
            mathc: 0,
            mathd: 0,
            mathe: 0,
            mathf: 0,
            mathg: 0,
            mathh: 0,
            jklm: 0,
            np: 0,
            mathk: 0,
            sign_mode: false,
            accumulate: false,
            overflow: false,
        }
    }

    fn product(&self) -> u32 {
        ((self.mathg as u32) << 16) | self.mathh as u32
    }

    fn set_product(&mut self, v: u32) {
        self.mathg = (v >> 16) as u16;
        self.mathh = v as u16;
    }

    /// Triggered by a write to MATHF's high byte.
    pub fn multiply(&mut self) {
        let (c, c_neg) = if self.sign_mode {
            to_magnitude16(self.mathc)
        } else {
            (self.mathc, false)
        };
        let (e, e_neg) = if self.sign_mode {
            to_magnitude16(self.mathe)
        } else {
            (self.mathe, false)
        };

        let mut result = c as u32 * e as u32;
        if self.sign_mode && (c_neg ^ e_neg) {
            // Negating zero truncates to zero; the sign is simply invisible
            result = (!result).wrapping_add(1);
        }

        if self.accumulate {
            let (sum, carry) = self.product().overflowing_add(result);
            self.set_product(sum);
            self.overflow = carry;
        } else {
            self.set_product(result);
            self.overflow = false;
        }
    }

    /// Triggered by a write to MATHK's high byte. Divide-by-zero zeroes the
    /// quotient and remainder.
    pub fn divide(&mut self) {
        if self.mathe == 0 {
            self.mathc = 0;
            self.mathd = 0;
            self.set_product(0);
            self.overflow = false;
            return;
        }

        let (num, num_neg) = if self.sign_mode {
            to_magnitude32(self.product())
        } else {
            (self.product(), false)
        };
        let (den, den_neg) = if self.sign_mode {
            to_magnitude16(self.mathe)
        } else {
            (self.mathe, false)
        };

        let mut quotient = num / den as u32;
        let remainder = num % den as u32;
        if self.sign_mode && (num_neg ^ den_neg) {
            quotient = (!quotient).wrapping_add(1);
        }

        self.mathc = (quotient >> 16) as u16;
        self.mathd = quotient as u16;
        // The remainder is never negated, whatever the operand signs were
        self.set_product(remainder);
        self.overflow = false;
    }

    pub fn save_state(&self, w: &mut StateWriter) {
        w.u16(self.mathc);
        w.u16(self.mathd);
        w.u16(self.mathe);
        w.u16(self.mathf);
        w.u16(self.mathg);
        w.u16(self.mathh);
        w.u32(self.jklm);
        w.u16(self.np);
        w.u16(self.mathk);
        w.bool(self.sign_mode);
        w.bool(self.accumulate);
        w.bool(self.overflow);
    }

    pub fn load_state(&mut self, r: &mut StateReader) -> Result<(), StateError> {
        self.mathc = r.u16()?;
        self.mathd = r.u16()?;
        self.mathe = r.u16()?;
        self.mathf = r.u16()?;
        self.mathg = r.u16()?;
        self.mathh = r.u16()?;
        self.jklm = r.u32()?;
        self.np = r.u16()?;
        self.mathk = r.u16()?;
        self.sign_mode = r.bool()?;
        self.accumulate = r.bool()?;
        self.overflow = r.bool()?;
        Ok(())
    }
}

impl Default for SuzyMath {
    fn default() -> Self {
        Self::new()
    }
}
