use lynx_core::device::eeprom::{Eeprom93cxx, EepromKind};
use lynx_core::device::mikey::Mikey;

/// Clock one bit in with a full CLK pulse.
fn clock_in(e: &mut Eeprom93cxx, di: bool) {
    e.write_pins(true, true, di);
    e.write_pins(true, false, di);
}

/// Clock a string of bits MSB-first.
fn clock_bits(e: &mut Eeprom93cxx, bits: &[u8]) {
    for &b in bits {
        clock_in(e, b != 0);
    }
}

/// Clock a full 16-bit word in.
fn clock_word(e: &mut Eeprom93cxx, word: u16) {
    for i in (0..16).rev() {
        clock_in(e, (word >> i) & 1 != 0);
    }
}

/// Clock 16 bits out, sampling DO after each pulse.
fn read_word(e: &mut Eeprom93cxx) -> u16 {
    let mut word = 0u16;
    for _ in 0..16 {
        clock_in(e, false);
        word = (word << 1) | e.data_out() as u16;
    }
    word
}

fn start_frame(e: &mut Eeprom93cxx) {
    e.write_pins(false, false, false);
    e.write_pins(true, false, false);
}

fn addr_bits(addr: u16, width: u8) -> Vec<u8> {
    (0..width).rev().map(|i| ((addr >> i) & 1) as u8).collect()
}

fn cmd_read(e: &mut Eeprom93cxx, addr: u16) -> u16 {
    start_frame(e);
    clock_bits(e, &[1, 1, 0]);
    clock_bits(e, &addr_bits(addr, e.kind().address_bits()));
    // leading dummy bit reads 0 before any data clock
    assert!(!e.data_out());
    read_word(e)
}

fn cmd_write(e: &mut Eeprom93cxx, addr: u16, word: u16) {
    start_frame(e);
    clock_bits(e, &[1, 0, 1]);
    clock_bits(e, &addr_bits(addr, e.kind().address_bits()));
    clock_word(e, word);
}

fn cmd_ewen(e: &mut Eeprom93cxx) {
    start_frame(e);
    clock_bits(e, &[1, 0, 0]);
    let width = e.kind().address_bits();
    let addr = 0b11 << (width - 2);
    clock_bits(e, &addr_bits(addr, width));
}

fn cmd_ewds(e: &mut Eeprom93cxx) {
    start_frame(e);
    clock_bits(e, &[1, 0, 0]);
    clock_bits(e, &addr_bits(0, e.kind().address_bits()));
}

#[test]
fn read_of_erased_word_returns_ffff() {
    let mut e = Eeprom93cxx::new(EepromKind::C46);
    assert_eq!(cmd_read(&mut e, 0), 0xFFFF);
}

#[test]
fn write_requires_write_enable() {
    let mut e = Eeprom93cxx::new(EepromKind::C46);

    // Not enabled: the write is clocked in but never commits
    cmd_write(&mut e, 5, 0x1234);
    assert_eq!(cmd_read(&mut e, 5), 0xFFFF);
    assert!(!e.dirty());

    // EWEN, write, read back
    cmd_ewen(&mut e);
    cmd_write(&mut e, 5, 0xABCD);
    assert_eq!(cmd_read(&mut e, 5), 0xABCD);
    assert!(e.dirty());

    // EWDS locks it again
    cmd_ewds(&mut e);
    cmd_write(&mut e, 5, 0x5555);
    assert_eq!(cmd_read(&mut e, 5), 0xABCD);
}

#[test]
fn erase_sets_ffff() {
    let mut e = Eeprom93cxx::new(EepromKind::C46);
    cmd_ewen(&mut e);
    cmd_write(&mut e, 7, 0x0042);

    start_frame(&mut e);
    clock_bits(&mut e, &[1, 1, 1]); // ERASE
    let bits = addr_bits(7, e.kind().address_bits());
    clock_bits(&mut e, &bits);

    assert_eq!(cmd_read(&mut e, 7), 0xFFFF);
}

#[test]
fn extended_read_streams_consecutive_words() {
    let mut e = Eeprom93cxx::new(EepromKind::C46);
    cmd_ewen(&mut e);
    cmd_write(&mut e, 3, 0x1111);
    cmd_write(&mut e, 4, 0x2222);

    start_frame(&mut e);
    clock_bits(&mut e, &[1, 1, 0]);
    let bits = addr_bits(3, e.kind().address_bits());
    clock_bits(&mut e, &bits);
    assert_eq!(read_word(&mut e), 0x1111);
    // keep clocking: the next word follows with no dummy bit
    assert_eq!(read_word(&mut e), 0x2222);
}

#[test]
fn cs_drop_aborts_frame() {
    let mut e = Eeprom93cxx::new(EepromKind::C46);
    cmd_ewen(&mut e);

    // Begin a WRITE but drop CS mid-address
    start_frame(&mut e);
    clock_bits(&mut e, &[1, 0, 1, 0, 0]);
    e.write_pins(false, false, false);

    // Nothing committed; a fresh READ works normally
    assert_eq!(cmd_read(&mut e, 0), 0xFFFF);
}

#[test]
fn zeros_before_start_bit_are_ignored() {
    let mut e = Eeprom93cxx::new(EepromKind::C46);
    start_frame(&mut e);
    clock_bits(&mut e, &[0, 0, 0]); // idle clocks, no start bit yet
    clock_bits(&mut e, &[1, 1, 0]);
    let bits = addr_bits(0, e.kind().address_bits());
    clock_bits(&mut e, &bits);
    assert!(!e.data_out());
    assert_eq!(read_word(&mut e), 0xFFFF);
}

#[test]
fn chip_kinds_have_expected_geometry() {
    for (kind, bits, bytes) in [
        (EepromKind::C46, 6, 128),
        (EepromKind::C56, 7, 256),
        (EepromKind::C66, 8, 512),
        (EepromKind::C76, 9, 1024),
        (EepromKind::C86, 10, 2048),
    ] {
        assert_eq!(kind.address_bits(), bits);
        let e = Eeprom93cxx::new(kind);
        assert_eq!(e.image().len(), bytes);
    }
}

#[test]
fn battery_image_round_trip() {
    let mut e = Eeprom93cxx::new(EepromKind::C46);
    cmd_ewen(&mut e);
    cmd_write(&mut e, 0, 0xBEEF);
    cmd_write(&mut e, 63, 0xCAFE);

    let image = e.image();
    assert_eq!(image.len(), 128);
    // words are stored little-endian
    assert_eq!(&image[0..2], &[0xEF, 0xBE]);

    let mut fresh = Eeprom93cxx::new(EepromKind::C46);
    fresh.load_image(&image);
    assert!(!fresh.dirty());
    assert_eq!(cmd_read(&mut fresh, 0), 0xBEEF);
    assert_eq!(cmd_read(&mut fresh, 63), 0xCAFE);
}

// -- Through Mikey's I/O pins -------------------------------------------------

/// Drive the EEPROM through IODAT the way games do: bit 0 CS, bit 1 data,
/// bit 2 clock.
fn iodat_clock(mikey: &mut Mikey, di: bool) {
    let d = if di { 0x02 } else { 0x00 };
    mikey.write(0x8B, 0x01 | d);
    mikey.write(0x8B, 0x01 | d | 0x04);
    mikey.write(0x8B, 0x01 | d);
}

#[test]
fn eeprom_reachable_through_iodat() {
    let mut mikey = Mikey::new(EepromKind::C46);
    // CS, data, and clock driven as outputs; data flipped to input for DO
    mikey.write(0x8A, 0x07);
    mikey.write(0x8B, 0x01); // CS high

    // READ address 0
    for bit in [true, true, false] {
        iodat_clock(&mut mikey, bit);
    }
    for _ in 0..6 {
        iodat_clock(&mut mikey, false);
    }

    // Flip pin 1 to input and clock out 16 bits of an erased word
    mikey.write(0x8A, 0x05);
    let mut word = 0u16;
    for _ in 0..16 {
        mikey.write(0x8B, 0x01 | 0x04);
        mikey.write(0x8B, 0x01);
        word = (word << 1) | ((mikey.read(0x8B) >> 1) & 1) as u16;
    }
    assert_eq!(word, 0xFFFF);
}
