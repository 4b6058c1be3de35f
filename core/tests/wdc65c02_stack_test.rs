use lynx_core::cpu::{StatusFlag, Wdc65c02};
mod common;
use common::TestBus;

#[test]
fn pha_pla_round_trip() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x48, 0xA9, 0x00, 0x68]); // PHA, LDA #0, PLA
    cpu.a = 0x5A;
    cpu.sp = 0xFF;

    cpu.step(&mut bus);
    assert_eq!(bus.memory[0x01FF], 0x5A);
    assert_eq!(cpu.sp, 0xFE);
    assert_eq!(cpu.cycles, 3);

    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x00);

    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x5A);
    assert_eq!(cpu.sp, 0xFF);
}

#[test]
fn phx_phy_plx_ply() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xDA, 0x5A, 0xFA, 0x7A]); // PHX, PHY, PLX, PLY
    cpu.x = 0x11;
    cpu.y = 0x22;

    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(bus.memory[0x01FF], 0x11);
    assert_eq!(bus.memory[0x01FE], 0x22);

    cpu.x = 0;
    cpu.y = 0;
    cpu.step(&mut bus); // PLX pops the Y value pushed last
    assert_eq!(cpu.x, 0x22);
    cpu.step(&mut bus);
    assert_eq!(cpu.y, 0x11);
}

#[test]
fn php_pushes_b_and_u_set() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x08]);
    cpu.p = StatusFlag::C as u8 | StatusFlag::U as u8;

    cpu.step(&mut bus);

    let pushed = bus.memory[0x01FF];
    assert_ne!(pushed & StatusFlag::B as u8, 0);
    assert_ne!(pushed & StatusFlag::U as u8, 0);
    assert_ne!(pushed & StatusFlag::C as u8, 0);
}

#[test]
fn plp_ignores_b_keeps_u() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x28]);
    bus.memory[0x01FF] = 0xFF; // everything set, including B
    cpu.sp = 0xFE;

    cpu.step(&mut bus);

    assert_eq!(cpu.p & StatusFlag::B as u8, 0);
    assert_ne!(cpu.p & StatusFlag::U as u8, 0);
    assert_ne!(cpu.p & StatusFlag::N as u8, 0);
    assert_eq!(cpu.cycles, 4);
}

#[test]
fn jsr_rts_round_trip() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x20, 0x00, 0x30]); // JSR $3000
    bus.load(0x3000, &[0x60]); // RTS
    cpu.pc = 0x0200;

    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x3000);
    assert_eq!(cpu.cycles, 6);
    // return address on the stack is the last byte of the JSR
    assert_eq!(bus.memory[0x01FF], 0x02);
    assert_eq!(bus.memory[0x01FE], 0x02);

    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x0203);
    assert_eq!(cpu.cycles, 12);
    assert_eq!(cpu.sp, 0xFF);
}

#[test]
fn brk_and_rti() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x00, 0xFF]); // BRK + padding byte
    bus.load(0xFFFE, &[0x00, 0x80]); // IRQ vector -> $8000
    bus.load(0x8000, &[0x40]); // RTI
    cpu.pc = 0x0200;
    cpu.p |= StatusFlag::D as u8;
    cpu.p &= !(StatusFlag::I as u8);

    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x8000);
    assert_eq!(cpu.cycles, 7);
    // B set in the pushed copy, D cleared in the live register
    assert_ne!(bus.memory[0x01FD] & StatusFlag::B as u8, 0);
    assert_eq!(cpu.p & StatusFlag::D as u8, 0);
    assert_ne!(cpu.p & StatusFlag::I as u8, 0);

    cpu.step(&mut bus);
    // BRK's return address skips the padding byte
    assert_eq!(cpu.pc, 0x0202);
    // the pushed P (with D) comes back, minus B
    assert_ne!(cpu.p & StatusFlag::D as u8, 0);
    assert_eq!(cpu.p & StatusFlag::B as u8, 0);
}

#[test]
fn stack_pointer_wraps() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x48]); // PHA
    cpu.sp = 0x00;
    cpu.a = 0x77;

    cpu.step(&mut bus);

    assert_eq!(bus.memory[0x0100], 0x77);
    assert_eq!(cpu.sp, 0xFF);
}
