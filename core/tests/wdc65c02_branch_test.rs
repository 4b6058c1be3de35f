use lynx_core::cpu::{StatusFlag, Wdc65c02};
mod common;
use common::TestBus;

#[test]
fn branch_not_taken_falls_through() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xD0, 0x10]); // BNE +$10 with Z set
    cpu.pc = 0x0200;
    cpu.p |= StatusFlag::Z as u8;

    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 0x0202);
    assert_eq!(cpu.cycles, 2);
}

#[test]
fn branch_taken_same_page() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xD0, 0x10]); // BNE +$10 with Z clear
    cpu.pc = 0x0200;

    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 0x0212);
    assert_eq!(cpu.cycles, 3);
}

#[test]
fn branch_taken_across_page() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    // BNE -$20 from $0202 lands at $01E2
    bus.load(0x0200, &[0xD0, 0xE0]);
    cpu.pc = 0x0200;

    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 0x01E2);
    assert_eq!(cpu.cycles, 4);
}

#[test]
fn bra_is_unconditional() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x80, 0x05]); // BRA +5, Z set just to prove it's ignored
    cpu.pc = 0x0200;
    cpu.p |= StatusFlag::Z as u8;

    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 0x0207);
    assert_eq!(cpu.cycles, 3);
}

#[test]
fn all_condition_branches() {
    // (opcode, flag, branch taken when flag set?)
    let cases: &[(u8, StatusFlag, bool)] = &[
        (0x10, StatusFlag::N, false), // BPL
        (0x30, StatusFlag::N, true),  // BMI
        (0x50, StatusFlag::V, false), // BVC
        (0x70, StatusFlag::V, true),  // BVS
        (0x90, StatusFlag::C, false), // BCC
        (0xB0, StatusFlag::C, true),  // BCS
        (0xD0, StatusFlag::Z, false), // BNE
        (0xF0, StatusFlag::Z, true),  // BEQ
    ];
    for &(opcode, f, taken_when_set) in cases {
        for set in [false, true] {
            let mut cpu = Wdc65c02::new();
            let mut bus = TestBus::new();
            bus.load(0x0200, &[opcode, 0x08]);
            cpu.pc = 0x0200;
            if set {
                cpu.p |= f as u8;
            } else {
                cpu.p &= !(f as u8);
            }
            cpu.step(&mut bus);
            let expected = if set == taken_when_set { 0x020A } else { 0x0202 };
            assert_eq!(cpu.pc, expected, "opcode {opcode:#04X}, flag set={set}");
        }
    }
}

#[test]
fn jmp_absolute() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x4C, 0x34, 0x12]);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 0x1234);
    assert_eq!(cpu.cycles, 3);
}

#[test]
fn jmp_indirect_reads_across_page_boundary() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    // Pointer straddles $02FF/$0300; the CMOS part reads both bytes
    // correctly instead of wrapping within the page.
    bus.load(0, &[0x6C, 0xFF, 0x02]);
    bus.memory[0x02FF] = 0x78;
    bus.memory[0x0300] = 0x56;
    bus.memory[0x0200] = 0x99; // the NMOS-bug address, must not be used

    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 0x5678);
    assert_eq!(cpu.cycles, 6);
}

#[test]
fn jmp_absolute_x_indirect() {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x7C, 0x00, 0x30]); // JMP ($3000,X)
    cpu.x = 4;
    bus.load(0x3004, &[0xCD, 0xAB]);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 0xABCD);
    assert_eq!(cpu.cycles, 6);
}
