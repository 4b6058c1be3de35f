//! Per-instruction cycle totals. One bus access is one cycle; internal
//! cycles surface as dummy reads, so the documented 65C02 counts fall out of
//! the access sequence. Write/RMW indexed modes always pay the page-cross
//! penalty.

use lynx_core::cpu::Wdc65c02;
mod common;
use common::TestBus;

/// Run `code` at $0200 with X=Y=4 and return the cycles one instruction took.
fn cycles_for(code: &[u8]) -> u64 {
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0x0200, code);
    cpu.pc = 0x0200;
    cpu.x = 4;
    cpu.y = 4;
    cpu.step(&mut bus);
    cpu.cycles
}

#[test]
fn load_store_cycle_counts() {
    let cases: &[(&[u8], u64, &str)] = &[
        (&[0xA9, 0x00], 2, "LDA #"),
        (&[0xA5, 0x10], 3, "LDA zp"),
        (&[0xB5, 0x10], 4, "LDA zp,X"),
        (&[0xAD, 0x00, 0x30], 4, "LDA abs"),
        (&[0xBD, 0x00, 0x30], 4, "LDA abs,X same page"),
        (&[0xBD, 0xFE, 0x30], 5, "LDA abs,X page cross"),
        (&[0xB9, 0xFE, 0x30], 5, "LDA abs,Y page cross"),
        (&[0xA1, 0x10], 6, "LDA (zp,X)"),
        (&[0xB1, 0x10], 5, "LDA (zp),Y same page"),
        (&[0xB2, 0x10], 5, "LDA (zp)"),
        (&[0x85, 0x10], 3, "STA zp"),
        (&[0x8D, 0x00, 0x30], 4, "STA abs"),
        (&[0x9D, 0x00, 0x30], 5, "STA abs,X always penalty"),
        (&[0x99, 0x00, 0x30], 5, "STA abs,Y always penalty"),
        (&[0x91, 0x10], 6, "STA (zp),Y always penalty"),
        (&[0x92, 0x10], 5, "STA (zp)"),
        (&[0x64, 0x10], 3, "STZ zp"),
        (&[0x9E, 0x00, 0x30], 5, "STZ abs,X"),
    ];
    for (code, expected, name) in cases {
        assert_eq!(cycles_for(code), *expected, "{name}");
    }
}

#[test]
fn rmw_cycle_counts() {
    let cases: &[(&[u8], u64, &str)] = &[
        (&[0xE6, 0x10], 5, "INC zp"),
        (&[0xF6, 0x10], 6, "INC zp,X"),
        (&[0xEE, 0x00, 0x30], 6, "INC abs"),
        (&[0xFE, 0x00, 0x30], 7, "INC abs,X"),
        (&[0x06, 0x10], 5, "ASL zp"),
        (&[0x1E, 0x00, 0x30], 7, "ASL abs,X"),
        (&[0x14, 0x10], 5, "TRB zp"),
        (&[0x0C, 0x00, 0x30], 6, "TSB abs"),
        (&[0x0A], 2, "ASL A"),
        (&[0x1A], 2, "INC A"),
    ];
    for (code, expected, name) in cases {
        assert_eq!(cycles_for(code), *expected, "{name}");
    }
}

#[test]
fn control_flow_cycle_counts() {
    let cases: &[(&[u8], u64, &str)] = &[
        (&[0x4C, 0x00, 0x30], 3, "JMP abs"),
        (&[0x6C, 0x00, 0x30], 6, "JMP (abs)"),
        (&[0x7C, 0x00, 0x30], 6, "JMP (abs,X)"),
        (&[0x20, 0x00, 0x30], 6, "JSR"),
        (&[0x00, 0x00], 7, "BRK"),
        (&[0x80, 0x02], 3, "BRA"),
        (&[0xEA], 2, "NOP"),
        (&[0xCB], 3, "WAI"),
        (&[0xDB], 3, "STP"),
    ];
    for (code, expected, name) in cases {
        assert_eq!(cycles_for(code), *expected, "{name}");
    }
}

#[test]
fn stack_cycle_counts() {
    let cases: &[(&[u8], u64, &str)] = &[
        (&[0x48], 3, "PHA"),
        (&[0x68], 4, "PLA"),
        (&[0xDA], 3, "PHX"),
        (&[0x7A], 4, "PLY"),
        (&[0x08], 3, "PHP"),
        (&[0x28], 4, "PLP"),
    ];
    for (code, expected, name) in cases {
        assert_eq!(cycles_for(code), *expected, "{name}");
    }
}

#[test]
fn rts_and_rti_cycle_counts() {
    // RTS
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x60]);
    bus.load(0x01FE, &[0x00, 0x30]);
    cpu.pc = 0x0200;
    cpu.sp = 0xFD;
    cpu.step(&mut bus);
    assert_eq!(cpu.cycles, 6, "RTS");

    // RTI
    let mut cpu = Wdc65c02::new();
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x40]);
    bus.load(0x01FD, &[0x20, 0x00, 0x30]);
    cpu.pc = 0x0200;
    cpu.sp = 0xFC;
    cpu.step(&mut bus);
    assert_eq!(cpu.cycles, 6, "RTI");
}

#[test]
fn branch_cycles_depend_on_outcome() {
    // not taken: 2 (Z clear means BEQ falls through)
    assert_eq!(cycles_for(&[0xF0, 0x10]), 2, "BEQ not taken");
    // taken, same page: 3
    assert_eq!(cycles_for(&[0xD0, 0x10]), 3, "BNE taken");
    // taken, page crossed: 4
    assert_eq!(cycles_for(&[0xD0, 0xE0]), 4, "BNE taken across page");
}
