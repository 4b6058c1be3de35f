use lynx_core::device::eeprom::EepromKind;
use lynx_core::device::mikey::{Mikey, SCREEN_WIDTH};

fn mikey() -> (Mikey, Box<[u8; 0x10000]>) {
    (Mikey::new(EepromKind::C46), Box::new([0; 0x10000]))
}

/// Enable display DMA at `base` with a fast scanline timer.
fn setup_display(m: &mut Mikey, base: u16) {
    m.write(0x92, 0x01);
    m.write(0x94, base as u8);
    m.write(0x95, (base >> 8) as u8);
    // Timer 0: period 4, backup 0, reload
    m.write(0x00, 0);
    m.write(0x01, 0x18);
    m.write(0x02, 0);
}

fn set_palette(m: &mut Mikey, index: u8, green: u8, blue: u8, red: u8) {
    m.write(0xA0 + index, green);
    m.write(0xB0 + index, (blue << 4) | red);
}

#[test]
fn scanline_nibbles_index_palette() {
    let (mut m, mut ram) = mikey();
    ram[0xC000] = 0x12;
    ram[0xC001] = 0x34;
    ram[0xC002] = 0x00;
    setup_display(&mut m, 0xC000);
    for i in 1..=4u8 {
        set_palette(&mut m, i, i, i, i);
    }
    set_palette(&mut m, 0, 0, 0, 0);

    m.tick(4, &ram); // one underflow renders scanline 0

    let fb = m.framebuffer();
    assert_eq!(fb[0], 0xFF11_1111);
    assert_eq!(fb[1], 0xFF22_2222);
    assert_eq!(fb[2], 0xFF33_3333);
    assert_eq!(fb[3], 0xFF44_4444);
    assert_eq!(fb[4], 0xFF00_0000);
    assert_eq!(fb[5], 0xFF00_0000);
}

#[test]
fn palette_channels_expand_by_nibble_replication() {
    let (mut m, mut ram) = mikey();
    ram[0xC000] = 0x10; // pixel 0 uses palette entry 1
    setup_display(&mut m, 0xC000);
    // green 0xA, blue 0xB, red 0xC
    set_palette(&mut m, 1, 0x0A, 0x0B, 0x0C);

    m.tick(4, &ram);

    // ARGB: alpha FF, red CC, green AA, blue BB
    assert_eq!(m.framebuffer()[0], 0xFFCC_AABB);
}

#[test]
fn each_scanline_reads_80_bytes_forward() {
    let (mut m, mut ram) = mikey();
    setup_display(&mut m, 0xC000);
    set_palette(&mut m, 0x0F, 0x0F, 0x0F, 0x0F);
    // Last byte of scanline 1
    ram[0xC000 + 80 + 79] = 0xFF;

    m.tick(8, &ram); // scanlines 0 and 1

    let fb = m.framebuffer();
    assert_eq!(fb[SCREEN_WIDTH + 158], 0xFFFF_FFFF);
    assert_eq!(fb[SCREEN_WIDTH + 159], 0xFFFF_FFFF);
    assert_eq!(fb[SCREEN_WIDTH + 157], 0xFF00_0000);
}

#[test]
fn framebuffer_address_wraps_mod_64k() {
    let (mut m, mut ram) = mikey();
    setup_display(&mut m, 0xFFF0);
    set_palette(&mut m, 0x0F, 0x0F, 0x0F, 0x0F);
    // Bytes 0-15 come from $FFF0-$FFFF, byte 16 wraps to $0000
    ram[0x0000] = 0xFF;

    m.tick(4, &ram);

    let fb = m.framebuffer();
    assert_eq!(fb[32], 0xFFFF_FFFF);
    assert_eq!(fb[33], 0xFFFF_FFFF);
    assert_eq!(fb[31], 0xFF00_0000);
}

#[test]
fn dma_disabled_leaves_framebuffer_alone() {
    let (mut m, mut ram) = mikey();
    ram[0xC000] = 0xFF;
    setup_display(&mut m, 0xC000);
    m.write(0x92, 0x00); // DMA off
    set_palette(&mut m, 0x0F, 0x0F, 0x0F, 0x0F);

    m.tick(4, &ram);

    assert_eq!(m.framebuffer()[0], 0xFF00_0000);
}

#[test]
fn scanlines_past_visible_area_do_not_render() {
    let (mut m, mut ram) = mikey();
    setup_display(&mut m, 0x0000);
    set_palette(&mut m, 0x0F, 0x0F, 0x0F, 0x0F);
    ram.fill(0xFF);

    // Advance into the vertical blank region (scanlines 102-104)
    m.tick(102 * 4, &ram);
    let before = m.framebuffer().to_vec();
    m.tick(104 * 4, &ram);

    assert_eq!(m.framebuffer(), &before[..]);
}

#[test]
fn display_address_register_reads_back() {
    let (mut m, _ram) = mikey();
    m.write(0x94, 0x34);
    m.write(0x95, 0x12);
    assert_eq!(m.display_address(), 0x1234);
    assert_eq!(m.read(0x94), 0x34);
    assert_eq!(m.read(0x95), 0x12);
}
