//! Output-side video conversion: ARGB framebuffer to RGB24 with the
//! cartridge-requested screen rotation applied.
//!
//! A handful of titles mount the console sideways; their headers request a
//! quarter-turn so the host window comes out upright. The palette expansion
//! itself (4-bit channels replicated to 8) already happened when Mikey
//! derived its ARGB palette; this stage only shuffles pixels.

use lynx_core::device::mikey::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Screen rotation requested by the cartridge header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rotation {
    None,
    Left,
    Right,
}

impl Rotation {
    /// Output dimensions after rotation.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Rotation::None => (SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32),
            _ => (SCREEN_HEIGHT as u32, SCREEN_WIDTH as u32),
        }
    }
}

/// Convert the 160×102 ARGB framebuffer into an RGB24 buffer, rotated.
/// `out` must hold `w * h * 3` bytes for the rotated dimensions.
pub fn render_rgb24(framebuffer: &[u32], rotation: Rotation, out: &mut [u8]) {
    let (w, h) = rotation.dimensions();
    let (w, h) = (w as usize, h as usize);

    for y in 0..h {
        for x in 0..w {
            let src = match rotation {
                Rotation::None => framebuffer[y * SCREEN_WIDTH + x],
                // Quarter-turn counterclockwise: source column becomes
                // destination row, counted from the right edge
                Rotation::Left => framebuffer[x * SCREEN_WIDTH + (SCREEN_WIDTH - 1 - y)],
                // Quarter-turn clockwise
                Rotation::Right => {
                    framebuffer[(SCREEN_HEIGHT - 1 - x) * SCREEN_WIDTH + y]
                }
            };
            let base = (y * w + x) * 3;
            out[base] = (src >> 16) as u8;
            out[base + 1] = (src >> 8) as u8;
            out[base + 2] = src as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame() -> Vec<u32> {
        let mut fb = vec![0xFF00_0000u32; SCREEN_WIDTH * SCREEN_HEIGHT];
        fb[0] = 0xFF11_2233; // top-left
        fb[SCREEN_WIDTH - 1] = 0xFF44_5566; // top-right
        fb
    }

    fn pixel(out: &[u8], w: usize, x: usize, y: usize) -> (u8, u8, u8) {
        let base = (y * w + x) * 3;
        (out[base], out[base + 1], out[base + 2])
    }

    #[test]
    fn no_rotation_copies_through() {
        let fb = test_frame();
        let mut out = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT * 3];
        render_rgb24(&fb, Rotation::None, &mut out);
        assert_eq!(pixel(&out, SCREEN_WIDTH, 0, 0), (0x11, 0x22, 0x33));
        assert_eq!(
            pixel(&out, SCREEN_WIDTH, SCREEN_WIDTH - 1, 0),
            (0x44, 0x55, 0x66)
        );
    }

    #[test]
    fn left_rotation_moves_top_right_to_top_left() {
        let fb = test_frame();
        let (w, h) = Rotation::Left.dimensions();
        let mut out = vec![0u8; (w * h * 3) as usize];
        render_rgb24(&fb, Rotation::Left, &mut out);
        // CCW: the source's top-right corner becomes the output's top-left
        assert_eq!(pixel(&out, w as usize, 0, 0), (0x44, 0x55, 0x66));
        // and the source's top-left lands at the output's bottom-left
        assert_eq!(
            pixel(&out, w as usize, 0, (h - 1) as usize),
            (0x11, 0x22, 0x33)
        );
    }

    #[test]
    fn right_rotation_moves_top_left_to_top_right() {
        let fb = test_frame();
        let (w, h) = Rotation::Right.dimensions();
        let mut out = vec![0u8; (w * h * 3) as usize];
        render_rgb24(&fb, Rotation::Right, &mut out);
        // CW: the source's top-left corner becomes the output's top-right
        assert_eq!(
            pixel(&out, w as usize, (w - 1) as usize, 0),
            (0x11, 0x22, 0x33)
        );
    }
}
