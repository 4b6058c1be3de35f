//! Lynx ROM image loading.
//!
//! Cartridge dumps come in two flavors: an `.lnx` file with a 64-byte
//! header describing the bank geometry and screen rotation, or a raw `.o`
//! image that is simply one bank of data. Anything at least 64 bytes long
//! loads; a header whose banks resolve to zero bytes of program data does
//! not.

use crate::video::Rotation;
use log::warn;

/// 64-byte `.lnx` header magic.
const LNX_MAGIC: &[u8; 4] = b"LYNX";

const HEADER_LEN: usize = 64;

/// Bytes per bank page.
const PAGE_SIZE: u32 = 256;

/// Errors that can occur when loading a ROM image.
#[derive(Debug)]
pub enum RomError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io(std::io::Error),

    /// The image is too small or describes no program data.
    InvalidRom(&'static str),
}

impl std::fmt::Display for RomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidRom(reason) => write!(f, "invalid ROM: {reason}"),
        }
    }
}

impl std::error::Error for RomError {}

impl From<std::io::Error> for RomError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// A parsed cartridge image: program bytes plus bank geometry and the
/// header metadata the console cares about.
pub struct RomImage {
    pub data: Vec<u8>,
    pub bank0_size: u32,
    pub bank1_size: u32,
    pub version: u16,
    pub name: String,
    pub manufacturer: String,
    pub rotation: Rotation,
}

impl RomImage {
    /// Parse an `.lnx` or raw `.o` byte image.
    pub fn parse(bytes: &[u8]) -> Result<Self, RomError> {
        if bytes.len() < HEADER_LEN {
            return Err(RomError::InvalidRom("file shorter than 64 bytes"));
        }

        if &bytes[0..4] != LNX_MAGIC {
            // Raw image: the whole file is bank 0
            return Ok(Self {
                data: bytes.to_vec(),
                bank0_size: bytes.len() as u32,
                bank1_size: 0,
                version: 0,
                name: String::new(),
                manufacturer: String::new(),
                rotation: Rotation::None,
            });
        }

        let data = bytes[HEADER_LEN..].to_vec();
        if data.is_empty() {
            return Err(RomError::InvalidRom("LNX header with no program data"));
        }

        let bank0_pages = u16::from_le_bytes([bytes[4], bytes[5]]) as u32;
        let bank1_pages = u16::from_le_bytes([bytes[6], bytes[7]]) as u32;
        let version = u16::from_le_bytes([bytes[8], bytes[9]]);
        let name = padded_string(&bytes[10..42]);
        let manufacturer = padded_string(&bytes[42..58]);
        let rotation = match bytes[58] {
            1 => Rotation::Left,
            2 => Rotation::Right,
            _ => Rotation::None,
        };

        let mut bank0_size = bank0_pages * PAGE_SIZE;
        let mut bank1_size = bank1_pages * PAGE_SIZE;
        if bank0_size == 0 && bank1_size == 0 {
            bank0_size = data.len() as u32;
        }
        if bank0_size as usize + bank1_size as usize > data.len() {
            warn!(
                "bank sizes exceed ROM ({} + {} > {}), clamping",
                bank0_size,
                bank1_size,
                data.len()
            );
            bank0_size = bank0_size.min(data.len() as u32);
            bank1_size = bank1_size.min(data.len() as u32 - bank0_size);
        }
        if bank0_size + bank1_size == 0 {
            return Err(RomError::InvalidRom("bank geometry selects no data"));
        }

        Ok(Self {
            data,
            bank0_size,
            bank1_size,
            version,
            name,
            manufacturer,
            rotation,
        })
    }
}

fn padded_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lnx_header(bank0_pages: u16, bank1_pages: u16, rotation: u8) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_LEN];
        h[0..4].copy_from_slice(LNX_MAGIC);
        h[4..6].copy_from_slice(&bank0_pages.to_le_bytes());
        h[6..8].copy_from_slice(&bank1_pages.to_le_bytes());
        h[10..14].copy_from_slice(b"Test");
        h[58] = rotation;
        h
    }

    #[test]
    fn rejects_short_file() {
        assert!(matches!(
            RomImage::parse(&[0u8; 32]),
            Err(RomError::InvalidRom(_))
        ));
    }

    #[test]
    fn rejects_header_without_data() {
        let h = lnx_header(1, 0, 0);
        assert!(matches!(
            RomImage::parse(&h),
            Err(RomError::InvalidRom(_))
        ));
    }

    #[test]
    fn parses_lnx_header() {
        let mut file = lnx_header(2, 1, 1);
        file.extend_from_slice(&vec![0xAA; 0x300]);
        let rom = RomImage::parse(&file).unwrap();
        assert_eq!(rom.bank0_size, 0x200);
        assert_eq!(rom.bank1_size, 0x100);
        assert_eq!(rom.name, "Test");
        assert_eq!(rom.rotation, Rotation::Left);
        assert_eq!(rom.data.len(), 0x300);
    }

    #[test]
    fn clamps_oversized_banks() {
        let mut file = lnx_header(4, 0, 0);
        file.extend_from_slice(&vec![0x55; 0x200]);
        let rom = RomImage::parse(&file).unwrap();
        assert_eq!(rom.bank0_size, 0x200);
        assert_eq!(rom.bank1_size, 0);
    }

    #[test]
    fn raw_image_is_one_bank() {
        let file = vec![0x42u8; 0x100];
        let rom = RomImage::parse(&file).unwrap();
        assert_eq!(rom.bank0_size, 0x100);
        assert_eq!(rom.bank1_size, 0);
        assert_eq!(rom.rotation, Rotation::None);
        assert_eq!(rom.data, file);
    }
}
