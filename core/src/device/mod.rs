pub mod audio;
pub mod cartridge;
pub mod eeprom;
pub mod mikey;
pub mod suzy;

pub use audio::Audio;
pub use cartridge::Cartridge;
pub use eeprom::{Eeprom93cxx, EepromKind};
pub use mikey::Mikey;
pub use suzy::Suzy;
