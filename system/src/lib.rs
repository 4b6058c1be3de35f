pub mod lynx;
pub mod rom;
pub mod video;

pub use lynx::{Lynx, CYCLES_PER_FRAME, FPS};
pub use rom::{RomError, RomImage};
pub use video::Rotation;
