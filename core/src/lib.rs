pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::machine::{AudioSink, InputButton, Machine};
    pub use crate::core::savestate::{StateError, StateReader, StateWriter};
    pub use crate::core::Bus;
    pub use crate::cpu::Wdc65c02;
}
