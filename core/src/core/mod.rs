pub mod bus;
pub mod machine;
pub mod savestate;

pub use bus::Bus;
pub use machine::{AudioSink, InputButton, Machine};
pub use savestate::{StateError, StateReader, StateWriter};
