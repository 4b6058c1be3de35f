// Re-export state types
pub mod state;
pub use state::Wdc65c02State;

// WDC 65C02 (the CPU inside Mikey)
pub mod wdc65c02;
pub use wdc65c02::{StatusFlag, StopState, Wdc65c02};
