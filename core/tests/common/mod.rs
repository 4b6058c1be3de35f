use lynx_core::core::Bus;

/// Minimal bus for testing: flat 64KB read/write memory, no peripherals,
/// and a directly drivable IRQ line.
pub struct TestBus {
    pub memory: Box<[u8; 0x10000]>,
    pub irq: bool,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            irq: false,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn peek(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn irq_pending(&self) -> bool {
        self.irq
    }
}
