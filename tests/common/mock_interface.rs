//! Mock interface implementation for testing the IAM-20380 driver

use device_driver::RegisterInterface;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// `GYRO_XOUT_H`; reading it latches the next sample of a configured sequence
const GYRO_XOUT_H: u8 = 0x43;

/// `GYRO_CONFIG`; the top three bits enable self-test
const GYRO_CONFIG: u8 = 0x1B;
const SELF_TEST_BITS: u8 = 0xE0;

/// Records operations performed on the mock interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Read register operation
    ReadRegister {
        /// Register address
        address: u8,
        /// Value that was returned
        value: u8,
    },
    /// Write register operation
    WriteRegister {
        /// Register address
        address: u8,
        /// Value that was written
        value: u8,
    },
}

/// Shared state for mock interface (uses interior mutability)
#[derive(Debug)]
struct MockState {
    /// Simulated register values
    registers: HashMap<u8, u8>,

    /// Operations log for verification
    operations: Vec<Operation>,

    /// Failure injection flags
    fail_next_read: bool,
    fail_next_write: bool,
    /// Fail the acquisition that would serve sample number N (0-based)
    fail_at_sample: Option<usize>,

    /// Raw samples `[x, y, z, temperature]`, served in order and repeated
    sample_sequence: Vec<[i16; 4]>,
    sample_sequence_idx: usize,
    samples_served: usize,

    /// Added to the gyro outputs while all self-test bits are set
    self_test_response: [i16; 3],
}

impl MockState {
    fn new() -> Self {
        let mut state = Self {
            registers: HashMap::new(),
            operations: Vec::new(),
            fail_next_read: false,
            fail_next_write: false,
            fail_at_sample: None,
            sample_sequence: Vec::new(),
            sample_sequence_idx: 0,
            samples_served: 0,
            self_test_response: [0; 3],
        };

        // Set default WHO_AM_I value (0xFA)
        state.registers.insert(0x75, 0xFA);

        state
    }

    fn register(&self, address: u8) -> u8 {
        self.registers.get(&address).copied().unwrap_or(0)
    }

    fn self_test_enabled(&self) -> bool {
        self.register(GYRO_CONFIG) & SELF_TEST_BITS == SELF_TEST_BITS
    }

    /// Latch the next sample into the output registers
    fn advance_sample_sequence(&mut self) {
        if self.sample_sequence.is_empty() {
            return;
        }
        let [x, y, z, t] = self.sample_sequence[self.sample_sequence_idx];
        let [dx, dy, dz] = if self.self_test_enabled() {
            self.self_test_response
        } else {
            [0; 3]
        };
        self.set_gyro_data(x.saturating_add(dx), y.saturating_add(dy), z.saturating_add(dz));
        self.set_temperature_data(t);
        self.sample_sequence_idx = (self.sample_sequence_idx + 1) % self.sample_sequence.len();
    }

    fn set_word(&mut self, address: u8, value: i16) {
        let [high, low] = value.to_be_bytes();
        self.registers.insert(address, high);
        self.registers.insert(address + 1, low);
    }

    /// Set gyroscope data (will be returned on next read)
    fn set_gyro_data(&mut self, x: i16, y: i16, z: i16) {
        self.set_word(0x43, x);
        self.set_word(0x45, y);
        self.set_word(0x47, z);
    }

    /// Set temperature data (will be returned on next read)
    fn set_temperature_data(&mut self, temp_raw: i16) {
        self.set_word(0x41, temp_raw);
    }
}

/// Mock interface for testing
///
/// Clones share register state. Every dropped instance is counted, so a test
/// holding one clone can tell when the driver released its copy.
#[derive(Clone)]
pub struct MockInterface {
    state: Rc<RefCell<MockState>>,
    drops: Rc<Cell<usize>>,
}

impl MockInterface {
    /// Create a new mock interface with default register values
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::new())),
            drops: Rc::new(Cell::new(0)),
        }
    }

    /// Set a register value
    pub fn set_register(&self, address: u8, value: u8) {
        self.state.borrow_mut().registers.insert(address, value);
    }

    /// Get a register value
    pub fn get_register(&self, address: u8) -> u8 {
        self.state.borrow().register(address)
    }

    /// Set `WHO_AM_I` register value
    pub fn set_who_am_i(&self, value: u8) {
        self.set_register(0x75, value);
    }

    /// Set factory trim codes for X, Y and Z
    pub fn set_factory_trim(&self, codes: [u8; 3]) {
        for (address, code) in (0x00..).zip(codes) {
            self.set_register(address, code);
        }
    }

    /// Set a sequence of raw samples `[x, y, z, temperature]`
    ///
    /// Each read of `GYRO_XOUT_H` latches the next entry; the sequence repeats.
    pub fn set_sample_sequence(&self, sequence: Vec<[i16; 4]>) {
        let mut state = self.state.borrow_mut();
        state.sample_sequence = sequence;
        state.sample_sequence_idx = 0;
    }

    /// Offset added to the gyro outputs while self-test is enabled
    pub fn set_self_test_response(&self, response: [i16; 3]) {
        self.state.borrow_mut().self_test_response = response;
    }

    /// Inject a read failure on the next read operation
    pub fn fail_next_read(&self) {
        self.state.borrow_mut().fail_next_read = true;
    }

    /// Inject a write failure on the next write operation
    pub fn fail_next_write(&self) {
        self.state.borrow_mut().fail_next_write = true;
    }

    /// Fail the acquisition of sample `index` (0-based) at its first byte
    pub fn fail_at_sample(&self, index: usize) {
        self.state.borrow_mut().fail_at_sample = Some(index);
    }

    /// Number of samples latched so far
    pub fn samples_served(&self) -> usize {
        self.state.borrow().samples_served
    }

    /// Get the operations log
    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    /// Writes in the operations log, as `(address, value)`
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.state
            .borrow()
            .operations
            .iter()
            .filter_map(|op| match *op {
                Operation::WriteRegister { address, value } => Some((address, value)),
                Operation::ReadRegister { .. } => None,
            })
            .collect()
    }

    /// Clear the operations log
    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    /// Number of interface instances dropped so far
    pub fn drop_count(&self) -> usize {
        self.drops.get()
    }
}

impl Drop for MockInterface {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

/// Mock error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    /// Simulated communication error
    Communication,
}

impl RegisterInterface for MockInterface {
    type Error = MockError;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        // Check for injected failure
        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(MockError::Communication);
        }

        // Reading the first gyro byte starts a new acquisition
        if address == GYRO_XOUT_H {
            if state.fail_at_sample == Some(state.samples_served) {
                state.fail_at_sample = None;
                return Err(MockError::Communication);
            }
            state.advance_sample_sequence();
            state.samples_served += 1;
        }

        for (reg_addr, byte) in (address..).zip(read_data.iter_mut()) {
            *byte = state.register(reg_addr);
            state.operations.push(Operation::ReadRegister {
                address: reg_addr,
                value: *byte,
            });
        }

        Ok(())
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        // Check for injected failure
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(MockError::Communication);
        }

        for (reg_addr, &byte) in (address..).zip(write_data) {
            state.registers.insert(reg_addr, byte);
            state.operations.push(Operation::WriteRegister {
                address: reg_addr,
                value: byte,
            });
        }

        Ok(())
    }
}

impl Default for MockInterface {
    fn default() -> Self {
        Self::new()
    }
}
