//! In-memory simulated I2C bus.
//!
//! [`SimBus`] hosts register-file models of the supported devices so the
//! drivers and everything built on them can run on the host. Devices answer
//! the same register protocol as the hardware: a write sets the register
//! pointer (and stores any following bytes), a read returns consecutive
//! registers. Reading a device's data window clears its data-ready flag.
//!
//! The bus is single-threaded: share it by reference and hand out
//! [`SimI2c`] and [`SimPin`] handles.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::digital;
use embedded_hal_async::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::registers::{
    GYRO_OUT_LEN, GYRO_REG_OUT_X, GYRO_REG_WHO_AM_I, GYRO_SENSITIVITY_DPS, GYRO_WHO_AM_I,
    TEMP_CHANNEL_STRIDE, TEMP_FIXED_POINT_SCALE, TEMP_REG_CHIP_ID, TEMP_REG_DATA,
};
use crate::temp_sensor::ChipModel;

/// Maximum number of devices on one simulated bus.
pub const MAX_DEVICES: usize = 4;

/// Errors reported by the simulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimBusError {
    /// No device acknowledged the address.
    NoDevice(u8),
    /// A failure injected with [`SimBus::fail_next`].
    Injected,
    /// Every device slot is taken.
    BusFull,
}

impl core::fmt::Display for SimBusError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            SimBusError::NoDevice(addr) => write!(f, "no device at 0x{:02X}", addr),
            SimBusError::Injected => write!(f, "injected bus failure"),
            SimBusError::BusFull => write!(f, "no free device slot"),
        }
    }
}

impl core::error::Error for SimBusError {}

impl i2c::Error for SimBusError {
    fn kind(&self) -> ErrorKind {
        match self {
            SimBusError::NoDevice(_) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            SimBusError::Injected | SimBusError::BusFull => ErrorKind::Bus,
        }
    }
}

/// Register-file model of one device.
#[derive(Clone)]
pub struct SimDevice {
    address: u8,
    regs: [u8; 256],
    pointer: u8,
    data_start: u8,
    data_len: u8,
    drdy: bool,
}

impl SimDevice {
    /// A blank device whose data window is `data_len` bytes at `data_start`.
    pub fn new(address: u8, data_start: u8, data_len: u8) -> Self {
        Self {
            address,
            regs: [0; 256],
            pointer: 0,
            data_start,
            data_len,
            drdy: false,
        }
    }

    /// Environmental sensor answering with `model`'s chip id.
    pub fn temp_sensor(address: u8, model: ChipModel) -> Self {
        let window = model.channel_count() * TEMP_CHANNEL_STRIDE;
        let mut device = Self::new(address, TEMP_REG_DATA, window);
        device.set_register(TEMP_REG_CHIP_ID, model.chip_id());
        device
    }

    /// Gyroscope with the expected identity.
    pub fn gyro(address: u8) -> Self {
        let mut device = Self::new(address, GYRO_REG_OUT_X, GYRO_OUT_LEN as u8);
        device.set_register(GYRO_REG_WHO_AM_I, GYRO_WHO_AM_I);
        device
    }

    pub fn set_register(&mut self, register: u8, value: u8) {
        self.regs[register as usize] = value;
    }

    fn in_data_window(&self, register: u8) -> bool {
        let offset = register.wrapping_sub(self.data_start);
        offset < self.data_len
    }

    fn apply(&mut self, operations: &mut [Operation<'_>]) {
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((&pointer, data)) = bytes.split_first() {
                        self.pointer = pointer;
                        for &byte in data {
                            self.regs[self.pointer as usize] = byte;
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buffer) => {
                    let mut touched_data = false;
                    for slot in buffer.iter_mut() {
                        *slot = self.regs[self.pointer as usize];
                        touched_data |= self.in_data_window(self.pointer);
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                    if touched_data {
                        self.drdy = false;
                    }
                }
            }
        }
    }
}

/// Simulated shared I2C bus.
pub struct SimBus {
    devices: RefCell<[Option<SimDevice>; MAX_DEVICES]>,
    fail_next: Cell<Option<u8>>,
    yield_on_transfer: Cell<bool>,
    in_transfer: Cell<bool>,
    transfers: Cell<u32>,
    overlapping: Cell<u32>,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            devices: RefCell::new([const { None }; MAX_DEVICES]),
            fail_next: Cell::new(None),
            yield_on_transfer: Cell::new(false),
            in_transfer: Cell::new(false),
            transfers: Cell::new(0),
            overlapping: Cell::new(0),
        }
    }

    /// Attach a device. Fails with [`SimBusError::BusFull`] when every slot
    /// is taken.
    pub fn attach(&self, device: SimDevice) -> Result<(), SimBusError> {
        let mut devices = self.devices.borrow_mut();
        let slot = devices
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(SimBusError::BusFull)?;
        *slot = Some(device);
        Ok(())
    }

    /// A new I2C handle on this bus.
    pub fn i2c(&self) -> SimI2c<'_> {
        SimI2c { bus: self }
    }

    /// The data-ready line of the device at `address`.
    pub fn drdy_pin(&self, address: u8) -> SimPin<'_> {
        SimPin { bus: self, address }
    }

    /// Make every transfer suspend once before completing, so a reader is
    /// descheduled mid-transfer.
    pub fn set_yield_on_transfer(&self, enabled: bool) {
        self.yield_on_transfer.set(enabled);
    }

    /// Fail the next transaction addressed to `address`.
    pub fn fail_next(&self, address: u8) {
        self.fail_next.set(Some(address));
    }

    /// Value of a register, or `None` if no device answers at `address`.
    pub fn register(&self, address: u8, register: u8) -> Option<u8> {
        self.with_device(address, |device| device.regs[register as usize])
    }

    pub fn data_ready(&self, address: u8) -> bool {
        self.with_device(address, |device| device.drdy)
            .unwrap_or(false)
    }

    /// Store `bytes` starting at `register` and raise data-ready.
    pub fn latch_sample(&self, address: u8, register: u8, bytes: &[u8]) {
        self.with_device(address, |device| {
            let mut reg = register;
            for &byte in bytes {
                device.regs[reg as usize] = byte;
                reg = reg.wrapping_add(1);
            }
            device.drdy = true;
        });
    }

    /// Latch a new environmental sample: temperature (°C), pressure (Pa)
    /// and humidity (%RH). Channels the model lacks are still written but
    /// are never read.
    pub fn push_environment(&self, address: u8, values: [f32; 3]) {
        let mut bytes = [0u8; 3 * TEMP_CHANNEL_STRIDE as usize];
        for (chunk, value) in bytes.chunks_exact_mut(4).zip(values) {
            let raw = round_to_i32(value * TEMP_FIXED_POINT_SCALE);
            chunk.copy_from_slice(&raw.to_be_bytes());
        }
        self.latch_sample(address, TEMP_REG_DATA, &bytes);
    }

    /// Latch a new gyroscope sample in °/s (X, Y, Z).
    pub fn push_angular_rate(&self, address: u8, rates: [f32; 3]) {
        let mut bytes = [0u8; GYRO_OUT_LEN];
        for (chunk, rate) in bytes.chunks_exact_mut(2).zip(rates) {
            let raw = round_to_i32(rate / GYRO_SENSITIVITY_DPS) as i16;
            chunk.copy_from_slice(&raw.to_be_bytes());
        }
        self.latch_sample(address, GYRO_REG_OUT_X, &bytes);
    }

    /// Completed transactions.
    pub fn transfers(&self) -> u32 {
        self.transfers.get()
    }

    /// Transactions that started while another was still in progress.
    pub fn overlapping_transfers(&self) -> u32 {
        self.overlapping.get()
    }

    fn with_device<R>(&self, address: u8, f: impl FnOnce(&mut SimDevice) -> R) -> Option<R> {
        let mut devices = self.devices.borrow_mut();
        devices
            .iter_mut()
            .flatten()
            .find(|device| device.address == address)
            .map(f)
    }

    fn begin_transfer(&self) {
        if self.in_transfer.replace(true) {
            self.overlapping.set(self.overlapping.get() + 1);
        }
    }

    fn end_transfer(&self) {
        self.in_transfer.set(false);
        self.transfers.set(self.transfers.get() + 1);
    }

    fn execute(&self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), SimBusError> {
        if self.fail_next.get() == Some(address) {
            self.fail_next.set(None);
            return Err(SimBusError::Injected);
        }
        self.with_device(address, |device| device.apply(operations))
            .ok_or(SimBusError::NoDevice(address))
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

fn round_to_i32(value: f32) -> i32 {
    let half = if value < 0.0 { -0.5 } else { 0.5 };
    (value + half) as i32
}

/// I2C handle on a [`SimBus`].
pub struct SimI2c<'a> {
    bus: &'a SimBus,
}

impl ErrorType for SimI2c<'_> {
    type Error = SimBusError;
}

impl I2c for SimI2c<'_> {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.bus.begin_transfer();
        if self.bus.yield_on_transfer.get() {
            embassy_futures::yield_now().await;
        }
        let result = self.bus.execute(address, operations);
        self.bus.end_transfer();
        result
    }
}

/// Data-ready line of one simulated device.
pub struct SimPin<'a> {
    bus: &'a SimBus,
    address: u8,
}

impl digital::ErrorType for SimPin<'_> {
    type Error = Infallible;
}

impl digital::InputPin for SimPin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.bus.data_ready(self.address))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.bus.data_ready(self.address))
    }
}
