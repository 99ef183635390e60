//! Byte-wide I/O ports.
//!
//! The driver never touches hardware directly. Every register it needs
//! (direction registers, the data bus, the control latch and the control
//! input) is a [`Port`], so the same driver runs against memory-mapped
//! registers, banks of `embedded-hal` pins, or a simulated chip on the host.
use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use PinState::{High, Low};

/// An 8-bit register with bit-level access.
pub trait Port {
    fn read(&mut self) -> u8;

    fn write(&mut self, value: u8);

    /// Sets every bit that is set in `mask`, leaving the others untouched.
    fn set_bits(&mut self, mask: u8) {
        let value = self.read();
        self.write(value | mask);
    }

    /// Clears every bit that is set in `mask`, leaving the others untouched.
    fn clear_bits(&mut self, mask: u8) {
        let value = self.read();
        self.write(value & !mask);
    }

    /// Whether bit `index` currently reads high.
    fn bit_is_high(&mut self, index: u8) -> bool {
        (self.read() >> index) & 1 == 1
    }
}

/// A plain byte acts as a register with no side effects.
///
/// Handy for direction registers on platforms where pin direction is fixed
/// by the pin type.
impl Port for u8 {
    fn read(&mut self) -> u8 {
        *self
    }

    fn write(&mut self, value: u8) {
        *self = value;
    }
}

impl<P: Port + ?Sized> Port for &mut P {
    fn read(&mut self) -> u8 {
        P::read(self)
    }

    fn write(&mut self, value: u8) {
        P::write(self, value)
    }
}

/// A memory-mapped 8-bit register accessed with volatile reads and writes.
pub struct Mmio8 {
    addr: *mut u8,
}

impl Mmio8 {
    /// # Safety
    ///
    /// `addr` must be a valid, aligned, 8-bit device register for the whole
    /// lifetime of the returned value, and nothing else may write it
    /// concurrently.
    pub const unsafe fn new(addr: *mut u8) -> Self {
        Self { addr }
    }
}

impl Port for Mmio8 {
    fn read(&mut self) -> u8 {
        // SAFETY: validity of `addr` is guaranteed by the caller of `new`.
        unsafe { core::ptr::read_volatile(self.addr) }
    }

    fn write(&mut self, value: u8) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(self.addr, value) }
    }
}

/// Up to eight output pins driven as one byte, bit 0 first.
///
/// Missing pins (`None`) ignore their bit. Reads return the last value
/// written, like an output latch.
pub struct OutputBank<P> {
    pins: [Option<P>; 8],
    latch: u8,
}

impl<P> OutputBank<P>
where
    P: OutputPin<Error = Infallible>,
{
    pub fn new(pins: [Option<P>; 8]) -> Self {
        Self { pins, latch: 0 }
    }

    /// A full 8-bit bus, D0 (LSB) to D7 (MSB).
    pub fn from_bus(pins: [P; 8]) -> Self {
        Self::new(pins.map(Some))
    }

    /// Hands the pins back.
    pub fn release(self) -> [Option<P>; 8] {
        self.pins
    }
}

impl<P> Port for OutputBank<P>
where
    P: OutputPin<Error = Infallible>,
{
    fn read(&mut self) -> u8 {
        self.latch
    }

    fn write(&mut self, data: u8) {
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            if let Some(pin) = pin {
                let state = if (data >> bit) & 1 == 1 { High } else { Low };
                let _ = pin.set_state(state);
            }
        }
        self.latch = data;
    }
}

/// Up to eight input pins sampled as one byte. Missing pins read low.
pub struct InputBank<P> {
    pins: [Option<P>; 8],
}

impl<P> InputBank<P>
where
    P: InputPin<Error = Infallible>,
{
    pub fn new(pins: [Option<P>; 8]) -> Self {
        Self { pins }
    }

    /// A bank with a single pin wired to bit `index`.
    ///
    /// # Panics
    ///
    /// If `index` is greater than 7.
    pub fn single(index: u8, pin: P) -> Self {
        let mut pins: [Option<P>; 8] = core::array::from_fn(|_| None);
        pins[index as usize] = Some(pin);
        Self { pins }
    }

    /// Hands the pins back.
    pub fn release(self) -> [Option<P>; 8] {
        self.pins
    }
}

impl<P> Port for InputBank<P>
where
    P: InputPin<Error = Infallible>,
{
    fn read(&mut self) -> u8 {
        let mut value = 0;
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            if let Some(pin) = pin {
                if pin.is_high().unwrap_or(false) {
                    value |= 1 << bit;
                }
            }
        }
        value
    }

    /// Input pins cannot be driven.
    fn write(&mut self, _value: u8) {}
}
