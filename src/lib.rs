//! Bit-banged driver for the SN76489 sound chip.
//!
//! The chip sits on an 8-bit data port plus a control port carrying nWE,
//! nCE (both active low) and READY. Every register write is a byte clocked
//! in with a short handshake under a critical section.
//!
//! # Example
//! ```no_run
//! use sn76489::{configure_ports, ControlPins, CortexM, Mmio8, Voice};
//!
//! # fn main() -> Result<(), sn76489::Error> {
//! // Direction and port registers of some 8-bit MCU.
//! let (data_dir, ctrl_dir, data, ctrl_in, ctrl_out) = unsafe {
//!     (
//!         Mmio8::new(0x0F92 as *mut u8),
//!         Mmio8::new(0x0F93 as *mut u8),
//!         Mmio8::new(0x0F89 as *mut u8),
//!         Mmio8::new(0x0F81 as *mut u8),
//!         Mmio8::new(0x0F8A as *mut u8),
//!     )
//! };
//!
//! let mut psg = configure_ports(data_dir, ctrl_dir, ControlPins::new(0, 1, 2))?
//!     .bind(data, ctrl_in, ctrl_out, CortexM)?;
//!
//! psg.tone_hz(Voice::One, 440)?;
//! psg.set_voice_attenuation(Voice::One, 0x0)?;
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod command;
pub mod error;
pub mod interrupt;
pub mod port;
pub mod sn76489;

pub use command::{frequency_divisor, tone_divisor, NoiseRate, NoiseType, Register, Voice};
pub use error::{Error, Result};
pub use interrupt::{CortexM, CriticalSection};
pub use port::{InputBank, Mmio8, OutputBank, Port};
pub use sn76489::*;
