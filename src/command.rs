//! Command byte encoding for the SN76489.
//!
//! Every write to the chip is one byte on the data bus. A "first" byte
//! (bit 0 set) selects one of eight registers and carries data for it; tone
//! registers take a second byte (bit 0 clear) with the remaining divisor bits.

/// Marker in bit 0 of a register-select byte.
pub const FIRST_BYTE: u8 = 0x01;
/// Marker in bit 0 of the trailing byte of a tone write.
pub const SECOND_BYTE: u8 = 0x00;

/// Highest attenuation level, the channel is silent.
pub const SILENT: u8 = 0x0F;
/// Lowest attenuation level, the channel plays at full volume.
pub const LOUDEST: u8 = 0x00;

const DIVISOR_MASK: u16 = 0x03FF;

/// One of the 8 registers (0-7) of the SN76489.
///
/// The codes are the 3-bit register-select field placed in bits 3:1 of a
/// first byte. Note that voices 2 and 3 are not in numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Tone divisor of voice 1 (10 bits over two bytes)
    Voice1Freq = 0,
    /// Tone divisor of voice 3
    Voice3Freq = 1,
    /// Tone divisor of voice 2
    Voice2Freq = 2,
    /// Noise type and shift rate
    NoiseCtrl = 3,
    /// Attenuation of voice 1 (4 bits)
    Voice1Attn = 4,
    /// Attenuation of voice 3
    Voice3Attn = 5,
    /// Attenuation of voice 2
    Voice2Attn = 6,
    /// Attenuation of the noise channel
    NoiseAttn = 7,
}

impl From<Register> for u8 {
    fn from(value: Register) -> Self {
        value as u8
    }
}

/// One of the 3 tone voices of the SN76489.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Voice {
    One,
    Two,
    Three,
}

impl Voice {
    pub const ALL: [Voice; 3] = [Voice::One, Voice::Two, Voice::Three];

    /// Register holding this voice's tone divisor.
    pub const fn frequency_register(self) -> Register {
        match self {
            Voice::One => Register::Voice1Freq,
            Voice::Two => Register::Voice2Freq,
            Voice::Three => Register::Voice3Freq,
        }
    }

    /// Register holding this voice's attenuation.
    pub const fn attenuation_register(self) -> Register {
        match self {
            Voice::One => Register::Voice1Attn,
            Voice::Two => Register::Voice2Attn,
            Voice::Three => Register::Voice3Attn,
        }
    }
}

/// Feedback mode of the noise generator (bit 5 of the control byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum NoiseType {
    /// Periodic noise, a buzz at 1/16 of the shift rate
    Periodic = 0,
    /// White noise
    White = 1,
}

/// Shift rate of the noise generator (bits 7:6 of the control byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum NoiseRate {
    /// Clock / 512, the fastest rate
    #[default]
    Div512 = 0,
    /// Clock / 1024
    Div1024 = 1,
    /// Clock / 2048
    Div2048 = 2,
    /// Follow the tone output of voice 3
    Voice3 = 3,
}

impl NoiseRate {
    /// Maps a raw 2-bit rate onto a hardware rate.
    ///
    /// Anything outside 0..=3 falls back to [`NoiseRate::Div512`].
    pub const fn from_bits(rate: u8) -> Self {
        match rate {
            1 => NoiseRate::Div1024,
            2 => NoiseRate::Div2048,
            3 => NoiseRate::Voice3,
            _ => NoiseRate::Div512,
        }
    }
}

/// Reference clock divided by `5 << shift`, truncated to the 10-bit tone
/// register width.
///
/// Overflow past 10 bits wraps silently, the same way the register would.
/// A shift too wide for `u32` yields 0.
pub const fn frequency_divisor(reference_clock: u32, shift: u32) -> u16 {
    match 5u32.checked_shl(shift) {
        Some(div) => (reference_clock / div) as u16 & DIVISOR_MASK,
        None => 0,
    }
}

/// Tone divisor that makes a voice play `hz` with a `master_clock` Hz chip
/// clock (`f = clock / (32 * N)`), truncated to 10 bits. 0 Hz gives 0.
pub const fn tone_divisor(master_clock: u32, hz: u32) -> u16 {
    match hz.checked_mul(32) {
        Some(0) | None => 0,
        Some(div) => (master_clock / div) as u16 & DIVISOR_MASK,
    }
}

/// Both bytes of a tone write: the low-bits byte first, then the high bits.
pub const fn tone_bytes(register: Register, divisor: u16) -> [u8; 2] {
    [
        ((divisor & 0x03C0) >> 2) as u8 | ((register as u8) << 1) | FIRST_BYTE,
        ((divisor & 0x001F) << 2) as u8 | SECOND_BYTE,
    ]
}

/// Single-byte attenuation write. `level` is masked to its 4 bits.
pub const fn attenuation_byte(register: Register, level: u8) -> u8 {
    ((level & 0x0F) << 4) | ((register as u8) << 1) | FIRST_BYTE
}

/// Noise control byte from typed fields.
pub const fn noise_control_byte(kind: NoiseType, rate: NoiseRate) -> u8 {
    raw_noise_control_byte(kind as u8, rate as u8)
}

/// Noise control byte with no filtering of its inputs.
///
/// Out-of-range `kind` or `rate` bits spill into neighbouring fields, which
/// is exactly what reaches the chip.
pub const fn raw_noise_control_byte(kind: u8, rate: u8) -> u8 {
    (rate << 6) | (kind << 5) | ((Register::NoiseCtrl as u8) << 1) | FIRST_BYTE
}
