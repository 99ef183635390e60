use crate::command::{self, NoiseRate, NoiseType, Register, Voice, SILENT};
use crate::error::{Error, Result};
use crate::interrupt::CriticalSection;
use crate::port::Port;

/// NTSC colour-burst crystal, the most common SN76489 clock.
pub const DEFAULT_MASTER_CLOCK: u32 = 3_579_545;

/// Bit positions of the control lines within the control port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlPins {
    /// nWE, active low
    pub write_enable: u8,
    /// nCE, active low
    pub chip_enable: u8,
    /// READY, active high input
    pub ready: u8,
}

impl ControlPins {
    pub const fn new(write_enable: u8, chip_enable: u8, ready: u8) -> Self {
        Self {
            write_enable,
            chip_enable,
            ready,
        }
    }

    fn validate(&self) -> Result<()> {
        let Self {
            write_enable: we,
            chip_enable: ce,
            ready,
        } = *self;

        if we > 7 || ce > 7 || ready > 7 || we == ce || we == ready || ce == ready {
            return Err(Error::InvalidConfiguration);
        }
        Ok(())
    }

    const fn write_enable_mask(&self) -> u8 {
        1 << self.write_enable
    }

    const fn chip_enable_mask(&self) -> u8 {
        1 << self.chip_enable
    }

    const fn ready_mask(&self) -> u8 {
        1 << self.ready
    }
}

/// How long a transfer waits for the chip to raise READY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadyWait {
    /// Spin until READY goes high, however long that takes.
    ///
    /// A chip that never raises READY hangs the caller.
    #[default]
    Unbounded,
    /// Sample READY at most this many times per wait, then fail with
    /// [`Error::HardwareTimeout`].
    Polls(u32),
}

/// Direction registers are set up and the pins are known; the chip ports
/// are not bound yet.
///
/// Returned by [`configure_ports`]; [`PortConfig::bind`] turns it into a
/// working [`Sn76489`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortConfig {
    pins: ControlPins,
    master_clock_frequency: u32,
    ready_wait: ReadyWait,
}

/// First configuration phase: pin directions.
///
/// Makes every data-direction bit an output (0), the nWE and nCE bits of
/// the control-direction register outputs and its READY bit an input (1).
/// Other control-direction bits keep their value.
///
/// Invalid pins leave both registers untouched.
pub fn configure_ports<D, C>(mut data_dir: D, mut ctrl_dir: C, pins: ControlPins) -> Result<PortConfig>
where
    D: Port,
    C: Port,
{
    pins.validate()?;

    data_dir.write(0x00);
    ctrl_dir.clear_bits(pins.write_enable_mask() | pins.chip_enable_mask());
    ctrl_dir.set_bits(pins.ready_mask());

    debug!(
        "sn76489: nWE={=u8} nCE={=u8} READY={=u8}",
        pins.write_enable,
        pins.chip_enable,
        pins.ready
    );

    Ok(PortConfig {
        pins,
        master_clock_frequency: DEFAULT_MASTER_CLOCK,
        ready_wait: ReadyWait::Unbounded,
    })
}

impl PortConfig {
    /// Frequency (in Hz) of the clock the chip is connected to.
    pub fn master_clock(self, hz: u32) -> Self {
        Self {
            master_clock_frequency: hz,
            ..self
        }
    }

    pub fn ready_wait(self, ready_wait: ReadyWait) -> Self {
        Self { ready_wait, ..self }
    }

    pub fn pins(&self) -> ControlPins {
        self.pins
    }

    /// Second configuration phase: bind the chip ports and silence it.
    ///
    /// Clears the data bus, drives every control line high (idle), then
    /// writes full attenuation to voices 1, 2, 3 and the noise channel.
    pub fn bind<DATA, CTRLR, CTRLW, CS>(
        self,
        data: DATA,
        ctrl_read: CTRLR,
        ctrl_write: CTRLW,
        interrupts: CS,
    ) -> Result<Sn76489<DATA, CTRLR, CTRLW, CS>>
    where
        DATA: Port,
        CTRLR: Port,
        CTRLW: Port,
        CS: CriticalSection,
    {
        let mut psg = Sn76489 {
            data,
            ctrl_read,
            ctrl_write,
            interrupts,
            pins: self.pins,
            master_clock_frequency: self.master_clock_frequency,
            ready_wait: self.ready_wait,
        };

        psg.data.write(0x00);
        psg.ctrl_write.write(0xFF);
        psg.mute_all()?;

        info!("sn76489: bound, clock {=u32} Hz", psg.master_clock_frequency);
        Ok(psg)
    }
}

/// A bit-banged SN76489 on an 8-bit data port and a control port.
pub struct Sn76489<DATA, CTRLR, CTRLW, CS>
where
    DATA: Port,
    CTRLR: Port,
    CTRLW: Port,
    CS: CriticalSection,
{
    data: DATA,
    ctrl_read: CTRLR,
    ctrl_write: CTRLW,
    interrupts: CS,
    pins: ControlPins,
    master_clock_frequency: u32,
    ready_wait: ReadyWait,
}

impl<DATA, CTRLR, CTRLW, CS> Sn76489<DATA, CTRLR, CTRLW, CS>
where
    DATA: Port,
    CTRLR: Port,
    CTRLW: Port,
    CS: CriticalSection,
{
    pub fn pins(&self) -> ControlPins {
        self.pins
    }

    pub fn master_clock_frequency(&self) -> u32 {
        self.master_clock_frequency
    }

    /// Writes the 10-bit tone divisor of `voice`.
    ///
    /// The chip latches the low-bits byte first, so the order is fixed.
    pub fn set_voice_frequency(&mut self, voice: Voice, divisor: u16) -> Result<()> {
        let [first, second] = command::tone_bytes(voice.frequency_register(), divisor);
        self.write_byte(first)?;
        self.write_byte(second)
    }

    /// Tunes `voice` to roughly `hz`, using the configured master clock.
    pub fn tone_hz(&mut self, voice: Voice, hz: u32) -> Result<()> {
        let divisor = command::tone_divisor(self.master_clock_frequency, hz);
        self.set_voice_frequency(voice, divisor)
    }

    /// Sets the attenuation of `voice`: 0 is loudest, 0xF is silent.
    pub fn set_voice_attenuation(&mut self, voice: Voice, level: u8) -> Result<()> {
        self.write_attenuation(voice.attenuation_register(), level)
    }

    /// Sets the attenuation of the noise channel: 0 is loudest, 0xF is silent.
    pub fn set_noise_attenuation(&mut self, level: u8) -> Result<()> {
        self.write_attenuation(Register::NoiseAttn, level)
    }

    pub fn set_noise_control(&mut self, kind: NoiseType, rate: NoiseRate) -> Result<()> {
        self.write_byte(command::noise_control_byte(kind, rate))
    }

    /// Writes the noise control register without checking `kind` (1 bit)
    /// or `rate` (2 bits). Wider values corrupt the neighbouring fields.
    ///
    /// Use [`NoiseRate::from_bits`] to clamp a raw rate.
    pub fn set_noise_control_raw(&mut self, kind: u8, rate: u8) -> Result<()> {
        self.write_byte(command::raw_noise_control_byte(kind, rate))
    }

    /// Fully attenuates the three voices and the noise channel.
    pub fn mute_all(&mut self) -> Result<()> {
        for voice in Voice::ALL {
            self.set_voice_attenuation(voice, SILENT)?;
        }
        self.set_noise_attenuation(SILENT)
    }

    /// Gives the ports and the critical section back.
    pub fn release(self) -> (DATA, CTRLR, CTRLW, CS) {
        (self.data, self.ctrl_read, self.ctrl_write, self.interrupts)
    }

    fn write_attenuation(&mut self, register: Register, level: u8) -> Result<()> {
        self.write_byte(command::attenuation_byte(register, level))
    }

    /// Clocks one byte into the chip.
    ///
    /// The whole handshake runs with interrupts masked. READY is sampled
    /// before selecting the chip and again after the write strobe; the
    /// control lines always end up deasserted.
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        let Self {
            data,
            ctrl_read,
            ctrl_write,
            interrupts,
            pins,
            ready_wait,
            ..
        } = self;
        let (ce, we) = (pins.chip_enable_mask(), pins.write_enable_mask());
        let (ready, wait) = (pins.ready, *ready_wait);

        trace!("sn76489: write {=u8:#x}", byte);

        let result = interrupts.with(|| -> Result<()> {
            wait_ready(ctrl_read, ready, wait)?;

            ctrl_write.clear_bits(ce);
            data.write(byte);
            ctrl_write.clear_bits(we);

            let latched = wait_ready(ctrl_read, ready, wait);

            ctrl_write.set_bits(ce);
            ctrl_write.set_bits(we);
            latched
        });

        if result.is_err() {
            warn!("sn76489: READY timeout writing {=u8:#x}", byte);
        }
        result
    }
}

fn wait_ready<P: Port>(port: &mut P, ready: u8, wait: ReadyWait) -> Result<()> {
    match wait {
        ReadyWait::Unbounded => {
            while !port.bit_is_high(ready) {
                core::hint::spin_loop();
            }
            Ok(())
        }
        ReadyWait::Polls(limit) => {
            for _ in 0..limit {
                if port.bit_is_high(ready) {
                    return Ok(());
                }
                core::hint::spin_loop();
            }
            Err(Error::HardwareTimeout)
        }
    }
}
