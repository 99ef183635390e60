//! Raspberry Pi Pico demo: plays a scale and a noise burst on an SN76489.
//!
//! Wiring:
//! - GPIO0: chip clock (PWM, sys_clk / 32, about 3.9 MHz)
//! - GPIO1..GPIO8: D0 (LSB) to D7 (MSB)
//! - GPIO9: nWE
//! - GPIO10: nCE
//! - GPIO11: READY (pulled up)
#![no_std]
#![no_main]

// Bootloader
use rp2040_boot2;
#[link_section = ".boot2"]
#[used]
pub static BOOT_LOADER: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;

// Deps
use defmt::{info, unwrap};
use defmt_rtt as _;
use panic_probe as _;

use embedded_hal::{delay::DelayNs, digital::OutputPin, pwm::SetDutyCycle};
use rp2040_hal::{self as hal, Clock};

use hal::{clocks::init_clocks_and_plls, pac, sio::Sio, watchdog::Watchdog};

use sn76489::{
    configure_ports, ControlPins, CortexM, InputBank, NoiseRate, NoiseType, OutputBank, Voice,
};

/// C major, one octave up from middle C.
const SCALE_HZ: [u32; 8] = [262, 294, 330, 349, 392, 440, 494, 523];

// Bit positions on the two control "ports" assembled from single pins.
const N_WE: u8 = 0;
const N_CE: u8 = 1;
const READY: u8 = 2;

#[hal::entry]
fn main() -> ! {
    let mut pac = unwrap!(pac::Peripherals::take());
    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let sio = Sio::new(pac.SIO);

    let external_xtal_freq_hz = 12_000_000u32;
    let clocks = unwrap!(init_clocks_and_plls(
        external_xtal_freq_hz,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok());

    let mut timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    // Sign of life
    let mut led = pins.gpio25.into_push_pull_output();
    let _ = led.set_high();

    // Chip clock: sys_clk / (1 * (31 + 1)), 50% duty
    let master_clock_freq = clocks.system_clock.freq().to_Hz() / 32;
    let mut pwm_slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
    let pwm = &mut pwm_slices.pwm0;
    pwm.set_div_int(1);
    pwm.set_div_frac(0);
    pwm.set_top(31);
    pwm.enable();

    let channel = &mut pwm.channel_a;
    channel.output_to(pins.gpio0);
    let _ = channel.set_duty_cycle_fraction(1, 2);

    let data_bus = OutputBank::from_bus([
        pins.gpio1.into_push_pull_output().into_dyn_pin(),
        pins.gpio2.into_push_pull_output().into_dyn_pin(),
        pins.gpio3.into_push_pull_output().into_dyn_pin(),
        pins.gpio4.into_push_pull_output().into_dyn_pin(),
        pins.gpio5.into_push_pull_output().into_dyn_pin(),
        pins.gpio6.into_push_pull_output().into_dyn_pin(),
        pins.gpio7.into_push_pull_output().into_dyn_pin(),
        pins.gpio8.into_push_pull_output().into_dyn_pin(),
    ]);

    let control_out = OutputBank::new([
        Some(pins.gpio9.into_push_pull_output().into_dyn_pin()),
        Some(pins.gpio10.into_push_pull_output().into_dyn_pin()),
        None,
        None,
        None,
        None,
        None,
        None,
    ]);
    let control_in = InputBank::single(READY, pins.gpio11.into_pull_up_input());

    // Pin directions are fixed by the pin types above; plain bytes stand in
    // for the direction registers.
    let psg = configure_ports(0u8, 0u8, ControlPins::new(N_WE, N_CE, READY))
        .map(|config| config.master_clock(master_clock_freq))
        .and_then(|config| config.bind(data_bus, control_in, control_out, CortexM));
    let mut psg = unwrap!(psg);

    info!("SN76489 ready, clock {=u32} Hz", master_clock_freq);

    loop {
        for hz in SCALE_HZ {
            unwrap!(psg.tone_hz(Voice::One, hz));
            // Pluck: start loud, fade out over 15 steps
            for level in 0..=0xF {
                unwrap!(psg.set_voice_attenuation(Voice::One, level));
                timer.delay_ms(20);
            }
        }

        unwrap!(psg.set_noise_control(NoiseType::White, NoiseRate::Div1024));
        for level in 0..=0xF {
            unwrap!(psg.set_noise_attenuation(level));
            timer.delay_ms(30);
        }

        unwrap!(psg.mute_all());
        timer.delay_ms(500);
    }
}
