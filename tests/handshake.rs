//! Drives the driver against a simulated SN76489 bus and checks the
//! handshake edge by edge.
use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use sn76489::{
    configure_ports, ControlPins, CriticalSection, Error, Port, ReadyWait, Sn76489, Voice,
};

const WE: u8 = 3;
const CE: u8 = 4;
const READY: u8 = 6;

/// Control port bits that do not belong to the chip.
const OTHER_BITS: u8 = !((1 << WE) | (1 << CE) | (1 << READY));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Mask,
    Unmask,
    Ready(bool),
    ChipEnable(bool),
    WriteEnable(bool),
    Data(u8),
}

use Event::*;

/// Only asserts ready-low for a few polls after each accepted byte, unless
/// told to stall.
#[derive(Default)]
struct Chip {
    events: Vec<Event>,
    latched: Vec<u8>,
    masked: bool,
    unmasks: u32,
    unmasked_activity: u32,
    control: u8,
    data: u8,
    busy_polls: u32,
    /// READY never rises again
    stalled: bool,
    /// READY stays low forever once the next byte is strobed
    stall_on_latch: bool,
}

impl Chip {
    fn ready(&mut self) -> bool {
        if self.stalled {
            return false;
        }
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            return false;
        }
        true
    }

    fn selected(&self) -> bool {
        self.control & (1 << CE) == 0
    }

    fn check_masked(&mut self) {
        if !self.masked {
            self.unmasked_activity += 1;
        }
    }
}

type Shared = Rc<RefCell<Chip>>;

/// A chip with its control lines idle and READY high.
fn idle_chip() -> Shared {
    Rc::new(RefCell::new(Chip {
        control: 0xFF,
        ..Chip::default()
    }))
}

struct DataPort(Shared);
struct ControlIn(Shared);
struct ControlOut(Shared);
struct Interrupts(Shared);

impl Port for DataPort {
    fn read(&mut self) -> u8 {
        self.0.borrow().data
    }

    fn write(&mut self, value: u8) {
        let mut chip = self.0.borrow_mut();
        if chip.selected() {
            chip.check_masked();
        }
        chip.data = value;
        chip.events.push(Data(value));
    }
}

impl Port for ControlIn {
    fn read(&mut self) -> u8 {
        let mut chip = self.0.borrow_mut();
        chip.check_masked();
        let ready = chip.ready();
        chip.events.push(Ready(ready));
        // Unrelated inputs float high.
        OTHER_BITS | if ready { 1 << READY } else { 0 }
    }

    fn write(&mut self, _value: u8) {
        panic!("write to the control input port");
    }
}

impl Port for ControlOut {
    fn read(&mut self) -> u8 {
        self.0.borrow().control
    }

    fn write(&mut self, value: u8) {
        let mut chip = self.0.borrow_mut();
        let old = chip.control;
        chip.control = value;

        let changed = old ^ value;
        if changed & (1 << CE) != 0 {
            chip.check_masked();
            chip.events.push(ChipEnable(value & (1 << CE) == 0));
        }
        if changed & (1 << WE) != 0 {
            chip.check_masked();
            let asserted = value & (1 << WE) == 0;
            chip.events.push(WriteEnable(asserted));
            if asserted && chip.selected() {
                let byte = chip.data;
                chip.latched.push(byte);
                chip.busy_polls = 2;
                if chip.stall_on_latch {
                    chip.stalled = true;
                }
            }
        }
    }
}

impl CriticalSection for Interrupts {
    fn with<R>(&mut self, f: impl FnOnce() -> R) -> R {
        {
            let mut chip = self.0.borrow_mut();
            assert!(!chip.masked, "critical section entered twice");
            chip.masked = true;
            chip.events.push(Mask);
        }
        let r = f();
        let mut chip = self.0.borrow_mut();
        chip.masked = false;
        chip.unmasks += 1;
        chip.events.push(Unmask);
        r
    }
}

type SimPsg = Sn76489<DataPort, ControlIn, ControlOut, Interrupts>;

fn bind(chip: &Shared, wait: ReadyWait) -> Result<SimPsg, Error> {
    let mut data_dir: u8 = 0xFF;
    let mut ctrl_dir: u8 = 0x00;
    configure_ports(&mut data_dir, &mut ctrl_dir, ControlPins::new(WE, CE, READY))?
        .ready_wait(wait)
        .bind(
            DataPort(chip.clone()),
            ControlIn(chip.clone()),
            ControlOut(chip.clone()),
            Interrupts(chip.clone()),
        )
}

/// Everything one transfer of `byte` should do on a chip that is idle
/// before the strobe.
fn transfer(byte: u8) -> Vec<Event> {
    vec![
        Mask,
        Ready(true),
        ChipEnable(true),
        Data(byte),
        WriteEnable(true),
        Ready(false),
        Ready(false),
        Ready(true),
        ChipEnable(false),
        WriteEnable(false),
        Unmask,
    ]
}

#[test]
fn test_bind_mutes_every_channel() {
    let chip = idle_chip();
    let _psg = bind(&chip, ReadyWait::Unbounded).unwrap();

    let chip = chip.borrow();
    assert_eq!(chip.latched, [0xF9, 0xFD, 0xFB, 0xFF]);
    assert!(chip.latched.iter().all(|byte| byte & 0x01 == 0x01));
    assert_eq!(chip.control, 0xFF);
    assert_eq!(chip.unmasks, 4);
}

#[test]
fn test_bind_clears_bus_before_first_transfer() {
    let chip = idle_chip();
    let _psg = bind(&chip, ReadyWait::Unbounded).unwrap();

    let expected: Vec<Event> = [Data(0x00)]
        .into_iter()
        .chain(transfer(0xF9))
        .chain(transfer(0xFD))
        .chain(transfer(0xFB))
        .chain(transfer(0xFF))
        .collect();
    let chip = chip.borrow();
    assert_eq!(chip.events, expected);
    assert_eq!(chip.unmasked_activity, 0);
}

#[test]
fn test_handshake_step_order() {
    let chip = idle_chip();
    let mut psg = bind(&chip, ReadyWait::Unbounded).unwrap();
    chip.borrow_mut().events.clear();

    psg.set_voice_frequency(Voice::One, 0x155).unwrap();

    let chip = chip.borrow();
    let expected: Vec<Event> = transfer(0x51).into_iter().chain(transfer(0x54)).collect();
    assert_eq!(chip.events, expected);
    assert_eq!(&chip.latched[4..], [0x51, 0x54]);
    assert_eq!(chip.unmasked_activity, 0);
    assert!(!chip.masked);
}

#[test]
fn test_waits_for_busy_chip_before_selecting() {
    let chip = idle_chip();
    let mut psg = bind(&chip, ReadyWait::Unbounded).unwrap();
    {
        let mut chip = chip.borrow_mut();
        chip.events.clear();
        chip.busy_polls = 3;
    }

    psg.set_noise_control_raw(1, 2).unwrap();

    let byte = (2 << 6) | (1 << 5) | (3 << 1) | 1;
    let chip = chip.borrow();
    assert_eq!(
        &chip.events[..5],
        [Mask, Ready(false), Ready(false), Ready(false), Ready(true)]
    );
    assert_eq!(&chip.events[5..], &transfer(byte)[2..]);
    assert_eq!(chip.latched.last(), Some(&byte));
    assert_eq!(chip.unmasked_activity, 0);
}

#[test]
fn test_other_control_bits_untouched() {
    let chip = idle_chip();
    let mut psg = bind(&chip, ReadyWait::Unbounded).unwrap();
    // Some other peripheral pulls bit 0 of the shared port low.
    chip.borrow_mut().control = 0xFE;

    psg.set_voice_attenuation(Voice::Three, 0x4).unwrap();
    psg.tone_hz(Voice::Two, 440).unwrap();

    assert_eq!(chip.borrow().control, 0xFE);
    assert_eq!(chip.borrow().latched.len(), 4 + 3);
}

#[test]
fn test_stalled_chip_times_out_before_selecting() {
    let chip = idle_chip();
    let mut psg = bind(&chip, ReadyWait::Polls(8)).unwrap();
    {
        let mut chip = chip.borrow_mut();
        chip.events.clear();
        chip.stalled = true;
    }

    let result = psg.set_voice_attenuation(Voice::Two, 0x0);

    assert_eq!(result, Err(Error::HardwareTimeout));
    let chip = chip.borrow();
    let mut expected = vec![Mask];
    expected.extend([Ready(false); 8]);
    expected.push(Unmask);
    assert_eq!(chip.events, expected);
    assert_eq!(chip.latched.len(), 4);
    assert_eq!(chip.control, 0xFF);
}

#[test]
fn test_stall_after_strobe_releases_lines() {
    let chip = idle_chip();
    let mut psg = bind(&chip, ReadyWait::Polls(8)).unwrap();
    {
        let mut chip = chip.borrow_mut();
        chip.events.clear();
        chip.stall_on_latch = true;
    }

    let result = psg.set_voice_frequency(Voice::Three, 0x200);

    // The first byte is latched, the second is never attempted.
    assert_eq!(result, Err(Error::HardwareTimeout));
    let chip = chip.borrow();
    assert_eq!(&chip.latched[4..], [0x83]);
    assert_eq!(chip.control, 0xFF);
    assert!(!chip.masked);
    assert_eq!(chip.events.first(), Some(&Mask));
    assert_eq!(
        &chip.events[chip.events.len() - 3..],
        [ChipEnable(false), WriteEnable(false), Unmask]
    );
    assert_eq!(chip.unmasks, 5);
}

#[test]
fn test_configuration_rejected_without_bus_activity() {
    let mut data_dir: u8 = 0x12;
    let mut ctrl_dir: u8 = 0x34;

    let result = configure_ports(&mut data_dir, &mut ctrl_dir, ControlPins::new(WE, WE, READY));

    assert_eq!(result, Err(Error::InvalidConfiguration));
    assert_eq!((data_dir, ctrl_dir), (0x12, 0x34));
}
