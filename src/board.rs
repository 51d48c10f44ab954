//! Terminal board operations: jump to the bootloader or restart the
//! application. Neither returns.

use crate::clock::{spin, CpuFrequency};
use crate::config::{BOOTLOADER_ADDRESS, REBOOT_DETACH_SETTLE_US, REBOOT_WATCHDOG_SETTLE_US};

/// Settle time between disabling peripherals and jumping (µs).
const RESTART_SETTLE_US: u16 = 15_000;

/// Board-level hooks the terminal sequences are built from.
pub trait Board {
    fn disable_interrupts(&mut self);
    fn stop_watchdog(&mut self);
    /// Disconnect from the bus so the host sees the device leave.
    fn detach_usb(&mut self);
    /// Put timers, serial ports and the ADC back into their reset state.
    fn disable_peripherals(&mut self);
    /// Transfer control to `address`.
    fn jump(&mut self, address: u32) -> !;
}

/// Hand control to the resident bootloader.
///
/// Delays use the interrupt-free busy loop, as interrupts are off by then.
pub fn reboot<B: Board>(board: &mut B, freq: CpuFrequency) -> ! {
    info!("board: rebooting into bootloader");
    board.disable_interrupts();
    board.stop_watchdog();
    spin::delay_microseconds(freq, REBOOT_WATCHDOG_SETTLE_US);
    board.detach_usb();
    spin::delay_microseconds(freq, REBOOT_DETACH_SETTLE_US);
    board.disable_peripherals();
    board.jump(BOOTLOADER_ADDRESS)
}

/// Restart the application from its reset vector. USB stays attached.
pub fn restart<B: Board>(board: &mut B, freq: CpuFrequency) -> ! {
    info!("board: restarting");
    board.disable_interrupts();
    board.disable_peripherals();
    spin::delay_microseconds(freq, RESTART_SETTLE_US);
    board.jump(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::vec::Vec;

    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Step {
        Cli,
        Watchdog,
        Detach,
        Peripherals,
        Jump(u32),
    }

    #[derive(Default)]
    struct Recorder {
        steps: Vec<Step>,
    }

    impl Board for Recorder {
        fn disable_interrupts(&mut self) {
            self.steps.push(Step::Cli);
        }
        fn stop_watchdog(&mut self) {
            self.steps.push(Step::Watchdog);
        }
        fn detach_usb(&mut self) {
            self.steps.push(Step::Detach);
        }
        fn disable_peripherals(&mut self) {
            self.steps.push(Step::Peripherals);
        }
        fn jump(&mut self, address: u32) -> ! {
            self.steps.push(Step::Jump(address));
            panic!("jumped");
        }
    }

    fn run(f: impl FnOnce(&mut Recorder)) -> Vec<Step> {
        let mut board = Recorder::default();
        let result = catch_unwind(AssertUnwindSafe(|| f(&mut board)));
        assert!(result.is_err());
        board.steps
    }

    #[test]
    fn reboot_sequence() {
        let steps = run(|b| reboot(b, CpuFrequency::Mhz16));
        assert_eq!(
            steps,
            [
                Step::Cli,
                Step::Watchdog,
                Step::Detach,
                Step::Peripherals,
                Step::Jump(BOOTLOADER_ADDRESS),
            ]
        );
    }

    #[test]
    fn restart_leaves_usb_attached() {
        let steps = run(|b| restart(b, CpuFrequency::Mhz16));
        assert_eq!(steps, [Step::Cli, Step::Peripherals, Step::Jump(0)]);
    }
}
