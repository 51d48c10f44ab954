//! hidserial firmware - STM32F411, HSI 16 MHz.
//!
//! Runs the monotonic clock off SysTick, keeps the composite transport in a
//! single static context and echoes the serial channel back to the host.
//! `B` on the serial port reboots into the system bootloader, `R` restarts.
//!
//! The endpoint bank is serviced by the USB core; until that core is linked
//! in, SysTick also stands in for the start-of-frame interrupt so transmit
//! budgets still expire.

#![no_std]
#![no_main]

use core::fmt::Write as _;

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{SCB, SYST};
use cortex_m_rt::{entry, exception};
use defmt::{info, warn};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use hidserial::board::{self, Board};
use hidserial::clock::{Clock, TickCounter, TickCounters};
use hidserial::config::{CPU_FREQUENCY, ENDPOINT_COUNT};
use hidserial::transport::Transport;
use hidserial::usb::{on_start_of_frame, EndpointBank, LinkStatus, UsbLink, ENDPOINT_LAYOUT};

/// SysTick reload: 64 cycles per count, 256 counts per tick.
const SYST_RELOAD: u32 = 64 * 256 - 1;

/// USB OTG FS device control register and its soft-disconnect bit.
const OTG_FS_DCTL: *mut u32 = 0x5000_0804 as *mut u32;
const DCTL_SDIS: u32 = 1 << 1;

type Endpoints = EndpointBank<ENDPOINT_COUNT>;

static COUNTERS: TickCounters = TickCounters::new(CPU_FREQUENCY);
static ENDPOINTS: Endpoints = EndpointBank::new(ENDPOINT_LAYOUT);
static LINK: UsbLink = UsbLink::new();
static TRANSPORT: StaticCell<Transport<'static, Endpoints>> = StaticCell::new();

/// SysTick viewed as an 8-bit up-counter at CPU/64.
struct SysTickCounter;

impl TickCounter for SysTickCounter {
    fn count(&self) -> u8 {
        ((SYST_RELOAD - SYST::get_current()) >> 6) as u8
    }

    fn overflow_pending(&self) -> bool {
        SCB::is_pendst_pending()
    }
}

struct Stm32Board {
    syst: SYST,
}

impl Board for Stm32Board {
    fn disable_interrupts(&mut self) {
        cortex_m::interrupt::disable();
    }

    fn stop_watchdog(&mut self) {
        // IWDG is never started by this image and cannot be stopped once it is.
    }

    fn detach_usb(&mut self) {
        LINK.set_configured(false);
        ENDPOINTS.reset();
        // SAFETY: single volatile RMW of a device register; interrupts are off.
        unsafe {
            let dctl = core::ptr::read_volatile(OTG_FS_DCTL);
            core::ptr::write_volatile(OTG_FS_DCTL, dctl | DCTL_SDIS);
        }
    }

    fn disable_peripherals(&mut self) {
        self.syst.disable_interrupt();
        self.syst.disable_counter();
    }

    fn jump(&mut self, address: u32) -> ! {
        // SAFETY: `address` points at a vector table (system memory or the
        // boot alias at 0); nothing of this image runs afterwards.
        unsafe { cortex_m::asm::bootload(address as *const u32) }
    }
}

#[entry]
fn main() -> ! {
    let Some(mut cp) = cortex_m::Peripherals::take() else {
        panic!("core peripherals taken twice");
    };

    cp.SYST.set_clock_source(SystClkSource::Core);
    cp.SYST.set_reload(SYST_RELOAD);
    cp.SYST.clear_current();
    cp.SYST.enable_counter();
    cp.SYST.enable_interrupt();

    let clock = Clock::new(&COUNTERS, SysTickCounter);
    let transport = TRANSPORT.init(Transport::new(&ENDPOINTS, &LINK));
    let mut board = Stm32Board { syst: cp.SYST };

    info!("hidserial up at {} MHz", CPU_FREQUENCY.mhz());
    match transport.serial.begin(&clock) {
        LinkStatus::Configured => info!("host attached"),
        LinkStatus::Suspended => info!("no host, bus suspended"),
        LinkStatus::TimedOut => warn!("no host after enumeration timeout"),
    }

    let mut last_report = clock.millis();
    loop {
        while let Some(b) = transport.serial.read() {
            match b {
                b'B' => board::reboot(&mut board, CPU_FREQUENCY),
                b'R' => board::restart(&mut board, CPU_FREQUENCY),
                _ => {
                    transport.serial.write_byte(b);
                }
            }
        }

        let now = clock.millis();
        if now.wrapping_sub(last_report) >= 1000 && transport.serial.is_ready() {
            last_report = now;
            let _ = write!(transport.serial, "\r\nuptime {} ms\r\n", now);
        }
        transport.serial.send_now();

        if transport.serial.write_error() {
            warn!("serial write failed, host not reading");
            transport.serial.clear_write_error();
        }
    }
}

#[exception]
fn SysTick() {
    COUNTERS.on_timer_tick();
    ENDPOINTS.start_of_frame();
    on_start_of_frame(&ENDPOINTS, &LINK);
}
