//! Host-side simulation helpers for transport tests.
//!
//! The bank, link and counters are `Sync`, so a scoped thread can play the
//! USB controller (frame counter, host polls) or the timer interrupt while
//! the test thread runs the code under test.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use std::vec::Vec;

use crate::clock::TickCounters;
use crate::config::ENDPOINT_COUNT;

use super::bank::{EndpointBank, Packet};
use super::ENDPOINT_LAYOUT;

pub type Bank = EndpointBank<ENDPOINT_COUNT>;

/// Endpoint bank with the device's endpoint layout.
pub fn device_bank() -> Bank {
    EndpointBank::new(ENDPOINT_LAYOUT)
}

/// What the simulated host saw while it was running.
#[derive(Default)]
pub struct Session {
    pub frames: u32,
    pub packets: Vec<(u8, Packet)>,
}

impl Session {
    pub fn on(&self, ep: u8) -> Vec<&[u8]> {
        self.packets
            .iter()
            .filter(|(e, _)| *e == ep)
            .map(|(_, p)| p.as_slice())
            .collect()
    }
}

/// Run `f` while a host thread generates frames.
///
/// Every frame the host polls the `poll` endpoints, then calls `on_frame`.
pub fn with_host<R>(
    bank: &Bank,
    poll: &[u8],
    on_frame: impl Fn() + Sync,
    f: impl FnOnce() -> R,
) -> (R, Session) {
    let done = AtomicBool::new(false);
    let session = Mutex::new(Session::default());
    let result = std::thread::scope(|s| {
        s.spawn(|| {
            while !done.load(Ordering::Acquire) {
                bank.start_of_frame();
                let mut log = session.lock().unwrap();
                log.frames += 1;
                for &ep in poll {
                    while let Some(p) = bank.collect(ep) {
                        log.packets.push((ep, p));
                    }
                }
                drop(log);
                on_frame();
                std::thread::sleep(Duration::from_micros(50));
            }
        });
        let r = f();
        done.store(true, Ordering::Release);
        r
    });
    (result, session.into_inner().unwrap())
}

/// Run `f` while a frame thread advances the bank, nobody reading.
pub fn with_frames<R>(bank: &Bank, f: impl FnOnce() -> R) -> (R, u32) {
    let (r, session) = with_host(bank, &[], || {}, f);
    (r, session.frames)
}

/// Run `f` while a timer thread feeds tick interrupts.
pub fn with_ticks<R>(counters: &TickCounters, f: impl FnOnce() -> R) -> R {
    let done = AtomicBool::new(false);
    std::thread::scope(|s| {
        s.spawn(|| {
            while !done.load(Ordering::Acquire) {
                counters.on_timer_tick();
                std::thread::yield_now();
            }
        });
        let r = f();
        done.store(true, Ordering::Release);
        r
    })
}
