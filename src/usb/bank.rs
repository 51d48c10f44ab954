//! RAM-backed endpoint engine.
//!
//! `EndpointBank` models the dual-ported endpoint memory of a full-speed
//! device controller. The CPU side is the [`EndpointIo`] trait used by the
//! channels; the controller side (`deliver`, `collect`, `start_of_frame`) is
//! driven by whatever moves packets on the wire, i.e. the lower-level USB
//! core on the firmware or the simulated host in tests.
//!
//! Bank semantics:
//! - OUT: one CPU bank. A delivered packet is readable byte by byte until
//!   `release_out`, after which the next queued host packet (if any) moves in.
//! - IN: the CPU stages a packet; `release_in` queues it for the host.
//!   The FIFO accepts data while fewer than `banks` packets are waiting
//!   and the staged packet has room.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::{Deque, Vec};

use super::endpoint::EndpointIo;

/// Largest packet any endpoint may use (full-speed bulk maximum).
pub const MAX_PACKET: usize = 64;

/// Packets a single endpoint can have queued toward either side.
const QUEUE_DEPTH: usize = 4;

pub type Packet = Vec<u8, MAX_PACKET>;

/// Transfer direction, from the host's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Unused,
    /// Host to device.
    Out,
    /// Device to host.
    In,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointConfig {
    pub direction: Direction,
    pub size: u8,
    pub banks: u8,
}

impl EndpointConfig {
    pub const UNUSED: Self = Self {
        direction: Direction::Unused,
        size: 0,
        banks: 0,
    };

    pub const fn out(size: u8) -> Self {
        Self {
            direction: Direction::Out,
            size,
            banks: 1,
        }
    }

    pub const fn input(size: u8, banks: u8) -> Self {
        Self {
            direction: Direction::In,
            size,
            banks,
        }
    }
}

struct Fifo {
    /// CPU-side bank contents.
    staged: Packet,
    /// OUT only: next byte to hand to the CPU.
    read_pos: usize,
    /// OUT only: `staged` holds a received, unreleased packet.
    received: bool,
    /// OUT: host packets not yet in the CPU bank. IN: packets awaiting the host.
    queue: Deque<Packet, QUEUE_DEPTH>,
}

impl Fifo {
    const EMPTY: Self = Self {
        staged: Vec::new(),
        read_pos: 0,
        received: false,
        queue: Deque::new(),
    };

    fn load_next(&mut self) {
        if let Some(packet) = self.queue.pop_front() {
            self.staged = packet;
            self.read_pos = 0;
            self.received = true;
        }
    }

    fn unread(&self) -> usize {
        if self.received {
            self.staged.len() - self.read_pos
        } else {
            0
        }
    }
}

struct Inner<const N: usize> {
    layout: [EndpointConfig; N],
    fifos: [Fifo; N],
    selected: usize,
    frame: u8,
}

impl<const N: usize> Inner<N> {
    fn current(&mut self) -> Option<(EndpointConfig, &mut Fifo)> {
        let config = *self.layout.get(self.selected)?;
        let fifo = self.fifos.get_mut(self.selected)?;
        Some((config, fifo))
    }

    fn endpoint(&mut self, ep: u8) -> Option<(EndpointConfig, &mut Fifo)> {
        let i = usize::from(ep);
        let config = *self.layout.get(i)?;
        let fifo = self.fifos.get_mut(i)?;
        Some((config, fifo))
    }
}

/// Endpoint memory for `N` endpoints, indexed by endpoint number.
pub struct EndpointBank<const N: usize> {
    inner: Mutex<RefCell<Inner<N>>>,
}

impl<const N: usize> EndpointBank<N> {
    pub const fn new(layout: [EndpointConfig; N]) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                layout,
                fifos: [Fifo::EMPTY; N],
                selected: 0,
                frame: 0,
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner<N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    // Controller side

    /// Queue a host OUT packet. Returns `false` (NAK) when the endpoint
    /// cannot take it.
    pub fn deliver(&self, ep: u8, bytes: &[u8]) -> bool {
        self.with(|inner| {
            let Some((config, fifo)) = inner.endpoint(ep) else {
                return false;
            };
            if config.direction != Direction::Out || bytes.len() > usize::from(config.size) {
                return false;
            }
            let Ok(packet) = Packet::from_slice(bytes) else {
                return false;
            };
            if fifo.queue.push_back(packet).is_err() {
                return false;
            }
            if !fifo.received {
                fifo.load_next();
            }
            true
        })
    }

    /// Take the oldest IN packet the CPU has released, as the host's poll.
    pub fn collect(&self, ep: u8) -> Option<Packet> {
        self.with(|inner| {
            let (config, fifo) = inner.endpoint(ep)?;
            if config.direction != Direction::In {
                return None;
            }
            fifo.queue.pop_front()
        })
    }

    /// Number of IN packets waiting for the host.
    pub fn pending_in(&self, ep: u8) -> usize {
        self.with(|inner| inner.endpoint(ep).map_or(0, |(_, fifo)| fifo.queue.len()))
    }

    /// Bytes staged in an IN endpoint but not yet released.
    pub fn staged_len(&self, ep: u8) -> usize {
        self.with(|inner| match inner.endpoint(ep) {
            Some((config, fifo)) if config.direction == Direction::In => fifo.staged.len(),
            _ => 0,
        })
    }

    /// Start-of-frame: advance the frame counter.
    pub fn start_of_frame(&self) {
        self.with(|inner| inner.frame = inner.frame.wrapping_add(1));
    }

    /// Drop every packet in flight, as on a bus reset.
    pub fn reset(&self) {
        self.with(|inner| {
            for fifo in inner.fifos.iter_mut() {
                *fifo = Fifo::EMPTY;
            }
        });
    }
}

impl<const N: usize> EndpointIo for EndpointBank<N> {
    fn select(&self, endpoint: u8) {
        self.with(|inner| inner.selected = usize::from(endpoint));
    }

    fn is_rw_allowed(&self) -> bool {
        self.with(|inner| match inner.current() {
            Some((config, fifo)) => match config.direction {
                Direction::Out => fifo.unread() > 0,
                Direction::In => {
                    fifo.queue.len() < usize::from(config.banks)
                        && fifo.staged.len() < usize::from(config.size)
                }
                Direction::Unused => false,
            },
            None => false,
        })
    }

    fn has_received(&self) -> bool {
        self.with(|inner| match inner.current() {
            Some((config, fifo)) => config.direction == Direction::Out && fifo.received,
            None => false,
        })
    }

    fn byte_count(&self) -> u8 {
        self.with(|inner| match inner.current() {
            Some((config, fifo)) => match config.direction {
                Direction::Out => fifo.unread() as u8,
                Direction::In => fifo.staged.len() as u8,
                Direction::Unused => 0,
            },
            None => 0,
        })
    }

    fn read_byte(&self) -> u8 {
        self.with(|inner| match inner.current() {
            Some((config, fifo)) if config.direction == Direction::Out && fifo.unread() > 0 => {
                let b = fifo.staged[fifo.read_pos];
                fifo.read_pos += 1;
                b
            }
            _ => 0,
        })
    }

    fn write_byte(&self, byte: u8) {
        self.with(|inner| {
            if let Some((config, fifo)) = inner.current() {
                let has_bank = fifo.queue.len() < usize::from(config.banks);
                if config.direction == Direction::In
                    && has_bank
                    && fifo.staged.len() < usize::from(config.size)
                {
                    // room checked above
                    let _ = fifo.staged.push(byte);
                }
            }
        });
    }

    fn release_out(&self) {
        self.with(|inner| {
            if let Some((config, fifo)) = inner.current() {
                if config.direction == Direction::Out && fifo.received {
                    fifo.staged.clear();
                    fifo.read_pos = 0;
                    fifo.received = false;
                    fifo.load_next();
                }
            }
        });
    }

    fn release_in(&self) {
        self.with(|inner| {
            if let Some((config, fifo)) = inner.current() {
                if config.direction == Direction::In
                    && fifo.queue.len() < usize::from(config.banks)
                {
                    let packet = core::mem::take(&mut fifo.staged);
                    // queue length checked above
                    let _ = fifo.queue.push_back(packet);
                }
            }
        });
    }

    fn frame_number(&self) -> u8 {
        self.with(|inner| inner.frame)
    }
}
