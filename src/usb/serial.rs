//! CDC ACM virtual serial port.
//!
//! Receive drains the CDC OUT FIFO byte by byte, with a one-byte peek slot.
//! Transmit packs bytes into the CDC IN FIFO, releasing each packet as soon
//! as it fills. A partial packet is released either by [`CdcSerial::send_now`]
//! or by the start-of-frame interrupt once the flush timer runs out.
//!
//! When the host stops reading, a write waits at most `TRANSMIT_TIMEOUT`
//! frames and then gives up. A sticky flag then makes subsequent writes
//! return immediately until the FIFO drains again, so an absent terminal
//! cannot stall the firmware on every call.

use core::fmt;

use crate::clock::{Clock, TickCounter};
use crate::config::{
    BEGIN_ENUMERATION_TIMEOUT_MS, BEGIN_SETTLE_MS, BEGIN_SUSPEND_TIMEOUT_MS, CDC_RX_ENDPOINT,
    CDC_TX_ENDPOINT, CDC_TX_SIZE, TRANSMIT_FLUSH_TIMEOUT, TRANSMIT_TIMEOUT,
};
use crate::interrupts::hold_interrupts;

use super::endpoint::{wait_writable, EndpointIo, Readiness};
use super::link::{LineCoding, UsbLink, CONTROL_LINE_DTR, CONTROL_LINE_RTS};

/// Result of [`CdcSerial::begin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// Enumerated and configured by a host.
    Configured,
    /// Powered, but the bus stayed suspended: no host is there.
    Suspended,
    /// Neither happened in time (e.g. a charger that toggles the data lines).
    TimedOut,
}

/// The CDC data channel.
pub struct CdcSerial<'a, E> {
    io: &'a E,
    link: &'a UsbLink,
    peek: Option<u8>,
    tx_timed_out: bool,
    write_error: bool,
}

impl<'a, E: EndpointIo> CdcSerial<'a, E> {
    pub fn new(io: &'a E, link: &'a UsbLink) -> Self {
        Self {
            io,
            link,
            peek: None,
            tx_timed_out: false,
            write_error: false,
        }
    }

    /// Wait for the host to enumerate the device.
    pub fn begin<T: TickCounter>(&mut self, clock: &Clock<'_, T>) -> LinkStatus {
        self.peek = None;
        let begin_wait = clock.millis() as u16;
        loop {
            if self.link.is_configured() {
                // a little time for the host to load a driver
                clock.delay(BEGIN_SETTLE_MS);
                info!("serial: host configured the device");
                return LinkStatus::Configured;
            }
            if self.link.is_suspended() {
                let begin_suspend = clock.millis() as u16;
                while self.link.is_suspended() {
                    if (clock.millis() as u16).wrapping_sub(begin_suspend) > BEGIN_SUSPEND_TIMEOUT_MS
                    {
                        info!("serial: bus suspended, no host");
                        return LinkStatus::Suspended;
                    }
                }
            }
            if (clock.millis() as u16).wrapping_sub(begin_wait) > BEGIN_ENUMERATION_TIMEOUT_MS {
                warn!("serial: enumeration timed out");
                return LinkStatus::TimedOut;
            }
        }
    }

    // Receive

    /// Bytes ready to read, including a peeked byte.
    pub fn available(&self) -> u8 {
        let mut n = 0;
        {
            let _held = hold_interrupts();
            if self.link.is_configured() {
                self.io.select(CDC_RX_ENDPOINT);
                n = self.io.byte_count();
                // retire an empty or fully drained packet so the next can come in
                if n == 0 && self.io.has_received() && !self.io.is_rw_allowed() {
                    self.io.release_out();
                }
            }
        }
        if self.peek.is_some() && n < u8::MAX {
            n += 1;
        }
        n
    }

    /// Next byte without consuming it.
    pub fn peek(&mut self) -> Option<u8> {
        if self.peek.is_none() {
            self.peek = self.read();
        }
        self.peek
    }

    /// Next byte, or `None` if nothing was received or the link is down.
    pub fn read(&mut self) -> Option<u8> {
        if let Some(b) = self.peek.take() {
            return Some(b);
        }

        let _held = hold_interrupts();
        if !self.link.is_configured() {
            return None;
        }
        self.io.select(CDC_RX_ENDPOINT);
        loop {
            if self.io.is_rw_allowed() {
                break;
            }
            // a packet completed while we were looking: retire it and retry
            if self.io.has_received() {
                self.io.release_out();
                continue;
            }
            return None;
        }
        let b = self.io.read_byte();
        if !self.io.is_rw_allowed() {
            self.io.release_out();
        }
        Some(b)
    }

    /// Read into `buf` until it is full or no more data is ready.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.read() {
                Some(b) => *slot = b,
                None => break,
            }
            n += 1;
        }
        n
    }

    /// Discard all buffered input.
    pub fn flush(&mut self) {
        if self.link.is_configured() {
            let _held = hold_interrupts();
            self.io.select(CDC_RX_ENDPOINT);
            while self.io.is_rw_allowed() {
                self.io.release_out();
            }
        }
        self.peek = None;
    }

    // Transmit

    /// Queue `buf` for the host. Returns how many bytes were accepted.
    ///
    /// A short count is normal backpressure. The sticky
    /// [`write_error`](Self::write_error) flag is set only when the link is
    /// down or the host stopped reading.
    pub fn write(&mut self, buf: &[u8]) -> usize {
        if !self.link.is_configured() {
            self.write_error = true;
            return 0;
        }

        let mut held = hold_interrupts();
        self.io.select(CDC_TX_ENDPOINT);
        // if we gave up due to timeout before, don't wait again
        if self.tx_timed_out {
            if !self.io.is_rw_allowed() {
                drop(held);
                self.write_error = true;
                return 0;
            }
            self.tx_timed_out = false;
        }

        let mut rest = buf;
        let mut count = 0;
        while !rest.is_empty() {
            held = match wait_writable(self.io, self.link, CDC_TX_ENDPOINT, TRANSMIT_TIMEOUT, held)
            {
                Readiness::Ready(held) => held,
                Readiness::TimedOut => {
                    warn!("serial: transmit timed out after {} bytes", count);
                    self.tx_timed_out = true;
                    self.write_error = true;
                    return count;
                }
                Readiness::LinkLost => {
                    debug!("serial: link lost after {} bytes", count);
                    self.write_error = true;
                    return count;
                }
            };

            let room = usize::from(CDC_TX_SIZE.saturating_sub(self.io.byte_count()));
            let n = room.min(rest.len());
            self.io.write_packet(&rest[..n]);
            rest = &rest[n..];
            count += n;

            // if this completed a packet, transmit it now
            if !self.io.is_rw_allowed() {
                self.io.release_in();
            }
            self.link.set_flush_timer(held.token(), TRANSMIT_FLUSH_TIMEOUT);
        }
        drop(held);
        count
    }

    pub fn write_byte(&mut self, byte: u8) -> usize {
        self.write(&[byte])
    }

    /// Release the partially filled packet for the host's next poll.
    ///
    /// A device cannot push data; this only makes it available sooner than
    /// the flush timer would.
    pub fn send_now(&mut self) {
        let held = hold_interrupts();
        if self.link.is_configured() && self.link.flush_timer(held.token()) != 0 {
            self.io.select(CDC_TX_ENDPOINT);
            self.io.release_in();
            self.link.set_flush_timer(held.token(), 0);
        }
    }

    /// `true` once any write failed because of the link.
    pub fn write_error(&self) -> bool {
        self.write_error
    }

    pub fn clear_write_error(&mut self) {
        self.write_error = false;
    }

    // Line status, as negotiated by the host

    pub fn line_coding(&self) -> LineCoding {
        self.link.line_coding()
    }

    pub fn baud(&self) -> u32 {
        self.link.line_coding().baud
    }

    pub fn stop_bits(&self) -> u8 {
        self.link.line_coding().stop_bits
    }

    pub fn parity_type(&self) -> u8 {
        self.link.line_coding().parity_type
    }

    pub fn data_bits(&self) -> u8 {
        self.link.line_coding().data_bits
    }

    pub fn dtr(&self) -> bool {
        self.link.control_lines() & CONTROL_LINE_DTR != 0
    }

    pub fn rts(&self) -> bool {
        self.link.control_lines() & CONTROL_LINE_RTS != 0
    }

    /// Configured and a terminal has the port open.
    pub fn is_ready(&self) -> bool {
        self.link.is_configured()
            && self.link.control_lines() & (CONTROL_LINE_DTR | CONTROL_LINE_RTS) != 0
    }
}

impl<E: EndpointIo> fmt::Write for CdcSerial<'_, E> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.write(s.as_bytes()) == s.len() {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

/// Start-of-frame interrupt hook: count the flush timer down and release a
/// stale partial packet when it expires.
pub fn on_start_of_frame<E: EndpointIo + ?Sized>(io: &E, link: &UsbLink) {
    let held = hold_interrupts();
    if !link.is_configured() {
        return;
    }
    let t = link.flush_timer(held.token());
    if t != 0 {
        let t = t - 1;
        link.set_flush_timer(held.token(), t);
        if t == 0 {
            io.select(CDC_TX_ENDPOINT);
            io.release_in();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{sim::Frozen, CpuFrequency, TickCounters};
    use crate::usb::testing::{device_bank as serial_bank, with_frames, with_host, with_ticks};
    use core::fmt::Write as _;

    fn configured() -> UsbLink {
        let link = UsbLink::new();
        link.set_configured(true);
        link
    }

    #[test]
    fn read_without_link_is_none() {
        let bank = serial_bank();
        let link = UsbLink::new();
        bank.deliver(CDC_RX_ENDPOINT, b"x");
        let mut serial = CdcSerial::new(&bank, &link);
        assert_eq!(serial.read(), None);
        assert_eq!(serial.peek(), None);
        assert_eq!(serial.available(), 0);
    }

    #[test]
    fn peek_then_read_returns_same_byte() {
        let bank = serial_bank();
        let link = configured();
        bank.deliver(CDC_RX_ENDPOINT, b"ab");
        let mut serial = CdcSerial::new(&bank, &link);

        let before = serial.available();
        assert_eq!(before, 2);
        assert_eq!(serial.peek(), Some(b'a'));
        assert_eq!(serial.peek(), Some(b'a'));
        assert_eq!(serial.available(), 2);
        assert_eq!(serial.read(), Some(b'a'));
        assert_eq!(serial.available(), before - 1);
        assert_eq!(serial.read(), Some(b'b'));
        assert_eq!(serial.read(), None);
    }

    #[test]
    fn read_crosses_packet_boundaries() {
        let bank = serial_bank();
        let link = configured();
        bank.deliver(CDC_RX_ENDPOINT, b"he");
        bank.deliver(CDC_RX_ENDPOINT, b"llo");
        let mut serial = CdcSerial::new(&bank, &link);
        let mut buf = [0u8; 8];
        assert_eq!(serial.read_bytes(&mut buf), 5);
        assert_eq!(&buf[..5], b"hello");
    }

    #[test]
    fn zero_length_packet_is_skipped() {
        let bank = serial_bank();
        let link = configured();
        bank.deliver(CDC_RX_ENDPOINT, b"");
        bank.deliver(CDC_RX_ENDPOINT, b"z");
        let mut serial = CdcSerial::new(&bank, &link);
        assert_eq!(serial.read(), Some(b'z'));
    }

    #[test]
    fn available_retires_empty_packet() {
        let bank = serial_bank();
        let link = configured();
        bank.deliver(CDC_RX_ENDPOINT, b"");
        bank.deliver(CDC_RX_ENDPOINT, b"qq");
        let serial = CdcSerial::new(&bank, &link);
        assert_eq!(serial.available(), 0);
        assert_eq!(serial.available(), 2);
    }

    #[test]
    fn flush_discards_input() {
        let bank = serial_bank();
        let link = configured();
        bank.deliver(CDC_RX_ENDPOINT, b"abc");
        bank.deliver(CDC_RX_ENDPOINT, b"def");
        let mut serial = CdcSerial::new(&bank, &link);
        assert_eq!(serial.peek(), Some(b'a'));
        serial.flush();
        assert_eq!(serial.available(), 0);
        assert_eq!(serial.read(), None);
    }

    #[test]
    fn write_without_link_sets_error() {
        let bank = serial_bank();
        let link = UsbLink::new();
        let mut serial = CdcSerial::new(&bank, &link);
        assert_eq!(serial.write(b"hi"), 0);
        assert!(serial.write_error());
        serial.clear_write_error();
        assert!(!serial.write_error());
    }

    #[test]
    fn short_write_stays_staged_until_send_now() {
        let bank = serial_bank();
        let link = configured();
        let mut serial = CdcSerial::new(&bank, &link);
        assert_eq!(serial.write(b"hello"), 5);
        assert!(!serial.write_error());
        assert_eq!(bank.pending_in(CDC_TX_ENDPOINT), 0);
        assert_eq!(bank.staged_len(CDC_TX_ENDPOINT), 5);

        serial.send_now();
        assert_eq!(bank.collect(CDC_TX_ENDPOINT).unwrap().as_slice(), b"hello");
        // disarmed: a second call sends nothing
        serial.send_now();
        assert_eq!(bank.pending_in(CDC_TX_ENDPOINT), 0);
    }

    #[test]
    fn full_packet_is_released_eagerly() {
        let bank = serial_bank();
        let link = configured();
        let mut serial = CdcSerial::new(&bank, &link);
        let data = [0x55u8; CDC_TX_SIZE as usize];
        assert_eq!(serial.write(&data), data.len());
        assert_eq!(bank.pending_in(CDC_TX_ENDPOINT), 1);
        assert_eq!(bank.staged_len(CDC_TX_ENDPOINT), 0);
    }

    #[test]
    fn two_packets_fit_the_double_bank() {
        let bank = serial_bank();
        let link = configured();
        let mut serial = CdcSerial::new(&bank, &link);
        let data = [7u8; 2 * CDC_TX_SIZE as usize + 10];
        // two full banks in flight, the tail cannot be placed
        let (written, _) = with_frames(&bank, || serial.write(&data));
        assert_eq!(written, 2 * CDC_TX_SIZE as usize);
        assert!(serial.write_error());
        assert_eq!(bank.pending_in(CDC_TX_ENDPOINT), 2);
    }

    #[test]
    fn timeout_is_sticky_until_fifo_drains() {
        let bank = serial_bank();
        let link = configured();
        let mut serial = CdcSerial::new(&bank, &link);
        let data = [1u8; 2 * CDC_TX_SIZE as usize];
        assert_eq!(serial.write(&data), data.len());

        // host is gone: this one waits out the budget
        let (written, frames) = with_frames(&bank, || serial.write(b"x"));
        assert_eq!(written, 0);
        assert!(frames >= u32::from(TRANSMIT_TIMEOUT));

        // the next call must not wait again (no ticker running: it would spin forever)
        serial.clear_write_error();
        assert_eq!(serial.write(b"x"), 0);
        assert!(serial.write_error());

        // host comes back and drains one bank
        bank.collect(CDC_TX_ENDPOINT);
        assert_eq!(serial.write(b"x"), 1);
    }

    #[test]
    fn link_loss_mid_write_returns_partial_count() {
        let bank = serial_bank();
        let link = configured();
        let mut serial = CdcSerial::new(&bank, &link);
        let data = [2u8; 2 * CDC_TX_SIZE as usize];
        serial.write(&data);
        let (written, _) = with_host(&bank, &[], || link.set_configured(false), || {
            serial.write(b"more")
        });
        assert_eq!(written, 0);
        assert!(serial.write_error());
    }

    #[test]
    fn start_of_frame_flushes_partial_packet() {
        let bank = serial_bank();
        let link = configured();
        let mut serial = CdcSerial::new(&bank, &link);
        serial.write(b"tail");
        for _ in 0..TRANSMIT_FLUSH_TIMEOUT - 1 {
            on_start_of_frame(&bank, &link);
        }
        assert_eq!(bank.pending_in(CDC_TX_ENDPOINT), 0);
        on_start_of_frame(&bank, &link);
        assert_eq!(bank.collect(CDC_TX_ENDPOINT).unwrap().as_slice(), b"tail");
        // timer disarmed
        on_start_of_frame(&bank, &link);
        assert_eq!(bank.pending_in(CDC_TX_ENDPOINT), 0);
    }

    #[test]
    fn fmt_write_goes_to_the_fifo() {
        let bank = serial_bank();
        let link = configured();
        let mut serial = CdcSerial::new(&bank, &link);
        write!(serial, "t={}", 42).unwrap();
        serial.send_now();
        assert_eq!(bank.collect(CDC_TX_ENDPOINT).unwrap().as_slice(), b"t=42");
    }

    #[test]
    fn line_status_reflects_link() {
        let bank = serial_bank();
        let link = configured();
        link.set_line_coding(LineCoding {
            baud: 9600,
            stop_bits: 2,
            parity_type: 1,
            data_bits: 7,
        });
        let serial = CdcSerial::new(&bank, &link);
        assert_eq!(serial.baud(), 9600);
        assert_eq!(serial.stop_bits(), 2);
        assert_eq!(serial.parity_type(), 1);
        assert_eq!(serial.data_bits(), 7);
        assert!(!serial.is_ready());

        link.set_control_lines(CONTROL_LINE_DTR);
        assert!(serial.dtr());
        assert!(!serial.rts());
        assert!(serial.is_ready());

        link.set_configured(false);
        assert!(!serial.is_ready());
    }

    #[test]
    fn begin_reports_configured_link() {
        let bank = serial_bank();
        let link = configured();
        let counters = TickCounters::new(CpuFrequency::Mhz16);
        let clock = Clock::new(&counters, Frozen);
        let mut serial = CdcSerial::new(&bank, &link);
        let status = with_ticks(&counters, || serial.begin(&clock));
        assert_eq!(status, LinkStatus::Configured);
        assert!(counters.millis() >= BEGIN_SETTLE_MS - 1);
    }

    #[test]
    fn begin_gives_up_on_long_suspend() {
        let bank = serial_bank();
        let link = UsbLink::new();
        link.set_suspended(true);
        let counters = TickCounters::new(CpuFrequency::Mhz16);
        let clock = Clock::new(&counters, Frozen);
        let mut serial = CdcSerial::new(&bank, &link);
        let status = with_ticks(&counters, || serial.begin(&clock));
        assert_eq!(status, LinkStatus::Suspended);
    }

    #[test]
    fn begin_times_out_without_host() {
        let bank = serial_bank();
        let link = UsbLink::new();
        let counters = TickCounters::new(CpuFrequency::Mhz16);
        let clock = Clock::new(&counters, Frozen);
        let mut serial = CdcSerial::new(&bank, &link);
        let status = with_ticks(&counters, || serial.begin(&clock));
        assert_eq!(status, LinkStatus::TimedOut);
        assert!(counters.millis() > u32::from(BEGIN_ENUMERATION_TIMEOUT_MS));
    }
}
