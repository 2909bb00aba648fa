#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use modbus_float_reader::{Clock, DirectionPin, ReaderError, SerialConfig, Transport};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Begin(SerialConfig),
    PinOutput,
    Pin(bool),
    Write(Vec<u8>),
    Flush,
    Listen,
    StopListening,
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Scripted meter: every flush delivers the next queued reply into the
/// receive buffer.
pub struct MockTransport {
    events: EventLog,
    rx: Rc<RefCell<VecDeque<u8>>>,
    replies: VecDeque<Vec<u8>>,
    phantom: usize,
    half_duplex: bool,
    listening: bool,
}

impl MockTransport {
    pub fn new(events: EventLog) -> Self {
        MockTransport {
            events,
            rx: Rc::new(RefCell::new(VecDeque::new())),
            replies: VecDeque::new(),
            phantom: 0,
            half_duplex: false,
            listening: false,
        }
    }

    pub fn half_duplex(mut self) -> Self {
        self.half_duplex = true;
        self
    }

    pub fn reply(mut self, frame: &[u8]) -> Self {
        self.replies.push_back(frame.to_vec());
        self
    }

    /// Bytes sitting in the buffer before the first exchange.
    pub fn stale(self, bytes: &[u8]) -> Self {
        self.rx.borrow_mut().extend(bytes.iter().copied());
        self
    }

    /// Make `available` over-report by `count` bytes that never arrive.
    pub fn phantom(mut self, count: usize) -> Self {
        self.phantom = count;
        self
    }

    pub fn rx(&self) -> Rc<RefCell<VecDeque<u8>>> {
        self.rx.clone()
    }

    fn receiving(&self) -> bool {
        !self.half_duplex || self.listening
    }
}

impl Transport for MockTransport {
    fn begin(&mut self, config: &SerialConfig) -> Result<(), ReaderError> {
        self.events.borrow_mut().push(Event::Begin(*config));
        Ok(())
    }

    fn available(&mut self) -> usize {
        if !self.receiving() {
            return 0;
        }
        self.rx.borrow().len() + self.phantom
    }

    fn read_byte(&mut self) -> Option<u8> {
        if !self.receiving() {
            return None;
        }
        self.rx.borrow_mut().pop_front()
    }

    fn write(&mut self, data: &[u8]) -> usize {
        self.events.borrow_mut().push(Event::Write(data.to_vec()));
        data.len()
    }

    fn flush(&mut self) {
        self.events.borrow_mut().push(Event::Flush);
        if let Some(reply) = self.replies.pop_front() {
            if self.receiving() {
                self.rx.borrow_mut().extend(reply);
            }
        }
    }

    fn requires_listen(&self) -> bool {
        self.half_duplex
    }

    fn listen(&mut self) {
        self.listening = true;
        self.events.borrow_mut().push(Event::Listen);
    }

    fn stop_listening(&mut self) {
        self.listening = false;
        self.events.borrow_mut().push(Event::StopListening);
    }
}

pub struct MockPin {
    events: EventLog,
}

impl MockPin {
    pub fn new(events: EventLog) -> Self {
        MockPin { events }
    }
}

impl DirectionPin for MockPin {
    fn set_output(&mut self) {
        self.events.borrow_mut().push(Event::PinOutput);
    }

    fn set_level(&mut self, high: bool) {
        self.events.borrow_mut().push(Event::Pin(high));
    }
}

/// Manual time: one millisecond passes per yield.
#[derive(Clone, Default)]
pub struct MockClock {
    now: Rc<Cell<Duration>>,
    yields: Rc<Cell<u64>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> Duration {
        self.now.get()
    }

    pub fn yields(&self) -> u64 {
        self.yields.get()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn delay(&mut self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    fn yield_now(&mut self) {
        self.yields.set(self.yields.get() + 1);
        self.now.set(self.now.get() + Duration::from_millis(1));
    }
}

// 250.0 from slave 1, CRC 0xD9CF
pub const REPLY_250: [u8; 9] = [0x01, 0x04, 0x04, 0x43, 0x7A, 0x00, 0x00, 0xCF, 0xD9];
