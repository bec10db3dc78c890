//! Byte-level checks of what the driver puts on the bus.

use ledchain_core::frame::{self, Register};
use ledchain_core::{ChainDevice, ChainError, Transport, TransportError};

#[derive(Default)]
struct Wire {
    latches: Vec<Vec<u8>>,
}

impl Transport for Wire {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.latches.push(bytes.to_vec());
        Ok(())
    }

    fn set_baud_rate(&mut self, _hz: u32) -> Result<(), TransportError> {
        Ok(())
    }

    fn set_verbose(&mut self, _verbose: bool) {}

    fn channel(&self) -> &str {
        "wire"
    }
}

fn batched(count: usize) -> ChainDevice<Wire> {
    let mut chain = ChainDevice::with_modules(Wire::default(), count).expect("chain");
    chain.set_immediate_write(false);
    chain
}

#[test]
fn default_chain_flush_is_exact() {
    let mut chain = batched(2);
    chain.flush().expect("flush");

    let expected: Vec<Vec<u8>> = vec![
        vec![0x0F, 0x00, 0x0F, 0x00],
        vec![0x09, 0x00, 0x09, 0x00],
        vec![0x0B, 0x07, 0x0B, 0x07],
        vec![0x0A, 0x08, 0x0A, 0x08],
        vec![0x01, 0x00, 0x01, 0x00],
        vec![0x02, 0x00, 0x02, 0x00],
        vec![0x03, 0x00, 0x03, 0x00],
        vec![0x04, 0x00, 0x04, 0x00],
        vec![0x05, 0x00, 0x05, 0x00],
        vec![0x06, 0x00, 0x06, 0x00],
        vec![0x07, 0x00, 0x07, 0x00],
        vec![0x08, 0x00, 0x08, 0x00],
        vec![0x0C, 0x01, 0x0C, 0x01],
    ];
    assert_eq!(chain.transport().latches, expected);
}

#[test]
fn module_zero_frame_is_sent_last() {
    let mut chain = batched(3);
    chain.set_brightness(0, 15).expect("brightness");
    chain.set_brightness(2, 1).expect("brightness");
    chain.flush().expect("flush");

    let intensity = &chain.transport().latches[3];
    assert_eq!(intensity, &vec![0x0A, 0x01, 0x0A, 0x08, 0x0A, 0x0F]);
    assert_eq!(
        frame::decode_latch(intensity),
        vec![(0x0A, 0x0F), (0x0A, 0x08), (0x0A, 0x01)]
    );
}

#[test]
fn overflowing_number_shows_dashes() {
    let mut chain = batched(1);
    chain.set_value(0, -100_000_000).expect("set");
    chain.flush().expect("flush");
    for digit in 0..8u8 {
        let pos = frame::SWEEP
            .iter()
            .position(|r| *r == Register::Digit(digit))
            .expect("digit in sweep");
        assert_eq!(chain.transport().latches[pos], vec![0x01 + digit, 0x01]);
    }
}

#[test]
fn immediate_brightness_pads_with_no_ops() {
    let mut chain = ChainDevice::with_modules(Wire::default(), 3).expect("chain");
    chain.set_brightness(1, 4).expect("brightness");
    assert_eq!(
        chain.transport().latches,
        vec![vec![0x00, 0x00, 0x0A, 0x04, 0x00, 0x00]]
    );
    assert!(!chain.is_dirty(1).expect("index"));
}

#[test]
fn resize_is_refused_after_first_write() {
    let mut chain = ChainDevice::new(Wire::default());
    chain.resize(4).expect("pristine chain resizes");
    chain.set_power(3, false).expect("power");
    assert!(matches!(chain.resize(2), Err(ChainError::ResizeLocked)));
    assert_eq!(chain.num_modules(), 4);
}
