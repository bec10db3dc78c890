//! Chained MAX7219 driver with dirty-tracked, batched flushing.
//!
//! [`ChainDevice`] owns the runtime state of every module on one bus. Mutators
//! validate first and only then touch state, marking the module dirty when its
//! rendered content actually changes. [`ChainDevice::flush`] re-sends the full
//! register image of every module, dirty or not: the chips latch together, so
//! a partial chain update would leave trailing chips holding stale data.
//!
//! Nothing is written on drop; state reaches the bus only through `flush` or
//! an immediate-write mutator.

use crate::error::ChainError;
use crate::frame::{self, ChipImage, Register};
use crate::transport::Transport;
use crate::types::{Brightness, ModuleState, DEFAULT_MODULES, MAX_MODULES};

#[derive(Debug, Clone, Default)]
struct Module {
    state: ModuleState,
    dirty: bool,
}

/// A chain of identical MAX7219 chips sharing one transport.
pub struct ChainDevice<T: Transport> {
    transport: T,
    modules: Vec<Module>,
    immediate_write: bool,
    /// True until the first mutator or bus write; only then may the chain be resized.
    pristine: bool,
}

impl<T: Transport> ChainDevice<T> {
    /// A chain of [`DEFAULT_MODULES`] modules in immediate-write mode.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            modules: vec![Module::default(); DEFAULT_MODULES],
            immediate_write: true,
            pristine: true,
        }
    }

    /// A chain of `count` modules.
    pub fn with_modules(transport: T, count: usize) -> Result<Self, ChainError> {
        let mut chain = Self::new(transport);
        chain.resize(count)?;
        Ok(chain)
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    pub fn num_modules(&self) -> usize {
        self.modules.len()
    }

    /// Set the chain length. Existing modules keep their state; new ones start
    /// at defaults.
    ///
    /// Only allowed while the chain is pristine: once any module was mutated or
    /// anything was sent, the call fails with `ResizeLocked`.
    pub fn resize(&mut self, count: usize) -> Result<(), ChainError> {
        if !self.pristine {
            return Err(ChainError::ResizeLocked);
        }
        if count == 0 || count > MAX_MODULES {
            return Err(ChainError::InvalidArgument(format!(
                "chain length {count} outside 1..={MAX_MODULES}"
            )));
        }
        self.modules.resize(count, Module::default());
        tracing::debug!(count, "chain resized");
        Ok(())
    }

    pub fn immediate_write(&self) -> bool {
        self.immediate_write
    }

    /// When enabled, each state-changing mutator writes the affected
    /// registers straight away; otherwise changes wait for [`flush`](Self::flush).
    pub fn set_immediate_write(&mut self, enabled: bool) {
        self.immediate_write = enabled;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn module(&self, index: usize) -> Result<&ModuleState, ChainError> {
        self.slot(index).map(|m| &m.state)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleState> {
        self.modules.iter().map(|m| &m.state)
    }

    /// Last value assigned to the module. Meaningless while
    /// [`has_value`](Self::has_value) is false.
    pub fn value(&self, index: usize) -> Result<i32, ChainError> {
        self.module(index).map(|s| s.value)
    }

    pub fn has_value(&self, index: usize) -> Result<bool, ChainError> {
        self.module(index).map(|s| s.has_value)
    }

    pub fn brightness(&self, index: usize) -> Result<Brightness, ChainError> {
        self.module(index).map(|s| s.brightness)
    }

    pub fn is_powered(&self, index: usize) -> Result<bool, ChainError> {
        self.module(index).map(|s| s.powered)
    }

    pub fn is_dirty(&self, index: usize) -> Result<bool, ChainError> {
        self.slot(index).map(|m| m.dirty)
    }

    pub fn any_dirty(&self) -> bool {
        self.modules.iter().any(|m| m.dirty)
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    pub fn set_value(&mut self, index: usize, value: i32) -> Result<(), ChainError> {
        let module = self.slot_mut(index)?;
        if module.state.has_value && module.state.value == value {
            return Ok(());
        }
        module.state.value = value;
        module.state.has_value = true;
        module.dirty = true;
        self.write_through(index, &frame::DIGIT_REGISTERS)
    }

    /// Blank the module. The last value is kept but no longer displayed.
    pub fn clear(&mut self, index: usize) -> Result<(), ChainError> {
        let module = self.slot_mut(index)?;
        if !module.state.has_value {
            return Ok(());
        }
        module.state.has_value = false;
        module.dirty = true;
        self.write_through(index, &frame::DIGIT_REGISTERS)
    }

    pub fn set_brightness(&mut self, index: usize, level: i64) -> Result<(), ChainError> {
        let brightness = Brightness::new(level);
        let module = self.slot_mut(index)?;
        let brightness = brightness?;
        if module.state.brightness == brightness {
            return Ok(());
        }
        module.state.brightness = brightness;
        module.dirty = true;
        self.write_through(index, &frame::INTENSITY_REGISTERS)
    }

    pub fn set_power(&mut self, index: usize, on: bool) -> Result<(), ChainError> {
        let module = self.slot_mut(index)?;
        if module.state.powered == on {
            return Ok(());
        }
        module.state.powered = on;
        module.dirty = true;
        self.write_through(index, &frame::POWER_REGISTERS)
    }

    /// Return every module to its default state and mark the whole chain dirty.
    pub fn reset(&mut self) {
        self.pristine = false;
        for module in &mut self.modules {
            module.state = ModuleState::default();
            module.dirty = true;
        }
        tracing::debug!(count = self.modules.len(), "chain reset to defaults");
    }

    /// Flag every module for resend without touching its content.
    pub fn mark_all_dirty(&mut self) {
        for module in &mut self.modules {
            module.dirty = true;
        }
    }

    /// Clear every dirty flag without touching content or the bus.
    pub fn mark_all_clean(&mut self) {
        for module in &mut self.modules {
            module.dirty = false;
        }
    }

    // -----------------------------------------------------------------------
    // Bus I/O
    // -----------------------------------------------------------------------

    /// Send the complete register image of every module.
    ///
    /// One latch per register in [`frame::SWEEP`]. Dirty flags are cleared
    /// only after every latch was written; a transport error leaves them set
    /// so a retry sends everything again.
    pub fn flush(&mut self) -> Result<(), ChainError> {
        self.pristine = false;
        let images: Vec<ChipImage> = self
            .modules
            .iter()
            .map(|m| ChipImage::render(&m.state))
            .collect();

        for register in frame::SWEEP {
            let bytes = frame::latch(&images, register);
            self.transport.write(&bytes)?;
        }

        let dirty = self.modules.iter().filter(|m| m.dirty).count();
        self.mark_all_clean();
        tracing::debug!(
            channel = self.transport.channel(),
            modules = self.modules.len(),
            dirty,
            "chain flushed"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    fn slot(&self, index: usize) -> Result<&Module, ChainError> {
        self.modules.get(index).ok_or(ChainError::OutOfRange {
            index: index as i64,
            count: self.modules.len(),
        })
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Module, ChainError> {
        let count = self.modules.len();
        let module = self.modules.get_mut(index).ok_or(ChainError::OutOfRange {
            index: index as i64,
            count,
        })?;
        self.pristine = false;
        Ok(module)
    }

    /// In immediate mode, push `registers` of module `index` to the bus with
    /// no-op frames for every other position.
    fn write_through(&mut self, index: usize, registers: &[Register]) -> Result<(), ChainError> {
        if !self.immediate_write {
            return Ok(());
        }
        let image = ChipImage::render(&self.modules[index].state);
        let count = self.modules.len();
        for &register in registers {
            let bytes = frame::targeted_latch(count, index, register, image.data(register));
            self.transport.write(&bytes)?;
        }
        self.modules[index].dirty = false;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::font;

    #[derive(Default)]
    struct Recorder {
        writes: Vec<Vec<u8>>,
        fail: bool,
    }

    impl Transport for Recorder {
        fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::NotOpen("test".into()));
            }
            self.writes.push(bytes.to_vec());
            Ok(())
        }

        fn set_baud_rate(&mut self, _hz: u32) -> Result<(), TransportError> {
            Ok(())
        }

        fn set_verbose(&mut self, _verbose: bool) {}

        fn channel(&self) -> &str {
            "test"
        }
    }

    fn batched(count: usize) -> ChainDevice<Recorder> {
        let mut chain = ChainDevice::with_modules(Recorder::default(), count).expect("chain");
        chain.set_immediate_write(false);
        chain
    }

    #[test]
    fn set_value_then_get() {
        let mut chain = batched(2);
        chain.set_value(1, -305).unwrap();
        assert_eq!(chain.value(1).unwrap(), -305);
        assert!(chain.has_value(1).unwrap());
        assert!(chain.is_dirty(1).unwrap());
        assert!(!chain.is_dirty(0).unwrap());
    }

    #[test]
    fn same_value_twice_is_not_redirtied() {
        let mut chain = batched(1);
        chain.set_value(0, 7).unwrap();
        chain.mark_all_clean();
        chain.set_value(0, 7).unwrap();
        assert!(!chain.is_dirty(0).unwrap());
    }

    #[test]
    fn zero_after_default_is_a_change() {
        let mut chain = batched(1);
        chain.set_value(0, 0).unwrap();
        assert!(chain.is_dirty(0).unwrap());
    }

    #[test]
    fn clear_keeps_value_but_hides_it() {
        let mut chain = batched(1);
        chain.set_value(0, 12).unwrap();
        chain.clear(0).unwrap();
        assert!(!chain.has_value(0).unwrap());
        assert_eq!(chain.module(0).unwrap().displayed(), None);
    }

    #[test]
    fn clear_when_already_clear_is_clean() {
        let mut chain = batched(1);
        chain.clear(0).unwrap();
        assert!(!chain.is_dirty(0).unwrap());
    }

    #[test]
    fn invalid_brightness_leaves_state() {
        let mut chain = batched(1);
        for level in [16, -1] {
            let err = chain.set_brightness(0, level).unwrap_err();
            assert!(matches!(err, ChainError::InvalidArgument(_)));
        }
        assert_eq!(chain.brightness(0).unwrap(), Brightness::DEFAULT);
        assert!(!chain.is_dirty(0).unwrap());
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let mut chain = batched(2);
        assert!(matches!(
            chain.set_value(2, 1),
            Err(ChainError::OutOfRange { index: 2, count: 2 })
        ));
        assert!(matches!(
            chain.set_brightness(2, 3),
            Err(ChainError::OutOfRange { .. })
        ));
        assert!(matches!(chain.set_power(9, false), Err(ChainError::OutOfRange { .. })));
        assert!(matches!(chain.clear(2), Err(ChainError::OutOfRange { .. })));
        assert!(chain.modules().all(|m| *m == ModuleState::default()));
        assert!(!chain.any_dirty());
    }

    #[test]
    fn out_of_range_brightness_index_wins_over_level() {
        let mut chain = batched(1);
        assert!(matches!(
            chain.set_brightness(1, 99),
            Err(ChainError::OutOfRange { .. })
        ));
    }

    #[test]
    fn power_toggle_marks_dirty_only_on_change() {
        let mut chain = batched(1);
        chain.set_power(0, true).unwrap();
        assert!(!chain.is_dirty(0).unwrap());
        chain.set_power(0, false).unwrap();
        assert!(chain.is_dirty(0).unwrap());
        assert!(!chain.is_powered(0).unwrap());
    }

    #[test]
    fn resize_locks_after_mutation() {
        let mut chain = ChainDevice::new(Recorder::default());
        chain.resize(4).unwrap();
        chain.resize(3).unwrap();
        assert_eq!(chain.num_modules(), 3);
        chain.set_value(0, 1).unwrap();
        assert!(matches!(chain.resize(5), Err(ChainError::ResizeLocked)));
        assert_eq!(chain.num_modules(), 3);
    }

    #[test]
    fn rejected_brightness_still_locks_resize() {
        let mut chain = ChainDevice::new(Recorder::default());
        assert!(matches!(
            chain.set_brightness(0, 99),
            Err(ChainError::InvalidArgument(_))
        ));
        assert!(matches!(chain.resize(2), Err(ChainError::ResizeLocked)));
        assert_eq!(chain.num_modules(), 1);
    }

    #[test]
    fn out_of_range_index_leaves_resize_open() {
        let mut chain = ChainDevice::new(Recorder::default());
        assert!(chain.set_brightness(3, 99).is_err());
        chain.resize(2).unwrap();
        assert_eq!(chain.num_modules(), 2);
    }

    #[test]
    fn resize_locks_after_flush() {
        let mut chain = batched(2);
        chain.flush().unwrap();
        assert!(matches!(chain.resize(1), Err(ChainError::ResizeLocked)));
    }

    #[test]
    fn resize_rejects_zero() {
        let mut chain = ChainDevice::new(Recorder::default());
        assert!(matches!(chain.resize(0), Err(ChainError::InvalidArgument(_))));
        assert!(matches!(
            chain.resize(MAX_MODULES + 1),
            Err(ChainError::InvalidArgument(_))
        ));
        assert_eq!(chain.num_modules(), DEFAULT_MODULES);
    }

    #[test]
    fn flush_sends_one_latch_per_register() {
        let mut chain = batched(3);
        chain.set_value(1, 8).unwrap();
        chain.flush().unwrap();
        let writes = &chain.transport().writes;
        assert_eq!(writes.len(), frame::SWEEP.len());
        assert!(writes.iter().all(|w| w.len() == 3 * frame::FRAME_LEN));
        assert!(!chain.any_dirty());
    }

    #[test]
    fn failed_flush_keeps_dirty_flags() {
        let mut chain = batched(2);
        chain.set_value(0, 3).unwrap();
        chain.transport_mut().fail = true;
        assert!(matches!(chain.flush(), Err(ChainError::Transport(_))));
        assert!(chain.is_dirty(0).unwrap());
        chain.transport_mut().fail = false;
        chain.flush().unwrap();
        assert!(!chain.is_dirty(0).unwrap());
    }

    #[test]
    fn batched_mutators_do_not_touch_bus() {
        let mut chain = batched(2);
        chain.set_value(0, 1).unwrap();
        chain.set_brightness(1, 2).unwrap();
        chain.set_power(1, false).unwrap();
        assert!(chain.transport().writes.is_empty());
    }

    #[test]
    fn immediate_write_targets_one_module() {
        let mut chain = ChainDevice::with_modules(Recorder::default(), 3).unwrap();
        chain.set_brightness(2, 4).unwrap();
        let writes = &chain.transport().writes;
        assert_eq!(writes.len(), 1);
        let frames = frame::decode_latch(&writes[0]);
        assert_eq!(frames[2], (Register::Intensity.address(), 4));
        assert_eq!(frames[0], (Register::NoOp.address(), 0));
        assert_eq!(frames[1], (Register::NoOp.address(), 0));
        assert!(!chain.is_dirty(2).unwrap());
    }

    #[test]
    fn immediate_set_value_writes_all_digits() {
        let mut chain = ChainDevice::with_modules(Recorder::default(), 1).unwrap();
        chain.set_value(0, 5).unwrap();
        let writes = &chain.transport().writes;
        assert_eq!(writes.len(), font::DIGITS);
        assert_eq!(writes[0], vec![0x01, font::glyph('5')]);
    }

    #[test]
    fn reset_restores_defaults_and_dirties() {
        let mut chain = batched(2);
        chain.set_value(0, 44).unwrap();
        chain.set_power(1, false).unwrap();
        chain.mark_all_clean();
        chain.reset();
        assert!(chain.modules().all(|m| *m == ModuleState::default()));
        assert!(chain.is_dirty(0).unwrap() && chain.is_dirty(1).unwrap());
    }
}
