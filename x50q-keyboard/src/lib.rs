//! High-level keyboard interface for the X50Q keyboard
//!
//! `Keyboard` maps each operation onto one command exchange:
//!
//! | Operation               | Command/Sub   | Size |
//! |-------------------------|---------------|------|
//! | `status`                | 0x81          | 0    |
//! | `set_builtin_profile`   | 0x01 / n      | 0    |
//! | `apply_colors_idle`     | 0x09 / 0x06   | 432  |
//! | `apply_colors_active`   | 0x0A / 0x06   | 432  |
//! | `apply_effects_idle`    | 0x0D / 0x06   | 144  |
//! | `apply_effects_active`  | 0x0E / 0x06   | 144  |
//! | `apply_active_duration` | 0x0F / 0x06   | 144  |
//!
//! Nothing is cached: every call uploads the whole table. Shorter inputs are
//! padded with zeros.

pub mod error;
pub mod led;
pub mod settings;

pub use error::KeyboardError;
pub use led::{ByteSeconds, ColorTable, Effect, RgbColor, COLOR_TABLE_SIZE, KEY_COUNT};
pub use settings::Status;

pub use x50q_transport::{DeviceConfig, Notification, TransportDeviceInfo};

use tracing::{debug, warn};
use x50q_transport::protocol::{cmd, MAX_PROFILE};
use x50q_transport::{ExchangeEngine, HidInput, InputChannel, OutputChannel, UsbOutput};

/// Profile selected by the vendor initialization sequence
const SETUP_PROFILE: u8 = 6;

/// Keyboard session owning both channels
///
/// Not meant to be shared across threads: every operation blocks the caller
/// until the keyboard acknowledges, and notification callbacks run inside
/// that wait.
pub struct Keyboard<O = UsbOutput, I = HidInput> {
    engine: ExchangeEngine<O, I>,
    info: Option<TransportDeviceInfo>,
}

impl Keyboard {
    /// Open the keyboard with the default identifiers
    pub fn open() -> Result<Self, KeyboardError> {
        Self::open_with(&DeviceConfig::default())
    }

    /// Open the keyboard described by `config`
    pub fn open_with(config: &DeviceConfig) -> Result<Self, KeyboardError> {
        let (output, input, info) = x50q_transport::open_device(config)?;
        Ok(Self {
            engine: ExchangeEngine::new(output, input),
            info: Some(info),
        })
    }
}

impl<O: OutputChannel, I: InputChannel> Keyboard<O, I> {
    /// Build a session over already opened channels
    pub fn from_channels(output: O, input: I) -> Self {
        Self {
            engine: ExchangeEngine::new(output, input),
            info: None,
        }
    }

    /// Device information, if opened through discovery
    pub fn device_info(&self) -> Option<&TransportDeviceInfo> {
        self.info.as_ref()
    }

    /// Release the channels
    pub fn into_channels(self) -> (O, I) {
        self.engine.into_channels()
    }

    // === Notifications ===

    /// Called with the new profile (1-6) when it is switched on the keyboard
    pub fn on_profile_change(&mut self, callback: impl FnMut(u8) + 'static) {
        self.engine.router_mut().set_profile_callback(callback);
    }

    /// Called with `true`/`false` when the volume key is pressed/released
    pub fn on_volume_key(&mut self, callback: impl FnMut(bool) + 'static) {
        self.engine.router_mut().set_volume_callback(callback);
    }

    pub fn clear_callbacks(&mut self) {
        let router = self.engine.router_mut();
        router.clear_profile_callback();
        router.clear_volume_callback();
    }

    // === Status & profiles ===

    /// Query profile and firmware information
    pub fn status(&mut self) -> Result<Status, KeyboardError> {
        Ok(self.engine.status_exchange()?.into())
    }

    /// Activate built-in profile 1-6
    pub fn set_builtin_profile(&mut self, profile: u8) -> Result<(), KeyboardError> {
        if !(1..=MAX_PROFILE).contains(&profile) {
            return Err(KeyboardError::InvalidParameter(format!(
                "Profile must be 1-{MAX_PROFILE}, got {profile}"
            )));
        }
        self.select_profile_raw(profile)
    }

    /// Send the profile selection command without range checks
    ///
    /// Index 0 is accepted by the keyboard but is not a profile; see
    /// [`Keyboard::slow_reset`].
    pub fn select_profile_raw(&mut self, index: u8) -> Result<(), KeyboardError> {
        self.engine.exchange(cmd::SELECT_PROFILE, index, 0, &[])?;
        Ok(())
    }

    /// Select "profile 0": an undocumented operation that takes several
    /// seconds and leaves profile 6 active afterwards
    pub fn slow_reset(&mut self) -> Result<(), KeyboardError> {
        debug!("Sending slow reset (profile 0)");
        self.select_profile_raw(0)
    }

    /// Replay the sequence the vendor software runs when the keyboard is
    /// connected
    ///
    /// Not needed in normal use; the keyboard resets itself when replugged.
    /// Returns the status read at the start.
    pub fn initialize(&mut self) -> Result<Status, KeyboardError> {
        let status = self.status()?;
        if !status.is_tested_firmware() {
            warn!(
                "Firmware version 0x{:02X} has not been tested with this driver",
                status.firmware_version
            );
        }

        self.set_builtin_profile(SETUP_PROFILE)?;
        self.apply_effects_active(&[])?;
        self.apply_effects_idle(&[])?;
        self.slow_reset()?;
        self.set_builtin_profile(SETUP_PROFILE)?;
        Ok(status)
    }

    // === Lighting ===

    fn upload_colors(&mut self, command: u8, planes: &[[u8; KEY_COUNT]]) -> Result<(), KeyboardError> {
        let data = planes.concat();
        self.engine
            .exchange(command, cmd::SUB_PER_KEY, COLOR_TABLE_SIZE, &data)?;
        Ok(())
    }

    /// Set the color shown while keys are not pressed
    ///
    /// `planes` holds up to three 144-entry planes: red, green, blue.
    pub fn apply_colors_idle(&mut self, planes: &[[u8; KEY_COUNT]]) -> Result<(), KeyboardError> {
        self.upload_colors(cmd::SET_IDLE_COLORS, planes)
    }

    /// Set the color shown right after a key is pressed
    ///
    /// Same layout as [`Keyboard::apply_colors_idle`].
    pub fn apply_colors_active(&mut self, planes: &[[u8; KEY_COUNT]]) -> Result<(), KeyboardError> {
        self.upload_colors(cmd::SET_ACTIVE_COLORS, planes)
    }

    fn upload_effects(&mut self, command: u8, effects: &[Effect]) -> Result<(), KeyboardError> {
        let data: Vec<u8> = effects.iter().map(|e| e.as_u8()).collect();
        self.engine
            .exchange(command, cmd::SUB_PER_KEY, KEY_COUNT, &data)?;
        Ok(())
    }

    /// Set the per-key effect while keys are not pressed (up to 144)
    pub fn apply_effects_idle(&mut self, effects: &[Effect]) -> Result<(), KeyboardError> {
        self.upload_effects(cmd::SET_IDLE_EFFECTS, effects)
    }

    /// Set the per-key effect after a key press (up to 144)
    pub fn apply_effects_active(&mut self, effects: &[Effect]) -> Result<(), KeyboardError> {
        self.upload_effects(cmd::SET_ACTIVE_EFFECTS, effects)
    }

    /// Set how long each key stays in its active state after a press
    pub fn apply_active_duration(&mut self, durations: &[ByteSeconds]) -> Result<(), KeyboardError> {
        let data: Vec<u8> = durations.iter().map(|d| d.0).collect();
        self.engine
            .exchange(cmd::SET_ACTIVE_DURATION, cmd::SUB_PER_KEY, KEY_COUNT, &data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x50q_transport::mock::{ack, RecordingOutput, ScriptedInput};
    use x50q_transport::protocol::code;

    fn keyboard(reports: Vec<Vec<u8>>) -> Keyboard<RecordingOutput, ScriptedInput> {
        Keyboard::from_channels(RecordingOutput::new(), ScriptedInput::new(reports))
    }

    #[test]
    fn test_set_builtin_profile_range() {
        let mut kb = keyboard(vec![]);
        for profile in [0, 7, 255] {
            assert!(matches!(
                kb.set_builtin_profile(profile),
                Err(KeyboardError::InvalidParameter(_))
            ));
        }
        let (out, _) = kb.into_channels();
        assert!(out.frames.is_empty());
    }

    #[test]
    fn test_slow_reset_sends_profile_zero() {
        let mut kb = keyboard(vec![ack(cmd::SELECT_PROFILE)]);
        kb.slow_reset().unwrap();
        let (out, _) = kb.into_channels();
        assert_eq!(&out.frames[0][..4], &[0x07, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_effects_wire_bytes() {
        let mut kb = keyboard(vec![ack(cmd::SET_ACTIVE_EFFECTS); 3]);
        kb.apply_effects_active(&[Effect::Cycle, Effect::Laser, Effect::Blink])
            .unwrap();
        let (out, _) = kb.into_channels();
        assert_eq!(out.frames.len(), 3);
        assert_eq!(&out.frames[0][..7], &[0x07, 0x0E, 0x06, 0x00, 2, 7, 4]);
    }

    #[test]
    fn test_too_many_effects() {
        let mut kb = keyboard(vec![]);
        let effects = [Effect::Cycle; KEY_COUNT + 1];
        assert!(matches!(
            kb.apply_effects_idle(&effects),
            Err(KeyboardError::PayloadTooLarge { len: 145, max: 144 })
        ));
    }

    #[test]
    fn test_active_duration_bytes() {
        let mut kb = keyboard(vec![ack(cmd::SET_ACTIVE_DURATION); 3]);
        let durations = [ByteSeconds(1); KEY_COUNT];
        kb.apply_active_duration(&durations).unwrap();
        let (out, _) = kb.into_channels();
        assert_eq!(out.frames.len(), 3);
        assert_eq!(out.frames[2][3], 2);
        assert!(out.frames[2][4..28].iter().all(|&b| b == 1));
        assert!(out.frames[2][28..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_status_out_of_range_profile_is_protocol_error() {
        let mut kb = keyboard(vec![vec![0x08, 0x00, 0x08, 0x81, 9, 0, 0x40, 0, 0]]);
        match kb.status() {
            Err(KeyboardError::Protocol(e)) => assert_eq!(e.code, code::STATUS_PROFILE),
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn test_initialize_sequence() {
        let mut reports = vec![vec![0x08, 0x00, 0x08, 0x81, 2, 0, 0x40, 0, 0]];
        reports.push(ack(cmd::SELECT_PROFILE));
        reports.extend(vec![ack(cmd::SET_ACTIVE_EFFECTS); 3]);
        reports.extend(vec![ack(cmd::SET_IDLE_EFFECTS); 3]);
        reports.push(ack(cmd::SELECT_PROFILE));
        reports.push(ack(cmd::SELECT_PROFILE));

        let mut kb = keyboard(reports);
        let status = kb.initialize().unwrap();
        assert_eq!(status.profile, 2);

        let (out, input) = kb.into_channels();
        let headers: Vec<[u8; 3]> = out.frames.iter().map(|f| [f[1], f[2], f[3]]).collect();
        assert_eq!(
            headers,
            vec![
                [0x81, 0x00, 0],
                [0x01, 0x06, 0],
                [0x0E, 0x06, 0],
                [0x0E, 0x06, 1],
                [0x0E, 0x06, 2],
                [0x0D, 0x06, 0],
                [0x0D, 0x06, 1],
                [0x0D, 0x06, 2],
                [0x01, 0x00, 0],
                [0x01, 0x06, 0],
            ]
        );
        assert!(input.is_drained());
    }
}
