//! Setting command handlers.

use super::{open_keyboard, CommandResult};
use crate::cli::Target;
use crate::config::AppConfig;
use tracing::info;
use x50q_keyboard::{ByteSeconds, ColorTable, Effect, RgbColor, KEY_COUNT};

/// Activate a built-in profile
pub fn set_profile(config: &AppConfig, profile: u8) -> CommandResult {
    let mut keyboard = open_keyboard(&config.device)?;
    keyboard.set_builtin_profile(profile)?;
    println!("Profile set to {profile}");
    Ok(())
}

/// Run the vendor initialization sequence
pub fn reset(config: &AppConfig) -> CommandResult {
    let mut keyboard = open_keyboard(&config.device)?;
    println!("Resetting keyboard (this takes a few seconds)...");
    let status = keyboard.initialize()?;
    info!("Initialized, firmware 0x{:02X}", status.firmware_version);
    println!("Reset complete");
    Ok(())
}

/// Light every key with `color`
///
/// Effects are reset to static color first so the table is actually shown.
pub fn color(config: &AppConfig, color: RgbColor, target: Target) -> CommandResult {
    let mut keyboard = open_keyboard(&config.device)?;
    let table = ColorTable::filled(color);
    let effects = [Effect::SetColor; KEY_COUNT];

    if target.idle() {
        keyboard.apply_effects_idle(&effects)?;
        keyboard.apply_colors_idle(table.planes())?;
    }
    if target.active() {
        keyboard.apply_effects_active(&effects)?;
        keyboard.apply_colors_active(table.planes())?;
    }
    println!("Color set to {color}");
    Ok(())
}

/// Apply `effect` to every key
pub fn effect(config: &AppConfig, effect: Effect, target: Target) -> CommandResult {
    let mut keyboard = open_keyboard(&config.device)?;
    let effects = [effect; KEY_COUNT];

    if target.idle() {
        keyboard.apply_effects_idle(&effects)?;
    }
    if target.active() {
        keyboard.apply_effects_active(&effects)?;
    }
    println!("Effect set to {effect}");
    Ok(())
}

/// Set the active duration of every key
pub fn duration(config: &AppConfig, seconds: u8) -> CommandResult {
    let mut keyboard = open_keyboard(&config.device)?;
    keyboard.apply_active_duration(&[ByteSeconds::from_secs(seconds); KEY_COUNT])?;
    println!("Active duration set to {seconds}s");
    Ok(())
}
