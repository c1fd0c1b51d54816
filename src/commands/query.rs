//! Query (read-only) command handlers.

use super::{open_keyboard, setup_interrupt_handler, CommandResult};
use crate::config::AppConfig;
use serde_json::json;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::warn;
use x50q_keyboard::Status;

fn status_json(status: &Status) -> serde_json::Value {
    json!({
        "profile": status.profile,
        "firmware_version": status.firmware_version,
        "unknown": [status.unknown_1, status.unknown_2, status.unknown_3],
        "tested_firmware": status.is_tested_firmware(),
    })
}

/// Get active profile and firmware version
pub fn status(config: &AppConfig, as_json: bool) -> CommandResult {
    let mut keyboard = open_keyboard(&config.device)?;
    let status = keyboard.status()?;
    if !status.is_tested_firmware() {
        warn!(
            "Firmware version 0x{:02X} has not been tested with this driver",
            status.firmware_version
        );
    }

    if as_json {
        println!("{}", status_json(&status));
        return Ok(());
    }
    println!("Profile:  {}", status.profile);
    println!("Firmware: 0x{:02X}", status.firmware_version);
    println!(
        "Unknown:  {:02X} {:02X} {:02X}",
        status.unknown_1, status.unknown_2, status.unknown_3
    );
    Ok(())
}

/// Poll the keyboard and print notifications until Ctrl-C
///
/// Notifications only arrive while an exchange is waiting for its
/// acknowledgement, so the status query doubles as the poll.
pub fn watch(config: &AppConfig, interval: u64, as_json: bool) -> CommandResult {
    let mut keyboard = open_keyboard(&config.device)?;
    keyboard.on_profile_change(move |profile| {
        if as_json {
            println!("{}", json!({ "event": "profile", "profile": profile }));
        } else {
            println!("Profile changed: {profile}");
        }
    });
    keyboard.on_volume_key(move |pressed| {
        if as_json {
            println!("{}", json!({ "event": "volume", "pressed": pressed }));
        } else {
            println!("Volume key {}", if pressed { "pressed" } else { "released" });
        }
    });

    let running = setup_interrupt_handler();
    if !as_json {
        println!("Watching for events (Ctrl-C to stop)...");
    }

    let mut last_profile = None;
    while running.load(Ordering::SeqCst) {
        let status = keyboard.status()?;
        if last_profile != Some(status.profile) {
            if as_json {
                println!("{}", json!({ "event": "status", "status": status_json(&status) }));
            } else {
                println!("Active profile: {}", status.profile);
            }
            last_profile = Some(status.profile);
        }
        std::thread::sleep(Duration::from_secs(interval));
    }
    Ok(())
}

/// Show the effective configuration, optionally saving it
pub fn show_config(config: &AppConfig, path: &Path, write: bool, as_json: bool) -> CommandResult {
    if write {
        config.save(path)?;
        eprintln!("Saved {}", path.display());
    }
    if as_json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("# {}", path.display());
        print!("{}", config.to_toml()?);
    }
    Ok(())
}
