//! Command handlers for the CLI application.
//!
//! - `query`: Read-only commands (status, watch, config)
//! - `set`: Setting commands (set-profile, reset, color, effect, duration)

pub mod query;
pub mod set;

use anyhow::Context;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use x50q_keyboard::{DeviceConfig, Keyboard};

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Open the keyboard described by `config`.
pub fn open_keyboard(config: &DeviceConfig) -> anyhow::Result<Keyboard> {
    let keyboard = Keyboard::open_with(config).with_context(|| {
        format!(
            "No X50Q found (VID {:04X} PID {:04X})",
            config.vendor_id, config.product_id
        )
    })?;
    if let Some(info) = keyboard.device_info() {
        debug!(
            "Opened {} at {} (OUT endpoint 0x{:02X})",
            info.product_name.as_deref().unwrap_or("keyboard"),
            info.hid_path,
            info.out_endpoint
        );
    }
    Ok(keyboard)
}

/// Set up a Ctrl-C handler that sets the given flag to false when triggered.
/// Returns the Arc<AtomicBool> for use in the main loop.
pub fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .ok();

    running
}
