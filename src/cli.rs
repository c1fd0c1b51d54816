// CLI definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use x50q_keyboard::{Effect, RgbColor};

#[derive(Parser, Debug)]
#[command(name = "x50q")]
#[command(author, version, about = "X50Q RGB keyboard driver")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/x50q/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which lighting state a command applies to
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[group(multiple = false)]
pub struct Target {
    /// Only the state right after a key press
    #[arg(long)]
    pub active: bool,
    /// Only the state while keys are not pressed
    #[arg(long)]
    pub idle: bool,
    /// Both states (default)
    #[arg(long)]
    pub both: bool,
}

impl Target {
    pub fn idle(&self) -> bool {
        self.both || !self.active
    }

    pub fn active(&self) -> bool {
        self.both || !self.idle
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Query Commands ===
    /// Get active profile and firmware version
    #[command(visible_aliases = ["info", "s"])]
    Status,

    /// Print profile and volume key events until Ctrl-C
    #[command(visible_alias = "w")]
    Watch {
        /// Seconds between status polls
        #[arg(short, long, default_value = "1")]
        interval: u64,
    },

    /// Show the effective configuration
    Config {
        /// Save it to the configuration file
        #[arg(long)]
        write: bool,
    },

    // === Set Commands ===
    /// Activate a built-in profile
    #[command(visible_alias = "sp")]
    SetProfile {
        /// Profile number (1-6)
        #[arg(value_parser = clap::value_parser!(u8).range(1..7))]
        profile: u8,
    },

    /// Run the vendor initialization sequence (takes several seconds)
    Reset,

    /// Light every key with one static color
    #[command(visible_alias = "c")]
    Color {
        /// Hex color: RGB or RRGGBB, optional leading '#'
        color: RgbColor,
        #[command(flatten)]
        target: Target,
    },

    /// Apply one effect to every key
    #[command(visible_alias = "e")]
    Effect {
        /// set-color, breadth, cycle, blink, ripple, inwards-ripple, laser (or 0-7)
        effect: Effect,
        #[command(flatten)]
        target: Target,
    },

    /// Set how long keys stay active after a press
    #[command(visible_alias = "d")]
    Duration {
        /// Seconds (0-255)
        seconds: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("x50q").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_set_profile_range() {
        assert!(matches!(
            parse(&["set-profile", "6"]).command,
            Some(Commands::SetProfile { profile: 6 })
        ));
        assert!(Cli::try_parse_from(["x50q", "set-profile", "0"]).is_err());
        assert!(Cli::try_parse_from(["x50q", "set-profile", "7"]).is_err());
    }

    #[test]
    fn test_color_target() {
        match parse(&["color", "#ff0000", "--active"]).command {
            Some(Commands::Color { color, target }) => {
                assert_eq!(color, RgbColor::RED);
                assert!(target.active());
                assert!(!target.idle());
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse(&["--json", "color", "0f0"]).command {
            Some(Commands::Color { target, .. }) => {
                assert!(target.active() && target.idle());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["x50q", "color", "fff", "--active", "--idle"]).is_err());
    }

    #[test]
    fn test_effect_by_name() {
        match parse(&["effect", "inwards-ripple", "--idle"]).command {
            Some(Commands::Effect { effect, target }) => {
                assert_eq!(effect, Effect::InwardsRipple);
                assert!(target.idle() && !target.active());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["x50q", "effect", "sparkle"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["status", "--log-level", "debug", "--config", "/tmp/x.toml"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
    }
}
