//! Build script for stepchoir-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates drives.toml at compile time

use std::collections::BTreeMap;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Channels the bank (and the serial pin map) can address
const MAX_CHANNELS: usize = 8;

/// GPIO pins on RP2040
const GPIO_COUNT: u32 = 30;

/// GPIO0/GPIO1 are the UART0 command stream
const SERIAL_PINS: [u32; 2] = [0, 1];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate drives.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=drives.toml");

    let config_path = Path::new("drives.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: drives.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds drives.toml to know how drives are wired.   ║\n\
            ║  Please create one in the stepchoir-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read drives.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in drives.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_drive(&config, &mut errors);
    validate_channels(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid drives.toml                                      ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=drives.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate the [drive] timing section
fn validate_drive(config: &toml::Value, errors: &mut Vec<String>) {
    let drive = match config.get("drive") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[drive] must be a table".to_string());
            return;
        }
        None => return,
    };

    for key in drive.keys() {
        if !["resolution_us", "reset_step_delay_ms"].contains(&key.as_str()) {
            errors.push(format!("[drive] unknown key '{}'", key));
        }
    }

    match drive.get("resolution_us") {
        Some(toml::Value::Integer(us)) if *us < 1 || *us > 10_000 => {
            errors.push("[drive] resolution_us must be 1-10000".to_string());
        }
        Some(toml::Value::Integer(_)) | None => {}
        Some(_) => errors.push("[drive] resolution_us must be an integer".to_string()),
    }

    match drive.get("reset_step_delay_ms") {
        Some(toml::Value::Integer(ms)) if *ms < 0 || *ms > 1000 => {
            errors.push("[drive] reset_step_delay_ms must be 0-1000".to_string());
        }
        Some(toml::Value::Integer(_)) | None => {}
        Some(_) => errors.push("[drive] reset_step_delay_ms must be an integer".to_string()),
    }
}

/// Validate channel configurations
fn validate_channels(config: &toml::Value, errors: &mut Vec<String>) {
    let channels = match config.get("channel") {
        Some(toml::Value::Table(t)) => t,
        _ => {
            errors.push("Missing [channel.*] section - at least one drive is required".to_string());
            return;
        }
    };

    if channels.len() > MAX_CHANNELS {
        errors.push(format!("At most {} [channel.*] sections allowed", MAX_CHANNELS));
    }

    // Pin number -> channel that claimed it
    let mut used_pins: BTreeMap<u32, String> = BTreeMap::new();

    for (name, channel) in channels {
        if name.len() > 8 {
            errors.push(format!("[channel.{}] label longer than 8 characters", name));
        }

        let channel = match channel {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("[channel.{}] must be a table", name));
                continue;
            }
        };

        for key in ["step_pin", "dir_pin"] {
            match channel.get(key) {
                Some(toml::Value::String(pin)) => match parse_pin(pin) {
                    Some(num) if SERIAL_PINS.contains(&num) => errors.push(format!(
                        "[channel.{}] {} gpio{} is reserved for serial",
                        name, key, num
                    )),
                    Some(num) => {
                        if let Some(owner) = used_pins.insert(num, name.clone()) {
                            errors.push(format!(
                                "[channel.{}] {} gpio{} already used by {}",
                                name, key, num, owner
                            ));
                        }
                    }
                    None => errors.push(format!(
                        "[channel.{}] {} '{}' is not a valid pin",
                        name, key, pin
                    )),
                },
                Some(_) => errors.push(format!("[channel.{}] {} must be a string", name, key)),
                None => errors.push(format!("[channel.{}] missing '{}'", name, key)),
            }
        }

        if let Some(drive) = channel.get("drive") {
            if !matches!(drive.as_str(), Some("3.5" | "5.25")) {
                errors.push(format!("[channel.{}] drive must be '3.5' or '5.25'", name));
            }
        }

        if let Some(max) = channel.get("max_position") {
            if !matches!(max.as_integer(), Some(1..=65535)) {
                errors.push(format!("[channel.{}] max_position must be 1-65535", name));
            }
        }

        if let Some(enabled) = channel.get("enabled") {
            if !enabled.is_bool() {
                errors.push(format!("[channel.{}] enabled must be true or false", name));
            }
        }
    }
}

/// Parse "gpioN" / "!gpioN" into a pin number
fn parse_pin(s: &str) -> Option<u32> {
    let s = s.strip_prefix('!').unwrap_or(s);
    let pin: u32 = s.strip_prefix("gpio")?.parse().ok()?;
    (pin < GPIO_COUNT).then_some(pin)
}
