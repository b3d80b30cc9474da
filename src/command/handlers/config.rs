//! Configuration export handler (`_get_config`)
//!
//! Reads the instrument settings and writes a command script that restores
//! them when loaded back with `_load_commands`. Detection presets are
//! rewritten in four passes so no channel ever points at a preset ID that is
//! deleted or not created yet. Network settings go last because applying
//! them may drop the connection.

use super::HandlerContext;
use crate::command::CommandResult;
use crate::instrument::{DetectionSetting, InstrumentConfig, PeakMode, FACTORY_PRESET_ID};
use anyhow::{Context, Result};
use ito_shared::optics;
use std::path::{Path, PathBuf};
use tracing::info;

fn section(out: &mut String, title: &str) {
    out.push_str(&format!("\n; ***** {} *****\n", title));
}

fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}

fn single_line(text: &str) -> String {
    text.replace(|c: char| c == '\r' || c == '\n', "")
}

/// Custom presets in use, first appearance wins, factory presets skipped
fn used_custom_presets(config: &InstrumentConfig) -> Vec<&DetectionSetting> {
    let mut used: Vec<&DetectionSetting> = Vec::new();
    for preset in &config.channel_detection_settings {
        if preset.is_custom() && !used.iter().any(|p| p.setting_id == preset.setting_id) {
            used.push(preset);
        }
    }
    used
}

/// Render the restore script for a configuration snapshot
pub fn render_config_script(config: &InstrumentConfig) -> String {
    let mut out = String::new();
    let channels = 1..=config.channel_count;

    section(&mut out, "SYSTEM");
    line(&mut out, format!("#SetInstrumentName {}", single_line(&config.instrument_name)));
    line(&mut out, "");

    section(&mut out, "ACQUISITION");
    line(
        &mut out,
        "; Active full spectrum channels settings - channels for which full spectrum data is acquired",
    );
    if !config.active_full_spectrum_channels.is_empty() {
        let list: Vec<String> = config
            .active_full_spectrum_channels
            .iter()
            .map(|ch| ch.to_string())
            .collect();
        line(&mut out, format!("#SetActiveFullSpectrumDutChannelNumbers {}", list.join(" ")));
    }
    line(&mut out, "");

    section(&mut out, "LASER");
    line(&mut out, format!("#SetLaserScanSpeed {}", config.laser_scan_speed));
    line(&mut out, "");

    section(&mut out, "HOST");
    if config.ntp_enabled {
        line(&mut out, "#SetNtpEnabled 1");
        line(&mut out, format!("#SetNtpServer {}", config.ntp_server));
    } else {
        line(&mut out, "#SetNtpEnabled 0");
    }
    line(&mut out, format!("#SetPtpEnabled {}", u8::from(config.ptp_enabled)));
    line(&mut out, "");

    section(&mut out, "DETECTION");
    line(&mut out, "; Peak offsets (SoL compensation)");
    for (channel, offsets) in channels.clone().zip(&config.peak_offsets) {
        if offsets.is_empty() {
            line(&mut out, format!("#ClearPeakOffsets {}", channel));
        } else {
            let mut args = vec![channel.to_string(), offsets.delays.len().to_string()];
            for (delay, boundary) in offsets.pairs() {
                args.push(delay.to_string());
                args.push(boundary.to_string());
            }
            line(&mut out, format!("#SetPeakOffsets {}", args.join(" ")));
        }
    }

    line(&mut out, "\n; Peak detection settings");
    line(
        &mut out,
        format!("; 1. assigning factory presets to all channels (ID {})", FACTORY_PRESET_ID),
    );
    for channel in channels.clone() {
        line(
            &mut out,
            format!("#SetChannelDetectionSettingId {} {}", channel, FACTORY_PRESET_ID),
        );
    }

    line(&mut out, "\n; 2. removing all user presets");
    for preset_id in 0..FACTORY_PRESET_ID {
        line(&mut out, format!("#RemoveDetectionSetting {}", preset_id));
    }

    line(&mut out, "\n; 3. adding new user presets");
    for preset in used_custom_presets(config) {
        let mode = match preset.mode {
            PeakMode::Valley => 0,
            PeakMode::Peak => 1,
        };
        line(
            &mut out,
            format!(
                "#AddDetectionSetting {} '{}' '{}' {} {} {} {} {}",
                preset.setting_id,
                single_line(&preset.name),
                single_line(&preset.description),
                preset.boxcar_length,
                preset.diff_filter_length,
                preset.lockout,
                preset.threshold,
                mode
            ),
        );
    }

    line(&mut out, "\n; 4. assigning presets to channels");
    for (channel, preset) in channels.zip(&config.channel_detection_settings) {
        line(
            &mut out,
            format!("#SetChannelDetectionSettingId {} {}", channel, preset.setting_id),
        );
    }
    line(&mut out, "");

    section(&mut out, "NETWORK");
    if config.network_ip_mode.eq_ignore_ascii_case("static") {
        line(&mut out, "#EnableStaticIpMode");
    } else {
        line(&mut out, "#EnableDynamicIpMode");
    }
    line(
        &mut out,
        format!("#SetStaticNetworkSettings {}", config.active_network_settings),
    );
    line(&mut out, "");

    out
}

/// Write the human readable parts of the snapshot to the session log
fn log_config(config: &InstrumentConfig) {
    info!("The number of channels on the instrument - {}", config.channel_count);
    info!(
        "The maximum number of peaks that can be returned on any channel - {}",
        config.max_peak_count_per_channel
    );
    info!("The user programmable name of the instrument (settable) - {}", config.instrument_name);
    info!("The version of FPGA code on the instrument - {}", config.fpga_version);
    info!("The version of firmware on the instrument - {}", config.firmware_version);
    info!("The instrument serial number - {}", config.serial_number);

    if config.active_full_spectrum_channels.is_empty() {
        info!("The channels for which full spectrum data is acquired - no active channels");
    } else {
        info!(
            "The channels for which full spectrum data is acquired - {:?}",
            config.active_full_spectrum_channels
        );
    }

    info!(
        "Available laser scan speeds that are settable on the instrument - {:?}",
        config.available_laser_scan_speeds
    );
    info!("The current laser scan speed of the instrument - {}", config.laser_scan_speed);

    info!("The UTC time on the instrument - {}", config.instrument_utc_date_time);
    info!("NTP enabled - {}, NTP server - {}", config.ntp_enabled, config.ntp_server);
    info!("PTP enabled - {}", config.ptp_enabled);

    info!("The peak offsets used for time of flight distance compensation: ch - offsets (dist[m], boundary[counts])");
    for (channel, offsets) in (1..=config.channel_count).zip(&config.peak_offsets) {
        if offsets.is_empty() {
            info!("{} - no offsets", channel);
        } else {
            let pairs: Vec<String> = offsets
                .pairs()
                .map(|(delay, boundary)| {
                    format!("({}, {})", optics::delay_ns_to_metres(delay).round(), boundary)
                })
                .collect();
            info!("{} - {}", channel, pairs.join(", "));
        }
    }

    info!(
        "The network address, netmask, and gateway that are currently active on the instrument - {}",
        config.active_network_settings
    );
    info!(
        "The network address, netmask, and gateway that are active when the instrument is in static mode - {}",
        config.static_network_settings
    );
    info!("The network ip configuration mode - {}", config.network_ip_mode);
}

async fn export_config(ctx: &HandlerContext<'_>, path: &Path) -> Result<String> {
    let config = ctx
        .instrument()
        .read_config()
        .await
        .context("cannot read instrument configuration")?;
    log_config(&config);

    tokio::fs::write(path, render_config_script(&config))
        .await
        .with_context(|| format!("cannot write {}", path.display()))?;

    Ok(format!("Configuration script saved to {}", path.display()))
}

/// File name used when `_get_config` gets no argument
fn default_config_path(address: &str) -> PathBuf {
    PathBuf::from(format!("{}_apply_commands.txt", address.replace('.', "_")))
}

/// Handle `_get_config [file]`
pub async fn handle_get_config(ctx: &HandlerContext<'_>) -> CommandResult {
    let path = match ctx.param() {
        Some(name) => PathBuf::from(name),
        None => default_config_path(ctx.address),
    };

    match export_config(ctx, &path).await {
        Ok(message) => CommandResult::Completed {
            message,
            inject: Vec::new(),
        },
        Err(e) => CommandResult::Failed {
            message: format!("{:#}", e),
        },
    }
}
