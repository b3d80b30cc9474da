//! Typed views of instrument query responses

use bytes::Bytes;
use ito_shared::content::{self, ContentError, ContentReader};
use std::fmt;
use std::net::Ipv4Addr;

/// First detection preset ID reserved for factory presets
pub const FACTORY_PRESET_ID: u16 = 128;

/// Full spectrum acquired across all active channels
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub wavelengths: Vec<f64>,
    /// One intensity vector per channel, each as long as `wavelengths`
    pub data: Vec<Vec<f32>>,
}

impl Spectrum {
    /// Decode a `#GetSpectrum` content block
    pub fn from_content(content: &Bytes) -> Result<Self, ContentError> {
        let mut reader = ContentReader::new(content.clone());
        let start = reader.read_f64()?;
        let step = reader.read_f64()?;
        let points = reader.read_u32()? as usize;
        let channels = reader.read_u32()? as usize;

        // One dimension empty with the other non-zero would size allocations
        // from an unchecked count
        if (points == 0) != (channels == 0) {
            return Err(ContentError::InvalidValue(format!(
                "spectrum of {points} points on {channels} channels"
            )));
        }

        let needed = points.saturating_mul(channels).saturating_mul(4);
        if reader.remaining() < needed {
            return Err(ContentError::Truncated {
                needed,
                available: reader.remaining(),
            });
        }

        let wavelengths = (0..points).map(|i| start + step * i as f64).collect();
        let mut data = Vec::with_capacity(channels);
        for _ in 0..channels {
            let mut channel = Vec::with_capacity(points);
            for _ in 0..points {
                channel.push(reader.read_f32()?);
            }
            data.push(channel);
        }

        Ok(Self { wavelengths, data })
    }

    /// Tab separated rows: wavelength followed by each channel's intensity
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for (i, wavelength) in self.wavelengths.iter().enumerate() {
            out.push_str(&wavelength.to_string());
            for channel in &self.data {
                out.push('\t');
                out.push_str(&channel[i].to_string());
            }
            out.push('\n');
        }
        out
    }
}

/// Peak offsets used for time of flight distance compensation on one channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakOffsets {
    /// Round-trip delays in nanoseconds
    pub delays: Vec<i32>,
    /// Wavelength boundaries in counts
    pub boundaries: Vec<i32>,
}

impl PeakOffsets {
    /// Decode packed (delay, boundary) pairs
    pub fn from_content(content: &Bytes) -> Result<Self, ContentError> {
        let values = content::i32_array(content)?;
        if values.len() % 2 != 0 {
            return Err(ContentError::Misaligned {
                len: content.len(),
                width: 8,
            });
        }

        let (delays, boundaries) = values.chunks(2).map(|pair| (pair[0], pair[1])).unzip();
        Ok(Self { delays, boundaries })
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.delays.iter().copied().zip(self.boundaries.iter().copied())
    }
}

/// Which spectral feature the detector tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeakMode {
    Valley,
    Peak,
}

/// A peak detection preset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetectionSetting {
    pub setting_id: u16,
    pub name: String,
    pub description: String,
    pub boxcar_length: u16,
    pub diff_filter_length: u16,
    pub lockout: u16,
    pub threshold: i32,
    pub mode: PeakMode,
}

impl DetectionSetting {
    /// Decode a `#GetDetectionSetting` content block
    pub fn from_content(content: &Bytes) -> Result<Self, ContentError> {
        let mut reader = ContentReader::new(content.clone());
        let setting_id = reader.read_u16()?;
        let name = reader.read_short_string()?;
        let description = reader.read_short_string()?;
        let boxcar_length = reader.read_u16()?;
        let diff_filter_length = reader.read_u16()?;
        let lockout = reader.read_u16()?;
        let threshold = reader.read_i32()?;
        let mode = match reader.read_u8()? {
            0 => PeakMode::Valley,
            1 => PeakMode::Peak,
            other => return Err(ContentError::InvalidValue(format!("peak mode {other}"))),
        };

        Ok(Self {
            setting_id,
            name,
            description,
            boxcar_length,
            diff_filter_length,
            lockout,
            threshold,
            mode,
        })
    }

    /// Custom presets can be deleted and re-created; factory ones cannot
    pub fn is_custom(&self) -> bool {
        self.setting_id < FACTORY_PRESET_ID
    }
}

/// Network address, netmask and gateway of the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSettings {
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
}

impl NetworkSettings {
    pub fn from_content(content: &Bytes) -> Result<Self, ContentError> {
        let mut reader = ContentReader::new(content.clone());
        Ok(Self {
            address: reader.read_ipv4()?,
            netmask: reader.read_ipv4()?,
            gateway: reader.read_ipv4()?,
        })
    }
}

impl fmt::Display for NetworkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.address, self.netmask, self.gateway)
    }
}

/// Everything `_get_config` reads, in query order
#[derive(Debug, Clone)]
pub struct InstrumentConfig {
    pub channel_count: u32,
    pub max_peak_count_per_channel: i32,
    pub instrument_name: String,
    pub fpga_version: String,
    pub firmware_version: String,
    pub serial_number: String,
    pub active_full_spectrum_channels: Vec<i32>,
    pub available_laser_scan_speeds: Vec<i32>,
    pub laser_scan_speed: i32,
    pub instrument_utc_date_time: String,
    pub ntp_enabled: bool,
    pub ntp_server: String,
    pub ptp_enabled: bool,
    /// Indexed by channel number minus one
    pub peak_offsets: Vec<PeakOffsets>,
    /// Preset assigned to each channel, indexed by channel number minus one
    pub channel_detection_settings: Vec<DetectionSetting>,
    pub network_ip_mode: String,
    pub active_network_settings: NetworkSettings,
    pub static_network_settings: NetworkSettings,
}
