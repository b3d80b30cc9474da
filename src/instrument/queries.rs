//! Typed read-only queries against the instrument
//!
//! Every query goes through the session catalog first, so meta-command
//! handlers can only issue commands the firmware actually advertises.

use super::types::{
    DetectionSetting, InstrumentConfig, NetworkSettings, PeakOffsets, Spectrum,
};
use crate::command::CommandCatalog;
use crate::error::QueryError;
use crate::transport::InstrumentTransport;
use ito_shared::content::{self, ContentError};
use ito_shared::Response;

/// Upper bound on the channel count an instrument may report
const MAX_CHANNEL_COUNT: u32 = 1024;

/// Query helper bound to one session's transport and catalog
pub struct Instrument<'a> {
    transport: &'a dyn InstrumentTransport,
    catalog: &'a CommandCatalog,
}

impl<'a> Instrument<'a> {
    pub fn new(transport: &'a dyn InstrumentTransport, catalog: &'a CommandCatalog) -> Self {
        Self { transport, catalog }
    }

    /// Issue a catalog-valid command and turn instrument failures into errors
    pub async fn query(&self, command: &str, params: &str) -> Result<Response, QueryError> {
        if !self.catalog.is_valid(command) {
            return Err(QueryError::Unsupported(command.to_string()));
        }

        let response = self.transport.request(command, params).await?;
        if let Some(message) = response.error() {
            return Err(QueryError::Instrument {
                command: command.to_string(),
                message: message.to_string(),
            });
        }
        Ok(response)
    }

    async fn decode<T>(
        &self,
        command: &str,
        params: &str,
        decode: impl FnOnce(&Response) -> Result<T, ContentError>,
    ) -> Result<T, QueryError> {
        let response = self.query(command, params).await?;
        decode(&response).map_err(|source| QueryError::Malformed {
            command: command.to_string(),
            source,
        })
    }

    async fn text(&self, command: &str) -> Result<String, QueryError> {
        Ok(self.query(command, "").await?.text())
    }

    async fn int(&self, command: &str, params: &str) -> Result<i32, QueryError> {
        self.decode(command, params, |r| content::single_i32(&r.content)).await
    }

    async fn ints(&self, command: &str) -> Result<Vec<i32>, QueryError> {
        self.decode(command, "", |r| content::i32_array(&r.content)).await
    }

    pub async fn channel_count(&self) -> Result<u32, QueryError> {
        const COMMAND: &str = "#GetDutChannelCount";
        let count = self.int(COMMAND, "").await?;
        match u32::try_from(count) {
            Ok(count) if count <= MAX_CHANNEL_COUNT => Ok(count),
            _ => Err(QueryError::Malformed {
                command: COMMAND.to_string(),
                source: ContentError::InvalidValue(format!("channel count {count}")),
            }),
        }
    }

    pub async fn max_peak_count_per_channel(&self) -> Result<i32, QueryError> {
        self.int("#GetMaximumPeakCountPerDutChannel", "").await
    }

    pub async fn instrument_name(&self) -> Result<String, QueryError> {
        self.text("#GetInstrumentName").await
    }

    pub async fn fpga_version(&self) -> Result<String, QueryError> {
        self.text("#GetFpgaVersion").await
    }

    pub async fn firmware_version(&self) -> Result<String, QueryError> {
        self.text("#GetFirmwareVersion").await
    }

    pub async fn serial_number(&self) -> Result<String, QueryError> {
        self.text("#GetSerialNumber").await
    }

    pub async fn active_full_spectrum_channels(&self) -> Result<Vec<i32>, QueryError> {
        self.ints("#GetActiveFullSpectrumDutChannelNumbers").await
    }

    pub async fn available_laser_scan_speeds(&self) -> Result<Vec<i32>, QueryError> {
        self.ints("#GetAvailableLaserScanSpeeds").await
    }

    pub async fn laser_scan_speed(&self) -> Result<i32, QueryError> {
        self.int("#GetLaserScanSpeed", "").await
    }

    pub async fn instrument_utc_date_time(&self) -> Result<String, QueryError> {
        self.text("#GetInstrumentUtcDateTime").await
    }

    pub async fn ntp_enabled(&self) -> Result<bool, QueryError> {
        Ok(self.int("#GetNtpEnabled", "").await? != 0)
    }

    pub async fn ntp_server(&self) -> Result<String, QueryError> {
        self.text("#GetNtpServer").await
    }

    pub async fn ptp_enabled(&self) -> Result<bool, QueryError> {
        Ok(self.int("#GetPtpEnabled", "").await? != 0)
    }

    pub async fn peak_offsets(&self, channel: u32) -> Result<PeakOffsets, QueryError> {
        self.decode("#GetPeakOffsets", &channel.to_string(), |r| {
            PeakOffsets::from_content(&r.content)
        })
        .await
    }

    pub async fn channel_detection_setting_id(&self, channel: u32) -> Result<i32, QueryError> {
        self.int("#GetChannelDetectionSettingId", &channel.to_string()).await
    }

    pub async fn detection_setting(&self, setting_id: i32) -> Result<DetectionSetting, QueryError> {
        self.decode("#GetDetectionSetting", &setting_id.to_string(), |r| {
            DetectionSetting::from_content(&r.content)
        })
        .await
    }

    /// Detection preset currently assigned to a channel
    pub async fn channel_detection_setting(
        &self,
        channel: u32,
    ) -> Result<DetectionSetting, QueryError> {
        let setting_id = self.channel_detection_setting_id(channel).await?;
        self.detection_setting(setting_id).await
    }

    pub async fn network_ip_mode(&self) -> Result<String, QueryError> {
        self.text("#GetNetworkIpMode").await
    }

    pub async fn active_network_settings(&self) -> Result<NetworkSettings, QueryError> {
        self.decode("#GetActiveNetworkSettings", "", |r| {
            NetworkSettings::from_content(&r.content)
        })
        .await
    }

    pub async fn static_network_settings(&self) -> Result<NetworkSettings, QueryError> {
        self.decode("#GetStaticNetworkSettings", "", |r| {
            NetworkSettings::from_content(&r.content)
        })
        .await
    }

    pub async fn spectrum(&self) -> Result<Spectrum, QueryError> {
        self.decode("#GetSpectrum", "", |r| Spectrum::from_content(&r.content))
            .await
    }

    /// Read every setting the config export needs, in a fixed order
    pub async fn read_config(&self) -> Result<InstrumentConfig, QueryError> {
        let channel_count = self.channel_count().await?;
        let max_peak_count_per_channel = self.max_peak_count_per_channel().await?;
        let instrument_name = self.instrument_name().await?;
        let fpga_version = self.fpga_version().await?;
        let firmware_version = self.firmware_version().await?;
        let serial_number = self.serial_number().await?;

        let active_full_spectrum_channels = self.active_full_spectrum_channels().await?;

        let available_laser_scan_speeds = self.available_laser_scan_speeds().await?;
        let laser_scan_speed = self.laser_scan_speed().await?;

        let instrument_utc_date_time = self.instrument_utc_date_time().await?;
        let ntp_enabled = self.ntp_enabled().await?;
        let ntp_server = self.ntp_server().await?;
        let ptp_enabled = self.ptp_enabled().await?;

        let mut peak_offsets = Vec::new();
        for channel in 1..=channel_count {
            peak_offsets.push(self.peak_offsets(channel).await?);
        }

        let mut channel_detection_settings = Vec::new();
        for channel in 1..=channel_count {
            channel_detection_settings.push(self.channel_detection_setting(channel).await?);
        }

        let network_ip_mode = self.network_ip_mode().await?;
        let active_network_settings = self.active_network_settings().await?;
        let static_network_settings = self.static_network_settings().await?;

        Ok(InstrumentConfig {
            channel_count,
            max_peak_count_per_channel,
            instrument_name,
            fpga_version,
            firmware_version,
            serial_number,
            active_full_spectrum_channels,
            available_laser_scan_speeds,
            laser_scan_speed,
            instrument_utc_date_time,
            ntp_enabled,
            ntp_server,
            ptp_enabled,
            peak_offsets,
            channel_detection_settings,
            network_ip_mode,
            active_network_settings,
            static_network_settings,
        })
    }
}
