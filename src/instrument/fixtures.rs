//! Test fixtures: a scripted two channel instrument

use super::types::{DetectionSetting, PeakMode};
use crate::command::CommandCatalog;
use crate::transport::mock::MockTransport;
use bytes::{BufMut, Bytes, BytesMut};
use ito_shared::Response;

pub fn encode_detection_setting(setting: &DetectionSetting) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u16_le(setting.setting_id);
    buf.put_u8(setting.name.len() as u8);
    buf.put_slice(setting.name.as_bytes());
    buf.put_u8(setting.description.len() as u8);
    buf.put_slice(setting.description.as_bytes());
    buf.put_u16_le(setting.boxcar_length);
    buf.put_u16_le(setting.diff_filter_length);
    buf.put_u16_le(setting.lockout);
    buf.put_i32_le(setting.threshold);
    buf.put_u8(match setting.mode {
        PeakMode::Valley => 0,
        PeakMode::Peak => 1,
    });
    buf.freeze()
}

pub fn i32s(values: &[i32]) -> Bytes {
    let mut buf = BytesMut::new();
    for value in values {
        buf.put_i32_le(*value);
    }
    buf.freeze()
}

pub fn custom_preset() -> DetectionSetting {
    DetectionSetting {
        setting_id: 3,
        name: "fbg".into(),
        description: "wide peaks".into(),
        boxcar_length: 250,
        diff_filter_length: 250,
        lockout: 2500,
        threshold: 4000,
        mode: PeakMode::Peak,
    }
}

pub fn factory_preset() -> DetectionSetting {
    DetectionSetting {
        setting_id: 128,
        name: "factory".into(),
        description: "default".into(),
        boxcar_length: 0,
        diff_filter_length: 0,
        lockout: 0,
        threshold: 1000,
        mode: PeakMode::Peak,
    }
}

pub fn spectrum_content() -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_f64_le(1500.0);
    buf.put_f64_le(0.25);
    buf.put_u32_le(2);
    buf.put_u32_le(2);
    for value in [-30.5f32, -31.0, -40.0, -41.5] {
        buf.put_f32_le(value);
    }
    buf.freeze()
}

const DEVICE_COMMANDS: [&str; 25] = [
    "#GetSerialNumber",
    "#GetCommandNames",
    "#GetDutChannelCount",
    "#GetMaximumPeakCountPerDutChannel",
    "#GetInstrumentName",
    "#GetFpgaVersion",
    "#GetFirmwareVersion",
    "#GetActiveFullSpectrumDutChannelNumbers",
    "#GetAvailableLaserScanSpeeds",
    "#GetLaserScanSpeed",
    "#GetInstrumentUtcDateTime",
    "#GetNtpEnabled",
    "#GetNtpServer",
    "#GetPtpEnabled",
    "#GetPeakOffsets",
    "#GetChannelDetectionSettingId",
    "#GetDetectionSetting",
    "#GetNetworkIpMode",
    "#GetActiveNetworkSettings",
    "#GetStaticNetworkSettings",
    "#GetSpectrum",
    "#SetInstrumentUtcDateTime",
    "#SetInstrumentName",
    "#GetBoardTemperature",
    "#help",
];

pub fn full_catalog() -> CommandCatalog {
    CommandCatalog::from_device_names(DEVICE_COMMANDS)
}

pub fn two_channel_instrument() -> MockTransport {
    let network = Bytes::from_static(&[10, 0, 0, 55, 255, 255, 255, 0, 10, 0, 0, 1]);

    MockTransport::new("10.0.0.55")
        .respond("#GetSerialNumber", Response::success("Serial", &b"ITO-0042"[..]))
        .respond(
            "#GetCommandNames",
            Response::success(DEVICE_COMMANDS.join("\r\n"), Bytes::new()),
        )
        .respond("#GetDutChannelCount", Response::success("", i32s(&[2])))
        .respond("#GetMaximumPeakCountPerDutChannel", Response::success("", i32s(&[16])))
        .respond("#GetInstrumentName", Response::success("", &b"ITO line 7"[..]))
        .respond("#GetFpgaVersion", Response::success("1.2.3", Bytes::new()))
        .respond("#GetFirmwareVersion", Response::success("2.5.1", Bytes::new()))
        .respond("#GetActiveFullSpectrumDutChannelNumbers", Response::success("", i32s(&[1, 2])))
        .respond("#GetAvailableLaserScanSpeeds", Response::success("", i32s(&[1, 10, 100])))
        .respond("#GetLaserScanSpeed", Response::success("", i32s(&[10])))
        .respond("#GetInstrumentUtcDateTime", Response::success("2026 10 19 08 00 00", Bytes::new()))
        .respond("#GetNtpEnabled", Response::success("", i32s(&[1])))
        .respond("#GetNtpServer", Response::success("10.0.0.1", Bytes::new()))
        .respond("#GetPtpEnabled", Response::success("", i32s(&[0])))
        .respond("#GetPeakOffsets 1", Response::success("", i32s(&[1000, 52000])))
        .respond("#GetPeakOffsets 2", Response::success("", Bytes::new()))
        .respond("#GetChannelDetectionSettingId 1", Response::success("", i32s(&[3])))
        .respond("#GetChannelDetectionSettingId 2", Response::success("", i32s(&[128])))
        .respond(
            "#GetDetectionSetting 3",
            Response::success("", encode_detection_setting(&custom_preset())),
        )
        .respond(
            "#GetDetectionSetting 128",
            Response::success("", encode_detection_setting(&factory_preset())),
        )
        .respond("#GetNetworkIpMode", Response::success("Static", Bytes::new()))
        .respond("#GetActiveNetworkSettings", Response::success("", network.clone()))
        .respond("#GetStaticNetworkSettings", Response::success("", network))
        .respond("#GetSpectrum", Response::success("", spectrum_content()))
        .respond("#GetBoardTemperature", Response::success("Board temperature: 31.5 C", Bytes::new()))
}
