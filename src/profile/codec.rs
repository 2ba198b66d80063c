//! `.rdp` file codec
//!
//! Converts between a [`Profile`] and the Remote Desktop Connection text
//! format, one `key:type:value` line per option (`s` = string, `i` =
//! integer).
//!
//! Writing emits a fixed template of connection options plus the
//! profile-driven lines (address, username, screen mode, monitors). Reading
//! only interprets the profile-driven keys. Lines are first collected into
//! [`RdpFileSettings`] and the profile is derived once afterwards, so the
//! order of lines in the file does not matter.

use super::models::{Profile, Resolution};

/// Options written to every `.rdp` file regardless of the profile
const TEMPLATE_LINES: &[&str] = &[
    "session bpp:i:32",
    "redirectclipboard:i:1",
    "redirectprinters:i:1",
    "redirectcomports:i:0",
    "redirectsmartcards:i:1",
    "authentication level:i:2",
    "prompt for credentials:i:1",
    "negotiate security layer:i:1",
    "remoteapplicationmode:i:0",
    "alternate shell:s:",
    "shell working directory:s:",
    "disable wallpaper:i:0",
    "disable full window drag:i:0",
    "disable menu anims:i:0",
    "disable themes:i:0",
    "disable cursor setting:i:0",
    "bitmapcachepersistenable:i:1",
    "audiomode:i:0",
    "redirectdirectx:i:1",
    "audiocapturemode:i:0",
    "videoplaybackmode:i:1",
    "connection type:i:7",
    "networkautodetect:i:1",
    "bandwidthautodetect:i:1",
    "enableworkspacereconnect:i:0",
    "use redirection server name:i:0",
    "rdgiskdcproxy:i:0",
    "kdcproxyname:s:",
];

/// `screen mode id` value for a windowed session
const SCREEN_MODE_WINDOWED: u32 = 1;
/// `screen mode id` value for a full-screen session
const SCREEN_MODE_FULLSCREEN: u32 = 2;

/// Recognized settings of a parsed `.rdp` file
///
/// Fields stay `None` when the key is absent or its value does not parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdpFileSettings {
    /// `full address`
    pub full_address: Option<String>,
    /// `username`, possibly `DOMAIN\user`
    pub username: Option<String>,
    /// `screen mode id`
    pub screen_mode_id: Option<u32>,
    /// `desktopwidth`
    pub desktop_width: Option<u32>,
    /// `desktopheight`
    pub desktop_height: Option<u32>,
    /// `smart sizing`
    pub smart_sizing: Option<bool>,
    /// `use multimon`
    pub use_multimon: Option<bool>,
    /// `span monitors`
    pub span_monitors: Option<bool>,
}

impl RdpFileSettings {
    /// Collect recognized keys from `.rdp` lines
    ///
    /// Blank lines, `#` comments, lines without a colon and lines with fewer
    /// than three colon-separated segments are skipped. Keys are matched
    /// case-insensitively; unknown keys are ignored.
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut settings = Self::default();

        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.splitn(3, ':');
            let (Some(key), Some(_kind), Some(value)) = (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "full address" => settings.full_address = Some(value.to_string()),
                "username" => settings.username = Some(value.to_string()),
                "screen mode id" => settings.screen_mode_id = value.parse().ok(),
                "desktopwidth" => settings.desktop_width = value.parse().ok(),
                "desktopheight" => settings.desktop_height = value.parse().ok(),
                "smart sizing" => settings.smart_sizing = parse_flag(value),
                "use multimon" => settings.use_multimon = parse_flag(value),
                "span monitors" => settings.span_monitors = parse_flag(value),
                _ => {}
            }
        }

        settings
    }

    /// Resolution implied by the screen mode and desktop size
    ///
    /// A positive width and height win over the screen mode; otherwise mode 2
    /// is fullscreen and everything else is auto.
    pub fn resolution(&self) -> Resolution {
        match (self.desktop_width, self.desktop_height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Resolution::Fixed { width, height }
            }
            _ if self.screen_mode_id == Some(SCREEN_MODE_FULLSCREEN) => Resolution::Fullscreen,
            _ => Resolution::Auto,
        }
    }

    /// Build a profile for `file_name` from these settings
    pub fn into_profile(self, file_name: &str) -> Profile {
        let resolution = self.resolution();
        let (domain, username) = match self.username.as_deref() {
            Some(value) => match value.split_once('\\') {
                Some((domain, user)) => (domain.to_string(), user.to_string()),
                None => (String::new(), value.to_string()),
            },
            None => (String::new(), String::new()),
        };

        Profile {
            file: file_name.to_string(),
            host: self.full_address.unwrap_or_default(),
            username,
            domain,
            resolution,
            use_multi_monitor: self.use_multimon.unwrap_or(false),
            use_all_monitors: self.span_monitors.unwrap_or(false),
            ..Profile::default()
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    value.parse::<i64>().ok().map(|v| v != 0)
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// Encode a profile as `.rdp` lines
pub fn encode(profile: &Profile) -> Vec<String> {
    let mut lines = Vec::with_capacity(TEMPLATE_LINES.len() + 7);

    lines.push(format!("full address:s:{}", profile.host));
    lines.push(format!("username:s:{}", profile.qualified_username()));
    lines.extend(TEMPLATE_LINES.iter().map(ToString::to_string));

    match &profile.resolution {
        Resolution::Fullscreen => {
            lines.push(format!("screen mode id:i:{SCREEN_MODE_FULLSCREEN}"));
        }
        Resolution::Auto => {
            lines.push(format!("screen mode id:i:{SCREEN_MODE_WINDOWED}"));
            lines.push("smart sizing:i:1".to_string());
        }
        Resolution::Fixed { width, height } => {
            lines.push(format!("screen mode id:i:{SCREEN_MODE_WINDOWED}"));
            lines.push(format!("desktopwidth:i:{width}"));
            lines.push(format!("desktopheight:i:{height}"));
        }
        Resolution::Other(text) => {
            tracing::debug!("Resolution '{}' is not a size, omitting screen lines", text);
        }
    }

    lines.push(format!("use multimon:i:{}", flag(profile.use_multi_monitor)));
    lines.push(format!("span monitors:i:{}", flag(profile.use_all_monitors)));

    lines
}

/// Encode a profile as `.rdp` file text with CRLF line endings
pub fn to_rdp_text(profile: &Profile) -> String {
    let mut text = encode(profile).join("\r\n");
    text.push_str("\r\n");
    text
}

/// Decode `.rdp` lines into a profile backed by `file_name`
///
/// Only connection fields are populated; metadata (id, name, tags) is left
/// blank for the caller to fill in.
pub fn decode<I, S>(file_name: &str, lines: I) -> Profile
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    RdpFileSettings::parse(lines).into_profile(file_name)
}

/// Decode raw `.rdp` file bytes
///
/// `mstsc` saves files as UTF-16 LE with a byte order mark; UTF-16 BE and
/// UTF-8 (with or without BOM) are accepted as well.
pub fn decode_bytes(file_name: &str, bytes: &[u8]) -> Profile {
    let text = bytes_to_text(bytes);
    decode(file_name, text.lines())
}

fn bytes_to_text(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => utf16_to_string(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => utf16_to_string(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn utf16_to_string(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
