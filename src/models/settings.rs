use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Monitoring window and SMS alert target as stored on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    #[serde(with = "hhmm", default = "default_start")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm", default = "default_end")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub parent_phone: String,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub notify_enabled: bool,
}

fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}

fn default_end() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default()
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            start_time: default_start(),
            end_time: default_end(),
            parent_phone: String::new(),
            notify_enabled: false,
        }
    }
}

/// The device stores `notify_enabled` as an INTEGER column and echoes it back
/// as 0/1, while older firmware sends a JSON bool.
fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    })
}

/// `"HH:MM"` on the wire; seconds are accepted on input and dropped on output.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|err| de::Error::custom(format!("invalid time '{raw}': {err}")))
    }
}
