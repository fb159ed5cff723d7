//! Record-key transport encoding.

use crate::config::LookupConfig;
use serde::{Deserialize, Serialize};

/// How a key tuple is flattened into a single transport string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCodec {
    /// Comma-joined; commas and backslashes inside components are
    /// backslash-escaped. Keys without either character encode exactly as
    /// the plain comma join.
    #[default]
    Escaped,
    /// Plain comma join without escaping. A component containing a comma
    /// does not survive a round trip.
    Comma,
}

impl KeyCodec {
    pub fn encode<S: AsRef<str>>(&self, components: &[S]) -> String {
        let delimiter = LookupConfig::KEY_DELIMITER;
        match self {
            KeyCodec::Comma => components
                .iter()
                .map(|c| c.as_ref())
                .collect::<Vec<&str>>()
                .join(&delimiter.to_string()),
            KeyCodec::Escaped => {
                let mut out = String::new();
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        out.push(delimiter);
                    }
                    for c in component.as_ref().chars() {
                        if c == delimiter || c == LookupConfig::KEY_ESCAPE {
                            out.push(LookupConfig::KEY_ESCAPE);
                        }
                        out.push(c);
                    }
                }
                out
            }
        }
    }

    pub fn decode(&self, transport: &str) -> Vec<String> {
        let delimiter = LookupConfig::KEY_DELIMITER;
        match self {
            KeyCodec::Comma => transport.split(delimiter).map(str::to_string).collect(),
            KeyCodec::Escaped => {
                let mut components = Vec::new();
                let mut current = String::new();
                let mut chars = transport.chars();
                while let Some(c) = chars.next() {
                    if c == LookupConfig::KEY_ESCAPE {
                        // A trailing escape is kept literally
                        current.push(chars.next().unwrap_or(c));
                    } else if c == delimiter {
                        components.push(std::mem::take(&mut current));
                    } else {
                        current.push(c);
                    }
                }
                components.push(current);
                components
            }
        }
    }
}
