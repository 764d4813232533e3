#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde_json::Value;

const SHARE_DOMAIN: &str = "rampart";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded map payload.
pub(crate) const SHARE_HEADER: &str = "rampart:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// One shareable map captured together with its grid dimensions.
///
/// The payload is the raw editor JSON of a single map, so a decoded share
/// string goes through exactly the same validation as a map loaded from a
/// file.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LevelTransfer {
    /// Number of tile columns declared by the map layout.
    pub columns: u32,
    /// Number of tile rows declared by the map layout.
    pub rows: u32,
    map: Value,
}

impl LevelTransfer {
    /// Captures a map JSON object, reading the dimensions off its layout.
    pub(crate) fn from_map(map: &Value) -> Result<Self, LevelTransferError> {
        let layout = map
            .get("layout")
            .and_then(Value::as_array)
            .ok_or(LevelTransferError::MissingLayout)?;
        let rows = layout.len();
        let columns = layout
            .first()
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        if rows == 0 || columns == 0 {
            return Err(LevelTransferError::EmptyLayout);
        }
        Ok(Self {
            columns: columns as u32,
            rows: rows as u32,
            map: map.clone(),
        })
    }

    /// Encodes the map into a single-line string suitable for clipboard transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let json = serde_json::to_vec(&self.map).expect("JSON value serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SHARE_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a map from the provided share string.
    pub(crate) fn decode(value: &str) -> Result<Self, LevelTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LevelTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LevelTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LevelTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LevelTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LevelTransferError::MissingPayload)?;

        if domain != SHARE_DOMAIN {
            return Err(LevelTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SHARE_VERSION {
            return Err(LevelTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LevelTransferError::InvalidEncoding)?;
        let map: Value =
            serde_json::from_slice(&bytes).map_err(LevelTransferError::InvalidPayload)?;

        let transfer = Self::from_map(&map)?;
        if transfer.columns != columns || transfer.rows != rows {
            return Err(LevelTransferError::DimensionMismatch {
                declared_columns: columns,
                declared_rows: rows,
                layout_columns: transfer.columns,
                layout_rows: transfer.rows,
            });
        }
        Ok(transfer)
    }

    /// Consumes the transfer, yielding the raw map JSON.
    pub(crate) fn into_map(self) -> Value {
        self.map
    }
}

/// Errors that can occur while decoding level share strings.
#[derive(Debug)]
pub(crate) enum LevelTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the share string.
    MissingPrefix,
    /// The share string did not contain a version segment.
    MissingVersion,
    /// The share string did not include grid dimensions.
    MissingDimensions,
    /// The share string did not include the payload segment.
    MissingPayload,
    /// The share string used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The share string used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the share string.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// The map JSON carried no layout array.
    MissingLayout,
    /// The map layout declared no rows or no columns.
    EmptyLayout,
    /// The header dimensions disagreed with the decoded layout.
    DimensionMismatch {
        /// Columns declared by the share string header.
        declared_columns: u32,
        /// Rows declared by the share string header.
        declared_rows: u32,
        /// Columns found in the decoded layout.
        layout_columns: u32,
        /// Rows found in the decoded layout.
        layout_rows: u32,
    },
}

impl fmt::Display for LevelTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "share string was empty"),
            Self::MissingPrefix => write!(f, "share string is missing the prefix"),
            Self::MissingVersion => write!(f, "share string is missing the version"),
            Self::MissingDimensions => write!(f, "share string is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "share string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "share prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "share version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode share payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse share payload: {error}")
            }
            Self::MissingLayout => write!(f, "map JSON carries no layout array"),
            Self::EmptyLayout => write!(f, "map layout declares no rows or columns"),
            Self::DimensionMismatch {
                declared_columns,
                declared_rows,
                layout_columns,
                layout_rows,
            } => write!(
                f,
                "share header declares {declared_columns}x{declared_rows} \
                 but the layout is {layout_columns}x{layout_rows}"
            ),
        }
    }
}

impl Error for LevelTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LevelTransferError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LevelTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(LevelTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_map() -> Value {
        json!({
            "name": "Crossing",
            "startingCoins": 100,
            "startingLives": 50,
            "tileSize": 60,
            "layout": [
                ["-", "X", "X", "X", "-"],
                ["S1", "O", "O", "O", "E1"],
                ["-", "X", "X", "X", "-"]
            ],
            "towerTypes": {
                "001": { "name": "Basic Tower", "price": 1 }
            },
            "levels": [
                { "enemies": [{ "type": "basic", "count": 5, "path": "S1E1" }] }
            ]
        })
    }

    #[test]
    fn round_trip_preserves_the_map_json() {
        let transfer = LevelTransfer::from_map(&sample_map()).expect("map captures");
        let encoded = transfer.encode();
        assert!(encoded.starts_with(&format!("{SHARE_HEADER}:5x3:")));

        let decoded = LevelTransfer::decode(&encoded).expect("share decodes");
        assert_eq!(decoded, transfer);
        assert_eq!(decoded.into_map(), sample_map());
    }

    #[test]
    fn foreign_prefixes_and_versions_are_rejected() {
        let encoded = LevelTransfer::from_map(&sample_map())
            .expect("map captures")
            .encode();
        let foreign = encoded.replacen("rampart", "bastion", 1);
        assert!(matches!(
            LevelTransfer::decode(&foreign),
            Err(LevelTransferError::InvalidPrefix(prefix)) if prefix == "bastion"
        ));

        let newer = encoded.replacen("v1", "v9", 1);
        assert!(matches!(
            LevelTransfer::decode(&newer),
            Err(LevelTransferError::UnsupportedVersion(version)) if version == "v9"
        ));
    }

    #[test]
    fn header_dimensions_must_match_the_layout() {
        let encoded = LevelTransfer::from_map(&sample_map())
            .expect("map captures")
            .encode();
        let lied = encoded.replacen("5x3", "9x9", 1);
        assert!(matches!(
            LevelTransfer::decode(&lied),
            Err(LevelTransferError::DimensionMismatch {
                declared_columns: 9,
                declared_rows: 9,
                layout_columns: 5,
                layout_rows: 3,
            })
        ));
    }

    #[test]
    fn maps_without_layouts_cannot_be_shared() {
        assert!(matches!(
            LevelTransfer::from_map(&json!({ "name": "bare" })),
            Err(LevelTransferError::MissingLayout)
        ));
        assert!(matches!(
            LevelTransfer::from_map(&json!({ "layout": [] })),
            Err(LevelTransferError::EmptyLayout)
        ));
    }

    #[test]
    fn truncated_share_strings_report_the_missing_segment() {
        assert!(matches!(
            LevelTransfer::decode("   "),
            Err(LevelTransferError::EmptyPayload)
        ));
        assert!(matches!(
            LevelTransfer::decode("rampart:v1"),
            Err(LevelTransferError::MissingDimensions)
        ));
        assert!(matches!(
            LevelTransfer::decode("rampart:v1:5x3"),
            Err(LevelTransferError::MissingPayload)
        ));
        assert!(matches!(
            LevelTransfer::decode("rampart:v1:5x0:e30"),
            Err(LevelTransferError::InvalidDimensions(_))
        ));
    }
}
