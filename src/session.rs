//! Session codec: maps a grid to and from the page query string.
//!
//! Wire form is `size=<int>&base=<int>&state=<digits>`, order independent, with
//! percent-encoded keys and values. Decoding never fails as a whole: a bad
//! `size`/`base` keeps the current setting, and a bad `state` leaves the grid at
//! its all-zero default.

use std::borrow::Cow;

use thiserror::Error;
use tracing::{debug, warn};

use crate::grid::{Grid, GridConfig};
use crate::location::{Location, LocationError};
use crate::{MAX_BASE, MAX_SIZE};

const KEY_SIZE: &str = "size";
const KEY_BASE: &str = "base";
const KEY_STATE: &str = "state";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("`{0}` is not an integer")]
    NotAnInteger(String),
    #[error("{value} outside {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },
    #[error("state has {actual} cells, expected {expected}")]
    StateLength { expected: usize, actual: usize },
    #[error("state character {ch:?} at {index} is not a digit below {base}")]
    StateDigit { index: usize, ch: char, base: u32 },
    #[error("malformed percent-encoding in `{0}`")]
    Encoding(String),
}

/// Parse an input value as an integer within `min..=max`. Surrounding
/// whitespace is tolerated, anything else is rejected.
pub fn parse_setting(raw: &str, min: i64, max: i64) -> Result<i64, CodecError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| CodecError::NotAnInteger(raw.to_string()))?;
    if value < min || value > max {
        return Err(CodecError::OutOfRange { value, min, max });
    }
    Ok(value)
}

pub fn parse_size(raw: &str) -> Result<usize, CodecError> {
    parse_setting(raw, 1, MAX_SIZE as i64).map(|v| v as usize)
}

pub fn parse_base(raw: &str) -> Result<u32, CodecError> {
    parse_setting(raw, 1, MAX_BASE as i64).map(|v| v as u32)
}

/// Wire form of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionState {
    pub size: usize,
    pub base: u32,
    pub state: String,
}

impl SessionState {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            size: grid.size(),
            base: grid.base(),
            state: grid.serialize_state(),
        }
    }

    pub fn to_query(&self) -> String {
        let size = self.size.to_string();
        let base = self.base.to_string();
        [
            (KEY_SIZE, size.as_str()),
            (KEY_BASE, base.as_str()),
            (KEY_STATE, self.state.as_str()),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
    }

    #[cfg(feature = "serde_json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub fn encode(grid: &Grid) -> String {
    SessionState::from_grid(grid).to_query()
}

fn decode_component(raw: &str) -> Result<Cow<'_, str>, CodecError> {
    urlencoding::decode(raw).map_err(|_| CodecError::Encoding(raw.to_string()))
}

/// Split a query string into decoded `(key, value)` pairs. Pairs that fail to
/// percent-decode are dropped; a pair without `=` has an empty value.
pub fn query_pairs(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .filter(|bit| !bit.is_empty())
        .filter_map(|bit| {
            let (k, v) = bit.split_once('=').unwrap_or((bit, ""));
            match (decode_component(k), decode_component(v)) {
                (Ok(k), Ok(v)) => Some((k.into_owned(), v.into_owned())),
                (Err(e), _) | (_, Err(e)) => {
                    debug!(error = %e, "skipping query pair");
                    None
                }
            }
        })
        .collect()
}

/// Convert a state string into per-cell values, all or nothing.
pub fn parse_state(state: &str, config: GridConfig) -> Result<Vec<u32>, CodecError> {
    let expected = config.size * config.size;
    let actual = state.chars().count();
    if actual != expected {
        return Err(CodecError::StateLength { expected, actual });
    }
    state
        .chars()
        .enumerate()
        .map(|(index, ch)| match ch.to_digit(10) {
            Some(d) if d < config.base => Ok(d),
            _ => Err(CodecError::StateDigit {
                index,
                ch,
                base: config.base,
            }),
        })
        .collect()
}

/// Result of scanning a query string, before any grid is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub config: GridConfig,
    pub state: Option<String>,
}

/// Scan `query`, overriding `defaults` with any valid `size`/`base` and
/// capturing the raw `state`. Unknown keys are ignored.
pub fn decode(query: &str, defaults: GridConfig) -> Decoded {
    let mut decoded = Decoded {
        config: defaults,
        state: None,
    };
    for (key, value) in query_pairs(query) {
        match key.as_str() {
            KEY_SIZE => match parse_size(&value) {
                Ok(size) => decoded.config.size = size,
                Err(e) => debug!(error = %e, "ignoring size"),
            },
            KEY_BASE => match parse_base(&value) {
                Ok(base) => decoded.config.base = base,
                Err(e) => debug!(error = %e, "ignoring base"),
            },
            KEY_STATE => decoded.state = Some(value),
            _ => {}
        }
    }
    decoded
}

/// Build the grid for a decoded query and apply its state when it is valid.
pub fn restore(decoded: &Decoded) -> Grid {
    let mut grid = Grid::from_config(decoded.config);
    if let Some(state) = &decoded.state {
        match parse_state(state, decoded.config) {
            Ok(values) => {
                let size = decoded.config.size;
                for (i, v) in values.into_iter().enumerate() {
                    grid.set_cell_state((i % size) as i64, (i / size) as i64, v);
                }
            }
            Err(e) => debug!(error = %e, "discarding saved state"),
        }
    }
    grid
}

/// Explicit puzzle session: owned by the UI, rebuilt on every reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    grid: Grid,
}

impl Session {
    pub fn new(config: GridConfig) -> Self {
        Self {
            grid: Grid::from_config(config),
        }
    }

    /// Load from a query string (or nothing) on top of the current input values.
    pub fn from_query(query: Option<&str>, defaults: GridConfig) -> Self {
        match query {
            Some(q) => Self::from(restore(&decode(q, defaults))),
            None => Self::new(defaults),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> GridConfig {
        self.grid.config()
    }

    pub fn click(&mut self, x: i64, y: i64) -> usize {
        self.grid.increment_around(x, y)
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_grid(&self.grid)
    }

    pub fn query(&self) -> String {
        encode(&self.grid)
    }

    /// Write the current state to `sink`. A failing sink is logged, not raised.
    pub fn persist(&self, sink: &dyn Location) {
        match sink.replace(&self.query()) {
            Ok(()) => {}
            Err(e @ LocationError::Unavailable(_)) => debug!(error = %e, "address not persisted"),
            Err(e) => warn!(error = %e, "could not update address"),
        }
    }
}

impl From<Grid> for Session {
    fn from(grid: Grid) -> Self {
        Self { grid }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::MemoryLocation;

    fn cfg(size: usize, base: u32) -> GridConfig {
        GridConfig::new(size, base)
    }

    #[test]
    fn test_parse_setting() {
        assert_eq!(parse_setting(" 7 ", 1, 10), Ok(7));
        assert_eq!(
            parse_setting("abc", 1, 10),
            Err(CodecError::NotAnInteger("abc".into()))
        );
        assert!(matches!(
            parse_setting("0", 1, 10),
            Err(CodecError::OutOfRange { value: 0, .. })
        ));
        assert!(parse_setting("3.5", 1, 10).is_err());
    }

    #[test]
    fn test_encode_query() {
        let mut g = Grid::new(3, 2);
        g.increment_around(1, 1);
        assert_eq!(encode(&g), "size=3&base=2&state=010111010");
    }

    #[test]
    fn test_query_pairs_decodes_percent() {
        let pairs = query_pairs("?si%7Ae=4&flag&state=01%32");
        assert_eq!(
            pairs,
            vec![
                ("size".to_string(), "4".to_string()),
                ("flag".to_string(), String::new()),
                ("state".to_string(), "012".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_skips_bad_utf8() {
        let pairs = query_pairs("size=%FF&base=3");
        assert_eq!(pairs, vec![("base".to_string(), "3".to_string())]);
    }

    #[test]
    fn test_decode_ignores_bad_values() {
        let d = decode("size=big&base=-2&state=0", cfg(5, 2));
        assert_eq!(d.config, cfg(5, 2));
        assert_eq!(d.state.as_deref(), Some("0"));
    }

    #[test]
    fn test_decode_rejects_base_above_ten() {
        let d = decode("size=2&base=11", cfg(5, 2));
        assert_eq!(d.config, cfg(2, 2));
    }

    #[test]
    fn test_decode_last_state_wins() {
        let d = decode("state=1111&state=0000", cfg(2, 2));
        assert_eq!(d.state.as_deref(), Some("0000"));
    }

    #[test]
    fn test_parse_state_errors() {
        assert_eq!(
            parse_state("12", cfg(3, 3)),
            Err(CodecError::StateLength {
                expected: 9,
                actual: 2
            })
        );
        assert!(matches!(
            parse_state("12a456789", cfg(3, 10)),
            Err(CodecError::StateDigit { index: 2, ch: 'a', .. })
        ));
        assert!(matches!(
            parse_state("0102", cfg(2, 2)),
            Err(CodecError::StateDigit { index: 3, ch: '2', .. })
        ));
        assert_eq!(parse_state("0121", cfg(2, 3)), Ok(vec![0, 1, 2, 1]));
    }

    #[test]
    fn test_restore_is_row_major() {
        let g = restore(&decode("size=2&base=4&state=0123", cfg(5, 2)));
        assert_eq!(g.get_cell(1, 0).unwrap().state, 1);
        assert_eq!(g.get_cell(0, 1).unwrap().state, 2);
        assert_eq!(g.get_cell(1, 1).unwrap().state, 3);
    }

    #[test]
    fn test_session_persist_rewrites_bad_state() {
        let sink = MemoryLocation::with_query("size=3&base=2&state=12");
        let session = Session::from_query(sink.query().as_deref(), cfg(5, 2));
        session.persist(&sink);
        assert_eq!(
            sink.query().as_deref(),
            Some("size=3&base=2&state=000000000")
        );
    }

    #[test]
    fn test_session_without_query_uses_defaults() {
        let session = Session::from_query(None, cfg(4, 3));
        assert_eq!(session.config(), cfg(4, 3));
        assert_eq!(session.grid().serialize_state(), "0".repeat(16));
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn test_session_state_json() {
        let state = SessionState::from_grid(&Grid::new(1, 2));
        assert_eq!(
            state.to_json().unwrap(),
            r#"{"size":1,"base":2,"state":"0"}"#
        );
    }
}
