//! Lenient parsing of station payloads.
//!
//! Upstream payloads vary between deployments: the list may be bare or
//! wrapped in `{"stations": [...]}`, and field names differ (`name` vs
//! `station_name`, `lon` vs `lng`). Individual items that cannot be
//! turned into a station are skipped. Only a body that is not a station
//! list at all is an error.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{Coordinate, RankedStation, Station, StationId};

use super::error::StationError;

/// The two accepted list shapes. Items stay untyped so one bad entry
/// does not reject the whole list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireList {
    Bare(Vec<Value>),
    Wrapped { stations: Vec<Value> },
}

/// One station entry as upstreams send it.
///
/// Distance and travel time have several spellings that can appear side
/// by side (our own endpoint sends `distance_km` and `distance`), so each
/// spelling is its own field and the first usable one wins.
#[derive(Debug, Deserialize)]
struct WireStation {
    #[serde(alias = "station_id")]
    id: Option<Scalar>,
    #[serde(alias = "station_name")]
    name: Option<Scalar>,
    #[serde(alias = "latitude")]
    lat: Option<Scalar>,
    #[serde(alias = "lng", alias = "longitude")]
    lon: Option<Scalar>,
    distance_km: Option<Scalar>,
    distance: Option<Scalar>,
    travel_time_min: Option<Scalar>,
    travel_time: Option<Scalar>,
    duration: Option<Scalar>,
}

/// A field that may arrive as a number, a string, or something unusable.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
    Other(Value),
}

impl Scalar {
    /// Non-blank text, with numbers rendered as written.
    fn text(&self) -> Option<String> {
        match self {
            Scalar::Number(n) => Some(n.to_string()),
            Scalar::Text(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// A number, or a string that parses as one.
    fn number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Other(_) => None,
        }
    }
}

/// First field, in order, holding a usable number.
fn first_number(fields: &[&Option<Scalar>]) -> Option<f64> {
    fields
        .iter()
        .find_map(|field| field.as_ref().and_then(Scalar::number))
}

fn number(field: &Option<Scalar>) -> Option<f64> {
    first_number(&[field])
}

impl WireStation {
    fn station(&self) -> Result<Station, &'static str> {
        let name = self.name.as_ref().and_then(Scalar::text).ok_or("missing name")?;
        let lat = number(&self.lat).ok_or("missing latitude")?;
        let lon = number(&self.lon).ok_or("missing longitude")?;
        let coordinate = Coordinate::new(lat, lon).map_err(|_| "coordinate out of range")?;

        // Some deployments send no id; the name is the best stable stand-in.
        let id = self
            .id
            .as_ref()
            .and_then(Scalar::text)
            .unwrap_or_else(|| name.clone());

        Station::new(StationId::new(id), &name, coordinate).map_err(|_| "blank name")
    }

    fn distance_km(&self) -> Option<f64> {
        first_number(&[&self.distance_km, &self.distance])
    }

    fn travel_time_min(&self) -> Option<f64> {
        first_number(&[&self.travel_time_min, &self.travel_time, &self.duration])
    }
}

/// Parse a plain station list (no distances).
pub fn parse_station_list(body: &str) -> Result<Vec<Station>, StationError> {
    let items = station_items(body)?;
    let total = items.len();

    let stations: Vec<Station> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            match wire_station(item).and_then(|wire| wire.station().map_err(String::from)) {
                Ok(station) => Some(station),
                Err(reason) => {
                    warn!(index = i, %reason, "skipping station entry");
                    None
                }
            }
        })
        .collect();

    if total > 0 && stations.is_empty() {
        return Err(StationError::Malformed {
            message: format!("none of the {total} station entries were usable"),
        });
    }

    Ok(stations)
}

/// Parse a ranked station list, keeping upstream order.
///
/// Missing or unusable distance and travel-time fields become `None`.
pub fn parse_ranked_list(body: &str) -> Result<Vec<RankedStation>, StationError> {
    let items = station_items(body)?;
    let total = items.len();

    let ranked: Vec<RankedStation> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let ranked = wire_station(item).and_then(|wire| {
                let station = wire.station()?;
                Ok(RankedStation::from_upstream(
                    station,
                    wire.distance_km(),
                    wire.travel_time_min(),
                ))
            });
            match ranked {
                Ok(ranked) => Some(ranked),
                Err(reason) => {
                    warn!(index = i, %reason, "skipping ranked station entry");
                    None
                }
            }
        })
        .collect();

    if total > 0 && ranked.is_empty() {
        return Err(StationError::Malformed {
            message: format!("none of the {total} station entries were usable"),
        });
    }

    Ok(ranked)
}

/// Extract the list of items from either accepted shape.
fn station_items(body: &str) -> Result<Vec<Value>, StationError> {
    match serde_json::from_str::<WireList>(body) {
        Ok(WireList::Bare(items)) | Ok(WireList::Wrapped { stations: items }) => Ok(items),
        Err(e) if e.is_syntax() || e.is_eof() => Err(StationError::Malformed {
            message: format!("invalid JSON: {e}"),
        }),
        Err(_) => Err(StationError::Malformed {
            message: "expected an array or an object with a \"stations\" array".to_string(),
        }),
    }
}

fn wire_station(item: Value) -> Result<WireStation, String> {
    // Serde would also accept a positional array for a struct.
    if !item.is_object() {
        return Err("entry is not an object".to_string());
    }
    serde_json::from_value(item).map_err(|e| e.to_string())
}
