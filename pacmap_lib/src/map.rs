//! Map dataset preparation for a single PAC.
//!
//! [`build_pac_map`] turns the cleaned tables into map layers: contribution
//! circles aggregated by ZIP or one jittered marker per contribution, state
//! totals for a choropleth, and one marker per incoming committee transfer.
//! A [`MapRenderer`] turns the dataset into markup; [`GeoJsonRenderer`] is
//! the built-in sink.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::codes::{CodeTable, CodeTables};
use crate::geo::{GeometryProvider, Point, Polygon, Region};
use crate::records::{CleanTables, ContributionRecord, TransferRecord};

const DOCUMENT_URL: &str = "https://docquery.fec.gov/cgi-bin/fecimg/?";
const CONTRIBUTION_RADIUS: f64 = 4.0;
/// Largest relative offset applied to a per-contribution marker.
const JITTER: f64 = 0.001;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Failed to read geometry file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid geometry JSON: {0}")]
    Geometry(#[from] serde_json::Error),
    #[error("Failed to render map: {0}")]
    Render(String),
}

/// Contributions to the PAC from one ZIP code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZipAggregate {
    pub zip: String,
    pub city: String,
    pub state: String,
    pub total: Decimal,
    pub count: usize,
    pub location: Option<Point>,
    pub radius: f64,
    pub tooltip: String,
}

/// One contribution to the PAC, placed near its ZIP centroid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionMarker {
    pub name: String,
    pub amount: Decimal,
    pub date: Option<NaiveDate>,
    pub zip: String,
    pub election_type: String,
    pub location: Option<Point>,
    pub radius: f64,
    pub tooltip: String,
    pub document_url: Option<String>,
}

/// Contribution total for one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateTotal {
    pub state: String,
    pub state_name: String,
    pub total: Decimal,
    pub polygon: Option<Polygon>,
}

/// One committee transfer received by the PAC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferMarker {
    pub name: String,
    pub amount: Decimal,
    pub date: Option<NaiveDate>,
    pub party: Option<String>,
    pub entity_type: String,
    pub location: Option<Point>,
    pub tooltip: String,
    pub document_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacMapData {
    pub pac: String,
    pub contributions: Vec<ZipAggregate>,
    pub individual_contributions: Vec<ContributionMarker>,
    pub state_totals: Vec<StateTotal>,
    pub transfers: Vec<TransferMarker>,
    /// PAC contributions dropped for a missing name, city, state, ZIP or date.
    pub incomplete_contributions: usize,
}

/// Receiving committees ranked by contribution total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacSummary {
    pub name: String,
    pub contributions: usize,
    pub contribution_total: Decimal,
    pub transfers: usize,
    pub transfer_total: Decimal,
}

/// Accepts a prepared dataset and returns markup.
pub trait MapRenderer {
    fn render(&self, data: &PacMapData) -> Result<String, MapError>;
}

/// Format a dollar amount with thousands separators: `$1,234.50`, `$500`.
/// Whole-dollar amounts omit the cents.
pub fn format_dollars(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = rounded.abs().to_string();
    let (whole, cents) = match text.split_once('.') {
        Some((w, c)) => (w.to_string(), c.to_string()),
        None => (text.clone(), String::new()),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let cents = cents.trim_end_matches('0');
    if cents.is_empty() {
        format!("{}${}", sign, grouped)
    } else {
        format!("{}${}.{:0<2}", sign, grouped, cents)
    }
}

fn same_committee(name: Option<&str>, pac: &str) -> bool {
    name.map_or(false, |n| n.trim().eq_ignore_ascii_case(pac.trim()))
}

fn is_complete(row: &ContributionRecord) -> bool {
    !row.name.name_full.is_empty()
        && row.address.city.is_some()
        && row.address.state.is_some()
        && row.address.zip_primary.is_some()
        && row.date.is_some()
}

fn place(city: &str, state: &str, zip: &str) -> String {
    format!("{}, {} {}", city, state, zip)
}

/// Build the map layers for `pac`.
///
/// Transfer markers are scattered at random inside their ZIP and
/// per-contribution markers are nudged off their ZIP centroid so that
/// markers from the same ZIP do not overlap; pass a seeded RNG for
/// reproducible output.
pub fn build_pac_map<G, R>(
    pac: &str,
    tables: &CleanTables,
    geometry: &G,
    codes: &CodeTables,
    rng: &mut R,
) -> PacMapData
where
    G: GeometryProvider + ?Sized,
    R: Rng + ?Sized,
{
    let mut incomplete = 0;
    let mut by_zip: BTreeMap<String, (String, String, Decimal, usize)> = BTreeMap::new();
    let mut by_state: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut individual_contributions = Vec::new();

    for row in tables
        .individuals
        .iter()
        .filter(|r| same_committee(r.recipient_name.as_deref(), pac))
    {
        if !is_complete(row) {
            incomplete += 1;
            continue;
        }
        let (Some(city), Some(state), Some(zip)) = (
            row.address.city.as_deref(),
            row.address.state.as_deref(),
            row.address.zip_primary.as_deref(),
        ) else {
            continue;
        };

        let entry = by_zip
            .entry(zip.to_string())
            .or_insert_with(|| (city.to_string(), state.to_string(), Decimal::ZERO, 0));
        entry.2 += row.amount;
        entry.3 += 1;
        *by_state.entry(state.to_string()).or_insert(Decimal::ZERO) += row.amount;
        individual_contributions.push(contribution_marker(row, city, state, zip, geometry, rng));
    }

    let contributions = by_zip
        .into_iter()
        .map(|(zip, (city, state, total, count))| {
            let location = geometry
                .centroid_for(&Region::Zip(zip.clone()))
                .or_else(|| geometry.centroid_for(&Region::State(state.clone())));
            let noun = if count == 1 { "contribution" } else { "contributions" };
            ZipAggregate {
                tooltip: format!(
                    "{}<br/>{} {}<br/>{}",
                    format_dollars(total),
                    count,
                    noun,
                    place(&city, &state, &zip)
                ),
                radius: ((count + 1) as f64).ln() * 3.0,
                zip,
                city,
                state,
                total,
                count,
                location,
            }
        })
        .collect();

    let state_totals = by_state
        .into_iter()
        .map(|(state, total)| StateTotal {
            state_name: codes
                .label(CodeTable::State, &state)
                .unwrap_or(&state)
                .to_string(),
            polygon: geometry.polygon_for(&Region::State(state.clone())),
            state,
            total,
        })
        .collect();

    let transfers = tables
        .transfers
        .iter()
        .filter(|t| same_committee(t.committee_name.as_deref(), pac))
        .map(|t| transfer_marker(t, geometry, rng))
        .collect();

    if incomplete > 0 {
        tracing::debug!("{} contributions to {} lacked location fields", incomplete, pac);
    }

    PacMapData {
        pac: pac.to_string(),
        contributions,
        individual_contributions,
        state_totals,
        transfers,
        incomplete_contributions: incomplete,
    }
}

fn contribution_marker<G, R>(
    row: &ContributionRecord,
    city: &str,
    state: &str,
    zip: &str,
    geometry: &G,
    rng: &mut R,
) -> ContributionMarker
where
    G: GeometryProvider + ?Sized,
    R: Rng + ?Sized,
{
    let location = geometry
        .centroid_for(&Region::Zip(zip.to_string()))
        .or_else(|| geometry.centroid_for(&Region::State(state.to_string())))
        .map(|center| Point {
            lat: jitter(center.lat, rng),
            lon: jitter(center.lon, rng),
        });
    let date = row
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    ContributionMarker {
        name: row.name.first_last.clone(),
        amount: row.amount,
        date: row.date,
        zip: zip.to_string(),
        election_type: row.election_type.label_or_unknown().to_string(),
        location,
        radius: CONTRIBUTION_RADIUS,
        tooltip: format!(
            "{}<br/>{}<br/>{}<br/>{}",
            format_dollars(row.amount),
            date,
            row.name.first_last,
            place(city, state, zip)
        ),
        document_url: row
            .image_number
            .as_deref()
            .map(|image| format!("{}{}", DOCUMENT_URL, image)),
    }
}

fn jitter<R: Rng + ?Sized>(value: f64, rng: &mut R) -> f64 {
    value * (1.0 + rng.gen::<f64>() * JITTER)
}

fn transfer_marker<G, R>(row: &TransferRecord, geometry: &G, rng: &mut R) -> TransferMarker
where
    G: GeometryProvider + ?Sized,
    R: Rng + ?Sized,
{
    let city = row.address.city.as_deref().unwrap_or("");
    let state = row.address.state.as_deref().unwrap_or("");
    let zip = row.address.zip_primary.as_deref().unwrap_or("");

    let location = locate_transfer(geometry, rng, city, state, zip);
    let date = row
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    TransferMarker {
        name: row.sender_name.name_full.clone(),
        amount: row.amount,
        date: row.date,
        party: row.party.clone(),
        entity_type: row.entity_type.label_or_unknown().to_string(),
        location,
        tooltip: format!(
            "{}<br/>{}<br/>{}<br/>{}",
            row.sender_name.name_full,
            format_dollars(row.amount),
            date,
            place(city, state, zip)
        ),
        document_url: row
            .image_number
            .as_deref()
            .map(|image| format!("{}{}", DOCUMENT_URL, image)),
    }
}

/// Random point in the ZIP, else in a random ZIP of the same city, else the
/// state centroid.
fn locate_transfer<G, R>(geometry: &G, rng: &mut R, city: &str, state: &str, zip: &str) -> Option<Point>
where
    G: GeometryProvider + ?Sized,
    R: Rng + ?Sized,
{
    if !zip.is_empty() {
        if let Some(bounds) = geometry.bounds_for(&Region::Zip(zip.to_string())) {
            return Some(bounds.random_point(rng));
        }
    }

    if !city.is_empty() && !state.is_empty() {
        let zips = geometry.zips_in_city(city, state);
        if !zips.is_empty() {
            let pick = &zips[rng.gen_range(0..zips.len())];
            if let Some(bounds) = geometry.bounds_for(&Region::Zip(pick.clone())) {
                return Some(bounds.random_point(rng));
            }
        }
    }

    if state.is_empty() {
        return None;
    }
    geometry.centroid_for(&Region::State(state.to_string()))
}

/// Receiving committees with contribution and transfer totals, largest
/// contribution total first.
pub fn pac_summaries(tables: &CleanTables) -> Vec<PacSummary> {
    let mut by_name: BTreeMap<&str, PacSummary> = BTreeMap::new();
    let blank = |name: &str| PacSummary {
        name: name.to_string(),
        contributions: 0,
        contribution_total: Decimal::ZERO,
        transfers: 0,
        transfer_total: Decimal::ZERO,
    };

    for row in &tables.individuals {
        if let Some(name) = row.recipient_name.as_deref() {
            let summary = by_name.entry(name).or_insert_with(|| blank(name));
            summary.contributions += 1;
            summary.contribution_total += row.amount;
        }
    }
    for row in &tables.transfers {
        if let Some(name) = row.committee_name.as_deref() {
            let summary = by_name.entry(name).or_insert_with(|| blank(name));
            summary.transfers += 1;
            summary.transfer_total += row.amount;
        }
    }

    let mut summaries: Vec<PacSummary> = by_name.into_values().collect();
    summaries.sort_by(|a, b| {
        b.contribution_total
            .cmp(&a.contribution_total)
            .then_with(|| a.name.cmp(&b.name))
    });
    summaries
}

/// Renders a GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonRenderer {
    pub pretty: bool,
    /// One marker per contribution instead of one circle per ZIP.
    pub individual: bool,
}

impl GeoJsonRenderer {
    pub fn to_value(&self, data: &PacMapData) -> Value {
        let mut features = Vec::new();

        for state in &data.state_totals {
            let Some(polygon) = &state.polygon else {
                continue;
            };
            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [closed_ring(polygon)],
                },
                "properties": {
                    "layer": "state_total",
                    "state": state.state,
                    "name": state.state_name,
                    "total": state.total.to_string(),
                    "label": format!("{}<br/>{}", state.state_name, format_dollars(state.total)),
                },
            }));
        }

        if self.individual {
            for marker in &data.individual_contributions {
                let Some(location) = marker.location else {
                    continue;
                };
                features.push(json!({
                    "type": "Feature",
                    "geometry": point_geometry(location),
                    "properties": {
                        "layer": "contribution",
                        "name": marker.name,
                        "zip": marker.zip,
                        "amount": marker.amount.to_string(),
                        "election": marker.election_type,
                        "radius": marker.radius,
                        "tooltip": marker.tooltip,
                        "url": marker.document_url,
                    },
                }));
            }
        } else {
            for zip in &data.contributions {
                let Some(location) = zip.location else {
                    continue;
                };
                features.push(json!({
                    "type": "Feature",
                    "geometry": point_geometry(location),
                    "properties": {
                        "layer": "contributions",
                        "zip": zip.zip,
                        "total": zip.total.to_string(),
                        "count": zip.count,
                        "radius": zip.radius,
                        "tooltip": zip.tooltip,
                    },
                }));
            }
        }

        for transfer in &data.transfers {
            let Some(location) = transfer.location else {
                continue;
            };
            features.push(json!({
                "type": "Feature",
                "geometry": point_geometry(location),
                "properties": {
                    "layer": "transfer",
                    "name": transfer.name,
                    "amount": transfer.amount.to_string(),
                    "party": transfer.party,
                    "entity": transfer.entity_type,
                    "tooltip": transfer.tooltip,
                    "url": transfer.document_url,
                },
            }));
        }

        json!({
            "type": "FeatureCollection",
            "name": data.pac,
            "features": features,
        })
    }
}

impl MapRenderer for GeoJsonRenderer {
    fn render(&self, data: &PacMapData) -> Result<String, MapError> {
        let value = self.to_value(data);
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        rendered.map_err(|e| MapError::Render(e.to_string()))
    }
}

fn point_geometry(point: Point) -> Value {
    json!({ "type": "Point", "coordinates": [point.lon, point.lat] })
}

fn closed_ring(polygon: &Polygon) -> Vec<[f64; 2]> {
    let mut ring: Vec<[f64; 2]> = polygon.exterior.iter().map(|p| [p.lon, p.lat]).collect();
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}
