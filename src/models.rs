//! Typed views of the payloads returned by the field APIs.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const SOIL_LAYER_PREFIX: &str = "http://data.agrimetrics.co.uk/soil-layer-types/";

/// GeoJSON geometry used as a GraphQL location filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Location {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

impl Location {
    pub fn point(lon: f64, lat: f64) -> Self {
        Location::Point {
            coordinates: [lon, lat],
        }
    }

    /// Single-ring polygon; the ring is closed if the last vertex differs
    /// from the first.
    pub fn polygon(ring: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut ring: Vec<[f64; 2]> = ring.into_iter().map(|(lon, lat)| [lon, lat]).collect();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        Location::Polygon {
            coordinates: vec![ring],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Value>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Value>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }

    /// `properties.id` of each feature that has one.
    pub fn field_ids(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter_map(|f| f.pointer("/properties/id").and_then(Value::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Link {
    pub href: String,
}

/// Field finder result: the field's identifier and links to its data APIs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldRef {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "_links", default)]
    pub links: BTreeMap<String, Link>,
}

impl FieldRef {
    /// Link to one of the field APIs (`field-trends`, `field-facts`, ...).
    pub fn api_link(&self, api: &str) -> Option<&str> {
        self.links
            .get(&format!("ag:api:{}", api))
            .map(|l| l.href.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeSeries {
    #[serde(rename = "hasDatapoint", default)]
    pub datapoints: Vec<Datapoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Datapoint {
    #[serde(default, deserialize_with = "lenient_int")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub month: Option<u32>,
    #[serde(rename = "dateTime", default)]
    pub date_time: Option<String>,
    pub value: f64,
}

impl Datapoint {
    /// First day of the datapoint's month, or the date of its `dateTime`.
    pub fn date(&self) -> Option<NaiveDate> {
        if let (Some(year), Some(month)) = (self.year, self.month) {
            return NaiveDate::from_ymd_opt(year, month, 1);
        }
        let s = self.date_time.as_deref()?.trim();
        DateTime::parse_from_rfc3339(s)
            .map(|d| d.date_naive())
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").map(|d| d.date()))
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .ok()
    }
}

fn lenient_int<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + TryFrom<i64>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|n| T::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("integer out of range: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("not an integer: {}", s))),
        Some(other) => Err(D::Error::custom(format!("not an integer: {}", other))),
    }
}

/// Monthly rainfall from the field-trends API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldTrends {
    #[serde(rename = "hasMonthlyTotalRainfall")]
    pub monthly_total_rainfall: TimeSeries,
    #[serde(rename = "hasLongTermAverageMonthlyTotalRainfall", default)]
    pub long_term_average_monthly_rainfall: Option<TimeSeries>,
}

/// Daily maximum temperature forecast from the field-forecasts API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldForecasts {
    #[serde(rename = "hasForecastDailyMaximumTemperature")]
    pub daily_maximum_temperature: TimeSeries,
}

/// Soil layers from the field-facts API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldFacts {
    #[serde(rename = "hasSoilLayer", default)]
    pub soil_layers: Vec<SoilLayer>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoilLayer {
    #[serde(rename = "hasSoilLayerType")]
    pub layer_type: String,
    #[serde(rename = "hasSoilTexture", default)]
    pub texture: Option<SoilTexture>,
}

impl SoilLayer {
    /// `topsoil`, `subsoil`, ...
    pub fn layer_name(&self) -> &str {
        self.layer_type
            .strip_prefix(SOIL_LAYER_PREFIX)
            .unwrap_or(&self.layer_type)
    }

    pub fn is_topsoil(&self) -> bool {
        self.layer_name() == "topsoil"
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilTexture {
    #[serde(default)]
    pub sand_percentage: Option<f64>,
    #[serde(default)]
    pub clay_percentage: Option<f64>,
    #[serde(default)]
    pub silt_percentage: Option<f64>,
    #[serde(rename = "hasSoilTextureType", default)]
    pub texture_type: Option<String>,
}

impl SoilTexture {
    /// Last path segment of the texture type URI.
    pub fn texture_name(&self) -> Option<&str> {
        self.texture_type
            .as_deref()
            .and_then(|t| t.rsplit('/').next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn location_serializes_as_geojson() {
        assert_eq!(
            serde_json::to_value(Location::point(-0.138702, 51.963196)).unwrap(),
            json!({"type": "Point", "coordinates": [-0.138702, 51.963196]})
        );

        let poly = Location::polygon([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert_eq!(
            serde_json::to_value(&poly).unwrap(),
            json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]})
        );
    }

    #[test]
    fn datapoint_dates() {
        let monthly: Datapoint =
            serde_json::from_value(json!({"year": "2019", "month": 5, "value": 41.2})).unwrap();
        assert_eq!(monthly.date(), NaiveDate::from_ymd_opt(2019, 5, 1));

        let daily: Datapoint =
            serde_json::from_value(json!({"dateTime": "2024-03-02T00:00:00Z", "value": 11.0}))
                .unwrap();
        assert_eq!(daily.date(), NaiveDate::from_ymd_opt(2024, 3, 2));

        let plain: Datapoint =
            serde_json::from_value(json!({"dateTime": "2024-03-03T06:00:00", "value": 1.0}))
                .unwrap();
        assert_eq!(plain.date(), NaiveDate::from_ymd_opt(2024, 3, 3));

        let bad = serde_json::from_value::<Datapoint>(json!({"year": "soon", "value": 1.0}));
        assert!(bad.is_err());
    }

    #[test]
    fn field_ref_links() {
        let field: FieldRef = serde_json::from_value(json!({
            "@id": "https://data.agrimetrics.co.uk/fields/abc",
            "_links": {"ag:api:field-facts": {"href": "https://api.example.test/field-facts/abc"}}
        }))
        .unwrap();
        assert_eq!(
            field.api_link("field-facts"),
            Some("https://api.example.test/field-facts/abc")
        );
        assert_eq!(field.api_link("field-trends"), None);
    }

    #[test]
    fn soil_layer_names() {
        let facts: FieldFacts = serde_json::from_value(json!({"hasSoilLayer": [{
            "hasSoilLayerType": "http://data.agrimetrics.co.uk/soil-layer-types/topsoil",
            "hasSoilTexture": {
                "sandPercentage": 40.0,
                "clayPercentage": 25.0,
                "siltPercentage": 35.0,
                "hasSoilTextureType": "http://data.agrimetrics.co.uk/soil-texture-types/loam"
            }
        }]}))
        .unwrap();

        let layer = &facts.soil_layers[0];
        assert_eq!(layer.layer_name(), "topsoil");
        assert!(layer.is_topsoil());
        let texture = layer.texture.as_ref().unwrap();
        assert_eq!(texture.texture_name(), Some("loam"));
        assert_eq!(texture.clay_percentage, Some(25.0));
    }

    #[test]
    fn feature_collection_ids() {
        let fc = FeatureCollection::new(vec![
            json!({"type": "Feature", "properties": {"id": "a"}}),
            json!({"type": "Feature", "properties": {}}),
        ]);
        assert_eq!(fc.field_ids(), vec!["a"]);
        assert_eq!(serde_json::to_value(&fc).unwrap()["type"], "FeatureCollection");
    }
}
