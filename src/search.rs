//! OData field search.

use serde::Deserialize;
use serde_json::Value;

use crate::client::Client;
use crate::error::Result;

/// A `$filter`/`$select` query against the field-search API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSearch {
    filter: Option<String>,
    shape: Option<String>,
    select: Vec<String>,
}

impl FieldSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Property filter, e.g. `Field/hasSownCrop/any(c: c/harvestYear eq 2018)`.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Spatial filter, see [`within_distance`] and [`intersects`].
    pub fn shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    pub fn select<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(properties.into_iter().map(Into::into));
        self
    }

    /// Combined `$filter` expression: property filter `and` shape.
    pub fn filter_expression(&self) -> Option<String> {
        match (&self.filter, &self.shape) {
            (Some(f), Some(s)) => Some(format!("{} and {}", f, s)),
            (Some(f), None) => Some(f.clone()),
            (None, Some(s)) => Some(s.clone()),
            (None, None) => None,
        }
    }

    pub fn select_expression(&self) -> Option<String> {
        (!self.select.is_empty()).then(|| self.select.join(","))
    }
}

/// Fields whose centroid lies within `metres` of a point.
pub fn within_distance(lon: f64, lat: f64, metres: f64) -> String {
    format!(
        "geo.distance(Field/centroid,geography'SRID=0;Point({} {})') lt {}",
        lon, lat, metres
    )
}

/// Fields intersecting a WKT geometry, e.g. a `MultiLineString` outline.
pub fn intersects(wkt: &str) -> String {
    format!("geo.intersects(Location, geography'SRID=0;{}')", wkt)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResults {
    #[serde(rename = "totalResults", default)]
    pub total_results: u64,
    #[serde(default)]
    pub results: Vec<Value>,
}

impl Client {
    pub fn search_fields(&self, search: &FieldSearch) -> Result<SearchResults> {
        let mut request = self.rest("field-search")?;
        if let Some(filter) = search.filter_expression() {
            request.set_query("$filter", &filter);
        }
        if let Some(select) = search.select_expression() {
            request.set_query("$select", &select);
        }
        let results: SearchResults = self.get_as(&request)?;
        tracing::info!(
            total = results.total_results,
            returned = results.results.len(),
            "field search"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn combines_filter_and_shape() {
        let search = FieldSearch::new()
            .filter("(Field/hasSownCrop/any(c: c/harvestYear eq 2018 and c/label eq 'Wheat'))")
            .shape(within_distance(-0.138702, 51.963196, 3500.0))
            .select(["Field/hasSoilLayer", "Field/hasMonthlyTotalRainfall"]);

        assert_eq!(
            search.filter_expression().unwrap(),
            "(Field/hasSownCrop/any(c: c/harvestYear eq 2018 and c/label eq 'Wheat')) and \
             geo.distance(Field/centroid,geography'SRID=0;Point(-0.138702 51.963196)') lt 3500"
        );
        assert_eq!(
            search.select_expression().unwrap(),
            "Field/hasSoilLayer,Field/hasMonthlyTotalRainfall"
        );
    }

    #[test]
    fn empty_search_has_no_expressions() {
        let search = FieldSearch::new();
        assert_eq!(search.filter_expression(), None);
        assert_eq!(search.select_expression(), None);
        assert_eq!(
            FieldSearch::new().shape(intersects("Point(0 0)")).filter_expression(),
            Some("geo.intersects(Location, geography'SRID=0;Point(0 0)')".to_string())
        );
    }
}
