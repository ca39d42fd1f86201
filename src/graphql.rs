//! Field queries against the GraphQL endpoint.
//!
//! Large result sets are paged with a cursor: every field carries its own
//! `cursor`, and the last field's cursor is passed back as `after`.

use chrono::{Datelike, Local, NaiveDate};
use serde_json::Value;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::extract;
use crate::models::Location;
use crate::pager::PagedFetcher;
use crate::request::GraphQlRequest;

const FIELDS: &str = "/data/fields";

const SOIL_POLYGON_QUERY: &str = "query SoilPolygonQuery($location: LocationFilter!) {
    fields(filter: {location: $location}) {
        id
        area
        altitude
        soil { topSoil { texture { type } } }
    }
}";

const FIELD_BY_ID_QUERY: &str = "query FieldById($fieldId: ID!) {
    fields(filter: {id: $fieldId}) {
        id
        area
        altitude
        soil { topSoil { texture { type } } }
    }
}";

const RAINFALL_QUERY: &str = "query RainfallQuery($fieldId: ID!, $startDate: Date!) {
    fields(filter: {id: $fieldId}) {
        id
        weatherObservations(dateRange: {startDate: $startDate}) {
            rainfallTotalDaily { value }
        }
    }
}";

fn soil_point_query(distance_m: u32) -> String {
    format!(
        "query SoilPointQuery($location: LocationFilter!) {{
    fields(filter: {{location: $location distance: {}}}) {{
        id
        soil {{ topSoil {{ texture {{ type }} }} }}
    }}
}}",
        distance_m
    )
}

fn large_area_query(distance_m: u32) -> String {
    format!(
        "query LargeSearchArea($location: LocationFilter!, $cursor: String) {{
    fields(filter: {{location: $location distance: {}}}, after: $cursor) {{
        id
        cursor
    }}
}}",
        distance_m
    )
}

fn location_value(location: &Location) -> Result<Value> {
    serde_json::to_value(location)
        .map_err(|e| Error::UnexpectedResponse(format!("location is not valid GeoJSON: {}", e)))
}

impl Client {
    /// Runs one query and returns its `data.fields` array.
    pub fn query_fields(&self, request: &GraphQlRequest) -> Result<Vec<Value>> {
        let response = self.post_graphql(request)?;
        extract::items_at(FIELDS)(&response)
    }

    /// Area, altitude and topsoil texture of fields inside a polygon.
    pub fn soil_by_polygon(&self, polygon: &Location) -> Result<Vec<Value>> {
        let request = GraphQlRequest::new(SOIL_POLYGON_QUERY)
            .with_operation_name("SoilPolygonQuery")
            .with_variable("location", location_value(polygon)?);
        self.query_fields(&request)
    }

    /// Topsoil texture of fields within `distance_m` metres of a point.
    pub fn soil_near(&self, point: &Location, distance_m: u32) -> Result<Vec<Value>> {
        let request = GraphQlRequest::new(soil_point_query(distance_m))
            .with_operation_name("SoilPointQuery")
            .with_variable("location", location_value(point)?);
        self.query_fields(&request)
    }

    pub fn field_by_id(&self, field_id: &str) -> Result<Option<Value>> {
        let request = GraphQlRequest::new(FIELD_BY_ID_QUERY)
            .with_operation_name("FieldById")
            .with_variable("fieldId", field_id);
        Ok(self.query_fields(&request)?.into_iter().next())
    }

    /// Total daily rainfall observed for a field since `start`.
    pub fn daily_rainfall_since(&self, field_id: &str, start: NaiveDate) -> Result<Vec<Value>> {
        let request = GraphQlRequest::new(RAINFALL_QUERY)
            .with_operation_name("RainfallQuery")
            .with_variable("fieldId", field_id)
            .with_variable("startDate", start.format("%Y-%m-%d").to_string());
        self.query_fields(&request)
    }

    pub fn daily_rainfall_this_month(&self, field_id: &str) -> Result<Vec<Value>> {
        let today = Local::now().date_naive();
        let start = today.with_day(1).unwrap_or(today);
        self.daily_rainfall_since(field_id, start)
    }

    /// Pages of fields (`id`, `cursor`) within `distance_m` metres of a point.
    pub fn field_pages(
        &self,
        point: &Location,
        distance_m: u32,
    ) -> Result<PagedFetcher<'_, GraphQlRequest, &Client, Value>> {
        let request = GraphQlRequest::new(large_area_query(distance_m))
            .with_operation_name("LargeSearchArea")
            .with_variable("location", location_value(point)?)
            .with_variable("cursor", Value::Null);
        Ok(PagedFetcher::cursor(
            request,
            self,
            extract::items_at(FIELDS),
            extract::last_item_cursor(FIELDS, "cursor"),
        ))
    }

    /// Ids of every field within `distance_m` metres of a point.
    pub fn field_ids_within(&self, point: &Location, distance_m: u32) -> Result<Vec<String>> {
        let fields = self.drain(self.field_pages(point, distance_m)?)?;
        fields
            .iter()
            .map(|f| {
                f.get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| Error::UnexpectedResponse(format!("field without id: {}", f)))
            })
            .collect()
    }
}
