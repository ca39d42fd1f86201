//! Field finder and the per-field data APIs it links to.

use serde::de::DeserializeOwned;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::models::{FieldFacts, FieldForecasts, FieldRef, FieldTrends};
use crate::request::RestRequest;
use crate::util::join_url;

impl Client {
    /// Finds the field containing a coordinate.
    pub fn find_field(&self, lat: f64, lon: f64) -> Result<FieldRef> {
        let request = self
            .rest("field-finder")?
            .with_query("lat", &lat.to_string())
            .with_query("lon", &lon.to_string());
        let field: FieldRef = self.get_as(&request)?;
        tracing::debug!(field = %field.id, "found field");
        Ok(field)
    }

    /// Follows the field's `ag:api:<api>` link.
    pub fn field_api<T: DeserializeOwned>(&self, field: &FieldRef, api: &str) -> Result<T> {
        let href = field.api_link(api).ok_or_else(|| {
            Error::UnexpectedResponse(format!("field {} has no link to {}", field.id, api))
        })?;
        let request = RestRequest::new(join_url(self.base_url(), href)?);
        self.get_as(&request)
    }

    /// Monthly rainfall for the last three years.
    pub fn field_trends(&self, field: &FieldRef) -> Result<FieldTrends> {
        self.field_api(field, "field-trends")
    }

    /// Daily maximum temperature forecast.
    pub fn field_forecasts(&self, field: &FieldRef) -> Result<FieldForecasts> {
        self.field_api(field, "field-forecasts")
    }

    pub fn field_facts(&self, field: &FieldRef) -> Result<FieldFacts> {
        self.field_api(field, "field-facts")
    }
}
