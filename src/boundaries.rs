//! Field boundaries REST API.
//!
//! Listing endpoints are paged by number (`pageNum`, `pageSize`); the last
//! page is the first one holding fewer than `pageSize` results.

use serde_json::Value;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::extract;
use crate::models::FeatureCollection;
use crate::pager::PagedFetcher;
use crate::request::{Accept, RestRequest};

const PATH: &str = "field-boundaries";

impl Client {
    /// Pages of boundaries matching `request`, which should target
    /// `field-boundaries`. Items come from `results`, or `features` for
    /// GeoJSON requests.
    pub fn boundary_pages(
        &self,
        request: RestRequest,
    ) -> Result<PagedFetcher<'_, RestRequest, &Client, Value>> {
        let request = request.with_page_size(self.page_size());
        let pointer = request.accept().items_pointer();
        PagedFetcher::short_page(request, self, extract::items_at(pointer))
    }

    /// All boundaries of fields within a WKT shape.
    pub fn boundaries_within_shape(&self, wkt: &str) -> Result<Vec<Value>> {
        let request = self
            .rest(PATH)?
            .with_query("geometry", wkt)
            .with_query("op", "within");
        self.drain(self.boundary_pages(request)?)
    }

    /// All field boundaries within `radius_m` metres of a point, rebuilt into
    /// one GeoJSON FeatureCollection.
    pub fn boundaries_near(&self, lon: f64, lat: f64, radius_m: f64) -> Result<FeatureCollection> {
        let request = self
            .rest(PATH)?
            .with_query("lon", &lon.to_string())
            .with_query("lat", &lat.to_string())
            .with_query("distance", &radius_m.to_string())
            .with_accept(Accept::GeoJson);
        let features = self.drain(self.boundary_pages(request)?)?;
        Ok(FeatureCollection::new(features))
    }

    /// The boundary of one field as a GeoJSON Feature.
    pub fn boundary_by_id(&self, field_id: &str) -> Result<Value> {
        let request = self
            .rest(&format!("{}/{}", PATH, field_id))?
            .with_accept(Accept::GeoJson);
        let mut collection: FeatureCollection = self.get_as(&request)?;
        if collection.features.is_empty() {
            return Err(Error::UnexpectedResponse(format!(
                "no boundary feature returned for field {}",
                field_id
            )));
        }
        Ok(collection.features.swap_remove(0))
    }
}
