//! A small blocking client for the Agrimetrics field data APIs.
//!
//! The core is [`PagedFetcher`]: it threads a page number or cursor through
//! repeated requests and yields each page lazily until the endpoint runs dry.
//! [`Client`] is the HTTP transport for both the REST and GraphQL flavours and
//! wraps the common field queries on top of it.
//!
//! ## Quick start
//! - Configure the subscription key via `API_KEY` (or `AGRIMETRICS_API_KEY`),
//!   or an `.agrimetricsrc` file in the current or home directory.
//! - Call one of the field queries, or build your own paged request.
//!
//! ```no_run
//! use agrimetrics::{Client, Location};
//!
//! fn main() -> agrimetrics::Result<()> {
//!     let client = Client::from_env()?;
//!
//!     let boundaries = client.boundaries_near(-0.98569, 53.71002, 200.0)?;
//!     println!("{} field boundaries", boundaries.features.len());
//!
//!     let ids = client.field_ids_within(&Location::point(-0.138702, 51.963196), 10_000)?;
//!     println!("{} fields within 10km", ids.len());
//!     Ok(())
//! }
//! ```
//!
//! Pages can also be consumed one at a time:
//!
//! ```no_run
//! use agrimetrics::{Client, PagedFetcher, extract};
//!
//! fn main() -> agrimetrics::Result<()> {
//!     let client = Client::from_env()?;
//!     let request = client
//!         .rest("field-boundaries")?
//!         .with_query("lon", "-0.98569")
//!         .with_query("lat", "53.71002")
//!         .with_query("distance", "200")
//!         .with_page_size(50);
//!
//!     for page in PagedFetcher::short_page(request, &client, extract::items_at("/results"))? {
//!         println!("page of {}", page?.len());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod boundaries;
mod client;
mod config;
mod error;
mod explorer;
pub mod extract;
mod graphql;
pub mod models;
mod pager;
mod request;
pub mod search;
mod util;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result, TransportError};
pub use models::{FeatureCollection, FieldRef, Location};
pub use pager::{Cursor, PageRequest, PagedFetcher, StopPolicy, Transport};
pub use request::{Accept, GraphQlRequest, RestRequest};
pub use search::{FieldSearch, SearchResults};
