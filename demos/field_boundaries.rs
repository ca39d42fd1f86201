use agrimetrics::{Client, Location};
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Example program that calls the library API.
    // Configure the key via API_KEY or an `.agrimetricsrc` file.
    // RUST_LOG=agrimetrics=debug shows every page request.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let client = Client::from_env()?.with_progress(true);

    let shape = "POLYGON((-1.2905502319335938 51.57365561973001,-1.1772537231445312 51.57365561973001,-1.1772537231445312 51.64785047402897,-1.2905502319335938 51.64785047402897,-1.2905502319335938 51.57365561973001))";
    let boundaries = client.boundaries_within_shape(shape)?;
    let first = boundaries.first().context("no boundaries within shape")?;
    let last = boundaries.last().context("no boundaries within shape")?;
    println!("Total results retrieved: {}", boundaries.len());
    println!("The first field id: {}", first["id"]);
    println!("The last field id: {}", last["id"]);

    let near = client.boundaries_near(-0.98569, 53.71002, 200.0)?;
    println!(
        "Field boundaries within 200m: {} ({:?})",
        near.features.len(),
        near.field_ids()
    );

    let ids = client.field_ids_within(&Location::point(-0.138702, 51.963196), 10_000)?;
    println!("Fields within 10km: {}", ids.len());

    Ok(())
}
