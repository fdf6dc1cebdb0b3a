//! Handlers for the `quote` and `options` commands.

use anyhow::Context;
use gemstore_core::{MetalCode, PricingConfig, ProductPricing};
use gemstore_pricing::{
    CaratOptionSet, ControllerSettings, HttpPriceClient, PriceController, ResolutionState,
};

/// Selection flags for a single quote.
#[derive(Debug)]
pub(crate) struct QuoteSelection {
    pub carat_index: usize,
    pub metal: MetalCode,
    pub color: Option<String>,
    pub size: Option<String>,
}

async fn load_product(
    config: &PricingConfig,
    product_id: &str,
) -> anyhow::Result<(HttpPriceClient, ProductPricing)> {
    let client = HttpPriceClient::from_config(config)
        .context("failed to build pricing client")?;
    let product = client
        .fetch_product(product_id)
        .await
        .with_context(|| format!("failed to fetch product '{product_id}'"))?;
    tracing::debug!(
        product_id,
        base_price = ?product.base_price,
        carat_records = product.carats.len(),
        "product loaded"
    );
    Ok((client, product))
}

/// Fetches the product, applies `selection` and resolves one price.
///
/// A pricing backend failure is not an error here; the controller falls
/// back to the local formula and the output names the source.
///
/// # Errors
///
/// Returns an error if the client cannot be built, the product cannot be
/// fetched, or the product has no usable carat options.
pub(crate) async fn run_quote(
    config: &PricingConfig,
    product_id: &str,
    selection: QuoteSelection,
    json: bool,
) -> anyhow::Result<()> {
    let (client, product) = load_product(config, product_id).await?;
    let controller =
        PriceController::new(client, &product, ControllerSettings::from_config(config));

    if controller.options().is_empty() {
        anyhow::bail!("product '{product_id}' has no usable carat options");
    }

    controller.select_carat(selection.carat_index);
    controller.select_metal(selection.metal);
    if let Some(color) = selection.color {
        controller.select_color(color);
    }
    if let Some(size) = selection.size {
        controller.select_size(size);
    }

    let snapshot = controller.resolve_now().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let options = controller.options();
    let carat = options
        .get(snapshot.selection.carat_index)
        .map_or(0.0, |option| option.carat_weight);

    match &snapshot.state {
        ResolutionState::Resolved(quote) => {
            let unit_price = quote
                .unit_price()
                .map_or_else(|| quote.value.to_string(), |d| d.to_string());
            println!(
                "{product_id} {carat}ct {}: {unit_price} ({})",
                snapshot.selection.metal, quote.source
            );
        }
        ResolutionState::Failed(reason) => {
            anyhow::bail!("could not price {product_id} at {carat}ct: {reason}");
        }
        other => {
            anyhow::bail!("price resolution ended in unexpected state {other:?}");
        }
    }

    Ok(())
}

/// Prints the product's derived carat options in index order.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the product cannot be
/// fetched.
pub(crate) async fn run_options(
    config: &PricingConfig,
    product_id: &str,
    json: bool,
) -> anyhow::Result<()> {
    let (_client, product) = load_product(config, product_id).await?;
    let options = CaratOptionSet::from_records(&product.carats);

    if json {
        println!("{}", serde_json::to_string_pretty(options.as_slice())?);
        return Ok(());
    }

    if options.is_empty() {
        println!("{product_id}: no carat options");
        return Ok(());
    }

    for (index, option) in options.iter().enumerate() {
        println!("{index:>3}  {:>6}ct  id={}", option.carat_weight, option.id);
    }
    Ok(())
}
