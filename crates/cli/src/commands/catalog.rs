//! Catalog browsing commands.

use blood_orange_client::ApiError;

use crate::context::AppContext;

/// List a page of products.
pub async fn list(ctx: &AppContext, cursor: Option<&str>) -> Result<(), ApiError> {
    let page = ctx.client.list_products(cursor).await?;

    tracing::info!("{} product(s)", page.items.len());
    for product in &page.items {
        tracing::info!(
            "  {}  {}  ${}",
            product.handle,
            product.title,
            product.price.round_dp(2)
        );
    }

    match page.next_cursor {
        Some(cursor) => tracing::info!("More available: --cursor {cursor}"),
        None => tracing::info!("End of catalog"),
    }

    Ok(())
}

/// Show one product with its variants.
pub async fn show(ctx: &AppContext, handle: &str) -> Result<(), ApiError> {
    let product = ctx.client.get_product(handle).await?;

    tracing::info!("{} ({})", product.title, product.handle);
    if let Some(description) = &product.description {
        tracing::info!("  {description}");
    }

    for variant in &product.variants {
        let availability = if variant.available { "" } else { "  [sold out]" };
        tracing::info!(
            "  {}  {}  sku={}  ${}{}",
            variant.id,
            variant.title,
            variant.sku,
            variant.price.round_dp(2),
            availability
        );
    }

    Ok(())
}
