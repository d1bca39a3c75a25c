//! Cart commands.

use blood_orange_core::{CartItem, Sku, VariantId};

use crate::context::AppContext;

/// Show the cart contents and totals.
pub fn show(ctx: &AppContext) {
    let items = ctx.cart.items();

    if items.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }

    for item in &items {
        tracing::info!(
            "  {} x{}  {}  ${}",
            item.sku,
            item.quantity,
            item.title,
            item.line_total().round_dp(2)
        );
    }
    tracing::info!(
        "{} item(s), total ${}",
        ctx.cart.total_items(),
        ctx.cart.total_price().round_dp(2)
    );
}

/// Add one unit of a product's variant to the cart.
pub async fn add(
    ctx: &AppContext,
    handle: &str,
    variant_id: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let product = ctx.client.get_product(handle).await?;

    let variant = match variant_id {
        Some(id) => {
            let id = VariantId::new(id);
            product
                .variant(&id)
                .ok_or_else(|| format!("product '{handle}' has no variant '{id}'"))?
        }
        None => product
            .default_variant()
            .ok_or_else(|| format!("product '{handle}' has no variants"))?,
    };

    ctx.cart.add_item(CartItem {
        sku: variant.sku.clone(),
        product_id: product.id.clone(),
        variant_id: variant.id.clone(),
        title: product.title.clone(),
        unit_price: variant.price,
        original_price: variant.original_price,
        image_url: product.image_url.clone(),
        quantity: 1,
        attributes: variant.attributes.clone(),
    });

    tracing::info!(
        "Added {} ({}), now x{}",
        product.title,
        variant.sku,
        ctx.cart.quantity_of(&variant.sku)
    );
    Ok(())
}

/// Remove a line item.
pub fn remove(ctx: &AppContext, sku: &str) {
    let sku = Sku::new(sku);
    if ctx.cart.contains(&sku) {
        ctx.cart.remove_item(&sku);
        tracing::info!("Removed {sku}");
    } else {
        tracing::info!("No line item with sku {sku}");
    }
}

/// Set a line item's quantity; zero removes it.
pub fn set_quantity(ctx: &AppContext, sku: &str, quantity: u32) {
    let sku = Sku::new(sku);
    if !ctx.cart.contains(&sku) {
        tracing::info!("No line item with sku {sku}");
        return;
    }

    ctx.cart.update_quantity(&sku, quantity);
    if quantity == 0 {
        tracing::info!("Removed {sku}");
    } else {
        tracing::info!("Set {sku} to x{quantity}");
    }
}

/// Empty the cart.
pub fn clear(ctx: &AppContext) {
    ctx.cart.clear();
    tracing::info!("Cart cleared");
}
