//! Wishlist commands.

use blood_orange_core::VariantId;

use crate::context::AppContext;

/// List liked variants.
pub fn list(ctx: &AppContext) {
    let ids = ctx.wishlist.store().ids();

    if ids.is_empty() {
        tracing::info!("Wishlist is empty");
        return;
    }

    for id in &ids {
        tracing::info!("  {id}");
    }
    tracing::info!("{} liked variant(s)", ids.len());
}

/// Toggle a variant on or off, mirroring the change to the server.
pub async fn toggle(
    ctx: &AppContext,
    variant_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = VariantId::new(variant_id);

    if ctx.wishlist.store().contains(&id) {
        ctx.wishlist.toggle_off(&id).await?;
        tracing::info!("Removed {id} from wishlist");
    } else {
        ctx.wishlist.toggle_on(&id).await?;
        tracing::info!("Added {id} to wishlist");
    }

    Ok(())
}

/// Reconcile the local wishlist against server truth.
pub async fn sync(ctx: &AppContext) -> Result<(), Box<dyn std::error::Error>> {
    // Identity gates the reconciliation: logged out clears, logged in
    // overwrites with the server's membership.
    let identity = if ctx.client.credentials().read().is_some() {
        Some(ctx.client.profile().await?.id)
    } else {
        None
    };

    ctx.wishlist.reconcile(identity.as_ref()).await?;

    tracing::info!(
        "Wishlist synced: {} liked variant(s)",
        ctx.wishlist.store().count()
    );
    Ok(())
}
