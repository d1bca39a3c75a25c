//! Session commands.

use blood_orange_client::ApiError;

use crate::context::AppContext;

/// Log in and store the session credentials.
pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<(), ApiError> {
    ctx.client.login(email, password).await?;
    tracing::info!("Logged in as {email}");
    Ok(())
}

/// Drop the stored session credentials and clear the local wishlist so
/// nothing leaks into the next session.
pub fn logout(ctx: &AppContext) -> Result<(), ApiError> {
    ctx.client.logout()?;
    ctx.wishlist.store().clear();
    tracing::info!("Logged out");
    Ok(())
}
