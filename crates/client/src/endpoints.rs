//! The backend endpoint table and path normalization.
//!
//! The backend's router is slash-sensitive: canonical routes end with a
//! trailing `/`, and a request missing it is a 404 rather than a
//! redirect. Every outbound path therefore goes through
//! [`normalize_path`], with two exceptions:
//!
//! - endpoints whose final segment is a dynamic value the server matches
//!   verbatim (an email-verification token) - appending `/` would
//!   corrupt the value;
//! - endpoints that carry a query string - the query, not the path,
//!   ends the URL.
//!
//! The table below is exhaustive; the client refuses to build URLs for
//! anything else, which keeps the public allow-list (endpoints that get
//! no `Authorization` header) checkable in one place.

use blood_orange_core::VariantId;

/// Every route the client knows how to call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET products/` - paginated catalog listing.
    Products { cursor: Option<String> },
    /// `GET products/{handle}/` - single product by handle.
    Product { handle: String },
    /// `POST auth/login/` - exchange email/password for a token pair.
    Login,
    /// `POST auth/register/` - create an account.
    Register,
    /// `POST auth/token/refresh/` - exchange a refresh token.
    TokenRefresh,
    /// `GET auth/verify-email/{token}` - the token is matched verbatim,
    /// so this path never receives a forced trailing slash.
    EmailVerification { token: String },
    /// `GET account/profile/` - current customer.
    Profile,
    /// `GET account/orders/` - order history.
    Orders,
    /// `GET wishlist/` - wishlist membership.
    Wishlist,
    /// `POST`/`DELETE wishlist/items/{variant_id}/` - toggle membership.
    WishlistItem { variant_id: VariantId },
}

impl Endpoint {
    /// Relative URL (no leading slash), normalized for the backend's
    /// routing rules.
    #[must_use]
    pub fn relative_url(&self) -> String {
        let raw = match self {
            Self::Products { cursor } => match cursor {
                Some(cursor) => format!("products?cursor={}", urlencoding::encode(cursor)),
                None => "products".to_owned(),
            },
            Self::Product { handle } => format!("products/{}", urlencoding::encode(handle)),
            Self::Login => "auth/login".to_owned(),
            Self::Register => "auth/register".to_owned(),
            Self::TokenRefresh => "auth/token/refresh".to_owned(),
            Self::EmailVerification { token } => {
                format!("auth/verify-email/{}", urlencoding::encode(token))
            }
            Self::Profile => "account/profile".to_owned(),
            Self::Orders => "account/orders".to_owned(),
            Self::Wishlist => "wishlist".to_owned(),
            Self::WishlistItem { variant_id } => {
                format!("wishlist/items/{}", urlencoding::encode(variant_id.as_str()))
            }
        };

        normalize_path(&raw, self.slash_exempt())
    }

    /// Endpoints that are served without bearer authorization.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        matches!(
            self,
            Self::Products { .. }
                | Self::Product { .. }
                | Self::Login
                | Self::Register
                | Self::TokenRefresh
                | Self::EmailVerification { .. }
        )
    }

    /// Endpoints whose final path segment is a dynamic value the server
    /// matches verbatim.
    #[must_use]
    pub const fn slash_exempt(&self) -> bool {
        matches!(self, Self::EmailVerification { .. })
    }

    /// Cache key for catalog endpoints; `None` for everything that must
    /// never be served from cache.
    #[must_use]
    pub fn cache_key(&self) -> Option<String> {
        match self {
            Self::Products { .. } | Self::Product { .. } => Some(self.relative_url()),
            _ => None,
        }
    }
}

/// Apply the trailing-slash rule: append `/` unless the path already
/// ends with one, is exempt, or carries a query string.
#[must_use]
pub fn normalize_path(path: &str, exempt: bool) -> String {
    if exempt || path.ends_with('/') || path.contains('?') {
        return path.to_owned();
    }
    format!("{path}/")
}
