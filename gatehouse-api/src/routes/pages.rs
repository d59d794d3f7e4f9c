/// Static page delivery
///
/// The HTML documents live in `pages/` and are embedded at compile time.
/// `/home` and `/product` only become reachable through their gates; the
/// rest are public.

use axum::response::Html;

/// Landing page with the registration form.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../pages/index.html"))
}

/// Login page.
pub async fn login() -> Html<&'static str> {
    Html(include_str!("../../pages/login.html"))
}

/// Home page (session-gated).
pub async fn home() -> Html<&'static str> {
    Html(include_str!("../../pages/home.html"))
}

/// Product page (token-gated).
pub async fn product() -> Html<&'static str> {
    Html(include_str!("../../pages/product.html"))
}

/// Post-registration success page.
pub async fn success() -> Html<&'static str> {
    Html(include_str!("../../pages/success.html"))
}

/// Generic error page; every failed flow redirects here.
pub async fn error() -> Html<&'static str> {
    Html(include_str!("../../pages/error.html"))
}
