use http::Method;
use http::header::HeaderName;
use tally_config::{AnyOrList, CorsConfig};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Build the CORS layer for browser clients
///
/// Only the methods the assistant routes serve are allowed. Unparseable
/// origins and header names are skipped with a warning.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new().allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    layer = match &config.origins {
        AnyOrList::Any => layer.allow_origin(AllowOrigin::any()),
        AnyOrList::List(origins) => {
            let origins: Vec<http::HeaderValue> = origins
                .iter()
                .filter_map(|origin| {
                    origin
                        .parse()
                        .inspect_err(|_| tracing::warn!(%origin, "ignoring invalid CORS origin"))
                        .ok()
                })
                .collect();
            layer.allow_origin(origins)
        }
    };

    layer = match &config.headers {
        AnyOrList::Any => layer.allow_headers(AllowHeaders::any()),
        AnyOrList::List(headers) => {
            let headers: Vec<HeaderName> = headers
                .iter()
                .filter_map(|header| {
                    header
                        .parse()
                        .inspect_err(|_| tracing::warn!(%header, "ignoring invalid CORS header"))
                        .ok()
                })
                .collect();
            layer.allow_headers(headers)
        }
    };

    if let Some(duration) = config.max_age_duration() {
        layer = layer.max_age(duration);
    }

    layer
}
