//! Static exchange-rate feeds in the three wire formats the rate sources
//! consume. Stand-ins for an external provider, mostly useful for demos and
//! self-contained deployments.

use axum::Json;
use axum::http::header;
use axum::response::IntoResponse;
use serde::Serialize;

const RATES: &[(&str, &str, f64)] = &[("USD", "EUR", 0.92), ("EUR", "USD", 1.09)];

#[derive(Serialize)]
struct FeedRate {
    from: &'static str,
    to: &'static str,
    value: f64,
}

#[derive(Serialize)]
pub(crate) struct Feed {
    rates: Vec<FeedRate>,
}

pub async fn xml() -> impl IntoResponse {
    let mut body = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><rates>");
    for (from, to, value) in RATES {
        body.push_str(&format!(
            "<rate><from>{from}</from><to>{to}</to><value>{value}</value></rate>"
        ));
    }
    body.push_str("</rates>");

    ([(header::CONTENT_TYPE, "application/xml")], body)
}

pub async fn json() -> Json<Feed> {
    Json(Feed {
        rates: RATES
            .iter()
            .map(|(from, to, value)| FeedRate {
                from,
                to,
                value: *value,
            })
            .collect(),
    })
}

pub async fn csv() -> impl IntoResponse {
    let mut body = String::new();
    for (from, to, value) in RATES {
        body.push_str(&format!("{from},{to},{value}\n"));
    }

    ([(header::CONTENT_TYPE, "text/csv")], body)
}
