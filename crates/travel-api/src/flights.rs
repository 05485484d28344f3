//! Flight search, airport lookup and flight details

use common::Secret;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};
use travel_session::{OutboundRequest, Session};

use crate::fetch;
use crate::models::{FlightRecord, FlightSearch};

pub const SEARCH_PATH: &str = "/api/flights/search/";
pub const AIRPORTS_PATH: &str = "/api/flights/search-airports/";
pub const DETAILS_PATH: &str = "/api/flights/details/";

pub const DEFAULT_RAPIDAPI_HOST: &str = "booking-com15.p.rapidapi.com";

const RAPIDAPI_HOST_HEADER: HeaderName = HeaderName::from_static("x-rapidapi-host");
const RAPIDAPI_KEY_HEADER: HeaderName = HeaderName::from_static("x-rapidapi-key");

/// Third-party provider headers forwarded on flight searches.
#[derive(Debug, Clone)]
pub struct RapidApi {
    pub host: String,
    pub key: Option<Secret<String>>,
}

impl Default for RapidApi {
    fn default() -> Self {
        Self {
            host: DEFAULT_RAPIDAPI_HOST.to_string(),
            key: None,
        }
    }
}

impl RapidApi {
    fn apply(&self, mut request: OutboundRequest) -> OutboundRequest {
        match HeaderValue::from_str(&self.host) {
            Ok(host) => request = request.header(RAPIDAPI_HOST_HEADER, host),
            Err(e) => warn!(error = %e, "rapidapi host is not a valid header value"),
        }
        match &self.key {
            Some(key) => match HeaderValue::from_str(key.expose()) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    request = request.header(RAPIDAPI_KEY_HEADER, value);
                }
                Err(_) => warn!("rapidapi key is not a valid header value"),
            },
            None => debug!("no rapidapi key configured"),
        }
        request
    }
}

/// Search flights. Any failure, or a body without a `flights` array,
/// yields an empty result.
pub async fn search_flights(
    session: &Session,
    rapidapi: &RapidApi,
    origin: &str,
    destination: &str,
    depart_date: &str,
) -> FlightSearch {
    let request = match session.endpoint(SEARCH_PATH) {
        Ok(url) => OutboundRequest::get(url)
            .query("origin", origin)
            .query("destination", destination)
            .query("depart_date", depart_date),
        Err(e) => {
            warn!(error = %e, "flight search endpoint");
            return FlightSearch::default();
        }
    };

    let body: Value = match fetch(session, rapidapi.apply(request)).await {
        Ok(reply) => match reply.json() {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "flight search returned a malformed body");
                return FlightSearch::default();
            }
        },
        Err(e) => {
            warn!(error = %e, origin, destination, "flight search failed");
            return FlightSearch::default();
        }
    };

    normalize_flights(&body)
}

/// Keep the `flights` array only when it is present and an array.
/// Entries that are not objects are dropped. Object entries are kept even
/// when some fields are `null` or mistyped.
fn normalize_flights(body: &Value) -> FlightSearch {
    let Some(entries) = body.get("flights").and_then(Value::as_array) else {
        warn!("flight search response has no flights array");
        return FlightSearch::default();
    };

    let flights = entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<FlightRecord>(entry.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skipping malformed flight record");
                None
            }
        })
        .collect();
    FlightSearch { flights }
}

/// Airport autocomplete. Returns the body's `data` array, or empty.
pub async fn search_airports(session: &Session, query: &str) -> Vec<Value> {
    let request = match session.endpoint(AIRPORTS_PATH) {
        Ok(url) => OutboundRequest::get(url).query("query", query),
        Err(e) => {
            warn!(error = %e, "airport search endpoint");
            return Vec::new();
        }
    };

    match fetch(session, request).await.and_then(|r| r.json::<Value>()) {
        Ok(mut body) => match body.get_mut("data").map(Value::take) {
            Some(Value::Array(airports)) => airports,
            _ => Vec::new(),
        },
        Err(e) => {
            warn!(error = %e, query, "airport search failed");
            Vec::new()
        }
    }
}

/// Details for one offer token. Returns `{}` on any failure.
pub async fn flight_details(session: &Session, token: &str) -> Value {
    let empty = || Value::Object(serde_json::Map::new());
    let request = match session.endpoint(DETAILS_PATH) {
        Ok(url) => OutboundRequest::get(url).query("token", token),
        Err(e) => {
            warn!(error = %e, "flight details endpoint");
            return empty();
        }
    };

    match fetch(session, request).await.and_then(|r| r.json::<Value>()) {
        Ok(details) => details,
        Err(e) => {
            warn!(error = %e, "flight details failed");
            empty()
        }
    }
}
