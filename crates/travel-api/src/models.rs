//! Wire types for flight search and the community board

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One normalised flight offer as the backend flattens it.
///
/// The backend copies provider fields through as-is, so any field may be
/// missing, `null` or of an unexpected type. Each reads as its default
/// instead of rejecting the record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlightRecord {
    #[serde(deserialize_with = "lenient")]
    pub airline: String,
    #[serde(deserialize_with = "lenient")]
    pub logo: String,
    #[serde(deserialize_with = "lenient")]
    pub iata: String,
    #[serde(deserialize_with = "lenient")]
    pub price: f64,
    #[serde(deserialize_with = "lenient")]
    pub currency: String,
    #[serde(deserialize_with = "lenient")]
    pub departure_time: String,
    #[serde(deserialize_with = "lenient")]
    pub arrival_time: String,
    #[serde(deserialize_with = "lenient")]
    pub stops: u32,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Flight search result. An empty list stands for "nothing found" and for
/// every failure alike.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FlightSearch {
    #[serde(default)]
    pub flights: Vec<FlightRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Comment {
    pub id: u64,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_id: Option<u64>,
    #[serde(default)]
    pub post: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of a post creation. Author comes from the bearer token server-side.
#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub content: String,
}
