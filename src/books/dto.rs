use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BookUpsertRequest {
    pub title: String,
    pub author: String,
}
