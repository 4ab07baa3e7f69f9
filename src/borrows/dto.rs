use serde::{Deserialize, Serialize};

/// Fields are optional so every missing selection can be reported at once
/// instead of failing on the first.
#[derive(Debug, Deserialize)]
pub struct CreateBorrowRequest {
    pub member_id: Option<i64>,
    pub due_date: Option<String>,
    #[serde(default)]
    pub book_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreatedBorrowResponse {
    pub tx_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BulkReturnRequest {
    #[serde(default)]
    pub item_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ReturnOutcome {
    pub returned: bool,
}

#[derive(Debug, Deserialize)]
pub struct ActiveItemsQuery {
    pub member_id: Option<i64>,
}
