use serde::Deserialize;

use crate::borrows::repo::ItemStatus;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    200
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Borrowed,
    Returned,
}

impl StatusFilter {
    pub fn as_item_status(self) -> Option<ItemStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Borrowed => Some(ItemStatus::Borrowed),
            StatusFilter::Returned => Some(ItemStatus::Returned),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub status: StatusFilter,
}
