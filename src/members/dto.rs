use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MemberUpsertRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}
