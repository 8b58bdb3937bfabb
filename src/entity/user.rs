use time::PrimitiveDateTime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub picture: Option<String>,
    pub created_at: PrimitiveDateTime,
}
