use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
}

/// A row of the `Users` resource as the data API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub role: Role,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// The signed-in principal. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub role: Role,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.user_id,
            role: record.role,
        }
    }
}
