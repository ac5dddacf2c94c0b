use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub age: Option<i32>,
    pub class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructor {
    pub id: i64,
    pub name: String,
}
