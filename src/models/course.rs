use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::dates;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub class: String,
    pub credits: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorCourse {
    pub instructor_id: i64,
    pub course_code: String,
    #[serde(default)]
    pub class: Option<String>,
}

/// Weekly slot a dated schedule is instantiated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub class: String,
    pub weekday: String,
    pub course_code: String,
    #[serde(with = "dates::time_of_day")]
    pub start_time: NaiveTime,
    #[serde(with = "dates::time_of_day")]
    pub end_time: NaiveTime,
}
