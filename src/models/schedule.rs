use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    #[serde(with = "dates::datetime")]
    pub session_start: NaiveDateTime,
    #[serde(with = "dates::datetime")]
    pub session_end: NaiveDateTime,
    pub class: String,
    pub course_code: String,
    pub fixed: bool,
}

/// POST body for `Schedules`; the data API assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSchedule {
    #[serde(with = "dates::datetime")]
    pub session_start: NaiveDateTime,
    #[serde(with = "dates::datetime")]
    pub session_end: NaiveDateTime,
    pub class: String,
    pub course_code: String,
    pub fixed: bool,
}

impl NewSchedule {
    pub fn with_id(self, id: i64) -> Schedule {
        Schedule {
            id,
            session_start: self.session_start,
            session_end: self.session_end,
            class: self.class,
            course_code: self.course_code,
            fixed: self.fixed,
        }
    }
}
