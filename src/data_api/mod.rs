pub mod dto;
pub mod filter;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DataApiConfig;
use crate::error::AppError;
use crate::models::{
    Course, Instructor, InstructorCourse, NewSchedule, Program, Schedule, Student, UserRecord,
};

use self::filter::{Filter, class_schedules_filter, upcoming_schedules_filter};

const USERS: &str = "Users";
const STUDENTS: &str = "Students";
const INSTRUCTORS: &str = "Instructors";
const COURSES: &str = "Courses";
const INSTRUCTOR_COURSES: &str = "Instructors_Courses";
const PROGRAMS: &str = "Program";
const SCHEDULES: &str = "Schedules";

#[async_trait]
pub trait DataApiClient: Send + Sync {
    async fn fetch_users(&self, filter: &Filter) -> Result<Vec<UserRecord>, AppError>;
    async fn get_student_details(&self, id: i64) -> Result<Student, AppError>;
    async fn get_instructor_details(&self, id: i64) -> Result<Instructor, AppError>;
    async fn get_instructor_courses(&self, instructor_id: i64) -> Result<Vec<InstructorCourse>, AppError>;
    async fn get_courses(&self) -> Result<Vec<Course>, AppError>;
    async fn get_programs(&self, course_codes: &[String]) -> Result<Vec<Program>, AppError>;
    async fn get_schedules(
        &self,
        course_codes: &[String],
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Schedule>, AppError>;
    async fn get_student_schedules(
        &self,
        class: &str,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Schedule>, AppError>;
    async fn create_schedule(&self, schedule: &NewSchedule) -> Result<Schedule, AppError>;
    async fn delete_schedule(&self, id: i64) -> Result<i64, AppError>;
}

pub struct DataApiHttpClient {
    client: Client,
    config: DataApiConfig,
}

impl DataApiHttpClient {
    pub fn new(config: DataApiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.config.base_url, resource)
    }

    fn url_by_id(&self, resource: &str, id: i64) -> String {
        format!("{}/{}/id/{}", self.config.base_url, resource, id)
    }

    /// GET with a bounded retry; reads are the only calls that are ever retried.
    async fn read<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        url: &str,
        filter: Option<&Filter>,
    ) -> Result<Vec<T>, AppError> {
        let request_id = Uuid::new_v4();
        let mut attempt = 0u32;

        loop {
            let mut request = self.client.get(url);
            if let Some(filter) = filter {
                request = request.query(&[("$filter", filter.render())]);
            }

            debug!(request_id = %request_id, resource, attempt, "GET {}", url);
            match read_envelope(resource, request).await {
                Ok(rows) => return Ok(rows),
                Err(e) if e.is_retryable() && attempt < self.config.read_retries => {
                    attempt += 1;
                    warn!(
                        request_id = %request_id,
                        resource,
                        attempt,
                        "read failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn read_first<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        id: i64,
    ) -> Result<T, AppError> {
        let url = self.url_by_id(resource, id);
        self.read::<T>(resource, &url, None)
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::NotFound)
    }

    async fn send_write(
        &self,
        method: Method,
        url: &str,
        action: &str,
        body: Option<&NewSchedule>,
    ) -> Result<String, AppError> {
        let request_id = Uuid::new_v4();
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        info!(request_id = %request_id, "{} {}", method, url);
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(request_id = %request_id, status = status.as_u16(), "failed to {}", action);
            return Err(AppError::Persistence(format!(
                "Failed to {}: {} {}",
                action, status, body
            )));
        }
        Ok(body)
    }
}

async fn read_envelope<T: DeserializeOwned>(
    resource: &'static str,
    request: RequestBuilder,
) -> Result<Vec<T>, AppError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Fetch {
            resource,
            status: Some(status.as_u16()),
            message: format!("{} {}", status, body),
        });
    }

    let body = response.text().await?;
    serde_json::from_str::<dto::ValueEnvelope<T>>(&body)
        .map(|envelope| envelope.value)
        .map_err(|e| AppError::Parse(format!("{} response: {}", resource, e)))
}

/// Drops rows the backend should already have excluded.
fn only_upcoming(mut schedules: Vec<Schedule>, cutoff: NaiveDateTime) -> Vec<Schedule> {
    let before = schedules.len();
    schedules.retain(|s| s.session_start > cutoff);
    if schedules.len() != before {
        warn!(
            "data api returned {} schedules at or before the cutoff",
            before - schedules.len()
        );
    }
    schedules
}

#[async_trait]
impl DataApiClient for DataApiHttpClient {
    async fn fetch_users(&self, filter: &Filter) -> Result<Vec<UserRecord>, AppError> {
        self.read(USERS, &self.url(USERS), Some(filter)).await
    }

    async fn get_student_details(&self, id: i64) -> Result<Student, AppError> {
        self.read_first(STUDENTS, id).await
    }

    async fn get_instructor_details(&self, id: i64) -> Result<Instructor, AppError> {
        self.read_first(INSTRUCTORS, id).await
    }

    async fn get_instructor_courses(&self, instructor_id: i64) -> Result<Vec<InstructorCourse>, AppError> {
        let filter = Filter::eq("instructor_id", instructor_id);
        self.read(INSTRUCTOR_COURSES, &self.url(INSTRUCTOR_COURSES), Some(&filter))
            .await
    }

    async fn get_courses(&self) -> Result<Vec<Course>, AppError> {
        self.read(COURSES, &self.url(COURSES), None).await
    }

    async fn get_programs(&self, course_codes: &[String]) -> Result<Vec<Program>, AppError> {
        let Some(filter) = Filter::any_of("course_code", course_codes.iter().cloned()) else {
            debug!("no course codes, skipping program lookup");
            return Ok(Vec::new());
        };
        self.read(PROGRAMS, &self.url(PROGRAMS), Some(&filter)).await
    }

    async fn get_schedules(
        &self,
        course_codes: &[String],
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Schedule>, AppError> {
        let Some(filter) = upcoming_schedules_filter(course_codes, cutoff, self.config.precedence)
        else {
            debug!("no course codes, skipping schedule lookup");
            return Ok(Vec::new());
        };
        let schedules = self.read(SCHEDULES, &self.url(SCHEDULES), Some(&filter)).await?;
        Ok(only_upcoming(schedules, cutoff))
    }

    async fn get_student_schedules(
        &self,
        class: &str,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Schedule>, AppError> {
        let filter = class_schedules_filter(class, cutoff);
        let schedules = self.read(SCHEDULES, &self.url(SCHEDULES), Some(&filter)).await?;
        Ok(only_upcoming(schedules, cutoff))
    }

    async fn create_schedule(&self, schedule: &NewSchedule) -> Result<Schedule, AppError> {
        let body = self
            .send_write(Method::POST, &self.url(SCHEDULES), "create schedule", Some(schedule))
            .await?;

        serde_json::from_str::<dto::CreatedRow<Schedule>>(&body)
            .map_err(|e| AppError::Parse(format!("created schedule: {}", e)))?
            .into_row()
            .ok_or_else(|| AppError::Parse("created schedule: empty response".to_string()))
    }

    async fn delete_schedule(&self, id: i64) -> Result<i64, AppError> {
        self.send_write(
            Method::DELETE,
            &self.url_by_id(SCHEDULES, id),
            "delete schedule",
            None,
        )
        .await?;
        Ok(id)
    }
}
