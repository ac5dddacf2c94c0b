pub mod auth;
pub mod dashboard;
pub mod notice;
pub mod schedule_board;

pub use dashboard::{DashboardError, DashboardStage, InstructorDashboard, ScheduleRow, StudentDashboard};
pub use notice::{Notice, NoticeLevel};
pub use schedule_board::{FormPhase, ScheduleBoard, ScheduleForm};
