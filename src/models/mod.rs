pub mod course;
pub mod person;
pub mod schedule;
pub mod user;

pub use course::{Course, InstructorCourse, Program};
pub use person::{Instructor, Student};
pub use schedule::{NewSchedule, Schedule};
pub use user::{Role, User, UserRecord};
