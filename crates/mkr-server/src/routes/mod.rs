//! API routes.

pub mod catalog;
pub mod health;
pub mod schedule;

pub use catalog::{
    list_chairs_handler, list_courses_handler, list_faculties_handler,
    list_faculty_groups_handler, list_groups_handler, list_structures_handler,
    list_teachers_handler,
};
pub use health::health_routes;
pub use schedule::{ScheduleWindow, group_schedule_handler, teacher_schedule_handler};
