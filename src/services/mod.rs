pub mod cascade;
pub mod enrollment;
pub mod profile;

pub use cascade::{CascadeStats, CourseCascade};
pub use enrollment::EnrollmentService;
pub use profile::ProfileService;
