pub mod attendance_service;
pub mod enrollment_service;
