pub mod attendance_checkin;
pub mod attendance_report;
pub mod enrollment_register;
