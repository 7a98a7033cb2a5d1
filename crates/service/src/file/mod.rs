pub mod string_data;
pub mod uploads;
