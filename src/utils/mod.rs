pub mod employee_number_cache;
pub mod employee_number_filter;
