pub mod file_sink;
pub mod stdout_sink;
