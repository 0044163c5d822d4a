pub mod client;
pub mod job;
pub mod sanitizer;
pub mod structs;
