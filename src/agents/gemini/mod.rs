pub mod gemini;
pub mod structs;
