pub mod synthesize_request;
pub mod synthesize_response;
