pub mod create_talk_request;
pub mod create_talk_response;
pub mod talk_status_response;
