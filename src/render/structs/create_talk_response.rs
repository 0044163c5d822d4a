use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateTalkResponse {
    pub id: Option<String>,
}
