use serde::Deserialize;

/// Query string shared by the GET and POST transfer endpoints.
#[derive(Deserialize, Debug, Default)]
pub struct TransferQuery {
    pub to: Option<String>,
    pub amount: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ActionPostRequest {
    pub account: Option<String>,
}
