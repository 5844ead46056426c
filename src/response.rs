use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: String) -> Self {
        ErrorBody { error: message }
    }
}

#[derive(Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// Body of `/actions.json`.
#[derive(Serialize)]
pub struct ActionsJson {
    pub rules: Vec<ActionRule>,
}

#[derive(Serialize)]
pub struct ActionRule {
    #[serde(rename = "pathPattern")]
    pub path_pattern: String,
    #[serde(rename = "apiPath")]
    pub api_path: String,
}

impl ActionsJson {
    pub fn standard() -> Self {
        ActionsJson {
            rules: vec![
                ActionRule {
                    path_pattern: "/*".to_string(),
                    api_path: "/api/actions/*".to_string(),
                },
                ActionRule {
                    path_pattern: "/api/actions/**".to_string(),
                    api_path: "/api/actions/**".to_string(),
                },
            ],
        }
    }
}

#[derive(Serialize)]
pub struct ActionGetResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub icon: String,
    pub description: String,
    pub label: String,
    pub links: ActionLinks,
}

#[derive(Serialize)]
pub struct ActionLinks {
    pub actions: Vec<LinkedAction>,
}

#[derive(Serialize)]
pub struct LinkedAction {
    pub label: String,
    pub href: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ActionParameter>,
}

#[derive(Serialize)]
pub struct ActionParameter {
    pub name: String,
    pub label: String,
    pub required: bool,
}

#[derive(Serialize)]
pub struct ActionPostResponse {
    pub transaction: String,
    pub message: String,
}
