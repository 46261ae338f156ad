use serde::Serialize;

pub(crate) mod board_controller;
pub(crate) mod health_check_controller;
pub(crate) mod task_controller;

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: u16, data: T) -> Self {
        Self {
            status_code,
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_serialize_api_response_with_some() {
        let response = ApiResponse::new(StatusCode::OK.into(), 23);
        let serialized = serde_json::to_string(&response).unwrap();

        // Compare as values, key order in the serialized string is not guaranteed
        let deserialized_value: serde_json::Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized_value, json!({"data": 23, "status_code": 200}));
    }

    #[tokio::test]
    async fn test_serialize_api_response_with_none() {
        let response = ApiResponse::<()> {
            status_code: StatusCode::NO_CONTENT.into(),
            data: None,
        };
        let serialized = serde_json::to_string(&response).unwrap();
        assert_eq!(serialized, json!({"status_code": 204}).to_string());
    }
}
