use serde::Serialize;

use crate::error::NetworkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Description of a single API call: path relative to the base URL, method,
/// query parameters, optional JSON body, and an optional per-request bearer
/// token overriding the client-held one.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub auth_token: Option<String>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            query: Vec::new(),
            body: None,
            auth_token: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path, HttpMethod::Get)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path, HttpMethod::Post)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body. Serialization happens here so an encoding failure
    /// surfaces before anything is sent.
    pub fn json_body<T: Serialize>(mut self, body: &T) -> Result<Self, NetworkError> {
        let value = serde_json::to_value(body)
            .map_err(|e| NetworkError::InvalidRequest(format!("Failed to encode body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_set_method_and_path() {
        let endpoint = Endpoint::get("/menu/categories");
        assert_eq!(endpoint.method, HttpMethod::Get);
        assert_eq!(endpoint.path, "/menu/categories");
        assert!(endpoint.body.is_none());

        let endpoint = Endpoint::post("/auth/login");
        assert_eq!(endpoint.method, HttpMethod::Post);
    }

    #[test]
    fn test_query_accumulates_pairs() {
        let endpoint = Endpoint::get("/menu/items")
            .query("categoryId", "1")
            .query("limit", "20");
        assert_eq!(
            endpoint.query,
            vec![
                ("categoryId".to_string(), "1".to_string()),
                ("limit".to_string(), "20".to_string())
            ]
        );
    }

    #[test]
    fn test_json_body_serializes_camel_case() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body {
            phone_number: String,
        }

        let endpoint = Endpoint::post("/auth/login")
            .json_body(&Body {
                phone_number: "5551234567".to_string(),
            })
            .unwrap();
        assert_eq!(
            endpoint.body,
            Some(serde_json::json!({ "phoneNumber": "5551234567" }))
        );
    }

    #[test]
    fn test_bearer_sets_token() {
        let endpoint = Endpoint::get("/menu/categories").bearer("token-123");
        assert_eq!(endpoint.auth_token.as_deref(), Some("token-123"));
    }
}
