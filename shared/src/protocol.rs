use crate::{AnalysisSubmission, LoginRequest, LoginResponse, SensorReading};
use serde::{Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }

    /// GET 请求不携带请求体
    pub fn has_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The URL path (or suffix).
    const PATH: &'static str;
    /// The HTTP method.
    const METHOD: HttpMethod;

    /// Decode the response body. Endpoints without a meaningful body override this.
    fn decode_response(body: &str) -> serde_json::Result<Self::Response> {
        serde_json::from_str(body)
    }
}

// =========================================================
// Request Definitions
// =========================================================

/// Exchange an identity for a bearer token
impl ApiRequest for LoginRequest {
    type Response = LoginResponse;
    const PATH: &'static str = "/login";
    const METHOD: HttpMethod = HttpMethod::Post;
}

/// Fetch the current sensor reading
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FetchPointsRequest;

impl ApiRequest for FetchPointsRequest {
    type Response = SensorReading;
    const PATH: &'static str = "/points";
    const METHOD: HttpMethod = HttpMethod::Get;
}

/// Submit an analysis. The backend reply carries nothing we use.
impl ApiRequest for AnalysisSubmission {
    type Response = ();
    const PATH: &'static str = "/results";
    const METHOD: HttpMethod = HttpMethod::Post;

    fn decode_response(_body: &str) -> serde_json::Result<Self::Response> {
        Ok(())
    }
}
