#![forbid(unsafe_code)]

use poem_openapi::{ OpenApi, payload::PlainText };

// The response body served on the root path.
pub const GREETING: &str = "🎉 Hello from Azure DevOps CI/CD Pipeline!";

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct GreetingApi;

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl GreetingApi {
    #[oai(path = "/", method = "get")]
    async fn get_greeting(&self) -> PlainText<String> {
        PlainText(GREETING.to_string())
    }
}
