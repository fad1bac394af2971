use crate::client::{HttpClient, RequestOptions};
use crate::error::ApiError;
use crate::movies::with_id;
use cinelist_models::Profile;
use std::sync::Arc;

pub const GET_PROFILE: &str = "/account/{account_id}";

#[derive(Clone)]
pub struct ProfileService {
    client: Arc<HttpClient>,
}

impl ProfileService {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    pub async fn profile(&self, account_id: &str) -> Result<Profile, ApiError> {
        let route = with_id(GET_PROFILE, "{account_id}", account_id);
        Ok(self.client.get::<Profile>(&route, &RequestOptions::new()).await?.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_profile_lookup() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/account/21000").header("authorization", "Bearer token");
                then.status(200).header("content-type", "application/json").json_body(json!({
                    "id": 21000,
                    "name": "Jane",
                    "username": "jane_doe",
                    "include_adult": false,
                    "iso_639_1": "en",
                    "iso_3166_1": "US",
                    "avatar": {"gravatar": {"hash": "abc"}}
                }));
            })
            .await;

        let client = HttpClient::new(ClientConfig::new(server.base_url()).with_access_token("token")).unwrap();
        let service = ProfileService::new(Arc::new(client));
        let profile = service.profile("21000").await.unwrap();

        mock.assert_async().await;
        assert_eq!(profile.id, 21000);
        assert_eq!(profile.username, "jane_doe");
        assert_eq!(profile.iso_3166_1, "US");
    }
}
