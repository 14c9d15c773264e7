use super::client::HttpClient;
use async_trait::async_trait;

const USER_AGENT: &str = concat!("covid_curves/", env!("CARGO_PKG_VERSION"));

/// Plain `reqwest` client with a crate user agent.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
