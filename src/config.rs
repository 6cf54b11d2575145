use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// The single logical endpoint serving both the request/response lane and
    /// the push lane.
    pub endpoint: String,
    /// How long the session monitor waits between the invalidation notice and
    /// the actual sign-out. Long enough for the notice to be read.
    pub sign_out_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/graphql".to_string(),
            sign_out_delay: Duration::from_secs(2),
        }
    }
}
