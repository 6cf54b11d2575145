use crate::http::{RequestLane, TransportError};
use crate::push::{PushChannel, Subscription};
use prattle_core::operation::Operation;
use prattle_core::response::OperationResponse;
use prattle_core::routing::Lane;

/// What came back from dispatching one operation: either the buffered
/// response of the request lane, or a live registration on the push lane.
pub enum Routed {
    Response(OperationResponse),
    Subscription(Subscription),
}

/// The runtime half of the transport router: forwards each operation down the
/// lane [`Lane::for_operation`] picked for it, and nothing else. Errors pass
/// through unchanged; an operation is never sent on both lanes.
pub struct Dispatcher {
    request: RequestLane,
    push: PushChannel,
}

impl Dispatcher {
    pub fn new(request: RequestLane, push: PushChannel) -> Self {
        Self { request, push }
    }

    pub async fn dispatch(&self, operation: &Operation) -> Result<Routed, TransportError> {
        match Lane::for_operation(operation) {
            Lane::Request => Ok(Routed::Response(self.request.execute(operation).await?)),
            Lane::Push => Ok(Routed::Subscription(self.push.subscribe(operation))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockHttpClient;
    use prattle_core::session::SessionContext;
    use std::sync::Arc;

    fn dispatcher(http: Arc<MockHttpClient>) -> Dispatcher {
        let session = Arc::new(SessionContext::new());
        let endpoint = "http://test/graphql".to_string();
        Dispatcher::new(
            RequestLane::new(http.clone(), session.clone(), endpoint.clone()),
            PushChannel::new(http, session, endpoint),
        )
    }

    #[tokio::test]
    async fn writes_travel_the_request_lane() {
        let http = MockHttpClient::new();
        http.queue_json(200, r#"{"data": {}}"#);
        let routed = dispatcher(http.clone())
            .dispatch(&Operation::write("sendMessage"))
            .await
            .unwrap();
        assert!(matches!(routed, Routed::Response(_)));
        assert_eq!(http.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscribes_travel_the_push_lane() {
        let http = MockHttpClient::new();
        http.queue_stream(b"event: complete\ndata:\n\n".to_vec());
        let routed = dispatcher(http.clone())
            .dispatch(&Operation::subscribe("messageAdded"))
            .await
            .unwrap();
        let Routed::Subscription(mut sub) = routed else {
            panic!("subscribe must route to the push lane");
        };
        sub.unsubscribe();
    }
}
