use crate::gui_bridge::model::{ErrorReply, EventRequest, SessionReply, SignalsRequest, ViewQuery};
use crate::workflow::runner::Runner;
use anyhow::Context;
use dashcore::CoreError;
use log::{info, warn};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use warp::{http::StatusCode, Filter, Rejection, Reply};

#[derive(Debug)]
struct BridgeError {
    status: StatusCode,
    message: String,
}

impl warp::reject::Reject for BridgeError {}

fn reject(err: anyhow::Error) -> Rejection {
    let status = match err.downcast_ref::<CoreError>() {
        Some(CoreError::UnknownSession(_)) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("bridge request failed: {err:#}");
    warp::reject::custom(BridgeError {
        status,
        message: format!("{err:#}"),
    })
}

/// HTTP surface in front of the dashboard state thread.
pub struct GuiBridge {
    runner: Runner,
}

impl GuiBridge {
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let session_route = warp::path("session")
            .and(warp::path::end())
            .and(warp::post())
            .and(runner_filter.clone())
            .and_then(|runner: Runner| async move {
                runner
                    .open_session()
                    .await
                    .map(|session| warp::reply::json(&SessionReply { session }))
                    .map_err(reject)
            });

        let signals_route = warp::path("signals")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(runner_filter.clone())
            .and_then(|request: SignalsRequest, runner: Runner| async move {
                runner
                    .apply_signals(request.session, request.signals)
                    .await
                    .map(|view| warp::reply::json(&view))
                    .map_err(reject)
            });

        let event_route = warp::path("event")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(runner_filter.clone())
            .and_then(|request: EventRequest, runner: Runner| async move {
                runner
                    .apply_event(request.session, request.event)
                    .await
                    .map(|view| warp::reply::json(&view))
                    .map_err(reject)
            });

        let view_route = warp::path("view")
            .and(warp::path::end())
            .and(warp::get())
            .and(warp::query::<ViewQuery>())
            .and(runner_filter.clone())
            .and_then(|query: ViewQuery, runner: Runner| async move {
                runner
                    .view(query.session)
                    .await
                    .map(|view| warp::reply::json(&view))
                    .map_err(reject)
            });

        let stats_route = warp::path("stats")
            .and(warp::path::end())
            .and(warp::get())
            .and(runner_filter)
            .and_then(|runner: Runner| async move {
                runner
                    .stats()
                    .await
                    .map(|stats| warp::reply::json(&stats))
                    .map_err(reject)
            });

        session_route
            .or(signals_route)
            .or(event_route)
            .or(view_route)
            .or(stats_route)
            .recover(handle_rejection)
    }

    /// Serves the routes on `addr` until `shutdown` resolves.
    pub async fn serve<S>(self, addr: SocketAddr, shutdown: S) -> anyhow::Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let routes = self.routes().with(warp::log("dashboard::bridge"));
        let (bound, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .with_context(|| format!("binding HTTP bridge to {addr}"))?;
        info!("HTTP bridge listening on http://{bound}");
        server.await;
        info!("HTTP bridge stopped");
        Ok(())
    }
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(bridge) = err.find::<BridgeError>() {
        (bridge.status, bridge.message.clone())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "no such route".to_string())
    } else if let Some(body) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, body.to_string())
    } else if let Some(query) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, query.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unhandled rejection: {err:?}"),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorReply { error: message }),
        status,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::synthetic::SyntheticDetector;
    use dashcore::auth::{CredentialStore, SessionId};
    use dashcore::processing::BatchProcessor;
    use dashcore::{Dashboard, ViewState};
    use image::RgbImage;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn bridge_over(store_dir: &Path, image_dir: &Path) -> GuiBridge {
        let store = CredentialStore::load(store_dir.join("users.json"))
            .unwrap()
            .with_hash_rounds(16);
        let processor = BatchProcessor::new(image_dir, Box::new(SyntheticDetector::new(11)));
        let (runner, _state_thread) = Runner::spawn(Dashboard::new(store, processor)).unwrap();
        GuiBridge::new(runner)
    }

    async fn open_session<F>(routes: &F) -> SessionId
    where
        F: Filter + 'static,
        F::Extract: Reply + Send,
    {
        let response = warp::test::request()
            .method("POST")
            .path("/session")
            .reply(routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let reply: SessionReply = serde_json::from_slice(response.body()).unwrap();
        reply.session
    }

    #[tokio::test]
    async fn bridge_runs_register_login_and_process() {
        let dir = TempDir::new().unwrap();
        let images = TempDir::new().unwrap();
        for name in ["a.png", "b.png"] {
            RgbImage::new(8, 8).save(images.path().join(name)).unwrap();
        }
        let routes = bridge_over(dir.path(), images.path()).routes();
        let session = open_session(&routes).await;

        let response = warp::test::request()
            .method("POST")
            .path("/event")
            .json(&json!({
                "session": session,
                "event": {"kind": "register_attempted", "username": "alice", "password": "pw1"}
            }))
            .reply(&routes)
            .await;
        let view: ViewState = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(view.access_message, "registration successful, you may now log in");

        let response = warp::test::request()
            .method("POST")
            .path("/signals")
            .json(&json!({
                "session": session,
                "login_clicks": 1,
                "username": "alice",
                "password": "pw1"
            }))
            .reply(&routes)
            .await;
        let view: ViewState = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(view.access_message, "access granted");
        assert!(view.dashboard_visible);

        let response = warp::test::request()
            .method("POST")
            .path("/signals")
            .json(&json!({
                "session": session,
                "process_clicks": 1,
                "login_clicks": 1,
                "username": "alice",
                "password": "pw1"
            }))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let view: ViewState = serde_json::from_slice(response.body()).unwrap();
        assert!(view.processing_message.starts_with("Processed objects: "));
        assert!(view.dashboard_visible);
        assert!(!view.auth_panel_visible);

        let response = warp::test::request()
            .method("GET")
            .path("/stats")
            .reply(&routes)
            .await;
        let stats: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(stats["batches"], 1);
        assert_eq!(stats["images_decoded"], 2);
        assert_eq!(stats["logins_granted"], 1);
    }

    #[tokio::test]
    async fn view_reflects_session_state() {
        let dir = TempDir::new().unwrap();
        let routes = bridge_over(dir.path(), dir.path()).routes();
        let session = open_session(&routes).await;

        let response = warp::test::request()
            .method("GET")
            .path(&format!("/view?session={session}"))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let view: ViewState = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(view, ViewState::idle());
    }

    #[tokio::test]
    async fn unknown_session_is_unauthorized() {
        let dir = TempDir::new().unwrap();
        let routes = bridge_over(dir.path(), dir.path()).routes();

        let response = warp::test::request()
            .method("POST")
            .path("/event")
            .json(&json!({"session": SessionId::new(), "event": {"kind": "process_requested"}}))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let reply: ErrorReply = serde_json::from_slice(response.body()).unwrap();
        assert!(reply.error.contains("unknown session"));
    }

    #[tokio::test]
    async fn malformed_requests_are_client_errors() {
        let dir = TempDir::new().unwrap();
        let routes = bridge_over(dir.path(), dir.path()).routes();

        let response = warp::test::request()
            .method("POST")
            .path("/signals")
            .json(&json!({"process_clicks": 1}))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = warp::test::request()
            .method("GET")
            .path("/nowhere")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
