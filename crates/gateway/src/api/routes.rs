/// Route handlers for the REST surface
use super::types::*;
use crate::auth::AuthToken;
use crate::broadcast::EventBroadcaster;
use crate::devices::TrustedDeviceStore;
use crate::error::GatewayError;
use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use tunebridge_core::{PlayerDriver, SearchKind, Snapshot};

/// How long the skip verbs wait for the player to settle on the new
/// track before reading it back.
const TRACK_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Header carrying a trusted device fingerprint on the allowlisted routes.
const DEVICE_FINGERPRINT_HEADER: &str = "x-device-fingerprint";

/// Shared application state, constructed once at startup
#[derive(Clone)]
pub struct AppState {
    pub driver: Arc<dyn PlayerDriver>,
    pub broadcaster: EventBroadcaster,
    /// Most recent snapshot retained by the monitor, for realtime joiners
    pub latest: Arc<RwLock<Option<Snapshot>>>,
    pub token: AuthToken,
    pub devices: Arc<TrustedDeviceStore>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/play", post(play))
        .route("/pause", post(pause))
        .route("/next", post(next_track))
        .route("/previous", post(previous_track))
        .route("/volume", post(set_volume))
        .route("/seek", post(seek))
        .route("/playlists", get(get_playlists))
        .route("/playlist/:name/play", post(play_playlist))
        .route("/artwork", get(get_artwork))
        .route("/search", get(search))
        .route("/play-track/:id", post(play_track))
        .route("/repeat", get(get_repeat).post(set_repeat))
        .route("/shuffle", get(get_shuffle).post(set_shuffle))
        .route("/device/register", post(register_device))
        .route("/device/list", get(list_devices))
        .route("/device/remove/:fingerprint", delete(remove_device))
        .layer(middleware::from_fn_with_state(state.clone(), require_token));

    // Narrow read-only allowlist where a registered device fingerprint
    // substitutes for the bearer token.
    let trusted = Router::new()
        .route("/status", get(get_status))
        .route("/current-track", get(get_current_track))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_token_or_trusted,
        ));

    Router::new()
        .route("/ping", get(ping))
        .route("/device/check", post(check_device))
        .route("/ws", get(super::ws::ws_handler))
        .merge(protected)
        .merge(trusted)
        .with_state(state)
}

/// Check the `Authorization: Bearer <token>` header against the process token.
fn authorize_bearer(headers: &HeaderMap, token: &AuthToken) -> Result<(), GatewayError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| GatewayError::Unauthorized("No authorization header provided".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| GatewayError::Unauthorized("Invalid authorization header format".to_string()))?;

    let candidate = value.strip_prefix("Bearer ").ok_or_else(|| {
        GatewayError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    if !token.matches(candidate) {
        return Err(GatewayError::Unauthorized(
            "Invalid authentication token".to_string(),
        ));
    }

    Ok(())
}

async fn require_token(
    State(app): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    authorize_bearer(request.headers(), &app.token)?;
    Ok(next.run(request).await)
}

async fn require_token_or_trusted(
    State(app): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if authorize_bearer(request.headers(), &app.token).is_ok() {
        return Ok(next.run(request).await);
    }

    if let Some(fingerprint) = request
        .headers()
        .get(DEVICE_FINGERPRINT_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        if app.devices.is_trusted(fingerprint).await {
            debug!("trusted device bypassed token auth");
            return Ok(next.run(request).await);
        }
    }

    Err(GatewayError::Unauthorized(
        "Invalid authentication token".to_string(),
    ))
}

/// GET /ping - health check, no auth
async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok".to_string(),
        service: "TuneBridge".to_string(),
    })
}

/// GET /status - playback state and volume
async fn get_status(State(app): State<AppState>) -> Result<Json<StatusResponse>, GatewayError> {
    let state = app.driver.playback_state().await?;
    let volume = app.driver.volume().await?;
    Ok(Json(StatusResponse { state, volume }))
}

/// GET /current-track
async fn get_current_track(
    State(app): State<AppState>,
) -> Result<Json<CurrentTrackResponse>, GatewayError> {
    let track = app.driver.current_track().await?;
    let state = app.driver.playback_state().await?;
    Ok(Json(CurrentTrackResponse::from_parts(track, state)))
}

/// POST /play
async fn play(State(app): State<AppState>) -> Result<Json<ActionResponse>, GatewayError> {
    app.driver.play().await?;
    Ok(Json(ActionResponse {
        action: "play".to_string(),
        success: true,
        message: "Playback started".to_string(),
    }))
}

/// POST /pause
async fn pause(State(app): State<AppState>) -> Result<Json<ActionResponse>, GatewayError> {
    app.driver.pause().await?;
    Ok(Json(ActionResponse {
        action: "pause".to_string(),
        success: true,
        message: "Playback paused".to_string(),
    }))
}

/// POST /next - skip forward and report the settled track
async fn next_track(
    State(app): State<AppState>,
) -> Result<Json<TrackActionResponse>, GatewayError> {
    app.driver.next_track().await?;
    tokio::time::sleep(TRACK_SETTLE_DELAY).await;
    let track = app.driver.current_track().await?;
    let state = app.driver.playback_state().await?;
    Ok(Json(TrackActionResponse {
        action: "next".to_string(),
        success: true,
        track: CurrentTrackResponse::from_parts(track, state),
    }))
}

/// POST /previous - skip back and report the settled track
async fn previous_track(
    State(app): State<AppState>,
) -> Result<Json<TrackActionResponse>, GatewayError> {
    app.driver.previous_track().await?;
    tokio::time::sleep(TRACK_SETTLE_DELAY).await;
    let track = app.driver.current_track().await?;
    let state = app.driver.playback_state().await?;
    Ok(Json(TrackActionResponse {
        action: "previous".to_string(),
        success: true,
        track: CurrentTrackResponse::from_parts(track, state),
    }))
}

/// POST /volume - set volume, clamped to 0-100 before it reaches the driver
async fn set_volume(
    State(app): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<VolumeResponse>, GatewayError> {
    let level = body
        .as_ref()
        .and_then(|Json(data)| data.get("level"))
        .ok_or_else(|| GatewayError::Validation("Volume level not provided".to_string()))?
        .as_i64()
        .ok_or_else(|| GatewayError::Validation("Invalid volume level".to_string()))?;

    let level = level.clamp(0, 100) as u8;
    app.driver.set_volume(level).await?;
    Ok(Json(VolumeResponse {
        action: "set_volume".to_string(),
        success: true,
        level,
    }))
}

/// POST /seek
async fn seek(
    State(app): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<SeekResponse>, GatewayError> {
    let position = body
        .as_ref()
        .and_then(|Json(data)| data.get("position"))
        .ok_or_else(|| GatewayError::Validation("Position not provided".to_string()))?
        .as_f64()
        .ok_or_else(|| GatewayError::Validation("Invalid position".to_string()))?;

    app.driver.seek(position).await?;
    Ok(Json(SeekResponse {
        action: "seek".to_string(),
        success: true,
        position,
    }))
}

/// GET /playlists
async fn get_playlists(
    State(app): State<AppState>,
) -> Result<Json<PlaylistsResponse>, GatewayError> {
    let playlists = app.driver.playlists().await?;
    let count = playlists.len();
    Ok(Json(PlaylistsResponse { playlists, count }))
}

/// POST /playlist/{name}/play
async fn play_playlist(
    State(app): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PlaylistActionResponse>, GatewayError> {
    info!("playing playlist {name}");
    app.driver.play_playlist(&name).await?;
    Ok(Json(PlaylistActionResponse {
        action: "play_playlist".to_string(),
        playlist: name,
        success: true,
    }))
}

/// GET /artwork - current track artwork as a JPEG, or 404
async fn get_artwork(State(app): State<AppState>) -> Result<Response, GatewayError> {
    let Some(path) = app.driver.artwork().await? else {
        return Err(GatewayError::NotFound("No artwork available".to_string()));
    };

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read artwork {}: {e}", path.display()))?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}

/// GET /search?query=&type=
async fn search(
    State(app): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, GatewayError> {
    let query = params.query.unwrap_or_default();
    if query.is_empty() {
        return Err(GatewayError::Validation(
            "Query parameter required".to_string(),
        ));
    }

    let kind: SearchKind = params
        .kind
        .as_deref()
        .unwrap_or("track")
        .parse()
        .map_err(|_| GatewayError::Validation("Invalid search type".to_string()))?;

    let results = app.driver.search(&query, kind).await?;
    let count = results.len();
    Ok(Json(SearchResponse {
        query,
        kind: kind.as_str().to_string(),
        results,
        count,
    }))
}

/// POST /play-track/{id} - play a track by library database ID
async fn play_track(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TrackActionResponse>, GatewayError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(GatewayError::Validation("Invalid track id".to_string()));
    }

    app.driver.play_track_by_id(&id).await?;
    tokio::time::sleep(TRACK_SETTLE_DELAY).await;
    let track = app.driver.current_track().await?;
    let state = app.driver.playback_state().await?;
    Ok(Json(TrackActionResponse {
        action: "play_track".to_string(),
        success: true,
        track: CurrentTrackResponse::from_parts(track, state),
    }))
}

/// GET /repeat
async fn get_repeat(State(app): State<AppState>) -> Result<Json<RepeatResponse>, GatewayError> {
    let repeat = app.driver.repeat_mode().await?;
    Ok(Json(RepeatResponse { repeat }))
}

/// POST /repeat {mode: off|one|all}
async fn set_repeat(
    State(app): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<SetRepeatResponse>, GatewayError> {
    let mode = body
        .as_ref()
        .and_then(|Json(data)| data.get("mode"))
        .and_then(Value::as_str)
        .unwrap_or("off")
        .parse()
        .map_err(|_| GatewayError::Validation("Invalid mode. Use: off, one, or all".to_string()))?;

    app.driver.set_repeat_mode(mode).await?;
    Ok(Json(SetRepeatResponse {
        action: "set_repeat".to_string(),
        mode,
        success: true,
    }))
}

/// GET /shuffle
async fn get_shuffle(State(app): State<AppState>) -> Result<Json<ShuffleResponse>, GatewayError> {
    let shuffle = app.driver.shuffle().await?;
    Ok(Json(ShuffleResponse { shuffle }))
}

/// POST /shuffle {enabled: bool}
async fn set_shuffle(
    State(app): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<SetShuffleResponse>, GatewayError> {
    let enabled = body
        .as_ref()
        .and_then(|Json(data)| data.get("enabled"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    app.driver.set_shuffle(enabled).await?;
    Ok(Json(SetShuffleResponse {
        action: "set_shuffle".to_string(),
        enabled,
        success: true,
    }))
}

/// POST /device/register - mark a device fingerprint as trusted
async fn register_device(
    State(app): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<SuccessResponse>, GatewayError> {
    let body = body.map(|Json(data)| data).unwrap_or(Value::Null);

    let fingerprint = body
        .get("device_fingerprint")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::Validation("Device fingerprint required".to_string()))?;

    let name = body
        .get("device_name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown Device");

    app.devices.add(fingerprint, name).await?;
    info!("registered trusted device: {name}");

    Ok(Json(SuccessResponse {
        success: true,
        message: "Device registered as trusted".to_string(),
    }))
}

/// POST /device/check - trust probe, no auth required
async fn check_device(
    State(app): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<DeviceCheckResponse>, GatewayError> {
    let fingerprint = body
        .as_ref()
        .and_then(|Json(data)| data.get("device_fingerprint"))
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::Validation("Device fingerprint required".to_string()))?;

    let is_trusted = app.devices.is_trusted(fingerprint).await;
    Ok(Json(DeviceCheckResponse {
        is_trusted,
        requires_token: !is_trusted,
    }))
}

/// GET /device/list
async fn list_devices(
    State(app): State<AppState>,
) -> Result<Json<DeviceListResponse>, GatewayError> {
    let devices = app.devices.all().await;
    let count = devices.len();
    Ok(Json(DeviceListResponse { devices, count }))
}

/// DELETE /device/remove/{fingerprint}
async fn remove_device(
    State(app): State<AppState>,
    Path(fingerprint): Path<String>,
) -> Result<Json<SuccessResponse>, GatewayError> {
    if !app.devices.remove(&fingerprint).await? {
        return Err(GatewayError::NotFound("Device not found".to_string()));
    }
    Ok(Json(SuccessResponse {
        success: true,
        message: "Device removed".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Mutex as StdMutex;
    use tunebridge_core::{
        DriverResult, PlaybackState, RepeatMode, SearchResult, TrackInfo,
    };

    // Mock driver that records the mutations it receives.
    #[derive(Default)]
    struct MockDriver {
        volume_sets: StdMutex<Vec<u8>>,
        played_track_ids: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl PlayerDriver for MockDriver {
        async fn play(&self) -> DriverResult<()> {
            Ok(())
        }
        async fn pause(&self) -> DriverResult<()> {
            Ok(())
        }
        async fn next_track(&self) -> DriverResult<()> {
            Ok(())
        }
        async fn previous_track(&self) -> DriverResult<()> {
            Ok(())
        }
        async fn playback_state(&self) -> DriverResult<PlaybackState> {
            Ok(PlaybackState::Stopped)
        }
        async fn current_track(&self) -> DriverResult<Option<TrackInfo>> {
            Ok(None)
        }
        async fn volume(&self) -> DriverResult<u8> {
            Ok(50)
        }
        async fn set_volume(&self, level: u8) -> DriverResult<()> {
            self.volume_sets.lock().unwrap().push(level);
            Ok(())
        }
        async fn seek(&self, _position: f64) -> DriverResult<()> {
            Ok(())
        }
        async fn playlists(&self) -> DriverResult<Vec<String>> {
            Ok(vec!["Library".to_string()])
        }
        async fn play_playlist(&self, _name: &str) -> DriverResult<()> {
            Ok(())
        }
        async fn artwork(&self) -> DriverResult<Option<PathBuf>> {
            Ok(None)
        }
        async fn search(
            &self,
            _query: &str,
            _kind: SearchKind,
        ) -> DriverResult<Vec<SearchResult>> {
            Ok(Vec::new())
        }
        async fn play_track_by_id(&self, id: &str) -> DriverResult<()> {
            self.played_track_ids.lock().unwrap().push(id.to_string());
            Ok(())
        }
        async fn repeat_mode(&self) -> DriverResult<RepeatMode> {
            Ok(RepeatMode::Off)
        }
        async fn set_repeat_mode(&self, _mode: RepeatMode) -> DriverResult<()> {
            Ok(())
        }
        async fn shuffle(&self) -> DriverResult<bool> {
            Ok(false)
        }
        async fn set_shuffle(&self, _enabled: bool) -> DriverResult<()> {
            Ok(())
        }
    }

    fn test_state(dir: &tempfile::TempDir) -> (AppState, Arc<MockDriver>) {
        let driver = Arc::new(MockDriver::default());
        let state = AppState {
            driver: driver.clone(),
            broadcaster: EventBroadcaster::new(),
            latest: Arc::new(RwLock::new(None)),
            token: AuthToken::from_raw("secret-token"),
            devices: Arc::new(TrustedDeviceStore::open(dir.path())),
        };
        (state, driver)
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_authorize_bearer_accepts_the_token() {
        let token = AuthToken::from_raw("secret-token");
        assert!(authorize_bearer(&bearer("Bearer secret-token"), &token).is_ok());
    }

    #[test]
    fn test_authorize_bearer_rejections() {
        let token = AuthToken::from_raw("secret-token");

        let missing = authorize_bearer(&HeaderMap::new(), &token).unwrap_err();
        assert!(matches!(missing, GatewayError::Unauthorized(_)));

        let malformed = authorize_bearer(&bearer("Token secret-token"), &token).unwrap_err();
        assert!(matches!(malformed, GatewayError::Unauthorized(_)));

        let wrong = authorize_bearer(&bearer("Bearer other"), &token).unwrap_err();
        assert!(matches!(wrong, GatewayError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_volume_is_clamped_before_reaching_the_driver() {
        let dir = tempfile::tempdir().unwrap();
        let (state, driver) = test_state(&dir);

        let Json(response) = set_volume(State(state), Some(Json(json!({"level": 150}))))
            .await
            .unwrap();

        assert_eq!(response.level, 100);
        assert_eq!(*driver.volume_sets.lock().unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn test_volume_negative_is_clamped_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let (state, driver) = test_state(&dir);

        let Json(response) = set_volume(State(state), Some(Json(json!({"level": -3}))))
            .await
            .unwrap();

        assert_eq!(response.level, 0);
        assert_eq!(*driver.volume_sets.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_volume_requires_a_level() {
        let dir = tempfile::tempdir().unwrap();
        let (state, driver) = test_state(&dir);

        let err = set_volume(State(state), None).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(driver.volume_sets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_volume_rejects_non_numeric_level() {
        let dir = tempfile::tempdir().unwrap();
        let (state, driver) = test_state(&dir);

        let err = set_volume(State(state), Some(Json(json!({"level": "loud"}))))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(driver.volume_sets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_requires_a_query() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(&dir);

        let err = search(
            State(state),
            Query(SearchParams {
                query: None,
                kind: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_rejects_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(&dir);

        let err = search(
            State(state),
            Query(SearchParams {
                query: Some("floyd".to_string()),
                kind: Some("podcast".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_play_track_rejects_non_numeric_id() {
        let dir = tempfile::tempdir().unwrap();
        let (state, driver) = test_state(&dir);

        let err = play_track(State(state), Path("abc123; drop".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(driver.played_track_ids.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_device_register_check_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(&dir);

        register_device(
            State(state.clone()),
            Some(Json(json!({
                "device_fingerprint": "fp-9",
                "device_name": "Living Room"
            }))),
        )
        .await
        .unwrap();

        let Json(check) = check_device(
            State(state.clone()),
            Some(Json(json!({"device_fingerprint": "fp-9"}))),
        )
        .await
        .unwrap();
        assert!(check.is_trusted);
        assert!(!check.requires_token);

        remove_device(State(state.clone()), Path("fp-9".to_string()))
            .await
            .unwrap();

        let err = remove_device(State(state), Path("fp-9".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_register_requires_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(&dir);

        let err = register_device(State(state), Some(Json(json!({"device_name": "X"}))))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }
}
