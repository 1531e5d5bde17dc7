use std::sync::Arc;

use rocket::{
    Request, State, catch, get,
    http::Status,
    post,
    response::{self, Responder, status::Custom},
    serde::json::Json,
};
use tracing::{debug, error, info, instrument};

use sweeper_common::{
    models::{GameParams, ScoreRecord},
    protocol::{ActionRequest, ErrorResponse, StateResponse},
};

use crate::{
    error::GameError,
    rate_limit::{ClientIp, RateLimiter},
    registry::SessionRegistry,
};

/// A failed request: HTTP status plus a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub detail: String,
}

impl From<GameError> for ApiError {
    fn from(error: GameError) -> Self {
        let status = match &error {
            GameError::NotFound => Status::NotFound,
            GameError::InvalidCoordinates { .. }
            | GameError::InvalidAction(_)
            | GameError::InvalidBoard { .. }
            | GameError::InvalidBoardParameter { .. } => Status::BadRequest,
            GameError::GameOver => Status::Conflict,
            GameError::ScorePersistence(e) => {
                error!("Score store failure: {}", e);
                Status::InternalServerError
            }
        };

        Self {
            status,
            detail: error.to_string(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        Custom(self.status, Json(ErrorResponse { detail: self.detail })).respond_to(request)
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// A missing size falls back to its default. A present one has to parse.
fn board_param(name: &'static str, raw: Option<&str>, default: usize) -> Result<usize, GameError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| GameError::InvalidBoardParameter {
                name,
                value: value.to_string(),
            }),
    }
}

#[get("/start?<username>&<width>&<height>&<mines>")]
#[instrument(level = "trace", skip(registry, rate_limiter, client_ip), fields(client_ip = %client_ip.0))]
pub fn start_game(
    username: &str,
    width: Option<&str>,
    height: Option<&str>,
    mines: Option<&str>,
    registry: &State<Arc<SessionRegistry>>,
    rate_limiter: &State<RateLimiter>,
    client_ip: ClientIp,
) -> ApiResult<StateResponse> {
    let defaults = GameParams::default();
    let params = GameParams {
        width: board_param("width", width, defaults.width)?,
        height: board_param("height", height, defaults.height)?,
        mines: board_param("mines", mines, defaults.mines)?,
    };

    info!(
        "Game start request from {} for {}: {}x{} with {} mines",
        client_ip.0, username, params.width, params.height, params.mines
    );

    if !rate_limiter.check(client_ip.0) {
        return Err(ApiError {
            status: Status::TooManyRequests,
            detail: "Too many games started, try again later".to_string(),
        });
    }

    let state = registry.start(username, params)?;
    Ok(Json(state))
}

#[get("/board?<game_id>")]
#[instrument(level = "trace", skip(registry))]
pub async fn get_board(game_id: &str, registry: &State<Arc<SessionRegistry>>) -> ApiResult<StateResponse> {
    Ok(Json(registry.state(game_id).await?))
}

#[post("/action?<game_id>", data = "<request>")]
#[instrument(level = "trace", skip(registry, request), fields(x = request.x, y = request.y, action = %request.action))]
pub async fn action(
    game_id: &str,
    request: Json<ActionRequest>,
    registry: &State<Arc<SessionRegistry>>,
) -> ApiResult<StateResponse> {
    debug!(
        "Player {:?} at ({}, {}) in game {}",
        request.action, request.x, request.y, game_id
    );

    let state = registry
        .apply_action(game_id, request.x, request.y, &request.action)
        .await?;
    Ok(Json(state))
}

#[get("/scores?<username>")]
#[instrument(level = "trace", skip(registry))]
pub async fn scores(
    username: Option<&str>,
    registry: &State<Arc<SessionRegistry>>,
) -> ApiResult<Vec<ScoreRecord>> {
    let username = username.filter(|name| !name.is_empty());
    Ok(Json(registry.scores(username).await?))
}

#[catch(default)]
pub fn default_catcher(status: Status, _request: &Request) -> Custom<Json<ErrorResponse>> {
    Custom(
        status,
        Json(ErrorResponse {
            detail: status.reason_lossy().to_string(),
        }),
    )
}
