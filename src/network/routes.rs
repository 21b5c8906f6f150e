//! Route table and handlers

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::{PokedexError, Result};
use crate::pagination::Pagination;
use crate::pokemon::{CreatePokemon, Pokemon, UpdatePokemon};
use crate::store::ObjectId;

use super::AppState;

/// Global route prefix
pub const API_PREFIX: &str = "/api/v2";

/// Build the application router
///
/// | route                     | operation |
/// |---------------------------|-----------|
/// | `POST   /pokemon`         | create    |
/// | `GET    /pokemon`         | list      |
/// | `GET    /pokemon/:term`   | find one  |
/// | `PATCH  /pokemon/:term`   | update    |
/// | `DELETE /pokemon/:id`     | remove    |
/// | `GET    /seed`            | seed      |
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/pokemon", post(create_pokemon).get(list_pokemon))
        .route(
            "/pokemon/:term",
            get(find_pokemon).patch(update_pokemon).delete(remove_pokemon),
        )
        .route("/seed", get(run_seed));

    Router::new().nest(API_PREFIX, api).with_state(state)
}

async fn create_pokemon(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreatePokemon>, JsonRejection>,
) -> Result<(StatusCode, Json<Pokemon>)> {
    let Json(input) = payload.map_err(|e| PokedexError::BadRequest(e.body_text()))?;
    input.validate()?;

    let pokemon = state.pokemon.create(input).await?;
    tracing::debug!("Created pokemon #{} {}", pokemon.no, pokemon.name);
    Ok((StatusCode::CREATED, Json(pokemon)))
}

async fn list_pokemon(
    State(state): State<AppState>,
    query: std::result::Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Pokemon>>> {
    let Query(pagination) = query.map_err(|e| PokedexError::BadRequest(e.body_text()))?;
    pagination.validate()?;

    Ok(Json(state.pokemon.find_all(&pagination).await?))
}

async fn find_pokemon(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<Pokemon>> {
    Ok(Json(state.pokemon.find_one(&term).await?))
}

async fn update_pokemon(
    State(state): State<AppState>,
    Path(term): Path<String>,
    payload: std::result::Result<Json<UpdatePokemon>, JsonRejection>,
) -> Result<Json<Pokemon>> {
    let Json(patch) = payload.map_err(|e| PokedexError::BadRequest(e.body_text()))?;
    patch.validate()?;

    Ok(Json(state.pokemon.update(&term, patch).await?))
}

async fn remove_pokemon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !ObjectId::is_valid(&id) {
        return Err(PokedexError::BadRequest(format!(
            "{} is not a valid MongoID",
            id
        )));
    }

    state.pokemon.remove(&id).await?;
    Ok(StatusCode::OK)
}

async fn run_seed(State(state): State<AppState>) -> Result<&'static str> {
    state.seed.execute().await
}
