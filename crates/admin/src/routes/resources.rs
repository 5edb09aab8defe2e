//! Generic resource route handlers.
//!
//! [`collection_router`] is instantiated once per entity and nested under
//! `/api/{name}`. List state and the last query are kept in the browser
//! session between requests so `more`, `retry` and mutations act on the
//! list the operator is looking at.

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde_json::{Map, Value};
use tower_sessions::Session;
use tracing::debug;

use chimax_core::entities::{
    Banner, CoinPlan, Commission, Gift, Hashtag, Host, HostApplication, ReferralTier,
    ReportReason, SubAdmin, Ticket, Transaction,
};
use chimax_core::{Access, Entity, EntityId};

use super::{Console, ConsoleResponse};
use crate::error::{AppError, resource_status};
use crate::middleware::RequireSession;
use crate::resource::{ListQuery, ListState, ResourceCollection, ResourceError};
use crate::session::SessionReader;
use crate::state::AppState;

/// Build the router for every managed collection.
pub fn router() -> Router<AppState> {
    let router = Router::new();
    let router = mount::<Host>(router);
    let router = mount::<HostApplication>(router);
    let router = mount::<SubAdmin>(router);
    let router = mount::<Ticket>(router);
    let router = mount::<CoinPlan>(router);
    let router = mount::<Commission>(router);
    let router = mount::<ReferralTier>(router);
    let router = mount::<Transaction>(router);
    let router = mount::<Hashtag>(router);
    let router = mount::<ReportReason>(router);
    let router = mount::<Gift>(router);
    mount::<Banner>(router)
}

fn mount<E: Entity>(router: Router<AppState>) -> Router<AppState> {
    router.nest(&format!("/api/{}", E::RESOURCE.name), collection_router::<E>())
}

/// Routes for one entity type.
pub fn collection_router<E: Entity>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<E>).post(create::<E>))
        .route("/more", get(more::<E>))
        .route("/retry", post(retry::<E>))
        .route("/{id}", patch(update::<E>).delete(remove::<E>))
        .route("/{id}/toggle/{field}", post(toggle::<E>))
}

fn state_key<E: Entity>() -> String {
    format!("collection:{}", E::RESOURCE.name)
}

fn query_key<E: Entity>() -> String {
    format!("collection:{}:query", E::RESOURCE.name)
}

fn require_view<E: Entity>(reader: &SessionReader) -> Result<Access, AppError> {
    let access = reader.access(E::RESOURCE.section);
    if !access.can_view {
        return Err(AppError::Forbidden(format!(
            "No access to {}",
            E::RESOURCE.label
        )));
    }
    Ok(access)
}

fn require_edit<E: Entity>(reader: &SessionReader) -> Result<Access, AppError> {
    let access = require_view::<E>(reader)?;
    if !access.can_edit {
        return Err(AppError::Forbidden(format!(
            "{} is view-only for this account",
            E::RESOURCE.label
        )));
    }
    Ok(access)
}

/// Restore the collection the operator last worked with.
///
/// Held state that no longer deserializes is discarded.
async fn load<E: Entity>(console: &Console, store: &Session) -> ResourceCollection<E> {
    let held: Option<ListState<E>> = store.get(&state_key::<E>()).await.ok().flatten();
    let query: Option<ListQuery> = store.get(&query_key::<E>()).await.ok().flatten();

    let collection = ResourceCollection::with_state(
        console.auth().api().clone(),
        console.notifier(),
        held.unwrap_or_default(),
    );
    match query {
        Some(query) => collection.with_last_query(query),
        None => collection,
    }
}

/// Persist the collection and build the response.
///
/// A backend 401 signs the operator out instead.
async fn respond<E: Entity>(
    mut console: Console,
    store: &Session,
    collection: ResourceCollection<E>,
    access: Access,
    outcome: Result<StatusCode, ResourceError>,
) -> Result<Response, AppError> {
    let (status, errors) = match outcome {
        Ok(status) => (status, None),
        Err(err) if err.is_unauthorized() => {
            debug!(resource = E::RESOURCE.name, "Backend rejected session");
            console.invalidate(store).await?;
            store.remove_value(&state_key::<E>()).await?;
            store.remove_value(&query_key::<E>()).await?;
            return Err(AppError::Unauthorized(
                "Session expired, please sign in again".to_string(),
            ));
        }
        Err(ResourceError::Validation(errors)) => (StatusCode::UNPROCESSABLE_ENTITY, Some(errors)),
        Err(err) => (resource_status(&err), None),
    };

    store
        .insert(&query_key::<E>(), collection.last_query())
        .await?;
    let state = collection.into_state();
    store.insert(&state_key::<E>(), &state).await?;

    let body = ConsoleResponse {
        state,
        notifications: console.drain(),
        access,
        errors,
    };
    Ok((status, Json(body)).into_response())
}

/// Fetch a page, replacing the list.
///
/// GET /api/{name}
async fn list<E: Entity>(
    RequireSession(reader): RequireSession,
    console: Console,
    store: Session,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let access = require_view::<E>(&reader)?;
    let mut collection = load::<E>(&console, &store).await;
    let outcome = collection.fetch(query).await.map(|()| StatusCode::OK);
    respond(console, &store, collection, access, outcome).await
}

/// Append the next page.
///
/// GET /api/{name}/more
async fn more<E: Entity>(
    RequireSession(reader): RequireSession,
    console: Console,
    store: Session,
) -> Result<Response, AppError> {
    let access = require_view::<E>(&reader)?;
    let mut collection = load::<E>(&console, &store).await;
    let outcome = collection.load_more().await.map(|()| StatusCode::OK);
    respond(console, &store, collection, access, outcome).await
}

/// Re-run the last fetch.
///
/// POST /api/{name}/retry
async fn retry<E: Entity>(
    RequireSession(reader): RequireSession,
    console: Console,
    store: Session,
) -> Result<Response, AppError> {
    let access = require_view::<E>(&reader)?;
    let mut collection = load::<E>(&console, &store).await;
    let outcome = collection.retry().await.map(|()| StatusCode::OK);
    respond(console, &store, collection, access, outcome).await
}

/// Create an item.
///
/// POST /api/{name}
async fn create<E: Entity>(
    RequireSession(reader): RequireSession,
    console: Console,
    store: Session,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Response, AppError> {
    let access = require_edit::<E>(&reader)?;
    let mut collection = load::<E>(&console, &store).await;
    let outcome = collection
        .create(payload)
        .await
        .map(|_| StatusCode::CREATED);
    respond(console, &store, collection, access, outcome).await
}

/// Update an item in place.
///
/// PATCH /api/{name}/{id}
async fn update<E: Entity>(
    RequireSession(reader): RequireSession,
    console: Console,
    store: Session,
    Path(id): Path<String>,
    Json(changes): Json<Map<String, Value>>,
) -> Result<Response, AppError> {
    let access = require_edit::<E>(&reader)?;
    let mut collection = load::<E>(&console, &store).await;
    let outcome = collection
        .update(&EntityId::new(id), changes)
        .await
        .map(|()| StatusCode::OK);
    respond(console, &store, collection, access, outcome).await
}

/// Delete an item.
///
/// DELETE /api/{name}/{id}
async fn remove<E: Entity>(
    RequireSession(reader): RequireSession,
    console: Console,
    store: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let access = require_edit::<E>(&reader)?;
    let mut collection = load::<E>(&console, &store).await;
    let outcome = collection
        .delete(&EntityId::new(id))
        .await
        .map(|()| StatusCode::OK);
    respond(console, &store, collection, access, outcome).await
}

/// Flip a boolean field.
///
/// POST /api/{name}/{id}/toggle/{field}
async fn toggle<E: Entity>(
    RequireSession(reader): RequireSession,
    console: Console,
    store: Session,
    Path((id, field)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let access = require_edit::<E>(&reader)?;
    let mut collection = load::<E>(&console, &store).await;
    let outcome = collection
        .toggle(&EntityId::new(id), &field)
        .await
        .map(|()| StatusCode::OK);
    respond(console, &store, collection, access, outcome).await
}
