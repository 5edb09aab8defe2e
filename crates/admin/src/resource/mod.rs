//! Generic resource collection.
//!
//! One [`ResourceCollection`] type serves every backend collection; all
//! per-resource behavior comes from the entity's [`chimax_core::ResourceConfig`].
//! Every operation follows the same lifecycle: mark pending, call the
//! backend, then either apply the result to the list and toast success, or
//! record the error and toast it.

mod state;

pub use state::{DEFAULT_PAGE_SIZE, ListPhase, ListQuery, ListState};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::instrument;

use chimax_core::validation::validate;
use chimax_core::{Endpoints, Entity, EntityId, InsertPosition, ValidationErrors, ValidationMode};

use crate::api::{ApiClient, ApiError};
use crate::notify::Notifier;
use state::position_of;

/// Why a collection operation did not apply.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The form did not pass client-side checks; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The resource only supports listing.
    #[error("{0} cannot be modified")]
    ReadOnly(&'static str),
}

impl ResourceError {
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(ApiError::Unauthorized))
    }
}

/// Client-side state and operations for one entity type.
#[derive(Debug)]
pub struct ResourceCollection<E: Entity> {
    api: ApiClient,
    notifier: Notifier,
    state: ListState<E>,
    last_query: ListQuery,
}

impl<E: Entity> ResourceCollection<E> {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Notifier) -> Self {
        Self::with_state(api, notifier, ListState::default())
    }

    /// Resume from previously held state.
    #[must_use]
    pub fn with_state(api: ApiClient, notifier: Notifier, state: ListState<E>) -> Self {
        let last_query = ListQuery {
            page: state.page,
            page_size: state.page_size,
            ..ListQuery::default()
        };
        Self {
            api,
            notifier,
            state,
            last_query,
        }
    }

    /// Resume with the filters of an earlier fetch.
    #[must_use]
    pub fn with_last_query(mut self, query: ListQuery) -> Self {
        self.last_query = query;
        self
    }

    #[must_use]
    pub const fn state(&self) -> &ListState<E> {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> ListState<E> {
        self.state
    }

    /// Query used by the most recent fetch.
    #[must_use]
    pub const fn last_query(&self) -> &ListQuery {
        &self.last_query
    }

    /// Replace the list with one page from the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error after recording it in the state.
    #[instrument(skip(self), fields(resource = E::RESOURCE.name))]
    pub async fn fetch(&mut self, query: ListQuery) -> Result<(), ResourceError> {
        self.last_query = query.clone();
        self.state.loading = true;
        self.state.initial_loading = !self.state.loaded;
        self.state.error = None;

        let config = E::RESOURCE;
        let result = self
            .api
            .get::<Vec<E>>(config.backend, config.endpoints.list, &query.to_pairs())
            .await;

        match result {
            Ok(payload) => {
                let items = payload.data.unwrap_or_default();
                self.state.total = payload.total.unwrap_or(items.len() as u64);
                self.state.items = items;
                self.state.page = query.page.max(1);
                self.state.page_size = query.page_size;
                self.settle();
                self.state.loaded = true;
                Ok(())
            }
            Err(err) => Err(self.reject(err.into())),
        }
    }

    /// Re-run the most recent fetch.
    ///
    /// # Errors
    ///
    /// See [`ResourceCollection::fetch`].
    pub async fn retry(&mut self) -> Result<(), ResourceError> {
        self.fetch(self.last_query.clone()).await
    }

    /// Fetch the next page and append it, skipping ids already listed.
    ///
    /// # Errors
    ///
    /// Returns the backend error after recording it in the state.
    #[instrument(skip(self), fields(resource = E::RESOURCE.name))]
    pub async fn load_more(&mut self) -> Result<(), ResourceError> {
        let query = ListQuery {
            page: self.state.page,
            page_size: self.state.page_size,
            ..self.last_query.clone()
        }
        .next_page();
        self.state.loading = true;
        self.state.error = None;

        let config = E::RESOURCE;
        let result = self
            .api
            .get::<Vec<E>>(config.backend, config.endpoints.list, &query.to_pairs())
            .await;

        match result {
            Ok(payload) => {
                for item in payload.data.unwrap_or_default() {
                    if position_of(&self.state.items, item.id()).is_none() {
                        self.state.items.push(item);
                    }
                }
                if let Some(total) = payload.total {
                    self.state.total = total;
                }
                self.state.page = query.page;
                self.last_query = query;
                self.settle();
                self.state.loaded = true;
                Ok(())
            }
            Err(err) => Err(self.reject(err.into())),
        }
    }

    /// Validate and create an item, then place it in the list.
    ///
    /// An id already present is replaced in place so ids stay unique.
    ///
    /// # Errors
    ///
    /// Returns a validation error without calling the backend, or the
    /// backend error after recording it.
    #[instrument(skip(self, payload), fields(resource = E::RESOURCE.name))]
    pub async fn create(&mut self, payload: Map<String, Value>) -> Result<E, ResourceError> {
        let config = E::RESOURCE;
        self.writable()?;
        validate(config.schema, &payload, ValidationMode::Create)?;

        self.state.loading = true;
        let result = self
            .api
            .post::<E, _>(config.backend, config.endpoints.create, &payload)
            .await
            .and_then(|payload| payload.require_data().map_err(ApiError::from));

        match result {
            Ok(item) => {
                if let Some(index) = position_of(&self.state.items, item.id()) {
                    if let Some(slot) = self.state.items.get_mut(index) {
                        *slot = item.clone();
                    }
                } else {
                    match config.insert {
                        InsertPosition::Prepend => self.state.items.insert(0, item.clone()),
                        InsertPosition::Append => self.state.items.push(item.clone()),
                    }
                    self.state.total = self.state.total.saturating_add(1);
                }
                self.settle();
                self.notifier.success(format!("{} created", config.label));
                Ok(item)
            }
            Err(err) => Err(self.reject(err.into())),
        }
    }

    /// Validate present fields and update an item in place.
    ///
    /// When the backend echoes no entity the patch is merged locally.
    ///
    /// # Errors
    ///
    /// See [`ResourceCollection::create`].
    #[instrument(skip(self, patch), fields(resource = E::RESOURCE.name, id = %id))]
    pub async fn update(
        &mut self,
        id: &EntityId,
        patch: Map<String, Value>,
    ) -> Result<(), ResourceError> {
        let config = E::RESOURCE;
        self.writable()?;
        validate(config.schema, &patch, ValidationMode::Patch)?;

        let path = Endpoints::expand(config.endpoints.update, Some(id), None)
            .map_err(ValidationErrors::from)?;

        self.state.loading = true;
        let result = self.api.patch::<E, _>(config.backend, &path, &patch).await;

        match result {
            Ok(payload) => {
                if let Some(index) = position_of(&self.state.items, id)
                    && let Some(slot) = self.state.items.get_mut(index)
                {
                    match payload.data {
                        Some(updated) => *slot = updated,
                        None => {
                            if let Some(merged) = merge_patch(slot, &patch) {
                                *slot = merged;
                            }
                        }
                    }
                }
                self.settle();
                self.notifier.success(format!("{} updated", config.label));
                Ok(())
            }
            Err(err) => Err(self.reject(err.into())),
        }
    }

    /// Delete an item; the list changes only if the id was listed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an id that is not a single path
    /// segment, or the backend error after recording it.
    #[instrument(skip(self), fields(resource = E::RESOURCE.name, id = %id))]
    pub async fn delete(&mut self, id: &EntityId) -> Result<(), ResourceError> {
        let config = E::RESOURCE;
        self.writable()?;

        let path = Endpoints::expand(config.endpoints.delete, Some(id), None)
            .map_err(ValidationErrors::from)?;

        self.state.loading = true;
        let result = self.api.delete::<Value>(config.backend, &path).await;

        match result {
            Ok(_) => {
                if let Some(index) = position_of(&self.state.items, id) {
                    self.state.items.remove(index);
                    self.state.total = self.state.total.saturating_sub(1);
                }
                self.settle();
                self.notifier.success(format!("{} deleted", config.label));
                Ok(())
            }
            Err(err) => Err(self.reject(err.into())),
        }
    }

    /// Flip one boolean field of an item, leaving every other field alone.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a field the entity cannot toggle,
    /// or the backend error after recording it.
    #[instrument(skip(self), fields(resource = E::RESOURCE.name, id = %id))]
    pub async fn toggle(&mut self, id: &EntityId, field: &str) -> Result<(), ResourceError> {
        let config = E::RESOURCE;
        self.writable()?;
        let known = E::FLAGS.iter().any(|flag| *flag == field);
        let Some(template) = config.endpoints.toggle.filter(|_| known) else {
            return Err(ValidationErrors::single(field, "cannot be toggled").into());
        };

        let path =
            Endpoints::expand(template, Some(id), Some(field)).map_err(ValidationErrors::from)?;

        self.state.loading = true;
        let result = self
            .api
            .patch::<Value, _>(config.backend, &path, &Map::new())
            .await;

        match result {
            Ok(_) => {
                let mut now = None;
                if let Some(index) = position_of(&self.state.items, id)
                    && let Some(flag) = self
                        .state
                        .items
                        .get_mut(index)
                        .and_then(|item| item.flag_mut(field))
                {
                    *flag = !*flag;
                    now = Some(*flag);
                }
                self.settle();
                let message = match now {
                    Some(true) => format!("{} {field} turned on", config.label),
                    Some(false) => format!("{} {field} turned off", config.label),
                    None => format!("{} {field} updated", config.label),
                };
                self.notifier.success(message);
                Ok(())
            }
            Err(err) => Err(self.reject(err.into())),
        }
    }

    fn writable(&self) -> Result<(), ResourceError> {
        if E::RESOURCE.read_only {
            return Err(ResourceError::ReadOnly(E::RESOURCE.label));
        }
        Ok(())
    }

    fn settle(&mut self) {
        self.state.loading = false;
        self.state.initial_loading = false;
    }

    /// Record a failed operation and toast it.
    fn reject(&mut self, err: ResourceError) -> ResourceError {
        let message = err.to_string();
        self.settle();
        self.state.error = Some(message.clone());
        self.notifier.error(message);
        err
    }
}

/// Apply a JSON merge of `patch` onto `item`.
fn merge_patch<E: Entity>(item: &E, patch: &Map<String, Value>) -> Option<E> {
    let mut value = serde_json::to_value(item).ok()?;
    let object = value.as_object_mut()?;
    for (key, field) in patch {
        object.insert(key.clone(), field.clone());
    }
    serde_json::from_value(value).ok()
}
