//! The tutorial application.
//!
//! A small item/user API whose operations exercise every parameter source:
//! path, query, headers, cookies and JSON bodies. Each [`Operation`] pairs a
//! descriptor table with a handler; [`Catalog::dispatch`] binds a request
//! and runs the handler only when every parameter validated.
//!
//! # Example
//!
//! ```rust
//! use kanon::bind::{Binder, RawRequest};
//! use kanon::tutorial::{Catalog, DispatchError};
//!
//! let catalog = Catalog::tutorial().unwrap();
//! let binder = Binder::default();
//!
//! let request = RawRequest::builder().path_param("item_id", "5").build();
//! let response = catalog.dispatch(&binder, "read_item", &request).unwrap();
//! assert_eq!(response["item_id"], 5);
//!
//! let request = RawRequest::builder().path_param("item_id", "five").build();
//! let error = catalog.dispatch(&binder, "read_item", &request).unwrap_err();
//! assert!(matches!(error, DispatchError::Rejected(_)));
//! ```

mod endpoints;
mod handlers;

use http::Method;
use kanon_bind::{Binder, BoundArguments, Endpoint, RawRequest, SpecError, ValidationErrors};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

pub use endpoints::{cookies_model, item_model, MODEL_NAMES};
pub use handlers::{HandlerResult, Item, FAKE_ITEMS};

/// Handler invoked with bound arguments.
pub type Handler = fn(&BoundArguments) -> HandlerResult;

/// Errors from [`Catalog::dispatch`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No operation has this name.
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// The request failed validation.
    #[error("request rejected with {} validation error(s)", .0.len())]
    Rejected(ValidationErrors),

    /// The handler could not shape its response.
    #[error("handler failed: {0}")]
    Handler(#[from] serde_json::Error),
}

/// One operation: route, descriptor table and handler.
#[derive(Debug)]
pub struct Operation {
    method: Method,
    route: &'static str,
    endpoint: Endpoint,
    handler: Handler,
}

impl Operation {
    fn new(
        method: Method,
        route: &'static str,
        endpoint: Result<Endpoint, SpecError>,
        handler: Handler,
    ) -> Result<Self, SpecError> {
        Ok(Self {
            method,
            route,
            endpoint: endpoint?,
            handler,
        })
    }

    /// Operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.endpoint.name()
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Route template, e.g. `/items/{item_id}`.
    #[must_use]
    pub fn route(&self) -> &'static str {
        self.route
    }

    /// Descriptor table.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Runs the handler on already-bound arguments.
    pub fn handle(&self, args: &BoundArguments) -> HandlerResult {
        (self.handler)(args)
    }
}

/// The operations of an application, in registration order.
#[derive(Debug)]
pub struct Catalog {
    operations: Vec<Operation>,
}

impl Catalog {
    /// Builds the tutorial catalog.
    ///
    /// # Errors
    ///
    /// Returns a `SpecError` if a descriptor table is invalid.
    pub fn tutorial() -> Result<Self, SpecError> {
        let operations = vec![
            Operation::new(Method::GET, "/", endpoints::root(), handlers::root)?,
            Operation::new(
                Method::GET,
                "/items/{item_id}",
                endpoints::read_item(),
                handlers::read_item,
            )?,
            Operation::new(
                Method::GET,
                "/users/me",
                endpoints::read_user_me(),
                handlers::read_user_me,
            )?,
            Operation::new(
                Method::GET,
                "/users/{user_id}",
                endpoints::read_user(),
                handlers::read_user,
            )?,
            Operation::new(
                Method::GET,
                "/models/{model_name}",
                endpoints::get_model(),
                handlers::get_model,
            )?,
            Operation::new(
                Method::GET,
                "/files/{file_path:path}",
                endpoints::read_file(),
                handlers::read_file,
            )?,
            Operation::new(
                Method::GET,
                "/items/",
                endpoints::list_items(),
                handlers::list_items,
            )?,
            Operation::new(
                Method::GET,
                "/items/{item_id}/detail",
                endpoints::read_item_detail(),
                handlers::read_item_detail,
            )?,
            Operation::new(
                Method::GET,
                "/users/{user_id}/items/{item_id}",
                endpoints::read_user_item(),
                handlers::read_user_item,
            )?,
            Operation::new(
                Method::POST,
                "/items/{item_id}",
                endpoints::create_item(),
                handlers::create_item,
            )?,
            Operation::new(
                Method::GET,
                "/items/search",
                endpoints::read_items_filtered(),
                handlers::read_items_filtered,
            )?,
            Operation::new(
                Method::GET,
                "/headers/",
                endpoints::read_headers(),
                handlers::read_headers,
            )?,
            Operation::new(
                Method::GET,
                "/cookies/",
                endpoints::read_cookies(),
                handlers::read_cookies,
            )?,
            Operation::new(
                Method::PUT,
                "/schedule/{item_id}",
                endpoints::schedule_item(),
                handlers::schedule_item,
            )?,
            Operation::new(
                Method::GET,
                "/tags/",
                endpoints::tag_set(),
                handlers::tag_set,
            )?,
        ];
        Ok(Self { operations })
    }

    /// Returns the operation named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name() == name)
    }

    /// Iterates over operations in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if there are no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Binds `request` against the operation `name` and runs its handler.
    ///
    /// # Errors
    ///
    /// - `UnknownOperation` if no operation has this name
    /// - `Rejected` with every validation failure
    /// - `Handler` if the response could not be built
    pub fn dispatch(
        &self,
        binder: &Binder,
        name: &str,
        request: &RawRequest,
    ) -> Result<JsonValue, DispatchError> {
        let operation = self
            .get(name)
            .ok_or_else(|| DispatchError::UnknownOperation(name.to_string()))?;
        let args = binder
            .bind(request, operation.endpoint())
            .map_err(DispatchError::Rejected)?;
        debug!(operation = name, route = operation.route(), "dispatching");
        Ok(operation.handle(&args)?)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_builds() {
        let catalog = Catalog::tutorial().unwrap();
        assert_eq!(catalog.len(), 15);
        assert!(catalog.get("read_item").is_some());
        assert!(catalog.get("delete_everything").is_none());
    }

    #[test]
    fn test_operation_names_unique() {
        let catalog = Catalog::tutorial().unwrap();
        let mut names: Vec<&str> = catalog.iter().map(Operation::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn test_unknown_operation() {
        let catalog = Catalog::tutorial().unwrap();
        let request = RawRequest::builder().build();
        let result = catalog.dispatch(&Binder::default(), "nope", &request);
        assert!(matches!(result, Err(DispatchError::UnknownOperation(name)) if name == "nope"));
    }

    #[test]
    fn test_operation_methods() {
        let catalog = Catalog::tutorial().unwrap();
        let create = catalog.get("create_item").unwrap();
        assert_eq!(create.method(), &Method::POST);
        assert_eq!(create.route(), "/items/{item_id}");
        assert_eq!(catalog.get("schedule_item").unwrap().method(), &Method::PUT);
        assert_eq!(catalog.get("read_item").unwrap().method(), &Method::GET);
    }

    #[test]
    fn test_schedule_item_body_is_embedded() {
        let catalog = Catalog::tutorial().unwrap();
        let endpoint = catalog.get("schedule_item").unwrap().endpoint();
        assert!(endpoint.param("start_datetime").unwrap().is_embedded());
        assert!(!catalog
            .get("create_item")
            .unwrap()
            .endpoint()
            .param("item")
            .unwrap()
            .is_embedded());
    }
}
