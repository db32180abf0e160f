//! deployhooks - CloudFormation custom-resource handlers for deployments
//!
//! Each handler answers a stack lifecycle event by triggering an external
//! deployment (a CodeBuild project or an Amplify pipeline), polling it to a
//! terminal state, and reporting the outcome through exactly one callback.
//!
//! This crate re-exports the workspace members:
//! - [`config`]: layered runtime configuration
//! - [`core`]: poller, status vocabularies, event/response types, service traits
//! - [`handlers`]: dispatcher and the Terraform / Amplify handlers
//!
//! The `bootstrap` binary lives in `deployhooks-lambda`.

pub use deployhooks_config as config;
pub use deployhooks_core as core;
pub use deployhooks_handlers as handlers;

pub use deployhooks_config::{HandlerKind, RuntimeConfig};
pub use deployhooks_core::{LifecycleEvent, Poller, ResponseStatus, ServiceError};
pub use deployhooks_handlers::{build_handler, Dispatcher, Outcome, Services};
