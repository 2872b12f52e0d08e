//! # Relata Engine
//!
//! Generic CRUD and link engine working uniformly across entity kinds.
//!
//! One [`EntityEngine`] instance serves one entity kind. It allocates
//! request-scoped values through the kind's factories, delegates entity
//! persistence to the document store and relationship persistence to the
//! graph store, and exposes an explicit [`RouteTable`] for the host
//! router to mount - no reflection, no route discovery.
//!
//! The [`beans`] module provides the standard bean wrappers so a whole
//! application assembles through the
//! [`Container`](relata_container::Container): register the kind
//! registry, the two stores and one engine bean per kind, then boot.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod beans;
mod config;
mod engine;
mod error;
mod routes;

pub use config::Settings;
pub use engine::{EntityEngine, TaskHandler};
pub use error::{EngineError, EngineResult};
pub use routes::{Method, Operation, OperationRouter, Route, RouteTable};
