//! # Relata Container
//!
//! Typed bean container and boot lifecycle.
//!
//! Application components ("beans") register under unique names with
//! explicitly declared dependency names. [`Container::boot`] verifies the
//! whole dependency graph up front - unresolved names and cycles are fatal
//! before anything runs - then drives three global, sequential,
//! all-or-nothing passes over every bean in registration order:
//!
//! 1. **Wire** - each bean resolves its declared dependencies through a
//!    [`WireContext`] and keeps typed handles.
//! 2. **Construct** - setup that needs injected dependencies (opening a
//!    store, creating tables). A bean may rely on every other bean's Wire
//!    having completed, never on a sibling's Construct.
//! 3. **Validate** - final cross-bean checks and wide-blast-radius side
//!    effects (mounting a listener belongs here).
//!
//! Either the whole application is up, or it never started serving:
//! any failure aborts the boot before the next phase runs for anyone.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bean;
mod container;
mod error;

pub use bean::{Bean, BeanResult, SharedBean};
pub use container::{Container, Phase, WireContext};
pub use error::{ContainerError, ContainerResult};
