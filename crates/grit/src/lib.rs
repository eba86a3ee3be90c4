//! # Grit
//!
//! Backend half of Grit. Render tasks recorded by `grit-rtg` do not create Vulkan objects themselves. Instead they ask the
//! [ResourceProvider] for render passes, pipelines, samplers, descriptor sets, command pools and uniform blocks.
//!
//! The provider caches every object either by content (find-or-create, shared via [Arc](std::sync::Arc)) or in a checkout/return pool.
//! The actual object creation is delegated to a [ResourceFactory](factory::ResourceFactory). The [headless] module provides a factory that
//! never touches a device, which is what the tests and the dry-run demo use.
//!
//! Teardown is explicit: [ResourceProvider::destroy_resources] for the graceful path, [ResourceProvider::abandon_resources] for device loss.

pub use ash;

mod error;
pub use error::ProviderError;

///Backend seam used to create and destroy the raw Vulkan handles.
pub mod factory;
///Null-device factory.
pub mod headless;
///Typed wrappers around the cached backend objects.
pub mod resources;

mod provider;
pub use provider::{ProviderConfig, ResourceProvider};
