//! # RenderTaskGraph (RTG)
//!
//! Drawing does not happen immediately. Instead work is recorded into [RenderTask](task::RenderTask)s that write to one or more
//! [SurfaceProxy](proxy::SurfaceProxy)s. Whenever a task reads a surface, [RenderTaskGraph::add_surface_dependency] finds the task that wrote
//! the surface last, closes it, and adds the dependency. If the surface needs an MSAA resolve or mip map regeneration before it can be read,
//! a resolve task is inserted transparently.
//!
//! At [flush](RenderTaskGraph::flush) time all tasks are closed, ordered, prepared and executed against a [ResourceProvider](grit::ResourceProvider).

pub use grit;

mod caps;
pub use caps::Caps;

mod geometry;
pub use geometry::IRect;

pub mod proxy;
pub use proxy::{Mipmapped, ProxyDesc, ProxyKey, ResolveFlags, SurfaceProxy};

mod index;
pub use index::{LastTaskMap, SurfaceTaskIndex};

pub mod task;
pub use task::{ExpectedOutcome, RenderTask, RenderTaskOps, TaskId, TaskKey};

pub mod resolve;
pub use resolve::{
    DefaultResolveManager, Resolve, TextureResolveManager, TextureResolveOps, TextureResolveTask,
};

mod graph;
pub use graph::{FlushError, FlushReport, FlushState, RenderTaskGraph};

///Pre implemented generic tasks
pub mod tasks;
