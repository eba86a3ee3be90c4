use std::{
    fmt::Display,
    sync::atomic::{AtomicU32, Ordering},
};

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{Caps, FlushError, FlushState, IRect, ProxyKey, TextureResolveOps};

slotmap::new_key_type!(
    ///Key of a task within a [RenderTaskGraph](crate::RenderTaskGraph).
    pub struct TaskKey;
);

///Process wide unique id of a render task. Never [TaskId::INVALID].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u32);

impl TaskId {
    pub const INVALID: Self = TaskId(0);

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_TASK_ID: AtomicU32 = AtomicU32::new(1);

pub(crate) fn next_task_id() -> TaskId {
    create_unique_id(&NEXT_TASK_ID)
}

///Takes the next id from `counter`. Skips the invalid id when the counter wraps around.
pub(crate) fn create_unique_id(counter: &AtomicU32) -> TaskId {
    loop {
        let id = counter.fetch_add(1, Ordering::Relaxed);
        if id != TaskId::INVALID.0 {
            return TaskId(id);
        }
    }
}

///What closing a task did to its first target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedOutcome {
    ///The target was written within the rectangle. MSAA content and mip maps are out of date afterwards.
    TargetDirty(IRect),
    TargetClean,
}

///Backend behaviour of a render task.
///
/// The graph owns the structural part of a task (targets, dependencies, state). Everything that depends on the kind of
/// work (render pass, copy, transfer ...) is implemented here.
pub trait RenderTaskOps {
    fn name(&self) -> &str {
        "RenderTask"
    }
    ///Called exactly once when the task is closed. Reports whether the first target was written.
    fn on_make_closed(&mut self, caps: &Caps) -> ExpectedOutcome;
    ///Called in dependency order before any task is executed.
    fn on_prepare(&mut self, _state: &mut FlushState<'_>) {}
    fn on_execute(&mut self, state: &mut FlushState<'_>) -> Result<(), FlushError>;
}

pub(crate) enum TaskOps {
    Task(Box<dyn RenderTaskOps>),
    Resolve(Box<dyn TextureResolveOps>),
}

impl TaskOps {
    pub(crate) fn name(&self) -> &str {
        match self {
            TaskOps::Task(ops) => ops.name(),
            TaskOps::Resolve(ops) => ops.name(),
        }
    }

    pub(crate) fn on_make_closed(&mut self, caps: &Caps) -> ExpectedOutcome {
        match self {
            TaskOps::Task(ops) => ops.on_make_closed(caps),
            TaskOps::Resolve(ops) => ops.on_make_closed(caps),
        }
    }

    pub(crate) fn on_prepare(&mut self, state: &mut FlushState<'_>) {
        match self {
            TaskOps::Task(ops) => ops.on_prepare(state),
            TaskOps::Resolve(ops) => ops.on_prepare(state),
        }
    }

    pub(crate) fn on_execute(&mut self, state: &mut FlushState<'_>) -> Result<(), FlushError> {
        match self {
            TaskOps::Task(ops) => ops.on_execute(state),
            TaskOps::Resolve(ops) => ops.on_execute(state),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct TaskFlags: u8 {
        const CLOSED = 0b01;
        const DISOWNED = 0b10;
    }
}

///A node of the [RenderTaskGraph](crate::RenderTaskGraph).
pub struct RenderTask {
    pub(crate) id: TaskId,
    pub(crate) targets: SmallVec<[ProxyKey; 1]>,
    ///Tasks this task depends on.
    pub(crate) dependencies: SmallVec<[TaskKey; 4]>,
    ///Tasks that depend on this task.
    pub(crate) dependents: SmallVec<[TaskKey; 4]>,
    pub(crate) flags: TaskFlags,
    ///Lazily created resolve task for the proxies this task reads.
    pub(crate) texture_resolve_task: Option<TaskKey>,
    ///Deferred proxies read by this task. Their uploads are scheduled when the task is prepared.
    pub(crate) deferred_proxies: SmallVec<[ProxyKey; 2]>,
    pub(crate) ops: TaskOps,
}

impl RenderTask {
    pub(crate) fn new(ops: TaskOps) -> Self {
        RenderTask {
            id: next_task_id(),
            targets: SmallVec::new(),
            dependencies: SmallVec::new(),
            dependents: SmallVec::new(),
            flags: TaskFlags::empty(),
            texture_resolve_task: None,
            deferred_proxies: SmallVec::new(),
            ops,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.ops.name()
    }

    pub fn is_closed(&self) -> bool {
        self.flags.contains(TaskFlags::CLOSED)
    }

    pub fn is_disowned(&self) -> bool {
        self.flags.contains(TaskFlags::DISOWNED)
    }

    pub fn is_resolve_task(&self) -> bool {
        matches!(self.ops, TaskOps::Resolve(_))
    }

    pub fn targets(&self) -> &[ProxyKey] {
        &self.targets
    }

    pub fn num_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn target(&self, idx: usize) -> Option<ProxyKey> {
        self.targets.get(idx).copied()
    }

    pub fn dependencies(&self) -> &[TaskKey] {
        &self.dependencies
    }

    pub fn dependents(&self) -> &[TaskKey] {
        &self.dependents
    }

    pub fn depends_on(&self, other: TaskKey) -> bool {
        self.dependencies.contains(&other)
    }

    pub fn is_dependent(&self, other: TaskKey) -> bool {
        self.dependents.contains(&other)
    }

    pub fn texture_resolve_task(&self) -> Option<TaskKey> {
        self.texture_resolve_task
    }

    pub fn deferred_proxies(&self) -> &[ProxyKey] {
        &self.deferred_proxies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_skip_invalid() {
        let counter = AtomicU32::new(u32::MAX);
        assert_eq!(create_unique_id(&counter), TaskId(u32::MAX));
        //Wrapped to 0, which must be skipped
        assert_eq!(create_unique_id(&counter), TaskId(1));
        assert_eq!(create_unique_id(&counter), TaskId(2));
    }

    #[test]
    fn ids_increase() {
        let a = next_task_id();
        let b = next_task_id();
        assert!(b > a);
        assert_ne!(a, TaskId::INVALID);
    }
}
