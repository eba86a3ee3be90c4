use std::fmt::Display;

use slotmap::SlotMap;

use crate::{
    Caps, DefaultResolveManager, ExpectedOutcome, LastTaskMap, Mipmapped, ProxyDesc, ProxyKey,
    RenderTask, RenderTaskOps, Resolve, ResolveFlags, SurfaceProxy, SurfaceTaskIndex, TaskKey,
    TextureResolveManager, task::TaskFlags, task::TaskOps,
};

mod flush;
pub use flush::{FlushError, FlushReport, FlushState};

///Dependency graph of render tasks over surface proxies.
///
/// The graph owns all tasks and proxies. The surface→task index is injected, so the graph can be driven by an outside
/// drawing manager, or by tests with their own index.
///
/// All invariant violations (cycles, duplicated edges, mutating closed tasks, reading a dirty surface within the task that writes it)
/// are programming errors and panic.
pub struct RenderTaskGraph<I: SurfaceTaskIndex = LastTaskMap> {
    caps: Caps,
    tasks: SlotMap<TaskKey, RenderTask>,
    proxies: SlotMap<ProxyKey, SurfaceProxy>,
    index: I,
    resolve_manager: Box<dyn TextureResolveManager>,
}

impl RenderTaskGraph<LastTaskMap> {
    pub fn new(caps: Caps) -> Self {
        Self::with_index(caps, LastTaskMap::default(), Box::new(DefaultResolveManager))
    }
}

impl<I: SurfaceTaskIndex> RenderTaskGraph<I> {
    pub fn with_index(caps: Caps, index: I, resolve_manager: Box<dyn TextureResolveManager>) -> Self {
        RenderTaskGraph {
            caps,
            tasks: SlotMap::with_key(),
            proxies: SlotMap::with_key(),
            index,
            resolve_manager,
        }
    }

    pub fn caps(&self) -> &Caps {
        &self.caps
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut I {
        &mut self.index
    }

    //
    // Proxies
    //

    pub fn create_proxy(&mut self, desc: ProxyDesc) -> ProxyKey {
        let proxy = SurfaceProxy::new(desc, &self.caps);
        self.proxies.insert(proxy)
    }

    pub fn proxy(&self, proxy: ProxyKey) -> Option<&SurfaceProxy> {
        self.proxies.get(proxy)
    }

    pub fn proxy_mut(&mut self, proxy: ProxyKey) -> Option<&mut SurfaceProxy> {
        self.proxies.get_mut(proxy)
    }

    ///Marks `proxy` as backed by a real resource.
    pub fn instantiate_proxy(&mut self, proxy: ProxyKey) {
        self.proxies[proxy].instantiate();
    }

    pub fn instantiate_all(&mut self) {
        for (_, proxy) in self.proxies.iter_mut() {
            proxy.instantiate();
        }
    }

    //
    // Tasks
    //

    pub fn task(&self, task: TaskKey) -> Option<&RenderTask> {
        self.tasks.get(task)
    }

    pub fn tasks(&self) -> impl Iterator<Item = (TaskKey, &RenderTask)> {
        self.tasks.iter()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    ///Adds an open task without any targets.
    pub fn add_task(&mut self, ops: Box<dyn RenderTaskOps>) -> TaskKey {
        let task = RenderTask::new(TaskOps::Task(ops));
        #[cfg(feature = "logging")]
        log::trace!("New task {} [{}]", task.id, task.name());
        self.tasks.insert(task)
    }

    ///Adds `proxy` as a target of `task`. `task` becomes the last task of `proxy`.
    pub fn add_target(&mut self, task: TaskKey, proxy: ProxyKey) {
        assert!(
            !self.tasks[task].is_closed(),
            "Adding target to closed task {}",
            self.tasks[task].id
        );
        assert!(self.proxies.contains_key(proxy), "Unknown proxy");
        self.index.set_last_task(proxy, Some(task));
        self.tasks[task].targets.push(proxy);
    }

    pub fn depends_on(&self, task: TaskKey, other: TaskKey) -> bool {
        self.tasks[task].depends_on(other)
    }

    pub fn is_dependent(&self, task: TaskKey, other: TaskKey) -> bool {
        self.tasks[task].is_dependent(other)
    }

    ///Adds the edge `task` → `depends_on` and its mirror.
    ///
    /// # Panics
    /// if `task` is closed, if the edge already exists, or if the edge would form a cycle.
    pub fn add_dependency(&mut self, task: TaskKey, depends_on: TaskKey) {
        assert!(task != depends_on, "Task can't depend on itself");
        assert!(
            !self.tasks[task].is_closed(),
            "Adding dependency to closed task {}",
            self.tasks[task].id
        );
        assert!(
            !self.tasks[depends_on].depends_on(task),
            "Dependency {} -> {} would form a cycle",
            self.tasks[task].id,
            self.tasks[depends_on].id
        );
        assert!(
            !self.tasks[task].depends_on(depends_on),
            "Duplicate dependency {} -> {}",
            self.tasks[task].id,
            self.tasks[depends_on].id
        );
        debug_assert!(
            !self.reaches(depends_on, task),
            "Dependency {} -> {} would form a cycle",
            self.tasks[task].id,
            self.tasks[depends_on].id
        );

        #[cfg(feature = "logging")]
        log::trace!(
            "Dependency {} -> {}",
            self.tasks[task].id,
            self.tasks[depends_on].id
        );

        self.tasks[task].dependencies.push(depends_on);
        self.tasks[depends_on].dependents.push(task);
    }

    ///Lets `task` read `proxy`.
    ///
    /// Closes the task that wrote `proxy` last, and adds a dependency on it. If the proxy's MSAA content or mip maps are
    /// dirty, a resolve task is scheduled in between. `Mipmapped::Yes` requests valid mip maps, which is ignored if the
    /// proxy has none.
    pub fn add_surface_dependency(&mut self, task: TaskKey, proxy: ProxyKey, mipmapped: Mipmapped) {
        assert!(
            !self.tasks[task].is_closed(),
            "Adding surface dependency to closed task {}",
            self.tasks[task].id
        );

        let producer = self.index.last_task(proxy);

        if producer == Some(task) {
            //Reading a target within the task that writes it. Handled by a barrier in the backend, but there is no way
            //to resolve in between.
            let p = &self.proxies[proxy];
            assert!(
                mipmapped == Mipmapped::No,
                "Task {} samples mip maps of its own target {}",
                self.tasks[task].id,
                p.name()
            );
            assert!(
                !p.requires_manual_msaa_resolve(),
                "Task {} reads its own multisampled target {}",
                self.tasks[task].id,
                p.name()
            );
            assert!(
                !p.is_deferred(),
                "Task {} reads its own deferred target {}",
                self.tasks[task].id,
                p.name()
            );
            return;
        }

        if let Some(producer) = producer {
            if self.tasks[task].depends_on(producer)
                || self.tasks[task].texture_resolve_task == Some(producer)
            {
                //Already ordered after the producer.
                return;
            }
            self.make_closed(producer);
        }

        let p = &self.proxies[proxy];
        let mut flags = ResolveFlags::empty();
        if p.requires_manual_msaa_resolve() && p.is_msaa_dirty() {
            flags |= ResolveFlags::MSAA;
        }
        let mipmapped = if mipmapped == Mipmapped::Yes && p.mipmapped() == Mipmapped::No {
            #[cfg(feature = "logging")]
            log::trace!("{} has no mip maps, sampling base level only", p.name());
            Mipmapped::No
        } else {
            mipmapped
        };
        if mipmapped == Mipmapped::Yes && p.mipmaps_are_dirty() {
            flags |= ResolveFlags::MIPMAPS;
        }

        if !flags.is_empty() {
            let resolve = self.resolve_task_for(task);
            self.add_proxy_to_resolve(resolve, proxy, flags);
            debug_assert!(
                self.index.last_task(proxy) == Some(resolve),
                "Resolve task is not the last task of the resolved proxy"
            );
            return;
        }

        if self.proxies[proxy].is_deferred() && !self.tasks[task].deferred_proxies.contains(&proxy) {
            self.tasks[task].deferred_proxies.push(proxy);
        }

        if let Some(producer) = producer {
            self.add_dependency(task, producer);
        }
    }

    ///Returns the open resolve task of `task`, creating it if needed.
    fn resolve_task_for(&mut self, task: TaskKey) -> TaskKey {
        if let Some(resolve) = self.tasks[task].texture_resolve_task {
            if !self.tasks[resolve].is_closed() {
                return resolve;
            }
            //Another reader of a resolved proxy closed the resolve task already. Keep the order, and start a new one.
            if !self.tasks[task].depends_on(resolve) {
                self.add_dependency(task, resolve);
            }
        }

        let ops = self.resolve_manager.new_resolve_task(&self.caps);
        let resolve = RenderTask::new(TaskOps::Resolve(ops));

        #[cfg(feature = "logging")]
        log::trace!(
            "New resolve task {} for task {}",
            resolve.id,
            self.tasks[task].id
        );

        let resolve = self.tasks.insert(resolve);
        self.tasks[task].texture_resolve_task = Some(resolve);
        resolve
    }

    fn add_proxy_to_resolve(&mut self, resolve: TaskKey, proxy: ProxyKey, flags: ResolveFlags) {
        debug_assert!(
            self.index
                .last_task(proxy)
                .map(|last| self.tasks[last].is_closed())
                .unwrap_or(true),
            "Last task of a resolved proxy must be closed"
        );

        let p = &mut self.proxies[proxy];
        let mut msaa_rect = None;
        if flags.contains(ResolveFlags::MSAA) {
            assert!(p.is_msaa_dirty(), "Resolving clean MSAA content of {}", p.name());
            msaa_rect = p.mark_msaa_resolved();
        }
        if flags.contains(ResolveFlags::MIPMAPS) {
            assert!(
                p.mipmapped() == Mipmapped::Yes && p.mipmaps_are_dirty(),
                "Regenerating clean mip maps of {}",
                p.name()
            );
            p.mark_mipmaps_clean();
        }

        let resolve_id = self.tasks[resolve].id;
        match &mut self.tasks[resolve].ops {
            TaskOps::Resolve(ops) => ops.add_resolve(Resolve {
                proxy,
                flags,
                msaa_rect,
            }),
            TaskOps::Task(_) => panic!("Task {} is no resolve task", resolve_id),
        }

        //The resolve reads the current content, and rewrites it.
        self.add_surface_dependency(resolve, proxy, Mipmapped::No);
        self.add_target(resolve, proxy);
    }

    ///Adds all dependencies of `other` to `task`.
    pub fn add_dependencies_from_other_task(&mut self, task: TaskKey, other: TaskKey) {
        let dependencies = self.tasks[other].dependencies.clone();
        for dependency in dependencies {
            assert!(dependency != task, "Task would depend on itself");
            if !self.tasks[task].depends_on(dependency) {
                self.add_dependency(task, dependency);
            }
        }
    }

    ///Closes `task`. No dependencies or targets can be added afterwards. Closing a closed task does nothing.
    ///
    /// Marks the first target dirty if the task reports that it wrote it, and closes the task's resolve task as well.
    pub fn make_closed(&mut self, task: TaskKey) {
        if self.tasks[task].is_closed() {
            return;
        }

        let outcome = self.tasks[task].ops.on_make_closed(&self.caps);
        if let ExpectedOutcome::TargetDirty(rect) = outcome {
            if let Some(target) = self.tasks[task].target(0) {
                let proxy = &mut self.proxies[target];
                if proxy.requires_manual_msaa_resolve() {
                    proxy.mark_msaa_dirty(rect);
                }
                if proxy.mipmapped() == Mipmapped::Yes {
                    proxy.mark_mipmaps_dirty();
                }
            }
        }

        if let Some(resolve) = self.tasks[task].texture_resolve_task.take() {
            if !self.tasks[task].depends_on(resolve) {
                self.add_dependency(task, resolve);
            }
            self.make_closed(resolve);
        }

        #[cfg(feature = "logging")]
        log::trace!(
            "Closed task {} [{}]",
            self.tasks[task].id,
            self.tasks[task].name()
        );

        self.tasks[task].flags.insert(TaskFlags::CLOSED);
    }

    ///Closes every task that depends on `task`.
    pub fn close_those_who_depend_on_me(&mut self, task: TaskKey) {
        let dependents = self.tasks[task].dependents.clone();
        for dependent in dependents {
            if !self.tasks[dependent].is_closed() {
                self.make_closed(dependent);
            }
        }
    }

    ///Removes `task` from the surface→task index wherever it is still the last task. Can only be called on closed tasks.
    pub fn disown(&mut self, task: TaskKey) {
        let t = &mut self.tasks[task];
        assert!(t.is_closed(), "Disowning open task {}", t.id);
        if t.is_disowned() {
            return;
        }
        t.flags.insert(TaskFlags::DISOWNED);

        for target in t.targets.iter() {
            if self.index.last_task(*target) == Some(task) {
                self.index.set_last_task(*target, None);
            }
        }
    }

    ///True if the task's first target is backed by a resource. Tasks without targets are always instantiated.
    pub fn is_instantiated(&self, task: TaskKey) -> bool {
        task_is_instantiated(&self.tasks[task], &self.proxies)
    }

    pub fn deferred_proxies_are_instantiated(&self, task: TaskKey) -> bool {
        self.tasks[task]
            .deferred_proxies
            .iter()
            .all(|p| self.proxies[*p].is_instantiated())
    }

    ///True if `to` can be reached from `from` by following dependencies.
    fn reaches(&self, from: TaskKey, to: TaskKey) -> bool {
        let mut visited = slotmap::SecondaryMap::<TaskKey, ()>::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if visited.insert(current, ()).is_some() {
                continue;
            }
            stack.extend(self.tasks[current].dependencies.iter().copied());
        }
        false
    }

    ///Checks the structural invariants of the graph: all edges point to existing tasks and are mirrored, the graph is
    /// acyclic and closed tasks carry no pending resolve task.
    pub fn validate(&self) -> bool {
        for (key, task) in self.tasks.iter() {
            for dep in task.dependencies.iter() {
                match self.tasks.get(*dep) {
                    Some(other) if other.is_dependent(key) => {}
                    _ => {
                        #[cfg(feature = "logging")]
                        log::error!("Dependency of task {} is not mirrored", task.id);
                        return false;
                    }
                }
            }
            for dep in task.dependents.iter() {
                match self.tasks.get(*dep) {
                    Some(other) if other.depends_on(key) => {}
                    _ => {
                        #[cfg(feature = "logging")]
                        log::error!("Dependent of task {} is not mirrored", task.id);
                        return false;
                    }
                }
            }
            if task.is_closed() && task.texture_resolve_task.is_some() {
                #[cfg(feature = "logging")]
                log::error!("Closed task {} has a pending resolve task", task.id);
                return false;
            }
        }

        self.topological_order().is_ok()
    }
}

pub(crate) fn task_is_instantiated(task: &RenderTask, proxies: &SlotMap<ProxyKey, SurfaceProxy>) -> bool {
    match task.target(0) {
        None => true,
        Some(target) => proxies
            .get(target)
            .map(|p| p.is_instantiated())
            .unwrap_or(false),
    }
}

impl<I: SurfaceTaskIndex> Display for RenderTaskGraph<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tasks: Vec<&RenderTask> = self.tasks.values().collect();
        tasks.sort_by_key(|t| t.id);

        for task in tasks {
            writeln!(f, "--------------------------------------------------------------")?;
            writeln!(
                f,
                "{} - renderTaskID: {}{}",
                task.name(),
                task.id,
                if task.is_closed() { " (closed)" } else { "" }
            )?;
            write!(f, "Targets:")?;
            for target in task.targets.iter() {
                match self.proxies.get(*target) {
                    Some(proxy) => write!(f, " {}", proxy.name())?,
                    None => write!(f, " <removed>")?,
                }
            }
            writeln!(f)?;

            write!(f, "I rely On ({}):", task.dependencies.len())?;
            for dep in task.dependencies.iter() {
                write!(f, " {}", self.tasks[*dep].id)?;
            }
            writeln!(f)?;

            write!(f, "({}) Rely On Me:", task.dependents.len())?;
            for dep in task.dependents.iter() {
                write!(f, " {}", self.tasks[*dep].id)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        IRect,
        tasks::{DrawTask, TransferTask},
    };
    use ahash::AHashMap;

    fn draw(graph: &mut RenderTaskGraph<impl SurfaceTaskIndex>, target: ProxyKey) -> TaskKey {
        let bounds = graph.proxy(target).unwrap().bounds();
        let task = graph.add_task(Box::new(DrawTask::new("draw", target, bounds)));
        graph.add_target(task, target);
        task
    }

    fn resolves<I: SurfaceTaskIndex>(graph: &RenderTaskGraph<I>, task: TaskKey) -> Vec<Resolve> {
        match &graph.tasks[task].ops {
            TaskOps::Resolve(ops) => ops.resolves().to_vec(),
            TaskOps::Task(_) => panic!("not a resolve task"),
        }
    }

    #[test]
    fn dependencies_are_mirrored() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let a = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        let b = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        graph.add_dependency(a, b);
        assert!(graph.depends_on(a, b));
        assert!(graph.is_dependent(b, a));
        assert!(!graph.depends_on(b, a));
        assert!(graph.validate());
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn reverse_edge_rejected() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let a = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        let b = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        graph.add_dependency(a, b);
        graph.add_dependency(b, a);
    }

    #[test]
    #[should_panic(expected = "Duplicate")]
    fn duplicate_edge_rejected() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let a = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        let b = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        graph.add_dependency(a, b);
        graph.add_dependency(a, b);
    }

    #[test]
    #[should_panic(expected = "closed")]
    fn closed_task_rejects_dependencies() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let a = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        let b = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        graph.make_closed(a);
        graph.add_dependency(a, b);
    }

    #[test]
    fn close_is_idempotent() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s = graph.create_proxy(ProxyDesc::render_target("s", 32, 32).with_samples(4));
        let t1 = draw(&mut graph, s);
        let t2 = graph.add_task(Box::new(TransferTask::new(s)));
        graph.add_surface_dependency(t2, s, Mipmapped::No);

        graph.make_closed(t2);
        let deps: Vec<_> = graph.task(t2).unwrap().dependencies().to_vec();
        let msaa = graph.proxy(s).unwrap().msaa_dirty_rect();
        graph.make_closed(t2);
        assert_eq!(graph.task(t2).unwrap().dependencies(), deps.as_slice());
        assert_eq!(graph.proxy(s).unwrap().msaa_dirty_rect(), msaa);
        assert!(graph.task(t2).unwrap().is_closed());
        assert!(graph.task(t1).unwrap().is_closed());
    }

    #[test]
    fn msaa_resolve_is_interposed() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s = graph.create_proxy(ProxyDesc::render_target("s", 64, 64).with_samples(4));
        let d = graph.create_proxy(ProxyDesc::render_target("d", 64, 64));
        let t1 = draw(&mut graph, s);
        let t2 = draw(&mut graph, d);

        //Closing t1 marks the MSAA content dirty.
        graph.add_surface_dependency(t2, s, Mipmapped::No);

        assert!(graph.task(t1).unwrap().is_closed());
        let r = graph.task(t2).unwrap().texture_resolve_task().unwrap();
        assert!(graph.task(r).unwrap().is_resolve_task());
        assert!(graph.depends_on(r, t1));
        assert_eq!(graph.index().last_task(s), Some(r));
        assert!(!graph.proxy(s).unwrap().is_msaa_dirty());
        assert!(!graph.depends_on(t2, t1));
        assert_eq!(
            resolves(&graph, r),
            vec![Resolve {
                proxy: s,
                flags: ResolveFlags::MSAA,
                msaa_rect: Some(IRect::from_wh(64, 64)),
            }]
        );

        graph.make_closed(t2);
        assert!(graph.depends_on(t2, r));
        assert!(graph.task(r).unwrap().is_closed());
        assert!(graph.task(t2).unwrap().texture_resolve_task().is_none());
        assert!(graph.validate());
    }

    #[test]
    fn resolve_task_is_shared_per_consumer() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let a = graph.create_proxy(ProxyDesc::render_target("a", 16, 16).with_samples(4));
        let b = graph.create_proxy(ProxyDesc::render_target("b", 16, 16).with_samples(4));
        let d = graph.create_proxy(ProxyDesc::render_target("d", 16, 16));
        let ta = draw(&mut graph, a);
        let tb = draw(&mut graph, b);
        let consumer = draw(&mut graph, d);

        graph.add_surface_dependency(consumer, a, Mipmapped::No);
        let r = graph.task(consumer).unwrap().texture_resolve_task().unwrap();
        graph.add_surface_dependency(consumer, b, Mipmapped::No);
        assert_eq!(graph.task(consumer).unwrap().texture_resolve_task(), Some(r));

        assert!(graph.depends_on(r, ta));
        assert!(graph.depends_on(r, tb));
        assert_eq!(resolves(&graph, r).len(), 2);
        assert_eq!(graph.task(r).unwrap().targets(), &[a, b]);
        //only one resolve task was created
        assert_eq!(graph.task_count(), 4);
    }

    #[test]
    fn reading_resolved_surface_again_is_noop() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s = graph.create_proxy(ProxyDesc::render_target("s", 16, 16).with_samples(4));
        let d = graph.create_proxy(ProxyDesc::render_target("d", 16, 16));
        draw(&mut graph, s);
        let consumer = draw(&mut graph, d);
        graph.add_surface_dependency(consumer, s, Mipmapped::No);
        graph.add_surface_dependency(consumer, s, Mipmapped::No);
        let r = graph.task(consumer).unwrap().texture_resolve_task().unwrap();
        assert_eq!(resolves(&graph, r).len(), 1);
    }

    #[test]
    fn closed_resolve_task_is_replaced() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let a = graph.create_proxy(ProxyDesc::render_target("a", 16, 16).with_samples(4));
        let b = graph.create_proxy(ProxyDesc::render_target("b", 16, 16).with_samples(4));
        let d = graph.create_proxy(ProxyDesc::render_target("d", 16, 16));
        draw(&mut graph, a);
        draw(&mut graph, b);
        let consumer = draw(&mut graph, d);

        graph.add_surface_dependency(consumer, a, Mipmapped::No);
        let first = graph.task(consumer).unwrap().texture_resolve_task().unwrap();

        //Another reader of `a` closes the resolve task.
        let reader = graph.add_task(Box::new(TransferTask::new(a)));
        graph.add_surface_dependency(reader, a, Mipmapped::No);
        assert!(graph.task(first).unwrap().is_closed());
        assert!(graph.depends_on(reader, first));

        graph.add_surface_dependency(consumer, b, Mipmapped::No);
        let second = graph.task(consumer).unwrap().texture_resolve_task().unwrap();
        assert_ne!(first, second);
        assert!(graph.depends_on(consumer, first));

        graph.make_closed(consumer);
        assert!(graph.depends_on(consumer, second));
        assert!(graph.validate());
    }

    #[test]
    fn mipmap_regeneration() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s = graph.create_proxy(ProxyDesc::render_target("s", 64, 64).with_mipmaps());
        let d = graph.create_proxy(ProxyDesc::render_target("d", 64, 64));
        let t1 = draw(&mut graph, s);

        //Non mip mapped reads don't need the chain
        let plain = graph.add_task(Box::new(TransferTask::new(s)));
        graph.add_surface_dependency(plain, s, Mipmapped::No);
        assert!(graph.depends_on(plain, t1));
        assert!(graph.task(plain).unwrap().texture_resolve_task().is_none());
        assert!(graph.proxy(s).unwrap().mipmaps_are_dirty());

        let t2 = draw(&mut graph, d);
        graph.add_surface_dependency(t2, s, Mipmapped::Yes);
        let r = graph.task(t2).unwrap().texture_resolve_task().unwrap();
        assert_eq!(resolves(&graph, r)[0].flags, ResolveFlags::MIPMAPS);
        assert_eq!(resolves(&graph, r)[0].msaa_rect, None);
        assert!(!graph.proxy(s).unwrap().mipmaps_are_dirty());
        assert_eq!(graph.index().last_task(s), Some(r));
    }

    #[test]
    fn mipmap_request_downgraded() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s = graph.create_proxy(ProxyDesc::render_target("s", 64, 64));
        let t1 = draw(&mut graph, s);
        let t2 = graph.add_task(Box::new(TransferTask::new(s)));
        graph.add_surface_dependency(t2, s, Mipmapped::Yes);
        assert!(graph.depends_on(t2, t1));
        assert!(graph.task(t2).unwrap().texture_resolve_task().is_none());
    }

    #[test]
    fn automatic_msaa_needs_no_resolve() {
        let mut graph = RenderTaskGraph::new(Caps {
            msaa_resolves_automatically: true,
            ..Default::default()
        });
        let s = graph.create_proxy(ProxyDesc::render_target("s", 64, 64).with_samples(4));
        let t1 = draw(&mut graph, s);
        let t2 = graph.add_task(Box::new(TransferTask::new(s)));
        graph.add_surface_dependency(t2, s, Mipmapped::No);
        assert!(graph.depends_on(t2, t1));
        assert!(graph.task(t2).unwrap().texture_resolve_task().is_none());
    }

    #[test]
    fn self_read_adds_nothing() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s = graph.create_proxy(ProxyDesc::render_target("s", 64, 64));
        let t = draw(&mut graph, s);
        graph.add_surface_dependency(t, s, Mipmapped::No);
        assert!(graph.task(t).unwrap().dependencies().is_empty());
        assert!(!graph.task(t).unwrap().is_closed());
    }

    #[test]
    #[should_panic(expected = "multisampled")]
    fn self_read_of_msaa_target_panics() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s = graph.create_proxy(ProxyDesc::render_target("s", 64, 64).with_samples(4));
        let t = draw(&mut graph, s);
        graph.add_surface_dependency(t, s, Mipmapped::No);
    }

    #[test]
    fn deferred_proxies_are_recorded() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let tex = graph.create_proxy(ProxyDesc::texture("upload", 8, 8).deferred());
        let d = graph.create_proxy(ProxyDesc::render_target("d", 8, 8));
        let t = draw(&mut graph, d);
        graph.add_surface_dependency(t, tex, Mipmapped::No);
        graph.add_surface_dependency(t, tex, Mipmapped::No);
        assert_eq!(graph.task(t).unwrap().deferred_proxies(), &[tex]);
        assert!(graph.task(t).unwrap().dependencies().is_empty());
        assert!(!graph.deferred_proxies_are_instantiated(t));
        graph.instantiate_proxy(tex);
        assert!(graph.deferred_proxies_are_instantiated(t));
    }

    #[test]
    fn closing_cascades_to_resolve_task() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s0 = graph.create_proxy(ProxyDesc::render_target("s0", 16, 16).with_samples(4));
        let s1 = graph.create_proxy(ProxyDesc::render_target("s1", 16, 16));
        draw(&mut graph, s0);
        let t1 = draw(&mut graph, s1);
        graph.add_surface_dependency(t1, s0, Mipmapped::No);
        let r = graph.task(t1).unwrap().texture_resolve_task().unwrap();
        assert!(!graph.task(r).unwrap().is_closed());

        //Reading t1's output closes t1, and with it the resolve task.
        let t2 = graph.add_task(Box::new(TransferTask::new(s1)));
        graph.add_surface_dependency(t2, s1, Mipmapped::No);
        assert!(graph.task(r).unwrap().is_closed());
        assert!(graph.depends_on(t1, r));
        assert!(graph.depends_on(t2, t1));
    }

    #[test]
    fn close_dependents() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s = graph.create_proxy(ProxyDesc::render_target("s", 16, 16));
        let t1 = draw(&mut graph, s);
        let a = graph.add_task(Box::new(TransferTask::new(s)));
        let b = graph.add_task(Box::new(TransferTask::new(s)));
        graph.add_surface_dependency(a, s, Mipmapped::No);
        graph.add_surface_dependency(b, s, Mipmapped::No);
        assert!(!graph.task(a).unwrap().is_closed());

        graph.close_those_who_depend_on_me(t1);
        assert!(graph.task(a).unwrap().is_closed());
        assert!(graph.task(b).unwrap().is_closed());
    }

    #[test]
    fn dependencies_from_other_task() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let a = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        let b = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        let other = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        let task = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        graph.add_dependency(other, a);
        graph.add_dependency(other, b);
        graph.add_dependency(task, a);

        graph.add_dependencies_from_other_task(task, other);
        assert!(graph.depends_on(task, a));
        assert!(graph.depends_on(task, b));
        assert_eq!(graph.task(task).unwrap().dependencies().len(), 2);
    }

    #[test]
    fn instantiation() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s = graph.create_proxy(ProxyDesc::render_target("s", 16, 16));
        let t = draw(&mut graph, s);
        let transfer = graph.add_task(Box::new(TransferTask::new(s)));
        assert!(!graph.is_instantiated(t));
        assert!(graph.is_instantiated(transfer));
        graph.instantiate_proxy(s);
        assert!(graph.is_instantiated(t));
    }

    #[derive(Default)]
    struct RecordingIndex {
        map: AHashMap<ProxyKey, TaskKey>,
        clears: usize,
    }

    impl SurfaceTaskIndex for RecordingIndex {
        fn last_task(&self, proxy: ProxyKey) -> Option<TaskKey> {
            self.map.get(&proxy).copied()
        }
        fn set_last_task(&mut self, proxy: ProxyKey, task: Option<TaskKey>) {
            match task {
                Some(task) => {
                    self.map.insert(proxy, task);
                }
                None => {
                    self.clears += 1;
                    self.map.remove(&proxy);
                }
            }
        }
    }

    #[test]
    fn disown_clears_own_entries() {
        let mut graph = RenderTaskGraph::with_index(
            Caps::default(),
            RecordingIndex::default(),
            Box::new(DefaultResolveManager),
        );
        let s = graph.create_proxy(ProxyDesc::render_target("s", 16, 16));
        let t1 = draw(&mut graph, s);
        graph.make_closed(t1);
        let t2 = draw(&mut graph, s);

        //t2 is the last task of s now, disowning t1 must keep it.
        graph.disown(t1);
        assert_eq!(graph.index().last_task(s), Some(t2));
        assert_eq!(graph.index().clears, 0);
        assert!(graph.task(t1).unwrap().is_disowned());

        graph.make_closed(t2);
        graph.disown(t2);
        graph.disown(t2);
        assert_eq!(graph.index().last_task(s), None);
        assert_eq!(graph.index().clears, 1);
    }

    #[test]
    #[should_panic(expected = "open task")]
    fn disown_requires_close() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let t = graph.add_task(Box::new(TransferTask::new(ProxyKey::default())));
        graph.disown(t);
    }

    #[test]
    fn dump() {
        let mut graph = RenderTaskGraph::new(Caps::default());
        let s = graph.create_proxy(ProxyDesc::render_target("surface-s", 16, 16));
        let t1 = draw(&mut graph, s);
        let t2 = graph.add_task(Box::new(TransferTask::new(s)));
        graph.add_surface_dependency(t2, s, Mipmapped::No);

        let dump = graph.to_string();
        assert!(dump.contains(&format!("draw - renderTaskID: {} (closed)", graph.task(t1).unwrap().id())));
        assert!(dump.contains("Targets: surface-s"));
        assert!(dump.contains("I rely On (1):"));
        assert!(dump.contains("(1) Rely On Me:"));
    }
}
