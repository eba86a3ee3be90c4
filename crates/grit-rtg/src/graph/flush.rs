use std::{cmp::Reverse, collections::BinaryHeap};

use grit::{ProviderError, ResourceProvider};
use slotmap::{SecondaryMap, SlotMap};
use thiserror::Error;

use super::{RenderTaskGraph, task_is_instantiated};
use crate::{Caps, ProxyKey, SurfaceProxy, SurfaceTaskIndex, TaskId, TaskKey};

#[derive(Error, Debug)]
pub enum FlushError {
    #[error("Resource provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("Render task graph contains a cycle, {0} tasks could not be ordered")]
    Cycle(usize),
    #[error("Task {task} failed: {reason}")]
    TaskFailed { task: String, reason: String },
}

///State lent to tasks while they are prepared and executed.
pub struct FlushState<'a> {
    pub provider: &'a mut ResourceProvider,
    pub caps: &'a Caps,
    proxies: &'a SlotMap<ProxyKey, SurfaceProxy>,
    uploads: Vec<ProxyKey>,
    current: TaskId,
}

impl<'a> FlushState<'a> {
    pub fn proxy(&self, proxy: ProxyKey) -> Option<&SurfaceProxy> {
        self.proxies.get(proxy)
    }

    ///Schedules the upload of a deferred proxy. Returns false if the upload was scheduled already.
    pub fn schedule_upload(&mut self, proxy: ProxyKey) -> bool {
        if self.uploads.contains(&proxy) {
            return false;
        }
        #[cfg(feature = "logging")]
        log::trace!(
            "Task {} schedules upload of {}",
            self.current,
            self.proxies.get(proxy).map(|p| p.name()).unwrap_or("<removed>")
        );
        self.uploads.push(proxy);
        true
    }

    pub fn uploads(&self) -> &[ProxyKey] {
        &self.uploads
    }

    ///Id of the task that is currently prepared or executed.
    pub fn current_task(&self) -> TaskId {
        self.current
    }
}

///Outcome of a [flush](RenderTaskGraph::flush).
#[derive(Debug, Default)]
pub struct FlushReport {
    ///All flushed tasks in execution order.
    pub order: Vec<TaskId>,
    pub executed: Vec<TaskId>,
    ///Tasks whose target was not instantiated.
    pub skipped: Vec<TaskId>,
    pub failed: Vec<(TaskId, FlushError)>,
    ///Deferred proxies whose upload was scheduled.
    pub uploads: Vec<ProxyKey>,
}

impl<I: SurfaceTaskIndex> RenderTaskGraph<I> {
    ///Returns all tasks ordered such that every task comes after the tasks it depends on. Independent tasks keep their
    /// creation order.
    pub fn topological_order(&self) -> Result<Vec<TaskKey>, FlushError> {
        let mut in_degree = SecondaryMap::<TaskKey, usize>::with_capacity(self.tasks.len());
        let mut ready = BinaryHeap::new();
        for (key, task) in self.tasks.iter() {
            in_degree.insert(key, task.dependencies.len());
            if task.dependencies.is_empty() {
                ready.push(Reverse((task.id, key)));
            }
        }

        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(Reverse((_, key))) = ready.pop() {
            order.push(key);
            for dependent in self.tasks[key].dependents.iter() {
                let degree = &mut in_degree[*dependent];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse((self.tasks[*dependent].id, *dependent)));
                }
            }
        }

        if order.len() != self.tasks.len() {
            #[cfg(feature = "logging")]
            log::error!("Render task graph contains a cycle:\n{}", self);
            return Err(FlushError::Cycle(self.tasks.len() - order.len()));
        }
        Ok(order)
    }

    ///Closes, orders, prepares and executes all tasks. Afterwards all tasks are disowned and removed from the graph,
    /// and the provider recycles the command pools whose work finished.
    ///
    /// Tasks whose target is not instantiated are skipped. A failing task does not stop the flush, its error is part of
    /// the returned report.
    pub fn flush(&mut self, provider: &mut ResourceProvider) -> Result<FlushReport, FlushError> {
        #[cfg(feature = "profiling")]
        puffin::profile_function!();

        if !provider.is_live() {
            return Err(ProviderError::TornDown.into());
        }

        let mut creation_order: Vec<(TaskId, TaskKey)> =
            self.tasks.iter().map(|(k, t)| (t.id, k)).collect();
        creation_order.sort();
        for (_, key) in creation_order {
            self.make_closed(key);
        }

        let order = self.topological_order()?;
        let mut report = FlushReport {
            order: order.iter().map(|k| self.tasks[*k].id).collect(),
            ..Default::default()
        };

        #[cfg(feature = "logging")]
        log::debug!("Flushing {} tasks: {:?}", order.len(), report.order);

        {
            let RenderTaskGraph {
                tasks,
                proxies,
                caps,
                ..
            } = self;
            let mut state = FlushState {
                provider: &mut *provider,
                caps,
                proxies,
                uploads: Vec::new(),
                current: TaskId::INVALID,
            };

            {
                #[cfg(feature = "profiling")]
                puffin::profile_scope!("prepare");

                for key in order.iter() {
                    let task = &mut tasks[*key];
                    state.current = task.id;
                    for proxy in task.deferred_proxies.iter() {
                        state.schedule_upload(*proxy);
                    }
                    task.ops.on_prepare(&mut state);
                }
            }

            {
                #[cfg(feature = "profiling")]
                puffin::profile_scope!("execute");

                for key in order.iter() {
                    let task = &mut tasks[*key];
                    if !task_is_instantiated(task, state.proxies) {
                        #[cfg(feature = "logging")]
                        log::warn!(
                            "Skipping task {} [{}], its target is not instantiated",
                            task.id,
                            task.name()
                        );
                        report.skipped.push(task.id);
                        continue;
                    }

                    state.current = task.id;
                    match task.ops.on_execute(&mut state) {
                        Ok(()) => report.executed.push(task.id),
                        Err(e) => {
                            #[cfg(feature = "logging")]
                            log::error!("Task {} [{}] failed: {}", task.id, task.name(), e);
                            report.failed.push((task.id, e));
                        }
                    }
                }
            }

            report.uploads = state.uploads;
        }

        for key in order.iter() {
            self.disown(*key);
        }
        self.tasks.clear();

        provider.check_command_buffers();
        Ok(report)
    }
}
