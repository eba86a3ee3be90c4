use ahash::AHashMap;

use crate::{ProxyKey, TaskKey};

///Maps a surface to the task that wrote it last.
///
/// Owned by whoever drives the graph (usually a drawing manager). The graph reads it to find producers, and updates it
/// when tasks target a surface or are disowned.
pub trait SurfaceTaskIndex {
    fn last_task(&self, proxy: ProxyKey) -> Option<TaskKey>;
    ///Sets the last task of `proxy`. `None` clears the entry.
    fn set_last_task(&mut self, proxy: ProxyKey, task: Option<TaskKey>);
}

///Hash map based [SurfaceTaskIndex].
#[derive(Debug, Default)]
pub struct LastTaskMap {
    map: AHashMap<ProxyKey, TaskKey>,
}

impl LastTaskMap {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl SurfaceTaskIndex for LastTaskMap {
    fn last_task(&self, proxy: ProxyKey) -> Option<TaskKey> {
        self.map.get(&proxy).copied()
    }

    fn set_last_task(&mut self, proxy: ProxyKey, task: Option<TaskKey>) {
        match task {
            Some(task) => {
                self.map.insert(proxy, task);
            }
            None => {
                self.map.remove(&proxy);
            }
        }
    }
}
