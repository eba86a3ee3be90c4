use std::sync::Arc;

use ahash::AHashMap;

use crate::resources::{PipelineDesc, PipelineState};

///Hash map of pipeline states, with hit statistics.
#[derive(Default)]
pub(crate) struct PipelineStateCache {
    pub(crate) map: AHashMap<PipelineDesc, Arc<PipelineState>>,
    pub(crate) hits: u64,
    pub(crate) misses: u64,
}

impl PipelineStateCache {
    pub(crate) fn get(&mut self, desc: &PipelineDesc) -> Option<Arc<PipelineState>> {
        match self.map.get(desc) {
            Some(state) => {
                self.hits += 1;
                Some(state.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub(crate) fn insert(&mut self, state: Arc<PipelineState>) {
        self.map.insert(state.desc.clone(), state);
    }
}
