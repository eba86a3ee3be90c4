use smallvec::SmallVec;

use super::{FpId, FpTree};

///Color and coverage processors of a draw. Color processors run first.
#[derive(Debug, Clone, Default)]
pub struct ProcessorSet {
    pub color: SmallVec<[FpId; 2]>,
    pub coverage: SmallVec<[FpId; 2]>,
}

impl ProcessorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, fp: FpId) -> Self {
        self.color.push(fp);
        self
    }

    pub fn with_coverage(mut self, fp: FpId) -> Self {
        self.coverage.push(fp);
        self
    }

    pub fn len(&self) -> usize {
        self.color.len() + self.coverage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn roots(&self) -> SmallVec<[FpId; 4]> {
        self.color
            .iter()
            .chain(self.coverage.iter())
            .copied()
            .collect()
    }
}

///Stack based pre-order traversal. Several roots behave like the children of a virtual root.
pub struct PreOrder<'a> {
    tree: &'a FpTree,
    stack: SmallVec<[FpId; 8]>,
}

impl<'a> PreOrder<'a> {
    pub(crate) fn new(tree: &'a FpTree, roots: &[FpId]) -> Self {
        PreOrder {
            tree,
            stack: roots.iter().rev().copied().collect(),
        }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = FpId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;
            //Unknown ids are skipped.
            if let Some(node) = self.tree.nodes.get(id) {
                self.stack.extend(node.children.iter().rev().copied());
                return Some(id);
            }
        }
    }
}
