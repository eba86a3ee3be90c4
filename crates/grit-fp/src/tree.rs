use std::fmt::Write;

use grit_rtg::{Mipmapped, ProxyKey};
use slotmap::SlotMap;
use smallvec::{SmallVec, smallvec};

use crate::{
    Color, Effect, FlagClass, KeyBuilder, MatrixKind, OptimizationFlags, ProcessorKey,
    PropagatedFlags, RequiredFeatures, SampleMatrix,
};

mod iter;
pub use iter::{PreOrder, ProcessorSet};

slotmap::new_key_type!(
    ///Handle to a node of a [FpTree].
    pub struct FpId;
);

pub struct FpNode {
    effect: Box<dyn Effect>,
    parent: Option<FpId>,
    children: SmallVec<[FpId; 2]>,
    flags: PropagatedFlags,
    ///How the parent samples this node.
    sample_matrix: SampleMatrix,
    ///True if this node was registered with explicit coordinates. In contrast to the propagated flag this is not set for
    /// descendants.
    registered_explicitly: bool,
    required_features: RequiredFeatures,
}

impl FpNode {
    pub fn effect(&self) -> &dyn Effect {
        self.effect.as_ref()
    }

    pub fn name(&self) -> &'static str {
        self.effect.name()
    }

    pub fn parent(&self) -> Option<FpId> {
        self.parent
    }

    pub fn children(&self) -> &[FpId] {
        &self.children
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn flags(&self) -> PropagatedFlags {
        self.flags
    }

    pub fn sample_matrix(&self) -> SampleMatrix {
        self.sample_matrix
    }

    pub fn required_features(&self) -> RequiredFeatures {
        self.required_features
    }

    pub fn is_sampled_with_explicit_coords(&self) -> bool {
        self.flags
            .contains(PropagatedFlags::SAMPLED_WITH_EXPLICIT_COORDS)
    }

    pub fn net_transform_has_perspective(&self) -> bool {
        self.flags
            .contains(PropagatedFlags::NET_TRANSFORM_HAS_PERSPECTIVE)
    }

    pub fn uses_sample_coords_directly(&self) -> bool {
        self.flags
            .contains(PropagatedFlags::USES_SAMPLE_COORDS_DIRECTLY)
    }

    ///True if the node's own code reads the sample coordinates, or the node carries coordinate transforms. Independent of
    /// how the node is composed into a tree.
    pub fn references_sample_coords(&self) -> bool {
        self.uses_sample_coords_directly() || !self.effect.coord_transforms().is_empty()
    }

    ///True if this node or a descendant reads coordinates that are derived from the local coordinates of the draw.
    pub fn sample_coords_depend_on_local_coords(&self) -> bool {
        self.flags.intersects(
            PropagatedFlags::HAS_COORD_TRANSFORMS
                | PropagatedFlags::USES_SAMPLE_COORDS_DIRECTLY
                | PropagatedFlags::USES_SAMPLE_COORDS_INDIRECTLY,
        ) && !self.is_sampled_with_explicit_coords()
    }

    fn uses_sample_coords(&self) -> bool {
        self.flags.intersects(
            PropagatedFlags::USES_SAMPLE_COORDS_DIRECTLY
                | PropagatedFlags::USES_SAMPLE_COORDS_INDIRECTLY,
        )
    }

    pub fn has_coord_transforms(&self) -> bool {
        self.flags.contains(PropagatedFlags::HAS_COORD_TRANSFORMS)
    }
}

///Arena of fragment processor nodes. Holds any number of trees.
#[derive(Default)]
pub struct FpTree {
    nodes: SlotMap<FpId, FpNode>,
}

impl FpTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    ///Adds an unparented node.
    pub fn add(&mut self, effect: Box<dyn Effect>) -> FpId {
        let mut flags = PropagatedFlags::empty();
        if effect.uses_sample_coords() {
            flags |= PropagatedFlags::USES_SAMPLE_COORDS_DIRECTLY;
        }
        if !effect.coord_transforms().is_empty() {
            flags |= PropagatedFlags::HAS_COORD_TRANSFORMS;
        }
        let required_features = effect.required_features();

        self.nodes.insert(FpNode {
            effect,
            parent: None,
            children: SmallVec::new(),
            flags,
            sample_matrix: SampleMatrix::NONE,
            registered_explicitly: false,
            required_features,
        })
    }

    pub fn node(&self, id: FpId) -> Option<&FpNode> {
        self.nodes.get(id)
    }

    pub fn child(&self, id: FpId, index: usize) -> Option<FpId> {
        self.nodes.get(id)?.children.get(index).copied()
    }

    ///Registers `child` to be sampled by `parent` through `matrix`. Returns the child's index.
    ///
    /// # Panics
    ///
    /// If either node is registered already, or if `child` already carries a sample matrix, explicit sampling or perspective.
    pub fn register_child(&mut self, parent: FpId, child: FpId, matrix: SampleMatrix) -> usize {
        self.register(parent, child, matrix, false)
    }

    ///Registers `child` to be sampled at coordinates computed by `parent`. Returns the child's index. Panics like
    /// [register_child](Self::register_child).
    pub fn register_explicitly_sampled_child(&mut self, parent: FpId, child: FpId) -> usize {
        self.register(parent, child, SampleMatrix::NONE, true)
    }

    fn register(&mut self, parent: FpId, child: FpId, matrix: SampleMatrix, explicit: bool) -> usize {
        assert!(parent != child, "Processor can not be registered as its own child");
        assert!(
            self.nodes.contains_key(parent) && self.nodes.contains_key(child),
            "Unknown processor"
        );
        {
            let c = &self.nodes[child];
            assert!(c.parent.is_none(), "Processor {} already has a parent", c.name());
            assert!(
                c.sample_matrix.is_none(),
                "Processor {} already has a sample matrix",
                c.name()
            );
            assert!(
                !c.flags.intersects(PropagatedFlags::of_class(FlagClass::Downward)),
                "Processor {} already carries explicit sampling or perspective",
                c.name()
            );
            let p = &self.nodes[parent];
            assert!(
                p.parent.is_none(),
                "Processor {} is registered already, its children can not change",
                p.name()
            );
        }

        if explicit {
            self.push_down(child, PropagatedFlags::SAMPLED_WITH_EXPLICIT_COORDS);
            self.nodes[child].registered_explicitly = true;
        }

        if !matrix.is_none() {
            self.nodes[child].sample_matrix = matrix;
            //The parent evaluates the matrix, so the child is effectively sampled explicitly.
            if matrix.kind == MatrixKind::Variable {
                self.push_down(child, PropagatedFlags::SAMPLED_WITH_EXPLICIT_COORDS);
                self.nodes[parent].flags |= PropagatedFlags::USES_SAMPLE_COORDS_DIRECTLY;
            }
            if matrix.has_perspective {
                self.push_down(child, PropagatedFlags::NET_TRANSFORM_HAS_PERSPECTIVE);
            }
        }

        self.nodes[child].parent = Some(parent);
        self.propagate_up(child);

        let features = self.nodes[child].required_features;
        let p = &mut self.nodes[parent];
        p.required_features |= features;
        p.children.push(child);

        #[cfg(feature = "logging")]
        log::trace!(
            "Registered {} as child {} of {} (matrix: {:?}, explicit: {})",
            self.nodes[child].name(),
            self.nodes[parent].children.len() - 1,
            self.nodes[parent].name(),
            matrix,
            explicit
        );

        self.nodes[parent].children.len() - 1
    }

    ///Sets `flag` on `root` and its whole subtree. Stops at nodes that carry the flag already.
    fn push_down(&mut self, root: FpId, flag: PropagatedFlags) {
        debug_assert_eq!(flag.class(), Some(FlagClass::Downward));
        let mut stack: SmallVec<[FpId; 8]> = smallvec![root];
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id];
            if node.flags.contains(flag) {
                continue;
            }
            node.flags.insert(flag);
            stack.extend(node.children.iter().copied());
        }
    }

    ///Walks from `from` towards the root and merges upward flags into each parent. Explicitly sampled nodes absorb.
    fn propagate_up(&mut self, from: FpId) {
        let mut node = from;
        while let Some(parent) = self.nodes[node].parent {
            let child = &self.nodes[node];
            if child.is_sampled_with_explicit_coords() {
                break;
            }
            let mut up = child.flags & PropagatedFlags::HAS_COORD_TRANSFORMS;
            if child.uses_sample_coords() {
                up |= PropagatedFlags::USES_SAMPLE_COORDS_INDIRECTLY;
            }

            let flags = &mut self.nodes[parent].flags;
            if flags.contains(up) {
                break;
            }
            flags.insert(up);
            node = parent;
        }
    }

    ///Deep copies the subtree at `src`. The copy is unparented and its children are registered the same way as the originals.
    pub fn clone_subtree(&mut self, src: FpId) -> FpId {
        let effect = self.nodes[src].effect.clone_effect();
        let dst = self.add(effect);
        self.clone_and_register_all_children(dst, src);
        dst
    }

    ///Clones `src_child` and registers the clone on `dst` with the sampling of `src_child`.
    pub fn clone_and_register_child(&mut self, dst: FpId, src_child: FpId) -> usize {
        let (matrix, explicit) = {
            let node = &self.nodes[src_child];
            (node.sample_matrix, node.registered_explicitly)
        };
        let clone = self.clone_subtree(src_child);
        self.register(dst, clone, matrix, explicit)
    }

    ///Clones all children of `src` onto `dst`, which must not have children yet.
    pub fn clone_and_register_all_children(&mut self, dst: FpId, src: FpId) {
        assert!(
            self.nodes[dst].children.is_empty(),
            "Processor {} has children already",
            self.nodes[dst].name()
        );
        let children = self.nodes[src].children.clone();
        for child in children {
            self.clone_and_register_child(dst, child);
        }
    }

    ///Structural equality of the trees at `a` and `b`: same effect types, samplers, coordinate transforms, effect state and
    /// recursively equal children.
    pub fn is_equal(&self, a: FpId, b: FpId) -> bool {
        let mut stack: SmallVec<[(FpId, FpId); 8]> = smallvec![(a, b)];
        while let Some((a, b)) = stack.pop() {
            let (Some(na), Some(nb)) = (self.nodes.get(a), self.nodes.get(b)) else {
                return false;
            };
            if !Self::shallow_equal(na, nb) || na.children.len() != nb.children.len() {
                return false;
            }
            stack.extend(na.children.iter().copied().zip(nb.children.iter().copied()));
        }
        true
    }

    fn shallow_equal(a: &FpNode, b: &FpNode) -> bool {
        let (ea, eb) = (a.effect(), b.effect());
        ea.as_any().type_id() == eb.as_any().type_id()
            && ea.samplers() == eb.samplers()
            && ea.coord_transforms() == eb.coord_transforms()
            && ea.on_is_equal(eb)
    }

    ///Pre-order iterator over the tree at `root`.
    pub fn iter(&self, root: FpId) -> PreOrder<'_> {
        PreOrder::new(self, &[root])
    }

    ///Pre-order iterator over several trees, visited in the order of `roots`.
    pub fn iter_roots(&self, roots: &[FpId]) -> PreOrder<'_> {
        PreOrder::new(self, roots)
    }

    ///Iterates the color processors of `set`, then its coverage processors.
    pub fn iter_set(&self, set: &ProcessorSet) -> PreOrder<'_> {
        PreOrder::new(self, &set.roots())
    }

    ///Calls `f` for every texture sampled in the tree at `root`, with whether the sampler reads mip maps.
    pub fn visit_proxies(&self, root: FpId, mut f: impl FnMut(ProxyKey, Mipmapped)) {
        for id in self.iter(root) {
            for sampler in self.nodes[id].effect.samplers() {
                let mipmapped = if sampler.state.filter.is_mipmapped() {
                    Mipmapped::Yes
                } else {
                    Mipmapped::No
                };
                f(sampler.proxy, mipmapped);
            }
        }
    }

    ///Key of the code generated for the tree at `root`.
    pub fn processor_key(&self, root: FpId) -> ProcessorKey {
        let mut key = KeyBuilder::default();
        for id in self.iter(root) {
            let node = &self.nodes[id];
            key.add32(node.effect.class_id());
            key.add32(
                ((node.children.len() as u32) << 16)
                    | ((node.effect.samplers().len() as u32) << 8)
                    | (node.sample_matrix.key_bits() << 1)
                    | node.registered_explicitly as u32,
            );
            for sampler in node.effect.samplers() {
                key.add_sampler(sampler);
            }
            node.effect.add_to_key(&mut key);
        }
        key.finish()
    }

    ///Optimizations the tree at `root` allows.
    pub fn optimization_flags(&self, root: FpId) -> OptimizationFlags {
        let Some(node) = self.nodes.get(root) else {
            return OptimizationFlags::empty();
        };
        let children: SmallVec<[OptimizationFlags; 4]> = node
            .children
            .iter()
            .map(|c| self.optimization_flags(*c))
            .collect();
        node.effect.optimization_flags(&children)
    }

    ///Output of the tree at `root` for the constant `input`, or `None` if it can not be computed on the CPU.
    pub fn constant_output_for_constant_input(&self, root: FpId, input: Color) -> Option<Color> {
        if !self
            .optimization_flags(root)
            .contains(OptimizationFlags::CONSTANT_OUTPUT_FOR_CONSTANT_INPUT)
        {
            return None;
        }
        let node = self.nodes.get(root)?;
        let mut child = |index: usize, input: Color| {
            node.children
                .get(index)
                .and_then(|c| self.constant_output_for_constant_input(*c, input))
        };
        node.effect.constant_output(input, &mut child)
    }

    ///Human readable listing of the tree at `root`, one node per line.
    pub fn dump(&self, root: FpId) -> String {
        let mut out = String::new();
        let mut stack: SmallVec<[(FpId, usize); 8]> = smallvec![(root, 0)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let _ = writeln!(
                out,
                "{:indent$}{} {:?}",
                "",
                node.name(),
                node.flags,
                indent = depth * 2
            );
            stack.extend(node.children.iter().rev().map(|c| (*c, depth + 1)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use grit::resources::{Filter, SamplerState, WrapMode};
    use slotmap::SlotMap as ProxyMap;

    use super::*;
    use crate::{
        Matrix, shallow_eq,
        effects::{
            ConstColor, ExplicitSampleEffect, InputMode, MatrixEffect, PremulEffect, Swizzle,
            SwizzleEffect, TextureEffect, run_in_series,
        },
    };

    #[derive(Clone, PartialEq)]
    struct Node {
        features: RequiredFeatures,
    }

    impl Effect for Node {
        fn name(&self) -> &'static str {
            "Node"
        }
        fn class_id(&self) -> u32 {
            100
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn clone_effect(&self) -> Box<dyn Effect> {
            Box::new(self.clone())
        }
        fn on_is_equal(&self, other: &dyn Effect) -> bool {
            shallow_eq(self, other)
        }
        fn required_features(&self) -> RequiredFeatures {
            self.features
        }
    }

    fn node(tree: &mut FpTree) -> FpId {
        tree.add(Box::new(Node {
            features: RequiredFeatures::empty(),
        }))
    }

    fn proxies(n: usize) -> Vec<ProxyKey> {
        let mut map = ProxyMap::<ProxyKey, ()>::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn texture(tree: &mut FpTree, proxy: ProxyKey) -> FpId {
        TextureEffect::make(
            tree,
            proxy,
            SamplerState::new(Filter::Linear, WrapMode::Clamp),
            Matrix::IDENTITY,
        )
    }

    #[test]
    fn every_non_root_has_one_parent() {
        let p = proxies(1);
        let mut tree = FpTree::new();
        let tex = texture(&mut tree, p[0]);
        let swizzle = SwizzleEffect::make(&mut tree, tex, Swizzle::AAAA);
        let premul = PremulEffect::make(&mut tree, swizzle);
        let color = ConstColor::make(&mut tree, Color::WHITE, InputMode::Ignore);
        let root = run_in_series(&mut tree, &[premul, color]).unwrap();

        assert_eq!(tree.len(), 5);
        let parented = tree.iter(root).filter(|id| tree.node(*id).unwrap().parent().is_some()).count();
        assert_eq!(parented, tree.len() - 1);
        assert_eq!(tree.node(root).unwrap().parent(), None);
        assert_eq!(tree.node(tex).unwrap().parent(), Some(swizzle));
        assert_eq!(tree.child(root, 1), Some(color));
    }

    #[test]
    #[should_panic(expected = "already has a parent")]
    fn register_twice_panics() {
        let mut tree = FpTree::new();
        let a = node(&mut tree);
        let b = node(&mut tree);
        let c = node(&mut tree);
        tree.register_child(a, c, SampleMatrix::NONE);
        tree.register_child(b, c, SampleMatrix::NONE);
    }

    #[test]
    #[should_panic(expected = "is registered already")]
    fn registered_parent_is_immutable() {
        let mut tree = FpTree::new();
        let root = node(&mut tree);
        let a = node(&mut tree);
        let b = node(&mut tree);
        tree.register_child(root, a, SampleMatrix::NONE);
        tree.register_child(a, b, SampleMatrix::NONE);
    }

    #[test]
    #[should_panic(expected = "own child")]
    fn self_registration_panics() {
        let mut tree = FpTree::new();
        let a = node(&mut tree);
        tree.register_child(a, a, SampleMatrix::NONE);
    }

    #[test]
    fn explicit_sampling_absorbs_coord_usage() {
        let p = proxies(2);
        let mut tree = FpTree::new();

        //R -> C (explicit) -> G
        let g = texture(&mut tree, p[0]);
        let c = node(&mut tree);
        tree.register_explicitly_sampled_child(c, g);
        let r = node(&mut tree);
        tree.register_child(r, c, SampleMatrix::NONE);

        let gn = tree.node(g).unwrap();
        assert!(gn.is_sampled_with_explicit_coords());
        assert!(gn.uses_sample_coords_directly());
        assert!(!gn.sample_coords_depend_on_local_coords());
        assert!(!tree.node(c).unwrap().references_sample_coords());
        assert!(!tree.node(r).unwrap().references_sample_coords());
        assert!(!tree.node(r).unwrap().has_coord_transforms());
        assert!(!tree.node(r).unwrap().sample_coords_depend_on_local_coords());

        //Same tree without explicit sampling.
        let g = texture(&mut tree, p[1]);
        let c = node(&mut tree);
        tree.register_child(c, g, SampleMatrix::NONE);
        let r = node(&mut tree);
        tree.register_child(r, c, SampleMatrix::NONE);

        for id in [c, r] {
            let n = tree.node(id).unwrap();
            assert!(n.flags().contains(PropagatedFlags::USES_SAMPLE_COORDS_INDIRECTLY));
            assert!(!n.uses_sample_coords_directly());
            assert!(n.has_coord_transforms());
            assert!(n.sample_coords_depend_on_local_coords());
        }
    }

    #[test]
    fn explicit_sampling_reaches_whole_subtree() {
        let p = proxies(1);
        let mut tree = FpTree::new();
        let tex = texture(&mut tree, p[0]);
        let scaled = MatrixEffect::make(&mut tree, Matrix::scale(2.0, 2.0), tex);
        let root = ExplicitSampleEffect::make(&mut tree, scaled, [0.5, 0.0]);

        assert!(tree.node(scaled).unwrap().is_sampled_with_explicit_coords());
        assert!(tree.node(tex).unwrap().is_sampled_with_explicit_coords());
        assert!(!tree.node(root).unwrap().is_sampled_with_explicit_coords());
        assert!(tree.node(root).unwrap().uses_sample_coords_directly());
        assert!(
            !tree
                .node(root)
                .unwrap()
                .flags()
                .contains(PropagatedFlags::USES_SAMPLE_COORDS_INDIRECTLY)
        );
        assert_eq!(
            tree.node(tex).unwrap().sample_matrix(),
            SampleMatrix::constant_or_uniform(false)
        );
    }

    #[test]
    fn perspective_is_pushed_down() {
        let p = proxies(1);
        let mut tree = FpTree::new();
        let tex = texture(&mut tree, p[0]);
        let swizzle = SwizzleEffect::make(&mut tree, tex, Swizzle::BGRA);
        let mut persp = Matrix::IDENTITY;
        persp.0[7] = 0.25;
        let root = MatrixEffect::make(&mut tree, persp, swizzle);

        assert!(tree.node(swizzle).unwrap().net_transform_has_perspective());
        assert!(tree.node(tex).unwrap().net_transform_has_perspective());
        assert!(!tree.node(root).unwrap().net_transform_has_perspective());
        assert_eq!(
            tree.node(swizzle).unwrap().sample_matrix(),
            SampleMatrix::constant_or_uniform(true)
        );
    }

    #[test]
    fn variable_matrix_is_direct_usage() {
        let mut tree = FpTree::new();
        let parent = node(&mut tree);
        let child = node(&mut tree);
        tree.register_child(parent, child, SampleMatrix::variable(false));

        let pn = tree.node(parent).unwrap();
        assert!(pn.uses_sample_coords_directly());
        assert!(!pn.flags().contains(PropagatedFlags::USES_SAMPLE_COORDS_INDIRECTLY));
        assert_eq!(tree.node(child).unwrap().sample_matrix().kind, MatrixKind::Variable);
        assert!(tree.node(child).unwrap().is_sampled_with_explicit_coords());
        assert!(!tree.node(child).unwrap().references_sample_coords());
    }

    #[test]
    fn required_features_are_merged() {
        let mut tree = FpTree::new();
        let leaf = tree.add(Box::new(Node {
            features: RequiredFeatures::SAMPLE_LOCATIONS,
        }));
        let mid = node(&mut tree);
        tree.register_child(mid, leaf, SampleMatrix::NONE);
        let root = node(&mut tree);
        tree.register_child(root, mid, SampleMatrix::NONE);
        assert_eq!(
            tree.node(root).unwrap().required_features(),
            RequiredFeatures::SAMPLE_LOCATIONS
        );
    }

    #[test]
    fn equality() {
        let p = proxies(2);
        let mut tree = FpTree::new();
        let build = |tree: &mut FpTree, proxy: ProxyKey, color: Color| {
            let tex = texture(tree, proxy);
            let c = ConstColor::make(tree, color, InputMode::ModulateRgba);
            run_in_series(tree, &[tex, c]).unwrap()
        };
        let a = build(&mut tree, p[0], Color::WHITE);
        let b = build(&mut tree, p[0], Color::WHITE);
        let other_texture = build(&mut tree, p[1], Color::WHITE);
        let other_color = build(&mut tree, p[0], Color::BLACK);

        assert!(tree.is_equal(a, a));
        assert!(tree.is_equal(a, b));
        assert!(tree.is_equal(b, a));
        assert!(!tree.is_equal(a, other_texture));
        assert!(!tree.is_equal(other_texture, a));
        assert!(!tree.is_equal(a, other_color));

        //Only the child count differs.
        let tex = texture(&mut tree, p[0]);
        let c = ConstColor::make(&mut tree, Color::WHITE, InputMode::ModulateRgba);
        let c2 = ConstColor::make(&mut tree, Color::WHITE, InputMode::ModulateRgba);
        let longer = run_in_series(&mut tree, &[tex, c, c2]).unwrap();
        assert!(!tree.is_equal(a, longer));
        assert!(!tree.is_equal(longer, a));
    }

    #[test]
    fn key_is_not_equality() {
        let p = proxies(1);
        let mut tree = FpTree::new();
        let white = ConstColor::make(&mut tree, Color::WHITE, InputMode::ModulateA);
        let black = ConstColor::make(&mut tree, Color::BLACK, InputMode::ModulateA);
        assert!(!tree.is_equal(white, black));
        assert_eq!(tree.processor_key(white), tree.processor_key(black));

        let ignore = ConstColor::make(&mut tree, Color::WHITE, InputMode::Ignore);
        assert_ne!(tree.processor_key(white), tree.processor_key(ignore));

        //Sampler state changes the code, the texture does not.
        let tex = texture(&mut tree, p[0]);
        let mipped = TextureEffect::make(
            &mut tree,
            p[0],
            SamplerState::new(Filter::Mipmap, WrapMode::Clamp),
            Matrix::IDENTITY,
        );
        assert_ne!(tree.processor_key(tex), tree.processor_key(mipped));

        let a = SwizzleEffect::make(&mut tree, tex, Swizzle::BGRA);
        let b = SwizzleEffect::make(&mut tree, mipped, Swizzle::BGRA);
        assert_ne!(tree.processor_key(a), tree.processor_key(b));
    }

    #[test]
    fn clone_is_equal_and_unparented() {
        let p = proxies(1);
        let mut tree = FpTree::new();
        let tex = texture(&mut tree, p[0]);
        let scaled = MatrixEffect::make(&mut tree, Matrix::scale(0.5, 0.5), tex);
        let explicit = ExplicitSampleEffect::make(&mut tree, scaled, [1.0, 1.0]);
        let color = ConstColor::make(&mut tree, Color::WHITE, InputMode::ModulateA);
        let root = run_in_series(&mut tree, &[explicit, color]).unwrap();
        let before = tree.len();

        let clone = tree.clone_subtree(root);
        assert_eq!(tree.len(), before * 2);
        assert!(tree.is_equal(root, clone));
        assert_eq!(tree.processor_key(root), tree.processor_key(clone));
        assert_eq!(tree.node(clone).unwrap().parent(), None);

        for (a, b) in tree.iter(root).zip(tree.iter(clone)) {
            assert_ne!(a, b);
            let (a, b) = (tree.node(a).unwrap(), tree.node(b).unwrap());
            assert_eq!(a.flags(), b.flags());
            assert_eq!(a.sample_matrix(), b.sample_matrix());
        }

        //Cloning a child that was registered explicitly keeps the explicit registration.
        let dst = tree.add(Box::new(ExplicitSampleEffect::new([1.0, 1.0])));
        tree.clone_and_register_child(dst, scaled);
        let copy = tree.child(dst, 0).unwrap();
        assert!(tree.node(copy).unwrap().is_sampled_with_explicit_coords());
        assert!(tree.is_equal(dst, explicit));
    }

    #[test]
    fn pre_order() {
        let mut tree = FpTree::new();
        let a = node(&mut tree);
        let b = node(&mut tree);
        let c = node(&mut tree);
        let d = node(&mut tree);
        tree.register_child(b, c, SampleMatrix::NONE);
        tree.register_child(a, b, SampleMatrix::NONE);
        tree.register_child(a, d, SampleMatrix::NONE);
        assert_eq!(tree.iter(a).collect::<Vec<_>>(), vec![a, b, c, d]);

        let e = node(&mut tree);
        let f = node(&mut tree);
        let set = ProcessorSet::new().with_coverage(e).with_color(a).with_color(f);
        assert_eq!(tree.iter_set(&set).collect::<Vec<_>>(), vec![a, b, c, d, f, e]);
        assert_eq!(tree.iter_roots(&[d, e]).collect::<Vec<_>>(), vec![d, e]);

        let dump = tree.dump(a);
        assert_eq!(dump.lines().count(), 4);
        assert!(dump.lines().nth(1).unwrap().starts_with("  Node"));
        assert!(dump.lines().nth(2).unwrap().starts_with("    Node"));
    }

    #[test]
    fn visit_proxies() {
        let p = proxies(2);
        let mut tree = FpTree::new();
        let linear = texture(&mut tree, p[0]);
        let mipped = TextureEffect::make(
            &mut tree,
            p[1],
            SamplerState::new(Filter::Mipmap, WrapMode::Repeat),
            Matrix::IDENTITY,
        );
        let root = run_in_series(&mut tree, &[linear, mipped]).unwrap();

        let mut seen = Vec::new();
        tree.visit_proxies(root, |proxy, mipmapped| seen.push((proxy, mipmapped)));
        assert_eq!(seen, vec![(p[0], Mipmapped::No), (p[1], Mipmapped::Yes)]);
    }

    #[test]
    fn constant_output() {
        let p = proxies(1);
        let mut tree = FpTree::new();
        let red = ConstColor::make(&mut tree, Color::new(1.0, 0.0, 0.0, 1.0), InputMode::Ignore);
        let white = ConstColor::make(&mut tree, Color::WHITE, InputMode::ModulateA);
        let series = run_in_series(&mut tree, &[red, white]).unwrap();
        assert_eq!(
            tree.constant_output_for_constant_input(series, Color::new(0.0, 1.0, 0.0, 0.5)),
            Some(Color::new(1.0, 1.0, 1.0, 1.0))
        );
        assert!(
            tree.optimization_flags(series)
                .contains(OptimizationFlags::CONSTANT_OUTPUT_FOR_CONSTANT_INPUT)
        );

        let tex = texture(&mut tree, p[0]);
        let c = ConstColor::make(&mut tree, Color::WHITE, InputMode::Ignore);
        let sampled = run_in_series(&mut tree, &[tex, c]).unwrap();
        assert_eq!(
            tree.constant_output_for_constant_input(sampled, Color::WHITE),
            None
        );
        assert!(tree.optimization_flags(sampled).is_empty());
    }
}
