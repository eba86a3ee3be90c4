use bitflags::bitflags;

bitflags! {
    ///Optimizations a processor (including its children) allows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OptimizationFlags: u8 {
        ///Coverage can be folded into the input alpha.
        const COMPATIBLE_WITH_COVERAGE_AS_ALPHA = 0b001;
        ///An opaque input produces an opaque output.
        const PRESERVES_OPAQUE_INPUT = 0b010;
        ///A constant input produces a constant output that can be computed on the CPU.
        const CONSTANT_OUTPUT_FOR_CONSTANT_INPUT = 0b100;
    }
}

bitflags! {
    ///Backend features a processor tree needs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RequiredFeatures: u8 {
        const SAMPLE_LOCATIONS = 0b1;
    }
}

bitflags! {
    ///Coordinate usage of a node. See [FlagClass] for how each flag travels through the tree.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropagatedFlags: u8 {
        ///The node, or a descendant that is not explicitly sampled, carries coordinate transforms.
        const HAS_COORD_TRANSFORMS = 0b00001;
        ///A descendant depends on the sample coordinates of this node.
        const USES_SAMPLE_COORDS_INDIRECTLY = 0b00010;
        ///The node's own code reads the sample coordinates.
        const USES_SAMPLE_COORDS_DIRECTLY = 0b00100;
        ///The node is invoked with coordinates computed by an ancestor.
        const SAMPLED_WITH_EXPLICIT_COORDS = 0b01000;
        ///The combined transform from the root to this node has perspective.
        const NET_TRANSFORM_HAS_PERSPECTIVE = 0b10000;
    }
}

///How a [PropagatedFlags] bit travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagClass {
    ///From a child to its ancestors, until an explicitly sampled node absorbs it.
    Upward,
    ///Describes only the node itself.
    Local,
    ///From a node to its whole subtree. Never cleared once set.
    Downward,
}

impl PropagatedFlags {
    ///Class of a single flag. Returns `None` for an empty or combined set.
    pub fn class(self) -> Option<FlagClass> {
        if self == Self::HAS_COORD_TRANSFORMS || self == Self::USES_SAMPLE_COORDS_INDIRECTLY {
            Some(FlagClass::Upward)
        } else if self == Self::USES_SAMPLE_COORDS_DIRECTLY {
            Some(FlagClass::Local)
        } else if self == Self::SAMPLED_WITH_EXPLICIT_COORDS || self == Self::NET_TRANSFORM_HAS_PERSPECTIVE {
            Some(FlagClass::Downward)
        } else {
            None
        }
    }

    ///All flags of `class`.
    pub fn of_class(class: FlagClass) -> Self {
        Self::all()
            .iter()
            .filter(|f| f.class() == Some(class))
            .fold(Self::empty(), |acc, f| acc | f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_flag_has_a_class() {
        for flag in PropagatedFlags::all().iter() {
            assert!(flag.class().is_some(), "{:?}", flag);
        }
        assert_eq!(PropagatedFlags::empty().class(), None);
        assert_eq!(PropagatedFlags::all().class(), None);

        let classes = [FlagClass::Upward, FlagClass::Local, FlagClass::Downward];
        let union = classes
            .iter()
            .fold(PropagatedFlags::empty(), |acc, c| acc | PropagatedFlags::of_class(*c));
        assert_eq!(union, PropagatedFlags::all());
        assert_eq!(
            PropagatedFlags::of_class(FlagClass::Downward),
            PropagatedFlags::SAMPLED_WITH_EXPLICIT_COORDS | PropagatedFlags::NET_TRANSFORM_HAS_PERSPECTIVE
        );
    }
}
