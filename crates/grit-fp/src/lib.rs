//! # Fragment processors
//!
//! A fragment processor (FP) computes a color from an input color and optional texture or coordinate inputs. FPs are composed
//! into trees: a parent invokes its children, optionally through a [SampleMatrix] or at explicitly computed coordinates.
//!
//! All nodes live in a [FpTree] arena. A node is created with [FpTree::add] and is attached exactly once via
//! [FpTree::register_child] or [FpTree::register_explicitly_sampled_child]. Registration propagates coordinate usage up to the
//! parent and pushes explicit sampling and perspective down to the child's subtree. After that the tree is treated as immutable.
//!
//! Two different notions of "sameness" exist:
//! - [FpTree::is_equal] is structural equality, used to decide whether draws can be batched.
//! - [FpTree::processor_key] identifies the generated shader code. Two unequal trees may share a key, for instance when they only
//!   differ in uniform values.

mod color;
pub use color::Color;

mod flags;
pub use flags::{FlagClass, OptimizationFlags, PropagatedFlags, RequiredFeatures};

mod sample;
pub use sample::{Matrix, MatrixKind, SampleMatrix};

mod effect;
pub use effect::{Effect, KeyBuilder, ProcessorKey, TextureSampler, shallow_eq};

mod tree;
pub use tree::{FpId, FpNode, FpTree, PreOrder, ProcessorSet};

///Pre implemented effects.
pub mod effects;
