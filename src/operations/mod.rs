pub mod adjacency;
pub mod boolean;
pub mod join;
pub mod rebuild;

pub use adjacency::{discover_join_groups, JoinGroup};
pub use boolean::{BooleanKernel, BooleanOutcome, ModificationMap, SewOptions, SewOutcome};
pub use join::{
    cut_parts, fuse_assemblies, fuse_parts, fuse_parts_by_cref, sew_parts, split_parts,
    OperationOutcome,
};
pub use rebuild::ShapeRebuilder;
