//! Document splitting domain types and traits

mod splitter;

pub use splitter::{
    soft_target, validate_limit, FragmentSplitter, SplitError, SOFT_TARGET_RATIO,
};

#[cfg(test)]
pub use splitter::MockFragmentSplitter;
