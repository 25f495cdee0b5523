use proptest::prelude::*;

/// Number of distinct modules the generated scenarios touch
pub const MODULE_COUNT: u64 = 5;

/// Lifecycle step applied to one module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Start(u64),
    Stopping(u64),
    Stopped(u64),
    Updated(u64),
}

impl LifecycleOp {
    pub fn module(&self) -> u64 {
        match self {
            LifecycleOp::Start(id)
            | LifecycleOp::Stopping(id)
            | LifecycleOp::Stopped(id)
            | LifecycleOp::Updated(id) => *id,
        }
    }
}

pub fn module_id_strategy() -> impl Strategy<Value = u64> {
    0..MODULE_COUNT
}

pub fn lifecycle_op_strategy() -> impl Strategy<Value = LifecycleOp> {
    prop_oneof![
        3 => module_id_strategy().prop_map(LifecycleOp::Start),
        1 => module_id_strategy().prop_map(LifecycleOp::Stopping),
        1 => module_id_strategy().prop_map(LifecycleOp::Stopped),
        1 => module_id_strategy().prop_map(LifecycleOp::Updated),
    ]
}

pub fn lifecycle_ops_strategy() -> impl Strategy<Value = Vec<LifecycleOp>> {
    prop::collection::vec(lifecycle_op_strategy(), 0..40)
}

/// Per-module declarations: 0..4 names, roughly one in four broken
pub fn declarations_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(
        prop::collection::vec(prop::bool::weighted(0.25), 0..4),
        MODULE_COUNT as usize,
    )
    .prop_map(|modules| {
        modules
            .into_iter()
            .enumerate()
            .map(|(module, flags)| {
                flags
                    .into_iter()
                    .enumerate()
                    .map(|(slot, broken)| {
                        if broken {
                            format!("m{module}.Connector{slot}Broken")
                        } else {
                            format!("m{module}.Connector{slot}")
                        }
                    })
                    .collect()
            })
            .collect()
    })
}
