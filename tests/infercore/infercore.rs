#[path = "common/mod.rs"]
mod common;

#[path = "tensor/tensor_addressing.rs"]
mod tensor_addressing;
#[path = "tensor/tensor_values.rs"]
mod tensor_values;

#[path = "graph/graph_basic.rs"]
mod graph_basic;
#[path = "graph/graph_serde.rs"]
mod graph_serde;

#[path = "registry/registry_select.rs"]
mod registry_select;
#[path = "registry/registry_conflicts.rs"]
mod registry_conflicts;

#[path = "framework/framework_context.rs"]
mod framework_context;
#[path = "framework/framework_async.rs"]
mod framework_async;
#[path = "framework/framework_concurrency.rs"]
mod framework_concurrency;

#[path = "ops/ops_copy.rs"]
mod ops_copy;
#[path = "ops/ops_slice.rs"]
mod ops_slice;
#[path = "ops/ops_elementwise.rs"]
mod ops_elementwise;

#[path = "optimizer/optimizer_identity.rs"]
mod optimizer_identity;
#[path = "optimizer/optimizer_driver.rs"]
mod optimizer_driver;

#[path = "config/config_env.rs"]
mod config_env;
