mod driver;
mod identity_elimination;
mod rewrite_rule;

pub use driver::{RewriteStats, RuleBasedOptimizer};
pub use identity_elimination::EliminateIdentity;
pub use rewrite_rule::RewriteRule;
