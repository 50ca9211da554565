use std::env;

pub const CPU_EXECUTION_PROVIDER: &str = "CPUExecutionProvider";
pub const CUDA_EXECUTION_PROVIDER: &str = "CUDAExecutionProvider";

/// Default ONNX operator domain.
pub const ONNX_DOMAIN: &str = "";

const DISABLE_REWRITES_ENV: &str = "INFERCORE_DISABLE_REWRITES";
const REWRITE_STEPS_ENV: &str = "INFERCORE_REWRITE_STEPS";

/// Settings for the rule-based optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerConfig {
    pub enabled: bool,
    /// Upper bound on successful rewrites in one `optimize` call.
    pub max_steps: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_steps: 1024,
        }
    }
}

impl OptimizerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = env::var(DISABLE_REWRITES_ENV) {
            config.enabled = !parse_flag(&value);
        }
        if let Ok(value) = env::var(REWRITE_STEPS_ENV) {
            match value.trim().parse::<usize>() {
                Ok(steps) => config.max_steps = steps,
                Err(_) => crate::warning!(
                    "ignoring {}={:?}: expected an unsigned integer",
                    REWRITE_STEPS_ENV,
                    value
                ),
            }
        }
        config
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
