/// Formal signature of an operator: the type parameter bound to each input
/// and output position.
///
/// When a node has more arguments than the schema lists, the extra ones take
/// the last formal's type parameter (variadic tail).
#[derive(Debug, Clone, Copy)]
pub struct OpSchema {
    pub name: &'static str,
    pub inputs: &'static [&'static str],
    pub outputs: &'static [&'static str],
    /// Whether output 0 may reuse the storage of input 0. Kernels may only
    /// declare an alias for operators that allow it.
    pub supports_inplace: bool,
}

impl OpSchema {
    pub fn input_param(&self, index: usize) -> Option<&'static str> {
        formal_param(self.inputs, index)
    }

    pub fn output_param(&self, index: usize) -> Option<&'static str> {
        formal_param(self.outputs, index)
    }
}

fn formal_param(formals: &'static [&'static str], index: usize) -> Option<&'static str> {
    formals
        .get(index)
        .or_else(|| formals.last())
        .copied()
}

const UNARY: &[&str] = &["T"];

const fn unary(name: &'static str) -> OpSchema {
    OpSchema {
        name,
        inputs: UNARY,
        outputs: UNARY,
        supports_inplace: true,
    }
}

pub const OP_SCHEMAS: &[OpSchema] = &[
    unary("Identity"),
    unary("Unsqueeze"),
    OpSchema {
        name: "Slice",
        inputs: UNARY,
        outputs: UNARY,
        supports_inplace: false,
    },
    unary("Abs"),
    unary("Neg"),
    unary("Floor"),
    unary("Ceil"),
    unary("Reciprocal"),
    unary("Sqrt"),
    unary("Log"),
    unary("Exp"),
];

pub fn op_schema(name: &str) -> Option<&'static OpSchema> {
    OP_SCHEMAS.iter().find(|schema| schema.name == name)
}
