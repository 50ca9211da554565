use super::{AttrValue, Node, NodeArg};

/// One-line human readable rendering used by trace output.
pub fn describe_node(node: &Node) -> String {
    let mut out = format!(
        "{} {}({}) >> {}",
        node.name,
        node.op_type,
        join_args(&node.inputs),
        join_args(&node.outputs)
    );
    if !node.attrs.items.is_empty() {
        let attrs: Vec<String> = node
            .attrs
            .items
            .iter()
            .map(|attr| format!("{}={}", attr.name, format_attr(&attr.value)))
            .collect();
        out.push_str(&format!(" {{{}}}", attrs.join(", ")));
    }
    if let Some(provider) = &node.provider {
        out.push_str(&format!(" @{}", provider));
    }
    out
}

fn join_args(args: &[NodeArg]) -> String {
    args.iter()
        .map(|arg| match arg.dtype {
            Some(dtype) => format!("{}:{}", arg.name, dtype),
            None => arg.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn format_attr(value: &AttrValue) -> String {
    match value {
        AttrValue::Float(v) => v.to_string(),
        AttrValue::Int(v) => v.to_string(),
        AttrValue::Str(v) => format!("{:?}", v),
        AttrValue::Floats(v) => format!("{:?}", v),
        AttrValue::Ints(v) => format!("{:?}", v),
        AttrValue::Strs(v) => format!("{:?}", v),
        AttrValue::DType(v) => v.to_string(),
    }
}
