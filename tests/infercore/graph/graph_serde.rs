use anyhow::Result;
use infercore::{AttrValue, DType, Graph, GraphDeserialize, GraphSerialize, NodeArg};
use serde_json::json;

use crate::common;

fn sample_graph() -> Graph {
    let mut graph = Graph::new("roundtrip");
    graph.add_input(NodeArg::new("x", DType::F32).with_shape(&[2, 3]));
    graph.add_output(NodeArg::new("z", DType::F32));
    common::add_op(&mut graph, "Abs", 6, &["x"], &["a"], DType::F32);
    let unsqueeze = common::op_node(&graph, "Unsqueeze", 1, &["a"], &["z"], DType::F32)
        .with_attr("axes", AttrValue::Ints(vec![0]))
        .with_provider(infercore::CPU_EXECUTION_PROVIDER);
    graph.add_node(unsqueeze);
    graph
}

#[test]
fn json_roundtrip_preserves_nodes() -> Result<()> {
    let graph = sample_graph();
    let value = GraphSerialize::json(&graph)?;
    let restored = GraphDeserialize::from_json(value)?;

    assert_eq!(restored.name, "roundtrip");
    assert_eq!(restored.inputs[0].shape, Some(vec![2, 3]));
    assert_eq!(restored.node_count(), graph.node_count());
    for (a, b) in graph.nodes().zip(restored.nodes()) {
        assert_eq!(a.uuid, b.uuid);
        assert_eq!(a.index, b.index);
        assert_eq!(a.op_type, b.op_type);
        assert_eq!(a.since_version, b.since_version);
        assert_eq!(a.inputs, b.inputs);
        assert_eq!(a.attrs, b.attrs);
        assert_eq!(a.provider, b.provider);
    }
    Ok(())
}

#[test]
fn removed_nodes_keep_their_hole() -> Result<()> {
    let mut graph = sample_graph();
    graph.add_output(NodeArg::new("w", DType::F32));
    let extra = common::add_op(&mut graph, "Neg", 6, &["x"], &["w"], DType::F32);
    let first = graph.producer_of("a").expect("producer");
    graph.outputs.retain(|arg| arg.name != "z");
    let unsqueeze = graph.producer_of("z").expect("producer");
    graph.remove_node(unsqueeze)?;
    graph.remove_node(first)?;

    let text = GraphSerialize::pretty(&graph)?;
    let restored = GraphDeserialize::from_json(serde_json::from_str(&text)?)?;
    assert_eq!(restored.node_count(), 1);
    assert_eq!(restored.node(extra).map(|n| n.op_type.as_str()), Some("Neg"));
    Ok(())
}

#[test]
fn deserialize_rejects_dangling_references() {
    let value = json!({
        "name": "broken",
        "inputs": [],
        "outputs": [{ "name": "y", "dtype": "f32", "shape": null }],
        "initializers": [],
        "nodes": [],
    });
    assert!(GraphDeserialize::from_json(value).is_err());
}

#[test]
fn deserialize_rejects_misplaced_node_index() -> Result<()> {
    let mut value = GraphSerialize::json(&sample_graph())?;
    value["nodes"][0]["index"] = json!(1);
    let err = GraphDeserialize::from_json(value).unwrap_err();
    assert!(matches!(
        common::core_error(&err)?,
        infercore::CoreError::InvalidGraph { .. }
    ));
    Ok(())
}
