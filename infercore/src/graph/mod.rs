mod attrs;
mod editor;
mod node;
mod serialize;
mod types;

pub use attrs::FromAttr;
pub use editor::GraphEditor;
pub use node::describe_node;
pub use serialize::{GraphDeserialize, GraphSerialize};
pub use types::{AttrValue, Graph, Node, NodeArg, NodeIndex, OpAttr, OpAttrs};
