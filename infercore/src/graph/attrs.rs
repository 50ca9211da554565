use crate::tensor::DType;

use super::AttrValue;

/// Rust types that can be read out of an `AttrValue`.
pub trait FromAttr: Sized {
    const KIND: &'static str;
    const LIST_KIND: &'static str;

    fn from_attr(value: &AttrValue) -> Option<Self>;
    fn from_attrs(value: &AttrValue) -> Option<Vec<Self>>;
}

impl FromAttr for i64 {
    const KIND: &'static str = "int";
    const LIST_KIND: &'static str = "ints";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn from_attrs(value: &AttrValue) -> Option<Vec<Self>> {
        match value {
            AttrValue::Ints(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromAttr for f32 {
    const KIND: &'static str = "float";
    const LIST_KIND: &'static str = "floats";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn from_attrs(value: &AttrValue) -> Option<Vec<Self>> {
        match value {
            AttrValue::Floats(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromAttr for String {
    const KIND: &'static str = "string";
    const LIST_KIND: &'static str = "strings";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Str(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn from_attrs(value: &AttrValue) -> Option<Vec<Self>> {
        match value {
            AttrValue::Strs(v) => Some(v.clone()),
            _ => None,
        }
    }
}

// No list form for dtypes.
impl FromAttr for DType {
    const KIND: &'static str = "dtype";
    const LIST_KIND: &'static str = "dtype list";

    fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::DType(v) => Some(*v),
            _ => None,
        }
    }

    fn from_attrs(_value: &AttrValue) -> Option<Vec<Self>> {
        None
    }
}
