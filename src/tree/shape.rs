//! Schema shapes and the recursive tree builder.
//!
//! # Responsibilities
//! - Decide per type whether a schema field is a leaf or a nested shape
//! - Build, for a shape, one node per path with correctly typed accessors
//!
//! # Design Decisions
//! - Leaf vs composite is a property of the field's type (`Shape::Node`),
//!   so the macro never has to inspect field types
//! - The whole node tree is built eagerly at creation; handles are never
//!   rebuilt on writes, only the shared tree changes
//! - A composite's store key for a field is the field's identifier
//! - Merging recurses through composites only; a leaf always takes the
//!   incoming value whole, even when it is a map
//! - Leaf integers stop at 64 bits, the widest JSON numbers hold

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::tree::{Leaf, Path, Store};

/// A type usable as a field of a configuration schema.
///
/// Terminal types map to a [`Leaf`]; structs declared with
/// [`config_schema!`](crate::config_schema) map to their generated node.
pub trait Shape: Serialize + DeserializeOwned + 'static {
    /// The handle type built for a path holding this shape.
    type Node: Clone + fmt::Debug;

    /// Build the handle for `path`, recursing into nested shapes.
    fn build(store: &Store, path: Path) -> Self::Node;

    /// Fold an encoded `patch` of this shape into `target`.
    ///
    /// Leaves replace. Composites descend into each field present in `patch`
    /// and leave the others untouched.
    fn merge_value(target: &mut Value, patch: Value) {
        *target = patch;
    }
}

macro_rules! leaf_shapes {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Shape for $ty {
                type Node = Leaf<$ty>;

                fn build(store: &Store, path: Path) -> Self::Node {
                    Leaf::new(store.clone(), path)
                }
            }
        )*
    };
}

leaf_shapes!(
    String, bool, char, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64, Value,
);

impl<T> Shape for Vec<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    type Node = Leaf<Vec<T>>;

    fn build(store: &Store, path: Path) -> Self::Node {
        Leaf::new(store.clone(), path)
    }
}

impl<T> Shape for BTreeMap<String, T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    type Node = Leaf<BTreeMap<String, T>>;

    fn build(store: &Store, path: Path) -> Self::Node {
        Leaf::new(store.clone(), path)
    }
}

impl<T> Shape for HashMap<String, T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    type Node = Leaf<HashMap<String, T>>;

    fn build(store: &Store, path: Path) -> Self::Node {
        Leaf::new(store.clone(), path)
    }
}

/// Declare a configuration schema.
///
/// Each `struct Value => Node { .. }` block emits:
/// - `Value`, a deep-partial value type: every field is `Option<_>`, absent
///   fields are skipped when serialized, `Default` is the empty object;
/// - `Node`, the handle for a path of this shape. It derefs to
///   [`Handle<Value>`](crate::Handle) for `get`/`set`/`subscribe` and has one
///   public child handle per field;
/// - `impl Shape for Value`, so the struct can nest inside other schemas.
///
/// Referring to an undeclared field, or setting a wrongly typed value, is a
/// compile error. The calling crate must depend on `serde`.
///
/// ```
/// use config_tree::config_schema;
///
/// config_schema! {
///     pub struct User => UserNode {
///         pub name: String,
///         pub age: u32,
///     }
///
///     pub struct App => AppNode {
///         pub user: User,
///         pub debug: bool,
///     }
/// }
///
/// let app = config_tree::create(App::default());
/// app.user.name.set("John".to_string());
/// assert_eq!(app.user.get().and_then(|user| user.name).as_deref(), Some("John"));
/// ```
#[macro_export]
macro_rules! config_schema {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $node:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty
            ),* $(,)?
        }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
            $vis struct $name {
                $(
                    $(#[$field_meta])*
                    #[serde(default, skip_serializing_if = "Option::is_none")]
                    $field_vis $field: ::std::option::Option<$field_ty>,
                )*
            }

            #[doc = concat!("Handle tree for [`", stringify!($name), "`].")]
            #[derive(Debug, Clone)]
            $vis struct $node {
                __handle: $crate::Handle<$name>,
                $(
                    $field_vis $field: <$field_ty as $crate::Shape>::Node,
                )*
            }

            impl $node {
                /// This node's own handle.
                pub fn handle(&self) -> &$crate::Handle<$name> {
                    &self.__handle
                }
            }

            impl ::std::ops::Deref for $node {
                type Target = $crate::Handle<$name>;

                fn deref(&self) -> &Self::Target {
                    &self.__handle
                }
            }

            impl $crate::Shape for $name {
                type Node = $node;

                fn build(store: &$crate::Store, path: $crate::Path) -> $node {
                    $node {
                        $(
                            $field: <$field_ty as $crate::Shape>::build(
                                store,
                                path.child(stringify!($field)),
                            ),
                        )*
                        __handle: $crate::Handle::new(store.clone(), path),
                    }
                }

                fn merge_value(
                    target: &mut $crate::__private::Value,
                    patch: $crate::__private::Value,
                ) {
                    let mut patch = match patch {
                        $crate::__private::Value::Object(patch) => patch,
                        other => {
                            *target = other;
                            return;
                        }
                    };
                    if !target.is_object() {
                        *target = $crate::__private::Value::Object($crate::__private::Map::new());
                    }
                    if let ::std::option::Option::Some(fields) = target.as_object_mut() {
                        $(
                            if let ::std::option::Option::Some(field) = patch.remove(stringify!($field)) {
                                <$field_ty as $crate::Shape>::merge_value(
                                    fields
                                        .entry(stringify!($field))
                                        .or_insert($crate::__private::Value::Null),
                                    field,
                                );
                            }
                        )*
                    }
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fmt::Debug;

    crate::config_schema! {
        struct Inner => InnerNode {
            flag: bool,
            list: Vec<u8>,
        }

        struct Outer => OuterNode {
            inner: Inner,
            label: String,
        }

        struct Routes => RoutesNode {
            weights: BTreeMap<String, u8>,
            inner: Inner,
        }
    }

    fn assert_leaf_round_trip<T>(value: T)
    where
        T: Shape<Node = Leaf<T>> + PartialEq + Debug + Clone,
    {
        let store = Store::default();
        let leaf = T::build(&store, Path::from_segments(["leaf"]));

        leaf.try_set(value.clone()).unwrap();
        assert_eq!(leaf.get(), Some(value));
    }

    #[test]
    fn test_paths_follow_field_names() {
        let root = Outer::build(&Store::default(), Path::root());

        assert!(root.path().is_root());
        assert_eq!(root.inner.path().to_string(), "inner");
        assert_eq!(root.inner.flag.path().to_string(), "inner.flag");
        assert_eq!(root.inner.list.path().to_string(), "inner.list");
        assert_eq!(root.label.path().to_string(), "label");
    }

    #[test]
    fn test_partial_value_serialization() {
        let value = Outer {
            inner: Some(Inner {
                flag: Some(true),
                list: None,
            }),
            label: None,
        };

        assert_eq!(serde_json::to_value(&value).unwrap(), json!({ "inner": { "flag": true } }));
        assert_eq!(serde_json::to_value(Outer::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_nodes_share_one_store() {
        let store = Store::default();
        let root = Outer::build(&store, Path::root());

        root.inner.list.set(vec![1, 2]);
        assert!(root.store().ptr_eq(&store));
        assert!(root.inner.flag.store().ptr_eq(&store));
        assert_eq!(
            root.inner.get(),
            Some(Inner {
                flag: None,
                list: Some(vec![1, 2]),
            })
        );
    }

    #[test]
    fn test_every_leaf_type_round_trips() {
        assert_leaf_round_trip("text".to_string());
        assert_leaf_round_trip(true);
        assert_leaf_round_trip('ß');
        assert_leaf_round_trip(u8::MAX);
        assert_leaf_round_trip(u16::MAX);
        assert_leaf_round_trip(u32::MAX);
        assert_leaf_round_trip(u64::MAX);
        assert_leaf_round_trip(usize::MAX);
        assert_leaf_round_trip(i8::MIN);
        assert_leaf_round_trip(i16::MIN);
        assert_leaf_round_trip(i32::MIN);
        assert_leaf_round_trip(i64::MIN);
        assert_leaf_round_trip(isize::MIN);
        assert_leaf_round_trip(0.1_f32);
        assert_leaf_round_trip(f64::MAX);
        assert_leaf_round_trip(json!({ "nested": [1, "two", null] }));
        assert_leaf_round_trip(vec![i64::MIN, 0, i64::MAX]);
        assert_leaf_round_trip(BTreeMap::from([("a".to_string(), u64::MAX)]));
        assert_leaf_round_trip(HashMap::from([("b".to_string(), -1.5_f64)]));
    }

    #[test]
    fn test_leaf_merge_replaces_map() {
        let root = Routes::build(&Store::default(), Path::root());

        root.weights.set(BTreeMap::from([("a".to_string(), 1)]));
        root.weights.merge(BTreeMap::from([("b".to_string(), 2)]));

        assert_eq!(root.weights.get(), Some(BTreeMap::from([("b".to_string(), 2)])));
    }

    #[test]
    fn test_composite_merge_stops_at_leaves() {
        let store = Store::new(json!({
            "weights": { "a": 1 },
            "inner": { "flag": true, "list": [1] }
        }));
        let root = Routes::build(&store, Path::root());

        root.merge(Routes {
            weights: Some(BTreeMap::from([("b".to_string(), 2)])),
            inner: Some(Inner {
                flag: None,
                list: Some(vec![7]),
            }),
        });

        assert_eq!(
            *store.snapshot(),
            json!({
                "weights": { "b": 2 },
                "inner": { "flag": true, "list": [7] }
            })
        );
    }
}
