//! Conversion between document nodes and typed setting values.
//!
//! Settings files are edited by hand, so decoding is lenient where the intent
//! is unambiguous: `"42"` reads as an integer, `yes` as a boolean, and any
//! scalar as a string. Shapes that cannot be read as the requested type are a
//! [`CoercionError`], which callers must keep distinct from a missing key.
//!
//! The set of supported types is closed:
//!
//! | Type | Accepted nodes |
//! |---|---|
//! | `String` | any scalar |
//! | `i64` | integer, or string holding an integer |
//! | `bool` | boolean, or `true/false/yes/no/on/off` string |
//! | `Vec<String>` | sequence of scalars |
//! | [`FilePath`], [`DirPath`] | string (empty string reads as absent) |
//! | [`Structured<T>`] | anything `T` deserializes from |
//! | [`Node`] | anything |

use crate::document::Node;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// A present value whose shape does not match the requested type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, found {found}")]
pub struct CoercionError {
    /// Name of the requested type
    pub expected: &'static str,
    /// Description of what was actually there
    pub found: String,
}

impl CoercionError {
    fn mismatch(expected: &'static str, node: &Node) -> Self {
        Self {
            expected,
            found: describe(node),
        }
    }
}

/// Short human description of a node, for error messages.
pub fn describe(node: &Node) -> String {
    match node {
        Node::Null => "null".to_string(),
        Node::Bool(b) => format!("boolean {}", b),
        Node::Number(n) => format!("number {}", n),
        Node::String(s) => format!("string {:?}", s),
        Node::Sequence(seq) => format!("sequence of {} items", seq.len()),
        Node::Mapping(map) => format!("mapping with {} keys", map.len()),
        Node::Tagged(tagged) => format!("tagged value {}", tagged.tag),
    }
}

/// A type that can be stored in and read from a settings document.
pub trait SettingValue: Sized {
    /// Name of the type, as shown in coercion errors.
    const EXPECTED: &'static str;

    /// Read a value from a node.
    ///
    /// `Ok(None)` means the node carries no value (null, or an empty path).
    fn decode(node: &Node) -> Result<Option<Self>, CoercionError>;

    /// Convert the value into a node for writing.
    fn encode(&self) -> Result<Node, CoercionError>;
}

impl SettingValue for String {
    const EXPECTED: &'static str = "string";

    fn decode(node: &Node) -> Result<Option<Self>, CoercionError> {
        match node {
            Node::Null => Ok(None),
            Node::String(s) => Ok(Some(s.clone())),
            Node::Number(n) => Ok(Some(n.to_string())),
            Node::Bool(b) => Ok(Some(b.to_string())),
            other => Err(CoercionError::mismatch(Self::EXPECTED, other)),
        }
    }

    fn encode(&self) -> Result<Node, CoercionError> {
        Ok(Node::String(self.clone()))
    }
}

impl SettingValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn decode(node: &Node) -> Result<Option<Self>, CoercionError> {
        match node {
            Node::Null => Ok(None),
            Node::Number(n) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| CoercionError::mismatch(Self::EXPECTED, node)),
            Node::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| CoercionError::mismatch(Self::EXPECTED, node)),
            other => Err(CoercionError::mismatch(Self::EXPECTED, other)),
        }
    }

    fn encode(&self) -> Result<Node, CoercionError> {
        Ok(Node::from(*self))
    }
}

impl SettingValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn decode(node: &Node) -> Result<Option<Self>, CoercionError> {
        match node {
            Node::Null => Ok(None),
            Node::Bool(b) => Ok(Some(*b)),
            Node::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(Some(true)),
                "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(CoercionError::mismatch(Self::EXPECTED, node)),
            },
            other => Err(CoercionError::mismatch(Self::EXPECTED, other)),
        }
    }

    fn encode(&self) -> Result<Node, CoercionError> {
        Ok(Node::Bool(*self))
    }
}

impl SettingValue for Vec<String> {
    const EXPECTED: &'static str = "sequence of strings";

    fn decode(node: &Node) -> Result<Option<Self>, CoercionError> {
        match node {
            Node::Null => Ok(None),
            Node::Sequence(items) => items
                .iter()
                .map(|item| match String::decode(item) {
                    Ok(Some(s)) => Ok(s),
                    _ => Err(CoercionError::mismatch(Self::EXPECTED, item)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            other => Err(CoercionError::mismatch(Self::EXPECTED, other)),
        }
    }

    fn encode(&self) -> Result<Node, CoercionError> {
        Ok(Node::Sequence(
            self.iter().map(|s| Node::String(s.clone())).collect(),
        ))
    }
}

impl SettingValue for Node {
    const EXPECTED: &'static str = "any value";

    fn decode(node: &Node) -> Result<Option<Self>, CoercionError> {
        if node.is_null() {
            Ok(None)
        } else {
            Ok(Some(node.clone()))
        }
    }

    fn encode(&self) -> Result<Node, CoercionError> {
        Ok(self.clone())
    }
}

fn decode_path_string(expected: &'static str, node: &Node) -> Result<Option<PathBuf>, CoercionError> {
    match node {
        Node::Null => Ok(None),
        Node::String(s) if s.trim().is_empty() => Ok(None),
        Node::String(s) => Ok(Some(PathBuf::from(s))),
        other => Err(CoercionError::mismatch(expected, other)),
    }
}

fn encode_path(path: &Path) -> Node {
    Node::String(path.to_string_lossy().into_owned())
}

/// A setting naming a file. Holds the path only; the file need not exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilePath(PathBuf);

/// A setting naming a directory. Holds the path only; the directory need not exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DirPath(PathBuf);

macro_rules! path_handle {
    ($ty:ident, $expected:literal) => {
        impl $ty {
            /// Wrap a path.
            pub fn new(path: impl Into<PathBuf>) -> Self {
                Self(path.into())
            }

            /// Borrow the wrapped path.
            pub fn as_path(&self) -> &Path {
                &self.0
            }

            /// Unwrap into the owned path.
            pub fn into_inner(self) -> PathBuf {
                self.0
            }
        }

        impl AsRef<Path> for $ty {
            fn as_ref(&self) -> &Path {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.display())
            }
        }

        impl SettingValue for $ty {
            const EXPECTED: &'static str = $expected;

            fn decode(node: &Node) -> Result<Option<Self>, CoercionError> {
                Ok(decode_path_string(Self::EXPECTED, node)?.map(Self))
            }

            fn encode(&self) -> Result<Node, CoercionError> {
                Ok(encode_path(&self.0))
            }
        }
    };
}

path_handle!(FilePath, "file path");
path_handle!(DirPath, "directory path");

/// Any serde type, decoded structurally from a mapping or sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structured<T>(pub T);

impl<T> SettingValue for Structured<T>
where
    T: DeserializeOwned + Serialize,
{
    const EXPECTED: &'static str = "structured value";

    fn decode(node: &Node) -> Result<Option<Self>, CoercionError> {
        if node.is_null() {
            return Ok(None);
        }
        serde_yaml::from_value(node.clone())
            .map(|value| Some(Structured(value)))
            .map_err(|e| CoercionError {
                expected: Self::EXPECTED,
                found: format!("{} ({})", describe(node), e),
            })
    }

    fn encode(&self) -> Result<Node, CoercionError> {
        serde_yaml::to_value(&self.0).map_err(|e| CoercionError {
            expected: Self::EXPECTED,
            found: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn yaml(text: &str) -> Node {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_string_from_scalars() {
        assert_eq!(String::decode(&yaml("hello")).unwrap(), Some("hello".to_string()));
        assert_eq!(String::decode(&yaml("42")).unwrap(), Some("42".to_string()));
        assert_eq!(String::decode(&yaml("true")).unwrap(), Some("true".to_string()));
        assert!(String::decode(&yaml("[a]")).is_err());
    }

    #[test]
    fn test_integer_from_number_and_numeric_string() {
        assert_eq!(i64::decode(&yaml("42")).unwrap(), Some(42));
        assert_eq!(i64::decode(&yaml("'-7'")).unwrap(), Some(-7));
    }

    #[test]
    fn test_integer_rejects_non_numeric() {
        let err = i64::decode(&yaml("abc")).unwrap_err();
        assert_eq!(err.expected, "integer");
        assert!(err.found.contains("abc"));
        assert!(i64::decode(&yaml("1.5")).is_err());
        assert!(i64::decode(&yaml("true")).is_err());
    }

    #[test]
    fn test_bool_spellings() {
        assert_eq!(bool::decode(&yaml("true")).unwrap(), Some(true));
        assert_eq!(bool::decode(&yaml("'Yes'")).unwrap(), Some(true));
        assert_eq!(bool::decode(&yaml("'off'")).unwrap(), Some(false));
        assert!(bool::decode(&yaml("1")).is_err());
        assert!(bool::decode(&yaml("maybe")).is_err());
    }

    #[test]
    fn test_null_is_absent_for_every_type() {
        let null = Node::Null;
        assert_eq!(String::decode(&null).unwrap(), None);
        assert_eq!(i64::decode(&null).unwrap(), None);
        assert_eq!(bool::decode(&null).unwrap(), None);
        assert_eq!(Vec::<String>::decode(&null).unwrap(), None);
        assert_eq!(DirPath::decode(&null).unwrap(), None);
        assert_eq!(Node::decode(&null).unwrap(), None);
    }

    #[test]
    fn test_string_list() {
        assert_eq!(
            Vec::<String>::decode(&yaml("[item1, item2, 3]")).unwrap(),
            Some(vec!["item1".to_string(), "item2".to_string(), "3".to_string()])
        );
        assert!(Vec::<String>::decode(&yaml("[[nested]]")).is_err());
        assert!(Vec::<String>::decode(&yaml("just a string")).is_err());
    }

    #[test]
    fn test_path_handles_do_not_touch_filesystem() {
        let dir = DirPath::decode(&yaml("'/definitely/not/here'")).unwrap().unwrap();
        assert_eq!(dir.as_path(), Path::new("/definitely/not/here"));

        let file = FilePath::new("C:/Games/Fallout4.exe");
        assert_eq!(file.encode().unwrap(), Node::from("C:/Games/Fallout4.exe"));
    }

    #[test]
    fn test_empty_path_is_absent() {
        assert_eq!(DirPath::decode(&yaml("''")).unwrap(), None);
        assert_eq!(FilePath::decode(&yaml("'  '")).unwrap(), None);
        assert!(FilePath::decode(&yaml("12")).is_err());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Window {
        width: u32,
        height: u32,
    }

    #[test]
    fn test_structured_decode() {
        let decoded = Structured::<Window>::decode(&yaml("width: 800\nheight: 600\n"))
            .unwrap()
            .unwrap();
        assert_eq!(decoded.0, Window { width: 800, height: 600 });

        let err = Structured::<Window>::decode(&yaml("width: wide\n")).unwrap_err();
        assert_eq!(err.expected, "structured value");
    }

    #[test]
    fn test_encode_shapes() {
        assert_eq!(42i64.encode().unwrap(), yaml("42"));
        assert_eq!(true.encode().unwrap(), yaml("true"));
        assert_eq!(
            vec!["a".to_string(), "b".to_string()].encode().unwrap(),
            yaml("[a, b]")
        );
        assert_eq!(
            Structured(Window { width: 1, height: 2 }).encode().unwrap(),
            yaml("width: 1\nheight: 2\n")
        );
    }
}
