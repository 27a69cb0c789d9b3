//! Newtype IDs for type-safe entity references.
//!
//! The catalog API issues opaque string identifiers. Use the `define_id!`
//! macro to create wrappers that prevent accidentally passing a category ID
//! where a product ID is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use srisri_core::define_id;
/// define_id!(OrderId);
/// define_id!(CartId);
///
/// let order_id = OrderId::new("o-1");
/// let cart_id = CartId::new("o-1");
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = cart_id;
/// assert_eq!(order_id.as_str(), cart_id.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(CategoryId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ProductId::new("p-42");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"p-42\"");

        let parsed: ProductId = serde_json::from_str("\"p-42\"").expect("deserialize");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(CategoryId::from("c1").to_string(), "c1");
    }
}
