//! Garment sizes and colors offered by the catalog.
//!
//! Both are fixed enumerations; the wire format uses the display labels
//! (`"Free Size"`, `"Multicolor"`, ...). Write payloads only accept the
//! enumeration. Stored products may carry other labels, which read as
//! [`Variant::Other`].

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a size or color label is not in the enumeration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

macro_rules! label_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every value, in catalog display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The label shown to shoppers and used on the wire.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            /// Case-insensitive match against the labels.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

/// A size or color as stored on a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variant<T> {
    Known(T),
    /// A label outside the enumeration, kept verbatim.
    Other(String),
}

impl<T: Copy> Variant<T> {
    /// The enumerated value, if the label is one.
    #[must_use]
    pub const fn known(&self) -> Option<T> {
        match self {
            Self::Known(value) => Some(*value),
            Self::Other(_) => None,
        }
    }
}

impl<T> From<T> for Variant<T> {
    fn from(value: T) -> Self {
        Self::Known(value)
    }
}

impl<T: fmt::Display> fmt::Display for Variant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(value) => value.fmt(f),
            Self::Other(label) => f.write_str(label),
        }
    }
}

label_enum!(
    /// Garment size.
    Size, "size", {
        Xs => "XS",
        S => "S",
        M => "M",
        L => "L",
        Xl => "XL",
        Xxl => "XXL",
        FreeSize => "Free Size",
        Custom => "Custom",
    }
);

label_enum!(
    /// Garment color.
    Color, "color", {
        Red => "Red",
        Blue => "Blue",
        Green => "Green",
        Yellow => "Yellow",
        Orange => "Orange",
        Purple => "Purple",
        Pink => "Pink",
        Black => "Black",
        White => "White",
        Gray => "Gray",
        Brown => "Brown",
        Maroon => "Maroon",
        Gold => "Gold",
        Silver => "Silver",
        Multicolor => "Multicolor",
    }
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_size_labels_on_the_wire() {
        let sizes = vec![Size::Xs, Size::FreeSize, Size::Custom];
        let json = serde_json::to_string(&sizes).unwrap();
        assert_eq!(json, r#"["XS","Free Size","Custom"]"#);

        let parsed: Vec<Size> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sizes);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("free size".parse::<Size>().unwrap(), Size::FreeSize);
        assert_eq!(" maroon ".parse::<Color>().unwrap(), Color::Maroon);
    }

    #[test]
    fn test_unknown_variant() {
        let err = "Teal".parse::<Color>().unwrap_err();
        assert_eq!(err.to_string(), "unknown color: Teal");
    }

    #[test]
    fn test_unlisted_labels_read_as_other() {
        let sizes: Vec<Variant<Size>> = serde_json::from_str(r#"["XS","3XL"]"#).unwrap();
        assert_eq!(
            sizes,
            vec![Variant::Known(Size::Xs), Variant::Other("3XL".to_string())]
        );
        assert_eq!(sizes.first().unwrap().known(), Some(Size::Xs));
        assert_eq!(sizes.last().unwrap().known(), None);
        assert_eq!(sizes.last().unwrap().to_string(), "3XL");
        assert_eq!(serde_json::to_string(&sizes).unwrap(), r#"["XS","3XL"]"#);
    }

    #[test]
    fn test_strict_enum_still_rejects_unlisted_label() {
        assert!(serde_json::from_str::<Color>(r#""Navy""#).is_err());
    }

    #[test]
    fn test_enumeration_sizes() {
        assert_eq!(Size::ALL.len(), 8);
        assert_eq!(Color::ALL.len(), 15);
    }
}
