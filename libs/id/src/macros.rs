//! Macros for defining typed name types.

/// Maximum length of a DNS-1123 label.
pub const MAX_NAME_LEN: usize = 63;

/// Validates `s` against the DNS-1123 label rules.
pub fn validate_label(s: &str) -> Result<(), crate::NameError> {
    if s.is_empty() {
        return Err(crate::NameError::Empty);
    }

    if s.len() > MAX_NAME_LEN {
        return Err(crate::NameError::TooLong {
            len: s.len(),
            max: MAX_NAME_LEN,
        });
    }

    for (pos, ch) in s.chars().enumerate() {
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-') {
            return Err(crate::NameError::InvalidChar { ch, pos });
        }
    }

    if s.starts_with('-') || s.ends_with('-') {
        return Err(crate::NameError::InvalidBoundary);
    }

    Ok(())
}

/// Macro to define a typed, validated name.
///
/// This generates a newtype wrapper around `String` with:
/// - `parse()` to validate and construct from a string
/// - `as_str()` to borrow the name
/// - `Display`, `FromStr` and `AsRef<str>` implementations
/// - `Serialize` and `Deserialize` implementations (deserialization validates)
/// - `Ord`, `Hash`, and other standard traits
///
/// # Example
///
/// ```ignore
/// define_name!(ClusterName, "cluster");
///
/// let name: ClusterName = "prod-eu-1".parse()?;
/// ```
#[macro_export]
macro_rules! define_name {
    ($name:ident, $kind:literal) => {
        /// A validated name for this resource kind.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Human readable resource kind, used in error messages and logs.
            pub const KIND: &'static str = $kind;

            /// Parses a name from a string.
            pub fn parse(s: &str) -> Result<Self, $crate::NameError> {
                $crate::validate_label(s)?;
                Ok(Self(s.to_string()))
            }

            /// Returns the name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::NameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}
