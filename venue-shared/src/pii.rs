use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps customer identifiers so log macros only ever print a short prefix.
/// Serialization is untouched: API payloads carry the real value.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Masked<T>(pub T);

const VISIBLE_PREFIX: usize = 3;

impl<T: AsRef<str>> Masked<T> {
    fn masked(&self) -> String {
        let prefix: String = self.0.as_ref().chars().take(VISIBLE_PREFIX).collect();
        format!("{}***", prefix)
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_in_display_but_not_in_json() {
        let id = Masked("customer-42".to_string());
        assert_eq!(format!("{}", id), "cus***");
        assert_eq!(format!("{:?}", id), "cus***");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"customer-42\"");
    }
}
