// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! A string whose value never shows up in `Debug` or `Display` output.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

const REDACTED: &str = "<redacted>";

#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueString(String);

impl OpaqueString {
    pub fn new(value: impl Into<String>) -> Self {
        OpaqueString(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for OpaqueString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for OpaqueString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for OpaqueString {
    fn from(value: String) -> Self {
        OpaqueString(value)
    }
}

impl From<&str> for OpaqueString {
    fn from(value: &str) -> Self {
        OpaqueString(value.to_string())
    }
}

impl fmt::Debug for OpaqueString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for OpaqueString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_output() {
        let s = OpaqueString::new("hunter2");
        assert_eq!(format!("{}", s), REDACTED);
        assert_eq!(format!("{:?}", s), REDACTED);
        assert_eq!(s.as_ref(), "hunter2");
        assert_eq!(&*s, "hunter2");
    }

    #[test]
    fn test_serde_transparent() {
        let s: OpaqueString = serde_yaml::from_str("hunter2").unwrap();
        assert_eq!(s.as_ref(), "hunter2");
        let out = serde_yaml::to_string(&s).unwrap();
        assert_eq!(out.trim(), "hunter2");
    }
}
