use crate::foundation::QuestDropError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a ledger account address: `0x` followed by 16 hex chars.
const IDENTITY_HEX_LEN: usize = 16;

/// Opaque ledger account reference. The unit of all per-user state keys.
///
/// Construction goes through [`Identity::parse`] at the boundary; everything
/// downstream can assume the canonical `0x` + 16 lowercase hex form.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Validate and canonicalize a raw address string.
    ///
    /// Accepts upper- or mixed-case hex and an optional missing `0x` prefix;
    /// anything else is a [`QuestDropError::InvalidIdentity`].
    pub fn parse(raw: &str) -> Result<Self, QuestDropError> {
        let trimmed = raw.trim();
        let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if hex_part.len() != IDENTITY_HEX_LEN || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(QuestDropError::InvalidIdentity(raw.to_string()));
        }
        Ok(Self(format!("0x{}", hex_part.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = QuestDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 32-byte ledger transaction id, displayed and serialized as lowercase hex.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct TransactionId([u8; 32]);

impl TransactionId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for TransactionId {
    type Err = QuestDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_part)
            .map_err(|err| QuestDropError::Message(format!("invalid transaction id {s:?}: {err}")))?;
        let bytes: [u8; 32] =
            bytes.try_into().map_err(|_| QuestDropError::Message(format!("invalid transaction id length: {s:?}")))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 32]> for TransactionId {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl Serialize for TransactionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = <[u8; 32]>::deserialize(deserializer)?;
            Ok(Self(bytes))
        }
    }
}
