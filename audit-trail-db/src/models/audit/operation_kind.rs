use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of change a change header describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl From<OperationKind> for &str {
    fn from(val: OperationKind) -> Self {
        match val {
            OperationKind::Create => "Create",
            OperationKind::Update => "Update",
            OperationKind::Delete => "Delete",
        }
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Create" => Ok(OperationKind::Create),
            "Update" => Ok(OperationKind::Update),
            "Delete" => Ok(OperationKind::Delete),
            _ => Err(format!("Unknown operation kind: {s}")),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!("Delete".parse::<OperationKind>().unwrap(), OperationKind::Delete);
        assert!("Upsert".parse::<OperationKind>().is_err());
        assert_eq!(OperationKind::Create.to_string(), "Create");
    }
}
