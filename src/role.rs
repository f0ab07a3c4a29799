use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who is talking to the chatbot. Only selects greeting, help and rule variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Anonymous,
    #[default]
    Buyer,
    Seller,
    Administrator,
}

impl Role {
    /// Storefront role labels ("comprador", "vendedor", ...) as well as the English names.
    pub fn from_label(label: &str) -> Option<Self> {
        match crate::text::normalize(label).as_str() {
            "anonimo" | "invitado" | "anonymous" | "guest" => Some(Self::Anonymous),
            "comprador" | "cliente" | "buyer" => Some(Self::Buyer),
            "vendedor" | "seller" => Some(Self::Seller),
            "administrador" | "admin" | "administrator" => Some(Self::Administrator),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonimo",
            Self::Buyer => "comprador",
            Self::Seller => "vendedor",
            Self::Administrator => "administrador",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown role '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::from_label("Administrador"), Some(Role::Administrator));
        assert_eq!(Role::from_label("invitado"), Some(Role::Anonymous));
        assert_eq!(Role::from_label("anónimo"), Some(Role::Anonymous));
        assert_eq!("seller".parse::<Role>(), Ok(Role::Seller));
        assert!(Role::from_label("pirata").is_none());
        assert_eq!(Role::default(), Role::Buyer);
    }
}
