//! Shared primitive types used across the console core.

use chrono::NaiveDateTime;

/// A stable, unique identifier for any record in a record set.
pub type RecordId = String;

/// Monetary amount in Thai baht.
pub type Amount = f64;

/// Wall-clock instant as the console displays it (no timezone).
pub type Timestamp = NaiveDateTime;

/// Declares a closed string-backed enum: serde names, `as_str`, `Display`
/// and a `FromStr` that rejects anything outside the listed spellings.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::ConsoleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::error::ConsoleError::UnknownValue {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// Delivery state of the most recent reminder/receipt email.
    pub enum EmailStatus {
        Sent => "sent",
        Pending => "pending",
        NotSent => "not_sent",
        Failed => "failed",
    }
}

string_enum! {
    /// Whether a document has been pushed to the NAV accounting system.
    pub enum NavSyncStatus {
        Synced => "synced",
        Pending => "pending",
        Failed => "failed",
    }
}

string_enum! {
    pub enum PaymentType {
        Yearly => "yearly",
        Termly => "termly",
    }
}

string_enum! {
    pub enum PaymentChannel {
        CreditCard => "credit_card",
        QrPayment => "qr_payment",
        CounterBank => "counter_bank",
    }
}

string_enum! {
    pub enum ParentType {
        Internal => "internal",
        External => "external",
    }
}

impl PaymentType {
    /// Fixed tuition fee for this billing cadence.
    pub fn amount(&self) -> Amount {
        match self {
            Self::Yearly => 125_000.0,
            Self::Termly => 42_000.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Yearly => "Yearly",
            Self::Termly => "Termly",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Yearly => "Annual tuition fee payment for academic year 2025-2026",
            Self::Termly => "Term 1 tuition fee payment",
        }
    }
}

impl PaymentChannel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreditCard => "Credit Card",
            Self::QrPayment => "QR Payment",
            Self::CounterBank => "Bank Counter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsoleError;

    #[test]
    fn string_enums_parse_their_own_spelling() {
        for status in EmailStatus::ALL {
            assert_eq!(status.as_str().parse::<EmailStatus>().unwrap(), *status);
        }
        assert_eq!(NavSyncStatus::Synced.to_string(), "synced");
    }

    #[test]
    fn unknown_spelling_is_rejected() {
        let err = "Sent".parse::<EmailStatus>().unwrap_err();
        assert!(matches!(err, ConsoleError::UnknownValue { kind: "EmailStatus", .. }));
    }

    #[test]
    fn serde_uses_wire_spelling() {
        let json = serde_json::to_string(&EmailStatus::NotSent).unwrap();
        assert_eq!(json, "\"not_sent\"");
    }
}
