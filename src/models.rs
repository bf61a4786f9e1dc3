use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TentlyError;
use crate::query::sort::SortKey;
use crate::query::{Field, ListConfig, Record, Toggle};

pub const ROLES: &[&str] = &[
    "General Assembly",
    "Board of Directors (BOD)",
    "President",
    "Vice-President",
    "Secretary",
    "Assistant Secretary",
    "Treasurer",
    "Assistant Treasurer",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Deactivated,
    Pending,
    #[default]
    New,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deactivated => "deactivated",
            Self::Pending => "pending",
            Self::New => "new",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = TentlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "deactivated" => Ok(Self::Deactivated),
            "pending" => Ok(Self::Pending),
            "new" => Ok(Self::New),
            other => Err(TentlyError::Other(format!(
                "Unknown status: {other} (expected active, deactivated, pending or new)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub role: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub status: MemberStatus,
    #[serde(default)]
    pub updated_at: String,
}

impl Record for Member {
    fn key(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> Cow<'_, str> {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => Cow::Owned(format!("{} {}", self.first_name, self.last_name)),
            (false, true) => Cow::Borrowed(&self.first_name),
            (true, _) => Cow::Borrowed(&self.last_name),
        }
    }

    fn field(&self, field: Field) -> Option<Cow<'_, str>> {
        match field {
            Field::Id => Some(Cow::Borrowed(&self.id)),
            Field::Name => Some(self.display_name()),
            Field::Email => Some(Cow::Borrowed(&self.email)),
            Field::Role => Some(Cow::Borrowed(&self.role)),
            Field::Status => Some(Cow::Borrowed(self.status.as_str())),
            Field::Date => Some(Cow::Borrowed(&self.updated_at)),
            Field::Type | Field::Purpose | Field::Amount => None,
        }
    }
}

/// One contribution paid in by a member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: String,
    pub name: String,
    pub purpose: String,
    pub amount: String,
    pub date: String,
}

impl Record for Contribution {
    fn key(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn field(&self, field: Field) -> Option<Cow<'_, str>> {
        match field {
            Field::Id => Some(Cow::Borrowed(&self.id)),
            Field::Name => Some(Cow::Borrowed(&self.name)),
            Field::Purpose => Some(Cow::Borrowed(&self.purpose)),
            Field::Amount => Some(Cow::Borrowed(&self.amount)),
            Field::Date => Some(Cow::Borrowed(&self.date)),
            _ => None,
        }
    }
}

/// A ledger movement shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: String,
    pub date: String,
}

impl Record for Transaction {
    fn key(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn field(&self, field: Field) -> Option<Cow<'_, str>> {
        match field {
            Field::Id => Some(Cow::Borrowed(&self.id)),
            Field::Name => Some(Cow::Borrowed(&self.name)),
            Field::Type => Some(Cow::Borrowed(&self.kind)),
            Field::Amount => Some(Cow::Borrowed(&self.amount)),
            Field::Date => Some(Cow::Borrowed(&self.date)),
            _ => None,
        }
    }
}

/// Signed-in identity, from either the mock flow or an OAuth profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl User {
    pub fn with_email(email: &str) -> Self {
        Self {
            email: email.to_string(),
            name: None,
            id: None,
            picture: None,
        }
    }
}

// ---------------------------------------------------------------------------
// List configurations
// ---------------------------------------------------------------------------

const MEMBER_TOGGLES: &[Toggle] = &[
    Toggle { id: "active", label: "Active", category: "active", default_on: true },
    Toggle { id: "suspended", label: "Suspended", category: "deactivated", default_on: false },
    Toggle { id: "inactive", label: "Inactive", category: "pending", default_on: false },
    Toggle { id: "new-added", label: "New Added", category: "new", default_on: false },
];

pub static MEMBER_LIST: ListConfig = ListConfig {
    title: "Members",
    category: Field::Status,
    toggles: MEMBER_TOGGLES,
    sort_keys: &[SortKey::Name, SortKey::Date, SortKey::Id, SortKey::Status, SortKey::Role],
    default_sort: SortKey::Date,
    columns: &[Field::Id, Field::Name, Field::Role, Field::Email, Field::Status],
};

const CONTRIBUTION_TOGGLES: &[Toggle] = &[
    Toggle { id: "monthly", label: "Monthly", category: "Monthly Contribution", default_on: false },
    Toggle { id: "charitable", label: "Charitable", category: "Charitable contribution", default_on: false },
    Toggle { id: "levy", label: "Special Levy", category: "Special Levy", default_on: false },
];

pub static CONTRIBUTION_LIST: ListConfig = ListConfig {
    title: "Contributions",
    category: Field::Purpose,
    toggles: CONTRIBUTION_TOGGLES,
    sort_keys: &[SortKey::Name, SortKey::Date, SortKey::Id, SortKey::Amount, SortKey::Purpose],
    default_sort: SortKey::Date,
    columns: &[Field::Id, Field::Name, Field::Purpose, Field::Amount, Field::Date],
};

const TRANSACTION_TOGGLES: &[Toggle] = &[
    Toggle { id: "membership", label: "Membership", category: "Membership ID", default_on: false },
    Toggle { id: "deposit", label: "Deposit", category: "Deposit", default_on: false },
    Toggle { id: "withdrawal", label: "Withdrawal", category: "Withdrawal", default_on: false },
    Toggle { id: "loan", label: "Loan Repayment", category: "Loan Repayment", default_on: false },
];

pub static TRANSACTION_LIST: ListConfig = ListConfig {
    title: "Recent Transactions",
    category: Field::Type,
    toggles: TRANSACTION_TOGGLES,
    sort_keys: &[SortKey::Name, SortKey::Date, SortKey::Id, SortKey::Amount, SortKey::Type],
    default_sort: SortKey::Date,
    columns: &[Field::Id, Field::Name, Field::Amount, Field::Date, Field::Type],
};
