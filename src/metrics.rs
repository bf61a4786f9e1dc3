use chrono::{Datelike, NaiveDate};

use crate::db::{Store, CONTRIBUTIONS, MEMBERS, TRANSACTIONS};
use crate::error::Result;
use crate::fmt::parse_amount;
use crate::models::{Contribution, Member, MemberStatus, Transaction};
use crate::query::timestamp::parse_timestamp;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotal {
    /// First day of the month.
    pub month: NaiveDate,
    pub total: f64,
}

impl MonthTotal {
    pub fn label(&self) -> String {
        self.month.format("%b %Y").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_members: usize,
    pub active_members: usize,
    pub inactive_members: usize,
    pub balance: f64,
    pub total_contributions: f64,
    pub monthly_contributions: Vec<MonthTotal>,
}

/// Signed effect of a transaction type on the cooperative balance.
fn balance_sign(kind: &str) -> f64 {
    match kind.trim().to_ascii_lowercase().as_str() {
        "deposit" | "membership id" => 1.0,
        "withdrawal" => -1.0,
        _ => 0.0,
    }
}

pub fn compute(
    members: &[Member],
    contributions: &[Contribution],
    transactions: &[Transaction],
    reference_year: i32,
) -> Metrics {
    let active_members = members
        .iter()
        .filter(|m| m.status == MemberStatus::Active)
        .count();

    let total_contributions: f64 = contributions.iter().map(|c| parse_amount(&c.amount)).sum();
    let ledger: f64 = transactions
        .iter()
        .map(|t| balance_sign(&t.kind) * parse_amount(&t.amount))
        .sum();

    let mut monthly: Vec<MonthTotal> = Vec::new();
    for c in contributions {
        let Some(at) = parse_timestamp(&c.date, reference_year) else {
            tracing::debug!(id = %c.id, date = %c.date, "contribution date not understood");
            continue;
        };
        let Some(month) = NaiveDate::from_ymd_opt(at.year(), at.month(), 1) else {
            continue;
        };
        let amount = parse_amount(&c.amount);
        match monthly.iter_mut().find(|m| m.month == month) {
            Some(slot) => slot.total += amount,
            None => monthly.push(MonthTotal { month, total: amount }),
        }
    }
    monthly.sort_by_key(|m| m.month);

    Metrics {
        total_members: members.len(),
        active_members,
        inactive_members: members.len() - active_members,
        balance: ledger + total_contributions,
        total_contributions,
        monthly_contributions: monthly,
    }
}

pub fn load(store: &Store, reference_year: i32) -> Result<Metrics> {
    let members: Vec<Member> = store.collection(MEMBERS)?;
    let contributions: Vec<Contribution> = store.collection(CONTRIBUTIONS)?;
    let transactions: Vec<Transaction> = store.collection(TRANSACTIONS)?;
    Ok(compute(&members, &contributions, &transactions, reference_year))
}
