use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use super::timestamp::parse_timestamp;
use super::{Field, Record};
use crate::error::TentlyError;
use crate::fmt::parse_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Id,
    Date,
    Amount,
    Status,
    Role,
    Type,
    Purpose,
}

pub const ALL_SORT_KEYS: &[SortKey] = &[
    SortKey::Name,
    SortKey::Id,
    SortKey::Date,
    SortKey::Amount,
    SortKey::Status,
    SortKey::Role,
    SortKey::Type,
    SortKey::Purpose,
];

impl SortKey {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Id => "id",
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Status => "status",
            Self::Role => "role",
            Self::Type => "type",
            Self::Purpose => "purpose",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name A \u{2192} Z",
            Self::Id => "ID",
            Self::Date => "Date",
            Self::Amount => "Amount",
            Self::Status => "Status",
            Self::Role => "Role",
            Self::Type => "Type",
            Self::Purpose => "Purpose",
        }
    }

    pub fn field(&self) -> Field {
        match self {
            Self::Name => Field::Name,
            Self::Id => Field::Id,
            Self::Date => Field::Date,
            Self::Amount => Field::Amount,
            Self::Status => Field::Status,
            Self::Role => Field::Role,
            Self::Type => Field::Type,
            Self::Purpose => Field::Purpose,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SortKey {
    type Err = TentlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ALL_SORT_KEYS
            .iter()
            .find(|k| k.key() == wanted)
            .copied()
            .ok_or_else(|| TentlyError::UnknownSortKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Pre-extracted comparison value for one record.
#[derive(Debug)]
enum SortValue<'a> {
    Missing,
    Text(Cow<'a, str>),
    Number(f64),
    When(Option<NaiveDateTime>, Cow<'a, str>),
}

fn sort_value<R: Record>(record: &R, key: SortKey, year: i32) -> SortValue<'_> {
    let raw = match key {
        SortKey::Name => Some(record.display_name()),
        other => record.field(other.field()),
    };
    let Some(raw) = raw else {
        return SortValue::Missing;
    };
    match key {
        SortKey::Amount => SortValue::Number(parse_amount(&raw)),
        SortKey::Date => SortValue::When(parse_timestamp(&raw, year), raw),
        _ => SortValue::Text(raw),
    }
}

fn compare_values(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        // Parsed stamps first in calendar order, unparseable ones after by raw text.
        (SortValue::When(x, rx), SortValue::When(y, ry)) => match (x, y) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => rx.cmp(ry),
        },
        _ => Ordering::Equal,
    }
}

/// Stable sort of the filtered rows. `None` leaves the order untouched, as does
/// a key the entity does not carry.
pub fn sort_records<'a, R: Record>(
    rows: Vec<&'a R>,
    key: Option<SortKey>,
    order: SortOrder,
    year: i32,
) -> Vec<&'a R> {
    let Some(key) = key else {
        return rows;
    };
    let mut keyed: Vec<(SortValue<'a>, &'a R)> =
        rows.into_iter().map(|r| (sort_value(r, key, year), r)).collect();
    keyed.sort_by(|(a, _), (b, _)| match order {
        SortOrder::Ascending => compare_values(a, b),
        SortOrder::Descending => compare_values(b, a),
    });
    keyed.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Member, MemberStatus, Transaction};

    fn txn(id: &str, name: &str, amount: &str, date: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            name: name.to_string(),
            kind: "Deposit".to_string(),
            amount: amount.to_string(),
            date: date.to_string(),
        }
    }

    fn names(rows: &[&Transaction]) -> Vec<String> {
        rows.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_parse_sort_key() {
        assert_eq!("name".parse::<SortKey>().unwrap(), SortKey::Name);
        assert_eq!(" Amount ".parse::<SortKey>().unwrap(), SortKey::Amount);
        assert!(matches!(
            "colour".parse::<SortKey>(),
            Err(TentlyError::UnknownSortKey(_))
        ));
    }

    #[test]
    fn test_name_and_amount_end_to_end() {
        let records = vec![
            txn("A", "Zed", "₦500.00", "25 Jan"),
            txn("B", "Amy", "₦50.00", "26 Jan"),
        ];
        let rows: Vec<&Transaction> = records.iter().collect();
        let by_name = sort_records(rows.clone(), Some(SortKey::Name), SortOrder::Ascending, 2024);
        assert_eq!(names(&by_name), vec!["Amy", "Zed"]);
        let by_amount = sort_records(rows, Some(SortKey::Amount), SortOrder::Ascending, 2024);
        assert_eq!(names(&by_amount), vec!["Amy", "Zed"]);
    }

    #[test]
    fn test_amount_is_numeric_not_lexicographic() {
        let records = vec![
            txn("1", "one-thousand", "₦1,000.00", ""),
            txn("2", "two-hundred", "₦200.00", ""),
            txn("3", "fifty-thousand", "₦50,000.00", ""),
        ];
        let sorted = sort_records(
            records.iter().collect(),
            Some(SortKey::Amount),
            SortOrder::Ascending,
            2024,
        );
        assert_eq!(names(&sorted), vec!["two-hundred", "one-thousand", "fifty-thousand"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        // Same name everywhere; the id records the original position.
        let records: Vec<Transaction> = (0..8)
            .map(|i| txn(&i.to_string(), "Grace Molero", if i % 2 == 0 { "₦1.00" } else { "₦2.00" }, ""))
            .collect();
        let sorted = sort_records(records.iter().collect(), Some(SortKey::Name), SortOrder::Ascending, 2024);
        let ids: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5", "6", "7"]);

        let sorted = sort_records(records.iter().collect(), Some(SortKey::Amount), SortOrder::Ascending, 2024);
        let ids: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "2", "4", "6", "1", "3", "5", "7"]);

        let sorted = sort_records(records.iter().collect(), Some(SortKey::Amount), SortOrder::Descending, 2024);
        let ids: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "5", "7", "0", "2", "4", "6"]);
    }

    #[test]
    fn test_date_sort_is_calendar_correct() {
        let records = vec![
            txn("a", "ten", "₦1.00", "10 Jan, 09:00 AM"),
            txn("b", "two", "₦1.00", "2 Jan, 11:00 PM"),
            txn("c", "feb", "₦1.00", "1 Feb, 08:00 AM"),
            txn("d", "junk", "₦1.00", "pending"),
        ];
        let sorted = sort_records(records.iter().collect(), Some(SortKey::Date), SortOrder::Ascending, 2024);
        assert_eq!(names(&sorted), vec!["two", "ten", "feb", "junk"]);
    }

    #[test]
    fn test_no_key_passes_through() {
        let records = vec![txn("b", "Zed", "₦1.00", ""), txn("a", "Amy", "₦2.00", "")];
        let sorted = sort_records(records.iter().collect(), None, SortOrder::Ascending, 2024);
        assert_eq!(names(&sorted), vec!["Zed", "Amy"]);
    }

    #[test]
    fn test_key_missing_on_entity_passes_through() {
        let records = vec![
            Member { id: "2".into(), first_name: "Zed".into(), status: MemberStatus::Active, ..Member::default() },
            Member { id: "1".into(), first_name: "Amy".into(), status: MemberStatus::Active, ..Member::default() },
        ];
        let sorted = sort_records(records.iter().collect(), Some(SortKey::Amount), SortOrder::Ascending, 2024);
        let ids: Vec<&str> = sorted.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_id_and_status_are_lexicographic() {
        let records = vec![
            Member { id: "SG10".into(), status: MemberStatus::Pending, ..Member::default() },
            Member { id: "SG02".into(), status: MemberStatus::Active, ..Member::default() },
        ];
        let by_id = sort_records(records.iter().collect(), Some(SortKey::Id), SortOrder::Ascending, 2024);
        assert_eq!(by_id[0].id, "SG02");
        let by_status = sort_records(records.iter().collect(), Some(SortKey::Status), SortOrder::Descending, 2024);
        assert_eq!(by_status[0].status, MemberStatus::Pending);
    }
}
