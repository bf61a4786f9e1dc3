use chrono::{Local, NaiveDate};
use colored::Colorize;
use comfy_table::{Cell, Table};

use super::ListArgs;
use crate::error::{Result, TentlyError};
use crate::query::page::{check_page_size, DEFAULT_PAGE_SIZE};
use crate::query::sort::{SortKey, SortOrder};
use crate::query::timestamp::{parse_day, DateRange, RANGE_PRESETS};
use crate::query::{Field, ListConfig, ListPipeline, Record};
use crate::settings::load_settings;

fn date_range(args: &ListArgs, today: NaiveDate) -> Result<Option<DateRange>> {
    if let Some(preset) = &args.range {
        return DateRange::preset(preset, today).map(Some).ok_or_else(|| {
            TentlyError::Other(format!(
                "Unknown range: {preset} (expected one of {})",
                RANGE_PRESETS.join(", ")
            ))
        });
    }
    let from = args.from.as_deref().map(parse_day).transpose()?;
    let to = args.to.as_deref().map(parse_day).transpose()?;
    Ok(match (from, to) {
        (None, None) => None,
        (Some(from), None) => Some(DateRange::new(from, today.max(from))),
        (None, Some(to)) => Some(DateRange::new(NaiveDate::MIN, to)),
        (Some(from), Some(to)) => Some(DateRange::new(from, to)),
    })
}

fn page_size(args: &ListArgs) -> Result<usize> {
    match args.page_size {
        Some(size) => check_page_size(size),
        None => {
            let configured = load_settings().page_size;
            Ok(check_page_size(configured).unwrap_or_else(|_| {
                tracing::warn!("settings page_size {configured} is not allowed, using {DEFAULT_PAGE_SIZE}");
                DEFAULT_PAGE_SIZE
            }))
        }
    }
}

/// Apply command-line list options to a fresh pipeline.
pub fn build_pipeline<R: Record>(
    config: &'static ListConfig,
    records: Vec<R>,
    args: &ListArgs,
) -> Result<ListPipeline<R>> {
    let mut pipeline = ListPipeline::new(config, records);

    if args.all || !args.filters.is_empty() {
        pipeline.clear_toggles();
    }
    for id in &args.filters {
        pipeline.set_toggle(id, true)?;
    }
    if let Some(q) = &args.search {
        pipeline.set_query(q);
    }
    if let Some(raw) = &args.sort {
        let key: SortKey = raw.parse()?;
        if !config.sort_keys.contains(&key) {
            return Err(TentlyError::UnknownSortKey(format!(
                "{raw} (this list sorts by {})",
                config
                    .sort_keys
                    .iter()
                    .map(SortKey::key)
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        pipeline.set_sort(Some(key));
    }
    if args.desc {
        pipeline.set_order(SortOrder::Descending);
    }
    pipeline.set_date_range(date_range(args, Local::now().date_naive())?);
    pipeline.set_page_size(page_size(args)?)?;
    pipeline.go_to_page(args.page);
    Ok(pipeline)
}

fn cell_text<R: Record>(record: &R, field: Field) -> String {
    match field {
        Field::Name => record.display_name().into_owned(),
        other => record.field(other).map(|v| v.into_owned()).unwrap_or_default(),
    }
}

/// One-line summary of the filters in force, for the table caption.
fn describe<R: Record>(pipeline: &ListPipeline<R>) -> String {
    let config = pipeline.config();
    let mut parts = Vec::new();
    let active: Vec<&str> = config
        .toggles
        .iter()
        .filter(|t| pipeline.toggles().is_on(t.id))
        .map(|t| t.label)
        .collect();
    parts.push(if active.is_empty() {
        "all".to_string()
    } else {
        active.join(" or ")
    });
    if !pipeline.query().is_empty() {
        parts.push(format!("search: \"{}\"", pipeline.query()));
    }
    if let Some(range) = pipeline.date_range() {
        parts.push(format!("{} to {}", range.from, range.to));
    }
    parts.join(", ")
}

/// Print the current page of a pipeline as a table, with a page footer.
pub fn print_page<R: Record>(pipeline: &ListPipeline<R>) {
    let config = pipeline.config();
    let view = pipeline.view();

    println!("{} ({})", config.title.bold(), describe(pipeline));
    if view.rows.is_empty() {
        println!("No results found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(config.columns.iter().map(|f| f.label()).collect::<Vec<_>>());
    for record in &view.rows {
        table.add_row(
            config
                .columns
                .iter()
                .map(|f| Cell::new(cell_text(*record, *f)))
                .collect::<Vec<_>>(),
        );
    }
    println!("{table}");

    let sort = match pipeline.sort() {
        Some(key) => format!(
            "{} {}",
            key.key(),
            match pipeline.order() {
                SortOrder::Ascending => "asc",
                SortOrder::Descending => "desc",
            }
        ),
        None => "none".to_string(),
    };
    println!(
        "{}",
        format!(
            "Showing {}-{} of {} | Page {} of {} | Sort: {sort}",
            view.offset + 1,
            view.offset + view.rows.len(),
            view.total,
            view.current_page,
            view.total_pages,
        )
        .dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Member, Transaction, MEMBER_LIST, TRANSACTION_LIST};

    fn txns() -> Vec<Transaction> {
        (0..23)
            .map(|i| Transaction {
                id: format!("SG{i:04}"),
                name: format!("Member {i:02}"),
                kind: if i % 2 == 0 { "Deposit" } else { "Withdrawal" }.to_string(),
                amount: format!("\u{20A6}{}.00", (i + 1) * 100),
                date: format!("2025-01-{:02}", i + 1),
            })
            .collect()
    }

    fn args() -> ListArgs {
        ListArgs {
            page: 1,
            page_size: Some(10),
            ..ListArgs::default()
        }
    }

    #[test]
    fn test_filters_replace_defaults() {
        let a = ListArgs {
            filters: vec!["withdrawal".into()],
            ..args()
        };
        let p = build_pipeline(&TRANSACTION_LIST, txns(), &a).unwrap();
        assert_eq!(p.view().total, 11);
    }

    #[test]
    fn test_all_clears_member_default_toggle() {
        let p = build_pipeline(&MEMBER_LIST, Vec::<Member>::new(), &ListArgs { all: true, ..args() }).unwrap();
        assert!(!p.toggles().any_active());
        let p = build_pipeline(&MEMBER_LIST, Vec::<Member>::new(), &args()).unwrap();
        assert!(p.toggles().is_on("active"));
    }

    #[test]
    fn test_unknown_filter_and_sort() {
        let a = ListArgs {
            filters: vec!["dividend".into()],
            ..args()
        };
        assert!(matches!(
            build_pipeline(&TRANSACTION_LIST, txns(), &a),
            Err(TentlyError::UnknownFilter(_))
        ));
        // Members have no amount column.
        let a = ListArgs {
            sort: Some("amount".into()),
            ..args()
        };
        assert!(matches!(
            build_pipeline(&MEMBER_LIST, Vec::<Member>::new(), &a),
            Err(TentlyError::UnknownSortKey(_))
        ));
    }

    #[test]
    fn test_page_is_applied_after_everything_else() {
        let a = ListArgs {
            sort: Some("amount".into()),
            desc: true,
            page: 3,
            ..args()
        };
        let p = build_pipeline(&TRANSACTION_LIST, txns(), &a).unwrap();
        assert_eq!(p.page(), 3);
        assert_eq!(p.view().rows.len(), 3);
        assert_eq!(p.view().rows[0].id, "SG0002");
    }

    #[test]
    fn test_date_bounds() {
        let a = ListArgs {
            from: Some("2025-01-05".into()),
            to: Some("2025-01-07".into()),
            ..args()
        };
        let p = build_pipeline(&TRANSACTION_LIST, txns(), &a).unwrap();
        assert_eq!(p.view().total, 3);

        let a = ListArgs {
            to: Some("2025-01-02".into()),
            ..args()
        };
        let p = build_pipeline(&TRANSACTION_LIST, txns(), &a).unwrap();
        assert_eq!(p.view().total, 2);

        let bad = ListArgs {
            from: Some("05/01/2025".into()),
            ..args()
        };
        assert!(matches!(
            build_pipeline(&TRANSACTION_LIST, txns(), &bad),
            Err(TentlyError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_unknown_range_preset() {
        let a = ListArgs {
            range: Some("fortnight".into()),
            ..args()
        };
        assert!(build_pipeline(&TRANSACTION_LIST, txns(), &a).is_err());
    }

    #[test]
    fn test_invalid_page_size() {
        let a = ListArgs {
            page_size: Some(7),
            ..args()
        };
        assert!(matches!(
            build_pipeline(&TRANSACTION_LIST, txns(), &a),
            Err(TentlyError::InvalidPageSize(7))
        ));
    }
}
