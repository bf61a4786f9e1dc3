//! List query pipeline shared by the Members, Contributions and Dashboard
//! tables: text search and category toggles, a stable sort, fixed-size
//! pages, and a selection over the visible page.
//!
//! Every read goes through [`ListPipeline::view`], which recomputes
//! filter → sort → paginate from scratch. Setters that change which record
//! sits at which position send the list back to page 1 and drop the
//! selection.

pub mod filter;
pub mod page;
pub mod selection;
pub mod sort;
pub mod timestamp;

use std::borrow::Cow;

use chrono::{Datelike, Local};

use crate::error::Result;
use filter::{matches_date_range, ToggleState};
use page::{check_page_size, paginate, DEFAULT_PAGE_SIZE};
use selection::Selection;
use sort::{sort_records, SortKey, SortOrder};
use timestamp::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Name,
    Email,
    Role,
    Status,
    Type,
    Purpose,
    Amount,
    Date,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Role => "Role",
            Self::Status => "Status",
            Self::Type => "Type",
            Self::Purpose => "Purpose",
            Self::Amount => "Amount",
            Self::Date => "Date",
        }
    }
}

/// A flat row that can flow through the pipeline.
pub trait Record {
    /// Natural key, used for selection.
    fn key(&self) -> &str;
    fn display_name(&self) -> Cow<'_, str>;
    /// Value of `field`, or `None` when this entity has no such field.
    fn field(&self, field: Field) -> Option<Cow<'_, str>>;
}

/// Named switch mapping a filter label onto a stored category value.
#[derive(Debug, Clone, Copy)]
pub struct Toggle {
    pub id: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub default_on: bool,
}

/// Per-entity accessor configuration.
#[derive(Debug)]
pub struct ListConfig {
    pub title: &'static str,
    /// Field the toggles are matched against.
    pub category: Field,
    pub toggles: &'static [Toggle],
    pub sort_keys: &'static [SortKey],
    pub default_sort: SortKey,
    pub columns: &'static [Field],
}

/// Result of one synchronous filter → sort → paginate pass.
#[derive(Debug)]
pub struct PageView<'a, R> {
    pub rows: Vec<&'a R>,
    /// Records left after filtering.
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
    /// Index of the first visible row within the filtered sequence.
    pub offset: usize,
}

impl<R: Record> PageView<'_, R> {
    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key()).collect()
    }
}

pub struct ListPipeline<R> {
    config: &'static ListConfig,
    records: Vec<R>,
    query: String,
    toggles: ToggleState,
    sort: Option<SortKey>,
    order: SortOrder,
    date_range: Option<DateRange>,
    page_size: usize,
    page: usize,
    selection: Selection,
    reference_year: i32,
}

impl<R: Record> ListPipeline<R> {
    pub fn new(config: &'static ListConfig, records: Vec<R>) -> Self {
        Self {
            config,
            records,
            query: String::new(),
            toggles: ToggleState::defaults(config.toggles),
            sort: Some(config.default_sort),
            order: SortOrder::Ascending,
            date_range: None,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
            selection: Selection::default(),
            reference_year: Local::now().year(),
        }
    }

    /// Year assumed for timestamps that do not carry one.
    #[cfg(test)]
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    pub fn config(&self) -> &'static ListConfig {
        self.config
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Swap in a fresh copy of the data, e.g. after an edit was persisted.
    /// Positions may shift, so the selection goes; the page is kept.
    pub fn replace_records(&mut self, records: Vec<R>) {
        self.records = records;
        self.selection.clear();
        self.page = self.view().current_page;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.reset();
    }

    pub fn toggles(&self) -> &ToggleState {
        &self.toggles
    }

    pub fn set_toggle(&mut self, id: &str, on: bool) -> Result<()> {
        self.toggles.set(id, on)?;
        self.reset();
        Ok(())
    }

    pub fn flip_toggle(&mut self, id: &str) -> Result<bool> {
        let on = self.toggles.toggle(id)?;
        self.reset();
        Ok(on)
    }

    /// Turn every toggle off so all records pass.
    pub fn clear_toggles(&mut self) {
        self.toggles = ToggleState::none(self.config.toggles);
        self.reset();
    }

    pub fn sort(&self) -> Option<SortKey> {
        self.sort
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn set_sort(&mut self, key: Option<SortKey>) {
        self.sort = key;
        self.reset();
    }

    pub fn set_order(&mut self, order: SortOrder) {
        self.order = order;
        self.reset();
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.date_range = range;
        self.reset();
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, size: usize) -> Result<()> {
        self.page_size = check_page_size(size)?;
        self.reset();
        Ok(())
    }

    /// Current page, always within `1..=total_pages`.
    #[cfg(test)]
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn go_to_page(&mut self, page: usize) {
        let total = page::total_pages(self.filtered().len(), self.page_size);
        let target = page.clamp(1, total);
        if target != self.page {
            self.selection.clear();
        }
        self.page = target;
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.go_to_page(self.page.saturating_sub(1));
    }

    fn reset(&mut self) {
        self.page = 1;
        self.selection.clear();
    }

    fn filtered(&self) -> Vec<&R> {
        let range = self.date_range.as_ref();
        filter::filter(&self.records, &self.query, &self.toggles, self.config)
            .into_iter()
            .filter(|r| matches_date_range(*r, range, self.reference_year))
            .collect()
    }

    pub fn view(&self) -> PageView<'_, R> {
        let sorted = sort_records(self.filtered(), self.sort, self.order, self.reference_year);
        let page = paginate(sorted.len(), self.page_size, self.page);
        let total = sorted.len();
        let offset = page.range.start;
        let rows = sorted[page.range].to_vec();
        PageView {
            rows,
            total,
            total_pages: page.total_pages,
            current_page: page.current_page,
            offset,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Toggle the row at `position` on the visible page. Positions past the
    /// end of the page are ignored.
    pub fn toggle_row(&mut self, position: usize) -> bool {
        let key = self.view().rows.get(position).map(|r| r.key().to_string());
        match key {
            Some(key) => self.selection.toggle_one(&key),
            None => false,
        }
    }

    pub fn toggle_all(&mut self) {
        let keys: Vec<String> = self.view().keys().into_iter().map(str::to_string).collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.selection.toggle_all(&refs);
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(self.view().rows.len())
    }

    pub fn selected_keys(&self) -> Vec<String> {
        self.selection.keys().map(str::to_string).collect()
    }
}
