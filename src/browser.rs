use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    DefaultTerminal, Frame,
};

use crate::error::Result;
use crate::models::MemberStatus;
use crate::query::page::next_page_size;
use crate::query::sort::SortOrder;
use crate::query::{Field, ListPipeline, Record};
use crate::tui::{self, AMOUNT_STYLE, CHECKED_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

enum BrowseMode {
    Normal,
    Search(String),
    GotoPage(String),
}

/// Bulk actions offered over the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Activate,
    Deactivate,
}

impl BulkAction {
    pub fn status(&self) -> MemberStatus {
        match self {
            Self::Activate => MemberStatus::Active,
            Self::Deactivate => MemberStatus::Deactivated,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum BrowseAction {
    Continue,
    Close,
    Bulk(BulkAction),
}

/// Interactive table over any list pipeline.
pub struct ListBrowser<R: Record> {
    pipeline: ListPipeline<R>,
    cursor: usize,
    mode: BrowseMode,
    bulk_enabled: bool,
    status_message: Option<String>,
    table_state: TableState,
}

impl<R: Record> ListBrowser<R> {
    pub fn new(pipeline: ListPipeline<R>) -> Self {
        Self {
            pipeline,
            cursor: 0,
            mode: BrowseMode::Normal,
            bulk_enabled: false,
            status_message: None,
            table_state: TableState::default(),
        }
    }

    pub fn with_bulk_actions(mut self) -> Self {
        self.bulk_enabled = true;
        self
    }

    #[cfg(test)]
    pub fn pipeline(&self) -> &ListPipeline<R> {
        &self.pipeline
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_message = Some(msg);
    }

    /// Swap in fresh records after a write, e.g. a bulk status change.
    pub fn reload(&mut self, records: Vec<R>) {
        self.pipeline.replace_records(records);
        self.clamp_cursor();
    }

    /// Run until the user quits. `on_bulk` applies a bulk action to the
    /// selected keys and returns how many records changed along with the
    /// reloaded records.
    pub fn run(
        &mut self,
        mut on_bulk: impl FnMut(BulkAction, &[String]) -> Result<(usize, Vec<R>)>,
    ) -> Result<()> {
        if self.pipeline.records().is_empty() {
            println!("Nothing to show.");
            return Ok(());
        }
        tui::with_terminal(|terminal| self.event_loop(terminal, &mut on_bulk))
    }

    fn event_loop(
        &mut self,
        terminal: &mut DefaultTerminal,
        on_bulk: &mut impl FnMut(BulkAction, &[String]) -> Result<(usize, Vec<R>)>,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw_frame(frame))?;

            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
            {
                if kind != KeyEventKind::Press {
                    continue;
                }
                if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
                    break;
                }

                match self.handle_key_event(code) {
                    BrowseAction::Close => break,
                    BrowseAction::Continue => {}
                    BrowseAction::Bulk(action) => self.apply_bulk(action, on_bulk),
                }
            }
        }
        Ok(())
    }

    fn apply_bulk(
        &mut self,
        action: BulkAction,
        on_bulk: &mut impl FnMut(BulkAction, &[String]) -> Result<(usize, Vec<R>)>,
    ) {
        let keys = self.pipeline.selected_keys();
        match on_bulk(action, &keys) {
            Ok((changed, records)) => {
                self.reload(records);
                self.set_status(format!(
                    "{changed} of {} record(s) set to {}",
                    keys.len(),
                    action.status()
                ));
            }
            Err(e) => self.set_status(format!("Bulk action failed: {e}")),
        }
    }

    fn visible_len(&self) -> usize {
        self.pipeline.view().rows.len()
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.visible_len().saturating_sub(1));
    }

    /// Handle a key event. Returns a BrowseAction indicating what the caller should do.
    pub fn handle_key_event(&mut self, code: KeyCode) -> BrowseAction {
        self.status_message = None;

        match &self.mode {
            BrowseMode::Normal => return self.handle_normal_key(code),
            BrowseMode::Search(_) => match code {
                KeyCode::Esc => {
                    self.pipeline.set_query("");
                    self.mode = BrowseMode::Normal;
                }
                KeyCode::Enter => self.mode = BrowseMode::Normal,
                KeyCode::Backspace => self.edit_search(|q| {
                    q.pop();
                }),
                KeyCode::Char(c) => self.edit_search(|q| q.push(c)),
                _ => {}
            },
            BrowseMode::GotoPage(_) => match code {
                KeyCode::Esc => self.mode = BrowseMode::Normal,
                KeyCode::Enter => self.submit_goto(),
                KeyCode::Backspace => {
                    if let BrowseMode::GotoPage(s) = &mut self.mode {
                        s.pop();
                    }
                }
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    if let BrowseMode::GotoPage(s) = &mut self.mode {
                        s.push(c);
                    }
                }
                _ => {}
            },
        }
        self.clamp_cursor();
        BrowseAction::Continue
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> BrowseAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return BrowseAction::Close,
            KeyCode::Down => {
                if self.cursor + 1 < self.visible_len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char(' ') => {
                self.pipeline.toggle_row(self.cursor);
            }
            KeyCode::Char('a') => self.pipeline.toggle_all(),
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                self.pipeline.next_page();
                self.cursor = 0;
            }
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                self.pipeline.prev_page();
                self.cursor = 0;
            }
            KeyCode::Home => {
                self.pipeline.go_to_page(1);
                self.cursor = 0;
            }
            KeyCode::End => {
                self.pipeline.go_to_page(usize::MAX);
                self.cursor = 0;
            }
            KeyCode::Char('/') => {
                self.mode = BrowseMode::Search(self.pipeline.query().to_string());
            }
            KeyCode::Char('g') => self.mode = BrowseMode::GotoPage(String::new()),
            KeyCode::Char('0') => self.pipeline.clear_toggles(),
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                if let Some(toggle) = self.pipeline.config().toggles.get(idx) {
                    // Ids come from the table itself, so this cannot miss.
                    let _ = self.pipeline.flip_toggle(toggle.id);
                }
            }
            KeyCode::Char('s') => self.cycle_sort(),
            KeyCode::Char('r') => {
                let order = match self.pipeline.order() {
                    SortOrder::Ascending => SortOrder::Descending,
                    SortOrder::Descending => SortOrder::Ascending,
                };
                self.pipeline.set_order(order);
            }
            KeyCode::Char('z') => {
                let size = next_page_size(self.pipeline.page_size());
                let _ = self.pipeline.set_page_size(size);
            }
            KeyCode::Char('A') => return self.bulk(BulkAction::Activate),
            KeyCode::Char('D') => return self.bulk(BulkAction::Deactivate),
            _ => {}
        }
        self.clamp_cursor();
        BrowseAction::Continue
    }

    fn bulk(&mut self, action: BulkAction) -> BrowseAction {
        if !self.bulk_enabled {
            self.set_status("No bulk actions on this list".into());
            BrowseAction::Continue
        } else if self.pipeline.selection().is_empty() {
            self.set_status("Select rows first (space, or a for the whole page)".into());
            BrowseAction::Continue
        } else {
            BrowseAction::Bulk(action)
        }
    }

    fn cycle_sort(&mut self) {
        let keys = self.pipeline.config().sort_keys;
        let next = match self.pipeline.sort() {
            None => keys.first().copied(),
            Some(current) => {
                let idx = keys.iter().position(|k| *k == current).unwrap_or(0);
                keys.get((idx + 1) % keys.len()).copied()
            }
        };
        self.pipeline.set_sort(next);
    }

    fn edit_search(&mut self, edit: impl FnOnce(&mut String)) {
        if let BrowseMode::Search(q) = &mut self.mode {
            edit(q);
            let query = q.clone();
            self.pipeline.set_query(&query);
            self.cursor = 0;
        }
    }

    fn submit_goto(&mut self) {
        let mode = std::mem::replace(&mut self.mode, BrowseMode::Normal);
        if let BrowseMode::GotoPage(input) = mode {
            match input.trim().parse::<usize>() {
                Ok(page) if page >= 1 => {
                    self.pipeline.go_to_page(page);
                    self.cursor = 0;
                }
                _ => self.set_status(format!("Not a page number: {input}")),
            }
        }
    }

    fn title_line(&self) -> Line<'static> {
        let config = self.pipeline.config();
        let mut spans = vec![Span::styled(config.title.to_string(), HEADER_STYLE)];
        for (i, toggle) in config.toggles.iter().enumerate() {
            let on = self.pipeline.toggles().is_on(toggle.id);
            let text = format!("  {}:{}{}", i + 1, toggle.label, if on { "*" } else { "" });
            let style = if on { CHECKED_STYLE } else { FOOTER_STYLE };
            spans.push(Span::styled(text, style));
        }
        if !self.pipeline.query().is_empty() {
            spans.push(Span::raw(format!("  search: \"{}\"", self.pipeline.query())));
        }
        Line::from(spans)
    }

    fn status_line(&self) -> String {
        let view = self.pipeline.view();
        let sort = match self.pipeline.sort() {
            Some(key) => {
                let arrow = match self.pipeline.order() {
                    SortOrder::Ascending => "\u{2191}",
                    SortOrder::Descending => "\u{2193}",
                };
                format!("{} {arrow}", key.label())
            }
            None => "unsorted".to_string(),
        };
        let shown = if view.rows.is_empty() {
            "No results".to_string()
        } else {
            format!(
                "Showing {}-{} of {}",
                view.offset + 1,
                view.offset + view.rows.len(),
                view.total
            )
        };
        let mut status = format!(
            "{shown} | Page {}/{} | Sort: {sort} | {} per page | {} selected",
            view.current_page,
            view.total_pages,
            self.pipeline.page_size(),
            self.pipeline.selection().len(),
        );
        if let Some(msg) = &self.status_message {
            status.push_str(" | ");
            status.push_str(msg);
        }
        status
    }

    /// Draw the browser into the given frame.
    pub fn draw_frame(&mut self, frame: &mut Frame) {
        let areas = Layout::vertical([
            Constraint::Length(1), // title + filters
            Constraint::Fill(1),   // table
            Constraint::Length(1), // status
            Constraint::Length(1), // keys
        ])
        .split(frame.area());

        frame.render_widget(Paragraph::new(self.title_line()), areas[0]);

        let columns = self.pipeline.config().columns;
        let all_selected = self.pipeline.is_all_selected();
        let mut widths = vec![Constraint::Length(3)];
        let mut header = vec![Cell::from(if all_selected { "[x]" } else { "[ ]" })];
        for field in columns {
            widths.push(match field {
                Field::Name | Field::Email => Constraint::Fill(2),
                Field::Id | Field::Amount => Constraint::Length(16),
                _ => Constraint::Fill(1),
            });
            header.push(Cell::from(field.label()));
        }

        let view = self.pipeline.view();
        let rows: Vec<Row> = view
            .rows
            .iter()
            .map(|record| {
                let checked = self.pipeline.selection().is_selected(record.key());
                let mut cells = vec![if checked {
                    Cell::from(Span::styled("[x]", CHECKED_STYLE))
                } else {
                    Cell::from("[ ]")
                }];
                for field in columns {
                    let text = match field {
                        Field::Name => record.display_name().into_owned(),
                        other => record.field(*other).map(|v| v.into_owned()).unwrap_or_default(),
                    };
                    let text = tui::truncate(&text, 40);
                    cells.push(match field {
                        Field::Amount => Cell::from(Span::styled(text, AMOUNT_STYLE)),
                        Field::Status | Field::Type => {
                            let style = tui::badge_style(&text);
                            Cell::from(Span::styled(text, style))
                        }
                        _ => Cell::from(text),
                    });
                }
                Row::new(cells)
            })
            .collect();
        let has_rows = !rows.is_empty();

        self.table_state
            .select(if has_rows { Some(self.cursor) } else { None });
        let table = Table::new(rows, widths)
            .header(Row::new(header).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, areas[1], &mut self.table_state);

        frame.render_widget(
            Paragraph::new(self.status_line()).style(FOOTER_STYLE),
            areas[2],
        );

        let keys_widget = match &self.mode {
            BrowseMode::Normal => {
                let bulk = if self.bulk_enabled { "  A/D:activate/deactivate" } else { "" };
                Paragraph::new(format!(
                    "\u{2191}/\u{2193}:move  space:select  a:all  n/p:page  g:goto  /:search  1-9:filter  0:clear  s:sort  r:reverse  z:size{bulk}  q:quit"
                ))
                .style(FOOTER_STYLE)
            }
            BrowseMode::Search(input) => Paragraph::new(format!("Search: {input}\u{2588}")),
            BrowseMode::GotoPage(input) => Paragraph::new(format!("Go to page: {input}\u{2588}")),
        };
        frame.render_widget(keys_widget, areas[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Member, Transaction, MEMBER_LIST, TRANSACTION_LIST};
    use crate::query::sort::SortKey;

    fn make_txns(n: usize) -> Vec<Transaction> {
        (0..n)
            .map(|i| Transaction {
                id: format!("SG{:04}", i),
                name: format!("Member {:02}", i),
                kind: if i % 2 == 0 { "Deposit" } else { "Withdrawal" }.to_string(),
                amount: format!("\u{20A6}{}.00", (i + 1) * 100),
                date: format!("{} Jan, 10:00 AM", (i % 28) + 1),
            })
            .collect()
    }

    fn browser(n: usize) -> ListBrowser<Transaction> {
        ListBrowser::new(ListPipeline::new(&TRANSACTION_LIST, make_txns(n)).with_reference_year(2025))
    }

    fn press(b: &mut ListBrowser<Transaction>, keys: &str) {
        for c in keys.chars() {
            b.handle_key_event(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_handle_key_returns_close_on_q() {
        let mut b = browser(5);
        assert_eq!(b.handle_key_event(KeyCode::Char('q')), BrowseAction::Close);
        assert_eq!(browser(5).handle_key_event(KeyCode::Esc), BrowseAction::Close);
    }

    #[test]
    fn test_page_navigation_resets_cursor() {
        let mut b = browser(23);
        b.handle_key_event(KeyCode::Down);
        b.handle_key_event(KeyCode::Down);
        assert_eq!(b.cursor, 2);
        assert_eq!(b.handle_key_event(KeyCode::Char('n')), BrowseAction::Continue);
        assert_eq!(b.pipeline().page(), 2);
        assert_eq!(b.cursor, 0);
        b.handle_key_event(KeyCode::End);
        assert_eq!(b.pipeline().page(), 3);
        b.handle_key_event(KeyCode::Left);
        assert_eq!(b.pipeline().page(), 2);
    }

    #[test]
    fn test_cursor_stays_on_page() {
        let mut b = browser(3);
        for _ in 0..10 {
            b.handle_key_event(KeyCode::Down);
        }
        assert_eq!(b.cursor, 2);
        b.handle_key_event(KeyCode::Up);
        assert_eq!(b.cursor, 1);
    }

    #[test]
    fn test_space_and_a_select() {
        let mut b = browser(23);
        press(&mut b, " ");
        assert_eq!(b.pipeline().selection().len(), 1);
        press(&mut b, "a");
        assert!(b.pipeline().is_all_selected());
        press(&mut b, "a");
        assert!(b.pipeline().selection().is_empty());
    }

    #[test]
    fn test_sort_change_clears_selection() {
        let mut b = browser(23);
        press(&mut b, "a");
        assert_eq!(b.pipeline().selection().len(), 10);
        press(&mut b, "s");
        assert!(b.pipeline().selection().is_empty());
        assert_ne!(b.pipeline().sort(), Some(SortKey::Date));
    }

    #[test]
    fn test_search_mode_filters_live() {
        let mut b = browser(23);
        b.handle_key_event(KeyCode::Char('n'));
        press(&mut b, "/");
        press(&mut b, "member 2");
        assert_eq!(b.pipeline().query(), "member 2");
        // Member 20, 21, 22
        assert_eq!(b.pipeline().view().total, 3);
        assert_eq!(b.pipeline().page(), 1);

        b.handle_key_event(KeyCode::Backspace);
        assert_eq!(b.pipeline().query(), "member ");
        b.handle_key_event(KeyCode::Esc);
        assert_eq!(b.pipeline().query(), "");
        assert!(matches!(b.mode, BrowseMode::Normal));
    }

    #[test]
    fn test_number_keys_flip_toggles() {
        let mut b = browser(23);
        // 2 = deposit
        press(&mut b, "2");
        assert!(b.pipeline().toggles().is_on("deposit"));
        assert_eq!(b.pipeline().view().total, 12);
        press(&mut b, "0");
        assert!(!b.pipeline().toggles().any_active());
        assert_eq!(b.pipeline().view().total, 23);
    }

    #[test]
    fn test_goto_page() {
        let mut b = browser(50);
        press(&mut b, "g3");
        b.handle_key_event(KeyCode::Enter);
        assert_eq!(b.pipeline().page(), 3);

        press(&mut b, "g");
        b.handle_key_event(KeyCode::Enter);
        assert!(b.status_message.is_some());
        assert_eq!(b.pipeline().page(), 3);
    }

    #[test]
    fn test_page_size_and_reverse() {
        let mut b = browser(23);
        b.handle_key_event(KeyCode::Char('n'));
        press(&mut b, "z");
        assert_eq!(b.pipeline().page_size(), 20);
        assert_eq!(b.pipeline().page(), 1);
        press(&mut b, "r");
        assert_eq!(b.pipeline().order(), SortOrder::Descending);
    }

    #[test]
    fn test_bulk_needs_support_and_selection() {
        let mut b = browser(5);
        assert_eq!(b.handle_key_event(KeyCode::Char('A')), BrowseAction::Continue);
        assert!(b.status_message.as_deref().unwrap().contains("No bulk actions"));

        let members = vec![Member {
            id: "m1".into(),
            first_name: "Grace".into(),
            last_name: "Molero".into(),
            status: MemberStatus::Active,
            ..Member::default()
        }];
        let mut mb = ListBrowser::new(ListPipeline::new(&MEMBER_LIST, members)).with_bulk_actions();
        assert_eq!(mb.handle_key_event(KeyCode::Char('D')), BrowseAction::Continue);
        mb.handle_key_event(KeyCode::Char(' '));
        assert_eq!(
            mb.handle_key_event(KeyCode::Char('D')),
            BrowseAction::Bulk(BulkAction::Deactivate)
        );
    }

    #[test]
    fn test_bulk_status_reports_records_changed() {
        let member = |id: &str, status| Member {
            id: id.into(),
            first_name: "Grace".into(),
            last_name: "Molero".into(),
            status,
            ..Member::default()
        };
        let members = vec![member("m1", MemberStatus::Active), member("m2", MemberStatus::Pending)];
        let mut mb = ListBrowser::new(ListPipeline::new(&MEMBER_LIST, members.clone()))
            .with_bulk_actions();
        mb.handle_key_event(KeyCode::Char('0'));
        mb.handle_key_event(KeyCode::Char('a'));

        let mut seen = Vec::new();
        mb.apply_bulk(BulkAction::Activate, &mut |action, keys: &[String]| {
            seen = keys.to_vec();
            assert_eq!(action, BulkAction::Activate);
            Ok((1, members.clone()))
        });
        assert_eq!(seen.len(), 2);
        assert_eq!(mb.status_message.as_deref(), Some("1 of 2 record(s) set to active"));
        assert!(mb.pipeline().selection().is_empty());

        mb.apply_bulk(BulkAction::Deactivate, &mut |_, _: &[String]| {
            Err(crate::error::TentlyError::Other("disk full".into()))
        });
        assert!(mb.status_message.as_deref().unwrap().contains("disk full"));
    }

    #[test]
    fn test_reload_clears_selection() {
        let mut b = browser(23);
        press(&mut b, "a");
        b.reload(make_txns(3));
        assert!(b.pipeline().selection().is_empty());
        assert_eq!(b.pipeline().view().total, 3);
    }
}
