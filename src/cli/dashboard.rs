use chrono::{Datelike, Local};
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::list::{build_pipeline, print_page};
use super::{open_store, require_login, ListArgs};
use crate::db::TRANSACTIONS;
use crate::error::Result;
use crate::fmt::money;
use crate::metrics::{self, Metrics};
use crate::models::{Transaction, TRANSACTION_LIST};

fn print_metrics(m: &Metrics) {
    println!("{}", "Overview".bold());
    println!("  Total members:        {}", m.total_members);
    println!("  Active members:       {}", m.active_members.to_string().green());
    println!("  Inactive members:     {}", m.inactive_members.to_string().yellow());
    let balance = money(m.balance);
    println!(
        "  Balance:              {}",
        if m.balance < 0.0 { balance.red() } else { balance.green() }
    );
    println!("  Total contributions:  {}", money(m.total_contributions));
    println!();
}

fn print_monthly(m: &Metrics) {
    println!("{}", "Monthly contributions".bold());
    if m.monthly_contributions.is_empty() {
        println!("No contributions recorded.");
        println!();
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Month", "Total"]);
    for month in &m.monthly_contributions {
        table.add_row(vec![
            Cell::new(month.label()),
            Cell::new(money(month.total)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
    println!();
}

pub fn run(args: &ListArgs) -> Result<()> {
    let store = open_store()?;
    let user = require_login(&store)?;
    let year = Local::now().year();

    println!(
        "Welcome back, {}.",
        user.name.as_deref().unwrap_or(&user.email)
    );
    println!();

    let metrics = metrics::load(&store, year)?;
    print_metrics(&metrics);
    print_monthly(&metrics);

    let transactions: Vec<Transaction> = store.collection(TRANSACTIONS)?;
    let pipeline = build_pipeline(&TRANSACTION_LIST, transactions, args)?;
    print_page(&pipeline);
    Ok(())
}
