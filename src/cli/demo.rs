use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};

use super::open_store;
use crate::db::{Store, CONTRIBUTIONS, MEMBERS, TRANSACTIONS};
use crate::error::Result;
use crate::fmt::money;
use crate::models::{Contribution, Member, MemberStatus, Transaction};

struct DemoMember {
    first: &'static str,
    last: &'static str,
    role: &'static str,
    occupation: &'static str,
    state: &'static str,
    status: MemberStatus,
}

const MEMBERS_SEED: &[DemoMember] = &[
    DemoMember { first: "Grace", last: "Molero", role: "President", occupation: "Teacher", state: "Lagos", status: MemberStatus::Active },
    DemoMember { first: "Bryan", last: "Edwards", role: "Vice-President", occupation: "Engineer", state: "Oyo", status: MemberStatus::Active },
    DemoMember { first: "Amaka", last: "Okafor", role: "Secretary", occupation: "Accountant", state: "Anambra", status: MemberStatus::Active },
    DemoMember { first: "Tunde", last: "Bakare", role: "Assistant Secretary", occupation: "Trader", state: "Ogun", status: MemberStatus::Pending },
    DemoMember { first: "Ngozi", last: "Eze", role: "Treasurer", occupation: "Banker", state: "Enugu", status: MemberStatus::Active },
    DemoMember { first: "Ibrahim", last: "Musa", role: "Assistant Treasurer", occupation: "Farmer", state: "Kano", status: MemberStatus::Deactivated },
    DemoMember { first: "Funke", last: "Adeyemi", role: "Board of Directors (BOD)", occupation: "Pharmacist", state: "Lagos", status: MemberStatus::Active },
    DemoMember { first: "Chidi", last: "Nwosu", role: "General Assembly", occupation: "Driver", state: "Imo", status: MemberStatus::New },
    DemoMember { first: "Halima", last: "Sani", role: "General Assembly", occupation: "Nurse", state: "Kaduna", status: MemberStatus::Active },
    DemoMember { first: "Segun", last: "Oladipo", role: "General Assembly", occupation: "Tailor", state: "Osun", status: MemberStatus::Pending },
    DemoMember { first: "Aisha", last: "Bello", role: "General Assembly", occupation: "Caterer", state: "Kwara", status: MemberStatus::New },
    DemoMember { first: "Emeka", last: "Obi", role: "Board of Directors (BOD)", occupation: "Lawyer", state: "Abia", status: MemberStatus::Active },
];

/// (purpose, base amount, day of month)
const CONTRIBUTION_PLAN: &[(&str, f64, u32)] = &[
    ("Monthly Contribution", 5000.0, 3),
    ("Monthly Contribution", 5000.0, 4),
    ("Special Levy", 2500.0, 12),
    ("Charitable contribution", 1500.0, 20),
];

/// (type, base amount, day of month)
const TRANSACTION_PLAN: &[(&str, f64, u32)] = &[
    ("Deposit", 20000.0, 2),
    ("Membership ID", 1000.0, 6),
    ("Withdrawal", 7500.0, 14),
    ("Loan Repayment", 12000.0, 18),
    ("Deposit", 15000.0, 25),
];

fn stamp(at: NaiveDateTime) -> String {
    at.format("%-d %b, %-I:%M %p").to_string()
}

/// Day in `month` of the current year at a seed-dependent time, or `None`
/// when it would fall after `today`.
fn seed_time(today: NaiveDate, month: u32, day: u32, seed: usize) -> Option<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(today.year(), month, day.min(28))?;
    if date > today {
        return None;
    }
    let time = NaiveTime::from_hms_opt(8 + (seed % 12) as u32, ((seed * 17) % 60) as u32, 0)?;
    Some(date.and_time(time))
}

fn generate_members(today: NaiveDate) -> Vec<Member> {
    MEMBERS_SEED
        .iter()
        .enumerate()
        .map(|(i, m)| Member {
            id: format!("member-{:03}", i + 1),
            first_name: m.first.to_string(),
            last_name: m.last.to_string(),
            email: format!("{}.{}@coop.ng", m.first.to_lowercase(), m.last.to_lowercase()),
            phone: format!("+234 80{} {:03} {:04}", i % 10, 100 + i * 37, 1000 + i * 311),
            role: m.role.to_string(),
            occupation: m.occupation.to_string(),
            gender: if i % 2 == 0 { "Female" } else { "Male" }.to_string(),
            country: "Nigeria".to_string(),
            state: m.state.to_string(),
            status: m.status,
            updated_at: (today - chrono::Days::new(i as u64 * 3))
                .and_time(NaiveTime::MIN)
                .and_utc()
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        })
        .collect()
}

/// Contributions and transactions for every month of the current year so
/// far, spread round-robin over the members.
fn generate_ledger(today: NaiveDate) -> (Vec<Contribution>, Vec<Transaction>) {
    let mut contributions = Vec::new();
    let mut transactions = Vec::new();
    let mut seq = 1;

    for month in 1..=today.month() {
        for (j, (purpose, base, day)) in CONTRIBUTION_PLAN.iter().enumerate() {
            let seed = (month as usize) * 7 + j;
            let Some(at) = seed_time(today, month, *day, seed) else {
                continue;
            };
            let m = &MEMBERS_SEED[seed % MEMBERS_SEED.len()];
            let vary = 1.0 + ((seed % 5) as f64) * 0.1;
            contributions.push(Contribution {
                id: format!("SG{seq:04}"),
                name: format!("{} {}", m.first, m.last),
                purpose: purpose.to_string(),
                amount: money((base * vary).round()),
                date: stamp(at),
            });
            seq += 1;
        }
        for (j, (kind, base, day)) in TRANSACTION_PLAN.iter().enumerate() {
            let seed = (month as usize) * 5 + j;
            let Some(at) = seed_time(today, month, *day, seed) else {
                continue;
            };
            let m = &MEMBERS_SEED[(seed + 3) % MEMBERS_SEED.len()];
            let vary = 1.0 + ((seed % 4) as f64) * 0.15;
            transactions.push(Transaction {
                id: format!("SG{seq:04}"),
                name: format!("{} {}", m.first, m.last),
                kind: kind.to_string(),
                amount: money((base * vary).round()),
                date: stamp(at),
            });
            seq += 1;
        }
    }
    (contributions, transactions)
}

/// Write the seed collections. Returns `false` without touching anything
/// when members are already on file.
fn seed(store: &Store, today: NaiveDate) -> Result<bool> {
    let existing: Vec<Member> = store.collection(MEMBERS)?;
    if !existing.is_empty() {
        return Ok(false);
    }
    let (contributions, transactions) = generate_ledger(today);
    store.put_json(MEMBERS, &generate_members(today))?;
    store.put_json(CONTRIBUTIONS, &contributions)?;
    store.put_json(TRANSACTIONS, &transactions)?;
    tracing::info!(
        contributions = contributions.len(),
        transactions = transactions.len(),
        "demo data seeded"
    );
    Ok(true)
}

pub fn run() -> Result<()> {
    let store = open_store()?;
    if !seed(&store, Local::now().date_naive())? {
        println!("Members already on file; demo data not loaded.");
        return Ok(());
    }
    let contributions: Vec<Contribution> = store.collection(CONTRIBUTIONS)?;
    let transactions: Vec<Transaction> = store.collection(TRANSACTIONS)?;

    println!("Demo data loaded!");
    println!("  Members:        {}", MEMBERS_SEED.len());
    println!("  Contributions:  {}", contributions.len());
    println!("  Transactions:   {}", transactions.len());
    println!();
    println!("Try these next:");
    println!("  tently members list --all");
    println!("  tently contributions list --filter monthly");
    println!("  tently dashboard");
    println!("  tently browse members");
    Ok(())
}
