use crate::auth::{mock::MockAuth, AuthProvider};
use crate::db::{Store, CONTRIBUTIONS, MEMBERS, TRANSACTIONS};
use crate::error::Result;
use crate::models::{Contribution, Member, Transaction};
use crate::settings::{db_path, load_settings};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Page size:  {}", settings.page_size);

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `tently init` to set up.");
        return Ok(());
    }

    let store = Store::open(&db_path)?;
    let signed_in = MockAuth::new(&store).current_user()?;
    println!(
        "Signed in:  {}",
        signed_in.map(|u| u.email).unwrap_or_else(|| "(no)".to_string())
    );

    let members: Vec<Member> = store.collection(MEMBERS)?;
    let contributions: Vec<Contribution> = store.collection(CONTRIBUTIONS)?;
    let transactions: Vec<Transaction> = store.collection(TRANSACTIONS)?;
    println!();
    println!("Members:        {}", members.len());
    println!("Contributions:  {}", contributions.len());
    println!("Transactions:   {}", transactions.len());
    println!("Imports:        {}", store.import_count()?);
    Ok(())
}
