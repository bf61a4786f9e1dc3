use super::{open_store, require_login, BrowseTarget};
use crate::browser::{BulkAction, ListBrowser};
use crate::db::{CONTRIBUTIONS, TRANSACTIONS};
use crate::error::{Result, TentlyError};
use crate::members;
use crate::models::{Contribution, Transaction, CONTRIBUTION_LIST, MEMBER_LIST, TRANSACTION_LIST};
use crate::query::{ListPipeline, Record};

fn read_only<R: Record>(_: BulkAction, _: &[String]) -> Result<(usize, Vec<R>)> {
    Err(TentlyError::Other("This list has no bulk actions".into()))
}

pub fn run(target: BrowseTarget) -> Result<()> {
    let store = open_store()?;
    require_login(&store)?;

    match target {
        BrowseTarget::Members => {
            let pipeline = ListPipeline::new(&MEMBER_LIST, members::list(&store)?);
            ListBrowser::new(pipeline)
                .with_bulk_actions()
                .run(|action, keys| {
                    let changed = members::set_status(&store, keys, action.status())?;
                    Ok((changed, members::list(&store)?))
                })
        }
        BrowseTarget::Contributions => {
            let records: Vec<Contribution> = store.collection(CONTRIBUTIONS)?;
            ListBrowser::new(ListPipeline::new(&CONTRIBUTION_LIST, records)).run(read_only)
        }
        BrowseTarget::Transactions => {
            let records: Vec<Transaction> = store.collection(TRANSACTIONS)?;
            ListBrowser::new(ListPipeline::new(&TRANSACTION_LIST, records)).run(read_only)
        }
    }
}
