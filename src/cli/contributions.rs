use super::list::{build_pipeline, print_page};
use super::{open_store, require_login, ListArgs};
use crate::db::CONTRIBUTIONS;
use crate::error::Result;
use crate::models::{Contribution, CONTRIBUTION_LIST};

pub fn list(args: &ListArgs) -> Result<()> {
    let store = open_store()?;
    require_login(&store)?;
    let contributions: Vec<Contribution> = store.collection(CONTRIBUTIONS)?;
    let pipeline = build_pipeline(&CONTRIBUTION_LIST, contributions, args)?;
    print_page(&pipeline);
    Ok(())
}
