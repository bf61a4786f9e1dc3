use std::time::Duration;

use colored::Colorize;

use super::list::{build_pipeline, print_page};
use super::{open_store, require_login, ListArgs, MemberFields};
use crate::error::Result;
use crate::invites;
use crate::members::{self, MemberForm};
use crate::models::{Member, MemberStatus, MEMBER_LIST};
use crate::server::config::frontend_url;
use crate::settings::load_settings;

fn to_form(fields: &MemberFields) -> Result<MemberForm> {
    Ok(MemberForm {
        first_name: fields.first_name.clone(),
        last_name: fields.last_name.clone(),
        email: fields.email.clone(),
        phone: fields.phone.clone(),
        role: fields.role.clone(),
        occupation: fields.occupation.clone(),
        gender: fields.gender.clone(),
        country: fields.country.clone(),
        state: fields.state.clone(),
        status: fields
            .status
            .as_deref()
            .map(str::parse::<MemberStatus>)
            .transpose()?,
    })
}

fn status_text(status: MemberStatus) -> String {
    let text = status.as_str();
    match status {
        MemberStatus::Active => text.green().to_string(),
        MemberStatus::Deactivated => text.red().to_string(),
        MemberStatus::Pending => text.yellow().to_string(),
        MemberStatus::New => text.blue().to_string(),
    }
}

fn print_member(member: &Member) {
    let or_dash = |v: &str| if v.is_empty() { "-".to_string() } else { v.to_string() };
    println!("{}", format!("{} {}", member.first_name, member.last_name).bold());
    println!("  ID:          {}", member.id);
    println!("  Email:       {}", member.email);
    println!("  Phone:       {}", or_dash(&member.phone));
    println!("  Role:        {}", member.role);
    println!("  Occupation:  {}", or_dash(&member.occupation));
    println!("  Gender:      {}", or_dash(&member.gender));
    println!("  Country:     {}", or_dash(&member.country));
    println!("  State:       {}", or_dash(&member.state));
    println!("  Status:      {}", status_text(member.status));
    println!("  Updated:     {}", or_dash(&member.updated_at));
}

pub fn list(args: &ListArgs) -> Result<()> {
    let store = open_store()?;
    require_login(&store)?;
    let pipeline = build_pipeline(&MEMBER_LIST, members::list(&store)?, args)?;
    print_page(&pipeline);
    Ok(())
}

pub fn add(fields: &MemberFields) -> Result<()> {
    let store = open_store()?;
    require_login(&store)?;
    let member = members::create(&store, &to_form(fields)?)?;
    println!("{} {}", "Added".green(), member.id);
    print_member(&member);
    Ok(())
}

pub fn edit(id: &str, fields: &MemberFields) -> Result<()> {
    let store = open_store()?;
    require_login(&store)?;
    let member = members::update(&store, id, &to_form(fields)?)?;
    println!("{} {}", "Updated".green(), member.id);
    print_member(&member);
    Ok(())
}

pub fn show(id: &str) -> Result<()> {
    let store = open_store()?;
    require_login(&store)?;
    print_member(&members::get(&store, id)?);
    Ok(())
}

pub fn set_status(status: &str, ids: &[String]) -> Result<()> {
    let status: MemberStatus = status.parse()?;
    let store = open_store()?;
    require_login(&store)?;
    let changed = members::set_status(&store, ids, status)?;
    println!("{changed} of {} member(s) set to {}.", ids.len(), status_text(status));
    Ok(())
}

pub fn invite(email: &str) -> Result<()> {
    let store = open_store()?;
    require_login(&store)?;
    let latency = Duration::from_millis(load_settings().mock_latency_ms);
    let invite = invites::send(&store, email, &frontend_url(), latency)?;
    println!("{} {}", "Invite sent to".green(), invite.email);
    println!("Share link: {}", invite.link.bold());
    println!("{}", "(Email delivery is simulated.)".dimmed());
    Ok(())
}
