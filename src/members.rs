use chrono::{SecondsFormat, Utc};
use regex::Regex;

use crate::db::{Store, MEMBERS};
use crate::error::{FieldError, Result, TentlyError};
use crate::models::{Member, MemberStatus, ROLES};

/// Member fields as entered on the form. `None` and blank mean "not given".
#[derive(Debug, Clone, Default)]
pub struct MemberForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub occupation: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub status: Option<MemberStatus>,
}

const EMAIL_PATTERN: &str = r"\S+@\S+\.\S+";

pub fn looks_like_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN)
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// The canonical spelling of a known role, matched case-insensitively.
pub fn canonical_role(role: &str) -> Option<&'static str> {
    ROLES
        .iter()
        .copied()
        .find(|r| r.eq_ignore_ascii_case(role.trim()))
}

fn required(errors: &mut Vec<FieldError>, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{label} is required")));
    }
}

/// Every problem with `member`, in form order.
pub fn validate(member: &Member) -> Vec<FieldError> {
    let mut errors = Vec::new();
    required(&mut errors, "firstName", "FirstName", &member.first_name);
    required(&mut errors, "lastName", "LastName", &member.last_name);
    required(&mut errors, "email", "Email", &member.email);
    if !member.email.trim().is_empty() && !looks_like_email(&member.email) {
        errors.push(FieldError::new("email", "Please enter a valid email address"));
    }
    required(&mut errors, "role", "Role", &member.role);
    if !member.role.trim().is_empty() && canonical_role(&member.role).is_none() {
        errors.push(FieldError::new(
            "role",
            format!("Unknown role (choose one of: {})", ROLES.join(", ")),
        ));
    }
    errors
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn next_id(existing: &[Member]) -> String {
    let base = format!("member-{}", Utc::now().timestamp_millis());
    if !existing.iter().any(|m| m.id == base) {
        return base;
    }
    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !existing.iter().any(|m| &m.id == candidate))
        .unwrap_or(base)
}

fn apply(member: &mut Member, form: &MemberForm) {
    fn set(slot: &mut String, value: &Option<String>) {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            *slot = v.to_string();
        }
    }
    set(&mut member.first_name, &form.first_name);
    set(&mut member.last_name, &form.last_name);
    set(&mut member.email, &form.email);
    set(&mut member.phone, &form.phone);
    set(&mut member.role, &form.role);
    set(&mut member.occupation, &form.occupation);
    set(&mut member.gender, &form.gender);
    set(&mut member.country, &form.country);
    set(&mut member.state, &form.state);
    if let Some(role) = canonical_role(&member.role) {
        member.role = role.to_string();
    }
    if let Some(status) = form.status {
        member.status = status;
    }
}

/// Turn a form into a new, validated member whose key is unique among
/// `existing`. A caller-supplied `id` is kept when it is free.
pub fn build(
    form: &MemberForm,
    id: Option<&str>,
    existing: &[Member],
) -> std::result::Result<Member, Vec<FieldError>> {
    let mut member = Member::default();
    apply(&mut member, form);
    let errors = validate(&member);
    if !errors.is_empty() {
        return Err(errors);
    }
    member.id = match id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) if !existing.iter().any(|m| m.id == id) => id.to_string(),
        _ => next_id(existing),
    };
    member.updated_at = now_stamp();
    Ok(member)
}

pub fn list(store: &Store) -> Result<Vec<Member>> {
    store.collection(MEMBERS)
}

pub fn get(store: &Store, id: &str) -> Result<Member> {
    list(store)?
        .into_iter()
        .find(|m| m.id == id)
        .ok_or_else(|| TentlyError::UnknownMember(id.to_string()))
}

/// Validate and append a new member. New members start as `new` unless the
/// form says otherwise.
pub fn create(store: &Store, form: &MemberForm) -> Result<Member> {
    let mut members = list(store)?;
    let member = build(form, None, &members).map_err(TentlyError::Validation)?;
    members.push(member.clone());
    store.put_json(MEMBERS, &members)?;
    tracing::info!(id = %member.id, "member created");
    Ok(member)
}

/// Merge the given fields into the member with key `id`.
pub fn update(store: &Store, id: &str, form: &MemberForm) -> Result<Member> {
    let mut members = list(store)?;
    let member = members
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or_else(|| TentlyError::UnknownMember(id.to_string()))?;
    let mut edited = member.clone();
    apply(&mut edited, form);
    let errors = validate(&edited);
    if !errors.is_empty() {
        return Err(TentlyError::Validation(errors));
    }
    edited.updated_at = now_stamp();
    *member = edited.clone();
    store.put_json(MEMBERS, &members)?;
    tracing::info!(id, "member updated");
    Ok(edited)
}

/// Bulk status change over selected keys. Unknown keys fail the whole batch
/// before anything is written. Returns how many records changed.
pub fn set_status(store: &Store, ids: &[String], status: MemberStatus) -> Result<usize> {
    let mut members = list(store)?;
    if let Some(missing) = ids.iter().find(|id| !members.iter().any(|m| &m.id == *id)) {
        return Err(TentlyError::UnknownMember(missing.clone()));
    }
    let stamp = now_stamp();
    let mut changed = 0;
    for member in members.iter_mut().filter(|m| ids.contains(&m.id)) {
        if member.status != status {
            member.status = status;
            member.updated_at = stamp.clone();
            changed += 1;
        }
    }
    store.put_json(MEMBERS, &members)?;
    tracing::info!(changed, status = %status, "bulk status change");
    Ok(changed)
}
