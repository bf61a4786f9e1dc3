use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::auth::mock::simulate_network;
use crate::db::{Store, INVITES};
use crate::error::{FieldError, Result, TentlyError};
use crate::members::{self, looks_like_email};

/// An emailed invitation to join the cooperative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub email: String,
    pub token: String,
    pub link: String,
    pub sent_at: DateTime<Utc>,
}

/// Sign-up page on the same origin as `frontend_url`, carrying the token.
pub fn invite_link(frontend_url: &str, token: &str) -> Result<String> {
    let mut url = Url::parse(frontend_url)
        .map_err(|e| TentlyError::Settings(format!("FRONTEND_URL {frontend_url}: {e}")))?;
    url.set_path("/signup");
    url.query_pairs_mut().clear().append_pair("invite", token);
    Ok(url.to_string())
}

pub fn list(store: &Store) -> Result<Vec<Invite>> {
    store.collection(INVITES)
}

/// Record an invite for `email` and return it with its share link. Sending
/// again to the same address replaces the earlier invite.
pub fn send(store: &Store, email: &str, frontend_url: &str, latency: Duration) -> Result<Invite> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(TentlyError::Validation(vec![FieldError::new("inviteEmail", "Email is required")]));
    }
    if !looks_like_email(&email) {
        return Err(TentlyError::Validation(vec![FieldError::new(
            "inviteEmail",
            "Please enter a valid email address",
        )]));
    }
    if members::list(store)?
        .iter()
        .any(|m| m.email.eq_ignore_ascii_case(&email))
    {
        return Err(TentlyError::Other(format!("{email} is already a member")));
    }

    let bytes: [u8; 16] = rand::thread_rng().gen();
    let token = hex::encode(bytes);
    let invite = Invite {
        link: invite_link(frontend_url, &token)?,
        email,
        token,
        sent_at: Utc::now(),
    };

    simulate_network(latency);
    let mut invites = list(store)?;
    invites.retain(|i| i.email != invite.email);
    invites.push(invite.clone());
    store.put_json(INVITES, &invites)?;
    tracing::info!(email = %invite.email, "invite sent");
    Ok(invite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;
    use crate::members::{create, MemberForm};

    const FRONTEND: &str = "http://localhost:5173/dashboard";

    #[test]
    fn test_link_points_at_signup() {
        assert_eq!(
            invite_link(FRONTEND, "abc").unwrap(),
            "http://localhost:5173/signup?invite=abc"
        );
        assert!(invite_link("not a url", "abc").is_err());
    }

    #[test]
    fn test_send_records_one_invite_per_address() {
        let (_dir, store) = test_store();
        let first = send(&store, "Bryan@Coop.ng", FRONTEND, Duration::ZERO).unwrap();
        assert_eq!(first.email, "bryan@coop.ng");
        assert!(first.link.ends_with(&format!("invite={}", first.token)));

        let again = send(&store, "bryan@coop.ng", FRONTEND, Duration::ZERO).unwrap();
        assert_ne!(first.token, again.token);
        let stored = list(&store).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].token, again.token);
    }

    #[test]
    fn test_send_validates_email() {
        let (_dir, store) = test_store();
        let err = send(&store, "bryan-at-coop", FRONTEND, Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("Please enter a valid email address"));
        assert!(send(&store, "  ", FRONTEND, Duration::ZERO).is_err());
        assert!(list(&store).unwrap().is_empty());
    }

    #[test]
    fn test_existing_member_is_not_invited() {
        let (_dir, store) = test_store();
        let form = MemberForm {
            first_name: Some("Grace".into()),
            last_name: Some("Molero".into()),
            email: Some("grace@coop.ng".into()),
            role: Some("Treasurer".into()),
            ..MemberForm::default()
        };
        create(&store, &form).unwrap();
        let err = send(&store, "GRACE@coop.ng", FRONTEND, Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("already a member"));
    }
}
