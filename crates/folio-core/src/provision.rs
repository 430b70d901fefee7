//! Default records created the first time a user signs in.
//!
//! The builder here is pure; the storage backend persists the resulting
//! [`NewAccount`] inside a single transaction.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  membership::{Membership, MembershipStatus},
  portfolio::{Folder, FolderLayout, Portfolio, Profile},
  user::{Identity, Role, User},
};

pub const DEFAULT_PROFILE_TITLE: &str = "Professional Photographer";
pub const DEFAULT_COLUMNS: u32 = 3;
pub const DEFAULT_GAP: u32 = 16;

const SEED_FOLDERS: [(&str, &str); 3] = [
  ("Landscapes", "A collection of landscapes"),
  ("Portraits", "A collection of portraits"),
  ("Events", "A collection of events"),
];

/// Values that come from deployment configuration rather than code.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningDefaults {
  /// Plan assigned to every new user.
  pub free_plan_id: Uuid,
}

/// Everything a brand-new user starts with.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub user:       User,
  pub membership: Membership,
  pub portfolio:  Portfolio,
  pub profile:    Profile,
  pub folders:    Vec<Folder>,
}

impl NewAccount {
  pub fn build(
    identity: &Identity,
    defaults: &ProvisioningDefaults,
    now: DateTime<Utc>,
  ) -> Self {
    let user = User {
      id:         Uuid::now_v7(),
      email:      identity.email.trim().to_lowercase(),
      name:       identity.name.trim().to_owned(),
      picture:    identity.picture.clone(),
      role:       Role::User,
      created_at: now,
      updated_at: now,
    };

    // Free memberships have no payment-provider subscription; the plan id
    // stands in for both external fields.
    let plan_ref = defaults.free_plan_id.to_string();
    let membership = Membership {
      id:                             Uuid::now_v7(),
      user_id:                        user.id,
      plan_id:                        defaults.free_plan_id,
      status:                         MembershipStatus::Active,
      start_date:                     now,
      end_date:                       None,
      external_subscription_id:       plan_ref.clone(),
      external_subscription_interval: plan_ref,
      created_at:                     now,
      updated_at:                     now,
    };

    let portfolio = Portfolio {
      id:              Uuid::now_v7(),
      user_id:         user.id,
      title:           user.name.clone(),
      columns:         DEFAULT_COLUMNS,
      gap:             DEFAULT_GAP,
      rounded_corners: true,
      show_captions:   true,
      created_at:      now,
      updated_at:      now,
    };

    let profile = Profile {
      id:           Uuid::now_v7(),
      portfolio_id: portfolio.id,
      name:         user.name.clone(),
      title:        DEFAULT_PROFILE_TITLE.to_owned(),
      bio:          String::new(),
      email:        String::new(),
      instagram:    String::new(),
      website:      String::new(),
    };

    let folders = SEED_FOLDERS
      .iter()
      .map(|(name, description)| Folder {
        id:             Uuid::now_v7(),
        portfolio_id:   portfolio.id,
        name:           (*name).to_owned(),
        description:    (*description).to_owned(),
        cover_photo_id: None,
        layout:         FolderLayout {
          columns:         Some(DEFAULT_COLUMNS),
          gap:             Some(DEFAULT_GAP),
          show_captions:   Some(true),
          rounded_corners: Some(true),
        },
        created_at:     now,
        updated_at:     now,
      })
      .collect();

    Self { user, membership, portfolio, profile, folders }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builds_default_tree() {
    let identity = Identity {
      email:   " Ada@Example.com ".into(),
      name:    "Ada Lovelace".into(),
      picture: String::new(),
    };
    let defaults = ProvisioningDefaults { free_plan_id: Uuid::now_v7() };
    let account = NewAccount::build(&identity, &defaults, Utc::now());

    assert_eq!(account.user.email, "ada@example.com");
    assert_eq!(account.user.role, Role::User);
    assert_eq!(account.membership.plan_id, defaults.free_plan_id);
    assert_eq!(account.membership.status, MembershipStatus::Active);
    assert_eq!(account.portfolio.title, "Ada Lovelace");
    assert_eq!((account.portfolio.columns, account.portfolio.gap), (3, 16));
    assert!(account.portfolio.rounded_corners && account.portfolio.show_captions);
    assert_eq!(account.profile.title, DEFAULT_PROFILE_TITLE);
    assert_eq!(account.profile.portfolio_id, account.portfolio.id);

    let names: Vec<_> = account.folders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Landscapes", "Portraits", "Events"]);
    assert!(account.folders.iter().all(|f| f.portfolio_id == account.portfolio.id));
  }
}
