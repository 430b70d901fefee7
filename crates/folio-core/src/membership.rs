//! Memberships and membership plans.
//!
//! A plan describes an entitlement tier (price, quota, capability flags); a
//! membership binds a user to a plan for a period of time.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  page::{PageRequest, SortOrder},
  patch::{apply, nullable},
};

// ─── Enums ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
  Active,
  Inactive,
  Cancelled,
  Expired,
}

impl MembershipStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Inactive => "inactive",
      Self::Cancelled => "cancelled",
      Self::Expired => "expired",
    }
  }
}

impl FromStr for MembershipStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "active" => Ok(Self::Active),
      "inactive" => Ok(Self::Inactive),
      "cancelled" => Ok(Self::Cancelled),
      "expired" => Ok(Self::Expired),
      other => Err(Error::UnknownVariant {
        kind:  "membership status",
        value: other.to_owned(),
      }),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
  Monthly,
  Yearly,
  Lifetime,
}

impl BillingCycle {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Monthly => "monthly",
      Self::Yearly => "yearly",
      Self::Lifetime => "lifetime",
    }
  }
}

impl FromStr for BillingCycle {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "monthly" => Ok(Self::Monthly),
      "yearly" => Ok(Self::Yearly),
      "lifetime" => Ok(Self::Lifetime),
      other => Err(Error::UnknownVariant {
        kind:  "billing cycle",
        value: other.to_owned(),
      }),
    }
  }
}

// ─── Membership ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
  pub id:                             Uuid,
  pub user_id:                        Uuid,
  pub plan_id:                        Uuid,
  pub status:                         MembershipStatus,
  pub start_date:                     DateTime<Utc>,
  pub end_date:                       Option<DateTime<Utc>>,
  /// Subscription identifier at the payment provider.
  pub external_subscription_id:       String,
  pub external_subscription_interval: String,
  pub created_at:                     DateTime<Utc>,
  pub updated_at:                     DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMembership {
  pub user_id:                        Uuid,
  pub plan_id:                        Uuid,
  pub status:                         MembershipStatus,
  pub start_date:                     DateTime<Utc>,
  #[serde(default)]
  pub end_date:                       Option<DateTime<Utc>>,
  #[serde(default)]
  pub external_subscription_id:       String,
  #[serde(default)]
  pub external_subscription_interval: String,
}

impl NewMembership {
  pub fn into_membership(self, now: DateTime<Utc>) -> Result<Membership> {
    if self.end_date.is_some_and(|end| end < self.start_date) {
      return Err(Error::Validation("end_date precedes start_date".into()));
    }
    Ok(Membership {
      id: Uuid::now_v7(),
      user_id: self.user_id,
      plan_id: self.plan_id,
      status: self.status,
      start_date: self.start_date,
      end_date: self.end_date,
      external_subscription_id: self.external_subscription_id,
      external_subscription_interval: self.external_subscription_interval,
      created_at: now,
      updated_at: now,
    })
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MembershipPatch {
  pub plan_id:                        Option<Uuid>,
  pub status:                         Option<MembershipStatus>,
  pub start_date:                     Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "nullable")]
  pub end_date:                       Option<Option<DateTime<Utc>>>,
  pub external_subscription_id:       Option<String>,
  pub external_subscription_interval: Option<String>,
}

impl MembershipPatch {
  pub fn apply_to(&self, target: &mut Membership) -> bool {
    let mut touched = apply(&mut target.plan_id, &self.plan_id);
    touched |= apply(&mut target.status, &self.status);
    touched |= apply(&mut target.start_date, &self.start_date);
    touched |= apply(&mut target.end_date, &self.end_date);
    touched |= apply(&mut target.external_subscription_id, &self.external_subscription_id);
    touched |= apply(
      &mut target.external_subscription_interval,
      &self.external_subscription_interval,
    );
    touched
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipSort {
  #[default]
  CreatedAt,
  UpdatedAt,
  StartDate,
}

impl MembershipSort {
  pub fn column(self) -> &'static str {
    match self {
      Self::CreatedAt => "created_at",
      Self::UpdatedAt => "updated_at",
      Self::StartDate => "start_date",
    }
  }
}

/// Filters for listing memberships. Query-string shaped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MembershipQuery {
  pub user_id: Option<Uuid>,
  pub plan_id: Option<Uuid>,
  pub status:  Option<MembershipStatus>,
  pub sort:    Option<MembershipSort>,
  pub order:   Option<SortOrder>,
  pub page:    Option<u32>,
  pub size:    Option<u32>,
}

impl MembershipQuery {
  pub fn page_request(&self) -> PageRequest { PageRequest { page: self.page, size: self.size } }
}

// ─── Plans ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipPlan {
  pub id:                  Uuid,
  pub name:                String,
  pub price:               Decimal,
  pub billing_cycle:       BillingCycle,
  pub features:            Vec<String>,
  pub is_popular:          bool,
  /// Maximum number of folders a portfolio may hold; `0` means unlimited.
  pub max_folders:         u32,
  pub custom_domain:       bool,
  pub advanced_analytics:  bool,
  /// Product identifier at the payment provider.
  pub external_product_id: String,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlan {
  pub name:                String,
  pub price:               Decimal,
  pub billing_cycle:       BillingCycle,
  #[serde(default)]
  pub features:            Vec<String>,
  #[serde(default)]
  pub is_popular:          bool,
  #[serde(default)]
  pub max_folders:         u32,
  #[serde(default)]
  pub custom_domain:       bool,
  #[serde(default)]
  pub advanced_analytics:  bool,
  pub external_product_id: String,
}

impl NewPlan {
  pub fn into_plan(self, now: DateTime<Utc>) -> Result<MembershipPlan> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("plan name is required".into()));
    }
    if self.price.is_sign_negative() {
      return Err(Error::Validation("plan price cannot be negative".into()));
    }
    if self.external_product_id.trim().is_empty() {
      return Err(Error::Validation("external_product_id is required".into()));
    }
    Ok(MembershipPlan {
      id: Uuid::now_v7(),
      name: self.name.trim().to_owned(),
      price: self.price,
      billing_cycle: self.billing_cycle,
      features: self.features,
      is_popular: self.is_popular,
      max_folders: self.max_folders,
      custom_domain: self.custom_domain,
      advanced_analytics: self.advanced_analytics,
      external_product_id: self.external_product_id,
      created_at: now,
      updated_at: now,
    })
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanPatch {
  pub name:                Option<String>,
  pub price:               Option<Decimal>,
  pub billing_cycle:       Option<BillingCycle>,
  pub features:            Option<Vec<String>>,
  pub is_popular:          Option<bool>,
  pub max_folders:         Option<u32>,
  pub custom_domain:       Option<bool>,
  pub advanced_analytics:  Option<bool>,
  pub external_product_id: Option<String>,
}

impl PlanPatch {
  pub fn apply_to(&self, target: &mut MembershipPlan) -> Result<bool> {
    if self.price.is_some_and(|p| p.is_sign_negative()) {
      return Err(Error::Validation("plan price cannot be negative".into()));
    }
    if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::Validation("plan name cannot be empty".into()));
    }
    let mut touched = apply(&mut target.name, &self.name);
    touched |= apply(&mut target.price, &self.price);
    touched |= apply(&mut target.billing_cycle, &self.billing_cycle);
    touched |= apply(&mut target.features, &self.features);
    touched |= apply(&mut target.is_popular, &self.is_popular);
    touched |= apply(&mut target.max_folders, &self.max_folders);
    touched |= apply(&mut target.custom_domain, &self.custom_domain);
    touched |= apply(&mut target.advanced_analytics, &self.advanced_analytics);
    touched |= apply(&mut target.external_product_id, &self.external_product_id);
    Ok(touched)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSort {
  #[default]
  CreatedAt,
  UpdatedAt,
  Name,
}

impl PlanSort {
  pub fn column(self) -> &'static str {
    match self {
      Self::CreatedAt => "created_at",
      Self::UpdatedAt => "updated_at",
      Self::Name => "name",
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanQuery {
  /// Case-insensitive substring match on the plan name.
  pub keyword: Option<String>,
  pub sort:    Option<PlanSort>,
  pub order:   Option<SortOrder>,
  pub page:    Option<u32>,
  pub size:    Option<u32>,
}

impl PlanQuery {
  pub fn page_request(&self) -> PageRequest { PageRequest { page: self.page, size: self.size } }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn plan() -> MembershipPlan {
    NewPlan {
      name:                "Pro".into(),
      price:               Decimal::new(1299, 2),
      billing_cycle:       BillingCycle::Monthly,
      features:            vec!["Unlimited folders".into()],
      is_popular:          true,
      max_folders:         0,
      custom_domain:       true,
      advanced_analytics:  false,
      external_product_id: "prod_123".into(),
    }
    .into_plan(Utc::now())
    .unwrap()
  }

  #[test]
  fn price_keeps_exact_decimal() {
    let p: PlanPatch = serde_json::from_str(r#"{"price":"19.99"}"#).unwrap();
    let mut target = plan();
    assert!(p.apply_to(&mut target).unwrap());
    assert_eq!(target.price.to_string(), "19.99");
  }

  #[test]
  fn plan_patch_can_turn_flags_off() {
    let p: PlanPatch =
      serde_json::from_str(r#"{"is_popular":false,"custom_domain":false}"#).unwrap();
    let mut target = plan();
    p.apply_to(&mut target).unwrap();
    assert!(!target.is_popular);
    assert!(!target.custom_domain);
    assert_eq!(target.name, "Pro");
  }

  #[test]
  fn negative_price_is_rejected() {
    let p = PlanPatch { price: Some(Decimal::new(-1, 0)), ..Default::default() };
    assert!(matches!(p.apply_to(&mut plan()), Err(Error::Validation(_))));
  }

  #[test]
  fn membership_end_date_can_be_cleared() {
    let now = Utc::now();
    let mut m = NewMembership {
      user_id:                        Uuid::now_v7(),
      plan_id:                        Uuid::now_v7(),
      status:                         MembershipStatus::Active,
      start_date:                     now,
      end_date:                       Some(now),
      external_subscription_id:       "sub_1".into(),
      external_subscription_interval: "month".into(),
    }
    .into_membership(now)
    .unwrap();

    let patch: MembershipPatch = serde_json::from_str(r#"{"end_date":null}"#).unwrap();
    assert!(patch.apply_to(&mut m));
    assert_eq!(m.end_date, None);
    assert_eq!(m.status, MembershipStatus::Active);
  }

  #[test]
  fn status_round_trips_through_text() {
    for s in [
      MembershipStatus::Active,
      MembershipStatus::Inactive,
      MembershipStatus::Cancelled,
      MembershipStatus::Expired,
    ] {
      assert_eq!(s.as_str().parse::<MembershipStatus>().unwrap(), s);
    }
    assert!("paused".parse::<MembershipStatus>().is_err());
  }
}
