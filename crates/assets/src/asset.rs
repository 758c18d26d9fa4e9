use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{DomainError, DomainResult, Entity, Money};

innkeep_core::typed_id!(AssetId, "Fixed asset identifier.");

/// Asset availability lifecycle.
///
/// ```text
/// available ⇄ checked_out
/// available ⇄ maintenance
/// available | maintenance → retired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Available,
    CheckedOut,
    Maintenance,
    Retired,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Available => "available",
            AssetStatus::CheckedOut => "checked_out",
            AssetStatus::Maintenance => "maintenance",
            AssetStatus::Retired => "retired",
        }
    }
}

impl core::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    pub location: String,
    pub status: AssetStatus,
    /// Person holding the asset while checked out.
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    pub purchase_value: Money,
    #[serde(default)]
    pub notes: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl Asset {
    pub fn is_available(&self) -> bool {
        self.status == AssetStatus::Available
    }

    pub fn check_out(&mut self, to: &str, at: DateTime<Utc>) -> DomainResult<()> {
        if to.trim().is_empty() {
            return Err(DomainError::validation("assignee cannot be empty"));
        }
        if self.status != AssetStatus::Available {
            return Err(DomainError::invariant(format!(
                "asset '{}' is {} and cannot be checked out",
                self.name, self.status
            )));
        }
        self.status = AssetStatus::CheckedOut;
        self.assigned_to = Some(to.trim().to_string());
        self.last_updated = at;
        Ok(())
    }

    pub fn check_in(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != AssetStatus::CheckedOut {
            return Err(DomainError::invariant(format!(
                "asset '{}' is not checked out",
                self.name
            )));
        }
        self.status = AssetStatus::Available;
        self.assigned_to = None;
        self.last_updated = at;
        Ok(())
    }

    pub fn start_maintenance(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != AssetStatus::Available {
            return Err(DomainError::invariant(format!(
                "asset '{}' is {}; only available assets go to maintenance",
                self.name, self.status
            )));
        }
        self.status = AssetStatus::Maintenance;
        self.last_updated = at;
        Ok(())
    }

    pub fn finish_maintenance(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != AssetStatus::Maintenance {
            return Err(DomainError::invariant(format!(
                "asset '{}' is not in maintenance",
                self.name
            )));
        }
        self.status = AssetStatus::Available;
        self.last_updated = at;
        Ok(())
    }

    pub fn retire(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            AssetStatus::Available | AssetStatus::Maintenance => {
                self.status = AssetStatus::Retired;
                self.last_updated = at;
                Ok(())
            }
            AssetStatus::CheckedOut => Err(DomainError::invariant(format!(
                "asset '{}' must be checked in before retiring",
                self.name
            ))),
            AssetStatus::Retired => Err(DomainError::invariant(format!(
                "asset '{}' is already retired",
                self.name
            ))),
        }
    }
}

impl Entity for Asset {
    type Id = AssetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Asset form input. Status and assignment are not editable through the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDraft {
    pub name: String,
    pub category: String,
    pub serial_number: Option<String>,
    pub location: String,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_value: Money,
    pub notes: Option<String>,
}

impl AssetDraft {
    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        if self.purchase_value.is_negative() {
            return Err(DomainError::validation("purchase value cannot be negative"));
        }
        Ok(())
    }

    pub fn into_asset(self, id: AssetId, at: DateTime<Utc>) -> DomainResult<Asset> {
        self.validate()?;
        Ok(Asset {
            id,
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            serial_number: clean(self.serial_number),
            location: self.location.trim().to_string(),
            status: AssetStatus::Available,
            assigned_to: None,
            purchase_date: self.purchase_date,
            purchase_value: self.purchase_value,
            notes: clean(self.notes),
            last_updated: at,
        })
    }

    pub fn apply_to(self, asset: &mut Asset, at: DateTime<Utc>) -> DomainResult<()> {
        self.validate()?;
        asset.name = self.name.trim().to_string();
        asset.category = self.category.trim().to_string();
        asset.serial_number = clean(self.serial_number);
        asset.location = self.location.trim().to_string();
        asset.purchase_date = self.purchase_date;
        asset.purchase_value = self.purchase_value;
        asset.notes = clean(self.notes);
        asset.last_updated = at;
        Ok(())
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> Asset {
        AssetDraft {
            name: "Vacuum cleaner #3".to_string(),
            category: "Housekeeping equipment".to_string(),
            serial_number: Some("VC-2231".to_string()),
            location: "Floor 3 pantry".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2024, 5, 2),
            purchase_value: Money::from_cents(45_000),
            notes: None,
        }
        .into_asset(AssetId::generate(), Utc::now())
        .unwrap()
    }

    #[test]
    fn checkout_and_checkin_round_trip() {
        let mut a = asset();
        a.check_out("Room attendant 12", Utc::now()).unwrap();
        assert_eq!(a.status, AssetStatus::CheckedOut);
        assert_eq!(a.assigned_to.as_deref(), Some("Room attendant 12"));

        a.check_in(Utc::now()).unwrap();
        assert!(a.is_available());
        assert_eq!(a.assigned_to, None);
    }

    #[test]
    fn cannot_check_out_twice() {
        let mut a = asset();
        a.check_out("A", Utc::now()).unwrap();
        let err = a.check_out("B", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(a.assigned_to.as_deref(), Some("A"));
    }

    #[test]
    fn maintenance_blocks_checkout() {
        let mut a = asset();
        a.start_maintenance(Utc::now()).unwrap();
        assert!(a.check_out("A", Utc::now()).is_err());
        a.finish_maintenance(Utc::now()).unwrap();
        assert!(a.check_out("A", Utc::now()).is_ok());
    }

    #[test]
    fn checked_out_assets_cannot_retire() {
        let mut a = asset();
        a.check_out("A", Utc::now()).unwrap();
        assert!(a.retire(Utc::now()).is_err());
        a.check_in(Utc::now()).unwrap();
        a.retire(Utc::now()).unwrap();
        assert!(a.retire(Utc::now()).is_err());
    }

    #[test]
    fn status_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&AssetStatus::CheckedOut).unwrap(),
            "\"checked_out\""
        );
    }
}
