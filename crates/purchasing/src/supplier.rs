use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{DomainError, DomainResult, Entity, ValueObject};

innkeep_core::typed_id!(SupplierId, "Supplier identifier.");

/// Supplier status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplierStatus {
    Active,
    Suspended,
}

/// Contact information for a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ValueObject for ContactInfo {}

impl ContactInfo {
    fn validate(&self) -> DomainResult<()> {
        if let Some(email) = &self.email {
            let email = email.trim();
            if !email.is_empty() && !email.contains('@') {
                return Err(DomainError::validation(format!("invalid email '{email}'")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub contact: ContactInfo,
    /// Inventory categories this supplier delivers ("Linen", "Amenities").
    #[serde(default)]
    pub categories: Vec<String>,
    pub status: SupplierStatus,
    pub created_at: DateTime<Utc>,
}

impl Supplier {
    /// Suspended suppliers cannot receive new purchase orders.
    pub fn can_transact(&self) -> bool {
        self.status == SupplierStatus::Active
    }

    pub fn supplies(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c.eq_ignore_ascii_case(category))
    }

    pub fn suspend(&mut self) -> DomainResult<()> {
        if self.status == SupplierStatus::Suspended {
            return Err(DomainError::invariant("supplier is already suspended"));
        }
        self.status = SupplierStatus::Suspended;
        Ok(())
    }

    pub fn activate(&mut self) -> DomainResult<()> {
        if self.status == SupplierStatus::Active {
            return Err(DomainError::invariant("supplier is already active"));
        }
        self.status = SupplierStatus::Active;
        Ok(())
    }
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierDraft {
    pub name: String,
    pub contact: ContactInfo,
    pub categories: Vec<String>,
}

impl SupplierDraft {
    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        self.contact.validate()
    }

    fn clean_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .categories
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn into_supplier(self, id: SupplierId, at: DateTime<Utc>) -> DomainResult<Supplier> {
        self.validate()?;
        Ok(Supplier {
            id,
            name: self.name.trim().to_string(),
            categories: self.clean_categories(),
            contact: self.contact,
            status: SupplierStatus::Active,
            created_at: at,
        })
    }

    /// Overwrite name, contact and categories. Status is unchanged.
    pub fn apply_to(self, supplier: &mut Supplier) -> DomainResult<()> {
        self.validate()?;
        supplier.name = self.name.trim().to_string();
        supplier.categories = self.clean_categories();
        supplier.contact = self.contact;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SupplierDraft {
        SupplierDraft {
            name: "Coastal Linen Co.".to_string(),
            contact: ContactInfo {
                contact_person: Some("Dana".to_string()),
                email: Some("orders@coastal-linen.example".to_string()),
                phone: None,
                address: None,
            },
            categories: vec!["Linen".to_string(), " Linen ".to_string(), "".to_string()],
        }
    }

    #[test]
    fn categories_are_cleaned() {
        let s = draft().into_supplier(SupplierId::generate(), Utc::now()).unwrap();
        assert_eq!(s.categories, vec!["Linen".to_string()]);
        assert!(s.supplies("linen"));
    }

    #[test]
    fn rejects_malformed_email() {
        let mut d = draft();
        d.contact.email = Some("not-an-email".to_string());
        assert!(d.into_supplier(SupplierId::generate(), Utc::now()).is_err());
    }

    #[test]
    fn suspended_supplier_cannot_transact() {
        let mut s = draft().into_supplier(SupplierId::generate(), Utc::now()).unwrap();
        s.suspend().unwrap();
        assert!(!s.can_transact());
        assert!(s.suspend().is_err());
        s.activate().unwrap();
        assert!(s.can_transact());
    }
}
