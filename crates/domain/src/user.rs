//! Users, roles, and the embedded address book.

use chrono::{DateTime, Utc};
use common::{AddressId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Role carried by the authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

/// The authenticated caller, passed explicitly into every domain operation.
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A shipping address owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

/// Input for adding an address.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    #[serde(default = "default_label")]
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

fn default_label() -> String {
    "Home".to_string()
}

/// A registered user with an embedded address book.
///
/// The password hash never leaves the server; it is skipped on
/// serialization so no response shape can leak it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub addresses: Vec<Address>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new customer account. The email is stored lowercased.
    pub fn new(name: String, email: String, password_hash: String) -> Result<Self, DomainError> {
        let email = email.trim().to_lowercase();
        if name.trim().is_empty() {
            return Err(DomainError::Validation("Name is required.".to_string()));
        }
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(DomainError::Validation(
                "Please provide a valid email.".to_string(),
            ));
        }
        Ok(Self {
            id: UserId::new(),
            name: name.trim().to_string(),
            email,
            password_hash,
            role: Role::Customer,
            addresses: Vec::new(),
            created_at: Utc::now(),
        })
    }

    /// Adds an address. When the new address is flagged default, every other
    /// address loses the flag in the same mutation.
    pub fn add_address(&mut self, input: NewAddress) -> AddressId {
        if input.is_default {
            for addr in &mut self.addresses {
                addr.is_default = false;
            }
        }
        let id = AddressId::new();
        self.addresses.push(Address {
            id,
            label: input.label,
            street: input.street,
            city: input.city,
            state: input.state,
            postal_code: input.postal_code,
            country: input.country,
            is_default: input.is_default,
        });
        id
    }

    /// Marks exactly one address as default, clearing the previous one.
    pub fn set_default_address(&mut self, address_id: AddressId) -> Result<(), DomainError> {
        if !self.addresses.iter().any(|a| a.id == address_id) {
            return Err(DomainError::AddressNotFound(address_id));
        }
        for addr in &mut self.addresses {
            addr.is_default = addr.id == address_id;
        }
        Ok(())
    }

    /// Looks up an address by ID.
    pub fn address(&self, address_id: AddressId) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == address_id)
    }

    /// Returns the default address, if one is marked.
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            "Asha".to_string(),
            "Asha@Example.com".to_string(),
            "hash".to_string(),
        )
        .unwrap()
    }

    fn address(is_default: bool) -> NewAddress {
        NewAddress {
            label: "Home".to_string(),
            street: "12 Lake Rd".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: "411001".to_string(),
            country: "India".to_string(),
            is_default,
        }
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(user().email, "asha@example.com");
    }

    #[test]
    fn rejects_invalid_email() {
        let result = User::new("A".to_string(), "not-an-email".to_string(), "h".to_string());
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn at_most_one_default_address() {
        let mut u = user();
        u.add_address(address(true));
        u.add_address(address(true));
        u.add_address(address(false));
        assert_eq!(u.addresses.iter().filter(|a| a.is_default).count(), 1);
        // most recent default wins
        assert!(u.addresses[1].is_default);
    }

    #[test]
    fn set_default_clears_previous() {
        let mut u = user();
        let first = u.add_address(address(true));
        let second = u.add_address(address(false));
        u.set_default_address(second).unwrap();
        assert!(!u.address(first).unwrap().is_default);
        assert!(u.address(second).unwrap().is_default);
        assert_eq!(u.default_address().unwrap().id, second);
    }

    #[test]
    fn set_default_unknown_address_fails() {
        let mut u = user();
        let missing = AddressId::new();
        assert!(matches!(
            u.set_default_address(missing),
            Err(DomainError::AddressNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let u = user();
        let json = serde_json::to_string(&u).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("hash"));
    }
}
