//! Postal address value type embedded in members and deliveries.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Immutable postal address (city, street, zipcode).
///
/// Value semantics: two addresses are equal when all components match, and an
/// address never changes after construction. Orders capture the member's
/// address at placement time so later member moves do not rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    city: String,
    street: String,
    zipcode: String,
}

/// Validation errors raised by [`Address::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressValidationError {
    /// City is empty once trimmed.
    #[error("city must not be empty")]
    EmptyCity,
    /// Street is empty once trimmed.
    #[error("street must not be empty")]
    EmptyStreet,
    /// Zipcode is empty once trimmed.
    #[error("zipcode must not be empty")]
    EmptyZipcode,
}

impl Address {
    /// Construct an address, rejecting blank components.
    ///
    /// # Examples
    /// ```
    /// use bookshop_backend::domain::Address;
    ///
    /// let address = Address::new("Seoul", "Teheran-ro 1", "06234").expect("valid address");
    /// assert_eq!(address.city(), "Seoul");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`AddressValidationError`] when any component is blank.
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> Result<Self, AddressValidationError> {
        let city = city.into();
        let street = street.into();
        let zipcode = zipcode.into();
        if city.trim().is_empty() {
            return Err(AddressValidationError::EmptyCity);
        }
        if street.trim().is_empty() {
            return Err(AddressValidationError::EmptyStreet);
        }
        if zipcode.trim().is_empty() {
            return Err(AddressValidationError::EmptyZipcode);
        }
        Ok(Self {
            city,
            street,
            zipcode,
        })
    }

    /// City component.
    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Street component.
    #[must_use]
    pub fn street(&self) -> &str {
        &self.street
    }

    /// Zipcode component.
    #[must_use]
    pub fn zipcode(&self) -> &str {
        &self.zipcode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "street", "zip", AddressValidationError::EmptyCity)]
    #[case("city", "  ", "zip", AddressValidationError::EmptyStreet)]
    #[case("city", "street", "", AddressValidationError::EmptyZipcode)]
    fn rejects_blank_components(
        #[case] city: &str,
        #[case] street: &str,
        #[case] zipcode: &str,
        #[case] expected: AddressValidationError,
    ) {
        assert_eq!(Address::new(city, street, zipcode), Err(expected));
    }

    #[rstest]
    fn serialises_camel_case() {
        let address = Address::new("Busan", "Suyeong-ro 2", "48265").expect("valid address");
        let value = serde_json::to_value(&address).expect("serialisable");
        assert_eq!(value["city"], "Busan");
        assert_eq!(value["street"], "Suyeong-ro 2");
        assert_eq!(value["zipcode"], "48265");
    }
}
