//! Core data types: detected fields and the closed data-type catalogue.
//!
//! The [`DataType`] vocabulary is shared with the inference service and the
//! downstream record generator. Its wire spelling (e.g. `"State/Province"`)
//! is part of that contract, so variants are declared together with their
//! serialized names and their category in a single table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical name every address-like field collapses to.
pub const STREET_ADDRESS_FIELD: &str = "streetAddress";

macro_rules! data_type_catalogue {
    ($( $group:ident => [ $( $variant:ident = $wire:literal ),+ $(,)? ] ),+ $(,)?) => {
        /// A data type from the closed catalogue.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum DataType {
            $($(
                #[serde(rename = $wire)]
                $variant,
            )+)+
        }

        impl DataType {
            /// Every catalogue entry, in category order.
            pub const ALL: &'static [DataType] = &[$($(DataType::$variant,)+)+];

            /// The contract spelling used on the wire.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($(DataType::$variant => $wire,)+)+
                }
            }

            /// The semantic category this type belongs to.
            pub fn group(self) -> DataTypeGroup {
                match self {
                    $($(DataType::$variant => DataTypeGroup::$group,)+)+
                }
            }
        }
    };
}

data_type_catalogue! {
    Personal => [
        FirstName = "FirstName",
        LastName = "LastName",
        FullName = "FullName",
        Gender = "Gender",
        Age = "Age",
        DateOfBirth = "DateOfBirth",
    ],
    Contact => [
        EmailAddress = "EmailAddress",
        PhoneNumber = "PhoneNumber",
        MobileNumber = "MobileNumber",
    ],
    Address => [
        StreetAddress = "StreetAddress",
        City = "City",
        StateProvince = "State/Province",
        Country = "Country",
        PostalCode = "ZIP/Postal Code",
    ],
    Network => [
        Ipv4Address = "IPv4Address",
        Ipv6Address = "IPv6Address",
        MacAddress = "MACAddress",
        Url = "URL",
        DomainName = "DomainName",
    ],
    Visual => [
        ColorHex = "ColorHex",
        ColorName = "ColorName",
        ImageUrl = "ImageURL",
    ],
    Business => [
        CompanyName = "CompanyName",
        JobTitle = "JobTitle",
        Department = "Department",
        EmployeeId = "EmployeeID",
    ],
    Financial => [
        CreditCardNumber = "CreditCardNumber",
        BankAccountNumber = "BankAccountNumber",
        Currency = "Currency",
        Price = "Price",
    ],
    Text => [
        RandomText = "RandomText",
        LoremIpsum = "LoremIpsum",
        Sentence = "Sentence",
        Paragraph = "Paragraph",
        Word = "Word",
    ],
    Numeric => [
        RandomNumber = "RandomNumber",
        IntegerRange = "IntegerRange",
        Decimal = "Decimal",
        Percentage = "Percentage",
    ],
    DateTime => [
        Date = "Date",
        Time = "Time",
        DateTime = "DateTime",
        Timestamp = "Timestamp",
        UnixTimestamp = "UnixTimestamp",
    ],
    Identifiers => [
        Uuid = "UUID",
        Guid = "GUID",
        RandomId = "RandomID",
        Username = "Username",
        Password = "Password",
    ],
    Boolean => [
        Boolean = "Boolean",
        YesNo = "YesNo",
        TrueFalse = "TrueFalse",
        ActiveInactive = "ActiveInactive",
    ],
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not part of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data type: {0}")]
pub struct UnknownDataType(pub String);

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DataType::ALL
            .iter()
            .copied()
            .find(|dt| dt.as_str() == wanted)
            .ok_or_else(|| UnknownDataType(s.to_string()))
    }
}

/// The twelve semantic categories of the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataTypeGroup {
    Personal,
    Contact,
    Address,
    Network,
    Visual,
    Business,
    Financial,
    Text,
    Numeric,
    DateTime,
    Identifiers,
    Boolean,
}

impl DataTypeGroup {
    /// Every category, in display order.
    pub const ALL: &'static [DataTypeGroup] = &[
        DataTypeGroup::Personal,
        DataTypeGroup::Contact,
        DataTypeGroup::Address,
        DataTypeGroup::Network,
        DataTypeGroup::Visual,
        DataTypeGroup::Business,
        DataTypeGroup::Financial,
        DataTypeGroup::Text,
        DataTypeGroup::Numeric,
        DataTypeGroup::DateTime,
        DataTypeGroup::Identifiers,
        DataTypeGroup::Boolean,
    ];

    /// Human-readable category heading.
    pub fn label(self) -> &'static str {
        match self {
            DataTypeGroup::Personal => "Personal Data",
            DataTypeGroup::Contact => "Contact Information",
            DataTypeGroup::Address => "Address Data",
            DataTypeGroup::Network => "Network Data",
            DataTypeGroup::Visual => "Visual Data",
            DataTypeGroup::Business => "Business Data",
            DataTypeGroup::Financial => "Financial Data",
            DataTypeGroup::Text => "Text Data",
            DataTypeGroup::Numeric => "Numeric Data",
            DataTypeGroup::DateTime => "Date/Time",
            DataTypeGroup::Identifiers => "Identifiers",
            DataTypeGroup::Boolean => "Boolean Data",
        }
    }

    /// Catalogue entries belonging to this category.
    pub fn members(self) -> impl Iterator<Item = DataType> {
        DataType::ALL.iter().copied().filter(move |dt| dt.group() == self)
    }
}

/// A detected logical input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Machine-readable camelCase identifier, unique within a result.
    pub field_name: String,
    pub data_type: DataType,
    /// Best human-readable text found for the control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Field {
    pub fn new(field_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            field_name: field_name.into(),
            data_type,
            label: None,
        }
    }

    /// Attach a label; blank labels are stored as `None`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label = if label.trim().is_empty() {
            None
        } else {
            Some(label)
        };
        self
    }

    /// The canonical `streetAddress` / `StreetAddress` pair.
    pub fn street_address() -> Self {
        Self::new(STREET_ADDRESS_FIELD, DataType::StreetAddress)
    }
}

/// Append `field` unless a field with the same name is already present.
///
/// Returns `true` when the field was appended.
pub fn push_unique(fields: &mut Vec<Field>, field: Field) -> bool {
    if fields.iter().any(|f| f.field_name == field.field_name) {
        return false;
    }
    fields.push(field);
    true
}
