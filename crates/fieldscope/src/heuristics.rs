//! Ordered, first-match-wins rules that classify a control into a [`DataType`].
//!
//! Two tables are consulted in sequence: the HTML `type` attribute rules,
//! then the label keyword rules. Both are plain slices evaluated top-down;
//! precedence is the slice order and never changes at runtime.

use crate::types::DataType;

/// A keyword rule: any keyword contained in the lowercase text selects `data_type`.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub data_type: DataType,
}

impl KeywordRule {
    fn matches(&self, lower: &str) -> bool {
        self.keywords.iter().any(|k| lower.contains(k))
    }
}

const BIRTH_KEYWORDS: &[&str] = &["dob", "birth", "birthday", "date of birth"];

/// Label keyword table, in precedence order.
pub const LABEL_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["first name", "firstname", "given name"],
        data_type: DataType::FirstName,
    },
    KeywordRule {
        keywords: &["last name", "lastname", "surname", "family name"],
        data_type: DataType::LastName,
    },
    KeywordRule {
        keywords: &["full name", "fullname", "name"],
        data_type: DataType::FullName,
    },
    KeywordRule {
        keywords: &["email"],
        data_type: DataType::EmailAddress,
    },
    KeywordRule {
        keywords: &["phone", "mobile", "tel"],
        data_type: DataType::PhoneNumber,
    },
    KeywordRule {
        keywords: &["company", "organisation", "organization", "employer"],
        data_type: DataType::CompanyName,
    },
    KeywordRule {
        keywords: &["job", "occupation", "position", "title"],
        data_type: DataType::JobTitle,
    },
    KeywordRule {
        keywords: &["gender", "sex"],
        data_type: DataType::Gender,
    },
    KeywordRule {
        keywords: &["hobby", "hobbies", "interest"],
        data_type: DataType::Word,
    },
    KeywordRule {
        keywords: &["photo", "picture", "image"],
        data_type: DataType::ImageUrl,
    },
    KeywordRule {
        keywords: &["street", "address line1", "address line 1", "addr"],
        data_type: DataType::StreetAddress,
    },
    KeywordRule {
        keywords: &["city", "town"],
        data_type: DataType::City,
    },
    KeywordRule {
        keywords: &["state", "province", "region"],
        data_type: DataType::StateProvince,
    },
    KeywordRule {
        keywords: &["country"],
        data_type: DataType::Country,
    },
    KeywordRule {
        keywords: &["address"],
        data_type: DataType::StreetAddress,
    },
    KeywordRule {
        keywords: &["zip", "postal", "postcode"],
        data_type: DataType::PostalCode,
    },
    KeywordRule {
        keywords: BIRTH_KEYWORDS,
        data_type: DataType::DateOfBirth,
    },
];

/// What a matching `type` attribute resolves to.
#[derive(Debug, Clone, Copy)]
pub enum TypeOutcome {
    /// Always this type.
    Fixed(DataType),
    /// `Date`, unless the label names a date of birth.
    DateOrBirth,
    /// Whatever the label rules say, else the given type.
    LabelOr(DataType),
}

/// A `type` attribute rule: matches when the attribute contains any needle.
#[derive(Debug, Clone, Copy)]
pub struct TypeRule {
    pub needles: &'static [&'static str],
    pub outcome: TypeOutcome,
}

/// `type` attribute table, in precedence order.
///
/// `datetime` sits above `date` because `datetime-local` contains both.
pub const TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        needles: &["email"],
        outcome: TypeOutcome::Fixed(DataType::EmailAddress),
    },
    TypeRule {
        needles: &["tel", "phone"],
        outcome: TypeOutcome::Fixed(DataType::PhoneNumber),
    },
    TypeRule {
        needles: &["datetime"],
        outcome: TypeOutcome::Fixed(DataType::DateTime),
    },
    TypeRule {
        needles: &["date"],
        outcome: TypeOutcome::DateOrBirth,
    },
    TypeRule {
        needles: &["password"],
        outcome: TypeOutcome::Fixed(DataType::Password),
    },
    TypeRule {
        needles: &["number"],
        outcome: TypeOutcome::Fixed(DataType::RandomNumber),
    },
    TypeRule {
        needles: &["file"],
        outcome: TypeOutcome::LabelOr(DataType::ImageUrl),
    },
];

/// First label rule matching `text`, case-insensitively.
pub fn infer_label_data_type(text: &str) -> Option<DataType> {
    let lower = text.to_lowercase();
    LABEL_RULES
        .iter()
        .find(|rule| rule.matches(&lower))
        .map(|rule| rule.data_type)
}

/// Classify a control from its label (or name) text and its `type` attribute.
///
/// Type rules win over label rules; `Word` is the fallback.
pub fn infer_data_type(label_or_name: &str, type_attr: Option<&str>) -> DataType {
    if let Some(t) = type_attr.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()) {
        if let Some(rule) = TYPE_RULES
            .iter()
            .find(|rule| rule.needles.iter().any(|n| t.contains(n)))
        {
            return match rule.outcome {
                TypeOutcome::Fixed(dt) => dt,
                TypeOutcome::DateOrBirth => {
                    let lower = label_or_name.to_lowercase();
                    if BIRTH_KEYWORDS.iter().any(|k| lower.contains(k)) {
                        DataType::DateOfBirth
                    } else {
                        DataType::Date
                    }
                }
                TypeOutcome::LabelOr(fallback) => {
                    infer_label_data_type(label_or_name).unwrap_or(fallback)
                }
            };
        }
    }

    infer_label_data_type(label_or_name).unwrap_or(DataType::Word)
}

/// Whether the text names an address and must collapse to `streetAddress`.
pub fn mentions_address(text: &str) -> bool {
    text.to_lowercase().contains("address")
}

/// Convert free text or a raw attribute value into a camelCase identifier.
///
/// Words are split on anything that is not a letter or digit. The first word
/// is lowercased at its head (fully, when it is all caps); later words are
/// capitalised. Already-camelCase input is returned unchanged. The result may
/// be empty when the input has no letters or digits.
pub fn to_camel_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (idx, word) in raw
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let mut chars = word.chars();
        let Some(head) = chars.next() else {
            continue;
        };
        if idx == 0 {
            let all_caps = word.chars().count() > 1
                && word.chars().all(|c| !c.is_lowercase());
            if all_caps {
                out.push_str(&word.to_lowercase());
            } else {
                out.extend(head.to_lowercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.extend(head.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
