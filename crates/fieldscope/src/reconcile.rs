//! Merges inference guesses with heuristic results into one field list.
//!
//! Every stage is an order-preserving `Vec<Field> -> Vec<Field>` function so
//! each can be tested on its own; [`reconcile`] chains them:
//!
//! 1. admit: normalize inferred names, drop unusable entries
//! 2. union: inferred fields first, then unseen heuristic fields
//! 3. prune: drop "picture" paragraphs once an address is known
//! 4. canonicalize: collapse address-like fields to `streetAddress`
//! 5. refine: rename still-generic names through the [`NameRefiner`]
//! 6. dedup: restore name uniqueness after 4 and 5
//!
//! An empty inference list short-circuits to the heuristic list verbatim.

use crate::heuristics::to_camel_case;
use crate::services::{NameRefiner, RefinementCandidate, RefinementRequest};
use crate::types::{push_unique, DataType, Field, STREET_ADDRESS_FIELD};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on names sent in one refinement call.
pub const DEFAULT_MAX_REFINE_FIELDS: usize = 50;

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(current|street|postal|address)").expect("address regex is valid")
    })
}

fn generic_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(field|input|text|textarea|select)[0-9_]*$")
            .expect("generic name regex is valid")
    })
}

fn picture_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)picture").expect("picture regex is valid"))
}

/// Knobs for the refinement stage.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Where the markup came from, forwarded to the refiner as a hint.
    pub source_url: Option<String>,
    pub refine_timeout: Duration,
    pub max_refine_fields: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            source_url: None,
            refine_timeout: Duration::from_secs(20),
            max_refine_fields: DEFAULT_MAX_REFINE_FIELDS,
        }
    }
}

/// Normalize inferred fields: camelCase names, no empty names, first wins.
pub fn admit_candidates(inferred: Vec<Field>) -> Vec<Field> {
    let mut admitted = Vec::with_capacity(inferred.len());
    for mut field in inferred {
        let name = to_camel_case(&field.field_name);
        if name.is_empty() {
            debug!(raw = %field.field_name, "dropped inferred field without usable name");
            continue;
        }
        field.field_name = name;
        push_unique(&mut admitted, field);
    }
    admitted
}

/// Inferred fields in order, then every heuristic field whose name is unseen.
pub fn union(inferred: Vec<Field>, heuristic: &[Field]) -> Vec<Field> {
    let mut merged = inferred;
    for field in heuristic {
        push_unique(&mut merged, field.clone());
    }
    merged
}

/// Once `streetAddress` is present, a `Paragraph` named like "picture" is a
/// misread upload control and is dropped.
pub fn prune_misdetections(fields: Vec<Field>) -> Vec<Field> {
    if !fields.iter().any(|f| f.field_name == STREET_ADDRESS_FIELD) {
        return fields;
    }
    fields
        .into_iter()
        .filter(|f| !(f.data_type == DataType::Paragraph && picture_re().is_match(&f.field_name)))
        .collect()
}

/// Force address-like fields (by label or name) to `streetAddress`.
///
/// Idempotent. May introduce duplicate names; see [`dedup_by_name`].
pub fn canonicalize_addresses(fields: Vec<Field>) -> Vec<Field> {
    fields
        .into_iter()
        .map(|field| {
            let label_hit = field.label.as_deref().is_some_and(|l| address_re().is_match(l));
            if label_hit || address_re().is_match(&field.field_name) {
                Field {
                    field_name: STREET_ADDRESS_FIELD.to_string(),
                    data_type: DataType::StreetAddress,
                    label: field.label,
                }
            } else {
                field
            }
        })
        .collect()
}

/// Whether a name is a placeholder such as `field1`, `input_2` or `select`.
pub fn is_generic_name(name: &str) -> bool {
    generic_name_re().is_match(name)
}

/// Indices of generic-named fields, in encounter order.
pub fn generic_positions(fields: &[Field]) -> Vec<usize> {
    fields
        .iter()
        .enumerate()
        .filter(|(_, f)| is_generic_name(&f.field_name))
        .map(|(idx, _)| idx)
        .collect()
}

/// Build the refinement call from the heuristic name/label pairs.
pub fn refinement_request(
    heuristic: &[Field],
    source_url: Option<&str>,
    max_fields: usize,
) -> RefinementRequest {
    RefinementRequest {
        fields: heuristic
            .iter()
            .take(max_fields)
            .map(|f| RefinementCandidate {
                original: f.field_name.clone(),
                label: f.label.clone(),
            })
            .collect(),
        url: source_url.map(String::from),
    }
}

/// Substitute the n-th refined name into the n-th generic position.
///
/// Missing or unusable names leave the field untouched.
pub fn apply_refinements(
    mut fields: Vec<Field>,
    positions: &[usize],
    refined: &[String],
) -> Vec<Field> {
    for (&pos, name) in positions.iter().zip(refined) {
        let name = to_camel_case(name);
        if name.is_empty() {
            continue;
        }
        if let Some(field) = fields.get_mut(pos) {
            field.field_name = name;
        }
    }
    fields
}

/// Keep the first field of each name.
pub fn dedup_by_name(fields: Vec<Field>) -> Vec<Field> {
    let mut unique = Vec::with_capacity(fields.len());
    for field in fields {
        push_unique(&mut unique, field);
    }
    unique
}

/// Merge `inferred` and `heuristic` into the final field list.
///
/// The only suspension point is the refiner call, which is bounded by
/// `options.refine_timeout`. A refiner failure or timeout keeps the generic
/// names instead of failing.
pub async fn reconcile(
    inferred: Vec<Field>,
    heuristic: Vec<Field>,
    refiner: &dyn NameRefiner,
    options: &ReconcileOptions,
) -> Vec<Field> {
    let inferred = admit_candidates(inferred);
    if inferred.is_empty() {
        debug!(count = heuristic.len(), "no inferred fields; using heuristic result");
        return heuristic;
    }

    let merged = union(inferred, &heuristic);
    let merged = prune_misdetections(merged);
    let merged = canonicalize_addresses(merged);

    let positions = generic_positions(&merged);
    let merged = if positions.is_empty() || heuristic.is_empty() {
        merged
    } else {
        let request = refinement_request(
            &heuristic,
            options.source_url.as_deref(),
            options.max_refine_fields,
        );
        debug!(generic = positions.len(), sent = request.fields.len(), "refining generic names");
        match tokio::time::timeout(options.refine_timeout, refiner.refine_names(&request)).await {
            Ok(Ok(refined)) => apply_refinements(merged, &positions, &refined),
            Ok(Err(e)) => {
                warn!(error = %e, "name refinement failed; keeping generic names");
                merged
            }
            Err(_) => {
                warn!(
                    timeout_ms = options.refine_timeout.as_millis() as u64,
                    "name refinement timed out; keeping generic names"
                );
                merged
            }
        }
    };

    dedup_by_name(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubRefiner {
        names: Vec<String>,
        seen: Mutex<Vec<RefinementRequest>>,
    }

    impl StubRefiner {
        fn new(names: &[&str]) -> Self {
            Self {
                names: names.iter().map(|n| n.to_string()).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<RefinementRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NameRefiner for StubRefiner {
        async fn refine_names(&self, request: &RefinementRequest) -> Result<Vec<String>> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.names.clone())
        }
    }

    struct FailingRefiner;

    #[async_trait]
    impl NameRefiner for FailingRefiner {
        async fn refine_names(&self, _request: &RefinementRequest) -> Result<Vec<String>> {
            Err(anyhow!("refinement backend unavailable"))
        }
    }

    struct SlowRefiner;

    #[async_trait]
    impl NameRefiner for SlowRefiner {
        async fn refine_names(&self, _request: &RefinementRequest) -> Result<Vec<String>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec!["tooLate".into()])
        }
    }

    fn field(name: &str, dt: DataType) -> Field {
        Field::new(name, dt)
    }

    fn names(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(|f| f.field_name.as_str()).collect()
    }

    #[test]
    fn test_union_keeps_inferred_order_and_appends_unseen() {
        let inferred = vec![field("email", DataType::EmailAddress), field("city", DataType::City)];
        let heuristic = vec![
            field("city", DataType::Word),
            field("phone", DataType::PhoneNumber),
            field("email", DataType::Word),
        ];

        let merged = union(inferred, &heuristic);
        assert_eq!(names(&merged), vec!["email", "city", "phone"]);
        assert_eq!(merged[1].data_type, DataType::City);
    }

    #[test]
    fn test_admit_normalizes_and_drops_unusable_names() {
        let admitted = admit_candidates(vec![
            field("first_name", DataType::FirstName),
            field("  ", DataType::Word),
            field("firstName", DataType::Word),
            field("Zip Code", DataType::PostalCode),
        ]);
        assert_eq!(names(&admitted), vec!["firstName", "zipCode"]);
        assert_eq!(admitted[0].data_type, DataType::FirstName);
    }

    #[test]
    fn test_prune_requires_street_address() {
        let fields = vec![
            field("pictureOfId", DataType::Paragraph),
            field("comments", DataType::Paragraph),
        ];
        assert_eq!(prune_misdetections(fields.clone()), fields);

        let mut with_address = fields;
        with_address.push(Field::street_address());
        with_address.push(field("profilePicture", DataType::ImageUrl));
        let pruned = prune_misdetections(with_address);
        assert_eq!(names(&pruned), vec!["comments", "streetAddress", "profilePicture"]);
    }

    #[test]
    fn test_canonicalize_by_label_or_name() {
        let fields = vec![
            field("currentResidence", DataType::Paragraph),
            field("zip", DataType::PostalCode).with_label("Postal code"),
            field("email", DataType::EmailAddress).with_label("Email"),
        ];

        let canonical = canonicalize_addresses(fields);
        assert_eq!(names(&canonical), vec!["streetAddress", "streetAddress", "email"]);
        assert_eq!(canonical[0].data_type, DataType::StreetAddress);
        assert_eq!(canonical[1].label.as_deref(), Some("Postal code"));
        assert_eq!(canonical[2].data_type, DataType::EmailAddress);
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let fields = vec![
            field("streetLine", DataType::Word),
            field("age", DataType::Age).with_label("Your current age"),
            field("notes", DataType::Paragraph),
            Field::street_address().with_label("Address"),
        ];

        let once = canonicalize_addresses(fields);
        let twice = canonicalize_addresses(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_generic_name_pattern_is_narrow() {
        for generic in ["field1", "input_2", "Text", "textarea", "select_3_1", "FIELD"] {
            assert!(is_generic_name(generic), "{generic} should be generic");
        }
        for specific in ["fieldName", "123", "inputEmail", "textColor", "field-1", ""] {
            assert!(!is_generic_name(specific), "{specific} should not be generic");
        }
    }

    #[test]
    fn test_apply_refinements_tolerates_short_and_blank_output() {
        let fields = vec![
            field("field1", DataType::Word),
            field("email", DataType::EmailAddress),
            field("input2", DataType::Word),
            field("text3", DataType::Word),
        ];
        let positions = generic_positions(&fields);
        assert_eq!(positions, vec![0, 2, 3]);

        let refined = apply_refinements(fields, &positions, &["yourAge".into(), " ".into()]);
        assert_eq!(names(&refined), vec!["yourAge", "email", "input2", "text3"]);
    }

    #[test]
    fn test_refinement_request_is_capped() {
        let heuristic: Vec<Field> = (0..60)
            .map(|i| field(&format!("field{i}"), DataType::Word))
            .collect();
        let request = refinement_request(&heuristic, Some("https://example.com"), 50);
        assert_eq!(request.fields.len(), 50);
        assert_eq!(request.url.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn test_empty_inference_returns_heuristics_verbatim() {
        let heuristic = vec![
            field("zip", DataType::PostalCode).with_label("Postal code"),
            field("field1", DataType::Word),
        ];
        let refiner = StubRefiner::new(&["ignored"]);

        let result =
            reconcile(Vec::new(), heuristic.clone(), &refiner, &ReconcileOptions::default()).await;
        assert_eq!(result, heuristic);
        assert!(refiner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generic_inferred_name_is_refined_from_heuristic_labels() {
        let inferred = vec![field("field1", DataType::Word)];
        let heuristic = vec![field("field1", DataType::Word).with_label("Your Age")];
        let refiner = StubRefiner::new(&["yourAge"]);
        let options = ReconcileOptions {
            source_url: Some("https://example.com/form".into()),
            ..ReconcileOptions::default()
        };

        let result = reconcile(inferred, heuristic, &refiner, &options).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].field_name, "yourAge");
        assert_eq!(result[0].data_type, DataType::Word);

        let calls = refiner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].fields[0].original, "field1");
        assert_eq!(calls[0].fields[0].label.as_deref(), Some("Your Age"));
        assert_eq!(calls[0].url.as_deref(), Some("https://example.com/form"));
    }

    #[tokio::test]
    async fn test_no_generic_names_skips_refiner() {
        let refiner = StubRefiner::new(&["x"]);
        let result = reconcile(
            vec![field("email", DataType::EmailAddress)],
            vec![field("phone", DataType::PhoneNumber)],
            &refiner,
            &ReconcileOptions::default(),
        )
        .await;
        assert_eq!(names(&result), vec!["email", "phone"]);
        assert!(refiner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refiner_failure_keeps_generic_names() {
        let result = reconcile(
            vec![field("input_1", DataType::Word)],
            vec![field("input1", DataType::Word).with_label("Favourite colour")],
            &FailingRefiner,
            &ReconcileOptions::default(),
        )
        .await;
        assert_eq!(names(&result), vec!["input1"]);
    }

    #[tokio::test]
    async fn test_refiner_timeout_keeps_generic_names() {
        let options = ReconcileOptions {
            refine_timeout: Duration::from_millis(20),
            ..ReconcileOptions::default()
        };
        let result = reconcile(
            vec![field("text", DataType::Word)],
            vec![field("text", DataType::Word)],
            &SlowRefiner,
            &options,
        )
        .await;
        assert_eq!(names(&result), vec!["text"]);
    }

    #[tokio::test]
    async fn test_canonicalization_collisions_are_deduplicated() {
        let inferred = vec![
            field("streetAddress", DataType::StreetAddress),
            field("postalAddress", DataType::Word),
            field("email", DataType::EmailAddress),
        ];
        let result = reconcile(
            inferred,
            Vec::new(),
            &StubRefiner::new(&[]),
            &ReconcileOptions::default(),
        )
        .await;
        assert_eq!(names(&result), vec!["streetAddress", "email"]);
    }
}
