//! Heuristic form-field parser.
//!
//! Infers the logical fields of a form from static markup, without any
//! inference service. Two passes are layered:
//!
//! 1. **Control scan**: every input-like `<input>`, `<textarea>` and
//!    `<select>`: resolve a label, pick a name source, classify.
//! 2. **Table scan**: two-cell rows where the first cell is the label and
//!    the second cell holds the control.
//!
//! Radio and checkbox groups are one field per group `name`. Results are
//! deduplicated by field name (first discovered wins) and a final safety net
//! recovers "hobbies" checkbox groups whose options carry no group name.
//!
//! Parsing is **synchronous** and CPU bound. Async callers should wrap it in
//! `tokio::task::spawn_blocking`.

use crate::heuristics::{infer_data_type, mentions_address, to_camel_case};
use crate::sanitizer::collapse_whitespace;
use crate::types::{push_unique, DataType, Field};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

const CONTROL_SELECTOR: &str = "input, textarea, select";

/// `<input type>` values that are never a fillable field of their own.
const NON_FIELD_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

/// `<input type>` values whose controls are options of a named group.
const CHOICE_INPUT_TYPES: &[&str] = &["checkbox", "radio"];

fn hobby_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)hobb").expect("hobby field regex is valid"))
}

fn hobby_markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)hobb(?:y|ies)").expect("hobby markup regex is valid"))
}

/// Parse every detectable field from `html`, in document order.
pub fn parse_fields(html: &str) -> Vec<Field> {
    let document = Html::parse_document(html);
    let mut fields = Vec::new();

    let control_sel = Selector::parse(CONTROL_SELECTOR).expect("control selector is valid");
    let label_sel = Selector::parse("label[for]").expect("label selector is valid");
    let row_sel = Selector::parse("tr").expect("row selector is valid");
    let cell_sel = Selector::parse("td").expect("cell selector is valid");

    // First `<label for>` per id wins, as a document-order lookup would.
    let mut bound_labels: HashMap<&str, String> = HashMap::new();
    for label in document.select(&label_sel) {
        if let Some(target) = label.value().attr("for").filter(|t| !t.is_empty()) {
            bound_labels
                .entry(target)
                .or_insert_with(|| element_text(&label));
        }
    }

    for control in document.select(&control_sel) {
        if !is_input_like(&control) {
            continue;
        }
        if let Some(field) = field_from_control(&control, &bound_labels) {
            push_unique(&mut fields, field);
        }
    }
    let from_controls = fields.len();

    for row in document.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        if cells.len() < 2 {
            continue;
        }
        let label = element_text(&cells[0]);
        let Some(control) = cells[1].select(&control_sel).find(is_input_like) else {
            continue;
        };
        if let Some(field) = field_from_table_cell(&control, &label) {
            push_unique(&mut fields, field);
        }
    }

    if !fields.iter().any(|f| hobby_field_re().is_match(&f.field_name))
        && hobby_markup_re().is_match(html)
    {
        fields.push(Field::new("hobbies", DataType::Word).with_label("Hobbies"));
    }

    debug!(
        controls = from_controls,
        total = fields.len(),
        "heuristic parse finished"
    );
    fields
}

/// Resolve one control found by the control scan.
fn field_from_control(
    control: &ElementRef<'_>,
    bound_labels: &HashMap<&str, String>,
) -> Option<Field> {
    let el = control.value();
    let id = non_empty(el.attr("id"));
    let placeholder = non_empty(el.attr("placeholder"));
    let aria = non_empty(el.attr("aria-label"));

    // Option ids and labels name a single choice, not the group.
    if is_choice(control) {
        let raw_name = non_empty(el.attr("name")).or(aria)?;
        let field = classify(raw_name, raw_name, el.attr("type"))?;
        return Some(field.with_label(aria.unwrap_or_default()));
    }

    let bound = id
        .and_then(|id| bound_labels.get(id))
        .map(String::as_str)
        .filter(|t| !t.is_empty());
    let label_text = match bound {
        Some(text) => Some(text.to_string()),
        None => enclosing_label(control),
    };

    // An id bound by `<label for>` is a binding key; its label names the field.
    let id_source = if bound.is_some() { bound } else { id };
    let raw_name = non_empty(el.attr("name"))
        .or(id_source)
        .or(placeholder)
        .or(aria)
        .or(label_text.as_deref())?;

    let display_label = label_text
        .clone()
        .or_else(|| placeholder.map(String::from))
        .or_else(|| aria.map(String::from))
        .unwrap_or_default();

    if el.name() == "textarea" {
        let haystack = format!(
            "{}{}{}",
            placeholder.unwrap_or(""),
            label_text.as_deref().unwrap_or(""),
            raw_name
        );
        if mentions_address(&haystack) {
            return Some(Field::street_address().with_label(display_label));
        }
    }

    let classify_text = label_text.as_deref().unwrap_or(raw_name);
    let field = classify(raw_name, classify_text, el.attr("type"))?;
    Some(field.with_label(display_label))
}

/// Resolve the control of a two-cell table row labelled by `label`.
fn field_from_table_cell(control: &ElementRef<'_>, label: &str) -> Option<Field> {
    let el = control.value();
    let id = if is_choice(control) {
        None
    } else {
        non_empty(el.attr("id"))
    };
    let raw_name = non_empty(el.attr("name"))
        .or(id)
        .or(non_empty(Some(label)))?;

    let classify_text = if label.is_empty() { raw_name } else { label };
    let field = classify(raw_name, classify_text, el.attr("type"))?;
    Some(field.with_label(label))
}

/// Name and classify a candidate. `None` when no identifier can be formed.
fn classify(raw_name: &str, classify_text: &str, type_attr: Option<&str>) -> Option<Field> {
    if mentions_address(raw_name) {
        return Some(Field::street_address());
    }
    let field_name = to_camel_case(raw_name);
    if field_name.is_empty() {
        return None;
    }
    Some(Field::new(field_name, infer_data_type(classify_text, type_attr)))
}

/// Whether the element is a fillable control this parser considers.
fn is_input_like(el: &ElementRef<'_>) -> bool {
    let type_attr = el
        .value()
        .attr("type")
        .map(|t| t.trim().to_lowercase())
        .unwrap_or_default();
    if type_attr == "hidden" {
        return false;
    }
    match el.value().name() {
        "input" => !NON_FIELD_INPUT_TYPES.contains(&type_attr.as_str()),
        "textarea" | "select" => true,
        _ => false,
    }
}

/// Whether the element is one option of a radio or checkbox group.
fn is_choice(el: &ElementRef<'_>) -> bool {
    el.value().name() == "input"
        && el
            .value()
            .attr("type")
            .is_some_and(|t| CHOICE_INPUT_TYPES.contains(&t.trim().to_lowercase().as_str()))
}

/// Text of the nearest `<label>` ancestor, if any.
fn enclosing_label(el: &ElementRef<'_>) -> Option<String> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "label")
        .map(|label| element_text(&label))
        .filter(|t| !t.is_empty())
}

/// Collect all visible text content from an element, whitespace-collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(|f| f.field_name.as_str()).collect()
    }

    #[test]
    fn test_hidden_control_is_excluded_and_label_names_the_field() {
        let html = r#"
        <form>
            <input type="hidden" name="csrf" value="abc123">
            <label for="e">Email</label>
            <input type="email" id="e">
        </form>
        "#;

        let fields = parse_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name, "email");
        assert_eq!(fields[0].data_type, DataType::EmailAddress);
        assert_eq!(fields[0].label.as_deref(), Some("Email"));
    }

    #[test]
    fn test_hidden_textarea_and_select_are_excluded() {
        let html = r#"
            <textarea type="hidden" name="state_blob"></textarea>
            <select type="hidden" name="tracking"></select>
            <input type="HIDDEN" name="token">
        "#;
        assert!(parse_fields(html).is_empty());
    }

    #[test]
    fn test_table_row_date_of_birth() {
        let html = r#"
        <table>
            <tr><td>Date of Birth</td><td><input type="date" name="dob"></td></tr>
        </table>
        "#;

        let fields = parse_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name, "dob");
        assert_eq!(fields[0].data_type, DataType::DateOfBirth);
    }

    #[test]
    fn test_textarea_with_address_placeholder_is_street_address() {
        let html = r#"
            <textarea name="comments" placeholder="Enter your current address"></textarea>
        "#;

        let fields = parse_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name, "streetAddress");
        assert_eq!(fields[0].data_type, DataType::StreetAddress);
        assert_eq!(fields[0].label.as_deref(), Some("Enter your current address"));
    }

    #[test]
    fn test_hobbies_checkbox_group_is_synthesized() {
        let html = r#"
        <div class="group">
            <span>Hobbies</span>
            <input type="checkbox" id="hobbies-checkbox-1" value="1"> Sports
            <input type="checkbox" id="hobbies-checkbox-2" value="2"> Reading
            <input type="checkbox" id="hobbies-checkbox-3" value="3"> Music
        </div>
        <input type="text" name="firstName" placeholder="First Name">
        "#;

        let fields = parse_fields(html);
        assert_eq!(names(&fields), vec!["firstName", "hobbies"]);
        let hobbies: Vec<_> = fields.iter().filter(|f| f.field_name == "hobbies").collect();
        assert_eq!(hobbies.len(), 1);
        assert_eq!(hobbies[0].data_type, DataType::Word);
    }

    #[test]
    fn test_choice_groups_are_named_by_group() {
        let html = r#"
        <form>
            <input type="text" name="firstName">
            <input type="radio" name="gender" id="gender-m" value="m">
            <label for="gender-m">Male</label>
            <input type="radio" name="gender" id="gender-f" value="f">
            <label for="gender-f">Female</label>
            <label><input type="checkbox" name="subscribe"> Send me news</label>
        </form>
        "#;

        let fields = parse_fields(html);
        assert_eq!(names(&fields), vec!["firstName", "gender", "subscribe"]);
        assert_eq!(fields[1].data_type, DataType::Gender);
        assert_eq!(fields[1].label, None);
        assert_eq!(fields[2].data_type, DataType::Word);
    }

    #[test]
    fn test_table_radio_uses_group_name_over_option_id() {
        let html = r#"
        <table>
            <tr><td>Sex</td><td>
                <input type="radio" name="sex" id="sex-1"> M
                <input type="radio" name="sex" id="sex-2"> F
            </td></tr>
            <tr><td>Newsletter</td><td><input type="checkbox" id="news-1"></td></tr>
        </table>
        "#;

        let fields = parse_fields(html);
        assert_eq!(names(&fields), vec!["sex", "newsletter"]);
        assert_eq!(fields[0].data_type, DataType::Gender);
        assert_eq!(fields[1].label.as_deref(), Some("Newsletter"));
    }

    #[test]
    fn test_detected_hobby_field_suppresses_safety_net() {
        let html = r#"<label>Your hobbies <input name="hobbyList"></label>"#;
        let fields = parse_fields(html);
        assert_eq!(names(&fields), vec!["hobbyList"]);
    }

    #[test]
    fn test_name_source_precedence() {
        let html = r#"
            <input name="user_name" id="uid" placeholder="Your name">
            <input id="phone_no" placeholder="Phone">
            <input placeholder="Company">
            <input aria-label="Job title">
            <label>Postcode <input type="text"></label>
        "#;

        let fields = parse_fields(html);
        assert_eq!(
            names(&fields),
            vec!["userName", "phoneNo", "company", "jobTitle", "postcode"]
        );
        assert_eq!(fields[0].data_type, DataType::FullName);
        assert_eq!(fields[1].data_type, DataType::PhoneNumber);
        assert_eq!(fields[2].data_type, DataType::CompanyName);
        assert_eq!(fields[3].data_type, DataType::JobTitle);
        assert_eq!(fields[4].data_type, DataType::PostalCode);
    }

    #[test]
    fn test_unnamed_controls_are_skipped() {
        let html = r#"<form><input type="text"><select></select><textarea></textarea></form>"#;
        assert!(parse_fields(html).is_empty());
    }

    #[test]
    fn test_buttons_are_not_fields() {
        let html = r#"
            <input type="submit" name="send" value="Send">
            <input type="reset" name="clear">
            <input type="button" name="help">
            <input type="image" name="go" src="/go.png">
            <button type="submit" name="submit">Submit</button>
        "#;
        assert!(parse_fields(html).is_empty());
    }

    #[test]
    fn test_address_names_collapse_and_deduplicate() {
        let html = r#"
            <input name="home_address">
            <input name="mailing-address" type="text">
            <input name="city">
        "#;

        let fields = parse_fields(html);
        assert_eq!(names(&fields), vec!["streetAddress", "city"]);
        assert_eq!(fields[0].data_type, DataType::StreetAddress);
        assert_eq!(fields[1].data_type, DataType::City);
    }

    #[test]
    fn test_table_scan_uses_label_when_control_is_unnamed() {
        let html = r#"
        <table>
            <tr><td>Mobile Number</td><td><input type="text"></td></tr>
            <tr><td>Only one cell</td></tr>
            <tr><td>Notes</td><td>no control here</td></tr>
        </table>
        "#;

        let fields = parse_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name, "mobileNumber");
        assert_eq!(fields[0].data_type, DataType::PhoneNumber);
        assert_eq!(fields[0].label.as_deref(), Some("Mobile Number"));
    }

    #[test]
    fn test_table_scan_skips_hidden_controls() {
        let html = r#"
        <table>
            <tr><td>Session</td><td><input type="hidden" name="session"></td></tr>
        </table>
        "#;
        assert!(parse_fields(html).is_empty());
    }

    #[test]
    fn test_select_uses_enclosing_label() {
        let html = r#"
            <label>Country
                <select name="country_code">
                    <option>NZ</option>
                    <option>AU</option>
                </select>
            </label>
        "#;

        let fields = parse_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name, "countryCode");
        assert_eq!(fields[0].data_type, DataType::Country);
    }

    #[test]
    fn test_file_input_defaults_to_image_url() {
        let html = r#"<input type="file" name="upload">"#;
        let fields = parse_fields(html);
        assert_eq!(fields[0].data_type, DataType::ImageUrl);
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        let html = r#"<div><form><p><label for="n">Name<input id="n" name="full_name"
            <div><input type="email" name="mail"></span></table>"#;
        let fields = parse_fields(html);
        assert!(fields.iter().any(|f| f.field_name == "mail"));
    }

    #[test]
    fn test_empty_markup() {
        assert!(parse_fields("").is_empty());
    }
}
