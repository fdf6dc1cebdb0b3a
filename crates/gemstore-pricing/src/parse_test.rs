use serde_json::json;

use super::*;

fn extract(response: &Value) -> Option<f64> {
    PriceResponseParser::default().extract(response)
}

// -----------------------------------------------------------------------
// priority order
// -----------------------------------------------------------------------

#[test]
fn final_price_beats_price() {
    let response = json!({"price": "100", "final_price": 120});
    assert_eq!(extract(&response), Some(120.0));
}

#[test]
fn falls_through_to_lower_priority_fields() {
    let response = json!({"amount": 450.5, "cost": 10});
    assert_eq!(extract(&response), Some(450.5));
}

#[test]
fn cost_is_last_resort() {
    let response = json!({"currency": "USD", "cost": "2,999.00"});
    assert_eq!(extract(&response), Some(2999.0));
}

#[test]
fn first_match_wins_even_when_lower_field_is_larger() {
    let response = json!({"total_price": 5, "calculated_price": 5000});
    assert_eq!(extract(&response), Some(5.0));
}

#[test]
fn invalid_high_priority_field_is_skipped() {
    let response = json!({"final_price": "call us", "price": -3, "total_price": "1837"});
    assert_eq!(extract(&response), Some(1837.0));
}

#[test]
fn custom_field_order_is_respected() {
    let parser = PriceResponseParser::new(["sale_price", "price"]);
    let response = json!({"price": 10, "sale_price": 8, "final_price": 99});
    assert_eq!(parser.extract(&response), Some(8.0));
    assert_eq!(parser.fields(), ["sale_price", "price"]);
}

// -----------------------------------------------------------------------
// coercion
// -----------------------------------------------------------------------

#[test]
fn strips_currency_formatting() {
    assert_eq!(extract(&json!({"price": "$1,250.75"})), Some(1250.75));
    assert_eq!(extract(&json!({"price": " 980 USD "})), Some(980.0));
}

#[test]
fn zero_is_accepted() {
    assert_eq!(extract(&json!({"price": 0})), Some(0.0));
    assert_eq!(extract(&json!({"price": "0.00"})), Some(0.0));
}

#[test]
fn unwraps_single_level_value_object() {
    let response = json!({"final_price": {"value": "2,100", "currency": "USD"}});
    assert_eq!(extract(&response), Some(2100.0));
}

#[test]
fn does_not_unwrap_two_levels() {
    let response = json!({
        "final_price": {"value": {"value": 700}},
        "amount": 650
    });
    assert_eq!(extract(&response), Some(650.0));
}

#[test]
fn object_without_value_key_is_skipped() {
    let response = json!({"final_price": {"amount": 700}, "price": 640});
    assert_eq!(extract(&response), Some(640.0));
}

#[test]
fn negative_string_is_rejected() {
    let response = json!({"price": "-$40", "amount": 35});
    assert_eq!(extract(&response), Some(35.0));
}

#[test]
fn malformed_number_string_is_rejected() {
    let response = json!({"price": "1.2.3", "amount": "7"});
    assert_eq!(extract(&response), Some(7.0));
}

// -----------------------------------------------------------------------
// not found
// -----------------------------------------------------------------------

#[test]
fn not_found_when_all_candidates_unusable() {
    let response = json!({
        "final_price": null,
        "price": -1,
        "total_price": "n/a",
        "calculated_price": true,
        "amount": [100],
        "cost": ""
    });
    assert_eq!(extract(&response), None);
}

#[test]
fn not_found_for_empty_object() {
    assert_eq!(extract(&json!({})), None);
}

#[test]
fn not_found_for_non_object_response() {
    assert_eq!(extract(&json!(1200)), None);
    assert_eq!(extract(&json!("1200")), None);
    assert_eq!(extract(&json!([{"price": 1}])), None);
    assert_eq!(extract(&Value::Null), None);
}

#[test]
fn nested_null_value_is_skipped() {
    let response = json!({"final_price": {"value": null}, "price": 15});
    assert_eq!(extract(&response), Some(15.0));
}

// -----------------------------------------------------------------------
// sanitize_numeric
// -----------------------------------------------------------------------

#[test]
fn sanitize_keeps_leading_minus_only() {
    assert_eq!(sanitize_numeric("-$12.50"), "-12.50");
    assert_eq!(sanitize_numeric("12-50"), "1250");
    assert_eq!(sanitize_numeric("--5"), "-5");
}

#[test]
fn sanitize_drops_letters_and_separators() {
    assert_eq!(sanitize_numeric("USD 1,234.00"), "1234.00");
    assert_eq!(sanitize_numeric("abc"), "");
}
