//! Locators for the Goibibo flight search page.
//!
//! Strings starting with `/` or `(` are XPath, everything else is CSS.

pub const SEARCH_URL: &str = "https://www.goibibo.com/flights/";

pub const LOGIN_POPUP_CLOSE: &str = "span.logSprite.icClose";

pub const ORIGIN_INPUT: &str = "input[placeholder='From']";

pub const DESTINATION_INPUT: &str = "input[placeholder='To']";

/// The text box that opens once a city field is clicked.
pub const EDITABLE_TEXT_BOX: &str = "//input[@type='text' and not(@readonly)]";

pub const DEPARTURE_INPUT: &str = "input[placeholder='Departure']";

pub const SEARCH_BUTTON: &str = "//span[text()='Search Flights']/ancestor::button";

/// One card per flight on the results page.
pub const RESULT_CARD: &str = "div.fltResultWrapper";

/// First dropdown entry mentioning the airport code or the city.
pub fn airport_option(code: &str, city: &str) -> String {
    format!(
        "//li[contains(., {}) or contains(., {})][1]",
        xpath_literal(code),
        xpath_literal(city)
    )
}

/// Calendar cell whose accessible label is exactly `label`.
pub fn day_cell(label: &str) -> String {
    format!("//div[@aria-label={}]", xpath_literal(label))
}

/// Whether a locator is XPath rather than CSS.
pub fn is_xpath(locator: &str) -> bool {
    locator.starts_with('/') || locator.starts_with('(')
}

/// Quote `value` as an XPath 1.0 string literal. XPath has no escapes, so a
/// value holding both quote kinds is split and joined with `concat()`.
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
