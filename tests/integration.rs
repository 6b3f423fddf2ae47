//! Integration tests for the Chrome transport
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test --test integration -- --ignored

use flight_search::ChromeTransport;
use step_runner::{Session, SessionConfig, Transport};

async fn open_page(html: &str) -> Option<Session<ChromeTransport>> {
    let config = SessionConfig {
        headless: true,
        ..Default::default()
    };
    let session = match Session::<ChromeTransport>::open(config).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Chrome not available, skipping test: {}", e);
            return None;
        }
    };
    session
        .transport()
        .navigate(&format!("data:text/html,{}", html))
        .await
        .expect("Failed to navigate");
    Some(session)
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_css_and_xpath_lookup() {
    let Some(session) = open_page(
        r#"<ul><li>Delhi (DEL)</li><li>Mumbai (BOM)</li></ul>
        <button><span>Search Flights</span></button>"#,
    )
    .await
    else {
        return;
    };
    let page = session.transport();

    assert_eq!(page.find_all("li").await.unwrap().len(), 2);

    let option = page
        .find_element(&flight_search::locators::airport_option("BOM", "Mumbai"))
        .await
        .unwrap();
    assert!(option.is_some());

    let button = page
        .find_element(flight_search::locators::SEARCH_BUTTON)
        .await
        .unwrap();
    assert!(button.is_some());

    assert!(page.find_element("//table").await.unwrap().is_none());

    session.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_clear_and_type() {
    let Some(session) = open_page(r#"<input type="text" value="old">"#).await else {
        return;
    };
    let page = session.transport();

    let input = page
        .find_element("input")
        .await
        .unwrap()
        .expect("input not found");
    page.clear(&input).await.expect("Failed to clear");
    page.type_text(&input, "Mumbai").await.expect("Failed to type");

    assert!(page
        .find_element("//input[@type='text']")
        .await
        .unwrap()
        .is_some());

    let png = page.capture_visual().await.expect("Failed to capture");
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

    session.close().await.expect("Failed to close browser");
}
