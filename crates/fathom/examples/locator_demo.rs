//! Locator demo: builds path expressions and drives a small login form
//! on the in-memory backend.
//!
//! Run with: `cargo run --example locator_demo`
//! Set `FATHOM_LOG=fathom=debug` to watch retries.

use std::sync::Arc;
use std::time::Duration;

use fathom::logging;
use fathom::mock::{MockBackend, MockElement, Scope};
use fathom::prelude::*;

fn main() -> FathomResult<()> {
    logging::init();

    println!("=== Path expressions ===\n");
    let submit = XPath::at("form")
        .id("login")
        .select("button")
        .attribute("type")
        .be("submit");
    let row = XPath::at("tr").encloses("td").text().be("Total").select_nth("td", -1);
    let label = XPath::at("label").text().be("Password").following("input");
    for (name, xpath) in [("submit", &submit), ("total cell", &row), ("password", &label)] {
        println!("  {name:<12} {xpath}");
    }

    println!("\n=== Login form ===\n");
    let backend = Arc::new(MockBackend::new());
    backend.add_element("form", MockElement::new("form"));
    backend.add_element("user", MockElement::new("input"));
    backend.add_element("submit", MockElement::new("button").with_text("Sign in"));
    backend.add_element("banner", MockElement::new("div").with_text("Welcome, ada"));
    backend.respond(Scope::Document, SelectorKind::Id, "login", &["form"]);
    backend.respond(Scope::Context("form".into()), SelectorKind::Name, "user", &["user"]);
    backend.respond(Scope::Document, SelectorKind::XPath, &submit.to_string(), &["submit"]);
    // The banner shows up only on the second poll.
    backend.respond(Scope::Document, SelectorKind::Css, ".banner", &[]);
    backend.respond(Scope::Document, SelectorKind::Css, ".banner", &["banner"]);

    let session = Session::builder(backend.clone())
        .settings(Settings::default())
        .build();
    let form = session.find_named(Locator::id("login"), "LoginForm");
    let user = form.find_named(Locator::name("user"), "Username");
    let button = session.find_named(&submit, "Submit");
    let banner = session.find(".banner");

    retry::with_config(RetryConfig::new(3, Duration::from_millis(50)), || {
        user.type_text("ada")?;
        button.click()?;
        banner.expect().text().starts_with("Welcome").be(true)
    })?;
    println!("  logged in: {}", banner.expect().text().actual()?);

    println!("\n=== Failure report ===\n");
    let missing = form.find_named("a.forgot", "Forgot password link");
    if let Err(err) = retry::with_config(RetryConfig::new(1, Duration::from_millis(10)), || {
        missing.click().map(|_| ())
    }) {
        println!("  {err}");
    }

    println!("\n=== Backend calls ===\n");
    for call in backend.history() {
        println!("  {call}");
    }

    Ok(())
}
