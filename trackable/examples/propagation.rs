//! Property propagation walkthrough
//!
//! Builds a small object tree (app -> screen -> button), tracks an event from
//! the leaf, and prints what the sink receives at each step. Then drops the
//! screen to show how the chain degrades and how cleanup sweeps the table.
//!
//! Usage:
//!   RUST_LOG=trace cargo run --example propagation

use std::sync::Arc;
use trackable::{
    properties, sink, ChainMember, Dictionary, PropertySet, ResponsibilityChain, Trackable,
    TrackableExt, TrackingConfig,
};

mod app {
    trackable::keys! {
        pub enum Keys {
            Version = "version",
            Screen = "screen",
            Button = "button",
            Session = "session",
        }
    }

    trackable::events! {
        pub enum Events {
            Tapped = "tapped",
        }
    }
}

use app::{Events, Keys};

struct Application;
impl Trackable for Application {
    fn class_properties() -> Option<PropertySet> {
        Some(properties![Keys::Version => env!("CARGO_PKG_VERSION")])
    }
}

struct Screen;
impl Trackable for Screen {}

struct Button;
impl Trackable for Button {}

fn print_event(name: &str, properties: &Dictionary) {
    println!("event: {}", name);
    for (key, value) in properties {
        println!("  {} = {}", key, value);
    }
}

fn main() {
    env_logger::init();

    sink::set_sink(print_event);
    trackable::configure(TrackingConfig::new().with_key_prefix_to_remove("app.Keys."));

    let application = Arc::new(Application);
    let screen = Arc::new(Screen);
    let button = Arc::new(Button);

    application.setup_tracking_chain(properties![Keys::Session => 7], None);
    screen.setup_tracking_chain(properties![Keys::Screen => "home"], Some(&application));
    button.setup_tracking_chain(properties![Keys::Button => "ok"], Some(&screen));

    println!("--- full chain");
    button.track(&Events::Tapped, PropertySet::new());

    println!("--- call-site override");
    button.track(&Events::Tapped, properties![Keys::Screen => "settings"]);

    println!("--- screen dropped");
    drop(screen);
    button.track(&Events::Tapped, PropertySet::new());

    let table = ResponsibilityChain::global();
    println!("table entries before cleanup: {}", table.len());
    let evicted = table.cleanup();
    println!("evicted {} entr(ies), {} left", evicted, table.len());
    println!(
        "button still registered: {}",
        table.lookup(button.chain_identity()).is_some()
    );
}
