// Responsibility chain behaviour through the public API
use serial_test::serial;
use std::sync::{Arc, Mutex};
use trackable::{
    configure, properties, sink, ChainLink, ChainMember, Dictionary, Key, ParentLink, Payload,
    PropertySet, ResponsibilityChain, Trackable, TrackableExt, TrackingConfig,
};

trackable::events! {
    enum TestEvents {
        Test,
    }
}

mod test_keys {
    trackable::keys! {
        pub enum Tests {
            Bool = "bool",
            String = "string",
            Level = "level",
            Depth = "depth",
        }
    }
}

use test_keys::Tests;

type Received = Arc<Mutex<Vec<(String, Dictionary)>>>;

fn capture() -> Received {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let sink_received = Arc::clone(&received);
    sink::set_sink(move |name: &str, properties: &Dictionary| {
        sink_received
            .lock()
            .unwrap()
            .push((name.to_string(), properties.clone()));
    });
    received
}

fn finish() {
    ResponsibilityChain::global().cleanup();
    sink::reset_sink();
}

struct A;
impl Trackable for A {}

struct B;
impl Trackable for B {}

struct C;
impl Trackable for C {
    fn class_properties() -> Option<PropertySet> {
        Some(properties![Tests::Level => "class-c", Tests::Depth => 0])
    }
}

#[test]
#[serial]
fn test_event_name_is_rendered_path() {
    let received = capture();

    ChainLink::tracker(properties![Tests::Bool => true], || Some(properties![Tests::Bool => false]))
        .track(&TestEvents::Test, PropertySet::new());

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, "TestEvents.Test");
    assert_eq!(received[0].1["test_keys.Tests.bool"], Payload::Boolean(true));
    drop(received);
    finish();
}

#[test]
#[serial]
fn test_chainer_forwards_merged_state() {
    let received = capture();

    let parent = Arc::new(ChainLink::tracker(PropertySet::new(), || None));
    let link = ChainLink::chainer(
        properties![Tests::String => "Hello"],
        || None,
        Some(ParentLink::link(&parent)),
    );
    link.track(&TestEvents::Test, PropertySet::new());

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].1[&Tests::String.description()], Payload::Text("Hello".into()));
    drop(received);
    finish();
}

#[test]
#[serial]
fn test_should_delete_chain_links_for_released_objects() {
    let table = ResponsibilityChain::global();

    let (identifier_a, identifier_b, identifier_c) = {
        let class_a = Arc::new(A);
        let class_b = Arc::new(B);
        let class_c = Arc::new(C);

        class_a.setup_tracking_chain(PropertySet::new(), Some(&class_c));
        class_b.setup_tracking_chain(PropertySet::new(), Some(&class_a));

        let identifiers = (
            class_a.chain_identity(),
            class_b.chain_identity(),
            class_c.chain_identity(),
        );

        assert!(table.lookup(identifiers.0).is_some());
        assert!(table.lookup(identifiers.1).is_some());
        assert!(table.lookup(identifiers.2).is_some());
        identifiers
    };

    assert!(table.cleanup() >= 3);
    assert!(table.lookup(identifier_a).is_none());
    assert!(table.lookup(identifier_b).is_none());
    assert!(table.lookup(identifier_c).is_none());
    finish();
}

#[test]
#[serial]
fn test_cleanup_keeps_live_members() {
    let table = ResponsibilityChain::global();
    let root = Arc::new(C);
    let child = Arc::new(A);
    child.setup_tracking_chain(PropertySet::new(), Some(&root));

    {
        let transient = Arc::new(B);
        transient.setup_tracking_chain(PropertySet::new(), Some(&child));
    }

    table.cleanup();
    assert!(table.lookup(root.chain_identity()).is_some());
    assert!(table.lookup(child.chain_identity()).is_some());

    drop(child);
    drop(root);
    finish();
}

#[test]
#[serial]
fn test_three_level_member_chain_precedence() {
    let received = capture();

    let grandparent = Arc::new(C);
    let parent = Arc::new(B);
    let child = Arc::new(A);

    grandparent.setup_tracking_chain(
        properties![Tests::Level => "grandparent", Tests::String => "grandparent", Tests::Bool => false],
        None,
    );
    parent.setup_tracking_chain(
        properties![Tests::Level => "parent", Tests::String => "parent"],
        Some(&grandparent),
    );
    child.setup_tracking_chain(properties![Tests::Level => "child"], Some(&parent));

    child.track(&TestEvents::Test, properties![Tests::Bool => true]);

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let properties = &received[0].1;
    assert_eq!(properties[&Tests::Level.description()], Payload::Text("child".into()));
    assert_eq!(properties[&Tests::String.description()], Payload::Text("parent".into()));
    assert_eq!(properties[&Tests::Bool.description()], Payload::Boolean(true));
    // Only the grandparent's class provides it
    assert_eq!(properties[&Tests::Depth.description()], Payload::Integer(0));
    drop(received);

    drop(child);
    drop(parent);
    drop(grandparent);
    finish();
}

#[test]
#[serial]
fn test_member_cycle_emits_once() {
    let received = capture();

    let a = Arc::new(A);
    let b = Arc::new(B);
    a.setup_tracking_chain(properties![Tests::String => "a"], Some(&b));
    b.setup_tracking_chain(properties![Tests::String => "b", Tests::Bool => true], Some(&a));

    a.track(&TestEvents::Test, PropertySet::new());

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].1[&Tests::String.description()], Payload::Text("a".into()));
    assert_eq!(received[0].1[&Tests::Bool.description()], Payload::Boolean(true));
    drop(received);

    drop(a);
    drop(b);
    finish();
}

#[test]
#[serial]
fn test_prefix_removal_on_emission() {
    let received = capture();
    configure(
        TrackingConfig::new()
            .with_event_prefix_to_remove("TestEvents.")
            .with_key_prefix_to_remove("test_keys.Tests."),
    );

    let nested = properties![Tests::Depth => 3];
    ChainLink::tracker(properties![Tests::Bool => true, Tests::Level => nested], || None)
        .track(&TestEvents::Test, PropertySet::new());
    configure(TrackingConfig::default());

    let received = received.lock().unwrap();
    assert_eq!(received[0].0, "Test");
    assert_eq!(received[0].1["bool"], Payload::Boolean(true));
    assert_eq!(received[0].1["level.depth"], Payload::Integer(3));
    drop(received);
    finish();
}
