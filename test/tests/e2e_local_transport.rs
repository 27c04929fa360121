//! Publisher & subscribers running their background loops over the
//! in-memory broadcast transport

use std::time::{Duration, Instant};

use scenecast_client::{Subscriber, SubscriberConfig, SubscriberError};
use scenecast_server::{Publisher, PublisherConfig};
use scenecast_shared::{LinkConditionerConfig, Protocol, SceneMut, SceneRef};
use scenecast_test::{
    conditioned_protocol, kinds, protocol, scene_signature, wait_until, LocalHub, Material,
    SampleScene, SceneRoot, Spatial, TestHandle, TestScene,
};

const CONVERGENCE_TIMEOUT: Duration = Duration::from_secs(5);

fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

fn publisher_config() -> PublisherConfig {
    PublisherConfig {
        event_queue_timeout: Duration::from_millis(50),
        ..Default::default()
    }
}

fn subscriber_config() -> SubscriberConfig {
    SubscriberConfig {
        initialization_delay: Some(Duration::from_millis(50)),
        shutdown_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

/// A publishing publisher and the hub subscribers attach to
fn publishing(sample: &mut SampleScene) -> (Publisher<TestHandle>, LocalHub) {
    let (socket, hub) = LocalHub::open();
    let mut publisher = Publisher::new(publisher_config(), protocol());
    publisher.listen(socket).unwrap();
    publisher.register(&mut sample.scene).unwrap();
    publisher.start_publishing().unwrap();
    (publisher, hub)
}

struct Mirror {
    subscriber: Subscriber<TestHandle>,
    scene: TestScene,
}

impl Mirror {
    fn connect(hub: &LocalHub, protocol: Protocol) -> Self {
        let mut subscriber = Subscriber::new(subscriber_config(), protocol);
        subscriber.connect(hub.subscriber_socket()).unwrap();
        Self {
            subscriber,
            scene: TestScene::new(SceneRoot::new("")),
        }
    }

    /// Apply inbound events until the mirror matches `published`
    fn converge_on(&mut self, published: &TestScene) -> bool {
        let kinds = kinds();
        let expected = scene_signature(published, &kinds);
        wait_until(CONVERGENCE_TIMEOUT, || {
            self.subscriber.network_update(&mut self.scene);
            scene_signature(&self.scene, &kinds) == expected
        })
    }

    fn handle_of(&self, publisher: &Publisher<TestHandle>, handle: TestHandle) -> Option<TestHandle> {
        publisher
            .network_id(&handle)
            .and_then(|network_id| self.subscriber.handle(&network_id))
    }
}

#[test]
fn late_joiner_is_initialized_by_a_resync() {
    init_logging();
    let mut sample = SampleScene::build();
    let (mut publisher, hub) = publishing(&mut sample);
    // the initial broadcast goes out before anyone listens
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(hub.subscriber_count(), 0);

    let mut mirror = Mirror::connect(&hub, protocol());
    assert!(mirror.converge_on(&sample.scene));
    assert_eq!(mirror.subscriber.waiting_count(), 0);

    mirror.subscriber.close();
    publisher.close();
}

#[test]
fn changes_propagate_to_every_subscriber() {
    init_logging();
    let mut sample = SampleScene::build();
    let (mut publisher, hub) = publishing(&mut sample);
    let mut first = Mirror::connect(&hub, protocol());
    let mut second = Mirror::connect(&hub, protocol());
    assert_eq!(hub.subscriber_count(), 2);
    assert!(first.converge_on(&sample.scene));
    assert!(second.converge_on(&sample.scene));

    sample
        .scene
        .get_mut::<Spatial>(sample.player)
        .unwrap()
        .move_to([7, 0, 7]);
    sample
        .scene
        .get_mut::<Material>(sample.material)
        .unwrap()
        .paint(0x123456);
    sample.scene.reparent(sample.weapon, sample.camera);
    let lamp = sample
        .scene
        .spawn_child(sample.world, Spatial::new("lamp", [0, 3, 0]));
    sample.scene.despawn_object(&sample.texture);
    publisher.scan_for_changes(&mut sample.scene).unwrap();

    assert!(first.converge_on(&sample.scene));
    assert!(second.converge_on(&sample.scene));
    let mirrored_lamp = first.handle_of(&publisher, lamp).unwrap();
    assert_eq!(
        first.scene.get::<Spatial>(mirrored_lamp).unwrap().position,
        [0, 3, 0]
    );
}

#[test]
fn relation_requests_are_rebroadcast() {
    init_logging();
    let mut sample = SampleScene::build();
    let (mut publisher, hub) = publishing(&mut sample);
    let mut mirror = Mirror::connect(&hub, protocol());
    assert!(mirror.converge_on(&sample.scene));

    let weapon = publisher.network_id(&sample.weapon).unwrap();
    let camera = publisher.network_id(&sample.camera).unwrap();
    let material = publisher.network_id(&sample.material).unwrap();
    mirror.subscriber.send_relation(Some(camera), weapon).unwrap();
    mirror.subscriber.send_remove_relation(camera, material).unwrap();

    let mirrored_weapon = mirror.handle_of(&publisher, sample.weapon).unwrap();
    let mirrored_camera = mirror.handle_of(&publisher, sample.camera).unwrap();
    let mirrored_material = mirror.handle_of(&publisher, sample.material).unwrap();
    let mirrored_player = mirror.handle_of(&publisher, sample.player).unwrap();
    assert!(wait_until(CONVERGENCE_TIMEOUT, || {
        mirror.subscriber.network_update(&mut mirror.scene);
        mirror.scene.parent(&mirrored_weapon) == Some(mirrored_camera)
            && mirror.scene.owners(mirrored_material) == vec![mirrored_player]
    }));

    // the publisher's own scene is left alone
    assert_eq!(sample.scene.parent(&sample.weapon), Some(sample.player));
    publisher.close();
}

#[test]
fn control_requests_need_a_connection() {
    let mut subscriber: Subscriber<TestHandle> = Subscriber::new(subscriber_config(), protocol());
    assert!(!subscriber.is_connected());
    assert!(matches!(
        subscriber.request_initialization(),
        Err(SubscriberError::NotConnected)
    ));

    let (_socket, hub) = LocalHub::open();
    subscriber.connect(hub.subscriber_socket()).unwrap();
    assert!(matches!(
        subscriber.connect(hub.subscriber_socket()),
        Err(SubscriberError::AlreadyConnected)
    ));
    subscriber.close();
    assert!(!subscriber.is_connected());
}

#[test]
fn reordered_delivery_converges() {
    init_logging();
    let mut sample = SampleScene::build();
    let (mut publisher, hub) = publishing(&mut sample);
    let mut mirror = Mirror::connect(
        &hub,
        conditioned_protocol(LinkConditionerConfig::shuffled_condition()),
    );

    for step in 0..5 {
        sample
            .scene
            .get_mut::<Spatial>(sample.camera)
            .unwrap()
            .move_to([step, 5, -10]);
        publisher.scan_for_changes(&mut sample.scene).unwrap();
    }
    sample.scene.reparent(sample.weapon, sample.camera);
    publisher.scan_for_changes(&mut sample.scene).unwrap();

    assert!(mirror.converge_on(&sample.scene));
    let mirrored_camera = mirror.handle_of(&publisher, sample.camera).unwrap();
    assert_eq!(
        mirror.scene.get::<Spatial>(mirrored_camera).unwrap().position,
        [4, 5, -10]
    );
}

#[test]
fn lossy_delivery_converges_with_periodic_resyncs() {
    init_logging();
    let mut sample = SampleScene::build();
    let (mut publisher, hub) = publishing(&mut sample);
    let mut mirror = Mirror::connect(
        &hub,
        conditioned_protocol(LinkConditionerConfig::new(0, 10, 0.3)),
    );

    sample
        .scene
        .get_mut::<Material>(sample.material)
        .unwrap()
        .paint(0xabcdef);
    publisher.scan_for_changes(&mut sample.scene).unwrap();

    let kinds = kinds();
    let expected = scene_signature(&sample.scene, &kinds);
    let mut last_request = Instant::now();
    let converged = wait_until(Duration::from_secs(10), || {
        mirror.subscriber.network_update(&mut mirror.scene);
        if scene_signature(&mirror.scene, &kinds) == expected {
            return true;
        }
        if last_request.elapsed() > Duration::from_millis(100) {
            mirror.subscriber.request_initialization().ok();
            last_request = Instant::now();
        }
        false
    });
    assert!(converged);
}

#[test]
fn publishing_can_pause_and_resume() {
    init_logging();
    let mut sample = SampleScene::build();
    let (mut publisher, hub) = publishing(&mut sample);
    let mut mirror = Mirror::connect(&hub, protocol());
    assert!(mirror.converge_on(&sample.scene));

    publisher.stop_publishing();
    assert!(!publisher.is_publishing());
    sample
        .scene
        .get_mut::<Spatial>(sample.weapon)
        .unwrap()
        .move_to([2, 2, 2]);
    publisher.scan_for_changes(&mut sample.scene).unwrap();

    // queued while paused, sent once publishing resumes
    publisher.start_publishing().unwrap();
    assert!(mirror.converge_on(&sample.scene));
    publisher.close();
}

#[test]
fn event_budget_limits_one_network_update() {
    init_logging();
    let mut sample = SampleScene::build();
    let (socket, hub) = LocalHub::open();
    let mut publisher = Publisher::new(publisher_config(), protocol());
    publisher.listen(socket).unwrap();

    let mut subscriber = Subscriber::new(
        SubscriberConfig {
            initialization_delay: None,
            max_events_per_update: Some(1),
            ..subscriber_config()
        },
        protocol(),
    );
    subscriber.connect(hub.subscriber_socket()).unwrap();
    let mut scene = TestScene::new(SceneRoot::new(""));

    publisher.register(&mut sample.scene).unwrap();
    publisher.start_publishing().unwrap();

    // root first, one event per call
    assert!(wait_until(CONVERGENCE_TIMEOUT, || {
        subscriber.network_update(&mut scene);
        subscriber.known_count() > 0
    }));
    assert_eq!(subscriber.known_count(), 1);

    let kinds = kinds();
    let expected = scene_signature(&sample.scene, &kinds);
    assert!(wait_until(CONVERGENCE_TIMEOUT, || {
        subscriber.network_update(&mut scene);
        scene_signature(&scene, &kinds) == expected
    }));
}

#[test]
fn malformed_frames_are_skipped_on_both_sides() {
    init_logging();
    let mut sample = SampleScene::build();
    let (mut publisher, hub) = publishing(&mut sample);
    let mut mirror = Mirror::connect(&hub, protocol());

    hub.inject_broadcast(&[]);
    hub.inject_broadcast(&[0xff, 0xee, 0xdd, 0xcc]);
    hub.inject_control(&[0x42; 9]);

    assert!(mirror.converge_on(&sample.scene));

    // both loops are still serving
    sample
        .scene
        .get_mut::<Spatial>(sample.camera)
        .unwrap()
        .move_to([1, 2, 3]);
    publisher.scan_for_changes(&mut sample.scene).unwrap();
    assert!(mirror.converge_on(&sample.scene));
    mirror.subscriber.request_initialization().unwrap();
    publisher.close();
}
