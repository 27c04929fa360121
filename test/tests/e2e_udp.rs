//! Publisher & subscriber talking over real loopback UDP sockets

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use scenecast_client::{transport::udp::Socket as SubscriberSocket, Subscriber, SubscriberConfig};
use scenecast_server::{
    transport::udp::{PublisherAddrs, Socket as PublisherSocket},
    Publisher, PublisherConfig,
};
use scenecast_test::{
    kinds, protocol, scene_signature, wait_until, Material, SampleScene, SceneRoot, TestScene,
};

const READ_TIMEOUT: Duration = Duration::from_millis(20);

#[test]
fn loopback_subscriber_mirrors_and_follows_changes() {
    env_logger::builder().is_test(true).try_init().ok();

    let publisher_socket = PublisherSocket::bind(&PublisherAddrs::loopback(), READ_TIMEOUT).unwrap();
    let control_addr = publisher_socket.control_addr().unwrap();
    assert_ne!(control_addr.port(), 0);

    let mut sample = SampleScene::build();
    let mut publisher = Publisher::new(
        PublisherConfig {
            event_queue_timeout: Duration::from_millis(50),
            ..Default::default()
        },
        protocol(),
    );
    publisher.listen(publisher_socket).unwrap();
    publisher.register(&mut sample.scene).unwrap();
    publisher.start_publishing().unwrap();

    let subscriber_socket = SubscriberSocket::bind(
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
        control_addr,
        READ_TIMEOUT,
    )
    .unwrap();
    let mut subscriber = Subscriber::new(
        SubscriberConfig {
            initialization_delay: Some(Duration::from_millis(100)),
            ..Default::default()
        },
        protocol(),
    );
    subscriber.connect(subscriber_socket).unwrap();
    let mut mirror = TestScene::new(SceneRoot::new(""));

    let kinds = kinds();
    let expected = scene_signature(&sample.scene, &kinds);
    assert!(wait_until(Duration::from_secs(5), || {
        subscriber.network_update(&mut mirror);
        scene_signature(&mirror, &kinds) == expected
    }));

    sample
        .scene
        .get_mut::<Material>(sample.material)
        .unwrap()
        .paint(0x0f0f0f);
    publisher.scan_for_changes(&mut sample.scene).unwrap();

    let expected = scene_signature(&sample.scene, &kinds);
    assert!(wait_until(Duration::from_secs(5), || {
        subscriber.network_update(&mut mirror);
        scene_signature(&mirror, &kinds) == expected
    }));

    subscriber.close();
    publisher.close();
    assert!(!publisher.is_listening());
}

#[test]
fn publisher_addresses_fall_back_to_a_free_port() {
    let first = PublisherSocket::bind(&PublisherAddrs::loopback(), READ_TIMEOUT).unwrap();
    let taken = first.control_addr().unwrap();
    let publish = first.publish_addr().unwrap();

    let addrs = PublisherAddrs::new(
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
        taken,
    );
    let second = PublisherSocket::bind(&addrs, READ_TIMEOUT).unwrap();

    assert_ne!(second.control_addr().unwrap(), taken);
    assert_ne!(second.publish_addr().unwrap(), publish);
}
