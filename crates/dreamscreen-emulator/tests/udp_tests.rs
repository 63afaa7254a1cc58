//! UDP endpoint tests
//!
//! Runs a real emulator on a loopback socket and talks to it as a
//! controller would.

use dreamscreen_core::{Command, Packet, PacketFlags, Rgb};
use dreamscreen_emulator::{
    EmulatorConfig, EmulatorError, NullOutput, SideKickEmulator, UdpConfig, UdpEndpoint,
};
use dreamscreen_test_utils::{request, subscribe, write, RecordingOutput};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

fn loopback_config() -> UdpConfig {
    UdpConfig {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        broadcast: false,
        ..Default::default()
    }
}

struct Running {
    addr: SocketAddr,
    output: RecordingOutput,
    shutdown: mpsc::Sender<()>,
    task: JoinHandle<SideKickEmulator>,
}

async fn start(config: EmulatorConfig) -> Running {
    let endpoint = UdpEndpoint::bind(loopback_config())
        .await
        .expect("bind should succeed");
    let addr = endpoint.local_addr().unwrap();
    let output = RecordingOutput::new();
    let mut emulator =
        SideKickEmulator::new(config, endpoint.sender()).with_output(output.clone());

    let (shutdown, mut shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(async move {
        endpoint
            .run(&mut emulator, &mut shutdown_rx)
            .await
            .expect("run should succeed");
        emulator
    });

    Running {
        addr,
        output,
        shutdown,
        task,
    }
}

async fn recv_packet(socket: &UdpSocket) -> Packet {
    let mut buf = [0u8; 512];
    let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
        .await
        .expect("reply should arrive")
        .expect("recv should succeed");
    Packet::decode(&buf[..len]).expect("reply should decode")
}

#[tokio::test]
async fn test_bind_ephemeral() {
    let endpoint = UdpEndpoint::bind(loopback_config()).await.unwrap();
    assert!(endpoint.local_addr().unwrap().port() > 0);
}

#[tokio::test]
async fn test_ping_over_udp() {
    let running = start(EmulatorConfig::default()).await;
    let controller = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let data = request(Command::Ping).encode().unwrap();
    controller.send_to(&data, running.addr).await.unwrap();

    let reply = recv_packet(&controller).await;
    assert_eq!(reply.command, Command::Ping);
    assert_eq!(reply.flags, PacketFlags::RESPONSE);

    running.shutdown.send(()).await.unwrap();
    running.task.await.unwrap();
}

#[tokio::test]
async fn test_subscribe_and_state_over_udp() {
    let running = start(EmulatorConfig::new("Udp Test")).await;
    let controller = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let controller_addr = controller.local_addr().unwrap();

    controller
        .send_to(&subscribe().encode().unwrap(), running.addr)
        .await
        .unwrap();
    let ack = recv_packet(&controller).await;
    assert_eq!(ack.command, Command::SubscribeToSectorData);
    assert_eq!(&ack.payload[..], &[1]);

    controller
        .send_to(&request(Command::CurrentState).encode().unwrap(), running.addr)
        .await
        .unwrap();
    let state = recv_packet(&controller).await;
    assert_eq!(state.command, Command::CurrentState);
    assert_eq!(&state.payload[..8], b"Udp Test");

    running.shutdown.send(()).await.unwrap();
    let emulator = running.task.await.unwrap();
    assert!(emulator.is_subscribed());
    assert_eq!(emulator.host_address(), Some(controller_addr));
}

#[tokio::test]
async fn test_garbage_is_ignored() {
    let running = start(EmulatorConfig::default()).await;
    let controller = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    controller.send_to(b"not a packet", running.addr).await.unwrap();
    controller
        .send_to(&write(Command::AmbientColor, &[10, 20, 30]).encode().unwrap(), running.addr)
        .await
        .unwrap();

    // A reply proves the earlier datagrams were processed in order
    controller
        .send_to(&request(Command::Ping).encode().unwrap(), running.addr)
        .await
        .unwrap();
    recv_packet(&controller).await;

    running.shutdown.send(()).await.unwrap();
    let emulator = running.task.await.unwrap();
    assert_eq!(emulator.state().ambient_color, Rgb::new(10, 20, 30));
}

#[tokio::test]
async fn test_tick_renders_output() {
    let config = EmulatorConfig {
        ambient_color: Rgb::new(5, 6, 7),
        ..EmulatorConfig::default().with_tick_interval(Duration::from_millis(10))
    };
    let running = start(config).await;

    let output = running.output.clone();
    let rendered = timeout(Duration::from_secs(2), async move {
        while output.shown().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(rendered.is_ok(), "tick should render the ambient color");
    assert_eq!(running.output.shown(), Some(Rgb::new(5, 6, 7)));

    running.shutdown.send(()).await.unwrap();
    running.task.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_when_sender_dropped() {
    let running = start(EmulatorConfig::default()).await;
    drop(running.shutdown);

    let result = timeout(Duration::from_secs(2), running.task).await;
    assert!(result.is_ok(), "run should stop once shutdown sender is gone");
}

#[tokio::test]
async fn test_zero_tick_interval_is_rejected() {
    let endpoint = UdpEndpoint::bind(loopback_config()).await.unwrap();
    let config = EmulatorConfig::default().with_tick_interval(Duration::ZERO);
    let mut emulator = SideKickEmulator::new(config, endpoint.sender()).with_output(NullOutput);
    let (_shutdown, mut shutdown_rx) = mpsc::channel(1);

    let result = timeout(
        Duration::from_secs(2),
        endpoint.run(&mut emulator, &mut shutdown_rx),
    )
    .await
    .expect("run should return instead of looping");

    assert!(matches!(result, Err(EmulatorError::Config(_))));
}
