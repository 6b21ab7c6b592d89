//! Discovery and control against fake bulbs on the loopback interface.

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, UdpSocket};
use yeelight_lan::{
    CommandChannel, Discovery, DiscoveryConfig, Light, Transition, YeelightClient, YeelightError,
};

fn advertisement(location: &str, id: &str, bright: Option<u8>) -> String {
    let mut reply = format!(
        "HTTP/1.1 200 OK\r\n\
         Cache-Control: max-age=3600\r\n\
         Location: yeelight://{location}\r\n\
         id: {id}\r\n\
         model: color\r\n\
         fw_ver: 18\r\n\
         support: get_prop set_power toggle set_bright set_rgb set_ct_abx\r\n\
         power: off\r\n\
         color_mode: 1\r\n\
         ct: 2700\r\n\
         rgb: 255\r\n\
         hue: 10\r\n\
         sat: 20\r\n\
         name: {id}_name\r\n"
    );
    if let Some(bright) = bright {
        reply.push_str(&format!("bright: {bright}\r\n"));
    }
    reply.push_str("\r\n");
    reply
}

/// Two fake bulbs: the first answers the search three times, the second once.
/// Returns the address the search must be sent to.
async fn fake_network(first_location: String) -> SocketAddr {
    let first = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let second = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let target = first.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        let (len, searcher) = first.recv_from(&mut buf).await.unwrap();
        let search = String::from_utf8_lossy(&buf[..len]).to_string();
        assert!(search.starts_with("M-SEARCH * HTTP/1.1\r\n"));
        assert!(search.contains("ST: wifi_bulb"));

        let full = advertisement(&first_location, "bulb_a", Some(80));
        for _ in 0..3 {
            first.send_to(full.as_bytes(), searcher).await.unwrap();
        }
        let partial = advertisement("127.0.0.1:1", "bulb_b", None);
        second.send_to(partial.as_bytes(), searcher).await.unwrap();
    });

    target
}

/// Fake control socket answering every request line on every connection
async fn fake_control(
    state: &'static [&'static str; 7],
) -> (String, tokio::sync::mpsc::UnboundedReceiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            let (read, mut write) = stream.into_split();
            let mut line = String::new();
            if BufReader::new(read).read_line(&mut line).await.unwrap_or(0) == 0 {
                continue;
            }
            let request: Value = serde_json::from_str(&line).unwrap();
            let reply = if request["method"] == json!("get_prop") {
                json!({ "id": request["id"], "result": state })
            } else {
                json!({ "id": request["id"], "result": ["ok"] })
            };
            write
                .write_all(format!("{reply}\r\n").as_bytes())
                .await
                .unwrap();
            let _ = tx.send(request);
        }
    });

    (address, rx)
}

fn discovery(target: SocketAddr) -> Discovery {
    Discovery::with_config(
        DiscoveryConfig::default()
            .with_target(target)
            .with_bind("127.0.0.1:0".parse().unwrap())
            .with_timeout(Duration::from_millis(500)),
    )
}

fn by_id<'a>(lights: &'a [Light], id: &str) -> &'a Light {
    lights.iter().find(|l| l.id == id).expect("light present")
}

#[tokio::test]
async fn discovery_dedups_and_tolerates_missing_headers() {
    let target = fake_network("127.0.0.1:55443".to_string()).await;
    let lights = discovery(target).discover().await;

    assert_eq!(lights.len(), 2, "{lights:?}");

    let a = by_id(&lights, "bulb_a");
    assert_eq!(a.address, "127.0.0.1:55443");
    assert_eq!(a.brightness, 80);
    assert!(a.defaulted.is_empty());

    let b = by_id(&lights, "bulb_b");
    assert_eq!(b.brightness, 0);
    assert!(b.is_defaulted("bright"));
    assert_eq!(b.address, "127.0.0.1:1");
    assert_eq!(b.model, "color");
    assert_eq!(b.name, "bulb_b_name");
    assert_eq!(b.firmware_version, 18);
    assert_eq!(b.power, "off");
    assert_eq!(b.color_mode, 1);
    assert_eq!(b.color_temperature, 2700);
    assert_eq!(b.rgb, 255);
    assert_eq!(b.hue, 10);
    assert_eq!(b.saturation, 20);
    assert_eq!(b.capabilities.len(), 6);
}

#[tokio::test]
async fn discovered_light_can_be_controlled() {
    static STATE: [&str; 7] = ["on", "55", "3500", "65280", "200", "70", "2"];
    let (control, mut seen) = fake_control(&STATE).await;
    let target = fake_network(control.clone()).await;

    let client = YeelightClient::with_parts(
        discovery(target),
        CommandChannel::new().with_timeout(Duration::from_secs(1)),
    );
    let lights = client.discover().await;
    let mut light = by_id(&lights, "bulb_a").clone();
    assert_eq!(light.address, control);

    light
        .power_on(client.channel(), Transition::smooth_millis(400))
        .await
        .unwrap();
    let sent = seen.recv().await.unwrap();
    assert_eq!(sent["method"], json!("set_power"));
    assert_eq!(sent["params"], json!(["on", "smooth", 400]));

    client
        .set_color_hex(&light, "#00FF00", Transition::Sudden)
        .await
        .unwrap();
    let sent = seen.recv().await.unwrap();
    assert_eq!(sent["method"], json!("set_rgb"));
    assert_eq!(sent["params"][0], json!(0x00FF00));

    light.refresh(client.channel()).await.unwrap();
    assert!(light.is_on());
    assert_eq!(light.brightness, 55);
    assert_eq!(light.color_temperature, 3500);
    assert_eq!(light.rgb, 65280);
    assert_eq!(light.hue, 200);
    assert_eq!(light.saturation, 70);
    assert_eq!(light.color_mode, 2);
}

#[tokio::test]
async fn partially_discovered_light_reports_transport_error() {
    let target = fake_network("127.0.0.1:55443".to_string()).await;
    let lights = discovery(target).discover().await;
    let b = by_id(&lights, "bulb_b").clone();

    let err = b
        .power_on(&CommandChannel::new(), Transition::Sudden)
        .await
        .unwrap_err();
    assert!(err.is_transport(), "{err:?}");
    assert!(!matches!(err, YeelightError::Device { .. }));
}
