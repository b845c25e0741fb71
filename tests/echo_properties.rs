//! End-to-end echo behaviour, checked against both transports.

use request_echo::config::Transport;
use reqwest::Method;
use serde_json::Value;

mod common;

const TRANSPORTS: [Transport; 2] = [Transport::Raw, Transport::Axum];

const CORS_HEADERS: [&str; 4] = [
    "access-control-allow-origin",
    "access-control-allow-headers",
    "access-control-allow-methods",
    "access-control-max-age",
];

#[tokio::test]
async fn test_cors_reflects_origin() {
    for transport in TRANSPORTS {
        let (addr, shutdown) = common::start_server(transport).await;
        let client = common::client();

        let res = client
            .get(format!("http://{}/", addr))
            .header("Origin", "http://example.com")
            .send()
            .await
            .expect("server unreachable");

        assert_eq!(res.status(), 200);
        let headers = res.headers();
        assert_eq!(headers["access-control-allow-origin"], "http://example.com");
        assert_eq!(
            headers["access-control-allow-headers"],
            "accept, authorization, content-type, origin, x-requested-with"
        );
        assert_eq!(
            headers["access-control-allow-methods"],
            "GET, POST, PUT, OPTIONS, DELETE, PATCH"
        );
        assert_eq!(headers["access-control-max-age"], "600");

        let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
        for name in CORS_HEADERS {
            assert!(
                res.headers().get(name).is_none(),
                "{} leaked without Origin ({})",
                name,
                transport
            );
        }

        shutdown.trigger();
    }
}

#[tokio::test]
async fn test_content_length_matches_body() {
    for transport in TRANSPORTS {
        let (addr, shutdown) = common::start_server(transport).await;
        let client = common::client();

        let bodies = ["", "plain", "ünïcödé ✓ 日本語", "{\"nested\":{\"a\":[1,2,3]}}"];
        for body in bodies {
            let res = client
                .post(format!("http://{}/len?q=%20x", addr))
                .header("X-Emoji", "yes")
                .body(body)
                .send()
                .await
                .unwrap();

            let declared: usize =
                res.headers()["content-length"].to_str().unwrap().parse().unwrap();
            assert_eq!(res.headers()["content-type"], "application/json; charset=utf-8");
            let bytes = res.bytes().await.unwrap();
            assert_eq!(declared, bytes.len(), "transport {}", transport);
        }

        shutdown.trigger();
    }
}

#[tokio::test]
async fn test_get_omits_body_and_post_round_trips() {
    for transport in TRANSPORTS {
        let (addr, shutdown) = common::start_server(transport).await;
        let client = common::client();

        let get: Value = client
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(get.get("body").is_none(), "GET body key present ({})", transport);
        assert_eq!(get["method"], "GET");
        assert!(get["origin"].as_str().unwrap().starts_with("127.0.0.1:"));

        let post: Value = client
            .post(format!("http://{}/", addr))
            .body("{\"x\":1}")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(post["body"].as_str(), Some("{\"x\":1}"));
        assert_eq!(post["method"], "POST");

        shutdown.trigger();
    }
}

#[tokio::test]
async fn test_same_request_same_payload() {
    for transport in TRANSPORTS {
        let (addr, shutdown) = common::start_server(transport).await;
        let client = common::client();

        let mut payloads = Vec::new();
        for _ in 0..2 {
            let text = client
                .put(format!("http://{}/same", addr))
                .header("X-Request", "repeat")
                .body("payload")
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap();

            // Each request arrives from a fresh client port.
            let masked: Vec<String> = text
                .lines()
                .map(|line| {
                    if line.trim_start().starts_with("\"origin\":") {
                        "<origin>".to_string()
                    } else {
                        line.to_string()
                    }
                })
                .collect();
            payloads.push((text, masked.join("\n")));
        }

        assert_eq!(payloads[0].1, payloads[1].1, "transport {}", transport);

        let text = &payloads[0].0;
        let order = ["\"path\":", "\"headers\":", "\"body\":", "\"origin\":", "\"method\":"];
        let keys: Vec<usize> = order
            .iter()
            .map(|key| text.find(key).unwrap_or_else(|| panic!("{} missing", key)))
            .collect();
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]), "key order in {}", text);
        shutdown.trigger();
    }
}

#[tokio::test]
async fn test_every_path_and_method() {
    for transport in TRANSPORTS {
        let (addr, shutdown) = common::start_server(transport).await;
        let client = common::client();

        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
            for path in ["/", "/foo/bar", "/a?b=c", "/encoded%20space"] {
                let res = client
                    .request(method.clone(), format!("http://{}{}", addr, path))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(res.status(), 200);

                let value: Value = res.json().await.unwrap();
                assert_eq!(value["path"], path, "{} {} via {}", method, path, transport);
                assert_eq!(value["method"], method.as_str());
            }
        }

        shutdown.trigger();
    }
}
