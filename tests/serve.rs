use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use waypost::{BoxError, Context, Dispatcher, FlushPolicy, Method, Request, Router, Server, StatusCode, middleware};

type Serving = JoinHandle<Result<(), waypost::Error>>;

struct Reply {
    status: u16,
    body: String,
}

async fn exchange<S: AsyncRead + AsyncWrite + Unpin>(stream: &mut S, raw: &str) -> Reply {
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    match stream.read_to_end(&mut buf).await {
        Ok(_) => {}
        // A TLS peer may close without close_notify; what was read is kept.
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
        Err(e) => panic!("reading reply: {e}"),
    }
    let text = String::from_utf8(buf).unwrap();

    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let status = head.split_whitespace().nth(1).unwrap().parse().unwrap();
    Reply { status, body: body.to_owned() }
}

async fn send(addr: &str, raw: &str) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    exchange(&mut stream, raw).await
}

fn request_line(method: &str, target: &str) -> String {
    format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
}

async fn request(addr: &str, method: &str, target: &str) -> Reply {
    send(addr, &request_line(method, target)).await
}

// Port 0, so parallel tests never collide.
async fn local_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

async fn assert_serving(server: &mut Serving) {
    if let Ok(res) = tokio::time::timeout(Duration::from_millis(50), server).await {
        panic!("server exited early: {res:?}");
    }
}

fn music_router(path: std::path::PathBuf) -> Router {
    let mut router = Router::new();
    router
        .get("/music", move |ctx: &mut Context| -> Result<(), BoxError> {
            let mut f = std::fs::File::open(&path)?;
            ctx.file(&mut f, StatusCode::OK)?;
            Ok(())
        })
        .with(middleware::trace);
    router.get("/test", |ctx: &mut Context| ctx.string("test", StatusCode::NOT_FOUND));
    router.post("/echo", |ctx: &mut Context| {
        let body = String::from_utf8_lossy(ctx.body()).into_owned();
        ctx.string(body, StatusCode::OK)
    });
    router.get("/remote", |ctx: &mut Context| {
        let seen = ctx.request().remote_addr().is_some();
        ctx.string(seen.to_string(), StatusCode::OK)
    });
    router.get("/panic", |_: &mut Context| -> Result<(), BoxError> { panic!("handler bug") });
    router
}

fn music_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"hello").unwrap();
    file
}

#[tokio::test]
async fn serves_routes_over_tcp() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let file = music_file();
    let (listener, addr) = local_listener().await;
    let addr = addr.as_str();
    let mut server = tokio::spawn(Server::from_listener(listener).serve(music_router(file.path().to_owned())));
    assert_serving(&mut server).await;

    let r = request(addr, "GET", "/music").await;
    assert_eq!((r.status, r.body.as_str()), (200, "hello"));

    let r = request(addr, "GET", "/music?track=1").await;
    assert_eq!((r.status, r.body.as_str()), (200, "hello"));

    let r = request(addr, "GET", "/test").await;
    assert_eq!((r.status, r.body.as_str()), (404, ""));

    let r = request(addr, "POST", "/music").await;
    assert_eq!((r.status, r.body.as_str()), (405, "Method POST for router /music is not allowed."));

    let r = request(addr, "GET", "/nope").await;
    assert_eq!((r.status, r.body.as_str()), (404, "Router /nope does not exist."));

    let r = send(
        addr,
        "POST /echo HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 5\r\n\r\nhello",
    )
    .await;
    assert_eq!((r.status, r.body.as_str()), (200, "hello"));

    let r = request(addr, "GET", "/remote").await;
    assert_eq!(r.body, "true");

    let r = request(addr, "GET", "/panic").await;
    assert_eq!((r.status, r.body.as_str()), (500, ""));

    // The server survives a panicking handler.
    let r = request(addr, "GET", "/music").await;
    assert_eq!(r.status, 200);

    assert_serving(&mut server).await;
    server.abort();
}

#[tokio::test]
async fn flush_always_keeps_error_bodies_over_tcp() {
    let file = music_file();
    let (listener, addr) = local_listener().await;
    let app = Dispatcher::new(music_router(file.path().to_owned())).flush_policy(FlushPolicy::Always);
    let mut server = tokio::spawn(Server::from_listener(listener).serve(app));
    assert_serving(&mut server).await;

    let r = request(&addr, "GET", "/test").await;
    assert_eq!((r.status, r.body.as_str()), (404, "test"));

    server.abort();
}

#[tokio::test]
async fn serves_routes_over_tls() {
    let dir = tempfile::tempdir().unwrap();
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_owned()]).unwrap();
    let cert_path = dir.path().join("cert.pem");
    let key_path = dir.path().join("key.pem");
    std::fs::write(&cert_path, cert.pem()).unwrap();
    std::fs::write(&key_path, key_pair.serialize_pem()).unwrap();

    let mut router = Router::new();
    router.get("/x", |ctx: &mut Context| ctx.string("secure", StatusCode::OK));

    let (listener, addr) = local_listener().await;
    let mut server = tokio::spawn(Server::from_listener(listener).tls(cert_path, key_path).serve(router));
    assert_serving(&mut server).await;

    let mut roots = RootCertStore::empty();
    roots.add(cert.der().clone()).unwrap();
    let provider = Arc::new(tokio_rustls::rustls::crypto::aws_lc_rs::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let tcp = TcpStream::connect(&addr).await.unwrap();
    let name = ServerName::try_from("localhost").unwrap();
    let mut tls = connector.connect(name, tcp).await.unwrap();

    let r = exchange(&mut tls, &request_line("GET", "/x")).await;
    assert_eq!((r.status, r.body.as_str()), (200, "secure"));

    let tcp = TcpStream::connect(&addr).await.unwrap();
    let name = ServerName::try_from("localhost").unwrap();
    let mut tls = connector.connect(name, tcp).await.unwrap();
    let r = exchange(&mut tls, &request_line("DELETE", "/x")).await;
    assert_eq!(r.status, 405);

    assert_serving(&mut server).await;
    server.abort();
}

#[tokio::test]
async fn bound_listener_reports_tls_failure() {
    let (listener, _) = local_listener().await;
    let err = Server::from_listener(listener)
        .tls("/nonexistent/cert.pem", "/nonexistent/key.pem")
        .serve(Router::new())
        .await
        .unwrap_err();
    assert!(matches!(err, waypost::Error::Tls(_)));
}

#[test]
fn dispatcher_works_without_a_socket() {
    let file = music_file();
    let dispatcher = Dispatcher::new(music_router(file.path().to_owned()));

    let d = dispatcher.dispatch(Request::new(Method::GET, "/music"));
    assert_eq!(d.response.status_code(), StatusCode::OK);
    assert_eq!(d.response.body(), b"hello");
}
