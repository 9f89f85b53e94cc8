//! Minimal waypost example: a file download, a text route and a JSON route.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://127.0.0.1:3030/music
//!   curl -i http://127.0.0.1:3030/test             # 404, empty body
//!   curl -i 'http://127.0.0.1:3030/tracks?limit=1'
//!   curl -i -X POST http://127.0.0.1:3030/music    # 405

use std::fs::File;

use serde::Serialize;
use tracing_subscriber::EnvFilter;
use waypost::{BoxError, Context, Router, Server, StatusCode, middleware};

#[derive(Serialize)]
struct Track {
    id: u32,
    title: &'static str,
}

const TRACKS: [Track; 2] = [Track { id: 1, title: "Answer" }, Track { id: 2, title: "Question" }];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var("WAYPOST_ADDR").unwrap_or_else(|_| "127.0.0.1:3030".to_owned());

    let mut app = Router::new();
    app.get("/music", music).with(middleware::trace);
    app.get("/test", |ctx: &mut Context| ctx.string("test", StatusCode::NOT_FOUND))
        .with(middleware::trace);
    app.get("/tracks", tracks).with(middleware::trace);

    if let Err(e) = Server::bind(addr).serve(app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}

// GET /music: the whole of Answer.mp3 from the working directory.
fn music(ctx: &mut Context) -> Result<(), BoxError> {
    let mut f = File::open("Answer.mp3")?;
    ctx.file(&mut f, StatusCode::OK)?;
    Ok(())
}

// GET /tracks?limit=N
fn tracks(ctx: &mut Context) -> Result<(), waypost::Error> {
    let limit = ctx.query_param("limit").parse().unwrap_or(TRACKS.len());
    ctx.json(&TRACKS[..limit.min(TRACKS.len())])
}
