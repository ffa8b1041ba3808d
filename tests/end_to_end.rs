//! Full sandbox flow through the tool registry. Steps that need a real
//! `ffmpeg` binary are skipped when it is not on PATH.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ffmpeg_sandbox::config::Config;
use ffmpeg_sandbox::tools::ToolRegistry;
use ffmpeg_sandbox::ErrorKind;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn registry(tmp: &TempDir) -> ToolRegistry {
    let mut cfg = Config::default();
    cfg.sandbox.root_dir = Some(tmp.path().to_string_lossy().into_owned());
    cfg.executor.timeout_secs = Some(60);
    ToolRegistry::from_config(&cfg).unwrap()
}

fn ffmpeg_available() -> bool {
    which::which("ffmpeg").is_ok()
}

#[tokio::test]
async fn command_before_first_write_reports_missing_sandbox() {
    let tmp = TempDir::new().unwrap();
    let reg = registry(&tmp);

    let sandbox = reg.call("create_sandbox", json!({})).await.unwrap().output;
    assert!(!Path::new(&sandbox).exists());

    let result = reg
        .call(
            "run_command",
            json!({"sandbox": sandbox, "command": "ffmpeg -version"}),
        )
        .await
        .unwrap();
    assert_eq!(result.error.as_deref(), Some("sandbox does not exist"));
    assert_eq!(result.kind, Some(ErrorKind::Precondition));
}

#[tokio::test]
async fn sandboxes_are_distinct() {
    let tmp = TempDir::new().unwrap();
    let reg = registry(&tmp);

    let a = reg.call("create_sandbox", json!({})).await.unwrap().output;
    let b = reg.call("create_sandbox", json!({})).await.unwrap().output;
    assert_ne!(a, b);

    reg.call(
        "put_file",
        json!({"sandbox": a, "filename": "x.txt", "content": "eA==" }),
    )
    .await
    .unwrap();
    let other = reg
        .call("get_file", json!({"sandbox": b, "filename": "x.txt"}))
        .await
        .unwrap();
    assert_eq!(other.kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn transcode_in_sandbox() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let reg = registry(&tmp);
    let sandbox = reg.call("create_sandbox", json!({})).await.unwrap().output;

    // Materialise the directory with a placeholder, then synthesise input.
    reg.call(
        "put_file",
        json!({"sandbox": sandbox, "filename": "keep", "content": ""}),
    )
    .await
    .unwrap();
    let gen = reg
        .call(
            "run_command",
            json!({
                "sandbox": sandbox,
                "command": "ffmpeg -hide_banner -loglevel error -f lavfi -i sine=frequency=440:duration=1 in.wav"
            }),
        )
        .await
        .unwrap();
    assert!(gen.success, "{:?}", gen.error);

    let convert = reg
        .call(
            "run_command",
            json!({
                "sandbox": sandbox,
                "args": ["ffmpeg", "-hide_banner", "-loglevel", "error", "-i", "in.wav", "-ac", "1", "out.wav"]
            }),
        )
        .await
        .unwrap();
    assert!(convert.success, "{:?}", convert.error);

    let out = reg
        .call("get_file", json!({"sandbox": sandbox, "filename": "out.wav"}))
        .await
        .unwrap();
    let bytes = STANDARD.decode(out.output).unwrap();
    assert_eq!(&bytes[..4], b"RIFF");
}

#[tokio::test]
async fn malformed_input_surfaces_stderr() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let reg = registry(&tmp);
    let sandbox = reg.call("create_sandbox", json!({})).await.unwrap().output;

    reg.call(
        "put_file",
        json!({
            "sandbox": sandbox,
            "filename": "in.mp4",
            "content": "this is not a video",
            "encoding": "text"
        }),
    )
    .await
    .unwrap();

    let result = reg
        .call(
            "run_command",
            json!({"sandbox": sandbox, "command": "ffmpeg -hide_banner -i in.mp4 out.mp3"}),
        )
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.kind, Some(ErrorKind::Execution));
    assert!(result.error.unwrap().contains("in.mp4"));
}
