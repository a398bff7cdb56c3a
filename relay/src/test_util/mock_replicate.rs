use serde_json::{json, Value};

/// Path the mock stream endpoint is served under.
pub fn stream_path(prediction_id: &str) -> String {
    format!("/stream/{}", prediction_id)
}

/// Prediction handle as returned by a create call.
pub fn prediction_json(id: &str, stream_base: Option<&str>) -> Value {
    json!({
        "id": id,
        "status": "starting",
        "urls": {
            "get": format!("https://api.replicate.com/v1/predictions/{}", id),
            "cancel": format!("https://api.replicate.com/v1/predictions/{}/cancel", id),
            "stream": stream_base.map(|base| format!("{}{}", base, stream_path(id)))
        },
        "error": null,
        "created_at": "2024-01-08T18:06:18.613Z"
    })
}

/// Event-stream body emitting each chunk as an `output` event, then `done`.
pub fn sse_body(chunks: &[&str]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str("event: output\n");
        for line in chunk.split('\n') {
            body.push_str("data: ");
            body.push_str(line);
            body.push('\n');
        }
        body.push('\n');
    }
    body.push_str("event: done\ndata: {}\n\n");
    body
}

/// Event-stream body that emits `chunks` and then fails.
pub fn sse_error_body(chunks: &[&str], detail: &str) -> String {
    let mut body = sse_body(chunks);
    body.truncate(body.len() - "event: done\ndata: {}\n\n".len());
    body.push_str(&format!(
        "event: error\ndata: {}\n\n",
        json!({ "detail": detail })
    ));
    body
}

/// Problem-details error body.
pub fn api_error_json(status: u16, title: &str, detail: &str) -> Value {
    json!({
        "title": title,
        "detail": detail,
        "status": status
    })
}
