//! Unit tests for the WebSocket frame wire format.

use serde_json::json;
use task_digest::api::ws::WsFrame;

#[test]
fn frames_are_tagged_by_type() {
    let frames = [
        (
            WsFrame::Connected {
                client_id: "c1".into(),
            },
            json!({ "type": "connected", "client_id": "c1" }),
        ),
        (
            WsFrame::Token {
                content: "Hello".into(),
            },
            json!({ "type": "token", "content": "Hello" }),
        ),
        (
            WsFrame::Error {
                message: "summarizer: timed out".into(),
            },
            json!({ "type": "error", "message": "summarizer: timed out" }),
        ),
        (
            WsFrame::End {
                report_id: Some("report:1".into()),
            },
            json!({ "type": "end", "report_id": "report:1" }),
        ),
    ];
    for (frame, expected) in frames {
        assert_eq!(serde_json::to_value(&frame).expect("serialize"), expected);
    }
}

#[test]
fn end_without_report_serializes_null() {
    let value = serde_json::to_value(WsFrame::End { report_id: None }).expect("serialize");
    assert_eq!(value, json!({ "type": "end", "report_id": null }));
}
