#![no_main]

use libfuzzer_sys::fuzz_target;

use tallybot::channels::mattermost::decode_event;

fuzz_target!(|data: &str| {
    // Websocket frames come straight from the server; decoding must never
    // panic, only return an error.
    let _ = decode_event(data);

    // Also wrap the input as the post payload of a `posted` event, which is
    // the double-encoded path.
    let frame = serde_json::json!({
        "event": "posted",
        "data": { "post": data },
    });
    let _ = decode_event(&frame.to_string());
});
