//! Request/response exchange against a simulated line-oriented device

use framelink_core::{
    codec::LineCodec, transport::MockTransport, FrameStream, LinkError, Watchdog, WatchdogSink,
};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Framelink Line Exchange Example\n");

    // The simulated device answers DETECT with a few tag lines, split across
    // deliveries the way a USB-CDC endpoint hands them over.
    let (transport, peer) = MockTransport::new();
    peer.set_responder(|request| match request {
        b"DETECT\r\n" => vec![
            b"TAG 04:A2:2B:".to_vec(),
            b"1C\r\nTAG 04:9F:00:77\r\n".to_vec(),
            b"DONE\r\n".to_vec(),
        ],
        _ => vec![b"ERR\r\n".to_vec()],
    });

    let stream = FrameStream::open(transport, LineCodec::new())?;

    let mut tags = Vec::new();
    let count = stream.transact(
        &"DETECT".to_string(),
        WatchdogSink::new(Duration::from_millis(500), |line: String, watchdog: &mut Watchdog| {
            if line == "DONE" {
                return Ok(Some(tags.len()));
            }
            match line.strip_prefix("TAG ") {
                Some(uid) => {
                    tags.push(uid.to_string());
                    watchdog.reset();
                    Ok(None)
                }
                None => Err(LinkError::invalid_frame(line)),
            }
        }),
    )?;

    println!("Device reported {} tags:", count.unwrap_or(0));
    for uid in &tags {
        println!("  {}", uid);
    }

    stream.close();
    Ok(())
}
