//! Walk through an ISO-DEP activation and a chained APDU exchange against a
//! scripted tag.
//!
//! Usage:
//!   RUST_LOG=isodep=trace cargo run -p isodep --example mock_session

use isodep::prelude::*;
use isodep::utils::bytes_to_hex;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // ATS: FSCI 2 (30 byte frames), FWI 8, SFGI 0, DID supported
    let mut tag = MockTransport::with_responses([
        hex::decode("05728002f1")?,
        hex::decode("a2")?,
        hex::decode("a3")?,
        hex::decode("029000")?,
        hex::decode("c2")?,
    ]);

    let mut session = Session::new(&mut tag, IsoDepConfig::default())?;
    let params = session.activate(Fsd::Fsd256, 0)?;
    println!(
        "selected: fsc={} fwt={} sfgt={} historical=[{}]",
        params.fsc,
        params.fwt,
        params.sfgt,
        params.historical_hex()
    );

    let apdu: Vec<u8> = (0..64).collect();
    let rapdu = session.transceive(&apdu)?;
    println!("response: {}", bytes_to_hex(&rapdu));

    session.deselect()?;
    println!("deselected, engine state {}", session.state());

    for (frame, timeout) in &tag.sent {
        println!("-> {:<40} (wait {:?})", bytes_to_hex(frame), timeout);
    }
    Ok(())
}
