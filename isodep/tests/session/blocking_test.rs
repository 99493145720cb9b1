#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use common::fixtures::{
    ats_desfire, ats_fsc30, counting_payload, select_ndef_apdu, tag_ack, tag_i_block,
};
use isodep::test_support::ManualClock;
use isodep::timing::{self, Fc};
use isodep::{EngineState, Error, Fsd, IsoDepConfig, MockTransport, Session};

fn activated(
    ats: Vec<u8>,
    responses: Vec<Vec<u8>>,
    config: IsoDepConfig,
) -> Session<MockTransport, ManualClock> {
    common::init_logging();
    let clock = ManualClock::new();
    let mut transport = MockTransport::new();
    transport.push_response(ats);
    for resp in responses {
        transport.push_response(resp);
    }
    let mut session = Session::with_clock(transport, config, clock.clone()).unwrap();
    session.activate(Fsd::Fsd256, 0).unwrap();
    clock.advance(Duration::from_millis(100));
    session
}

#[test]
fn select_ndef_application() {
    let mut session = activated(
        ats_desfire(),
        vec![tag_i_block(0, false, &[0x90, 0x00])],
        IsoDepConfig::default(),
    );
    let rapdu = session.transceive(&select_ndef_apdu()).unwrap();
    assert_eq!(rapdu, vec![0x90, 0x00]);

    let (frame, timeout) = &session.transport().sent[1];
    assert_eq!(frame[0], 0x02);
    assert_eq!(&frame[1..], &select_ndef_apdu()[..]);
    // FWI 8 from the ATS
    assert_eq!(*timeout, timing::block_fdt(Fc(4096 << 8)).to_duration());
}

#[test]
fn chained_request_and_response() {
    let response = counting_payload(50);
    let mut session = activated(
        ats_fsc30(),
        vec![
            tag_ack(0),
            tag_ack(1),
            tag_i_block(0, true, &response[..29]),
            tag_i_block(1, false, &response[29..]),
        ],
        IsoDepConfig::default(),
    );

    let rapdu = session.transceive(&counting_payload(70)).unwrap();
    assert_eq!(rapdu, response);
    assert_eq!(session.state(), EngineState::Selected);

    let sent = session.transport().sent_frames();
    // RATS, three I-blocks, one R(ACK)
    assert_eq!(sent.len(), 5);
    assert_eq!(sent[4], &[0xA3]);
}

#[test]
fn wtx_and_lost_frame_are_absorbed() {
    let mut session = activated(ats_fsc30(), Vec::new(), IsoDepConfig::default());
    let transport = session.transport_mut();
    transport.push_response(vec![0xF2, 0x02]);
    transport.push_timeout();
    transport.push_response(tag_i_block(0, false, &[0x90, 0x00]));

    assert_eq!(session.transceive(&[0x00]).unwrap(), vec![0x90, 0x00]);
    let sent = &session.transport().sent;
    // I-block, WTX response, WTX response again after the timeout
    assert_eq!(sent[2].0, vec![0xF2, 0x02]);
    assert_eq!(sent[3].0, vec![0xF2, 0x02]);
    assert_eq!(sent[3].1, timing::wtx_fdt(Fc(65_536), 2).to_duration());
}

#[test]
fn exhausted_retries_surface_as_error() {
    let mut session = activated(
        ats_fsc30(),
        Vec::new(),
        IsoDepConfig::default().with_nak_retry(1),
    );
    session
        .transport_mut()
        .push_error(Error::Transmission("crc".into()));
    assert!(matches!(
        session.transceive(&[0x00]),
        Err(Error::Timeout)
    ));
    assert_eq!(session.state(), EngineState::Initialized);

    // The session can be activated again
    session.transport_mut().push_response(ats_fsc30());
    let tag = session.activate(Fsd::Fsd64, 0).unwrap();
    assert_eq!(tag.fsc, 30);
}

#[test]
fn misuse_is_reported_synchronously() {
    let mut session = Session::new(MockTransport::new(), IsoDepConfig::default()).unwrap();
    assert!(matches!(
        session.transceive(&[0x00]),
        Err(Error::InvalidState { .. })
    ));
    assert!(matches!(
        session.activate(Fsd::Fsd16, 15),
        Err(Error::InvalidArgument(_))
    ));
    assert!(session.transport().sent.is_empty());
}

#[test]
fn deselect_after_exchange() {
    let mut session = activated(
        ats_fsc30(),
        vec![tag_i_block(0, false, &[0x90, 0x00]), vec![0xC2]],
        IsoDepConfig::default(),
    );
    session.transceive(&[0x00]).unwrap();
    session.deselect().unwrap();
    assert_eq!(session.state(), EngineState::Initialized);
    assert_eq!(session.into_transport().pending(), 0);
}
