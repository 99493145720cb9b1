#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{ats_fsc30, counting_payload, tag_i_block};
use isodep::engine::FrameKind;
use isodep::test_support::{ManualClock, RecordingHandler, selected_engine_with_ats};
use isodep::timing::{self, Fc};
use isodep::{EngineState, Error, Fsd, IsoDep, IsoDepConfig};

#[test]
fn timeouts_on_i_block_send_nak_until_budget_runs_out() {
    common::init_logging();
    let config = IsoDepConfig::default().with_nak_retry(2);
    let mut engine = selected_engine_with_ats(&ats_fsc30(), config);
    engine.transmit(&[0x00, 0xA4]).unwrap();

    engine.on_timeout();
    engine.on_timeout();
    assert!(engine.handler().errors.is_empty());
    let naks: Vec<_> = engine.handler().sent[1..].to_vec();
    assert_eq!(
        naks,
        vec![
            (vec![0xB2], timing::block_fdt(Fc(65_536))),
            (vec![0xB2], timing::block_fdt(Fc(65_536))),
        ]
    );

    engine.on_timeout();
    assert_eq!(engine.handler().errors, vec![Error::Timeout]);
    assert_eq!(engine.handler().sent.len(), 3);
    assert_eq!(engine.state(), EngineState::Initialized);

    engine.on_timeout();
    assert_eq!(engine.handler().errors.len(), 1);
}

#[test]
fn transport_errors_surface_as_transmission_failure() {
    let config = IsoDepConfig::default().with_nak_retry(1);
    let mut engine = selected_engine_with_ats(&ats_fsc30(), config);
    engine.transmit(&[0x00]).unwrap();

    engine.on_transport_error();
    assert_eq!(engine.handler().last_sent(), Some(&[0xB2][..]));
    engine.on_transport_error();
    assert!(matches!(
        engine.handler().errors[..],
        [Error::Transmission(_)]
    ));
}

#[test]
fn recovered_exchange_completes_normally() {
    let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
    engine.transmit(&[0x00]).unwrap();
    engine.on_timeout();
    engine
        .on_frame_received(&tag_i_block(0, false, &[0x90, 0x00]))
        .unwrap();
    assert_eq!(engine.handler().received, vec![vec![0x90, 0x00]]);
    assert!(engine.handler().errors.is_empty());
}

#[test]
fn timeout_while_receiving_chain_resends_ack() {
    let config = IsoDepConfig::default().with_ack_retry(1);
    let mut engine = selected_engine_with_ats(&ats_fsc30(), config);
    engine.transmit(&[0x00]).unwrap();
    engine
        .on_frame_received(&tag_i_block(0, true, &counting_payload(10)))
        .unwrap();
    assert_eq!(engine.last_frame(), FrameKind::IChaining);

    engine.on_timeout();
    assert_eq!(engine.handler().last_sent(), Some(&[0xA3][..]));
    engine.on_timeout();
    assert_eq!(engine.handler().errors, vec![Error::Timeout]);
}

#[test]
fn rats_is_retried_once_by_default() {
    let mut engine = IsoDep::with_clock(
        RecordingHandler::default(),
        IsoDepConfig::default(),
        ManualClock::new(),
    );
    engine.init(vec![0; 64], vec![0; 64]).unwrap();
    engine.rats_send(Fsd::Fsd64, 0).unwrap();

    engine.on_timeout();
    let sent = &engine.handler().sent;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1], (vec![0xE0, 0x50], timing::rats_fdt()));

    engine.on_timeout();
    assert_eq!(engine.handler().errors, vec![Error::Timeout]);
    assert_eq!(engine.state(), EngineState::Initialized);
    assert!(engine.handler().selected.is_empty());
}

#[test]
fn deselect_is_retried() {
    let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
    engine.deselect().unwrap();
    engine.on_timeout();
    engine.on_timeout();
    let sent = &engine.handler().sent;
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|(f, d)| f == &vec![0xC2] && *d == timing::deselect_fdt()));

    engine.on_timeout();
    assert_eq!(engine.handler().errors, vec![Error::Timeout]);
    assert_eq!(engine.handler().deselected, 0);
}

#[test]
fn zero_budget_fails_on_first_timeout() {
    let config = IsoDepConfig::default().with_nak_retry(0);
    let mut engine = selected_engine_with_ats(&ats_fsc30(), config);
    engine.transmit(&[0x00]).unwrap();
    engine.on_timeout();
    assert_eq!(engine.handler().sent.len(), 1);
    assert_eq!(engine.handler().errors, vec![Error::Timeout]);
}

#[test]
fn engine_is_reusable_after_failure() {
    let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
    engine.transmit(&[0x00]).unwrap();
    engine.on_frame_received(&[0xB2]).unwrap();
    assert_eq!(engine.state(), EngineState::Initialized);

    engine.rats_send(Fsd::Fsd64, 0).unwrap();
    engine.on_frame_received(&ats_fsc30()).unwrap();
    assert_eq!(engine.state(), EngineState::Selected);
    assert_eq!(engine.block_number().bit(), 0);
}
