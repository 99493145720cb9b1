#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use isodep::constants::SFGT_DEFAULT;
use isodep::test_support::{ManualClock, RecordingHandler, TestEngine};
use isodep::timing::{self, Fc};
use isodep::{Dispatch, EngineState, Error, Fsd, IsoDep, IsoDepConfig};

fn fresh_engine(clock: &ManualClock) -> TestEngine {
    common::init_logging();
    let mut engine =
        IsoDep::with_clock(RecordingHandler::default(), IsoDepConfig::default(), clock.clone());
    engine.init(vec![0; 256], vec![0; 256]).unwrap();
    engine
}

#[test]
fn rats_encodes_every_fsd_selector() {
    let expected = [16usize, 24, 32, 40, 48, 64, 96, 128, 256];
    for (selector, fsd) in Fsd::ALL.iter().enumerate() {
        assert_eq!(fsd.value(), expected[selector]);
        assert_eq!(Fsd::try_from(selector as u8).unwrap(), *fsd);

        let mut engine = fresh_engine(&ManualClock::new());
        engine.rats_send(*fsd, 3).unwrap();
        let (frame, fdt) = &engine.handler().sent[0];
        assert_eq!(frame, &vec![0xE0, ((selector as u8) << 4) | 3]);
        assert_eq!(*fdt, timing::rats_fdt());
    }
    for selector in 9..=15u8 {
        assert!(matches!(
            Fsd::try_from(selector),
            Err(Error::InvalidArgument(_))
        ));
    }
}

#[test]
fn ats_without_interface_bytes_uses_defaults() {
    let mut engine = fresh_engine(&ManualClock::new());
    engine.rats_send(Fsd::Fsd64, 0).unwrap();
    engine.on_frame_received(&common::fixtures::ats_fsc30()).unwrap();

    let tag = engine.handler().selected[0];
    assert_eq!(tag.fsc, 30);
    assert_eq!(tag.fwt, Fc(65_536));
    assert_eq!(tag.sfgt, Fc(SFGT_DEFAULT));
    assert!(tag.did_supported);
    assert!(!tag.nad_supported);
    assert_eq!(engine.state(), EngineState::Selected);
}

#[test]
fn ats_interface_bytes_are_applied() {
    let mut engine = fresh_engine(&ManualClock::new());
    engine.rats_send(Fsd::Fsd256, 2).unwrap();
    engine
        .on_frame_received(&common::fixtures::ats_desfire())
        .unwrap();

    let tag = engine.tag().copied().unwrap();
    assert_eq!(tag.fsc, 62);
    assert_eq!(tag.fwt, Fc(4096 << 8));
    assert_eq!(tag.sfgt, Fc(8192 + 768));
    assert_eq!(tag.did, 2);
    assert!(tag.did_supported);
    assert_eq!(tag.historical(), &[0x80]);
    assert_eq!(engine.fsd(), Some(Fsd::Fsd256));
}

#[test]
fn rats_while_transfer_pending_is_rejected() {
    let mut engine = fresh_engine(&ManualClock::new());
    engine.rats_send(Fsd::Fsd64, 0).unwrap();
    assert!(matches!(
        engine.rats_send(Fsd::Fsd64, 0),
        Err(Error::InvalidState {
            actual: EngineState::Transfer,
            ..
        })
    ));
    assert_eq!(engine.handler().sent.len(), 1);
}

#[test]
fn reactivation_from_selected() {
    let mut engine = fresh_engine(&ManualClock::new());
    engine.rats_send(Fsd::Fsd64, 0).unwrap();
    engine.on_frame_received(&common::fixtures::ats_fsc30()).unwrap();
    engine.rats_send(Fsd::Fsd128, 1).unwrap();
    engine
        .on_frame_received(&common::fixtures::ats_fsc254())
        .unwrap();
    assert_eq!(engine.handler().selected.len(), 2);
    assert_eq!(engine.tag().unwrap().fsc, 254);
    assert_eq!(engine.tag().unwrap().did, 1);
}

#[test]
fn first_transmit_waits_for_sfgt() {
    let clock = ManualClock::new();
    let mut engine = fresh_engine(&clock);
    engine.rats_send(Fsd::Fsd64, 0).unwrap();
    engine.on_frame_received(&common::fixtures::ats_fsc30()).unwrap();
    engine.handler_mut().sent.clear();

    let guard = Fc(SFGT_DEFAULT).to_duration();
    clock.advance(Duration::from_micros(100));
    let dispatch = engine.transmit(&[0x00, 0xA4]).unwrap();
    assert_eq!(dispatch, Dispatch::Deferred(guard - Duration::from_micros(100)));
    assert!(engine.is_deferred());
    assert!(engine.handler().sent.is_empty());

    // Answers and timer events are not expected yet
    engine.on_timeout();
    assert!(engine.handler().sent.is_empty());
    assert!(matches!(
        engine.on_frame_received(&[0x02]),
        Err(Error::InvalidArgument(_))
    ));

    clock.advance(guard);
    engine.send_deferred().unwrap();
    assert_eq!(engine.handler().last_sent(), Some(&[0x02, 0x00, 0xA4][..]));
    assert!(matches!(
        engine.send_deferred(),
        Err(Error::InvalidArgument(_))
    ));

    // Only the first exchange after ATS is guarded
    engine.on_frame_received(&[0x02, 0x90, 0x00]).unwrap();
    assert_eq!(engine.transmit(&[0x00]).unwrap(), Dispatch::Sent);
}

#[test]
fn transmit_after_guard_elapsed_is_immediate() {
    let clock = ManualClock::new();
    let mut engine = fresh_engine(&clock);
    engine.rats_send(Fsd::Fsd64, 0).unwrap();
    engine.on_frame_received(&common::fixtures::ats_fsc30()).unwrap();
    clock.advance(Duration::from_millis(1));
    assert_eq!(engine.transmit(&[0x00]).unwrap(), Dispatch::Sent);
}

#[test]
fn abort_cancels_deferred_transmit() {
    let clock = ManualClock::new();
    let mut engine = fresh_engine(&clock);
    engine.rats_send(Fsd::Fsd64, 0).unwrap();
    engine.on_frame_received(&common::fixtures::ats_fsc30()).unwrap();
    assert!(matches!(
        engine.transmit(&[0x00]).unwrap(),
        Dispatch::Deferred(_)
    ));

    engine.abort().unwrap();
    assert_eq!(engine.state(), EngineState::Initialized);
    assert!(matches!(
        engine.send_deferred(),
        Err(Error::InvalidState { .. })
    ));
    assert_eq!(engine.handler().sent.len(), 1);
}
