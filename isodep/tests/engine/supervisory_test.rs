#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{ats_fsc30, tag_i_block};
use isodep::constants::{FWT_DELTA, NFCA_FRAME_TIME};
use isodep::engine::FrameKind;
use isodep::test_support::selected_engine_with_ats;
use isodep::timing::{self, Fc};
use isodep::{EngineState, Error, IsoDepConfig};

#[test]
fn wtx_request_is_echoed_with_extended_deadline() {
    common::init_logging();
    let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
    engine.transmit(&[0x00, 0xA4]).unwrap();

    engine.on_frame_received(&[0xF2, 0x0A]).unwrap();
    let (frame, fdt) = engine.handler().sent.last().cloned().unwrap();
    assert_eq!(frame, vec![0xF2, 0x0A]);
    assert_eq!(fdt, Fc(65_536 * 10 + FWT_DELTA + NFCA_FRAME_TIME));
    assert_eq!(engine.last_frame(), FrameKind::WtxResponse);

    engine
        .on_frame_received(&tag_i_block(0, false, &[0x90, 0x00]))
        .unwrap();
    assert_eq!(engine.handler().received, vec![vec![0x90, 0x00]]);
}

#[test]
fn wtx_power_level_bits_are_masked() {
    let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
    engine.transmit(&[0x00]).unwrap();
    engine.on_frame_received(&[0xF2, 0xC1]).unwrap();
    assert_eq!(engine.handler().last_sent(), Some(&[0xF2, 0x01][..]));
}

#[test]
fn wtx_response_is_retried_with_same_multiplier() {
    let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
    engine.transmit(&[0x00]).unwrap();
    engine.on_frame_received(&[0xF2, 0x03]).unwrap();

    engine.on_timeout();
    let expected = (vec![0xF2, 0x03], timing::wtx_fdt(Fc(65_536), 3));
    assert_eq!(engine.handler().sent.last(), Some(&expected));

    engine.on_timeout();
    engine.on_timeout();
    assert_eq!(engine.handler().errors, vec![Error::Timeout]);
}

#[test]
fn wtx_multiplier_out_of_range_is_syntax_error() {
    for inf in [0x00u8, 0x3C, 0x3F] {
        let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
        engine.transmit(&[0x00]).unwrap();
        engine.on_frame_received(&[0xF2, inf]).unwrap();
        assert!(
            matches!(engine.handler().errors[..], [Error::Syntax(_)]),
            "WTXM byte {:#04x}",
            inf
        );
        assert_eq!(engine.state(), EngineState::Initialized);
    }
}

#[test]
fn wtx_with_extra_inf_is_syntax_error() {
    let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
    engine.transmit(&[0x00]).unwrap();
    engine.on_frame_received(&[0xF2, 0x01, 0x01]).unwrap();
    assert!(matches!(engine.handler().errors[..], [Error::Syntax(_)]));
}

#[test]
fn deselect_handshake() {
    let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
    engine.deselect().unwrap();
    assert_eq!(
        engine.handler().sent,
        vec![(vec![0xC2], timing::deselect_fdt())]
    );
    assert_eq!(engine.state(), EngineState::Transfer);

    engine.on_frame_received(&[0xC2]).unwrap();
    assert_eq!(engine.handler().deselected, 1);
    assert_eq!(engine.state(), EngineState::Initialized);
    assert!(engine.tag().is_some());
}

#[test]
fn deselect_with_trailing_byte_is_syntax_error() {
    let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
    engine.deselect().unwrap();
    engine.on_frame_received(&[0xC2, 0x00]).unwrap();
    assert!(matches!(engine.handler().errors[..], [Error::Syntax(_)]));
    assert_eq!(engine.handler().deselected, 0);
}

#[test]
fn deselect_requires_selected_tag() {
    let mut engine = selected_engine_with_ats(&ats_fsc30(), IsoDepConfig::default());
    engine.transmit(&[0x00]).unwrap();
    assert!(matches!(
        engine.deselect(),
        Err(Error::InvalidState {
            actual: EngineState::Transfer,
            ..
        })
    ));
}
