use isodep::protocol::{encode_rats, parse_ats};
use isodep::timing::{Fc, fwi_to_fwt, sfgi_to_sfgt};
use isodep::{Error, Fsd};

#[test]
fn rats_frames() {
    assert_eq!(hex::encode(encode_rats(Fsd::Fsd256, 0).unwrap()), "e080");
    assert_eq!(hex::encode(encode_rats(Fsd::Fsd16, 14).unwrap()), "e00e");
    assert!(matches!(
        encode_rats(Fsd::Fsd64, 15),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn desfire_ev1_ats() {
    let tag = parse_ats(&hex::decode("067577810280").unwrap()).unwrap();
    assert_eq!(tag.fsc, 62);
    assert_eq!(tag.fwt, fwi_to_fwt(8));
    assert_eq!(tag.sfgt, sfgi_to_sfgt(1));
    // TA = 0x77: both directions up to fc/16, no equal-divisor restriction
    assert!(!tag.equal_divisor);
    assert_eq!(tag.pl_divisor, 0x0E);
    assert_eq!(tag.lp_divisor, 0x0E);
    assert_eq!(tag.historical_hex(), "80");
}

#[test]
fn ats_with_long_historical_bytes() {
    // TA, TB, TC and eleven historical bytes
    let ats = hex::decode("1078778002804f0ca000000306030001").unwrap();
    let tag = parse_ats(&ats).unwrap();
    assert_eq!(tag.fsc, 254);
    assert_eq!(tag.fwt, Fc(4096 << 8));
    assert_eq!(tag.historical().len(), 11);
}

#[test]
fn rfu_fsci_is_clamped() {
    for fsci in 9..=15u8 {
        let tag = parse_ats(&[0x02, fsci]).unwrap();
        assert_eq!(tag.fsc, 254, "FSCI {}", fsci);
    }
}
