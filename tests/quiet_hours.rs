use chrono::NaiveTime;
use epd_dashboard::quiet_hours::{should_refresh, QuietHours};
use proptest::prelude::*;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[test]
fn overnight_window_boundaries() {
    let start = t(22, 0);
    let end = t(6, 0);
    assert!(!should_refresh(t(23, 0), start, end));
    assert!(!should_refresh(t(5, 59), start, end));
    assert!(!should_refresh(t(22, 0), start, end));
    assert!(should_refresh(t(6, 0), start, end));
    assert!(should_refresh(t(21, 59), start, end));
}

#[test]
fn parses_from_settings_json() {
    let quiet: QuietHours = serde_json::from_str(r#"{"start":"22:00","end":"06:30"}"#).unwrap();
    assert_eq!(quiet, QuietHours::new(t(22, 0), t(6, 30)));
    assert_eq!(
        serde_json::to_string(&quiet).unwrap(),
        r#"{"start":"22:00","end":"06:30"}"#
    );
}

#[test]
fn rejects_garbage_time() {
    let result: Result<QuietHours, _> = serde_json::from_str(r#"{"start":"late","end":"06:00"}"#);
    assert!(result.is_err());
}

proptest! {
    #[test]
    fn equal_bounds_never_suppress(h in 0u32..24, m in 0u32..60, nh in 0u32..24, nm in 0u32..60) {
        prop_assert!(should_refresh(t(nh, nm), t(h, m), t(h, m)));
    }

    #[test]
    fn swapping_bounds_inverts_the_window(
        a in 0u32..(24 * 60),
        b in 0u32..(24 * 60),
        now in 0u32..(24 * 60),
    ) {
        prop_assume!(a != b);
        let (start, end, at) = (t(a / 60, a % 60), t(b / 60, b % 60), t(now / 60, now % 60));
        prop_assert_ne!(should_refresh(at, start, end), should_refresh(at, end, start));
    }
}
