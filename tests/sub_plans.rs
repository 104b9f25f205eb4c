mod support;

use ndrfft::verify::round_trip_error;
use ndrfft::{Direction, NdFftError, NdRealPlan, SubPlanKind};
use support::{random_real, CountingFactory};

#[test]
fn test_equal_extents_build_one_complex_sub_plan() {
    let mut factory = CountingFactory::<f64>::new();
    let plan = NdRealPlan::with_factory(&[8, 8, 4], Direction::Forward, &mut factory).unwrap();
    // real sub-plan of length 4 plus one complex sub-plan of length 8
    assert_eq!(factory.counters.created(), 2);
    assert_eq!(factory.requests, 2);
    assert!(plan.registry().shares_handle(1, 2));

    drop(plan);
    assert_eq!(factory.counters.dropped(), 2);
    assert_eq!(factory.counters.live(), 0);
}

#[test]
fn test_every_sub_plan_released_exactly_once() {
    let shapes: &[&[usize]] = &[
        &[5],
        &[4, 4],
        &[6, 6, 6],
        &[3, 5, 3, 5],
        &[2, 2, 2, 2],
        &[7, 2, 7, 3],
    ];
    for &shape in shapes {
        for direction in [Direction::Forward, Direction::Inverse] {
            let mut factory = CountingFactory::<f32>::new();
            let plan = NdRealPlan::with_factory(shape, direction, &mut factory).unwrap();
            let created = factory.counters.created();
            assert_eq!(created, plan.registry().owned_count(), "{shape:?} {direction:?}");
            assert_eq!(factory.counters.dropped(), 0);
            drop(plan);
            assert_eq!(factory.counters.dropped(), created, "{shape:?} {direction:?}");
        }
    }
}

#[test]
fn test_failed_construction_releases_earlier_sub_plans() {
    // [3, 5, 7] needs three requests; fail each one in turn.
    for fail_at in 0..3 {
        for direction in [Direction::Forward, Direction::Inverse] {
            let mut factory = CountingFactory::<f64>::failing_at(fail_at);
            let err = NdRealPlan::with_factory(&[3, 5, 7], direction, &mut factory).unwrap_err();
            assert!(matches!(err, NdFftError::SubPlanConstruction { .. }));
            assert_eq!(factory.counters.created(), fail_at);
            assert_eq!(factory.counters.live(), 0, "fail_at {fail_at} {direction:?}");
        }
    }
}

#[test]
fn test_failure_reports_requested_kind() {
    let mut factory = CountingFactory::<f64>::failing_at(0);
    let err = NdRealPlan::with_factory(&[6, 10], Direction::Inverse, &mut factory).unwrap_err();
    // inverse plans request the complex axes first
    assert!(matches!(
        err,
        NdFftError::SubPlanConstruction {
            kind: SubPlanKind::Complex,
            len: 6,
            ..
        }
    ));

    let mut factory = CountingFactory::<f64>::failing_at(0);
    let err = NdRealPlan::with_factory(&[6, 10], Direction::Forward, &mut factory).unwrap_err();
    assert!(matches!(
        err,
        NdFftError::SubPlanConstruction {
            kind: SubPlanKind::RealToComplex,
            len: 10,
            ..
        }
    ));
}

#[test]
fn test_shared_sub_plans_still_transform_correctly() {
    let shape = [6, 6, 6, 4];
    let mut f = CountingFactory::<f64>::new();
    let mut i = CountingFactory::<f64>::new();
    let mut fwd = NdRealPlan::with_factory(&shape, Direction::Forward, &mut f).unwrap();
    let mut inv = NdRealPlan::with_factory(&shape, Direction::Inverse, &mut i).unwrap();
    assert_eq!(fwd.registry().owned_count(), 2);
    assert_eq!(inv.registry().owned_count(), 2);

    let x = random_real(fwd.volume(), 7);
    assert!(round_trip_error(&mut fwd, &mut inv, &x) < 1e-10);
}

#[test]
fn test_invalid_shape_requests_nothing() {
    let mut factory = CountingFactory::<f32>::new();
    assert!(NdRealPlan::with_factory(&[4, 0], Direction::Forward, &mut factory).is_err());
    assert!(NdRealPlan::with_factory(&[], Direction::Inverse, &mut factory).is_err());
    assert_eq!(factory.requests, 0);
}
