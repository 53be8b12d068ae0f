//! Shared test harness for [ObjState] implementors.  Each type lists real,
//! fake and invalid cases and [check_cases] verifies that validation agrees
//! with every list.

use crate::imports::*;

pub trait Cases: Sized + ObjState + Valid + fmt::Debug {
    fn real_cases() -> Vec<Self> {
        vec![Self::valid()]
    }
    fn fake_cases() -> Vec<Self> {
        vec![]
    }
    fn invalid_cases() -> Vec<Self> {
        vec![]
    }
}

pub fn test_cases<T: Cases>() {
    for case in T::real_cases() {
        assert!(case.is_real(), "{case:?} should be real");
        assert!(
            case.validate().is_ok(),
            "{case:?} should be valid: {:?}",
            case.validate()
        );
    }
    for case in T::fake_cases() {
        assert!(case.is_fake(), "{case:?} should be fake");
        assert!(case.validate().is_ok(), "{case:?} should be valid");
    }
    for case in T::invalid_cases() {
        assert!(case.validate().is_err(), "{case:?} should be invalid");
    }
}

macro_rules! check_cases {
    ($T:ty) => {
        #[test]
        fn check_cases() {
            $crate::testing::test_cases::<$T>();
        }
    };
}
pub(crate) use check_cases;
