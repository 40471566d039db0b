use num_traits::Float;
use thiserror::Error;

/// A float that is guaranteed to be neither NaN nor infinite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Finite<T>(T)
where
	T: Float;

#[derive(Debug, Error)]
#[error("not finite")]
pub struct NotFiniteError;

impl<T> Finite<T>
where
	T: Float,
{
	pub fn new(value: T) -> Result<Self, NotFiniteError> {
		if value.is_finite() {
			Ok(Self(value))
		} else {
			Err(NotFiniteError)
		}
	}

	pub fn get(self) -> T {
		self.0
	}
}

#[test]
fn test_finite() {
	assert!(Finite::new(f64::NAN).is_err());
	assert!(Finite::new(f64::INFINITY).is_err());
	assert!(Finite::new(f32::NEG_INFINITY).is_err());
	assert_eq!(Finite::new(-1.5).unwrap().get(), -1.5);
	assert_eq!(Finite::new(0.0f32).unwrap().get(), 0.0);
}
