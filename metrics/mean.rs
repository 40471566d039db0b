use super::StreamingMetric;
use num_traits::ToPrimitive;

/// The arithmetic mean of the inputs. `finalize` returns `None` if no values were given.
#[derive(Debug, Clone, Default)]
pub struct Mean {
	n: u64,
	mean: f64,
}

impl StreamingMetric<'_> for Mean {
	type Input = f32;
	type Output = Option<f32>;

	fn update(&mut self, value: f32) {
		self.n += 1;
		self.mean += (value as f64 - self.mean) / self.n as f64;
	}

	fn merge(&mut self, other: Self) {
		let n = self.n + other.n;
		if n == 0 {
			return;
		}
		self.mean = (self.n as f64 * self.mean + other.n as f64 * other.mean) / n as f64;
		self.n = n;
	}

	fn finalize(self) -> Self::Output {
		if self.n > 0 {
			self.mean.to_f32()
		} else {
			None
		}
	}
}

#[test]
fn test_mean() {
	let mut a = Mean::default();
	a.update(1.0);
	a.update(2.0);
	let mut b = Mean::default();
	b.update(6.0);
	a.merge(b);
	assert_eq!(a.finalize(), Some(3.0));
	assert_eq!(Mean::default().finalize(), None);
}
